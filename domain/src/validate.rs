//! Lightweight form validation helpers. Keep logic minimal and deterministic.

use crate::CoreError;

/// Reject blank (empty or whitespace-only) required fields.
pub fn require(field: &'static str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::EmptyField(field));
    }
    Ok(())
}

/// Password/confirmation equality. Checked by the form layer before a
/// registry call; the registry itself does not re-validate it.
pub fn confirm_password(password: &str, confirmation: &str) -> Result<(), CoreError> {
    if password != confirmation {
        return Err(CoreError::PasswordMismatch);
    }
    Ok(())
}
