//! viacep — client for the ViaCEP postal-code lookup service.
//!
//! Purpose
//! - Map an 8-digit Brazilian postal code to a street address for form
//!   autofill.
//! - Codes are normalized locally (non-digit characters stripped, length
//!   checked) before any request goes out.
//! - A code the service does not know resolves to `Ok(None)`; callers treat
//!   every failure as non-blocking and leave the form fields unpopulated.
//!
//! API
//! - `ViaCepClient::lookup(raw)` → `Result<Option<Address>, LookupError>`
//! - `normalize_postal_code` / `format_postal_code` input-mask helpers.
//!
//! Notes
//! - No retry, no caching, no timeout beyond what `reqwest` provides.

use domain::Address;
use serde::Deserialize;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://viacep.com.br/ws";

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("postal code must have exactly 8 digits")]
    InvalidPostalCode,
    #[error("lookup service returned status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed lookup response")]
    Decode(#[source] serde_json::Error),
}

/// Response body of `GET {base}/{cep}/json/`. Field names are the service's
/// own; `erro` only appears for unknown codes.
#[derive(Debug, Deserialize)]
struct ViaCepBody {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    bairro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
}

pub struct ViaCepClient {
    base_url: String,
    http: reqwest::Client,
}

impl ViaCepClient {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Client against the production endpoint.
    pub fn default_endpoint() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Look up the address for a postal code.
    ///
    /// `raw` may carry the input mask ("01310-100"); everything but digits
    /// is stripped first. Returns `Ok(None)` when the service does not know
    /// the code.
    pub async fn lookup(&self, raw: &str) -> Result<Option<Address>, LookupError> {
        let cep = normalize_postal_code(raw).ok_or(LookupError::InvalidPostalCode)?;
        let url = format!("{}/{}/json/", self.base_url, cep);
        debug!(%url, "postal code lookup");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        parse_body(&body).map_err(LookupError::Decode)
    }
}

/// Decode a response body into an address, or `None` for the service's
/// "unknown code" marker.
fn parse_body(body: &str) -> Result<Option<Address>, serde_json::Error> {
    let parsed: ViaCepBody = serde_json::from_str(body)?;
    if is_error_marker(parsed.erro.as_ref()) {
        return Ok(None);
    }
    Ok(Some(Address {
        street: non_empty(parsed.logradouro),
        district: non_empty(parsed.bairro),
        city: non_empty(parsed.localidade),
        state_code: non_empty(parsed.uf),
    }))
}

// The service has emitted both `"erro": true` and `"erro": "true"`.
fn is_error_marker(v: Option<&serde_json::Value>) -> bool {
    match v {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Strip everything but digits; `Some` only for exactly 8 of them.
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 8 {
        Some(digits)
    } else {
        None
    }
}

/// Input mask: "01310100" → "01310-100". Shorter inputs come back as their
/// bare digits; anything past 8 digits is cut.
pub fn format_postal_code(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).take(8).collect();
    if digits.len() > 5 {
        format!("{}-{}", &digits[..5], &digits[5..])
    } else {
        digits
    }
}
