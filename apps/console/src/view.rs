//! View controller: panels, the registration form state machine, and the
//! render helpers for the list and profile views.

use domain::registry::UserRegistry;
use domain::session::SessionManager;
use domain::validate;
use domain::{CoreError, IdGenerator, KeyValueStore, NewUser, UserId, UserRecord};

/// Navigation panels. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Panel {
    #[default]
    Register,
    Users,
    Login,
}

impl Panel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "register" => Some(Self::Register),
            "users" => Some(Self::Users),
            "login" => Some(Self::Login),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Register => "Register",
            Self::Users => "Users",
            Self::Login => "Login",
        }
    }
}

/// Registration form mode. Submit branches on this; editing never swaps
/// the handler itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Create,
    Editing(UserId),
}

/// Form fields as entered, confirmation line included. Retained across
/// failed submits so the user edits instead of retyping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub postal_code: String,
    pub street: String,
    pub district: String,
    pub city: String,
    pub state_code: String,
}

impl FormData {
    /// Pre-populate the form from a listed record, stored password included
    /// so it can be re-confirmed without retyping.
    pub fn from_record(u: &UserRecord) -> Self {
        Self {
            name: u.name.clone(),
            email: u.email.as_str().to_string(),
            password: u.password.clone(),
            confirm_password: u.password.clone(),
            postal_code: u.postal_code.clone(),
            street: u.street.clone().unwrap_or_default(),
            district: u.district.clone().unwrap_or_default(),
            city: u.city.clone().unwrap_or_default(),
            state_code: u.state_code.clone().unwrap_or_default(),
        }
    }

    fn into_new_user(self) -> NewUser {
        NewUser {
            name: self.name,
            email: self.email,
            password: self.password,
            postal_code: self.postal_code,
            street: opt(self.street),
            district: opt(self.district),
            city: opt(self.city),
            state_code: opt(self.state_code),
        }
    }
}

fn opt(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Successful submit outcome.
#[derive(Debug)]
pub enum Submitted {
    Created(UserRecord),
    Updated(UserRecord),
}

/// Holds panel and form state and dispatches submits to the registry and
/// session services.
pub struct Controller<S: KeyValueStore + Clone, I: IdGenerator> {
    pub registry: UserRegistry<S, I>,
    pub session: SessionManager<S>,
    panel: Panel,
    mode: FormMode,
    draft: FormData,
}

impl<S: KeyValueStore + Clone, I: IdGenerator> Controller<S, I> {
    pub fn new(store: S, ids: I) -> Self {
        Self {
            registry: UserRegistry::new(store.clone(), ids),
            session: SessionManager::new(store),
            panel: Panel::default(),
            mode: FormMode::default(),
            draft: FormData::default(),
        }
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &FormData {
        &self.draft
    }

    /// Switch the visible panel.
    pub fn open_tab(&mut self, panel: Panel) {
        self.panel = panel;
    }

    /// Enter edit mode for a listed record; the form picks up its fields
    /// and the register panel becomes active.
    pub fn begin_edit(&mut self, record: &UserRecord) {
        self.mode = FormMode::Editing(record.id.clone());
        self.draft = FormData::from_record(record);
        self.panel = Panel::Register;
    }

    /// Drop any draft/edit state and return to create mode.
    pub fn reset_form(&mut self) {
        self.mode = FormMode::Create;
        self.draft = FormData::default();
    }

    /// Submit the form. On success the draft clears and create mode is
    /// restored; on failure the entered data is retained and edit mode, if
    /// active, stays active.
    pub fn submit(&mut self, form: FormData) -> Result<Submitted, CoreError> {
        self.draft = form.clone();
        validate::confirm_password(&form.password, &form.confirm_password)?;
        let outcome = match self.mode.clone() {
            FormMode::Create => Submitted::Created(self.registry.register(form.into_new_user())?),
            FormMode::Editing(id) => {
                Submitted::Updated(self.registry.update(&id, form.into_new_user())?)
            }
        };
        self.reset_form();
        Ok(outcome)
    }

    /// Delete after the caller confirmed. A record that is already gone
    /// counts as deleted. Deleting the record currently being edited also
    /// drops the edit state.
    pub fn delete(&mut self, id: &UserId) -> Result<(), CoreError> {
        match self.registry.delete(id) {
            Ok(()) | Err(CoreError::NotFound) => {
                if matches!(&self.mode, FormMode::Editing(editing) if editing == id) {
                    self.reset_form();
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Parsed console command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Tab(Panel),
    Submit,
    Cancel,
    List,
    Edit(usize),
    Delete(usize),
    Login,
    Logout,
    Help,
    Quit,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Tab(_) => "tab",
            Command::Submit => "submit",
            Command::Cancel => "cancel",
            Command::List => "list",
            Command::Edit(_) => "edit",
            Command::Delete(_) => "delete",
            Command::Login => "login",
            Command::Logout => "logout",
            Command::Help => "help",
            Command::Quit => "quit",
        }
    }
}

/// Parse one input line into a command.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Err("empty command".into());
    };
    match cmd.to_lowercase().as_str() {
        "tab" => {
            let Some(name) = parts.next() else {
                return Err("usage: tab register|users|login".into());
            };
            Panel::parse(name)
                .map(Command::Tab)
                .ok_or_else(|| format!("unknown panel: {name}"))
        }
        "submit" => Ok(Command::Submit),
        "cancel" => Ok(Command::Cancel),
        "list" => Ok(Command::List),
        "edit" => index_arg(parts.next()).map(Command::Edit),
        "delete" => index_arg(parts.next()).map(Command::Delete),
        "login" => Ok(Command::Login),
        "logout" => Ok(Command::Logout),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        unknown => Err(format!("unknown command: {unknown} (try 'help')")),
    }
}

// Rows are 1-based on screen, 0-based inside.
fn index_arg(arg: Option<&str>) -> Result<usize, String> {
    let Some(raw) = arg else {
        return Err("missing row number".into());
    };
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("invalid row number: {raw}")),
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn opt_or_dash(s: &Option<String>) -> &str {
    s.as_deref().filter(|v| !v.is_empty()).unwrap_or("-")
}

/// One list row: name, email, postal code, "city/state".
pub fn render_row(index: usize, u: &UserRecord) -> String {
    format!(
        "{:>3}. {} | {} | {} | {}/{}",
        index + 1,
        u.name,
        u.email.as_str(),
        or_dash(&u.postal_code),
        opt_or_dash(&u.city),
        opt_or_dash(&u.state_code),
    )
}

/// Profile address line: street, district, city/state, postal code; empty
/// parts skipped, "-" when nothing is set.
pub fn render_address(u: &UserRecord) -> String {
    let city_state = u
        .city
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| match u.state_code.as_deref().filter(|s| !s.is_empty()) {
            Some(uf) => format!("{c}/{uf}"),
            None => c.to_string(),
        });
    let parts: Vec<String> = [
        u.street.clone().filter(|s| !s.is_empty()),
        u.district.clone().filter(|s| !s.is_empty()),
        city_state,
        (!u.postal_code.is_empty()).then(|| u.postal_code.clone()),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::adapters::memory_store::MemoryStore;
    use domain::adapters::SequentialIds;

    fn controller() -> Controller<MemoryStore, SequentialIds> {
        Controller::new(MemoryStore::new(), SequentialIds::default())
    }

    fn form(name: &str, email: &str, password: &str) -> FormData {
        FormData {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: password.into(),
            ..FormData::default()
        }
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("tab users"), Ok(Command::Tab(Panel::Users)));
        assert_eq!(parse_command("TAB Login"), Ok(Command::Tab(Panel::Login)));
        assert_eq!(parse_command("submit"), Ok(Command::Submit));
        assert_eq!(parse_command("edit 2"), Ok(Command::Edit(1)));
        assert_eq!(parse_command("delete 1"), Ok(Command::Delete(0)));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
        assert!(parse_command("edit zero").is_err());
        assert!(parse_command("edit 0").is_err());
        assert!(parse_command("tab nowhere").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn default_panel_is_register() {
        let ctl = controller();
        assert_eq!(ctl.panel(), Panel::Register);
        assert_eq!(*ctl.mode(), FormMode::Create);
    }

    #[test]
    fn open_tab_switches_the_single_active_panel() {
        let mut ctl = controller();
        ctl.open_tab(Panel::Login);
        assert_eq!(ctl.panel(), Panel::Login);
        ctl.open_tab(Panel::Users);
        assert_eq!(ctl.panel(), Panel::Users);
    }

    #[test]
    fn create_submit_registers_and_clears_the_draft() {
        let mut ctl = controller();
        let out = ctl.submit(form("Ana", "Ana@X.com", "p1")).expect("created");
        assert!(matches!(out, Submitted::Created(_)));
        assert_eq!(ctl.registry.list().len(), 1);
        assert_eq!(*ctl.draft(), FormData::default());
        assert_eq!(*ctl.mode(), FormMode::Create);
    }

    #[test]
    fn password_mismatch_is_caught_before_the_registry() {
        let mut ctl = controller();
        let mut f = form("Ana", "ana@x.com", "p1");
        f.confirm_password = "p2".into();
        let err = ctl.submit(f).unwrap_err();
        assert_eq!(err, CoreError::PasswordMismatch);
        assert!(ctl.registry.list().is_empty());
    }

    #[test]
    fn duplicate_email_keeps_the_entered_form() {
        let mut ctl = controller();
        ctl.submit(form("Ana", "ana@x.com", "p1")).unwrap();

        let retry = form("Other", "ANA@x.com", "p2");
        let err = ctl.submit(retry.clone()).unwrap_err();
        assert_eq!(err, CoreError::DuplicateEmail);
        assert_eq!(*ctl.draft(), retry);
        assert_eq!(ctl.registry.list().len(), 1);
    }

    #[test]
    fn begin_edit_populates_the_form_including_the_password() {
        let mut ctl = controller();
        ctl.submit(form("Ana", "ana@x.com", "p1")).unwrap();
        let record = ctl.registry.list().remove(0);

        ctl.open_tab(Panel::Users);
        ctl.begin_edit(&record);

        assert_eq!(ctl.panel(), Panel::Register);
        assert_eq!(*ctl.mode(), FormMode::Editing(record.id.clone()));
        assert_eq!(ctl.draft().password, "p1");
        assert_eq!(ctl.draft().confirm_password, "p1");
        assert_eq!(ctl.draft().email, "ana@x.com");
    }

    #[test]
    fn edit_submit_updates_and_returns_to_create_mode() {
        let mut ctl = controller();
        ctl.submit(form("Ana", "ana@x.com", "p1")).unwrap();
        let record = ctl.registry.list().remove(0);

        ctl.begin_edit(&record);
        let out = ctl.submit(form("Ana Maria", "ana@x.com", "p1")).expect("updated");
        assert!(matches!(out, Submitted::Updated(_)));
        assert_eq!(*ctl.mode(), FormMode::Create);
        assert_eq!(ctl.registry.list()[0].name, "Ana Maria");
    }

    #[test]
    fn edit_submit_with_duplicate_email_stays_in_edit_mode() {
        let mut ctl = controller();
        ctl.submit(form("Ana", "ana@x.com", "p1")).unwrap();
        ctl.submit(form("Bob", "bob@x.com", "p2")).unwrap();
        let bob = ctl.registry.list().remove(1);

        ctl.begin_edit(&bob);
        let err = ctl.submit(form("Bob", "ana@x.com", "p2")).unwrap_err();
        assert_eq!(err, CoreError::DuplicateEmail);
        assert_eq!(*ctl.mode(), FormMode::Editing(bob.id));
    }

    #[test]
    fn delete_twice_is_treated_as_already_absent() {
        let mut ctl = controller();
        ctl.submit(form("Ana", "ana@x.com", "p1")).unwrap();
        let record = ctl.registry.list().remove(0);

        ctl.delete(&record.id).expect("first delete");
        ctl.delete(&record.id).expect("second delete is a no-op");
        assert!(ctl.registry.list().is_empty());
    }

    #[test]
    fn deleting_the_record_under_edit_resets_the_form() {
        let mut ctl = controller();
        ctl.submit(form("Ana", "ana@x.com", "p1")).unwrap();
        let record = ctl.registry.list().remove(0);

        ctl.begin_edit(&record);
        ctl.delete(&record.id).unwrap();
        assert_eq!(*ctl.mode(), FormMode::Create);
        assert_eq!(*ctl.draft(), FormData::default());
    }

    #[test]
    fn list_row_uses_dash_placeholders() {
        let mut ctl = controller();
        ctl.submit(form("Ana", "ana@x.com", "p1")).unwrap();
        let record = ctl.registry.list().remove(0);
        let row = render_row(0, &record);
        assert!(row.contains("Ana"));
        assert!(row.contains("ana@x.com"));
        assert!(row.contains("- | -/-"), "row was: {row}");
    }

    #[test]
    fn profile_address_skips_empty_parts() {
        let mut ctl = controller();
        let mut f = form("Ana", "ana@x.com", "p1");
        f.postal_code = "01310-100".into();
        f.city = "São Paulo".into();
        f.state_code = "SP".into();
        ctl.submit(f).unwrap();
        let record = ctl.registry.list().remove(0);

        assert_eq!(render_address(&record), "São Paulo/SP, 01310-100");
    }

    #[test]
    fn profile_address_is_dash_when_empty() {
        let mut ctl = controller();
        ctl.submit(form("Ana", "ana@x.com", "p1")).unwrap();
        let record = ctl.registry.list().remove(0);
        assert_eq!(render_address(&record), "-");
    }

    #[test]
    fn ana_scenario_end_to_end() {
        let mut ctl = controller();

        let mut first = form("Ana", "Ana@X.com", "p1");
        first.confirm_password = "p1".into();
        ctl.submit(first).expect("first registration");
        assert_eq!(ctl.registry.list()[0].email.as_str(), "ana@x.com");

        let err = ctl.submit(form("Ana", "ANA@x.com", "p1")).unwrap_err();
        assert_eq!(err, CoreError::DuplicateEmail);
        assert_eq!(ctl.registry.list().len(), 1);

        assert!(ctl.session.login("ana@x.com", "p1").is_ok());
        assert_eq!(
            ctl.session.login("ana@x.com", "wrong").unwrap_err(),
            CoreError::InvalidCredentials
        );
    }
}
