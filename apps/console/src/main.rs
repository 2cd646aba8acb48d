//! console — interactive terminal front end for the user registry.
//!
//! Panels mirror the tabbed layout of the registry UI:
//! - Register: the form, with postal-code autofill and a create/edit mode.
//! - Users: the list with per-row edit and delete.
//! - Login: email/password login and the logged-in profile.
//!
//! Storage: in-memory (volatile) or SQLite (file) when the `sqlite` feature
//! is enabled, selected via `STORAGE_PROVIDER`.
//!
//! Run:
//! ```bash
//! cargo run -p console
//! STORAGE_PROVIDER=memory cargo run -p console
//! ```
//!
//! Configuration: see `config.rs` for all environment variables.

mod config;
mod view;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use domain::adapters::memory_store::MemoryStore;
use domain::{Address, KeyValueStore, StoreError, UserRecord, UuidIds};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use viacep::ViaCepClient;
use view::{Command, Controller, FormData, FormMode, Panel, Submitted};

// Local store abstraction supporting memory or sqlite (feature-gated).
enum StoreKind {
    Memory(MemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_store::SqliteStore),
}

#[derive(Clone)]
struct AnyStore {
    kind: Arc<StoreKind>,
}

impl AnyStore {
    fn memory() -> Self {
        Self {
            kind: Arc::new(StoreKind::Memory(MemoryStore::new())),
        }
    }

    #[cfg(feature = "sqlite")]
    fn sqlite_from_env() -> Result<Self, StoreError> {
        Ok(Self {
            kind: Arc::new(StoreKind::Sqlite(sqlite_store::SqliteStore::from_env()?)),
        })
    }
}

impl KeyValueStore for AnyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match &*self.kind {
            StoreKind::Memory(s) => s.get(key),
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match &*self.kind {
            StoreKind::Memory(s) => s.set(key, value),
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match &*self.kind {
            StoreKind::Memory(s) => s.remove(key),
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite(s) => s.remove(key),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);

    let store = build_store_from_env(&cfg);
    let lookup = ViaCepClient::new(cfg.lookup_base_url.clone());
    let mut controller = Controller::new(store, UuidIds);

    if let Some(user) = controller.session.current() {
        info!(email = user.email.as_str(), "restored session");
        println!("Logged in as {} <{}>.", user.name, user.email.as_str());
    }

    let input = io::BufReader::new(io::stdin());
    run(&mut controller, &lookup, input).await;
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_writer(io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(fmt::layer().with_target(true).with_writer(io::stderr))
                .init();
        }
    }
}

// Construct a store instance based on config and feature flags.
fn build_store_from_env(cfg: &config::Config) -> AnyStore {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => match AnyStore::sqlite_from_env() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to init SqliteStore from env: {e}");
                AnyStore::memory()
            }
        },
        _ => AnyStore::memory(),
    }
}

/// Line reader with "[default]" prompts; empty input keeps the default.
struct Prompter<R> {
    input: R,
}

impl<R: BufRead> Prompter<R> {
    fn new(input: R) -> Self {
        Self { input }
    }

    /// Read one line; `None` on end of input.
    fn line(&mut self, label: &str, default: &str) -> io::Result<Option<String>> {
        if default.is_empty() {
            print!("{label}: ");
        } else {
            print!("{label} [{default}]: ");
        }
        io::stdout().flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        let entered = buf.trim();
        Ok(Some(if entered.is_empty() {
            default.to_string()
        } else {
            entered.to_string()
        }))
    }

    fn confirm(&mut self, label: &str) -> io::Result<bool> {
        let answer = self.line(&format!("{label} (y/N)"), "")?;
        Ok(matches!(answer.as_deref(), Some("y") | Some("Y") | Some("yes")))
    }
}

async fn run<R: BufRead>(
    ctl: &mut Controller<AnyStore, UuidIds>,
    lookup: &ViaCepClient,
    input: R,
) {
    let mut prompter = Prompter::new(input);
    print_panel(ctl);

    loop {
        let Ok(Some(line)) = prompter.line(&format!("[{}]", ctl.panel().title().to_lowercase()), "")
        else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        let command = match view::parse_command(&line) {
            Ok(c) => c,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };
        if let Some(msg) = wrong_panel(ctl.panel(), &command) {
            println!("{msg}");
            continue;
        }

        match command {
            Command::Tab(panel) => {
                ctl.open_tab(panel);
                print_panel(ctl);
            }
            Command::Submit => {
                let Some(form) = fill_form(&mut prompter, ctl.draft().clone(), lookup).await else {
                    break;
                };
                submit(ctl, form);
            }
            Command::Cancel => {
                ctl.reset_form();
                println!("Form cleared.");
            }
            Command::List => print_users(ctl),
            Command::Edit(index) => {
                let users = ctl.registry.list();
                match users.get(index) {
                    Some(record) => {
                        ctl.begin_edit(record);
                        println!("Editing {}; 'submit' saves your changes.", record.name);
                    }
                    None => println!("no such row: {}", index + 1),
                }
            }
            Command::Delete(index) => {
                let users = ctl.registry.list();
                let Some(record) = users.get(index) else {
                    println!("no such row: {}", index + 1);
                    continue;
                };
                let confirmed = prompter
                    .confirm(&format!("Really delete {}?", record.name))
                    .unwrap_or(false);
                if !confirmed {
                    continue;
                }
                let id = record.id.clone();
                if let Err(e) = ctl.delete(&id) {
                    warn!(%e, "delete failed");
                }
                print_users(ctl);
            }
            Command::Login => {
                let Ok(Some(email)) = prompter.line("email", "") else { break };
                let Ok(Some(password)) = prompter.line("password", "") else { break };
                match ctl.session.login(&email, &password) {
                    Ok(user) => {
                        println!("Logged in.");
                        print_profile(&user);
                    }
                    Err(e) => println!("{e}"),
                }
            }
            Command::Logout => match ctl.session.logout() {
                Ok(()) => println!("Session ended."),
                Err(e) => warn!(%e, "logout failed"),
            },
            Command::Help => print_help(),
            Command::Quit => break,
        }
    }
}

fn submit(ctl: &mut Controller<AnyStore, UuidIds>, form: FormData) {
    match ctl.submit(form) {
        Ok(Submitted::Created(user)) => {
            println!("User {} registered.", user.name);
            print_users(ctl);
        }
        Ok(Submitted::Updated(user)) => {
            println!("User {} updated.", user.name);
            print_users(ctl);
        }
        Err(e) => println!("{e}"),
    }
}

/// Collect the form, using the retained draft (or, for the address fields,
/// the lookup result) as prompt defaults. `None` on end of input.
async fn fill_form<R: BufRead>(
    prompter: &mut Prompter<R>,
    draft: FormData,
    lookup: &ViaCepClient,
) -> Option<FormData> {
    let name = prompter.line("name", &draft.name).ok()??;
    let email = prompter.line("email", &draft.email).ok()??;
    let password = prompter.line("password", &draft.password).ok()??;
    let confirm_password = prompter
        .line("confirm password", &draft.confirm_password)
        .ok()??;
    let postal_code =
        viacep::format_postal_code(&prompter.line("postal code", &draft.postal_code).ok()??);

    // Autofill defaults from the lookup; each field can still be overridden.
    let mut fetched = Address::default();
    if !postal_code.is_empty() {
        match lookup.lookup(&postal_code).await {
            Ok(Some(address)) => fetched = address,
            Ok(None) => println!("(postal code not found)"),
            // Incomplete codes are skipped silently, like leaving the field.
            Err(viacep::LookupError::InvalidPostalCode) => {}
            Err(err) => warn!(%err, "postal code lookup failed"),
        }
    }
    let street = prompter
        .line("street", fetched.street.as_deref().unwrap_or(&draft.street))
        .ok()??;
    let district = prompter
        .line("district", fetched.district.as_deref().unwrap_or(&draft.district))
        .ok()??;
    let city = prompter
        .line("city", fetched.city.as_deref().unwrap_or(&draft.city))
        .ok()??;
    let state_code = prompter
        .line(
            "state",
            fetched.state_code.as_deref().unwrap_or(&draft.state_code),
        )
        .ok()??;

    Some(FormData {
        name,
        email,
        password,
        confirm_password,
        postal_code,
        street,
        district,
        city,
        state_code,
    })
}

fn wrong_panel(panel: Panel, command: &Command) -> Option<String> {
    let needed = match command {
        Command::Submit | Command::Cancel => Panel::Register,
        Command::List | Command::Edit(_) | Command::Delete(_) => Panel::Users,
        Command::Login | Command::Logout => Panel::Login,
        _ => return None,
    };
    if panel == needed {
        None
    } else {
        Some(format!(
            "'{}' lives on the {} panel; switch with 'tab {}'",
            command.name(),
            needed.title(),
            needed.title().to_lowercase()
        ))
    }
}

fn print_panel(ctl: &Controller<AnyStore, UuidIds>) {
    match ctl.panel() {
        Panel::Register => {
            match ctl.mode() {
                FormMode::Create => println!("-- Register (create mode) --"),
                FormMode::Editing(_) => {
                    println!("-- Register (editing {}) --", ctl.draft().name)
                }
            }
            println!("commands: submit, cancel");
        }
        Panel::Users => print_users(ctl),
        Panel::Login => match ctl.session.current() {
            Some(user) => print_profile(&user),
            None => println!("commands: login"),
        },
    }
}

fn print_users(ctl: &Controller<AnyStore, UuidIds>) {
    let users = ctl.registry.list();
    if users.is_empty() {
        println!("No users registered.");
        return;
    }
    for (i, user) in users.iter().enumerate() {
        println!("{}", view::render_row(i, user));
    }
}

fn print_profile(user: &UserRecord) {
    println!("Name:    {}", user.name);
    println!("Email:   {}", user.email.as_str());
    println!("Address: {}", view::render_address(user));
}

fn print_help() {
    println!("tab register|users|login  switch panel");
    println!("submit                    fill in and submit the form");
    println!("cancel                    discard the draft, back to create mode");
    println!("list                      show registered users");
    println!("edit <n>                  load row n into the form");
    println!("delete <n>                delete row n (asks first)");
    println!("login / logout            manage the session");
    println!("quit                      exit");
}
