use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use session::{
    AccountRecord, AccountService, ApiError, AuthGuard, ConfigError, Decision, DenialReason, HttpAccountService,
    RoleAllowList, RoleGuard, RouteDecision, RouteGuard, RouteGuardConfig, Session, SessionConfig, SessionContext, SessionStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("access denied: {0}")]
    Denied(String),
    #[error("session still unresolved")]
    Unresolved,
    #[error("invalid cookie `{0}`; expected name=value")]
    InvalidCookie(String),
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "storefront-cli", about = "Storefront session and access CLI")]
struct Cli {
    /// Account Service base URL.
    #[arg(long, env = "ACCOUNT_API_URL")]
    api_url: Option<String>,

    /// Cookie pairs to send, e.g. `sid=abc`. Printed by `login`.
    #[arg(long, env = "STOREFRONT_SESSION_COOKIE")]
    cookie: Option<String>,

    /// Log session transitions to stderr.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and print the account plus the cookie to reuse.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print the current account, failing when nobody is signed in.
    Whoami,
    /// End the session.
    Logout,
    /// Check the current account against a role allow list.
    Can {
        #[arg(required = true)]
        roles: Vec<String>,
    },
    /// Keep a session open; press Enter to simulate regained focus, Ctrl-C to stop.
    Watch {
        #[arg(long, env = "SESSION_REVALIDATE_SECS")]
        interval_secs: Option<u64>,
    },
    /// Evaluate the route guard for a path without any network call.
    Route {
        path: String,
        /// Request cookie as `name=value`; repeatable.
        #[arg(long = "with-cookie")]
        cookies: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match cli.command {
        Command::Route { path, cookies } => run_route(&path, &cookies),
        Command::Login { email, password } => {
            let config = session_config(cli.api_url.as_deref(), cli.cookie.as_deref(), None)?;
            run_login(&config, &email, &password).await
        }
        Command::Whoami => {
            let (_, store) = open_store(&session_config(cli.api_url.as_deref(), cli.cookie.as_deref(), None)?)?;
            run_whoami(&store).await
        }
        Command::Logout => {
            let (_, store) = open_store(&session_config(cli.api_url.as_deref(), cli.cookie.as_deref(), None)?)?;
            store.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Can { roles } => {
            let (_, store) = open_store(&session_config(cli.api_url.as_deref(), cli.cookie.as_deref(), None)?)?;
            run_can(&store, &roles).await
        }
        Command::Watch { interval_secs } => {
            let config = session_config(cli.api_url.as_deref(), cli.cookie.as_deref(), interval_secs)?;
            run_watch(&config).await
        }
    }
}

/// Flags override environment; everything else falls through to `SessionConfig::from_env`.
fn session_config(
    api_url: Option<&str>,
    cookie: Option<&str>,
    interval_secs: Option<u64>,
) -> Result<SessionConfig, CliError> {
    let config = SessionConfig::from_lookup(|key| match key {
        "ACCOUNT_API_URL" => api_url.map(str::to_owned),
        "STOREFRONT_SESSION_COOKIE" => cookie.map(str::to_owned),
        "SESSION_REVALIDATE_SECS" => interval_secs.map(|secs| secs.to_string()),
        other => std::env::var(other).ok(),
    })?;
    Ok(config)
}

fn open_store(config: &SessionConfig) -> Result<(Arc<HttpAccountService>, SessionStore), CliError> {
    let client = Arc::new(HttpAccountService::new(config)?);
    let store = SessionStore::new(Arc::clone(&client) as Arc<dyn AccountService>);
    Ok((client, store))
}

async fn run_login(config: &SessionConfig, email: &str, password: &str) -> Result<(), CliError> {
    let (client, store) = open_store(config)?;
    tracing::debug!(base_url = client.base_url(), "signing in");
    let user = store.login(email, password).await?;
    print_json(&account_json(&user)?)?;
    if let Some(cookie) = client.session_cookie() {
        eprintln!("export STOREFRONT_SESSION_COOKIE='{cookie}'");
    }
    Ok(())
}

async fn run_whoami(store: &SessionStore) -> Result<(), CliError> {
    store.refresh().await?;
    let session = store.session();
    match AuthGuard::<String>::default().decide(&session) {
        Decision::Pass => print_json(&session_json(&session)?),
        Decision::Pending => Err(CliError::Unresolved),
        Decision::Denied(denial) => Err(CliError::Denied(denial.fallback_or_else(DenialReason::to_string))),
    }
}

async fn run_can(store: &SessionStore, roles: &[String]) -> Result<(), CliError> {
    store.refresh().await?;
    let guard = RoleGuard::<String>::new(RoleAllowList::new(roles));
    match guard.decide(&store.session()) {
        Decision::Pass => {
            println!("allowed");
            Ok(())
        }
        Decision::Pending => Err(CliError::Unresolved),
        Decision::Denied(denial) => Err(CliError::Denied(denial.fallback_or_else(DenialReason::to_string))),
    }
}

async fn run_watch(config: &SessionConfig) -> Result<(), CliError> {
    let (_, store) = open_store(config)?;
    let store = Arc::new(store);
    let mut updates = store.subscribe();
    let context = SessionContext::start(Arc::clone(&store), config.revalidate_interval);
    let focus = context.focus_signal();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = updates.borrow_and_update().clone();
                println!("{}", serde_json::to_string(&session_json(&session)?)?);
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(_) => focus.focus_regained(),
                None => stdin_open = false,
            },
            result = &mut interrupted => {
                result?;
                break;
            }
        }
    }

    context.shutdown().await;
    Ok(())
}

fn run_route(path: &str, cookies: &[String]) -> Result<(), CliError> {
    let guard = RouteGuard::new(RouteGuardConfig::from_env()?);
    match guard.decide(path, parse_cookie_pairs(cookies)?) {
        RouteDecision::Continue => println!("continue"),
        RouteDecision::Redirect(location) => println!("redirect {location}"),
    }
    Ok(())
}

fn parse_cookie_pairs(cookies: &[String]) -> Result<Vec<(&str, &str)>, CliError> {
    cookies
        .iter()
        .map(|raw| {
            raw.split_once('=')
                .map(|(name, value)| (name.trim(), value.trim()))
                .ok_or_else(|| CliError::InvalidCookie(raw.clone()))
        })
        .collect()
}

/// Account JSON with the derived `displayName` alongside the stored fields.
fn account_json(user: &AccountRecord) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(user)?;
    if let Some(map) = value.as_object_mut() {
        map.insert("displayName".to_owned(), Value::String(user.display_name()));
    }
    Ok(value)
}

fn session_json(session: &Session) -> Result<Value, CliError> {
    let user = session.user().map(account_json).transpose()?;
    Ok(serde_json::json!({
        "status": session.status(),
        "user": user,
    }))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
