//!
//! fitgate CLI
//! -----------
//! Operational entry point for exercising the session engine against a real
//! backend without the UI: log in, inspect and refresh the session, log out.
//! Configuration via environment variables with CLI-flag overrides.

use anyhow::{anyhow, Result};
use std::env;

use fitgate::{
    hardening, ClientConfig, FileCredentialStore, HttpIdentityApi, IdentityPatch, Session, SessionManager,
};

fn parse_value_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut buf = String::new();
    std::io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}

fn print_session(snap: &Session) {
    match &snap.identity {
        Some(identity) => {
            let freshness = match snap.freshness {
                Some(fitgate::Freshness::Verified) => "verified",
                _ => "cached",
            };
            println!(
                "authenticated as {} (role={}, freshness={})",
                identity.username,
                identity.role.as_str(),
                freshness
            );
            if let Some(email) = &identity.email {
                println!("email: {email}");
            }
        }
        None if snap.is_loading => println!("session loading"),
        None => println!("anonymous"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
                .unwrap(),
        )
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!(
            "fitgate session CLI\n\nUSAGE:\n  fitgate <command> [--api-url URL] [--data-dir PATH]\n\nCOMMANDS:\n  login       Sign in with email + password\n  register    Create an account\n  status      Show the current session (cached, no network)\n  whoami      Verify the session against the backend\n  rename      Patch the display name of the current identity\n  logout      End the session and clear stored credentials\n\nENV:\n  FITGATE_API_URL    Backend base URL (default http://localhost:4000/api)\n  FITGATE_DATA_DIR   Credential store directory (default .fitgate)\n  FITGATE_ENV        dev|production (default by build profile)\n"
        );
        return Ok(());
    }

    let mut cfg = ClientConfig::from_env();
    if let Some(url) = parse_value_arg(&args, "--api-url") {
        cfg.api_url = url;
    }
    if let Some(dir) = parse_value_arg(&args, "--data-dir") {
        cfg.data_dir = dir.into();
    }

    let guard = hardening::init(cfg.environment);
    guard.check_transport(&cfg.api_url);
    guard.audit_storage(&cfg.data_dir);

    let store = FileCredentialStore::new(&cfg.data_dir);
    let api = HttpIdentityApi::with_timeout(&cfg.api_url, cfg.timeout)?;
    let manager = SessionManager::new(store, api);

    let command = args[0].as_str();
    match command {
        "login" => {
            manager.hydrate();
            let email = prompt("email")?;
            let password = prompt("password")?;
            match manager.login(&email, &password).await {
                Ok(snap) => print_session(&snap),
                Err(e) => println!("login failed: {}", e.message()),
            }
        }
        "register" => {
            manager.hydrate();
            let username = prompt("username")?;
            let email = prompt("email")?;
            let password = prompt("password")?;
            match manager.register(&username, &email, &password).await {
                Ok(snap) => print_session(&snap),
                Err(e) => println!("registration failed: {}", e.message()),
            }
        }
        "status" => {
            manager.hydrate();
            print_session(&manager.snapshot());
        }
        "whoami" => {
            let snap = manager.start().await;
            print_session(&snap);
        }
        "rename" => {
            let snap = manager.start().await;
            if !snap.is_authenticated {
                return Err(anyhow!("not signed in"));
            }
            let name = prompt("display name")?;
            let patch = IdentityPatch { name: Some(name), ..Default::default() };
            print_session(&manager.update_identity(&patch));
        }
        "logout" => {
            manager.hydrate();
            manager.logout();
            println!("signed out");
        }
        other => return Err(anyhow!("unknown command: {other} (see --help)")),
    }
    Ok(())
}
