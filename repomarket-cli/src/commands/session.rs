use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use client::{ApiClient, FileStore, SessionManager};
use rpassword::prompt_password;
use shared::config::ClientConfig;
use shared::models::{User, UserRole};

/// Arguments for `session login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Role to log in as (admin, developer, or buyer)
    #[arg(long, short)]
    pub role: Option<UserRole>,
}

/// Arguments for `session me`.
#[derive(Args, Debug)]
pub struct MeArgs {
    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// Arguments for `session logout`.
#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// Path to the configuration file (optional)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

fn build_session(
    config_path: Option<PathBuf>,
) -> Result<(ApiClient, SessionManager, Arc<FileStore>)> {
    let config = ClientConfig::load_config(config_path).map_err(|err| anyhow!(err))?;
    let store = Arc::new(FileStore::open_default().context("failed to open the session store")?);
    let client = ApiClient::new(&config, store.clone())?;
    let manager = SessionManager::new(client.clone(), store.clone());
    Ok((client, manager, store))
}

/// Sign in and persist the session.
///
/// # Errors
/// Returns an error when the configuration cannot be loaded, input is
/// invalid, or the login is rejected.
pub async fn login(args: LoginArgs) -> Result<()> {
    let (_, manager, store) = build_session(args.config)?;

    let email = prompt("Email: ")?;
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    let response = manager.login(&email, &password, args.role).await?;
    print_session_summary(&response.user);
    println!("session stored at {}", store.path().display());
    Ok(())
}

/// Show the currently authenticated user.
///
/// # Errors
/// Returns an error when no session is stored or the backend rejects the
/// stored token.
pub async fn me(args: MeArgs) -> Result<()> {
    let (client, manager, _) = build_session(args.config)?;

    if !manager.is_authenticated() {
        bail!("no active session found; run `repomarket session login` first");
    }

    let user = client
        .current_user()
        .await
        .context("failed to fetch the current user")?;
    print_session_summary(&user);
    Ok(())
}

/// Sign out and clear the stored session.
///
/// # Errors
/// Returns an error when the configuration cannot be loaded; the local
/// session is cleared even when the backend is unreachable.
pub async fn logout(args: LogoutArgs) -> Result<()> {
    let (_, manager, store) = build_session(args.config)?;

    manager.logout().await;
    println!("Logged out; cleared session entries at {}", store.path().display());
    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}

fn print_session_summary(user: &User) {
    println!("Logged in as {}", user.email);
    println!("name: {}", user.name);
    println!("role: {}", user.role);
    if !user.organization.is_empty() {
        println!("organization: {}", user.organization);
    }
}
