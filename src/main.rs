//! merchant-auth CLI entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use merchant_auth::auth::{CredentialKind, CredentialResolver, CredentialSource, TokenStore};
use merchant_auth::config::{self, AuthConfig};
use merchant_auth::ui;

#[derive(Parser)]
#[command(name = "merchant-auth")]
#[command(about = "Acquire OAuth2 credentials for Merchant API tooling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.merchant-auth/config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding service-account.json, client-secrets.json, merchant-info.json
    #[arg(long, global = true)]
    authfiles: Option<PathBuf>,

    /// Refresh token file
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    /// Local port for the authorization callback
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Seconds to wait for the browser redirect before giving up
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve credentials, running the browser flow if needed
    Login,

    /// Show which credential source would be used, without network access
    Status,

    /// Delete the stored refresh token
    Logout,

    /// Resolve credentials and print the access token
    Token,
}

impl Commands {
    /// Commands that can end up waiting on the browser redirect
    fn may_authorize(&self) -> bool {
        matches!(self, Commands::Login | Commands::Token)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // The only long wait is the browser callback; Ctrl+C abandons it
    if cli.command.may_authorize() {
        ctrlc::set_handler(|| {
            eprintln!("\nAuthorization cancelled");
            std::process::exit(130);
        })
        .ok();
    }

    if let Err(err) = run(cli).await {
        ui::print_error(&format!("{:#}", err));
        if let Some(hint) = err
            .downcast_ref::<merchant_auth::Error>()
            .and_then(|e| e.remediation())
        {
            ui::print_prompt(&hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Login => run_login(config).await?,
        Commands::Status => run_status(&config),
        Commands::Logout => run_logout(&config)?,
        Commands::Token => {
            let creds = CredentialResolver::new(config).resolve().await?;
            println!("{}", creds.access_token);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AuthConfig> {
    let mut config = match &cli.config {
        Some(path) => config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => config::load().context("loading default config")?,
    };

    if let Some(dir) = &cli.authfiles {
        config = config.with_authfiles_dir(dir);
    }
    if let Some(token_file) = &cli.token_file {
        config.token_path = token_file.clone();
    }
    if let Some(port) = cli.port {
        config.callback_port = port;
    }
    if cli.timeout.is_some() {
        config.callback_timeout_secs = cli.timeout;
    }

    Ok(config)
}

async fn run_login(config: AuthConfig) -> Result<()> {
    ui::print_header("Authorizing access");

    let resolver = CredentialResolver::new(config);
    let source = resolver.select_source()?;

    match &source {
        CredentialSource::ServiceAccount { .. } => {
            ui::print_step("Service account credentials found. Attempting to authenticate.");
        }
        CredentialSource::StoredToken { .. } => {
            ui::print_step("Service account credentials not found.");
            ui::print_step("Token file found. Attempting to use token file to authenticate.");
        }
        CredentialSource::InteractiveFlow { .. } => {
            ui::print_step("Service account credentials and token file not found.");
            ui::print_step("Client secrets file found. Attempting to use client secrets to authenticate.");
        }
    }

    let creds = resolver.load(&source).await?;

    let who = match creds.kind {
        CredentialKind::ServiceAccount => "service account",
        CredentialKind::AuthorizedUser => "authorized user",
    };
    ui::print_success(&format!("Authorization approved ({})", who));

    if let Some(expires_at) = creds.expires_at {
        ui::print_step(&format!("Access token valid until {}", expires_at.to_rfc3339()));
    }
    if let CredentialSource::InteractiveFlow { .. } = source {
        ui::print_step(&format!(
            "Refresh token stored in {}",
            resolver.config().token_path.display()
        ));
    }

    Ok(())
}

fn run_status(config: &AuthConfig) {
    ui::print_header("Credential status");

    ui::print_file("service account", &config.service_account_path);
    ui::print_file("token file", &config.token_path);
    ui::print_file("client secrets", &config.client_secrets_path);
    ui::print_file("merchant info", &config.merchant_info_path);
    println!();

    match merchant_auth::auth::select_source(config) {
        Ok(source) => ui::print_success(&format!("Would use {}", source)),
        Err(e) => ui::print_warning(&e.to_string()),
    }

    if config.merchant_info_path.is_file() {
        match config::read_merchant_ids(&config.merchant_info_path) {
            Ok(ids) => ui::print_step(&format!("Merchant accounts configured: {}", ids.len())),
            Err(e) => ui::print_warning(&e.to_string()),
        }
    }
}

fn run_logout(config: &AuthConfig) -> Result<()> {
    let store = TokenStore::new(config, reqwest::Client::new());

    if store.delete()? {
        ui::print_success(&format!("Removed {}", store.path().display()));
    } else {
        ui::print_step(&format!("No stored token at {}", store.path().display()));
    }

    Ok(())
}
