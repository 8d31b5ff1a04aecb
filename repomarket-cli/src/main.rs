//! Main entry point for the RepoMarket CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

mod commands;

/// RepoMarket CLI
#[derive(Parser)]
#[command(name = "repomarket")]
#[command(about = "Command-line client for the RepoMarket marketplace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the RepoMarket CLI
#[derive(Subcommand)]
enum Commands {
    /// Manage the authenticated session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: String,
    },
}

/// Session subcommands.
#[derive(Subcommand)]
enum SessionCommands {
    /// Sign in and persist the session
    Login(commands::session::LoginArgs),
    /// Show the currently authenticated user
    Me(commands::session::MeArgs),
    /// Sign out and clear the stored session
    Logout(commands::session::LogoutArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Session { command } => match command {
            SessionCommands::Login(args) => commands::session::login(args).await?,
            SessionCommands::Me(args) => commands::session::me(args).await?,
            SessionCommands::Logout(args) => commands::session::logout(args).await?,
        },
        Commands::Config { format } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            commands::config::generate_config(&format)?;
        }
        Commands::Completion { shell } => {
            let shell = shell
                .parse::<clap_complete::Shell>()
                .map_err(|err| anyhow::anyhow!("invalid shell type: {err}"))?;
            commands::completion::generate_completion(shell);
        }
    }

    Ok(())
}
