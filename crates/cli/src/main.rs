//! Steward Link CLI - Database migrations and local account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sl-cli migrate
//!
//! # Show a local account
//! sl-cli account show --id 42
//! sl-cli account show --email user@example.com
//!
//! # Delete a local account (recreated from the Account Steward on next use)
//! sl-cli account delete --id 42
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `account show` - Print a local account as JSON
//! - `account delete` - Delete a local account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sl-cli")]
#[command(author, version, about = "Steward Link CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage local accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Print a local account
    Show(AccountLookup),
    /// Delete a local account
    Delete {
        /// Account ID
        #[arg(short, long)]
        id: i64,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct AccountLookup {
    /// Account ID
    #[arg(short, long)]
    id: Option<i64>,

    /// Login email
    #[arg(short, long)]
    email: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Account { action } => match action {
            AccountAction::Show(AccountLookup { id, email }) => {
                commands::account::show(id, email.as_deref()).await?;
            }
            AccountAction::Delete { id } => commands::account::delete(id).await?,
        },
    }
    Ok(())
}
