//! AgentBridge CLI - account management tools.
//!
//! # Usage
//!
//! ```bash
//! # Set (or create) an admin's password
//! ab-cli admin set-password -e admin@example.com -p 'new-password'
//!
//! # Create an admin, failing if one exists
//! ab-cli admin create -e admin@example.com -p 'password'
//!
//! # Manage regular users
//! ab-cli user add -e user@example.com -p 'password'
//! ab-cli user list
//! ab-cli user set-password -e user@example.com -p 'new-password'
//! ab-cli user delete -e user@example.com
//!
//! # Check that both tables answer
//! ab-cli health
//! ```
//!
//! Reads the same environment as the server (`AZURE_TABLE_CONN_STRING`,
//! `ADMIN_AZURE_TABLE_NAME`, `USERS_AZURE_TABLE_NAME`, `STORE_TIMEOUT_SECS`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ab-cli")]
#[command(author, version, about = "AgentBridge account tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Check that both account tables are reachable
    Health,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Set an admin's password, creating the admin if needed
    SetPassword {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// New password
        #[arg(short, long)]
        password: String,
    },
    /// Create a new admin
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Add {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// List all users
    List,
    /// Change an existing user's password
    SetPassword {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// New password
        #[arg(short, long)]
        password: String,
    },
    /// Delete a user
    Delete {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ab_cli=info,agentbridge_auth=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = commands::connect()?;

    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::SetPassword { email, password } => {
                commands::admin::set_password(&store, &email, &password).await?;
            }
            AdminAction::Create { email, password } => {
                commands::admin::create(&store, &email, &password).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::Add { email, password } => {
                commands::user::add(&store, &email, &password).await?;
            }
            UserAction::List => commands::user::list(&store).await?,
            UserAction::SetPassword { email, password } => {
                commands::user::set_password(&store, &email, &password).await?;
            }
            UserAction::Delete { email } => commands::user::delete(&store, &email).await?,
        },
        Commands::Health => commands::health(&store).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_admin_set_password() {
        let cli = Cli::try_parse_from([
            "ab-cli",
            "admin",
            "set-password",
            "-e",
            "root@x.com",
            "-p",
            "pw",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminAction::SetPassword { .. }
            })
        ));
    }

    #[test]
    fn test_user_delete_requires_email() {
        assert!(Cli::try_parse_from(["ab-cli", "user", "delete"]).is_err());
    }
}
