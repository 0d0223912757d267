use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use retailpro_auth::{
    config::AuthConfig,
    db,
    repositories::{
        ActivationRepository, RepositoryError, SqliteActivationRepository, SqliteUserRepository,
        UserRepository,
    },
    services::{auth_service::normalize_email, AuthService, HashingService, LogEmailSender},
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "retailpro-auth-cli")]
#[command(about = "CLI tool for managing Retail Pro accounts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Activation token maintenance
    Tokens {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user without an activation code
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Full name
        #[arg(short, long)]
        fullname: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Set a new password for a user
    SetPassword {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Delete expired and already-used activation codes
    Purge,
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn confirm_password(prompt: &str) -> anyhow::Result<(String, String)> {
    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    Ok((password, confirm))
}

fn password_pair(password: Option<String>, prompt: &str) -> anyhow::Result<(String, String)> {
    match password {
        Some(pw) => Ok((pw.clone(), pw)),
        None => confirm_password(prompt),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retailpro_auth=warn".into()),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Connect to database
    let pool = db::create_pool().await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let auth_config = AuthConfig::from_env()?;
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let activation_repository = Arc::new(SqliteActivationRepository::new(pool.clone()));

    // Reuse the domain validation rules; no emails are sent from the CLI
    let auth_service = AuthService::new(
        &auth_config,
        user_repository.clone(),
        activation_repository.clone(),
        Arc::new(LogEmailSender),
    )?;
    let hasher = HashingService::new(&auth_config.hashing)?;

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                email,
                fullname,
                password,
            } => {
                let email = normalize_email(&email);
                let (password, password_confirm) = password_pair(password, "Password")?;

                auth_service.validate_email(&email)?;
                auth_service.validate_password_input(&password, &password_confirm)?;
                if fullname.trim().is_empty() {
                    bail!("Full name is required");
                }

                let password_hash = hasher.hash(&password)?;
                match user_repository
                    .create_user(&email, fullname.trim(), &password_hash)
                    .await
                {
                    Ok(user) => {
                        println!("✅ User created successfully!");
                        println!("  ID: {}", user.id);
                        println!("  Email: {}", user.email);
                        println!("  Name: {}", user.fullname);
                    }
                    Err(RepositoryError::AlreadyExists) => {
                        bail!("User '{}' already exists", email);
                    }
                    Err(err) => {
                        return Err(err).context("failed to create user");
                    }
                }
            }

            UserCommands::SetPassword { email, password } => {
                let email = normalize_email(&email);
                let (new_password, password_confirm) = password_pair(password, "New password")?;
                auth_service.validate_password_input(&new_password, &password_confirm)?;

                let password_hash = hasher.hash(&new_password)?;
                match user_repository.update_password(&email, &password_hash).await {
                    Ok(()) => {
                        println!("✅ Password updated successfully for '{}'!", email);
                    }
                    Err(RepositoryError::NotFound) => {
                        bail!("User '{}' not found", email);
                    }
                    Err(err) => {
                        return Err(err).context("failed to update password");
                    }
                }
            }
        },

        Commands::Tokens { command } => match command {
            TokenCommands::Purge => {
                let removed = activation_repository
                    .purge_expired()
                    .await
                    .context("failed to purge activation codes")?;
                println!("✅ Removed {} activation code(s)", removed);
            }
        },
    }

    Ok(())
}
