//! Operator CLI for the expert registry
//!
//! Runs schema migrations, seeds the first elevated admin and hashes
//! passwords for manual account fixes.

use std::io::{self, BufRead};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use registry_core::config::Config;
use registry_core::domains::auth::CredentialVerifier;
use registry_core::domains::users::actions::bootstrap_admin;
use registry_core::kernel::ServerDeps;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "registry_admin")]
#[command(about = "Expert registry operator commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Create the first elevated admin (password from REGISTRY_ADMIN_PASSWORD)
    BootstrapAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },

    /// Read a password from stdin and print its hash
    HashPassword,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,registry_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => migrate().await,
        Commands::BootstrapAdmin { email, name } => bootstrap(&email, &name).await,
        Commands::HashPassword => hash_password(),
    }
}

async fn migrate() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");
    Ok(())
}

async fn bootstrap(email: &str, name: &str) -> Result<()> {
    let password = std::env::var("REGISTRY_ADMIN_PASSWORD")
        .context("REGISTRY_ADMIN_PASSWORD must be set")?;

    let config = Config::from_env().context("Failed to load configuration")?;
    let deps = ServerDeps::from_config(&config).await?;

    let user = bootstrap_admin(email, name, &password, &deps)
        .await
        .context("Failed to create admin")?;

    println!("{}", user.id);
    Ok(())
}

fn hash_password() -> Result<()> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("Password is empty");
    }

    let cost = std::env::var("PASSWORD_HASH_COST")
        .ok()
        .and_then(|cost| cost.trim().parse().ok())
        .unwrap_or(3);
    let verifier =
        CredentialVerifier::new("registry-admin".to_string(), chrono::Duration::hours(1), cost)?;

    println!("{}", verifier.hash_password(password)?);
    Ok(())
}
