//! Aizome CLI - Database migrations and seed data.
//!
//! # Usage
//!
//! ```bash
//! # Run schema and session store migrations
//! az-cli migrate
//!
//! # Insert the demo catalog (products, coupons, courses, items, tasks)
//! az-cli seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "az-cli")]
#[command(author, version, about = "Aizome CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with demo data
    Seed {
        /// Only seed one kind of data
        #[arg(short, long, value_enum)]
        only: Option<commands::seed::SeedSet>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let pool = commands::connect().await?;
    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Seed { only } => commands::seed::run(&pool, only).await?,
    }
    Ok(())
}
