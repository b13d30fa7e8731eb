//! Rocket Shoes CLI - Cart management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rs-cart show
//!
//! # Show the raw persisted snapshot
//! rs-cart show --json
//!
//! # Add one unit of product 1
//! rs-cart add 1
//!
//! # Set product 1 to 3 units
//! rs-cart update 1 3
//!
//! # Remove product 1
//! rs-cart remove 1
//! ```
//!
//! # Commands
//!
//! - `show` - Print cart lines and subtotal
//! - `add` / `remove` / `update` - Mutate the cart, checked against live stock
//!
//! Configuration comes from the environment (see
//! `rocket_shoes_storefront::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocket_shoes_core::ProductId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "Rocket Shoes cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    Show {
        /// Print the persisted JSON snapshot instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        id: ProductId,

        /// New quantity (values below 1 are ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i32,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rs_cart=info,rocket_shoes_storefront=info,notice=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let manager = commands::open_manager().await?;

    match cli.command {
        Commands::Show { json } => commands::cart::show(&manager, json)?,
        Commands::Add { id } => commands::cart::add(&manager, id).await?,
        Commands::Remove { id } => commands::cart::remove(&manager, id).await?,
        Commands::Update { id, amount } => commands::cart::update(&manager, id, amount).await?,
    }
    Ok(())
}
