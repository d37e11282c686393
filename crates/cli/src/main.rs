//! Bloom Market CLI - Cart, pricing and checkout from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add a medium bouquet (base price 100000) to the cart
//! bloom-cli cart add rose-bouquet "Rose Bouquet" 100000 --size M
//!
//! # Show the cart
//! bloom-cli cart show
//!
//! # Decrease a quantity (never goes below 1)
//! bloom-cli cart update rose-bouquet-m -3
//!
//! # Price of a size
//! bloom-cli price 100000 XL
//!
//! # Place the order as a guest with the default address
//! bloom-cli checkout
//! ```
//!
//! The cart lives in `BLOOM_CART_DIR` (default `.bloom`). Checkout needs
//! `BLOOM_SUPABASE_URL` and `BLOOM_SUPABASE_ANON_KEY`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};

use bloom_market_storefront::Error;
use bloom_market_storefront::config::BloomConfig;
use bloom_market_storefront::telemetry;

mod commands;

#[derive(Parser)]
#[command(name = "bloom-cli")]
#[command(author, version, about = "Bloom Market cart and checkout tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Price a product in a bouquet size
    Price {
        /// Base price (size S)
        base: String,
        /// Size code (S, M, L, XL)
        size: String,
    },
    /// Submit the cart as an order
    Checkout(CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show {
        /// Print the cart as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add one unit of a product
    Add {
        /// Product ID
        id: String,
        /// Product name
        name: String,
        /// Base price
        price: String,
        /// Product image URL
        #[arg(short, long, default_value = "")]
        image: String,
        /// Bouquet size; prices the item from the base price
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: String,
    },
    /// Change a product's quantity by a signed amount
    Update {
        /// Product ID
        id: String,
        /// Quantity change, e.g. 2 or -1
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Remove every product
    Clear,
}

#[derive(Args)]
struct CheckoutArgs {
    /// Signed-in user ID (omit for guest checkout)
    #[arg(long)]
    user_id: Option<String>,
    /// Session token of the signed-in user
    #[arg(long, requires = "user_id")]
    access_token: Option<String>,
    /// Recipient name
    #[arg(long)]
    name: Option<String>,
    /// Recipient phone
    #[arg(long)]
    phone: Option<String>,
    /// Street address
    #[arg(long)]
    street: Option<String>,
    /// City
    #[arg(long)]
    city: Option<String>,
    /// District
    #[arg(long)]
    district: Option<String>,
    /// Delivery note
    #[arg(long)]
    note: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match BloomConfig::from_env() {
        Ok(config) => {
            if let Err(e) = telemetry::init(config.log_format, telemetry::DEFAULT_FILTER) {
                eprintln!("Failed to initialize logging: {e}");
            }
            run(cli, &config).await
        }
        Err(e) => Err(Error::from(e).into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        eprintln!("error: {e}");
        // Usage and setup mistakes exit with 2, everything else with 1
        let code = match e.downcast_ref::<Error>() {
            Some(err) if err.is_user_error() => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli, config: &BloomConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show { json } => commands::cart::show(config, json)?,
            CartAction::Add {
                id,
                name,
                price,
                image,
                size,
            } => commands::cart::add(config, &id, &name, &price, &image, size.as_deref())?,
            CartAction::Remove { id } => commands::cart::remove(config, &id)?,
            CartAction::Update { id, delta } => commands::cart::update(config, &id, delta)?,
            CartAction::Clear => commands::cart::clear(config)?,
        },
        Commands::Price { base, size } => commands::price::run(&base, &size)?,
        Commands::Checkout(args) => {
            let address = commands::checkout::AddressInput {
                full_name: args.name,
                phone: args.phone,
                street: args.street,
                city: args.city,
                district: args.district,
                note: args.note,
            };
            commands::checkout::run(config, args.user_id, args.access_token, address).await?;
        }
    }
    Ok(())
}
