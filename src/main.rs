use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, Instrument};

use storefront_cart::app_system::{setup_tracing, CartSystem, SystemError};
use storefront_cart::clients::CartClient;
use storefront_cart::config::{CartConfig, LoadOptions};
use storefront_cart::domain::{Cart, ProductId};
use storefront_cart::error::CartError;
use storefront_cart::messages::UpdateProductAmount;
use storefront_cart::view::{self, render_table, CartView};

#[derive(Debug, Parser)]
#[command(
    name = "storefront-cart",
    about = "Inspect and change the local storefront cart",
    after_help = "Examples:\n  storefront-cart show\n  storefront-cart add 3\n  storefront-cart update 3 2"
)]
struct Cli {
    #[arg(long, global = true, help = "Path to a storefront.toml config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Print the cart with subtotals and total")]
    Show,
    #[command(about = "Add one unit of a product")]
    Add { product_id: ProductId },
    #[command(about = "Remove a product line")]
    Remove { product_id: ProductId },
    #[command(about = "Set the quantity of a product already in the cart")]
    Update { product_id: ProductId, amount: u32 },
    #[command(about = "Raise a line's quantity by one")]
    Increment { product_id: ProductId },
    #[command(about = "Lower a line's quantity by one, never below 1")]
    Decrement { product_id: ProductId },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Cart system failed");
            eprintln!("error: {e}");
            match e {
                SystemError::Config(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, SystemError> {
    let config = CartConfig::load(LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
    })?;

    setup_tracing(&config.logging);
    info!(log_format = ?config.logging.format, "Starting cart");

    let system = CartSystem::from_config(&config)?;

    let span = tracing::info_span!("cart_command", command = ?cli.command);
    let outcome = execute(&system.cart_client, cli.command).instrument(span).await;

    let code = match outcome {
        Ok(cart) => {
            print!("{}", render_table(&CartView::from_cart(&cart)));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, kind = ?e.kind(), "Cart command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    };

    system.shutdown().await?;
    Ok(code)
}

async fn execute(client: &CartClient, command: Command) -> Result<Cart, CartError> {
    match command {
        Command::Show => client.cart().await,
        Command::Add { product_id } => client.add_product(product_id).await,
        Command::Remove { product_id } => view::remove(client, product_id).await,
        Command::Update { product_id, amount } => {
            client
                .update_product_amount(UpdateProductAmount::new(product_id, amount))
                .await
        }
        Command::Increment { product_id } => {
            let cart = client.cart().await?;
            let product = cart
                .get(product_id)
                .ok_or(CartError::ProductNotFound(product_id))?;
            view::increment(client, product).await
        }
        Command::Decrement { product_id } => {
            let cart = client.cart().await?;
            let product = cart
                .get(product_id)
                .ok_or(CartError::ProductNotFound(product_id))?;
            match view::decrement(client, product).await? {
                Some(updated) => Ok(updated),
                None => {
                    eprintln!("Quantity is already 1; use `remove` to drop the line.");
                    Ok(cart)
                }
            }
        }
    }
}
