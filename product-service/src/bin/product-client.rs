//! Console client: seeds the service with a supplier and a product, then lists products.

use clap::{Parser, Subcommand};
use product_service::api::models::products::ProductCreate;
use product_service::client::{ProductClient, format_product_line};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root URL of the product service
    #[arg(long, env = "PRODUCT_SERVICE_URL", default_value = "http://localhost:18003/")]
    service_url: Url,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Create supplier "Duncan" and product "Yo-yo" linked to it
    Seed,
    /// Print every product with its supplier
    List,
    /// Seed, then list (default)
    Demo,
}

async fn seed(client: &ProductClient) -> anyhow::Result<()> {
    let supplier = client.create_supplier("Duncan").await?;
    println!("Response: {}", supplier.status.as_u16());

    let product = client
        .create_product(&ProductCreate {
            id: None,
            name: "Yo-yo".to_string(),
            price: Decimal::new(495, 2),
            category: "Toys".to_string(),
            supplier_id: None,
        })
        .await?;
    println!("Response: {}", product.status.as_u16());

    let supplier_uri = supplier
        .location
        .unwrap_or_else(|| format!("Suppliers({})", supplier.entity.id));
    let linked = client.link_supplier(product.entity.id, &supplier_uri).await?;
    println!("Response: {}", linked.as_u16());

    Ok(())
}

async fn list(client: &ProductClient) -> anyhow::Result<()> {
    for product in client.list_products().await? {
        println!("{}", format_product_line(&product));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the listing on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let client = ProductClient::new(args.service_url);

    match args.command.unwrap_or(Command::Demo) {
        Command::Seed => seed(&client).await,
        Command::List => list(&client).await,
        Command::Demo => {
            seed(&client).await?;
            list(&client).await
        }
    }
}
