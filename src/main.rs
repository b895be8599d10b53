use checkout_bridge::adapters::cache::FileEstimateCache;
use checkout_bridge::adapters::http::{CarbonApi, CheckoutApi, LogisticsApi};
use checkout_bridge::core::shipping::ShippingOptionResolver;
use checkout_bridge::domain::ports::CartStateClient;
use checkout_bridge::utils::{logger, validation::Validate};
use checkout_bridge::CliConfig;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting checkout-bridge CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let checkout = CheckoutApi::new(config.checkout_endpoint.clone());
    let logistics = LogisticsApi::new(config.logistics_endpoint.clone());
    let carbon = CarbonApi::new(config.carbon_endpoint.clone());
    let cache = FileEstimateCache::new(config.cache_path.clone());

    let session = config.session();
    let mut cart = checkout
        .fetch(&config.cart_id, config.refresh, Some(&session.account))
        .await?;
    tracing::info!("Fetched cart {} ({} items)", cart.id, cart.items.len());

    let resolver = ShippingOptionResolver::new(checkout, logistics, carbon, cache);
    let summary = resolver.resolve(&mut cart).await;

    tracing::info!(
        "✅ Resolved {} delivery and {} pickup options",
        summary.delivery_options.len(),
        summary.pickup_options.len()
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
