use crate::config::SessionContext;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_url, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "checkout-bridge")]
#[command(about = "Resolves shipping options for a remote shopping cart")]
pub struct CliConfig {
    #[arg(long, default_value = "https://checkout.example.com/api")]
    pub checkout_endpoint: String,

    #[arg(long, default_value = "https://logistics.example.com/api")]
    pub logistics_endpoint: String,

    #[arg(long, default_value = "https://carbon.example.com/api")]
    pub carbon_endpoint: String,

    #[arg(long, default_value = "./cache")]
    pub cache_path: String,

    #[arg(long, default_value = "storefront")]
    pub account: String,

    #[arg(long)]
    pub sales_channel: Option<String>,

    /// Cart to resolve shipping options for.
    #[arg(long)]
    pub cart_id: String,

    #[arg(long, help = "Refresh stale cart data on fetch")]
    pub refresh: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn session(&self) -> SessionContext {
        let session = SessionContext::new(&self.account);
        match &self.sales_channel {
            Some(channel) => session.with_sales_channel(channel),
            None => session,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("checkout_endpoint", &self.checkout_endpoint)?;
        validate_url("logistics_endpoint", &self.logistics_endpoint)?;
        validate_url("carbon_endpoint", &self.carbon_endpoint)?;
        validate_path("cache_path", &self.cache_path)?;
        validate_non_empty_string("account", &self.account)?;
        validate_non_empty_string("cart_id", &self.cart_id)?;
        Ok(())
    }
}
