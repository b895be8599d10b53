pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::SessionContext;

pub use crate::core::mutation::{AddToCartRequest, CartMutationOrchestrator, UpdateItemsRequest};
pub use crate::core::shipping::{ShippingOptionResolver, ShippingSummary};
pub use utils::error::{BridgeError, Result};
