use crate::domain::model::{
    BareItem, CarbonEstimate, Cart, CustomizationOption, ItemUpdate, MarketingData, Origin,
    ShippingDataRequest, SubscriptionData,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Remote cart service. Every mutation returns the resulting cart snapshot;
/// transport failures arrive already translated to typed errors.
#[async_trait]
pub trait CartStateClient: Send + Sync {
    async fn fetch(&self, cart_id: &str, refresh: bool, account: Option<&str>) -> Result<Cart>;

    async fn add_items(
        &self,
        cart_id: &str,
        items: &[BareItem],
        channel: Option<&str>,
        allowed_stale_fields: &[String],
        account: Option<&str>,
    ) -> Result<Cart>;

    async fn update_items(
        &self,
        cart_id: &str,
        items: &[ItemUpdate],
        split_item: bool,
        allowed_stale_fields: &[String],
        account: Option<&str>,
    ) -> Result<Cart>;

    async fn update_shipping_data(
        &self,
        cart_id: &str,
        payload: &ShippingDataRequest,
    ) -> Result<Cart>;

    async fn update_marketing_data(
        &self,
        cart_id: &str,
        payload: &MarketingData,
        account: Option<&str>,
    ) -> Result<Cart>;

    async fn update_subscription_data(
        &self,
        cart_id: &str,
        payload: &SubscriptionData,
    ) -> Result<Cart>;

    async fn attach_customization_option(
        &self,
        cart_id: &str,
        item_index: usize,
        option: &CustomizationOption,
    ) -> Result<()>;
}

/// Resolves a shipping origin (dock) by id.
#[async_trait]
pub trait LogisticsClient: Send + Sync {
    async fn origin(&self, origin_id: &str) -> Result<Origin>;
}

/// Computes a cost/carbon estimate for an origin/destination postal-code pair.
#[async_trait]
pub trait CarbonEstimateClient: Send + Sync {
    async fn estimate(&self, postal_from: &str, postal_to: &str) -> Result<CarbonEstimate>;
}

/// Persisted per-cart store of previously computed carbon estimates, keyed by
/// option id. A missing entry is a valid state and maps to `Ok(None)`.
#[async_trait]
pub trait CarbonEstimateCache: Send + Sync {
    async fn get(&self, cart_id: &str) -> Result<Option<HashMap<String, CarbonEstimate>>>;
}
