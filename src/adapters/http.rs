use crate::domain::model::{
    BareItem, CarbonEstimate, Cart, CustomizationOption, ItemUpdate, MarketingData, Origin,
    ShippingDataRequest, SubscriptionData,
};
use crate::domain::ports::{CarbonEstimateClient, CartStateClient, LogisticsClient};
use crate::utils::error::{BridgeError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

/// Maps a non-success response to a typed remote error, keeping the body as
/// the message.
async fn status_to_error(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(BridgeError::Remote {
        status: status.as_u16().into(),
        message,
    })
}

fn with_account(request: RequestBuilder, account: Option<&str>) -> RequestBuilder {
    match account {
        Some(account) => request.query(&[("an", account)]),
        None => request,
    }
}

/// HTTP client for the remote cart service.
pub struct CheckoutApi {
    base_url: String,
    client: Client,
}

impl CheckoutApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    fn cart_url(&self, cart_id: &str) -> String {
        format!("{}/orderForm/{}", self.base_url, cart_id)
    }

    async fn post_attachment<T: Serialize + ?Sized>(
        &self,
        cart_id: &str,
        section: &str,
        payload: &T,
        account: Option<&str>,
    ) -> Result<Cart> {
        let url = format!("{}/attachments/{}", self.cart_url(cart_id), section);
        let request = with_account(self.client.post(&url).json(payload), account);
        let response = status_to_error(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemsBody<'a> {
    order_items: &'a [BareItem],
    allowed_outdated_data: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateItemsBody<'a> {
    order_items: &'a [ItemUpdate],
    no_split_item: bool,
    allowed_outdated_data: &'a [String],
}

#[async_trait]
impl CartStateClient for CheckoutApi {
    async fn fetch(&self, cart_id: &str, refresh: bool, account: Option<&str>) -> Result<Cart> {
        let mut request = self.client.post(self.cart_url(cart_id));
        if refresh {
            request = request.query(&[("refreshOutdatedData", "true")]);
        }
        let request = with_account(request, account).json(&serde_json::json!({}));
        let response = status_to_error(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn add_items(
        &self,
        cart_id: &str,
        items: &[BareItem],
        channel: Option<&str>,
        allowed_stale_fields: &[String],
        account: Option<&str>,
    ) -> Result<Cart> {
        let url = format!("{}/items", self.cart_url(cart_id));
        let mut request = self.client.patch(&url);
        if let Some(channel) = channel {
            request = request.query(&[("sc", channel)]);
        }
        let body = AddItemsBody {
            order_items: items,
            allowed_outdated_data: allowed_stale_fields,
        };
        let request = with_account(request, account).json(&body);
        let response = status_to_error(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn update_items(
        &self,
        cart_id: &str,
        items: &[ItemUpdate],
        split_item: bool,
        allowed_stale_fields: &[String],
        account: Option<&str>,
    ) -> Result<Cart> {
        let url = format!("{}/items/update", self.cart_url(cart_id));
        let body = UpdateItemsBody {
            order_items: items,
            no_split_item: !split_item,
            allowed_outdated_data: allowed_stale_fields,
        };
        let request = with_account(self.client.post(&url), account).json(&body);
        let response = status_to_error(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn update_shipping_data(
        &self,
        cart_id: &str,
        payload: &ShippingDataRequest,
    ) -> Result<Cart> {
        self.post_attachment(cart_id, "shippingData", payload, None)
            .await
    }

    async fn update_marketing_data(
        &self,
        cart_id: &str,
        payload: &MarketingData,
        account: Option<&str>,
    ) -> Result<Cart> {
        self.post_attachment(cart_id, "marketingData", payload, account)
            .await
    }

    async fn update_subscription_data(
        &self,
        cart_id: &str,
        payload: &SubscriptionData,
    ) -> Result<Cart> {
        self.post_attachment(cart_id, "subscriptionData", payload, None)
            .await
    }

    async fn attach_customization_option(
        &self,
        cart_id: &str,
        item_index: usize,
        option: &CustomizationOption,
    ) -> Result<()> {
        let url = format!(
            "{}/items/{}/options/{}",
            self.cart_url(cart_id),
            item_index,
            option.slot
        );
        let request = self.client.post(&url).json(&option.payload);
        status_to_error(request.send().await?).await?;
        Ok(())
    }
}

/// HTTP client for the logistics service's dock registry.
pub struct LogisticsApi {
    base_url: String,
    client: Client,
}

impl LogisticsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LogisticsClient for LogisticsApi {
    async fn origin(&self, origin_id: &str) -> Result<Origin> {
        let url = format!("{}/docks/{}", self.base_url, origin_id);
        let response = status_to_error(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct CarbonEstimateWire {
    total_cost_in_usd_cents: i64,
    equivalent_carbon_in_kg: f64,
}

/// HTTP client for the carbon estimation provider.
pub struct CarbonApi {
    base_url: String,
    client: Client,
}

impl CarbonApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CarbonEstimateClient for CarbonApi {
    async fn estimate(&self, postal_from: &str, postal_to: &str) -> Result<CarbonEstimate> {
        let url = format!("{}/estimates/shipping", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("zip_from", postal_from), ("zip_to", postal_to)]);
        let response = status_to_error(request.send().await?).await?;
        let wire: CarbonEstimateWire = response.json().await?;
        Ok(CarbonEstimate {
            cost: wire.total_cost_in_usd_cents,
            carbon_kg: wire.equivalent_carbon_in_kg,
        })
    }
}
