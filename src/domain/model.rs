use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Totalizer id the remote cart service uses for the shipping running total.
pub const SHIPPING_TOTALIZER: &str = "Shipping";

/// Namespace marker identifying subscription-type customization slots.
pub const SUBSCRIPTION_SLOT_MARKER: &str = "checkout.subscription";

/// Snapshot of the remote cart aggregate. The remote service owns this data;
/// everything here is a transient in-memory copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub shipping_data: Option<ShippingData>,
    #[serde(default)]
    pub totalizers: Vec<Totalizer>,
    #[serde(default)]
    pub subscription_data: Option<SubscriptionData>,
    #[serde(default)]
    pub marketing_data: Option<MarketingData>,
    #[serde(default)]
    pub value: i64,
}

impl Cart {
    pub fn logistics_info(&self) -> &[LogisticsInfo] {
        self.shipping_data
            .as_ref()
            .map(|s| s.logistics_info.as_slice())
            .unwrap_or(&[])
    }

    pub fn shipping_totalizer(&self) -> Option<&Totalizer> {
        self.totalizers.iter().find(|t| t.id == SHIPPING_TOTALIZER)
    }
}

/// An item as stored on the remote cart. `unique_id` is assigned by the remote
/// service and is stable within a session; the item's position in `Cart::items`
/// is its absolute index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub unique_id: String,
    #[serde(default)]
    pub product_id: Option<String>,
    pub seller: String,
    pub quantity: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Caller-supplied item for cart mutations. `index`, `unique_id` and `options`
/// are client-only fields and are stripped before the base add call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub id: String,
    pub quantity: i64,
    pub seller: String,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<CustomizationOption>>,
}

impl ItemInput {
    pub fn bare(&self) -> BareItem {
        BareItem {
            id: self.id.clone(),
            quantity: self.quantity,
            seller: self.seller.clone(),
        }
    }

    pub fn update_payload(&self) -> ItemUpdate {
        ItemUpdate {
            index: self.index,
            unique_id: self.unique_id.clone(),
            quantity: self.quantity,
        }
    }

    pub fn has_options(&self) -> bool {
        self.options.as_ref().is_some_and(|o| !o.is_empty())
    }
}

/// Wire shape of an item in the base add-items call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BareItem {
    pub id: String,
    pub quantity: i64,
    pub seller: String,
}

/// Wire shape of an item in the update-items call, addressed by absolute index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingData {
    #[serde(default)]
    pub selected_addresses: Vec<Address>,
    #[serde(default)]
    pub available_addresses: Vec<Address>,
    #[serde(default)]
    pub logistics_info: Vec<LogisticsInfo>,
    #[serde(default)]
    pub pickup_points: Vec<PickupPoint>,
}

impl ShippingData {
    /// The single default-resolution rule for the selected address: the first
    /// entry of `selected_addresses`, or none.
    pub fn selected_address(&self) -> Option<&Address> {
        self.selected_addresses.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub address_id: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub geo_coordinates: Vec<f64>,
    #[serde(default)]
    pub receiver_name: Option<String>,
}

impl Address {
    pub fn has_geocoordinates(&self) -> bool {
        !self.geo_coordinates.is_empty()
    }
}

/// Per-item shipping eligibility and the SLA options serving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsInfo {
    pub item_index: usize,
    pub item_id: String,
    #[serde(default)]
    pub ships_to: Vec<String>,
    #[serde(default)]
    pub slas: Vec<Sla>,
    #[serde(default)]
    pub selected_sla: Option<String>,
    #[serde(default)]
    pub selected_delivery_channel: Option<DeliveryChannel>,
    #[serde(default)]
    pub address_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryChannel {
    #[serde(rename = "delivery")]
    Delivery,
    #[serde(rename = "pickup-in-point")]
    PickupInPoint,
}

/// A concrete shipping or pickup option: price, lead time and, for pickup
/// channels, the point-of-service metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sla {
    pub id: String,
    pub delivery_channel: DeliveryChannel,
    pub price: i64,
    #[serde(default)]
    pub shipping_estimate: Option<String>,
    #[serde(default)]
    pub transit_time: Option<String>,
    #[serde(default)]
    pub delivery_ids: Vec<DeliveryId>,
    #[serde(default)]
    pub pickup_store_info: Option<PickupStoreInfo>,
    #[serde(default)]
    pub pickup_distance: Option<f64>,
    #[serde(default)]
    pub pickup_point_id: Option<String>,
}

impl Sla {
    /// Origin dock used for carbon estimation. Options routed through several
    /// docks use the first one.
    pub fn dock_id(&self) -> Option<&str> {
        self.delivery_ids.first().and_then(|d| d.dock_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryId {
    #[serde(default)]
    pub courier_id: Option<String>,
    #[serde(default)]
    pub dock_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupStoreInfo {
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupPoint {
    pub id: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub business_hours: Vec<BusinessHour>,
}

/// One weekly recurring opening range of a pickup point. `day_of_week` is
/// 0-based starting on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHour {
    pub day_of_week: u8,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}

/// Named running total on the cart. Once shipping resolution completes, the
/// `Shipping` totalizer value must equal the selected delivery option's price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totalizer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub value: i64,
}

/// Cached cost/carbon figures for a shipping option. Absence in the cache is a
/// valid state, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonEstimate {
    pub cost: i64,
    pub carbon_kg: f64,
}

/// Item-level add-on payload attached at a named slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationOption {
    pub slot: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CustomizationOption {
    /// The single predicate deciding whether an option drives subscription
    /// derivation: its slot is namespaced under [`SUBSCRIPTION_SLOT_MARKER`].
    pub fn is_subscription(&self) -> bool {
        self.slot.contains(SUBSCRIPTION_SLOT_MARKER)
    }
}

/// Recurring-purchase records on the cart. Append-only from this core's
/// perspective: entries are never removed or reordered here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionData {
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    pub item_index: usize,
    pub options: Vec<CustomizationOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marketing_tags: Vec<String>,
}

impl MarketingData {
    /// An empty payload skips the marketing update call entirely.
    pub fn is_empty(&self) -> bool {
        self.utm_source.is_none()
            && self.utm_medium.is_none()
            && self.utm_campaign.is_none()
            && self.coupon.is_none()
            && self.marketing_tags.is_empty()
    }
}

/// Payload of the shipping-data update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDataRequest {
    pub logistics_info: Vec<LogisticsInfo>,
    pub selected_addresses: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_address_if_postal_code_not_found: Option<bool>,
}

/// Shipping origin returned by the logistics collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub address: Option<OriginAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginAddress {
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}
