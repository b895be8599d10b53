use crate::core::carbon::{calculate_carbon_estimate, load_cached_estimates};
use crate::core::pickup::{format_business_hours, FormattedBusinessHour};
use crate::domain::model::{
    Address, CarbonEstimate, Cart, DeliveryChannel, LogisticsInfo, PickupPoint,
    ShippingData, ShippingDataRequest, Sla, SHIPPING_TOTALIZER,
};
use crate::domain::ports::{
    CarbonEstimateCache, CarbonEstimateClient, CartStateClient, LogisticsClient,
};
use serde::Serialize;
use std::collections::HashSet;

/// Consolidated, de-duplicated view of the shipping options valid for the
/// whole cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSummary {
    pub available_addresses: Vec<Address>,
    pub countries: Vec<String>,
    pub delivery_options: Vec<DeliveryOption>,
    pub pickup_options: Vec<PickupOption>,
    pub selected_address: Option<Address>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOption {
    pub id: String,
    pub price: i64,
    pub shipping_estimate: Option<String>,
    pub is_selected: bool,
    pub carbon: CarbonEstimate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupOption {
    pub id: String,
    pub address: Option<Address>,
    pub price: i64,
    pub shipping_estimate: Option<String>,
    pub is_selected: bool,
    pub friendly_name: Option<String>,
    pub additional_info: Option<String>,
    pub store_distance: Option<f64>,
    pub transit_time: Option<String>,
    pub business_hours: Vec<FormattedBusinessHour>,
}

/// A cart-wide option enriched with its carbon estimate, ready to be
/// partitioned by channel.
#[derive(Debug, Clone)]
pub struct EnrichedOption {
    pub sla: Sla,
    pub is_selected: bool,
    pub carbon: CarbonEstimate,
}

/// Corrective write derived when the selected delivery option's freshly
/// computed price disagrees with the cart's cached shipping totalizer.
#[derive(Debug, Clone)]
pub struct DriftCorrection {
    pub sla_id: String,
    pub expected_price: i64,
    pub delta: i64,
    pub payload: ShippingDataRequest,
}

/// The options offered cart-wide: the de-duplicated union of SLAs across
/// serviceable items (>= 1 SLA), retaining only ids present in every
/// serviceable item's SLA set. Items with zero SLAs contribute nothing and are
/// excluded from the universality check.
pub fn universal_options(logistics_info: &[LogisticsInfo]) -> Vec<Sla> {
    let serviceable: Vec<&LogisticsInfo> = logistics_info
        .iter()
        .filter(|li| !li.slas.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut options: Vec<Sla> = serviceable
        .iter()
        .flat_map(|li| li.slas.iter())
        .filter(|sla| seen.insert(sla.id.clone()))
        .cloned()
        .collect();

    options.retain(|sla| {
        serviceable
            .iter()
            .all(|li| li.slas.iter().any(|s| s.id == sla.id))
    });

    options
}

/// Distinct served countries, in first-seen order.
pub fn distinct_countries(logistics_info: &[LogisticsInfo]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut countries = Vec::new();
    for country in logistics_info.iter().flat_map(|li| li.ships_to.iter()) {
        if seen.insert(country.as_str()) {
            countries.push(country.clone());
        }
    }
    countries
}

pub fn option_is_selected(logistics_info: &[LogisticsInfo], sla_id: &str) -> bool {
    logistics_info
        .iter()
        .any(|li| li.selected_sla.as_deref() == Some(sla_id))
}

/// Builds the shipping-data payload for an address, stamping the address id on
/// every logistics entry. Addresses located by geocoordinates keep their
/// address even when the postal code is unknown to the remote service.
pub fn build_shipping_data(
    address: &Address,
    logistics_info: &[LogisticsInfo],
) -> ShippingDataRequest {
    let stamped = logistics_info
        .iter()
        .map(|li| {
            let mut li = li.clone();
            li.address_id = address.address_id.clone();
            li
        })
        .collect();

    ShippingDataRequest {
        logistics_info: stamped,
        selected_addresses: vec![address.clone()],
        clear_address_if_postal_code_not_found: address.has_geocoordinates().then_some(false),
    }
}

/// Marks `sla_id` selected on every logistics entry that carries it (scoped to
/// `item_id` when given) and rebuilds the shipping payload. Reapplying the
/// same selection yields an identical payload, which is what makes the drift
/// correction safe to repeat.
pub fn select_shipping_option(
    shipping: &ShippingData,
    sla_id: &str,
    item_id: Option<&str>,
    channel: DeliveryChannel,
) -> ShippingDataRequest {
    let logistics_info: Vec<LogisticsInfo> = shipping
        .logistics_info
        .iter()
        .map(|li| {
            let mut li = li.clone();
            li.selected_delivery_channel = Some(channel);
            let applies = li.slas.iter().any(|s| s.id == sla_id)
                && item_id.is_none_or(|id| li.item_id == id);
            if applies {
                li.selected_sla = Some(sla_id.to_string());
            }
            li
        })
        .collect();

    match shipping.selected_address() {
        Some(address) => build_shipping_data(address, &logistics_info),
        None => ShippingDataRequest {
            logistics_info,
            selected_addresses: shipping.selected_addresses.clone(),
            clear_address_if_postal_code_not_found: None,
        },
    }
}

/// Replaces the selected addresses with a single address, leaving everything
/// else untouched.
pub fn select_address(shipping: &ShippingData, address: &Address) -> ShippingData {
    ShippingData {
        selected_addresses: vec![address.clone()],
        ..shipping.clone()
    }
}

/// Pure decision step: partitions the enriched options by channel, detects
/// pricing drift against the shipping totalizer and emits at most one
/// correction. No collaborator is touched here.
pub fn decide(cart: &Cart, options: Vec<EnrichedOption>) -> (ShippingSummary, Option<DriftCorrection>) {
    let shipping = cart.shipping_data.as_ref();
    let pickup_points = shipping.map(|s| s.pickup_points.as_slice()).unwrap_or(&[]);

    let mut delivery_options = Vec::new();
    let mut pickup_options = Vec::new();
    for option in &options {
        match option.sla.delivery_channel {
            DeliveryChannel::Delivery => delivery_options.push(DeliveryOption {
                id: option.sla.id.clone(),
                price: option.sla.price,
                shipping_estimate: option.sla.shipping_estimate.clone(),
                is_selected: option.is_selected,
                carbon: option.carbon,
            }),
            DeliveryChannel::PickupInPoint => {
                pickup_options.push(build_pickup_option(option, pickup_points))
            }
        }
    }

    let selected = delivery_options.iter().find(|o| o.is_selected);

    let correction = match (selected, cart.shipping_totalizer(), shipping) {
        (Some(selected), Some(totalizer), Some(shipping)) if selected.price != totalizer.value => {
            Some(DriftCorrection {
                sla_id: selected.id.clone(),
                expected_price: selected.price,
                delta: selected.price - totalizer.value,
                payload: select_shipping_option(
                    shipping,
                    &selected.id,
                    None,
                    DeliveryChannel::Delivery,
                ),
            })
        }
        _ => None,
    };

    let summary = ShippingSummary {
        available_addresses: shipping
            .map(|s| s.available_addresses.clone())
            .unwrap_or_default(),
        countries: distinct_countries(cart.logistics_info()),
        delivery_options,
        pickup_options,
        selected_address: shipping.and_then(|s| s.selected_address().cloned()),
    };

    (summary, correction)
}

fn build_pickup_option(option: &EnrichedOption, pickup_points: &[PickupPoint]) -> PickupOption {
    let store = option.sla.pickup_store_info.as_ref();
    let business_hours = option
        .sla
        .pickup_point_id
        .as_deref()
        .and_then(|id| pickup_points.iter().find(|pp| pp.id == id))
        .map(|pp| format_business_hours(&pp.business_hours))
        .unwrap_or_default();

    PickupOption {
        id: option.sla.id.clone(),
        address: store.and_then(|s| s.address.clone()),
        price: option.sla.price,
        shipping_estimate: option.sla.shipping_estimate.clone(),
        is_selected: option.is_selected,
        friendly_name: store.and_then(|s| s.friendly_name.clone()),
        additional_info: store.and_then(|s| s.additional_info.clone()),
        store_distance: option.sla.pickup_distance,
        transit_time: option.sla.transit_time.clone(),
        business_hours,
    }
}

/// Applies the correction to the in-memory snapshot so the caller receives a
/// consistent view without waiting for a reload round-trip.
pub fn apply_local(cart: &mut Cart, correction: &DriftCorrection) {
    if let Some(totalizer) = cart
        .totalizers
        .iter_mut()
        .find(|t| t.id == SHIPPING_TOTALIZER)
    {
        totalizer.value = correction.expected_price;
    }
    cart.value += correction.delta;
}

/// Reconciles per-item shipping availability into a globally valid, enriched
/// option set, detecting and correcting pricing drift against the remote
/// cart's cached totals.
pub struct ShippingOptionResolver<C, L, E, K> {
    cart_client: C,
    logistics: L,
    carbon: E,
    cache: K,
}

impl<C, L, E, K> ShippingOptionResolver<C, L, E, K>
where
    C: CartStateClient,
    L: LogisticsClient,
    E: CarbonEstimateClient,
    K: CarbonEstimateCache,
{
    pub fn new(cart_client: C, logistics: L, carbon: E, cache: K) -> Self {
        Self {
            cart_client,
            logistics,
            carbon,
            cache,
        }
    }

    /// Resolves the cart's shipping options. Always succeeds from the caller's
    /// perspective: enrichment failures degrade to zero estimates, and the
    /// corrective write is best-effort. Issues at most one remote write per
    /// call; the snapshot is adjusted locally either way.
    pub async fn resolve(&self, cart: &mut Cart) -> ShippingSummary {
        let retained = universal_options(cart.logistics_info());
        let cached = load_cached_estimates(&self.cache, &cart.id).await;

        let mut enriched = Vec::with_capacity(retained.len());
        for sla in retained {
            let carbon = match cached.get(&sla.id) {
                Some(estimate) => *estimate,
                None => match sla.dock_id() {
                    Some(dock_id) => {
                        calculate_carbon_estimate(&self.logistics, &self.carbon, dock_id).await
                    }
                    None => CarbonEstimate::default(),
                },
            };
            let is_selected = option_is_selected(cart.logistics_info(), &sla.id);
            enriched.push(EnrichedOption {
                sla,
                is_selected,
                carbon,
            });
        }

        let (summary, correction) = decide(cart, enriched);

        if let Some(correction) = correction {
            tracing::debug!(
                "Shipping totalizer on cart {} drifted by {}, reselecting {}",
                cart.id,
                correction.delta,
                correction.sla_id
            );
            apply_local(cart, &correction);

            if let Err(err) = self
                .cart_client
                .update_shipping_data(&cart.id, &correction.payload)
                .await
            {
                tracing::warn!("Corrective shipping update failed for cart {}: {}", cart.id, err);
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Totalizer;

    fn sla(id: &str, channel: DeliveryChannel, price: i64) -> Sla {
        Sla {
            id: id.to_string(),
            delivery_channel: channel,
            price,
            shipping_estimate: Some("2bd".to_string()),
            transit_time: None,
            delivery_ids: Vec::new(),
            pickup_store_info: None,
            pickup_distance: None,
            pickup_point_id: None,
        }
    }

    fn logistics(item_index: usize, slas: Vec<Sla>) -> LogisticsInfo {
        LogisticsInfo {
            item_index,
            item_id: format!("item-{}", item_index),
            ships_to: vec!["USA".to_string()],
            slas,
            selected_sla: None,
            selected_delivery_channel: None,
            address_id: None,
        }
    }

    fn cart_with_shipping(logistics_info: Vec<LogisticsInfo>) -> Cart {
        Cart {
            id: "cart-1".to_string(),
            items: Vec::new(),
            shipping_data: Some(ShippingData {
                selected_addresses: vec![Address {
                    address_id: Some("addr-1".to_string()),
                    ..Default::default()
                }],
                available_addresses: Vec::new(),
                logistics_info,
                pickup_points: Vec::new(),
            }),
            totalizers: vec![Totalizer {
                id: SHIPPING_TOTALIZER.to_string(),
                name: Some("Total Shipping".to_string()),
                value: 8,
            }],
            subscription_data: None,
            marketing_data: None,
            value: 108,
        }
    }

    #[test]
    fn test_universality_filter_drops_partial_options() {
        let logistics_info = vec![
            logistics(
                0,
                vec![
                    sla("normal", DeliveryChannel::Delivery, 10),
                    sla("express", DeliveryChannel::Delivery, 20),
                ],
            ),
            logistics(1, vec![sla("normal", DeliveryChannel::Delivery, 12)]),
        ];

        let options = universal_options(&logistics_info);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].id, "normal");
    }

    #[test]
    fn test_universality_holds_for_every_serviceable_entry() {
        let logistics_info = vec![
            logistics(
                0,
                vec![
                    sla("normal", DeliveryChannel::Delivery, 10),
                    sla("pickup", DeliveryChannel::PickupInPoint, 0),
                ],
            ),
            logistics(
                1,
                vec![
                    sla("pickup", DeliveryChannel::PickupInPoint, 0),
                    sla("normal", DeliveryChannel::Delivery, 11),
                ],
            ),
        ];

        let options = universal_options(&logistics_info);
        for option in &options {
            for li in logistics_info.iter().filter(|li| !li.slas.is_empty()) {
                assert!(li.slas.iter().any(|s| s.id == option.id));
            }
        }
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_zero_sla_items_are_excluded_from_universality() {
        let logistics_info = vec![
            logistics(0, vec![sla("normal", DeliveryChannel::Delivery, 10)]),
            logistics(1, Vec::new()), // unserviceable, must not veto
        ];

        let options = universal_options(&logistics_info);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].id, "normal");
    }

    #[test]
    fn test_options_deduplicate_by_id() {
        let logistics_info = vec![
            logistics(0, vec![sla("normal", DeliveryChannel::Delivery, 10)]),
            logistics(1, vec![sla("normal", DeliveryChannel::Delivery, 12)]),
        ];

        let options = universal_options(&logistics_info);
        assert_eq!(options.len(), 1);
        // first occurrence wins
        assert_eq!(options[0].price, 10);
    }

    #[test]
    fn test_distinct_countries_keeps_first_seen_order() {
        let mut first = logistics(0, vec![sla("normal", DeliveryChannel::Delivery, 10)]);
        first.ships_to = vec!["USA".to_string(), "CAN".to_string()];
        let mut second = logistics(1, vec![sla("normal", DeliveryChannel::Delivery, 10)]);
        second.ships_to = vec!["CAN".to_string(), "MEX".to_string()];

        assert_eq!(
            distinct_countries(&[first, second]),
            vec!["USA".to_string(), "CAN".to_string(), "MEX".to_string()]
        );
    }

    #[test]
    fn test_build_shipping_data_stamps_address_and_geo_flag() {
        let address = Address {
            address_id: Some("addr-9".to_string()),
            geo_coordinates: vec![-46.6, -23.5],
            ..Default::default()
        };
        let logistics_info = vec![logistics(0, vec![sla("normal", DeliveryChannel::Delivery, 10)])];

        let payload = build_shipping_data(&address, &logistics_info);
        assert_eq!(
            payload.logistics_info[0].address_id.as_deref(),
            Some("addr-9")
        );
        assert_eq!(payload.selected_addresses.len(), 1);
        assert_eq!(payload.clear_address_if_postal_code_not_found, Some(false));

        let plain = Address::default();
        let payload = build_shipping_data(&plain, &logistics_info);
        assert_eq!(payload.clear_address_if_postal_code_not_found, None);
    }

    #[test]
    fn test_select_shipping_option_is_idempotent() {
        let mut li = logistics(
            0,
            vec![
                sla("normal", DeliveryChannel::Delivery, 10),
                sla("express", DeliveryChannel::Delivery, 20),
            ],
        );
        li.selected_sla = Some("express".to_string());
        let shipping = ShippingData {
            selected_addresses: vec![Address {
                address_id: Some("addr-1".to_string()),
                ..Default::default()
            }],
            logistics_info: vec![li],
            ..Default::default()
        };

        let first = select_shipping_option(&shipping, "normal", None, DeliveryChannel::Delivery);
        let second = select_shipping_option(&shipping, "normal", None, DeliveryChannel::Delivery);

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(
            first.logistics_info[0].selected_sla.as_deref(),
            Some("normal")
        );
    }

    #[test]
    fn test_select_shipping_option_scoped_to_item() {
        let shipping = ShippingData {
            logistics_info: vec![
                logistics(0, vec![sla("normal", DeliveryChannel::Delivery, 10)]),
                logistics(1, vec![sla("normal", DeliveryChannel::Delivery, 10)]),
            ],
            ..Default::default()
        };

        let payload =
            select_shipping_option(&shipping, "normal", Some("item-1"), DeliveryChannel::Delivery);
        assert_eq!(payload.logistics_info[0].selected_sla, None);
        assert_eq!(
            payload.logistics_info[1].selected_sla.as_deref(),
            Some("normal")
        );
    }

    #[test]
    fn test_select_address_replaces_selection_only() {
        let shipping = ShippingData {
            selected_addresses: vec![Address::default()],
            logistics_info: vec![logistics(0, vec![sla("normal", DeliveryChannel::Delivery, 10)])],
            ..Default::default()
        };
        let new_address = Address {
            address_id: Some("addr-2".to_string()),
            ..Default::default()
        };

        let updated = select_address(&shipping, &new_address);
        assert_eq!(updated.selected_addresses.len(), 1);
        assert_eq!(
            updated.selected_addresses[0].address_id.as_deref(),
            Some("addr-2")
        );
        assert_eq!(updated.logistics_info.len(), 1);
    }

    fn enriched(sla: Sla, is_selected: bool) -> EnrichedOption {
        EnrichedOption {
            sla,
            is_selected,
            carbon: CarbonEstimate::default(),
        }
    }

    #[test]
    fn test_decide_detects_drift_and_apply_local_corrects() {
        let mut li = logistics(0, vec![sla("normal", DeliveryChannel::Delivery, 10)]);
        li.selected_sla = Some("normal".to_string());
        let mut cart = cart_with_shipping(vec![li]);

        let options = vec![enriched(sla("normal", DeliveryChannel::Delivery, 10), true)];
        let (summary, correction) = decide(&cart, options);

        let correction = correction.expect("price 10 vs totalizer 8 must drift");
        assert_eq!(correction.sla_id, "normal");
        assert_eq!(correction.expected_price, 10);
        assert_eq!(correction.delta, 2);
        assert_eq!(summary.delivery_options.len(), 1);

        apply_local(&mut cart, &correction);
        assert_eq!(cart.shipping_totalizer().unwrap().value, 10);
        assert_eq!(cart.value, 110);
    }

    #[test]
    fn test_decide_without_drift_emits_no_correction() {
        let mut li = logistics(0, vec![sla("normal", DeliveryChannel::Delivery, 8)]);
        li.selected_sla = Some("normal".to_string());
        let cart = cart_with_shipping(vec![li]);

        let options = vec![enriched(sla("normal", DeliveryChannel::Delivery, 8), true)];
        let (_, correction) = decide(&cart, options);
        assert!(correction.is_none());
    }

    #[test]
    fn test_decide_ignores_drift_on_unselected_options() {
        let cart = cart_with_shipping(vec![logistics(
            0,
            vec![sla("normal", DeliveryChannel::Delivery, 10)],
        )]);

        let options = vec![enriched(sla("normal", DeliveryChannel::Delivery, 10), false)];
        let (_, correction) = decide(&cart, options);
        assert!(correction.is_none());
    }

    #[test]
    fn test_decide_partitions_channels() {
        let mut pickup = sla("pickup-1", DeliveryChannel::PickupInPoint, 0);
        pickup.pickup_store_info = Some(crate::domain::model::PickupStoreInfo {
            friendly_name: Some("Downtown".to_string()),
            address: None,
            additional_info: None,
        });
        let cart = cart_with_shipping(vec![logistics(
            0,
            vec![sla("normal", DeliveryChannel::Delivery, 8), pickup.clone()],
        )]);

        let options = vec![
            enriched(sla("normal", DeliveryChannel::Delivery, 8), false),
            enriched(pickup, false),
        ];
        let (summary, _) = decide(&cart, options);

        assert_eq!(summary.delivery_options.len(), 1);
        assert_eq!(summary.pickup_options.len(), 1);
        assert_eq!(
            summary.pickup_options[0].friendly_name.as_deref(),
            Some("Downtown")
        );
    }
}
