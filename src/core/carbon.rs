use crate::domain::model::CarbonEstimate;
use crate::domain::ports::{CarbonEstimateCache, CarbonEstimateClient, LogisticsClient};
use std::collections::HashMap;

/// Fixed reference destination used for carbon estimation.
pub const REFERENCE_DESTINATION_POSTAL_CODE: &str = "10001";

/// Loads the cached estimates for a cart. Both an absent entry and a cache
/// failure degrade to an empty map so resolution can compute fresh values.
pub async fn load_cached_estimates<K: CarbonEstimateCache>(
    cache: &K,
    cart_id: &str,
) -> HashMap<String, CarbonEstimate> {
    match cache.get(cart_id).await {
        Ok(Some(estimates)) => estimates,
        Ok(None) => HashMap::new(),
        Err(err) => {
            tracing::warn!("Carbon estimate cache lookup failed for cart {}: {}", cart_id, err);
            HashMap::new()
        }
    }
}

/// Computes a fresh estimate for an option shipped from `dock_id`. Any failure
/// along the dock lookup or estimation path degrades to a zero estimate;
/// this never returns an error.
pub async fn calculate_carbon_estimate<L, E>(
    logistics: &L,
    carbon: &E,
    dock_id: &str,
) -> CarbonEstimate
where
    L: LogisticsClient,
    E: CarbonEstimateClient,
{
    let origin = match logistics.origin(dock_id).await {
        Ok(origin) => origin,
        Err(err) => {
            tracing::warn!("Dock lookup failed for {}: {}", dock_id, err);
            return CarbonEstimate::default();
        }
    };

    let Some(postal_code) = origin.address.and_then(|a| a.postal_code) else {
        tracing::debug!("Dock {} has no postal code, skipping estimation", dock_id);
        return CarbonEstimate::default();
    };

    match carbon
        .estimate(&postal_code, REFERENCE_DESTINATION_POSTAL_CODE)
        .await
    {
        Ok(estimate) => estimate,
        Err(err) => {
            tracing::warn!("Carbon estimation failed for dock {}: {}", dock_id, err);
            CarbonEstimate::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Origin, OriginAddress};
    use crate::utils::error::{BridgeError, Result, StatusClass};
    use async_trait::async_trait;

    struct MockLogistics {
        postal_code: Option<String>,
        fail: bool,
    }

    #[async_trait]
    impl LogisticsClient for MockLogistics {
        async fn origin(&self, origin_id: &str) -> Result<Origin> {
            if self.fail {
                return Err(BridgeError::Remote {
                    status: StatusClass::Unavailable,
                    message: "logistics down".to_string(),
                });
            }
            Ok(Origin {
                id: Some(origin_id.to_string()),
                address: Some(OriginAddress {
                    postal_code: self.postal_code.clone(),
                    city: None,
                }),
            })
        }
    }

    struct MockCarbon {
        fail: bool,
    }

    #[async_trait]
    impl CarbonEstimateClient for MockCarbon {
        async fn estimate(&self, _from: &str, _to: &str) -> Result<CarbonEstimate> {
            if self.fail {
                return Err(BridgeError::Remote {
                    status: StatusClass::Unavailable,
                    message: "estimation down".to_string(),
                });
            }
            Ok(CarbonEstimate {
                cost: 120,
                carbon_kg: 0.4,
            })
        }
    }

    struct MockCache {
        entries: Option<HashMap<String, CarbonEstimate>>,
        fail: bool,
    }

    #[async_trait]
    impl CarbonEstimateCache for MockCache {
        async fn get(&self, _cart_id: &str) -> Result<Option<HashMap<String, CarbonEstimate>>> {
            if self.fail {
                return Err(BridgeError::Io(std::io::Error::other("disk error")));
            }
            Ok(self.entries.clone())
        }
    }

    #[tokio::test]
    async fn test_estimate_happy_path() {
        let logistics = MockLogistics {
            postal_code: Some("04571".to_string()),
            fail: false,
        };
        let carbon = MockCarbon { fail: false };

        let estimate = calculate_carbon_estimate(&logistics, &carbon, "dock-1").await;
        assert_eq!(estimate.cost, 120);
        assert_eq!(estimate.carbon_kg, 0.4);
    }

    #[tokio::test]
    async fn test_estimate_degrades_to_zero_when_client_fails() {
        let logistics = MockLogistics {
            postal_code: Some("04571".to_string()),
            fail: false,
        };
        let carbon = MockCarbon { fail: true };

        let estimate = calculate_carbon_estimate(&logistics, &carbon, "dock-1").await;
        assert_eq!(estimate, CarbonEstimate::default());
    }

    #[tokio::test]
    async fn test_estimate_degrades_when_dock_lookup_fails() {
        let logistics = MockLogistics {
            postal_code: None,
            fail: true,
        };
        let carbon = MockCarbon { fail: false };

        let estimate = calculate_carbon_estimate(&logistics, &carbon, "dock-1").await;
        assert_eq!(estimate, CarbonEstimate::default());
    }

    #[tokio::test]
    async fn test_estimate_degrades_when_dock_has_no_postal_code() {
        let logistics = MockLogistics {
            postal_code: None,
            fail: false,
        };
        let carbon = MockCarbon { fail: false };

        let estimate = calculate_carbon_estimate(&logistics, &carbon, "dock-1").await;
        assert_eq!(estimate, CarbonEstimate::default());
    }

    #[tokio::test]
    async fn test_cache_absence_is_not_an_error() {
        let cache = MockCache {
            entries: None,
            fail: false,
        };
        let estimates = load_cached_estimates(&cache, "cart-1").await;
        assert!(estimates.is_empty());
    }

    #[tokio::test]
    async fn test_cache_failure_degrades_to_empty() {
        let cache = MockCache {
            entries: None,
            fail: true,
        };
        let estimates = load_cached_estimates(&cache, "cart-1").await;
        assert!(estimates.is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_returns_entries() {
        let mut entries = HashMap::new();
        entries.insert(
            "express".to_string(),
            CarbonEstimate {
                cost: 50,
                carbon_kg: 0.2,
            },
        );
        let cache = MockCache {
            entries: Some(entries),
            fail: false,
        };

        let estimates = load_cached_estimates(&cache, "cart-1").await;
        assert_eq!(estimates.get("express").unwrap().cost, 50);
    }
}
