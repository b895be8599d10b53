use crate::config::SessionContext;
use crate::domain::model::{
    BareItem, Cart, CustomizationOption, Item, ItemInput, ItemUpdate, MarketingData,
    SubscriptionData, SubscriptionEntry,
};
use crate::domain::ports::CartStateClient;
use crate::utils::error::{BridgeError, Result};
use std::collections::HashMap;

/// Add-items request. `items` may carry customization options; `proxy_account`
/// redirects the mutation to a partner account and skips owner enrichment.
#[derive(Debug, Clone, Default)]
pub struct AddToCartRequest {
    pub cart_id: String,
    pub items: Vec<ItemInput>,
    pub marketing_data: Option<MarketingData>,
    pub sales_channel: Option<String>,
    pub allowed_stale_fields: Vec<String>,
    pub proxy_account: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateItemsRequest {
    pub cart_id: String,
    pub items: Vec<ItemInput>,
    pub split_item: bool,
    pub allowed_stale_fields: Vec<String>,
    pub proxy_account: Option<String>,
}

/// First-occurrence index of every unique id. Duplicate ids keep the first
/// position, matching how the remote service resolves them.
pub fn first_occurrence_index(items: &[Item]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        map.entry(item.unique_id.clone()).or_insert(index);
    }
    map
}

/// Derives subscription entries from the options of the submitted batch.
/// `prior_count` is the item count before the add call; the entry index is
/// absolute on the resulting cart.
pub fn derive_subscription_entries(
    prior_count: usize,
    with_options: &[(usize, &ItemInput)],
) -> Vec<SubscriptionEntry> {
    with_options
        .iter()
        .filter_map(|(batch_index, item)| {
            let options: Vec<CustomizationOption> = item
                .options
                .iter()
                .flatten()
                .filter(|o| o.is_subscription())
                .cloned()
                .collect();
            (!options.is_empty()).then_some(SubscriptionEntry {
                item_index: prior_count + batch_index,
                options,
            })
        })
        .collect()
}

/// Sequences the dependent remote calls the cart service cannot perform
/// atomically. Stages run strictly in order because each consumes the output
/// of the previous one; the base add/update call is the only fatal step.
pub struct CartMutationOrchestrator<C: CartStateClient> {
    client: C,
}

impl<C: CartStateClient> CartMutationOrchestrator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// fetch -> add -> [proxy short-circuit] -> marketing -> attach ->
    /// subscribe -> [refetch].
    pub async fn add_items(&self, request: &AddToCartRequest, session: &SessionContext) -> Result<Cart> {
        let account = request
            .proxy_account
            .as_deref()
            .unwrap_or(&session.account);
        let channel = request
            .sales_channel
            .as_deref()
            .or(session.sales_channel.as_deref());

        // The remote service assigns item positions by append order, so the
        // pre-mutation count anchors every later absolute index.
        let baseline = self
            .client
            .fetch(&request.cart_id, false, Some(account))
            .await?;
        let prior_count = baseline.items.len();

        let bare: Vec<BareItem> = request.items.iter().map(ItemInput::bare).collect();
        let mut working = self
            .client
            .add_items(
                &request.cart_id,
                &bare,
                channel,
                &request.allowed_stale_fields,
                Some(account),
            )
            .await?;
        tracing::debug!(
            "Added {} items to cart {} (previously {})",
            bare.len(),
            request.cart_id,
            prior_count
        );

        // Proxied additions do not own subscription or marketing enrichment
        // for this cart owner.
        if request.proxy_account.is_some() {
            return Ok(working);
        }

        if let Some(marketing) = request
            .marketing_data
            .as_ref()
            .filter(|m| !m.is_empty())
        {
            match self
                .client
                .update_marketing_data(&request.cart_id, marketing, Some(account))
                .await
            {
                Ok(cart) => working = cart,
                Err(err) => tracing::warn!(
                    "Marketing data update failed for cart {}, keeping base result: {}",
                    request.cart_id,
                    err
                ),
            }
        }

        let with_options: Vec<(usize, &ItemInput)> = request
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.has_options())
            .collect();
        if with_options.is_empty() {
            return Ok(working);
        }

        self.attach_options(&request.cart_id, prior_count, &with_options)
            .await?;

        let entries = derive_subscription_entries(prior_count, &with_options);
        if entries.is_empty() {
            return Ok(working);
        }

        let mut subscription_data = working.subscription_data.take().unwrap_or_default();
        subscription_data.subscriptions.extend(entries);
        self.update_subscriptions(&request.cart_id, &subscription_data)
            .await?;

        // The working result predates the attachment and subscription calls.
        self.client
            .fetch(&request.cart_id, false, Some(account))
            .await
    }

    /// Attaches every option of every submitted item, addressed by absolute
    /// index = pre-mutation item count + position within the batch.
    async fn attach_options(
        &self,
        cart_id: &str,
        prior_count: usize,
        with_options: &[(usize, &ItemInput)],
    ) -> Result<()> {
        for (batch_index, item) in with_options {
            let item_index = prior_count + batch_index;
            for option in item.options.iter().flatten() {
                self.client
                    .attach_customization_option(cart_id, item_index, option)
                    .await
                    .map_err(|err| BridgeError::Attachment {
                        item_index,
                        slot: option.slot.clone(),
                        source: Box::new(err),
                    })?;
            }
        }
        Ok(())
    }

    async fn update_subscriptions(
        &self,
        cart_id: &str,
        subscription_data: &SubscriptionData,
    ) -> Result<()> {
        tracing::debug!(
            "Updating subscription data on cart {} ({} entries)",
            cart_id,
            subscription_data.subscriptions.len()
        );
        self.client
            .update_subscription_data(cart_id, subscription_data)
            .await?;
        Ok(())
    }

    /// Resolves missing item indices from the current cart (first occurrence
    /// of the unique id wins) and submits a single update call.
    pub async fn update_items(
        &self,
        request: &UpdateItemsRequest,
        session: &SessionContext,
    ) -> Result<Cart> {
        let account = request
            .proxy_account
            .as_deref()
            .unwrap_or(&session.account);

        let mut updates: Vec<ItemUpdate> =
            request.items.iter().map(ItemInput::update_payload).collect();

        if updates.iter().any(|u| u.index.is_none()) {
            let cart = self
                .client
                .fetch(&request.cart_id, false, Some(account))
                .await?;
            let id_to_index = first_occurrence_index(&cart.items);

            for update in updates.iter_mut().filter(|u| u.index.is_none()) {
                if let Some(unique_id) = &update.unique_id {
                    update.index = id_to_index.get(unique_id).copied();
                }
            }
        }

        self.client
            .update_items(
                &request.cart_id,
                &updates,
                request.split_item,
                &request.allowed_stale_fields,
                Some(account),
            )
            .await
    }
}
