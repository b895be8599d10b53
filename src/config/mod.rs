#[cfg(feature = "cli")]
pub mod cli;

/// Caller identity for a request: the account the mutation runs against and
/// the sales channel it buys through. Passed explicitly so proxied requests
/// can swap the account without ambient state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub account: String,
    pub sales_channel: Option<String>,
}

impl SessionContext {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            sales_channel: None,
        }
    }

    pub fn with_sales_channel(mut self, channel: impl Into<String>) -> Self {
        self.sales_channel = Some(channel.into());
        self
    }
}
