use thiserror::Error;

/// Classification attached to a non-success response from a remote collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Unavailable,
    Other(u16),
}

impl From<u16> for StatusClass {
    fn from(status: u16) -> Self {
        match status {
            400 => StatusClass::BadRequest,
            401 | 403 => StatusClass::Unauthorized,
            404 => StatusClass::NotFound,
            409 => StatusClass::Conflict,
            429 | 500 | 502 | 503 | 504 => StatusClass::Unavailable,
            other => StatusClass::Other(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Remote service rejected the request ({status:?}): {message}")]
    Remote { status: StatusClass, message: String },

    #[error("Failed to attach option '{slot}' to item {item_index}: {source}")]
    Attachment {
        item_index: usize,
        slot: String,
        #[source]
        source: Box<BridgeError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
