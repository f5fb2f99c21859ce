use thiserror::Error;

/// User input that does not fit an expected shape.
///
/// Always recovered locally by re-prompting; never shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid price format: {0:?}")]
    InvalidPriceFormat(String),

    #[error("Invalid price range: min {min} exceeds max {max}")]
    InvalidPriceRange { min: u32, max: u32 },

    #[error("Malformed postback data: {0:?}")]
    MalformedPostback(String),

    #[error("Postback is missing the action key")]
    MissingAction,

    #[error("Unknown postback action: {0}")]
    UnknownAction(String),

    #[error("Unknown postback key: {0}")]
    UnknownKey(String),

    #[error("Postback action {action} requires key {key}")]
    MissingKey { action: &'static str, key: &'static str },

    #[error("Invalid value for postback key {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Inbound event that cannot be processed as a conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Event has no reply token")]
    MissingReplyToken,

    #[error("Event has no source user id")]
    MissingUserId,

    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}
