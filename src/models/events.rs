use crate::errors::{ProtocolError, ValidationError};
use crate::models::domain::Category;
use serde::Deserialize;
use serde_json::Value;

/// One inbound conversation turn
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user_id: String,
    pub reply_token: String,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Text { text: String },
    Location { latitude: f64, longitude: f64 },
    Postback { data: String },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Text { .. } => "text",
            EventKind::Location { .. } => "location",
            EventKind::Postback { .. } => "postback",
        }
    }
}

/// Webhook body as delivered by the platform
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub events: Vec<Value>,
}

impl WebhookBody {
    /// Extract the event list from an already-parsed JSON document.
    ///
    /// A document without a usable `events` array is an empty batch.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or(WebhookBody { events: Vec::new() })
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(rename = "replyToken")]
    reply_token: Option<String>,
    source: Option<RawSource>,
    message: Option<RawMessage>,
    postback: Option<RawPostback>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    message_type: String,
    text: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPostback {
    data: Option<String>,
}

impl TryFrom<&Value> for InboundEvent {
    type Error = ProtocolError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let raw: RawEvent = serde_json::from_value(value.clone())
            .map_err(|e| ProtocolError::MalformedEvent(e.to_string()))?;

        let reply_token = raw
            .reply_token
            .filter(|t| !t.is_empty())
            .ok_or(ProtocolError::MissingReplyToken)?;

        let user_id = raw
            .source
            .and_then(|s| s.user_id)
            .filter(|id| !id.is_empty())
            .ok_or(ProtocolError::MissingUserId)?;

        let kind = match raw.event_type.as_str() {
            "message" => {
                let message = raw
                    .message
                    .ok_or_else(|| ProtocolError::MalformedEvent("message event without message".into()))?;
                match message.message_type.as_str() {
                    "text" => EventKind::Text {
                        text: message.text.unwrap_or_default(),
                    },
                    "location" => match (message.latitude, message.longitude) {
                        (Some(latitude), Some(longitude)) => EventKind::Location { latitude, longitude },
                        _ => {
                            return Err(ProtocolError::MalformedEvent(
                                "location message without coordinates".into(),
                            ))
                        }
                    },
                    other => return Err(ProtocolError::UnsupportedEvent(format!("message/{}", other))),
                }
            }
            "postback" => {
                let data = raw
                    .postback
                    .and_then(|p| p.data)
                    .ok_or_else(|| ProtocolError::MalformedEvent("postback event without data".into()))?;
                EventKind::Postback { data }
            }
            other => return Err(ProtocolError::UnsupportedEvent(other.to_string())),
        };

        Ok(InboundEvent {
            user_id,
            reply_token,
            kind,
        })
    }
}

/// Search dimension requested from the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBy {
    Area,
    Type,
    Price,
    Popular,
}

/// Decoded postback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postback {
    Search(SearchBy),
    SetType { category: Category, keyword: String },
    CustomType,
    SetPrice { min: u32, max: u32 },
    CustomPrice,
}

const POSTBACK_KEYS: [&str; 6] = ["action", "by", "type", "min", "max", "keyword"];

#[derive(Debug, Default)]
struct PostbackFields {
    action: Option<String>,
    by: Option<String>,
    category: Option<String>,
    min: Option<String>,
    max: Option<String>,
    keyword: Option<String>,
}

impl Postback {
    /// Decode `application/x-www-form-urlencoded` postback data against the known schema
    pub fn parse(data: &str) -> Result<Self, ValidationError> {
        let mut fields = PostbackFields::default();

        for pair in data.split('&').filter(|p| !p.is_empty()) {
            let (key, raw_value) = pair
                .split_once('=')
                .ok_or_else(|| ValidationError::MalformedPostback(data.to_string()))?;
            if !POSTBACK_KEYS.contains(&key) {
                return Err(ValidationError::UnknownKey(key.to_string()));
            }
            let value = urlencoding::decode(&raw_value.replace('+', " "))
                .map_err(|_| ValidationError::MalformedPostback(data.to_string()))?
                .into_owned();

            let slot = match key {
                "action" => &mut fields.action,
                "by" => &mut fields.by,
                "type" => &mut fields.category,
                "min" => &mut fields.min,
                "max" => &mut fields.max,
                _ => &mut fields.keyword,
            };
            *slot = Some(value);
        }

        let action = fields.action.take().ok_or(ValidationError::MissingAction)?;
        match action.as_str() {
            "search" => {
                let by = fields
                    .by
                    .ok_or(ValidationError::MissingKey { action: "search", key: "by" })?;
                let by = match by.as_str() {
                    "area" => SearchBy::Area,
                    "type" => SearchBy::Type,
                    "price" => SearchBy::Price,
                    "popular" => SearchBy::Popular,
                    _ => return Err(ValidationError::InvalidValue { key: "by", value: by }),
                };
                Ok(Postback::Search(by))
            }
            "set_type" => {
                let raw = fields
                    .category
                    .ok_or(ValidationError::MissingKey { action: "set_type", key: "type" })?;
                let category = Category::parse(&raw)
                    .ok_or(ValidationError::InvalidValue { key: "type", value: raw })?;
                let keyword = match fields.keyword.filter(|k| !k.trim().is_empty()) {
                    Some(k) => k.trim().to_string(),
                    None if category != Category::Custom => category.default_keyword().to_string(),
                    None => {
                        return Err(ValidationError::MissingKey { action: "set_type", key: "keyword" })
                    }
                };
                Ok(Postback::SetType { category, keyword })
            }
            "custom_type" => Ok(Postback::CustomType),
            "set_price" => {
                let min = parse_amount("min", fields.min, "set_price")?;
                let max = parse_amount("max", fields.max, "set_price")?;
                if min > max {
                    return Err(ValidationError::InvalidPriceRange { min, max });
                }
                Ok(Postback::SetPrice { min, max })
            }
            "custom_price" => Ok(Postback::CustomPrice),
            _ => Err(ValidationError::UnknownAction(action)),
        }
    }
}

fn parse_amount(
    key: &'static str,
    value: Option<String>,
    action: &'static str,
) -> Result<u32, ValidationError> {
    let value = value.ok_or(ValidationError::MissingKey { action, key })?;
    value
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidValue { key, value })
}
