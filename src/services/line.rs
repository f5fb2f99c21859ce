use crate::models::messages::{Message, PushRequest, ReplyRequest};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{digest::InvalidLength, Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

const REPLY_PATH: &str = "/v2/bot/message/reply";
const PUSH_PATH: &str = "/v2/bot/message/push";

/// Errors that can occur when delivering messages
#[derive(Debug, Error)]
pub enum LineError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {status} - {body}")]
    ApiError { status: u16, body: String },

    #[error("Unauthorized: invalid channel access token")]
    Unauthorized,
}

/// Outbound side of the messaging platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Answer an inbound event; the reply token is single-use
    async fn reply(&self, reply_token: &str, messages: &[Message]) -> Result<(), LineError>;

    /// Send to a user outside the reply-token window
    async fn push(&self, user_id: &str, messages: &[Message]) -> Result<(), LineError>;
}

/// LINE Messaging API client
pub struct LineClient {
    base_url: String,
    access_token: String,
    client: Client,
}

impl LineClient {
    pub fn new(base_url: String, access_token: String, timeout_secs: u64) -> Result<Self, LineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            access_token,
            client,
        })
    }

    async fn post<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), LineError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LineError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(LineError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Messenger for LineClient {
    async fn reply(&self, reply_token: &str, messages: &[Message]) -> Result<(), LineError> {
        self.post(REPLY_PATH, &ReplyRequest { reply_token, messages }).await?;
        tracing::debug!("Replied with {} message(s)", messages.len());
        Ok(())
    }

    async fn push(&self, user_id: &str, messages: &[Message]) -> Result<(), LineError> {
        self.post(PUSH_PATH, &PushRequest { to: user_id, messages }).await?;
        tracing::debug!("Pushed {} message(s) to {}", messages.len(), user_id);
        Ok(())
    }
}

/// Compute the `X-Line-Signature` value for a request body.
///
/// The signature is base64(HMAC-SHA256(channel_secret, body)).
pub fn compute_signature(channel_secret: &str, body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a webhook signature in constant time
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
