use crate::core::{Conversation, RestaurantRanker};
use crate::models::{ErrorResponse, WebhookBody};
use crate::services::verify_signature;
use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Webhook credentials and enforcement policy
#[derive(Clone)]
pub struct WebhookSettings {
    pub channel_secret: String,
    pub enforce_signature: bool,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<Conversation>,
    pub ranker: Arc<RestaurantRanker>,
    pub webhook: WebhookSettings,
}

/// Failures surfaced at the HTTP boundary
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing X-Line-Signature header")]
    MissingSignature,

    #[error("Signature does not match request body")]
    InvalidSignature,

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Internal error")]
    Internal,
}

impl WebhookError {
    fn code(&self) -> &'static str {
        match self {
            WebhookError::MissingSignature => "missing_signature",
            WebhookError::InvalidSignature => "invalid_signature",
            WebhookError::InvalidJson(_) => "invalid_json",
            WebhookError::Internal => "internal_error",
        }
    }
}

impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            status_code: self.status_code().as_u16(),
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/line/chat", web::post().to(line_webhook))
        .route("/line/webhook", web::post().to(line_webhook));
}

fn check_signature(settings: &WebhookSettings, req: &HttpRequest, body: &[u8]) -> Result<(), WebhookError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match signature {
        Some(signature) if verify_signature(&settings.channel_secret, body, signature) => Ok(()),
        Some(_) if settings.enforce_signature => Err(WebhookError::InvalidSignature),
        None if settings.enforce_signature => Err(WebhookError::MissingSignature),
        Some(_) => {
            tracing::warn!("Signature mismatch ignored, enforcement is off");
            Ok(())
        }
        None => {
            tracing::warn!("Webhook call without signature accepted, enforcement is off");
            Ok(())
        }
    }
}

/// Inbound webhook
///
/// POST /line/chat
///
/// Events are handled one after another and the platform always gets `"OK"`
/// unless the body is unauthenticated, not JSON, or processing panicked.
async fn line_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, WebhookError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("webhook", %request_id);

    if let Err(e) = check_signature(&state.webhook, &req, &body) {
        span.in_scope(|| tracing::warn!("Rejecting webhook call: {}", e));
        return Err(e);
    }

    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        span.in_scope(|| tracing::info!("Rejecting unparsable webhook body: {}", e));
        WebhookError::InvalidJson(e)
    })?;
    let batch = WebhookBody::from_value(value);

    let conversation = state.conversation.clone();
    let outcome = AssertUnwindSafe(async move { conversation.handle_batch(&batch.events).await })
        .catch_unwind()
        .instrument(span.clone())
        .await;

    match outcome {
        Ok(summary) => {
            span.in_scope(|| {
                tracing::info!(
                    handled = summary.handled,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "Webhook batch processed"
                )
            });
            Ok(HttpResponse::Ok().content_type("text/plain; charset=utf-8").body("OK"))
        }
        Err(_) => {
            span.in_scope(|| tracing::error!("Event processing panicked"));
            Err(WebhookError::Internal)
        }
    }
}
