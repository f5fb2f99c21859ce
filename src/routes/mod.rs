// Route exports
pub mod search;
pub mod webhook;

use actix_web::web;

pub use webhook::{AppState, WebhookError, WebhookSettings};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(webhook::configure).configure(search::configure);
}
