//! Food LINE Bot - restaurant recommendations over a LINE webhook
//!
//! Users pick a search dimension from a menu, refine it with a price range,
//! a cuisine or an area, then share a location to get a carousel of nearby
//! restaurants ranked by popularity.

pub mod config;
pub mod core;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{parse_price_range, Conversation, RestaurantRanker, ReplyRenderer};
pub use errors::{ProtocolError, ValidationError};
pub use models::{PriceRange, RankedRestaurant, UserSession};
