// Core algorithm exports
pub mod area;
pub mod conversation;
pub mod distance;
pub mod filters;
pub mod price;
pub mod ranker;
pub mod render;
pub mod scoring;

pub use area::{check_area, AreaCheck, AreaDirectory, AreaError};
pub use conversation::{BatchSummary, Conversation, ConversationOptions, EventError, Outcome};
pub use distance::{format_distance, haversine_meters};
pub use filters::{matches_restaurant_type, passes_noise_threshold};
pub use price::{parse_price_range, preset_price_range};
pub use ranker::{rank_candidates, RecommendQuery, RestaurantRanker};
pub use render::{MenuVariant, RenderOptions, ReplyRenderer};
pub use scoring::{popularity_score, score_place};
