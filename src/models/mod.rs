// Model exports
pub mod domain;
pub mod events;
pub mod messages;
pub mod requests;
pub mod responses;

pub use domain::{
    AreaInput, Category, PlaceCandidate, PriceKind, PriceRange, RankedRestaurant, RankingSettings,
    RestaurantType, SearchType, Step, UserSession, PRICE_UNBOUNDED,
};
pub use events::{EventKind, InboundEvent, Postback, SearchBy, WebhookBody};
pub use messages::{Action, Message};
pub use requests::SearchRequest;
pub use responses::{ErrorResponse, HealthResponse, SearchResponse};
