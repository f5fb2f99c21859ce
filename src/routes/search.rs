use crate::core::RecommendQuery;
use crate::models::{
    Category, ErrorResponse, HealthResponse, RestaurantType, SearchRequest, SearchResponse,
};
use crate::routes::webhook::AppState;
use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/search", web::get().to(search_restaurants));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message,
        status_code: 400,
    })
}

/// Debug search endpoint
///
/// GET /search?location=25.0478,121.5319&radius=1000&keyword=拉麵
///
/// Runs the same ranking pipeline as a shared location, without a session.
async fn search_restaurants(
    state: web::Data<AppState>,
    query: web::Query<SearchRequest>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return bad_request(errors.to_string());
    }

    let Some((latitude, longitude)) = query.coordinates() else {
        return bad_request(format!("Invalid location: {:?}", query.location));
    };

    let restaurant_type = query
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| RestaurantType {
            category: Category::Custom,
            keyword: k.to_string(),
        });

    let recommend = RecommendQuery {
        latitude,
        longitude,
        price_range: None,
        restaurant_type,
        radius_m: query.radius,
    };

    match state.ranker.try_recommend(&recommend).await {
        Ok(results) => {
            let total = results.len();
            HttpResponse::Ok().json(SearchResponse { results, total })
        }
        Err(e) => {
            tracing::error!("Search endpoint failed: {}", e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Upstream search failed".to_string(),
                message: "The places API could not be queried".to_string(),
                status_code: 502,
            })
        }
    }
}
