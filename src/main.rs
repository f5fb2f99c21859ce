use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use food_line_bot::config::{LoggingSettings, Settings};
use food_line_bot::core::{
    AreaDirectory, Conversation, ConversationOptions, RenderOptions, ReplyRenderer, RestaurantRanker,
};
use food_line_bot::models::{ErrorResponse, RankingSettings};
use food_line_bot::routes::{self, AppState, WebhookSettings};
use food_line_bot::services::{LineClient, MemorySessionStore, PlacesClient, SystemClock};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct JsonError(ErrorResponse);

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    JsonError(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    })
    .into()
}

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn io_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io_error("Configuration error", e)
    })?;

    init_tracing(&settings.logging);
    info!("Starting food-line-bot...");
    info!("Configuration loaded: {:?}", settings);

    if settings.line.channel_secret.is_empty() && settings.line.enforce_signature {
        warn!("No channel secret configured; every webhook call will be rejected");
    }
    if settings.places.api_key.is_empty() {
        warn!("No places API key configured; searches will fail and yield no results");
    }

    let areas = AreaDirectory::load(&settings.bot.areas_file).map_err(|e| {
        error!("Failed to load areas from {}: {}", settings.bot.areas_file, e);
        io_error("Area file error", e)
    })?;
    info!("Loaded {} cities from {}", areas.city_count(), settings.bot.areas_file);

    let places = PlacesClient::new(
        settings.places.api_base_url.clone(),
        settings.places.api_key.clone(),
        settings.places.language.clone(),
        settings.places.timeout_secs,
    )
    .map_err(|e| io_error("Places client error", e))?;

    let line = LineClient::new(
        settings.line.api_base_url.clone(),
        settings.line.channel_access_token.clone(),
        settings.line.timeout_secs,
    )
    .map_err(|e| io_error("LINE client error", e))?;

    let ranking = RankingSettings {
        radius_m: settings.places.radius_m,
        min_review_count: settings.ranking.min_review_count,
        limit: settings.ranking.limit,
    };
    let ranker = Arc::new(RestaurantRanker::new(Arc::new(places), ranking));
    info!("Ranker initialized with {:?}", ranking);

    let sessions = MemorySessionStore::new(settings.session.max_entries, settings.session.ttl_secs);
    info!(
        "Session store initialized ({} entries, TTL: {}s)",
        settings.session.max_entries, settings.session.ttl_secs
    );

    let renderer = ReplyRenderer::new(RenderOptions {
        menu_keyword: settings
            .bot
            .menu_keywords
            .first()
            .cloned()
            .unwrap_or_else(|| "選單".to_string()),
        menu_variant: settings.bot.menu_variant,
        photo_base_url: settings.places.api_base_url.clone(),
        photo_api_key: settings.places.api_key.clone(),
        photo_max_width: settings.places.photo_max_width,
        placeholder_image_url: settings.places.placeholder_image_url.clone(),
    });

    let conversation = Arc::new(Conversation::new(
        Arc::new(sessions),
        Arc::new(line),
        ranker.clone(),
        Arc::new(areas),
        renderer,
        ConversationOptions {
            menu_keywords: settings.bot.menu_keywords.clone(),
        },
        Arc::new(SystemClock),
    ));

    let app_state = AppState {
        conversation,
        ranker,
        webhook: WebhookSettings {
            channel_secret: settings.line.channel_secret.clone(),
            enforce_signature: settings.line.enforce_signature,
        },
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
