// SeanWeather API v0.1
use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use db::store::PgStore;
use routes::weather::AppState;
use services::session::MemorySessionStore;
use services::wunderground::WundergroundClient;

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// OpenAPI document for the SeanWeather API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SeanWeather API",
        version = "0.1.0",
        description = "Hourly weather for a free-form location. \
            Resolves user input (city, zip code, ...) to a location through a \
            week-long lookup cache, the Weather Underground autocomplete API, \
            and a built-in default, then serves the location's forecast from \
            a 45-minute cache.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Location resolution and forecast summary"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_weather,
        routes::weather::get_fake_weather,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::weather::WeatherResponse,
            routes::weather::WarningMessage,
            services::session::RequestState,
            services::temperatures::Units,
            services::upstream::ForecastPoint,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seanweather_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    let client = WundergroundClient::new(&config.weather_base_url, &config.autocomplete_base_url)
        .expect("Failed to build Weather Underground client");

    if config.api_key == "development" {
        tracing::warn!("WUNDERGROUND_KEY not set, forecast fetches will fail");
    }

    let app_state = AppState {
        store: PgStore::new(pool),
        client,
        sessions: MemorySessionStore::new(),
        api_key: config.api_key.clone(),
        session_cookie: config.session_cookie.clone(),
    };

    // CORS: read-only API, GET only
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(routes::weather::get_weather))
        .route("/fake", get(routes::weather::get_fake_weather))
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
