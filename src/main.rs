use axum::{response::Json, routing::get, Extension, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};

mod elevenlabs_client;
mod gemini_client;
mod handlers;
mod middleware;
mod models;
mod openai_client;
mod scraper;
mod services;
mod storage;
mod utils;

/// Shared vendor clients. Each is optional so the server can boot without
/// every API key and return 503 from the routes that need the missing one.
pub struct AppState {
    pub openai_client: Option<openai_client::OpenAiClient>,
    pub gemini_client: Option<gemini_client::GeminiClient>,
    pub elevenlabs_client: Option<elevenlabs_client::ElevenLabsClient>,
    pub scraper: scraper::LightpandaScraper,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    // Ensure asset directories exist before the static mounts reference them
    for dir in [storage::IMAGES_BASE, storage::GENERATED_SCENES_BASE] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("Failed to create {} directory: {}", dir, e);
        }
    }

    let openai_client = match std::env::var("OPENAI_API_KEY").ok() {
        Some(api_key) => {
            tracing::info!("Initializing OpenAI client...");
            Some(openai_client::OpenAiClient::new(api_key))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not found. Idea, storyboard, and character analysis features will be disabled.");
            None
        }
    };

    let gemini_client = match std::env::var("GOOGLE_API_KEY").ok() {
        Some(api_key) => {
            tracing::info!("Initializing Gemini client (images + Veo video)...");
            Some(gemini_client::GeminiClient::new(api_key))
        }
        None => {
            tracing::warn!("GOOGLE_API_KEY not found. Image and video generation will be disabled.");
            None
        }
    };

    let elevenlabs_client = match std::env::var("ELEVENLABS_API_KEY").ok() {
        Some(api_key) => {
            tracing::info!("Initializing Eleven Labs TTS client...");
            Some(elevenlabs_client::ElevenLabsClient::new(api_key))
        }
        None => {
            tracing::warn!("ELEVENLABS_API_KEY not found. Voiceover generation will be disabled.");
            None
        }
    };

    let shared_state = Arc::new(AppState {
        openai_client,
        gemini_client,
        elevenlabs_client,
        scraper: scraper::LightpandaScraper::new(),
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(handlers::ideas::idea_routes())
        .merge(handlers::storyboard::storyboard_routes())
        .merge(handlers::assets::asset_routes())
        .merge(handlers::scenes::scene_routes())
        .merge(handlers::video::video_routes())
        .merge(handlers::voiceover::voiceover_routes())
        .merge(handlers::drafts::draft_routes())
        .nest_service("/images", ServeDir::new(storage::IMAGES_BASE))
        .nest_service(
            "/generated_scenes",
            ServeDir::new(storage::GENERATED_SCENES_BASE),
        )
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state));

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    tracing::info!("🚀 Ad studio backend listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind server address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "ad-studio-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Detailed health check reporting which vendor clients are configured
async fn health_check(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "openai_configured": state.openai_client.is_some(),
        "gemini_configured": state.gemini_client.is_some(),
        "elevenlabs_configured": state.elevenlabs_client.is_some(),
    }))
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, fmt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,ad_studio=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,ad_studio=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        // Human-readable logging for development
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("🎬 Ad studio backend starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );

    let openai_configured = std::env::var("OPENAI_API_KEY").is_ok();
    let google_configured = std::env::var("GOOGLE_API_KEY").is_ok();
    let elevenlabs_configured = std::env::var("ELEVENLABS_API_KEY").is_ok();
    tracing::info!(
        "Configuration - OpenAI: {}, Gemini/Veo: {}, Eleven Labs: {}",
        if openai_configured { "✅" } else { "❌" },
        if google_configured { "✅" } else { "❌" },
        if elevenlabs_configured { "✅" } else { "❌" }
    );

    Ok(())
}
