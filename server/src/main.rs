use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};
use tracing::{info, warn};

use server::app::{build_router, AppState};
use server::auth::StaticTokenVerifier;
use server::config::ServerConfig;
use server::orchestrator::StoryService;
use server::storage::DiskStorage;
use server::store::DocumentStore;
use speech_core::{HttpSpeechClient, Synthesizer};
use story_core::{GenAiClient, StoryGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting story server...");

    let config = ServerConfig::from_env();

    let text_api_key = std::env::var("TEXT_MODEL_API_KEY").unwrap_or_default();
    if text_api_key.is_empty() {
        warn!("TEXT_MODEL_API_KEY not set, generation requests will fail");
    }
    let speech_api_key = std::env::var("SPEECH_API_KEY").unwrap_or_default();
    if speech_api_key.is_empty() {
        warn!("SPEECH_API_KEY not set, synthesis requests will fail");
    }

    let generator = StoryGenerator::new(Arc::new(GenAiClient::new(
        &config.text_model_endpoint,
        &text_api_key,
        &config.text_model_name,
    )));
    let synthesizer = Synthesizer::new(Arc::new(HttpSpeechClient::new(
        &config.speech_endpoint,
        &speech_api_key,
    )));

    let store = Arc::new(DocumentStore::new());
    let storage = Arc::new(DiskStorage::new(&config.data_dir));
    let service = Arc::new(StoryService::new(
        store,
        storage,
        generator,
        synthesizer,
        config.starter_credits,
    ));
    let state = AppState {
        service,
        verifier: Arc::new(StaticTokenVerifier),
    };

    info!(
        "Server configuration loaded: port={}, rate_limit={}/min, data_dir={}",
        config.port, config.rate_limit_per_minute, config.data_dir
    );

    // CORS configuration - environment-aware
    let cors = if let Some(ref allowed_origins) = config.cors_allowed_origins {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin: &String| origin.parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
            permissive_cors()
        } else {
            info!("CORS configured for {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(tower_http::cors::AllowOrigin::list(origins))
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(tower_http::cors::Any)
                .allow_credentials(false)
        }
    } else {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
        permissive_cors()
    };

    // Global rate limit shared by all callers; works behind proxies
    // where per-IP extraction is unreliable.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second((config.rate_limit_per_minute / 60).max(1) as u64)
            .burst_size(config.rate_limit_per_minute)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
    );
    info!("Rate limiting: {} requests per minute", config.rate_limit_per_minute);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors)
        .into_inner();

    let app: Router = build_router(state)
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT."))?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(false)
}

// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    if let Ok(value) = axum::http::HeaderValue::from_str(&request_id) {
        request.headers_mut().insert("x-request-id", value.clone());
        let mut response = next.run(request).await;
        response.headers_mut().insert("x-request-id", value);
        return response;
    }
    next.run(request).await
}
