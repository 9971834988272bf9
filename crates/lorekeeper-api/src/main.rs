//! Lorekeeper API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use lorekeeper_api::error::AppError;
use lorekeeper_api::routes;
use lorekeeper_api::state::AppState;
use lorekeeper_core::clock::SystemClock;
use lorekeeper_core::entity::EntityKind;
use lorekeeper_core::repository::EntityRepositorySet;
use lorekeeper_llm::{ModelConfig, ProviderKind, client_from_config};
use lorekeeper_store::{
    PgEntityRepository, PgProposalStore, PgRelationshipWriter, PgTemplateStore, ensure_schema,
};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_secs(name: &str) -> Result<Option<u64>, AppError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{name} must be an integer: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Builds the model configuration from `LLM_*` environment variables,
/// falling back to the local-daemon defaults.
fn model_config_from_env() -> Result<ModelConfig, AppError> {
    let defaults = ModelConfig::default();

    let provider = match env_or("LLM_PROVIDER", "local").as_str() {
        "local" => ProviderKind::LocalDaemon,
        "hosted" => ProviderKind::HostedApi,
        other => {
            return Err(AppError::Config(format!(
                "LLM_PROVIDER must be 'local' or 'hosted', got '{other}'"
            )));
        }
    };

    let base_url = match provider {
        ProviderKind::LocalDaemon => env_or("LLM_BASE_URL", &defaults.base_url),
        ProviderKind::HostedApi => env_or("LLM_BASE_URL", "https://api.openai.com"),
    };

    let timeout = env_secs("LLM_TIMEOUT_SECS")?
        .map_or(defaults.timeout, Duration::from_secs);
    // LLM_CACHE_TTL_SECS=0 disables response caching.
    let cache_ttl = match env_secs("LLM_CACHE_TTL_SECS")? {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => defaults.cache_ttl,
    };

    Ok(ModelConfig {
        provider,
        base_url,
        api_key: std::env::var("LLM_API_KEY").ok(),
        default_model: env_or("LLM_MODEL", &defaults.default_model),
        timeout,
        cache_ttl,
    })
}

fn repositories(pool: &PgPool) -> EntityRepositorySet {
    let repo = |kind| Arc::new(PgEntityRepository::new(pool.clone(), kind));
    EntityRepositorySet {
        worlds: repo(EntityKind::World),
        campaigns: repo(EntityKind::Campaign),
        sessions: repo(EntityKind::Session),
        characters: repo(EntityKind::Character),
        locations: repo(EntityKind::Location),
        items: repo(EntityKind::Item),
        events: repo(EntityKind::Event),
        powers: repo(EntityKind::Power),
        relationships: repo(EntityKind::Relationship),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Lorekeeper API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
    let host = env_or("HOST", "0.0.0.0");
    let port: u16 = env_or("PORT", "3000")
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Create database connection pool and bootstrap the schema.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    ensure_schema(&pool).await?;

    // Construct the model client.
    let model_config = Arc::new(model_config_from_env()?);
    let chat = client_from_config(&model_config)?;
    tracing::info!(
        model = %model_config.default_model,
        provider = ?model_config.provider,
        "model client configured"
    );

    // Build application state.
    let app_state = AppState {
        clock: Arc::new(SystemClock),
        proposals: Arc::new(PgProposalStore::new(pool.clone())),
        templates: Arc::new(PgTemplateStore::new(pool.clone())),
        repositories: Arc::new(repositories(&pool)),
        relationship_writer: Arc::new(PgRelationshipWriter::new(pool)),
        chat,
    };

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
