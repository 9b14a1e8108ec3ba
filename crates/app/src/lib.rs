//! Stencil application composition root
//!
//! Builds every collaborator from configuration, wires them into the creation
//! saga and composes the domain routers into a single application.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use stencil_artifacts::{spawn_garbage_collector, ArtifactStore, ArtifactsState, StoreConfig};
use stencil_artworks::{
    ArtworkPersistence, ArtworksState, CreationConfig, CreationOrchestrator,
    InMemoryArtworkRepository, PgArtworkRepository,
};
use stencil_common::config::{Config, PersistenceProvider};
use stencil_llm::{LlmConfig, LlmPromptDecomposer, LlmServiceFactory};
use stencil_render::{RenderConfig, RenderServiceFactory};

/// Create the main application router and start background tasks
///
/// Fails if the storage layout cannot be verified, a provider is unknown, or
/// the database is unreachable.
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    // Artifact store: verified once, then shared read-only
    let store_config = StoreConfig::from_env()?;
    let store = Arc::new(ArtifactStore::initialize(&store_config)?);
    spawn_garbage_collector(store.clone(), store_config.gc_interval);

    // Prompt decomposition
    let llm = LlmServiceFactory::create(LlmConfig::from_env()?)?;
    let decomposer = Arc::new(LlmPromptDecomposer::new(Arc::from(llm)));

    // Stencil generation
    let render = RenderServiceFactory::create(RenderConfig::from_env()?)?;

    let persistence = create_persistence(config).await?;

    let orchestrator = Arc::new(CreationOrchestrator::new(
        decomposer,
        Arc::from(render.generator),
        Arc::from(render.fetcher),
        store.clone(),
        persistence.clone(),
        CreationConfig::from_env()?,
    ));

    Ok(router(
        ArtifactsState::new(store),
        ArtworksState::new(orchestrator, persistence),
    ))
}

/// Compose domain routers with shared infrastructure routes
pub fn router(artifacts: ArtifactsState, artworks: ArtworksState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Stencil API v0.0.1-SNAPSHOT" }),
        )
        .merge(stencil_artifacts::routes().with_state(artifacts))
        .merge(stencil_artworks::routes().with_state(artworks))
}

async fn create_persistence(config: &Config) -> Result<Arc<dyn ArtworkPersistence>, anyhow::Error> {
    match config.persistence_provider {
        PersistenceProvider::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL is required for the postgres persistence provider")
            })?;
            let pool = PgPool::connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
            sqlx::migrate!("../../migrations").run(&pool).await?;

            tracing::info!("Using postgres artwork persistence");
            Ok(Arc::new(PgArtworkRepository::new(pool)))
        }
        PersistenceProvider::Memory => {
            tracing::warn!("Using in-memory artwork persistence; artworks are lost on restart");
            Ok(Arc::new(InMemoryArtworkRepository::new()))
        }
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
