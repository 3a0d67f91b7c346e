//! Repeater Finder server - background route searches with status polling.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repeater_search::SearchPipeline;
use repeater_server::{
    api,
    config::ServerConfig,
    loops,
    state::AppState,
    tasks::{MemoryTaskStore, SearchRunner, TaskStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    tracing::info!("Starting Repeater Finder server...");

    let config = ServerConfig::from_env();
    let pipeline = SearchPipeline::from_config(&config.search)
        .context("failed to build provider HTTP clients")?;
    let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::new(
        config.task_ttl,
        config.max_tracked_tasks,
    ));
    let runner = SearchRunner::new(store.clone(), pipeline, config.max_concurrent_searches)
        .with_queue_keepalive(config.task_ttl / 2);
    let state = Arc::new(AppState::new(runner));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let prune = tokio::spawn(loops::prune_loop::run_prune_loop(
        store,
        config.task_prune_interval,
        shutdown_tx.subscribe(),
    ));

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!(
        "Listening on {} ({} concurrent searches, {} pending max)",
        addr,
        config.max_concurrent_searches,
        config.max_pending_searches()
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    shutdown_tx.send(()).ok();
    prune.await.ok();
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("repeater_server=debug".parse()?)
        .add_directive("repeater_search=info".parse()?);
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }
    Ok(())
}
