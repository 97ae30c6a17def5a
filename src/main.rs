use std::net::SocketAddr;

use anyhow::Context;
use redis_todo::application::todo_service::TodoServiceImpl;
use redis_todo::config::Config;
use redis_todo::domain::store::KeyValueStore;
use redis_todo::http::routing::{self, todos};
use redis_todo::infrastructure::{kv_repo::KvTodoRepository, memory_store::MemoryStore, redis_store::RedisStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    config.log_startup();

    if config.uses_memory_store() {
        tracing::warn!("using the in-process store; data is lost on exit");
        serve(config, MemoryStore::new()).await
    } else {
        let store = RedisStore::connect(&config.redis_url).await?;
        tracing::info!(url = %config.redis_url, "connected to redis");
        serve(config, store).await
    }
}

async fn serve<K: KeyValueStore + Clone>(config: Config, store: K) -> anyhow::Result<()> {
    let repo = KvTodoRepository::new(store, config.store_timeout).with_clear_scope(config.clear_scope);
    let service = TodoServiceImpl::new(repo);
    let router = routing::app(todos::AppState { service, public_url: config.public_url.clone() });

    let addr: SocketAddr = format!("{}:{}", config.service_host, config.service_port)
        .parse()
        .context("SERVICE_HOST and SERVICE_PORT must form a socket address")?;
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("store connection closed");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
