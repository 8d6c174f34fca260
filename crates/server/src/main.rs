//! Document QA Engine Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use docqa_config::Settings;
use docqa_core::{EmbeddingClient, LanguageModel};
use docqa_engine::Engine;
use docqa_llm::{HttpEmbeddingClient, HttpLanguageModel, NullEmbeddingClient, StubLanguageModel};
use docqa_server::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("DOCQA_CONFIG").ok();
    let settings = match Settings::load(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("warning: failed to load configuration ({e}), using defaults");
            Settings::default()
        }
    };

    init_tracing(&settings);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting document QA engine server");

    let embedding_client = build_embedding_client(&settings);
    let llm = build_llm(&settings);

    let engine = Engine::bootstrap(settings.clone(), embedding_client, llm).await?;
    tracing::info!(corpus_version = engine.corpus_version().0, "engine ready");

    let app = create_router(engine);
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn build_embedding_client(settings: &Settings) -> Arc<dyn EmbeddingClient> {
    match &settings.external.embedding_endpoint {
        Some(endpoint) => Arc::new(HttpEmbeddingClient::new(
            endpoint.clone(),
            settings.external.embedding_dim,
            Duration::from_millis(settings.external.embed_timeout_ms),
        )),
        None => {
            tracing::warn!("no embedding endpoint configured, embeddings disabled");
            Arc::new(NullEmbeddingClient::new(settings.external.embedding_dim))
        }
    }
}

fn build_llm(settings: &Settings) -> Arc<dyn LanguageModel> {
    match &settings.external.llm_endpoint {
        Some(endpoint) => Arc::new(HttpLanguageModel::new(
            endpoint.clone(),
            "default".to_string(),
            Duration::from_millis(settings.external.llm_timeout_ms),
        )),
        None => {
            tracing::warn!("no LLM endpoint configured, falling back to a stub responder");
            Arc::new(StubLanguageModel::new("Bu soruya şu an yanıt veremiyorum."))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("docqa={},tower_http=info", settings.server.log_level).into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
