//! REST surface: `POST /ingest`, `POST /chat`, `GET /health`,
//! `GET /corpus/version`.

use axum::extract::{Json, State};
use axum::routing::{get, post};
use axum::Router;
use docqa_core::{ChatRequest, ChatResponse, IngestResult, RawDocument};
use docqa_engine::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

pub fn create_router(engine: Engine) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/ingest", post(ingest))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .route("/corpus/version", get(corpus_version))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
struct IngestRequestBody {
    documents: Vec<RawDocument>,
}

#[derive(Debug, Serialize)]
struct IngestResponseBody {
    results: Vec<IngestResult>,
}

async fn ingest(
    State(engine): State<Engine>,
    Json(body): Json<IngestRequestBody>,
) -> Json<IngestResponseBody> {
    let results = engine.ingest_batch(body.documents).await;
    Json(IngestResponseBody { results })
}

async fn chat(
    State(engine): State<Engine>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError(docqa_core::Error::InvalidInput("query must not be empty".to_string())));
    }
    Ok(Json(engine.chat(request).await))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn corpus_version(State(engine): State<Engine>) -> Json<serde_json::Value> {
    Json(json!({ "corpus_version": engine.corpus_version().0 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_config::Settings;
    use docqa_core::{GenerateOptions, LanguageModel, Result};
    use docqa_llm::NullEmbeddingClient;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StubLlm;

    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn generate(&self, _prompt: &str, _options: GenerateOptions) -> Result<String> {
            Ok("other\n0.9".to_string())
        }
        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn test_engine() -> Engine {
        Engine::new(Settings::default(), Arc::new(NullEmbeddingClient::new(8)), Arc::new(StubLlm))
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = create_router(test_engine());
        let response = app
            .oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_rejects_empty_query() {
        let app = create_router(test_engine());
        let body = serde_json::to_vec(&json!({ "session_id": "s1", "query": "" })).unwrap();
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
