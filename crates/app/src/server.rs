use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use doc_assist_core::{
    build_system, build_user, ingest_text, load_profile, retrieve, ChatClient, ChunkParams,
    ChromaStore, IngestError, OllamaChat, OllamaEmbedder, RetrievalParams, VectorStore,
    NO_CONTEXT_NOTE,
};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    embedder: OllamaEmbedder,
    chat: OllamaChat,
    store: ChromaStore,
    chunk_params: ChunkParams,
    profiles_dir: PathBuf,
    chat_model: String,
}

impl AppState {
    pub fn new(
        embedder: OllamaEmbedder,
        chat: OllamaChat,
        store: ChromaStore,
        chunk_params: ChunkParams,
        profiles_dir: PathBuf,
        chat_model: String,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                embedder,
                chat,
                store,
                chunk_params,
                profiles_dir,
                chat_model,
            }),
        }
    }
}

pub async fn run(state: AppState, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/sources", get(sources))
        .route("/ingest_text", post(ingest))
        .route("/chat", post(chat))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> Response {
    let shared = &state.inner;

    let dim = match shared.embedder.probe().await {
        Ok(dim) => dim,
        Err(err) => {
            error!(%err, "health: embedding probe failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("embedding provider unavailable: {err}"),
            );
        }
    };

    let chat_ok = shared.chat.probe().await;

    let count = match shared.store.count().await {
        Ok(count) => count.value(),
        Err(err) => {
            error!(%err, "health: store count failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("vector store unavailable: {err}"),
            );
        }
    };

    Json(json!({
        "status": "ok",
        "embedding_dim": dim,
        "chat_model_ready": chat_ok,
        "collection_count": count,
    }))
    .into_response()
}

async fn sources(State(state): State<AppState>) -> Response {
    match state.inner.store.source_counts().await {
        Ok(counts) => {
            let total: usize = counts.iter().map(|entry| entry.chunks).sum();
            Json(json!({ "sources": counts, "total": total })).into_response()
        }
        Err(err) => {
            error!(%err, "sources listing failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("vector store unavailable: {err}"),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct IngestIn {
    source_name: String,
    text: String,
}

async fn ingest(State(state): State<AppState>, Json(payload): Json<IngestIn>) -> Response {
    let shared = &state.inner;

    match ingest_text(
        &payload.source_name,
        &payload.text,
        &shared.chunk_params,
        &shared.embedder,
        &shared.store,
    )
    .await
    {
        Ok(report) => Json(json!({
            "ok": true,
            "source": report.source,
            "chunks_written": report.chunks_written,
            "total_after": report.total_after,
        }))
        .into_response(),
        Err(
            err @ (IngestError::InvalidInput { .. }
            | IngestError::EmptyDocument(_)
            | IngestError::InvalidChunkParams(_)),
        ) => error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string()),
        Err(err) => {
            error!(source = %payload.source_name, %err, "ingest failed");
            error_response(StatusCode::BAD_REQUEST, &format!("ingest failed: {err}"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatIn {
    user_id: String,
    message: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default = "default_threshold")]
    distance_threshold: f32,
    #[serde(default = "default_temperature")]
    temperature: f32,
}

fn default_top_k() -> usize {
    4
}

fn default_threshold() -> f32 {
    0.4
}

fn default_temperature() -> f32 {
    0.3
}

async fn chat(State(state): State<AppState>, Json(payload): Json<ChatIn>) -> Response {
    if payload.user_id.is_empty() || payload.message.is_empty() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "user_id and message must not be empty",
        );
    }
    if !(1..=20).contains(&payload.top_k) {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "top_k must be in 1..=20");
    }
    if !(0.0..=2.0).contains(&payload.distance_threshold) {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "distance_threshold must be in 0.0..=2.0",
        );
    }
    if !(0.0..=1.0).contains(&payload.temperature) {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "temperature must be in 0.0..=1.0",
        );
    }

    let shared = &state.inner;
    let profile = load_profile(&shared.profiles_dir, &payload.user_id);
    let params = RetrievalParams {
        k: payload.top_k,
        threshold: payload.distance_threshold,
        fallback_if_empty: true,
    };

    let result = match retrieve(&payload.message, &params, &shared.embedder, &shared.store).await {
        Ok(result) => result,
        Err(err) => {
            error!(%err, "retrieval failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("retrieval failed: {err}"),
            );
        }
    };

    let system_prompt = build_system(&profile);
    let mut user_prompt = build_user(&payload.message, &result.context);
    if result.used_count == 0 {
        user_prompt.push_str(NO_CONTEXT_NOTE);
    }

    let answer = match shared
        .chat
        .chat(&system_prompt, &user_prompt, payload.temperature)
        .await
    {
        Ok(answer) if !answer.is_empty() => answer,
        Ok(_) => "Model unavailable.".to_string(),
        Err(err) => {
            error!(%err, "chat completion failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("chat failed: {err}"),
            );
        }
    };

    Json(json!({
        "answer": answer,
        "sources": result.citations,
        "used_chunks": result.used_count,
        "meta": { "model": shared.chat_model },
    }))
    .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
