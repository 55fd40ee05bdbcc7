//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for sessions, questions and catalog memory.

use crate::agent::{DispatchOutcome, Tool, ToolCallRecord};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SwitchboardError;
use crate::memory::Episode;
use crate::orchestrator::Orchestrator;
use crate::session::SessionStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    sessions: SessionStore,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let state = Arc::new(AppState {
        orchestrator,
        sessions: SessionStore::new(),
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Switchboard API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Agents", "GET    /agents");
    Output::kv("Ask (one-shot)", "POST   /ask");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Ask in session", "POST   /sessions/:id/ask");
    Output::kv("End session", "DELETE /sessions/:id");
    Output::kv("Session memory", "GET    /sessions/:id/memory");
    Output::kv("Clear memory", "DELETE /sessions/:id/memory[/:podcast]");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/agents", get(list_agents))
        .route("/ask", post(ask_once))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/ask", post(ask_in_session))
        .route("/sessions/{id}/memory", get(get_memory).delete(clear_memory))
        .route("/sessions/{id}/memory/{podcast}", delete(clear_podcast))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    session_id: Uuid,
    answer: String,
    agents: Vec<String>,
    tool_calls: Vec<ToolCallRecord>,
    steps: usize,
    completed: bool,
}

impl AskResponse {
    fn new(session_id: Uuid, outcome: DispatchOutcome) -> Self {
        Self {
            session_id,
            answer: outcome.answer,
            agents: outcome.agents,
            tool_calls: outcome.tool_calls,
            steps: outcome.steps,
            completed: outcome.completed,
        }
    }
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AgentInfo {
    name: String,
    title: String,
    model: Option<String>,
    tools: Vec<String>,
    transfers: Vec<String>,
}

#[derive(Serialize)]
struct AgentsResponse {
    entry: String,
    agents: Vec<AgentInfo>,
}

#[derive(Debug, Serialize)]
struct CatalogInfo {
    podcast_name: String,
    updated_at: Option<DateTime<Utc>>,
    episodes: Vec<Episode>,
}

#[derive(Debug, Serialize)]
struct MemoryResponse {
    catalogs: Vec<CatalogInfo>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

impl IntoResponse for SwitchboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            SwitchboardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SwitchboardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}

fn parse_session_id(id: &str) -> Result<Uuid, SwitchboardError> {
    Uuid::parse_str(id).map_err(|_| SwitchboardError::SessionNotFound(id.to_string()))
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_agents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.orchestrator.registry();
    let agents = registry
        .agents()
        .map(|agent| AgentInfo {
            name: agent.name().to_string(),
            title: agent.title().to_string(),
            model: agent.model().map(str::to_string),
            tools: agent
                .tools()
                .iter()
                .filter_map(|t| match t {
                    Tool::Data(tool) => Some(tool.name().to_string()),
                    Tool::Transfer(_) => None,
                })
                .collect(),
            transfers: agent.transfer_targets().map(str::to_string).collect(),
        })
        .collect();

    Json(AgentsResponse {
        entry: registry.entry().name().to_string(),
        agents,
    })
}

async fn ask_once(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, SwitchboardError> {
    let mut session = state.orchestrator.session();
    let outcome = session.ask(&request.question).await?;
    Ok(Json(AskResponse::new(session.id(), outcome)))
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.orchestrator.session();
    let response = SessionResponse {
        session_id: session.id(),
        created_at: session.created_at(),
    };
    state.sessions.insert(session);
    info!("Created session {}", response.session_id);
    (StatusCode::CREATED, Json(response))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, SwitchboardError> {
    let id = parse_session_id(&id)?;
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SwitchboardError::SessionNotFound(id.to_string()))
    }
}

async fn ask_in_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, SwitchboardError> {
    let id = parse_session_id(&id)?;
    let session = state.sessions.get(&id)?;
    let mut session = session.lock().await;
    let outcome = session.ask(&request.question).await?;
    Ok(Json(AskResponse::new(id, outcome)))
}

async fn get_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MemoryResponse>, SwitchboardError> {
    let id = parse_session_id(&id)?;
    let session = state.sessions.get(&id)?;
    let session = session.lock().await;
    let memory = session.memory();

    let catalogs = memory
        .podcasts()
        .into_iter()
        .map(|name| CatalogInfo {
            updated_at: memory.last_updated(&name),
            episodes: memory.get_episodes(&name).unwrap_or_default(),
            podcast_name: name,
        })
        .collect();

    Ok(Json(MemoryResponse { catalogs }))
}

async fn clear_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, SwitchboardError> {
    let id = parse_session_id(&id)?;
    let session = state.sessions.get(&id)?;
    session.lock().await.memory().clear_all();
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_podcast(
    State(state): State<Arc<AppState>>,
    Path((id, podcast)): Path<(String, String)>,
) -> Result<StatusCode, SwitchboardError> {
    let id = parse_session_id(&id)?;
    let session = state.sessions.get(&id)?;
    if session.lock().await.memory().clear(&podcast) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRegistry;
    use crate::backend::scripted::ScriptedBackend;
    use crate::backend::BackendReply;
    use crate::config::Prompts;
    use crate::tools::fakes::{context, StaticSources};

    fn state() -> Arc<AppState> {
        let prompts = Prompts::default();
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            &prompts,
            Arc::new(AgentRegistry::standard(&prompts).unwrap()),
            Arc::new(ScriptedBackend::from_fn(|_, _| {
                Ok(BackendReply::Text("answered".to_string()))
            })),
            Arc::new(context(Arc::new(StaticSources::default()))),
        );
        Arc::new(AppState {
            orchestrator,
            sessions: SessionStore::new(),
        })
    }

    fn ask(question: &str) -> Json<AskRequest> {
        Json(AskRequest {
            question: question.to_string(),
        })
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = state();
        let session = state.orchestrator.session();
        let id = state.sessions.insert(session);

        let Json(response) = ask_in_session(State(state.clone()), Path(id.to_string()), ask("hi"))
            .await
            .unwrap();
        assert_eq!(response.answer, "answered");
        assert_eq!(response.session_id, id);
        assert!(response.completed);

        let status = delete_session(State(state.clone()), Path(id.to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = ask_in_session(State(state), Path(id.to_string()), ask("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_question_is_bad_request() {
        let err = ask_once(State(state()), ask("  ")).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_session_id_is_not_found() {
        let err = get_memory(State(state()), Path("not-a-uuid".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_memory_listing_and_clearing() {
        let state = state();
        let session = state.orchestrator.session();
        session
            .memory()
            .store("PodcastX", vec![Episode::new("1", "Rate Cuts")]);
        let id = state.sessions.insert(session);

        let Json(memory) = get_memory(State(state.clone()), Path(id.to_string()))
            .await
            .unwrap();
        assert_eq!(memory.catalogs.len(), 1);
        assert_eq!(memory.catalogs[0].podcast_name, "PodcastX");
        assert!(memory.catalogs[0].updated_at.is_some());

        let status = clear_podcast(
            State(state.clone()),
            Path((id.to_string(), "PodcastY".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let status = clear_podcast(
            State(state.clone()),
            Path((id.to_string(), "PodcastX".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(memory) = get_memory(State(state), Path(id.to_string())).await.unwrap();
        assert!(memory.catalogs.is_empty());
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state());
    }
}
