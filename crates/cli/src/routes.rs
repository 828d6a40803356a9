use crate::http_api::{build_response, ApiError};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, Response},
    routing::{delete, get, post},
    Json, Router,
};
use context_gateway::ModelGateway;
use context_protocol::{
    validate_relative_path, ErrorKind, FileContent, FileDescriptor, HealthReport, SessionCreated,
    SessionSubmitRequest, SubmitRequest, SubmitResponse, ToggleRequest, TreeNode,
};
use context_scanner::{describe, read_file, PathScanner, ScanOptions};
use context_session::{SessionRegistry, SessionView};
use serde::Serialize;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    root: PathBuf,
    scan_options: ScanOptions,
    gateway: ModelGateway,
    sessions: SessionRegistry,
}

impl AppState {
    pub fn new(
        root: impl Into<PathBuf>,
        scan_options: ScanOptions,
        gateway: ModelGateway,
        max_sessions: usize,
    ) -> Self {
        Self {
            inner: Arc::new(AppInner {
                root: root.into(),
                scan_options,
                gateway,
                sessions: SessionRegistry::new(max_sessions),
            }),
        }
    }

    pub fn root(&self) -> &FsPath {
        &self.inner.root
    }

    fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }
}

#[derive(Debug, Serialize)]
struct ToggleOutcome {
    selected: bool,
    selection: Vec<FileDescriptor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/files", get(list_files))
        .route("/api/tree", get(file_tree))
        .route("/api/file/*path", get(file_content))
        .route("/api/submit", post(submit))
        .route("/api/gpt4o", post(submit))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(session_view).delete(drop_session))
        .route("/api/sessions/:id/toggle", post(toggle_file))
        .route("/api/sessions/:id/selection", delete(clear_selection))
        .route("/api/sessions/:id/selection/*file_id", delete(remove_file))
        .route("/api/sessions/:id/submit", post(submit_session))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".to_string(),
        root: state.root().display().to_string(),
        gateway_configured: state.inner.gateway.is_configured(),
        sessions: state.sessions().len(),
    })
}

async fn scan_root(state: &AppState) -> Result<Vec<FileDescriptor>, ApiError> {
    let scanner = PathScanner::new(state.root()).with_options(state.inner.scan_options);
    let files = tokio::task::spawn_blocking(move || scanner.scan())
        .await
        .map_err(|err| ApiError::internal(format!("Failed to list files: {err}")))?
        .map_err(ApiError::listing)?;
    log::debug!("Listed {} files under {}", files.len(), state.root().display());
    Ok(files)
}

async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileDescriptor>>, ApiError> {
    Ok(Json(scan_root(&state).await?))
}

async fn file_tree(State(state): State<AppState>) -> Result<Json<Vec<TreeNode>>, ApiError> {
    let files = scan_root(&state).await?;
    Ok(Json(context_tree::build(&files)))
}

async fn file_content(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<FileContent>, ApiError> {
    let content = read_file(state.root(), &path).await.map_err(ApiError::read)?;
    Ok(Json(FileContent { content }))
}

async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(request) = payload.map_err(|err| ApiError::invalid_request(err.body_text()))?;
    let paths: Vec<String> = request.files.into_iter().map(|file| file.path).collect();
    let response = state
        .inner
        .gateway
        .send(&request.prompt, &paths)
        .await
        .map_err(ApiError::gateway)?;
    Ok(Json(SubmitResponse { response }))
}

async fn create_session(State(state): State<AppState>) -> Response {
    let session_id = state.sessions().create();
    build_response(StatusCode::CREATED, &SessionCreated { session_id })
}

async fn session_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions().view(&id)?))
}

async fn drop_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions().remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(context_session::SessionError::UnknownSession(id).into())
    }
}

fn selection_id(raw: &str) -> Result<String, ApiError> {
    validate_relative_path(raw).map_err(|reason| {
        ApiError::new(ErrorKind::InvalidPath, format!("Invalid path '{raw}': {reason}"))
    })
}

async fn toggle_file(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<ToggleOutcome>, ApiError> {
    let Json(request) = payload.map_err(|err| ApiError::invalid_request(err.body_text()))?;
    let file_id = selection_id(&request.id)?;

    let already_selected = state
        .sessions()
        .with_session(&session_id, |session| session.selection().is_selected(&file_id))?;

    let selected = if already_selected {
        state
            .sessions()
            .with_session(&session_id, |session| session.remove(&file_id))?;
        false
    } else {
        let descriptor = describe(state.root(), &file_id).await.map_err(ApiError::read)?;
        state
            .sessions()
            .with_session(&session_id, |session| session.toggle(descriptor))?
    };

    let selection = state
        .sessions()
        .with_session(&session_id, |session| session.selection().list())?;
    Ok(Json(ToggleOutcome {
        selected,
        selection,
    }))
}

async fn clear_selection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    state.sessions().with_session(&session_id, |session| session.clear())?;
    Ok(Json(state.sessions().view(&session_id)?))
}

async fn remove_file(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(String, String)>,
) -> Result<Json<SessionView>, ApiError> {
    let file_id = selection_id(&file_id)?;
    state
        .sessions()
        .with_session(&session_id, |session| session.remove(&file_id))?;
    Ok(Json(state.sessions().view(&session_id)?))
}

async fn submit_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<SessionSubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(request) = payload.map_err(|err| ApiError::invalid_request(err.body_text()))?;
    let snapshot = state
        .sessions()
        .with_session(&session_id, |session| session.begin_submission(&request.prompt))??;
    let paths: Vec<String> = snapshot.iter().map(|file| file.id().to_string()).collect();

    // Runs detached so the session settles even if the client goes away.
    let task_state = state.clone();
    let task_session = session_id.clone();
    let task = tokio::spawn(async move {
        let outcome = task_state
            .inner
            .gateway
            .send(&request.prompt, &paths)
            .await
            .map_err(ApiError::gateway);
        settle(&task_state, &task_session, outcome.as_ref().map(String::as_str));
        outcome
    });

    let response = match task.await {
        Ok(outcome) => outcome?,
        Err(err) => {
            let error = ApiError::internal(format!("Submission task failed: {err}"));
            settle(&state, &session_id, Err(&error));
            return Err(error);
        }
    };
    Ok(Json(SubmitResponse { response }))
}

fn settle(state: &AppState, session_id: &str, outcome: Result<&str, &ApiError>) {
    let recorded = state.sessions().with_session(session_id, |session| match outcome {
        Ok(response) => session.succeed(response.to_string()),
        Err(error) => session.fail(error.kind(), error.message().to_string()),
    });
    if recorded.is_err() {
        log::info!("Session {session_id} was dropped before its submission finished");
    }
}
