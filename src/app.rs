use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::downloader;
use crate::error::GridError;
use crate::filter::FilterCriterion;
use crate::grid::GridState;
use crate::layout::ViewMode;
use crate::model::Field;
use crate::saving;
use crate::session::{MemoryStore, SessionStore, TABLE_DATA_KEY};
use crate::sort::SortCriterion;

pub const SESSION_COOKIE: &str = "grid_session";

/// One browser tab's worth of state: its session storage and the grid
/// derived from it.
pub struct Session {
    store: MemoryStore,
    grid: GridState,
    last_seen: Instant,
}

impl Session {
    fn start(id: Uuid, now: Instant) -> Self {
        let mut store = MemoryStore::new();
        let grid = GridState::from_session(&mut store, &mut rand::thread_rng());
        info!("started session {}", id);
        Session {
            store,
            grid,
            last_seen: now,
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.grid.persist(&mut self.store) {
            warn!("could not persist edits: {}", e);
        }
    }
}

pub struct AppState {
    config: AppConfig,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        AppState {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    /// Run `f` against session `id` under the lock, starting the session if
    /// it is new. Keep `f` free of blocking IO.
    fn in_session<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> T) -> T {
        let now = Instant::now();
        let mut sessions = self.lock_sessions();
        if !sessions.contains_key(&id) {
            evict_sessions(&mut sessions, &self.config, now);
        }
        let session = sessions
            .entry(id)
            .or_insert_with(|| Session::start(id, now));
        session.last_seen = now;
        f(session)
    }
}

/// Drop sessions idle past the TTL, then the least recently used ones until
/// one more fits under `max_sessions`.
fn evict_sessions(sessions: &mut HashMap<Uuid, Session>, config: &AppConfig, now: Instant) {
    let before = sessions.len();
    sessions.retain(|_, session| now.duration_since(session.last_seen) < config.session_ttl);

    while sessions.len() >= config.max_sessions.max(1) {
        let oldest = sessions
            .iter()
            .min_by_key(|(_, session)| session.last_seen)
            .map(|(id, _)| *id);
        match oldest {
            Some(id) => {
                sessions.remove(&id);
            }
            None => break,
        }
    }

    let evicted = before - sessions.len();
    if evicted > 0 {
        info!("evicted {} sessions, {} live", evicted, sessions.len());
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

impl StatusResponse {
    fn ok(message: Option<String>) -> Self {
        StatusResponse {
            status: "ok".to_string(),
            message,
        }
    }
}

impl IntoResponse for GridError {
    fn into_response(self) -> Response {
        let code = match &self {
            GridError::UnknownRow(_)
            | GridError::UnknownRowKey(_)
            | GridError::UnknownColumn(_)
            | GridError::ColumnNotInView(..)
            | GridError::InvalidPosition(_)
            | GridError::UnknownViewMode(_)
            | GridError::InvalidSnapshotName(_) => StatusCode::BAD_REQUEST,
            GridError::Io(e) if e.kind() == ErrorKind::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = StatusResponse {
            status: "error".to_string(),
            message: Some(self.to_string()),
        };
        (code, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
struct ModeRequest {
    mode: ViewMode,
}

#[derive(Deserialize)]
struct FilterRequest {
    #[serde(default)]
    criteria: Vec<FilterCriterion>,
}

#[derive(Deserialize)]
struct SortRequest {
    #[serde(default)]
    criteria: Vec<SortCriterion>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReorderRequest {
    ByField { active: Field, over: Field },
    ByPosition { from: usize, to: usize },
}

#[derive(Deserialize)]
struct ResizeRequest {
    field: Field,
    size: u32,
}

#[derive(Deserialize)]
struct VisibilityRequest {
    field: Field,
    visible: bool,
}

#[derive(Deserialize)]
struct ColumnSortRequest {
    field: Field,
}

#[derive(Deserialize)]
struct ColumnFilterRequest {
    field: Field,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct ExpandRequest {
    id: String,
}

#[derive(Deserialize)]
struct EditRequest {
    row: usize,
    field: Field,
    value: String,
}

#[derive(Deserialize)]
struct RemarksRequest {
    row: usize,
    value: String,
}

#[derive(Deserialize)]
struct SnapshotQuery {
    filename: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/view", get(get_view))
        .route("/api/view/mode", post(set_mode))
        .route("/api/filter", post(apply_filters))
        .route("/api/sort", post(apply_sort))
        .route("/api/columns/reorder", post(reorder_columns))
        .route("/api/columns/resize", post(resize_column))
        .route("/api/columns/visibility", post(set_visibility))
        .route("/api/columns/sort", post(toggle_column_sort))
        .route("/api/columns/filter", post(set_column_filter))
        .route("/api/rows/expand", post(toggle_expanded))
        .route("/api/edit", post(edit_cell))
        .route("/api/remarks", post(set_remarks))
        .route("/api/export/csv", get(export_csv))
        .route("/api/export/xlsx", get(export_xlsx))
        .route("/api/save", post(save_snapshot))
        .route("/api/load", post(load_snapshot))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.snapshot_dir)?;
    let addr = config.bind_addr();
    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(&addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Session id from the cookie, or a fresh one set on the outgoing jar.
fn session_id(jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        return (jar, id);
    }
    let id = Uuid::new_v4();
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true);
    (jar.add(cookie), id)
}

/// Run `f` against the caller's session, creating it on first contact.
fn with_session<F>(state: &AppState, jar: CookieJar, f: F) -> Response
where
    F: FnOnce(&mut Session) -> Result<Response, GridError>,
{
    let (jar, id) = session_id(jar);
    let response = state
        .in_session(id, f)
        .unwrap_or_else(IntoResponse::into_response);
    (jar, response).into_response()
}

/// Blocking work (file IO, workbook building) runs on the blocking pool,
/// never while the session lock is held.
async fn blocking<T, F>(f: F) -> Result<T, GridError>
where
    F: FnOnce() -> Result<T, GridError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GridError::Io(std::io::Error::other(e)))?
}

/// Apply a grid mutation, persist the overlay and answer with the new view.
fn mutate<F>(state: &AppState, jar: CookieJar, f: F) -> Response
where
    F: FnOnce(&mut GridState) -> Result<(), GridError>,
{
    with_session(state, jar, |session| {
        f(&mut session.grid)?;
        session.persist();
        Ok(Json(session.grid.view()).into_response())
    })
}

async fn get_view(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    with_session(&state, jar, |session| {
        Ok(Json(session.grid.view()).into_response())
    })
}

async fn set_mode(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<ModeRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.switch_view(payload.mode);
        Ok(())
    })
}

async fn apply_filters(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<FilterRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.apply_filters(&payload.criteria);
        Ok(())
    })
}

async fn apply_sort(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<SortRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.apply_sort(&payload.criteria);
        Ok(())
    })
}

async fn reorder_columns(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<ReorderRequest>,
) -> Response {
    mutate(&state, jar, |grid| match payload {
        ReorderRequest::ByField { active, over } => grid.move_column(active, over),
        ReorderRequest::ByPosition { from, to } => grid.reorder(from, to),
    })
}

async fn resize_column(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<ResizeRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.resize(payload.field, payload.size).map(|_| ())
    })
}

async fn set_visibility(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<VisibilityRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.set_visibility(payload.field, payload.visible)
    })
}

async fn toggle_column_sort(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<ColumnSortRequest>,
) -> Response {
    mutate(&state, jar, |grid| grid.toggle_sort(payload.field).map(|_| ()))
}

async fn set_column_filter(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<ColumnFilterRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.set_column_filter(payload.field, &payload.value)
    })
}

async fn toggle_expanded(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<ExpandRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.toggle_expanded(&payload.id);
        Ok(())
    })
}

async fn edit_cell(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<EditRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.edit_cell(payload.row, payload.field, payload.value)
            .map(|_| ())
    })
}

async fn set_remarks(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RemarksRequest>,
) -> Response {
    mutate(&state, jar, |grid| {
        grid.set_remarks(payload.row, payload.value).map(|_| ())
    })
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

async fn export_csv(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    with_session(&state, jar, |session| {
        let csv = downloader::to_csv(&session.grid);
        Ok(attachment(
            "text/csv; charset=utf-8",
            "obligations.csv",
            csv.into_bytes(),
        ))
    })
}

async fn export_xlsx(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, id) = session_id(jar);
    let grid = state.in_session(id, |session| session.grid.clone());
    let response = blocking(move || downloader::to_xlsx(&grid))
        .await
        .map(|xlsx| {
            attachment(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "obligations.xlsx",
                xlsx,
            )
        })
        .unwrap_or_else(IntoResponse::into_response);
    (jar, response).into_response()
}

async fn save_snapshot(
    Query(params): Query<SnapshotQuery>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    let (jar, id) = session_id(jar);
    let result = async {
        let path = state.config.snapshot_path(&params.filename)?;
        let grid = state.in_session(id, |session| session.grid.clone());
        let snapshot = blocking(move || saving::save_snapshot(&grid, &path)).await?;
        Ok::<_, GridError>(Json(StatusResponse::ok(Some(snapshot.saved_at))).into_response())
    }
    .await;
    (jar, result.unwrap_or_else(IntoResponse::into_response)).into_response()
}

async fn load_snapshot(
    Query(params): Query<SnapshotQuery>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    let (jar, id) = session_id(jar);
    let result = async {
        let path = state.config.snapshot_path(&params.filename)?;
        let snapshot = blocking(move || saving::load_snapshot(&path)).await?;
        state.in_session(id, move |session| {
            session.grid = snapshot.grid;
            session
                .store
                .set_item(TABLE_DATA_KEY, serde_json::to_string(session.grid.original())?);
            session.persist();
            Ok::<_, GridError>(Json(session.grid.view()).into_response())
        })
    }
    .await;
    (jar, result.unwrap_or_else(IntoResponse::into_response)).into_response()
}
