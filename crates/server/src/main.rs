use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use dashboard_api::{dataset_error, load_dataset, render_html, render_load_error, render_page};
use serde::Deserialize;
use shared::{
    domain::{Interaction, SessionId},
    error::{ApiError, ErrorCode},
    protocol::Page,
};
use thiserror::Error;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod session;

use app_state::AppState;
use config::load_settings;
use session::{resolve_session, session_cookie, SessionStore};

/// Slack on top of the file limit for multipart boundaries and part headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct FeedbackForm {
    #[serde(default)]
    feedback: String,
}

#[derive(Debug, Error)]
enum UploadError {
    #[error("{0}")]
    Multipart(#[from] MultipartError),
    #[error("file exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            UploadError::Multipart(err) => err.status(),
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    let filter =
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    for issue in &settings.issues {
        warn!(%issue, "configuration value ignored");
    }

    let state = Arc::new(AppState::from_settings(&settings));
    spawn_session_sweeper(state.sessions.clone());
    let app = build_router(state);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        max_upload_bytes = settings.max_upload_bytes,
        sort_sales_by_date = settings.sort_sales_by_date,
        "dashboard listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/feedback", post(feedback))
        .route("/api/render", post(api_render))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

fn spawn_session_sweeper(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.evict_expired();
            if removed > 0 {
                debug!(removed, remaining = sessions.len(), "expired sessions dropped");
            }
        }
    });
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session, is_new) = resolve_session(&headers);
    let dataset = state.sessions.get(session);
    let page = render_page(dataset.as_deref(), &Interaction::View, &state.render);
    page_response(&state, StatusCode::OK, session, is_new, &page)
}

async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let (session, is_new) = resolve_session(&headers);
    let interaction = Interaction::Upload;

    let body = match read_upload(multipart, state.max_upload_bytes).await {
        Ok(body) => body,
        Err(err) => {
            warn!(%session, error = %err, "upload rejected");
            state.sessions.clear(session);
            let page = render_load_error(&err, &interaction);
            return page_response(&state, err.status(), session, is_new, &page);
        }
    };

    match load_dataset(&body) {
        Ok(Some(dataset)) => {
            info!(
                %session,
                rows = dataset.row_count(),
                columns = dataset.column_count(),
                bytes = body.len(),
                "dataset uploaded"
            );
            let dataset = state.sessions.put(session, dataset);
            let page = render_page(Some(&*dataset), &interaction, &state.render);
            page_response(&state, StatusCode::OK, session, is_new, &page)
        }
        Ok(None) => {
            debug!(%session, "upload submitted without a file");
            state.sessions.clear(session);
            let page = render_page(None, &interaction, &state.render);
            page_response(&state, StatusCode::OK, session, is_new, &page)
        }
        Err(err) => {
            warn!(%session, error = %err, bytes = body.len(), "uploaded file could not be parsed");
            state.sessions.clear(session);
            let page = render_load_error(&err, &interaction);
            page_response(&state, StatusCode::UNPROCESSABLE_ENTITY, session, is_new, &page)
        }
    }
}

/// Bytes of the `file` field; empty when the form was sent without a file.
async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<Bytes, UploadError> {
    let mut upload = Bytes::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.len() > limit {
            return Err(UploadError::TooLarge { limit });
        }
        debug!(?filename, bytes = bytes.len(), "upload field received");
        upload = bytes;
    }
    Ok(upload)
}

async fn feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let (session, is_new) = resolve_session(&headers);
    // content is acknowledged and dropped, never logged
    info!(%session, chars = form.feedback.chars().count(), "feedback submitted");
    let dataset = state.sessions.get(session);
    let interaction = Interaction::SubmitFeedback {
        text: form.feedback,
    };
    let page = render_page(dataset.as_deref(), &interaction, &state.render);
    page_response(&state, StatusCode::OK, session, is_new, &page)
}

async fn api_render(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Page>, (StatusCode, Json<ApiError>)> {
    if body.len() > state.max_upload_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ApiError::new(
                ErrorCode::PayloadTooLarge,
                format!("file exceeds {} bytes", state.max_upload_bytes),
            )),
        ));
    }
    let dataset =
        load_dataset(&body).map_err(|e| (StatusCode::BAD_REQUEST, Json(dataset_error(e))))?;
    Ok(Json(render_page(
        dataset.as_ref(),
        &Interaction::Upload,
        &state.render,
    )))
}

fn page_response(
    state: &AppState,
    status: StatusCode,
    session: SessionId,
    is_new: bool,
    page: &Page,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if is_new {
        headers.insert(header::SET_COOKIE, session_cookie(session));
    }
    (status, headers, render_html(page, &state.html)).into_response()
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
