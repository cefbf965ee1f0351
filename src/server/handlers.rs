use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Query, RawQuery, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::caption::{render_caption, CaptionParams, CaptionRequest};
use crate::paths;
use crate::settings;

use super::error::ServerError;
use super::models::ImageQuery;
use super::state::ServerState;

pub async fn run_server(settings: settings::Settings) -> Result<()> {
    let addr = settings.addr.clone();
    let state = Arc::new(ServerState::new(settings));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    info!("listening on http://{}/image", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/image", get(caption_image))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,OPTIONS"),
    );
}

async fn caption_image(
    State(state): State<Arc<ServerState>>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<ImageQuery>,
) -> Result<Response<Body>, ServerError> {
    let stat_raw = query.stat.clone();
    let params = CaptionParams::from(query);
    let request = CaptionRequest::from_params(&params, &state.settings.stat_options());
    debug!(
        query = raw_query.as_deref().unwrap_or(""),
        stat_raw = ?stat_raw,
        stat = ?request.stat,
        "caption request"
    );

    let images_dir = state.settings.images_dir_path();
    let base_path = paths::image_asset_path(&images_dir, request.image_id);
    if !base_path.is_file() {
        return Err(ServerError::not_found(format!(
            "image not found: {}",
            paths::image_file_name(request.image_id)
        )));
    }

    let task_state = state.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        render_caption(
            &base_path,
            &request,
            &task_state.settings,
            &task_state.compositor,
        )
    })
    .await
    .map_err(|err| ServerError::internal(format!("render task failed: {}", err)))?
    .map_err(|err| {
        error!("caption render failed: {:#}", err);
        ServerError::from(err)
    })?;

    let content_type = HeaderValue::from_str(&state.settings.output_mime)
        .map_err(|err| ServerError::internal(err.to_string()))?;
    let cache_control = HeaderValue::from_str(&state.settings.cache_control)
        .map_err(|err| ServerError::internal(err.to_string()))?;
    let mut response = Response::new(Body::from(bytes));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, cache_control);
    Ok(response)
}
