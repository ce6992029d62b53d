use crate::locker::LockerAction;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::responses::ApiError;
use super::server::ServerState;

/// Serve the kiosk UI entry page
pub async fn index_handler(State(state): State<ServerState>) -> Response {
    let index = state.static_dir.join("index.html");

    match tokio::fs::read_to_string(&index).await {
        Ok(html) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            html,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to read {}: {}", index.display(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h3>static/index.html not found</h3>"),
            )
                .into_response()
        }
    }
}

/// Take a still and point the client at it
pub async fn capture_handler(
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.camera.capture().await?;

    Ok(Json(json!({
        "ok": true,
        "image_url": format!("/image?ts={}", outcome.timestamp),
    })))
}

/// Serve the most recent still
pub async fn image_handler(State(state): State<ServerState>) -> Result<Response, ApiError> {
    let path = state.camera.image_path();

    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No image at {} yet", path.display());
            return Err(ApiError::NoImage);
        }
        Err(e) => return Err(ApiError::ImageRead(e)),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "no-cache, private"),
        ],
        Bytes::from(data),
    )
        .into_response())
}

/// Pulse the relay to release the lock
pub async fn locker_open_handler(
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    let action = LockerAction::PulseOpen(state.pulse_duration);
    state.relay.perform(action).await?;

    Ok(Json(json!({
        "ok": true,
        "action": action.name(),
        "seconds": state.pulse_duration.as_secs_f64(),
        "gpio": state.relay.pin(),
    })))
}

/// Hold the relay on
pub async fn locker_on_handler(
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    locker_switch(&state, LockerAction::On).await
}

/// Release the relay
pub async fn locker_off_handler(
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    locker_switch(&state, LockerAction::Off).await
}

async fn locker_switch(state: &ServerState, action: LockerAction) -> Result<Json<Value>, ApiError> {
    state.relay.perform(action).await?;

    Ok(Json(json!({
        "ok": true,
        "action": action.name(),
        "gpio": state.relay.pin(),
    })))
}

/// Handler for health check endpoint
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let image_available = tokio::fs::try_exists(state.camera.image_path())
        .await
        .unwrap_or(false);

    let health_info = json!({
        "status": "healthy",
        "gpio_available": state.relay.is_available(),
        "gpio_pin": state.relay.pin(),
        "capture_in_progress": state.camera.is_busy(),
        "image_available": image_available,
    });

    (StatusCode::OK, Json(health_info))
}
