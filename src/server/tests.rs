use super::server::{router, KioskServerBuilder, ServerState};
use crate::{
    camera::{CameraService, PathCaptureTool, ScriptCaptureTool},
    config::ServerConfig,
    locker::{MockRelayLine, RelayAdapter},
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const WRITE_JPEG: &str = "printf 'fake-jpeg-bytes' > \"$1\"";

struct TestKiosk {
    dir: TempDir,
    app: Router,
}

fn create_test_kiosk(script: &str, min_interval: Duration, relay: RelayAdapter) -> TestKiosk {
    let dir = tempfile::tempdir().unwrap();
    let static_dir = dir.path().join("static");
    std::fs::create_dir(&static_dir).unwrap();

    let camera = CameraService::new(
        Arc::new(ScriptCaptureTool::new(script)),
        dir.path().join("latest.jpg"),
        min_interval,
    );
    let state = ServerState::new(
        Arc::new(camera),
        Arc::new(relay),
        static_dir,
        Duration::from_millis(20),
    );

    TestKiosk {
        app: router(state, true),
        dir,
    }
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, method, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_image_missing_before_capture() {
    let kiosk = create_test_kiosk(WRITE_JPEG, Duration::ZERO, RelayAdapter::unavailable(17));

    let (status, body) = send_json(&kiosk.app, "GET", "/image").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "no image yet");
}

#[tokio::test]
async fn test_capture_then_fetch_image() {
    let kiosk = create_test_kiosk(WRITE_JPEG, Duration::ZERO, RelayAdapter::unavailable(17));

    let (status, body) = send_json(&kiosk.app, "POST", "/api/camera/capture").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let image_url = body["image_url"].as_str().unwrap();
    let ts: i64 = image_url
        .strip_prefix("/image?ts=")
        .unwrap()
        .parse()
        .unwrap();
    assert!(ts > 0);

    let request = Request::builder()
        .uri(image_url)
        .body(Body::empty())
        .unwrap();
    let response = kiosk.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"fake-jpeg-bytes");
}

#[tokio::test]
async fn test_image_serves_latest_capture() {
    let kiosk = create_test_kiosk(
        "echo $$ > \"$1\"",
        Duration::ZERO,
        RelayAdapter::unavailable(17),
    );

    send(&kiosk.app, "POST", "/api/camera/capture").await;
    let (_, first) = send(&kiosk.app, "GET", "/image").await;
    send(&kiosk.app, "POST", "/api/camera/capture").await;
    let (_, second) = send(&kiosk.app, "GET", "/image").await;

    let on_disk = std::fs::read(kiosk.dir.path().join("latest.jpg")).unwrap();
    assert_eq!(second, on_disk);
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_rapid_capture_is_rate_limited() {
    let kiosk = create_test_kiosk(
        WRITE_JPEG,
        Duration::from_secs(60),
        RelayAdapter::unavailable(17),
    );

    let (status, _) = send_json(&kiosk.app, "POST", "/api/camera/capture").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&kiosk.app, "POST", "/api/camera/capture").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "too many requests");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_capture_reports_busy() {
    let kiosk = create_test_kiosk(
        "sleep 0.3; printf 'jpeg' > \"$1\"",
        Duration::ZERO,
        RelayAdapter::unavailable(17),
    );

    let (first, second) = tokio::join!(
        send_json(&kiosk.app, "POST", "/api/camera/capture"),
        send_json(&kiosk.app, "POST", "/api/camera/capture"),
    );

    let mut statuses = vec![first.0.as_u16(), second.0.as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 409]);

    let busy = if first.0 == StatusCode::CONFLICT { first.1 } else { second.1 };
    assert_eq!(busy["error"], "camera is busy");
}

#[tokio::test]
async fn test_capture_failure_includes_stderr() {
    let kiosk = create_test_kiosk(
        "echo 'ERROR: no cameras available' >&2; exit 255",
        Duration::ZERO,
        RelayAdapter::unavailable(17),
    );

    let (status, body) = send_json(&kiosk.app, "POST", "/api/camera/capture").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "camera command failed");
    assert_eq!(body["stderr"], "ERROR: no cameras available");
}

#[tokio::test]
async fn test_capture_without_tool() {
    let dir = tempfile::tempdir().unwrap();
    let tool = PathCaptureTool::new(
        vec!["rpicam-still".to_string(), "libcamera-still".to_string()],
        200,
    )
    .with_search_path(dir.path().as_os_str());
    let camera = CameraService::new(Arc::new(tool), dir.path().join("latest.jpg"), Duration::ZERO);
    let state = ServerState::new(
        Arc::new(camera),
        Arc::new(RelayAdapter::unavailable(17)),
        dir.path(),
        Duration::from_secs(1),
    );
    let app = router(state, false);

    let (status, body) = send_json(&app, "POST", "/api/camera/capture").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert_eq!(
        body["error"],
        "rpicam-still or libcamera-still is not installed"
    );
    assert!(body.get("stderr").is_none());
}

#[tokio::test]
async fn test_locker_unavailable_for_all_actions() {
    let kiosk = create_test_kiosk(WRITE_JPEG, Duration::ZERO, RelayAdapter::unavailable(17));

    for uri in [
        "/api/locker/open/1",
        "/api/locker/on/1",
        "/api/locker/off/1",
    ] {
        let (status, body) = send_json(&kiosk.app, "POST", uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "GPIO not available");
    }
}

#[tokio::test]
async fn test_locker_actions() {
    let line = MockRelayLine::new();
    let kiosk = create_test_kiosk(
        WRITE_JPEG,
        Duration::ZERO,
        RelayAdapter::with_line(17, line.clone()),
    );

    let (status, body) = send_json(&kiosk.app, "POST", "/api/locker/on/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "on");
    assert_eq!(body["gpio"], 17);
    assert!(line.is_active());

    let (status, body) = send_json(&kiosk.app, "POST", "/api/locker/off/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "off");
    assert!(!line.is_active());

    let (status, body) = send_json(&kiosk.app, "POST", "/api/locker/open/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["action"], "pulse_open");
    assert_eq!(body["seconds"], 0.02);
    assert_eq!(body["gpio"], 17);
    assert!(!line.is_active());
    assert_eq!(line.history(), vec![true, false, true, false]);
}

#[tokio::test]
async fn test_locker_open_reports_default_pulse() {
    let dir = tempfile::tempdir().unwrap();
    let line = MockRelayLine::new();
    let state = ServerState::new(
        Arc::new(CameraService::new(
            Arc::new(ScriptCaptureTool::new(WRITE_JPEG)),
            dir.path().join("latest.jpg"),
            Duration::ZERO,
        )),
        Arc::new(RelayAdapter::with_line(17, line.clone())),
        dir.path(),
        crate::config::KioskConfig::default().locker.pulse_duration(),
    );
    let app = router(state, true);

    let (status, body) = send_json(&app, "POST", "/api/locker/open/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seconds"], 1.0);
    assert!(!line.is_active());
}

#[tokio::test]
async fn test_index_page() {
    let kiosk = create_test_kiosk(WRITE_JPEG, Duration::ZERO, RelayAdapter::unavailable(17));

    let (status, body) = send(&kiosk.app, "GET", "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("index.html not found"));

    std::fs::write(
        kiosk.dir.path().join("static").join("index.html"),
        "<h1>Kiosk</h1>",
    )
    .unwrap();

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = kiosk.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<h1>Kiosk</h1>");
}

#[tokio::test]
async fn test_static_assets() {
    let kiosk = create_test_kiosk(WRITE_JPEG, Duration::ZERO, RelayAdapter::unavailable(17));
    std::fs::write(
        kiosk.dir.path().join("static").join("app.js"),
        "console.log('kiosk');",
    )
    .unwrap();

    let (status, body) = send(&kiosk.app, "GET", "/static/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"console.log('kiosk');");

    let (status, _) = send(&kiosk.app, "GET", "/static/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let kiosk = create_test_kiosk(
        WRITE_JPEG,
        Duration::ZERO,
        RelayAdapter::with_line(27, MockRelayLine::new()),
    );

    let (status, body) = send_json(&kiosk.app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["gpio_available"], true);
    assert_eq!(body["gpio_pin"], 27);
    assert_eq!(body["capture_in_progress"], false);
    assert_eq!(body["image_available"], false);

    send(&kiosk.app, "POST", "/api/camera/capture").await;
    let (_, body) = send_json(&kiosk.app, "GET", "/health").await;
    assert_eq!(body["image_available"], true);
}

#[tokio::test]
async fn test_server_builder() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        ip: "127.0.0.1".to_string(),
        port: 8000,
        static_dir: dir.path().to_string_lossy().into_owned(),
        cors_permissive: true,
    };
    let camera = Arc::new(CameraService::new(
        Arc::new(ScriptCaptureTool::new(WRITE_JPEG)),
        dir.path().join("latest.jpg"),
        Duration::ZERO,
    ));

    let server = KioskServerBuilder::new()
        .config(config)
        .camera(camera)
        .relay(Arc::new(RelayAdapter::unavailable(17)))
        .pulse_duration(Duration::from_secs(1))
        .build()
        .unwrap();

    assert_eq!(server.address(), "127.0.0.1:8000");
    assert_eq!(server.state.static_dir, dir.path());
}

#[tokio::test]
async fn test_builder_validation() {
    let dir = tempfile::tempdir().unwrap();
    let camera = || {
        Arc::new(CameraService::new(
            Arc::new(ScriptCaptureTool::new(WRITE_JPEG)),
            dir.path().join("latest.jpg"),
            Duration::ZERO,
        ))
    };

    let result = KioskServerBuilder::new()
        .camera(camera())
        .relay(Arc::new(RelayAdapter::unavailable(17)))
        .pulse_duration(Duration::from_secs(1))
        .build();
    assert!(result.is_err());

    let result = KioskServerBuilder::new()
        .config(crate::config::KioskConfig::default().server)
        .relay(Arc::new(RelayAdapter::unavailable(17)))
        .pulse_duration(Duration::from_secs(1))
        .build();
    assert!(result.is_err());

    let result = KioskServerBuilder::new()
        .config(crate::config::KioskConfig::default().server)
        .camera(camera())
        .pulse_duration(Duration::from_secs(1))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_api_error_bodies() {
    use super::ApiError;
    use crate::error::{CaptureError, LockerError};

    let failed = ApiError::from(CaptureError::Failed {
        stderr: "no cameras available".to_string(),
    });
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = failed.body();
    assert!(!body.ok);
    assert_eq!(body.error, "camera command failed");
    assert_eq!(body.stderr.as_deref(), Some("no cameras available"));

    assert_eq!(
        ApiError::from(CaptureError::Busy).status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        ApiError::from(LockerError::Unavailable).body().error,
        "GPIO not available"
    );
    assert_eq!(ApiError::NoImage.body().error, "no image yet");

    let read = ApiError::ImageRead(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "denied",
    ));
    assert_eq!(read.body().error, "failed to read image: denied");
    assert!(read.body().stderr.is_none());
}
