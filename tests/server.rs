//! Transport-level tests: tower service bridge and the served router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request as HttpRequest, StatusCode};
use tower::ServiceExt;

use url_map::config::AppConfig;
use url_map::http::server::MOUNTS_PATH;
use url_map::http::{HttpServer, KernelService, Response, X_REQUEST_ID};
use url_map::kernel::{handler_fn, Handler, HandlerError};
use url_map::{Shutdown, UrlMap, ATTR_PREFIX};

mod common;

use common::{event_log, EventLog, Recorder};

fn sample_map(log: &EventLog) -> Arc<UrlMap> {
    let mount_echo: Arc<dyn Handler> = Arc::new(handler_fn(|req, _kind| {
        let mount = req.attributes().get_str(ATTR_PREFIX).unwrap_or_default();
        Ok(Response::text(format!("{mount}|{}", req.path_info())))
    }));
    let failing: Arc<dyn Handler> = Arc::new(RaisingHandler);
    Arc::new(UrlMap::with_map(
        Recorder::terminable("main", log).as_handler(),
        [
            ("/api", mount_echo),
            ("/broken", failing),
            ("/blog", Recorder::terminable("blog", log).as_handler()),
        ],
    ))
}

/// Ignores `catch` and always returns an error.
struct RaisingHandler;

impl Handler for RaisingHandler {
    fn handle(
        &self,
        _request: &url_map::Request,
        _kind: url_map::RequestType,
        _catch: bool,
    ) -> Result<Response, HandlerError> {
        Err(HandlerError::failed("backend down"))
    }
}

async fn body_string(res: axum::response::Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> HttpRequest<Body> {
    HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_service_dispatches_and_terminates_once_per_cycle() {
    let log = event_log();
    let service = KernelService::new(sample_map(&log));

    let res = service.clone().oneshot(get("/api/users?x=1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res).await, "/api|/users");

    let res = service.oneshot(get("/blog/post")).await.unwrap();
    assert_eq!(body_string(res).await, "blog");

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "terminate:blog",
            "terminate:main",
            "handle:blog",
            "terminate:blog",
            "terminate:main",
        ]
    );
}

#[tokio::test]
async fn test_service_renders_uncaught_errors() {
    let log = event_log();
    let service = KernelService::new(sample_map(&log));

    let res = service.oneshot(get("/broken/thing")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(res).await, "Internal Server Error");
    // termination still runs for the failed cycle
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_service_rejects_oversized_body() {
    let log = event_log();
    let service = KernelService::new(sample_map(&log)).max_body_bytes(4);

    let req = HttpRequest::builder()
        .method("POST")
        .uri("/blog")
        .body(Body::from("far too long"))
        .unwrap();
    let res = service.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_router_lists_mounts_and_sets_request_id() {
    let log = event_log();
    let router = HttpServer::new(AppConfig::default(), sample_map(&log)).into_router();

    let res = router.oneshot(get(MOUNTS_PATH)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(X_REQUEST_ID));

    let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(json["prefixes"], serde_json::json!(["/broken", "/blog", "/api"]));
}

#[tokio::test]
async fn test_live_server_round_trip() {
    let log = event_log();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(AppConfig::default(), sample_map(&log));
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let res = client
        .get(format!("http://{addr}/api/v2/users"))
        .header("x-request-id", "fixed-id")
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-request-id"], "fixed-id");
    assert_eq!(res.text().await.unwrap(), "/api|/v2/users");

    let res = client
        .get(format!("http://{addr}/shop/cart"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "main");

    drop(client);
    shutdown.trigger();
    handle.await.unwrap().unwrap();
}
