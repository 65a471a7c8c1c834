//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router: admin route plus the dispatcher as fallback
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve a listener until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request_id::{MakeRequestUuid, X_REQUEST_ID};
use crate::http::service::KernelService;
use crate::lifecycle::shutdown_signal;
use crate::routing::UrlMap;

/// Path of the mount listing endpoint.
pub const MOUNTS_PATH: &str = "/_url_map/mounts";

/// HTTP server exposing a [`UrlMap`].
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

#[derive(Debug, Serialize)]
struct MountsStatus {
    version: &'static str,
    prefixes: Vec<String>,
}

impl HttpServer {
    pub fn new(config: AppConfig, url_map: Arc<UrlMap>) -> Self {
        let router = Self::build_router(&config, url_map);
        Self { router, config }
    }

    #[allow(deprecated)]
    fn build_router(config: &AppConfig, url_map: Arc<UrlMap>) -> Router {
        let service =
            KernelService::new(url_map.clone()).max_body_bytes(config.listener.max_body_bytes);

        Router::new()
            .route(MOUNTS_PATH, get(list_mounts))
            .fallback_service(service)
            .with_state(url_map)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve `listener` until Ctrl+C or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn list_mounts(State(url_map): State<Arc<UrlMap>>) -> Json<MountsStatus> {
    Json(MountsStatus {
        version: env!("CARGO_PKG_VERSION"),
        prefixes: url_map.prefixes(),
    })
}
