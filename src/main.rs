//! Demo server: sample sub-applications mounted under path prefixes.
//!
//! ```text
//!   /api/v2/*  → v2 app        (mount root /api/v2)
//!   /api/*     → api app       (mount root /api)
//!   /blog/*    → blog app      (terminable)
//!   *          → main app      (fallback)
//!   /_url_map/mounts → JSON listing of the table order
//! ```

use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use url_map::config::{validate_config, AppConfig};
use url_map::http::{HttpServer, Request, Response};
use url_map::kernel::{handler_fn, Handler, HandlerError, RequestType};
use url_map::observability::{logging, metrics};
use url_map::{RequestContext, Shutdown, UrlMap, ATTR_PREFIX};

#[derive(Debug, Parser)]
#[command(name = "url-map", version, about = "Serve sample apps mounted by path prefix")]
struct Args {
    /// Listener bind address.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Log filter directive (RUST_LOG takes precedence).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<String>,

    /// Publish matched requests to the process-wide request context.
    #[arg(long)]
    override_globals: bool,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> AppConfig {
        let mut config = AppConfig::default();
        config.listener.bind_address = self.bind;
        config.timeouts.request_secs = self.timeout_secs;
        config.dispatch.override_globals = self.override_globals;
        config.observability.log_level = self.log_level;
        if let Some(addr) = self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config();
    logging::init_logging(&config.observability);

    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            tracing::error!(error = %e, "Invalid configuration");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        override_globals = config.dispatch.override_globals,
        "url-map v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let mut builder = UrlMap::builder(main_app())
        .mount("/api", describe_app("api"))
        .mount("/api/v2", describe_app("api-v2"))
        .mount("/blog", blog_app());
    if config.dispatch.override_globals {
        builder = builder.context(RequestContext::global());
    }
    let url_map = Arc::new(builder.build());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, url_map);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn main_app() -> Arc<dyn Handler> {
    Arc::new(handler_fn(|req: &Request, _kind: RequestType| {
        Ok(Response::text(format!("main application: {}", req.path_info())))
    }))
}

/// Reports where it believes it is mounted.
fn describe_app(name: &'static str) -> Arc<dyn Handler> {
    Arc::new(handler_fn(move |req: &Request, _kind: RequestType| {
        Response::json(&json!({
            "app": name,
            "mount": req.attributes().get_str(ATTR_PREFIX),
            "base_url": req.base_url(),
            "path_info": req.path_info(),
            "query": req.query(),
        }))
        .map_err(HandlerError::failed)
    }))
}

fn blog_app() -> Arc<dyn Handler> {
    let app = handler_fn(|req: &Request, _kind: RequestType| match req.path_info() {
        "/" => Ok(Response::text("blog index")),
        path if path.starts_with("/post/") => {
            Ok(Response::text(format!("blog post {}", &path["/post/".len()..])))
        }
        path => Err(HandlerError::status(
            axum::http::StatusCode::NOT_FOUND,
            format!("no blog page at {path}"),
        )),
    })
    .on_terminate(|req, res| {
        tracing::debug!(uri = %req.request_uri(), status = %res.status(), "Blog cycle finished");
    });
    Arc::new(app)
}
