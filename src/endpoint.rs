/// HTTP endpoint for Prometheus scrapes.
///
/// Endpoints:
/// - GET /metrics - current station state in the text exposition format
/// - GET /health  - service health check
///
/// Each request renders from a fresh snapshot of the store; the handler
/// never blocks on network I/O.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};

use crate::exporter;
use crate::model::StartupError;
use crate::monitor::SnapshotStore;
use crate::shutdown::Shutdown;
use crate::stations::Registry;

/// How often the accept loop checks for shutdown.
const ACCEPT_POLL: Duration = Duration::from_millis(500);

/// Everything a scrape needs: read-only registry, shared store.
#[derive(Clone)]
pub struct ScrapeContext {
    pub registry: Arc<Registry>,
    pub store: Arc<SnapshotStore>,
    pub pollers: usize,
}

/// A routed response before it is turned into a `tiny_http::Response`.
#[derive(Debug, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl Reply {
    fn json(status: u16, value: serde_json::Value) -> Self {
        Reply {
            status,
            content_type: "application/json".to_string(),
            body: value.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Routes a request URL (path plus optional query string).
pub fn route(url: &str, ctx: &ScrapeContext) -> Reply {
    let path = url.split('?').next().unwrap_or(url);

    match path {
        "/metrics" => handle_metrics(ctx),
        "/health" => handle_health(ctx),
        _ => Reply::json(
            404,
            serde_json::json!({
                "error": "Not found",
                "available_endpoints": ["/metrics", "/health"]
            }),
        ),
    }
}

fn handle_metrics(ctx: &ScrapeContext) -> Reply {
    let snapshot = ctx.store.snapshot();
    match exporter::render(&ctx.registry, &snapshot) {
        Ok(body) => Reply {
            status: 200,
            content_type: exporter::content_type(),
            body,
        },
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            Reply::json(500, serde_json::json!({ "error": e.to_string() }))
        }
    }
}

fn handle_health(ctx: &ScrapeContext) -> Reply {
    Reply::json(
        200,
        serde_json::json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "stations": ctx.registry.len(),
            "pollers": ctx.pollers,
            "valid_series": ctx.store.valid_count()
        }),
    )
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

pub struct Endpoint {
    server: tiny_http::Server,
    addr: String,
}

impl Endpoint {
    /// Binds the listener. Failing to bind is fatal at startup.
    pub fn bind(addr: &str) -> Result<Self, StartupError> {
        let server = tiny_http::Server::http(addr).map_err(|e| StartupError::Listen {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            server,
            addr: addr.to_string(),
        })
    }

    /// Bound address, useful when binding port 0.
    pub fn local_port(&self) -> Option<u16> {
        self.server.server_addr().to_ip().map(|a| a.port())
    }

    /// Serves requests until `shutdown` trips.
    pub fn serve(self, ctx: ScrapeContext, shutdown: Shutdown) {
        info!("HTTP endpoint listening on http://{}/metrics", self.addr);

        while !shutdown.is_triggered() {
            let request = match self.server.recv_timeout(ACCEPT_POLL) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    error!("Failed to accept request: {}", e);
                    continue;
                }
            };

            let reply = route(request.url(), &ctx);
            if let Err(e) = request.respond(into_response(reply)) {
                error!("Failed to send response: {}", e);
            }
        }

        info!("HTTP endpoint stopped");
    }
}

fn into_response(reply: Reply) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let response = tiny_http::Response::from_data(reply.body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(reply.status));

    match tiny_http::Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
