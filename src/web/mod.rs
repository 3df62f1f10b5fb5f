//! Embedded web dashboard.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - The single-page dashboard with its sidebar, identifier field and view
//! - JSON API endpoints for the feature list, view rendering and health
//!
//! Launched via `credit-dashboard serve` (default: `http://127.0.0.1:8501`).

mod api;
mod frontend;

use std::io::Cursor;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::context::DashboardContext;
use crate::scoring::PredictionService;

pub use api::{RenderResponse, query_params};

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Bind the dashboard server. Port `0` picks an ephemeral port; read it back
/// with `server.server_addr()`.
pub fn bind(addr: &str) -> Result<Server> {
    Server::http(addr).map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))
}

/// Start the dashboard on `addr` and block serving it.
pub fn serve(ctx: &DashboardContext, service: &dyn PredictionService, addr: &str) -> Result<()> {
    let server = bind(addr)?;

    println!("credit dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if ctx.config.server.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    run(&server, ctx, service);
    Ok(())
}

/// Serve requests from an already bound server until it shuts down.
///
/// Requests are handled one at a time, so one interaction always finishes
/// before the next starts. A failing request gets a 500 and the loop goes on.
pub fn run(server: &Server, ctx: &DashboardContext, service: &dyn PredictionService) {
    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let resp = match dispatch(ctx, service, &method, &url) {
            Ok(resp) => resp,
            Err(e) => {
                let body = serde_json::json!({ "error": format!("{e:#}") }).to_string();
                Response::from_data(body.into_bytes())
                    .with_header(content_type_json())
                    .with_status_code(StatusCode(500))
            }
        };
        let status = resp.status_code().0;
        let _ = request.respond(resp);

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(
    ctx: &DashboardContext,
    service: &dyn PredictionService,
    method: &Method,
    url: &str,
) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API
        (&Method::Get, "/api/features") => api::get_features(ctx),
        (&Method::Get, "/api/render") => api::get_render(ctx, service, url),
        (&Method::Get, "/api/health") => api::get_health(ctx),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    let html = frontend::INDEX_HTML;
    Response::from_data(html.as_bytes().to_vec())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "not found"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(404))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
