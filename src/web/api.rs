//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::analytics::logger::{self, InteractionLogEntry};
use crate::config;
use crate::context::DashboardContext;
use crate::dashboard::{self, RenderRequest, Section};
use crate::scoring::{PredictionService, ScoringClient};

use super::content_type_json;

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SectionResponse {
    slug: &'static str,
    title: &'static str,
}

/// Feature list API response.
#[derive(Serialize)]
struct FeaturesResponse {
    features: Vec<String>,
    sections: Vec<SectionResponse>,
}

/// Render API response. `html` replaces the view container wholesale.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub section: &'static str,
    pub client_id: Option<u32>,
    pub ok: bool,
    pub outcome: &'static str,
    pub html: String,
}

/// Health API response.
#[derive(Serialize)]
struct HealthResponse {
    clients: usize,
    feature_columns: usize,
    model_features: usize,
    scoring_url: String,
    scoring_reachable: bool,
    config_exists: bool,
    log_exists: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON response with the given status.
fn json_response<T: Serialize>(data: &T, status: u16) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status)))
}

/// Decoded `key=value` pairs of a URL's query string, in order.
pub fn query_params(url: &str) -> Vec<(String, String)> {
    let Some(query) = url.split_once('?').map(|(_, q)| q) else {
        return Vec::new();
    };
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect()
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(b) => {
                        out.push(b);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Build a render request from `/api/render` query parameters.
///
/// `features` is a comma-separated list. A missing section means the
/// prediction view; an unknown one is an error.
pub(crate) fn parse_render_request(url: &str) -> Result<RenderRequest, String> {
    let mut request = RenderRequest::default();
    for (key, value) in query_params(url) {
        match key.as_str() {
            "client_id" => request.client_id = value.trim().to_string(),
            "section" => {
                request.section =
                    Section::parse(&value).ok_or_else(|| format!("unknown section: {value}"))?;
            }
            "features" => {
                request.features = value
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect();
            }
            "x" if !value.is_empty() => request.feature_x = Some(value),
            "y" if !value.is_empty() => request.feature_y = Some(value),
            _ => {}
        }
    }
    Ok(request)
}

/// Run one interaction and record it in the interaction log.
pub(crate) fn render_interaction(
    ctx: &DashboardContext,
    service: &dyn PredictionService,
    request: &RenderRequest,
) -> RenderResponse {
    let start = Instant::now();
    let view = dashboard::render(ctx, service, request);
    let latency_ms = start.elapsed().as_millis() as u64;

    if !matches!(view.outcome, dashboard::Outcome::Idle) {
        let entry = InteractionLogEntry::from_view(&request.client_id, &view, latency_ms);
        logger::log_interaction(&ctx.config.logging, &entry);
    }

    RenderResponse {
        section: view.section.slug(),
        client_id: view.client_id,
        ok: view.outcome.is_success(),
        outcome: view.outcome.as_str(),
        html: view.to_html(),
    }
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/features` — display columns and sidebar sections.
pub fn get_features(ctx: &DashboardContext) -> Result<Response<Cursor<Vec<u8>>>> {
    let resp = FeaturesResponse {
        features: ctx
            .dataset
            .clients()
            .display_columns()
            .into_iter()
            .map(String::from)
            .collect(),
        sections: Section::ALL
            .iter()
            .map(|s| SectionResponse {
                slug: s.slug(),
                title: s.title(),
            })
            .collect(),
    };
    json_response(&resp, 200)
}

/// `GET /api/render?client_id=…&section=…&features=a,b&x=…&y=…`
pub fn get_render(
    ctx: &DashboardContext,
    service: &dyn PredictionService,
    url: &str,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let request = match parse_render_request(url) {
        Ok(request) => request,
        Err(message) => return json_response(&serde_json::json!({ "error": message }), 400),
    };
    json_response(&render_interaction(ctx, service, &request), 200)
}

/// `GET /api/health` — data and scoring endpoint status.
pub fn get_health(ctx: &DashboardContext) -> Result<Response<Cursor<Vec<u8>>>> {
    let client = ScoringClient::from_config(&ctx.config.scoring);
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let log_exists = logger::interaction_log_path(&ctx.config.logging)
        .map(|p| p.exists())
        .unwrap_or(false);

    let resp = HealthResponse {
        clients: ctx.dataset.clients().len(),
        feature_columns: ctx.dataset.features().columns().len(),
        model_features: ctx.model.n_features(),
        scoring_url: client.url().to_string(),
        scoring_reachable: client.is_reachable(),
        config_exists,
        log_exists,
    };

    json_response(&resp, 200)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
