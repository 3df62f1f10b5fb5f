/// Web dashboard tests.
///
/// Each test runs the dashboard server on an ephemeral port in a background
/// thread, with a stub scoring service, and talks to it over HTTP.
use std::thread;

use credit_dashboard::config::DashboardConfig;
use credit_dashboard::context::DashboardContext;
use credit_dashboard::data::{ClientTable, Dataset, FeatureMatrix};
use credit_dashboard::model::LinearModel;
use credit_dashboard::scoring::{
    Decision, Prediction, PredictionService, ScoringError, ScoringReply,
};
use credit_dashboard::web;
use serde_json::Value as Json;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const CLIENTS_CSV: &str = "\
SK_ID_CURR,TARGET,NAME_CONTRACT_TYPE,AMT_CREDIT,EXT_SOURCE_3
100002,1,Cash loans,406597.5,0.1394
100003,0,Cash loans,1293502.5,
100004,0,Revolving loans,135000,0.7296
";

const FEATURES_CSV: &str = "\
SK_ID_CURR,AMT_CREDIT,EXT_SOURCE_3
100002,406597.5,0.1394
100003,1293502.5,
100004,135000,0.7296
";

const MODEL_JSON: &str = r#"{
  "feature_names": ["AMT_CREDIT", "EXT_SOURCE_3"],
  "coefficients": [0.3, -0.9],
  "intercept": -2.4
}"#;

/// Refuses every client whose id is even.
struct ParityService;

impl PredictionService for ParityService {
    fn fetch_prediction(&self, client_id: u32) -> Result<ScoringReply, ScoringError> {
        if client_id % 2 == 0 {
            Ok(ScoringReply::Scored(Prediction {
                decision: Decision::Refused,
                proba: [0.25, 0.75],
            }))
        } else {
            Err(ScoringError::Status(502))
        }
    }
}

/// Start the dashboard and return its base URL.
fn start() -> String {
    let clients = ClientTable::from_reader(CLIENTS_CSV.as_bytes(), "SK_ID_CURR", "TARGET").unwrap();
    let features = FeatureMatrix::from_reader(FEATURES_CSV.as_bytes(), "SK_ID_CURR").unwrap();
    let dataset = Dataset::new(clients, features).unwrap();
    let model = LinearModel::from_json(MODEL_JSON).unwrap();
    let mut config = DashboardConfig::default();
    config.logging.enabled = false;
    let ctx = DashboardContext::new(config, dataset, model).unwrap();

    let server = web::bind("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || web::run(&server, &ctx, &ParityService));
    format!("http://{addr}")
}

fn get_json(url: &str) -> Json {
    ureq::get(url).call().unwrap().into_json().unwrap()
}

// ---------------------------------------------------------------------------
// Frontend
// ---------------------------------------------------------------------------

#[test]
fn index_serves_the_single_page_frontend() {
    let base = start();
    let resp = ureq::get(&format!("{base}/")).call().unwrap();
    assert!(resp.content_type().starts_with("text/html"));
    let html = resp.into_string().unwrap();
    assert!(html.contains("Credit Granting Dashboard"));
    assert!(html.contains("maxlength=\"6\""));
    assert!(html.contains("/api/render"));
}

#[test]
fn features_lists_display_columns_and_sections() {
    let base = start();
    let json = get_json(&format!("{base}/api/features"));
    assert_eq!(
        json["features"],
        serde_json::json!(["NAME_CONTRACT_TYPE", "AMT_CREDIT", "EXT_SOURCE_3"])
    );
    let slugs: Vec<&str> = json["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["slug"].as_str().unwrap())
        .collect();
    assert_eq!(
        slugs,
        vec!["prediction", "interpretation", "descriptive", "bivariate"]
    );
}

// ---------------------------------------------------------------------------
// Render endpoint
// ---------------------------------------------------------------------------

#[test]
fn render_prediction_returns_the_view_fragment() {
    let base = start();
    let json = get_json(&format!("{base}/api/render?client_id=100002&section=prediction"));
    assert_eq!(json["ok"], true);
    assert_eq!(json["client_id"], 100002);
    assert_eq!(json["section"], "prediction");
    let html = json["html"].as_str().unwrap();
    assert!(html.contains("Credit refused"));
    assert!(html.contains("75.00%"));
}

#[test]
fn render_reports_scoring_failure() {
    let base = start();
    let json = get_json(&format!("{base}/api/render?client_id=100003&section=descriptive"));
    assert_eq!(json["ok"], false);
    assert_eq!(json["outcome"], "api_status");
    let html = json["html"].as_str().unwrap();
    assert!(html.contains("Error while querying the scoring API"));
    assert!(!html.contains("<table"));
}

#[test]
fn render_bivariate_with_encoded_feature_names() {
    let base = start();
    let json = get_json(&format!(
        "{base}/api/render?client_id=100004&section=bivariate&x=NAME_CONTRACT_TYPE&y=AMT_CREDIT"
    ));
    assert_eq!(json["ok"], true);
    let html = json["html"].as_str().unwrap();
    assert!(html.contains("#D62728"));
    assert!(html.contains(">Revolving loans<"));

    let json = get_json(&format!(
        "{base}/api/render?client_id=100004&section=descriptive&features=AMT_CREDIT%2CEXT_SOURCE_3"
    ));
    assert_eq!(json["ok"], true);
    assert_eq!(json["html"].as_str().unwrap().matches("<figure").count(), 2);
}

#[test]
fn render_unknown_client_and_empty_input() {
    let base = start();
    let json = get_json(&format!("{base}/api/render?client_id=654321"));
    assert_eq!(json["outcome"], "not_found");
    assert!(json["html"].as_str().unwrap().contains("Client 654321 not found"));

    let json = get_json(&format!("{base}/api/render?client_id=&section=bivariate"));
    assert_eq!(json["outcome"], "idle");
    assert_eq!(
        json["html"],
        "<section class=\"view\" data-section=\"bivariate\"></section>"
    );
}

#[test]
fn render_rejects_unknown_section() {
    let base = start();
    match ureq::get(&format!("{base}/api/render?client_id=100002&section=charts")).call() {
        Err(ureq::Error::Status(code, resp)) => {
            assert_eq!(code, 400);
            let json: Json = resp.into_json().unwrap();
            assert_eq!(json["error"], "unknown section: charts");
        }
        other => panic!("expected 400, got {other:?}"),
    }
}

#[test]
fn unknown_route_is_404_json() {
    let base = start();
    match ureq::get(&format!("{base}/api/stats")).call() {
        Err(ureq::Error::Status(code, resp)) => {
            assert_eq!(code, 404);
            let json: Json = resp.into_json().unwrap();
            assert_eq!(json["error"], "not found");
        }
        other => panic!("expected 404, got {other:?}"),
    }
}
