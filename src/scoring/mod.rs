/// HTTP client for the remote credit-scoring service.
///
/// The service takes `POST client_id=<id>` as form data and answers HTTP 200
/// with one of two JSON shapes:
///
/// - `{"prediction": [0|1], "proba": [p_default]}` — a scored client
/// - `{"erreur": "..."}` — a refusal message, shown to the operator verbatim
///
/// Any other status is a generic failure. The call is made once, with no
/// retry; the timeout is only set when configured.
use std::fmt;
use std::time::Duration;

use serde_json::Value as Json;

use crate::config::schema::ScoringConfig;

/// Message shown for any non-200 answer.
pub const GENERIC_FAILURE: &str = "Error while querying the scoring API";

// ---------------------------------------------------------------------------
// Reply types
// ---------------------------------------------------------------------------

/// Credit decision for a scored client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// `prediction == 0`.
    Granted,
    /// `prediction == 1`.
    Refused,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "Credit granted"),
            Self::Refused => write!(f, "Credit refused"),
        }
    }
}

/// A scored client: decision plus `[p_repay, p_default]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub decision: Decision,
    pub proba: [f64; 2],
}

impl Prediction {
    /// Probability of default as a percentage.
    pub fn failure_pct(&self) -> f64 {
        self.proba[1] * 100.0
    }

    /// Percentage label with two decimals, e.g. `"42.17%"`.
    pub fn failure_label(&self) -> String {
        format!("{:.2}%", self.failure_pct())
    }
}

/// A successful (HTTP 200) answer from the service.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringReply {
    Scored(Prediction),
    /// The `erreur` message, untouched.
    Refusal(String),
}

/// Why no reply could be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    /// Service answered with a status other than 200.
    Status(u16),
    /// Connection refused, DNS failure, timeout, ...
    Transport(String),
    /// 200 answer without a usable `prediction` or `erreur`.
    Malformed(String),
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(_) => write!(f, "{GENERIC_FAILURE}"),
            Self::Transport(reason) => write!(f, "Scoring API unreachable: {reason}"),
            Self::Malformed(reason) => {
                write!(f, "Unexpected response from the scoring API: {reason}")
            }
        }
    }
}

impl std::error::Error for ScoringError {}

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// Source of predictions for the dashboard controller.
pub trait PredictionService {
    fn fetch_prediction(&self, client_id: u32) -> Result<ScoringReply, ScoringError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous scoring client, built once from config.
#[derive(Debug, Clone)]
pub struct ScoringClient {
    url: String,
    timeout: Option<Duration>,
}

impl ScoringClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.url.trim(), config.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether anything answers at the configured URL.
    ///
    /// Any HTTP status counts as reachable; only transport failures do not.
    /// Uses a short timeout so `health` doesn't stall.
    pub fn is_reachable(&self) -> bool {
        match ureq::get(&self.url).timeout(Duration::from_secs(5)).call() {
            Ok(_) | Err(ureq::Error::Status(..)) => true,
            Err(ureq::Error::Transport(_)) => false,
        }
    }
}

impl PredictionService for ScoringClient {
    fn fetch_prediction(&self, client_id: u32) -> Result<ScoringReply, ScoringError> {
        let mut request = ureq::post(&self.url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let id = client_id.to_string();
        let response = match request.send_form(&[("client_id", id.as_str())]) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => return Err(ScoringError::Status(code)),
            Err(ureq::Error::Transport(t)) => return Err(ScoringError::Transport(t.to_string())),
        };

        if response.status() != 200 {
            return Err(ScoringError::Status(response.status()));
        }

        let body = response
            .into_string()
            .map_err(|e| ScoringError::Transport(format!("failed to read response body: {e}")))?;
        parse_reply(&body)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Interpret the JSON body of a 200 answer.
///
/// `prediction` wins over `erreur` when both are present. A one-element
/// `proba` holds the default probability `p` and expands to `[1 - p, p]`;
/// a two-element `proba` is taken as `[p_repay, p_default]`.
pub fn parse_reply(body: &str) -> Result<ScoringReply, ScoringError> {
    let json: Json = serde_json::from_str(body)
        .map_err(|e| ScoringError::Malformed(format!("invalid JSON: {e}")))?;
    let object = json
        .as_object()
        .ok_or_else(|| ScoringError::Malformed("expected a JSON object".to_string()))?;

    if let Some(prediction) = object.get("prediction") {
        let decision = parse_decision(prediction)?;
        let proba = parse_proba(object.get("proba"))?;
        return Ok(ScoringReply::Scored(Prediction { decision, proba }));
    }

    if let Some(message) = object.get("erreur") {
        let text = match message {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Ok(ScoringReply::Refusal(text));
    }

    Err(ScoringError::Malformed(
        "neither 'prediction' nor 'erreur' in response".to_string(),
    ))
}

fn parse_decision(value: &Json) -> Result<Decision, ScoringError> {
    let first = match value {
        Json::Array(items) => items.first(),
        scalar => Some(scalar),
    };
    let raw = first
        .and_then(|v| v.as_f64().or_else(|| v.as_bool().map(f64::from)))
        .ok_or_else(|| ScoringError::Malformed("'prediction' is not a number".to_string()))?;

    match raw {
        r if r == 0.0 => Ok(Decision::Granted),
        r if r == 1.0 => Ok(Decision::Refused),
        other => Err(ScoringError::Malformed(format!(
            "'prediction' must be 0 or 1, got {other}"
        ))),
    }
}

fn parse_proba(value: Option<&Json>) -> Result<[f64; 2], ScoringError> {
    let value = value.ok_or_else(|| ScoringError::Malformed("missing 'proba'".to_string()))?;
    let numbers: Vec<f64> = match value {
        Json::Array(items) => items.iter().filter_map(Json::as_f64).collect(),
        scalar => scalar.as_f64().into_iter().collect(),
    };

    let proba = match numbers.as_slice() {
        [p] => [1.0 - p, *p],
        [p_repay, p_default] => [*p_repay, *p_default],
        _ => {
            return Err(ScoringError::Malformed(
                "'proba' must hold one or two numbers".to_string(),
            ));
        }
    };

    if proba.iter().any(|p| !(0.0..=1.0).contains(p)) {
        return Err(ScoringError::Malformed(format!(
            "probabilities out of range: {proba:?}"
        )));
    }
    Ok(proba)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
