/// Configuration schema and defaults for the credit dashboard.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[server]`, `[data]`, `[scoring]`, `[display]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values they
/// want to override.
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level dashboard configuration.
///
/// Maps directly to `~/.credit-dashboard/config.toml` and
/// `.credit-dashboard.toml`. Missing sections and fields fall back to
/// built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub scoring: ScoringConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Embedded web server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `credit-dashboard serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on startup.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8501".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [data]
// ---------------------------------------------------------------------------

/// Input files, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Raw client table (identifier, label, display features).
    pub raw_path: PathBuf,
    /// Preprocessed feature table consumed by the model.
    pub features_path: PathBuf,
    /// Serialized linear model artifact (JSON).
    pub model_path: PathBuf,
    /// Name of the client identifier column in both tables.
    pub id_column: String,
    /// Name of the outcome label column in the raw table.
    pub label_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data.csv"),
            features_path: PathBuf::from("data_api.csv"),
            model_path: PathBuf::from("model.json"),
            id_column: "SK_ID_CURR".to_string(),
            label_column: "TARGET".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [scoring]
// ---------------------------------------------------------------------------

/// Remote scoring service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Endpoint receiving `POST client_id=<id>` as form data.
    pub url: String,
    /// Request timeout in milliseconds. `0` leaves the HTTP client's own
    /// behavior in place.
    pub timeout_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000/predict".to_string(),
            timeout_ms: 0,
        }
    }
}

impl ScoringConfig {
    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Chart rendering knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows shown in the per-client waterfall before folding the remainder.
    pub waterfall_max_display: usize,
    /// Features shown in the global beeswarm summary.
    pub beeswarm_max_display: usize,
    /// Histogram bin count. `0` selects the bin count automatically.
    pub histogram_bins: usize,
    /// Opacity of the population points in the bivariate scatter.
    pub scatter_alpha: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            waterfall_max_display: 10,
            beeswarm_max_display: 10,
            histogram_bins: 0,
            scatter_alpha: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Interaction log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append one JSONL entry per dashboard interaction.
    pub enabled: bool,
    /// Override for the log location. Defaults to
    /// `~/.credit-dashboard/interactions.jsonl` when unset.
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Default config file
// ---------------------------------------------------------------------------

impl DashboardConfig {
    /// Annotated default configuration written by `config init`.
    pub fn default_toml() -> &'static str {
        r#"# credit-dashboard configuration
#
# Layers (later wins): built-in defaults, ~/.credit-dashboard/config.toml,
# ./.credit-dashboard.toml, CREDIT_DASHBOARD_* environment variables.

[server]
addr = "127.0.0.1:8501"
open_browser = true

[data]
raw_path = "data.csv"
features_path = "data_api.csv"
model_path = "model.json"
id_column = "SK_ID_CURR"
label_column = "TARGET"

[scoring]
url = "http://127.0.0.1:5000/predict"
# 0 = no explicit timeout
timeout_ms = 0

[display]
waterfall_max_display = 10
beeswarm_max_display = 10
# 0 = automatic bin count
histogram_bins = 0
scatter_alpha = 0.5

[logging]
enabled = true
"#
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_annotated_toml() {
        let parsed: DashboardConfig = toml::from_str(DashboardConfig::default_toml()).unwrap();
        let defaults = DashboardConfig::default();
        assert_eq!(parsed.server.addr, defaults.server.addr);
        assert_eq!(parsed.data.id_column, defaults.data.id_column);
        assert_eq!(parsed.data.label_column, defaults.data.label_column);
        assert_eq!(parsed.scoring.url, defaults.scoring.url);
        assert_eq!(
            parsed.display.waterfall_max_display,
            defaults.display.waterfall_max_display
        );
        assert!(parsed.logging.enabled);
    }

    #[test]
    fn partial_toml_fills_missing_fields() {
        let cfg: DashboardConfig = toml::from_str(
            r#"
[scoring]
url = "https://scoring.example/predict"
"#,
        )
        .unwrap();
        assert_eq!(cfg.scoring.url, "https://scoring.example/predict");
        assert_eq!(cfg.scoring.timeout_ms, 0);
        assert_eq!(cfg.server.addr, "127.0.0.1:8501");
    }

    #[test]
    fn zero_timeout_means_none() {
        let mut scoring = ScoringConfig::default();
        assert_eq!(scoring.timeout(), None);
        scoring.timeout_ms = 2500;
        assert_eq!(scoring.timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = DashboardConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: DashboardConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.data.raw_path, cfg.data.raw_path);
    }
}
