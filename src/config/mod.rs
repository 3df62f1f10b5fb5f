/// Configuration system for the credit dashboard.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::DashboardConfig::default()`]
/// 2. **User global config** — `~/.credit-dashboard/config.toml`
/// 3. **Project local config** — `.credit-dashboard.toml` in the current directory
/// 4. **Environment variables** — `CREDIT_DASHBOARD_*` overrides (highest precedence)
///
/// TOML layers merge key by key: a project file that only sets
/// `[scoring] url` keeps every other value from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// use credit_dashboard::config;
///
/// let cfg = config::load();
/// let ctx = DashboardContext::load(cfg)?;
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

pub use schema::DashboardConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved dashboard configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> DashboardConfig {
    let paths: Vec<PathBuf> = [global_config_path(), project_config_path()]
        .into_iter()
        .flatten()
        .collect();
    let mut config = load_layers(&paths);

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config);

    config
}

/// Deep-merge the TOML files at `paths` (later files win, key by key) and
/// deserialize the result once, so unset keys keep their built-in defaults.
fn load_layers(paths: &[PathBuf]) -> DashboardConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    for path in paths {
        if let Some(layer) = load_toml_layer(path) {
            merge_toml(&mut merged, layer);
        }
    }
    match merged.try_into() {
        Ok(config) => config,
        Err(e) => {
            warn(&format!("invalid merged config, using defaults: {e}"));
            DashboardConfig::default()
        }
    }
}

/// Read one TOML layer.
///
/// Returns `None` if the file doesn't exist. A file that exists but cannot be
/// read, parsed or matched against the schema is skipped with a warning.
fn load_toml_layer(path: &Path) -> Option<toml::Value> {
    if !path.exists() {
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn(&format!("ignoring {}: {e}", path.display()));
            return None;
        }
    };
    let value: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn(&format!("ignoring malformed {}: {e}", path.display()));
            return None;
        }
    };
    let typed: Result<DashboardConfig, _> = value.clone().try_into();
    if let Err(e) = typed {
        warn(&format!("ignoring {}: {e}", path.display()));
        return None;
    }
    Some(value)
}

/// Merge `overlay` into `base`. Tables merge key by key; any other value
/// replaces the one below it.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn warn(message: &str) {
    eprintln!("{} {message}", "warning:".yellow().bold());
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding the global config and the interaction log.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".credit-dashboard"))
}

/// Path to the user global config: `~/.credit-dashboard/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    home_dir().map(|dir| dir.join("config.toml"))
}

/// Path to the project local config in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".credit-dashboard.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CREDIT_DASHBOARD_ADDR` — server listen address
/// - `CREDIT_DASHBOARD_RAW_PATH` — raw client CSV
/// - `CREDIT_DASHBOARD_FEATURES_PATH` — model feature CSV
/// - `CREDIT_DASHBOARD_MODEL_PATH` — model artifact
/// - `CREDIT_DASHBOARD_API_URL` — scoring endpoint
/// - `CREDIT_DASHBOARD_API_TIMEOUT_MS` — scoring request timeout
/// - `CREDIT_DASHBOARD_LOG` — interaction log on/off
fn apply_env_overrides(config: &mut DashboardConfig) {
    if let Ok(val) = std::env::var("CREDIT_DASHBOARD_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Ok(val) = std::env::var("CREDIT_DASHBOARD_RAW_PATH")
        && !val.is_empty()
    {
        config.data.raw_path = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("CREDIT_DASHBOARD_FEATURES_PATH")
        && !val.is_empty()
    {
        config.data.features_path = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("CREDIT_DASHBOARD_MODEL_PATH")
        && !val.is_empty()
    {
        config.data.model_path = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("CREDIT_DASHBOARD_API_URL")
        && !val.is_empty()
    {
        config.scoring.url = val;
    }
    if let Ok(val) = std::env::var("CREDIT_DASHBOARD_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.scoring.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("CREDIT_DASHBOARD_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.credit-dashboard/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.credit-dashboard/ directory")?;
    }

    fs::write(&path, DashboardConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `scoring.url`. When no file exists yet, the
/// defaults are written out first and then updated.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashboardConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    // Reject edits that no longer deserialize into the schema
    let updated =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    toml::from_str::<DashboardConfig>(&updated)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        anyhow::bail!("empty config key");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[scoring]
url = "http://old/predict"
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "scoring.url", "http://new/predict").unwrap();
        assert_eq!(root["scoring"]["url"].as_str(), Some("http://new/predict"));
    }

    #[test]
    fn set_toml_value_updates_integer_and_bool() {
        let mut root: toml::Value = toml::from_str(
            r#"
[scoring]
timeout_ms = 0

[logging]
enabled = true
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "scoring.timeout_ms", "1500").unwrap();
        set_toml_value(&mut root, "logging.enabled", "off").unwrap();
        assert_eq!(root["scoring"]["timeout_ms"].as_integer(), Some(1500));
        assert_eq!(root["logging"]["enabled"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root: toml::Value = toml::from_str("[display]\nhistogram_bins = 0\n").unwrap();
        assert!(set_toml_value(&mut root, "display.histogram_bins", "many").is_err());
    }

    #[test]
    fn set_toml_value_updates_float() {
        let mut root: toml::Value = toml::from_str("[display]\nscatter_alpha = 0.5\n").unwrap();
        set_toml_value(&mut root, "display.scatter_alpha", "0.25").unwrap();
        let alpha = root["display"]["scatter_alpha"].as_float().unwrap();
        assert!((alpha - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn set_toml_value_rejects_unknown_section() {
        let mut root: toml::Value = toml::from_str("[server]\naddr = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "", "value").is_err());
    }

    fn temp_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "credit-dashboard-config-{}-{name}.toml",
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn project_layer_keeps_global_keys_it_does_not_set() {
        let global = temp_config("global", "[data]\nraw_path = \"/srv/data.csv\"\n");
        let project = temp_config(
            "project",
            "[scoring]\nurl = \"http://scoring.internal/predict\"\n",
        );

        let config = load_layers(&[global.clone(), project.clone()]);
        assert_eq!(config.data.raw_path, PathBuf::from("/srv/data.csv"));
        assert_eq!(config.scoring.url, "http://scoring.internal/predict");
        assert_eq!(
            config.data.features_path,
            DashboardConfig::default().data.features_path
        );

        let _ = fs::remove_file(global);
        let _ = fs::remove_file(project);
    }

    #[test]
    fn later_layer_wins_per_key() {
        let global = temp_config(
            "global-addr",
            "[server]\naddr = \"0.0.0.0:9000\"\nopen_browser = false\n",
        );
        let project = temp_config("project-addr", "[server]\naddr = \"127.0.0.1:8050\"\n");

        let config = load_layers(&[global.clone(), project.clone()]);
        assert_eq!(config.server.addr, "127.0.0.1:8050");
        assert!(!config.server.open_browser);

        let _ = fs::remove_file(global);
        let _ = fs::remove_file(project);
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let global = temp_config("global-ok", "[data]\nraw_path = \"/srv/data.csv\"\n");
        let broken = temp_config("broken", "[scoring\nurl = ");
        let mistyped = temp_config("mistyped", "[display]\nhistogram_bins = \"many\"\n");

        let config = load_layers(&[global.clone(), broken.clone(), mistyped.clone()]);
        assert_eq!(config.data.raw_path, PathBuf::from("/srv/data.csv"));
        assert_eq!(
            config.display.histogram_bins,
            DashboardConfig::default().display.histogram_bins
        );

        for path in [global, broken, mistyped] {
            let _ = fs::remove_file(path);
        }
    }

    #[test]
    fn missing_layers_give_defaults() {
        let missing = std::env::temp_dir().join("credit-dashboard-config-does-not-exist.toml");
        let config = load_layers(&[missing]);
        assert_eq!(config.server.addr, DashboardConfig::default().server.addr);
    }

    #[test]
    fn show_effective_config_returns_parseable_toml() {
        let text = show_effective_config().unwrap();
        let _: DashboardConfig = toml::from_str(&text).unwrap();
    }
}
