//! Pre-trained scoring model artifact.
//!
//! The artifact is a standardized logistic regression exported as JSON:
//!
//! ```json
//! {
//!   "feature_names": ["EXT_SOURCE_2", "EXT_SOURCE_3"],
//!   "coefficients": [-0.41, -0.37],
//!   "intercept": -2.3,
//!   "scaler": { "mean": [0.51, 0.49], "scale": [0.19, 0.17] }
//! }
//! ```
//!
//! It is loaded once and only read afterwards. The dashboard never scores
//! with it (the remote service does); it feeds the attribution plots.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Per-feature standardization applied before the linear layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Logistic regression over standardized features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<Scaler>,
}

impl LinearModel {
    /// Deserialize the artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read model artifact {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("invalid model artifact {}", path.display()))
    }

    /// Parse and validate an artifact.
    pub fn from_json(text: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(text).context("failed to parse model JSON")?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        let n = self.feature_names.len();
        if n == 0 {
            bail!("model has no features");
        }
        if self.coefficients.len() != n {
            bail!(
                "model has {n} features but {} coefficients",
                self.coefficients.len()
            );
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                bail!("scaler dimensions do not match the {n} model features");
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                bail!("scaler contains a zero or non-finite scale");
            }
        }
        Ok(())
    }

    /// Fail unless the model consumes exactly `columns`, in order.
    pub fn check_columns(&self, columns: &[String]) -> Result<()> {
        if self.feature_names.as_slice() != columns {
            let missing: Vec<&str> = self
                .feature_names
                .iter()
                .filter(|f| !columns.contains(f))
                .map(String::as_str)
                .collect();
            bail!(
                "model features do not match the feature table columns (model expects {}, table has {}; missing: [{}])",
                self.feature_names.len(),
                columns.len(),
                missing.join(", ")
            );
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Standardized value of feature `j`.
    pub fn transform(&self, j: usize, x: f64) -> f64 {
        match &self.scaler {
            Some(s) => (x - s.mean[j]) / s.scale[j],
            None => x,
        }
    }

    /// Log-odds of default for one row. Missing values contribute nothing.
    pub fn margin(&self, row: &[f64]) -> f64 {
        self.intercept
            + row
                .iter()
                .enumerate()
                .map(|(j, &x)| {
                    if x.is_nan() {
                        0.0
                    } else {
                        self.coefficients[j] * self.transform(j, x)
                    }
                })
                .sum::<f64>()
    }

    /// Probability of default for one row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(self.margin(row))
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
