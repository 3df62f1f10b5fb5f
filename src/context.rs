//! Read-only state shared by every lookup and render.

use anyhow::{Context, Result};

use crate::config::DashboardConfig;
use crate::data::Dataset;
use crate::model::LinearModel;

/// Tables, model and settings, built once at startup and only borrowed
/// afterwards.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub config: DashboardConfig,
    pub dataset: Dataset,
    pub model: LinearModel,
}

impl DashboardContext {
    /// Assemble a context, checking that the model consumes exactly the
    /// feature table's columns.
    pub fn new(config: DashboardConfig, dataset: Dataset, model: LinearModel) -> Result<Self> {
        model
            .check_columns(dataset.features().columns())
            .context("model artifact does not fit the feature table")?;
        Ok(Self {
            config,
            dataset,
            model,
        })
    }

    /// Load both tables and the model from the configured paths.
    pub fn load(config: DashboardConfig) -> Result<Self> {
        let dataset = Dataset::load(&config.data)?;
        let model = LinearModel::load(&config.data.model_path)?;
        Self::new(config, dataset, model)
    }
}
