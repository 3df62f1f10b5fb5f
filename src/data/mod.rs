//! Client data: the raw client table and the model feature matrix, loaded
//! once and checked for row alignment.
//!
//! - [`table`] parses the two CSV files into typed tables.
//! - [`lookup`] resolves an operator-typed identifier to a client selection.

pub mod lookup;
pub mod table;

use std::collections::HashSet;

use anyhow::{Result, bail};

use crate::config::schema::DataConfig;

pub use lookup::{ClientSelection, LookupError};
pub use table::{ClientTable, FeatureMatrix, Value};

/// Both tables, row-aligned by client.
#[derive(Debug, Clone)]
pub struct Dataset {
    clients: ClientTable,
    features: FeatureMatrix,
}

impl Dataset {
    /// Pair the two tables, rejecting any misalignment.
    ///
    /// Row `i` of both tables must describe the same client, so both the row
    /// count and the identifier sequence have to match. Identifiers must also
    /// be unique, or a lookup could resolve to the wrong row.
    pub fn new(clients: ClientTable, features: FeatureMatrix) -> Result<Self> {
        if clients.len() != features.len() {
            bail!(
                "client table has {} rows but feature table has {}",
                clients.len(),
                features.len()
            );
        }
        if let Some(row) = clients
            .ids()
            .iter()
            .zip(features.ids())
            .position(|(a, b)| a != b)
        {
            bail!(
                "tables are not row-aligned: row {row} is client {} in the client table but {} in the feature table",
                clients.ids()[row],
                features.ids()[row]
            );
        }
        let mut seen = HashSet::with_capacity(clients.len());
        if let Some((row, id)) = clients
            .ids()
            .iter()
            .enumerate()
            .find(|(_, id)| !seen.insert(**id))
        {
            bail!("duplicate client id {id} at row {row}");
        }
        Ok(Self { clients, features })
    }

    /// Load and align both tables from the configured paths.
    pub fn load(config: &DataConfig) -> Result<Self> {
        let clients = ClientTable::load(&config.raw_path, &config.id_column, &config.label_column)?;
        let features = FeatureMatrix::load(&config.features_path, &config.id_column)?;
        Self::new(clients, features)
    }

    pub fn clients(&self) -> &ClientTable {
        &self.clients
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }
}
