//! Credit granting dashboard.
//!
//! Looks a client up in two row-aligned tables, asks a remote scoring service
//! for a decision, and renders one of four views: prediction, interpretation,
//! descriptive statistics or bivariate analysis.

pub mod analytics;
pub mod charts;
pub mod cli;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod data;
pub mod explain;
pub mod model;
pub mod scoring;
pub mod web;
