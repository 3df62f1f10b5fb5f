//! Feature attributions for the linear scoring model.
//!
//! For a linear model over independent features the exact Shapley value of
//! feature `j` on row `i` is `w_j * (z_ij - mean_j(z))`, where `z` is the
//! standardized input and the mean runs over the background data (the full
//! feature matrix). The base value is the model margin at that mean, so
//! `base + Σ_j φ_ij` recovers the row's margin exactly.
//!
//! Attributions are recomputed for the whole matrix on every call; callers
//! must not assume any caching.

use crate::data::FeatureMatrix;
use crate::model::LinearModel;

/// Attribution matrix for every row of the feature matrix.
#[derive(Debug, Clone)]
pub struct Attributions {
    pub feature_names: Vec<String>,
    /// Expected model output (log-odds) over the background data.
    pub base_value: f64,
    /// `values[i][j]`: contribution of feature `j` to row `i`.
    pub values: Vec<Vec<f64>>,
    /// Raw feature values, used to color the summary plot.
    pub data: Vec<Vec<f64>>,
}

/// Compute attributions of every row against the full matrix as background.
pub fn explain(model: &LinearModel, matrix: &FeatureMatrix) -> Attributions {
    let n_features = model.n_features();
    let rows = matrix.rows();

    let standardized = |j: usize, x: f64| if x.is_nan() { 0.0 } else { model.transform(j, x) };

    let mut means = vec![0.0; n_features];
    if !rows.is_empty() {
        for row in rows {
            for (j, &x) in row.iter().enumerate() {
                means[j] += standardized(j, x);
            }
        }
        for mean in &mut means {
            *mean /= rows.len() as f64;
        }
    }

    let base_value = model.intercept
        + means
            .iter()
            .zip(&model.coefficients)
            .map(|(m, w)| m * w)
            .sum::<f64>();

    let values = rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(j, &x)| model.coefficients[j] * (standardized(j, x) - means[j]))
                .collect()
        })
        .collect();

    Attributions {
        feature_names: model.feature_names.clone(),
        base_value,
        values,
        data: rows.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Waterfall (one client)
// ---------------------------------------------------------------------------

/// One bar of a waterfall chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallStep {
    /// Feature name, or `"N other features"` for the folded remainder.
    pub label: String,
    /// Client's raw value for the feature, absent for the folded remainder.
    pub feature_value: Option<f64>,
    pub contribution: f64,
}

/// Per-client attribution breakdown, largest contribution first.
#[derive(Debug, Clone)]
pub struct Waterfall {
    pub base_value: f64,
    /// Model output for the client: `base_value + Σ contributions`.
    pub output: f64,
    pub steps: Vec<WaterfallStep>,
}

// ---------------------------------------------------------------------------
// Beeswarm (all clients)
// ---------------------------------------------------------------------------

/// One row of the summary plot.
#[derive(Debug, Clone)]
pub struct BeeswarmRow {
    pub label: String,
    /// `(contribution, normalized feature value)` per client. The color value
    /// is `None` for missing inputs and for the folded remainder row.
    pub points: Vec<(f64, Option<f64>)>,
    pub mean_abs: f64,
}

/// Global summary, most important feature first.
#[derive(Debug, Clone)]
pub struct Beeswarm {
    pub rows: Vec<BeeswarmRow>,
}

impl Attributions {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Model output reconstructed from the attributions of row `index`.
    pub fn output(&self, index: usize) -> f64 {
        self.base_value + self.values[index].iter().sum::<f64>()
    }

    /// Waterfall for row `index`, showing at most `max_display` bars.
    ///
    /// When the model has more features than `max_display`, the smallest
    /// ones are folded into a final `"N other features"` bar.
    pub fn waterfall(&self, index: usize, max_display: usize) -> Waterfall {
        let contributions = &self.values[index];
        let mut order: Vec<usize> = (0..contributions.len()).collect();
        order.sort_by(|&a, &b| contributions[b].abs().total_cmp(&contributions[a].abs()));

        let max_display = max_display.max(1);
        let shown = if order.len() > max_display {
            max_display - 1
        } else {
            order.len()
        };

        let mut steps: Vec<WaterfallStep> = order[..shown]
            .iter()
            .map(|&j| WaterfallStep {
                label: self.feature_names[j].clone(),
                feature_value: Some(self.data[index][j]).filter(|v| !v.is_nan()),
                contribution: contributions[j],
            })
            .collect();

        let rest = &order[shown..];
        if !rest.is_empty() {
            steps.push(WaterfallStep {
                label: format!("{} other features", rest.len()),
                feature_value: None,
                contribution: rest.iter().map(|&j| contributions[j]).sum(),
            });
        }

        Waterfall {
            base_value: self.base_value,
            output: self.output(index),
            steps,
        }
    }

    /// Summary of all rows, ordered by mean absolute contribution.
    ///
    /// With more features than `max_display`, the remainder is folded into a
    /// final `"Sum of N other features"` row.
    pub fn beeswarm(&self, max_display: usize) -> Beeswarm {
        let n_features = self.feature_names.len();
        let mean_abs: Vec<f64> = (0..n_features)
            .map(|j| {
                if self.values.is_empty() {
                    0.0
                } else {
                    self.values.iter().map(|row| row[j].abs()).sum::<f64>()
                        / self.values.len() as f64
                }
            })
            .collect();

        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| mean_abs[b].total_cmp(&mean_abs[a]));

        let max_display = max_display.max(1);
        let shown = if n_features > max_display {
            max_display - 1
        } else {
            n_features
        };

        let mut rows: Vec<BeeswarmRow> = order[..shown]
            .iter()
            .map(|&j| {
                let column: Vec<f64> = self.data.iter().map(|row| row[j]).collect();
                let colors = normalize_for_color(&column);
                BeeswarmRow {
                    label: self.feature_names[j].clone(),
                    points: self
                        .values
                        .iter()
                        .map(|row| row[j])
                        .zip(colors)
                        .collect(),
                    mean_abs: mean_abs[j],
                }
            })
            .collect();

        let rest = &order[shown..];
        if !rest.is_empty() {
            let points: Vec<(f64, Option<f64>)> = self
                .values
                .iter()
                .map(|row| (rest.iter().map(|&j| row[j]).sum(), None))
                .collect();
            let mean_abs = if points.is_empty() {
                0.0
            } else {
                points.iter().map(|(v, _)| v.abs()).sum::<f64>() / points.len() as f64
            };
            rows.push(BeeswarmRow {
                label: format!("Sum of {} other features", rest.len()),
                points,
                mean_abs,
            });
        }

        Beeswarm { rows }
    }
}

/// Map feature values to `[0, 1]` for coloring, clipped to the 5th–95th
/// percentile range so outliers do not wash out the scale.
fn normalize_for_color(values: &[f64]) -> Vec<Option<f64>> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return vec![None; values.len()];
    }
    finite.sort_by(f64::total_cmp);

    let mut lo = percentile(&finite, 5.0);
    let mut hi = percentile(&finite, 95.0);
    if lo == hi {
        lo = finite[0];
        hi = finite[finite.len() - 1];
    }

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                None
            } else if hi > lo {
                Some(((v - lo) / (hi - lo)).clamp(0.0, 1.0))
            } else {
                Some(0.5)
            }
        })
        .collect()
}

/// Linear-interpolated percentile of sorted data.
pub(crate) fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
