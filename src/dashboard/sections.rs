//! Block builders for the four dashboard sections.

use crate::charts::scatter::Axis;
use crate::charts::{Series, beeswarm, donut, histogram, scatter, waterfall};
use crate::context::DashboardContext;
use crate::data::ClientSelection;
use crate::explain;
use crate::scoring::{Decision, Prediction};

use super::Block;

fn heading(level: u8, text: impl Into<String>) -> Block {
    Block::Heading {
        level,
        text: text.into(),
    }
}

fn client_label(id: u32) -> String {
    format!("Client {id}")
}

/// Chart block, or an inline error when drawing failed.
fn chart(svg: anyhow::Result<String>, caption: impl Into<String>) -> Block {
    match svg {
        Ok(svg) => Block::Chart {
            svg,
            caption: caption.into(),
        },
        Err(e) => Block::Error(format!("Failed to draw chart: {e:#}")),
    }
}

/// Decision banner and default-probability donut.
pub(super) fn prediction(selection: &ClientSelection<'_>, prediction: &Prediction) -> Vec<Block> {
    let status = match prediction.decision {
        Decision::Refused => Block::Error(prediction.decision.to_string()),
        Decision::Granted => Block::Success(prediction.decision.to_string()),
    };

    vec![
        heading(2, format!("Model prediction for client {}", selection.id)),
        heading(3, "Credit status"),
        status,
        heading(3, "Probability of default"),
        chart(
            donut::render(
                prediction.proba,
                ["No default", "Default"],
                &prediction.failure_label(),
            ),
            "Donut chart showing the client's probability of default",
        ),
    ]
}

/// Per-client waterfall and global beeswarm.
///
/// Attributions for the whole feature matrix are recomputed on each call.
pub(super) fn interpretation(ctx: &DashboardContext, selection: &ClientSelection<'_>) -> Vec<Block> {
    let attributions = explain::explain(&ctx.model, ctx.dataset.features());
    let display = &ctx.config.display;

    vec![
        heading(2, "Prediction interpretation"),
        heading(3, format!("Feature importance for client {}", selection.id)),
        chart(
            waterfall::render(
                &attributions.waterfall(selection.index, display.waterfall_max_display),
            ),
            "Waterfall chart showing each feature's contribution to the client's prediction",
        ),
        heading(3, "Global feature importance"),
        chart(
            beeswarm::render(&attributions.beeswarm(display.beeswarm_max_display)),
            "Beeswarm chart showing the global importance of the features",
        ),
    ]
}

/// Key/value table of the client, plus one histogram per requested feature.
pub(super) fn descriptive(
    ctx: &DashboardContext,
    selection: &ClientSelection<'_>,
    features: &[String],
) -> Vec<Block> {
    let mut blocks = vec![
        heading(2, format!("Descriptive information for client {}", selection.id)),
        heading(3, "Client information"),
        Block::Table {
            value_header: "Value".to_string(),
            rows: selection
                .display
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        },
        heading(3, "Comparative analysis"),
    ];

    let clients = ctx.dataset.clients();
    for feature in features {
        let (Some(column), Some(value)) = (clients.column(feature), selection.value(feature)) else {
            blocks.push(Block::Error(format!("Unknown feature: {feature}")));
            continue;
        };
        let series = Series::from_values(&column);
        blocks.push(chart(
            histogram::render(
                feature,
                &series,
                series.position_of(value),
                &client_label(selection.id),
                ctx.config.display.histogram_bins,
            ),
            format!("Comparative histogram for feature {feature}"),
        ));
    }

    blocks
}

/// Scatter of all clients on two features, client highlighted.
pub(super) fn bivariate(
    ctx: &DashboardContext,
    selection: &ClientSelection<'_>,
    feature_x: Option<&str>,
    feature_y: Option<&str>,
) -> Vec<Block> {
    let mut blocks = vec![heading(
        2,
        "Bivariate analysis between two selected features",
    )];

    let (Some(fx), Some(fy)) = (feature_x, feature_y) else {
        blocks.push(Block::Message("No features available to compare".to_string()));
        return blocks;
    };

    let clients = ctx.dataset.clients();
    let resolve = |name: &str| Some((clients.column(name)?, selection.value(name)?));
    let (Some((x_column, x_value)), Some((y_column, y_value))) = (resolve(fx), resolve(fy)) else {
        let unknown = if resolve(fx).is_none() { fx } else { fy };
        blocks.push(Block::Error(format!("Unknown feature: {unknown}")));
        return blocks;
    };

    let x_series = Series::from_values(&x_column);
    let y_series = Series::from_values(&y_column);
    let client = x_series
        .position_of(x_value)
        .zip(y_series.position_of(y_value));

    blocks.push(chart(
        scatter::render(
            Axis {
                name: fx,
                series: &x_series,
            },
            Axis {
                name: fy,
                series: &y_series,
            },
            client,
            &client_label(selection.id),
            ctx.config.display.scatter_alpha,
        ),
        format!("Scatter plot for features {fx} and {fy}"),
    ));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_failure_becomes_inline_error() {
        let block = chart(Err(anyhow::anyhow!("backend closed")), "caption");
        assert_eq!(
            block,
            Block::Error("Failed to draw chart: backend closed".to_string())
        );

        let block = chart(Ok("<svg></svg>".to_string()), "A donut");
        assert_eq!(
            block,
            Block::Chart {
                svg: "<svg></svg>".to_string(),
                caption: "A donut".to_string(),
            }
        );
    }
}
