//! Waterfall chart of one client's attributions.
//!
//! The largest contribution is drawn at the top. Bars chain from the base
//! value at the bottom up to the client's output at the top: red bars push
//! toward default, blue bars away from it.

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};

use super::{
    BLUE, MUTED, RED, caption_font, category_at, format_number, padded_range, render_svg,
    text_style,
};
use crate::explain::Waterfall;

const WIDTH: u32 = 720;
const ROW: u32 = 28;
const CHROME: u32 = 130;

/// Bar geometry: `(start, end)` of each step along the output axis, in
/// the same order as `waterfall.steps`.
pub fn bar_spans(waterfall: &Waterfall) -> Vec<(f64, f64)> {
    let mut spans = vec![(0.0, 0.0); waterfall.steps.len()];
    let mut cursor = waterfall.base_value;
    for (i, step) in waterfall.steps.iter().enumerate().rev() {
        spans[i] = (cursor, cursor + step.contribution);
        cursor += step.contribution;
    }
    spans
}

fn step_label(label: &str, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{} = {label}", format_number(v)),
        None => label.to_string(),
    }
}

/// Render the waterfall.
///
/// Step `i` sits on row `n - 1 - i`. Row `n` carries the `f(x)` label and
/// row `-1` the `E[f(X)]` label.
pub fn render(waterfall: &Waterfall) -> Result<String> {
    let n = waterfall.steps.len();
    let height = CHROME + (n as u32 + 2) * ROW;
    let spans = bar_spans(waterfall);
    let x_range = padded_range(
        spans
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .chain([waterfall.base_value, waterfall.output]),
        0.12,
    );
    let nudge = (x_range.end - x_range.start) * 0.01;

    // Row labels bottom-up, so that position `k` reads `rows[k]`
    let rows: Vec<String> = waterfall
        .steps
        .iter()
        .rev()
        .map(|s| step_label(&s.label, s.feature_value))
        .collect();
    let row_of = |i: usize| (n - 1 - i) as f64;
    let top = n as f64 - 0.5;

    render_svg((WIDTH, height), "Feature contributions for the client", |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Feature contributions for the client", caption_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(240)
            .build_cartesian_2d(x_range.clone(), -1.5..(n as f64 + 0.5))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n + 3)
            .y_label_formatter(&|v| category_at(&rows, *v))
            .x_label_formatter(&|v| format_number(*v))
            .x_desc("Contribution to the default log-odds")
            .draw()?;

        // f(x) at the top, E[f(X)] at the bottom
        let guides = [
            (waterfall.output, n as f64, format!("f(x) = {:.3}", waterfall.output)),
            (waterfall.base_value, -1.0, format!("E[f(X)] = {:.3}", waterfall.base_value)),
        ];
        for (x, label_row, label) in guides {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x, -0.5), (x, top)],
                MUTED.mix(0.6).stroke_width(1),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                label,
                (x, label_row),
                text_style(11.0, &MUTED, HPos::Center, VPos::Center),
            )))?;
        }

        for (i, (step, (start, end))) in waterfall.steps.iter().zip(&spans).enumerate() {
            let y = row_of(i);
            let (lo, hi) = (start.min(*end), start.max(*end));
            let positive = step.contribution >= 0.0;
            let color = if positive { RED } else { BLUE };

            chart.draw_series(std::iter::once(Rectangle::new(
                [(lo, y - 0.35), (hi, y + 0.35)],
                color.filled(),
            )))?;

            let (anchor, pos, sign) = if positive {
                (hi + nudge, HPos::Left, "+")
            } else {
                (lo - nudge, HPos::Right, "")
            };
            chart.draw_series(std::iter::once(Text::new(
                format!("{sign}{:.3}", step.contribution),
                (anchor, y),
                text_style(10.0, &color, pos, VPos::Center),
            )))?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::WaterfallStep;

    fn sample() -> Waterfall {
        Waterfall {
            base_value: -1.0,
            output: 0.5,
            steps: vec![
                WaterfallStep {
                    label: "EXT_SOURCE_3".to_string(),
                    feature_value: Some(0.155),
                    contribution: 2.0,
                },
                WaterfallStep {
                    label: "2 other features".to_string(),
                    feature_value: None,
                    contribution: -0.5,
                },
            ],
        }
    }

    #[test]
    fn spans_chain_from_base_to_output() {
        let spans = bar_spans(&sample());
        // Bottom bar starts at the base value
        assert_eq!(spans[1], (-1.0, -1.5));
        // Top bar ends at the output
        assert_eq!(spans[0], (-1.5, 0.5));
    }

    #[test]
    fn step_label_prefixes_value() {
        assert_eq!(step_label("EXT_SOURCE_3", Some(0.155)), "0.155 = EXT_SOURCE_3");
        assert_eq!(step_label("2 other features", None), "2 other features");
    }

    #[test]
    fn renders_bars_labels_and_guides() {
        let svg = render(&sample()).unwrap();
        assert!(svg.contains("#FF0051") && svg.contains("#008BFB"));
        assert!(svg.contains(">0.155 = EXT_SOURCE_3<"));
        assert!(svg.contains(">2 other features<"));
        assert!(svg.contains(">+2.000<"));
        assert!(svg.contains(">-0.500<"));
        assert!(svg.contains(">f(x) = 0.500<"));
        assert!(svg.contains(">E[f(X)] = -1.000<"));
        assert!(svg.contains("Contribution to the default log-odds"));
    }
}
