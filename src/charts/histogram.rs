//! Distribution of one feature across all clients, with the selected
//! client's value marked by a vertical line.
//!
//! Numeric features get a histogram plus a Gaussian KDE curve scaled to
//! counts. Text features get one bar per category.

use std::f64::consts::PI;

use anyhow::Result;
use plotters::prelude::*;

use super::{
    CLIENT_RED, POPULATION, Series, caption_font, category_at, category_range, extent,
    format_number, padded_range, render_svg, swatch,
};
use crate::explain::percentile;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 380;
const KDE_POINTS: usize = 100;
const MAX_BINS: usize = 200;

/// Bin count from the larger of the Sturges and Freedman–Diaconis estimates.
pub fn auto_bin_count(sorted: &[f64]) -> usize {
    let n = sorted.len();
    if n < 2 {
        return 1;
    }
    let range = sorted[n - 1] - sorted[0];
    if range <= 0.0 {
        return 1;
    }
    let sturges = ((n as f64).log2() + 1.0).ceil() as usize;
    let iqr = percentile(sorted, 75.0) - percentile(sorted, 25.0);
    let fd = if iqr > 0.0 {
        let width = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);
        (range / width).ceil() as usize
    } else {
        0
    };
    sturges.max(fd).clamp(1, MAX_BINS)
}

/// Counts of `values` in `bins` equal-width bins over `[min, max]`.
/// The last bin is closed on the right.
pub fn bin_counts(values: &[f64], min: f64, max: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins.max(1)];
    let width = (max - min) / counts.len() as f64;
    for &v in values {
        let idx = if width > 0.0 {
            (((v - min) / width).floor() as usize).min(counts.len() - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }
    counts
}

/// Gaussian KDE with Scott's bandwidth, evaluated at `xs`. Returns `None`
/// when the sample has no spread.
pub fn kde(values: &[f64], xs: &[f64]) -> Option<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = var.sqrt();
    if std <= 0.0 || !std.is_finite() {
        return None;
    }
    let h = std * (n as f64).powf(-0.2);
    let norm = 1.0 / (n as f64 * h * (2.0 * PI).sqrt());
    Some(
        xs.iter()
            .map(|x| {
                norm * values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / h).powi(2)).exp())
                    .sum::<f64>()
            })
            .collect(),
    )
}

/// Render the comparison chart for `feature`.
///
/// `client` is the client's position in the series' coordinates (value or
/// category index). `bins = 0` picks the bin count automatically.
pub fn render(
    feature: &str,
    series: &Series,
    client: Option<f64>,
    client_label: &str,
    bins: usize,
) -> Result<String> {
    let bars = match series {
        Series::Numeric(values) => {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            numeric_bars(&present, bins)
        }
        Series::Categorical { categories, codes } => {
            let mut counts = vec![0usize; categories.len()];
            for code in codes.iter().flatten() {
                counts[*code] += 1;
            }
            categorical_bars(categories, &counts)
        }
    };

    let title = format!("Comparison of {feature}");
    render_svg((WIDTH, HEIGHT), &title, |root| {
        let peak = bars
            .rects
            .iter()
            .map(|(_, _, count)| *count)
            .chain(bars.curve.iter().map(|(_, y)| *y))
            .fold(1.0, f64::max);
        let x_range = match &bars.categories {
            Some(categories) => category_range(categories.len()),
            None => padded_range(
                bars.rects
                    .iter()
                    .flat_map(|(x0, x1, _)| [*x0, *x1])
                    .chain(client),
                0.02,
            ),
        };
        let y_top = peak * 1.05;

        let mut chart = ChartBuilder::on(root)
            .caption(&title, caption_font())
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d(x_range, 0.0..y_top)?;

        let tick = |v: &f64| match &bars.categories {
            Some(categories) => category_at(categories, *v),
            None => format_number(*v),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.categories.as_ref().map_or(10, |c| c.len() + 1))
            .x_label_formatter(&tick)
            .y_label_formatter(&|v| format_number(*v))
            .x_desc(feature)
            .y_desc("Count")
            .draw()?;

        chart
            .draw_series(bars.rects.iter().map(|(x0, x1, count)| {
                Rectangle::new([(*x0, 0.0), (*x1, *count)], POPULATION.mix(0.5).filled())
            }))?
            .label("All clients")
            .legend(swatch(POPULATION));

        if !bars.curve.is_empty() {
            chart.draw_series(LineSeries::new(
                bars.curve.iter().copied(),
                POPULATION.stroke_width(2),
            ))?;
        }

        if let Some(x) = client {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x, 0.0), (x, y_top)],
                    CLIENT_RED.stroke_width(2),
                )))?
                .label(client_label)
                .legend(swatch(CLIENT_RED));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    })
}

/// Bars as `(left, right, count)` plus the KDE curve scaled to counts.
struct Bars {
    rects: Vec<(f64, f64, f64)>,
    curve: Vec<(f64, f64)>,
    categories: Option<Vec<String>>,
}

fn numeric_bars(values: &[f64], bins: usize) -> Bars {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let (min, max) = extent(sorted.iter().copied()).unwrap_or((0.0, 1.0));
    let bins = if bins == 0 { auto_bin_count(&sorted) } else { bins };
    let counts = bin_counts(&sorted, min, max, bins);
    // A constant sample gets unit-wide bars starting just left of its value
    let (start, bin_width) = if max > min {
        (min, (max - min) / bins as f64)
    } else {
        (min - 0.5, 1.0)
    };

    let rects = counts
        .iter()
        .enumerate()
        .map(|(i, count)| {
            let x0 = start + i as f64 * bin_width;
            (x0, x0 + bin_width, *count as f64)
        })
        .collect();

    let kde_xs: Vec<f64> = (0..KDE_POINTS)
        .map(|i| min + (max - min) * i as f64 / (KDE_POINTS - 1) as f64)
        .collect();
    let curve = kde(&sorted, &kde_xs)
        .map(|density| {
            kde_xs
                .iter()
                .zip(density)
                .map(|(x, d)| (*x, d * sorted.len() as f64 * bin_width))
                .collect()
        })
        .unwrap_or_default();

    Bars {
        rects,
        curve,
        categories: None,
    }
}

fn categorical_bars(categories: &[String], counts: &[usize]) -> Bars {
    Bars {
        rects: counts
            .iter()
            .enumerate()
            .map(|(i, count)| (i as f64 - 0.4, i as f64 + 0.4, *count as f64))
            .collect(),
        curve: Vec::new(),
        categories: Some(categories.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_bin_count_grows_with_sample() {
        assert_eq!(auto_bin_count(&[]), 1);
        assert_eq!(auto_bin_count(&[3.0, 3.0, 3.0]), 1);
        let small: Vec<f64> = (0..8).map(f64::from).collect();
        // Sturges: log2(8) + 1 = 4
        assert_eq!(auto_bin_count(&small), 4);
        let large: Vec<f64> = (0..1000).map(f64::from).collect();
        assert!(auto_bin_count(&large) > auto_bin_count(&small));
    }

    #[test]
    fn bin_counts_closes_last_bin() {
        let counts = bin_counts(&[0.0, 0.5, 1.0, 2.0], 0.0, 2.0, 2);
        assert_eq!(counts, vec![2, 2]);
        assert_eq!(bin_counts(&[5.0, 5.0], 5.0, 5.0, 3), vec![2, 0, 0]);
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.0, 4.5];
        let xs: Vec<f64> = (0..2001).map(|i| -10.0 + i as f64 * 0.01).collect();
        let density = kde(&values, &xs).unwrap();
        let area: f64 = density.iter().sum::<f64>() * 0.01;
        assert!((area - 1.0).abs() < 0.01, "area = {area}");
        assert!(kde(&[1.0, 1.0], &xs).is_none());
        assert!(kde(&[1.0], &xs).is_none());
    }

    #[test]
    fn numeric_histogram_marks_client() {
        let series = Series::Numeric(vec![Some(1.0), Some(2.0), None, Some(3.5), Some(2.2)]);
        let svg = render("AMT_INCOME_TOTAL", &series, Some(2.0), "Client 100002", 0).unwrap();
        assert!(svg.contains("#D62728"));
        assert!(svg.contains(">Client 100002<"));
        assert!(svg.contains(">All clients<"));
        assert!(svg.contains(">Comparison of AMT_INCOME_TOTAL<"));
    }

    #[test]
    fn client_without_value_has_no_marker() {
        let series = Series::Numeric(vec![Some(1.0), Some(2.0)]);
        let svg = render("X", &series, None, "Client 100002", 5).unwrap();
        assert!(!svg.contains("#D62728"));
        assert!(!svg.contains(">Client 100002<"));
    }

    #[test]
    fn numeric_bars_follow_bins_and_kde() {
        let bars = numeric_bars(&[1.0, 2.0, 2.0, 3.0], 2);
        assert_eq!(bars.rects, vec![(1.0, 2.0, 1.0), (2.0, 3.0, 3.0)]);
        assert_eq!(bars.curve.len(), KDE_POINTS);
        assert_eq!(bars.curve[0].0, 1.0);
        assert!(bars.categories.is_none());
    }

    #[test]
    fn constant_sample_gets_one_unit_bar() {
        let bars = numeric_bars(&[7.0, 7.0, 7.0], 0);
        assert_eq!(bars.rects, vec![(6.5, 7.5, 3.0)]);
        assert!(bars.curve.is_empty());

        let series = Series::Numeric(vec![Some(7.0), Some(7.0)]);
        let svg = render("A", &series, Some(7.0), "Client 100002", 0).unwrap();
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn categorical_histogram_draws_one_bar_per_category() {
        let series = Series::Categorical {
            categories: vec!["F".to_string(), "M".to_string()],
            codes: vec![Some(0), Some(1), Some(1), None],
        };
        let svg = render("CODE_GENDER", &series, Some(1.0), "Client 100002", 0).unwrap();
        assert!(svg.contains(">F<") && svg.contains(">M<"));
        assert!(svg.contains("#D62728"));

        let bars = categorical_bars(&["F".to_string(), "M".to_string()], &[1, 2]);
        assert_eq!(bars.rects, vec![(-0.4, 0.4, 1.0), (0.6, 1.4, 2.0)]);
    }
}
