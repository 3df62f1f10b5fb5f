//! Bivariate scatter of all clients with the selected client highlighted.

use std::ops::Range;

use anyhow::Result;
use plotters::prelude::*;

use super::{
    CLIENT_RED, POPULATION, Series, caption_font, category_at, category_range, format_number,
    padded_range, render_svg, swatch,
};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 440;

/// One plotted axis: its name and data.
pub struct Axis<'a> {
    pub name: &'a str,
    pub series: &'a Series,
}

/// Rows where both coordinates are present.
pub fn points(x: &Series, y: &Series) -> Vec<(f64, f64)> {
    (0..x.len().min(y.len()))
        .filter_map(|i| Some((x.position(i)?, y.position(i)?)))
        .collect()
}

impl Axis<'_> {
    fn range(&self, values: impl Iterator<Item = f64>) -> Range<f64> {
        match self.series {
            Series::Categorical { categories, .. } => category_range(categories.len()),
            Series::Numeric(_) => padded_range(values, 0.05),
        }
    }

    /// Label budget: one per category, or the mesh default.
    fn label_count(&self) -> usize {
        match self.series {
            Series::Categorical { categories, .. } => categories.len() + 1,
            Series::Numeric(_) => 10,
        }
    }

    fn tick(&self, v: f64) -> String {
        match self.series {
            Series::Categorical { categories, .. } => category_at(categories, v),
            Series::Numeric(_) => format_number(v),
        }
    }
}

/// Render the scatter. `client` is the selected client's `(x, y)` position,
/// when both values are present.
pub fn render(
    x: Axis<'_>,
    y: Axis<'_>,
    client: Option<(f64, f64)>,
    client_label: &str,
    alpha: f64,
) -> Result<String> {
    let pts = points(x.series, y.series);
    let x_range = x.range(pts.iter().map(|p| p.0).chain(client.map(|c| c.0)));
    let y_range = y.range(pts.iter().map(|p| p.1).chain(client.map(|c| c.1)));
    let alpha = alpha.clamp(0.0, 1.0);

    let title = format!("Bivariate analysis: {} vs {}", x.name, y.name);
    render_svg((WIDTH, HEIGHT), &title, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&title, caption_font())
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_labels(x.label_count())
            .y_labels(y.label_count())
            .x_label_formatter(&|v| x.tick(*v))
            .y_label_formatter(&|v| y.tick(*v))
            .x_desc(x.name)
            .y_desc(y.name)
            .draw()?;

        chart
            .draw_series(
                pts.iter()
                    .map(|p| Circle::new(*p, 3, POPULATION.mix(alpha).filled())),
            )?
            .label("All clients")
            .legend(swatch(POPULATION));

        if let Some(point) = client {
            chart
                .draw_series(std::iter::once(Circle::new(point, 6, CLIENT_RED.filled())))?
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_skip_rows_with_missing_coordinate() {
        let x = Series::Numeric(vec![Some(1.0), None, Some(3.0)]);
        let y = Series::Numeric(vec![Some(10.0), Some(20.0), None]);
        assert_eq!(points(&x, &y), vec![(1.0, 10.0)]);
    }

    #[test]
    fn same_feature_on_both_axes_renders_diagonal() {
        let s = Series::Numeric(vec![Some(1.0), Some(2.0), Some(3.0)]);
        let pts = points(&s, &s);
        assert!(pts.iter().all(|(a, b)| a == b));

        let svg = render(
            Axis { name: "AMT_CREDIT", series: &s },
            Axis { name: "AMT_CREDIT", series: &s },
            Some((2.0, 2.0)),
            "Client 100002",
            0.5,
        )
        .unwrap();
        assert_eq!(svg.matches("<circle").count(), 4);
        assert!(svg.contains("#D62728"));
        assert!(svg.contains(">Client 100002<"));
        assert!(svg.contains(">Bivariate analysis: AMT_CREDIT vs AMT_CREDIT<"));
    }

    #[test]
    fn constant_feature_does_not_divide_by_zero() {
        let s = Series::Numeric(vec![Some(7.0), Some(7.0)]);
        let svg = render(
            Axis { name: "A", series: &s },
            Axis { name: "A", series: &s },
            Some((7.0, 7.0)),
            "Client 100002",
            0.5,
        )
        .unwrap();
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn categorical_axis_uses_category_labels() {
        let x = Series::Categorical {
            categories: vec!["Cash loans".to_string(), "Revolving loans".to_string()],
            codes: vec![Some(0), Some(1)],
        };
        let y = Series::Numeric(vec![Some(1.0), Some(2.0)]);
        let svg = render(
            Axis { name: "NAME_CONTRACT_TYPE", series: &x },
            Axis { name: "AMT_CREDIT", series: &y },
            None,
            "Client 100002",
            0.5,
        )
        .unwrap();
        assert!(svg.contains(">Cash loans<"));
        assert!(svg.contains(">Revolving loans<"));
        assert!(!svg.contains("#D62728"));
        assert_eq!(svg.matches("<circle").count(), 2);
    }
}
