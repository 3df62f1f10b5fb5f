//! Server-side SVG charts for the dashboard views.
//!
//! Every chart is drawn with `plotters` into an in-memory SVG string that is
//! embedded directly in the HTML fragment returned to the frontend. Charts
//! never keep state between renders.
//!
//! - [`donut`] — default probability ring
//! - [`waterfall`] — per-client attribution breakdown
//! - [`beeswarm`] — global attribution summary
//! - [`histogram`] — feature distribution with the client's value marked
//! - [`scatter`] — two-feature scatter with the client highlighted

pub mod beeswarm;
pub mod donut;
pub mod histogram;
pub mod scatter;
pub mod waterfall;

use std::ops::Range;

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_svg::SVGBackend;

use crate::data::Value;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Color for negative contributions and "no default".
pub const BLUE: RGBColor = RGBColor(0x00, 0x8b, 0xfb);
/// Color for positive contributions and "default".
pub const RED: RGBColor = RGBColor(0xff, 0x00, 0x51);
/// Highlight for the selected client.
pub const CLIENT_RED: RGBColor = RGBColor(0xd6, 0x27, 0x28);
/// Population fill in histograms and scatters.
pub const POPULATION: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
pub const AXIS: RGBColor = RGBColor(0x33, 0x33, 0x33);
pub const MUTED: RGBColor = RGBColor(0x77, 0x77, 0x77);

const FONT: &str = "sans-serif";

// ---------------------------------------------------------------------------
// Drawing helpers
// ---------------------------------------------------------------------------

pub(crate) type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Draw onto a white `width x height` SVG canvas and return the markup,
/// tagged with an accessible title.
pub(crate) fn render_svg<F>(size: (u32, u32), title: &str, draw: F) -> Result<String>
where
    F: FnOnce(&Area<'_>) -> Result<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(with_title(&svg, title))
}

/// Add `role`, `aria-label` and a `<title>` child to the root `<svg>` tag.
fn with_title(svg: &str, title: &str) -> String {
    let title = escape(title);
    let Some(start) = svg.find("<svg") else {
        return svg.to_string();
    };
    let Some(end) = svg[start..].find('>').map(|i| start + i) else {
        return svg.to_string();
    };
    let attrs = svg[start + 4..end].trim_end_matches('/');
    format!(
        "{}<svg role=\"img\" aria-label=\"{title}\"{attrs}><title>{title}</title>{}",
        &svg[..start],
        &svg[end + 1..]
    )
}

/// Caption font for chart titles.
pub(crate) fn caption_font() -> FontDesc<'static> {
    (FONT, 16.0).into_font()
}

/// Text style anchored at `(h, v)` relative to the drawing position.
pub(crate) fn text_style(size: f64, color: &RGBColor, h: HPos, v: VPos) -> TextStyle<'static> {
    (FONT, size).into_font().color(color).pos(Pos::new(h, v))
}

/// Legend swatch for `draw_series(..).legend(..)`.
pub(crate) fn swatch(color: RGBColor) -> impl Fn((i32, i32)) -> Rectangle<(i32, i32)> {
    move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
}

/// Escape text for use inside SVG/HTML content and attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compact number label for ticks and annotations.
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let abs = v.abs();
    if abs >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else if abs >= 1e4 {
        format!("{:.1}k", v / 1e3)
    } else if abs >= 100.0 || v.fract() == 0.0 {
        format!("{v:.0}")
    } else if abs >= 1.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.3}")
    }
}

// ---------------------------------------------------------------------------
// Axis ranges
// ---------------------------------------------------------------------------

/// Min and max of the finite values, if any.
pub(crate) fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Axis range over `values` with `pad` of the span added on both sides.
/// A single value is widened around itself.
pub(crate) fn padded_range(values: impl Iterator<Item = f64>, pad: f64) -> Range<f64> {
    let (lo, hi) = extent(values).unwrap_or((0.0, 1.0));
    if hi - lo < f64::EPSILON {
        let half = if lo == 0.0 { 0.5 } else { lo.abs() * 0.1 };
        return (lo - half)..(hi + half);
    }
    let margin = (hi - lo) * pad;
    (lo - margin)..(hi + margin)
}

/// Axis range for `n` categories drawn at `0..n`.
pub(crate) fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Tick label of a category axis: the category at integer position `v`,
/// nothing in between.
pub(crate) fn category_at(categories: &[String], v: f64) -> String {
    let i = v.round();
    if (v - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    categories.get(i as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Column data
// ---------------------------------------------------------------------------

/// A display column prepared for plotting.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    /// All present values are numbers.
    Numeric(Vec<Option<f64>>),
    /// At least one value is text; each value maps to a category index.
    Categorical {
        categories: Vec<String>,
        codes: Vec<Option<usize>>,
    },
}

impl Series {
    /// Classify a column. Any text makes it categorical; numbers in such a
    /// column become categories of their own.
    pub fn from_values(values: &[&Value]) -> Self {
        if !values.iter().any(|v| matches!(v, Value::Text(_))) {
            return Self::Numeric(values.iter().map(|v| v.as_f64()).collect());
        }

        let mut categories: Vec<String> = values
            .iter()
            .filter(|v| !v.is_missing())
            .map(|v| v.to_string())
            .collect();
        categories.sort();
        categories.dedup();

        let codes = values
            .iter()
            .map(|v| {
                if v.is_missing() {
                    None
                } else {
                    let label = v.to_string();
                    categories.iter().position(|c| *c == label)
                }
            })
            .collect();

        Self::Categorical { categories, codes }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plot position of row `i`: the value itself, or the category index.
    pub fn position(&self, i: usize) -> Option<f64> {
        match self {
            Self::Numeric(values) => values[i],
            Self::Categorical { codes, .. } => codes[i].map(|c| c as f64),
        }
    }

    /// Plot position of an arbitrary value in this series' coordinates.
    pub fn position_of(&self, value: &Value) -> Option<f64> {
        match self {
            Self::Numeric(_) => value.as_f64(),
            Self::Categorical { categories, .. } => {
                if value.is_missing() {
                    return None;
                }
                let label = value.to_string();
                categories
                    .iter()
                    .position(|c| *c == label)
                    .map(|c| c as f64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn render_svg_adds_accessible_title() {
        let svg = render_svg((40, 30), "A < B", |root| {
            root.draw(&Circle::new((20, 15), 5, BLUE.filled()))?;
            Ok(())
        })
        .unwrap();
        assert!(svg.starts_with("<svg role=\"img\" aria-label=\"A &lt; B\""));
        assert!(svg.contains("<title>A &lt; B</title>"));
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains("#008BFB"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn with_title_leaves_foreign_markup_alone() {
        assert_eq!(with_title("<p>x</p>", "t"), "<p>x</p>");
    }

    #[test]
    fn padded_range_widens_single_value() {
        let r = padded_range([5.0, 5.0].into_iter(), 0.05);
        assert!(r.start < 5.0 && r.end > 5.0);

        let zero = padded_range(std::iter::once(0.0), 0.05);
        assert_eq!(zero, -0.5..0.5);

        let r = padded_range([0.0, 10.0, f64::NAN].into_iter(), 0.1);
        assert_eq!(r, -1.0..11.0);
    }

    #[test]
    fn category_labels_sit_on_integers() {
        let categories = vec!["F".to_string(), "M".to_string()];
        assert_eq!(category_at(&categories, 0.0), "F");
        assert_eq!(category_at(&categories, 1.0000000000000002), "M");
        assert_eq!(category_at(&categories, 0.5), "");
        assert_eq!(category_at(&categories, -1.0), "");
        assert_eq!(category_at(&categories, 2.0), "");
        assert_eq!(category_range(2), -0.5..1.5);
        assert_eq!(category_range(0), -0.5..0.5);
    }

    #[test]
    fn extent_skips_non_finite() {
        let values = [3.0, f64::NAN, -1.0, f64::INFINITY];
        assert_eq!(extent(values.into_iter()), Some((-1.0, 3.0)));
        assert_eq!(extent(std::iter::empty()), None);
    }

    #[test]
    fn series_classifies_columns() {
        let m = Value::Text("M".to_string());
        let f = Value::Text("F".to_string());
        let missing = Value::Missing;
        let series = Series::from_values(&[&m, &f, &missing, &m]);
        assert_eq!(
            series,
            Series::Categorical {
                categories: vec!["F".to_string(), "M".to_string()],
                codes: vec![Some(1), Some(0), None, Some(1)],
            }
        );
        assert_eq!(series.position_of(&f), Some(0.0));

        let one = Value::Number(1.0);
        let numeric = Series::from_values(&[&one, &missing]);
        assert_eq!(numeric, Series::Numeric(vec![Some(1.0), None]));
        assert_eq!(numeric.position(0), Some(1.0));
    }

    #[test]
    fn format_number_is_compact() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(202500.0), "202.5k");
        assert_eq!(format_number(1_293_502.5), "1.29M");
        assert_eq!(format_number(0.25), "0.250");
        assert_eq!(format_number(-1.5), "-1.50");
        assert_eq!(format_number(40.0), "40");
    }
}
