//! Donut chart of the `[p_repay, p_default]` pair.
//!
//! Slices start at 12 o'clock. The ring is 30% of the radius wide and the
//! default percentage is printed in the hole.

use anyhow::Result;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};

use super::{AXIS, BLUE, RED, render_svg, text_style};

const SIZE: u32 = 320;
const OUTER: f64 = 110.0;
const WIDTH_FRACTION: f64 = 0.3;

/// Render the donut. `center_label` is the text in the hole, e.g. `"42.17%"`.
///
/// Empty slices are left out, labels included.
pub fn render(proba: [f64; 2], labels: [&str; 2], center_label: &str) -> Result<String> {
    let mut sizes = Vec::with_capacity(2);
    let mut colors = Vec::with_capacity(2);
    let mut names = Vec::with_capacity(2);
    for ((p, color), label) in proba.iter().zip([BLUE, RED]).zip(labels) {
        if *p > 0.0 {
            sizes.push(*p);
            colors.push(color);
            names.push(label);
        }
    }

    render_svg((SIZE, SIZE), "Probability of default", |root| {
        let center = (SIZE as i32 / 2, SIZE as i32 / 2);
        if !sizes.is_empty() {
            let radius = OUTER;
            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &names);
            pie.start_angle(-90.0);
            pie.donut_hole(OUTER * (1.0 - WIDTH_FRACTION));
            pie.label_style(text_style(12.0, &AXIS, HPos::Center, VPos::Center));
            root.draw(&pie)?;
        }
        root.draw(&Text::new(
            center_label.to_string(),
            center,
            text_style(26.0, &BLACK, HPos::Center, VPos::Center),
        ))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_slices_and_center_label() {
        let svg = render([0.7, 0.3], ["No default", "Default"], "30.00%").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("#008BFB") && svg.contains("#FF0051"));
        assert!(svg.contains(">30.00%<"));
        assert!(svg.contains(">Default<"));
        assert!(svg.contains(">No default<"));
        assert!(svg.contains("<title>Probability of default</title>"));
    }

    #[test]
    fn certain_outcome_leaves_out_the_empty_slice() {
        let svg = render([0.0, 1.0], ["No default", "Default"], "100.00%").unwrap();
        assert!(svg.contains("#FF0051"));
        assert!(!svg.contains("#008BFB"));
        assert!(!svg.contains(">No default<"));
        assert!(svg.contains(">100.00%<"));
    }

    #[test]
    fn zero_pair_still_prints_label() {
        let svg = render([0.0, 0.0], ["No default", "Default"], "0.00%").unwrap();
        assert!(svg.contains(">0.00%<"));
        assert!(!svg.contains(">Default<"));
    }
}
