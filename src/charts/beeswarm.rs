//! Beeswarm summary of attributions across all clients.
//!
//! One row per feature, one dot per client. Dots are spread vertically where
//! they pile up and colored from blue (low feature value) to red (high).

use std::collections::HashMap;

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};

use super::{
    AXIS, Area, BLUE, MUTED, RED, caption_font, category_at, format_number, padded_range, render_svg,
    text_style,
};
use crate::explain::Beeswarm;

const WIDTH: u32 = 720;
const COLORBAR: u32 = 70;
const ROW: u32 = 34;
const CHROME: u32 = 110;
const DOT: f64 = 2.5;
const COLORBAR_STEPS: usize = 32;

/// Blend the two ends of the palette. `t = 0` is blue, `t = 1` is red.
pub fn color_for(t: Option<f64>) -> RGBColor {
    let Some(t) = t else {
        return MUTED;
    };
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(lerp(BLUE.0, RED.0), lerp(BLUE.1, RED.1), lerp(BLUE.2, RED.2))
}

/// Vertical offsets for dots at pixel positions `xs`, stacking dots that
/// fall in the same horizontal bucket alternately above and below the row.
pub fn swarm_offsets(xs: &[f64], max_offset: f64) -> Vec<f64> {
    let bucket = DOT * 2.0;
    let mut counts: HashMap<i64, usize> = HashMap::new();
    xs.iter()
        .map(|x| {
            let key = (x / bucket).floor() as i64;
            let n = counts.entry(key).or_insert(0);
            let k = *n;
            *n += 1;
            let level = k.div_ceil(2) as f64;
            let sign = if k % 2 == 1 { -1.0 } else { 1.0 };
            (sign * level * DOT * 1.6).clamp(-max_offset, max_offset)
        })
        .collect()
}

/// Render the beeswarm with a feature-value colorbar on the right.
///
/// Row `i` sits at `n - 1 - i`, so the first row is drawn at the top.
pub fn render(swarm: &Beeswarm) -> Result<String> {
    let n = swarm.rows.len();
    let height = CHROME + n.max(1) as u32 * ROW;
    let x_range = padded_range(
        swarm
            .rows
            .iter()
            .flat_map(|row| row.points.iter().map(|(v, _)| *v))
            .chain([0.0]),
        0.05,
    );
    let labels: Vec<String> = swarm.rows.iter().rev().map(|r| r.label.clone()).collect();

    render_svg((WIDTH, height), "Global feature importance", |root| {
        let (plot, colorbar) = root.split_horizontally(WIDTH - COLORBAR);

        let mut chart = ChartBuilder::on(&plot)
            .caption("Global feature importance", caption_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(220)
            .build_cartesian_2d(x_range.clone(), -0.5..(n.max(1) as f64 - 0.5))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n + 1)
            .y_label_formatter(&|v| category_at(&labels, *v))
            .x_label_formatter(&|v| format_number(*v))
            .x_desc("Contribution to the default log-odds")
            .draw()?;

        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, -0.5), (0.0, n as f64 - 0.5)],
            AXIS.mix(0.5).stroke_width(1),
        )))?;

        // Pixel size of one row, to convert swarm offsets back to data units
        let row_px = f64::from(
            chart.backend_coord(&(x_range.start, 0.0)).1 - chart.backend_coord(&(x_range.start, 1.0)).1,
        )
        .max(1.0);

        for (i, row) in swarm.rows.iter().enumerate() {
            let y = (n - 1 - i) as f64;
            let xs: Vec<f64> = row
                .points
                .iter()
                .map(|(v, _)| f64::from(chart.backend_coord(&(*v, y)).0))
                .collect();
            let offsets = swarm_offsets(&xs, row_px / 2.0 - DOT);
            chart.draw_series(row.points.iter().zip(offsets).map(|((v, t), dy)| {
                Circle::new((*v, y + dy / row_px), DOT as i32 + 1, color_for(*t).mix(0.8).filled())
            }))?;
        }

        draw_colorbar(&colorbar, height)
    })
}

/// Vertical low-to-high gradient built from stacked rectangles.
fn draw_colorbar(area: &Area<'_>, height: u32) -> Result<()> {
    let top = 50;
    let bottom = height as i32 - 60;
    let step = f64::from(bottom - top) / COLORBAR_STEPS as f64;
    for k in 0..COLORBAR_STEPS {
        let y0 = top + (k as f64 * step).round() as i32;
        let y1 = top + ((k + 1) as f64 * step).round() as i32;
        let t = 1.0 - (k as f64 + 0.5) / COLORBAR_STEPS as f64;
        area.draw(&Rectangle::new([(20, y0), (30, y1)], color_for(Some(t)).filled()))?;
    }
    for (label, y, v) in [("High", top - 4, VPos::Bottom), ("Low", bottom + 4, VPos::Top)] {
        area.draw(&Text::new(label, (25, y), text_style(10.0, &AXIS, HPos::Center, v)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::BeeswarmRow;

    #[test]
    fn color_for_spans_palette() {
        assert_eq!(color_for(Some(0.0)), BLUE);
        assert_eq!(color_for(Some(1.0)), RED);
        assert_eq!(color_for(Some(7.0)), RED);
        assert_eq!(color_for(Some(0.5)), RGBColor(0x80, 0x46, 0xa6));
        assert_eq!(color_for(None), MUTED);
    }

    #[test]
    fn swarm_offsets_alternate_within_bucket() {
        let offsets = swarm_offsets(&[100.0, 100.1, 100.2, 300.0], 100.0);
        assert_eq!(offsets[0], 0.0);
        assert!(offsets[1] < 0.0);
        assert!(offsets[2] > 0.0);
        assert!((offsets[1] + offsets[2]).abs() < 1e-12);
        assert_eq!(offsets[3], 0.0);
    }

    #[test]
    fn swarm_offsets_are_clamped() {
        let xs = vec![50.0; 40];
        let offsets = swarm_offsets(&xs, 5.0);
        assert!(offsets.iter().all(|o| o.abs() <= 5.0));
    }

    #[test]
    fn renders_one_dot_per_point() {
        let swarm = Beeswarm {
            rows: vec![
                BeeswarmRow {
                    label: "EXT_SOURCE_2".to_string(),
                    points: vec![(0.4, Some(0.1)), (-0.2, Some(0.9)), (0.0, None)],
                    mean_abs: 0.2,
                },
                BeeswarmRow {
                    label: "Sum of 3 other features".to_string(),
                    points: vec![(0.1, None), (0.0, None), (-0.1, None)],
                    mean_abs: 0.066,
                },
            ],
        };
        let svg = render(&swarm).unwrap();
        assert_eq!(svg.matches("<circle").count(), 6);
        assert!(svg.contains(">EXT_SOURCE_2<"));
        assert!(svg.contains(">Sum of 3 other features<"));
        assert!(svg.contains(">High<") && svg.contains(">Low<"));
        assert!(svg.contains("#777777"));
    }
}
