//! Plotters-powered close-price chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description.
///
/// Points and bounds are computed outside the render call (see
/// `tui::chart_data`), so `render()` only draws.
pub struct PricePlottersChart<'a> {
    /// `(days since origin, close)` in ascending date order.
    pub points: &'a [(f64, f64)],
    /// Date of x = 0; tick labels are formatted relative to it.
    pub origin: NaiveDate,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for PricePlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let origin = self.origin;
        let points = self.points;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc("close")
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_day_offset(origin, *v))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(0, 255, 255); // cyan
            let marker_color = RGBColor(255, 255, 0); // yellow

            chart.draw_series(LineSeries::new(points.iter().copied(), &line_color))?;

            // `Circle` radii are mis-scaled by the ratatui backend; a pixel reads as a dot.
            chart.draw_series(points.iter().map(|&(x, y)| Pixel::new((x, y), marker_color)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// `MM/DD` label for an x position measured in days from `origin`.
pub fn fmt_day_offset(origin: NaiveDate, days: f64) -> String {
    origin
        .checked_add_signed(Duration::days(days.round() as i64))
        .map(|d| d.format("%m/%d").to_string())
        .unwrap_or_default()
}
