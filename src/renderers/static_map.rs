use crate::error::{ProcessingError, Result};
use crate::models::{AreaSummary, BoundaryDataset};
use crate::utils::colormap::{Colormap, NO_DATA_RGB};
use geo::{LineString, Rect};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// Upper end of the log10 colour bar (100 000 kWp)
pub const LOG_SCALE_MAX: f64 = 5.0;

const IMAGE_SIZE: (u32, u32) = (1400, 900);
const COLORBAR_WIDTH: u32 = 160;
const MAP_MARGIN: u32 = 30;

fn render_err<E: std::fmt::Display>(e: E) -> ProcessingError {
    ProcessingError::Render(e.to_string())
}

/// Log10 of cumulative capacity, `None` for areas without capacity
pub fn log_capacity(summary: &AreaSummary) -> Option<f64> {
    summary
        .total_capacity_kwp
        .filter(|v| *v > 0.0)
        .map(f64::log10)
}

fn fill_color(value: Option<f64>) -> RGBColor {
    let (r, g, b) = match value {
        Some(v) => Colormap::Reds.sample(v / LOG_SCALE_MAX),
        None => NO_DATA_RGB,
    };
    RGBColor(r, g, b)
}

/// Static PNG map of log10 cumulative capacity with a 0–5 colour bar
pub fn render_log_map(boundary: &BoundaryDataset, summaries: &[AreaSummary], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, IMAGE_SIZE).into_drawing_area();
    draw_log_map(&root, boundary, summaries)?;
    root.present().map_err(render_err)?;

    tracing::debug!(path = %path.display(), "rendered log map");
    Ok(())
}

pub fn draw_log_map<DB>(
    root: &DrawingArea<DB, Shift>,
    boundary: &BoundaryDataset,
    summaries: &[AreaSummary],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_err)?;

    let (width, _) = root.dim_in_pixel();
    let (map_area, bar_area) = root.split_horizontally(width.saturating_sub(COLORBAR_WIDTH));

    draw_areas(&map_area, boundary, summaries)?;
    draw_colorbar(&bar_area)?;

    // Text needs a system font; a headless box without one still gets the shapes
    if let Err(e) = draw_labels(root, &bar_area) {
        tracing::warn!(error = %e, "map labels skipped");
    }
    Ok(())
}

/// Planning-area polygons filled by log capacity, outlined in black
pub fn draw_areas<DB>(
    area: &DrawingArea<DB, Shift>,
    boundary: &BoundaryDataset,
    summaries: &[AreaSummary],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let bounds = boundary
        .bounds()
        .ok_or_else(|| ProcessingError::MissingData("boundary has no geometry".to_string()))?;
    let values: HashMap<&str, Option<f64>> = summaries
        .iter()
        .map(|s| (s.name.as_str(), log_capacity(s)))
        .collect();

    let (width, height) = area.dim_in_pixel();
    let (x_range, y_range) = equal_aspect_ranges(
        bounds,
        width.saturating_sub(2 * MAP_MARGIN),
        height.saturating_sub(2 * MAP_MARGIN),
    );

    let mut chart = ChartBuilder::on(area)
        .margin(MAP_MARGIN)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_err)?;

    for planning_area in boundary.areas() {
        let color = fill_color(values.get(planning_area.name.as_str()).copied().flatten());

        for polygon in &planning_area.geometry {
            chart
                .draw_series(std::iter::once(Polygon::new(ring_points(polygon.exterior()), color.filled())))
                .map_err(render_err)?;
            for hole in polygon.interiors() {
                chart
                    .draw_series(std::iter::once(Polygon::new(ring_points(hole), WHITE.filled())))
                    .map_err(render_err)?;
            }
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                chart
                    .draw_series(std::iter::once(PathElement::new(ring_points(ring), BLACK.stroke_width(1))))
                    .map_err(render_err)?;
            }
        }
    }

    Ok(())
}

fn draw_colorbar<DB>(area: &DrawingArea<DB, Shift>) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .margin_top(MAP_MARGIN)
        .margin_bottom(MAP_MARGIN)
        .margin_right(90)
        .margin_left(10)
        .build_cartesian_2d(0.0..1.0, 0.0..LOG_SCALE_MAX)
        .map_err(render_err)?;

    let steps = 100;
    let step = LOG_SCALE_MAX / steps as f64;
    chart
        .draw_series((0..steps).map(|i| {
            let low = i as f64 * step;
            Rectangle::new(
                [(0.0, low), (1.0, low + step)],
                fill_color(Some(low + step / 2.0)).filled(),
            )
        }))
        .map_err(render_err)?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(0.0, 0.0), (1.0, LOG_SCALE_MAX)],
            BLACK.stroke_width(1),
        )))
        .map_err(render_err)?;

    Ok(())
}

fn draw_labels<DB>(root: &DrawingArea<DB, Shift>, bar_area: &DrawingArea<DB, Shift>) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.draw(&Text::new(
        "Cumulative installed capacity by planning area",
        (MAP_MARGIN as i32, 8),
        ("sans-serif", 20).into_font(),
    ))
    .map_err(render_err)?;

    let (bar_width, bar_height) = bar_area.dim_in_pixel();
    let text_x = bar_width as i32 - 85;
    let usable = bar_height.saturating_sub(2 * MAP_MARGIN) as f64;
    for tick in 0..=LOG_SCALE_MAX as i32 {
        let y = MAP_MARGIN as f64 + usable * (1.0 - tick as f64 / LOG_SCALE_MAX);
        bar_area
            .draw(&Text::new(
                tick.to_string(),
                (text_x, y as i32 - 7),
                ("sans-serif", 14).into_font(),
            ))
            .map_err(render_err)?;
    }
    bar_area
        .draw(&Text::new(
            "kWp, log10",
            (text_x - 20, 6),
            ("sans-serif", 14).into_font(),
        ))
        .map_err(render_err)?;

    Ok(())
}

fn ring_points(ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.coords().map(|c| (c.x, c.y)).collect()
}

/// Widen the shorter axis so one data unit covers the same number of pixels
/// in x and y
pub fn equal_aspect_ranges(
    bounds: Rect<f64>,
    width_px: u32,
    height_px: u32,
) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let (min, max) = (bounds.min(), bounds.max());
    let data_w = (max.x - min.x).max(f64::EPSILON);
    let data_h = (max.y - min.y).max(f64::EPSILON);
    let px_w = width_px.max(1) as f64;
    let px_h = height_px.max(1) as f64;

    let units_per_px = (data_w / px_w).max(data_h / px_h);
    let half_w = units_per_px * px_w / 2.0;
    let half_h = units_per_px * px_h / 2.0;
    let cx = (min.x + max.x) / 2.0;
    let cy = (min.y + max.y) / 2.0;

    (cx - half_w..cx + half_w, cy - half_h..cy + half_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::boundary;

    #[test]
    fn test_equal_aspect_ranges() {
        let bounds = Rect::new((0.0, 0.0), (10.0, 5.0));
        let (x, y) = equal_aspect_ranges(bounds, 200, 200);

        assert!((x.start - 0.0).abs() < 1e-9 && (x.end - 10.0).abs() < 1e-9);
        assert!((y.start + 2.5).abs() < 1e-9 && (y.end - 7.5).abs() < 1e-9);
        // Same data units per pixel on both axes
        assert!(((x.end - x.start) / 200.0 - (y.end - y.start) / 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_capacity() {
        let mut summary = AreaSummary::empty("BEDOK", "EAST REGION");
        assert_eq!(log_capacity(&summary), None);
        summary.total_capacity_kwp = Some(0.0);
        assert_eq!(log_capacity(&summary), None);
        summary.total_capacity_kwp = Some(1000.0);
        assert!((log_capacity(&summary).unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_areas_into_buffer() -> Result<()> {
        let boundary = boundary();
        let mut summary = AreaSummary::empty("BEDOK", "EAST REGION");
        summary.total_capacity_kwp = Some(10_000.0);
        summary.system_count = 1;

        let (w, h) = (300u32, 200u32);
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            draw_areas(&root, &boundary, &[summary])?;
            root.present().map_err(render_err)?;
        }

        let bedok = fill_color(Some(4.0));
        let no_data = fill_color(None);
        let pixels: Vec<&[u8]> = buffer.chunks(3).collect();
        assert!(pixels.iter().any(|p| *p == [bedok.0, bedok.1, bedok.2]));
        assert!(pixels.iter().any(|p| *p == [no_data.0, no_data.1, no_data.2]));
        Ok(())
    }
}
