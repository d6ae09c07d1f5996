use super::plotly::PlotlyFigure;
use crate::models::{AreaSummary, BoundaryDataset, PlanningArea};
use crate::utils::colormap::{to_hex, Colormap, NO_DATA_RGB};
use geo::MultiPolygon;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Quantity shaded on a planning-area map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMetric {
    CumulativeCapacity,
    MeanSystemSize,
    SystemCount,
}

impl MapMetric {
    pub fn title(&self) -> &'static str {
        match self {
            MapMetric::CumulativeCapacity => "Cumulative installed capacity (kWp) by planning area",
            MapMetric::MeanSystemSize => "Mean system size (kWp) by planning area",
            MapMetric::SystemCount => "Number of systems by planning area",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MapMetric::CumulativeCapacity => "Cumulative capacity (kWp)",
            MapMetric::MeanSystemSize => "Mean system size (kWp)",
            MapMetric::SystemCount => "Number of systems",
        }
    }

    pub fn colormap(&self) -> Colormap {
        match self {
            MapMetric::CumulativeCapacity => Colormap::Reds,
            MapMetric::MeanSystemSize => Colormap::Greens,
            MapMetric::SystemCount => Colormap::Blues,
        }
    }

    pub fn log_scale(&self) -> bool {
        !matches!(self, MapMetric::SystemCount)
    }

    pub fn value(&self, summary: &AreaSummary) -> Option<f64> {
        match self {
            MapMetric::CumulativeCapacity => summary.total_capacity_kwp,
            MapMetric::MeanSystemSize => summary.mean_system_kwp,
            MapMetric::SystemCount => Some(summary.system_count as f64),
        }
    }
}

/// Linear or log10 mapping of metric values onto [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
    pub log: bool,
}

impl ColorScale {
    /// Fit the scale to the shaded values; `None` when nothing can be shaded
    pub fn fit(values: impl IntoIterator<Item = f64>, log: bool) -> Option<Self> {
        let transformed: Vec<f64> = values
            .into_iter()
            .filter_map(|v| transform(v, log))
            .collect();
        let min = transformed.iter().copied().reduce(f64::min)?;
        let max = transformed.iter().copied().reduce(f64::max)?;
        Some(Self { min, max, log })
    }

    /// Position on the colour ramp, `None` for values that cannot be shaded
    pub fn position(&self, value: f64) -> Option<f64> {
        let x = transform(value, self.log)?;
        if self.max > self.min {
            Some(((x - self.min) / (self.max - self.min)).clamp(0.0, 1.0))
        } else {
            Some(1.0)
        }
    }

    /// Colourbar ticks as (position in transformed units, label)
    pub fn ticks(&self) -> Vec<(f64, String)> {
        if self.log {
            let first = self.min.floor() as i32;
            let last = self.max.ceil() as i32;
            (first..=last)
                .map(|k| (k as f64, format_kwp(10f64.powi(k))))
                .collect()
        } else {
            let step = ((self.max - self.min) / 5.0).max(1.0);
            (0..=5)
                .map(|i| self.min + step * i as f64)
                .filter(|v| *v <= self.max + f64::EPSILON)
                .map(|v| (v, format_kwp(v)))
                .collect()
        }
    }
}

fn transform(value: f64, log: bool) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    if log {
        (value > 0.0).then(|| value.log10())
    } else {
        Some(value)
    }
}

fn format_kwp(value: f64) -> String {
    if value >= 1.0 || value == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Plotly colourscale built from the same ramp used for the fills
pub fn plotly_colorscale(colormap: Colormap) -> Value {
    let stops: Vec<Value> = (0..=8)
        .map(|i| {
            let t = i as f64 / 8.0;
            json!([t, colormap.sample_hex(t)])
        })
        .collect();
    Value::Array(stops)
}

/// Polygon rings as one x/y pair of arrays, rings separated by nulls
pub fn geometry_to_xy(geometry: &MultiPolygon<f64>) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();

    for polygon in geometry {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            if !xs.is_empty() {
                xs.push(None);
                ys.push(None);
            }
            for coord in ring.coords() {
                xs.push(Some(coord.x));
                ys.push(Some(coord.y));
            }
        }
    }

    (xs, ys)
}

fn hover_text(area: &PlanningArea, summary: Option<&AreaSummary>) -> String {
    let fmt = |v: Option<f64>, decimals: usize| {
        v.map(|x| format!("{:.*} kWp", decimals, x))
            .unwrap_or_else(|| "no data".to_string())
    };

    let (total, mean, count) = match summary {
        Some(s) => (s.total_capacity_kwp, s.mean_system_kwp, s.system_count),
        None => (None, None, 0),
    };

    format!(
        "<b>{}</b><br>{}<br>Cumulative capacity: {}<br>Mean system size: {}<br>Number of systems: {}",
        area.name,
        area.region,
        fmt(total, 0),
        fmt(mean, 1),
        count
    )
}

/// Choropleth of `metric` drawn as filled polygons in the layer's own
/// coordinates, with equal aspect and hidden axes.
pub fn choropleth(boundary: &BoundaryDataset, summaries: &[AreaSummary], metric: MapMetric) -> PlotlyFigure {
    let by_name: HashMap<&str, &AreaSummary> =
        summaries.iter().map(|s| (s.name.as_str(), s)).collect();
    let colormap = metric.colormap();
    let scale = ColorScale::fit(summaries.iter().filter_map(|s| metric.value(s)), metric.log_scale());

    let mut figure = PlotlyFigure::new(metric.title());

    for area in boundary.areas() {
        let summary = by_name.get(area.name.as_str()).copied();
        let fill = summary
            .and_then(|s| metric.value(s))
            .zip(scale)
            .and_then(|(value, scale)| scale.position(value))
            .map(|t| colormap.sample_hex(t))
            .unwrap_or_else(|| to_hex(NO_DATA_RGB));

        let (xs, ys) = geometry_to_xy(&area.geometry);
        figure.push_trace(json!({
            "type": "scatter",
            "mode": "lines",
            "x": xs,
            "y": ys,
            "fill": "toself",
            "fillcolor": fill,
            "line": { "color": "#444444", "width": 0.5 },
            "name": area.name,
            "text": hover_text(area, summary),
            "hoveron": "fills",
            "hoverinfo": "text",
            "showlegend": false,
        }));
    }

    if let (Some(scale), Some(bounds)) = (scale, boundary.bounds()) {
        let (tickvals, ticktext): (Vec<f64>, Vec<String>) = scale.ticks().into_iter().unzip();
        // Invisible marker that only carries the colourbar
        figure.push_trace(json!({
            "type": "scatter",
            "mode": "markers",
            "x": [bounds.min().x],
            "y": [bounds.min().y],
            "marker": {
                "color": [scale.min],
                "cmin": scale.min,
                "cmax": scale.max,
                "colorscale": plotly_colorscale(colormap),
                "showscale": true,
                "opacity": 0,
                "colorbar": {
                    "title": { "text": metric.label() },
                    "tickvals": tickvals,
                    "ticktext": ticktext,
                },
            },
            "hoverinfo": "skip",
            "showlegend": false,
        }));
    }

    figure.update_layout(json!({
        "xaxis": { "visible": false },
        "yaxis": { "visible": false, "scaleanchor": "x", "scaleratio": 1 },
        "plot_bgcolor": "white",
        "hovermode": "closest",
    }));
    figure
}
