use super::hierarchy::Hierarchy;
use super::plotly::PlotlyFigure;
use crate::config::AnalysisConfig;
use crate::models::{CumulativeSeries, SystemRecord};
use crate::utils::colormap::qualitative;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Largest marker diameter in pixels for the size-encoded scatter
const MAX_MARKER_PX: f64 = 40.0;

fn date_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Records grouped by a key, groups in sorted order
fn group_records<'r, F>(records: &'r [SystemRecord], key: F) -> BTreeMap<&'r str, Vec<&'r SystemRecord>>
where
    F: Fn(&'r SystemRecord) -> &'r str,
{
    let mut groups: BTreeMap<&str, Vec<&SystemRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
}

/// Commissioning date against capacity, sized by capacity and coloured by
/// system type, with a box per type in a side panel. Disallowed systems are
/// left out since they are portfolios rather than single installations.
pub fn system_size_scatter(records: &[SystemRecord], config: &AnalysisConfig) -> PlotlyFigure {
    let shown: Vec<SystemRecord> = records
        .iter()
        .filter(|r| !config.is_disallowed(&r.name))
        .cloned()
        .collect();

    let title = match (
        shown.iter().map(SystemRecord::year).min(),
        shown.iter().map(SystemRecord::year).max(),
    ) {
        (Some(first), Some(last)) => format!("System deployment {}-{}", first, last),
        _ => "System deployment".to_string(),
    };
    let mut figure = PlotlyFigure::new(&title);

    let max_kwp = shown.iter().map(|r| r.capacity_kwp).fold(0.0, f64::max);
    let sizeref = if max_kwp > 0.0 {
        2.0 * max_kwp / (MAX_MARKER_PX * MAX_MARKER_PX)
    } else {
        1.0
    };

    for (i, (system_type, group)) in group_records(&shown, |r| r.system_type.as_str())
        .into_iter()
        .enumerate()
    {
        let color = qualitative(i);
        let capacities: Vec<f64> = group.iter().map(|r| r.capacity_kwp).collect();
        let customdata: Vec<Value> = group
            .iter()
            .map(|r| json!([r.planning_area, r.region, r.technology]))
            .collect();

        figure.push_trace(json!({
            "type": "scatter",
            "mode": "markers",
            "name": system_type,
            "legendgroup": system_type,
            "x": group.iter().map(|r| date_label(r.commissioned)).collect::<Vec<_>>(),
            "y": capacities,
            "text": group.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "customdata": customdata,
            "marker": {
                "color": color,
                "size": capacities,
                "sizemode": "area",
                "sizeref": sizeref,
                "sizemin": 3,
            },
            "hovertemplate": "<b>%{text}</b><br>System capacity (kWp): %{y:,.1f}<br>\
                PLN_AREA_N: %{customdata[0]}<br>Region: %{customdata[1]}<br>\
                Technology: %{customdata[2]}<extra></extra>",
            "xaxis": "x",
            "yaxis": "y",
        }));

        figure.push_trace(json!({
            "type": "box",
            "name": system_type,
            "legendgroup": system_type,
            "showlegend": false,
            "y": capacities,
            "marker": { "color": color },
            "xaxis": "x2",
            "yaxis": "y",
        }));
    }

    figure.update_layout(json!({
        "xaxis": { "domain": [0.0, 0.82], "title": { "text": "Date commissioned" } },
        "xaxis2": { "domain": [0.84, 1.0], "showticklabels": false },
        "yaxis": { "title": { "text": "System capacity (kWp)" } },
        "legend": { "title": { "text": "System type" } },
    }));
    figure
}

/// Country → region → planning area → system type, valued by capacity.
/// Systems without a planning area are left out.
pub fn treemap(records: &[SystemRecord], config: &AnalysisConfig) -> PlotlyFigure {
    let mut tree = Hierarchy::new(&config.country);
    for record in records.iter().filter(|r| r.is_area_specified()) {
        tree.add_path(
            &[&record.region, &record.planning_area, &record.system_type],
            record.capacity_kwp,
        );
    }

    let mut figure = PlotlyFigure::new("Cumulative installed capacity (kWp) by planning area");
    figure.push_trace(tree.to_trace("treemap", "Capacity (kWp)"));
    figure
}

/// Country → technology → integrator, valued by capacity
pub fn sunburst(records: &[SystemRecord], config: &AnalysisConfig) -> PlotlyFigure {
    let mut tree = Hierarchy::new(&config.country);
    for record in records {
        tree.add_path(&[&record.technology, &record.integrator], record.capacity_kwp);
    }

    let mut figure = PlotlyFigure::new("Cumulative installed capacity (kWp) by technology type");
    figure.push_trace(tree.to_trace("sunburst", "Capacity (kWp)"));
    figure
}

/// Stacked area of cumulative capacity per planning area, coloured by region,
/// with a range slider and period buttons.
pub fn capacity_area(series: &CumulativeSeries) -> PlotlyFigure {
    let mut figure = PlotlyFigure::new("Cumulative installed capacity (kWp) over time");
    let months: Vec<String> = series.months.iter().copied().map(date_label).collect();

    let mut region_colors: BTreeMap<String, &str> = BTreeMap::new();
    for point in &series.points {
        if let Some(region) = &point.region {
            let next = region_colors.len();
            region_colors
                .entry(region.clone())
                .or_insert_with(|| qualitative(next));
        }
    }

    let mut legend_shown: Vec<String> = Vec::new();
    for group in &series.groups {
        let points: Vec<_> = series.group_points(group).collect();
        let region = points
            .first()
            .and_then(|p| p.region.clone())
            .unwrap_or_else(|| group.clone());
        let color = region_colors.get(&region).copied().unwrap_or_else(|| qualitative(0));

        let show_legend = !legend_shown.contains(&region);
        if show_legend {
            legend_shown.push(region.clone());
        }

        figure.push_trace(json!({
            "type": "scatter",
            "mode": "lines",
            "stackgroup": "one",
            "name": region,
            "legendgroup": region,
            "showlegend": show_legend,
            "x": months,
            "y": points.iter().map(|p| p.cumulative_kwp).collect::<Vec<_>>(),
            "line": { "color": color, "width": 0.5 },
            "hovertemplate": format!(
                "<b>{}</b><br>Date: %{{x}}<br>Cumulative installed capacity (kWp): %{{y:,.0f}}<extra>{}</extra>",
                group, region
            ),
        }));
    }

    figure.update_layout(json!({
        "xaxis": {
            "title": { "text": "Date" },
            "rangeslider": { "visible": true },
            "rangeselector": {
                "buttons": [
                    { "count": 5, "label": "5y", "step": "year", "stepmode": "backward" },
                    { "count": 2, "label": "2y", "step": "year", "stepmode": "backward" },
                    { "count": 1, "label": "1y", "step": "year", "stepmode": "backward" },
                    { "count": 1, "label": "YTD", "step": "year", "stepmode": "todate" },
                    { "step": "all" },
                ],
            },
        },
        "yaxis": { "title": { "text": "Cumulative installed capacity (kWp)" } },
        "legend": { "title": { "text": "Region" } },
    }));
    figure
}

/// Bars of cumulative capacity per technology with one animation frame per
/// month. The y range is fixed to the peak over all frames.
pub fn technology_bar(series: &CumulativeSeries) -> PlotlyFigure {
    let mut figure = PlotlyFigure::new("Cumulative installed capacity (kWp) by technology");
    let colors: Vec<&str> = (0..series.groups.len()).map(qualitative).collect();

    let bar = |month_index: usize| -> Value {
        let values: Vec<f64> = series
            .month_slice(month_index)
            .iter()
            .map(|p| p.cumulative_kwp)
            .collect();
        json!({
            "type": "bar",
            "x": series.groups,
            "y": values,
            "marker": { "color": colors },
            "hovertemplate": "%{x}: %{y:,.0f} kWp<extra></extra>",
        })
    };

    if series.months.is_empty() {
        return figure;
    }

    let names: Vec<String> = series.months.iter().copied().map(date_label).collect();
    figure.push_trace(bar(0));
    figure.frames = names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "name": name, "data": [bar(i)] }))
        .collect();

    let steps: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "label": name,
                "method": "animate",
                "args": [[name], {
                    "mode": "immediate",
                    "frame": { "duration": 300, "redraw": true },
                    "transition": { "duration": 0 },
                }],
            })
        })
        .collect();

    let peak = series.peak();
    let y_max = if peak > 0.0 { peak * 1.05 } else { 1.0 };

    figure.update_layout(json!({
        "xaxis": { "title": { "text": "Technology" } },
        "yaxis": { "title": { "text": "Cumulative (kWp)" }, "range": [0.0, y_max] },
        "sliders": [{
            "active": 0,
            "currentvalue": { "prefix": "Commissioned: " },
            "steps": steps,
        }],
        "updatemenus": [{
            "type": "buttons",
            "showactive": false,
            "buttons": [
                {
                    "label": "Play",
                    "method": "animate",
                    "args": [Value::Null, {
                        "fromcurrent": true,
                        "frame": { "duration": 300, "redraw": true },
                        "transition": { "duration": 0 },
                    }],
                },
                {
                    "label": "Pause",
                    "method": "animate",
                    "args": [[Value::Null], {
                        "mode": "immediate",
                        "frame": { "duration": 0, "redraw": false },
                    }],
                },
            ],
        }],
    }));
    figure
}

/// Distribution of system capacity per region
pub fn region_box(records: &[SystemRecord]) -> PlotlyFigure {
    let mut figure = PlotlyFigure::new("System size (kWp) by region");

    for (i, (region, group)) in group_records(records, |r| r.region.as_str())
        .into_iter()
        .enumerate()
    {
        figure.push_trace(json!({
            "type": "box",
            "name": region,
            "y": group.iter().map(|r| r.capacity_kwp).collect::<Vec<_>>(),
            "text": group.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "marker": { "color": qualitative(i) },
        }));
    }

    figure.update_layout(json!({
        "xaxis": { "title": { "text": "Region" } },
        "yaxis": { "title": { "text": "System size (kWp)" } },
        "showlegend": false,
    }));
    figure
}

/// Capacity against panel tilt on a quarter polar plot. Records without a
/// tilt are skipped.
pub fn tilt_polar(records: &[SystemRecord]) -> PlotlyFigure {
    let tilted: Vec<&SystemRecord> = records.iter().filter(|r| r.tilt_deg.is_some()).collect();
    let mut figure = PlotlyFigure::new("System size (kWp) by tilt angle");

    figure.push_trace(json!({
        "type": "barpolar",
        "r": tilted.iter().map(|r| r.capacity_kwp).collect::<Vec<_>>(),
        "theta": tilted.iter().filter_map(|r| r.tilt_deg).collect::<Vec<_>>(),
        "text": tilted.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "marker": { "color": qualitative(0) },
        "hovertemplate": "<b>%{text}</b><br>Tilt: %{theta}°<br>System size: %{r:,.1f} kWp<extra></extra>",
    }));

    figure.update_layout(json!({
        "polar": {
            "sector": [0, 90],
            "angularaxis": { "rotation": 0, "direction": "counterclockwise", "thetaunit": "degrees" },
        },
        "showlegend": false,
    }));
    figure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{AnalysisInputs, AnalysisPipeline, SolarAnalysis};
    use crate::test_support::{boundary, location_corrections, name_corrections, records};
    use crate::utils::constants::NOT_SPECIFIED;
    use crate::utils::ProgressReporter;

    fn analysis() -> SolarAnalysis {
        AnalysisPipeline::new(AnalysisConfig::default()).analyze(
            AnalysisInputs {
                boundary: boundary(),
                records: records(),
                location_corrections: location_corrections(),
                name_corrections: name_corrections(),
            },
            &ProgressReporter::silent(),
        )
    }

    #[test]
    fn test_scatter_excludes_disallowed() {
        let analysis = analysis();
        let figure = system_size_scatter(&analysis.records, &AnalysisConfig::default());

        assert_eq!(figure.title(), "System deployment 2015-2016");
        // Every fixture record is "Commercial": one scatter and one box
        assert_eq!(figure.data.len(), 2);
        let names = figure.data[0]["text"].as_array().unwrap();
        assert_eq!(names.len(), 5);
        assert!(!names.iter().any(|n| n == "SolarNova2"));
        assert_eq!(figure.data[1]["xaxis"], "x2");
    }

    #[test]
    fn test_treemap_skips_unspecified() {
        let analysis = analysis();
        let figure = treemap(&analysis.records, &AnalysisConfig::default());

        let trace = &figure.data[0];
        assert_eq!(trace["type"], "treemap");
        let labels = trace["labels"].as_array().unwrap();
        assert!(!labels.iter().any(|l| l == NOT_SPECIFIED));
        // 130 + 51 + 20 kWp placed in planning areas
        assert_eq!(trace["values"][0], 201.0);
    }

    #[test]
    fn test_sunburst_root_is_total() {
        let analysis = analysis();
        let figure = sunburst(&analysis.records, &AnalysisConfig::default());
        assert_eq!(figure.data[0]["labels"][0], "Singapore");
        assert_eq!(figure.data[0]["values"][0], analysis.total_capacity_kwp());
    }

    #[test]
    fn test_capacity_area_one_legend_entry_per_region() {
        let analysis = analysis();
        let figure = capacity_area(&analysis.area_series);

        assert_eq!(figure.data.len(), analysis.area_series.groups.len());
        let legend_entries: Vec<&str> = figure
            .data
            .iter()
            .filter(|t| t["showlegend"] == true)
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(legend_entries, vec!["EAST REGION", "WEST REGION", NOT_SPECIFIED]);
        assert_eq!(
            figure.layout["xaxis"]["rangeselector"]["buttons"].as_array().map(Vec::len),
            Some(5)
        );
    }

    #[test]
    fn test_technology_bar_frames_and_fixed_range() {
        let analysis = analysis();
        let figure = technology_bar(&analysis.technology_series);

        assert_eq!(figure.frames.len(), analysis.technology_series.months.len());
        let y_max = figure.layout["yaxis"]["range"][1].as_f64().unwrap();
        assert!(y_max >= analysis.technology_series.peak());
        assert_eq!(figure.frames[0]["name"], "2015-01-01");
    }

    #[test]
    fn test_technology_bar_empty_series() {
        let figure = technology_bar(&CumulativeSeries::default());
        assert!(figure.data.is_empty());
        assert!(figure.frames.is_empty());
    }

    #[test]
    fn test_region_box_and_tilt() {
        let analysis = analysis();
        let figure = region_box(&analysis.records);
        let regions: Vec<&str> = figure.data.iter().filter_map(|t| t["name"].as_str()).collect();
        assert_eq!(regions, vec!["EAST REGION", NOT_SPECIFIED, "WEST REGION"]);

        let mut records = analysis.records.clone();
        records[0].tilt_deg = None;
        let figure = tilt_polar(&records);
        assert_eq!(figure.data[0]["r"].as_array().map(Vec::len), Some(5));
        assert_eq!(figure.layout["polar"]["sector"], json!([0, 90]));
    }
}
