use crate::models::{AreaSummary, BoundaryDataset, CumulativePoint, CumulativeSeries, SystemRecord};
use crate::utils::constants::{NOT_SPECIFIED, OTHER_TECHNOLOGY};
use crate::utils::dates::month_range;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Sum, count and mean of capacities within one group
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupStats {
    pub total_kwp: f64,
    pub count: usize,
}

impl GroupStats {
    pub fn add(&mut self, kwp: f64) {
        self.total_kwp += kwp;
        self.count += 1;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total_kwp / self.count as f64)
    }
}

/// Per-area and per-technology capacity bookkeeping
pub struct Aggregator<'a> {
    boundary: &'a BoundaryDataset,
}

impl<'a> Aggregator<'a> {
    pub fn new(boundary: &'a BoundaryDataset) -> Self {
        Self { boundary }
    }

    /// Round capacities to whole kWp, order by commissioning date and assign
    /// running totals within each (region, planning area) group.
    pub fn order_and_accumulate(&self, records: &mut [SystemRecord]) {
        for record in records.iter_mut() {
            record.capacity_kwp = record.capacity_kwp.round_ties_even();
        }

        records.sort_by_key(|r| r.commissioned);

        let mut running: HashMap<(String, String), f64> = HashMap::new();
        for record in records.iter_mut() {
            let total = running
                .entry((record.region.clone(), record.planning_area.clone()))
                .or_insert(0.0);
            *total += record.capacity_kwp;
            record.cumulative_kwp = total.round_ties_even();
        }
    }

    /// Sum, count and mean per planning area, including the sentinel
    pub fn group_by_area(records: &[SystemRecord]) -> BTreeMap<String, GroupStats> {
        group_by(records, |r| r.planning_area.as_str())
    }

    /// Area aggregates joined onto the boundary layer, in boundary order.
    /// Areas without systems keep `None` aggregates.
    pub fn summarize_areas(&self, records: &[SystemRecord]) -> Vec<AreaSummary> {
        let stats = Self::group_by_area(records);

        self.boundary
            .areas()
            .iter()
            .map(|area| match stats.get(&area.name) {
                Some(s) => AreaSummary {
                    name: area.name.clone(),
                    region: area.region.clone(),
                    total_capacity_kwp: Some(s.total_kwp),
                    mean_system_kwp: s.mean(),
                    system_count: s.count,
                },
                None => AreaSummary::empty(&area.name, &area.region),
            })
            .collect()
    }

    /// Stats for records left on the sentinel
    pub fn unspecified_stats(records: &[SystemRecord]) -> GroupStats {
        Self::group_by_area(records)
            .remove(NOT_SPECIFIED)
            .unwrap_or_default()
    }

    /// Month starts spanning the commissioning dates
    pub fn monthly_range(records: &[SystemRecord]) -> Vec<NaiveDate> {
        let start = records.iter().map(|r| r.commissioned).min();
        let end = records.iter().map(|r| r.commissioned).max();
        match (start, end) {
            (Some(start), Some(end)) => month_range(start, end),
            _ => Vec::new(),
        }
    }

    /// Monthly cumulative capacity for every planning area plus the sentinel
    pub fn cumulative_by_area(&self, records: &[SystemRecord]) -> CumulativeSeries {
        let mut groups: Vec<String> = self.boundary.names().map(str::to_string).collect();
        groups.push(NOT_SPECIFIED.to_string());

        let mut series = cumulative_series(records, groups, |r| r.planning_area.as_str());
        for point in &mut series.points {
            let region = self.boundary.region_of(&point.group).unwrap_or(NOT_SPECIFIED);
            point.region = Some(region.to_string());
        }
        series
    }

    /// Monthly cumulative capacity for every allowed technology plus "Other"
    pub fn cumulative_by_technology(
        records: &[SystemRecord],
        technology_types: &[String],
    ) -> CumulativeSeries {
        let mut groups: Vec<String> = technology_types.to_vec();
        if !groups.iter().any(|g| g == OTHER_TECHNOLOGY) {
            groups.push(OTHER_TECHNOLOGY.to_string());
        }

        cumulative_series(records, groups, |r| r.technology.as_str())
    }
}

fn group_by<'r, F>(records: &'r [SystemRecord], key: F) -> BTreeMap<String, GroupStats>
where
    F: Fn(&'r SystemRecord) -> &'r str,
{
    let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();
    for record in records {
        groups
            .entry(key(record).to_string())
            .or_default()
            .add(record.capacity_kwp);
    }
    groups
}

/// Dense months × groups grid of added and running capacity.
///
/// Records whose key is not among `groups` are dropped with a warning so the
/// grid stays rectangular.
fn cumulative_series<'r, F>(records: &'r [SystemRecord], groups: Vec<String>, key: F) -> CumulativeSeries
where
    F: Fn(&'r SystemRecord) -> &'r str,
{
    let months = Aggregator::monthly_range(records);
    if months.is_empty() {
        return CumulativeSeries {
            months,
            groups,
            points: Vec::new(),
        };
    }

    let month_index: HashMap<NaiveDate, usize> =
        months.iter().enumerate().map(|(i, m)| (*m, i)).collect();
    let group_index: HashMap<&str, usize> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (g.as_str(), i))
        .collect();

    let width = groups.len();
    let mut added = vec![0.0f64; months.len() * width];
    for record in records {
        let group = key(record);
        let (Some(&m), Some(&g)) = (
            month_index.get(&crate::utils::month_start(record.commissioned)),
            group_index.get(group),
        ) else {
            tracing::warn!(group, system = %record.name, "record outside series groups, skipped");
            continue;
        };
        added[m * width + g] += record.capacity_kwp;
    }

    let mut running = vec![0.0f64; width];
    let mut points = Vec::with_capacity(added.len());
    for (m, month) in months.iter().enumerate() {
        for (g, group) in groups.iter().enumerate() {
            let value = added[m * width + g];
            running[g] += value;
            points.push(CumulativePoint {
                month: *month,
                group: group.clone(),
                region: None,
                added_kwp: value,
                cumulative_kwp: running[g],
            });
        }
    }

    CumulativeSeries {
        months,
        groups,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::processors::Reconciler;
    use crate::test_support::{boundary, location_corrections, name_corrections, records, ymd};
    use pretty_assertions::assert_eq;

    fn prepared() -> (BoundaryDataset, Vec<SystemRecord>) {
        let boundary = boundary();
        let config = AnalysisConfig::default();
        let mut records = records();
        Reconciler::new(&boundary, &location_corrections(), &name_corrections(), &config)
            .reconcile(&mut records);
        Aggregator::new(&boundary).order_and_accumulate(&mut records);
        (boundary, records)
    }

    #[test]
    fn test_order_and_accumulate() {
        let (_, records) = prepared();

        let dates: Vec<NaiveDate> = records.iter().map(|r| r.commissioned).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);

        // 100.4 -> 100, 50.6 -> 51
        let bedok: Vec<(f64, f64)> = records
            .iter()
            .filter(|r| r.planning_area == "BEDOK")
            .map(|r| (r.capacity_kwp, r.cumulative_kwp))
            .collect();
        assert_eq!(bedok, vec![(100.0, 100.0), (30.0, 130.0)]);

        let tampines = records.iter().find(|r| r.name == "Tampines Hub").unwrap();
        assert_eq!(tampines.capacity_kwp, 51.0);
        assert_eq!(tampines.cumulative_kwp, 51.0);

        // Unknown (7.5 -> 8) then SolarNova2 (1000) share the sentinel group
        let unspecified: Vec<f64> = records
            .iter()
            .filter(|r| !r.is_area_specified())
            .map(|r| r.cumulative_kwp)
            .collect();
        assert_eq!(unspecified, vec![8.0, 1008.0]);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        let boundary = boundary();
        let mut records = vec![
            crate::test_support::record("A", "BEDOK", "CIGS", ymd(2015, 1), 2.5),
            crate::test_support::record("B", "BEDOK", "CIGS", ymd(2015, 2), 3.5),
        ];
        Aggregator::new(&boundary).order_and_accumulate(&mut records);
        assert_eq!(records[0].capacity_kwp, 2.0);
        assert_eq!(records[1].capacity_kwp, 4.0);
    }

    #[test]
    fn test_summarize_areas() {
        let (boundary, records) = prepared();
        let summaries = Aggregator::new(&boundary).summarize_areas(&records);

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].name, "BEDOK");
        assert_eq!(summaries[0].total_capacity_kwp, Some(130.0));
        assert_eq!(summaries[0].mean_system_kwp, Some(65.0));
        assert_eq!(summaries[0].system_count, 2);

        assert_eq!(summaries[2].name, "JURONG WEST");
        assert_eq!(summaries[2].system_count, 1);

        let unspecified = Aggregator::unspecified_stats(&records);
        assert_eq!(unspecified.count, 2);
        assert_eq!(unspecified.total_kwp, 1008.0);

        let area_total: f64 = summaries.iter().filter_map(|s| s.total_capacity_kwp).sum();
        let total: f64 = records.iter().map(|r| r.capacity_kwp).sum();
        assert_eq!(area_total + unspecified.total_kwp, total);
    }

    #[test]
    fn test_area_without_systems() {
        let boundary = boundary();
        let mut records = vec![crate::test_support::record("A", "BEDOK", "CIGS", ymd(2015, 1), 1.0)];
        records[0].planning_area = "BEDOK".into();
        records[0].region = "EAST REGION".into();

        let summaries = Aggregator::new(&boundary).summarize_areas(&records);
        let tampines = summaries.iter().find(|s| s.name == "TAMPINES").unwrap();
        assert_eq!(tampines, &AreaSummary::empty("TAMPINES", "EAST REGION"));
        assert!(!tampines.has_systems());
    }

    #[test]
    fn test_cumulative_by_area() {
        let (boundary, records) = prepared();
        let series = Aggregator::new(&boundary).cumulative_by_area(&records);

        // Jan 2015 .. Feb 2016
        assert_eq!(series.months.len(), 14);
        assert_eq!(series.months[0], ymd(2015, 1));
        assert_eq!(series.groups.last().map(String::as_str), Some(NOT_SPECIFIED));
        assert_eq!(series.points.len(), 14 * 4);

        let totals = series.final_totals();
        assert_eq!(
            totals,
            vec![
                ("BEDOK", 130.0),
                ("TAMPINES", 51.0),
                ("JURONG WEST", 20.0),
                (NOT_SPECIFIED, 1008.0)
            ]
        );

        let bedok_march = series
            .group_points("BEDOK")
            .find(|p| p.month == ymd(2015, 3))
            .unwrap();
        assert_eq!(bedok_march.added_kwp, 100.0);
        assert_eq!(bedok_march.region.as_deref(), Some("EAST REGION"));

        let sentinel = series.group_points(NOT_SPECIFIED).next().unwrap();
        assert_eq!(sentinel.region.as_deref(), Some(NOT_SPECIFIED));
    }

    #[test]
    fn test_cumulative_by_technology_includes_other() {
        let (_, records) = prepared();
        let config = AnalysisConfig::default();
        let series = Aggregator::cumulative_by_technology(&records, &config.technology_types);

        assert_eq!(series.groups.len(), config.technology_types.len() + 1);
        assert_eq!(series.groups.last().map(String::as_str), Some(OTHER_TECHNOLOGY));

        let total: f64 = records.iter().map(|r| r.capacity_kwp).sum();
        assert_eq!(series.grand_total(), total);

        let totals: HashMap<&str, f64> = series.final_totals().into_iter().collect();
        assert_eq!(totals["Monocrystalline silicon"], 1130.0);
        assert_eq!(totals[OTHER_TECHNOLOGY], 8.0);
        assert_eq!(totals["Amorphous silicon"], 0.0);
    }

    #[test]
    fn test_empty_records() {
        let boundary = boundary();
        assert!(Aggregator::monthly_range(&[]).is_empty());
        let series = Aggregator::new(&boundary).cumulative_by_area(&[]);
        assert!(series.is_empty());
        assert_eq!(series.groups.len(), 4);
    }

    #[test]
    fn test_group_stats_mean() {
        let mut stats = GroupStats::default();
        assert_eq!(stats.mean(), None);
        stats.add(3.0);
        stats.add(5.0);
        assert_eq!(stats.mean(), Some(4.0));
    }
}
