use crate::config::AnalysisConfig;
use crate::models::{BoundaryDataset, CorrectionTable, SystemRecord};
use crate::utils::constants::{NOT_SPECIFIED, OTHER_TECHNOLOGY};
use std::collections::BTreeMap;

/// How a record's planning area was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    /// Listed location is already a planning area
    Direct,
    /// Resolved through the location correction table
    LocationCorrection,
    /// Resolved through the system name correction table
    NameCorrection,
    /// Forced to the sentinel because the system name is disallowed
    Disallowed,
    /// No table produced a known planning area
    Unresolved,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Resolution::Direct => "direct match",
            Resolution::LocationCorrection => "location correction",
            Resolution::NameCorrection => "name correction",
            Resolution::Disallowed => "disallowed system",
            Resolution::Unresolved => "unresolved",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconciliationReport {
    pub total_records: usize,
    pub by_resolution: BTreeMap<Resolution, usize>,
    /// Listed locations that could not be placed, with occurrence counts
    pub unresolved_locations: BTreeMap<String, usize>,
    /// Correction targets that are not planning areas
    pub invalid_targets: BTreeMap<String, usize>,
    pub reassigned_technologies: usize,
}

impl ReconciliationReport {
    pub fn count(&self, resolution: Resolution) -> usize {
        self.by_resolution.get(&resolution).copied().unwrap_or(0)
    }

    pub fn resolved(&self) -> usize {
        self.count(Resolution::Direct)
            + self.count(Resolution::LocationCorrection)
            + self.count(Resolution::NameCorrection)
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Reconciliation Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", self.total_records));
        for (resolution, count) in &self.by_resolution {
            summary.push_str(&format!(
                "  {:<20} {:>5} ({:.1}%)\n",
                resolution.to_string(),
                count,
                percentage(*count, self.total_records)
            ));
        }
        summary.push_str(&format!(
            "Technologies reassigned to '{}': {}\n",
            OTHER_TECHNOLOGY, self.reassigned_technologies
        ));

        if !self.unresolved_locations.is_empty() {
            summary.push_str("\nTop 10 Unresolved Locations:\n");
            let mut locations: Vec<_> = self.unresolved_locations.iter().collect();
            locations.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (i, (location, count)) in locations.iter().take(10).enumerate() {
                summary.push_str(&format!("  {}. {} ({})\n", i + 1, location, count));
            }
        }

        if !self.invalid_targets.is_empty() {
            summary.push_str("\nCorrection targets that are not planning areas:\n");
            for (target, count) in &self.invalid_targets {
                summary.push_str(&format!("  - {} ({})\n", target, count));
            }
        }

        summary
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

/// Maps free-text locations and names onto canonical planning areas.
///
/// Order of precedence: the listed location itself, then the location table,
/// then the system name table. Disallowed systems always end on the sentinel.
pub struct Reconciler<'a> {
    boundary: &'a BoundaryDataset,
    location_corrections: &'a CorrectionTable,
    name_corrections: &'a CorrectionTable,
    config: &'a AnalysisConfig,
}

enum Lookup<'t> {
    Area(&'t str),
    Sentinel,
    Invalid(&'t str),
    Missing,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        boundary: &'a BoundaryDataset,
        location_corrections: &'a CorrectionTable,
        name_corrections: &'a CorrectionTable,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            boundary,
            location_corrections,
            name_corrections,
            config,
        }
    }

    pub fn reconcile(&self, records: &mut [SystemRecord]) -> ReconciliationReport {
        let mut report = ReconciliationReport {
            total_records: records.len(),
            ..Default::default()
        };

        for record in records.iter_mut() {
            let resolution = self.reconcile_record(record, &mut report);
            *report.by_resolution.entry(resolution).or_default() += 1;
        }

        tracing::info!(
            total = report.total_records,
            resolved = report.resolved(),
            unresolved = report.count(Resolution::Unresolved),
            disallowed = report.count(Resolution::Disallowed),
            "reconciled system locations"
        );
        report
    }

    /// Resolve one record in place and say how it was resolved
    pub fn reconcile_record(
        &self,
        record: &mut SystemRecord,
        report: &mut ReconciliationReport,
    ) -> Resolution {
        if !self.config.is_known_technology(&record.technology) {
            record.technology = OTHER_TECHNOLOGY.to_string();
            report.reassigned_technologies += 1;
        }

        let (area, resolution) = self.resolve_area(record, report);

        if self.config.is_disallowed(&record.name) {
            record.clear_area();
            return Resolution::Disallowed;
        }

        match area {
            Some(area) => {
                let region = self.boundary.region_of(area).unwrap_or(NOT_SPECIFIED);
                record.planning_area = area.to_string();
                record.region = region.to_string();
            }
            None => {
                record.clear_area();
                *report
                    .unresolved_locations
                    .entry(record.location.clone())
                    .or_default() += 1;
            }
        }

        resolution
    }

    fn resolve_area<'r>(
        &'r self,
        record: &SystemRecord,
        report: &mut ReconciliationReport,
    ) -> (Option<&'r str>, Resolution) {
        if let Some(area) = self.boundary.get(&record.location) {
            return (Some(area.name.as_str()), Resolution::Direct);
        }

        // A sentinel target is a deliberate "unknown" and still lets the
        // name table have a go
        match self.check(self.location_corrections.lookup(&record.location)) {
            Lookup::Area(area) => return (Some(area), Resolution::LocationCorrection),
            Lookup::Invalid(target) => self.note_invalid_target(target, &record.location, report),
            Lookup::Sentinel | Lookup::Missing => {}
        }

        match self.check(self.name_corrections.lookup(&record.name)) {
            Lookup::Area(area) => return (Some(area), Resolution::NameCorrection),
            Lookup::Invalid(target) => self.note_invalid_target(target, &record.name, report),
            Lookup::Sentinel | Lookup::Missing => {}
        }

        (None, Resolution::Unresolved)
    }

    fn check<'t>(&'t self, target: Option<&'t str>) -> Lookup<'t> {
        match target {
            None => Lookup::Missing,
            Some(NOT_SPECIFIED) => Lookup::Sentinel,
            Some(t) => match self.boundary.get(t) {
                Some(area) => Lookup::Area(area.name.as_str()),
                None => Lookup::Invalid(t),
            },
        }
    }

    fn note_invalid_target(&self, target: &str, key: &str, report: &mut ReconciliationReport) {
        tracing::warn!(key, target, "correction target is not a known planning area");
        *report
            .invalid_targets
            .entry(target.to_string())
            .or_default() += 1;
    }
}
