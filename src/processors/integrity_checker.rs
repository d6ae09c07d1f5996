use crate::config::AnalysisConfig;
use crate::models::{AreaSummary, BoundaryDataset, CumulativeSeries, SystemRecord};
use crate::processors::aggregator::Aggregator;
use crate::utils::constants::{CAPACITY_TOLERANCE, NOT_SPECIFIED};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub total_records: usize,
    pub specified_records: usize,
    pub unspecified_records: usize,
    pub total_capacity_kwp: f64,
    pub violations: Vec<IntegrityViolation>,
    pub region_statistics: BTreeMap<String, RegionStatistics>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IntegrityViolation {
    pub subject: String,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    UnknownPlanningArea,
    DisallowedNotCleared,
    RegionMismatch,
    InvalidRecord,
    TotalMismatch,
}

#[derive(Debug, Clone, Default)]
pub struct RegionStatistics {
    pub system_count: usize,
    pub total_capacity_kwp: f64,
    pub largest_system_kwp: Option<f64>,
}

/// Data-level assertions over reconciled and aggregated tables
pub struct IntegrityChecker<'a> {
    boundary: &'a BoundaryDataset,
    config: &'a AnalysisConfig,
    tolerance: f64,
}

impl<'a> IntegrityChecker<'a> {
    pub fn new(boundary: &'a BoundaryDataset, config: &'a AnalysisConfig) -> Self {
        Self {
            boundary,
            config,
            tolerance: CAPACITY_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check per-record invariants and the capacity totals of every table
    pub fn check_integrity(
        &self,
        records: &[SystemRecord],
        summaries: &[AreaSummary],
        area_series: &CumulativeSeries,
        technology_series: &CumulativeSeries,
    ) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_records: records.len(),
            ..Default::default()
        };

        for record in records {
            self.check_record(record, &mut report);

            report.total_capacity_kwp += record.capacity_kwp;
            if record.is_area_specified() {
                report.specified_records += 1;
            } else {
                report.unspecified_records += 1;
            }

            let stats = report
                .region_statistics
                .entry(record.region.clone())
                .or_default();
            stats.system_count += 1;
            stats.total_capacity_kwp += record.capacity_kwp;
            stats.largest_system_kwp = Some(
                stats
                    .largest_system_kwp
                    .map_or(record.capacity_kwp, |v| v.max(record.capacity_kwp)),
            );
        }

        self.check_totals(records, summaries, area_series, technology_series, &mut report);

        tracing::info!(
            records = report.total_records,
            violations = report.violations.len(),
            "integrity check complete"
        );
        report
    }

    fn check_record(&self, record: &SystemRecord, report: &mut IntegrityReport) {
        if let Err(e) = record.validate() {
            report.violations.push(IntegrityViolation {
                subject: record.name.clone(),
                violation_type: ViolationType::InvalidRecord,
                details: e.to_string().replace('\n', "; "),
            });
        }

        if record.is_area_specified() && !self.boundary.contains(&record.planning_area) {
            report.violations.push(IntegrityViolation {
                subject: record.name.clone(),
                violation_type: ViolationType::UnknownPlanningArea,
                details: format!("planning area '{}' is not in the boundary data", record.planning_area),
            });
        }

        if self.config.is_disallowed(&record.name) && record.is_area_specified() {
            report.violations.push(IntegrityViolation {
                subject: record.name.clone(),
                violation_type: ViolationType::DisallowedNotCleared,
                details: format!("disallowed system placed in '{}'", record.planning_area),
            });
        }

        let expected_region = if record.is_area_specified() {
            self.boundary.region_of(&record.planning_area)
        } else {
            Some(NOT_SPECIFIED)
        };
        if let Some(expected) = expected_region {
            if record.region != expected {
                report.violations.push(IntegrityViolation {
                    subject: record.name.clone(),
                    violation_type: ViolationType::RegionMismatch,
                    details: format!(
                        "region '{}' does not match '{}' for area '{}'",
                        record.region, expected, record.planning_area
                    ),
                });
            }
        }
    }

    fn check_totals(
        &self,
        records: &[SystemRecord],
        summaries: &[AreaSummary],
        area_series: &CumulativeSeries,
        technology_series: &CumulativeSeries,
        report: &mut IntegrityReport,
    ) {
        let total = report.total_capacity_kwp;

        let per_area: f64 = summaries.iter().filter_map(|s| s.total_capacity_kwp).sum();
        let unspecified = Aggregator::unspecified_stats(records).total_kwp;
        self.compare(
            "planning areas",
            per_area + unspecified,
            total,
            "sum of area capacities plus unspecified",
            report,
        );

        if !area_series.is_empty() {
            let finals: BTreeMap<&str, f64> = area_series.final_totals().into_iter().collect();
            for summary in summaries {
                let expected = summary.total_capacity_kwp.unwrap_or(0.0);
                let actual = finals.get(summary.name.as_str()).copied().unwrap_or(0.0);
                self.compare(
                    &summary.name,
                    actual,
                    expected,
                    "final cumulative capacity of area series",
                    report,
                );
            }
            self.compare(
                "area series",
                area_series.grand_total(),
                total,
                "final cumulative capacity over all areas",
                report,
            );
        }

        if !technology_series.is_empty() {
            self.compare(
                "technology series",
                technology_series.grand_total(),
                total,
                "final cumulative capacity over all technologies",
                report,
            );
        }
    }

    fn compare(&self, subject: &str, actual: f64, expected: f64, what: &str, report: &mut IntegrityReport) {
        if (actual - expected).abs() > self.tolerance {
            report.violations.push(IntegrityViolation {
                subject: subject.to_string(),
                violation_type: ViolationType::TotalMismatch,
                details: format!("{} is {:.3} kWp, expected {:.3} kWp", what, actual, expected),
            });
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Integrity Check Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        summary.push_str(&format!(
            "Placed in a Planning Area: {} ({:.1}%)\n",
            report.specified_records,
            percentage(report.specified_records, report.total_records)
        ));
        summary.push_str(&format!(
            "{}: {} ({:.1}%)\n",
            NOT_SPECIFIED,
            report.unspecified_records,
            percentage(report.unspecified_records, report.total_records)
        ));
        summary.push_str(&format!(
            "Total Capacity: {:.0} kWp\n",
            report.total_capacity_kwp
        ));

        if !report.region_statistics.is_empty() {
            summary.push_str("\nBy Region:\n");
            for (region, stats) in &report.region_statistics {
                summary.push_str(&format!(
                    "  {:<20} {:>5} systems {:>12.0} kWp (largest {:.0} kWp)\n",
                    region,
                    stats.system_count,
                    stats.total_capacity_kwp,
                    stats.largest_system_kwp.unwrap_or(0.0)
                ));
            }
        }

        summary.push_str(&format!("\nViolations: {}\n", report.violations.len()));

        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {:?} [{}]: {}\n",
                    i + 1,
                    violation.violation_type,
                    violation.subject,
                    violation.details
                ));
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
