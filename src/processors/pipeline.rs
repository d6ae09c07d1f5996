use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{
    AreaSummary, BoundaryDataset, CorrectionKind, CorrectionTable, CumulativeSeries, SystemRecord,
};
use crate::processors::{
    Aggregator, GroupStats, IntegrityChecker, IntegrityReport, ReconciliationReport, Reconciler,
};
use crate::readers::{BoundaryReader, CorrectionReader, SystemReader};
use crate::utils::progress::ProgressReporter;

/// Everything read from disk before any processing
pub struct AnalysisInputs {
    pub boundary: BoundaryDataset,
    pub records: Vec<SystemRecord>,
    pub location_corrections: CorrectionTable,
    pub name_corrections: CorrectionTable,
}

/// Reconciled records with every derived table
pub struct SolarAnalysis {
    pub boundary: BoundaryDataset,
    pub records: Vec<SystemRecord>,
    pub area_summaries: Vec<AreaSummary>,
    pub unspecified: GroupStats,
    pub area_series: CumulativeSeries,
    pub technology_series: CumulativeSeries,
    pub reconciliation: ReconciliationReport,
    pub integrity: IntegrityReport,
}

impl SolarAnalysis {
    pub fn total_capacity_kwp(&self) -> f64 {
        self.records.iter().map(|r| r.capacity_kwp).sum()
    }
}

pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load, reconcile, aggregate and check
    pub fn run(&self, progress: &ProgressReporter) -> Result<SolarAnalysis> {
        let inputs = self.load_inputs(progress)?;
        Ok(self.analyze(inputs, progress))
    }

    pub fn load_inputs(&self, progress: &ProgressReporter) -> Result<AnalysisInputs> {
        let paths = &self.config.inputs;

        progress.stage("Reading planning area boundaries...");
        let boundary = BoundaryReader::new().read_archive(&paths.boundary_archive)?;

        progress.stage("Reading system database...");
        let records = SystemReader::new().read_systems(&paths.system_database)?;

        progress.stage("Reading correction tables...");
        let location_corrections =
            CorrectionReader::new(CorrectionKind::Location).read_table(&paths.location_corrections)?;
        let name_corrections =
            CorrectionReader::new(CorrectionKind::SystemName).read_table(&paths.name_corrections)?;

        Ok(AnalysisInputs {
            boundary,
            records,
            location_corrections,
            name_corrections,
        })
    }

    /// Run every in-memory stage over already loaded inputs
    pub fn analyze(&self, inputs: AnalysisInputs, progress: &ProgressReporter) -> SolarAnalysis {
        let AnalysisInputs {
            boundary,
            mut records,
            location_corrections,
            name_corrections,
        } = inputs;

        progress.stage("Reconciling locations...");
        let reconciliation = Reconciler::new(
            &boundary,
            &location_corrections,
            &name_corrections,
            &self.config,
        )
        .reconcile(&mut records);

        progress.stage("Aggregating capacity...");
        let aggregator = Aggregator::new(&boundary);
        aggregator.order_and_accumulate(&mut records);
        let area_summaries = aggregator.summarize_areas(&records);
        let unspecified = Aggregator::unspecified_stats(&records);
        let area_series = aggregator.cumulative_by_area(&records);
        let technology_series =
            Aggregator::cumulative_by_technology(&records, &self.config.technology_types);

        progress.stage("Checking data integrity...");
        let integrity = IntegrityChecker::new(&boundary, &self.config).check_integrity(
            &records,
            &area_summaries,
            &area_series,
            &technology_series,
        );

        tracing::info!(
            systems = records.len(),
            unspecified = unspecified.count,
            months = area_series.months.len(),
            violations = integrity.violations.len(),
            "analysis complete"
        );

        SolarAnalysis {
            boundary,
            records,
            area_summaries,
            unspecified,
            area_series,
            technology_series,
            reconciliation,
            integrity,
        }
    }
}
