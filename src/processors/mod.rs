pub mod aggregator;
pub mod integrity_checker;
pub mod pipeline;
pub mod reconciler;

pub use aggregator::{Aggregator, GroupStats};
pub use integrity_checker::{
    IntegrityChecker, IntegrityReport, IntegrityViolation, RegionStatistics, ViolationType,
};
pub use pipeline::{AnalysisInputs, AnalysisPipeline, SolarAnalysis};
pub use reconciler::{ReconciliationReport, Reconciler, Resolution};
