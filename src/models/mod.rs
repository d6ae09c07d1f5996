pub mod correction;
pub mod planning_area;
pub mod series;
pub mod system;

pub use correction::{CorrectionKind, CorrectionTable};
pub use planning_area::{AreaSummary, BoundaryDataset, PlanningArea};
pub use series::{CumulativePoint, CumulativeSeries};
pub use system::SystemRecord;
