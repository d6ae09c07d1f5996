use crate::utils::constants::NOT_SPECIFIED;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One installation from the system database.
///
/// `planning_area`, `region` and `cumulative_kwp` are derived: they start out
/// unresolved and are filled in by the reconciler and the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SystemRecord {
    #[validate(length(min = 1))]
    pub name: String,

    pub system_type: String,

    pub integrator: String,

    pub technology: String,

    pub commissioned: NaiveDate,

    #[validate(range(min = 0.0))]
    pub capacity_kwp: f64,

    pub location: String,

    #[validate(range(min = 0.0, max = 90.0))]
    pub tilt_deg: Option<f64>,

    pub planning_area: String,

    pub region: String,

    pub cumulative_kwp: f64,
}

impl SystemRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        system_type: String,
        integrator: String,
        technology: String,
        commissioned: NaiveDate,
        capacity_kwp: f64,
        location: String,
        tilt_deg: Option<f64>,
    ) -> Self {
        Self {
            name,
            system_type,
            integrator,
            technology,
            commissioned,
            capacity_kwp,
            location,
            tilt_deg,
            planning_area: NOT_SPECIFIED.to_string(),
            region: NOT_SPECIFIED.to_string(),
            cumulative_kwp: 0.0,
        }
    }

    pub fn is_area_specified(&self) -> bool {
        self.planning_area != NOT_SPECIFIED
    }

    pub fn year(&self) -> i32 {
        self.commissioned.year()
    }

    pub fn clear_area(&mut self) {
        self.planning_area = NOT_SPECIFIED.to_string();
        self.region = NOT_SPECIFIED.to_string();
    }
}
