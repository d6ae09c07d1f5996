use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cell of a month × group cumulative grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub month: NaiveDate,
    pub group: String,
    pub region: Option<String>,
    pub added_kwp: f64,
    pub cumulative_kwp: f64,
}

/// Dense monthly cumulative capacity per group (planning area or technology).
///
/// Points are stored month-major: all groups for the first month, then all
/// groups for the second month, and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    pub months: Vec<NaiveDate>,
    pub groups: Vec<String>,
    pub points: Vec<CumulativePoint>,
}

impl CumulativeSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points for one month, in group order
    pub fn month_slice(&self, month_index: usize) -> &[CumulativePoint] {
        let width = self.groups.len();
        let start = month_index * width;
        let end = (start + width).min(self.points.len());
        if start >= end {
            return &[];
        }
        &self.points[start..end]
    }

    /// Points for one group across all months
    pub fn group_points<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a CumulativePoint> + 'a {
        self.points.iter().filter(move |p| p.group == group)
    }

    /// Cumulative value of every group at the last month
    pub fn final_totals(&self) -> Vec<(&str, f64)> {
        match self.months.len() {
            0 => Vec::new(),
            n => self
                .month_slice(n - 1)
                .iter()
                .map(|p| (p.group.as_str(), p.cumulative_kwp))
                .collect(),
        }
    }

    pub fn grand_total(&self) -> f64 {
        self.final_totals().iter().map(|(_, v)| v).sum()
    }

    /// Largest cumulative value anywhere in the grid
    pub fn peak(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.cumulative_kwp)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(month: NaiveDate, group: &str, added: f64, cumulative: f64) -> CumulativePoint {
        CumulativePoint {
            month,
            group: group.to_string(),
            region: None,
            added_kwp: added,
            cumulative_kwp: cumulative,
        }
    }

    #[test]
    fn test_slices_and_totals() {
        let jan = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        let series = CumulativeSeries {
            months: vec![jan, feb],
            groups: vec!["A".into(), "B".into()],
            points: vec![
                point(jan, "A", 5.0, 5.0),
                point(jan, "B", 0.0, 0.0),
                point(feb, "A", 1.0, 6.0),
                point(feb, "B", 3.0, 3.0),
            ],
        };

        assert_eq!(series.month_slice(1).len(), 2);
        assert!(series.month_slice(2).is_empty());
        assert_eq!(series.group_points("B").count(), 2);
        assert_eq!(series.final_totals(), vec![("A", 6.0), ("B", 3.0)]);
        assert_eq!(series.grand_total(), 9.0);
        assert_eq!(series.peak(), 6.0);
    }

    #[test]
    fn test_empty_series() {
        let series = CumulativeSeries::default();
        assert!(series.is_empty());
        assert!(series.final_totals().is_empty());
        assert_eq!(series.grand_total(), 0.0);
    }
}
