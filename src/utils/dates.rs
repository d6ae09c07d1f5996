use crate::error::{ProcessingError, Result};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

/// Parse a commissioning date and snap it to the first of its month.
///
/// Accepts the month-year form used by the source spreadsheet (`Jan 15`,
/// `Sep 2019`) as well as ISO dates written by spreadsheet exports
/// (`2015-01-01`, `2015-01-01 00:00:00`).
pub fn parse_commissioned(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProcessingError::InvalidFormat(
            "Empty commissioning date".to_string(),
        ));
    }

    let padded = format!("01 {}", trimmed);
    for format in ["%d %b %y", "%d %b %Y", "%d %B %y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&padded, format) {
            return Ok(month_start(date));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(month_start(date));
    }

    match NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        Ok(datetime) => Ok(month_start(datetime.date())),
        Err(e) => Err(ProcessingError::InvalidFormat(format!(
            "Unrecognised commissioning date '{}': {}",
            trimmed, e
        ))),
    }
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Month starts from `start` to `end` inclusive
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let end = month_start(end);
    let mut current = month_start(start);
    let mut months = Vec::new();

    while current <= end {
        months.push(current);
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }

    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_month_year() {
        assert_eq!(parse_commissioned("Jan 15").unwrap(), ymd(2015, 1, 1));
        assert_eq!(parse_commissioned(" Sep 08 ").unwrap(), ymd(2008, 9, 1));
        assert_eq!(parse_commissioned("Mar 2019").unwrap(), ymd(2019, 3, 1));
    }

    #[test]
    fn test_parse_iso_dates_snap_to_month() {
        assert_eq!(parse_commissioned("2016-07-23").unwrap(), ymd(2016, 7, 1));
        assert_eq!(
            parse_commissioned("2016-07-23 00:00:00").unwrap(),
            ymd(2016, 7, 1)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_commissioned("").is_err());
        assert!(matches!(
            parse_commissioned("sometime in 2015"),
            Err(ProcessingError::InvalidFormat(message)) if message.contains("sometime in 2015")
        ));
    }

    #[test]
    fn test_month_range_spans_year_boundary() {
        let months = month_range(ymd(2019, 11, 1), ymd(2020, 2, 1));
        assert_eq!(
            months,
            vec![ymd(2019, 11, 1), ymd(2019, 12, 1), ymd(2020, 1, 1), ymd(2020, 2, 1)]
        );
    }

    #[test]
    fn test_month_range_single_and_inverted() {
        assert_eq!(month_range(ymd(2020, 5, 1), ymd(2020, 5, 1)).len(), 1);
        assert!(month_range(ymd(2020, 6, 1), ymd(2020, 5, 1)).is_empty());
    }
}
