use chrono::{Datelike, Duration, NaiveDate};

use crate::consts::{DATE_FORMAT, WEEK_LEN};
use crate::error::StoreError;

pub fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    let s = s.trim();
    // Try YYYYMMDD
    if s.len() == 8
        && let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d")
    {
        return Ok(d);
    }
    // Try YYYY-MM-DD
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(d);
    }
    Err(StoreError::InvalidDateFormat {
        input: s.to_string(),
    })
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let weekday = date.weekday().num_days_from_monday();
    date - Duration::days(i64::from(weekday))
}

/// The `WEEK_LEN` consecutive dates beginning at `start`
pub fn week_dates(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take(WEEK_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_dashed_and_compact() {
        assert_eq!(parse_date("2025-03-31").unwrap(), ymd(2025, 3, 31));
        assert_eq!(parse_date("20250331").unwrap(), ymd(2025, 3, 31));
        assert_eq!(parse_date(" 2025-03-31 ").unwrap(), ymd(2025, 3, 31));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_date("31/03/2025").unwrap_err();
        assert!(matches!(err, StoreError::InvalidDateFormat { ref input } if input == "31/03/2025"));
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn week_start_is_monday() {
        // 2025-04-02 is a Wednesday
        assert_eq!(week_start(ymd(2025, 4, 2)), ymd(2025, 3, 31));
        assert_eq!(week_start(ymd(2025, 3, 31)), ymd(2025, 3, 31));
        assert_eq!(week_start(ymd(2025, 4, 6)), ymd(2025, 3, 31));
    }

    #[test]
    fn week_dates_span_month_boundary() {
        let dates: Vec<_> = week_dates(ymd(2025, 3, 31)).collect();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], ymd(2025, 3, 31));
        assert_eq!(dates[6], ymd(2025, 4, 6));
    }
}
