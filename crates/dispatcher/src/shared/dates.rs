//! Date helpers. All calendar dates are derived in one fixed timezone,
//! never in the host's local zone.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: &str = "Asia/Kuala_Lumpur";

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Timezone by IANA name, falling back to Asia/Kuala_Lumpur
pub fn parse_timezone(name: &str) -> Tz {
    name.trim().parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone '{}', using {}", name, DEFAULT_TIMEZONE);
        chrono_tz::Asia::Kuala_Lumpur
    })
}

/// Calendar date of an instant in the given timezone
pub fn date_in_tz(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Picker instants as calendar dates, order kept
pub fn dates_in_tz(instants: &[DateTime<Utc>], tz: Tz) -> Vec<NaiveDate> {
    instants.iter().map(|i| date_in_tz(*i, tz)).collect()
}

pub fn iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn parse_iso(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_FORMAT).ok()
}

/// "2024-03-05" -> "2024-03"
pub fn iso_to_month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Уникальные месяцы по списку дат, отсортированные
pub fn unique_months(dates: &[NaiveDate]) -> Vec<String> {
    dates
        .iter()
        .map(|d| iso_to_month(*d))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// "start" or "start - end" over the sorted list; empty for no dates
pub fn format_date_range_caption(dates: &[NaiveDate]) -> String {
    let (Some(start), Some(end)) = (dates.iter().min(), dates.iter().max()) else {
        return String::new();
    };
    if start == end {
        iso(*start)
    } else {
        format!("{} - {}", iso(*start), iso(*end))
    }
}

/// Inclusive selection from the range picker; `end` is None while picking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectedRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl SelectedRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }

    /// Picker change: first date is the start, last date (when two or more) the end
    pub fn apply_picker_change(&mut self, dates: &[NaiveDate]) {
        let Some(first) = dates.first() else {
            self.clear();
            return;
        };
        self.start = Some(*first);
        self.end = if dates.len() >= 2 { dates.last().copied() } else { None };
    }

    /// Picker closed with a single date: single-day range
    pub fn apply_picker_close(&mut self, dates: &[NaiveDate]) {
        if let [single] = dates {
            self.apply_picker_change(&[*single, *single]);
        }
    }
}

/// Day-by-day inclusive expansion; empty when a bound is missing or start > end
pub fn collect_selected_dates(range: &SelectedRange) -> Vec<NaiveDate> {
    let (Some(start), Some(end)) = (range.start, range.end) else {
        return Vec::new();
    };
    start.iter_days().take_while(|d| *d <= end).collect()
}

pub fn is_weekend(date: NaiveDate, weekend_days: &[u8]) -> bool {
    let weekday = date.weekday().num_days_from_sunday() as u8;
    weekend_days.contains(&weekday)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(s: &str) -> NaiveDate {
        parse_iso(s).unwrap()
    }

    #[test]
    fn test_collect_selected_dates_crosses_month() {
        let range = SelectedRange::new(d("2024-01-30"), d("2024-02-01"));
        let dates: Vec<String> = collect_selected_dates(&range).into_iter().map(iso).collect();
        assert_eq!(dates, vec!["2024-01-30", "2024-01-31", "2024-02-01"]);
    }

    #[test]
    fn test_collect_selected_dates_incomplete_or_reversed() {
        let open = SelectedRange {
            start: Some(d("2024-01-30")),
            end: None,
        };
        assert!(collect_selected_dates(&open).is_empty());
        let reversed = SelectedRange::new(d("2024-02-01"), d("2024-01-30"));
        assert!(collect_selected_dates(&reversed).is_empty());
    }

    #[test]
    fn test_instants_use_fixed_timezone() {
        let tz = parse_timezone("Asia/Kuala_Lumpur");
        // 16:30 UTC is already the next day in Kuala Lumpur (UTC+8)
        let start = Utc.with_ymd_and_hms(2024, 1, 30, 16, 30, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 16, 30, 0).unwrap();
        assert_eq!(dates_in_tz(&[start, end], tz), vec![d("2024-01-31"), d("2024-02-01")]);
        assert_eq!(iso_to_month(date_in_tz(end, tz)), "2024-02");
        assert_eq!(parse_timezone("Mars/Olympus"), chrono_tz::Asia::Kuala_Lumpur);
    }

    #[test]
    fn test_picker_change_and_close() {
        let mut range = SelectedRange::default();
        range.apply_picker_change(&[d("2024-03-04")]);
        assert_eq!(range.start, Some(d("2024-03-04")));
        assert_eq!(range.end, None);

        range.apply_picker_close(&[d("2024-03-04")]);
        assert_eq!(range, SelectedRange::new(d("2024-03-04"), d("2024-03-04")));

        range.apply_picker_change(&[]);
        assert_eq!(range, SelectedRange::default());
    }

    #[test]
    fn test_unique_months_sorted() {
        assert_eq!(
            unique_months(&[d("2024-02-01"), d("2024-01-31"), d("2024-02-02")]),
            vec!["2024-01", "2024-02"]
        );
    }

    #[test]
    fn test_range_caption() {
        assert_eq!(format_date_range_caption(&[]), "");
        assert_eq!(format_date_range_caption(&[d("2024-03-05")]), "2024-03-05");
        assert_eq!(
            format_date_range_caption(&[d("2024-03-07"), d("2024-03-05")]),
            "2024-03-05 - 2024-03-07"
        );
    }

    #[test]
    fn test_weekend() {
        assert!(is_weekend(d("2024-03-02"), &[6, 0]));
        assert!(!is_weekend(d("2024-03-04"), &[6, 0]));
    }
}
