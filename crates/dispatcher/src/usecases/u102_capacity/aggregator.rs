//! Capacity hints for the selected range.
//!
//! Counts are an advisory snapshot: other dispatchers may book between the
//! fetch and the submit, and the backend makes the authoritative full/not-full
//! decision at apply time.

use std::collections::HashMap;

use chrono::NaiveDate;
use contracts::usecases::u102_capacity::{CapacityResponse, CapacityRowView, CapacityStatus, CapacityView};
use serde_json::Value;

use crate::domain::category::normalize_category_key;
use crate::shared::dates;
use crate::shared::json_value::{as_count, first_positive, is_truthy};

pub const DEFAULT_MAX_PER_DAY: u32 = 3;

/// count >= max: critical, count == max-1: warning, else ok
pub fn capacity_status(count: u32, max: u32) -> CapacityStatus {
    if count >= max {
        CapacityStatus::Critical
    } else if count + 1 == max {
        CapacityStatus::Warning
    } else {
        CapacityStatus::Ok
    }
}

/// Daily maximum from the response (`max_per_category`, then `max`), else the current one
pub fn effective_max_per_day(response: &CapacityResponse, current: u32) -> u32 {
    first_positive(&[response.max_per_category.as_ref(), response.max.as_ref()])
        .or_else(|| (current > 0).then_some(current))
        .unwrap_or(DEFAULT_MAX_PER_DAY)
}

/// Per-group counts of one date, keys normalised
///
/// A date without recorded group counts is treated as `{ALL: total}`.
fn group_counts_for(
    category_counts: Option<&serde_json::Map<String, Value>>,
    date_key: &str,
    total: u32,
) -> HashMap<String, u32> {
    let recorded = category_counts
        .and_then(|m| m.get(date_key))
        .filter(|v| is_truthy(v));

    match recorded {
        Some(Value::Object(groups)) => groups
            .iter()
            .map(|(group_id, value)| {
                let key = normalize_category_key(group_id);
                let key = if key.is_empty() { group_id.clone() } else { key };
                (key, as_count(value))
            })
            .collect(),
        Some(_) => HashMap::new(),
        None => HashMap::from([("ALL".to_string(), total)]),
    }
}

/// Оценка загрузки по датам диапазона
///
/// With an `active_group` the relevant count is that group's count (0 when
/// absent), otherwise the raw daily total. `has_full_day` is set when any
/// date reaches `max_per_day`.
pub fn evaluate_capacity(
    selected: &[NaiveDate],
    response: &CapacityResponse,
    active_group: Option<&str>,
    max_per_day: u32,
    weekend_days: &[u8],
) -> CapacityView {
    let category_counts = response.category_counts.as_ref().and_then(Value::as_object);
    let active_group = active_group
        .map(normalize_category_key)
        .filter(|g| !g.is_empty());

    let mut has_full_day = false;
    let rows = selected
        .iter()
        .map(|date| {
            let key = dates::iso(*date);
            let total = response.counts.get(&key).map(as_count).unwrap_or(0);
            let group_counts = group_counts_for(category_counts, &key, total);

            let relevant = match &active_group {
                Some(group) => group_counts.get(group).copied().unwrap_or(0),
                None => total,
            };
            if relevant >= max_per_day {
                has_full_day = true;
            }

            CapacityRowView {
                date: *date,
                count: relevant,
                max: max_per_day,
                status: capacity_status(relevant, max_per_day),
                weekend: dates::is_weekend(*date, weekend_days),
            }
        })
        .collect();

    CapacityView {
        rows,
        has_full_day,
        max_per_day,
        active_group,
        active_group_label: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;
    use serde_json::json;

    fn d(s: &str) -> NaiveDate {
        dates::parse_iso(s).unwrap()
    }

    fn response(value: Value) -> CapacityResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_status_buckets() {
        assert_eq!(capacity_status(3, 3), CapacityStatus::Critical);
        assert_eq!(capacity_status(4, 3), CapacityStatus::Critical);
        assert_eq!(capacity_status(2, 3), CapacityStatus::Warning);
        assert_eq!(capacity_status(1, 3), CapacityStatus::Ok);
        assert_eq!(capacity_status(0, 1), CapacityStatus::Critical);
        assert_eq!(capacity_status(0, 0), CapacityStatus::Critical);
        assert_eq!(CapacityStatus::Warning.css_class(), "text-amber-600");
    }

    #[test]
    fn test_group_counts_drive_full_flag() {
        let capacity = response(json!({
            "counts": {"2024-03-04": 5, "2024-03-05": 1},
            "category_counts": {
                "2024-03-04": {"lowbed": 1, "12wheel_trailer": 3},
                "2024-03-05": {"LOWBED": 1}
            }
        }));
        let selected = [d("2024-03-04"), d("2024-03-05")];

        let view = evaluate_capacity(&selected, &capacity, Some("lowbed"), 3, &[6, 0]);
        assert!(!view.has_full_day);
        assert_eq!(view.rows[0].count, 1);
        assert_eq!(view.active_group.as_deref(), Some("LOWBED"));

        let view = evaluate_capacity(&selected, &capacity, Some("12WHEEL_TRAILER"), 3, &[6, 0]);
        assert!(view.has_full_day);
        assert_eq!(view.rows[0].status, CapacityStatus::Critical);
        // group missing on the second date counts as zero
        assert_eq!(view.rows[1].count, 0);
    }

    #[test]
    fn test_total_used_without_active_group() {
        let capacity = response(json!({"counts": {"2024-03-04": 2, "2024-03-05": "3"}}));
        let view = evaluate_capacity(&[d("2024-03-04"), d("2024-03-05")], &capacity, None, 3, &[]);
        let counts: Vec<u32> = view.rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![2, 3]);
        assert!(view.has_full_day);
        assert_eq!(view.rows[0].status, CapacityStatus::Warning);
    }

    #[test]
    fn test_missing_group_counts_fall_back_to_all() {
        let capacity = response(json!({"counts": {"2024-03-04": 3}}));
        let view = evaluate_capacity(&[d("2024-03-04")], &capacity, Some("ALL"), 3, &[]);
        assert!(view.has_full_day);
        let view = evaluate_capacity(&[d("2024-03-04")], &capacity, Some("KSK"), 3, &[]);
        assert!(!view.has_full_day);
        assert_eq!(view.rows[0].count, 0);
    }

    #[test]
    fn test_effective_max() {
        let from_category = response(json!({"counts": {}, "max_per_category": 2, "max": 5}));
        assert_eq!(effective_max_per_day(&from_category, 3), 2);
        let from_max = response(json!({"counts": {}, "max_per_category": 0, "max": "4"}));
        assert_eq!(effective_max_per_day(&from_max, 3), 4);
        let none = response(json!({"counts": {}}));
        assert_eq!(effective_max_per_day(&none, 6), 6);
        assert_eq!(effective_max_per_day(&none, 0), DEFAULT_MAX_PER_DAY);
    }

    #[test]
    fn test_group_counts_key_normalisation() {
        let counts = json!({"2024-03-04": {" ksk ": "2", "": 1}});
        let map = counts.as_object().unwrap();
        let groups = group_counts_for(Some(map), "2024-03-04", 9);
        assert_eq!(groups, hashmap! {"KSK".to_string() => 2, "".to_string() => 1});
    }

    #[test]
    fn test_weekend_flag() {
        let capacity = response(json!({"counts": {}}));
        let view = evaluate_capacity(&[d("2024-03-02"), d("2024-03-04")], &capacity, None, 3, &[6, 0]);
        assert!(view.rows[0].weekend);
        assert!(!view.rows[1].weekend);
    }
}
