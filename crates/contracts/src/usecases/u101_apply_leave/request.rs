use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Поля маршрутизации календаря/канала, вычисленные по группе категорий
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRouting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

/// POST apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyLeaveRequest {
    pub driver_id: String,
    /// Начало периода (включительно)
    pub start_date: NaiveDate,
    /// Конец периода (включительно)
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub routing: CalendarRouting,
}

/// POST apply_force3
///
/// End date is implicit: the backend books a 3 working day block from `start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceApplyRequest {
    pub driver_id: String,
    pub start_date: NaiveDate,
    #[serde(flatten)]
    pub routing: CalendarRouting,
}

/// Submit from the dispatcher console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitLeaveRequest {
    #[serde(default)]
    pub driver_id: Option<String>,
    /// Overrides the current picker selection when both bounds are given
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Free-text category filter input
    #[serde(default)]
    pub category_filter: Option<String>,
}

/// Dates emitted by the range picker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRangeChangeRequest {
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    /// Raw picker instants; when present they replace `dates` and are read
    /// in the dispatcher timezone
    #[serde(default)]
    pub instants: Vec<DateTime<Utc>>,
    /// Picker was closed (a single date then means a single-day range)
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub category_filter: Option<String>,
}
