use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::a001_driver::Driver;
use crate::usecases::common::lenient;

/// GET drivers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriversResponse {
    #[serde(default, deserialize_with = "lenient::vec_skip_invalid")]
    pub drivers: Vec<Driver>,
    #[serde(default, alias = "weekendDays", deserialize_with = "lenient::or_default")]
    pub weekend_days: Option<Vec<u8>>,
    /// Сырые группы; санитизируются на стороне dispatcher
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub category_groups: Option<Vec<Value>>,
    #[serde(default)]
    pub max_per_category: Option<Value>,
    #[serde(default)]
    pub max_per_day: Option<Value>,
}

/// GET capacity?from&to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityResponse {
    /// date -> total on leave; an empty `[]` counts as no data
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub counts: HashMap<String, Value>,
    /// date -> {group -> count}; anything but an object is ignored
    #[serde(default)]
    pub category_counts: Option<Value>,
    #[serde(default)]
    pub max_per_category: Option<Value>,
    #[serde(default)]
    pub max: Option<Value>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub category_groups: Option<Vec<Value>>,
}

/// Цветовая корзина загрузки дня
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    Ok,
    Warning,
    Critical,
}

impl CapacityStatus {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Ok => "text-emerald-600",
            Self::Warning => "text-amber-600",
            Self::Critical => "text-red-600",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityRowView {
    pub date: NaiveDate,
    pub count: u32,
    pub max: u32,
    pub status: CapacityStatus,
    #[serde(default)]
    pub weekend: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityView {
    pub rows: Vec<CapacityRowView>,
    pub has_full_day: bool,
    pub max_per_day: u32,
    /// Группа, по которой считался relevantCount (None = общий итог)
    pub active_group: Option<String>,
    pub active_group_label: Option<String>,
}

/// Derived category filter (tokens/categories lower-case, groups upper-case)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityFilterView {
    pub tokens: Vec<String>,
    pub categories: Vec<String>,
    pub groups: Vec<String>,
    pub has_filter: bool,
}

/// Отфильтрованный список водителей для выпадающего списка
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverListView {
    pub placeholder: String,
    pub drivers: Vec<Driver>,
    pub active_category_filter: String,
}
