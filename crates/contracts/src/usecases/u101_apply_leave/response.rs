use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::usecases::common::lenient;
use crate::usecases::u102_capacity::{CapacityFilterView, CapacityView};
use crate::usecases::u103_leave_notification::{DispatchStepView, NotificationDescriptor};

/// Причина отказа, означающая достижение дневного лимита
pub const FULL_REASON: &str = "full";

/// Ответ apply / apply_force3
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResponse {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub ok: bool,
    #[serde(default, deserialize_with = "lenient::vec_skip_invalid")]
    pub applied_dates: Vec<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::vec_skip_invalid")]
    pub errors: Vec<ApplyErrorItem>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub notification: Option<NotificationDescriptor>,
}

impl ApplyResponse {
    /// First error reported with reason "full"
    pub fn full_error(&self) -> Option<&ApplyErrorItem> {
        self.errors
            .iter()
            .find(|e| e.reason.as_deref() == Some(FULL_REASON))
    }

    pub fn is_capacity_conflict(&self) -> bool {
        self.full_error().is_some() || self.reason.as_deref() == Some(FULL_REASON)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyErrorItem {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub reason: Option<String>,
    /// Raw date string as reported by the backend
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub date: Option<String>,
}

impl ApplyErrorItem {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .map(str::trim)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

// ============================================================================
// Dispatcher console views
// ============================================================================

/// Состояние конечного автомата подачи заявки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveWorkflowState {
    #[default]
    Idle,
    Submitting,
    Applied,
    CapacityConflictPending,
    ConfirmingForce,
    Failed,
}

impl LeaveWorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Applied => "applied",
            Self::CapacityConflictPending => "capacity_conflict_pending",
            Self::ConfirmingForce => "confirming_force",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingForceView {
    pub driver_id: String,
    pub start: NaiveDate,
    pub has_notification: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveStateView {
    pub state: LeaveWorkflowState,
    pub status: String,
    pub selected_start: Option<NaiveDate>,
    pub selected_end: Option<NaiveDate>,
    pub has_full_day: bool,
    pub max_per_day: u32,
    pub pending_force: Option<PendingForceView>,
    pub capacity: Option<CapacityView>,
    pub filter: CapacityFilterView,
}

/// Результат submit / confirm / cancel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveActionResponse {
    pub ok: bool,
    pub state: LeaveWorkflowState,
    pub message: String,
    #[serde(default)]
    pub applied_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub pending_force_start: Option<NaiveDate>,
    #[serde(default)]
    pub notification_steps: Vec<DispatchStepView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_reason_detected_in_errors_or_top_level() {
        let from_errors: ApplyResponse = serde_json::from_str(
            r#"{"ok":false,"errors":[{"reason":"weekend","date":"2024-03-02"},{"reason":"full","date":"2024-03-05"}]}"#,
        )
        .unwrap();
        assert!(from_errors.is_capacity_conflict());
        assert_eq!(
            from_errors.full_error().and_then(|e| e.parsed_date()),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );

        let top_level: ApplyResponse =
            serde_json::from_str(r#"{"ok":false,"reason":"full"}"#).unwrap();
        assert!(top_level.is_capacity_conflict());
        assert!(top_level.full_error().is_none());

        let other: ApplyResponse =
            serde_json::from_str(r#"{"ok":false,"message":"Driver inactive"}"#).unwrap();
        assert!(!other.is_capacity_conflict());
    }

    #[test]
    fn test_null_fields_still_decode() {
        let full: ApplyResponse =
            serde_json::from_str(r#"{"ok":false,"reason":"full","errors":null,"message":null,"notification":null}"#)
                .unwrap();
        assert!(full.is_capacity_conflict());
        assert!(full.errors.is_empty());
        assert!(full.notification.is_none());

        let applied: ApplyResponse = serde_json::from_str(
            r#"{"ok":true,"applied_dates":["2024-03-04",null,"bad"],"errors":[null,{"reason":"full","date":null}]}"#,
        )
        .unwrap();
        assert_eq!(applied.applied_dates, vec![NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()]);
        assert_eq!(applied.errors.len(), 1);
        assert_eq!(applied.full_error().and_then(|e| e.parsed_date()), None);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&LeaveWorkflowState::CapacityConflictPending).unwrap();
        assert_eq!(json, "\"capacity_conflict_pending\"");
        assert_eq!(LeaveWorkflowState::ConfirmingForce.as_str(), "confirming_force");
    }
}
