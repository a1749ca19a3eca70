use chrono::NaiveDate;
use contracts::domain::a001_driver::Driver;
use contracts::usecases::u101_apply_leave::{LeaveStateView, LeaveWorkflowState, PendingForceView};
use contracts::usecases::u102_capacity::CapacityView;
use contracts::usecases::u103_leave_notification::NotificationDescriptor;

use crate::domain::category::{CapacityFilterState, CategoryRegistry};
use crate::shared::dates::SelectedRange;

/// Отложенная принудительная заявка (ждёт подтверждения диспетчера)
#[derive(Debug, Clone, PartialEq)]
pub struct PendingForce {
    pub driver_id: String,
    pub start: NaiveDate,
    pub notification: Option<NotificationDescriptor>,
}

/// Состояние одного рабочего места диспетчера
///
/// Owned by the workflow and mutated only through its operations.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub drivers: Vec<Driver>,
    pub weekend_days: Vec<u8>,
    pub categories: CategoryRegistry,
    pub selected: SelectedRange,
    pub selected_driver_id: Option<String>,
    pub max_per_day: u32,
    /// Any date of the selection at or over the limit
    pub has_full_day: bool,
    pub last_capacity: Option<CapacityView>,
    pub pending_force: Option<PendingForce>,
    pub state: LeaveWorkflowState,
    pub status: String,
}

impl WorkflowContext {
    pub fn new(max_per_day: u32, weekend_days: Vec<u8>) -> Self {
        Self {
            drivers: Vec::new(),
            weekend_days,
            categories: CategoryRegistry::default(),
            selected: SelectedRange::default(),
            selected_driver_id: None,
            max_per_day,
            has_full_day: false,
            last_capacity: None,
            pending_force: None,
            state: LeaveWorkflowState::Idle,
            status: String::new(),
        }
    }

    pub fn driver_by_id(&self, driver_id: &str) -> Option<&Driver> {
        if driver_id.is_empty() {
            return None;
        }
        self.drivers.iter().find(|d| d.driver_id == driver_id)
    }

    pub fn selected_driver(&self) -> Option<&Driver> {
        self.selected_driver_id
            .as_deref()
            .and_then(|id| self.driver_by_id(id))
    }

    pub fn select_driver(&mut self, driver_id: Option<&str>) {
        if let Some(id) = driver_id.map(str::trim).filter(|id| !id.is_empty()) {
            self.selected_driver_id = Some(id.to_string());
        }
    }

    pub fn reset_pending_force(&mut self) {
        self.pending_force = None;
    }

    pub fn to_view(&self, filter: &CapacityFilterState) -> LeaveStateView {
        LeaveStateView {
            state: self.state,
            status: self.status.clone(),
            selected_start: self.selected.start,
            selected_end: self.selected.end,
            has_full_day: self.has_full_day,
            max_per_day: self.max_per_day,
            pending_force: self.pending_force.as_ref().map(|p| PendingForceView {
                driver_id: p.driver_id.clone(),
                start: p.start,
                has_notification: p.notification.is_some(),
            }),
            capacity: self.last_capacity.clone(),
            filter: filter.to_view(),
        }
    }
}
