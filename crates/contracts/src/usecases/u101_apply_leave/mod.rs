pub mod request;
pub mod response;

pub use request::{
    ApplyLeaveRequest, CalendarRouting, DateRangeChangeRequest, ForceApplyRequest,
    SubmitLeaveRequest,
};
pub use response::{
    ApplyErrorItem, ApplyResponse, LeaveActionResponse, LeaveStateView, LeaveWorkflowState,
    PendingForceView, FULL_REASON,
};

use crate::usecases::common::UseCaseMetadata;

pub struct ApplyLeave;

impl UseCaseMetadata for ApplyLeave {
    fn usecase_index() -> &'static str {
        "u101"
    }

    fn usecase_name() -> &'static str {
        "apply_leave"
    }

    fn display_name() -> &'static str {
        "Permohonan cuti pemandu"
    }

    fn description() -> &'static str {
        "Submit a multi-day leave request; force a 3 working day block when capacity is full"
    }
}
