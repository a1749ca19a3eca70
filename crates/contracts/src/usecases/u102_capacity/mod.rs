pub mod request;
pub mod response;

pub use request::CapacityQuery;
pub use response::{
    CapacityFilterView, CapacityResponse, CapacityRowView, CapacityStatus, CapacityView,
    DriverListView, DriversResponse,
};

use crate::usecases::common::UseCaseMetadata;

pub struct LeaveCapacity;

impl UseCaseMetadata for LeaveCapacity {
    fn usecase_index() -> &'static str {
        "u102"
    }

    fn usecase_name() -> &'static str {
        "leave_capacity"
    }

    fn display_name() -> &'static str {
        "Kapasiti cuti harian"
    }

    fn description() -> &'static str {
        "Per-date leave counts per category group against the daily maximum"
    }
}
