pub mod common;
pub mod u101_apply_leave;
pub mod u102_capacity;
pub mod u103_leave_notification;
