pub mod chat;
pub mod descriptor;
pub mod response;
pub mod snapshot;

pub use chat::{ChatButton, ChatMedia, ChatMessageKind, ChatSendPayload};
pub use descriptor::{NotificationDateRange, NotificationDescriptor};
pub use response::{DispatchStepOutcome, DispatchStepView};
pub use snapshot::ScreenshotResponse;

use crate::usecases::common::UseCaseMetadata;

pub struct LeaveNotification;

impl UseCaseMetadata for LeaveNotification {
    fn usecase_index() -> &'static str {
        "u103"
    }

    fn usecase_name() -> &'static str {
        "leave_notification"
    }

    fn display_name() -> &'static str {
        "Notifikasi kelulusan cuti"
    }

    fn description() -> &'static str {
        "Bilingual approval chat messages with an optional calendar snapshot"
    }
}
