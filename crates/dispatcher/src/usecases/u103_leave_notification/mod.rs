pub mod composer;
pub mod executor;
pub mod snapshot;

pub use composer::{compose_notification, ComposedNotification, ComposerSettings};
pub use executor::{
    send_leave_notification_with_snapshot, DispatchPlan, DispatchReport, NotificationSettings,
};
pub use snapshot::{build_snapshot_attachment, fetch_month_snapshot_as_base64, SnapshotError};
