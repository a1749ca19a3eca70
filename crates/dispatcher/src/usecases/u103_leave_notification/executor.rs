use chrono::NaiveDate;
use contracts::domain::a001_driver::Driver;
use contracts::usecases::u103_leave_notification::{
    ChatSendPayload, DispatchStepOutcome, DispatchStepView, NotificationDescriptor,
};

use super::composer::{compose_notification, ComposedNotification, ComposerSettings};
use super::snapshot::build_snapshot_attachment;
use crate::domain::category::ChannelConfig;
use crate::shared::api_client::LeaveApi;
use crate::shared::config::{Config, DispatchPolicy};

pub const ADMIN_STEP: &str = "admin_approval";
pub const CHANNEL_STEP: &str = "channel_announcement";

/// Настройки отправки уведомлений
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub composer: ComposerSettings,
    pub policy: DispatchPolicy,
    pub attach_snapshot: bool,
    pub jpeg_quality: u8,
}

impl NotificationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            composer: ComposerSettings {
                admin_chat_id: config.notification.admin_chat_id.clone(),
                calendar_update_mode: config.workflow.calendar_update_mode.clone(),
            },
            policy: config.notification.dispatch_policy,
            attach_snapshot: config.notification.attach_snapshot,
            jpeg_quality: config.notification.jpeg_quality.clamp(1, 100),
        }
    }
}

/// One chat message of the pipeline
#[derive(Debug, Clone)]
pub struct SendStep {
    pub name: &'static str,
    pub payload: ChatSendPayload,
}

/// Упорядоченный план отправки: сначала админ-чат, затем канал категории
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    steps: Vec<SendStep>,
}

impl DispatchPlan {
    pub fn new(composed: ComposedNotification) -> Self {
        Self {
            steps: vec![
                SendStep {
                    name: ADMIN_STEP,
                    payload: composed.secondary,
                },
                SendStep {
                    name: CHANNEL_STEP,
                    payload: composed.primary,
                },
            ],
        }
    }

    /// Sequential sends; after a failure the abort policy skips the rest
    pub async fn run<A: LeaveApi + ?Sized>(self, api: &A, policy: DispatchPolicy) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut failed = false;

        for step in self.steps {
            let chat_id = step.payload.chat_id.clone();
            if failed && policy == DispatchPolicy::AbortOnFailure {
                tracing::warn!("Skipping notification step '{}' after earlier failure", step.name);
                report.push(step.name, chat_id, DispatchStepOutcome::Skipped, None);
                continue;
            }

            match api.send_chat(&step.payload).await {
                Ok(_) => {
                    tracing::info!("Notification step '{}' sent to {}", step.name, chat_id);
                    report.push(step.name, chat_id, DispatchStepOutcome::Sent, None);
                }
                Err(e) => {
                    tracing::error!("Failed to send leave notification ({}): {}", step.name, e);
                    failed = true;
                    report.push(step.name, chat_id, DispatchStepOutcome::Failed, Some(e.to_string()));
                }
            }
        }

        report
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub steps: Vec<DispatchStepView>,
}

impl DispatchReport {
    fn push(&mut self, name: &str, chat_id: String, outcome: DispatchStepOutcome, error: Option<String>) {
        self.steps.push(DispatchStepView {
            name: name.to_string(),
            chat_id,
            outcome,
            error,
        });
    }

    /// True when nothing was composed
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first_error(&self) -> Option<&str> {
        self.steps.iter().find_map(|s| s.error.as_deref())
    }
}

/// sendLeaveNotificationWithSnapshot
///
/// Nothing is fetched or sent when the descriptor has no message or buttons.
/// A failed snapshot only drops the attachment.
pub async fn send_leave_notification_with_snapshot<A: LeaveApi + ?Sized>(
    api: &A,
    descriptor: &mut NotificationDescriptor,
    applied: &[NaiveDate],
    driver: Option<&Driver>,
    channel: &ChannelConfig,
    settings: &NotificationSettings,
) -> DispatchReport {
    let Some(mut composed) = compose_notification(descriptor, applied, channel, &settings.composer) else {
        tracing::debug!("Notification descriptor without message or buttons, nothing to send");
        return DispatchReport::default();
    };

    if settings.attach_snapshot {
        if let Some(attachment) =
            build_snapshot_attachment(api, applied, driver, settings.jpeg_quality).await
        {
            composed.primary.media = Some(attachment.to_media());
        }
    }

    DispatchPlan::new(composed).run(api, settings.policy).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::api_client::ApiError;
    use crate::shared::dates;
    use crate::shared::testing::{ApiCall, FakeLeaveApi};
    use contracts::usecases::u103_leave_notification::ScreenshotResponse;
    use serde_json::json;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="#00f"/></svg>"##;

    fn settings(policy: DispatchPolicy) -> NotificationSettings {
        NotificationSettings {
            composer: ComposerSettings {
                admin_chat_id: "admin@g.us".into(),
                calendar_update_mode: "after_approval".into(),
            },
            policy,
            attach_snapshot: true,
            jpeg_quality: 92,
        }
    }

    fn channel() -> ChannelConfig {
        ChannelConfig {
            id: "KSK".into(),
            label: "KSK".into(),
            chat_id: "ksk@g.us".into(),
            calendar_id: "cal".into(),
        }
    }

    fn descriptor() -> NotificationDescriptor {
        serde_json::from_value(json!({
            "message": "Leave\nAli / D1 (KSK)",
            "button_actions": {"Lulus": "leave:approve:1", "Tolak": "leave:reject:1"}
        }))
        .unwrap()
    }

    fn applied() -> Vec<NaiveDate> {
        vec![dates::parse_iso("2024-03-05").unwrap()]
    }

    #[tokio::test]
    async fn test_no_buttons_means_no_network() {
        let api = FakeLeaveApi::new();
        let mut desc = NotificationDescriptor {
            message: Some("x".into()),
            ..Default::default()
        };
        let driver = Driver::new("D1", "Ali", "KSK");
        let report = send_leave_notification_with_snapshot(
            &api,
            &mut desc,
            &applied(),
            Some(&driver),
            &channel(),
            &settings(DispatchPolicy::AbortOnFailure),
        )
        .await;
        assert!(report.is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_admin_first_then_channel_with_snapshot() {
        let api = FakeLeaveApi::new();
        api.push_screenshot(Ok(ScreenshotResponse {
            ok: true,
            svg: Some(SVG.into()),
            ..Default::default()
        }));
        let driver = Driver::new("D1", "Ali", "KSK");
        let mut desc = descriptor();

        let report = send_leave_notification_with_snapshot(
            &api,
            &mut desc,
            &applied(),
            Some(&driver),
            &channel(),
            &settings(DispatchPolicy::AbortOnFailure),
        )
        .await;

        let chats = api.sent_chats();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].chat_id, "admin@g.us");
        assert!(chats[0].media.is_none());
        assert_eq!(chats[1].chat_id, "ksk@g.us");
        let media = chats[1].media.as_ref().unwrap();
        assert_eq!(media.filename, "calendar-2024-03-D1.jpg");
        assert!(matches!(api.calls()[0], ApiCall::Screenshot(_)));
        assert!(report.steps.iter().all(|s| s.outcome == DispatchStepOutcome::Sent));
        assert_eq!(desc.metadata.as_ref().unwrap()["calendar_channel_id"], "KSK");
    }

    #[tokio::test]
    async fn test_failed_snapshot_still_sends() {
        let api = FakeLeaveApi::new();
        api.push_screenshot(Ok(ScreenshotResponse::default()));
        let driver = Driver::new("D1", "Ali", "KSK");

        let report = send_leave_notification_with_snapshot(
            &api,
            &mut descriptor(),
            &applied(),
            Some(&driver),
            &channel(),
            &settings(DispatchPolicy::AbortOnFailure),
        )
        .await;

        assert_eq!(report.steps.len(), 2);
        assert!(api.sent_chats().iter().all(|c| c.media.is_none()));
    }

    #[tokio::test]
    async fn test_abort_policy_skips_channel_after_admin_failure() {
        let api = FakeLeaveApi::new();
        api.push_send_chat(Err(ApiError::Status {
            status: 500,
            message: "gateway down".into(),
        }));

        let report = send_leave_notification_with_snapshot(
            &api,
            &mut descriptor(),
            &applied(),
            None,
            &channel(),
            &settings(DispatchPolicy::AbortOnFailure),
        )
        .await;

        assert_eq!(api.sent_chats().len(), 1);
        let outcomes: Vec<_> = report.steps.iter().map(|s| s.outcome).collect();
        assert_eq!(outcomes, vec![DispatchStepOutcome::Failed, DispatchStepOutcome::Skipped]);
        assert_eq!(report.first_error(), Some("gateway down"));
    }

    #[tokio::test]
    async fn test_continue_policy_attempts_every_step() {
        let api = FakeLeaveApi::new();
        api.push_send_chat(Err(ApiError::Network("timeout".into())));

        let report = DispatchPlan::new(
            compose_notification(&mut descriptor(), &applied(), &channel(), &settings(DispatchPolicy::ContinueOnFailure).composer)
                .unwrap(),
        )
        .run(&api, DispatchPolicy::ContinueOnFailure)
        .await;

        assert_eq!(api.sent_chats().len(), 2);
        assert_eq!(report.steps[0].name, ADMIN_STEP);
        assert_eq!(report.steps[1].outcome, DispatchStepOutcome::Sent);
    }
}
