//! Двуязычные сообщения о заявке на отпуск.
//!
//! The primary (Malay) payload goes to the category channel as plain text;
//! the secondary (Chinese) payload goes to the admin chat with approve/reject
//! buttons and string-only metadata.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use contracts::usecases::u103_leave_notification::{ChatButton, ChatSendPayload, NotificationDescriptor};
use serde_json::Value;

use crate::domain::category::{scalar_to_string, ChannelConfig};
use crate::shared::dates;
use crate::shared::json_value::{is_truthy, parse_boolean, to_metadata_string};

pub const PRIMARY_PREFIX: &str = "Permohonan cuti baharu pada";
pub const PRIMARY_PREFIX_CAPACITY: &str =
    "Permohonan cuti baharu pada (kerana mencapai had maksimum 3 orang sehari)";
pub const SECONDARY_TITLE: &str = "请假审批状态";
pub const SECONDARY_FOOTER: &str = "请选择按钮以更新决定。";
pub const APPROVE_LABEL_ZH: &str = "批准";
pub const REJECT_LABEL_ZH: &str = "拒绝";

/// Параметры, не зависящие от конкретной заявки
#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub admin_chat_id: String,
    pub calendar_update_mode: String,
}

/// Готовая пара сообщений
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedNotification {
    pub secondary: ChatSendPayload,
    pub primary: ChatSendPayload,
}

fn trimmed_str(value: Option<&Value>) -> String {
    value
        .and_then(scalar_to_string)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// `button_actions` (label -> action id) first; only when that yields nothing,
/// the pre-built `buttons` array (`body|label`, `id|customId`)
pub fn collect_buttons(descriptor: &NotificationDescriptor) -> Vec<ChatButton> {
    let mut buttons: Vec<ChatButton> = descriptor
        .button_actions
        .iter()
        .flatten()
        .filter_map(|(label, action)| {
            let body = label.trim();
            if body.is_empty() {
                return None;
            }
            let id = action.as_str().map(str::trim).map(str::to_string);
            Some(ChatButton::new(body, id))
        })
        .collect();

    if buttons.is_empty() {
        for raw in descriptor.buttons.iter().flatten() {
            let Some(button) = raw.as_object() else {
                continue;
            };
            let body = match trimmed_str(button.get("body")) {
                b if b.is_empty() => trimmed_str(button.get("label")),
                b => b,
            };
            if body.is_empty() {
                continue;
            }
            let id = match trimmed_str(button.get("id")) {
                i if i.is_empty() => trimmed_str(button.get("customId")),
                i => i,
            };
            buttons.push(ChatButton::new(body, Some(id)));
        }
    }

    buttons
}

/// Номер телефона -> WhatsApp JID
///
/// `@c.us`/`@g.us` ids pass through; otherwise digits only, a local `0...`
/// number gets the `6` country prefix.
pub fn to_whatsapp_jid(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.ends_with("@c.us") || lower.ends_with("@g.us") {
        return Some(trimmed.to_string());
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let normalized = if !digits.starts_with("60") && digits.starts_with('0') && digits.len() > 1 {
        format!("6{}", digits)
    } else {
        digits
    };
    Some(format!("{}@c.us", normalized))
}

/// Truthy mention numbers as strings
pub fn mention_numbers(descriptor: &NotificationDescriptor) -> Vec<String> {
    descriptor
        .mention_numbers
        .iter()
        .flatten()
        .filter(|v| is_truthy(v))
        .filter_map(scalar_to_string)
        .collect()
}

/// "Name / Id (CATEGORY)", omitting the parts that are missing
pub fn format_driver_descriptor(applicant: Option<&Value>, fallback: &str) -> String {
    let Some(driver) = applicant.and_then(Value::as_object) else {
        return fallback.to_string();
    };
    let field = |primary: &str, alias: &str| -> String {
        match trimmed_str(driver.get(primary)) {
            v if v.is_empty() => trimmed_str(driver.get(alias)),
            v => v,
        }
    };
    let display_name = field("display_name", "displayName");
    let driver_id = field("driver_id", "driverId");
    let category = trimmed_str(driver.get("category")).to_uppercase();

    let name_part = match (display_name.is_empty(), driver_id.is_empty()) {
        (false, false) if display_name.to_lowercase() != driver_id.to_lowercase() => {
            format!("{} / {}", display_name, driver_id)
        }
        (false, _) => display_name,
        (true, false) => driver_id,
        (true, true) => fallback.to_string(),
    };

    match (name_part.is_empty(), category.is_empty()) {
        (_, true) => name_part,
        (true, false) => format!("({})", category),
        (false, false) => format!("{} ({})", name_part, category),
    }
}

/// Second non-empty line of the backend message, else the formatted applicant
pub fn extract_applicant_descriptor(descriptor: &NotificationDescriptor) -> String {
    if let Some(message) = descriptor.message.as_deref() {
        if let Some(line) = message.lines().map(str::trim).filter(|l| !l.is_empty()).nth(1) {
            return line.to_string();
        }
    }
    format_driver_descriptor(descriptor.applicant.as_ref(), "")
}

/// `metadata.date_range_label`, then `date_range`, then the applied dates
pub fn date_range_label(descriptor: &NotificationDescriptor, applied: &[NaiveDate]) -> String {
    let metadata_label = descriptor
        .metadata
        .as_ref()
        .and_then(|m| m.get("date_range_label"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if !metadata_label.is_empty() {
        return metadata_label.to_string();
    }

    if let Some(range) = &descriptor.date_range {
        let start = range.start.as_deref().map(str::trim).unwrap_or_default();
        let end = range.end.as_deref().map(str::trim).unwrap_or_default();
        match (start.is_empty(), end.is_empty()) {
            (false, false) if start == end => return start.to_string(),
            (false, false) => return format!("{} - {}", start, end),
            (false, true) => return start.to_string(),
            (true, false) => return end.to_string(),
            (true, true) => {}
        }
    }

    dates::format_date_range_caption(applied)
}

/// `capacity_issue` on the descriptor or in its metadata
pub fn has_capacity_issue(descriptor: &NotificationDescriptor) -> bool {
    parse_boolean(descriptor.capacity_issue.as_ref())
        || parse_boolean(descriptor.metadata.as_ref().and_then(|m| m.get("capacity_issue")))
}

pub fn build_primary_body(descriptor: &NotificationDescriptor, applied: &[NaiveDate]) -> String {
    let label = date_range_label(descriptor, applied);
    let prefix = if has_capacity_issue(descriptor) {
        PRIMARY_PREFIX_CAPACITY
    } else {
        PRIMARY_PREFIX
    };
    let headline = if label.is_empty() {
        format!("{}:", prefix)
    } else {
        format!("{} {}:", prefix, label)
    };

    let applicant = extract_applicant_descriptor(descriptor);
    if applicant.is_empty() {
        headline
    } else {
        format!("{}\n{}", headline, applicant)
    }
}

pub fn build_secondary_body(descriptor: &NotificationDescriptor, applied: &[NaiveDate]) -> String {
    let label = date_range_label(descriptor, applied);
    let mut lines = Vec::new();

    if has_capacity_issue(descriptor) {
        let target = if label.is_empty() { "所选日期" } else { label.as_str() };
        lines.push(format!(
            "因当天请假人数已达上限（3人），新的请假申请将改至 {}:",
            target
        ));
    } else if !label.is_empty() {
        lines.push(format!("新的请假申请：{}", label));
    } else {
        lines.push("新的请假申请已提交。".to_string());
    }

    let applicant = extract_applicant_descriptor(descriptor);
    if !applicant.is_empty() {
        lines.push(applicant);
    }

    if let Some(summary) = descriptor.taken_summary.as_ref().filter(|s| !s.is_empty()) {
        lines.push(String::new());
        lines.push("司机已请假日期:".to_string());
        let last = summary.len() - 1;
        for (index, (date, names)) in summary.iter().enumerate() {
            lines.push(format!("{}:", date.trim()));
            for name in names.as_array().into_iter().flatten() {
                if is_truthy(name) {
                    if let Some(name) = scalar_to_string(name) {
                        lines.push(name);
                    }
                }
            }
            if index < last {
                lines.push(String::new());
            }
        }
    }

    lines.join("\n").trim().to_string()
}

/// Action ids containing `:approve:` / `:reject:` get fixed captions
pub fn localize_buttons(buttons: &[ChatButton]) -> Vec<ChatButton> {
    buttons
        .iter()
        .map(|button| match button.id.as_deref() {
            Some(id) if id.contains(":approve:") => ChatButton::new(APPROVE_LABEL_ZH, Some(id.to_string())),
            Some(id) if id.contains(":reject:") => ChatButton::new(REJECT_LABEL_ZH, Some(id.to_string())),
            _ => button.clone(),
        })
        .collect()
}

fn set_if_absent(metadata: &mut serde_json::Map<String, Value>, key: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let present = metadata.get(key).map(is_truthy).unwrap_or(false);
    if !present {
        metadata.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Routing fields written into the descriptor's metadata; existing values win
pub fn enrich_metadata(
    descriptor: &mut NotificationDescriptor,
    channel: &ChannelConfig,
    calendar_update_mode: &str,
) {
    let metadata = descriptor.metadata_mut();
    set_if_absent(metadata, "calendar_update_mode", calendar_update_mode);
    set_if_absent(metadata, "chat_id", &channel.chat_id);
    set_if_absent(metadata, "calendar_channel_id", &channel.id);
    set_if_absent(metadata, "calendar_id", &channel.calendar_id);
}

/// String-only metadata for the transport plus `button_actions_json` / `request_id`
pub fn transport_metadata(descriptor: &NotificationDescriptor) -> BTreeMap<String, String> {
    let mut metadata: BTreeMap<String, String> = descriptor
        .metadata
        .iter()
        .flatten()
        .filter_map(|(key, value)| to_metadata_string(value).map(|v| (key.clone(), v)))
        .collect();

    let missing = |m: &BTreeMap<String, String>, key: &str| m.get(key).map_or(true, String::is_empty);

    if let Some(actions) = descriptor.button_actions.as_ref().filter(|a| !a.is_empty()) {
        if missing(&metadata, "button_actions_json") {
            metadata.insert(
                "button_actions_json".to_string(),
                Value::Object(actions.clone()).to_string(),
            );
        }
    }
    if let Some(request_id) = descriptor.request_id.as_ref().filter(|v| is_truthy(v)) {
        if missing(&metadata, "request_id") {
            if let Some(id) = to_metadata_string(request_id) {
                metadata.insert("request_id".to_string(), id);
            }
        }
    }

    metadata
}

/// Сборка пары сообщений
///
/// None when the descriptor has no message or no usable buttons; nothing is
/// sent in that case. Enriches `descriptor.metadata` in place.
pub fn compose_notification(
    descriptor: &mut NotificationDescriptor,
    applied: &[NaiveDate],
    channel: &ChannelConfig,
    settings: &ComposerSettings,
) -> Option<ComposedNotification> {
    if descriptor.message.as_deref().map_or(true, str::is_empty) {
        return None;
    }
    let buttons = collect_buttons(descriptor);
    if buttons.is_empty() {
        return None;
    }

    let numbers = mention_numbers(descriptor);
    let jids: Vec<String> = numbers.iter().filter_map(|n| to_whatsapp_jid(n)).collect();

    enrich_metadata(descriptor, channel, &settings.calendar_update_mode);
    let metadata = transport_metadata(descriptor);

    let mut primary = ChatSendPayload::text(channel.chat_id.clone(), build_primary_body(descriptor, applied));
    primary.mention_numbers = numbers.clone();
    primary.mentions = jids.clone();

    let mut secondary = ChatSendPayload::buttons(
        settings.admin_chat_id.clone(),
        build_secondary_body(descriptor, applied),
        localize_buttons(&buttons),
    );
    secondary.title = Some(SECONDARY_TITLE.to_string());
    secondary.footer = Some(SECONDARY_FOOTER.to_string());
    secondary.metadata = Some(metadata);
    secondary.mention_numbers = numbers;
    secondary.mentions = jids;

    Some(ComposedNotification { secondary, primary })
}
