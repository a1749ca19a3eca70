use contracts::usecases::u101_apply_leave::CalendarRouting;
use serde::{Deserialize, Serialize};

use super::resolver::normalize_category_key;
use crate::shared::config::DEFAULT_CALENDAR_ID;

/// Канал уведомлений и календарь группы категорий
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub calendar_id: String,
}

impl ChannelConfig {
    /// Routing fields for apply / apply_force3; blanks are omitted
    pub fn routing(&self) -> CalendarRouting {
        let some = |v: &str| (!v.is_empty()).then(|| v.to_string());
        CalendarRouting {
            calendar_channel_id: some(&self.id),
            calendar_id: some(&self.calendar_id),
            calendar_label: some(&self.label),
            chat_id: some(&self.chat_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelDirectory {
    channels: Vec<ChannelConfig>,
    default_id: String,
}

impl ChannelDirectory {
    pub fn new(channels: Vec<ChannelConfig>, default_id: &str) -> Self {
        let channels = channels
            .into_iter()
            .map(|mut c| {
                c.id = normalize_category_key(&c.id);
                if c.label.trim().is_empty() {
                    c.label = c.id.clone();
                }
                c
            })
            .collect();
        Self {
            channels,
            default_id: normalize_category_key(default_id),
        }
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    fn find(&self, group_id: &str) -> Option<&ChannelConfig> {
        let id = normalize_category_key(group_id);
        self.channels.iter().find(|c| c.id == id)
    }

    /// Channel of a group; unknown groups use the default channel
    pub fn get(&self, group_id: &str) -> ChannelConfig {
        if let Some(channel) = self.find(group_id) {
            return channel.clone();
        }
        if let Some(channel) = self.find(&self.default_id) {
            tracing::debug!(
                "No channel for group '{}', using default '{}'",
                group_id,
                self.default_id
            );
            return channel.clone();
        }
        tracing::warn!("No channel configured for '{}' nor a default channel", group_id);
        let id = normalize_category_key(group_id);
        ChannelConfig {
            label: id.clone(),
            id,
            chat_id: String::new(),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
        }
    }
}
