use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Тип сообщения для whatsapp_send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageKind {
    Text,
    Buttons,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatButton {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ChatButton {
    pub fn new(body: impl Into<String>, id: Option<String>) -> Self {
        Self {
            body: body.into(),
            id: id.filter(|i| !i.is_empty()),
        }
    }
}

/// Вложение (JPEG-снимок календаря, base64 без префикса data URL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMedia {
    pub mimetype: String,
    pub data: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// POST whatsapp_send
///
/// The transport carries string-valued metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendPayload {
    pub chat_id: String,
    #[serde(rename = "type")]
    pub kind: ChatMessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ChatButton>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mention_numbers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<ChatMedia>,
}

impl ChatSendPayload {
    pub fn text(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            kind: ChatMessageKind::Text,
            content: Some(content.into()),
            body: None,
            buttons: Vec::new(),
            mention_numbers: Vec::new(),
            mentions: Vec::new(),
            metadata: None,
            title: None,
            footer: None,
            media: None,
        }
    }

    pub fn buttons(chat_id: impl Into<String>, body: impl Into<String>, buttons: Vec<ChatButton>) -> Self {
        Self {
            kind: ChatMessageKind::Buttons,
            content: None,
            body: Some(body.into()),
            buttons,
            ..Self::text(chat_id, String::new())
        }
    }

    /// Текст сообщения независимо от типа
    pub fn text_body(&self) -> &str {
        self.content
            .as_deref()
            .or(self.body.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payload_wire_shape() {
        let mut payload = ChatSendPayload::text("1203@g.us", "Permohonan cuti baharu pada");
        payload.mention_numbers = vec!["0123456789".into()];
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chatId"], "1203@g.us");
        assert_eq!(json["type"], "text");
        assert_eq!(json["mentionNumbers"][0], "0123456789");
        assert!(json.get("buttons").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_buttons_payload_uses_body() {
        let payload = ChatSendPayload::buttons(
            "admin@g.us",
            "新的请假申请",
            vec![ChatButton::new("批准", Some("leave:approve:1".into()))],
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "buttons");
        assert_eq!(json["body"], "新的请假申请");
        assert!(json.get("content").is_none());
        assert_eq!(payload.text_body(), "新的请假申请");
    }
}
