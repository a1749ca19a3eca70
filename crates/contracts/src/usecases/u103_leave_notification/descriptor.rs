use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Сырое описание уведомления от бэкенда (ответ apply / apply_force3)
///
/// Fields are kept loosely typed: the backend is not strict about them and
/// `metadata` is enriched in place with routing fields before sending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationDescriptor {
    #[serde(default)]
    pub message: Option<String>,
    /// label -> action id, in declaration order
    #[serde(default)]
    pub button_actions: Option<Map<String, Value>>,
    /// Pre-built buttons (`{body|label, id|customId}`)
    #[serde(default)]
    pub buttons: Option<Vec<Value>>,
    #[serde(default)]
    pub mention_numbers: Option<Vec<Value>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub request_id: Option<Value>,
    #[serde(default)]
    pub capacity_issue: Option<Value>,
    #[serde(default)]
    pub date_range: Option<NotificationDateRange>,
    /// date -> list of "Name / Id (CATEGORY)" already on leave
    #[serde(default)]
    pub taken_summary: Option<Map<String, Value>>,
    #[serde(default)]
    pub applicant: Option<Value>,
}

impl NotificationDescriptor {
    pub fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        self.metadata.get_or_insert_with(Map::new)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDateRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_actions_keep_declaration_order() {
        let descriptor: NotificationDescriptor = serde_json::from_str(
            r#"{"message":"x","button_actions":{"Tolak":"leave:reject:1","Lulus":"leave:approve:1"}}"#,
        )
        .unwrap();
        let labels: Vec<&String> = descriptor.button_actions.as_ref().unwrap().keys().collect();
        assert_eq!(labels, vec!["Tolak", "Lulus"]);
    }
}
