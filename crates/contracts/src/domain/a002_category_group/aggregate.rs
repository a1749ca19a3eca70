use serde::{Deserialize, Serialize};

/// Группа категорий водителей: общий канал уведомлений и общий лимит отпусков
///
/// Приходит от бэкенда как произвольный JSON (`category_groups`), поэтому
/// в ответах хранится сырым `serde_json::Value` и санитизируется в dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl CategoryGroup {
    pub fn new(id: &str, label: &str, categories: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
