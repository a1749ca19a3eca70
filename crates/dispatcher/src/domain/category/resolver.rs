use std::collections::HashMap;

use contracts::domain::a002_category_group::CategoryGroup;
use once_cell::sync::Lazy;
use serde_json::Value;

/// Встроенный набор групп на случай пустой/битой конфигурации
pub static DEFAULT_CATEGORY_GROUPS: Lazy<Vec<CategoryGroup>> = Lazy::new(|| {
    vec![
        CategoryGroup::new("LOWBED", "LOWBED", &["LOWBED"]),
        CategoryGroup::new("12WHEEL_TRAILER", "12WHEEL + TRAILER", &["12WHEEL", "TRAILER"]),
        CategoryGroup::new("KSK", "KSK", &["KSK"]),
    ]
});

/// trim + upper-case
pub fn normalize_category_key(value: &str) -> String {
    value.trim().to_uppercase()
}

/// trim + lower-case (filter tokens)
pub fn normalize_category_value(value: &str) -> String {
    value.trim().to_lowercase()
}

/// String form of a loosely typed JSON scalar; None for null/objects/arrays
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty_field(group: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    group
        .get(key)
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())
}

/// Санитизация групп из JSON бэкенда
///
/// Non-objects are skipped, `id` falls back to `group` then `GROUP_<n>`,
/// labels to the id; an empty result yields the built-in default set.
pub fn sanitize_category_groups(raw: &[Value]) -> Vec<CategoryGroup> {
    let mut normalized = Vec::new();

    for (index, value) in raw.iter().enumerate() {
        let Some(group) = value.as_object() else {
            continue;
        };
        let id_source = non_empty_field(group, "id")
            .or_else(|| non_empty_field(group, "group"))
            .unwrap_or_else(|| format!("GROUP_{}", index + 1));
        let id = normalize_category_key(&id_source);
        if id.is_empty() {
            continue;
        }

        let label = ["label", "name"]
            .iter()
            .find_map(|key| group.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());

        let categories = group
            .get("categories")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(scalar_to_string)
                    .map(|c| normalize_category_key(&c))
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        normalized.push(CategoryGroup {
            id,
            label,
            categories,
        });
    }

    if normalized.is_empty() {
        return DEFAULT_CATEGORY_GROUPS.clone();
    }
    normalized
}

/// Активный набор групп и плоская таблица category -> group id
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    groups: Vec<CategoryGroup>,
    lookup: HashMap<String, String>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        let mut registry = Self {
            groups: Vec::new(),
            lookup: HashMap::new(),
        };
        registry.replace_groups(DEFAULT_CATEGORY_GROUPS.clone());
        registry
    }
}

impl CategoryRegistry {
    /// Replace the active set from raw backend JSON
    pub fn set_category_groups(&mut self, raw: &[Value]) {
        let groups = sanitize_category_groups(raw);
        tracing::debug!(
            "Category groups set: {}",
            groups.iter().map(|g| g.id.as_str()).collect::<Vec<_>>().join(", ")
        );
        self.replace_groups(groups);
    }

    /// Rebuilds the lookup in declaration order.
    ///
    /// A category claimed by two groups resolves to the group declared last.
    fn replace_groups(&mut self, groups: Vec<CategoryGroup>) {
        let mut lookup = HashMap::new();
        for group in &groups {
            for category in &group.categories {
                let key = normalize_category_key(category);
                if !key.is_empty() {
                    lookup.insert(key, group.id.clone());
                }
            }
        }
        self.groups = groups;
        self.lookup = lookup;
    }

    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    pub fn group_meta(&self, group_id: &str) -> Option<&CategoryGroup> {
        let id = normalize_category_key(group_id);
        if id.is_empty() {
            return None;
        }
        self.groups.iter().find(|g| g.id == id)
    }

    /// Group of a category; an unknown category is its own pseudo-group
    pub fn resolve_category_group_id(&self, category: &str) -> String {
        let key = normalize_category_key(category);
        if key.is_empty() {
            return String::new();
        }
        self.lookup.get(&key).cloned().unwrap_or(key)
    }

    /// Token as a group id first, then as a category; None when unresolved
    pub fn resolve_category_group_from_token(&self, token: &str) -> Option<String> {
        let key = normalize_category_key(token);
        if key.is_empty() {
            return None;
        }
        if self.groups.iter().any(|g| g.id == key) {
            return Some(key);
        }
        self.lookup.get(&key).cloned()
    }

    pub fn format_category_group_label(&self, group_id: &str) -> String {
        if group_id.is_empty() {
            return "Kategori".to_string();
        }
        if normalize_category_key(group_id) == "ALL" {
            return "Semua".to_string();
        }
        self.group_meta(group_id)
            .map(|g| g.label.clone())
            .unwrap_or_else(|| group_id.to_string())
    }
}
