use contracts::domain::a001_driver::Driver;
use contracts::usecases::u102_capacity::CapacityFilterView;
use serde::Deserialize;

use super::resolver::{normalize_category_key, normalize_category_value, CategoryRegistry};

/// Источник токенов фильтра категорий
///
/// Each provider is a pure function returning raw token strings; they may
/// still contain `,` or `|` separated lists.
pub trait FilterTokenProvider: Send + Sync {
    fn source(&self) -> &'static str;
    fn raw_tokens(&self) -> Vec<String>;
}

/// Static filter configured on the driver selector
#[derive(Debug, Clone, Default)]
pub struct SelectorDatasetFilter(pub String);

impl FilterTokenProvider for SelectorDatasetFilter {
    fn source(&self) -> &'static str {
        "selector_dataset"
    }

    fn raw_tokens(&self) -> Vec<String> {
        non_empty(&self.0)
    }
}

/// Free-text filter input
#[derive(Debug, Clone, Default)]
pub struct TextInputFilter(pub String);

impl FilterTokenProvider for TextInputFilter {
    fn source(&self) -> &'static str {
        "text_input"
    }

    fn raw_tokens(&self) -> Vec<String> {
        non_empty(&self.0)
    }
}

/// A node tagged as a category filter: `categories` attribute, then its
/// value, then its text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaggedFilterNode {
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TaggedFilterNode {
    fn token(&self) -> Option<String> {
        match &self.categories {
            Some(c) if !c.is_empty() => Some(c.clone()),
            _ => self.value.clone().or_else(|| self.text.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaggedNodesFilter(pub Vec<TaggedFilterNode>);

impl FilterTokenProvider for TaggedNodesFilter {
    fn source(&self) -> &'static str {
        "tagged_nodes"
    }

    fn raw_tokens(&self) -> Vec<String> {
        self.0.iter().filter_map(TaggedFilterNode::token).collect()
    }
}

/// `driver_category` (all), `driver_categories` (all), `driverCategoryFilter` (first)
#[derive(Debug, Clone, Default)]
pub struct QueryParamFilter {
    query: String,
}

impl QueryParamFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

impl FilterTokenProvider for QueryParamFilter {
    fn source(&self) -> &'static str {
        "query_params"
    }

    fn raw_tokens(&self) -> Vec<String> {
        let query = self.query.trim_start_matches('?');
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let all = |key: &str| -> Vec<String> {
            pairs
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .collect()
        };

        let mut values = all("driver_category");
        values.extend(all("driver_categories"));
        values.extend(all("driverCategoryFilter").into_iter().take(1));
        values.retain(|v| !v.is_empty());
        values
    }
}

fn non_empty(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// Split on `,` or `|`, lower-case, drop empties
pub fn split_category_tokens(input: &str) -> Vec<String> {
    input
        .split([',', '|'])
        .map(normalize_category_value)
        .filter(|t| !t.is_empty())
        .collect()
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Упорядоченный список источников фильтра (порядок = приоритет)
#[derive(Default)]
pub struct FilterSources {
    providers: Vec<Box<dyn FilterTokenProvider>>,
}

impl FilterSources {
    pub fn new(providers: Vec<Box<dyn FilterTokenProvider>>) -> Self {
        Self { providers }
    }

    /// selector dataset, text input, tagged nodes, URL query
    pub fn standard(
        selector_filter: &str,
        text_input: &str,
        tagged: Vec<TaggedFilterNode>,
        query: &str,
    ) -> Self {
        Self::new(vec![
            Box::new(SelectorDatasetFilter(selector_filter.to_string())),
            Box::new(TextInputFilter(text_input.to_string())),
            Box::new(TaggedNodesFilter(tagged)),
            Box::new(QueryParamFilter::new(query)),
        ])
    }

    pub fn sources(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    /// collectHiddenCategoryFilters + hasFilter
    pub fn collect(&self, registry: &CategoryRegistry) -> CapacityFilterState {
        let mut tokens = Vec::new();
        for provider in &self.providers {
            for raw in provider.raw_tokens() {
                for token in split_category_tokens(&raw) {
                    push_unique(&mut tokens, token);
                }
            }
        }

        let mut groups = Vec::new();
        let mut categories = Vec::new();
        for token in &tokens {
            match registry.resolve_category_group_from_token(token) {
                Some(group_id) => {
                    if let Some(meta) = registry.group_meta(&group_id) {
                        for category in &meta.categories {
                            let value = normalize_category_value(category);
                            if !value.is_empty() {
                                push_unique(&mut categories, value);
                            }
                        }
                    }
                    push_unique(&mut groups, group_id);
                }
                None => push_unique(&mut categories, token.clone()),
            }
        }

        let has_filter = !categories.is_empty() || !groups.is_empty();
        CapacityFilterState {
            tokens,
            categories,
            groups,
            has_filter,
        }
    }
}

/// Derived filter state; recomputed on every use, never stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityFilterState {
    pub tokens: Vec<String>,
    pub categories: Vec<String>,
    pub groups: Vec<String>,
    pub has_filter: bool,
}

impl CapacityFilterState {
    /// First group of the filter, else the first token resolvable to a group
    pub fn filtered_group(&self, registry: &CategoryRegistry) -> Option<String> {
        if !self.has_filter {
            return None;
        }
        if let Some(first) = self.groups.first() {
            return Some(first.clone());
        }
        self.tokens
            .iter()
            .find_map(|t| registry.resolve_category_group_from_token(t))
    }

    pub fn matches_driver(&self, driver: &Driver) -> bool {
        if !driver.active {
            return false;
        }
        if !self.has_filter {
            return true;
        }
        let category = normalize_category_value(&driver.category);
        !category.is_empty() && self.categories.contains(&category)
    }

    pub fn to_view(&self) -> CapacityFilterView {
        CapacityFilterView {
            tokens: self.tokens.clone(),
            categories: self.categories.clone(),
            groups: self.groups.clone(),
            has_filter: self.has_filter,
        }
    }
}

/// Группа для маршрутизации и ёмкости
///
/// Precedence: active filter group, first resolvable filter token, the
/// driver's own group, then `default_group`. A filter always overrides the driver.
pub fn resolve_effective_category_group(
    registry: &CategoryRegistry,
    filter: &CapacityFilterState,
    driver: Option<&Driver>,
    default_group: &str,
) -> String {
    if let Some(group) = filter.filtered_group(registry) {
        return normalize_category_key(&group);
    }
    if let Some(driver) = driver {
        let group = registry.resolve_category_group_id(&driver.category);
        if !group.is_empty() {
            return normalize_category_key(&group);
        }
    }
    normalize_category_key(default_group)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(text: &str, query: &str) -> FilterSources {
        FilterSources::standard("", text, Vec::new(), query)
    }

    #[test]
    fn test_split_tokens() {
        assert_eq!(
            split_category_tokens(" Lowbed|KSK, ,trailer "),
            vec!["lowbed", "ksk", "trailer"]
        );
    }

    #[test]
    fn test_sources_keep_precedence_and_dedupe() {
        let registry = CategoryRegistry::default();
        let filter = FilterSources::standard(
            "ksk",
            "lowbed,KSK",
            vec![TaggedFilterNode {
                categories: None,
                value: Some("crane".into()),
                text: Some("ignored".into()),
            }],
            "driver_category=trailer&driverCategoryFilter=tipper&driverCategoryFilter=second",
        )
        .collect(&registry);

        assert_eq!(filter.tokens, vec!["ksk", "lowbed", "crane", "trailer", "tipper"]);
        assert_eq!(filter.groups, vec!["KSK", "LOWBED", "12WHEEL_TRAILER"]);
        assert_eq!(
            filter.categories,
            vec!["ksk", "lowbed", "crane", "12wheel", "trailer", "tipper"]
        );
        assert!(filter.has_filter);
    }

    #[test]
    fn test_tagged_node_prefers_categories_attribute() {
        let nodes = TaggedNodesFilter(vec![
            TaggedFilterNode {
                categories: Some("ksk".into()),
                value: Some("lowbed".into()),
                text: None,
            },
            TaggedFilterNode {
                categories: Some(String::new()),
                value: None,
                text: Some("trailer".into()),
            },
        ]);
        assert_eq!(nodes.raw_tokens(), vec!["ksk", "trailer"]);
    }

    #[test]
    fn test_no_sources_no_filter() {
        let registry = CategoryRegistry::default();
        let filter = sources("", "").collect(&registry);
        assert!(!filter.has_filter);
        assert_eq!(filter.filtered_group(&registry), None);
    }

    #[test]
    fn test_filter_overrides_driver() {
        let registry = CategoryRegistry::default();
        let lowbed_driver = Driver::new("D1", "Ali", "LOWBED");
        for token in ["ksk", "KSK", "trailer", "12wheel_trailer", "lowbed"] {
            let filter = sources(token, "").collect(&registry);
            let expected = registry.resolve_category_group_from_token(token).unwrap();
            assert_eq!(
                resolve_effective_category_group(&registry, &filter, Some(&lowbed_driver), "KSK"),
                expected
            );
            assert_eq!(
                resolve_effective_category_group(&registry, &filter, None, "KSK"),
                expected
            );
        }
    }

    #[test]
    fn test_driver_then_default() {
        let registry = CategoryRegistry::default();
        let no_filter = sources("", "").collect(&registry);
        let driver = Driver::new("D1", "Ali", "12wheel");
        assert_eq!(
            resolve_effective_category_group(&registry, &no_filter, Some(&driver), "KSK"),
            "12WHEEL_TRAILER"
        );
        assert_eq!(
            resolve_effective_category_group(&registry, &no_filter, None, "ksk"),
            "KSK"
        );

        // unresolvable filter token: filter exists but yields no group
        let unresolved = sources("crane", "").collect(&registry);
        assert!(unresolved.has_filter);
        assert_eq!(
            resolve_effective_category_group(&registry, &unresolved, Some(&driver), "KSK"),
            "12WHEEL_TRAILER"
        );
    }

    #[test]
    fn test_driver_matching() {
        let registry = CategoryRegistry::default();
        let filter = sources("12wheel_trailer", "").collect(&registry);
        let trailer = Driver::new("D1", "Ali", "TRAILER");
        let ksk = Driver::new("D2", "Abu", "KSK");
        let mut inactive = Driver::new("D3", "Chan", "TRAILER");
        inactive.active = false;

        assert!(filter.matches_driver(&trailer));
        assert!(!filter.matches_driver(&ksk));
        assert!(!filter.matches_driver(&inactive));

        let none = sources("", "").collect(&registry);
        assert!(none.matches_driver(&ksk));
        assert!(!none.matches_driver(&inactive));
    }
}
