use crate::schema::definitions::{Returned, SCIM_SCHEMA_CORE_USER, USER_SCHEMA};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Query parameters for SCIM attribute filtering per RFC 7644 section 3.4.2.5
#[derive(Debug, Clone, Default)]
pub struct AttributeFilter {
    /// Attributes to return; overrides the default set when present
    pub attributes: Option<Vec<String>>,
    /// Attributes to drop from the default set
    pub excluded_attributes: Option<Vec<String>>,
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(normalize_path)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lowercased dotted path with any core User schema URN prefix removed
fn normalize_path(raw: &str) -> String {
    let raw = raw.trim();
    let prefix = format!("{}:", SCIM_SCHEMA_CORE_USER);
    let unqualified = match raw.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(&prefix) => &raw[prefix.len()..],
        _ => raw,
    };
    unqualified.to_lowercase()
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_lowercase()
    } else {
        format!("{}.{}", prefix, key.to_lowercase())
    }
}

/// Top-level attributes that no parameter can remove
fn is_always_returned(path: &str) -> bool {
    path == "schemas"
        || USER_SCHEMA
            .attributes
            .iter()
            .any(|a| a.returned == Returned::Always && a.name.eq_ignore_ascii_case(path))
}

impl AttributeFilter {
    /// Parse attributes and excludedAttributes query parameters
    pub fn from_params(attributes: Option<&str>, excluded_attributes: Option<&str>) -> Self {
        Self {
            attributes: attributes.map(split_list).filter(|l| !l.is_empty()),
            excluded_attributes: excluded_attributes.map(split_list).filter(|l| !l.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_none() && self.excluded_attributes.is_none()
    }

    /// Apply attribute filtering to a projected resource. `attributes`
    /// wins over `excludedAttributes` when both are given.
    pub fn apply_to_resource(&self, resource: &Value) -> Value {
        let resource = Self::remove_null_fields(resource);

        if let Some(attrs) = &self.attributes {
            let included: HashSet<&str> = attrs.iter().map(String::as_str).collect();
            return Self::keep_included(&resource, "", &included);
        }
        if let Some(excluded) = &self.excluded_attributes {
            let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
            return Self::drop_excluded(&resource, "", &excluded);
        }
        resource
    }

    fn keep_included(value: &Value, prefix: &str, included: &HashSet<&str>) -> Value {
        match value {
            Value::Object(obj) => {
                let mut filtered = Map::new();
                for (key, val) in obj {
                    let path = join_path(prefix, key);
                    let always = prefix.is_empty() && is_always_returned(&path);
                    if always || included.contains(path.as_str()) {
                        filtered.insert(key.clone(), val.clone());
                    } else if val.is_object() || val.is_array() {
                        let nested = format!("{}.", path);
                        if included.iter().any(|p| p.starts_with(&nested)) {
                            let kept = Self::keep_included(val, &path, included);
                            if !Self::is_empty_container(&kept) {
                                filtered.insert(key.clone(), kept);
                            }
                        }
                    }
                }
                Value::Object(filtered)
            }
            // Elements of a multi-valued attribute share its path
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| Self::keep_included(item, prefix, included))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    fn drop_excluded(value: &Value, prefix: &str, excluded: &HashSet<&str>) -> Value {
        match value {
            Value::Object(obj) => {
                let mut filtered = Map::new();
                for (key, val) in obj {
                    let path = join_path(prefix, key);
                    let always = prefix.is_empty() && is_always_returned(&path);
                    if excluded.contains(path.as_str()) && !always {
                        continue;
                    }
                    let nested = format!("{}.", path);
                    if !always && excluded.iter().any(|p| p.starts_with(&nested)) {
                        filtered.insert(key.clone(), Self::drop_excluded(val, &path, excluded));
                    } else {
                        filtered.insert(key.clone(), val.clone());
                    }
                }
                Value::Object(filtered)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| Self::drop_excluded(item, prefix, excluded))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    fn is_empty_container(value: &Value) -> bool {
        match value {
            Value::Object(obj) => obj.is_empty(),
            Value::Array(items) => items.iter().all(Self::is_empty_container),
            _ => false,
        }
    }

    /// Remove null fields, empty objects and empty arrays. Unassigned
    /// attributes are not included in SCIM responses.
    pub fn remove_null_fields(value: &Value) -> Value {
        match value {
            Value::Object(obj) => {
                let mut filtered = Map::new();
                for (key, val) in obj {
                    let cleaned = Self::remove_null_fields(val);
                    let keep = match &cleaned {
                        Value::Null => false,
                        Value::Object(inner) => !inner.is_empty(),
                        Value::Array(items) => !items.is_empty(),
                        _ => true,
                    };
                    if keep {
                        filtered.insert(key.clone(), cleaned);
                    }
                }
                Value::Object(filtered)
            }
            Value::Array(arr) => Value::Array(
                arr.iter()
                    .map(Self::remove_null_fields)
                    .filter(|item| match item {
                        Value::Null => false,
                        Value::Object(obj) => !obj.is_empty(),
                        _ => true,
                    })
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}
