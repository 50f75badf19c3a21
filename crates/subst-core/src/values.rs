//! Values handling with deep merge support

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value as YamlValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Nested substitution values with deep merge capability
///
/// Wraps a `serde_json::Value` so that scalars, sequences and mappings are
/// distinct variants and the merge rules below can be expressed by matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(Map::new()))
    }

    /// Load a mapping from a YAML file
    ///
    /// An empty document yields empty values. Anything other than a mapping at
    /// the top level is rejected with [`CoreError::NotAMapping`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let value = parse_yaml(&content, path)?;

        match value {
            JsonValue::Object(_) => Ok(Self(value)),
            JsonValue::Null => Ok(Self::new()),
            _ => Err(CoreError::NotAMapping {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(Self(parse_yaml(yaml, Path::new("<inline>"))?))
    }

    /// Build values from an existing JSON mapping
    pub fn from_map(map: Map<String, JsonValue>) -> Self {
        Self(JsonValue::Object(map))
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Mappings on both sides: recursive merge
    /// - Anything else (scalars, sequences, mismatched types): overlay replaces base
    ///
    /// Merge order matters: the last merged source wins at every key path.
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Merge multiple values in order
    pub fn merge_all(values: Vec<Values>) -> Self {
        let mut result = Values::new();
        for v in values {
            result.merge(&v);
        }
        result
    }

    /// Set a value by dotted path (e.g., "image.tag")
    pub fn set(&mut self, path: &str, value: JsonValue) {
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Top-level mapping, if these values are one
    pub fn as_map(&self) -> Option<&Map<String, JsonValue>> {
        self.0.as_object()
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.as_map().map_or(0, Map::len)
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Render as a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.0).map_err(|e| CoreError::yaml("<context>", e))
    }
}

/// Parse a YAML document, expanding `<<` merge keys
fn parse_yaml(content: &str, path: &Path) -> Result<JsonValue> {
    let mut value: YamlValue =
        serde_yaml::from_str(content).map_err(|e| CoreError::yaml(path, e))?;
    value.apply_merge().map_err(|e| CoreError::yaml(path, e))?;
    Ok(serde_json::to_value(value)?)
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Set a nested value by path
fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if !value.is_object() {
        *value = JsonValue::Object(Map::new());
    }

    if let JsonValue::Object(map) = value {
        if remaining.is_empty() {
            map.insert((*key).to_string(), new_value);
        } else {
            let entry = map
                .entry((*key).to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            set_nested(entry, remaining, new_value);
        }
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge() {
        let mut base = Values::from_yaml(
            r#"
image:
  repository: nginx
  tag: "1.0"
replicas: 1
"#,
        )
        .unwrap();

        let overlay = Values::from_yaml(
            r#"
image:
  tag: "2.0"
  pullPolicy: Always
replicas: 3
"#,
        )
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.get("image.repository").unwrap(), "nginx");
        assert_eq!(base.get("image.tag").unwrap(), "2.0");
        assert_eq!(base.get("image.pullPolicy").unwrap(), "Always");
        assert_eq!(base.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_nested_mappings_combine() {
        let mut values = Values(json!({"a": {"x": 1}}));
        values.merge(&Values(json!({"a": {"y": 2}})));

        assert_eq!(values.0, json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_scalar_replaced_by_mapping() {
        let mut values = Values(json!({"a": 1}));
        values.merge(&Values(json!({"a": {"x": 1}})));

        assert_eq!(values.0, json!({"a": {"x": 1}}));
    }

    #[test]
    fn test_mapping_replaced_by_scalar() {
        let mut values = Values(json!({"a": {"x": 1}}));
        values.merge(&Values(json!({"a": "flat"})));

        assert_eq!(values.0, json!({"a": "flat"}));
    }

    #[test]
    fn test_sequences_are_replaced_not_appended() {
        let mut values = Values(json!({"hosts": ["a", "b"]}));
        values.merge(&Values(json!({"hosts": ["c"]})));

        assert_eq!(values.0, json!({"hosts": ["c"]}));
    }

    #[test]
    fn test_merge_order_matters() {
        let first = Values(json!({"env": "dev", "shared": {"a": 1}}));
        let second = Values(json!({"env": "prod", "shared": {"b": 2}}));

        let forward = Values::merge_all(vec![first.clone(), second.clone()]);
        let backward = Values::merge_all(vec![second, first]);

        assert_eq!(forward.get("env").unwrap(), "prod");
        assert_eq!(backward.get("env").unwrap(), "dev");
        // Disjoint nested keys combine either way
        assert_eq!(forward.get("shared"), backward.get("shared"));
    }

    #[test]
    fn test_merge_into_null_base() {
        let mut values = Values(JsonValue::Null);
        values.merge(&Values(json!({"a": 1})));

        assert_eq!(values.0, json!({"a": 1}));
    }

    #[test]
    fn test_set_nested() {
        let mut values = Values::new();
        values.set("image.tag", JsonValue::String("v1".into()));
        values.set("replicas", JsonValue::Number(3.into()));

        assert_eq!(values.get("image.tag").unwrap(), "v1");
        assert_eq!(values.get("replicas").unwrap(), 3);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_from_file_rejects_sequence() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("subst.yaml");
        std::fs::write(&path, "- a\n- b\n").unwrap();

        let err = Values::from_file(&path).unwrap_err();
        assert!(matches!(err, CoreError::NotAMapping { .. }));
    }

    #[test]
    fn test_from_file_expands_merge_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("subst.yaml");
        std::fs::write(
            &path,
            "base: &base\n  a: 1\n  b: 1\nderived:\n  <<: *base\n  b: 2\n  c: 3\n",
        )
        .unwrap();

        let values = Values::from_file(&path).unwrap();

        assert_eq!(values.get("derived"), Some(&json!({"a": 1, "b": 2, "c": 3})));
        assert!(values.get("derived.<<").is_none());
    }

    #[test]
    fn test_from_file_empty_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("subst.yaml");
        std::fs::write(&path, "").unwrap();

        let values = Values::from_file(&path).unwrap();
        assert!(values.is_empty());
    }
}
