//! Build settings attached to projects and targets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single build setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// A scalar value.
    String(String),
    /// A list value.
    Array(Vec<String>),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::String(value) => f.write_str(value),
            SettingValue::Array(values) => f.write_str(&values.join(" ")),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

/// Base settings plus per-configuration overrides.
///
/// Both levels are `BTreeMap`s so iteration order is always key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Settings shared by every configuration.
    #[serde(default)]
    pub base: BTreeMap<String, SettingValue>,
    /// Overrides keyed by configuration name (e.g. `Debug`).
    #[serde(default)]
    pub configurations: BTreeMap<String, BTreeMap<String, SettingValue>>,
}

impl Settings {
    /// Adds a base setting.
    pub fn with_base(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.base.insert(key.into(), value.into());
        self
    }

    /// Adds a setting override for one configuration.
    pub fn with_configuration(
        mut self,
        configuration: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<SettingValue>,
    ) -> Self {
        self.configurations
            .entry(configuration.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Returns `true` if neither base settings nor overrides exist.
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.configurations.values().all(BTreeMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_value_displays_space_separated() {
        let value = SettingValue::Array(vec!["-ObjC".to_string(), "-lz".to_string()]);
        assert_eq!(value.to_string(), "-ObjC -lz");
    }

    #[test]
    fn untagged_value_deserializes_both_shapes() {
        let settings: Settings = serde_json::from_str(
            r#"{"base": {"A": "1", "B": ["x", "y"]}, "configurations": {"Debug": {"C": "2"}}}"#,
        )
        .unwrap();
        assert_eq!(settings.base["A"], SettingValue::from("1"));
        assert!(matches!(settings.base["B"], SettingValue::Array(_)));
        assert_eq!(settings.configurations["Debug"].len(), 1);
    }

    #[test]
    fn empty_overrides_count_as_empty() {
        let mut settings = Settings::default();
        settings.configurations.insert("Release".to_string(), BTreeMap::new());
        assert!(settings.is_empty());
        assert!(!settings.with_base("K", "v").is_empty());
    }
}
