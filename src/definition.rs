//! Wire model consumed by the filter runtime.
//!
//! A [`FeatureDefinition`] is the evaluation-ready shape of a flag: a name, a
//! [`DefinitionStatus`], a requirement type, and an ordered list of named,
//! parameterized filter configurations. This is also the JSON format served by
//! the remote flag service (`GET /features`, `GET /feature/{name}`).

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::flags::{RequirementType, Timestamp};

/// Runtime-facing status of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefinitionStatus {
    /// The master switch is off; the flag never evaluates to enabled.
    Disabled,
    /// Enablement is decided by the filter list.
    Conditional,
}

/// An evaluation-ready flag definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDefinition {
    pub name: String,
    /// Filter configurations, in stored filter order.
    #[serde(rename = "enabledFor", default)]
    pub enabled_for: Vec<FilterConfiguration>,
    pub requirement_type: RequirementType,
    pub status: DefinitionStatus,
    /// Variant allocation, passed through opaquely for runtimes that use it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<serde_json::Value>,
}

impl FeatureDefinition {
    /// The defined "not found" definition: just the name, no filters.
    ///
    /// Looking up an unknown flag is a valid domain outcome, not an error, so
    /// providers return this instead of failing.
    pub fn empty(name: impl Into<String>) -> FeatureDefinition {
        FeatureDefinition {
            name: name.into(),
            enabled_for: Vec::new(),
            requirement_type: RequirementType::Any,
            status: DefinitionStatus::Disabled,
            allocation: None,
            variants: None,
            telemetry: None,
        }
    }
}

/// A named filter with its flattened string parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfiguration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
}

impl FilterConfiguration {
    pub fn new(name: impl Into<String>) -> FilterConfiguration {
        FilterConfiguration {
            name: name.into(),
            parameters: Parameters::new(),
        }
    }
}

/// An insertion-ordered string-to-string map.
///
/// Mapping must be deterministic down to output ordering, so parameters keep
/// the order they were inserted in. On the wire this is a plain JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    pub fn new() -> Parameters {
        Parameters::default()
    }

    /// Append a key/value pair, keeping insertion order.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Look up a value by key. Linear scan; parameter lists are small.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Parameters {
        Parameters(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Parameters, D::Error> {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = Parameters;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of string parameters")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Parameters, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    entries.push((key, value));
                }
                Ok(Parameters(entries))
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}

/// `TryParse` allows a subfield to fail parsing without failing the parsing of
/// the whole structure.
///
/// Used for the remote `/features` payload so one malformed flag does not
/// poison the rest of the response.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum TryParse<T> {
    /// Successfully parsed.
    Parsed(T),
    /// Parsing failed.
    ParseFailed(serde_json::Value),
}

impl<T> From<TryParse<T>> for Option<T> {
    fn from(value: TryParse<T>) -> Self {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}

/// Render a timestamp as an RFC-1123 fixed string, e.g.
/// `"Fri, 29 Aug 2025 00:00:00 GMT"`. This is the spelling the filter runtime
/// expects for `Start`/`End` and recurrence end dates.
pub fn format_rfc1123(timestamp: &Timestamp) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
