//! Alert payload model and attribute resolution.
//!
//! An [`AlertPayload`] is the typed form of a single inbound alert: label and
//! annotation maps, top-level scalar fields (status, timestamps, generator URL,
//! fingerprint) and optional pre-flattened dotted keys such as
//! `"labels.instance"`. Rules address values inside it with dotted field paths
//! resolved by [`resolve`].

mod resolver;

pub use resolver::resolve;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Key of the label map inside a payload.
pub const LABELS: &str = "labels";
/// Key of the annotation map inside a payload.
pub const ANNOTATIONS: &str = "annotations";

/// A scalar value carried by an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<Scalar> for serde_json::Value {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Bool(b) => serde_json::Value::Bool(b),
            Scalar::Number(n) => serde_json::Value::Number(n),
            Scalar::String(s) => serde_json::Value::String(s),
        }
    }
}

/// A single alert as seen by the matching engine.
///
/// # Example
///
/// ```
/// use karo::alert::{resolve, AlertPayload};
///
/// let payload = AlertPayload::new()
///     .with_field("status", "firing")
///     .with_label("instance", "host1");
///
/// assert_eq!(resolve(&payload, "labels.instance").as_deref(), Some("host1"));
/// assert_eq!(resolve(&payload, "status").as_deref(), Some("firing"));
/// assert_eq!(resolve(&payload, "labels.missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertPayload {
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    fields: BTreeMap<String, Scalar>,
    flattened: BTreeMap<String, Scalar>,
}

impl AlertPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Set a top-level scalar field (e.g. `status`, `fingerprint`).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set a pre-flattened dotted key, looked up verbatim before path traversal.
    pub fn with_flattened(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.flattened.insert(key.into(), value.into());
        self
    }

    /// Add a `labels.<k>` / `annotations.<k>` flattened entry for every label
    /// and annotation currently present.
    pub fn flatten(mut self) -> Self {
        for (k, v) in &self.labels {
            self.flattened
                .insert(format!("{}.{}", LABELS, k), Scalar::String(v.clone()));
        }
        for (k, v) in &self.annotations {
            self.flattened
                .insert(format!("{}.{}", ANNOTATIONS, k), Scalar::String(v.clone()));
        }
        self
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<&Scalar> {
        self.fields.get(key)
    }

    pub fn flattened(&self, key: &str) -> Option<&Scalar> {
        self.flattened.get(key)
    }

    pub fn status(&self) -> Option<String> {
        self.field("status").map(Scalar::to_string)
    }

    /// The alert name carried in the `alertname` label, if any.
    pub fn alert_name(&self) -> Option<&str> {
        self.label("alertname")
    }

    /// Canonical JSON form: keys sorted, labels and annotations always present.
    pub fn to_json(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        for (k, v) in &self.fields {
            root.insert(k.clone(), v.clone().into());
        }
        for (k, v) in &self.flattened {
            root.insert(k.clone(), v.clone().into());
        }
        root.insert(LABELS.to_string(), string_map_json(&self.labels));
        root.insert(ANNOTATIONS.to_string(), string_map_json(&self.annotations));
        serde_json::Value::Object(root)
    }
}

pub(crate) fn string_map_json(map: &BTreeMap<String, String>) -> serde_json::Value {
    serde_json::Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
}

impl Serialize for AlertPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Wire form accepted when reading a payload from JSON or TOML.
#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    rest: BTreeMap<String, Scalar>,
}

impl<'de> Deserialize<'de> for AlertPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawPayload::deserialize(deserializer)?;
        let (flattened, fields) = raw.rest.into_iter().partition(|(k, _)| k.contains('.'));
        Ok(AlertPayload {
            labels: raw.labels,
            annotations: raw.annotations,
            fields,
            flattened,
        })
    }
}
