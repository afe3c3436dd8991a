use anyhow::Result;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Name of the one field every record is guaranteed to carry.
pub const CLUSTER_FIELD: &str = "Cluster";

/// Segment id assigned by the segmentation service.
///
/// Ordering is numeric, so `2 < 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub i64);

impl ClusterId {
    /// Display label used by charts and legends, e.g. `Cluster 3`.
    #[must_use]
    pub fn label(self) -> String {
        format!("Cluster {}", self.0)
    }

    /// Parses an insight map key. Only canonical non-negative integers count:
    /// no sign, no padding, no leading zero other than `0` itself.
    #[must_use]
    pub fn parse_key(key: &str) -> Option<Self> {
        let canonical = !key.is_empty()
            && key.bytes().all(|b| b.is_ascii_digit())
            && (key == "0" || !key.starts_with('0'));
        if !canonical {
            return None;
        }
        key.parse().ok().map(Self)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClusterId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// One customer row plus its cluster assignment.
///
/// The field set is whatever the service sent; only `Cluster` is required.
/// Field order follows the payload, which schema inference depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Cluster")]
    pub cluster: ClusterId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(cluster: ClusterId) -> Self {
        Self {
            cluster,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Field names in payload order, excluding `Cluster`.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Numeric value of a field. Strings, booleans and nulls are not coerced.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }
}

/// Per-cluster summary produced by the segmentation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Stat names are not stable across service versions.
    #[serde(default)]
    pub stats: Map<String, Value>,
}

/// Insights keyed by the string form of the cluster id, in payload order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightMap {
    entries: Vec<(String, Insight)>,
}

impl InsightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, insight: Insight) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = insight,
            None => self.entries.push((key, insight)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Insight> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, insight)| insight)
    }

    /// Looks up the entry whose key is exactly the id's decimal form.
    pub fn for_cluster(&self, cluster: ClusterId) -> Option<&Insight> {
        self.get(&cluster.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Insight)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Insight)> for InsightMap {
    fn from_iter<I: IntoIterator<Item = (K, Insight)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, insight) in iter {
            map.insert(key, insight);
        }
        map
    }
}

impl Serialize for InsightMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, insight) in &self.entries {
            map.serialize_entry(key, insight)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for InsightMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = InsightMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from cluster id to insight")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<InsightMap, A::Error> {
                let mut map = InsightMap {
                    entries: Vec::with_capacity(access.size_hint().unwrap_or(0)),
                };
                while let Some((key, insight)) = access.next_entry::<String, Insight>()? {
                    map.insert(key, insight);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Everything one refresh fetches from the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub records: Vec<Record>,
    pub insights: InsightMap,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
