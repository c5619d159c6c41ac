//! Bucket metadata as exchanged with the storage API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Action type that deletes matching objects
pub const DELETE_ACTION: &str = "Delete";

/// Action type that moves matching objects to another storage class
pub const SET_STORAGE_CLASS_ACTION: &str = "SetStorageClass";

/// Metadata of a bucket as returned by a single read
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSnapshot {
    /// Bucket name
    pub name: String,

    /// Location constraint (e.g. "EU")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Default storage class for new objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// User labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Lifecycle configuration
    #[serde(default, skip_serializing_if = "Lifecycle::is_empty")]
    pub lifecycle: Lifecycle,

    /// Metadata generation, bumped on every metadata change
    #[serde(default, skip_serializing_if = "Option::is_none", with = "int64_string")]
    pub metageneration: Option<i64>,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,

    /// Last metadata update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl BucketSnapshot {
    /// Default snapshot for a bucket that does not exist yet
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Replace the lifecycle configuration
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Check that this snapshot is acceptable as a desired state for `bucket`
    pub fn validate_desired(&self, bucket: &str) -> std::result::Result<(), String> {
        if self.name != bucket {
            return Err(format!(
                "desired state names bucket {:?} instead of {:?}",
                self.name, bucket
            ));
        }

        for (index, rule) in self.lifecycle.rule.iter().enumerate() {
            if rule.action.action_type.trim().is_empty() {
                return Err(format!("lifecycle rule {} has no action type", index));
            }
            if rule.action.action_type == SET_STORAGE_CLASS_ACTION && rule.action.storage_class.is_none() {
                return Err(format!("lifecycle rule {} changes storage class without naming one", index));
            }
            if rule.condition.is_empty() {
                return Err(format!("lifecycle rule {} has no condition", index));
            }
        }

        Ok(())
    }
}

/// Lifecycle configuration: a list of rules applied by the storage service
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    #[serde(default)]
    pub rule: Vec<LifecycleRule>,
}

impl Lifecycle {
    /// Create a lifecycle from rules
    pub fn new(rules: Vec<LifecycleRule>) -> Self {
        Self { rule: rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rule.is_empty()
    }
}

/// A single lifecycle rule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRule {
    pub action: RuleAction,
    #[serde(default)]
    pub condition: RuleCondition,
}

impl LifecycleRule {
    /// Delete objects older than `days`
    pub fn delete_after_days(days: u32) -> Self {
        Self {
            action: RuleAction::delete(),
            condition: RuleCondition {
                age: Some(days),
                ..Default::default()
            },
        }
    }
}

/// What a lifecycle rule does
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

impl RuleAction {
    pub fn delete() -> Self {
        Self {
            action_type: DELETE_ACTION.to_string(),
            storage_class: None,
        }
    }

    pub fn set_storage_class(class: impl Into<String>) -> Self {
        Self {
            action_type: SET_STORAGE_CLASS_ACTION.to_string(),
            storage_class: Some(class.into()),
        }
    }
}

/// When a lifecycle rule applies
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    /// Object age in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Date (YYYY-MM-DD) before which objects were created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_newer_versions: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches_storage_class: Vec<String>,
}

impl RuleCondition {
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.created_before.is_none()
            && self.is_live.is_none()
            && self.num_newer_versions.is_none()
            && self.matches_storage_class.is_empty()
    }
}

// The storage API encodes int64 fields as JSON strings.
mod int64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(value: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&v.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Option::<Repr>::deserialize(d)? {
            None => Ok(None),
            Some(Repr::Number(n)) => Ok(Some(n)),
            Some(Repr::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
