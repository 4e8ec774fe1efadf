use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::repositories::errors::record_store_errors::RecordStoreError;

/// Which slice of a record a field lives in.
///
/// Public fields are readable by every client, private fields only by the
/// coordinators (club admin, pending approvals) and protected fields only by
/// the owning player (their club index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Public,
    Private,
    Protected,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Public => "public",
            Partition::Private => "private",
            Partition::Protected => "protected",
        }
    }
}

/// Condition a field write must satisfy for the store to accept it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The field must not exist yet.
    Absent,
    /// The field's current version token must equal this one.
    Version(String),
    /// Unconditional write.
    Any,
}

/// A field value together with the version token it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedField<T> {
    pub value: T,
    pub version: String,
}

impl<T> VersionedField<T> {
    pub fn precondition(&self) -> Precondition {
        Precondition::Version(self.version.clone())
    }
}

/// Result of a field read: every requested field that exists, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: HashMap<String, VersionedField<Value>>,
}

impl FieldSet {
    pub fn new(fields: HashMap<String, VersionedField<Value>>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<VersionedField<T>>, RecordStoreError> {
        match self.fields.get(name) {
            Some(field) => {
                let value = serde_json::from_value(field.value.clone()).map_err(|e| {
                    RecordStoreError::Serialization(format!("field {}: {}", name, e))
                })?;
                Ok(Some(VersionedField {
                    value,
                    version: field.version.clone(),
                }))
            }
            None => Ok(None),
        }
    }

    /// Reads a field, falling back to the type default when it was never
    /// written. The returned precondition guards the next write either way.
    pub fn value_or_default<T: DeserializeOwned + Default>(
        &self,
        name: &str,
    ) -> Result<(T, Precondition), RecordStoreError> {
        Ok(match self.get::<T>(name)? {
            Some(field) => {
                let precondition = field.precondition();
                (field.value, precondition)
            }
            None => (T::default(), Precondition::Absent),
        })
    }

    pub fn precondition(&self, name: &str) -> Precondition {
        match self.fields.get(name) {
            Some(field) => Precondition::Version(field.version.clone()),
            None => Precondition::Absent,
        }
    }
}

/// One field of a batched write.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWrite {
    pub partition: Partition,
    pub field: String,
    pub value: Value,
    pub precondition: Precondition,
}

impl FieldWrite {
    pub fn new<T: Serialize>(
        partition: Partition,
        field: &str,
        value: &T,
        precondition: Precondition,
    ) -> Result<Self, RecordStoreError> {
        let value = serde_json::to_value(value)
            .map_err(|e| RecordStoreError::Serialization(format!("field {}: {}", field, e)))?;
        Ok(FieldWrite {
            partition,
            field: field.to_string(),
            value,
            precondition,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ge,
    Le,
    BeginsWith,
}

/// Filter over an indexed field for record queries.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
    pub op: FilterOp,
}

impl FieldFilter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        FieldFilter {
            field: field.to_string(),
            value: value.into(),
            op: FilterOp::Eq,
        }
    }

    pub fn begins_with(field: &str, prefix: &str) -> Self {
        FieldFilter {
            field: field.to_string(),
            value: Value::String(prefix.to_string()),
            op: FilterOp::BeginsWith,
        }
    }

    pub fn matches(&self, candidate: Option<&Value>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };
        match self.op {
            FilterOp::Eq => candidate == &self.value,
            FilterOp::BeginsWith => match (candidate.as_str(), self.value.as_str()) {
                (Some(candidate), Some(prefix)) => candidate.starts_with(prefix),
                _ => false,
            },
            FilterOp::Ge | FilterOp::Le => {
                let ordering = match (candidate, &self.value) {
                    (Value::String(a), Value::String(b)) => a.partial_cmp(b),
                    (Value::Number(a), Value::Number(b)) => {
                        a.as_f64().partial_cmp(&b.as_f64())
                    }
                    _ => None,
                };
                match (self.op, ordering) {
                    (FilterOp::Ge, Some(ord)) => ord.is_ge(),
                    (FilterOp::Le, Some(ord)) => ord.is_le(),
                    _ => false,
                }
            }
        }
    }
}

/// One record returned by a query, with only the projected fields.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    pub record_id: String,
    pub fields: HashMap<String, Value>,
}

impl QueryRow {
    pub fn get<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, RecordStoreError> {
        match self.fields.get(name) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| RecordStoreError::Serialization(format!("field {}: {}", name, e))),
            None => Ok(T::default()),
        }
    }
}
