//! Flattens `node { <field> { ... } }` wrappers into records.

use footfall_common::{FootfallError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Extracts the record held under one node field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordNormalizer {
    field: &'static str,
    key_field: Option<&'static str>,
}

impl RecordNormalizer {
    /// Normalizer for records wrapped in `field`.
    pub const fn new(field: &'static str) -> Self {
        Self {
            field,
            key_field: None,
        }
    }

    /// Drops records whose `key_field` is `null` or absent instead of
    /// decoding them.
    pub const fn keyed_by(mut self, key_field: &'static str) -> Self {
        self.key_field = Some(key_field);
        self
    }

    /// Unwraps and decodes every node, preserving order.
    ///
    /// A `null` record is skipped, as is a record without its key when a key
    /// field is set. A node without the field, or a record that does not
    /// decode into `T`, is a malformed response. Error paths index the
    /// non-null nodes handed over by the executor.
    pub fn normalize<T: DeserializeOwned>(&self, nodes: Vec<Value>) -> Result<Vec<T>> {
        let mut records = Vec::with_capacity(nodes.len());
        let mut skipped = 0usize;
        let mut unkeyed = 0usize;

        for (index, node) in nodes.into_iter().enumerate() {
            let path = format!("nodes[{index}].{}", self.field);
            let Value::Object(mut object) = node else {
                return Err(FootfallError::malformed_at("Node is not an object", path));
            };

            match object.remove(self.field) {
                None => {
                    return Err(FootfallError::malformed_at(
                        format!("Node is missing '{}'", self.field),
                        path,
                    ))
                }
                Some(Value::Null) => skipped += 1,
                Some(record) if self.lacks_key(&record) => unkeyed += 1,
                Some(record) => {
                    let decoded = serde_json::from_value(record).map_err(|e| {
                        FootfallError::malformed_with_source("Record has an unexpected shape", path, e)
                    })?;
                    records.push(decoded);
                }
            }
        }

        if skipped > 0 {
            debug!("Skipped {} empty '{}' records", skipped, self.field);
        }
        if unkeyed > 0 {
            debug!(
                "Dropped {} '{}' records without a {}",
                unkeyed,
                self.field,
                self.key_field.unwrap_or_default()
            );
        }
        Ok(records)
    }

    fn lacks_key(&self, record: &Value) -> bool {
        self.key_field
            .is_some_and(|key| record.get(key).map_or(true, Value::is_null))
    }
}
