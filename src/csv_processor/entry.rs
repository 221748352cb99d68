use crate::utils::{BulkMetaError, Result};
use csv::StringRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Metadata to attach to one monitored object, built from a single CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub object_name: String,
    pub metadata: BTreeMap<String, String>,
}

/// Turns CSV rows into [`MetadataRecord`]s.
///
/// The first column holds the monitored object name and never becomes a
/// metadata key. When a key column is named, its value is promoted to the
/// record's `key` field and left out of the metadata map.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    headers: Vec<String>,
    key_index: Option<usize>,
}

impl EntryBuilder {
    pub fn new(headers: &StringRecord, key_column: Option<&str>) -> Result<Self> {
        if headers.is_empty() {
            return Err(BulkMetaError::ConfigError(
                "CSV file has no header row".to_string(),
            ));
        }

        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();

        let key_index = match key_column {
            Some(column) => {
                let index = headers.iter().position(|h| h == column).ok_or_else(|| {
                    BulkMetaError::ConfigError(format!(
                        "key column {} not found in CSV headers",
                        column
                    ))
                })?;
                Some(index)
            }
            None => None,
        };

        Ok(Self { headers, key_index })
    }

    /// Column names that can end up as metadata keys.
    pub fn metadata_columns(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .enumerate()
            .skip(1)
            .filter(move |(i, _)| Some(*i) != self.key_index)
            .map(|(_, h)| h.as_str())
    }

    pub fn build(&self, record: &StringRecord, line: u64) -> Result<MetadataRecord> {
        if record.len() != self.headers.len() {
            return Err(BulkMetaError::MalformedRow {
                line,
                expected: self.headers.len(),
                got: record.len(),
            });
        }

        let object_name = record.get(0).unwrap_or_default().to_string();

        let key = self
            .key_index
            .and_then(|i| record.get(i))
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let metadata = self
            .headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .skip(1)
            .filter(|(i, (_, value))| Some(*i) != self.key_index && !value.is_empty())
            .map(|(_, (name, value))| (name.clone(), value.to_string()))
            .collect();

        Ok(MetadataRecord {
            key,
            object_name,
            metadata,
        })
    }
}
