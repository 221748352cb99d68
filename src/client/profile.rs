use crate::client::auth::{Credential, TenantId};
use crate::csv_processor::{MetadataRecord, OutcomeRecord};
use crate::utils::{BulkMetaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire protocol of a bulk metadata endpoint: request path, envelope,
/// authorization header style and response shape.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum EndpointProfile {
    /// `POST /api/v2/bulk/insert/monitored-objects/meta`
    #[default]
    #[serde(rename = "insert-v2")]
    #[value(name = "insert-v2")]
    InsertV2,
    /// `POST /api/v1/tenants/{tenantId}/bulk/upsert/monitored-objects/meta`
    #[serde(rename = "upsert-v1")]
    #[value(name = "upsert-v1")]
    UpsertV1,
}

impl fmt::Display for EndpointProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointProfile::InsertV2 => write!(f, "insert-v2"),
            EndpointProfile::UpsertV1 => write!(f, "upsert-v1"),
        }
    }
}

#[derive(Serialize)]
struct InsertEnvelope<'a> {
    data: InsertData<'a>,
}

#[derive(Serialize)]
struct InsertData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: InsertAttributes<'a>,
}

#[derive(Serialize)]
struct InsertAttributes<'a> {
    #[serde(rename = "metadata-entries")]
    metadata_entries: &'a [MetadataRecord],
}

#[derive(Serialize)]
struct UpsertEnvelope<'a> {
    items: &'a [MetadataRecord],
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    data: Vec<InsertResponseItem>,
}

#[derive(Debug, Deserialize)]
struct InsertResponseItem {
    attributes: BulkResult,
}

#[derive(Debug, Deserialize)]
struct BulkResult {
    #[serde(default)]
    id: String,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    reason: Option<String>,
}

impl BulkResult {
    fn into_outcome(self) -> OutcomeRecord {
        let status = if self.ok {
            "200".to_string()
        } else {
            self.reason
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "unknown".to_string())
        };
        OutcomeRecord::new(self.id, status)
    }
}

impl EndpointProfile {
    pub fn requires_tenant(&self) -> bool {
        matches!(self, EndpointProfile::UpsertV1)
    }

    pub fn path_segments(&self, tenant: Option<&TenantId>) -> Result<Vec<String>> {
        let segments: Vec<&str> = match self {
            EndpointProfile::InsertV2 => {
                vec!["api", "v2", "bulk", "insert", "monitored-objects", "meta"]
            }
            EndpointProfile::UpsertV1 => {
                let tenant = tenant.ok_or_else(|| {
                    BulkMetaError::ConfigError(format!("profile {} requires a tenant id", self))
                })?;
                vec![
                    "api",
                    "v1",
                    "tenants",
                    tenant.as_str(),
                    "bulk",
                    "upsert",
                    "monitored-objects",
                    "meta",
                ]
            }
        };
        Ok(segments.into_iter().map(str::to_string).collect())
    }

    pub fn authorization(&self, credential: &Credential) -> String {
        match self {
            EndpointProfile::InsertV2 => credential.as_str().to_string(),
            EndpointProfile::UpsertV1 if credential.as_str().starts_with("Bearer ") => {
                credential.as_str().to_string()
            }
            EndpointProfile::UpsertV1 => format!("Bearer {}", credential.as_str()),
        }
    }

    pub fn envelope(&self, records: &[MetadataRecord]) -> Result<Vec<u8>> {
        let body = match self {
            EndpointProfile::InsertV2 => serde_json::to_vec(&InsertEnvelope {
                data: InsertData {
                    kind: "monitoredObjectsMeta",
                    attributes: InsertAttributes {
                        metadata_entries: records,
                    },
                },
            })?,
            EndpointProfile::UpsertV1 => serde_json::to_vec(&UpsertEnvelope { items: records })?,
        };
        Ok(body)
    }

    /// `None` when the body carries no per-entry result list.
    pub fn parse_outcomes(&self, body: &[u8]) -> Option<Vec<OutcomeRecord>> {
        match self {
            EndpointProfile::InsertV2 => serde_json::from_slice::<InsertResponse>(body)
                .ok()
                .map(|r| r.data.into_iter().map(|i| i.attributes.into_outcome()).collect()),
            EndpointProfile::UpsertV1 => serde_json::from_slice::<Vec<BulkResult>>(body)
                .ok()
                .map(|r| r.into_iter().map(BulkResult::into_outcome).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn record(name: &str, key: Option<&str>) -> MetadataRecord {
        MetadataRecord {
            key: key.map(str::to_string),
            object_name: name.to_string(),
            metadata: BTreeMap::from([("region".to_string(), "us-east".to_string())]),
        }
    }

    #[test]
    fn insert_envelope_shape() {
        let body = EndpointProfile::InsertV2
            .envelope(&[record("obj1", None)])
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "data": {
                    "type": "monitoredObjectsMeta",
                    "attributes": {
                        "metadata-entries": [
                            {"objectName": "obj1", "metadata": {"region": "us-east"}}
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn upsert_envelope_carries_key() {
        let body = EndpointProfile::UpsertV1
            .envelope(&[record("obj1", Some("k-1"))])
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "items": [
                    {"key": "k-1", "objectName": "obj1", "metadata": {"region": "us-east"}}
                ]
            })
        );
    }

    #[test]
    fn paths_per_profile() {
        assert_eq!(
            EndpointProfile::InsertV2.path_segments(None).unwrap().join("/"),
            "api/v2/bulk/insert/monitored-objects/meta"
        );

        let tenant = TenantId::new("t-42");
        assert_eq!(
            EndpointProfile::UpsertV1
                .path_segments(Some(&tenant))
                .unwrap()
                .join("/"),
            "api/v1/tenants/t-42/bulk/upsert/monitored-objects/meta"
        );
        assert!(EndpointProfile::UpsertV1.path_segments(None).is_err());
    }

    #[test]
    fn authorization_header_styles() {
        let credential = Credential::new("abc123");
        assert_eq!(EndpointProfile::InsertV2.authorization(&credential), "abc123");
        assert_eq!(
            EndpointProfile::UpsertV1.authorization(&credential),
            "Bearer abc123"
        );
        assert_eq!(
            EndpointProfile::UpsertV1.authorization(&Credential::new("Bearer abc123")),
            "Bearer abc123"
        );
    }

    #[test]
    fn parses_insert_results() {
        let body = json!({
            "data": [
                {"attributes": {"id": "obj1", "ok": true, "rev": "1-a"}},
                {"attributes": {"id": "obj2", "ok": false, "reason": "404"}},
                {"attributes": {"id": "obj3", "ok": false}}
            ]
        })
        .to_string();

        let outcomes = EndpointProfile::InsertV2
            .parse_outcomes(body.as_bytes())
            .unwrap();
        assert_eq!(
            outcomes,
            vec![
                OutcomeRecord::new("obj1", "200"),
                OutcomeRecord::new("obj2", "404"),
                OutcomeRecord::new("obj3", "unknown"),
            ]
        );
    }

    #[test]
    fn parses_upsert_results() {
        let body = json!([{"id": "obj1", "ok": true}, {"id": "obj2", "ok": false, "reason": "500"}])
            .to_string();
        let outcomes = EndpointProfile::UpsertV1
            .parse_outcomes(body.as_bytes())
            .unwrap();
        assert_eq!(outcomes[1], OutcomeRecord::new("obj2", "500"));
    }

    #[test]
    fn bare_status_body_has_no_outcomes() {
        assert!(EndpointProfile::InsertV2.parse_outcomes(b"200").is_none());
        assert!(EndpointProfile::UpsertV1.parse_outcomes(b"").is_none());
    }

    #[test]
    fn profile_names_round_trip_through_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            profile: EndpointProfile,
        }
        let parsed: Wrapper = toml::from_str(r#"profile = "upsert-v1""#).unwrap();
        assert_eq!(parsed.profile, EndpointProfile::UpsertV1);
        assert_eq!(EndpointProfile::UpsertV1.to_string(), "upsert-v1");
    }
}
