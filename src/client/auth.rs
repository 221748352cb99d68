use crate::client::{ApiClient, EndpointProfile};
use crate::utils::{BulkMetaError, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use std::fmt;
use tracing::{error, info};

/// Opaque bearer credential returned by the login call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only authentication state shared by every batch of a run.
#[derive(Debug, Clone)]
pub struct Session {
    pub credential: Credential,
    pub tenant_id: Option<TenantId>,
}

pub struct Authenticator {
    api: ApiClient,
    profile: EndpointProfile,
}

impl Authenticator {
    pub fn new(api: ApiClient, profile: EndpointProfile) -> Self {
        Self { api, profile }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Credential> {
        let url = self.api.endpoint(&["api", "v1", "auth", "login"])?;

        let response = self
            .api
            .send(|| {
                self.api
                    .http()
                    .post(url.clone())
                    .form(&[("username", username), ("password", password)])
            })
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(status = status.as_u16(), "Could not login to host {}", self.api.host());
            return Err(BulkMetaError::AuthenticationFailed {
                host: self.api.host().to_string(),
                status: status.as_u16(),
            });
        }

        let credential = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(Credential::new)
            .ok_or_else(|| {
                error!("Login response from {} carried no credential", self.api.host());
                BulkMetaError::MissingCredential {
                    host: self.api.host().to_string(),
                }
            })?;

        info!(username = username, "Logged into {}", self.api.host());
        Ok(credential)
    }

    /// Looks up the tenant id registered under `alias`. The response body
    /// is the id itself, optionally as a JSON string.
    pub async fn resolve_tenant(&self, credential: &Credential, alias: &str) -> Result<TenantId> {
        let url = self.api.endpoint(&["api", "v1", "tenant-by-alias", alias])?;
        let authorization = self.profile.authorization(credential);

        let response = self
            .api
            .send(|| {
                self.api
                    .http()
                    .get(url.clone())
                    .header(AUTHORIZATION, authorization.as_str())
            })
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(status = status.as_u16(), "Could not resolve tenant alias {}", alias);
            return Err(BulkMetaError::TenantLookupFailed {
                alias: alias.to_string(),
                reason: format!("status {}", status.as_u16()),
            });
        }

        let body = response.text().await?;
        let tenant_id = body.trim().trim_matches('"');
        if tenant_id.is_empty() {
            error!("Tenant lookup for alias {} returned an empty body", alias);
            return Err(BulkMetaError::TenantLookupFailed {
                alias: alias.to_string(),
                reason: "empty response body".to_string(),
            });
        }

        info!("Resolved tenant alias {} to {}", alias, tenant_id);
        Ok(TenantId::new(tenant_id))
    }
}
