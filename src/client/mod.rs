pub mod auth;
pub mod envoy;
pub mod profile;

pub use auth::{Authenticator, Credential, Session, TenantId};
pub use envoy::Envoy;
pub use profile::EndpointProfile;

use crate::utils::{BulkMetaError, Result};
use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::warn;

/// HTTP plumbing shared by the authenticator and the envoy.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    host: String,
    max_retries: usize,
}

impl ApiClient {
    /// `host` is either a bare authority, reached over HTTPS, or a full base URL.
    pub fn new(host: &str, timeout: Duration, max_retries: usize) -> Result<Self> {
        let base_url = Self::base_url_for(host)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            host: host.to_string(),
            max_retries,
        })
    }

    pub fn base_url_for(host: &str) -> Result<Url> {
        let raw = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        Url::parse(&raw).map_err(|e| BulkMetaError::InvalidUrl(format!("{}: {}", host, e)))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn endpoint<S: AsRef<str>>(&self, segments: &[S]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| BulkMetaError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(segments.iter().map(|s| s.as_ref()));
        }
        Ok(url)
    }

    /// Sends the request built by `build`, retrying connect and timeout
    /// failures with exponential backoff. Responses are returned whatever
    /// their status.
    pub async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries && (e.is_connect() || e.is_timeout()) => {
                    let delay = Duration::from_secs(2u64.pow(attempt as u32));
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "Request to {} failed, retrying",
                        self.host
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(host: &str) -> ApiClient {
        ApiClient::new(host, Duration::from_secs(5), 0).unwrap()
    }

    #[test]
    fn bare_host_defaults_to_https() {
        let url = ApiClient::base_url_for("datahub.example.com").unwrap();
        assert_eq!(url.as_str(), "https://datahub.example.com/");

        let url = ApiClient::base_url_for("http://127.0.0.1:8080").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn invalid_host_is_rejected() {
        assert!(matches!(
            ApiClient::base_url_for("http://"),
            Err(BulkMetaError::InvalidUrl(_))
        ));
    }

    #[test]
    fn endpoint_encodes_segments() {
        let api = client("datahub.example.com");
        let url = api.endpoint(&["api", "v1", "tenant-by-alias", "acme corp/eu"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://datahub.example.com/api/v1/tenant-by-alias/acme%20corp%2Feu"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let api = client("https://gateway.example.com/datahub/");
        let url = api.endpoint(&["api", "v1", "auth", "login"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gateway.example.com/datahub/api/v1/auth/login"
        );
    }

    #[tokio::test]
    async fn connection_failures_surface_as_http_errors() {
        // Nothing listens on the discard port.
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2), 0).unwrap();
        let url = api.endpoint(&["ping"]).unwrap();
        let result = api.send(|| api.http().get(url.clone())).await;
        assert!(matches!(result, Err(BulkMetaError::HttpError(_))));
    }

    #[tokio::test]
    async fn connection_failures_are_retried_with_backoff() {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2), 2).unwrap();
        let url = api.endpoint(&["ping"]).unwrap();
        let attempts = Cell::new(0);

        let start = Instant::now();
        let result = api
            .send(|| {
                attempts.set(attempts.get() + 1);
                api.http().get(url.clone())
            })
            .await;

        assert!(matches!(result, Err(BulkMetaError::HttpError(_))));
        assert_eq!(attempts.get(), 3);
        // 1s after the first failure, 2s after the second.
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn error_statuses_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), Duration::from_secs(2), 2).unwrap();
        let url = api.endpoint(&["ping"]).unwrap();
        let response = api.send(|| api.http().get(url.clone())).await.unwrap();

        assert_eq!(response.status().as_u16(), 500);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
