use crate::client::{ApiClient, EndpointProfile, Session};
use crate::csv_processor::{Batch, OutcomeLog};
use crate::pipeline::BatchSink;
use crate::utils::{BulkMetaError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tracing::{debug, error, info};

/// Sends batches to the bulk metadata endpoint of one profile and records
/// the per-entry results in the outcome log.
pub struct Envoy {
    api: ApiClient,
    profile: EndpointProfile,
    url: Url,
    authorization: String,
    outcomes: OutcomeLog,
}

impl Envoy {
    pub fn new(
        api: ApiClient,
        session: &Session,
        profile: EndpointProfile,
        outcomes: OutcomeLog,
    ) -> Result<Self> {
        let segments = profile.path_segments(session.tenant_id.as_ref())?;
        let url = api.endpoint(&segments[..])?;
        let authorization = profile.authorization(&session.credential);

        Ok(Self {
            api,
            profile,
            url,
            authorization,
            outcomes,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn outcomes_written(&self) -> usize {
        self.outcomes.records_written()
    }

    /// Flushes the outcome log and returns the number of outcomes written.
    pub fn finish(self) -> Result<usize> {
        self.outcomes.finish()
    }
}

impl BatchSink for Envoy {
    async fn send_batch(&mut self, batch: &Batch) -> Result<usize> {
        info!(
            "Sending batch {} of size {} to {}",
            batch.index,
            batch.len(),
            self.api.host()
        );

        let payload = self.profile.envelope(&batch.records)?;

        let response = self
            .api
            .send(|| {
                self.api
                    .http()
                    .post(self.url.clone())
                    .header(CONTENT_TYPE, "application/json")
                    .header(AUTHORIZATION, self.authorization.as_str())
                    .body(payload.clone())
            })
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(
                batch = batch.index,
                status = status.as_u16(),
                body = %body,
                "Bulk request rejected"
            );
            return Err(BulkMetaError::BatchDispatchFailed {
                index: batch.index,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        match self.profile.parse_outcomes(&body) {
            Some(outcomes) => {
                self.outcomes.record_all(&outcomes)?;
                self.outcomes.flush()?;
                Ok(outcomes.len())
            }
            None => {
                debug!(batch = batch.index, "Response carried no per-entry results");
                Ok(0)
            }
        }
    }
}
