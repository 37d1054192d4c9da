use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{CallId, CallStateChange, OperatorId, TicketId},
    error::ApiError,
    protocol::{
        AssociateTicketRequest, CallRecord, ChangeCallStateRequest, CreateCallRequest,
        FinalizeCallRequest,
    },
};
use tracing::debug;
use url::Url;

/// Backend that owns call records and their status.
#[async_trait]
pub trait CallRegistry: Send + Sync {
    async fn create(&self, operator_id: OperatorId, origin_number: &str) -> Result<CallRecord>;
    async fn set_state(&self, call_id: CallId, state: CallStateChange) -> Result<CallRecord>;
    async fn finalize(&self, call_id: CallId, duration_seconds: u64) -> Result<CallRecord>;
    async fn associate_ticket(&self, call_id: CallId, ticket_id: TicketId) -> Result<CallRecord>;
}

/// [`CallRegistry`] over the registry's REST routes.
pub struct HttpCallRegistry {
    http: Client,
    base_url: Url,
}

impl HttpCallRegistry {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid registry url: {base_url}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(anyhow!("registry url must start with http:// or https://"));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid registry path: {path}"))
    }
}

#[async_trait]
impl CallRegistry for HttpCallRegistry {
    async fn create(&self, operator_id: OperatorId, origin_number: &str) -> Result<CallRecord> {
        let url = self.endpoint("calls")?;
        debug!(%url, %operator_id, origin_number, "registry: create call");
        let res = self
            .http
            .post(url.clone())
            .json(&CreateCallRequest {
                operator_id,
                origin_number: origin_number.to_string(),
            })
            .send()
            .await
            .with_context(|| format!("failed to reach call registry at {url}"))?;
        read_call(res).await
    }

    async fn set_state(&self, call_id: CallId, state: CallStateChange) -> Result<CallRecord> {
        let url = self.endpoint(&format!("calls/{call_id}/state"))?;
        debug!(%url, ?state, "registry: change call state");
        let res = self
            .http
            .patch(url.clone())
            .json(&ChangeCallStateRequest { state })
            .send()
            .await
            .with_context(|| format!("failed to reach call registry at {url}"))?;
        read_call(res).await
    }

    async fn finalize(&self, call_id: CallId, duration_seconds: u64) -> Result<CallRecord> {
        let url = self.endpoint(&format!("calls/{call_id}/finalize"))?;
        debug!(%url, duration_seconds, "registry: finalize call");
        let res = self
            .http
            .patch(url.clone())
            .json(&FinalizeCallRequest { duration_seconds })
            .send()
            .await
            .with_context(|| format!("failed to reach call registry at {url}"))?;
        read_call(res).await
    }

    async fn associate_ticket(&self, call_id: CallId, ticket_id: TicketId) -> Result<CallRecord> {
        let url = self.endpoint(&format!("calls/{call_id}/ticket"))?;
        debug!(%url, %ticket_id, "registry: associate ticket");
        let res = self
            .http
            .patch(url.clone())
            .json(&AssociateTicketRequest { ticket_id })
            .send()
            .await
            .with_context(|| format!("failed to reach call registry at {url}"))?;
        read_call(res).await
    }
}

async fn read_call(res: Response) -> Result<CallRecord> {
    let status = res.status();
    if !status.is_success() {
        let detail = res
            .json::<ApiError>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| "no error details".to_string());
        return Err(anyhow!("registry responded {status}: {detail}"));
    }
    res.json::<CallRecord>()
        .await
        .context("malformed call record from registry")
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
