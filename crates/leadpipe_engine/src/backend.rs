use leadpipe_core::{ForecastRecord, LeadRecord, Query};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::{BackendError, ClientSettings, FailureKind, JobHandle, StatusReport};

const RUN_ROUTE: &str = "api/pipeline/run";
const STATUS_ROUTE: &str = "api/pipeline/status";
const FORECAST_ROUTE: &str = "api/data/forecast";
const LEADS_ROUTE: &str = "api/data/leads";

/// The four routes of the remote lead pipeline.
#[async_trait::async_trait]
pub trait PipelineBackend: Send + Sync {
    /// `POST /api/pipeline/run`.
    async fn submit(&self, query: &Query) -> Result<JobHandle, BackendError>;
    /// `GET /api/pipeline/status`.
    async fn status(&self, handle: &JobHandle) -> Result<StatusReport, BackendError>;
    /// `GET /api/data/forecast`.
    async fn forecast(&self) -> Result<Vec<ForecastRecord>, BackendError>;
    /// `GET /api/data/leads`.
    async fn leads(&self) -> Result<Vec<LeadRecord>, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    run_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, BackendError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(
                BackendError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
                    .with_detail(error_detail(&body)),
            );
        }
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        let body = self.send(self.client.get(url)).await?;
        serde_json::from_slice(&body)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl PipelineBackend for ReqwestBackend {
    async fn submit(&self, query: &Query) -> Result<JobHandle, BackendError> {
        let url = self.settings.endpoint(RUN_ROUTE)?;
        let payload = serde_json::json!({ "query": query.as_str() });
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string());
        let body = self.send(request).await?;

        // The response body is informational; only an optional run id is used.
        let handle = serde_json::from_slice::<SubmitResponse>(&body)
            .ok()
            .and_then(|response| response.run_id)
            .map_or_else(JobHandle::ambient, JobHandle::with_server_id);
        Ok(handle)
    }

    async fn status(&self, handle: &JobHandle) -> Result<StatusReport, BackendError> {
        let mut url = self.settings.endpoint(STATUS_ROUTE)?;
        if let Some(run_id) = handle.server_run_id() {
            url.query_pairs_mut().append_pair("run_id", run_id);
        }
        self.get_json(url).await
    }

    async fn forecast(&self) -> Result<Vec<ForecastRecord>, BackendError> {
        let url = self.settings.endpoint(FORECAST_ROUTE)?;
        self.get_json(url).await
    }

    async fn leads(&self) -> Result<Vec<LeadRecord>, BackendError> {
        let url = self.settings.endpoint(LEADS_ROUTE)?;
        self.get_json(url).await
    }
}

fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed.detail.as_str().map(ToOwned::to_owned)
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}
