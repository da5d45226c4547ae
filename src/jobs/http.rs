use super::provider::{JobProvider, JobSpec, ProviderStatus, SubmittedJob};
use crate::error::{CaptionflowError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Job provider reached over a small REST surface:
/// `POST {endpoint}/jobs` and `GET {endpoint}/jobs/{id}`.
pub struct HttpJobProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpJobProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Send a bearer token with every request.
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    /// `{endpoint}/{segments...}`, with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let invalid = || {
            CaptionflowError::Config(format!(
                "Invalid job provider endpoint: {}",
                self.endpoint
            ))
        };
        let mut url = reqwest::Url::parse(&self.endpoint).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        debug!("Job provider response status: {}", status);

        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(CaptionflowError::Provider(format!(
            "Job provider error ({}): {}",
            status, error_body
        )))
    }
}

#[async_trait]
impl JobProvider for HttpJobProvider {
    async fn submit_job(&self, spec: &JobSpec) -> Result<SubmittedJob> {
        debug!("Submitting {} job to {}", spec.kind, self.endpoint);
        let request = self.client.post(self.url(&["jobs"])?).json(spec);
        let response = self.authorize(request).send().await?;
        self.read_response(response).await
    }

    async fn get_job_status(&self, id: &str) -> Result<ProviderStatus> {
        let request = self.client.get(self.url(&["jobs", id])?);
        let response = self.authorize(request).send().await?;
        self.read_response(response).await
    }

    fn name(&self) -> &'static str {
        "HTTP job provider"
    }
}
