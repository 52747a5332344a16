use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SheedApiConfig;
use crate::error::{parse_error_message, SheedApiError};
use crate::payload::{JobRequest, JobResult};

/// HTTP client for the job submission endpoint.
#[derive(Debug, Clone)]
pub struct SheedApiClient {
    http: Client,
    config: SheedApiConfig,
    origin: Url,
}

impl SheedApiClient {
    pub fn new(config: SheedApiConfig) -> Result<Self, SheedApiError> {
        let origin = config.origin_url()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(SheedApiError::from)?;
        Ok(Self {
            http,
            config,
            origin,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn submit_endpoint(&self) -> Url {
        crate::url::submit_url(&self.origin)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, SheedApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/json"));

        if let Some(user_agent) = self
            .config
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(user_agent).map_err(|_| {
                    SheedApiError::Unknown(format!("invalid user agent: {user_agent}"))
                })?,
            );
        }
        Ok(headers)
    }

    pub fn build_request(
        &self,
        request: &JobRequest,
    ) -> Result<reqwest::RequestBuilder, SheedApiError> {
        let headers = self.build_headers()?;
        Ok(self
            .http
            .post(self.submit_endpoint())
            .headers(headers)
            .json(request))
    }

    /// Send one job request and decode its result.
    ///
    /// There is no retry: a job may run for minutes server-side and replaying
    /// it would start a second computation.
    pub async fn submit(&self, request: &JobRequest) -> Result<JobResult, SheedApiError> {
        if !request.has_client_id() {
            debug!("job request carries no session identifier");
        }
        info!(
            coordinates = %request.coordinates,
            name = %request.name,
            dem = %request.dem,
            client_id = %request.client_id,
            "submitting job"
        );

        let response = self.build_request(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = parse_error_message(status, &body);
            warn!(%status, %message, "job submission rejected");
            return Err(SheedApiError::Status(status, message));
        }

        debug!(bytes = body.len(), "job result received");
        parse_job_result(&body)
    }
}

/// Decode a job result body. The service labels it `text/json`, so the
/// content type is not checked.
pub fn parse_job_result(body: &str) -> Result<JobResult, SheedApiError> {
    serde_json::from_str(body).map_err(SheedApiError::from)
}
