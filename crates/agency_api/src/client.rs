use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{parse_error_message, AgencyApiError};
use crate::headers::build_headers;
use crate::payload::{AccessToken, DocumentUpload, HealthStatus, Identity, RunAgencyRequest};
use crate::url::{
    endpoint_url, validate_base_url, PATH_ACCESS_TOKEN, PATH_HEALTH, PATH_INGEST, PATH_RUN_AGENCY,
    PATH_USERS_ME,
};

/// Shared plumbing for one configured backend.
#[derive(Debug, Clone)]
struct HttpTransport {
    http: Client,
    config: ApiConfig,
}

impl HttpTransport {
    fn new(config: ApiConfig) -> Result<Self, AgencyApiError> {
        validate_base_url(&config.base_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AgencyApiError::from)?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        endpoint_url(&self.config.base_url, path)
    }

    fn header_map(&self, bearer: Option<&str>) -> Result<HeaderMap, AgencyApiError> {
        let headers = build_headers(&self.config, bearer);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| AgencyApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| AgencyApiError::InvalidHeader(format!("invalid value for {key}")))?,
            );
        }
        Ok(out)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AgencyApiError> {
        let response = request.send().await.map_err(AgencyApiError::from)?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        Err(AgencyApiError::Status(status, parse_error_message(status, &body)))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AgencyApiError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(AgencyApiError::from)?;
        serde_json::from_slice(&bytes).map_err(AgencyApiError::from)
    }
}

/// Client for the auth service.
#[derive(Debug, Clone)]
pub struct AuthClient {
    transport: HttpTransport,
}

impl AuthClient {
    pub fn new(config: ApiConfig) -> Result<Self, AgencyApiError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.transport.config
    }

    pub fn build_login_request(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RequestBuilder, AgencyApiError> {
        let headers = self.transport.header_map(None)?;
        Ok(self
            .transport
            .http
            .post(self.transport.endpoint(PATH_ACCESS_TOKEN))
            .headers(headers)
            .form(&[("username", username), ("password", password)]))
    }

    /// Exchange credentials for an access token.
    pub async fn login_access_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessToken, AgencyApiError> {
        debug!(username, "exchanging credentials for access token");
        let request = self.build_login_request(username, password)?;
        self.transport.send_json(request).await
    }

    pub fn build_users_me_request(
        &self,
        token: Option<&str>,
    ) -> Result<RequestBuilder, AgencyApiError> {
        let headers = self.transport.header_map(token)?;
        Ok(self
            .transport
            .http
            .get(self.transport.endpoint(PATH_USERS_ME))
            .headers(headers))
    }

    /// Resolve the account the token belongs to.
    pub async fn users_me(&self, token: Option<&str>) -> Result<Identity, AgencyApiError> {
        debug!(authenticated = token.is_some(), "resolving current identity");
        let request = self.build_users_me_request(token)?;
        self.transport.send_json(request).await
    }
}

/// Client for the pipeline service.
#[derive(Debug, Clone)]
pub struct PipelineClient {
    transport: HttpTransport,
}

impl PipelineClient {
    pub fn new(config: ApiConfig) -> Result<Self, AgencyApiError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.transport.config
    }

    pub fn build_run_agency_request(
        &self,
        request: &RunAgencyRequest,
    ) -> Result<RequestBuilder, AgencyApiError> {
        let headers = self.transport.header_map(None)?;
        Ok(self
            .transport
            .http
            .post(self.transport.endpoint(PATH_RUN_AGENCY))
            .headers(headers)
            .json(request))
    }

    /// Run one agency prompt. The payload is returned untouched; its shape
    /// depends on the agency.
    pub async fn run_agency(&self, request: &RunAgencyRequest) -> Result<Value, AgencyApiError> {
        debug!(agency = %request.agency_type, "dispatching agency run");
        let builder = self.build_run_agency_request(request)?;
        self.transport.send_json(builder).await
    }

    pub fn build_ingest_request(
        &self,
        document: DocumentUpload,
    ) -> Result<RequestBuilder, AgencyApiError> {
        let headers = self.transport.header_map(None)?;
        let part = Part::bytes(document.bytes).file_name(document.file_name);
        Ok(self
            .transport
            .http
            .post(self.transport.endpoint(PATH_INGEST))
            .headers(headers)
            .multipart(Form::new().part("file", part)))
    }

    /// Upload a source document. Any 2xx response counts as success; the body
    /// is not inspected.
    pub async fn ingest(&self, document: DocumentUpload) -> Result<(), AgencyApiError> {
        debug!(file = %document.file_name, bytes = document.len(), "ingesting document");
        let request = self.build_ingest_request(document)?;
        let response = self.transport.send(request).await?;
        response.bytes().await.map_err(AgencyApiError::from)?;
        Ok(())
    }

    pub async fn health(&self) -> Result<HealthStatus, AgencyApiError> {
        let headers = self.transport.header_map(None)?;
        let request = self
            .transport
            .http
            .get(self.transport.endpoint(PATH_HEALTH))
            .headers(headers);
        self.transport.send_json(request).await
    }
}
