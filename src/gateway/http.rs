use agency_api::{
    AccessToken, AgencyApiError, AuthClient, DocumentUpload, HealthStatus, Identity,
    PipelineClient, RunAgencyRequest,
};
use async_trait::async_trait;
use serde_json::Value;

use super::{AuthGateway, PipelineGateway};

#[async_trait]
impl AuthGateway for AuthClient {
    async fn login_access_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessToken, AgencyApiError> {
        AuthClient::login_access_token(self, username, password).await
    }

    async fn users_me(&self, token: Option<&str>) -> Result<Identity, AgencyApiError> {
        AuthClient::users_me(self, token).await
    }
}

#[async_trait]
impl PipelineGateway for PipelineClient {
    async fn run_agency(&self, request: &RunAgencyRequest) -> Result<Value, AgencyApiError> {
        PipelineClient::run_agency(self, request).await
    }

    async fn ingest(&self, document: DocumentUpload) -> Result<(), AgencyApiError> {
        PipelineClient::ingest(self, document).await
    }

    async fn health(&self) -> Result<HealthStatus, AgencyApiError> {
        PipelineClient::health(self).await
    }
}
