//! Backend seam for the session and the conversation engine.
//!
//! Both consumers talk to trait objects so the HTTP clients can be swapped for
//! the scripted [`mock`] gateways in tests and offline runs. Selection follows
//! [`GatewayKind`](crate::config::GatewayKind):
//!
//! - `AGENCY_DESK_GATEWAY=http` (default) for the real auth/pipeline services
//! - `AGENCY_DESK_GATEWAY=mock` for canned, deterministic replies

use std::sync::Arc;

use agency_api::{
    AccessToken, AgencyApiError, AuthClient, DocumentUpload, HealthStatus, Identity,
    PipelineClient, RunAgencyRequest,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::{DeskConfig, GatewayKind};
use crate::error::DeskError;

mod http;
pub mod mock;

pub use mock::{MockAuthGateway, MockFailure, MockPipelineGateway};

/// Auth service operations.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for an access token.
    async fn login_access_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessToken, AgencyApiError>;

    /// Resolve the identity behind `token`; `None` sends the call
    /// unauthenticated.
    async fn users_me(&self, token: Option<&str>) -> Result<Identity, AgencyApiError>;
}

/// Pipeline service operations.
#[async_trait]
pub trait PipelineGateway: Send + Sync {
    /// Run one prompt and return the raw, agency-specific payload.
    async fn run_agency(&self, request: &RunAgencyRequest) -> Result<Value, AgencyApiError>;

    async fn ingest(&self, document: DocumentUpload) -> Result<(), AgencyApiError>;

    async fn health(&self) -> Result<HealthStatus, AgencyApiError>;
}

/// The pair of gateways one client instance uses.
#[derive(Clone)]
pub struct Gateways {
    pub auth: Arc<dyn AuthGateway>,
    pub pipeline: Arc<dyn PipelineGateway>,
}

pub fn gateways_for(config: &DeskConfig) -> Result<Gateways, DeskError> {
    match config.gateway {
        GatewayKind::Http => Ok(Gateways {
            auth: Arc::new(AuthClient::new(config.auth.clone())?),
            pipeline: Arc::new(PipelineClient::new(config.pipeline.clone())?),
        }),
        GatewayKind::Mock => Ok(Gateways {
            auth: Arc::new(MockAuthGateway::permissive()),
            pipeline: Arc::new(MockPipelineGateway::new()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn gateways_for_builds_http_clients_from_config() {
        let config = DeskConfig::new(Path::new("/work"));
        assert!(gateways_for(&config).is_ok());
    }

    #[test]
    fn gateways_for_rejects_invalid_base_url() {
        let config = DeskConfig::new(Path::new("/work")).with_pipeline_url("pipeline:8002");
        let error = match gateways_for(&config) {
            Ok(_) => panic!("invalid base URL should fail"),
            Err(error) => error,
        };
        assert!(matches!(
            error,
            DeskError::Api(AgencyApiError::InvalidBaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn gateways_for_mock_answers_offline() {
        let config = DeskConfig::new(Path::new("/work")).with_gateway(GatewayKind::Mock);
        let gateways = gateways_for(&config).expect("mock gateways");
        let health = gateways.pipeline.health().await.expect("mock health");
        assert!(health.is_ok());
    }
}
