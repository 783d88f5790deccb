//! Environment-driven client configuration.
//!
//! Every value has a literal fallback, so an empty environment yields a
//! working local-development setup.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use agency_api::config::DEFAULT_REQUEST_TIMEOUT;
use agency_api::{resolve_base_url, ApiConfig, DEFAULT_AUTH_BASE_URL, DEFAULT_PIPELINE_BASE_URL};
use token_store::token_root;

use crate::error::DeskError;
use crate::logging::DEFAULT_LOG_FILTER;

pub const AUTH_API_URL_ENV_VAR: &str = "AGENCY_AUTH_API_URL";
pub const PIPELINE_API_URL_ENV_VAR: &str = "AGENCY_PIPELINE_API_URL";
pub const REQUEST_TIMEOUT_ENV_VAR: &str = "AGENCY_REQUEST_TIMEOUT_SEC";
pub const TOKEN_DIR_ENV_VAR: &str = "AGENCY_DESK_TOKEN_DIR";
pub const GATEWAY_ENV_VAR: &str = "AGENCY_DESK_GATEWAY";
pub const LOG_ENV_VAR: &str = "AGENCY_DESK_LOG";

/// Which backend implementation the gateways talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GatewayKind {
    #[default]
    Http,
    Mock,
}

impl GatewayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayKind {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            unknown => Err(DeskError::Config(format!(
                "unsupported gateway '{unknown}'. Available gateways: http, mock"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub auth: ApiConfig,
    pub pipeline: ApiConfig,
    pub token_dir: PathBuf,
    pub gateway: GatewayKind,
    pub log_filter: String,
}

impl DeskConfig {
    /// Defaults for a client started in `cwd`.
    pub fn new(cwd: &Path) -> Self {
        Self {
            auth: ApiConfig::auth_default(),
            pipeline: ApiConfig::pipeline_default(),
            token_dir: token_root(cwd),
            gateway: GatewayKind::Http,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }

    pub fn from_env(cwd: &Path) -> Result<Self, DeskError> {
        Self::from_lookup(cwd, |key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup<F>(cwd: &Path, lookup: F) -> Result<Self, DeskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty())
        };

        let auth_url = resolve_base_url(value(AUTH_API_URL_ENV_VAR).as_deref(), DEFAULT_AUTH_BASE_URL);
        let pipeline_url = resolve_base_url(
            value(PIPELINE_API_URL_ENV_VAR).as_deref(),
            DEFAULT_PIPELINE_BASE_URL,
        );
        let timeout = match value(REQUEST_TIMEOUT_ENV_VAR) {
            Some(raw) => parse_timeout_secs(&raw)?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };
        let gateway = match value(GATEWAY_ENV_VAR) {
            Some(raw) => raw.parse()?,
            None => GatewayKind::default(),
        };

        let mut config = Self::new(cwd)
            .with_auth_url(auth_url)
            .with_pipeline_url(pipeline_url)
            .with_request_timeout(timeout)
            .with_gateway(gateway);
        if let Some(dir) = value(TOKEN_DIR_ENV_VAR) {
            config.token_dir = PathBuf::from(dir);
        }
        if let Some(filter) = value(LOG_ENV_VAR) {
            config.log_filter = filter;
        }
        Ok(config)
    }

    pub fn with_auth_url(mut self, base_url: impl Into<String>) -> Self {
        self.auth = self.auth.with_base_url(base_url);
        self
    }

    pub fn with_pipeline_url(mut self, base_url: impl Into<String>) -> Self {
        self.pipeline = self.pipeline.with_base_url(base_url);
        self
    }

    /// Applies one timeout to both backends.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.auth = self.auth.with_timeout(timeout);
        self.pipeline = self.pipeline.with_timeout(timeout);
        self
    }

    pub fn with_token_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.token_dir = dir.into();
        self
    }

    pub fn with_gateway(mut self, gateway: GatewayKind) -> Self {
        self.gateway = gateway;
        self
    }
}

pub fn parse_timeout_secs(raw: &str) -> Result<Duration, DeskError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(DeskError::Config(format!(
            "{REQUEST_TIMEOUT_ENV_VAR} must be a positive number of seconds, got '{}'",
            raw.trim()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_literal_defaults() {
        let config = DeskConfig::from_lookup(Path::new("/work"), |_| None).expect("config");

        assert_eq!(config.auth.base_url, DEFAULT_AUTH_BASE_URL);
        assert_eq!(config.pipeline.base_url, DEFAULT_PIPELINE_BASE_URL);
        assert_eq!(config.auth.timeout, Some(DEFAULT_REQUEST_TIMEOUT));
        assert_eq!(config.token_dir, PathBuf::from("/work/.agency"));
        assert_eq!(config.gateway, GatewayKind::Http);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let lookup = lookup_from(&[(AUTH_API_URL_ENV_VAR, "  "), (GATEWAY_ENV_VAR, "")]);
        let config = DeskConfig::from_lookup(Path::new("/work"), lookup).expect("config");

        assert_eq!(config.auth.base_url, DEFAULT_AUTH_BASE_URL);
        assert_eq!(config.gateway, GatewayKind::Http);
    }

    #[test]
    fn environment_overrides_every_field() {
        let lookup = lookup_from(&[
            (AUTH_API_URL_ENV_VAR, "https://auth.example.com/api/v1"),
            (PIPELINE_API_URL_ENV_VAR, "https://pipeline.example.com"),
            (REQUEST_TIMEOUT_ENV_VAR, "15"),
            (TOKEN_DIR_ENV_VAR, "/var/lib/desk"),
            (GATEWAY_ENV_VAR, "mock"),
            (LOG_ENV_VAR, "agency_desk=debug"),
        ]);
        let config = DeskConfig::from_lookup(Path::new("/work"), lookup).expect("config");

        assert_eq!(config.auth.base_url, "https://auth.example.com/api/v1");
        assert_eq!(config.pipeline.base_url, "https://pipeline.example.com");
        assert_eq!(config.pipeline.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.auth.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.token_dir, PathBuf::from("/var/lib/desk"));
        assert_eq!(config.gateway, GatewayKind::Mock);
        assert_eq!(config.log_filter, "agency_desk=debug");
    }

    #[test]
    fn timeout_must_be_positive() {
        for raw in ["0", "-3", "soon"] {
            let lookup = lookup_from(&[(REQUEST_TIMEOUT_ENV_VAR, raw)]);
            let error = DeskConfig::from_lookup(Path::new("/work"), lookup)
                .expect_err("invalid timeout should fail");
            assert!(error.to_string().contains(REQUEST_TIMEOUT_ENV_VAR));
        }
    }

    #[test]
    fn unknown_gateway_is_rejected() {
        let lookup = lookup_from(&[(GATEWAY_ENV_VAR, "grpc")]);
        let error = DeskConfig::from_lookup(Path::new("/work"), lookup)
            .expect_err("unknown gateway should fail");
        assert!(error.to_string().contains("unsupported gateway 'grpc'"));
    }
}
