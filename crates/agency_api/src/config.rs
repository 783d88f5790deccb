use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::{DEFAULT_AUTH_BASE_URL, DEFAULT_PIPELINE_BASE_URL};

/// Upper bound applied to every request unless a config overrides it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Transport configuration for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto.
    pub base_url: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Auth service config pointed at the literal default base URL.
    pub fn auth_default() -> Self {
        Self::new(DEFAULT_AUTH_BASE_URL)
    }

    /// Pipeline service config pointed at the literal default base URL.
    pub fn pipeline_default() -> Self {
        Self::new(DEFAULT_PIPELINE_BASE_URL)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
