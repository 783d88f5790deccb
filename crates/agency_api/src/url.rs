use ::url::Url;

use crate::error::AgencyApiError;

/// Default base URL for the auth service.
pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:8001/api/v1";
/// Default base URL for the pipeline service.
pub const DEFAULT_PIPELINE_BASE_URL: &str = "http://localhost:8002";

pub const PATH_ACCESS_TOKEN: &str = "/login/access-token";
pub const PATH_USERS_ME: &str = "/users/me";
pub const PATH_RUN_AGENCY: &str = "/run-agency";
pub const PATH_INGEST: &str = "/ingest";
pub const PATH_HEALTH: &str = "/health";

/// Pick the configured base URL, or `fallback` when it is unset or blank.
pub fn resolve_base_url(configured: Option<&str>, fallback: &str) -> String {
    match configured.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => fallback.to_owned(),
    }
}

/// Join an endpoint path onto a base URL.
///
/// Trailing slashes on the base and leading slashes on the path collapse into
/// exactly one separator, so `http://host/api/v1/` + `/users/me` and
/// `http://host/api/v1` + `users/me` produce the same URL.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        return base.to_owned();
    }
    format!("{base}/{path}")
}

/// Reject base URLs reqwest could not send to.
pub fn validate_base_url(base_url: &str) -> Result<Url, AgencyApiError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(AgencyApiError::InvalidBaseUrl("base URL is empty".to_owned()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|error| AgencyApiError::InvalidBaseUrl(format!("{trimmed}: {error}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(AgencyApiError::InvalidBaseUrl(format!(
            "{trimmed}: unsupported scheme '{other}'"
        ))),
    }
}
