//! Transport-only HTTP clients for the agency platform backends.
//!
//! Two independently configured clients live here:
//!
//! - [`AuthClient`] talks to the auth service (credential exchange and the
//!   "who am I" lookup) and attaches `Authorization: Bearer` when a token is
//!   supplied.
//! - [`PipelineClient`] talks to the pipeline service (agency runs, document
//!   ingestion, health).
//!
//! This crate owns request building and response decoding only. It keeps no
//! session state, never retries, and never interprets agency payloads; the
//! run-agency response is handed back as raw JSON.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod token;
pub mod url;

pub use client::{AuthClient, PipelineClient};
pub use config::ApiConfig;
pub use error::AgencyApiError;
pub use payload::{
    AccessToken, Agency, DocumentUpload, HealthStatus, Identity, RunAgencyRequest, UnknownAgency,
};
pub use reqwest::StatusCode;
pub use token::{decode_token_claims, TokenClaims};
pub use crate::url::{endpoint_url, resolve_base_url, DEFAULT_AUTH_BASE_URL, DEFAULT_PIPELINE_BASE_URL};
