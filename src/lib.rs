//! Terminal client for the agency platform.
//!
//! A [`Session`] signs the user in against the auth service and keeps the
//! access token in a [`TokenStore`]. A [`ConversationEngine`] sends prompts to
//! the pipeline service for the selected [`Agency`] and records the exchange in
//! a [`Transcript`], rendering each backend payload with [`AgencyResult`].
//!
//! Both talk to the backend through the [`gateway`] traits, implemented by the
//! `agency_api` HTTP clients and by scripted mocks.

pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod normalize;
pub mod session;
pub mod transcript;

pub use agency_api::{Agency, DocumentUpload, Identity, UnknownAgency};
pub use config::{DeskConfig, GatewayKind};
pub use conversation::{
    load_document, ConversationEngine, IgnoreReason, IngestOutcome, RunOutcome, Selection,
    FILE_INGESTED, UPLOAD_FAILED,
};
pub use error::DeskError;
pub use gateway::{gateways_for, AuthGateway, Gateways, PipelineGateway};
pub use logging::{init_logging, DEFAULT_LOG_FILTER};
pub use normalize::{AgencyResult, ERROR_RUNNING_AGENCY, REQUEST_FAILED};
pub use session::{AuthenticatedUser, Navigation, Session, SessionPhase};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transcript::{Role, Transcript, TranscriptEntry};
