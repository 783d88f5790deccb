//! Line-oriented terminal front end for `agency_desk`.
//!
//! ## Backend selection
//!
//! - `AGENCY_DESK_GATEWAY=http` (default) talks to the auth and pipeline
//!   services at `AGENCY_AUTH_API_URL` / `AGENCY_PIPELINE_API_URL`
//! - `AGENCY_DESK_GATEWAY=mock` answers every call locally with canned replies
//!
//! Command-line flags override the environment. The access token is kept in
//! `AGENCY_DESK_TOKEN_DIR` (default `./.agency`) unless `--ephemeral` is given.
//!
//! Input is read a line at a time. Lines starting with `/` are commands; any
//! other line is a prompt for the selected agency. A trailing `\` continues
//! the prompt on the next line.

pub mod app;
pub mod commands;
pub mod render;
