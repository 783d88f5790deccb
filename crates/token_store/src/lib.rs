//! Persisted credential token for the desk client.
//!
//! Exactly one token lives under the fixed key [`TOKEN_KEY`]. The file-backed
//! store survives restarts of the client; the memory store lives as long as
//! the process, for sessions that must not leave a token on disk.

mod error;
mod paths;
mod schema;
mod store;

pub use error::TokenStoreError;
pub use paths::{token_file_path, token_root, TOKEN_DIR, TOKEN_KEY};
pub use schema::StoredToken;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
