use serde::{Deserialize, Serialize};

pub const TOKEN_RECORD_VERSION: u32 = 1;

/// On-disk record holding the credential token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoredToken {
    pub version: u32,
    pub token: String,
    pub saved_at: String,
}

impl StoredToken {
    #[must_use]
    pub fn v1(token: impl Into<String>, saved_at: impl Into<String>) -> Self {
        Self {
            version: TOKEN_RECORD_VERSION,
            token: token.into(),
            saved_at: saved_at.into(),
        }
    }
}
