use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Backend task-execution mode. Serialized as the `agency_type` wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agency {
    Legal,
    Design,
}

impl Agency {
    pub const ALL: [Agency; 2] = [Agency::Legal, Agency::Design];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legal => "legal",
            Self::Design => "design",
        }
    }

    /// Display name used in prompts and headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Legal => "Legal Agency",
            Self::Design => "Design Agency",
        }
    }
}

impl fmt::Display for Agency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAgency(pub String);

impl fmt::Display for UnknownAgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown agency '{}'; expected 'legal' or 'design'", self.0)
    }
}

impl std::error::Error for UnknownAgency {}

impl FromStr for Agency {
    type Err = UnknownAgency;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "legal" => Ok(Self::Legal),
            "design" => Ok(Self::Design),
            _ => Err(UnknownAgency(value.trim().to_owned())),
        }
    }
}

/// JSON body for `POST /run-agency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAgencyRequest {
    pub prompt: String,
    pub agency_type: Agency,
}

impl RunAgencyRequest {
    pub fn new(prompt: impl Into<String>, agency_type: Agency) -> Self {
        Self {
            prompt: prompt.into(),
            agency_type,
        }
    }
}

/// Response of `POST /login/access-token`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Account record returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

/// Response of `GET /health` on the pipeline service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

const DEFAULT_UPLOAD_NAME: &str = "document";

/// File sent as the multipart `file` field of `POST /ingest`.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. Only the final path component is sent as the
    /// upload name; no content type is guessed.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_owned());
        Ok(Self { file_name, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
