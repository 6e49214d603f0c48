use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("PINATA_JWT missing: no upload credential configured")]
    AuthenticationMissing,

    #[error("W3NAME_KEY_B64 missing: no IPNS signing key configured")]
    SigningKeyMissing,

    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("No files in {}", .0.display())]
    EmptyDirectory(PathBuf),

    #[error("Directory nesting deeper than {max_depth} levels at {}", path.display())]
    DepthExceeded { path: PathBuf, max_depth: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload rejected (status {status}): {body}")]
    UploadRejected { status: u16, body: String },

    #[error("Name publish rejected (status {status}): {body}")]
    PublishRejected { status: u16, body: String },

    #[error("Name resolution unavailable: {0}")]
    ResolutionUnavailable(String),

    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File name cannot be sent in a multipart upload: {0:?}")]
    UnsupportedFileName(String),

    #[error("Invalid IPNS record: {0}")]
    InvalidRecord(String),

    #[error("Invalid IPNS name: {0}")]
    InvalidName(String),
}

/// Coarse classification used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Filesystem,
    Record,
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::AuthenticationMissing
            | DeployError::SigningKeyMissing
            | DeployError::InvalidSigningKey(_)
            | DeployError::DirectoryNotFound(_)
            | DeployError::EmptyDirectory(_)
            | DeployError::DepthExceeded { .. }
            | DeployError::Config(_) => ErrorKind::Configuration,
            DeployError::UploadRejected { .. }
            | DeployError::PublishRejected { .. }
            | DeployError::ResolutionUnavailable(_)
            | DeployError::InvalidResponse(_)
            | DeployError::Http(_) => ErrorKind::Transport,
            DeployError::Filesystem { .. } | DeployError::UnsupportedFileName(_) => {
                ErrorKind::Filesystem
            }
            DeployError::InvalidRecord(_) | DeployError::InvalidName(_) => ErrorKind::Record,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeployError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for DeployError {
    fn from(err: config::ConfigError) -> Self {
        DeployError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
