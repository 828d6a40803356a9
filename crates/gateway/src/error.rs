use crate::config::API_KEY_ENV;
use context_protocol::ErrorKind;
use context_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Remote model is not configured: set {} to enable submissions", API_KEY_ENV)]
    NotConfigured,

    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("At least one file must be selected")]
    EmptySelection,

    #[error("Could not read file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: ScanError,
    },

    #[error("Remote endpoint failed: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed response from remote endpoint: {0}")]
    MalformedResponse(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl GatewayError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured => ErrorKind::GatewayNotConfigured,
            Self::EmptyPrompt => ErrorKind::EmptyPrompt,
            Self::EmptySelection => ErrorKind::EmptySelection,
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Client(_) => ErrorKind::Internal,
        }
    }
}
