use context_protocol::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A submission is already in progress")]
    Busy,

    #[error("Please enter a prompt")]
    EmptyPrompt,

    #[error("Please select at least one file")]
    EmptySelection,

    #[error("Unknown session: {0}")]
    UnknownSession(String),
}

impl SessionError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Busy => ErrorKind::Busy,
            Self::EmptyPrompt => ErrorKind::EmptyPrompt,
            Self::EmptySelection => ErrorKind::EmptySelection,
            Self::UnknownSession(_) => ErrorKind::UnknownSession,
        }
    }
}
