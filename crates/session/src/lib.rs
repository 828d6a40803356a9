//! Session-scoped client state: the ordered file selection and the
//! submission lifecycle. Each client owns one [`Session`]; nothing here is a
//! process-wide singleton.

mod error;
mod lifecycle;
mod registry;
mod selection;

pub use error::SessionError;
pub use lifecycle::{Session, SubmissionState};
pub use registry::{SessionRegistry, SessionView, DEFAULT_MAX_SESSIONS};
pub use selection::SelectionStore;
