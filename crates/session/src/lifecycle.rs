use crate::error::SessionError;
use crate::selection::SelectionStore;
use context_protocol::{ErrorKind, FileDescriptor};
use serde::Serialize;

/// Client-visible submission lifecycle.
///
/// `Idle -> Submitting -> Succeeded | Failed -> Idle`. The terminal states
/// hold the last outcome until the next interaction with the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded {
        response: String,
    },
    Failed {
        code: ErrorKind,
        error: String,
    },
}

#[derive(Debug, Default)]
pub struct Session {
    selection: SelectionStore,
    state: SubmissionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn toggle(&mut self, descriptor: FileDescriptor) -> bool {
        self.settle();
        self.selection.toggle(descriptor)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.settle();
        self.selection.remove(id)
    }

    pub fn clear(&mut self) {
        self.settle();
        self.selection.clear();
    }

    /// Guarded transition into `Submitting`.
    ///
    /// Returns the selection in order as it stands now; later selection
    /// changes do not affect the in-flight submission.
    pub fn begin_submission(&mut self, prompt: &str) -> Result<Vec<FileDescriptor>, SessionError> {
        if self.state == SubmissionState::Submitting {
            return Err(SessionError::Busy);
        }
        self.settle();
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        if self.selection.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        self.state = SubmissionState::Submitting;
        Ok(self.selection.list())
    }

    pub fn succeed(&mut self, response: String) {
        if self.state != SubmissionState::Submitting {
            log::warn!("Ignoring submission result for a session that is not submitting");
            return;
        }
        self.state = SubmissionState::Succeeded { response };
    }

    pub fn fail(&mut self, code: ErrorKind, error: String) {
        if self.state != SubmissionState::Submitting {
            log::warn!("Ignoring submission failure for a session that is not submitting");
            return;
        }
        self.state = SubmissionState::Failed { code, error };
    }

    fn settle(&mut self) {
        if matches!(
            self.state,
            SubmissionState::Succeeded { .. } | SubmissionState::Failed { .. }
        ) {
            self.state = SubmissionState::Idle;
        }
    }
}
