use crate::error::SessionError;
use crate::lifecycle::{Session, SubmissionState};
use context_protocol::FileDescriptor;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const DEFAULT_MAX_SESSIONS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub selection: Vec<FileDescriptor>,
    pub state: SubmissionState,
}

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<String, Arc<Mutex<Session>>>,
    created: VecDeque<String>,
}

/// Bounded set of live sessions; the oldest-created one is evicted when full.
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
    capacity: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut inner = lock(&self.inner);
        while inner.sessions.len() >= self.capacity {
            let Some(oldest) = inner.created.pop_front() else {
                break;
            };
            if inner.sessions.remove(&oldest).is_some() {
                log::info!("Evicted session {oldest} (capacity {})", self.capacity);
            }
        }
        inner
            .sessions
            .insert(id.clone(), Arc::new(Mutex::new(Session::new())));
        inner.created.push_back(id.clone());
        log::debug!("Created session {id}");
        id
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut inner = lock(&self.inner);
        let removed = inner.sessions.remove(id).is_some();
        if removed {
            inner.created.retain(|existing| existing != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against one session. The registry lock is released before the
    /// session lock is taken.
    pub fn with_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, SessionError> {
        let session = lock(&self.inner)
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        let mut guard = lock(&session);
        Ok(f(&mut guard))
    }

    pub fn view(&self, id: &str) -> Result<SessionView, SessionError> {
        self.with_session(id, |session| SessionView {
            session_id: id.to_string(),
            selection: session.selection().list(),
            state: session.state().clone(),
        })
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}
