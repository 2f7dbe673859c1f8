//! Session registry
//!
//! Holds the strong reference to every live session. Reader and writer
//! tasks run against the handle through `Arc`s of their own, but the
//! registry is the owner of record: nothing outlives a `shutdown`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use crate::connection::SessionHandle;

/// Tracks live sessions and shuts them down on server stop
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: Arc<SessionHandle>) {
        self.lock().insert(handle.id(), handle);
    }

    /// Posts shutdown to one session; removal happens when its reader
    /// task tears down
    pub fn stop(&self, handle: &SessionHandle) {
        handle.close();
    }

    pub(crate) fn remove(&self, id: Uuid) {
        self.lock().remove(&id);
    }

    /// Closes every live session
    pub fn shutdown(&self) {
        let handles: Vec<_> = self.lock().values().cloned().collect();
        debug!(count = handles.len(), "Shutting down sessions");

        for handle in handles {
            handle.close();
        }
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Arc<SessionHandle>>> {
        self.sessions.lock().expect("session registry poisoned")
    }
}
