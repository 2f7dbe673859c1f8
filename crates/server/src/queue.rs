//! Admission queue and population gate
//!
//! A bounded population counter with a FIFO of waiting sessions. The
//! counter and the queue live under one mutex so that admit, promote and
//! close-time bookkeeping are each atomic; every connection contributes a
//! population delta of exactly zero or one at any instant.
//!
//! The queue holds weak handles only; it never extends a connection's
//! lifetime. A promotion is tracked until the session's reader task
//! acknowledges it, so a session that dies in the gap gives its slot
//! back instead of leaking it.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, Weak};

use uuid::Uuid;
use veles_protocol::ConnectionState;

use crate::connection::SessionHandle;

/// Outcome of the population gate at authentication time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Below the cap; a population slot was taken
    Admitted,

    /// At or above the cap; the session was queued
    Queued { position: u32 },
}

#[derive(Debug, Default)]
struct QueueInner {
    queue: VecDeque<Weak<SessionHandle>>,
    population: usize,
    /// Slots granted by promotion but not yet acknowledged
    promoted: HashSet<Uuid>,
}

/// Bounded population gate
#[derive(Debug)]
pub struct AdmissionQueue {
    inner: Mutex<QueueInner>,
    cap: usize,
}

impl AdmissionQueue {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Current world population
    pub fn population(&self) -> usize {
        self.lock().population
    }

    /// Number of sessions waiting
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Admits the session if the population is below the cap, otherwise
    /// queues it; atomic with respect to every other gate operation
    pub fn try_admit(&self, handle: &Arc<SessionHandle>) -> Admission {
        let mut inner = self.lock();

        if inner.population < self.cap {
            inner.population += 1;
            Admission::Admitted
        } else {
            inner.queue.push_back(Arc::downgrade(handle));
            Admission::Queued {
                position: inner.queue.len() as u32,
            }
        }
    }

    /// Takes a population slot without a connection; used to pre-load the
    /// gate in tests and maintenance tooling
    pub fn increment(&self) {
        self.lock().population += 1;
    }

    /// Releases a population slot and promotes from the queue head
    pub fn decrement(&self) {
        let mut inner = self.lock();
        inner.population = inner.population.saturating_sub(1);
        self.promote_locked(&mut inner);
    }

    /// Removes a session from the queue, wherever it sits
    pub fn dequeue(&self, handle: &SessionHandle) {
        self.lock().queue.retain(|waiting| {
            waiting
                .upgrade()
                .is_some_and(|other| other.id() != handle.id())
        });
    }

    /// Marks a granted slot as owned by the session's state machine
    pub(crate) fn ack_promotion(&self, handle: &SessionHandle) {
        self.lock().promoted.remove(&handle.id());
    }

    /// Close-time bookkeeping, driven by the pre-close state
    ///
    /// Runs exactly once per session. An unacknowledged promotion counts
    /// as a held slot regardless of the state the reader task last saw.
    pub(crate) fn on_session_closed(&self, handle: &SessionHandle, state: ConnectionState) {
        let mut inner = self.lock();

        if inner.promoted.remove(&handle.id()) {
            inner.population = inner.population.saturating_sub(1);
            self.promote_locked(&mut inner);
            return;
        }

        if state.holds_population_slot() {
            inner.population = inner.population.saturating_sub(1);
            self.promote_locked(&mut inner);
        } else if state.is_queued() {
            inner.queue.retain(|waiting| {
                waiting
                    .upgrade()
                    .is_some_and(|other| other.id() != handle.id())
            });
        }
    }

    fn promote_locked(&self, inner: &mut QueueInner) {
        while inner.population < self.cap {
            let Some(waiting) = inner.queue.pop_front() else {
                break;
            };

            let Some(handle) = waiting.upgrade() else {
                continue;
            };

            if handle.is_stopped() {
                continue;
            }

            inner.population += 1;
            inner.promoted.insert(handle.id());
            handle.notify_dequeued();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        self.inner.lock().expect("admission queue poisoned")
    }
}
