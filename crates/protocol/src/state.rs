//! Connection state machine for the Veles gateway
//!
//! State transitions:
//! ```text
//! Handshaking ──(AUTH_CHALLENGE sent)──▶ Authenticating
//! Authenticating ──(proof ok, below cap)──▶ CharacterList
//! Authenticating ──(proof ok, at cap)──▶ InQueue
//! InQueue ──(dequeued)──▶ CharacterList
//! CharacterList ──(world hand-off)──▶ InWorld
//!      any ──(error/disconnect)──▶ Closed
//! ```
//!
//! State-specific data lives in the variant itself, so a connection that is
//! not queued simply has no queue position to misread.

use crate::error::{ProtocolError, Result};

/// Per-connection protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Accepted, AUTH_CHALLENGE not yet sent
    #[default]
    Handshaking,

    /// AUTH_CHALLENGE sent, waiting for CMSG_AUTH_SESSION
    Authenticating,

    /// Authenticated but gated by the admission queue
    InQueue {
        /// Position at enqueue time (head = 1)
        position: u32,
    },

    /// Admitted; population slot held
    CharacterList,

    /// Handed off to the world
    InWorld,

    /// Torn down; terminal
    Closed,
}

impl ConnectionState {
    /// Validates a state transition
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        match (self, next) {
            (Handshaking, Authenticating) => true,

            (Authenticating, InQueue { .. }) => true,
            (Authenticating, CharacterList) => true,

            (InQueue { .. }, CharacterList) => true,

            (CharacterList, InWorld) => true,

            // every state may close
            (_, Closed) => true,

            _ => false,
        }
    }

    /// Attempts to transition to a new state
    pub fn transition_to(&mut self, next: ConnectionState) -> Result<()> {
        if self.can_transition_to(next) {
            *self = next;
            Ok(())
        } else {
            Err(ProtocolError::InvalidStateTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// Returns true while the handshake watchdog applies
    #[inline]
    pub fn is_pre_auth(&self) -> bool {
        matches!(
            self,
            ConnectionState::Handshaking | ConnectionState::Authenticating
        )
    }

    /// Returns true once the connection holds a population slot
    #[inline]
    pub fn holds_population_slot(&self) -> bool {
        matches!(
            self,
            ConnectionState::CharacterList | ConnectionState::InWorld
        )
    }

    #[inline]
    pub fn is_queued(&self) -> bool {
        matches!(self, ConnectionState::InQueue { .. })
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Handshaking => write!(f, "Handshaking"),
            ConnectionState::Authenticating => write!(f, "Authenticating"),
            ConnectionState::InQueue { position } => write!(f, "InQueue({position})"),
            ConnectionState::CharacterList => write!(f, "CharacterList"),
            ConnectionState::InWorld => write!(f, "InWorld"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}
