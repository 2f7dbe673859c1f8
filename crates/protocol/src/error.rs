use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Declared frame size {size} is smaller than the opcode field")]
    UndersizeFrame { size: u16 },

    #[error("Declared frame size {size} exceeds the maximum of {max} bytes")]
    OversizeFrame { size: u16, max: usize },

    #[error("Malformed {message} body: {reason}")]
    MalformedMessage {
        message: &'static str,
        reason: &'static str,
    },

    #[error("Unexpected opcode {opcode:#06x} in state {state}")]
    UnexpectedOpcode {
        opcode: u32,
        state: crate::state::ConnectionState,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: crate::state::ConnectionState,
        to: crate::state::ConnectionState,
    },
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
