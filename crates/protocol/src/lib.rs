//! # Veles Protocol
//!
//! Wire protocol definitions for the Veles gateway.
//!
//! This crate provides:
//! - `ClientHeader`/`ServerHeader`: the asymmetric frame headers
//! - `WireFramer`: incremental frame assembly over a byte stream
//! - `HeaderCipher`: the header-only stream cipher keyed from the session key
//! - Authentication messages: AUTH_CHALLENGE, AUTH_SESSION, AUTH_RESPONSE
//! - `ConnectionState`: the per-connection state machine
//! - `GameVersion`: client build identification
//!
//! ## Example
//!
//! ```
//! use veles_protocol::{WireFramer, HeaderCipher};
//! use bytes::{BufMut, BytesMut};
//!
//! let mut framer = WireFramer::new(10 * 1024);
//! let mut cipher = HeaderCipher::new();
//! let mut buf = BytesMut::new();
//!
//! // size (big-endian, covers opcode + body) | opcode (little-endian)
//! buf.put_u16(8);
//! buf.put_u32_le(0x01ED);
//! buf.put_slice(b"body");
//!
//! let frame = framer.ingest(&mut buf, &mut cipher).unwrap().unwrap();
//! assert_eq!(frame.header.opcode, 0x01ED);
//! assert_eq!(&frame.body[..], b"body");
//! ```

pub mod cipher;
pub mod error;
pub mod framer;
pub mod header;
pub mod messages;
pub mod proof;
pub mod state;
pub mod version;

pub use cipher::HeaderCipher;
pub use error::{ProtocolError, Result};
pub use framer::{Frame, ReadState, WireFramer};
pub use header::{
    ClientHeader, ServerHeader, CLIENT_HEADER_SIZE, CLIENT_OPCODE_SIZE, SERVER_HEADER_SIZE,
    SERVER_OPCODE_SIZE,
};
pub use messages::{
    client_opcodes, server_opcodes, AuthChallenge, AuthResponse, AuthSession, PatchOffer,
    ResultCode,
};
pub use proof::session_proof;
pub use state::ConnectionState;
pub use version::GameVersion;
