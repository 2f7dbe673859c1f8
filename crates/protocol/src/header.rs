//! Frame headers for the Veles wire protocol
//!
//! The protocol is asymmetric: the client prefixes frames with a 6-byte
//! header, the server with a 4-byte one. In both directions `size` is
//! big-endian and counts the opcode plus the body, while the opcode itself
//! is little-endian. Once the stream cipher is keyed, only these header
//! bytes are ciphered; bodies stay plaintext.
//!
//! Wire format (client → server):
//! ```text
//! ┌────────┬─────┬──────────────┬─────────┐
//! │ size   │ u16 │  big-endian  │ 2 bytes │
//! ├────────┼─────┼──────────────┼─────────┤
//! │ opcode │ u32 │ little-endian│ 4 bytes │
//! └────────┴─────┴──────────────┴─────────┘
//! ```
//!
//! Wire format (server → client):
//! ```text
//! ┌────────┬─────┬──────────────┬─────────┐
//! │ size   │ u16 │  big-endian  │ 2 bytes │
//! ├────────┼─────┼──────────────┼─────────┤
//! │ opcode │ u16 │ little-endian│ 2 bytes │
//! └────────┴─────┴──────────────┴─────────┘
//! ```

use bytes::{Buf, BufMut, BytesMut};

/// Size of the client → server header in bytes
pub const CLIENT_HEADER_SIZE: usize = 6;

/// Size of the opcode field in a client → server header
pub const CLIENT_OPCODE_SIZE: usize = 4;

/// Size of the server → client header in bytes
pub const SERVER_HEADER_SIZE: usize = 4;

/// Size of the opcode field in a server → client header
pub const SERVER_OPCODE_SIZE: usize = 2;

/// Header prefixed to every client → server frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHeader {
    /// Length of opcode + body, excluding the size field itself
    pub size: u16,

    /// Message opcode
    pub opcode: u32,
}

impl ClientHeader {
    /// Parses a header from exactly [`CLIENT_HEADER_SIZE`] raw bytes
    ///
    /// The caller is responsible for decrypting the bytes first when the
    /// stream cipher is active.
    pub fn parse(mut raw: &[u8]) -> Self {
        debug_assert!(raw.len() >= CLIENT_HEADER_SIZE);
        let size = raw.get_u16();
        let opcode = raw.get_u32_le();
        Self { size, opcode }
    }

    /// Serializes the header into a buffer
    pub fn write(&self, buf: &mut BytesMut) {
        buf.put_u16(self.size);
        buf.put_u32_le(self.opcode);
    }

    /// Number of body bytes that follow the header
    #[inline]
    pub fn body_len(&self) -> usize {
        self.size as usize - CLIENT_OPCODE_SIZE
    }
}

/// Header prefixed to every server → client frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHeader {
    /// Length of opcode + body, excluding the size field itself
    pub size: u16,

    /// Message opcode
    pub opcode: u16,
}

impl ServerHeader {
    /// Builds a header for a body of `body_len` bytes
    pub fn for_body(opcode: u16, body_len: usize) -> Self {
        Self {
            size: (body_len + SERVER_OPCODE_SIZE) as u16,
            opcode,
        }
    }

    pub fn parse(mut raw: &[u8]) -> Self {
        debug_assert!(raw.len() >= SERVER_HEADER_SIZE);
        let size = raw.get_u16();
        let opcode = raw.get_u16_le();
        Self { size, opcode }
    }

    pub fn write(&self, buf: &mut BytesMut) {
        buf.put_u16(self.size);
        buf.put_u16_le(self.opcode);
    }

    #[inline]
    pub fn body_len(&self) -> usize {
        self.size as usize - SERVER_OPCODE_SIZE
    }
}
