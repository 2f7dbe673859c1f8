//! Incremental frame assembly
//!
//! The framer consumes the connection's append-only receive buffer and
//! tracks a read state across socket reads:
//!
//! ```text
//! HEADER ──(6 bytes buffered, header decrypted + parsed)──▶ BODY
//! BODY ──(size - opcode_size bytes buffered)──▶ DONE
//! DONE ──(frame handed to the caller)──▶ HEADER
//! ```
//!
//! [`WireFramer::ingest`] is called after every socket read and is
//! idempotent with respect to insufficient data: it simply returns
//! `Ok(None)` until a full frame is buffered. Header bytes are decrypted
//! in place before field parsing once the receive cipher is keyed.

use bytes::BytesMut;

use crate::cipher::HeaderCipher;
use crate::error::{ProtocolError, Result};
use crate::header::{ClientHeader, CLIENT_HEADER_SIZE, CLIENT_OPCODE_SIZE};

/// Read state of a connection's inbound stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadState {
    /// Waiting for a full header
    #[default]
    Header,

    /// Header parsed, waiting for the body
    Body,

    /// A complete frame is buffered
    Done,
}

/// A complete inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: ClientHeader,
    pub body: bytes::Bytes,
}

/// Assembles client frames from a byte stream
#[derive(Debug)]
pub struct WireFramer {
    read_state: ReadState,
    current_header: Option<ClientHeader>,
    max_frame_size: usize,
}

impl WireFramer {
    /// Creates a framer that rejects frames whose declared size exceeds
    /// `max_frame_size` bytes (opcode + body)
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            read_state: ReadState::Header,
            current_header: None,
            max_frame_size,
        }
    }

    /// Current read state
    #[inline]
    pub fn read_state(&self) -> ReadState {
        self.read_state
    }

    /// Advances the read state against the buffered bytes
    ///
    /// Returns `Ok(Some(frame))` when a complete frame was assembled; the
    /// frame's bytes are consumed from `buf` and the framer resets to
    /// [`ReadState::Header`]. Call in a loop; a single socket read may
    /// carry several frames.
    ///
    /// A declared size smaller than the opcode field or larger than the
    /// configured maximum is a protocol violation; the caller must close
    /// the connection without replying.
    pub fn ingest(&mut self, buf: &mut BytesMut, cipher: &mut HeaderCipher) -> Result<Option<Frame>> {
        if self.read_state == ReadState::Header {
            self.parse_header(buf, cipher)?;
        }

        if self.read_state == ReadState::Body {
            self.completion_check(buf);
        }

        if self.read_state == ReadState::Done {
            let header = self
                .current_header
                .take()
                .expect("framer in DONE state without a header");
            let body = buf.split_to(header.body_len()).freeze();
            self.read_state = ReadState::Header;
            return Ok(Some(Frame { header, body }));
        }

        Ok(None)
    }

    fn parse_header(&mut self, buf: &mut BytesMut, cipher: &mut HeaderCipher) -> Result<()> {
        if buf.len() < CLIENT_HEADER_SIZE {
            return Ok(());
        }

        let mut raw = [0u8; CLIENT_HEADER_SIZE];
        raw.copy_from_slice(&buf[..CLIENT_HEADER_SIZE]);
        cipher.decrypt(&mut raw);

        let header = ClientHeader::parse(&raw);

        if (header.size as usize) < CLIENT_OPCODE_SIZE {
            return Err(ProtocolError::UndersizeFrame { size: header.size });
        }

        if header.size as usize > self.max_frame_size {
            return Err(ProtocolError::OversizeFrame {
                size: header.size,
                max: self.max_frame_size,
            });
        }

        let _ = buf.split_to(CLIENT_HEADER_SIZE);
        self.current_header = Some(header);
        self.read_state = ReadState::Body;
        Ok(())
    }

    fn completion_check(&mut self, buf: &BytesMut) {
        let header = self
            .current_header
            .as_ref()
            .expect("framer in BODY state without a header");

        if buf.len() >= header.body_len() {
            self.read_state = ReadState::Done;
        }
    }
}
