//! Authentication messages for the Veles gateway
//!
//! Bodies are hand-framed binary: integers little-endian, strings
//! NUL-terminated. The frame headers (and only the headers) are ciphered
//! once the session cipher is keyed; every body here is plaintext.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ProtocolError, Result};

/// Client → server opcodes (u32)
pub mod client_opcodes {
    /// CMSG_AUTH_SESSION: session proof in response to the auth challenge
    pub const CMSG_AUTH_SESSION: u32 = 0x01ED;
}

/// Server → client opcodes (u16)
pub mod server_opcodes {
    /// SMSG_AUTH_CHALLENGE: unsolicited seed sent on connect
    pub const SMSG_AUTH_CHALLENGE: u16 = 0x01EC;

    /// SMSG_AUTH_RESPONSE: result of the authentication attempt
    pub const SMSG_AUTH_RESPONSE: u16 = 0x01EE;

    /// SMSG_PATCH_OFFER: metadata of a patch the client should apply
    pub const SMSG_PATCH_OFFER: u16 = 0x01EF;
}

/// Result codes carried by SMSG_AUTH_RESPONSE
///
/// Values follow the legacy protocol numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultCode {
    AuthOk = 0x0C,
    AuthBadServerProof = 0x0F,
    AuthSystemError = 0x11,
    AuthVersionMismatch = 0x14,
    AuthUnknownAccount = 0x15,
    AuthWaitQueue = 0x1B,
    AuthBanned = 0x1C,
    AuthAlreadyOnline = 0x1D,
}

impl ResultCode {
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0C => Some(Self::AuthOk),
            0x0F => Some(Self::AuthBadServerProof),
            0x11 => Some(Self::AuthSystemError),
            0x14 => Some(Self::AuthVersionMismatch),
            0x15 => Some(Self::AuthUnknownAccount),
            0x1B => Some(Self::AuthWaitQueue),
            0x1C => Some(Self::AuthBanned),
            0x1D => Some(Self::AuthAlreadyOnline),
            _ => None,
        }
    }
}

/// SMSG_AUTH_CHALLENGE: the server's seed for the session proof
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthChallenge {
    pub seed: u32,
}

impl AuthChallenge {
    pub fn write_body(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.seed);
    }

    pub fn read_body(mut body: Bytes) -> Result<Self> {
        if body.len() < 4 {
            return Err(ProtocolError::MalformedMessage {
                message: "SMSG_AUTH_CHALLENGE",
                reason: "body shorter than the seed field",
            });
        }

        Ok(Self {
            seed: body.get_u32_le(),
        })
    }
}

/// CMSG_AUTH_SESSION: the client's session proof
///
/// The digest is `SHA-1(username || 0u32 || client_seed || server_seed ||
/// session_key)`; see [`crate::proof::session_proof`]. Whatever trails the
/// digest is the addon blob, passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub build: u32,
    pub unk: u32,
    pub username: String,
    pub client_seed: u32,
    pub digest: [u8; 20],
    pub addon_data: Bytes,
}

impl AuthSession {
    pub fn write_body(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.build);
        buf.put_u32_le(self.unk);
        buf.put_slice(self.username.as_bytes());
        buf.put_u8(0);
        buf.put_u32_le(self.client_seed);
        buf.put_slice(&self.digest);
        buf.put_slice(&self.addon_data);
    }

    pub fn read_body(mut body: Bytes) -> Result<Self> {
        if body.len() < 8 {
            return Err(ProtocolError::MalformedMessage {
                message: "CMSG_AUTH_SESSION",
                reason: "body shorter than the fixed fields",
            });
        }

        let build = body.get_u32_le();
        let unk = body.get_u32_le();

        let nul = body.iter().position(|&b| b == 0).ok_or(
            ProtocolError::MalformedMessage {
                message: "CMSG_AUTH_SESSION",
                reason: "username is not NUL-terminated",
            },
        )?;

        let raw_name = body.split_to(nul);
        body.advance(1); // the terminator

        let username = std::str::from_utf8(&raw_name)
            .map_err(|_| ProtocolError::MalformedMessage {
                message: "CMSG_AUTH_SESSION",
                reason: "username is not valid UTF-8",
            })?
            .to_owned();

        if body.len() < 4 + 20 {
            return Err(ProtocolError::MalformedMessage {
                message: "CMSG_AUTH_SESSION",
                reason: "body truncated before the digest",
            });
        }

        let client_seed = body.get_u32_le();
        let mut digest = [0u8; 20];
        body.copy_to_slice(&mut digest);

        Ok(Self {
            build,
            unk,
            username,
            client_seed,
            digest,
            addon_data: body,
        })
    }
}

/// SMSG_AUTH_RESPONSE: outcome of the authentication attempt
///
/// Carries the queue position only when the result is
/// [`ResultCode::AuthWaitQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthResponse {
    pub result: ResultCode,
    pub queue_position: Option<u32>,
}

impl AuthResponse {
    pub fn new(result: ResultCode) -> Self {
        Self {
            result,
            queue_position: None,
        }
    }

    pub fn queued(position: u32) -> Self {
        Self {
            result: ResultCode::AuthWaitQueue,
            queue_position: Some(position),
        }
    }

    pub fn write_body(&self, buf: &mut BytesMut) {
        buf.put_u8(self.result.as_u8());

        if let Some(position) = self.queue_position {
            buf.put_u32_le(position);
        }
    }

    pub fn read_body(mut body: Bytes) -> Result<Self> {
        if body.is_empty() {
            return Err(ProtocolError::MalformedMessage {
                message: "SMSG_AUTH_RESPONSE",
                reason: "empty body",
            });
        }

        let raw = body.get_u8();
        let result = ResultCode::from_u8(raw).ok_or(ProtocolError::MalformedMessage {
            message: "SMSG_AUTH_RESPONSE",
            reason: "unknown result code",
        })?;

        let queue_position = if result == ResultCode::AuthWaitQueue && body.len() >= 4 {
            Some(body.get_u32_le())
        } else {
            None
        };

        Ok(Self {
            result,
            queue_position,
        })
    }
}

/// SMSG_PATCH_OFFER: file metadata of the patch an outdated client needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOffer {
    pub size: u64,
    pub md5: [u8; 16],
    pub name: String,
}

impl PatchOffer {
    pub fn write_body(&self, buf: &mut BytesMut) {
        buf.put_u64_le(self.size);
        buf.put_slice(&self.md5);
        buf.put_slice(self.name.as_bytes());
        buf.put_u8(0);
    }

    pub fn read_body(mut body: Bytes) -> Result<Self> {
        if body.len() < 8 + 16 + 1 {
            return Err(ProtocolError::MalformedMessage {
                message: "SMSG_PATCH_OFFER",
                reason: "body truncated",
            });
        }

        let size = body.get_u64_le();
        let mut md5 = [0u8; 16];
        body.copy_to_slice(&mut md5);

        let nul = body.iter().position(|&b| b == 0).ok_or(
            ProtocolError::MalformedMessage {
                message: "SMSG_PATCH_OFFER",
                reason: "name is not NUL-terminated",
            },
        )?;

        let raw_name = body.split_to(nul);
        let name = std::str::from_utf8(&raw_name)
            .map_err(|_| ProtocolError::MalformedMessage {
                message: "SMSG_PATCH_OFFER",
                reason: "name is not valid UTF-8",
            })?
            .to_owned();

        Ok(Self { size, md5, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_challenge_roundtrip() {
        let challenge = AuthChallenge { seed: 600 };
        let mut buf = BytesMut::new();
        challenge.write_body(&mut buf);
        assert_eq!(&buf[..], &[0x58, 0x02, 0x00, 0x00]);

        let parsed = AuthChallenge::read_body(buf.freeze()).unwrap();
        assert_eq!(parsed, challenge);
    }

    #[test]
    fn test_auth_session_roundtrip() {
        let session = AuthSession {
            build: 5875,
            unk: 0,
            username: "ALICE".to_owned(),
            client_seed: 0x1111_1111,
            digest: [0xAB; 20],
            addon_data: Bytes::from_static(b"addons"),
        };

        let mut buf = BytesMut::new();
        session.write_body(&mut buf);

        let parsed = AuthSession::read_body(buf.freeze()).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_auth_session_empty_addon_data() {
        let session = AuthSession {
            build: 6005,
            unk: 0,
            username: "BOB".to_owned(),
            client_seed: 1,
            digest: [0u8; 20],
            addon_data: Bytes::new(),
        };

        let mut buf = BytesMut::new();
        session.write_body(&mut buf);

        let parsed = AuthSession::read_body(buf.freeze()).unwrap();
        assert!(parsed.addon_data.is_empty());
    }

    #[test]
    fn test_auth_session_missing_terminator() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(5875);
        buf.put_u32_le(0);
        buf.put_slice(b"ALICE"); // no NUL, no seed, no digest

        let err = AuthSession::read_body(buf.freeze()).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedMessage { .. }));
    }

    #[test]
    fn test_auth_session_truncated_digest() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(5875);
        buf.put_u32_le(0);
        buf.put_slice(b"ALICE\0");
        buf.put_u32_le(7);
        buf.put_slice(&[0u8; 10]); // half a digest

        let err = AuthSession::read_body(buf.freeze()).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedMessage { .. }));
    }

    #[test]
    fn test_auth_response_result_only() {
        let response = AuthResponse::new(ResultCode::AuthBadServerProof);
        let mut buf = BytesMut::new();
        response.write_body(&mut buf);
        assert_eq!(&buf[..], &[0x0F]);

        let parsed = AuthResponse::read_body(buf.freeze()).unwrap();
        assert_eq!(parsed.result, ResultCode::AuthBadServerProof);
        assert_eq!(parsed.queue_position, None);
    }

    #[test]
    fn test_auth_response_queued() {
        let response = AuthResponse::queued(3);
        let mut buf = BytesMut::new();
        response.write_body(&mut buf);

        let parsed = AuthResponse::read_body(buf.freeze()).unwrap();
        assert_eq!(parsed.result, ResultCode::AuthWaitQueue);
        assert_eq!(parsed.queue_position, Some(3));
    }

    #[test]
    fn test_patch_offer_roundtrip() {
        let offer = PatchOffer {
            size: 300 * 1024 * 1024,
            md5: [0x42; 16],
            name: "base-4000-5464.patch".to_owned(),
        };

        let mut buf = BytesMut::new();
        offer.write_body(&mut buf);

        let parsed = PatchOffer::read_body(buf.freeze()).unwrap();
        assert_eq!(parsed, offer);
    }

    #[test]
    fn test_result_code_values() {
        assert_eq!(ResultCode::AuthOk.as_u8(), 0x0C);
        assert_eq!(ResultCode::AuthWaitQueue.as_u8(), 0x1B);
        assert_eq!(ResultCode::from_u8(0x1D), Some(ResultCode::AuthAlreadyOnline));
        assert_eq!(ResultCode::from_u8(0xFF), None);
    }
}
