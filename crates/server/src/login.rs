//! Login handshake
//!
//! The authenticating half of the session: version gate, account-service
//! round trip, proof verification, cipher installation and queue
//! placement. Every failure path maps to a specific result code, is sent
//! to the client, and closes the connection; protocol violations close
//! without a reply.

use tracing::{debug, error, warn};

use veles_protocol::messages::{client_opcodes, server_opcodes};
use veles_protocol::{
    session_proof, AuthResponse, AuthSession, ConnectionState, Frame, GameVersion, PatchOffer,
    ResultCode,
};

use bytes::BytesMut;
use veles_patch::PatchLevel;

use crate::account::AccountStatus;
use crate::connection::Session;
use crate::queue::Admission;

impl Session {
    /// Handles the one frame AUTHENTICATING accepts; false closes the session
    pub(crate) async fn handle_authentication(&mut self, frame: Frame) -> bool {
        if frame.header.opcode != client_opcodes::CMSG_AUTH_SESSION {
            debug!(
                addr = %self.handle.addr(),
                opcode = frame.header.opcode,
                "Expected CMSG_AUTH_SESSION, dropping"
            );
            return false;
        }

        let packet = match AuthSession::read_body(frame.body) {
            Ok(packet) => packet,
            Err(err) => {
                debug!(addr = %self.handle.addr(), error = %err, "Authentication packet parse failed, disconnecting");
                return false;
            }
        };

        debug!(username = %packet.username, build = packet.build, "Received session proof");

        match self.ctx.patcher.check_build(packet.build) {
            PatchLevel::Ok => {}
            PatchLevel::TooOld => {
                self.offer_patch(packet.build);
                return false;
            }
            PatchLevel::TooNew => {
                self.send_response(AuthResponse::new(ResultCode::AuthVersionMismatch));
                return false;
            }
        }

        self.fetch_session_key(packet).await
    }

    /// Asks the account service for the session key and continues with the
    /// proof; the result is dropped if the connection closed mid-flight
    async fn fetch_session_key(&mut self, packet: AuthSession) -> bool {
        let lookup = self.ctx.accounts.locate_session(&packet.username).await;

        if self.handle.is_stopped() {
            return false;
        }

        debug!(
            username = %packet.username,
            status = ?lookup.status,
            "Account server returned"
        );

        let key = match lookup.status {
            AccountStatus::Ok => match lookup.key {
                Some(key) => key,
                None => {
                    error!(username = %packet.username, "Account server returned OK without a session key");
                    self.send_response(AuthResponse::new(ResultCode::AuthSystemError));
                    return false;
                }
            },
            AccountStatus::AlreadyLoggedIn => {
                self.send_response(AuthResponse::new(ResultCode::AuthAlreadyOnline));
                return false;
            }
            AccountStatus::SessionNotFound => {
                self.send_response(AuthResponse::new(ResultCode::AuthUnknownAccount));
                return false;
            }
            AccountStatus::Error => {
                error!(username = %packet.username, "Account server error");
                self.send_response(AuthResponse::new(ResultCode::AuthSystemError));
                return false;
            }
        };

        self.prove_session(packet, key).await
    }

    async fn prove_session(&mut self, packet: AuthSession, key: Vec<u8>) -> bool {
        let expected = session_proof(
            &packet.username,
            packet.client_seed,
            self.server_seed,
            &key,
        );

        if expected != packet.digest {
            self.send_response(AuthResponse::new(ResultCode::AuthBadServerProof));
            return false;
        }

        // both directions are ciphered from here on; the writer keys its
        // state after any sends already queued
        self.recv_cipher.set_key(&key);
        self.handle.install_key(key);

        if let Err(err) = self
            .ctx
            .users
            .record_last_login(&packet.username, self.handle.addr().ip())
            .await
        {
            warn!(username = %packet.username, error = %err, "Failed to stamp last login");
        }

        match self.ctx.queue.try_admit(&self.handle) {
            Admission::Admitted => {
                if !self.transition(ConnectionState::CharacterList) {
                    return false;
                }
                self.send_response(AuthResponse::new(ResultCode::AuthOk));
            }
            Admission::Queued { position } => {
                if !self.transition(ConnectionState::InQueue { position }) {
                    return false;
                }
                self.send_response(AuthResponse::queued(position));
            }
        }

        true
    }

    /// Tells an outdated client which patch to fetch, when one exists
    fn offer_patch(&mut self, build: u32) {
        self.send_response(AuthResponse::new(ResultCode::AuthVersionMismatch));

        let Ok(build) = u16::try_from(build) else {
            return;
        };

        let client_version = GameVersion::new(0, 0, 0, build);
        let config = &self.ctx.config;

        if let Some(patch) = self.ctx.patcher.find_patch(
            &client_version,
            config.locale,
            config.platform,
            config.os,
        ) {
            debug!(
                build,
                patch = %patch.file_meta.name,
                "Offering patch"
            );

            let offer = PatchOffer {
                size: patch.file_meta.size,
                md5: patch.file_meta.md5,
                name: patch.file_meta.name.clone(),
            };

            let mut body = BytesMut::new();
            offer.write_body(&mut body);
            self.handle
                .send(server_opcodes::SMSG_PATCH_OFFER, body.freeze());
        }
    }
}
