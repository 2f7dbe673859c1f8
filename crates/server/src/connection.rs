//! Per-connection session
//!
//! Each accepted socket gets two tasks: a reader that owns the framer,
//! the receive cipher and the connection state machine, and a writer that
//! owns the send queue and the send cipher. The writer's channel is the
//! FIFO send queue; header encryption happens inside the writer in send
//! order, so the two cipher states advance independently and never cross.
//!
//! The registry holds the one strong reference to a [`SessionHandle`];
//! the admission queue and anything else outside the owning tasks hold
//! weak ones.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, trace};
use uuid::Uuid;

use veles_protocol::messages::server_opcodes;
use veles_protocol::{AuthChallenge, AuthResponse, ConnectionState, Frame, HeaderCipher, ResultCode, ServerHeader, WireFramer};

use crate::listener::GatewayContext;

/// Control events delivered to a session's reader task
#[derive(Debug)]
pub(crate) enum SessionEvent {
    /// The admission queue granted this session a population slot
    Dequeued,

    /// Tear the session down
    Close,
}

/// Commands for a session's writer task
#[derive(Debug)]
enum WriterCmd {
    Send { opcode: u16, body: Bytes },
    InstallKey(Vec<u8>),
    Shutdown,
}

/// Shared handle to a live session
///
/// Cheap to clone behind an `Arc`; every operation is a no-op once the
/// session has stopped.
#[derive(Debug)]
pub struct SessionHandle {
    id: Uuid,
    addr: SocketAddr,
    stopped: AtomicBool,
    ctrl_tx: mpsc::UnboundedSender<SessionEvent>,
    writer_tx: mpsc::UnboundedSender<WriterCmd>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Queues a message; serialization of the header and the encryption of
    /// its bytes happen on the writer task, in send order
    pub fn send(&self, opcode: u16, body: Bytes) {
        if self.is_stopped() {
            return;
        }

        let _ = self.writer_tx.send(WriterCmd::Send { opcode, body });
    }

    /// Keys the send-side cipher; queued after any pending plaintext sends
    pub(crate) fn install_key(&self, key: Vec<u8>) {
        let _ = self.writer_tx.send(WriterCmd::InstallKey(key));
    }

    /// Posts shutdown; idempotent
    pub fn close(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let _ = self.writer_tx.send(WriterCmd::Shutdown);
        let _ = self.ctrl_tx.send(SessionEvent::Close);
    }

    /// Called by the admission queue when this session leaves its head
    pub(crate) fn notify_dequeued(&self) {
        let _ = self.ctrl_tx.send(SessionEvent::Dequeued);
    }
}

/// Accepts ownership of a fresh socket and spawns its two tasks
pub(crate) fn spawn_session(ctx: Arc<GatewayContext>, stream: TcpStream, addr: SocketAddr) {
    if let Err(err) = stream.set_nodelay(ctx.config.tcp_no_delay) {
        trace!(%addr, error = %err, "Failed to set TCP_NODELAY");
    }

    let (read_half, write_half) = stream.into_split();
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
    let (writer_tx, writer_rx) = mpsc::unbounded_channel();

    let handle = Arc::new(SessionHandle {
        id: Uuid::new_v4(),
        addr,
        stopped: AtomicBool::new(false),
        ctrl_tx: ctrl_tx.clone(),
        writer_tx,
    });

    ctx.registry.register(handle.clone());

    tokio::spawn(writer_task(writer_rx, write_half, ctrl_tx));

    let session = Session {
        handle,
        framer: WireFramer::new(ctx.config.max_frame_size),
        recv_cipher: HeaderCipher::new(),
        state: ConnectionState::Handshaking,
        server_seed: rand::random(),
        ctx,
    };

    tokio::spawn(session.run(read_half, ctrl_rx));
}

/// Owns the write half, the send queue and the send cipher
async fn writer_task(
    mut rx: mpsc::UnboundedReceiver<WriterCmd>,
    mut write_half: OwnedWriteHalf,
    ctrl_tx: mpsc::UnboundedSender<SessionEvent>,
) {
    let mut cipher = HeaderCipher::new();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WriterCmd::InstallKey(key) => cipher.set_key(&key),

            WriterCmd::Send { opcode, body } => {
                let mut head = BytesMut::new();
                ServerHeader::for_body(opcode, body.len()).write(&mut head);
                cipher.encrypt(&mut head);

                let result = async {
                    write_half.write_all(&head).await?;
                    write_half.write_all(&body).await
                }
                .await;

                if let Err(err) = result {
                    trace!(error = %err, "Send failed");
                    let _ = ctrl_tx.send(SessionEvent::Close);
                    break;
                }
            }

            WriterCmd::Shutdown => {
                // half-close; errors don't matter at this point
                let _ = write_half.shutdown().await;
                break;
            }
        }
    }
}

/// The reader task's state: framer, receive cipher and the FSM
pub(crate) struct Session {
    pub(crate) handle: Arc<SessionHandle>,
    pub(crate) ctx: Arc<GatewayContext>,
    pub(crate) state: ConnectionState,
    pub(crate) framer: WireFramer,
    pub(crate) recv_cipher: HeaderCipher,
    pub(crate) server_seed: u32,
}

impl Session {
    pub(crate) async fn run(
        mut self,
        mut read_half: OwnedReadHalf,
        mut ctrl_rx: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        self.send_auth_challenge();

        let watchdog = Instant::now() + self.ctx.config.handshake_timeout;
        let mut buf = BytesMut::with_capacity(4096);

        'session: loop {
            tokio::select! {
                event = ctrl_rx.recv() => match event {
                    Some(SessionEvent::Dequeued) => self.on_dequeued(),
                    Some(SessionEvent::Close) | None => break 'session,
                },

                result = read_half.read_buf(&mut buf) => match result {
                    Ok(0) => {
                        trace!(addr = %self.handle.addr(), "Peer disconnected");
                        break 'session;
                    }
                    Ok(_) => loop {
                        match self.framer.ingest(&mut buf, &mut self.recv_cipher) {
                            Ok(Some(frame)) => {
                                if !self.dispatch(frame).await || self.handle.is_stopped() {
                                    break 'session;
                                }
                            }
                            Ok(None) => break,
                            Err(err) => {
                                debug!(addr = %self.handle.addr(), error = %err, "Dropping connection");
                                break 'session;
                            }
                        }
                    },
                    Err(err) => {
                        if !self.handle.is_stopped() {
                            trace!(addr = %self.handle.addr(), error = %err, "Read failed");
                        }
                        break 'session;
                    }
                },

                _ = tokio::time::sleep_until(watchdog), if self.state.is_pre_auth() => {
                    debug!(addr = %self.handle.addr(), state = %self.state, "Handshake timed out");
                    break 'session;
                }
            }
        }

        self.teardown();
    }

    fn send_auth_challenge(&mut self) {
        let mut body = BytesMut::new();
        AuthChallenge {
            seed: self.server_seed,
        }
        .write_body(&mut body);

        self.handle
            .send(server_opcodes::SMSG_AUTH_CHALLENGE, body.freeze());
        self.transition(ConnectionState::Authenticating);
    }

    /// Routes a complete frame by connection state; false closes the session
    async fn dispatch(&mut self, frame: Frame) -> bool {
        match self.state {
            ConnectionState::Authenticating => self.handle_authentication(frame).await,

            // accepted but ignored pending dequeue
            ConnectionState::InQueue { .. } => {
                trace!(opcode = frame.header.opcode, "Frame ignored while queued");
                true
            }

            ConnectionState::CharacterList | ConnectionState::InWorld => {
                trace!(opcode = frame.header.opcode, "Unhandled frame");
                true
            }

            ConnectionState::Handshaking | ConnectionState::Closed => {
                error!(state = %self.state, "Frame dispatched in impossible state");
                false
            }
        }
    }

    fn on_dequeued(&mut self) {
        if !self.state.is_queued() {
            return;
        }

        self.ctx.queue.ack_promotion(&self.handle);

        if self.transition(ConnectionState::CharacterList) {
            self.send_response(AuthResponse::new(ResultCode::AuthOk));
        }
    }

    pub(crate) fn send_response(&self, response: AuthResponse) {
        let mut body = BytesMut::new();
        response.write_body(&mut body);
        self.handle
            .send(server_opcodes::SMSG_AUTH_RESPONSE, body.freeze());
    }

    /// Applies a state transition, closing the session on an impossible one
    pub(crate) fn transition(&mut self, next: ConnectionState) -> bool {
        match self.state.transition_to(next) {
            Ok(()) => true,
            Err(err) => {
                error!(addr = %self.handle.addr(), error = %err, "Connection in impossible state");
                self.handle.close();
                false
            }
        }
    }

    /// Runs exactly once, at the end of the reader task
    fn teardown(&mut self) {
        self.handle.close();
        self.ctx.queue.on_session_closed(&self.handle, self.state);
        self.ctx.registry.remove(self.handle.id());
        self.state = ConnectionState::Closed;

        trace!(addr = %self.handle.addr(), "Session torn down");
    }
}
