//! Shared harness for the gateway integration tests
//!
//! Spawns a real gateway on a loopback port and drives it with a scripted
//! client speaking the raw wire protocol.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use veles_patch::Patcher;
use veles_protocol::messages::{client_opcodes, server_opcodes};
use veles_protocol::{
    session_proof, AuthChallenge, AuthResponse, AuthSession, GameVersion, HeaderCipher,
    ServerHeader, SERVER_HEADER_SIZE,
};
use veles_server::{
    Gateway, GatewayConfig, IpBanCache, MemoryUserDao, MockAccountService, UserDao,
};

/// The session key from the account service in the happy-path scenario
pub fn test_key() -> Vec<u8> {
    (1..=40).collect()
}

pub fn allowed_versions() -> Vec<GameVersion> {
    vec![
        GameVersion::new(1, 12, 1, 5875),
        GameVersion::new(1, 12, 2, 6005),
    ]
}

pub struct TestGateway {
    pub gateway: Arc<Gateway>,
    pub accounts: Arc<MockAccountService>,
    pub users: Arc<MemoryUserDao>,
}

impl TestGateway {
    pub async fn spawn(config: GatewayConfig, patcher: Patcher) -> Self {
        Self::spawn_with_bans(config, patcher, IpBanCache::default()).await
    }

    pub async fn spawn_with_bans(
        config: GatewayConfig,
        patcher: Patcher,
        bans: IpBanCache,
    ) -> Self {
        let accounts = Arc::new(MockAccountService::new());
        let users = Arc::new(MemoryUserDao::new());

        let gateway = Arc::new(
            Gateway::bind(
                "127.0.0.1:0",
                config,
                Arc::new(patcher),
                accounts.clone(),
                users.clone() as Arc<dyn UserDao>,
                bans,
            )
            .await
            .expect("bind failed"),
        );

        tokio::spawn(gateway.clone().run());

        Self {
            gateway,
            accounts,
            users,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.gateway.local_addr()
    }
}

/// Polls until `predicate` holds; fails the test after two seconds
pub async fn wait_for(what: &str, predicate: impl Fn() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("timed out waiting for {what}");
}

/// Scripted wire-protocol client
pub struct TestClient {
    stream: TcpStream,
    send_cipher: HeaderCipher,
    recv_cipher: HeaderCipher,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");

        Self {
            stream,
            send_cipher: HeaderCipher::new(),
            recv_cipher: HeaderCipher::new(),
        }
    }

    /// Raw socket access, for tests that shape their own bytes
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Keys both cipher directions, as the real client does on proof success
    pub fn set_key(&mut self, key: &[u8]) {
        self.send_cipher.set_key(key);
        self.recv_cipher.set_key(key);
    }

    /// Reads one server → client message
    pub async fn read_message(&mut self) -> std::io::Result<(u16, Bytes)> {
        let mut head = [0u8; SERVER_HEADER_SIZE];
        self.stream.read_exact(&mut head).await?;
        self.recv_cipher.decrypt(&mut head);

        let header = ServerHeader::parse(&head);
        let mut body = vec![0u8; header.body_len()];
        self.stream.read_exact(&mut body).await?;

        Ok((header.opcode, Bytes::from(body)))
    }

    /// Sends one client → server frame
    pub async fn send_frame(&mut self, opcode: u32, body: &[u8]) {
        let mut head = BytesMut::new();
        veles_protocol::ClientHeader {
            size: (body.len() + 4) as u16,
            opcode,
        }
        .write(&mut head);
        self.send_cipher.encrypt(&mut head);

        self.stream.write_all(&head).await.expect("send failed");
        self.stream.write_all(body).await.expect("send failed");
    }

    /// Sends raw header fields without size bookkeeping, for malformed frames
    pub async fn send_raw_header(&mut self, size: u16, opcode: u32) {
        let mut head = BytesMut::new();
        veles_protocol::ClientHeader { size, opcode }.write(&mut head);
        self.send_cipher.encrypt(&mut head);
        self.stream.write_all(&head).await.expect("send failed");
    }

    /// Reads the unsolicited SMSG_AUTH_CHALLENGE and returns its seed
    pub async fn read_challenge(&mut self) -> u32 {
        let (opcode, body) = self.read_message().await.expect("no challenge");
        assert_eq!(opcode, server_opcodes::SMSG_AUTH_CHALLENGE);
        AuthChallenge::read_body(body).expect("bad challenge").seed
    }

    /// Sends CMSG_AUTH_SESSION with the given digest
    pub async fn send_auth_session(&mut self, username: &str, client_seed: u32, digest: [u8; 20]) {
        let session = AuthSession {
            build: 5875,
            unk: 0,
            username: username.to_owned(),
            client_seed,
            digest,
            addon_data: Bytes::new(),
        };

        let mut body = BytesMut::new();
        session.write_body(&mut body);
        self.send_frame(client_opcodes::CMSG_AUTH_SESSION, &body).await;
    }

    /// Full handshake with a correct proof; returns the auth response
    pub async fn authenticate(&mut self, username: &str, key: &[u8]) -> AuthResponse {
        let server_seed = self.read_challenge().await;
        let client_seed = 0x1111_1111;
        let digest = session_proof(username, client_seed, server_seed, key);

        self.send_auth_session(username, client_seed, digest).await;

        // from here both directions are ciphered
        self.set_key(key);

        let (opcode, body) = self.read_message().await.expect("no auth response");
        assert_eq!(opcode, server_opcodes::SMSG_AUTH_RESPONSE);
        AuthResponse::read_body(body).expect("bad auth response")
    }

    /// Expects the peer to drop the connection
    pub async fn expect_disconnect(&mut self) {
        let mut scratch = [0u8; 64];

        let deadline = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match self.stream.read(&mut scratch).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
        });

        deadline.await.expect("peer never disconnected");
    }
}
