//! Wire-level framing behavior against a live gateway

mod common;

use common::{allowed_versions, TestClient, TestGateway};

use veles_patch::Patcher;
use veles_server::GatewayConfig;

#[tokio::test]
async fn test_oversize_frame_closes_without_reply() {
    let server =
        TestGateway::spawn(GatewayConfig::default(), Patcher::new(allowed_versions(), vec![]))
            .await;

    let mut client = TestClient::connect(server.addr()).await;
    let _seed = client.read_challenge().await;

    // declared size far above the 10 KiB default
    client.send_raw_header(0x7FFF, 0x01ED).await;

    client.expect_disconnect().await;
}

#[tokio::test]
async fn test_undersize_frame_closes_without_reply() {
    let server =
        TestGateway::spawn(GatewayConfig::default(), Patcher::new(allowed_versions(), vec![]))
            .await;

    let mut client = TestClient::connect(server.addr()).await;
    let _seed = client.read_challenge().await;

    // declared size smaller than the opcode field
    client.send_raw_header(3, 0x01ED).await;

    client.expect_disconnect().await;
}

#[tokio::test]
async fn test_partial_frames_are_reassembled() {
    let server =
        TestGateway::spawn(GatewayConfig::default(), Patcher::new(allowed_versions(), vec![]))
            .await;
    server.accounts.insert_session("ALICE", common::test_key());

    let mut client = TestClient::connect(server.addr()).await;
    let seed = client.read_challenge().await;

    // hand-feed the auth session byte by byte through a raw socket write
    use bytes::BytesMut;
    use tokio::io::AsyncWriteExt;
    use veles_protocol::messages::client_opcodes;
    use veles_protocol::{session_proof, AuthSession, ClientHeader};

    let key = common::test_key();
    let digest = session_proof("ALICE", 42, seed, &key);

    let session = AuthSession {
        build: 5875,
        unk: 0,
        username: "ALICE".to_owned(),
        client_seed: 42,
        digest,
        addon_data: bytes::Bytes::new(),
    };

    let mut body = BytesMut::new();
    session.write_body(&mut body);

    let mut wire = BytesMut::new();
    ClientHeader {
        size: (body.len() + 4) as u16,
        opcode: client_opcodes::CMSG_AUTH_SESSION,
    }
    .write(&mut wire);
    wire.extend_from_slice(&body);

    for chunk in wire.chunks(3) {
        client.stream_mut().write_all(chunk).await.unwrap();
        client.stream_mut().flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    client.set_key(&key);
    let (opcode, _) = client.read_message().await.expect("no response");
    assert_eq!(opcode, veles_protocol::messages::server_opcodes::SMSG_AUTH_RESPONSE);
}
