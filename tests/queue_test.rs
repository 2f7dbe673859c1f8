//! Admission queue accounting scenarios

mod common;

use common::{allowed_versions, test_key, wait_for, TestClient, TestGateway};

use veles_patch::Patcher;
use veles_protocol::messages::server_opcodes;
use veles_protocol::{AuthResponse, ResultCode};
use veles_server::GatewayConfig;

fn capped_config(cap: usize) -> GatewayConfig {
    GatewayConfig {
        max_population: cap,
        ..GatewayConfig::default()
    }
}

#[tokio::test]
async fn test_admit_below_cap_and_release_on_disconnect() {
    let server = TestGateway::spawn(capped_config(1), Patcher::new(allowed_versions(), vec![]))
        .await;
    server.accounts.insert_session("ALICE", test_key());

    let mut client = TestClient::connect(server.addr()).await;
    let response = client.authenticate("ALICE", &test_key()).await;

    // below the cap: admitted straight to the character list
    assert_eq!(response.result, ResultCode::AuthOk);
    assert_eq!(server.gateway.population(), 1);
    assert_eq!(server.gateway.queue_len(), 0);

    drop(client);

    // the population slot and the registry entry are both released
    wait_for("population release", || server.gateway.population() == 0).await;
    wait_for("registry cleanup", || server.gateway.session_count() == 0).await;
}

#[tokio::test]
async fn test_queued_session_promoted_when_slot_frees() {
    let server = TestGateway::spawn(capped_config(1), Patcher::new(allowed_versions(), vec![]))
        .await;
    server.accounts.insert_session("ALICE", test_key());
    server.accounts.insert_session("BOB", test_key());

    let mut alice = TestClient::connect(server.addr()).await;
    assert_eq!(
        alice.authenticate("ALICE", &test_key()).await.result,
        ResultCode::AuthOk
    );

    let mut bob = TestClient::connect(server.addr()).await;
    let queued = bob.authenticate("BOB", &test_key()).await;
    assert_eq!(queued.result, ResultCode::AuthWaitQueue);
    assert_eq!(queued.queue_position, Some(1));
    assert_eq!(server.gateway.population(), 1);
    assert_eq!(server.gateway.queue_len(), 1);

    // Alice leaves; her slot goes to Bob
    drop(alice);

    let (opcode, body) = bob.read_message().await.expect("no promotion");
    assert_eq!(opcode, server_opcodes::SMSG_AUTH_RESPONSE);
    assert_eq!(
        AuthResponse::read_body(body).unwrap().result,
        ResultCode::AuthOk
    );

    wait_for("queue drained", || server.gateway.queue_len() == 0).await;
    assert_eq!(server.gateway.population(), 1);

    drop(bob);
    wait_for("population release", || server.gateway.population() == 0).await;
}

#[tokio::test]
async fn test_queued_disconnect_leaves_population_untouched() {
    let server = TestGateway::spawn(capped_config(0), Patcher::new(allowed_versions(), vec![]))
        .await;
    server.accounts.insert_session("ALICE", test_key());

    let mut client = TestClient::connect(server.addr()).await;
    let response = client.authenticate("ALICE", &test_key()).await;
    assert_eq!(response.result, ResultCode::AuthWaitQueue);
    assert_eq!(server.gateway.queue_len(), 1);

    drop(client);

    wait_for("queue cleanup", || server.gateway.queue_len() == 0).await;
    assert_eq!(server.gateway.population(), 0);
}

#[tokio::test]
async fn test_queue_positions_are_fifo() {
    let server = TestGateway::spawn(capped_config(0), Patcher::new(allowed_versions(), vec![]))
        .await;

    let mut clients = Vec::new();

    for (index, name) in ["ALICE", "BOB", "CAROL"].iter().enumerate() {
        server.accounts.insert_session(name, test_key());

        let mut client = TestClient::connect(server.addr()).await;
        let response = client.authenticate(name, &test_key()).await;
        assert_eq!(response.queue_position, Some(index as u32 + 1));
        clients.push(client);
    }

    assert_eq!(server.gateway.queue_len(), 3);
}

#[tokio::test]
async fn test_shutdown_closes_sessions() {
    let server = TestGateway::spawn(capped_config(1), Patcher::new(allowed_versions(), vec![]))
        .await;
    server.accounts.insert_session("ALICE", test_key());

    let mut client = TestClient::connect(server.addr()).await;
    assert_eq!(
        client.authenticate("ALICE", &test_key()).await.result,
        ResultCode::AuthOk
    );
    assert_eq!(server.gateway.session_count(), 1);

    server.gateway.shutdown();

    client.expect_disconnect().await;
    wait_for("registry cleanup", || server.gateway.session_count() == 0).await;
    wait_for("population release", || server.gateway.population() == 0).await;
}

#[tokio::test]
async fn test_handshake_watchdog_closes_idle_connections() {
    let config = GatewayConfig {
        max_population: 1,
        handshake_timeout: std::time::Duration::from_millis(100),
        ..GatewayConfig::default()
    };
    let server = TestGateway::spawn(config, Patcher::new(allowed_versions(), vec![])).await;

    let mut client = TestClient::connect(server.addr()).await;
    let _seed = client.read_challenge().await;

    // never answer the challenge
    client.expect_disconnect().await;
    wait_for("registry cleanup", || server.gateway.session_count() == 0).await;
}
