//! Account-service seam
//!
//! The account service owns the session keys negotiated during client
//! login; the gateway only asks it where a session lives. The call is
//! asynchronous and completes on the runtime; a response arriving after
//! its connection closed is dropped by the caller.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

/// Status returned by the account service for a session lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Ok,
    AlreadyLoggedIn,
    SessionNotFound,
    Error,
}

/// Result of a session lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLookup {
    pub status: AccountStatus,

    /// Session key bytes, big-endian big-integer encoding; present only
    /// when `status` is [`AccountStatus::Ok`]
    pub key: Option<Vec<u8>>,
}

impl SessionLookup {
    pub fn ok(key: Vec<u8>) -> Self {
        Self {
            status: AccountStatus::Ok,
            key: Some(key),
        }
    }

    pub fn status(status: AccountStatus) -> Self {
        Self { status, key: None }
    }
}

/// Upstream account service
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Locates the session for `username`, returning its shared secret
    async fn locate_session(&self, username: &str) -> SessionLookup;
}

/// In-memory account service for tests
///
/// Sessions are registered up front; anything else reports
/// `SESSION_NOT_FOUND`.
#[derive(Debug, Default)]
pub struct MockAccountService {
    responses: Mutex<HashMap<String, SessionLookup>>,
}

impl MockAccountService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a known session key for `username`
    pub fn insert_session(&self, username: &str, key: Vec<u8>) {
        self.responses
            .lock()
            .expect("account responses poisoned")
            .insert(username.to_owned(), SessionLookup::ok(key));
    }

    /// Forces a fixed status for `username`
    pub fn insert_status(&self, username: &str, status: AccountStatus) {
        self.responses
            .lock()
            .expect("account responses poisoned")
            .insert(username.to_owned(), SessionLookup::status(status));
    }
}

#[async_trait]
impl AccountService for MockAccountService {
    async fn locate_session(&self, username: &str) -> SessionLookup {
        self.responses
            .lock()
            .expect("account responses poisoned")
            .get(username)
            .cloned()
            .unwrap_or_else(|| SessionLookup::status(AccountStatus::SessionNotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_known_session() {
        let service = MockAccountService::new();
        service.insert_session("ALICE", vec![1, 2, 3]);

        let lookup = service.locate_session("ALICE").await;
        assert_eq!(lookup.status, AccountStatus::Ok);
        assert_eq!(lookup.key, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_mock_unknown_session() {
        let service = MockAccountService::new();

        let lookup = service.locate_session("NOBODY").await;
        assert_eq!(lookup.status, AccountStatus::SessionNotFound);
        assert_eq!(lookup.key, None);
    }

    #[tokio::test]
    async fn test_mock_forced_status() {
        let service = MockAccountService::new();
        service.insert_status("BOB", AccountStatus::AlreadyLoggedIn);

        let lookup = service.locate_session("BOB").await;
        assert_eq!(lookup.status, AccountStatus::AlreadyLoggedIn);
    }
}
