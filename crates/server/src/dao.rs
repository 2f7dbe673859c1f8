//! User persistence seam
//!
//! The gateway's only write is the last-login stamp; everything else about
//! the user lives behind the account service.

use std::net::IpAddr;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;

/// User store
#[async_trait]
pub trait UserDao: Send + Sync {
    /// Stamps the time and source address of a successful login
    async fn record_last_login(&self, username: &str, ip: IpAddr) -> Result<()>;
}

/// Discards writes; for setups without a user database
#[derive(Debug, Default)]
pub struct NullUserDao;

#[async_trait]
impl UserDao for NullUserDao {
    async fn record_last_login(&self, _username: &str, _ip: IpAddr) -> Result<()> {
        Ok(())
    }
}

/// Records writes in memory, for tests
#[derive(Debug, Default)]
pub struct MemoryUserDao {
    logins: Mutex<Vec<(String, IpAddr)>>,
}

impl MemoryUserDao {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logins(&self) -> Vec<(String, IpAddr)> {
        self.logins.lock().expect("login log poisoned").clone()
    }
}

#[async_trait]
impl UserDao for MemoryUserDao {
    async fn record_last_login(&self, username: &str, ip: IpAddr) -> Result<()> {
        self.logins
            .lock()
            .expect("login log poisoned")
            .push((username.to_owned(), ip));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_memory_dao_records() {
        let dao = MemoryUserDao::new();
        dao.record_last_login("ALICE", IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();

        let logins = dao.logins();
        assert_eq!(logins.len(), 1);
        assert_eq!(logins[0].0, "ALICE");
    }

    #[tokio::test]
    async fn test_null_dao_discards() {
        let dao = NullUserDao;
        dao.record_last_login("ALICE", IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();
    }
}
