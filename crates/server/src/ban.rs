//! IP ban cache
//!
//! A snapshot of the CIDR ban rules, loaded once at boot and immutable
//! afterwards. The rule count is small, so a linear scan is fine. The
//! cache is consulted synchronously on accept; banned peers are closed
//! before any bytes are read.

use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::Result;

/// Ban rule store
pub trait IpBanDao: Send + Sync {
    /// Fetches every ban rule
    fn all_bans(&self) -> Result<Vec<IpNet>>;
}

/// Static rule list, for tests and file-driven setups
#[derive(Debug, Default)]
pub struct StaticIpBanDao {
    rules: Vec<IpNet>,
}

impl StaticIpBanDao {
    pub fn new(rules: Vec<IpNet>) -> Self {
        Self { rules }
    }
}

impl IpBanDao for StaticIpBanDao {
    fn all_bans(&self) -> Result<Vec<IpNet>> {
        Ok(self.rules.clone())
    }
}

/// In-memory snapshot of the ban rules
#[derive(Debug, Clone, Default)]
pub struct IpBanCache {
    rules: Vec<IpNet>,
}

impl IpBanCache {
    pub fn new(rules: Vec<IpNet>) -> Self {
        Self { rules }
    }

    /// Loads the snapshot from a DAO at boot
    pub fn from_dao(dao: &dyn IpBanDao) -> Result<Self> {
        Ok(Self::new(dao.all_bans()?))
    }

    /// Whether `ip` falls inside any banned range
    pub fn is_banned(&self, ip: IpAddr) -> bool {
        self.rules.iter().any(|net| net.contains(&ip))
    }
}
