//! # Veles Server
//!
//! The gateway front-end: accepts client TCP connections, drives the
//! encrypted login handshake against the account service, resolves
//! patches for outdated clients and gates admitted sessions through a
//! bounded population queue.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use veles_patch::Patcher;
//! use veles_protocol::GameVersion;
//! use veles_server::{Gateway, GatewayConfig, IpBanCache, MockAccountService, NullUserDao};
//!
//! #[tokio::main]
//! async fn main() -> veles_server::Result<()> {
//!     let patcher = Arc::new(Patcher::new(vec![GameVersion::new(1, 12, 1, 5875)], vec![]));
//!
//!     let gateway = Arc::new(
//!         Gateway::bind(
//!             "127.0.0.1:8085",
//!             GatewayConfig::default(),
//!             patcher,
//!             Arc::new(MockAccountService::new()),
//!             Arc::new(NullUserDao),
//!             IpBanCache::default(),
//!         )
//!         .await?,
//!     );
//!
//!     gateway.run().await
//! }
//! ```

pub mod account;
pub mod ban;
pub mod config;
pub mod connection;
pub mod dao;
pub mod error;
pub mod listener;
pub mod login;
pub mod queue;
pub mod registry;

pub use account::{AccountService, AccountStatus, MockAccountService, SessionLookup};
pub use ban::{IpBanCache, IpBanDao, StaticIpBanDao};
pub use config::GatewayConfig;
pub use connection::SessionHandle;
pub use dao::{MemoryUserDao, NullUserDao, UserDao};
pub use error::{Result, ServerError};
pub use listener::{Gateway, GatewayContext};
pub use queue::{Admission, AdmissionQueue};
pub use registry::SessionRegistry;
