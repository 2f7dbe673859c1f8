//! TCP listener and service wiring
//!
//! The gateway binds up front so callers can learn the actual address
//! (tests bind port 0), then runs a plain accept loop. The ban cache is
//! consulted synchronously on accept; a banned peer's socket is dropped
//! before any bytes are read.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tracing::{debug, error, info};

use veles_patch::Patcher;

use crate::account::AccountService;
use crate::ban::IpBanCache;
use crate::config::GatewayConfig;
use crate::connection::spawn_session;
use crate::dao::UserDao;
use crate::error::{Result, ServerError};
use crate::queue::AdmissionQueue;
use crate::registry::SessionRegistry;

/// Shared services every session runs against
///
/// The patcher and ban cache are read-only after construction; the queue
/// and registry guard their own state.
pub struct GatewayContext {
    pub config: GatewayConfig,
    pub patcher: Arc<Patcher>,
    pub accounts: Arc<dyn AccountService>,
    pub users: Arc<dyn UserDao>,
    pub bans: IpBanCache,
    pub queue: AdmissionQueue,
    pub registry: SessionRegistry,
}

/// The gateway server
pub struct Gateway {
    ctx: Arc<GatewayContext>,
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
}

impl Gateway {
    /// Binds the listener and assembles the service context
    pub async fn bind(
        addr: &str,
        config: GatewayConfig,
        patcher: Arc<Patcher>,
        accounts: Arc<dyn AccountService>,
        users: Arc<dyn UserDao>,
        bans: IpBanCache,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_owned(),
                source,
            })?;

        let local_addr = listener.local_addr()?;
        let queue = AdmissionQueue::new(config.max_population);

        Ok(Self {
            ctx: Arc::new(GatewayContext {
                config,
                patcher,
                accounts,
                users,
                bans,
                queue,
                registry: SessionRegistry::new(),
            }),
            listener: Mutex::new(Some(listener)),
            local_addr,
        })
    }

    /// The bound address; useful when binding port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn population(&self) -> usize {
        self.ctx.queue.population()
    }

    pub fn queue_len(&self) -> usize {
        self.ctx.queue.len()
    }

    pub fn session_count(&self) -> usize {
        self.ctx.registry.count()
    }

    /// Access to the admission gate, for tooling and tests
    pub fn queue(&self) -> &AdmissionQueue {
        &self.ctx.queue
    }

    /// Closes every live session
    pub fn shutdown(&self) {
        self.ctx.registry.shutdown();
    }

    /// Runs the accept loop until the task is dropped
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = self
            .listener
            .lock()
            .expect("listener slot poisoned")
            .take()
            .ok_or(ServerError::AlreadyStarted)?;

        info!(addr = %self.local_addr, "Gateway listening");

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    if self.ctx.bans.is_banned(addr.ip()) {
                        debug!(%addr, "Rejected banned address");
                        continue;
                    }

                    debug!(%addr, "New connection");
                    spawn_session(self.ctx.clone(), stream, addr);
                }
                Err(err) => {
                    error!(error = %err, "Accept failed");
                }
            }
        }
    }
}
