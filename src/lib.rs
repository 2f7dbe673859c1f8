//! # Veles
//!
//! The login/gateway front-end of a multiplayer game server:
//! - accepts client TCP connections and drives the framed, partially
//!   encrypted handshake
//! - proves session ownership against the upstream account service
//! - resolves binary patches for outdated clients
//! - gates admitted sessions through a bounded population queue
//!
//! ## Components
//!
//! - `veles-protocol`: wire framing, header cipher, auth messages, the
//!   connection state machine
//! - `veles-patch`: patch metadata, per-bucket patch graphs, the resolver
//! - `veles-server`: connection handling, login handshake, admission
//!   queue, session registry, IP ban cache
//! - `veles-mdns`: the service-discovery query parser/writer
//!
//! ## Example
//!
//! See the `velesd` crate for a full daemon wiring.

pub use veles_mdns as mdns;
pub use veles_patch as patch;
pub use veles_protocol as protocol;
pub use veles_server as server;
