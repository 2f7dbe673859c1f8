//! Gateway configuration

use std::time::Duration;

use veles_patch::{Locale, Os, Platform};

/// Runtime configuration of the gateway
///
/// The locale/platform/OS triple selects the patch bucket for outdated
/// clients; the 6-byte auth header carries no platform information, so the
/// gateway serves a single enforced bucket.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// World population cap; a connection authenticating at or above it
    /// is queued instead of admitted
    pub max_population: usize,

    /// Connections still in Handshaking/Authenticating after this long
    /// are closed
    pub handshake_timeout: Duration,

    /// Maximum declared client frame size (opcode + body)
    pub max_frame_size: usize,

    /// Patch bucket served to outdated clients
    pub locale: Locale,
    pub platform: Platform,
    pub os: Os,

    /// Disable Nagle on accepted sockets
    pub tcp_no_delay: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_population: 100,
            handshake_timeout: Duration::from_secs(30),
            max_frame_size: 10 * 1024,
            locale: Locale::EnUs,
            platform: Platform::X86,
            os: Os::Win,
            tcp_no_delay: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.max_population, 100);
        assert_eq!(config.handshake_timeout, Duration::from_secs(30));
        assert_eq!(config.max_frame_size, 10 * 1024);
        assert!(config.tcp_no_delay);
    }
}
