//! Daemon configuration file
//!
//! TOML, one file, path given on the command line. Patch rows and dev
//! account sessions live here too; production deployments swap those
//! sections for database-backed stores behind the same traits.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use veles_patch::{FileMeta, Locale, Os, PatchMeta, Platform};
use veles_protocol::GameVersion;
use veles_server::GatewayConfig;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub network: NetworkSection,

    #[serde(default)]
    pub gateway: GatewaySection,

    pub patches: PatchesSection,

    #[serde(default)]
    pub survey: SurveySection,

    /// Client builds allowed to connect
    pub versions: Vec<VersionRow>,

    /// Banned CIDR ranges
    #[serde(default)]
    pub bans: Vec<String>,

    /// Development account sessions served by the in-process account stub
    #[serde(default)]
    pub accounts: Vec<AccountRow>,

    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSection {
    #[serde(default = "default_interface")]
    pub interface: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub tcp_no_delay: bool,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            port: default_port(),
            tcp_no_delay: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_population")]
    pub max_population: usize,

    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    #[serde(default = "default_frame_size")]
    pub max_frame_size: usize,

    #[serde(default = "default_locale")]
    pub locale: Locale,

    #[serde(default = "default_platform")]
    pub platform: Platform,

    #[serde(default = "default_os")]
    pub os: Os,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            max_population: default_population(),
            handshake_timeout_secs: default_handshake_timeout(),
            max_frame_size: default_frame_size(),
            locale: default_locale(),
            platform: default_platform(),
            os: default_os(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchesSection {
    /// Directory holding the patch blobs
    pub bin_path: PathBuf,

    /// Patch metadata rows
    #[serde(default)]
    pub files: Vec<PatchRow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchRow {
    pub name: String,
    pub build_from: u16,
    pub build_to: u16,
    pub locale: Locale,
    pub arch: Platform,
    pub os: Os,

    #[serde(default)]
    pub rollup: bool,

    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveySection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub bin_path: PathBuf,

    #[serde(default)]
    pub id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionRow {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub build: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountRow {
    pub username: String,
    pub session_key: Vec<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("Unable to open configuration file {}: {err}", path.display()))?;

        Ok(toml::from_str(&raw)?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.network.interface, self.network.port)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            max_population: self.gateway.max_population,
            handshake_timeout: Duration::from_secs(self.gateway.handshake_timeout_secs),
            max_frame_size: self.gateway.max_frame_size,
            locale: self.gateway.locale,
            platform: self.gateway.platform,
            os: self.gateway.os,
            tcp_no_delay: self.network.tcp_no_delay,
        }
    }

    pub fn allowed_versions(&self) -> Vec<GameVersion> {
        self.versions
            .iter()
            .map(|row| GameVersion::new(row.major, row.minor, row.patch, row.build))
            .collect()
    }

    pub fn patch_rows(&self) -> Vec<PatchMeta> {
        self.patches
            .files
            .iter()
            .map(|row| PatchMeta {
                file_meta: FileMeta::new(row.name.clone(), row.size),
                build_from: row.build_from,
                build_to: row.build_to,
                locale: row.locale,
                arch: row.arch,
                os: row.os,
                rollup: row.rollup,
                survey_id: 0,
            })
            .collect()
    }
}

fn default_interface() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8085
}

fn default_true() -> bool {
    true
}

fn default_population() -> usize {
    100
}

fn default_handshake_timeout() -> u64 {
    30
}

fn default_frame_size() -> usize {
    10 * 1024
}

fn default_locale() -> Locale {
    Locale::EnUs
}

fn default_platform() -> Platform {
    Platform::X86
}

fn default_os() -> Os {
    Os::Win
}

fn default_log_level() -> String {
    "info".to_owned()
}
