//! Patch and survey file metadata

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Client locale, as reported during the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "enUS")]
    EnUs,
    #[serde(rename = "enGB")]
    EnGb,
    #[serde(rename = "deDE")]
    DeDe,
    #[serde(rename = "frFR")]
    FrFr,
    #[serde(rename = "esES")]
    EsEs,
    #[serde(rename = "koKR")]
    KoKr,
    #[serde(rename = "zhCN")]
    ZhCn,
    #[serde(rename = "zhTW")]
    ZhTw,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::EnUs => "enUS",
            Locale::EnGb => "enGB",
            Locale::DeDe => "deDE",
            Locale::FrFr => "frFR",
            Locale::EsEs => "esES",
            Locale::KoKr => "koKR",
            Locale::ZhCn => "zhCN",
            Locale::ZhTw => "zhTW",
        }
    }
}

/// Client CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "PPC")]
    Ppc,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::X86 => "x86",
            Platform::Ppc => "PPC",
        }
    }
}

/// Client operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    #[serde(rename = "Win")]
    Win,
    #[serde(rename = "OSX")]
    Osx,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Win => "Win",
            Os::Osx => "OSX",
        }
    }
}

/// On-disk file identity shared by patches and the survey blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// File name under the patch root
    pub name: String,

    /// Directory the file was loaded from; set during boot
    pub path: PathBuf,

    /// File size in bytes; repaired from disk when stored as zero
    pub size: u64,

    /// MD5 of the file contents; recomputed when stored as all-zero
    pub md5: [u8; 16],
}

impl FileMeta {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            size,
            md5: [0u8; 16],
        }
    }
}

/// One patch edge: transforms a client at `build_from` into `build_to`
///
/// Immutable after boot. A rollup is a large patch whose `build_from`
/// predates every incremental edge; it is the fallback when no incremental
/// path reaches the client's build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchMeta {
    pub file_meta: FileMeta,
    pub build_from: u16,
    pub build_to: u16,
    pub locale: Locale,
    pub arch: Platform,
    pub os: Os,
    pub rollup: bool,
    pub survey_id: u32,
}

impl PatchMeta {
    /// Convenience constructor for an incremental patch edge
    pub fn incremental(
        file_meta: FileMeta,
        build_from: u16,
        build_to: u16,
        locale: Locale,
        arch: Platform,
        os: Os,
    ) -> Self {
        Self {
            file_meta,
            build_from,
            build_to,
            locale,
            arch,
            os,
            rollup: false,
            survey_id: 0,
        }
    }

    /// Convenience constructor for a rollup patch
    pub fn rollup(
        file_meta: FileMeta,
        build_from: u16,
        build_to: u16,
        locale: Locale,
        arch: Platform,
        os: Os,
    ) -> Self {
        Self {
            file_meta,
            build_from,
            build_to,
            locale,
            arch,
            os,
            rollup: true,
            survey_id: 0,
        }
    }
}
