//! # Veles Patch
//!
//! Patch selection for outdated game clients.
//!
//! Patches are directed edges between build numbers, partitioned into
//! buckets by (locale, platform, OS). Each bucket owns a [`PatchGraph`];
//! the [`Patcher`] answers whether a client build is current, reachable
//! through incremental patches, or needs a rollup, and picks the next
//! patch file to deliver.
//!
//! ## Example
//!
//! ```
//! use veles_patch::{FileMeta, Locale, Os, PatchMeta, Patcher, Platform};
//! use veles_protocol::GameVersion;
//!
//! let patch = PatchMeta::incremental(
//!     FileMeta::new("5464-5875.patch", 1024),
//!     5464,
//!     5875,
//!     Locale::EnUs,
//!     Platform::X86,
//!     Os::Win,
//! );
//!
//! let patcher = Patcher::new(vec![GameVersion::new(1, 12, 1, 5875)], vec![patch]);
//! let found = patcher
//!     .find_patch(&GameVersion::new(1, 11, 2, 5464), Locale::EnUs, Platform::X86, Os::Win)
//!     .unwrap();
//! assert_eq!(found.build_to, 5875);
//! ```

pub mod dao;
pub mod error;
pub mod fnv;
pub mod graph;
pub mod meta;
pub mod patcher;

pub use dao::{MemoryPatchDao, PatchDao};
pub use error::{PatchError, Result};
pub use fnv::FnvHash;
pub use graph::{Edge, PatchGraph};
pub use meta::{FileMeta, Locale, Os, PatchMeta, Platform};
pub use patcher::{PatchLevel, Patcher};
