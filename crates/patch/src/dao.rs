//! Persistence seam for patch metadata
//!
//! The gateway never talks to the database directly; it consumes rows
//! through this trait and writes back repaired size/MD5 fields during
//! boot.

use std::sync::Mutex;

use crate::error::{PatchError, Result};
use crate::meta::PatchMeta;

/// Patch metadata store
pub trait PatchDao: Send + Sync {
    /// Fetches every patch row
    fn fetch_patches(&self) -> Result<Vec<PatchMeta>>;

    /// Persists a repaired row, matched by file name
    fn update(&self, patch: &PatchMeta) -> Result<()>;
}

/// In-memory store for tests and single-node setups
#[derive(Debug, Default)]
pub struct MemoryPatchDao {
    rows: Mutex<Vec<PatchMeta>>,
}

impl MemoryPatchDao {
    pub fn new(rows: Vec<PatchMeta>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// Snapshot of the stored rows
    pub fn rows(&self) -> Vec<PatchMeta> {
        self.rows.lock().expect("patch rows poisoned").clone()
    }
}

impl PatchDao for MemoryPatchDao {
    fn fetch_patches(&self) -> Result<Vec<PatchMeta>> {
        Ok(self.rows())
    }

    fn update(&self, patch: &PatchMeta) -> Result<()> {
        let mut rows = self.rows.lock().expect("patch rows poisoned");

        let row = rows
            .iter_mut()
            .find(|row| row.file_meta.name == patch.file_meta.name)
            .ok_or_else(|| {
                PatchError::Dao(format!("no such patch: {}", patch.file_meta.name))
            })?;

        *row = patch.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{FileMeta, Locale, Os, PatchMeta, Platform};

    fn patch(name: &str) -> PatchMeta {
        PatchMeta::incremental(
            FileMeta::new(name, 10),
            5464,
            5875,
            Locale::EnUs,
            Platform::X86,
            Os::Win,
        )
    }

    #[test]
    fn test_fetch_returns_rows() {
        let dao = MemoryPatchDao::new(vec![patch("a.patch"), patch("b.patch")]);
        assert_eq!(dao.fetch_patches().unwrap().len(), 2);
    }

    #[test]
    fn test_update_replaces_by_name() {
        let dao = MemoryPatchDao::new(vec![patch("a.patch")]);

        let mut repaired = patch("a.patch");
        repaired.file_meta.size = 999;
        dao.update(&repaired).unwrap();

        assert_eq!(dao.rows()[0].file_meta.size, 999);
    }

    #[test]
    fn test_update_unknown_row_fails() {
        let dao = MemoryPatchDao::new(vec![]);
        assert!(dao.update(&patch("missing.patch")).is_err());
    }
}
