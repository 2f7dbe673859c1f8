//! The client patch resolver
//!
//! Built once at boot from the allowed version list and the patch rows,
//! then shared read-only. `find_patch` walks the bucket's graph toward any
//! allowed version; when no incremental path reaches the client it falls
//! back to the smallest rollup that covers it. Rollups are the largest
//! artifacts, so minimising bytes delivered to the slowest-path clients is
//! the policy.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use md5::{Digest, Md5};
use tracing::info;
use veles_protocol::GameVersion;

use crate::dao::PatchDao;
use crate::error::{PatchError, Result};
use crate::fnv::FnvHash;
use crate::graph::PatchGraph;
use crate::meta::{FileMeta, Locale, Os, PatchMeta, Platform};

/// Outcome of the version gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchLevel {
    /// Client build is on the allowed list
    Ok,

    /// An allowed version is newer; the client may be patchable
    TooOld,

    /// The client is ahead of every allowed version
    TooNew,
}

#[derive(Debug)]
struct Survey {
    meta: FileMeta,
    id: u32,
    data: Vec<u8>,
}

/// Resolves the next patch for a connecting client
#[derive(Debug)]
pub struct Patcher {
    versions: Vec<GameVersion>,
    patch_bins: HashMap<u32, Vec<PatchMeta>>,
    graphs: HashMap<u32, PatchGraph>,
    survey: Option<Survey>,
}

impl Patcher {
    pub fn new(versions: Vec<GameVersion>, patches: Vec<PatchMeta>) -> Self {
        let mut patch_bins: HashMap<u32, Vec<PatchMeta>> = HashMap::new();
        let mut hasher = FnvHash::new();

        for patch in patches {
            hasher.update(patch.locale.as_str());
            hasher.update(patch.arch.as_str());
            hasher.update(patch.os.as_str());
            let hash = hasher.finalise();
            patch_bins.entry(hash).or_default().push(patch);
        }

        let graphs = patch_bins
            .iter()
            .map(|(&hash, bin)| (hash, PatchGraph::new(bin)))
            .collect();

        Self {
            versions,
            patch_bins,
            graphs,
            survey: None,
        }
    }

    fn bucket(locale: Locale, platform: Platform, os: Os) -> u32 {
        let mut hasher = FnvHash::new();
        hasher.update(locale.as_str());
        hasher.update(platform.as_str());
        hasher.update(os.as_str())
    }

    /// Checks a full client version against the allowed list
    pub fn check_version(&self, client_version: &GameVersion) -> PatchLevel {
        if self.versions.contains(client_version) {
            return PatchLevel::Ok;
        }

        // Any allowed version newer than the client means there's a chance
        // it can be patched.
        if self.versions.iter().any(|v| v > client_version) {
            return PatchLevel::TooOld;
        }

        PatchLevel::TooNew
    }

    /// Checks a bare build number, as reported in the auth handshake
    pub fn check_build(&self, build: u32) -> PatchLevel {
        if self.versions.iter().any(|v| u32::from(v.build) == build) {
            return PatchLevel::Ok;
        }

        if self.versions.iter().any(|v| u32::from(v.build) > build) {
            return PatchLevel::TooOld;
        }

        PatchLevel::TooNew
    }

    /// The rollup that covers `from` with the smallest file, if any
    fn locate_rollup(patches: &[PatchMeta], from: u16, to: u16) -> Option<&PatchMeta> {
        let mut best: Option<&PatchMeta> = None;

        for patch in patches {
            if !patch.rollup {
                continue;
            }

            // rollup build must be <= the client build and <= the server build
            if patch.build_from <= from && patch.build_to <= to {
                match best {
                    Some(current) if current.file_meta.size < patch.file_meta.size => {}
                    _ => best = Some(patch),
                }
            }
        }

        best
    }

    /// The next patch a client at `client_version` should apply
    pub fn find_patch(
        &self,
        client_version: &GameVersion,
        locale: Locale,
        platform: Platform,
        os: Os,
    ) -> Option<&PatchMeta> {
        let bucket = Self::bucket(locale, platform, os);
        let graph = self.graphs.get(&bucket)?;
        let bin = self.patch_bins.get(&bucket)?;

        let mut build = client_version.build;

        // ensure there's a patch path from the client version to a supported version
        let mut path_found = self
            .versions
            .iter()
            .any(|version| graph.is_path(build, version.build));

        // couldn't find a patch path; find the best rollup that'll cover the client
        if !path_found {
            for version in &self.versions {
                let meta = Self::locate_rollup(bin, client_version.build, version.build);

                if let Some(meta) = meta {
                    if graph.is_path(meta.build_from, version.build) {
                        build = meta.build_from;
                        path_found = true;
                        break;
                    }
                }
            }

            if !path_found {
                return None;
            }
        }

        // using the patching path, locate the next patch file
        for version in &self.versions {
            let mut edges = graph.path(build, version.build).into_iter();

            let Some(first) = edges.next() else {
                continue;
            };

            let build_from = first.from;
            let build_to = edges.next().map_or(version.build, |next| next.from);

            let found = bin
                .iter()
                .filter(|patch| patch.build_from == build_from && patch.build_to == build_to)
                .min_by_key(|patch| patch.file_meta.size);

            if found.is_some() {
                return found;
            }
        }

        None
    }

    /// Loads and verifies every patch row at boot
    ///
    /// Each file is opened to prove it exists; a stored size of zero is
    /// repaired from disk and an all-zero MD5 is recomputed. Repaired rows
    /// are written back through the DAO. A missing or unreadable file is
    /// fatal.
    pub fn load_patches(root: impl AsRef<Path>, dao: &dyn PatchDao) -> Result<Vec<PatchMeta>> {
        let root = root.as_ref();
        let mut patches = dao.fetch_patches()?;

        for patch in &mut patches {
            let mut dirty = false;
            patch.file_meta.path = root.to_path_buf();

            let file_path = root.join(&patch.file_meta.name);
            let file = fs::File::open(&file_path).map_err(|source| PatchError::PatchUnreadable {
                path: file_path.clone(),
                source,
            })?;

            if patch.file_meta.size == 0 {
                patch.file_meta.size = file
                    .metadata()
                    .map_err(|source| PatchError::PatchUnreadable {
                        path: file_path.clone(),
                        source,
                    })?
                    .len();
                dirty = true;
            }

            if patch.file_meta.md5 == [0u8; 16] {
                info!(name = %patch.file_meta.name, "Calculating MD5");

                let contents =
                    fs::read(&file_path).map_err(|source| PatchError::PatchUnreadable {
                        path: file_path.clone(),
                        source,
                    })?;
                patch.file_meta.md5 = Md5::digest(&contents).into();
                dirty = true;
            }

            if dirty {
                dao.update(patch)?;
            }
        }

        Ok(patches)
    }

    /// Loads the survey blob (`Survey.mpq` under `root`) and caches it
    pub fn set_survey(&mut self, root: impl AsRef<Path>, id: u32) -> Result<()> {
        let path = root.as_ref().join("Survey.mpq");
        let data = fs::read(&path).map_err(|source| PatchError::SurveyUnreadable {
            path: path.clone(),
            source,
        })?;

        let mut meta = FileMeta::new("Survey", data.len() as u64);
        meta.path = root.as_ref().to_path_buf();
        meta.md5 = Md5::digest(&data).into();

        self.survey = Some(Survey { meta, id, data });
        Ok(())
    }

    /// Metadata the client compares against its cached survey
    pub fn survey_meta(&self) -> Option<FileMeta> {
        self.survey.as_ref().map(|survey| survey.meta.clone())
    }

    /// Whether the survey is delivered to this platform
    // TODO: only supports x86 Windows for the time being
    pub fn survey_platform(&self, platform: Platform, os: Os) -> bool {
        if platform != Platform::X86 || os != Os::Win {
            return false;
        }

        self.survey.is_some()
    }

    pub fn survey_data(&self) -> Option<&[u8]> {
        self.survey.as_ref().map(|survey| survey.data.as_slice())
    }

    pub fn survey_id(&self) -> u32 {
        self.survey.as_ref().map_or(0, |survey| survey.id)
    }
}
