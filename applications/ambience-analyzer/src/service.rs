//! Profile service
//!
//! Glue between the analyzer and the profile store: an asset is decoded and
//! measured only when the store has no profile for it or its content hash
//! changed.

use crate::error::{AnalyzerError, Result};
use ambience_loudness::LoudnessAnalyzer;
use ambience_storage::{hash_file, PlaybackProfile, ProfileStore};
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a returned profile came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    /// Served from the store without analysis
    Cached,
    /// Freshly analyzed and stored
    Analyzed,
}

/// Ensures every requested asset has an up-to-date playback profile
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: Arc<ProfileStore>,
    analyzer: LoudnessAnalyzer,
}

/// Asset id for a file: its file name
pub fn asset_id(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| AnalyzerError::InvalidAsset(path.display().to_string()))
}

impl ProfileService {
    pub fn new(store: Arc<ProfileStore>, analyzer: LoudnessAnalyzer) -> Self {
        Self { store, analyzer }
    }

    /// Shared store handle
    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    /// Return the stored profile for `path`, analyzing the file if needed
    ///
    /// A store write failure is logged and the new profile is still returned;
    /// it stays available in memory for the rest of the process.
    pub fn ensure_profile(&self, path: &Path) -> Result<(PlaybackProfile, ProfileSource)> {
        let id = asset_id(path)?;
        let hash = hash_file(path)?;

        if !self.store.needs_update(&id, &hash) {
            if let Some(profile) = self.store.get(&id) {
                debug!("Using cached profile for {}", id);
                return Ok((profile, ProfileSource::Cached));
            }
        }

        let analysis = self.analyzer.analyze_file(path)?;
        let profile = PlaybackProfile::from_analysis(id, Some(hash), &analysis);

        match self.store.put(profile.clone()) {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => {
                warn!("Profile for {} not persisted: {}", profile.asset_id, e);
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            "Stored profile for {}: {:.1} LUFS, {:+.2} dB{}",
            profile.asset_id,
            profile.integrated_lufs,
            profile.gain_db,
            if profile.needs_limiter { ", limiter" } else { "" }
        );

        Ok((profile, ProfileSource::Analyzed))
    }

    /// Ensure profiles for many assets on a bounded worker pool
    ///
    /// Results are returned in input order. Asset ids are file names, so a
    /// later path sharing a file name with an earlier one is not analyzed and
    /// gets `AnalyzerError::DuplicateAsset`.
    pub fn ensure_profiles(
        &self,
        paths: &[PathBuf],
        workers: usize,
    ) -> Result<Vec<(PathBuf, Result<(PlaybackProfile, ProfileSource)>)>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.clamp(1, 16))
            .thread_name(|i| format!("profile-worker-{}", i))
            .build()
            .map_err(|e| AnalyzerError::WorkerPool(e.to_string()))?;

        let mut first_seen: HashMap<String, &PathBuf> = HashMap::new();
        let duplicates: Vec<Option<(String, PathBuf)>> = paths
            .iter()
            .map(|path| {
                let id = asset_id(path).ok()?;
                match first_seen.entry(id) {
                    Entry::Occupied(entry) => Some((entry.key().clone(), (*entry.get()).clone())),
                    Entry::Vacant(entry) => {
                        entry.insert(path);
                        None
                    }
                }
            })
            .collect();

        Ok(pool.install(|| {
            paths
                .par_iter()
                .zip(&duplicates)
                .map(|(path, duplicate)| {
                    let result = match duplicate {
                        Some((id, first)) => Err(AnalyzerError::DuplicateAsset {
                            asset_id: id.clone(),
                            first: first.clone(),
                        }),
                        None => self.ensure_profile(path),
                    };
                    if let Err(e) = &result {
                        warn!("No profile for {}: {}", path.display(), e);
                    }
                    (path.clone(), result)
                })
                .collect()
        }))
    }

    /// Drop the stored profile for an asset
    ///
    /// As in `ensure_profile`, a store write failure is only logged; the
    /// profile is gone for the rest of the process.
    pub fn forget(&self, asset_id: &str) -> Result<Option<PlaybackProfile>> {
        let existing = self.store.get(asset_id);
        match self.store.remove(asset_id) {
            Ok(removed) => Ok(removed),
            Err(e) if e.is_recoverable() => {
                warn!("Removal of {} not persisted: {}", asset_id, e);
                Ok(existing)
            }
            Err(e) => Err(e.into()),
        }
    }
}
