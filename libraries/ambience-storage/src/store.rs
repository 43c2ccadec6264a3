//! Playback profile store
//!
//! A map from asset id to [`PlaybackProfile`], loaded once when opened and
//! written through to `playbackProfiles.json` on every mutation.
//!
//! # Concurrency
//!
//! Reads take a shared lock; mutations take the exclusive lock and hold it
//! until the file is written, so writes (and their persistence) are
//! serialized and readers never observe a half-applied change. The file
//! itself is replaced by rename, never rewritten in place.

use crate::error::{Result, StorageError};
use crate::profile::PlaybackProfile;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Store file name inside the store directory
pub const STORE_FILE_NAME: &str = "playbackProfiles.json";

/// Directory created under the platform data directory
pub const APP_DIRECTORY_NAME: &str = "Ambience";

type ProfileMap = HashMap<String, PlaybackProfile>;

/// Thread-safe, write-through profile cache
#[derive(Debug)]
pub struct ProfileStore {
    /// Backing file, `None` for an in-memory store
    path: Option<PathBuf>,
    profiles: RwLock<ProfileMap>,
}

impl ProfileStore {
    /// Open the store in `directory`
    ///
    /// A missing file yields an empty store.
    ///
    /// # Errors
    /// Returns `StorageError::CorruptStore` if the file exists but cannot be
    /// parsed.
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let path = directory.as_ref().join(STORE_FILE_NAME);
        let profiles = load(&path)?;

        info!("Opened profile store {} ({} profiles)", path.display(), profiles.len());

        Ok(Self {
            path: Some(path),
            profiles: RwLock::new(profiles),
        })
    }

    /// Open the store, moving a corrupt file aside and starting empty
    pub fn open_or_recover<P: AsRef<Path>>(directory: P) -> Result<Self> {
        match Self::open(&directory) {
            Err(StorageError::CorruptStore { path, message }) => {
                error!("Profile store {} is corrupt: {}", path.display(), message);

                let backup = path.with_extension("json.corrupt");
                fs::rename(&path, &backup)?;
                warn!(
                    "Moved corrupt profile store to {}; starting empty",
                    backup.display()
                );

                Ok(Self {
                    path: Some(path),
                    profiles: RwLock::new(HashMap::new()),
                })
            }
            other => other,
        }
    }

    /// Open the store in the platform data directory
    pub fn open_default() -> Result<Self> {
        Self::open_or_recover(Self::default_directory()?)
    }

    /// Platform data directory for the store (`.../Application Support/Ambience` on macOS)
    pub fn default_directory() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIRECTORY_NAME))
            .ok_or(StorageError::NoDataDirectory)
    }

    /// Store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            path: None,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Backing file path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read(&self) -> RwLockReadGuard<'_, ProfileMap> {
        self.profiles.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProfileMap> {
        self.profiles.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the profile for an asset
    pub fn get(&self, asset_id: &str) -> Option<PlaybackProfile> {
        self.read().get(asset_id).cloned()
    }

    /// Whether a profile exists for an asset
    pub fn contains(&self, asset_id: &str) -> bool {
        self.read().contains_key(asset_id)
    }

    /// All profiles, ordered by asset id
    pub fn all(&self) -> Vec<PlaybackProfile> {
        let mut profiles: Vec<_> = self.read().values().cloned().collect();
        profiles.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        profiles
    }

    /// Number of stored profiles
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Insert or replace a profile
    ///
    /// # Errors
    /// `StorageError::Persist` if the file could not be written; the profile
    /// is still stored in memory.
    pub fn put(&self, profile: PlaybackProfile) -> Result<()> {
        self.put_many(std::iter::once(profile))
    }

    /// Insert or replace several profiles with a single write
    ///
    /// # Errors
    /// `StorageError::InvalidProfile` if any profile holds NaN or infinity;
    /// nothing from the batch is stored in that case.
    pub fn put_many<I>(&self, profiles: I) -> Result<()>
    where
        I: IntoIterator<Item = PlaybackProfile>,
    {
        let profiles: Vec<PlaybackProfile> = profiles.into_iter().collect();
        for profile in &profiles {
            if let Err(e) = profile.validate() {
                warn!("Rejected profile: {}", e);
                return Err(e);
            }
        }

        let mut map = self.write();
        for profile in profiles {
            debug!("Storing profile for {}", profile.asset_id);
            map.insert(profile.asset_id.clone(), profile);
        }
        self.persist(&map)
    }

    /// Remove the profile for an asset, returning it if present
    pub fn remove(&self, asset_id: &str) -> Result<Option<PlaybackProfile>> {
        let mut map = self.write();
        let removed = map.remove(asset_id);
        if removed.is_some() {
            debug!("Removed profile for {}", asset_id);
            self.persist(&map)?;
        }
        Ok(removed)
    }

    /// Whether an asset should be (re-)analyzed given its current content hash
    ///
    /// Unknown assets always need an update. A stored profile without a hash
    /// cannot be checked and is treated as up to date; pass a hash on every
    /// `put` when strict invalidation matters.
    pub fn needs_update(&self, asset_id: &str, new_hash: &str) -> bool {
        match self.read().get(asset_id) {
            None => true,
            Some(profile) => profile
                .file_hash
                .as_deref()
                .is_some_and(|stored| stored != new_hash),
        }
    }

    /// Write the current state to disk
    pub fn flush(&self) -> Result<()> {
        let map = self.write();
        self.persist(&map)
    }

    /// Flush and release the store
    pub fn close(self) -> Result<()> {
        self.flush()?;
        if let Some(path) = &self.path {
            info!("Closed profile store {}", path.display());
        }
        Ok(())
    }

    fn persist(&self, map: &ProfileMap) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut profiles: Vec<&PlaybackProfile> = map.values().collect();
        profiles.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        let json = serde_json::to_vec_pretty(&profiles)?;

        write_atomic(path, &json).map_err(|source| {
            warn!(
                "Profile store write to {} failed, keeping changes in memory only: {}",
                path.display(),
                source
            );
            StorageError::Persist {
                path: path.clone(),
                source,
            }
        })
    }
}

fn load(path: &Path) -> Result<ProfileMap> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No profile store at {}, starting empty", path.display());
            return Ok(HashMap::new());
        }
        Err(e) => return Err(e.into()),
    };

    let profiles: Vec<PlaybackProfile> =
        serde_json::from_slice(&data).map_err(|e| StorageError::CorruptStore {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(profiles
        .into_iter()
        .map(|profile| (profile.asset_id.clone(), profile))
        .collect())
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}
