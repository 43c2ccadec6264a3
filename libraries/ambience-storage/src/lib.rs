//! Ambience Storage
//!
//! Persistent cache of playback profiles so each asset is analyzed once.
//!
//! The store is an explicitly constructed service: open it at startup, share
//! it (`Arc<ProfileStore>`) with whatever performs analysis, and `close` it at
//! shutdown.
//!
//! # Example
//!
//! ```ignore
//! use ambience_storage::{hash_file, PlaybackProfile, ProfileStore};
//!
//! let store = ProfileStore::open_default()?;
//! let hash = hash_file(&path)?;
//! if store.needs_update("rain.flac", &hash) {
//!     let analysis = analyzer.analyze_file(&path)?;
//!     store.put(PlaybackProfile::from_analysis("rain.flac", Some(hash), &analysis))?;
//! }
//! ```

#![forbid(unsafe_code)]

pub mod error;
mod hash;
pub mod profile;
pub mod store;

pub use error::{Result, StorageError};
pub use hash::hash_file;
pub use profile::{PlaybackProfile, ANALYSIS_VERSION, UNMEASURED_FLOOR_DB};
pub use store::{ProfileStore, STORE_FILE_NAME};
