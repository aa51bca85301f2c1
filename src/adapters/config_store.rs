//! Persistent sensor configuration.
//!
//! Implements [`ConfigPort`] on top of a single blob file.
//!
//! # Layout
//!
//! ```text
//! ┌─────────┬──────────────────────────────────────┐
//! │ version │ postcard(Vec<SensorRecord>)          │
//! │ (1 B)   │                                      │
//! └─────────┴──────────────────────────────────────┘
//! ```
//!
//! Writes go to a sibling temp file which is synced and renamed over the
//! blob, so a crash mid-save leaves the previous copy intact.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::sensors::SensorRecord;

/// Blob layout version written by this build.
pub const BLOB_VERSION: u8 = 1;

/// Upper bound on a blob we are willing to load.
const MAX_BLOB_SIZE: u64 = 1024 * 1024;

fn encode(sensors: &[SensorRecord]) -> Result<Vec<u8>, ConfigError> {
    let mut blob = vec![BLOB_VERSION];
    let body = postcard::to_allocvec(sensors).map_err(|_| ConfigError::Corrupted)?;
    blob.extend_from_slice(&body);
    Ok(blob)
}

fn decode(blob: &[u8]) -> Result<Vec<SensorRecord>, ConfigError> {
    let (&version, body) = blob.split_first().ok_or(ConfigError::Corrupted)?;
    if version != BLOB_VERSION {
        return Err(ConfigError::UnsupportedVersion(version));
    }
    postcard::from_bytes(body).map_err(|_| ConfigError::Corrupted)
}

// ── File-backed store ─────────────────────────────────────────

pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConfigPort for FileConfigStore {
    fn save(&mut self, sensors: &[SensorRecord]) -> Result<(), ConfigError> {
        let blob = encode(sensors)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let tmp = self.temp_path();
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(&blob)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &self.path)) {
            warn!("FileConfigStore: save to {} failed: {}", self.path.display(), e);
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(
            "FileConfigStore: saved {} sensors ({} bytes) to {}",
            sensors.len(),
            blob.len(),
            self.path.display()
        );
        Ok(())
    }

    fn restore(&mut self) -> Result<Vec<SensorRecord>, ConfigError> {
        let size = fs::metadata(&self.path)?.len();
        if size > MAX_BLOB_SIZE {
            warn!("FileConfigStore: {} is {} bytes, refusing to load", self.path.display(), size);
            return Err(ConfigError::Corrupted);
        }
        let sensors = decode(&fs::read(&self.path)?)?;
        info!(
            "FileConfigStore: restored {} sensors from {}",
            sensors.len(),
            self.path.display()
        );
        Ok(sensors)
    }
}

// ── In-memory store ───────────────────────────────────────────

/// Volatile store for hosts without persistent storage, and for fuzzing.
/// Encodes through the same blob format as the file store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blob: Option<Vec<u8>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigPort for MemoryConfigStore {
    fn save(&mut self, sensors: &[SensorRecord]) -> Result<(), ConfigError> {
        self.blob = Some(encode(sensors)?);
        Ok(())
    }

    fn restore(&mut self) -> Result<Vec<SensorRecord>, ConfigError> {
        decode(self.blob.as_deref().ok_or(ConfigError::NotFound)?)
    }
}
