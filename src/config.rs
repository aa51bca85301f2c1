//! Service configuration parameters
//!
//! All tunable parameters for the servsens daemon.  Read from a JSON file
//! at startup; every field has a default so a partial file (or none at
//! all) is valid.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::adapters::device_id::DEFAULT_MACHINE_ID_PATH;
use crate::adapters::w1::DEFAULT_W1_ROOT;
use crate::session::DEFAULT_ROW_LIMIT;

/// Environment variable naming the config file when none is given on the
/// command line.
pub const CONFIG_ENV: &str = "SERVSENS_CONFIG";

/// Core service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    // --- Transport ---
    /// Address the command server binds to
    pub listen_addr: String,
    /// Per-connection read timeout (milliseconds)
    pub read_timeout_ms: u64,
    /// Largest request body accepted (bytes)
    pub max_body_bytes: usize,

    // --- Update pipeline ---
    /// Destination of the `interfaces` artifact
    pub network_dir: PathBuf,
    /// Destination of every other artifact
    pub staging_dir: PathBuf,
    /// Installer argv prefix; the artifact path is appended
    pub installer: Vec<String>,

    // --- Sensors ---
    /// Persisted sensor list
    pub config_store: PathBuf,
    /// w1 sysfs device root
    pub sensor_root: PathBuf,

    // --- Sampling ---
    /// Sampler wake-up period (milliseconds)
    pub sample_tick_ms: u64,
    /// Rows buffered per session before the oldest is dropped
    pub max_buffered_rows: usize,

    // --- Verification ---
    /// Absent means the appliance stays unverified
    pub verification: Option<VerificationConfig>,
}

/// License verification inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Pre-shared key, hex-encoded
    pub psk_hex: String,
    /// File holding the hex license token
    pub token_path: PathBuf,
    /// File holding the machine id
    #[serde(default = "default_device_id_path")]
    pub device_id_path: PathBuf,
}

fn default_device_id_path() -> PathBuf {
    PathBuf::from(DEFAULT_MACHINE_ID_PATH)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            // Transport
            listen_addr: "0.0.0.0:8080".to_owned(),
            read_timeout_ms: 5000,
            max_body_bytes: 16 * 1024 * 1024, // firmware images arrive base64-encoded

            // Update pipeline
            network_dir: PathBuf::from("/etc/network"),
            staging_dir: PathBuf::from("/var/tmp"),
            installer: vec!["dpkg".to_owned(), "-i".to_owned()],

            // Sensors
            config_store: PathBuf::from("/var/lib/servsens/sensors.bin"),
            sensor_root: PathBuf::from(DEFAULT_W1_ROOT),

            // Sampling
            sample_tick_ms: 50,
            max_buffered_rows: DEFAULT_ROW_LIMIT,

            // Verification
            verification: None,
        }
    }
}

/// Why a config file was rejected.
#[derive(Debug)]
pub enum ConfigFileError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, serde_json::Error),
    Invalid(&'static str),
}

impl fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(path, e) => write!(f, "reading {}: {}", path.display(), e),
            Self::Parse(path, e) => write!(f, "parsing {}: {}", path.display(), e),
            Self::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigFileError {}

impl ServiceConfig {
    /// Load and validate the file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let text =
            fs::read_to_string(path).map_err(|e| ConfigFileError::Read(path.to_owned(), e))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigFileError::Parse(path.to_owned(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// `path` if given, else `$SERVSENS_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigFileError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match path.or(env_path.as_deref()) {
            Some(path) => Self::from_file(path),
            None => {
                warn!("No config file given (argv[1] or ${}), using defaults", CONFIG_ENV);
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigFileError> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigFileError::Invalid("listen_addr must not be empty"));
        }
        if !(100..=600_000).contains(&self.read_timeout_ms) {
            return Err(ConfigFileError::Invalid("read_timeout_ms must be 100–600000"));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigFileError::Invalid("max_body_bytes must be positive"));
        }
        if self.installer.is_empty() {
            return Err(ConfigFileError::Invalid("installer must name a program"));
        }
        if !(1..=10_000).contains(&self.sample_tick_ms) {
            return Err(ConfigFileError::Invalid("sample_tick_ms must be 1–10000"));
        }
        if self.max_buffered_rows == 0 {
            return Err(ConfigFileError::Invalid("max_buffered_rows must be positive"));
        }
        if let Some(v) = &self.verification {
            if hex::decode(&v.psk_hex).map_or(true, |k| k.is_empty()) {
                return Err(ConfigFileError::Invalid("verification.psk_hex must be non-empty hex"));
            }
        }
        Ok(())
    }
}
