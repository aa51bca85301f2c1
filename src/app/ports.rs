//! Port traits — the hexagonal boundary between the command core and the appliance.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CommandEngine / Sampler (domain)
//! ```
//!
//! Driven adapters (sensor registry, config store, installer, clock,
//! sensor reader) implement these traits.  The command handlers receive
//! them through [`CommandContext`](crate::rpc::engine::CommandContext), so
//! the protocol core never touches the filesystem, processes, or buses
//! directly.

use std::io;
use std::path::Path;
use std::time::Duration;

use crate::sensors::{SensorId, SensorRecord, SensorSpec};
use crate::session::SessionId;

// ───────────────────────────────────────────────────────────────
// Sensor directory (driven adapter: domain ↔ sensor driver layer)
// ───────────────────────────────────────────────────────────────

/// Identity resolution and registration of sensors by address.
pub trait SensorDirectory {
    /// Forget every registered sensor.
    fn reset(&mut self);

    /// Register a sensor, or update the one already at `spec.address`.
    fn create_or_update(&mut self, spec: SensorSpec) -> SensorId;

    /// Resolve an address to its sensor id.
    fn by_address(&self, address: &str) -> Option<SensorId>;

    /// Snapshot of every registered sensor, in registration order.
    fn records(&self) -> Vec<SensorRecord>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Durable save/restore of the provisioned sensor list.
pub trait ConfigPort {
    /// Persist the given sensor list, replacing whatever was stored.
    fn save(&mut self, sensors: &[SensorRecord]) -> Result<(), ConfigError>;

    /// Load the last persisted sensor list.
    fn restore(&mut self) -> Result<Vec<SensorRecord>, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Sample scheduler (driven adapter: domain → timer subsystem)
// ───────────────────────────────────────────────────────────────

/// Schedules the next sampling pass of a measurement session.
pub trait SampleScheduler {
    /// Ask for sample number `generation` of `session` to be taken at `at`
    /// (monotonic time since boot).
    fn schedule_next(&mut self, at: Duration, session: SessionId, generation: u32);
}

// ───────────────────────────────────────────────────────────────
// Update port (driven adapter: domain → OS package installer)
// ───────────────────────────────────────────────────────────────

/// Installs or executes a written artifact.  Blocking, not cancellable.
pub trait UpdatePort {
    fn apply(&mut self, artifact: &Path) -> io::Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Sensor reader (driven adapter: hardware → sampling path)
// ───────────────────────────────────────────────────────────────

/// Reads one value from a sensor.  `None` means the read failed.
pub trait SensorReader {
    fn read(&mut self, address: &str, id: SensorId) -> Option<String>;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since boot.
    fn now(&self) -> Duration;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Nothing has been persisted yet (first boot).
    NotFound,
    /// Stored blob failed deserialization.
    Corrupted,
    /// Stored blob was written by an incompatible layout version.
    UnsupportedVersion(u8),
    /// Underlying filesystem error.
    Io(io::ErrorKind),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported config version {}", v),
            Self::Io(kind) => write!(f, "I/O error: {}", kind),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(e.kind())
        }
    }
}
