//! Mock adapters for integration tests.
//!
//! Every mock shares its state through an `Arc`, so a test keeps a handle
//! and inspects what the service did after handing the mock over.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use servsens::app::ports::{Clock, ConfigError, ConfigPort, SensorReader, UpdatePort};
use servsens::app::service::{ApplianceService, ServicePorts};
use servsens::rpc::auth::TrustFlag;
use servsens::rpc::engine::CommandEngine;
use servsens::rpc::ota::UpdateTargets;
use servsens::sensors::{SensorId, SensorRecord};

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.micros.fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

// ── Config store ──────────────────────────────────────────────

#[derive(Default)]
pub struct ConfigState {
    pub stored: Option<Vec<SensorRecord>>,
    pub saves: usize,
    pub fail_saves: bool,
}

#[derive(Clone, Default)]
pub struct MockConfig(pub Arc<Mutex<ConfigState>>);

impl ConfigPort for MockConfig {
    fn save(&mut self, sensors: &[SensorRecord]) -> Result<(), ConfigError> {
        let mut state = self.0.lock().unwrap();
        state.saves += 1;
        if state.fail_saves {
            return Err(ConfigError::Io(io::ErrorKind::PermissionDenied));
        }
        state.stored = Some(sensors.to_vec());
        Ok(())
    }

    fn restore(&mut self) -> Result<Vec<SensorRecord>, ConfigError> {
        self.0.lock().unwrap().stored.clone().ok_or(ConfigError::NotFound)
    }
}

// ── Updater ───────────────────────────────────────────────────

/// What the updater saw when asked to apply an artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyCall {
    pub path: PathBuf,
    pub contents: Option<Vec<u8>>,
}

#[derive(Default)]
pub struct UpdaterState {
    pub calls: Vec<ApplyCall>,
    pub failure: Option<String>,
}

#[derive(Clone, Default)]
pub struct MockUpdater(pub Arc<Mutex<UpdaterState>>);

impl UpdatePort for MockUpdater {
    fn apply(&mut self, artifact: &Path) -> io::Result<()> {
        let mut state = self.0.lock().unwrap();
        state.calls.push(ApplyCall {
            path: artifact.to_owned(),
            contents: fs::read(artifact).ok(),
        });
        match &state.failure {
            Some(msg) => Err(io::Error::other(msg.clone())),
            None => Ok(()),
        }
    }
}

// ── Sensor reader ─────────────────────────────────────────────

/// Returns the running read count as text; fails for addresses starting
/// with `dead`.
#[derive(Default)]
pub struct CountingReader {
    pub reads: u32,
}

impl SensorReader for CountingReader {
    fn read(&mut self, address: &str, _id: SensorId) -> Option<String> {
        self.reads += 1;
        if address.starts_with("dead") {
            None
        } else {
            Some(format!("{}", self.reads))
        }
    }
}

// ── Harness ───────────────────────────────────────────────────

pub const VERSION: &str = "9.9.9-test";

/// A service wired to mocks, plus handles onto each mock.
pub struct Harness {
    pub service: ApplianceService,
    pub clock: ManualClock,
    pub config: MockConfig,
    pub updater: MockUpdater,
    pub network_dir: tempfile::TempDir,
    pub staging_dir: tempfile::TempDir,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(verified: bool) -> Self {
        Self::with_row_limit(verified, 64)
    }

    pub fn with_row_limit(verified: bool, row_limit: usize) -> Self {
        let clock = ManualClock::default();
        let config = MockConfig::default();
        let updater = MockUpdater::default();
        let network_dir = tempfile::tempdir().unwrap();
        let staging_dir = tempfile::tempdir().unwrap();

        let engine = CommandEngine::new(
            VERSION,
            UpdateTargets::new(network_dir.path(), staging_dir.path()),
        );
        let service = ApplianceService::new(
            engine,
            TrustFlag::new(verified),
            row_limit,
            ServicePorts {
                config: Box::new(config.clone()),
                updater: Box::new(updater.clone()),
                clock: Box::new(clock.clone()),
            },
        );
        Self {
            service,
            clock,
            config,
            updater,
            network_dir,
            staging_dir,
        }
    }

    /// Send a JSON command and return the parsed envelope.
    pub fn call(&mut self, request: Value) -> Value {
        self.raw(&request.to_string())
    }

    pub fn raw(&mut self, body: &str) -> Value {
        self.service
            .handle_body(body, Some("application/json"))
            .to_json()
    }

    /// Provision sensors at the given addresses.
    pub fn provision(&mut self, addrs: &[&str]) {
        let descriptors: Vec<Value> = addrs
            .iter()
            .map(|a| serde_json::json!({ "addr": a }))
            .collect();
        let reply = self.call(serde_json::json!({
            "cmd": "set-ports-setting",
            "params": { "addrs": descriptors }
        }));
        assert_eq!(reply["status"]["code"], "success", "{reply}");
    }

    /// Run every sample due at the current time.
    pub fn sample_now(&mut self, reader: &mut CountingReader) -> usize {
        let jobs = self.service.collect_due();
        for job in &jobs {
            servsens::scheduler::Sampler::run_job(job, reader);
        }
        self.service.complete_jobs(&jobs);
        jobs.len()
    }

    /// Sample now, then keep advancing in 100 ms steps for `total`,
    /// sampling after each step.  Returns the number of samples taken.
    pub fn run_for(&mut self, total: Duration, reader: &mut CountingReader) -> usize {
        let step = Duration::from_millis(100);
        let mut elapsed = Duration::ZERO;
        let mut taken = self.sample_now(reader);
        while elapsed < total {
            self.clock.advance(step);
            elapsed += step;
            taken += self.sample_now(reader);
        }
        taken
    }
}

pub fn code(reply: &Value) -> &str {
    reply["status"]["code"].as_str().unwrap_or_default()
}

pub fn message(reply: &Value) -> &str {
    reply["status"]["message"].as_str().unwrap_or_default()
}
