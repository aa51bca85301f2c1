//! Appliance service — the hexagonal core.
//!
//! [`ApplianceService`] owns the session store, the sensor registry, and
//! the sampler, plus the driven adapters injected at construction.  The
//! server thread hands it decoded requests; the sampling thread pulls due
//! jobs from it and hands them back once read.
//!
//! ```text
//!  HttpRequest ──▶ ┌──────────────────────────┐ ──▶ ConfigPort
//!                  │     ApplianceService     │ ──▶ UpdatePort
//!  SampleJob   ◀──▶│ Sessions · Registry ·    │ ◀── Clock
//!                  │ Sampler · CommandEngine  │
//!                  └──────────────────────────┘
//! ```

use std::time::Duration;

use log::{info, warn};

use crate::rpc::auth::TrustFlag;
use crate::rpc::codec::HttpRequest;
use crate::rpc::engine::{CommandContext, CommandEngine};
use crate::rpc::response::Reply;
use crate::scheduler::{SampleJob, Sampler};
use crate::sensors::SensorRegistry;
use crate::session::SessionStore;

use super::ports::{Clock, ConfigError, ConfigPort, SensorDirectory, UpdatePort};

/// Driven adapters owned by the service.
pub struct ServicePorts {
    pub config: Box<dyn ConfigPort + Send>,
    pub updater: Box<dyn UpdatePort + Send>,
    pub clock: Box<dyn Clock + Send>,
}

pub struct ApplianceService {
    engine: CommandEngine,
    trust: TrustFlag,
    sessions: SessionStore,
    sensors: SensorRegistry,
    sampler: Sampler,
    ports: ServicePorts,
}

impl ApplianceService {
    pub fn new(engine: CommandEngine, trust: TrustFlag, row_limit: usize, ports: ServicePorts) -> Self {
        Self {
            engine,
            trust,
            sessions: SessionStore::new(row_limit),
            sensors: SensorRegistry::new(),
            sampler: Sampler::new(),
            ports,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the persisted sensor list into the registry.
    ///
    /// First boot (nothing persisted) is not an error.
    pub fn restore_sensors(&mut self) -> Result<usize, ConfigError> {
        let records = match self.ports.config.restore() {
            Ok(records) => records,
            Err(ConfigError::NotFound) => {
                info!("ApplianceService: no persisted sensors");
                return Ok(0);
            }
            Err(e) => {
                warn!("ApplianceService: sensor restore failed: {}", e);
                return Err(e);
            }
        };

        self.sensors.reset();
        let count = records.len();
        for record in records {
            self.sensors.create_or_update(record.into_spec());
        }
        info!("ApplianceService: {} sensors restored", count);
        Ok(count)
    }

    // ── Command handling ──────────────────────────────────────

    /// Serve one decoded request and return the response body.
    pub fn handle_request(&mut self, request: &HttpRequest) -> String {
        let (engine, mut ctx) = self.split();
        engine.process(request, &mut ctx)
    }

    /// Serve a raw body; used where no HTTP framing is involved.
    pub fn handle_body(&mut self, body: &str, content_type: Option<&str>) -> Reply {
        let (engine, mut ctx) = self.split();
        engine.handle(body, content_type, &mut ctx)
    }

    fn split(&mut self) -> (&CommandEngine, CommandContext<'_>) {
        let ctx = CommandContext {
            verified: self.trust.is_verified(),
            sessions: &mut self.sessions,
            sensors: &mut self.sensors,
            config: &mut *self.ports.config,
            scheduler: &mut self.sampler,
            updater: &mut *self.ports.updater,
            clock: &*self.ports.clock,
        };
        (&self.engine, ctx)
    }

    // ── Sampling ──────────────────────────────────────────────

    /// Jobs due now.  Run them without holding the service, then pass
    /// them to [`complete_jobs`](Self::complete_jobs).
    pub fn collect_due(&mut self) -> Vec<SampleJob> {
        let now = self.ports.clock.now();
        self.sampler.collect_due(now, &self.sessions)
    }

    pub fn complete_jobs(&mut self, jobs: &[SampleJob]) {
        for job in jobs {
            self.sampler.complete(job, &mut self.sessions);
        }
    }

    /// Time until the earliest pending sample, if any.
    pub fn next_sample_in(&self) -> Option<Duration> {
        let now = self.ports.clock.now();
        self.sampler.next_due().map(|at| at.saturating_sub(now))
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn trust(&self) -> &TrustFlag {
        &self.trust
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn sensors(&self) -> &SensorRegistry {
        &self.sensors
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}
