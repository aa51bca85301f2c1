//! servsens — Main Entry Point
//!
//! Hexagonal architecture: the command core talks to the appliance only
//! through port traits.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  FileConfigStore   ProcessUpdater   MonotonicClock             │
//! │  (ConfigPort)      (UpdatePort)     (Clock)                    │
//! │  W1SensorReader    TCP server       device_id + license        │
//! │  (SensorReader)    (HTTP/1.0)       (TrustFlag)                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           ApplianceService (pure logic)                │    │
//! │  │  CommandEngine · Sessions · SensorRegistry · Sampler   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Threads: main (accept loop) · sampler (due-sample reads)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use servsens::adapters::config_store::FileConfigStore;
use servsens::adapters::time::MonotonicClock;
use servsens::adapters::updater::ProcessUpdater;
use servsens::adapters::w1::W1SensorReader;
use servsens::app::service::{ApplianceService, ServicePorts};
use servsens::config::ServiceConfig;
use servsens::rpc::auth::{self, TrustFlag};
use servsens::rpc::engine::CommandEngine;
use servsens::rpc::ota::UpdateTargets;
use servsens::scheduler::Sampler;
use servsens::server::{self, ServerOptions};

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("servsens v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config =
        ServiceConfig::load(config_path.as_deref()).context("loading service configuration")?;

    // ── 3. Verification ───────────────────────────────────────
    let trust = TrustFlag::new(verify(&config));

    // ── 4. Service + adapters ─────────────────────────────────
    let updater = ProcessUpdater::from_argv(&config.installer)
        .context("installer command is empty")?;
    let engine = CommandEngine::new(
        env!("CARGO_PKG_VERSION"),
        UpdateTargets::new(&config.network_dir, &config.staging_dir),
    );
    let mut service = ApplianceService::new(
        engine,
        trust,
        config.max_buffered_rows,
        ServicePorts {
            config: Box::new(FileConfigStore::new(&config.config_store)),
            updater: Box::new(updater),
            clock: Box::new(MonotonicClock::new()),
        },
    );
    if let Err(e) = service.restore_sensors() {
        warn!("Starting with an empty sensor registry ({})", e);
    }
    let service = Arc::new(Mutex::new(service));

    // ── 5. Sampler thread ─────────────────────────────────────
    let reader = W1SensorReader::new(&config.sensor_root);
    let tick = Duration::from_millis(config.sample_tick_ms);
    let sampler_service = Arc::clone(&service);
    thread::Builder::new()
        .name("sampler".into())
        .spawn(move || run_sampler(&sampler_service, reader, tick))
        .context("spawning sampler thread")?;

    // ── 6. Command server ─────────────────────────────────────
    let listener = TcpListener::bind(&config.listen_addr)
        .with_context(|| format!("binding {}", config.listen_addr))?;
    server::serve(
        &listener,
        &service,
        ServerOptions {
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            max_body: config.max_body_bytes,
        },
    );
    Ok(())
}

fn verify(config: &ServiceConfig) -> bool {
    let Some(v) = &config.verification else {
        warn!("Verification not configured; only get-status and get-info will be served");
        return false;
    };
    let Ok(psk) = hex::decode(&v.psk_hex) else {
        warn!("Verification PSK is not hex");
        return false;
    };
    auth::verify_appliance(&psk, &v.device_id_path, &v.token_path)
}

/// Take due samples until the process exits.  Reads happen without the
/// service lock held.
fn run_sampler(service: &Mutex<ApplianceService>, mut reader: W1SensorReader, tick: Duration) {
    let lock = || service.lock().unwrap_or_else(PoisonError::into_inner);
    loop {
        let jobs = lock().collect_due();
        for job in &jobs {
            Sampler::run_job(job, &mut reader);
        }
        let wait = {
            let mut service = lock();
            service.complete_jobs(&jobs);
            service.next_sample_in()
        };
        thread::sleep(wait.map_or(tick, |w| w.min(tick)));
    }
}
