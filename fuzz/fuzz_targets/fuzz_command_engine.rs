//! Fuzz target: `ApplianceService::handle_body`
//!
//! Feeds arbitrary bodies through the full gate pipeline and handlers of a
//! verified appliance and asserts every answer is a well-formed envelope.
//! Update artifacts land in a throwaway directory; the installer is a
//! no-op.
//!
//! cargo fuzz run fuzz_command_engine

#![no_main]

use std::io;
use std::path::Path;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use servsens::adapters::config_store::MemoryConfigStore;
use servsens::app::ports::{Clock, UpdatePort};
use servsens::app::service::{ApplianceService, ServicePorts};
use servsens::rpc::auth::TrustFlag;
use servsens::rpc::engine::CommandEngine;
use servsens::rpc::ota::UpdateTargets;

struct NoopUpdater;

impl UpdatePort for NoopUpdater {
    fn apply(&mut self, _artifact: &Path) -> io::Result<()> {
        Ok(())
    }
}

struct FrozenClock;

impl Clock for FrozenClock {
    fn now(&self) -> Duration {
        Duration::from_secs(1)
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };
    let scratch = std::env::temp_dir().join("servsens-fuzz");
    let _ = std::fs::create_dir_all(&scratch);

    let mut service = ApplianceService::new(
        CommandEngine::new("fuzz", UpdateTargets::new(&scratch, &scratch)),
        TrustFlag::new(true),
        16,
        ServicePorts {
            config: Box::new(MemoryConfigStore::new()),
            updater: Box::new(NoopUpdater),
            clock: Box::new(FrozenClock),
        },
    );

    let reply = service.handle_body(body, Some("application/json"));
    let envelope: serde_json::Value =
        serde_json::from_str(&reply.to_body()).expect("envelope must be JSON");
    assert!(envelope["status"]["code"].is_string());
    assert!(envelope["status"]["message"].is_string());
});
