//! 1-Wire temperature sensors via the kernel's w1 sysfs interface.
//!
//! Each sensor is a directory named by its address under the bus root
//! (`/sys/bus/w1/devices/28-0316a2794fff/`).  The `temperature` attribute
//! holds millidegrees Celsius as decimal text.

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::app::ports::SensorReader;
use crate::sensors::SensorId;

pub const DEFAULT_W1_ROOT: &str = "/sys/bus/w1/devices";

const TEMPERATURE_ATTR: &str = "temperature";

pub struct W1SensorReader {
    root: PathBuf,
}

impl W1SensorReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for W1SensorReader {
    fn default() -> Self {
        Self::new(DEFAULT_W1_ROOT)
    }
}

/// `"21437"` → `"21.437"`.  `None` for anything that isn't an integer.
pub fn millidegrees_to_text(raw: &str) -> Option<String> {
    let milli: i64 = raw.trim().parse().ok()?;
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.unsigned_abs();
    Some(format!("{}{}.{:03}", sign, abs / 1000, abs % 1000))
}

impl SensorReader for W1SensorReader {
    fn read(&mut self, address: &str, id: SensorId) -> Option<String> {
        // Addresses come from provisioning; never let one walk out of the root.
        if address.is_empty() || address.starts_with('.') || address.contains(['/', '\\']) {
            return None;
        }
        let path = self.root.join(address).join(TEMPERATURE_ATTR);
        match fs::read_to_string(&path) {
            Ok(raw) => millidegrees_to_text(&raw),
            Err(e) => {
                debug!("w1: {} ({}) read failed: {}", address, id, e);
                None
            }
        }
    }
}
