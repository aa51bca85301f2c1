//! Appliance identity.
//!
//! The device id is the systemd machine id: 32 lowercase hex characters,
//! stable across reboots.  It is the message the license token signs.

use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Length of a well-formed machine id.
pub const MACHINE_ID_LEN: usize = 32;

/// Read and normalise the machine id at `path`.
pub fn read_device_id(path: &Path) -> io::Result<String> {
    let raw = fs::read_to_string(path)?;
    parse_device_id(&raw).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} does not hold a machine id", path.display()),
        )
    })
}

/// Trim and lower-case; `None` unless the result is 32 hex digits.
pub fn parse_device_id(raw: &str) -> Option<String> {
    let id = raw.trim().to_ascii_lowercase();
    (id.len() == MACHINE_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())).then_some(id)
}
