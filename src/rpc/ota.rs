//! Firmware / configuration update via the `update` command.
//!
//! Flow: validate params → decode base64 → write artifact → apply → delete
//!
//! The artifact is deleted on every exit path once the write has been
//! attempted, whether the write, the apply step, or nothing failed.  The
//! literal name `interfaces` targets the network configuration directory;
//! everything else lands in the staging directory.  Names starting with
//! `update` are passive drops and are not applied.
//!
//! `restore` lives here too: it rolls the sensor configuration back to
//! the last persisted copy.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use log::{info, warn};
use serde_json::Value;

use crate::app::ports::UpdatePort;

use super::engine::CommandContext;
use super::response::{Reply, os_error_text};

/// Artifact name that is written to the network configuration directory.
pub const NETWORK_CONFIG_NAME: &str = "interfaces";

/// Artifacts whose name starts with this are stored but never applied.
pub const PASSIVE_PREFIX: &str = "update";

/// Where `update` artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTargets {
    pub network_dir: PathBuf,
    pub staging_dir: PathBuf,
}

impl UpdateTargets {
    pub fn new(network_dir: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            network_dir: network_dir.into(),
            staging_dir: staging_dir.into(),
        }
    }

    /// Destination for an artifact called `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        if name == NETWORK_CONFIG_NAME {
            self.network_dir.join(name)
        } else {
            self.staging_dir.join(name)
        }
    }
}

impl Default for UpdateTargets {
    fn default() -> Self {
        Self::new("/etc/network", "/var/tmp")
    }
}

/// A plain file name: non-empty, not hidden, no separators or NUL.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

/// Decode a base64 payload.
///
/// The output is sized against ¾ of the encoded length; a result more than
/// two bytes short of that is treated as a failed decode.
pub fn decode_payload(data: &str) -> Option<Vec<u8>> {
    let capacity = data.len() * 3 / 4;
    let decoded = base64::engine::general_purpose::STANDARD.decode(data).ok()?;
    (decoded.len() + 3 > capacity).then_some(decoded)
}

/// Deletes the artifact when dropped.
struct ArtifactGuard<'a> {
    path: &'a Path,
}

impl Drop for ArtifactGuard<'_> {
    fn drop(&mut self) {
        match fs::remove_file(self.path) {
            Ok(()) => info!("update: removed {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("update: cleanup of {} failed: {}", self.path.display(), e),
        }
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

pub(crate) fn update(
    params: Option<&Value>,
    targets: &UpdateTargets,
    updater: &mut dyn UpdatePort,
) -> Reply {
    let Some(params) = params.and_then(Value::as_object) else {
        return Reply::client_error("'params' must be object.");
    };

    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    let data = params.get("data").and_then(Value::as_str).unwrap_or_default();
    if name.is_empty() || data.is_empty() {
        return Reply::client_error("incomplete command.");
    }
    if !is_safe_name(name) {
        warn!("update: rejected file name {:?}", name);
        return Reply::client_error("invalid file name.");
    }

    let Some(bytes) = decode_payload(data) else {
        return Reply::server_error("can't decode data.");
    };

    let path = targets.path_for(name);
    let _artifact = ArtifactGuard { path: &path };

    if let Err(e) = write_artifact(&path, &bytes) {
        warn!("update: writing {} failed: {}", path.display(), e);
        return Reply::server_error(os_error_text(&e));
    }
    info!("update: wrote {} bytes to {}", bytes.len(), path.display());

    if name.starts_with(PASSIVE_PREFIX) {
        return Reply::ok();
    }

    match updater.apply(&path) {
        Ok(()) => {
            info!("update: {} applied", name);
            Reply::success("Upgrade successfully finished.")
        }
        Err(e) => {
            warn!("update: applying {} failed: {}", name, e);
            Reply::server_error(format!("Upgrade failed: {}", os_error_text(&e)))
        }
    }
}

pub(crate) fn restore(ctx: &mut CommandContext<'_>) -> Reply {
    match ctx.config.restore() {
        Ok(records) => {
            ctx.sensors.reset();
            let count = records.len();
            for record in records {
                ctx.sensors.create_or_update(record.into_spec());
            }
            info!("restore: {} sensors restored", count);
        }
        Err(e) => warn!("restore: {}", e),
    }
    Reply::ok()
}
