//! Artifact installer.
//!
//! Runs the configured installer command with the artifact path appended,
//! e.g. `["dpkg", "-i"]` → `dpkg -i /var/tmp/servsens_0.3.deb`.  Blocks
//! until the installer exits.

use std::io;
use std::path::Path;
use std::process::Command;

use log::{info, warn};

use crate::app::ports::UpdatePort;

pub struct ProcessUpdater {
    program: String,
    args: Vec<String>,
}

impl ProcessUpdater {
    /// Build from an argv prefix.  `None` if `argv` is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl UpdatePort for ProcessUpdater {
    fn apply(&mut self, artifact: &Path) -> io::Result<()> {
        info!("updater: {} {:?} {}", self.program, self.args, artifact.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(artifact)
            .output()?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        warn!("updater: {} exited with {}: {}", self.program, output.status, detail);
        Err(io::Error::other(if detail.is_empty() {
            format!("installer exited with {}", output.status)
        } else {
            detail.to_owned()
        }))
    }
}
