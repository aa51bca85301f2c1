//! Appliance verification — the trust gate's input.
//!
//! A verified appliance holds a license token equal to
//! `HMAC-SHA256(psk, device_id)`, hex-encoded.  Verification runs outside
//! command handling; the result is published through a [`TrustFlag`] and
//! copied into each [`CommandContext`](super::engine::CommandContext).
//!
//! Crypto is handled by the `hmac-sha256` crate (pure Rust, constant-time
//! verification).

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::adapters::device_id::read_device_id;

/// Length of an HMAC-SHA256 tag.
pub const TAG_LEN: usize = 32;

/// Process-wide verification state, shared by handle.
#[derive(Debug, Clone, Default)]
pub struct TrustFlag(Arc<AtomicBool>);

impl TrustFlag {
    pub fn new(verified: bool) -> Self {
        Self(Arc::new(AtomicBool::new(verified)))
    }

    pub fn is_verified(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, verified: bool) {
        self.0.store(verified, Ordering::Release);
    }
}

/// The license token expected for `device_id`.
pub fn compute_license(psk: &[u8], device_id: &[u8]) -> [u8; TAG_LEN] {
    hmac_sha256::HMAC::mac(device_id, psk)
}

/// Check a hex-encoded license token against `psk` and `device_id`.
pub fn verify_license(psk: &[u8], device_id: &[u8], token_hex: &str) -> bool {
    let Ok(token) = hex::decode(token_hex.trim()) else {
        warn!("auth: license token is not valid hex");
        return false;
    };
    let Ok(tag) = <[u8; TAG_LEN]>::try_from(token.as_slice()) else {
        warn!("auth: license token length invalid ({})", token.len());
        return false;
    };

    if hmac_sha256::HMAC::verify(device_id, psk, &tag) {
        info!("auth: license verified");
        true
    } else {
        warn!("auth: license verification failed");
        false
    }
}

/// Verify this appliance from the machine id and license files.
pub fn verify_appliance(psk: &[u8], device_id_path: &Path, token_path: &Path) -> bool {
    let device_id = match read_device_id(device_id_path) {
        Ok(id) => id,
        Err(e) => {
            warn!("auth: device id unavailable: {}", e);
            return false;
        }
    };
    let token = match fs::read_to_string(token_path) {
        Ok(token) => token,
        Err(e) => {
            warn!("auth: license {} unreadable: {}", token_path.display(), e);
            return false;
        }
    };
    verify_license(psk, device_id.as_bytes(), &token)
}
