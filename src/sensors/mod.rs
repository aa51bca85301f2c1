//! Sensor directory — identity resolution by address.
//!
//! The [`SensorRegistry`] is the in-memory implementation of the
//! [`SensorDirectory`] port.  It hands out opaque [`SensorId`]s, keeps
//! records in provisioning order, and is what the configuration store
//! persists and restores.

use core::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::app::ports::SensorDirectory;

/// Opaque sensor identifier issued by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorId(pub u32);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything needed to create or update a sensor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorSpec {
    pub address: String,
    /// Processing-method tag (e.g. `"avg"`, `"median"`); empty means raw.
    pub processing_method: String,
    /// Calibration unit.  Always empty from the provisioning path.
    pub unit: String,
    /// Calibration formula.  Always empty from the provisioning path.
    pub formula: String,
    /// Read latency in seconds.
    pub latency: f64,
}

impl SensorSpec {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

/// A registered sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub id: SensorId,
    pub address: String,
    pub processing_method: String,
    pub unit: String,
    pub formula: String,
    pub latency: f64,
}

impl SensorRecord {
    /// Strip the identity, keeping what is needed to re-provision.
    pub fn into_spec(self) -> SensorSpec {
        SensorSpec {
            address: self.address,
            processing_method: self.processing_method,
            unit: self.unit,
            formula: self.formula,
            latency: self.latency,
        }
    }
}

/// In-memory sensor directory.
#[derive(Debug, Default)]
pub struct SensorRegistry {
    records: Vec<SensorRecord>,
    next_id: u32,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&SensorRecord> {
        self.records.iter().find(|r| r.address == address)
    }

    fn alloc_id(&mut self) -> SensorId {
        self.next_id = self.next_id.wrapping_add(1);
        SensorId(self.next_id)
    }
}

impl SensorDirectory for SensorRegistry {
    fn reset(&mut self) {
        debug!("SensorRegistry: reset ({} records dropped)", self.records.len());
        self.records.clear();
        self.next_id = 0;
    }

    fn create_or_update(&mut self, spec: SensorSpec) -> SensorId {
        if let Some(existing) = self.records.iter_mut().find(|r| r.address == spec.address) {
            existing.processing_method = spec.processing_method;
            existing.unit = spec.unit;
            existing.formula = spec.formula;
            existing.latency = spec.latency;
            return existing.id;
        }

        let id = self.alloc_id();
        debug!("SensorRegistry: created {} at '{}'", id, spec.address);
        self.records.push(SensorRecord {
            id,
            address: spec.address,
            processing_method: spec.processing_method,
            unit: spec.unit,
            formula: spec.formula,
            latency: spec.latency,
        });
        id
    }

    fn by_address(&self, address: &str) -> Option<SensorId> {
        self.get(address).map(|r| r.id)
    }

    fn records(&self) -> Vec<SensorRecord> {
        self.records.clone()
    }
}
