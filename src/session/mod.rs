//! Measurement sessions and their buffered results.
//!
//! A [`MeasureSession`] is a periodic sampling task over a fixed, ordered
//! set of sensor columns.  The [`SessionStore`] maps session ids to
//! sessions; only id 0 is reachable from the command surface today, but
//! nothing here assumes that.
//!
//! Lifecycle:
//!
//! ```text
//!   start ──▶ [active: Finite(n>0) | Unbounded] ──stop / count exhausted──▶ [stopped: Finite(0)]
//!     ▲                                                                        │
//!     └──────────────── start again (replaces the whole session) ◀────────────┘
//! ```

pub mod queue;
pub mod reconcile;

use std::collections::HashMap;
use std::time::Duration;

use log::info;

use crate::sensors::SensorId;

pub use queue::{DEFAULT_ROW_LIMIT, ResultQueue, ResultRow};

/// Session identifier.
pub type SessionId = i32;

/// The only session the command surface currently addresses.
pub const DEFAULT_SESSION: SessionId = 0;

/// How many samples a session still has to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleCount {
    /// `0` means stopped.
    Finite(u32),
    Unbounded,
}

impl SampleCount {
    pub const STOPPED: Self = Self::Finite(0);

    pub fn is_active(self) -> bool {
        self != Self::STOPPED
    }

    /// Account for one completed sample.
    pub fn consume_one(&mut self) {
        if let Self::Finite(n) = self {
            *n = n.saturating_sub(1);
        }
    }

    /// Wire representation: `-1` unbounded, `0` stopped, `n` remaining.
    pub fn as_raw(self) -> i64 {
        match self {
            Self::Finite(n) => i64::from(n),
            Self::Unbounded => -1,
        }
    }
}

/// One sensor column of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionColumn {
    pub address: String,
    pub id: SensorId,
}

impl SessionColumn {
    pub fn new(address: impl Into<String>, id: SensorId) -> Self {
        Self {
            address: address.into(),
            id,
        }
    }
}

/// A measurement session.
///
/// Addresses and ids live side by side in one column list, so they are
/// index-aligned by construction.
#[derive(Debug)]
pub struct MeasureSession {
    id: SessionId,
    remaining: SampleCount,
    interval: Duration,
    start: Duration,
    columns: Vec<SessionColumn>,
    results: ResultQueue,
}

impl MeasureSession {
    pub fn new(
        id: SessionId,
        remaining: SampleCount,
        interval: Duration,
        start: Duration,
        columns: Vec<SessionColumn>,
        row_limit: usize,
    ) -> Self {
        debug_assert!(
            !interval.is_zero() || remaining == SampleCount::Finite(1),
            "zero interval is only valid for a single sample"
        );
        Self {
            id,
            remaining,
            interval,
            start,
            columns,
            results: ResultQueue::new(row_limit),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn remaining(&self) -> SampleCount {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.remaining.is_active()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn columns(&self) -> &[SessionColumn] {
        &self.columns
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> + Clone {
        self.columns.iter().map(|c| c.address.as_str())
    }

    pub fn sensor_ids(&self) -> impl Iterator<Item = SensorId> + '_ {
        self.columns.iter().map(|c| c.id)
    }

    /// Handle to the buffered rows; shareable with the sampling thread.
    pub fn results(&self) -> &ResultQueue {
        &self.results
    }

    /// Set the remaining count to zero.  Buffered rows are kept.
    pub fn stop(&mut self) {
        self.remaining = SampleCount::STOPPED;
    }

    /// Account for one completed sample.
    pub fn consume_one(&mut self) {
        self.remaining.consume_one();
    }

    /// When sample number `generation` is due.  Saturates at
    /// `Duration::MAX`, which never comes due.
    pub fn due_at(&self, generation: u32) -> Duration {
        self.start.saturating_add(self.interval.saturating_mul(generation))
    }
}

/// Every session known to the appliance, keyed by id.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<SessionId, MeasureSession>,
    row_limit: usize,
}

impl SessionStore {
    pub fn new(row_limit: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            row_limit,
        }
    }

    /// Per-session result buffer bound for new sessions.
    pub fn row_limit(&self) -> usize {
        self.row_limit
    }

    /// Install `session`, evicting whatever was stored at its id.
    pub fn replace(&mut self, session: MeasureSession) -> Option<MeasureSession> {
        let evicted = self.sessions.insert(session.id(), session);
        if let Some(old) = &evicted {
            info!(
                "SessionStore: session {} replaced ({} unread rows discarded)",
                old.id(),
                old.results().len()
            );
        }
        evicted
    }

    pub fn get(&self, id: SessionId) -> Option<&MeasureSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut MeasureSession> {
        self.sessions.get_mut(&id)
    }

    /// Stop the session at `id`.  Returns `false` if there is none.
    pub fn stop(&mut self, id: SessionId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.stop();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_LIMIT)
    }
}
