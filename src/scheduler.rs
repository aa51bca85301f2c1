//! Sampling scheduler.
//!
//! `start` asks for the first sample of a session; every completed sample
//! asks for the next one.  The [`Sampler`] keeps at most one pending entry
//! per session and turns due entries into [`SampleJob`]s.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Sampling Loop                           │
//! │                                                              │
//! │  start ──schedule_next(gen 0)──▶ ┌──────────────┐            │
//! │                                  │ Pending table│            │
//! │  complete ──schedule_next(n+1)─▶ │ (per session)│            │
//! │      ▲                           └──────┬───────┘            │
//! │      │                                  │ collect_due(now)   │
//! │      │                                  ▼                    │
//! │  ┌───┴──────────┐   run_job      ┌──────────────┐            │
//! │  │ consume_one  │◀───────────────│  SampleJob   │──▶ reader  │
//! │  │ + reschedule │   row pushed   │  (columns)   │            │
//! │  └──────────────┘                └──────────────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads happen outside any lock on the session store: jobs carry their
//! own copy of the columns and a handle to the result queue.

use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{SampleScheduler, SensorReader};
use crate::session::{ResultQueue, SessionColumn, SessionId, SessionStore};

/// Maximum number of sessions with a pending sample.
pub const MAX_PENDING: usize = 8;

/// Value recorded for a column whose read failed.
pub const FAILED_READ: &str = "null";

/// A sample waiting for its due time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSample {
    pub session: SessionId,
    pub generation: u32,
    pub at: Duration,
}

/// One sampling pass, detached from the session store.
#[derive(Debug, Clone)]
pub struct SampleJob {
    pub session: SessionId,
    pub generation: u32,
    pub columns: Vec<SessionColumn>,
    pub results: ResultQueue,
}

/// Pending-sample table.  Implements [`SampleScheduler`] for the command
/// handlers.
#[derive(Debug, Default)]
pub struct Sampler {
    pending: heapless::Vec<PendingSample, MAX_PENDING>,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with a sample pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The pending entry for `session`, if any.
    pub fn pending_for(&self, session: SessionId) -> Option<PendingSample> {
        self.pending.iter().copied().find(|p| p.session == session)
    }

    /// Earliest due time across all pending entries.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|p| p.at).min()
    }

    /// Take every entry due at `now` and turn it into a job.
    ///
    /// Entries whose session is gone or stopped are dropped.
    pub fn collect_due(&mut self, now: Duration, sessions: &SessionStore) -> Vec<SampleJob> {
        let mut jobs = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].at > now {
                i += 1;
                continue;
            }
            let entry = self.pending.swap_remove(i);
            match sessions.get(entry.session) {
                Some(session) if session.is_active() => jobs.push(SampleJob {
                    session: entry.session,
                    generation: entry.generation,
                    columns: session.columns().to_vec(),
                    results: session.results().clone(),
                }),
                Some(_) => debug!("Sampler: session {} stopped, sample dropped", entry.session),
                None => debug!("Sampler: session {} gone, sample dropped", entry.session),
            }
        }
        jobs
    }

    /// Read every column of `job` and append the row.
    pub fn run_job(job: &SampleJob, reader: &mut dyn SensorReader) {
        let row = job
            .columns
            .iter()
            .map(|c| {
                reader.read(&c.address, c.id).unwrap_or_else(|| {
                    warn!("Sampler: read of '{}' ({}) failed", c.address, c.id);
                    FAILED_READ.to_owned()
                })
            })
            .collect();
        job.results.push(row);
    }

    /// Account for a finished job and schedule the session's next sample.
    ///
    /// A job whose session was replaced or stopped while it ran is ignored.
    pub fn complete(&mut self, job: &SampleJob, sessions: &mut SessionStore) {
        let Some(session) = sessions.get_mut(job.session) else {
            return;
        };
        if !session.results().same_buffer(&job.results) || !session.is_active() {
            debug!("Sampler: session {} changed during sample, not rescheduled", job.session);
            return;
        }

        session.consume_one();
        if !session.is_active() {
            info!(
                "Sampler: session {} finished after {} samples",
                job.session,
                job.generation + 1
            );
            return;
        }

        let generation = job.generation.saturating_add(1);
        let at = session.due_at(generation);
        self.schedule_next(at, job.session, generation);
    }

    /// Collect, run, and complete every due job in one pass.
    pub fn tick(
        &mut self,
        now: Duration,
        sessions: &mut SessionStore,
        reader: &mut dyn SensorReader,
    ) -> usize {
        let jobs = self.collect_due(now, sessions);
        for job in &jobs {
            Self::run_job(job, reader);
            self.complete(job, sessions);
        }
        jobs.len()
    }
}

impl SampleScheduler for Sampler {
    fn schedule_next(&mut self, at: Duration, session: SessionId, generation: u32) {
        let entry = PendingSample {
            session,
            generation,
            at,
        };
        if let Some(slot) = self.pending.iter_mut().find(|p| p.session == session) {
            *slot = entry;
            return;
        }
        if self.pending.push(entry).is_err() {
            warn!(
                "Sampler: pending table full ({}), session {} not scheduled",
                MAX_PENDING, session
            );
        }
    }
}
