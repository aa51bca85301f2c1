//! Result-row FIFO shared between the sampling path and `get-values`.
//!
//! The sampler appends rows from its own thread while command handling
//! drains them, so the queue carries its own lock.  Handles are cheap to
//! clone; every clone refers to the same buffer.
//!
//! ```text
//!  Sampler (producer) ──push──▶ ┌───────────────┐ ──drain──▶ get-values (consumer)
//!                               │ Mutex<VecDeque>│
//!                               └───────────────┘
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

/// One sampling pass: a value per session column, in column order.
pub type ResultRow = Vec<String>;

/// Rows kept per session when nobody drains them.
pub const DEFAULT_ROW_LIMIT: usize = 4096;

/// Bounded, concurrency-safe FIFO of [`ResultRow`]s.
#[derive(Debug, Clone)]
pub struct ResultQueue {
    rows: Arc<Mutex<VecDeque<ResultRow>>>,
    limit: usize,
}

impl ResultQueue {
    /// Create an empty queue holding at most `limit` rows (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            rows: Arc::new(Mutex::new(VecDeque::new())),
            limit: limit.max(1),
        }
    }

    /// Append a row at the tail.  When full, the oldest row is dropped and
    /// `false` is returned.
    pub fn push(&self, row: ResultRow) -> bool {
        let mut rows = self.lock();
        let mut kept_all = true;
        while rows.len() >= self.limit {
            rows.pop_front();
            kept_all = false;
        }
        rows.push_back(row);
        if !kept_all {
            warn!("ResultQueue: limit {} reached, oldest row dropped", self.limit);
        }
        kept_all
    }

    /// Remove and return every queued row, oldest first.
    ///
    /// Rows pushed after the drain stay queued for the next call.
    pub fn drain(&self) -> Vec<ResultRow> {
        let taken = std::mem::take(&mut *self.lock());
        taken.into()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether `other` is a handle to this same buffer.
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ResultRow>> {
        // A panicking producer leaves the deque itself consistent.
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResultQueue {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_LIMIT)
    }
}
