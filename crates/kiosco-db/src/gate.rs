//! # Concurrency Gate
//!
//! The single admission point for every operation that mutates stock or
//! sales.
//!
//! ## Why a Gate?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite has no SELECT … FOR UPDATE. Two sales of the last unit:         │
//! │                                                                         │
//! │    Sale A: read stock=1 ──┐                                             │
//! │    Sale B: read stock=1 ──┼── both pass the check                       │
//! │    Sale A: stock -= 1     │                                             │
//! │    Sale B: stock -= 1  ───┘   ❌ stock = -1                             │
//! │                                                                         │
//! │  With the gate, check-then-write sequences never interleave:            │
//! │                                                                         │
//! │    Sale A: acquire ─► check ─► write ─► commit ─► release               │
//! │    Sale B:    (waits) ─────────────────────────► acquire ─► check ✗     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Re-entrancy
//! A lock is taken once per top-level operation. Inner operations (a ledger
//! debit inside sale creation, a sale created while the caller already holds
//! the gate) receive the [`GateGuard`] by reference as proof of admission
//! and never lock again, so nesting cannot deadlock.
//!
//! Reads do not pass through the gate.

use std::ptr;
use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::error::{DbError, DbResult};

/// Serializing lock over all stock/sale write sequences.
///
/// One instance per [`Database`](crate::Database); every ledger and
/// coordinator handed out by that database shares it.
#[derive(Debug, Default)]
pub struct ConcurrencyGate {
    lock: Mutex<()>,
}

impl ConcurrencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the gate is free and takes it.
    ///
    /// `operation` names the caller in the logs. The gate is released when
    /// the returned guard is dropped, on every exit path.
    pub async fn acquire(&self, operation: &'static str) -> GateGuard<'_> {
        let requested_at = Instant::now();
        let guard = self.lock.lock().await;
        let waited = requested_at.elapsed();

        debug!(
            operation,
            waited_ms = waited.as_millis() as u64,
            "Gate acquired"
        );

        GateGuard {
            gate: self,
            _lock: guard,
            operation,
            acquired_at: Instant::now(),
        }
    }

    /// Takes the gate only if nobody holds it.
    pub fn try_acquire(&self, operation: &'static str) -> Option<GateGuard<'_>> {
        let guard = self.lock.try_lock().ok()?;
        trace!(operation, "Gate acquired without waiting");
        Some(GateGuard {
            gate: self,
            _lock: guard,
            operation,
            acquired_at: Instant::now(),
        })
    }

    /// Whether some operation currently holds the gate.
    pub fn is_held(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Verifies that `guard` was issued by this gate.
    pub(crate) fn check(&self, guard: &GateGuard<'_>) -> DbResult<()> {
        if ptr::eq(self, guard.gate) {
            Ok(())
        } else {
            Err(DbError::Internal(format!(
                "operation admitted by a different gate ({})",
                guard.operation
            )))
        }
    }
}

/// Proof that the holder went through the gate.
///
/// Dropping it releases the gate.
#[derive(Debug)]
pub struct GateGuard<'a> {
    gate: &'a ConcurrencyGate,
    _lock: MutexGuard<'a, ()>,
    operation: &'static str,
    acquired_at: Instant,
}

impl GateGuard<'_> {
    /// Name of the top-level operation holding the gate.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        debug!(
            operation = self.operation,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "Gate released"
        );
    }
}
