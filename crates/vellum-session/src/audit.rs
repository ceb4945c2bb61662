//! In-memory audit trail for lock-relevant session events.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Why the session transitioned to `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LockReason {
    /// The user locked the session explicitly.
    Manual,
    /// The idle countdown elapsed with no recorded activity.
    IdleTimeout,
}

/// A session event worth keeping a record of.
///
/// Lock transitions and unlock failures gate access to decrypted
/// data, so they are always recorded; none of them is ever fatal to
/// the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AuditEvent {
    /// A login completed and the session entered `Unlocked`.
    SignedIn {
        /// Account that signed in.
        username: String,
    },
    /// A lock transition occurred.
    Locked {
        /// What triggered it.
        reason: LockReason,
    },
    /// An unlock attempt re-authorized access.
    Unlocked,
    /// An unlock attempt presented a secret or code that was refused.
    UnlockFailed,
    /// The session ended and all key material was discarded.
    SignedOut,
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    /// Unique id for de-duplication in host-side displays.
    pub id: Uuid,
    /// When the event was recorded.
    pub at: DateTime<Utc>,
    /// What happened.
    pub event: AuditEvent,
}

/// Bounded event log; oldest entries fall off first.
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

fn lock_entries(mutex: &Mutex<VecDeque<AuditEntry>>) -> MutexGuard<'_, VecDeque<AuditEntry>> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("audit log mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

impl AuditLog {
    /// Log retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    /// Record `event` now.
    pub fn record(&self, event: AuditEvent) {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            at: Utc::now(),
            event,
        };
        tracing::info!(event = ?entry.event, "session audit");

        let mut entries = lock_entries(&self.entries);
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        lock_entries(&self.entries).iter().cloned().collect()
    }
}
