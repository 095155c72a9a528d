//! IRON Ledger - Append-only record of behavioral events
//!
//! The ledger is the sole source of truth: all standing, eras, scars, and
//! obligations are derived exclusively from replaying it. Events are never
//! updated or reordered once appended.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use iron_types::Event;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

/// The append-only event ledger.
///
/// Readers always receive copies, never live references into the store.
pub struct EventLedger {
    events: RwLock<Vec<Event>>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// Seed a ledger from an existing ordered event list. Rejects input
    /// whose timestamps are not non-decreasing.
    pub fn from_events(events: Vec<Event>) -> Result<Self, LedgerError> {
        let ledger = Self::new();
        for event in events {
            ledger.append(event)?;
        }
        Ok(ledger)
    }

    /// Append one event. Returns the assigned sequence number.
    ///
    /// Timestamps must be non-decreasing with respect to the current head;
    /// anything earlier would amount to retroactive reordering.
    pub fn append(&self, event: Event) -> Result<u64, LedgerError> {
        let mut events = self.events.write().map_err(|_| LedgerError::LockError)?;

        if let Some(head) = events.last() {
            if event.timestamp < head.timestamp {
                return Err(LedgerError::NonMonotonicTimestamp {
                    head: head.timestamp,
                    attempted: event.timestamp,
                });
            }
        }

        let seq = events.len() as u64;
        debug!(seq, kind = %event.kind, actor = %event.actor, "Event appended");
        events.push(event);
        Ok(seq)
    }

    /// Snapshot copy of the full ordered event list.
    pub fn events(&self) -> Result<Vec<Event>, LedgerError> {
        let events = self.events.read().map_err(|_| LedgerError::LockError)?;
        Ok(events.clone())
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        let events = self.events.read().map_err(|_| LedgerError::LockError)?;
        Ok(events.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Timestamp of the most recent event, if any.
    pub fn head_timestamp(&self) -> Result<Option<DateTime<Utc>>, LedgerError> {
        let events = self.events.read().map_err(|_| LedgerError::LockError)?;
        Ok(events.last().map(|e| e.timestamp))
    }

    /// Filtered copy of the ledger, preserving ledger order.
    pub fn query(&self, query: &LedgerQuery) -> Result<Vec<Event>, LedgerError> {
        let events = self.events.read().map_err(|_| LedgerError::LockError)?;

        let mut results: Vec<Event> = events
            .iter()
            .filter(|event| {
                if let Some(ref kind) = query.kind {
                    if &event.kind != kind {
                        return false;
                    }
                }
                if let Some(ref actor) = query.actor {
                    if &event.actor != actor {
                        return false;
                    }
                }
                if let Some(after) = query.after {
                    if event.timestamp < after {
                        return false;
                    }
                }
                if let Some(before) = query.before {
                    if event.timestamp > before {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    /// Aggregate statistics for audit views.
    pub fn statistics(&self) -> Result<LedgerStatistics, LedgerError> {
        let events = self.events.read().map_err(|_| LedgerError::LockError)?;

        let mut by_kind: HashMap<String, usize> = HashMap::new();
        for event in events.iter() {
            *by_kind.entry(event.kind.clone()).or_insert(0) += 1;
        }

        Ok(LedgerStatistics {
            total_events: events.len(),
            by_kind,
            first_timestamp: events.first().map(|e| e.timestamp),
            last_timestamp: events.last().map(|e| e.timestamp),
        })
    }
}

impl Default for EventLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters for ledger search.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub kind: Option<String>,
    pub actor: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Aggregate statistics about the ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerStatistics {
    pub total_events: usize,
    pub by_kind: HashMap<String, usize>,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

/// Ledger-related errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("non-monotonic timestamp: head is {head}, attempted append at {attempted}")]
    NonMonotonicTimestamp {
        head: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    #[error("lock error")]
    LockError,
}
