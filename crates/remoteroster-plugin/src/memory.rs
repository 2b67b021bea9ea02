//! In-memory collaborators.
//!
//! Used by the CLI for offline runs and by tests. Both record what they were
//! asked to do so callers can inspect the exact sequence of calls.

use crate::error::RosterError;
use crate::traits::{PacketRouter, RosterStore};
use crate::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use remoteroster_core::{Jid, RosterItem, Stanza};
use std::sync::atomic::{AtomicBool, Ordering};

/// One call made against a [`MemoryRosterStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Get { owner: Jid },
    Upsert { owner: Jid, jid: Jid },
    Remove { owner: Jid, jid: Jid },
}

/// Roster store backed by a concurrent map of per-owner item lists.
#[derive(Default)]
pub struct MemoryRosterStore {
    rosters: DashMap<Jid, Vec<RosterItem>>,
    operations: Mutex<Vec<StoreOperation>>,
    failing: AtomicBool,
    write_budget: Mutex<Option<usize>>,
}

impl MemoryRosterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Accept `writes` more upserts or removals, then fail every later one.
    /// `None` lifts the limit.
    pub fn fail_writes_after(&self, writes: Option<usize>) {
        *self.write_budget.lock() = writes;
    }

    /// Calls made so far, in order.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.operations.lock().clone()
    }

    /// Forget recorded calls.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: StoreOperation) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RosterError::store(format!("store unavailable: {:?}", op)));
        }
        self.operations.lock().push(op);
        Ok(())
    }

    fn record_write(&self, op: StoreOperation) -> Result<()> {
        {
            let mut budget = self.write_budget.lock();
            match budget.as_mut() {
                Some(0) => {
                    return Err(RosterError::store(format!("write limit reached: {:?}", op)));
                }
                Some(remaining) => *remaining -= 1,
                None => {}
            }
        }
        self.record(op)
    }
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    async fn get_roster_items(&self, owner: &Jid) -> Result<Vec<RosterItem>> {
        self.record(StoreOperation::Get {
            owner: owner.clone(),
        })?;
        Ok(self
            .rosters
            .get(owner)
            .map(|items| items.clone())
            .unwrap_or_default())
    }

    async fn upsert_item(&self, owner: &Jid, item: RosterItem) -> Result<()> {
        self.record_write(StoreOperation::Upsert {
            owner: owner.clone(),
            jid: item.jid.clone(),
        })?;
        let mut items = self.rosters.entry(owner.clone()).or_default();
        match items.iter().position(|existing| existing.jid == item.jid) {
            Some(idx) => items[idx] = item,
            None => items.push(item),
        }
        Ok(())
    }

    async fn remove_item(&self, owner: &Jid, jid: &Jid) -> Result<()> {
        self.record_write(StoreOperation::Remove {
            owner: owner.clone(),
            jid: jid.clone(),
        })?;
        if let Some(mut items) = self.rosters.get_mut(owner) {
            items.retain(|existing| &existing.jid != jid);
        }
        Ok(())
    }
}

/// Router that keeps every routed stanza.
#[derive(Default)]
pub struct MemoryRouter {
    routed: Mutex<Vec<Stanza>>,
    failing: AtomicBool,
}

impl MemoryRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent route fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stanzas routed so far, in order.
    pub fn routed(&self) -> Vec<Stanza> {
        self.routed.lock().clone()
    }
}

#[async_trait]
impl PacketRouter for MemoryRouter {
    async fn route(&self, stanza: Stanza) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RosterError::routing(format!(
                "no route to {}",
                stanza
                    .recipient()
                    .map(|jid| jid.to_string())
                    .unwrap_or_default()
            )));
        }
        self.routed.lock().push(stanza);
        Ok(())
    }
}
