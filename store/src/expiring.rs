//! The expiring indexed store and its background reaper.
//!
//! A dense arena of records with two secondary indexes (by id, by owner)
//! behind a read/write lock, plus one spawned worker that owns the deadline
//! heap exclusively and physically removes records once their expiry
//! passes. Reads never see an expired record: lookups check the expiry and
//! drop stale records on the spot, whether or not the reaper got there yet.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use wicket_types::Timestamp;

use crate::error::StoreError;
use crate::heap::{Deadline, DeadlineHeap};
use crate::page::Page;

/// Capacity of the reaper's inbound deadline queue.
const DEADLINE_QUEUE_CAPACITY: usize = 64;

/// A record the store can hold: identified, owned, and expiring.
pub trait Expiring: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn owner(&self) -> Uuid;
    fn expires_at(&self) -> Timestamp;
    fn set_expires_at(&mut self, at: Timestamp);
}

/// Record arena plus both secondary indexes.
///
/// Every index entry points at the arena slot holding the record it names;
/// removal swaps the last record into the vacated slot and re-points both
/// of the moved record's index entries.
struct Table<R> {
    records: Vec<R>,
    by_id: HashMap<Uuid, usize>,
    by_owner: HashMap<Uuid, usize>,
}

impl<R: Expiring> Table<R> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            by_id: HashMap::new(),
            by_owner: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, id: &Uuid) -> Option<&R> {
        self.by_id.get(id).map(|&idx| &self.records[idx])
    }

    fn get_mut(&mut self, id: &Uuid) -> Option<&mut R> {
        self.by_id.get(id).map(|&idx| &mut self.records[idx])
    }

    fn get_by_owner(&self, owner: &Uuid) -> Option<&R> {
        self.by_owner.get(owner).map(|&idx| &self.records[idx])
    }

    /// Append a record, evicting any live record its owner already has.
    fn insert(&mut self, record: R) {
        let evicted = self.get_by_owner(&record.owner()).map(|r| r.id());
        if let Some(previous_id) = evicted {
            self.remove(previous_id);
        }

        let idx = self.records.len();
        self.by_id.insert(record.id(), idx);
        self.by_owner.insert(record.owner(), idx);
        self.records.push(record);
    }

    /// Swap-remove a record and fix up the moved record's index entries.
    /// Unknown ids are a no-op.
    fn remove(&mut self, id: Uuid) -> Option<R> {
        let idx = self.by_id.remove(&id)?;
        let record = self.records.swap_remove(idx);
        self.by_owner.remove(&record.owner());

        if idx < self.records.len() {
            let moved = &self.records[idx];
            self.by_id.insert(moved.id(), idx);
            self.by_owner.insert(moved.owner(), idx);
        }

        Some(record)
    }
}

/// Repository for expiring records.
///
/// Cloning is cheap and every clone works on the same table. The
/// constructor spawns the reaper; the `shutdown` receiver it takes is the
/// single-shot cancellation for that worker, threaded in from the process
/// entry point. Once shutdown fires the reaper exits for good — no further
/// physical reaps happen, while lazy expiry keeps expired records
/// unreadable.
pub struct ExpiringStore<R: Expiring> {
    table: Arc<RwLock<Table<R>>>,
    deadlines: mpsc::Sender<Deadline>,
}

impl<R: Expiring> Clone for ExpiringStore<R> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            deadlines: self.deadlines.clone(),
        }
    }
}

impl<R: Expiring> ExpiringStore<R> {
    /// Create the store and spawn its reaper. Must be called from within a
    /// tokio runtime.
    pub fn new(shutdown: broadcast::Receiver<()>) -> Self {
        let (deadlines, rx) = mpsc::channel(DEADLINE_QUEUE_CAPACITY);
        let table = Arc::new(RwLock::new(Table::new()));

        let reaper = Reaper {
            table: Arc::clone(&table),
            heap: DeadlineHeap::new(),
            rx,
            shutdown,
        };
        tokio::spawn(reaper.run());

        Self { table, deadlines }
    }

    /// A defensive copy of the window `[offset, offset + limit)`, clamped
    /// to the live range. Empty or inverted windows yield an empty page,
    /// never an error; `total` is always the full live count.
    pub async fn list(&self, offset: usize, limit: usize) -> Page<R> {
        let table = self.table.read().await;
        let total = table.len();

        let lo = offset.min(total);
        let hi = offset.saturating_add(limit).min(total);
        if lo >= hi {
            return Page {
                offset: lo,
                records: Vec::new(),
                total,
            };
        }

        Page {
            offset: lo,
            records: table.records[lo..hi].to_vec(),
            total,
        }
    }

    /// Look up by id. A record at or past its expiry is removed on the spot
    /// and reported as [`StoreError::NotFound`].
    pub async fn get(&self, id: Uuid) -> Result<R, StoreError> {
        {
            let table = self.table.read().await;
            match table.get(&id) {
                None => return Err(StoreError::NotFound),
                Some(r) if !r.expires_at().is_expired_at(Timestamp::now()) => {
                    return Ok(r.clone())
                }
                Some(_) => {}
            }
        }

        // Found but expired: take the write lock and drop it. Re-check —
        // the record may have been renewed or deleted in between.
        let mut table = self.table.write().await;
        let Some(record) = table.get(&id).cloned() else {
            return Err(StoreError::NotFound);
        };
        if record.expires_at().is_expired_at(Timestamp::now()) {
            table.remove(id);
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    /// Look up by owner, with the same lazy-expiry semantics as [`get`].
    pub async fn get_by_owner(&self, owner: Uuid) -> Result<R, StoreError> {
        {
            let table = self.table.read().await;
            match table.get_by_owner(&owner) {
                None => return Err(StoreError::NotFound),
                Some(r) if !r.expires_at().is_expired_at(Timestamp::now()) => {
                    return Ok(r.clone())
                }
                Some(_) => {}
            }
        }

        let mut table = self.table.write().await;
        let Some(record) = table.get_by_owner(&owner) else {
            return Err(StoreError::NotFound);
        };
        let record = record.clone();
        if record.expires_at().is_expired_at(Timestamp::now()) {
            table.remove(record.id());
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    /// Insert a new record. An owner holds at most one live record: any
    /// record the owner already has is removed first.
    ///
    /// A reap deadline for the record's expiry is posted to the reaper.
    /// When the deadline queue is saturated this call waits for queue space
    /// (asynchronous back-pressure) — deadlines are never silently dropped
    /// while the reaper is alive.
    pub async fn create(&self, record: R) {
        let deadline = Deadline::new(record.id(), record.expires_at());
        {
            let mut table = self.table.write().await;
            table.insert(record);
        }
        self.post(deadline).await;
    }

    /// Refresh the expiry of an existing record in place; id and owner are
    /// untouched.
    ///
    /// Posts an additional deadline for the new expiry. Deadlines already
    /// in the heap are not retracted — the reaper re-validates every
    /// deadline against the record's live expiry when it fires, so a
    /// renewed record outlives its superseded deadlines. Back-pressure as
    /// for [`create`].
    pub async fn update(&self, id: Uuid, expires_at: Timestamp) -> Result<(), StoreError> {
        {
            let mut table = self.table.write().await;
            let record = table.get_mut(&id).ok_or(StoreError::NotFound)?;
            record.set_expires_at(expires_at);
        }
        self.post(Deadline::new(id, expires_at)).await;
        Ok(())
    }

    /// Remove a record. Removing an unknown id is a no-op, not an error.
    pub async fn delete(&self, id: Uuid) {
        let mut table = self.table.write().await;
        table.remove(id);
    }

    /// Remove and return a live record in one step, for one-shot
    /// consumption. An expired record is removed but reported as missing,
    /// exactly like [`get`](Self::get).
    pub async fn take(&self, id: Uuid) -> Result<R, StoreError> {
        let mut table = self.table.write().await;
        let Some(record) = table.remove(id) else {
            return Err(StoreError::NotFound);
        };
        if record.expires_at().is_expired_at(Timestamp::now()) {
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    /// Number of physically present records, including any whose expiry
    /// has passed but which have not been reaped yet.
    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether the table physically holds `id`, ignoring expiry.
    pub async fn contains(&self, id: Uuid) -> bool {
        self.table.read().await.by_id.contains_key(&id)
    }

    async fn post(&self, deadline: Deadline) {
        if self.deadlines.send(deadline).await.is_err() {
            // Reaper already stopped: reaping is over for this process and
            // lazy expiry is the only removal path left.
            tracing::debug!(id = %deadline.id, "reaper gone, deadline discarded");
        }
    }
}

/// The background worker. Owns the heap exclusively — no lock ever guards
/// it — and is the only task that removes records on a timer.
struct Reaper<R: Expiring> {
    table: Arc<RwLock<Table<R>>>,
    heap: DeadlineHeap,
    rx: mpsc::Receiver<Deadline>,
    shutdown: broadcast::Receiver<()>,
}

impl<R: Expiring> Reaper<R> {
    async fn run(mut self) {
        loop {
            let next = self
                .heap
                .peek()
                .map(|d| d.expires_at.duration_until(Timestamp::now()));

            tokio::select! {
                biased;
                _ = self.shutdown.recv() => {
                    tracing::debug!("reaper shutting down");
                    break;
                }
                Some(deadline) = self.rx.recv() => {
                    self.heap.push(deadline);
                }
                _ = tokio::time::sleep(next.unwrap_or(Duration::ZERO)), if next.is_some() => {
                    let deadline = self
                        .heap
                        .pop()
                        .expect("timer armed only while the heap is non-empty");
                    self.reap(deadline).await;
                }
            }
        }
    }

    /// Remove the record named by a fired deadline — but only if its live
    /// expiry has actually passed. Renewal posts a fresh deadline without
    /// retracting old ones, so a popped deadline can be stale; deleting
    /// unconditionally here would kill renewed records at their original,
    /// shorter deadline. Ids that are already gone are a benign no-op.
    async fn reap(&self, deadline: Deadline) {
        let mut table = self.table.write().await;
        let expired = table
            .get(&deadline.id)
            .map(|r| r.expires_at().is_expired_at(Timestamp::now()));
        if expired == Some(true) {
            table.remove(deadline.id);
            tracing::trace!(id = %deadline.id, "reaped expired record");
        }
    }
}
