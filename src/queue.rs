//! Local durable queue: redb-backed store of deferred mutations.
//!
//! The queue is the single source of truth for not-yet-confirmed writes.
//! Every operation is one small serializable transaction, so a foreground
//! context and the background drain task can share it through an `Arc`
//! without any in-memory coordination.

use crate::error::QueueError;
use crate::mutation::{MutationPatch, NewMutation, QueuedMutation, SyncState};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Mutations keyed by monotonic id; values are serde_json-encoded records.
const MUTATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("pending-mutations");
/// Queue metadata (the id counter).
const META: TableDefinition<&str, u64> = TableDefinition::new("queue-meta");

const NEXT_ID_KEY: &str = "next-id";

pub struct MutationQueue {
    db: Database,
}

impl MutationQueue {
    /// Open (or create) the queue database and ensure its tables exist, so
    /// read transactions never observe a missing table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let db = Database::create(path)?;
        let tx = db.begin_write()?;
        {
            tx.open_table(MUTATIONS)?;
            tx.open_table(META)?;
        }
        tx.commit()?;
        Ok(Self { db })
    }

    /// Insert a new mutation with `Pending` state and a fresh id.
    pub fn enqueue(&self, new: NewMutation) -> Result<u64, QueueError> {
        let tx = self.db.begin_write()?;
        let id;
        {
            let mut meta = tx.open_table(META)?;
            id = meta.get(NEXT_ID_KEY)?.map(|g| g.value()).unwrap_or(1);
            meta.insert(NEXT_ID_KEY, id + 1)?;

            let record = QueuedMutation {
                id,
                url: new.url,
                method: new.method,
                headers: new.headers,
                body: new.body,
                created_at: new.created_at,
                sync_state: SyncState::Pending,
                retry_count: 0,
                failure_reason: None,
            };
            let bytes = serde_json::to_vec(&record)?;
            let mut mutations = tx.open_table(MUTATIONS)?;
            mutations.insert(id, bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(id)
    }

    /// All `Pending` records in insertion order (oldest first), recomputed
    /// from storage on every call.
    pub fn list_pending(&self) -> Result<Vec<QueuedMutation>, QueueError> {
        self.list_by_state(SyncState::Pending)
    }

    /// All `Failed` records, retained for user inspection and manual retry.
    pub fn list_failed(&self) -> Result<Vec<QueuedMutation>, QueueError> {
        self.list_by_state(SyncState::Failed)
    }

    fn list_by_state(&self, state: SyncState) -> Result<Vec<QueuedMutation>, QueueError> {
        let tx = self.db.begin_read()?;
        let mutations = tx.open_table(MUTATIONS)?;
        let mut out = Vec::new();
        for row in mutations.iter()? {
            let (_, value) = row?;
            let record: QueuedMutation = serde_json::from_slice(value.value())?;
            if record.sync_state == state {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Fetch one record by id.
    pub fn get(&self, id: u64) -> Result<Option<QueuedMutation>, QueueError> {
        let tx = self.db.begin_read()?;
        let mutations = tx.open_table(MUTATIONS)?;
        match mutations.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Merge a patch into an existing record.
    ///
    /// `NotFound` can occur under concurrent deletion; callers that tolerate
    /// the race treat it as a benign no-op.
    pub fn update(&self, id: u64, patch: MutationPatch) -> Result<(), QueueError> {
        let tx = self.db.begin_write()?;
        {
            let mut mutations = tx.open_table(MUTATIONS)?;
            let mut record: QueuedMutation = match mutations.get(id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Err(QueueError::NotFound(id)),
            };
            patch.apply(&mut record);
            let bytes = serde_json::to_vec(&record)?;
            mutations.insert(id, bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove a record by id. Removing an absent id is a no-op, not an error.
    pub fn delete(&self, id: u64) -> Result<(), QueueError> {
        let tx = self.db.begin_write()?;
        {
            let mut mutations = tx.open_table(MUTATIONS)?;
            mutations.remove(id)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Total records currently in the queue, any state.
    pub fn count(&self) -> Result<u64, QueueError> {
        let tx = self.db.begin_read()?;
        let mutations = tx.open_table(MUTATIONS)?;
        Ok(mutations.len()?)
    }

    /// Manual retry of a failed entry: remove the old record and re-enqueue
    /// its request as a fresh pending mutation under a new id.
    ///
    /// Done as delete-plus-insert so no single record ever transitions
    /// backwards out of `Failed`.
    pub fn requeue(&self, id: u64) -> Result<u64, QueueError> {
        let tx = self.db.begin_write()?;
        let new_id;
        {
            let mut meta = tx.open_table(META)?;
            let mut mutations = tx.open_table(MUTATIONS)?;

            let old: QueuedMutation = match mutations.get(id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Err(QueueError::NotFound(id)),
            };
            mutations.remove(id)?;

            new_id = meta.get(NEXT_ID_KEY)?.map(|g| g.value()).unwrap_or(1);
            meta.insert(NEXT_ID_KEY, new_id + 1)?;

            let fresh = QueuedMutation {
                id: new_id,
                url: old.url,
                method: old.method,
                headers: old.headers,
                body: old.body,
                created_at: old.created_at,
                sync_state: SyncState::Pending,
                retry_count: 0,
                failure_reason: None,
            };
            let bytes = serde_json::to_vec(&fresh)?;
            mutations.insert(new_id, bytes.as_slice())?;
        }
        tx.commit()?;
        Ok(new_id)
    }
}
