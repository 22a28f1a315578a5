//! In-memory record store for tests and single-process deployments.
//!
//! [`InMemoryRecordStore`] keeps all records in a `HashMap` behind a
//! `RwLock`. The single write lock is what makes `commit_merge`
//! atomic: the whole compound mutation runs under one guard.

use std::collections::HashMap;
use std::sync::RwLock;

use pen_types::{record_ref, ControlNumber, Document};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::traits::RecordStore;

struct Inner {
    records: HashMap<ControlNumber, Record>,
    next_control_number: u64,
}

/// An in-memory implementation of [`RecordStore`].
pub struct InMemoryRecordStore {
    inner: RwLock<Inner>,
}

impl InMemoryRecordStore {
    /// Create an empty store. Control numbers start at 1.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: HashMap::new(),
                next_control_number: 1,
            }),
        }
    }

    /// Fetch a record without following redirects or filtering
    /// tombstones. For audits and tests.
    pub fn get_raw(&self, id: ControlNumber) -> StoreResult<Record> {
        let inner = self.read()?;
        inner
            .records
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, data: Document) -> StoreResult<ControlNumber> {
        let mut inner = self.write()?;
        let id = ControlNumber(inner.next_control_number);
        inner.next_control_number += 1;
        inner.records.insert(id, Record::new(id, data));
        debug!(control_number = %id, "record inserted");
        Ok(id)
    }

    fn get(&self, id: ControlNumber) -> StoreResult<Record> {
        let inner = self.read()?;
        let mut current = inner.records.get(&id).ok_or(StoreError::NotFound(id))?;
        // Follow redirects off tombstoned records. Chains are short
        // (one hop per finalized merge) but looping is still bounded
        // by the record count to survive corrupt data.
        let mut hops = 0;
        while current.deleted {
            match current.new_record {
                Some(next) => {
                    current = inner
                        .records
                        .get(&next)
                        .ok_or(StoreError::NotFound(next))?;
                }
                None => return Err(StoreError::NotFound(id)),
            }
            hops += 1;
            if hops > inner.records.len() {
                return Err(StoreError::NotFound(id));
            }
        }
        Ok(current.clone())
    }

    fn put(&self, id: ControlNumber, data: Document) -> StoreResult<()> {
        let mut inner = self.write()?;
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.deleted {
            return Err(StoreError::NotFound(id));
        }
        record.data = data;
        debug!(control_number = %id, "record content replaced");
        Ok(())
    }

    fn delete(&self, id: ControlNumber) -> StoreResult<()> {
        let mut inner = self.write()?;
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.deleted = true;
        debug!(control_number = %id, "record tombstoned");
        Ok(())
    }

    fn redirect(&self, old: ControlNumber, new: ControlNumber) -> StoreResult<()> {
        let mut inner = self.write()?;
        match inner.records.get(&new) {
            Some(target) if target.is_live() => {}
            Some(_) => return Err(StoreError::BadRedirectTarget(new)),
            None => return Err(StoreError::NotFound(new)),
        }
        let record = inner
            .records
            .get_mut(&old)
            .ok_or(StoreError::NotFound(old))?;
        record.new_record = Some(new);
        debug!(from = %old, to = %new, "record redirected");
        Ok(())
    }

    fn commit_merge(
        &self,
        head: ControlNumber,
        update: ControlNumber,
        merged: Document,
    ) -> StoreResult<()> {
        if head == update {
            return Err(StoreError::SelfMerge(head));
        }
        let mut inner = self.write()?;

        // Validate everything before mutating anything.
        {
            let head_record = inner
                .records
                .get(&head)
                .ok_or(StoreError::NotFound(head))?;
            if head_record.deleted {
                return Err(StoreError::NotFound(head));
            }
            let update_record = inner
                .records
                .get(&update)
                .ok_or(StoreError::NotFound(update))?;
            if update_record.deleted {
                return Err(StoreError::AlreadyFinalized { head, update });
            }
        }

        // Retire the update: redirect its identity to head, tombstone
        // it, and leave a reference to the survivor in its document.
        {
            let update_record = inner
                .records
                .get_mut(&update)
                .ok_or(StoreError::NotFound(update))?;
            update_record.new_record = Some(head);
            update_record.deleted = true;
            update_record
                .data
                .insert("new_record".to_string(), Value::String(record_ref(head)));
        }

        // Replace head's content and append the backreference.
        {
            let head_record = inner
                .records
                .get_mut(&head)
                .ok_or(StoreError::NotFound(head))?;
            head_record.data = merged;
            if !head_record.deleted_records.contains(&update) {
                head_record.deleted_records.push(update);
            }
            let refs: Vec<Value> = head_record
                .deleted_records
                .iter()
                .map(|cn| Value::String(record_ref(*cn)))
                .collect();
            head_record
                .data
                .insert("deleted_records".to_string(), Value::Array(refs));
        }

        info!(head = %head, update = %update, "merge committed");
        Ok(())
    }
}
