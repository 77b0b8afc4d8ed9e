//! Whole-document record stores.
//!
//! A store owns one ordered list of records, read fully from its backend when
//! opened and written back in full after every mutation. A mutation only
//! becomes visible in memory once the write has succeeded.

pub mod backend;

use crate::errors::{AppError, AppResult};
use crate::models::Record;
use chrono::NaiveDateTime;
use std::collections::HashSet;

pub use backend::{JsonFileBackend, MemoryBackend, StorageBackend};

#[derive(Debug)]
pub struct RecordStore<T: Record, B: StorageBackend> {
    backend: B,
    records: Vec<T>,
}

impl<T: Record, B: StorageBackend> RecordStore<T, B> {
    /// Opens the store, failing with `CorruptStore` if the document exists
    /// but does not parse. An absent document opens as an empty store.
    pub fn open(backend: B) -> AppResult<Self> {
        let records = read_document::<T, B>(&backend)?;
        tracing::debug!(
            kind = T::KIND,
            location = %backend.location().display(),
            count = records.len(),
            "record store opened"
        );
        Ok(Self { backend, records })
    }

    /// Re-reads the backing document without touching the in-memory list.
    pub fn load(&self) -> AppResult<Vec<T>> {
        read_document::<T, B>(&self.backend)
    }

    /// Overwrites the backing document with `records`.
    pub fn save(&self, records: &[T]) -> AppResult<()> {
        let mut bytes = serde_json::to_vec_pretty(records)?;
        bytes.push(b'\n');
        self.backend.write(&bytes)
    }

    /// Creates a record with identifier `len + 1` and persists it.
    pub fn append(&mut self, draft: T::Draft, now: NaiveDateTime) -> AppResult<T> {
        let id = next_id(self.records.len())?;
        let record = T::from_draft(id, draft, now);
        self.records.push(record.clone());
        if let Err(error) = self.save(&self.records) {
            self.records.pop();
            tracing::error!(kind = T::KIND, id, error = %error, "append not persisted");
            return Err(error);
        }
        tracing::info!(kind = T::KIND, id, "record appended");
        Ok(record)
    }

    pub fn find_by_id(&self, id: u32) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// Applies `mutator` to the record with `id` and persists the result.
    /// Returns `Ok(false)` without writing when no record matches.
    pub fn update_by_id<F>(&mut self, id: u32, mutator: F) -> AppResult<bool>
    where
        F: FnOnce(&mut T),
    {
        let Some(index) = self.records.iter().position(|record| record.id() == id) else {
            tracing::debug!(kind = T::KIND, id, "update skipped, no such record");
            return Ok(false);
        };
        let previous = self.records[index].clone();
        mutator(&mut self.records[index]);
        if let Err(error) = self.save(&self.records) {
            self.records[index] = previous;
            tracing::error!(kind = T::KIND, id, error = %error, "update not persisted");
            return Err(error);
        }
        tracing::info!(kind = T::KIND, id, "record updated");
        Ok(true)
    }

    /// Records matching `predicate`, in insertion order.
    pub fn filter<P>(&self, predicate: P) -> Vec<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.records.iter().filter(|record| predicate(*record)).collect()
    }

    pub fn list_all(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn next_id(count: usize) -> AppResult<u32> {
    u32::try_from(count)
        .ok()
        .and_then(|count| count.checked_add(1))
        .ok_or_else(|| AppError::Internal("record identifier space exhausted".to_string()))
}

fn read_document<T: Record, B: StorageBackend>(backend: &B) -> AppResult<Vec<T>> {
    let Some(bytes) = backend.read()? else {
        return Ok(Vec::new());
    };
    let records: Vec<T> = serde_json::from_slice(&bytes).map_err(|error| AppError::CorruptStore {
        path: backend.location(),
        reason: error.to_string(),
    })?;

    let mut seen = HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.id()) {
            tracing::warn!(
                kind = T::KIND,
                id = record.id(),
                location = %backend.location().display(),
                "duplicate record identifier in document"
            );
        }
    }
    Ok(records)
}
