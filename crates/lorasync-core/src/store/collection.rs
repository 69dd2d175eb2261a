// ── Generic record table ──
//
// Concurrent storage keyed by local id. Reads return `Arc` clones so
// callers never hold a shard lock across an await point.

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::LocalId;

pub(crate) struct RecordTable<T: Clone + Send + Sync + 'static> {
    rows: DashMap<LocalId, Arc<T>>,
}

impl<T: Clone + Send + Sync + 'static> RecordTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Insert or replace a row. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, id: LocalId, row: T) -> bool {
        self.rows.insert(id, Arc::new(row)).is_none()
    }

    pub(crate) fn get(&self, id: LocalId) -> Option<Arc<T>> {
        self.rows.get(&id).map(|r| Arc::clone(r.value()))
    }

    /// First row (lowest id) matching `pred`.
    pub(crate) fn find(&self, pred: impl Fn(&T) -> bool) -> Option<Arc<T>> {
        self.filter(pred).into_iter().next()
    }

    /// All rows matching `pred`, ordered by id.
    pub(crate) fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<Arc<T>> {
        let mut rows: Vec<(LocalId, Arc<T>)> = self
            .rows
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| (*r.key(), Arc::clone(r.value())))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows.into_iter().map(|(_, v)| v).collect()
    }

    /// Every row, ordered by id.
    pub(crate) fn snapshot(&self) -> Vec<Arc<T>> {
        self.filter(|_| true)
    }

    pub(crate) fn remove(&self, id: LocalId) -> Option<Arc<T>> {
        self.rows.remove(&id).map(|(_, v)| v)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}
