use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::io::store::{
    LogStore, Query, Snapshot, StoreError, Subscription, apply_query, generate_id,
    prepare_document,
};
use crate::model::document::{LogDocument, LogDraft, LogPatch};
use crate::model::log::LogRecord;

#[derive(Default)]
struct MemoryState {
    documents: Vec<(String, LogDocument)>,
    subscribers: Vec<(Query, Sender<Snapshot>)>,
}

impl MemoryState {
    fn pairs(&self) -> impl Iterator<Item = (&str, &LogDocument)> {
        self.documents.iter().map(|(id, doc)| (id.as_str(), doc))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|(doc_id, _)| doc_id == id)
    }

    /// Push a fresh snapshot to every live subscriber, forgetting the ones
    /// whose subscription was dropped.
    fn publish(&mut self) {
        let subscribers = std::mem::take(&mut self.subscribers);
        let live: Vec<_> = subscribers
            .into_iter()
            .filter(|(query, tx)| tx.send(apply_query(self.pairs(), query)).is_ok())
            .collect();
        self.subscribers = live;
    }
}

/// An in-process store. Clones share the same documents, and every write
/// is pushed synchronously to all subscribers, the writer's included.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Seed the store with already-stored documents (any shape)
    pub fn with_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (String, LogDocument)>,
    {
        let store = MemoryStore::default();
        if let Ok(mut state) = store.inner.lock() {
            state.documents.extend(documents);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map_or(0, |s| s.documents.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl LogStore for MemoryStore {
    fn create(&self, draft: LogDraft) -> Result<LogRecord, StoreError> {
        let mut state = self.state()?;
        let now = Utc::now();
        let doc = prepare_document(draft, state.documents.iter().map(|(_, d)| d), now)?;
        let id = generate_id(now, |candidate| state.position(candidate).is_some());
        let record = LogRecord::from_document(&id, &doc);
        state.documents.push((id, doc));
        state.publish();
        Ok(record)
    }

    fn update(&self, id: &str, patch: &LogPatch) -> Result<LogRecord, StoreError> {
        let mut state = self.state()?;
        let idx = state
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let (doc_id, doc) = &mut state.documents[idx];
        doc.apply(patch);
        let record = LogRecord::from_document(doc_id, doc);
        state.publish();
        Ok(record)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let idx = state
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        state.documents.remove(idx);
        state.publish();
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<LogRecord>, StoreError> {
        let state = self.state()?;
        Ok(state
            .position(id)
            .map(|idx| LogRecord::from_document(id, &state.documents[idx].1)))
    }

    fn query(&self, query: &Query) -> Result<Vec<LogRecord>, StoreError> {
        let state = self.state()?;
        Ok(apply_query(state.pairs(), query))
    }

    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let mut state = self.state()?;
        let (tx, rx) = mpsc::channel();
        // Receiver is alive, so the initial send cannot fail
        let _ = tx.send(apply_query(state.pairs(), &query));
        state.subscribers.push((query, tx));
        Ok(Subscription::new(rx, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::log::{Category, LogType};

    fn draft(log_type: LogType, ts: &str) -> LogDraft {
        LogDraft {
            log_type,
            categories: vec![Category::Home],
            subject: None,
            entry: "x".into(),
            task_ref: None,
            date_string: ts[..10].to_string(),
            timestamp: ts.to_string(),
            attachments: Vec::new(),
            links: Vec::new(),
        }
    }

    #[test]
    fn every_write_reaches_subscribers() {
        let store = MemoryStore::new();
        let sub = store.subscribe(Query::all()).unwrap();
        assert_eq!(sub.try_latest().map(|s| s.len()), Some(0));

        let log = store.create(draft(LogType::Open, "2025-01-01T10:00")).unwrap();
        assert_eq!(sub.try_latest().map(|s| s.len()), Some(1));

        store
            .update(
                &log.id,
                &LogPatch {
                    log_type: Some(LogType::Closed),
                    ..Default::default()
                },
            )
            .unwrap();
        let snapshot = sub.try_latest().unwrap();
        assert_eq!(snapshot[0].log_type, LogType::Closed);
        assert_eq!(snapshot[0].custom_id, Some(1));

        store.delete(&log.id).unwrap();
        assert_eq!(sub.try_latest().map(|s| s.len()), Some(0));
        assert_eq!(sub.try_latest(), None);
    }

    #[test]
    fn dropped_subscriptions_are_forgotten() {
        let store = MemoryStore::new();
        let sub = store.subscribe(Query::recent(5)).unwrap();
        drop(sub);
        store.create(draft(LogType::Note, "2025-01-01T10:00")).unwrap();
        assert_eq!(store.inner.lock().unwrap().subscribers.len(), 0);
    }

    #[test]
    fn subscribers_see_their_own_query() {
        let store = MemoryStore::new();
        let day = store.subscribe(Query::on_date("2025-01-02")).unwrap();
        store.create(draft(LogType::Note, "2025-01-01T10:00")).unwrap();
        store.create(draft(LogType::Note, "2025-01-02T10:00")).unwrap();
        let snapshot = day.try_latest().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].date_string, "2025-01-02");
    }
}
