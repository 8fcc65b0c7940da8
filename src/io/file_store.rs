use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::io::lock::{DEFAULT_LOCK_TIMEOUT, StoreLock};
use crate::io::recovery::{self, RecoveryEntry, RecoveryReason};
use crate::io::store::{
    LogStore, Query, StoreError, Subscription, apply_query, generate_id, prepare_document,
};
use crate::io::watcher::StoreWatcher;
use crate::model::document::{LogDocument, LogDraft, LogPatch};
use crate::model::log::LogRecord;
use crate::model::workspace::Workspace;

/// On-disk shape of `daylog/logs.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct DocumentFile {
    #[serde(default)]
    documents: Vec<StoredDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    id: String,
    #[serde(flatten)]
    doc: LogDocument,
}

impl DocumentFile {
    fn pairs(&self) -> impl Iterator<Item = (&str, &LogDocument)> {
        self.documents.iter().map(|d| (d.id.as_str(), &d.doc))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }
}

/// Logs stored as one JSON document file inside `daylog/`.
///
/// Reads never lock: writes replace the file atomically, so a reader sees
/// either the old or the new file. Writes take [`StoreLock`] for the whole
/// read-modify-write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    path: PathBuf,
}

impl FileStore {
    pub fn open(workspace: &Workspace) -> Self {
        FileStore::at(&workspace.dir)
    }

    /// A store over `dir/logs.json`
    pub fn at(dir: &Path) -> Self {
        FileStore {
            dir: dir.to_path_buf(),
            path: dir.join("logs.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<DocumentFile, StoreError> {
        if !self.path.exists() {
            return Ok(DocumentFile::default());
        }
        let text = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(DocumentFile::default());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, file: &DocumentFile, touched: Option<&StoredDocument>) -> Result<(), StoreError> {
        let mut content = serde_json::to_string_pretty(file).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        content.push('\n');

        if let Err(source) = recovery::atomic_write(&self.path, content.as_bytes()) {
            if let Some(stored) = touched {
                recovery::log_recovery(
                    &self.dir,
                    RecoveryEntry {
                        timestamp: Utc::now(),
                        reason: RecoveryReason::Write,
                        log_id: stored.id.clone(),
                        detail: Some(source.to_string()),
                        body: serde_json::to_string_pretty(stored).unwrap_or_default(),
                    },
                );
            }
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }

    /// Read-modify-write under the store lock
    fn mutate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut DocumentFile) -> Result<(T, Option<StoredDocument>), StoreError>,
    {
        let _lock = StoreLock::acquire(&self.dir, DEFAULT_LOCK_TIMEOUT)?;
        let mut file = self.load()?;
        let (result, touched) = f(&mut file)?;
        self.save(&file, touched.as_ref())?;
        Ok(result)
    }
}

impl LogStore for FileStore {
    fn create(&self, draft: LogDraft) -> Result<LogRecord, StoreError> {
        self.mutate(|file| {
            let now = Utc::now();
            let doc = prepare_document(draft, file.documents.iter().map(|d| &d.doc), now)?;
            let id = generate_id(now, |candidate| file.position(candidate).is_some());
            let record = LogRecord::from_document(&id, &doc);
            let stored = StoredDocument { id, doc };
            file.documents.push(stored.clone());
            tracing::info!(
                id = %record.id,
                log_type = %record.log_type,
                custom_id = ?record.custom_id,
                "created log"
            );
            Ok((record, Some(stored)))
        })
    }

    fn update(&self, id: &str, patch: &LogPatch) -> Result<LogRecord, StoreError> {
        self.mutate(|file| {
            let idx = file
                .position(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            let stored = &mut file.documents[idx];
            stored.doc.apply(patch);
            tracing::info!(id, "updated log");
            Ok((
                LogRecord::from_document(&stored.id, &stored.doc),
                Some(stored.clone()),
            ))
        })
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let removed = self.mutate(|file| {
            let idx = file
                .position(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            Ok((file.documents.remove(idx), None))
        })?;
        recovery::log_recovery(
            &self.dir,
            RecoveryEntry {
                timestamp: Utc::now(),
                reason: RecoveryReason::Delete,
                log_id: removed.id.clone(),
                detail: None,
                body: serde_json::to_string_pretty(&removed).unwrap_or_default(),
            },
        );
        tracing::info!(id, "deleted log");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<LogRecord>, StoreError> {
        let file = self.load()?;
        Ok(file
            .documents
            .iter()
            .find(|d| d.id == id)
            .map(|d| LogRecord::from_document(&d.id, &d.doc)))
    }

    fn query(&self, query: &Query) -> Result<Vec<LogRecord>, StoreError> {
        let file = self.load()?;
        let records = apply_query(file.pairs(), query);
        tracing::debug!(?query, count = records.len(), "query");
        Ok(records)
    }

    fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::channel();
        tx.send(self.query(&query)?)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = self.clone();
        let watcher = StoreWatcher::start(&self.dir, move || match store.query(&query) {
            Ok(snapshot) => {
                let _ = tx.send(snapshot);
            }
            // A half-visible file is replaced on the next event
            Err(e) => tracing::warn!(error = %e, "could not refresh subscription"),
        })
        .map_err(|source| StoreError::Watch {
            path: self.dir.clone(),
            source,
        })?;

        Ok(Subscription::new(rx, Some(Box::new(watcher))))
    }
}
