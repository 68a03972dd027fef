//! Append-only document repository backed by plain files.
//!
//! Layout of a store directory:
//!
//! ```text
//! <root>/index.txt | index.json   one line per document: id + metadata
//! <root>/documents/<id>.txt       one payload file per document
//! ```
//!
//! `create` writes the payload file first and appends the index line second,
//! so a crash in between leaves a payload file that no index line points to.
//! Such orphans are ignored forever, including by `delete_all`. On `open` every
//! index line whose payload file is gone (or that does not parse) is dropped and
//! the log is compacted.
//!
//! A store directory must have a single writer. Two handles on the same
//! directory, in one process or across processes, are not supported.

use crate::document::StoredDocument;
use crate::error::{Result, StoreError};
use crate::DocId;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reserved: no document may carry this id.
pub const MAX_DOC_ID: DocId = DocId::MAX;

struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self, file_name: &str) -> PathBuf { self.root.join(file_name) }
    fn documents_dir(&self) -> PathBuf { self.root.join("documents") }
    fn document(&self, id: DocId) -> PathBuf { self.documents_dir().join(format!("{id}.txt")) }
}

/// Persistent repository of documents of one shape `D`.
///
/// The index log stays open for the lifetime of the handle and is closed when
/// the handle is dropped.
pub struct DocumentStore<D: StoredDocument> {
    paths: StorePaths,
    index: File,
    entries: BTreeMap<DocId, D::Meta>,
    next_id: DocId,
}

impl<D: StoredDocument> DocumentStore<D> {
    /// Open (creating if needed) the store rooted at `root` and reconcile its
    /// index log against the payload files on disk.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let paths = StorePaths::new(root);
        let documents_dir = paths.documents_dir();
        fs::create_dir_all(&documents_dir).map_err(|e| StoreError::io(&documents_dir, e))?;

        let index_path = paths.index(D::INDEX_FILE);
        let mut index = open_log(&index_path)?;
        let mut raw = Vec::new();
        index.read_to_end(&mut raw).map_err(|e| StoreError::io(&index_path, e))?;

        let mut lines = 0usize;
        let mut entries = BTreeMap::new();
        for chunk in raw.split_inclusive(|b| *b == b'\n') {
            lines += 1;
            match parse_line::<D>(chunk) {
                Ok((id, meta)) => {
                    if paths.document(id).is_file() {
                        entries.insert(id, meta);
                    } else {
                        warn!(id, url = D::url(&meta), "payload file missing, dropping index entry");
                    }
                }
                Err(err) => warn!(error = %err, "dropping index entry"),
            }
        }

        // MAX_DOC_ID is never accepted, so the successor always fits.
        let next_id = entries.keys().next_back().and_then(|max| max.checked_add(1)).unwrap_or(0);
        let mut store = Self { paths, index, entries, next_id };
        if store.entries.len() != lines {
            info!(
                index = %index_path.display(),
                lines,
                kept = store.entries.len(),
                "index log inconsistent with documents, rewriting"
            );
            store.rewrite_index()?;
        }
        debug!(root = %store.paths.root.display(), documents = store.entries.len(), next_id, "store opened");
        Ok(store)
    }

    pub fn root(&self) -> &Path { &self.paths.root }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Hand out the next unused id. Nothing is persisted until `create`.
    ///
    /// The counter stops at [`MAX_DOC_ID`], which `create` refuses, so an id
    /// that is already present is never handed out again.
    pub fn get_new_id(&mut self) -> DocId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Ids of all present documents, ascending.
    pub fn get_all_ids(&self) -> Vec<DocId> {
        self.entries.keys().copied().collect()
    }

    pub fn get(&self, id: DocId) -> Result<D> {
        let meta = self.entries.get(&id).ok_or(StoreError::NotFound(id))?;
        let path = self.paths.document(id);
        let payload = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        Ok(D::from_parts(id, meta.clone(), payload))
    }

    pub fn create(&mut self, document: D) -> Result<()> {
        let id = document.id();
        if self.entries.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        if id == MAX_DOC_ID {
            return Err(StoreError::InvalidDocument { id, reason: "id space exhausted".into() });
        }
        let (id, meta, payload) = document.into_parts()?;

        let path = self.paths.document(id);
        fs::write(&path, payload).map_err(|e| StoreError::io(&path, e))?;
        self.append_entry(id, &meta)?;

        self.next_id = self.next_id.max(id + 1);
        debug!(id, url = D::url(&meta), "document stored");
        self.entries.insert(id, meta);
        Ok(())
    }

    /// Remove every present document and empty the index log.
    ///
    /// Payload files that cannot be removed are logged and skipped; failing to
    /// truncate the log is an error and leaves the in-memory view untouched.
    pub fn delete_all(&mut self) -> Result<()> {
        let mut failed = 0usize;
        for id in self.entries.keys() {
            let path = self.paths.document(*id);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    failed += 1;
                    warn!(id, path = %path.display(), error = %e, "failed to remove payload file");
                }
            }
        }

        let index_path = self.paths.index(D::INDEX_FILE);
        self.index.set_len(0).map_err(|e| StoreError::io(&index_path, e))?;
        self.index.sync_all().map_err(|e| StoreError::io(&index_path, e))?;

        info!(root = %self.paths.root.display(), removed = self.entries.len() - failed, failed, "store cleared");
        self.entries.clear();
        self.next_id = 0;
        Ok(())
    }

    /// Sync the index log and release the handle.
    pub fn close(self) -> Result<()> {
        self.index
            .sync_all()
            .map_err(|e| StoreError::io(self.paths.index(D::INDEX_FILE), e))
    }

    fn append_entry(&mut self, id: DocId, meta: &D::Meta) -> Result<()> {
        let mut line = D::encode_entry(id, meta)?;
        line.push('\n');
        let index_path = self.paths.index(D::INDEX_FILE);
        self.index.write_all(line.as_bytes()).map_err(|e| StoreError::io(&index_path, e))?;
        self.index.flush().map_err(|e| StoreError::io(&index_path, e))?;
        self.index.sync_data().map_err(|e| StoreError::io(&index_path, e))?;
        Ok(())
    }

    /// Replace the log with the accepted entries: write a temp file, rename it
    /// over the log, reopen.
    fn rewrite_index(&mut self) -> Result<()> {
        let index_path = self.paths.index(D::INDEX_FILE);
        let tmp_path = self.paths.index(&format!("{}.tmp", D::INDEX_FILE));

        let mut contents = String::new();
        for (id, meta) in &self.entries {
            contents.push_str(&D::encode_entry(*id, meta)?);
            contents.push('\n');
        }
        let mut tmp = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        tmp.write_all(contents.as_bytes()).map_err(|e| StoreError::io(&tmp_path, e))?;
        tmp.sync_all().map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &index_path).map_err(|e| StoreError::io(&index_path, e))?;

        self.index = open_log(&index_path)?;
        Ok(())
    }
}

fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))
}

/// Decode one raw log line including its terminator. A line without `\n` is
/// the tail of an interrupted append.
fn parse_line<D: StoredDocument>(chunk: &[u8]) -> Result<(DocId, D::Meta)> {
    let text = std::str::from_utf8(chunk)
        .map_err(|e| StoreError::corrupt(&String::from_utf8_lossy(chunk), e.to_string()))?;
    let line = text
        .strip_suffix('\n')
        .ok_or_else(|| StoreError::corrupt(text, "torn write: missing line terminator"))?;
    let (id, meta) = D::decode_entry(line)?;
    if id == MAX_DOC_ID {
        return Err(StoreError::corrupt(line, "id out of range"));
    }
    Ok((id, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawDocument;
    use tempfile::tempdir;

    #[test]
    fn ids_start_at_zero() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::<RawDocument>::open(dir.path()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get_new_id(), 0);
        assert_eq!(store.get_new_id(), 1);
    }

    #[test]
    fn open_creates_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("raw_texts");
        let _store = DocumentStore::<RawDocument>::open(&root).unwrap();
        assert!(root.join("documents").is_dir());
        assert!(root.join("index.txt").is_file());
    }

    #[test]
    fn torn_tail_is_dropped() {
        let dir = tempdir().unwrap();
        {
            let mut store = DocumentStore::<RawDocument>::open(dir.path()).unwrap();
            store.create(RawDocument::new(0, "http://x/a", "a")).unwrap();
            store.create(RawDocument::new(1, "http://x/b", "b")).unwrap();
        }
        // Simulate a crash halfway through appending id 1's line.
        fs::write(dir.path().join("index.txt"), "0 http://x/a\n1 http://x/").unwrap();

        let store = DocumentStore::<RawDocument>::open(dir.path()).unwrap();
        assert_eq!(store.get_all_ids(), vec![0]);
        assert_eq!(fs::read_to_string(dir.path().join("index.txt")).unwrap(), "0 http://x/a\n");
    }

    #[test]
    fn create_after_explicit_high_id_keeps_counter_ahead() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::<RawDocument>::open(dir.path()).unwrap();
        store.create(RawDocument::new(9, "http://x/a", "a")).unwrap();
        assert_eq!(store.get_new_id(), 10);
    }

    #[test]
    fn invalid_document_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::<RawDocument>::open(dir.path()).unwrap();
        let err = store.create(RawDocument::new(0, "http://x/\n", "a")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
        assert!(!dir.path().join("documents/0.txt").exists());
        assert!(store.is_empty());
    }
}
