use crate::error::{Result, StoreError};
use crate::InvertedIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Key of the one and only record in an index store.
pub const SENTINEL_KEY: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_documents: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn index_tmp(&self) -> PathBuf { self.root.join("index.bin.tmp") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Single-slot store for the current inverted index.
///
/// The blob on disk is a bincode-encoded table keyed by [`SENTINEL_KEY`].
/// `save` replaces the whole table through a temp file and a rename, so a
/// reader sees either the previous index or the new one.
pub struct IndexStore {
    paths: IndexPaths,
}

impl IndexStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let paths = IndexPaths::new(root);
        create_dir_all(&paths.root).map_err(|e| StoreError::io(&paths.root, e))?;
        Ok(Self { paths })
    }

    pub fn root(&self) -> &Path { &self.paths.root }

    /// The stored index, or `None` if nothing was ever saved.
    pub fn get(&self) -> Result<Option<InvertedIndex>> {
        let path = self.paths.index();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let mut slots: BTreeMap<u32, InvertedIndex> = bincode::deserialize(&bytes)?;
        Ok(slots.remove(&SENTINEL_KEY))
    }

    /// Discard whatever index is stored and put `index` in its place.
    pub fn save(&self, index: &InvertedIndex) -> Result<()> {
        let path = self.paths.index();
        let tmp_path = self.paths.index_tmp();
        let replacing = path.is_file();

        let slots: BTreeMap<u32, &InvertedIndex> = BTreeMap::from([(SENTINEL_KEY, index)]);
        let bytes = bincode::serialize(&slots)?;

        let mut f = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        f.write_all(&bytes).map_err(|e| StoreError::io(&tmp_path, e))?;
        f.sync_all().map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| StoreError::io(&path, e))?;

        tracing::info!(
            path = %path.display(),
            terms = index.num_terms(),
            bytes = bytes.len(),
            replaced = replacing,
            "inverted index saved"
        );
        Ok(())
    }

    pub fn save_meta(&self, meta: &MetaFile) -> Result<()> {
        let path = self.paths.meta();
        let json = serde_json::to_string_pretty(meta)?;
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }

    pub fn load_meta(&self) -> Result<Option<MetaFile>> {
        let path = self.paths.meta();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }
}
