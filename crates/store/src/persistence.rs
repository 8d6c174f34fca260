//! Single-file JSON persistence for the Document Store (§6): top-level
//! `{schema_v, corpus_version, documents}`, written atomically via
//! write-temp + rename.

use std::path::{Path, PathBuf};

use docqa_core::{CorpusVersion, NormalizedDocument, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::document_store::DocumentStore;
use crate::error::StoreError;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedArtifact {
    schema_v: u32,
    corpus_version: u64,
    documents: Vec<NormalizedDocument>,
}

/// Thin external collaborator that loads/saves the store's single JSON
/// artifact on disk.
#[derive(Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads a previously-persisted store, or an empty one if the file does
    /// not yet exist.
    pub async fn load(&self) -> Result<DocumentStore, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let artifact: PersistedArtifact = serde_json::from_slice(&bytes)?;
                let store = DocumentStore::from_documents(artifact.documents);
                resume_version(&store, artifact.corpus_version);
                Ok(store)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DocumentStore::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Serializes the full store snapshot and writes it atomically: the
    /// artifact is written to a sibling temp file first, then renamed over
    /// the target path so a crash mid-write never leaves a truncated file.
    pub async fn save(&self, store: &DocumentStore) -> Result<(), StoreError> {
        let artifact = PersistedArtifact {
            schema_v: SCHEMA_VERSION,
            corpus_version: store.version().0,
            documents: store.snapshot(),
        };
        let bytes = serde_json::to_vec_pretty(&artifact)?;

        let tmp_path = tmp_path_for(&self.path);
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Reconstructs the version a loaded store should resume from, since
/// `CorpusVersionCounter` itself is not persisted.
pub fn resume_version(store: &DocumentStore, persisted_corpus_version: u64) {
    while store.version() < CorpusVersion(persisted_corpus_version) {
        store.version_counter().bump();
    }
}
