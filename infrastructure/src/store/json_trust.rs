//! Trust records kept in a single JSON document.
//!
//! The whole document is rewritten on every save: written to a sibling
//! temporary file, then renamed over the original so readers never see a
//! partial write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use verity_application::{StoreError, TrustStore};
use verity_domain::{AgentId, TrustRecord};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrustDocument {
    version: u32,
    records: BTreeMap<AgentId, TrustRecord>,
}

/// File-backed [`TrustStore`]
pub struct JsonTrustStore {
    path: PathBuf,
    records: Mutex<BTreeMap<AgentId, TrustRecord>>,
}

impl JsonTrustStore {
    /// Open the store. A missing file starts an empty store; an unreadable
    /// one is an error rather than silently discarding history.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let document: TrustDocument = serde_json::from_str(&content)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                if document.version != FORMAT_VERSION {
                    return Err(StoreError::Unavailable(format!(
                        "{} has format version {}, expected {}",
                        path.display(),
                        document.version,
                        FORMAT_VERSION
                    )));
                }
                document.records
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("Opened trust store {} ({} records)", path.display(), records.len());
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }

    async fn write_document(&self, records: &BTreeMap<AgentId, TrustRecord>) -> Result<(), StoreError> {
        let document = TrustDocument {
            version: FORMAT_VERSION,
            records: records.clone(),
        };
        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TrustStore for JsonTrustStore {
    async fn load_trust_record(
        &self,
        agent_id: &AgentId,
    ) -> Result<Option<TrustRecord>, StoreError> {
        Ok(self.records.lock().await.get(agent_id).cloned())
    }

    async fn save_trust_record(&self, record: &TrustRecord) -> Result<(), StoreError> {
        // Held across the write so concurrent saves land in order
        let mut records = self.records.lock().await;
        records.insert(record.agent_id.clone(), record.clone());
        self.write_document(&records).await
    }
}
