//! JSONL file writer for verification results.
//!
//! Each [`VerificationResult`] is serialized as a single JSON line and
//! appended to the file via a buffered writer.

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use verity_application::{ResultStore, StoreError};
use verity_domain::VerificationResult;

/// Append-only result store writing one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record and
/// on `Drop`.
pub struct JsonlResultStore {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlResultStore {
    /// Open the store, creating the file (and parent directories) if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every stored result. Lines that fail to parse are skipped
    /// with a warning.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<VerificationResult>, StoreError> {
        let file = File::open(path.as_ref())?;
        let mut results = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(result) => results.push(result),
                Err(e) => warn!(
                    "Skipping unreadable result at {}:{}: {}",
                    path.as_ref().display(),
                    number + 1,
                    e
                ),
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl ResultStore for JsonlResultStore {
    async fn save_result(&self, result: &VerificationResult) -> Result<(), StoreError> {
        let line =
            serde_json::to_string(result).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(writer, "{}", line)?;
        // JSONL is append-only; flush each record so a crash loses at most one
        writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlResultStore {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use verity_domain::{
        AgentVerdict, ConsensusEngine, Evidence, Priority, TrustSnapshot, Verdict,
        VerificationMetadata, VerificationRequest,
    };

    fn result(claim: &str) -> VerificationResult {
        let request =
            VerificationRequest::new(claim, None, Priority::Normal, false, Duration::from_secs(5))
                .unwrap();
        let verdicts = vec![
            AgentVerdict::new("a", Verdict::True, 0.9)
                .with_evidence(vec![Evidence::new("atlas").with_source("https://atlas.example")]),
        ];
        let consensus = ConsensusEngine::default().resolve(&verdicts, &TrustSnapshot::new());
        VerificationResult::assemble(
            &request,
            &consensus,
            consensus.reasoning.clone(),
            None,
            VerificationMetadata::default(),
        )
    }

    #[tokio::test]
    async fn test_results_append_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.jsonl");

        let store = JsonlResultStore::open(&path).unwrap();
        store.save_result(&result("First claim")).await.unwrap();
        drop(store);

        let store = JsonlResultStore::open(&path).unwrap();
        store.save_result(&result("Second claim")).await.unwrap();
        assert_eq!(store.path(), path.as_path());
        drop(store);

        let results = JsonlResultStore::read_all(&path).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].claim, "First claim");
        assert_eq!(results[1].verdict, Verdict::True);
        assert_eq!(results[1].sources, vec!["https://atlas.example"]);
    }

    #[test]
    fn test_read_all_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        std::fs::write(&path, "not json\n\n").unwrap();
        assert!(JsonlResultStore::read_all(&path).unwrap().is_empty());
    }

    #[test]
    fn test_open_fails_on_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            JsonlResultStore::open(dir.path()),
            Err(StoreError::Io(_))
        ));
    }
}
