use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::document::AnnotatedDocument;

/// Configuration for document reading behavior
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
}

/// Statistics for one document read
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub bytes_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

/// Async reader that loads annotated documents from JSON files
pub struct AsyncDocumentReader {
    config: ReaderConfig,
}

impl AsyncDocumentReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read and decode one document
    ///
    /// Without fail-fast a read or decode error is reported in the stats and no document is
    /// returned.
    pub async fn read_document<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<(Option<AnnotatedDocument>, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();
        debug!("Starting async read of document: {}", path.display());

        let decoded = match tokio::fs::read(path).await {
            Ok(bytes) => {
                let len = bytes.len() as u64;
                serde_json::from_slice::<AnnotatedDocument>(&bytes)
                    .map(|doc| (doc, len))
                    .map_err(|e| format!("Invalid annotated document {}: {}", path.display(), e))
            }
            Err(e) => Err(format!("Failed to read {}: {}", path.display(), e)),
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        match decoded {
            Ok((document, bytes_read)) => {
                info!(
                    "Read {}: {} bytes, {} tokens, {} procedure mentions in {}ms",
                    path.display(),
                    bytes_read,
                    document.tokens.len(),
                    document.procedures.len(),
                    duration_ms
                );
                let stats = ReadStats {
                    file_path: path.display().to_string(),
                    bytes_read,
                    duration_ms,
                    read_error: None,
                };
                Ok((Some(document), stats))
            }
            Err(error_msg) => {
                warn!("{}", error_msg);
                if self.config.fail_fast {
                    return Err(anyhow::anyhow!(error_msg));
                }
                let stats = ReadStats {
                    file_path: path.display().to_string(),
                    bytes_read: 0,
                    duration_ms,
                    read_error: Some(error_msg),
                };
                Ok((None, stats))
            }
        }
    }

    /// Read documents one after another, keeping input order
    pub async fn read_documents_batch<P: AsRef<Path>>(
        &self,
        file_paths: &[P],
    ) -> Result<Vec<(Option<AnnotatedDocument>, ReadStats)>> {
        info!("Starting batch read of {} documents", file_paths.len());
        let mut results = Vec::with_capacity(file_paths.len());
        for file_path in file_paths {
            results.push(self.read_document(file_path).await?);
        }
        info!("Completed batch read of {} documents", results.len());
        Ok(results)
    }
}

/// Read a single document with default configuration, failing on any error
pub async fn read_document_async<P: AsRef<Path>>(file_path: P) -> Result<AnnotatedDocument> {
    let reader = AsyncDocumentReader::new(ReaderConfig { fail_fast: true });
    let (document, _stats) = reader.read_document(file_path).await?;
    document.ok_or_else(|| anyhow::anyhow!("document could not be decoded"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    const DOC: &str = r#"{
        "metadata": {"creation_time": "2020-06-01", "document_path": "/notes/pt1/note.txt"},
        "tokens": [{"begin": 0, "end": 5, "text": "chemo"}],
        "procedures": [{"begin": 0, "end": 5, "text": "chemo", "codes": ["C0392920"]}]
    }"#;

    #[tokio::test]
    async fn test_read_valid_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("note.json");
        fs::write(&path, DOC).await.unwrap();

        let reader = AsyncDocumentReader::new(ReaderConfig::default());
        let (document, stats) = reader.read_document(&path).await.unwrap();

        let document = document.unwrap();
        assert_eq!(document.tokens.len(), 1);
        assert_eq!(document.procedures[0].codes, vec!["C0392920"]);
        assert!(stats.bytes_read > 0);
        assert!(stats.read_error.is_none());
    }

    #[tokio::test]
    async fn test_malformed_document_without_fail_fast() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").await.unwrap();

        let reader = AsyncDocumentReader::new(ReaderConfig::default());
        let (document, stats) = reader.read_document(&path).await.unwrap();
        assert!(document.is_none());
        assert!(stats.read_error.is_some());

        let strict = AsyncDocumentReader::new(ReaderConfig { fail_fast: true });
        assert!(strict.read_document(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_read_nonexistent_document() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncDocumentReader::new(ReaderConfig::default());
        let (document, stats) = reader.read_document(temp_dir.path().join("missing.json")).await.unwrap();
        assert!(document.is_none());
        assert!(stats.read_error.unwrap().contains("Failed to read"));
    }
}
