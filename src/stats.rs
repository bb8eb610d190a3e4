// WHY: Run statistics for the batch, one entry per document, saved as JSON next to the table

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::error::TimelineError;
use crate::orchestrator::{DocumentReport, Stage};

/// Outcome of one document
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Went through every stage
    Processed,
    /// Stopped before TLink work because no mention qualified
    NoMentions,
    /// Metadata missing or unusable
    Skipped,
    /// Aborted on an unaligned annotation or a classifier failure
    Failed,
}

/// Per-document processing statistics
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DocumentStats {
    /// Document path or label as given to the batch
    pub path: String,
    pub status: DocumentStatus,
    /// Last stage reached, when the document was not rejected up front
    pub stage: Option<String>,
    pub mentions_kept: usize,
    pub rows_emitted: usize,
    pub dropped_pairs: usize,
    pub duplicate_tokens: usize,
    pub processing_time_ms: u64,
    pub error: Option<String>,
}

impl DocumentStats {
    pub fn from_report(path: String, report: &DocumentReport, processing_time_ms: u64) -> Self {
        let status = match report.stage {
            Stage::Filtered | Stage::ModalityCheck => DocumentStatus::NoMentions,
            _ => DocumentStatus::Processed,
        };
        Self {
            path,
            status,
            stage: Some(report.stage.to_string()),
            mentions_kept: report.mentions_kept,
            rows_emitted: report.rows,
            dropped_pairs: report.dropped_pairs,
            duplicate_tokens: report.duplicate_tokens,
            processing_time_ms,
            error: None,
        }
    }

    pub fn from_error(path: String, status: DocumentStatus, error: &TimelineError, processing_time_ms: u64) -> Self {
        Self {
            path,
            status,
            stage: None,
            mentions_kept: 0,
            rows_emitted: 0,
            dropped_pairs: 0,
            duplicate_tokens: 0,
            processing_time_ms,
            error: Some(error.to_string()),
        }
    }

    /// A document that could not be read or decoded never reaches the orchestrator
    pub fn from_read_error(path: String, error: String, processing_time_ms: u64) -> Self {
        Self {
            path,
            status: DocumentStatus::Failed,
            stage: None,
            mentions_kept: 0,
            rows_emitted: 0,
            dropped_pairs: 0,
            duplicate_tokens: 0,
            processing_time_ms,
            error: Some(error),
        }
    }
}

/// Whole-run statistics
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BatchStats {
    pub documents_total: usize,
    pub processed: usize,
    pub no_mentions: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows_emitted: usize,
    pub elapsed_ms: u64,
    pub documents: Vec<DocumentStats>,
}

impl BatchStats {
    pub fn new(documents: Vec<DocumentStats>, elapsed_ms: u64) -> Self {
        let count = |status: DocumentStatus| documents.iter().filter(|d| d.status == status).count();
        Self {
            documents_total: documents.len(),
            processed: count(DocumentStatus::Processed),
            no_mentions: count(DocumentStatus::NoMentions),
            skipped: count(DocumentStatus::Skipped),
            failed: count(DocumentStatus::Failed),
            rows_emitted: documents.iter().map(|d| d.rows_emitted).sum(),
            elapsed_ms,
            documents,
        }
    }

    /// Save as pretty JSON, creating parent directories as needed
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content).await?;
        Ok(())
    }
}
