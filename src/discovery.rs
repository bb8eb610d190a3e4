use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension of annotated document files
pub const DOCUMENT_EXTENSION: &str = "json";

/// Configuration for file discovery behavior
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
}

/// Result of file discovery validation
#[derive(Debug, Clone)]
pub struct FileValidation {
    pub path: PathBuf,
    pub error: Option<String>,
}

impl FileValidation {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

fn is_document_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION)
}

/// Walk `root_dir` recursively and validate every annotated document found
///
/// Results are sorted by path so a batch always visits documents in the same order.
pub async fn collect_discovered_files(
    root_dir: impl AsRef<Path>,
    config: DiscoveryConfig,
) -> Result<Vec<FileValidation>> {
    let root = root_dir.as_ref().to_path_buf();
    info!("Starting document discovery in: {}", root.display());

    // WHY: walkdir is blocking; keep it off the async worker threads
    let walked = tokio::task::spawn_blocking(move || walk(&root, config.fail_fast)).await??;

    let mut validations = Vec::with_capacity(walked.len());
    for (path, walk_error) in walked {
        let validation = match walk_error {
            Some(error) => FileValidation { path, error: Some(error) },
            None => validate_file(path).await,
        };
        if let Some(ref error) = validation.error {
            if config.fail_fast {
                anyhow::bail!("Validation failed for {}: {}", validation.path.display(), error);
            }
            warn!("Validation failed for {}: {}", validation.path.display(), error);
        }
        validations.push(validation);
    }

    info!("Discovery completed: {} documents found", validations.len());
    Ok(validations)
}

fn walk(root: &Path, fail_fast: bool) -> Result<Vec<(PathBuf, Option<String>)>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_document_file(entry.path()) {
                    debug!("Found document: {}", entry.path().display());
                    found.push((entry.into_path(), None));
                }
            }
            Err(e) => {
                if fail_fast {
                    return Err(e.into());
                }
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                found.push((path, Some(format!("Directory traversal error: {e}"))));
            }
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

async fn validate_file(path: PathBuf) -> FileValidation {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.len() == 0 => FileValidation {
            path,
            error: Some("Empty document file".to_string()),
        },
        Ok(_) => FileValidation { path, error: None },
        Err(e) => FileValidation {
            error: Some(format!("Cannot access file: {e}")),
            path,
        },
    }
}

/// Paths of all valid annotated documents under `root_dir`
pub async fn find_document_files<P: AsRef<Path>>(root_dir: P) -> Result<Vec<PathBuf>> {
    let validations = collect_discovered_files(root_dir, DiscoveryConfig::default()).await?;
    Ok(validations
        .into_iter()
        .filter(FileValidation::is_valid)
        .map(|v| v.path)
        .collect())
}
