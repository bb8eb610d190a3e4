use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use timelines::aggregator::{ResultAggregator, TableSchema};
use timelines::classifier::RestClassifier;
use timelines::config::{PipelineConfig, DEFAULT_PROCEDURE_CODE};
use timelines::discovery;
use timelines::document::AnnotatedDocument;
use timelines::orchestrator::{Classifiers, Orchestrator};
use timelines::reader;
use timelines::stats::{BatchStats, DocumentStats, DocumentStatus};

#[derive(Parser, Debug)]
#[command(name = "timelines")]
#[command(about = "Patient chemotherapy timelines from annotated clinical notes")]
#[command(version)]
struct Args {
    /// Root directory to scan for annotated *.json documents (one subdirectory per patient)
    root_dir: PathBuf,

    /// TSV output file path
    #[arg(long, default_value = "timelines.tsv")]
    output: PathBuf,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,

    /// Ontology code a procedure mention must carry
    #[arg(long, default_value = DEFAULT_PROCEDURE_CODE)]
    procedure_code: String,

    /// Skip the modality classifier and keep every filtered mention
    #[arg(long)]
    no_modality: bool,

    /// Skip the DTR classifier and its output columns
    #[arg(long)]
    no_dtr: bool,

    /// File of newline-separated terms whose mentions are ignored
    #[arg(long)]
    exclude_terms: Option<PathBuf>,

    /// Maximum token distance between a mention and its TLink candidates
    #[arg(long, default_value_t = timelines::candidates::TLINK_WINDOW)]
    tlink_window: usize,

    /// Modality classifier endpoint
    #[arg(long, default_value = "http://localhost:8000/modality/process")]
    modality_url: String,

    /// DTR classifier endpoint
    #[arg(long, default_value = "http://localhost:8000/dtr/process")]
    dtr_url: String,

    /// TLink classifier endpoint
    #[arg(long, default_value = "http://localhost:8000/tlink/process")]
    tlink_url: String,

    /// Per-request classifier timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bars
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: structured JSON logging enables observability and debugging in production
    tracing_subscriber::fmt()
        .with_target(false)
        .json()
        .init();

    let args = Args::parse();
    let run_start = Instant::now();

    info!("Starting timelines");
    info!(?args, "Parsed CLI arguments");

    if !args.root_dir.exists() {
        anyhow::bail!("Root directory does not exist: {}", args.root_dir.display());
    }

    if !args.root_dir.is_dir() {
        anyhow::bail!("Root path is not a directory: {}", args.root_dir.display());
    }

    let mut config = PipelineConfig {
        procedure_code: args.procedure_code.clone(),
        use_modality: !args.no_modality,
        use_dtr: !args.no_dtr,
        tlink_window: args.tlink_window,
        ..Default::default()
    };
    if let Some(ref path) = args.exclude_terms {
        let terms = tokio::fs::read_to_string(path).await?;
        config = config.with_exclude_terms(&terms);
        info!("Loaded {} exclusion terms from {}", config.exclude_terms.len(), path.display());
    }

    // Discover documents
    let discovery_config = discovery::DiscoveryConfig {
        fail_fast: args.fail_fast,
    };
    let discovered = discovery::collect_discovered_files(&args.root_dir, discovery_config).await?;
    let mut document_stats = Vec::new();
    let mut valid_paths = Vec::new();
    for file in discovered {
        match file.error {
            Some(error) => document_stats.push(DocumentStats::from_read_error(file.path.display().to_string(), error, 0)),
            None => valid_paths.push(file.path),
        }
    }
    info!("Document discovery completed: {} valid documents", valid_paths.len());

    // Read documents
    let document_reader = reader::AsyncDocumentReader::new(reader::ReaderConfig {
        fail_fast: args.fail_fast,
    });
    let mut documents: Vec<(String, AnnotatedDocument)> = Vec::with_capacity(valid_paths.len());
    for (document, read_stats) in document_reader.read_documents_batch(&valid_paths).await? {
        match (document, read_stats.read_error) {
            (Some(document), _) => documents.push((read_stats.file_path, document)),
            (None, error) => document_stats.push(DocumentStats::from_read_error(
                read_stats.file_path,
                error.unwrap_or_default(),
                read_stats.duration_ms,
            )),
        }
    }

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(documents.len() as u64);
        bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} documents {msg}")?);
        bar
    };

    // WHY: classifier calls are blocking HTTP; run the whole batch on a blocking thread
    let fail_fast = args.fail_fast;
    let endpoints = (args.modality_url.clone(), args.dtr_url.clone(), args.tlink_url.clone());
    let timeout_secs = args.timeout_secs;
    let (aggregator, processed_stats) = tokio::task::spawn_blocking(move || -> Result<_> {
        let modality = RestClassifier::new(&endpoints.0, timeout_secs)?;
        let dtr = RestClassifier::new(&endpoints.1, timeout_secs)?;
        let tlink = RestClassifier::new(&endpoints.2, timeout_secs)?;

        let schema = TableSchema::for_dtr(config.use_dtr);
        let orchestrator = Orchestrator::new(
            config,
            Classifiers {
                modality: &modality,
                dtr: &dtr,
                tlink: &tlink,
            },
        );

        let mut aggregator = ResultAggregator::new(schema);
        let mut stats = Vec::with_capacity(documents.len());
        for (label, document) in &documents {
            let mut outcome = orchestrator.process_batch([(label.clone(), document)], &mut aggregator);
            progress.inc(1);
            if let Some(entry) = outcome.pop() {
                if fail_fast && entry.status == DocumentStatus::Failed {
                    progress.abandon_with_message("aborted");
                    anyhow::bail!(
                        "Processing failed for {}: {}",
                        entry.path,
                        entry.error.unwrap_or_default()
                    );
                }
                stats.push(entry);
            }
        }
        progress.finish_with_message("done");
        Ok((aggregator, stats))
    })
    .await??;
    document_stats.extend(processed_stats);

    aggregator.write_tsv(&args.output).await?;
    info!("Wrote {} rows to {}", aggregator.len(), args.output.display());

    let batch_stats = BatchStats::new(document_stats, run_start.elapsed().as_millis() as u64);
    if let Err(e) = batch_stats.save(&args.stats_out).await {
        warn!("Failed to write stats to {}: {}", args.stats_out.display(), e);
    }

    println!("timelines v{} - processing complete", env!("CARGO_PKG_VERSION"));
    println!("  Documents: {}", batch_stats.documents_total);
    println!("  Processed: {}, no mentions: {}", batch_stats.processed, batch_stats.no_mentions);
    println!("  Skipped: {}, failed: {}", batch_stats.skipped, batch_stats.failed);
    println!("  Rows written: {} -> {}", batch_stats.rows_emitted, args.output.display());

    Ok(())
}
