// WHY: Per-document state machine driving the three classifiers
// Filtered -> (ModalityCheck) -> (DtrCheck) -> TLinkExpand -> Emit
// Rows reach the aggregator only once a document has passed every stage

use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::aggregator::{AnnotationIds, OutputRecord, ResultAggregator};
use crate::candidates::{candidate_pool, window_candidates};
use crate::classifier::{classify_all, Classifier};
use crate::config::PipelineConfig;
use crate::document::{AnnotationSource, Mention, Span};
use crate::error::{Result, TimelineError};
use crate::instances::{dtr_instance, modality_instance, tlink_instance};
use crate::metadata::{resolve_document_info, DocumentInfo};
use crate::offsets::{AlignedTokens, NEWLINE_PLACEHOLDER};
use crate::relations::{canonicalize, ACTUAL_MODALITY};
use crate::stats::{DocumentStats, DocumentStatus};

/// Stage a document reached before it finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filtered,
    ModalityCheck,
    DtrCheck,
    TLinkExpand,
    Emit,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Filtered => "filtered",
            Stage::ModalityCheck => "modality_check",
            Stage::DtrCheck => "dtr_check",
            Stage::TLinkExpand => "tlink_expand",
            Stage::Emit => "emit",
        };
        f.write_str(name)
    }
}

/// The three external classifiers
#[derive(Clone, Copy)]
pub struct Classifiers<'c> {
    pub modality: &'c dyn Classifier,
    pub dtr: &'c dyn Classifier,
    pub tlink: &'c dyn Classifier,
}

/// A classified (focal, related) pair with the window it was classified from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePair<'a> {
    pub focal: Mention<'a>,
    pub other: Mention<'a>,
    pub label: String,
    pub instance: String,
}

/// What happened to one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub document_name: String,
    /// Last stage the document entered
    pub stage: Stage,
    pub mentions_kept: usize,
    pub rows: usize,
    /// Pairs whose TLink call failed and were left out
    pub dropped_pairs: usize,
    pub duplicate_tokens: usize,
}

impl DocumentReport {
    fn new(info: &DocumentInfo) -> Self {
        Self {
            document_name: info.document_name.clone(),
            stage: Stage::Filtered,
            mentions_kept: 0,
            rows: 0,
            dropped_pairs: 0,
            duplicate_tokens: 0,
        }
    }
}

/// Focal mention with its DTR result, carried from DtrCheck into Emit
struct Focal<'a> {
    mention: Mention<'a>,
    dtr: Option<String>,
    dtr_instance: Option<String>,
}

pub struct Orchestrator<'c> {
    config: PipelineConfig,
    classifiers: Classifiers<'c>,
}

impl<'c> Orchestrator<'c> {
    pub fn new(config: PipelineConfig, classifiers: Classifiers<'c>) -> Self {
        Self { config, classifiers }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one document through every stage and append its rows to `aggregator`
    ///
    /// On error nothing from this document is appended.
    pub fn process_document<S>(&self, source: &S, aggregator: &mut ResultAggregator) -> Result<DocumentReport>
    where
        S: AnnotationSource + ?Sized,
    {
        let info = resolve_document_info(source)?;
        let mut report = DocumentReport::new(&info);

        // Filtered
        let mut mentions = self.filter_mentions(source);
        if mentions.is_empty() {
            info!(document = %info.document_name, code = %self.config.procedure_code, "No qualifying procedure mentions");
            return Ok(report);
        }

        // ModalityCheck
        if self.config.use_modality {
            report.stage = Stage::ModalityCheck;
            mentions = self.keep_actual(source, mentions)?;
            if mentions.is_empty() {
                info!(document = %info.document_name, "No procedure mentions survived modality filtering");
                return Ok(report);
            }
        }
        report.mentions_kept = mentions.len();

        let document = AlignedTokens::build(source.raw_tokens(), source.newline_spans(), NEWLINE_PLACEHOLDER);
        report.duplicate_tokens = document.tokens.duplicates().len();

        // DtrCheck
        let focal = if self.config.use_dtr {
            report.stage = Stage::DtrCheck;
            self.classify_dtr(&document, mentions)?
        } else {
            mentions
                .into_iter()
                .map(|mention| Focal {
                    mention,
                    dtr: None,
                    dtr_instance: None,
                })
                .collect()
        };

        // TLinkExpand
        report.stage = Stage::TLinkExpand;
        let focal_mentions: Vec<Mention> = focal.iter().map(|f| f.mention).collect();
        let time_mentions: Vec<Mention> = source
            .time_expressions()
            .iter()
            .map(|t| t.as_mention())
            .filter(|m| m.is_link_candidate())
            .collect();
        if time_mentions.is_empty() {
            warn!(document = %info.document_name, "No normalized time expressions in document");
        }

        let ids = AnnotationIds::assign(&info.document_name, focal_mentions.iter().chain(time_mentions.iter()));

        let mut pairs: Vec<(usize, CandidatePair)> = Vec::new();
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for (index, focal_mention) in focal_mentions.iter().enumerate() {
            let pool = candidate_pool(&focal_mentions, index, &time_mentions);
            for other in window_candidates(&document, focal_mention, pool, self.config.tlink_window)? {
                if !seen.insert((focal_mention.begin(), other.begin())) {
                    debug!(focal = focal_mention.begin(), other = other.begin(), "Pair already classified");
                    continue;
                }
                let instance = tlink_instance(&document, focal_mention, other, self.config.tlink_pad)?;
                match self.classifiers.tlink.classify_one(&instance) {
                    Ok(result) => {
                        let label = canonicalize(&result.label, focal_mention.begin(), other.begin());
                        pairs.push((
                            index,
                            CandidatePair {
                                focal: *focal_mention,
                                other: *other,
                                label,
                                instance,
                            },
                        ));
                    }
                    Err(e) => {
                        warn!(document = %info.document_name, error = %e, "TLink classification failed, dropping pair");
                        report.dropped_pairs += 1;
                    }
                }
            }
        }

        // Emit
        report.stage = Stage::Emit;
        for (index, pair) in pairs {
            aggregator.push(self.record(&info, &ids, &focal[index], pair));
            report.rows += 1;
        }

        info!(
            document = %info.document_name,
            mentions = report.mentions_kept,
            rows = report.rows,
            "Document processed"
        );
        Ok(report)
    }

    /// Process documents in order, skipping those that fail, and collect per-document stats
    pub fn process_batch<'d, S, I>(&self, documents: I, aggregator: &mut ResultAggregator) -> Vec<DocumentStats>
    where
        S: AnnotationSource + ?Sized + 'd,
        I: IntoIterator<Item = (String, &'d S)>,
    {
        let mut stats = Vec::new();
        for (label, source) in documents {
            let start = Instant::now();
            let outcome = self.process_document(source, aggregator);
            let elapsed_ms = start.elapsed().as_millis() as u64;

            let entry = match outcome {
                Ok(report) => DocumentStats::from_report(label, &report, elapsed_ms),
                Err(e) => {
                    let status = match &e {
                        TimelineError::MissingMetadata(_) => DocumentStatus::Skipped,
                        _ => DocumentStatus::Failed,
                    };
                    if e.is_fatal() {
                        warn!(document = %label, error = %e, "Aborting document on unaligned annotation");
                    } else {
                        warn!(document = %label, error = %e, "Skipping document");
                    }
                    DocumentStats::from_error(label, status, &e, elapsed_ms)
                }
            };
            stats.push(entry);
        }
        stats
    }

    /// Procedure mentions carrying the configured code and not on the exclusion list,
    /// one per distinct span
    fn filter_mentions<'a, S>(&self, source: &'a S) -> Vec<Mention<'a>>
    where
        S: AnnotationSource + ?Sized,
    {
        let mut spans: HashSet<(usize, usize)> = HashSet::new();
        source
            .procedure_mentions()
            .iter()
            .filter(|p| p.has_code(&self.config.procedure_code))
            .filter(|p| {
                let excluded = self.config.is_excluded(&p.text);
                if excluded {
                    debug!(text = %p.text, "Dropping excluded procedure mention");
                }
                !excluded
            })
            .map(|p| p.as_mention())
            .filter(|m| {
                let first = spans.insert((m.begin(), m.end()));
                if !first {
                    debug!(begin = m.begin(), end = m.end(), "Dropping procedure mention with repeated span");
                }
                first
            })
            .collect()
    }

    /// Keep the mentions the modality classifier labels as actual occurrences
    fn keep_actual<'a, S>(&self, source: &S, mentions: Vec<Mention<'a>>) -> Result<Vec<Mention<'a>>>
    where
        S: AnnotationSource + ?Sized,
    {
        let sentences = source.sentences();
        let mut windows: HashMap<usize, AlignedTokens> = HashMap::new();
        let mut instances = Vec::with_capacity(mentions.len());

        for mention in &mentions {
            let sentence_index = sentences
                .iter()
                .position(|s| s.covers(mention.begin(), mention.end()))
                .ok_or(TimelineError::NoCoveringSentence {
                    begin: mention.begin(),
                    end: mention.end(),
                })?;
            let sentence = windows
                .entry(sentence_index)
                .or_insert_with(|| sentence_tokens(source, sentences[sentence_index]));
            instances.push(modality_instance(sentence, mention)?);
        }

        let results = classify_all(self.classifiers.modality, &instances)?;
        Ok(mentions
            .into_iter()
            .zip(results)
            .filter(|(_, result)| result.label == ACTUAL_MODALITY)
            .map(|(mention, _)| mention)
            .collect())
    }

    fn classify_dtr<'a>(&self, document: &AlignedTokens, mentions: Vec<Mention<'a>>) -> Result<Vec<Focal<'a>>> {
        let instances = mentions
            .iter()
            .map(|m| dtr_instance(document, m, self.config.dtr_radius))
            .collect::<Result<Vec<String>>>()?;
        let results = classify_all(self.classifiers.dtr, &instances)?;

        Ok(mentions
            .into_iter()
            .zip(instances)
            .zip(results)
            .map(|((mention, instance), result)| Focal {
                mention,
                dtr: Some(result.label),
                dtr_instance: Some(instance),
            })
            .collect())
    }

    fn record(&self, info: &DocumentInfo, ids: &AnnotationIds, focal: &Focal<'_>, pair: CandidatePair<'_>) -> OutputRecord {
        let id = |m: &Mention<'_>| ids.id_of(m).unwrap_or_default().to_string();
        OutputRecord {
            creation_time: info.creation_time.clone(),
            patient_id: info.patient_id.clone(),
            focal_text: pair.focal.text().to_string(),
            focal_id: id(&pair.focal),
            dtr: focal.dtr.clone(),
            related_text: pair.other.related_text().to_string(),
            related_id: id(&pair.other),
            tlink: pair.label,
            document_name: info.document_name.clone(),
            dtr_instance: focal.dtr_instance.clone(),
            tlink_instance: pair.instance,
        }
    }
}

/// Sentence-local token sequence used for modality windows
fn sentence_tokens<S: AnnotationSource + ?Sized>(source: &S, sentence: Span) -> AlignedTokens {
    let covered = source
        .raw_tokens()
        .iter()
        .filter(|t| sentence.covers(t.begin, t.end));
    AlignedTokens::build(covered, source.newline_spans(), NEWLINE_PLACEHOLDER)
}
