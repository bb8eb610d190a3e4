pub mod aggregator;
pub mod candidates;
pub mod classifier;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod instances;
pub mod metadata;
pub mod offsets;
pub mod orchestrator;
pub mod reader;
pub mod relations;
pub mod stats;

// Re-export the annotation model
pub use document::{
    AnnotatedDocument, AnnotationSource, DocumentMetadata, Mention,
    ProcedureMention, RawToken, Span, TimeExpression
};

// Re-export the pipeline entry points
pub use aggregator::{ResultAggregator, TableSchema};
pub use classifier::{Classification, Classifier, RestClassifier};
pub use config::PipelineConfig;
pub use error::{ClassifierError, TimelineError};
pub use orchestrator::{Classifiers, DocumentReport, Orchestrator, Stage};
pub use stats::{BatchStats, DocumentStats, DocumentStatus};
