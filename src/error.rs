// WHY: Typed failure taxonomy for the per-document pipeline
// Per-document failures are reported through these variants; the batch driver decides skip vs abort

use thiserror::Error;

/// Which boundary map failed to resolve an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Begin,
    End,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Boundary::Begin => write!(f, "begin"),
            Boundary::End => write!(f, "end"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TimelineError {
    /// A mention boundary does not coincide with any token boundary
    #[error("offset {offset} is not a registered token {boundary} boundary")]
    OffsetResolution { offset: usize, boundary: Boundary },

    /// Creation time or document path is absent or malformed
    #[error("missing document metadata: {0}")]
    MissingMetadata(String),

    /// A mention needs a sentence window but no sentence covers it
    #[error("no sentence covers mention at {begin}..{end}")]
    NoCoveringSentence { begin: usize, end: usize },

    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}

impl TimelineError {
    /// Whether this failure aborts the document rather than skipping it quietly
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TimelineError::OffsetResolution { .. } | TimelineError::NoCoveringSentence { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier at {0} is unreachable")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response parsing error: {0}")]
    ResponseParsing(String),

    /// The classifier answered with a different number of results than instances sent
    #[error("expected {expected} results, classifier returned {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, TimelineError>;
