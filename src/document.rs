// WHY: Input side of the pipeline - annotation records as supplied by the document store
// plus the borrowed Mention view the rest of the crate works with

use serde::{Deserialize, Serialize};

/// Character span of an annotation, half-open like the tokens it aligns to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// True when `begin..end` lies entirely inside this span
    pub fn covers(&self, begin: usize, end: usize) -> bool {
        self.begin <= begin && end <= self.end
    }
}

/// Token as produced by the external tokenizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
    pub begin: usize,
    pub end: usize,
    pub text: String,
}

/// Procedure mention with the ontology codes attached by dictionary lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureMention {
    pub begin: usize,
    pub end: usize,
    pub text: String,
    #[serde(default)]
    pub codes: Vec<String>,
}

/// Time expression, optionally carrying a resolved calendar value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeExpression {
    pub begin: usize,
    pub end: usize,
    pub text: String,
    #[serde(default)]
    pub normalized: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub document_path: Option<String>,
}

/// Read-only capability the orchestrator consumes for one document
pub trait AnnotationSource {
    fn raw_tokens(&self) -> &[RawToken];
    fn newline_spans(&self) -> &[Span];
    fn sentences(&self) -> &[Span];
    fn procedure_mentions(&self) -> &[ProcedureMention];
    fn time_expressions(&self) -> &[TimeExpression];
    fn creation_time(&self) -> Option<&str>;
    fn document_path(&self) -> Option<&str>;

    /// Raw note text, used only to recover a creation time from the header
    fn document_text(&self) -> Option<&str> {
        None
    }
}

/// Annotated document as stored on disk (one JSON object per note)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub tokens: Vec<RawToken>,
    #[serde(default)]
    pub newlines: Vec<Span>,
    #[serde(default)]
    pub sentences: Vec<Span>,
    #[serde(default)]
    pub procedures: Vec<ProcedureMention>,
    #[serde(default)]
    pub timexes: Vec<TimeExpression>,
}

impl AnnotationSource for AnnotatedDocument {
    fn raw_tokens(&self) -> &[RawToken] {
        &self.tokens
    }

    fn newline_spans(&self) -> &[Span] {
        &self.newlines
    }

    fn sentences(&self) -> &[Span] {
        &self.sentences
    }

    fn procedure_mentions(&self) -> &[ProcedureMention] {
        &self.procedures
    }

    fn time_expressions(&self) -> &[TimeExpression] {
        &self.timexes
    }

    fn creation_time(&self) -> Option<&str> {
        self.metadata.creation_time.as_deref()
    }

    fn document_path(&self) -> Option<&str> {
        self.metadata.document_path.as_deref()
    }

    fn document_text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Borrowed view of an event or time-expression annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mention<'a> {
    Event {
        begin: usize,
        end: usize,
        text: &'a str,
    },
    Timex {
        begin: usize,
        end: usize,
        text: &'a str,
        normalized: Option<&'a str>,
    },
}

impl<'a> Mention<'a> {
    pub fn begin(&self) -> usize {
        match *self {
            Mention::Event { begin, .. } | Mention::Timex { begin, .. } => begin,
        }
    }

    pub fn end(&self) -> usize {
        match *self {
            Mention::Event { end, .. } | Mention::Timex { end, .. } => end,
        }
    }

    pub fn text(&self) -> &'a str {
        match *self {
            Mention::Event { text, .. } | Mention::Timex { text, .. } => text,
        }
    }

    pub fn normalized(&self) -> Option<&'a str> {
        match *self {
            Mention::Event { .. } => None,
            Mention::Timex { normalized, .. } => normalized,
        }
    }

    /// Text written to the related-mention column: the calendar value for times,
    /// the covered text for events
    pub fn related_text(&self) -> &'a str {
        self.normalized().unwrap_or_else(|| self.text())
    }

    /// Unnormalized time expressions never take part in temporal links
    pub fn is_link_candidate(&self) -> bool {
        match self {
            Mention::Event { .. } => true,
            Mention::Timex { normalized, .. } => normalized.is_some(),
        }
    }
}

impl ProcedureMention {
    pub fn as_mention(&self) -> Mention<'_> {
        Mention::Event {
            begin: self.begin,
            end: self.end,
            text: &self.text,
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }
}

impl TimeExpression {
    pub fn as_mention(&self) -> Mention<'_> {
        Mention::Timex {
            begin: self.begin,
            end: self.end,
            text: &self.text,
            normalized: self.normalized.as_deref(),
        }
    }
}
