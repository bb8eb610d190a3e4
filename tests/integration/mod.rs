// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use timelines::classifier::{Classification, Classifier};
use timelines::document::{AnnotatedDocument, DocumentMetadata, ProcedureMention, RawToken, Span, TimeExpression};
use timelines::error::ClassifierError;

pub const CHEMO_CODE: &str = "C0392920";

/// Test fixture helper for creating temporary patient directories with annotated notes
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self { temp_dir, root_path }
    }

    /// Path a note would have inside this fixture
    pub fn note_path(&self, patient: &str, note_name: &str) -> PathBuf {
        self.root_path.join(patient).join(format!("{note_name}.json"))
    }

    /// Write an annotated document as `<patient>/<note_name>.json`
    pub fn create_document(&self, patient: &str, note_name: &str, document: &AnnotatedDocument) -> PathBuf {
        let content = serde_json::to_string_pretty(document).expect("Failed to encode document");
        self.create_raw_file(patient, &format!("{note_name}.json"), &content)
    }

    /// Write an arbitrary file under a patient directory
    pub fn create_raw_file(&self, patient: &str, file_name: &str, content: &str) -> PathBuf {
        let file_path = self.root_path.join(patient).join(file_name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }
}

/// Builds an annotated note from words separated by single spaces
pub struct NoteBuilder {
    words: Vec<String>,
    procedures: Vec<(usize, usize)>,
    timexes: Vec<(usize, usize, Option<String>)>,
    creation_time: Option<String>,
    document_path: Option<String>,
    text: Option<String>,
}

impl NoteBuilder {
    pub fn new(words: &[&str]) -> Self {
        Self {
            words: words.iter().map(|w| w.to_string()).collect(),
            procedures: Vec::new(),
            timexes: Vec::new(),
            creation_time: Some("2020-06-01".to_string()),
            document_path: Some("/notes/pt1/note_a.txt".to_string()),
            text: None,
        }
    }

    /// Procedure mentions as inclusive word ranges
    pub fn procedures(mut self, ranges: &[(usize, usize)]) -> Self {
        self.procedures = ranges.to_vec();
        self
    }

    /// Time expressions as inclusive word ranges with an optional normalized value
    pub fn timexes(mut self, ranges: &[(usize, usize, Option<&str>)]) -> Self {
        self.timexes = ranges
            .iter()
            .map(|&(first, last, normalized)| (first, last, normalized.map(str::to_string)))
            .collect();
        self
    }

    pub fn creation_time(mut self, creation_time: Option<&str>) -> Self {
        self.creation_time = creation_time.map(str::to_string);
        self
    }

    pub fn document_path(mut self, document_path: Option<&str>) -> Self {
        self.document_path = document_path.map(str::to_string);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn build(self) -> AnnotatedDocument {
        let mut tokens = Vec::with_capacity(self.words.len());
        let mut offset = 0;
        for word in &self.words {
            tokens.push(RawToken {
                begin: offset,
                end: offset + word.len(),
                text: word.clone(),
            });
            offset += word.len() + 1;
        }
        let text_of = |first: usize, last: usize| self.words[first..=last].join(" ");

        let procedures = self
            .procedures
            .iter()
            .map(|&(first, last)| ProcedureMention {
                begin: tokens[first].begin,
                end: tokens[last].end,
                text: text_of(first, last),
                codes: vec![CHEMO_CODE.to_string()],
            })
            .collect();
        let timexes = self
            .timexes
            .iter()
            .map(|(first, last, normalized)| TimeExpression {
                begin: tokens[*first].begin,
                end: tokens[*last].end,
                text: text_of(*first, *last),
                normalized: normalized.clone(),
            })
            .collect();

        AnnotatedDocument {
            text: self.text,
            metadata: DocumentMetadata {
                creation_time: self.creation_time,
                document_path: self.document_path,
            },
            sentences: vec![Span::new(0, offset.saturating_sub(1))],
            tokens,
            newlines: Vec::new(),
            procedures,
            timexes,
        }
    }
}

/// Answers every instance with the same label
pub struct FixedClassifier(pub &'static str);

impl Classifier for FixedClassifier {
    fn classify(&self, instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        Ok(instances.iter().map(|_| Classification::new(self.0)).collect())
    }
}

/// Labels an instance ACTUAL only when it contains the given marker
pub struct ActualWhen(pub &'static str);

impl Classifier for ActualWhen {
    fn classify(&self, instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        Ok(instances
            .iter()
            .map(|i| Classification::new(if i.contains(self.0) { "ACTUAL" } else { "HYPOTHETICAL" }))
            .collect())
    }
}

/// Always fails as an unreachable service would
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        Err(ClassifierError::Connection("http://localhost:1".to_string()))
    }
}

/// Records every instance it sees and answers with a fixed label
pub struct RecordingClassifier {
    label: &'static str,
    pub seen: RefCell<Vec<String>>,
}

impl RecordingClassifier {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl Classifier for RecordingClassifier {
    fn classify(&self, instances: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        self.seen.borrow_mut().extend(instances.iter().cloned());
        Ok(instances.iter().map(|_| Classification::new(self.label)).collect())
    }
}

/// Line-by-line comparison with a readable failure message
pub fn assert_lines(actual: &str, expected: &[&str], context: &str) {
    let lines: Vec<&str> = actual.lines().collect();
    assert_eq!(
        lines.len(),
        expected.len(),
        "{context}: line count mismatch\nActual:\n{actual}"
    );
    for (i, (got, want)) in lines.iter().zip(expected).enumerate() {
        assert_eq!(got, want, "{context}: line {} differs", i + 1);
    }
}

/// Relative path helper for readable assertions
pub fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|s| s.to_str()).unwrap_or_default()
}
