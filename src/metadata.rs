// WHY: Per-document identity for output rows - creation time, patient and note name
// Missing or unusable metadata skips the document; it never aborts the batch

use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, warn};

use crate::document::AnnotationSource;
use crate::error::{Result, TimelineError};

const HEADER_DATE_PREFIX: &str = "Principal Date";

/// Identity of a note as written to every output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Document creation time as `YYYY-MM-DD`
    pub creation_time: String,
    /// Name of the directory holding the note
    pub patient_id: String,
    /// File stem of the note
    pub document_name: String,
}

/// Parse a creation time given as `YYYY-MM-DD` or `YYYYMMDD`
pub fn parse_creation_time(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            if raw.len() != 8 || !raw.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let year = raw[0..4].parse().ok()?;
            let month = raw[4..6].parse().ok()?;
            let day = raw[6..8].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
}

/// Creation time from a `<prefix>_<id>_<MM-DD-YYYY>...` file stem
pub fn creation_time_from_file_name(stem: &str) -> Option<NaiveDate> {
    let component = stem.split('_').nth(2)?;
    let parts: Vec<&str> = component.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let month = parts[0].parse().ok()?;
    let day = parts[1].parse().ok()?;
    let year = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Creation time from a `Principal Date` header line carrying `YYYYMMDD`
pub fn creation_time_from_header(text: &str) -> Option<NaiveDate> {
    let line = text.lines().find(|l| l.starts_with(HEADER_DATE_PREFIX))?;
    let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
    parse_creation_time(&digits)
}

/// Resolve creation time, patient id and note name for one document
pub fn resolve_document_info<S: AnnotationSource + ?Sized>(source: &S) -> Result<DocumentInfo> {
    let path = source
        .document_path()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| TimelineError::MissingMetadata("document path".to_string()))?;
    let path = Path::new(path);

    let document_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TimelineError::MissingMetadata(format!("note name in {}", path.display())))?
        .to_string();

    let patient_id = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            TimelineError::MissingMetadata(format!("patient directory in {}", path.display()))
        })?
        .to_string();

    let explicit = source.creation_time().filter(|t| !t.trim().is_empty());
    let from_metadata = explicit.and_then(|raw| {
        let parsed = parse_creation_time(raw);
        if parsed.is_none() {
            warn!(document = %document_name, raw, "Malformed creation time, trying other sources");
        }
        parsed
    });

    let creation_time = from_metadata
        .or_else(|| {
            let derived = creation_time_from_file_name(&document_name);
            if derived.is_some() {
                debug!(document = %document_name, "Creation time taken from file name");
            }
            derived
        })
        .or_else(|| {
            let derived = source.document_text().and_then(creation_time_from_header);
            if derived.is_some() {
                debug!(document = %document_name, "Creation time taken from note header");
            }
            derived
        })
        .ok_or_else(|| TimelineError::MissingMetadata(format!("creation time for {document_name}")))?;

    Ok(DocumentInfo {
        creation_time: creation_time.format("%Y-%m-%d").to_string(),
        patient_id,
        document_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AnnotatedDocument, DocumentMetadata};

    fn doc(path: Option<&str>, creation_time: Option<&str>, text: Option<&str>) -> AnnotatedDocument {
        AnnotatedDocument {
            text: text.map(str::to_string),
            metadata: DocumentMetadata {
                creation_time: creation_time.map(str::to_string),
                document_path: path.map(str::to_string),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_creation_time_forms() {
        assert_eq!(parse_creation_time("2020-05-17"), NaiveDate::from_ymd_opt(2020, 5, 17));
        assert_eq!(parse_creation_time("20200517"), NaiveDate::from_ymd_opt(2020, 5, 17));
        assert_eq!(parse_creation_time("2020-13-01"), None);
        assert_eq!(parse_creation_time("May 2020"), None);
    }

    #[test]
    fn test_patient_and_note_from_path() {
        let info = resolve_document_info(&doc(Some("/notes/patient01/note_a.txt"), Some("2021-01-02"), None)).unwrap();
        assert_eq!(info.patient_id, "patient01");
        assert_eq!(info.document_name, "note_a");
        assert_eq!(info.creation_time, "2021-01-02");
    }

    #[test]
    fn test_creation_time_from_file_name() {
        let info = resolve_document_info(&doc(Some("/notes/pt7/ID107_clinic_03-14-2019.txt"), None, None)).unwrap();
        assert_eq!(info.creation_time, "2019-03-14");
    }

    #[test]
    fn test_creation_time_from_header() {
        let text = "Clinic note\nPrincipal Date: 2018/07/04\nPatient seen today.";
        let info = resolve_document_info(&doc(Some("/notes/pt7/visit.txt"), None, Some(text))).unwrap();
        assert_eq!(info.creation_time, "2018-07-04");
    }

    #[test]
    fn test_missing_metadata() {
        let missing_path = resolve_document_info(&doc(None, Some("2020-01-01"), None));
        assert!(matches!(missing_path, Err(TimelineError::MissingMetadata(_))));

        let missing_time = resolve_document_info(&doc(Some("/notes/pt1/visit.txt"), Some("garbage"), None));
        assert!(matches!(missing_time, Err(TimelineError::MissingMetadata(_))));
        assert!(!missing_time.unwrap_err().is_fatal());
    }
}
