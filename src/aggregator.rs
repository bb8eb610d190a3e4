// WHY: Batch-wide accumulation of output rows and deterministic annotation ids
// One flat table for the whole run; rows carry the patient id explicitly

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::document::Mention;

/// Rank-based ids for every mention that can appear in a row of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationIds {
    ids: HashMap<(bool, usize, usize), String>,
}

impl AnnotationIds {
    /// Rank the distinct mentions by begin offset (then end, events before time expressions)
    /// and derive `"{rank}@e@{document_name}@system"` for each
    ///
    /// Mentions repeating an already ranked span share its id; ranks have no gaps.
    pub fn assign<'m, 'a: 'm, I>(document_name: &str, mentions: I) -> Self
    where
        I: IntoIterator<Item = &'m Mention<'a>>,
    {
        let mut keys: Vec<(bool, usize, usize)> = mentions.into_iter().map(Self::key).collect();
        keys.sort_by_key(|&(is_timex, begin, end)| (begin, end, is_timex));
        keys.dedup();

        let ids = keys
            .into_iter()
            .enumerate()
            .map(|(rank, key)| (key, format!("{rank}@e@{document_name}@system")))
            .collect();
        Self { ids }
    }

    fn key(mention: &Mention<'_>) -> (bool, usize, usize) {
        (matches!(mention, Mention::Timex { .. }), mention.begin(), mention.end())
    }

    pub fn id_of(&self, mention: &Mention<'_>) -> Option<&str> {
        self.ids.get(&Self::key(mention)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One row per (focal mention, related mention) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub creation_time: String,
    pub patient_id: String,
    pub focal_text: String,
    pub focal_id: String,
    pub dtr: Option<String>,
    pub related_text: String,
    pub related_id: String,
    pub tlink: String,
    pub document_name: String,
    pub dtr_instance: Option<String>,
    pub tlink_instance: String,
}

/// Column layout of the output table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSchema {
    WithDtr,
    WithoutDtr,
}

const DTR_COLUMNS: &[&str] = &[
    "DCT",
    "patient_id",
    "chemo_text",
    "chemo_annotation_id",
    "dtr",
    "normed_timex",
    "timex_annotation_id",
    "tlink",
    "note_name",
    "dtr_inst",
    "tlink_inst",
];

const PLAIN_COLUMNS: &[&str] = &[
    "DCT",
    "patient_id",
    "chemo_text",
    "chemo_annotation_id",
    "normed_timex",
    "timex_annotation_id",
    "tlink",
    "note_name",
    "tlink_inst",
];

impl TableSchema {
    pub fn for_dtr(dtr_enabled: bool) -> Self {
        if dtr_enabled {
            TableSchema::WithDtr
        } else {
            TableSchema::WithoutDtr
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            TableSchema::WithDtr => DTR_COLUMNS,
            TableSchema::WithoutDtr => PLAIN_COLUMNS,
        }
    }

    /// Field values of `record` in column order
    pub fn row<'r>(&self, record: &'r OutputRecord) -> Vec<&'r str> {
        match self {
            TableSchema::WithDtr => vec![
                record.creation_time.as_str(),
                record.patient_id.as_str(),
                record.focal_text.as_str(),
                record.focal_id.as_str(),
                record.dtr.as_deref().unwrap_or_default(),
                record.related_text.as_str(),
                record.related_id.as_str(),
                record.tlink.as_str(),
                record.document_name.as_str(),
                record.dtr_instance.as_deref().unwrap_or_default(),
                record.tlink_instance.as_str(),
            ],
            TableSchema::WithoutDtr => vec![
                record.creation_time.as_str(),
                record.patient_id.as_str(),
                record.focal_text.as_str(),
                record.focal_id.as_str(),
                record.related_text.as_str(),
                record.related_id.as_str(),
                record.tlink.as_str(),
                record.document_name.as_str(),
                record.tlink_instance.as_str(),
            ],
        }
    }
}

/// Ordered rows accumulated across the whole batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultAggregator {
    schema: TableSchema,
    records: Vec<OutputRecord>,
}

impl ResultAggregator {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    pub fn schema(&self) -> TableSchema {
        self.schema
    }

    pub fn push(&mut self, record: OutputRecord) {
        self.records.push(record);
    }

    /// Append another aggregator's rows after this one's
    pub fn merge(&mut self, other: ResultAggregator) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the table as tab-separated text with a header line
    ///
    /// Fields holding a tab, quote or line break are quoted, so instance text round-trips.
    pub fn to_tsv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());
        writer.write_record(self.schema.columns())?;
        for record in &self.records {
            writer.write_record(self.schema.row(record))?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Write the table to `path`
    pub async fn write_tsv(&self, path: &Path) -> Result<()> {
        let file = tokio::fs::File::create(path).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.to_tsv()?.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}
