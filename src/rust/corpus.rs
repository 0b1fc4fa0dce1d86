//! Corpus types and the CSV boundary with the scraping scripts.
//!
//! Training tables must carry a text column and a `{0,1}` label column.
//! Inference tables only need the text column; every other column is passed
//! through to the labeled output untouched.

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::classifier::normalize::{is_mention, normalize};
use crate::classifier::ClassifierError;
use crate::inference::PredictionResult;

/// Name of the column appended to inference output.
pub const PREDICTED_LABEL_COLUMN: &str = "predicted_label";
/// Name of the optional mention flag column.
pub const IS_MENTION_COLUMN: &str = "is_mention";

/// Binary class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// Not hate speech (`0`)
    Negative,
    /// Hate speech (`1`)
    Positive,
}

impl Label {
    /// Numeric value as written in CSV tables
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    /// Parses a label cell. Only `0` and `1` (surrounding whitespace ignored) are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" => Some(Label::Negative),
            "1" => Some(Label::Positive),
            _ => None,
        }
    }

    /// Thresholds a decision score: positive scores are label 1.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Label::Positive
        } else {
            Label::Negative
        }
    }

    /// Target value used by the SGD losses (`-1` or `+1`)
    pub(crate) fn sign(self) -> f64 {
        match self {
            Label::Negative => -1.0,
            Label::Positive => 1.0,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One labeled training row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledExample {
    pub text: String,
    pub label: Label,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Ordered, immutable collection of labeled examples.
///
/// Every stage takes a corpus by reference and returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    examples: Vec<LabeledExample>,
}

impl Corpus {
    pub fn new(examples: Vec<LabeledExample>) -> Self {
        Self { examples }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledExample> {
        self.examples.iter()
    }

    pub fn into_examples(self) -> Vec<LabeledExample> {
        self.examples
    }

    /// Number of examples carrying `label`
    pub fn count(&self, label: Label) -> usize {
        self.examples.iter().filter(|e| e.label == label).count()
    }

    /// Number of distinct labels present (0, 1 or 2)
    pub fn distinct_labels(&self) -> usize {
        [Label::Negative, Label::Positive]
            .iter()
            .filter(|&&label| self.count(label) > 0)
            .count()
    }

    /// Returns a copy with every text passed through [`normalize`].
    pub fn normalized(&self) -> Corpus {
        let examples = self
            .examples
            .par_iter()
            .map(|e| LabeledExample::new(normalize(&e.text), e.label))
            .collect();
        Corpus { examples }
    }
}

impl FromIterator<LabeledExample> for Corpus {
    fn from_iter<I: IntoIterator<Item = LabeledExample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a LabeledExample;
    type IntoIter = std::slice::Iter<'a, LabeledExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}

/// Column names of the tabular inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSchema {
    pub text_column: String,
    pub label_column: String,
}

impl Default for CorpusSchema {
    fn default() -> Self {
        Self {
            text_column: "text".to_string(),
            label_column: "label".to_string(),
        }
    }
}

impl CorpusSchema {
    pub fn new(text_column: impl Into<String>, label_column: impl Into<String>) -> Self {
        Self {
            text_column: text_column.into(),
            label_column: label_column.into(),
        }
    }
}

fn open_input(path: &Path, what: &str) -> Result<File, ClassifierError> {
    if !path.exists() {
        return Err(ClassifierError::configuration(format!(
            "{} not found: {}",
            what,
            path.display()
        )));
    }
    File::open(path).map_err(|e| {
        ClassifierError::configuration(format!("Failed to open {} {}: {}", what, path.display(), e))
    })
}

fn column_index(headers: &[String], name: &str) -> Result<usize, ClassifierError> {
    headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
        ClassifierError::data_shape(format!(
            "Missing required column '{}' (found: {})",
            name,
            headers.join(", ")
        ))
    })
}

/// Loads a labeled training corpus from a CSV file.
///
/// # Errors
/// - `ConfigurationError` if the file does not exist or cannot be opened
/// - `DataShapeError` if a required column is missing, a row is short, or a label is not `0`/`1`
pub fn load_training_corpus(path: impl AsRef<Path>, schema: &CorpusSchema) -> Result<Corpus, ClassifierError> {
    let path = path.as_ref();
    info!("Loading training corpus from {:?}", path);
    let file = open_input(path, "Training corpus")?;
    read_training_corpus(file, schema)
}

/// Reads a labeled training corpus from any CSV source.
pub fn read_training_corpus<R: Read>(reader: R, schema: &CorpusSchema) -> Result<Corpus, ClassifierError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ClassifierError::data_shape(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let text_idx = column_index(&headers, &schema.text_column)?;
    let label_idx = column_index(&headers, &schema.label_column)?;

    let mut examples = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // Header is line 1
        let row = i + 2;
        let record = record
            .map_err(|e| ClassifierError::data_shape(format!("Row {}: unreadable record: {}", row, e)))?;

        let text = record.get(text_idx).ok_or_else(|| {
            ClassifierError::data_shape(format!("Row {}: missing '{}' cell", row, schema.text_column))
        })?;
        let raw_label = record.get(label_idx).ok_or_else(|| {
            ClassifierError::data_shape(format!("Row {}: missing '{}' cell", row, schema.label_column))
        })?;
        let label = Label::parse(raw_label).ok_or_else(|| {
            ClassifierError::data_shape(format!(
                "Row {}: invalid label '{}' (expected 0 or 1)",
                row, raw_label
            ))
        })?;

        examples.push(LabeledExample::new(text, label));
    }

    let corpus = Corpus::new(examples);
    info!(
        "Loaded {} training examples ({} negative, {} positive)",
        corpus.len(),
        corpus.count(Label::Negative),
        corpus.count(Label::Positive)
    );
    Ok(corpus)
}

/// One unlabeled inference row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Text cell, `None` when the row is too short to contain it
    pub text: Option<String>,
    /// Every cell of the row as read, for pass-through
    pub columns: Vec<String>,
}

impl RawRecord {
    /// A record holding only a text value
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            columns: vec![text.clone()],
            text: Some(text),
        }
    }

    /// A record whose text cell is missing
    pub fn missing() -> Self {
        Self::default()
    }

    /// The text to classify; a missing cell reads as empty.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// An inference table: header row plus records, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl InferenceTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads an unlabeled inference table from a CSV file.
///
/// # Errors
/// - `ConfigurationError` if the file does not exist or cannot be opened
/// - `DataShapeError` if the header is unreadable or lacks `text_column`
pub fn load_inference_table(path: impl AsRef<Path>, text_column: &str) -> Result<InferenceTable, ClassifierError> {
    let path = path.as_ref();
    info!("Loading inference table from {:?}", path);
    let file = open_input(path, "Inference corpus")?;
    read_inference_table(file, text_column)
}

/// Reads an unlabeled inference table from any CSV source.
///
/// Rows are decoded lossily and may be shorter than the header: a row that
/// does not reach the text column yields a record with `text: None`.
pub fn read_inference_table<R: Read>(reader: R, text_column: &str) -> Result<InferenceTable, ClassifierError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| ClassifierError::data_shape(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    let text_idx = column_index(&headers, text_column)?;

    let mut records = Vec::new();
    let mut missing = 0usize;
    for (i, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|e| {
            ClassifierError::data_shape(format!("Row {}: unreadable record: {}", i + 2, e))
        })?;
        let columns: Vec<String> = record
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect();
        let text = columns.get(text_idx).cloned();
        if text.is_none() {
            missing += 1;
            debug!("Row {}: no '{}' cell, treating as empty text", i + 2, text_column);
        }
        records.push(RawRecord { text, columns });
    }

    if missing > 0 {
        warn!("{} of {} rows had no '{}' cell", missing, records.len(), text_column);
    }
    info!("Loaded {} inference records", records.len());
    Ok(InferenceTable { headers, records })
}

/// Writes `table` with the appended prediction column (and optionally `is_mention`).
///
/// Short rows are padded with empty cells so every output row lines up with the header.
pub fn write_labeled_table<W: Write>(
    writer: W,
    table: &InferenceTable,
    predictions: &[PredictionResult],
    flag_mentions: bool,
) -> Result<(), ClassifierError> {
    if predictions.len() != table.records.len() {
        return Err(ClassifierError::data_shape(format!(
            "Prediction count {} does not match record count {}",
            predictions.len(),
            table.records.len()
        )));
    }

    let write_err = |e: csv::Error| ClassifierError::configuration(format!("Failed to write output table: {}", e));
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut header = table.headers.clone();
    header.push(PREDICTED_LABEL_COLUMN.to_string());
    if flag_mentions {
        header.push(IS_MENTION_COLUMN.to_string());
    }
    writer.write_record(&header).map_err(write_err)?;

    for (record, prediction) in table.records.iter().zip(predictions) {
        let mut row = record.columns.clone();
        if row.len() < table.headers.len() {
            row.resize(table.headers.len(), String::new());
        }
        row.push(prediction.predicted_label.to_string());
        if flag_mentions {
            row.push(u8::from(is_mention(record.text_or_empty())).to_string());
        }
        writer.write_record(&row).map_err(write_err)?;
    }

    writer
        .flush()
        .map_err(|e| ClassifierError::configuration(format!("Failed to flush output table: {}", e)))
}

/// Writes the labeled table to `path`, replacing any existing file.
pub fn save_labeled_table(
    path: impl AsRef<Path>,
    table: &InferenceTable,
    predictions: &[PredictionResult],
    flag_mentions: bool,
) -> Result<(), ClassifierError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        ClassifierError::configuration(format!("Failed to create output {}: {}", path.display(), e))
    })?;
    write_labeled_table(file, table, predictions, flag_mentions)?;
    info!("Wrote {} labeled rows to {:?}", predictions.len(), path);
    Ok(())
}
