//! Reads question rows from CSV with a `question,options,correct` header.
//!
//! Cells are passed through verbatim; constraint checking belongs to
//! `QuestionRecord::validate`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use exam_core::model::{QuestionRecord, RecordField};

use crate::error::StorageError;

/// Header positions of the required columns.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    question: usize,
    options: usize,
    correct: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, StorageError> {
        let find = |field: RecordField| {
            headers
                .iter()
                .position(|header| header.trim_start_matches('\u{feff}').trim() == field.column())
                .ok_or(StorageError::MissingColumn(field.column()))
        };
        Ok(Self {
            question: find(RecordField::Question)?,
            options: find(RecordField::Options)?,
            correct: find(RecordField::Correct)?,
        })
    }

    fn to_record(self, row: &StringRecord) -> QuestionRecord {
        let cell = |idx: usize| row.get(idx).map(str::to_owned);
        QuestionRecord {
            question: cell(self.question),
            options: cell(self.options),
            correct: cell(self.correct),
        }
    }
}

/// Reads every data row into a `QuestionRecord`.
///
/// Short rows yield `None` for the cells they lack.
///
/// # Errors
///
/// Returns `StorageError::MissingColumn` if a required header is absent and
/// `StorageError::Csv` on malformed CSV.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<QuestionRecord>, StorageError> {
    let mut csv = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::from_headers(csv.headers()?)?;
    csv.records()
        .map(|row| Ok(columns.to_record(&row?)))
        .collect()
}

/// # Errors
///
/// Returns `StorageError::Io` if the file cannot be opened, otherwise as `read_records`.
pub fn read_records_from_path(path: impl AsRef<Path>) -> Result<Vec<QuestionRecord>, StorageError> {
    let file = File::open(path)?;
    read_records(file)
}
