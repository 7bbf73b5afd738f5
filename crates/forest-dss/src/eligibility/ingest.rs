use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use super::record::{FieldValue, RawRecord};
use super::rules::{LabelSet, RuleOutcome};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open `{path}`: {source}")]
    Open { path: String, source: io::Error },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row} requested but the file has {available} data rows")]
    RowOutOfRange { row: usize, available: usize },
}

/// Reads every data row of a headed CSV file as a raw record.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for row in csv_reader.records() {
        let row = row?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(column, cell)| (column, FieldValue::from_cell(cell)))
                .collect(),
        );
    }

    Ok(records)
}

/// Loads a single zero-indexed data row from a CSV file.
pub fn read_record_at(path: &Path, row: usize) -> Result<RawRecord, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let records = read_records(file)?;
    let available = records.len();
    records
        .into_iter()
        .nth(row)
        .ok_or(IngestError::RowOutOfRange { row, available })
}

/// Writes canonical records with one `label_<scheme>` column per scheme, encoded as 1/0.
/// Record columns are the sorted union over all rows; absent cells are left empty.
pub fn write_labelled<W: Write>(writer: W, outcomes: &[RuleOutcome]) -> Result<(), IngestError> {
    let columns: BTreeSet<&str> = outcomes
        .iter()
        .flat_map(|outcome| outcome.record.iter().map(|(column, _)| column))
        .collect();
    let schemes: Vec<&'static str> = outcomes
        .first()
        .map(|outcome| outcome.labels.schemes().collect())
        .unwrap_or_default();

    let mut csv_writer = csv::Writer::from_writer(writer);
    let header: Vec<String> = columns
        .iter()
        .map(|column| column.to_string())
        .chain(schemes.iter().map(|scheme| LabelSet::column_name(scheme)))
        .collect();
    csv_writer.write_record(&header)?;

    for outcome in outcomes {
        let mut row: Vec<String> = columns
            .iter()
            .map(|column| {
                outcome
                    .record
                    .get(column)
                    .map(|value| value.text_form().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        row.extend(schemes.iter().map(|scheme| {
            match outcome.labels.get(scheme) {
                Some(true) => "1",
                _ => "0",
            }
            .to_string()
        }));
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
