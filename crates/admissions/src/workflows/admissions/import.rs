//! Fixture loading for seeding an application store.
//!
//! Fixtures are either CSV with the hosted table's column names (see [`ApplicationRow`] and
//! [`NoteRow`]) or a `.json` array of rows as the table export produces them. Unknown columns
//! are ignored and missing optional columns are treated as blank.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::domain::{Application, ApplicationNote};
use super::rows::{decode_applications, decode_notes, ApplicationRow, NoteRow, RowError};

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Row { line: u64, source: RowError },
    Decode(RowError),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read application fixtures: {}", err),
            ImportError::Csv(err) => write!(f, "invalid application CSV data: {}", err),
            ImportError::Json(err) => write!(f, "invalid JSON fixture data: {}", err),
            ImportError::Row { line, source } => {
                write!(f, "invalid row on line {}: {}", line, source)
            }
            ImportError::Decode(err) => write!(f, "invalid fixture row: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Json(err) => Some(err),
            ImportError::Row { source, .. } => Some(source),
            ImportError::Decode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<RowError> for ImportError {
    fn from(err: RowError) -> Self {
        Self::Decode(err)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
}

/// Read CSV rows of `Row`, converting each and tagging failures with their line.
fn read_csv_rows<Rd, Row, T>(reader: Rd) -> Result<Vec<T>, ImportError>
where
    Rd: Read,
    Row: DeserializeOwned,
    T: TryFrom<Row, Error = RowError>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut records = Vec::new();
    while csv_reader.read_record(&mut record)? {
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or_default();
        let row: Row = record.deserialize(Some(&headers))?;
        let converted = T::try_from(row).map_err(|source| ImportError::Row { line, source })?;
        records.push(converted);
    }

    Ok(records)
}

pub struct ApplicationImporter;

impl ApplicationImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Application>, ImportError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        if is_json(path) {
            Self::from_json_reader(file)
        } else {
            Self::from_reader(file)
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Application>, ImportError> {
        read_csv_rows::<R, ApplicationRow, Application>(reader)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Vec<Application>, ImportError> {
        let payload: Value = serde_json::from_reader(reader)?;
        Ok(decode_applications(payload)?)
    }
}

/// Loads threaded notes in the notes table's row shape.
pub struct NoteImporter;

impl NoteImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ApplicationNote>, ImportError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        if is_json(path) {
            Self::from_json_reader(file)
        } else {
            Self::from_reader(file)
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ApplicationNote>, ImportError> {
        read_csv_rows::<R, NoteRow, ApplicationNote>(reader)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Vec<ApplicationNote>, ImportError> {
        let payload: Value = serde_json::from_reader(reader)?;
        Ok(decode_notes(payload)?)
    }
}
