//! CSV-backed record tables keyed by a unique column.
//!
//! Tables are plain `Vec`s held by the caller. Every operation either applies
//! completely or leaves the vector untouched.

use crate::error::StoreError;
use crate::model::Record;
use std::path::Path;

fn csv_error(path: &Path, e: csv::Error) -> StoreError {
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(source) => StoreError::Io {
            path: path.to_path_buf(),
            source,
        },
        _ => StoreError::Parse {
            path: path.to_path_buf(),
            message,
        },
    }
}

/// Line terminator of a CSV file, kept so a save writes back what was read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Taken from the first line break in the file (the end of the header).
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().position(|&b| b == b'\n') {
            Some(i) if i > 0 && bytes[i - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    fn terminator(self) -> csv::Terminator {
        match self {
            LineEnding::Lf => csv::Terminator::Any(b'\n'),
            LineEnding::CrLf => csv::Terminator::CRLF,
        }
    }
}

/// Reads every row of `path`. Columns are matched by header name, so order
/// may differ from `T::HEADERS` and extra columns are ignored.
#[allow(dead_code)]
pub fn load<T: Record>(path: &Path) -> Result<Vec<T>, StoreError> {
    load_with_line_ending(path).map(|(rows, _)| rows)
}

/// [`load`], also reporting the file's line terminator.
pub fn load_with_line_ending<T: Record>(path: &Path) -> Result<(Vec<T>, LineEnding), StoreError> {
    let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ending = LineEnding::detect(&bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes.as_slice());

    let headers = rdr.headers().map_err(|e| csv_error(path, e))?.clone();
    let missing: Vec<&str> = T::HEADERS
        .iter()
        .copied()
        .filter(|h| !headers.iter().any(|c| c.trim() == *h))
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::Parse {
            path: path.to_path_buf(),
            message: format!("missing columns: {}", missing.join(", ")),
        });
    }
    // Tolerate padding around header names ("name, id_number").
    let trimmed: csv::StringRecord = headers.iter().map(str::trim).collect();
    rdr.set_headers(trimmed);

    let mut out = Vec::new();
    for row in rdr.deserialize::<T>() {
        out.push(row.map_err(|e| csv_error(path, e))?);
    }
    tracing::debug!(path = %path.display(), rows = out.len(), ?ending, "loaded table");
    Ok((out, ending))
}

/// Overwrites `path` with the canonical header followed by `records` in
/// order, using `\n` line endings.
#[allow(dead_code)]
pub fn save<T: Record>(records: &[T], path: &Path) -> Result<(), StoreError> {
    save_with_line_ending(records, path, LineEnding::Lf)
}

pub fn save_with_line_ending<T: Record>(
    records: &[T],
    path: &Path,
    ending: LineEnding,
) -> Result<(), StoreError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(ending.terminator())
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    wtr.write_record(T::HEADERS)
        .map_err(|e| csv_error(path, e))?;
    for r in records {
        wtr.serialize(r).map_err(|e| csv_error(path, e))?;
    }
    wtr.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), rows = records.len(), "saved table");
    Ok(())
}

pub fn find_by_key<T: Record>(records: &[T], key: &str) -> Option<usize> {
    records.iter().position(|r| r.key() == key)
}

pub fn insert<T: Record>(records: &mut Vec<T>, mut new_record: T) -> Result<(), StoreError> {
    if find_by_key(records, new_record.key()).is_some() {
        return Err(StoreError::DuplicateKey {
            field: T::KEY_FIELD,
            key: new_record.key().to_string(),
        });
    }
    new_record.normalize();
    records.push(new_record);
    Ok(())
}

/// Removes the record with `key` and returns it. The remainder stays in
/// order, indexed contiguously from 0.
pub fn delete<T: Record>(records: &mut Vec<T>, key: &str) -> Result<T, StoreError> {
    let Some(idx) = find_by_key(records, key) else {
        return Err(StoreError::NotFound {
            field: T::KEY_FIELD,
            key: key.to_string(),
        });
    };
    Ok(records.remove(idx))
}

/// Overwrites the record currently keyed by `key`. The new key may differ
/// from the old one as long as no other record already uses it.
pub fn update<T: Record>(records: &mut [T], key: &str, mut new_values: T) -> Result<(), StoreError> {
    let Some(idx) = find_by_key(records, key) else {
        return Err(StoreError::NotFound {
            field: T::KEY_FIELD,
            key: key.to_string(),
        });
    };
    if new_values.key() != key {
        let collides = records
            .iter()
            .enumerate()
            .any(|(i, r)| i != idx && r.key() == new_values.key());
        if collides {
            return Err(StoreError::DuplicateKey {
                field: T::KEY_FIELD,
                key: new_values.key().to_string(),
            });
        }
    }
    new_values.normalize();
    records[idx] = new_values;
    Ok(())
}
