//! FILENAME: core/engine/src/store.rs
//! PURPOSE: The row store - a single logical table of JSON documents.
//! CONTEXT: Every save is a destructive full replace (truncate then insert).
//! Records are read-only between saves, so the store only needs bulk
//! replace, full scan and a single-row sample for header discovery.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::record::Record;

/// Opaque identifier assigned by the store on insert.
pub type RowId = u64;

/// A record as persisted: the document plus its row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: RowId,
    pub data: Record,
}

/// Bulk-replace document store over one table.
pub trait RowStore: Send {
    /// Truncates the table and inserts `records` in order.
    /// Returns the number of records stored.
    fn replace_all(&mut self, records: Vec<Record>) -> Result<usize, StoreError>;

    /// Every record, in insertion order.
    fn scan_all(&self) -> Result<Vec<Record>, StoreError>;

    /// The first stored record, if any.
    fn sample_one(&self) -> Result<Option<Record>, StoreError>;

    /// Removes every record. Returns how many were removed.
    fn clear(&mut self) -> Result<usize, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn number_rows(records: Vec<Record>) -> Vec<StoredRow> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, data)| StoredRow {
            id: i as RowId + 1,
            data,
        })
        .collect()
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryRowStore {
    rows: Vec<StoredRow>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        MemoryRowStore { rows: Vec::new() }
    }

    pub fn rows(&self) -> &[StoredRow] {
        &self.rows
    }
}

impl RowStore for MemoryRowStore {
    fn replace_all(&mut self, records: Vec<Record>) -> Result<usize, StoreError> {
        self.rows = number_rows(records);
        Ok(self.rows.len())
    }

    fn scan_all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.rows.iter().map(|r| r.data.clone()).collect())
    }

    fn sample_one(&self) -> Result<Option<Record>, StoreError> {
        Ok(self.rows.first().map(|r| r.data.clone()))
    }

    fn clear(&mut self) -> Result<usize, StoreError> {
        let removed = self.rows.len();
        self.rows.clear();
        Ok(removed)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.rows.len())
    }
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

/// Persists the table as a JSON array of `{id, data}` documents.
///
/// Replacing the table writes a temp file next to the target and renames it
/// into place, so a reader sees either the old table or the new one.
#[derive(Debug, Clone)]
pub struct JsonFileRowStore {
    path: PathBuf,
}

impl JsonFileRowStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileRowStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<StoredRow>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let rows: Vec<StoredRow> = serde_json::from_reader(BufReader::new(file))?;
        Ok(rows)
    }

    fn write(&self, rows: &[StoredRow]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, rows)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl RowStore for JsonFileRowStore {
    fn replace_all(&mut self, records: Vec<Record>) -> Result<usize, StoreError> {
        let rows = number_rows(records);
        self.write(&rows)?;
        Ok(rows.len())
    }

    fn scan_all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.load()?.into_iter().map(|r| r.data).collect())
    }

    fn sample_one(&self) -> Result<Option<Record>, StoreError> {
        Ok(self.load()?.into_iter().next().map(|r| r.data))
    }

    fn clear(&mut self) -> Result<usize, StoreError> {
        let removed = self.load()?.len();
        self.write(&[])?;
        Ok(removed)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.load()?.len())
    }
}

// ============================================================================
// HEADER DISCOVERY
// ============================================================================

/// Field names of one sample record, in insertion order.
/// An empty store has no headers.
pub fn discover_headers(store: &dyn RowStore) -> Result<Vec<String>, StoreError> {
    Ok(store
        .sample_one()?
        .map(|record| record.keys().map(str::to_string).collect())
        .unwrap_or_default())
}
