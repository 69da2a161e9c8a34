use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::domain::{LineageRecord, TaxId, lineage_columns};
use crate::error::TaxError;

pub const TAXID_COLUMN: &str = "TaxID";

/// In-memory tab-separated table. Every row has `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read_tsv(path: &Path) -> Result<Self, TaxError> {
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => TaxError::InputNotFound(path.to_path_buf()),
            _ => read_error(path, err.to_string()),
        })?;
        Self::from_reader(path, file)
    }

    pub fn from_reader<R: io::Read>(path: &Path, reader: R) -> Result<Self, TaxError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| read_error(path, err.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(TaxError::InputEmpty(path.to_path_buf()));
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record =
                result.map_err(|err| read_error(path, format!("row {}: {err}", idx + 1)))?;
            if record.len() > headers.len() {
                return Err(read_error(
                    path,
                    format!(
                        "row {}: expected {} fields, saw {}",
                        idx + 1,
                        headers.len(),
                        record.len()
                    ),
                ));
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        debug!(path = %path.display(), rows = rows.len(), "input table loaded");
        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn taxid_index(&self) -> Result<usize, TaxError> {
        self.column_index(TAXID_COLUMN).ok_or(TaxError::MissingTaxIdColumn)
    }

    /// TaxID cell of every row, `None` for blank cells.
    pub fn taxids(&self) -> Result<Vec<Option<TaxId>>, TaxError> {
        let idx = self.taxid_index()?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).and_then(|cell| cell.parse().ok()))
            .collect())
    }

    /// Distinct non-blank TaxIDs.
    pub fn unique_taxids(&self) -> Result<BTreeSet<TaxId>, TaxError> {
        let unique: BTreeSet<TaxId> = self.taxids()?.into_iter().flatten().collect();
        if unique.is_empty() {
            return Err(TaxError::NoTaxIds);
        }
        Ok(unique)
    }

    /// Left join on TaxID. Rows without a matching record get the unknown
    /// lineage. Input columns whose name collides with a lineage column are
    /// kept under an `_x` suffix.
    pub fn merge_lineage(
        &self,
        records: &BTreeMap<TaxId, LineageRecord>,
    ) -> Result<Table, TaxError> {
        let taxids = self.taxids()?;
        let lineage = lineage_columns();

        let mut headers: Vec<String> = Vec::with_capacity(self.headers.len() + lineage.len());
        for header in &self.headers {
            let mut name = header.clone();
            while lineage.contains(&name)
                || (name != *header && self.headers.contains(&name))
                || headers.contains(&name)
            {
                name.push_str("_x");
            }
            headers.push(name);
        }
        headers.extend(lineage);

        let unknown = LineageRecord::unknown();
        let rows = self
            .rows
            .iter()
            .zip(taxids)
            .map(|(row, taxid)| {
                let record = taxid
                    .as_ref()
                    .and_then(|taxid| records.get(taxid))
                    .unwrap_or(&unknown);
                let mut out: Vec<String> = (0..self.headers.len())
                    .map(|idx| row.get(idx).cloned().unwrap_or_default())
                    .collect();
                out.extend(record.values().into_iter().map(str::to_string));
                out
            })
            .collect();

        Ok(Table { headers, rows })
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes to a temp file beside `path` and renames it into place, so a
    /// failed write leaves any existing file untouched.
    pub fn write_tsv(&self, path: &Path) -> Result<(), TaxError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".kira-taxlineage")
            .suffix(".tsv.tmp")
            .tempfile_in(parent)
            .map_err(|err| write_error(path, err.to_string()))?;
        self.to_writer(temp.as_file())
            .map_err(|err| write_error(path, err.to_string()))?;
        temp.persist(path)
            .map_err(|err| write_error(path, err.error.to_string()))?;
        Ok(())
    }
}

fn read_error(path: &Path, message: String) -> TaxError {
    TaxError::InputRead {
        path: path.to_path_buf(),
        message,
    }
}

fn write_error(path: &Path, message: String) -> TaxError {
    TaxError::OutputWrite {
        path: path.to_path_buf(),
        message,
    }
}
