use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::model::SourceKey;
use crate::util::ensure_parent_directory;

const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
    "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

pub const FLAG_TRUE: &str = "True";

#[derive(Debug, Clone)]
pub struct ColumnNames {
    pub target: String,
    pub numeric_id: String,
    pub structure_key: String,
    pub library_id: String,
    pub pathway_id: String,
    pub name: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            target: "drugbank_id".to_string(),
            numeric_id: "cid".to_string(),
            structure_key: "inchikey".to_string(),
            library_id: "chembl_id".to_string(),
            pathway_id: "kegg_id".to_string(),
            name: "dname".to_string(),
        }
    }
}

impl ColumnNames {
    pub fn source_key(&self, key: SourceKey) -> &str {
        match key {
            SourceKey::NumericId => &self.numeric_id,
            SourceKey::StructureKey => &self.structure_key,
            SourceKey::LibraryId => &self.library_id,
            SourceKey::PathwayId => &self.pathway_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrugTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DrugTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("failed to read {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .context("failed to read csv header")?
            .iter()
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        if headers.is_empty() {
            bail!("csv header is empty");
        }

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("failed to parse csv row {index}"))?;
            if record.len() > headers.len() {
                bail!(
                    "csv row {index} has {} fields but the header has {}",
                    record.len(),
                    headers.len()
                );
            }
            rows.push(record.iter().map(ToOwned::to_owned).collect());
        }

        Ok(Self::new(headers, rows))
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        ensure_parent_directory(path)?;
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        self.to_writer(file)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(&self.headers)
            .context("failed to write csv header")?;
        for (index, row) in self.rows.iter().enumerate() {
            csv_writer
                .write_record(row)
                .with_context(|| format!("failed to write csv row {index}"))?;
        }
        csv_writer.flush().context("failed to flush csv output")?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .with_context(|| format!("input table has no column named {name:?}"))
    }

    pub fn reset_column(&mut self, name: &str) -> usize {
        match self.column(name) {
            Some(col) => {
                for row in &mut self.rows {
                    row[col].clear();
                }
                col
            }
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        }
    }

    pub fn raw(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.raw(row, col).filter(|cell| !is_null(cell))
    }

    pub fn is_missing(&self, row: usize, col: usize) -> bool {
        self.value(row, col).is_none()
    }

    pub fn set(&mut self, row: usize, col: usize, value: &str) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|cells| cells.get_mut(col)) {
            *cell = value.to_string();
        }
    }

    pub fn missing_count(&self, col: usize) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row, col)).count()
    }

    pub fn missing_rows(&self, col: usize) -> Vec<usize> {
        (0..self.len()).filter(|&row| self.is_missing(row, col)).collect()
    }
}

pub fn is_null(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || NA_TOKENS.contains(&trimmed)
}
