use std::collections::HashMap;

use csv::ReaderBuilder;
use shared::protocol::ColumnKind;
use thiserror::Error;

/// Cell contents treated as missing values, matching common spreadsheet and
/// dataframe exports.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("file is not valid UTF-8 text")]
    InvalidUtf8,
    #[error("file contains no columns")]
    NoColumns,
    #[error("line {line} has {found} fields but the header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("column '{0}' does not exist")]
    UnknownColumn(String),
    #[error("column '{column}' has non-numeric value '{value}' in row {row}")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },
}

impl DatasetError {
    /// True when the uploaded bytes themselves could not be read as a table.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            DatasetError::InvalidUtf8
                | DatasetError::NoColumns
                | DatasetError::RaggedRow { .. }
                | DatasetError::Csv(_)
        )
    }
}

/// Tabular data parsed from one uploaded CSV file. Rows are aligned to the
/// header; cells stay as text until a typed accessor reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, DatasetError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes).map_err(|_| DatasetError::InvalidUtf8)?;
        Self::from_csv_str(text)
    }

    pub fn from_csv_str(text: &str) -> Result<Self, DatasetError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
            return Err(DatasetError::NoColumns);
        }
        let columns = dedupe_column_names(headers.iter());
        let width = columns.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            // blank and whitespace-only lines are not rows
            if record.len() == 1 && record[0].trim().is_empty() {
                continue;
            }
            if record.len() > width {
                return Err(DatasetError::RaggedRow {
                    line: record.position().map(|pos| pos.line()).unwrap_or_default(),
                    expected: width,
                    found: record.len(),
                });
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Builds a dataset from already-split cells. Short rows are padded.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DatasetError> {
        if columns.is_empty() {
            return Err(DatasetError::NoColumns);
        }
        let width = columns.len();
        let mut aligned = Vec::with_capacity(rows.len());
        for (index, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(DatasetError::RaggedRow {
                    line: index as u64 + 2,
                    expected: width,
                    found: row.len(),
                });
            }
            row.resize(width, String::new());
            aligned.push(row);
        }
        Ok(Self {
            columns: dedupe_column_names(columns.iter().map(String::as_str)),
            rows: aligned,
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn head(&self, count: usize) -> &[Vec<String>] {
        &self.rows[..count.min(self.rows.len())]
    }

    /// Text cells of `name`; missing values are `None`.
    pub fn text_column(&self, name: &str) -> Result<Vec<Option<&str>>, DatasetError> {
        let index = self.require_column(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| {
                let cell = row[index].as_str();
                (!is_missing(cell)).then_some(cell)
            })
            .collect())
    }

    /// Numeric cells of `name`; missing values are `None`. The first cell
    /// that is neither missing nor a number fails the whole column.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>, DatasetError> {
        let index = self.require_column(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| {
                let cell = row[index].as_str();
                if is_missing(cell) {
                    return Ok(None);
                }
                parse_number(cell)
                    .map(Some)
                    .ok_or_else(|| DatasetError::NotNumeric {
                        column: name.to_string(),
                        row: row_index + 1,
                        value: cell.to_string(),
                    })
            })
            .collect()
    }

    pub fn column_kind(&self, index: usize) -> ColumnKind {
        let mut kind = ColumnKind::Empty;
        for row in &self.rows {
            let cell = row[index].as_str();
            if is_missing(cell) {
                continue;
            }
            let trimmed = cell.trim();
            if trimmed.parse::<i64>().is_ok() {
                if kind == ColumnKind::Empty {
                    kind = ColumnKind::Integer;
                }
            } else if parse_number(trimmed).is_some() {
                kind = ColumnKind::Float;
            } else {
                return ColumnKind::Text;
            }
        }
        kind
    }

    fn require_column(&self, name: &str) -> Result<usize, DatasetError> {
        self.column_index(name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }
}

pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Finite numbers only; `inf` and `NaN` spellings that escape the missing
/// markers are not amounts.
fn parse_number(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Later duplicates of a header name get `.1`, `.2`, ... appended so that
/// every column stays addressable by name.
fn dedupe_column_names<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();
    for name in raw {
        let mut column = name.to_string();
        let mut count = counts.get(&column).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(column.clone(), count + 1);
            column = format!("{column}.{count}");
            count = counts.get(&column).copied().unwrap_or(0);
        }
        counts.insert(column.clone(), count + 1);
        names.push(column);
    }
    names
}

#[cfg(test)]
#[path = "tests/dataset_tests.rs"]
mod tests;
