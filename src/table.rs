use std::io::Read;
use std::path::Path;

use crate::config::ResolvedConfig;
use crate::domain::{Rank, TaxonRef};
use crate::error::FilterError;

const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(cell: &str) -> bool {
    NA_MARKERS.contains(&cell.trim())
}

#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: &Path, sep: u8) -> Result<Self, FilterError> {
        let file = std::fs::File::open(path)
            .map_err(|err| FilterError::TableRead(format!("{}: {err}", path.display())))?;
        Self::from_reader(file, sep)
    }

    pub fn from_reader<R: Read>(reader: R, sep: u8) -> Result<Self, FilterError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(sep)
            .has_headers(true)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|err| FilterError::TableRead(err.to_string()))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(|err| FilterError::TableRead(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, FilterError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| FilterError::MissingColumn(name.to_string()))
    }

    pub fn taxon_refs(&self, config: &ResolvedConfig) -> Result<Vec<TaxonRef>, FilterError> {
        let lookup = |column: &Option<String>| {
            column
                .as_deref()
                .map(|name| self.column_index(name))
                .transpose()
        };
        let name_idx = lookup(&config.name_column)?;
        let id_idx = lookup(&config.taxid_column)?;
        let rank_idx = lookup(&config.rank_column)?;

        let cell = |row: &[String], idx: Option<usize>| {
            idx.and_then(|idx| row.get(idx))
                .filter(|value| !is_missing(value))
                .map(|value| value.trim().to_string())
        };

        Ok(self
            .rows
            .iter()
            .map(|row| {
                let rank = match rank_idx {
                    Some(_) => cell(row, rank_idx).and_then(|value| value.parse::<Rank>().ok()),
                    None => config.taxa_rank.clone(),
                };
                TaxonRef {
                    name: cell(row, name_idx),
                    raw_id: cell(row, id_idx),
                    rank,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_markers() {
        assert!(is_missing(""));
        assert!(is_missing("  "));
        assert!(is_missing("NA"));
        assert!(is_missing("NaN"));
        assert!(!is_missing("0042"));
        assert!(!is_missing("Panthera leo"));
    }

    #[test]
    fn cells_stay_textual() {
        let input = "taxid;name\n0042;Panthera leo\n;\n";
        let table = Table::from_reader(input.as_bytes(), b';').unwrap();
        assert_eq!(table.headers(), ["taxid", "name"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], "0042");
        assert_eq!(table.rows()[1], ["", ""]);
    }
}
