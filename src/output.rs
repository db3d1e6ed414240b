use std::io::Write;
use std::path::Path;

use crate::domain::TargetRank;
use crate::error::FilterError;
use crate::pipeline::RowOutcome;
use crate::table::{Table, is_missing};

pub const TAG_COLUMN: &str = "gbif_filter_tag";
pub const NA: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Tag,
    Filter,
}

pub fn resolved_columns(rank: TargetRank) -> (String, String) {
    let rank = rank.as_str().to_lowercase();
    (
        format!("gbif_filter_resolved_{rank}_names"),
        format!("gbif_filter_resolved_{rank}_ids"),
    )
}

pub struct TableWriter {
    sep: u8,
    mode: OutputMode,
    expansion: Option<TargetRank>,
}

impl TableWriter {
    pub fn new(sep: u8, mode: OutputMode, expansion: Option<TargetRank>) -> Self {
        Self {
            sep,
            mode,
            expansion,
        }
    }

    pub fn write_path(
        &self,
        path: &Path,
        table: &Table,
        outcomes: &[RowOutcome],
    ) -> Result<usize, FilterError> {
        let file = std::fs::File::create(path)
            .map_err(|err| FilterError::TableWrite(format!("{}: {err}", path.display())))?;
        self.write(file, table, outcomes)
    }

    pub fn write<W: Write>(
        &self,
        writer: W,
        table: &Table,
        outcomes: &[RowOutcome],
    ) -> Result<usize, FilterError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.sep)
            .from_writer(writer);

        let mut header = table.headers().to_vec();
        if self.mode == OutputMode::Tag {
            header.push(TAG_COLUMN.to_string());
        }
        if let Some(rank) = self.expansion {
            let (names, ids) = resolved_columns(rank);
            header.push(names);
            header.push(ids);
        }
        writer
            .write_record(&header)
            .map_err(|err| FilterError::TableWrite(err.to_string()))?;

        let mut written = 0;
        for (row, outcome) in table.rows().iter().zip(outcomes) {
            if self.mode == OutputMode::Filter && outcome.tag != Some(true) {
                continue;
            }
            let mut record = row
                .iter()
                .map(|cell| if is_missing(cell) { NA.to_string() } else { cell.clone() })
                .collect::<Vec<_>>();
            if self.mode == OutputMode::Tag {
                record.push(format_tag(outcome.tag));
            }
            if self.expansion.is_some() {
                record.push(format_list(outcome.resolved_names.as_deref(), true));
                record.push(format_list(outcome.resolved_ids.as_deref(), false));
            }
            writer
                .write_record(&record)
                .map_err(|err| FilterError::TableWrite(err.to_string()))?;
            written += 1;
        }
        writer
            .flush()
            .map_err(|err| FilterError::TableWrite(err.to_string()))?;
        Ok(written)
    }
}

fn format_tag(tag: Option<bool>) -> String {
    match tag {
        Some(true) => "True".to_string(),
        Some(false) => "False".to_string(),
        None => NA.to_string(),
    }
}

fn format_list(values: Option<&[String]>, quoted: bool) -> String {
    let Some(values) = values else {
        return NA.to_string();
    };
    let items = values
        .iter()
        .map(|value| {
            if quoted {
                format!("'{value}'")
            } else {
                value.clone()
            }
        })
        .collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}
