use std::fs;

use assert_matches::assert_matches;

use gbif_filter::config::{Config, ConfigLoader, ResolvedConfig};
use gbif_filter::domain::TargetRank;
use gbif_filter::error::FilterError;
use gbif_filter::output::{OutputMode, TableWriter};
use gbif_filter::pipeline::RowOutcome;
use gbif_filter::table::Table;

fn config(sep: &str, rank_column: Option<&str>, taxa_rank: Option<&str>) -> ResolvedConfig {
    ConfigLoader::resolve_config(Config {
        country: Some("KE".to_string()),
        name_column: Some("name".to_string()),
        taxid_column: Some("taxid".to_string()),
        rank_column: rank_column.map(str::to_string),
        taxa_rank: taxa_rank.map(str::to_string),
        sep: Some(sep.to_string()),
        ..Config::default()
    })
    .unwrap()
}

#[test]
fn taxon_refs_use_configured_columns() {
    let config = config(";", Some("rank"), None);
    let input = "taxid;name;rank\n0042;Panthera leo;species\n;Felidae;\n";
    let table = Table::from_reader(input.as_bytes(), b';').unwrap();
    let taxa = table.taxon_refs(&config).unwrap();

    assert_eq!(taxa[0].raw_id.as_deref(), Some("0042"));
    assert_eq!(taxa[0].rank.as_ref().unwrap().as_str(), "SPECIES");
    assert_eq!(taxa[1].raw_id, None);
    assert_eq!(taxa[1].key(), Some("Felidae"));
    assert_eq!(taxa[1].rank, None);
}

#[test]
fn default_rank_applies_without_rank_column() {
    let config = config(",", None, Some("genus"));
    let table = Table::from_reader("name,taxid\nPanthera,\n".as_bytes(), b',').unwrap();
    let taxa = table.taxon_refs(&config).unwrap();
    assert_eq!(taxa[0].rank.as_ref().unwrap().as_str(), "GENUS");
}

#[test]
fn missing_column_is_fatal() {
    let config = config(",", None, None);
    let table = Table::from_reader("name\nPanthera\n".as_bytes(), b',').unwrap();
    let err = table.taxon_refs(&config).unwrap_err();
    assert_matches!(err, FilterError::MissingColumn(ref column) if column == "taxid");
}

#[test]
fn write_tag_mode_to_file() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("input.tsv");
    let output = temp.path().join("output.tsv");
    fs::write(&input, "name\ttaxid\nPanthera\t\nCanis\t\n\t\n").unwrap();

    let table = Table::read(&input, b'\t').unwrap();
    let outcomes = vec![
        RowOutcome {
            tag: Some(true),
            resolved_names: Some(vec!["Panthera leo".to_string()]),
            resolved_ids: Some(vec!["5219404".to_string()]),
        },
        RowOutcome {
            tag: Some(false),
            resolved_names: None,
            resolved_ids: None,
        },
        RowOutcome::default(),
    ];

    let written = TableWriter::new(b'\t', OutputMode::Tag, Some(TargetRank::Species))
        .write_path(&output, &table, &outcomes)
        .unwrap();
    assert_eq!(written, 3);

    let content = fs::read_to_string(&output).unwrap();
    let lines = content.lines().collect::<Vec<_>>();
    assert_eq!(
        lines[0],
        "name\ttaxid\tgbif_filter_tag\tgbif_filter_resolved_species_names\tgbif_filter_resolved_species_ids"
    );
    assert_eq!(lines[1], "Panthera\tNA\tTrue\t['Panthera leo']\t[5219404]");
    assert_eq!(lines[2], "Canis\tNA\tFalse\tNA\tNA");
    assert_eq!(lines[3], "NA\tNA\tNA\tNA\tNA");
}

#[test]
fn filter_mode_keeps_true_rows_only() {
    let table = Table::from_reader("name\nA\nB\nC\n".as_bytes(), b',').unwrap();
    let outcomes = vec![
        RowOutcome {
            tag: Some(false),
            ..RowOutcome::default()
        },
        RowOutcome {
            tag: Some(true),
            ..RowOutcome::default()
        },
        RowOutcome::default(),
    ];
    let mut buffer = Vec::new();
    let written = TableWriter::new(b',', OutputMode::Filter, None)
        .write(&mut buffer, &table, &outcomes)
        .unwrap();
    assert_eq!(written, 1);
    assert_eq!(String::from_utf8(buffer).unwrap(), "name\nB\n");
}

#[test]
fn unreadable_input_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let err = Table::read(&temp.path().join("missing.csv"), b',').unwrap_err();
    assert_matches!(err, FilterError::TableRead(_));
}
