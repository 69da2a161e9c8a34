use std::collections::BTreeMap;
use std::fs;

use assert_matches::assert_matches;

use kira_taxlineage::domain::{LineageEntry, LineageRecord, TaxId, lineage_columns};
use kira_taxlineage::error::TaxError;
use kira_taxlineage::table::Table;

fn write_input(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn read_missing_file() {
    let temp = tempfile::tempdir().unwrap();
    let err = Table::read_tsv(&temp.path().join("absent.tsv")).unwrap_err();
    assert_matches!(err, TaxError::InputNotFound(_));
}

#[test]
fn read_empty_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_input(&temp, "empty.tsv", "");
    let err = Table::read_tsv(&path).unwrap_err();
    assert_matches!(err, TaxError::InputEmpty(_));
}

#[test]
fn missing_taxid_column() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_input(&temp, "in.tsv", "sample\ttaxid\nA\t9606\n");
    let table = Table::read_tsv(&path).unwrap();
    assert_matches!(table.unique_taxids().unwrap_err(), TaxError::MissingTaxIdColumn);
}

#[test]
fn blank_taxids_are_not_looked_up() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_input(&temp, "in.tsv", "sample\tTaxID\nA\t\nB\t \n");
    let table = Table::read_tsv(&path).unwrap();
    assert_matches!(table.unique_taxids().unwrap_err(), TaxError::NoTaxIds);
}

#[test]
fn unique_taxids_deduplicate() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_input(
        &temp,
        "in.tsv",
        "sample\tTaxID\nA\t9606\nB\t9606\nC\t10090\nD\t\n",
    );
    let table = Table::read_tsv(&path).unwrap();
    let unique = table.unique_taxids().unwrap();
    let values: Vec<&str> = unique.iter().map(TaxId::as_str).collect();
    assert_eq!(values, vec!["10090", "9606"]);
}

#[test]
fn merge_is_a_left_join() {
    let table = Table {
        headers: vec!["sample".to_string(), "TaxID".to_string()],
        rows: vec![
            vec!["A".to_string(), "9606".to_string()],
            vec!["B".to_string(), "".to_string()],
            vec!["C".to_string(), "42".to_string()],
        ],
    };
    let mut record = LineageRecord::unknown();
    record.genus = LineageEntry::new("9605", "Homo");
    let mut records = BTreeMap::new();
    records.insert("9606".parse::<TaxId>().unwrap(), record);

    let merged = table.merge_lineage(&records).unwrap();

    assert_eq!(merged.headers.len(), 2 + 16);
    assert_eq!(&merged.headers[2..], lineage_columns().as_slice());
    assert_eq!(merged.headers[2], "superkingdom_id");
    assert_eq!(merged.headers[17], "species_name");
    assert_eq!(merged.rows.len(), 3);

    let genus_id = merged.headers.iter().position(|h| h == "genus_id").unwrap();
    assert_eq!(merged.rows[0][genus_id], "9605");
    assert_eq!(merged.rows[0][genus_id + 1], "Homo");
    assert!(merged.rows[1][2..].iter().all(|v| v == "unknown"));
    assert!(merged.rows[2][2..].iter().all(|v| v == "unknown"));
}

#[test]
fn merge_keeps_colliding_input_columns() {
    let table = Table {
        headers: vec![
            "TaxID".to_string(),
            "genus_name".to_string(),
            "keep".to_string(),
        ],
        rows: vec![vec![
            "9606".to_string(),
            "user data".to_string(),
            "x".to_string(),
        ]],
    };
    let mut record = LineageRecord::unknown();
    record.genus = LineageEntry::new("9605", "Homo");
    let mut records = BTreeMap::new();
    records.insert("9606".parse::<TaxId>().unwrap(), record);

    let merged = table.merge_lineage(&records).unwrap();

    assert_eq!(merged.headers.len(), 3 + 16);
    assert_eq!(&merged.headers[..3], ["TaxID", "genus_name_x", "keep"]);
    assert_eq!(merged.rows[0][1], "user data");
    assert_eq!(merged.rows[0][2], "x");
    let genus_name = merged.headers.iter().position(|h| h == "genus_name").unwrap();
    assert_eq!(merged.rows[0][genus_name], "Homo");
}

#[test]
fn collision_suffix_skips_taken_names() {
    let table = Table {
        headers: vec![
            "TaxID".to_string(),
            "genus_id".to_string(),
            "genus_id_x".to_string(),
        ],
        rows: vec![vec!["1".to_string(), "a".to_string(), "b".to_string()]],
    };
    let merged = table.merge_lineage(&BTreeMap::new()).unwrap();
    assert_eq!(&merged.headers[..3], ["TaxID", "genus_id_x_x", "genus_id_x"]);
    assert_eq!(&merged.rows[0][..3], ["1", "a", "b"]);
}

#[test]
fn short_rows_are_padded() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_input(&temp, "in.tsv", "sample\tTaxID\tnote\nA\t9606\nB\t10090\tok\n");
    let table = Table::read_tsv(&path).unwrap();

    assert_eq!(table.rows[0], vec!["A", "9606", ""]);
    assert_eq!(table.rows[1], vec!["B", "10090", "ok"]);
    assert_eq!(table.unique_taxids().unwrap().len(), 2);
}

#[test]
fn long_rows_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_input(&temp, "in.tsv", "sample\tTaxID\nA\t9606\textra\n");
    let err = Table::read_tsv(&path).unwrap_err();
    assert_matches!(err, TaxError::InputRead { .. });
}

#[test]
fn write_roundtrips_through_tsv() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("out.tsv");
    let table = Table {
        headers: vec!["TaxID".to_string(), "note".to_string()],
        rows: vec![vec!["9606".to_string(), "has space".to_string()]],
    };
    table.write_tsv(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "TaxID\tnote\n9606\thas space\n");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn write_into_missing_directory_fails() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("missing").join("out.tsv");
    let table = Table {
        headers: vec!["TaxID".to_string()],
        rows: vec![],
    };
    assert_matches!(table.write_tsv(&path).unwrap_err(), TaxError::OutputWrite { .. });
    assert!(!path.exists());
}
