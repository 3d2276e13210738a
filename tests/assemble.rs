use std::fs;
use std::io::Cursor;

use camino::Utf8PathBuf;

use kira_geo_matrix::assemble::{SAMPLE_COLUMN, assemble, write_atomic};
use kira_geo_matrix::domain::OutputFormat;
use kira_geo_matrix::soft::{SeriesRecord, SoftLines, parse_series_matrix};

fn fixture_record() -> SeriesRecord {
    let text = fs::read_to_string("tests/fixtures/GSE99001_series_matrix.txt").unwrap();
    parse_series_matrix(SoftLines::new(Cursor::new(text.into_bytes()))).unwrap()
}

#[test]
fn expression_table_round_trips_through_csv() {
    let record = fixture_record();
    let assembled = assemble(&record);

    for format in [OutputFormat::Csv, OutputFormat::Tsv] {
        let mut buf = Vec::new();
        assembled.expression.write_to(&mut buf, format).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(format.delimiter())
            .from_reader(buf.as_slice());
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.unwrap().iter().map(str::to_string).collect())
            .collect();

        assert_eq!(header, record.table_header());
        assert_eq!(rows, record.table_rows());
    }
}

#[test]
fn metadata_table_has_one_row_per_sample() {
    let record = fixture_record();
    let assembled = assemble(&record);

    let mut buf = Vec::new();
    assembled.metadata.write_to(&mut buf, OutputFormat::Csv).unwrap();
    let mut reader = csv::Reader::from_reader(buf.as_slice());

    let header = reader.headers().unwrap().clone();
    assert_eq!(
        header.iter().collect::<Vec<_>>(),
        vec![SAMPLE_COLUMN, "tissue", "age_(weeks)", "treatment"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[2].iter().collect::<Vec<_>>(),
        vec!["liver rep2", "liver", "12", "drug: 5 mg"]
    );
}

#[test]
fn failed_write_leaves_no_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("expression.csv")).unwrap();

    let result = write_atomic(&path, |_file| {
        Err(kira_geo_matrix::error::KiraError::TableWrite(
            "disk full".to_string(),
        ))
    });
    assert!(result.is_err());
    assert!(!path.as_std_path().exists());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}
