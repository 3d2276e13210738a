use std::io::Write;

use camino::Utf8Path;
use serde::Serialize;

use crate::domain::OutputFormat;
use crate::error::KiraError;
use crate::soft::SeriesRecord;

pub const SAMPLE_COLUMN: &str = "sample";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionTable<'a> {
    pub header: &'a [String],
    pub rows: &'a [Vec<String>],
}

/// Sample-by-attribute view: one row per sample, one column per attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTable<'a> {
    pub columns: &'a [String],
    pub rows: Vec<(&'a str, Vec<&'a str>)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledSeries<'a> {
    pub expression: ExpressionTable<'a>,
    pub metadata: MetadataTable<'a>,
}

pub fn assemble(record: &SeriesRecord) -> AssembledSeries<'_> {
    let expression = ExpressionTable {
        header: record.table_header(),
        rows: record.table_rows(),
    };

    let values = record.metadata_values();
    let rows: Vec<(&str, Vec<&str>)> = record
        .sample_titles()
        .iter()
        .enumerate()
        .map(|(sample, title)| {
            let row: Vec<&str> = values.iter().map(|attr| attr[sample].as_str()).collect();
            (title.as_str(), row)
        })
        .collect();
    let metadata = MetadataTable {
        columns: record.metadata_attribute_names(),
        rows,
    };

    AssembledSeries {
        expression,
        metadata,
    }
}

impl ExpressionTable<'_> {
    pub fn write_to<W: Write>(&self, writer: W, format: OutputFormat) -> Result<(), KiraError> {
        let mut csv = table_writer(writer, format);
        csv.write_record(self.header).map_err(table_error)?;
        for row in self.rows {
            csv.write_record(row).map_err(table_error)?;
        }
        csv.flush()
            .map_err(|err| KiraError::TableWrite(err.to_string()))
    }
}

impl MetadataTable<'_> {
    pub fn write_to<W: Write>(&self, writer: W, format: OutputFormat) -> Result<(), KiraError> {
        let mut csv = table_writer(writer, format);
        csv.write_record(
            std::iter::once(SAMPLE_COLUMN).chain(self.columns.iter().map(String::as_str)),
        )
        .map_err(table_error)?;
        for (sample, values) in &self.rows {
            csv.write_record(std::iter::once(*sample).chain(values.iter().copied()))
                .map_err(table_error)?;
        }
        csv.flush()
            .map_err(|err| KiraError::TableWrite(err.to_string()))
    }
}

/// Summary of the directive fields that do not end up in either table.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub accession: Option<String>,
    pub title: String,
    pub platform_id: String,
    pub supplementary_files: Vec<String>,
    pub sample_titles: Vec<String>,
    pub sample_accessions: Vec<String>,
    pub metadata_attributes: Vec<String>,
    pub features: usize,
    pub generated_at: String,
    pub tool: String,
}

impl SeriesSummary {
    pub fn from_record(record: &SeriesRecord, accession: Option<&str>) -> Self {
        Self {
            accession: accession.map(str::to_string),
            title: record.title().to_string(),
            platform_id: record.platform_id().to_string(),
            supplementary_files: record.supplementary_files().to_vec(),
            sample_titles: record.sample_titles().to_vec(),
            sample_accessions: record.sample_accessions().to_vec(),
            metadata_attributes: record.metadata_attribute_names().to_vec(),
            features: record.feature_count(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("kira-geo/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Writes through a temp file in the destination directory and renames it
/// into place, so a failed write never leaves a partial table behind.
pub fn write_atomic<F>(path: &Utf8Path, write: F) -> Result<(), KiraError>
where
    F: FnOnce(&mut std::fs::File) -> Result<(), KiraError>,
{
    let parent = path
        .parent()
        .ok_or_else(|| KiraError::Filesystem("invalid destination path".to_string()))?;
    std::fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("kira-geo-table")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    write(temp.as_file_mut())?;
    temp.persist(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    Ok(())
}

fn table_writer<W: Write>(writer: W, format: OutputFormat) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer)
}

fn table_error(err: csv::Error) -> KiraError {
    KiraError::TableWrite(err.to_string())
}
