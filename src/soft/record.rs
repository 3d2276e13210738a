use serde::Serialize;

use crate::error::KiraError;

/// Everything extracted from one series matrix. Built by
/// [`SeriesRecordBuilder`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesRecord {
    title: String,
    platform_id: String,
    supplementary_files: Vec<String>,
    sample_titles: Vec<String>,
    sample_accessions: Vec<String>,
    metadata_attribute_names: Vec<String>,
    metadata_values: Vec<Vec<String>>,
    table_header: Vec<String>,
    table_rows: Vec<Vec<String>>,
}

impl SeriesRecord {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn platform_id(&self) -> &str {
        &self.platform_id
    }

    pub fn supplementary_files(&self) -> &[String] {
        &self.supplementary_files
    }

    pub fn sample_titles(&self) -> &[String] {
        &self.sample_titles
    }

    pub fn sample_accessions(&self) -> &[String] {
        &self.sample_accessions
    }

    pub fn metadata_attribute_names(&self) -> &[String] {
        &self.metadata_attribute_names
    }

    /// One row per attribute, one value per sample.
    pub fn metadata_values(&self) -> &[Vec<String>] {
        &self.metadata_values
    }

    pub fn table_header(&self) -> &[String] {
        &self.table_header
    }

    pub fn table_rows(&self) -> &[Vec<String>] {
        &self.table_rows
    }

    pub fn sample_count(&self) -> usize {
        self.sample_titles.len()
    }

    pub fn feature_count(&self) -> usize {
        self.table_rows.len()
    }
}

#[derive(Debug, Default)]
pub struct SeriesRecordBuilder {
    title: String,
    platform_id: String,
    supplementary_files: Vec<String>,
    sample_titles: Vec<String>,
    sample_accessions: Vec<String>,
    metadata_attribute_names: Vec<String>,
    metadata_values: Vec<Vec<String>>,
    table_header: Vec<String>,
    table_rows: Vec<Vec<String>>,
    table_opened_at: Option<usize>,
}

impl SeriesRecordBuilder {
    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn set_platform_id(&mut self, platform_id: String) {
        self.platform_id = platform_id;
    }

    pub fn push_supplementary_file(&mut self, url: String) {
        self.supplementary_files.push(url);
    }

    pub fn set_sample_titles(&mut self, titles: Vec<String>) {
        self.sample_titles = titles;
    }

    pub fn set_sample_accessions(&mut self, accessions: Vec<String>) {
        self.sample_accessions = accessions;
    }

    pub fn push_metadata(&mut self, name: String, values: Vec<String>) {
        self.metadata_attribute_names.push(name);
        self.metadata_values.push(values);
    }

    pub fn metadata_attribute_names(&self) -> &[String] {
        &self.metadata_attribute_names
    }

    pub fn open_table(&mut self, line_no: usize) -> Result<(), KiraError> {
        if let Some(first) = self.table_opened_at {
            return Err(KiraError::malformed_at(
                line_no,
                format!("second data table (first opened at line {first})"),
            ));
        }
        self.table_opened_at = Some(line_no);
        Ok(())
    }

    pub fn set_table_header(&mut self, header: Vec<String>) {
        self.table_header = header;
    }

    pub fn push_table_row(&mut self, line_no: usize, row: Vec<String>) -> Result<(), KiraError> {
        if row.len() != self.table_header.len() {
            return Err(KiraError::malformed_at(
                line_no,
                format!(
                    "data row has {} fields, header has {}",
                    row.len(),
                    self.table_header.len()
                ),
            ));
        }
        self.table_rows.push(row);
        Ok(())
    }

    pub fn finish(self) -> Result<SeriesRecord, KiraError> {
        if self.table_opened_at.is_none() {
            return Err(KiraError::malformed_record(
                "no !series_matrix_table_begin block found",
            ));
        }

        let samples = self.sample_titles.len();
        let table_samples = self.table_header.len().saturating_sub(1);
        if table_samples != samples {
            return Err(KiraError::malformed_record(format!(
                "data table has {table_samples} sample columns but {samples} sample titles"
            )));
        }
        if self.sample_accessions.len() != samples {
            return Err(KiraError::malformed_record(format!(
                "{} sample accessions for {samples} sample titles",
                self.sample_accessions.len()
            )));
        }
        for (name, values) in self
            .metadata_attribute_names
            .iter()
            .zip(&self.metadata_values)
        {
            if values.len() != samples {
                return Err(KiraError::malformed_record(format!(
                    "characteristic {name} has {} values for {samples} samples",
                    values.len()
                )));
            }
        }

        Ok(SeriesRecord {
            title: self.title,
            platform_id: self.platform_id,
            supplementary_files: self.supplementary_files,
            sample_titles: self.sample_titles,
            sample_accessions: self.sample_accessions,
            metadata_attribute_names: self.metadata_attribute_names,
            metadata_values: self.metadata_values,
            table_header: self.table_header,
            table_rows: self.table_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn two_sample_builder() -> SeriesRecordBuilder {
        let mut builder = SeriesRecordBuilder::default();
        builder.set_sample_titles(strings(&["S1", "S2"]));
        builder.set_sample_accessions(strings(&["GSM1", "GSM2"]));
        builder.open_table(10).unwrap();
        builder.set_table_header(strings(&["ID_REF", "GSM1", "GSM2"]));
        builder
    }

    #[test]
    fn finish_accepts_consistent_record() {
        let mut builder = two_sample_builder();
        builder.push_metadata("tissue".to_string(), strings(&["liver", "brain"]));
        builder
            .push_table_row(12, strings(&["p1", "1.0", "2.0"]))
            .unwrap();
        let record = builder.finish().unwrap();
        assert_eq!(record.sample_count(), 2);
        assert_eq!(record.feature_count(), 1);
    }

    #[test]
    fn short_metadata_row_is_rejected() {
        let mut builder = two_sample_builder();
        builder.push_metadata("tissue".to_string(), strings(&["liver"]));
        let err = builder.finish().unwrap_err();
        assert_matches!(err, KiraError::MalformedDirective { .. });
    }

    #[test]
    fn ragged_table_row_is_rejected() {
        let mut builder = two_sample_builder();
        let err = builder
            .push_table_row(11, strings(&["p1", "1.0"]))
            .unwrap_err();
        assert_matches!(err, KiraError::MalformedDirective { context, .. } if context == "line 11");
    }

    #[test]
    fn second_table_is_rejected() {
        let mut builder = two_sample_builder();
        assert!(builder.open_table(20).is_err());
    }

    #[test]
    fn missing_table_is_rejected() {
        let mut builder = SeriesRecordBuilder::default();
        builder.set_sample_titles(strings(&["S1"]));
        assert!(builder.finish().is_err());
    }
}
