use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{GeoSeriesAccession, OutputFormat};
use crate::error::KiraError;
use crate::geo::series_matrix_file_name;

/// Output directory layout for one series.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn matrix_path(&self, accession: &GeoSeriesAccession) -> Utf8PathBuf {
        self.root.join(series_matrix_file_name(accession))
    }

    pub fn expression_path(&self, format: OutputFormat) -> Utf8PathBuf {
        self.root.join(format!("expression.{}", format.extension()))
    }

    pub fn metadata_path(&self, format: OutputFormat) -> Utf8PathBuf {
        self.root.join(format!("metadata.{}", format.extension()))
    }

    pub fn summary_path(&self) -> Utf8PathBuf {
        self.root.join("series.json")
    }

    pub fn ensure_root(&self) -> Result<(), KiraError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().is_file()
    }
}
