use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{GeoSeriesAccession, OutputFormat};
use crate::error::KiraError;

pub const CONFIG_FILE: &str = "kira-geo.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub series: Vec<SeriesEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SeriesEntry {
    Shorthand(String),
    Detailed(SeriesEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SeriesEntryObject {
    pub accession: String,
    #[serde(default)]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SeriesRequest {
    pub accession: GeoSeriesAccession,
    pub output_dir: Utf8PathBuf,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub format: OutputFormat,
    pub series: Vec<SeriesRequest>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(KiraError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let base = Utf8PathBuf::from(config.output_dir.unwrap_or_else(|| ".".to_string()));

        let series = config
            .series
            .into_iter()
            .map(|entry| match entry {
                SeriesEntry::Shorthand(value) => {
                    let accession: GeoSeriesAccession = value.parse()?;
                    Ok(SeriesRequest {
                        output_dir: base.join(accession.as_str()),
                        accession,
                    })
                }
                SeriesEntry::Detailed(obj) => {
                    let accession: GeoSeriesAccession = obj.accession.parse()?;
                    let output_dir = obj
                        .output_dir
                        .map(Utf8PathBuf::from)
                        .unwrap_or_else(|| base.join(accession.as_str()));
                    Ok(SeriesRequest {
                        accession,
                        output_dir,
                    })
                }
            })
            .collect::<Result<Vec<_>, KiraError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            format: config.format.unwrap_or_default(),
            series,
        })
    }
}
