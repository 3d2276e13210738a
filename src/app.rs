use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;

use crate::assemble::{SeriesSummary, assemble, write_atomic};
use crate::config::ResolvedConfig;
use crate::domain::{GeoSeriesAccession, OutputFormat};
use crate::error::KiraError;
use crate::geo::{GeoClient, series_matrix_url};
use crate::soft::{SeriesRecord, parse_series_matrix_file};
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub format: OutputFormat,
    pub force: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub items: Vec<SeriesResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesResult {
    pub accession: Option<String>,
    pub source: String,
    pub action: String,
    pub matrix_path: String,
    pub expression_path: String,
    pub metadata_path: String,
    pub summary_path: String,
    pub samples: usize,
    pub features: usize,
    pub attributes: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Sink that forwards progress to `tracing`.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message),
            None => tracing::info!("{}", event.message),
        }
    }
}

#[derive(Clone)]
pub struct App<G: GeoClient> {
    geo: G,
}

impl<G: GeoClient> App<G> {
    pub fn new(geo: G) -> Self {
        Self { geo }
    }

    pub fn fetch_all(
        &self,
        config: &ResolvedConfig,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, KiraError> {
        let mut items = Vec::new();
        for request in &config.series {
            let store = Store::new(request.output_dir.clone());
            items.push(self.fetch_series(&request.accession, &store, options, sink)?);
        }
        Ok(FetchResult { items })
    }

    pub fn fetch(
        &self,
        accession: &GeoSeriesAccession,
        store: &Store,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, KiraError> {
        let item = self.fetch_series(accession, store, options, sink)?;
        Ok(FetchResult { items: vec![item] })
    }

    fn fetch_series(
        &self,
        accession: &GeoSeriesAccession,
        store: &Store,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<SeriesResult, KiraError> {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; series {}", accession.as_str()),
            elapsed: None,
        });
        let url = series_matrix_url(accession);
        let matrix_path = store.matrix_path(accession);
        let present = store.exists(&matrix_path);

        if options.dry_run {
            let action = if present && !options.force { "local" } else { "download" };
            return Ok(SeriesResult {
                accession: Some(accession.to_string()),
                source: url,
                action: action.to_string(),
                matrix_path: matrix_path.to_string(),
                expression_path: store.expression_path(options.format).to_string(),
                metadata_path: store.metadata_path(options.format).to_string(),
                summary_path: store.summary_path().to_string(),
                samples: 0,
                features: 0,
                attributes: 0,
            });
        }

        store.ensure_root()?;
        let action = if present && !options.force {
            sink.event(ProgressEvent {
                message: "phase=Store; series matrix already downloaded".to_string(),
                elapsed: None,
            });
            "local"
        } else {
            sink.event(ProgressEvent {
                message: "geo.request".to_string(),
                elapsed: None,
            });
            let start = Instant::now();
            self.geo.download_url(&url, matrix_path.as_std_path())?;
            sink.event(ProgressEvent {
                message: "geo.response".to_string(),
                elapsed: Some(start.elapsed()),
            });
            "download"
        };

        let mut result = convert(&matrix_path, store, options.format, Some(accession), sink)?;
        result.source = url;
        result.action = action.to_string();
        Ok(result)
    }
}

/// Parses a local series matrix and writes the expression table, the
/// metadata table and the summary into `store`. Nothing is written unless
/// the whole file parses.
pub fn convert(
    matrix_path: &Utf8Path,
    store: &Store,
    format: OutputFormat,
    accession: Option<&GeoSeriesAccession>,
    sink: &dyn ProgressSink,
) -> Result<SeriesResult, KiraError> {
    sink.event(ProgressEvent {
        message: format!("phase=Parse; reading {matrix_path}"),
        elapsed: None,
    });
    let start = Instant::now();
    let record = parse_series_matrix_file(matrix_path.as_std_path())?;
    sink.event(ProgressEvent {
        message: format!(
            "phase=Parse; {} samples, {} features",
            record.sample_count(),
            record.feature_count()
        ),
        elapsed: Some(start.elapsed()),
    });

    store.ensure_root()?;
    sink.event(ProgressEvent {
        message: "phase=Store; writing tables".to_string(),
        elapsed: None,
    });
    write_outputs(&record, store, format, accession)?;

    Ok(SeriesResult {
        accession: accession.map(|acc| acc.to_string()),
        source: matrix_path.to_string(),
        action: "convert".to_string(),
        matrix_path: matrix_path.to_string(),
        expression_path: store.expression_path(format).to_string(),
        metadata_path: store.metadata_path(format).to_string(),
        summary_path: store.summary_path().to_string(),
        samples: record.sample_count(),
        features: record.feature_count(),
        attributes: record.metadata_attribute_names().len(),
    })
}

fn write_outputs(
    record: &SeriesRecord,
    store: &Store,
    format: OutputFormat,
    accession: Option<&GeoSeriesAccession>,
) -> Result<(), KiraError> {
    let assembled = assemble(record);
    write_atomic(&store.expression_path(format), |file| {
        assembled.expression.write_to(file, format)
    })?;
    write_atomic(&store.metadata_path(format), |file| {
        assembled.metadata.write_to(file, format)
    })?;

    let summary = SeriesSummary::from_record(record, accession.map(GeoSeriesAccession::as_str));
    write_atomic(&store.summary_path(), |file| {
        serde_json::to_writer_pretty(file, &summary)
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    })
}
