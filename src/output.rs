use std::io::{self, Write};

use serde::Serialize;

use crate::app::{FetchResult, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        let mut stdout = io::stdout();
        for item in &result.items {
            let name = item.accession.as_deref().unwrap_or("series");
            writeln!(stdout, "{name} ({})", item.action)?;
            writeln!(stdout, "  source:     {}", item.source)?;
            writeln!(stdout, "  matrix:     {}", item.matrix_path)?;
            writeln!(
                stdout,
                "  expression: {} ({} features x {} samples)",
                item.expression_path, item.features, item.samples
            )?;
            writeln!(
                stdout,
                "  metadata:   {} ({} attributes)",
                item.metadata_path, item.attributes
            )?;
            writeln!(stdout, "  summary:    {}", item.summary_path)?;
        }
        Ok(())
    }
}
