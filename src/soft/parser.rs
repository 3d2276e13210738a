use std::path::Path;

use crate::error::KiraError;
use crate::soft::directive::{self, TABLE_END, Transition, whitespace_fields};
use crate::soft::lines::open_series_matrix;
use crate::soft::record::{SeriesRecord, SeriesRecordBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Scanning,
    InTable { opened_at: usize, header_seen: bool },
}

pub struct SoftParser {
    state: ParseState,
    builder: SeriesRecordBuilder,
    line_no: usize,
}

impl Default for SoftParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::Scanning,
            builder: SeriesRecordBuilder::default(),
            line_no: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn feed(&mut self, line: &str) -> Result<(), KiraError> {
        self.line_no += 1;
        let line = line.trim_end();
        match self.state {
            ParseState::Scanning => {
                if let Some((_, Transition::EnterTable)) =
                    directive::apply(&mut self.builder, self.line_no, line)?
                {
                    self.state = ParseState::InTable {
                        opened_at: self.line_no,
                        header_seen: false,
                    };
                }
            }
            ParseState::InTable {
                opened_at,
                header_seen,
            } => {
                if line.starts_with(TABLE_END) {
                    if !header_seen {
                        return Err(KiraError::malformed_at(
                            self.line_no,
                            format!("data table opened at line {opened_at} has no header row"),
                        ));
                    }
                    self.state = ParseState::Scanning;
                    return Ok(());
                }
                if line.trim().is_empty() {
                    return Ok(());
                }
                let fields = whitespace_fields(line);
                if header_seen {
                    self.builder.push_table_row(self.line_no, fields)?;
                } else {
                    self.builder.set_table_header(fields);
                    self.state = ParseState::InTable {
                        opened_at,
                        header_seen: true,
                    };
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<SeriesRecord, KiraError> {
        if let ParseState::InTable { opened_at, .. } = self.state {
            return Err(KiraError::malformed_record(format!(
                "data table opened at line {opened_at} is missing {TABLE_END}"
            )));
        }
        let lines = self.line_no;
        let record = self.builder.finish()?;
        tracing::debug!(
            lines,
            samples = record.sample_count(),
            features = record.feature_count(),
            attributes = record.metadata_attribute_names().len(),
            "parsed series matrix"
        );
        Ok(record)
    }
}

pub fn parse_series_matrix<I>(lines: I) -> Result<SeriesRecord, KiraError>
where
    I: IntoIterator<Item = Result<String, KiraError>>,
{
    let mut parser = SoftParser::new();
    for line in lines {
        parser.feed(&line?)?;
    }
    parser.finish()
}

pub fn parse_series_matrix_file(path: &Path) -> Result<SeriesRecord, KiraError> {
    tracing::debug!(path = %path.display(), "parsing series matrix");
    parse_series_matrix(open_series_matrix(path)?)
}
