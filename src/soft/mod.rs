//! Reader for GEO "series matrix" files in SOFT convention.
//!
//! A series matrix is a gzip-compressed text file of `!`-prefixed directive
//! lines followed (or interleaved) by one whitespace-delimited data table
//! bracketed by `!series_matrix_table_begin` / `!series_matrix_table_end`.
//! The parser makes a single forward pass and yields a [`SeriesRecord`].

mod directive;
mod lines;
mod parser;
mod record;

pub use directive::{Directive, parse_characteristic, unquote};
pub use lines::{SoftLines, open_series_matrix};
pub use parser::{ParseState, SoftParser, parse_series_matrix, parse_series_matrix_file};
pub use record::{SeriesRecord, SeriesRecordBuilder};
