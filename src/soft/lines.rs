use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::KiraError;

/// Forward-only line iterator over decoded text.
///
/// Line terminators (`\n`, `\r\n`) are removed. Bytes that are not valid
/// UTF-8 are replaced rather than aborting the pass.
pub struct SoftLines<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> SoftLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for SoftLines<R> {
    type Item = Result<String, KiraError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(err) => {
                self.done = true;
                Some(Err(KiraError::Decompression(err.to_string())))
            }
        }
    }
}

pub fn open_series_matrix(path: &Path) -> Result<SoftLines<BufReader<GzDecoder<File>>>, KiraError> {
    let file = File::open(path)
        .map_err(|err| KiraError::Decompression(format!("open {}: {err}", path.display())))?;
    Ok(SoftLines::new(BufReader::new(GzDecoder::new(file))))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use assert_matches::assert_matches;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    #[test]
    fn strips_line_terminators() {
        let lines = SoftLines::new(Cursor::new("a\r\nb\n\nc"))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(lines, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let lines = SoftLines::new(Cursor::new(b"caf\xe9\n".to_vec()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(lines, vec!["caf\u{fffd}"]);
    }

    #[test]
    fn reads_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"!Series_title\t\"X\"\n!series_matrix_table_begin\n").unwrap();
        encoder.finish().unwrap();

        let lines = open_series_matrix(&path)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(lines, vec!["!Series_title\t\"X\"", "!series_matrix_table_begin"]);
    }

    #[test]
    fn plain_text_is_not_a_gzip_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.txt.gz");
        std::fs::write(&path, "!Series_title\tplain\n").unwrap();

        let first = open_series_matrix(&path).unwrap().next().unwrap();
        assert_matches!(first, Err(KiraError::Decompression(_)));
    }

    #[test]
    fn missing_file_fails() {
        let err = open_series_matrix(Path::new("/nonexistent/matrix.txt.gz")).err().unwrap();
        assert_matches!(err, KiraError::Decompression(_));
    }
}
