use std::num::ParseFloatError;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::signal::{SignalBuffer, ViewerError};

/// Something that turns uploaded bytes into a [`SignalBuffer`].
///
/// Format parsing (CSV, NPY, WFDB, WAV, ...) lives behind this trait; the
/// viewer only relies on the resulting channels x samples matrix.
pub trait SignalDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<SignalBuffer, ViewerError>;
}

/// Delimited-text matrix decoder: one row per line, values separated by
/// commas, tabs, semicolons or single spaces. The delimiter is taken from the
/// first non-blank line, and a leading header row that does not parse is
/// skipped.
///
/// Rows are read as time points; a matrix with more rows than columns is
/// treated as samples x channels and transposed.
pub struct DelimitedTextDecoder {
    sample_rate_hz: u32,
}

impl DelimitedTextDecoder {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self { sample_rate_hz }
    }
}

fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first = bytes
        .split(|b| *b == b'\n')
        .find(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .unwrap_or_default();
    [b',', b'\t', b';']
        .into_iter()
        .find(|d| first.contains(d))
        .unwrap_or(b' ')
}

fn parse_record(record: &StringRecord) -> Result<Vec<f64>, ParseFloatError> {
    record.iter().map(str::parse::<f64>).collect()
}

impl SignalDecoder for DelimitedTextDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<SignalBuffer, ViewerError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(sniff_delimiter(bytes))
            .trim(Trim::All)
            .flexible(false)
            .from_reader(bytes);

        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| ViewerError::Decode(e.to_string()))?;
            match parse_record(&record) {
                Ok(row) => rows.push(row),
                // header row
                Err(_) if index == 0 => continue,
                Err(e) => {
                    let line = record.position().map_or(index as u64 + 1, |p| p.line());
                    return Err(ViewerError::Decode(format!("line {line}: {e}")));
                }
            }
        }
        let Some(width) = rows.first().map(Vec::len) else {
            return Err(ViewerError::Decode("no numeric rows found".into()));
        };
        let matrix = if rows.len() > width {
            transpose(&rows, width)
        } else {
            rows
        };
        SignalBuffer::new(matrix, self.sample_rate_hz)
    }
}

fn transpose(rows: &[Vec<f64>], width: usize) -> Vec<Vec<f64>> {
    (0..width)
        .map(|c| rows.iter().map(|row| row[c]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_tables_become_channel_rows() {
        let text = "Fp1,Fp2\n1,10\n2,20\n3,30\n";
        let buffer = DelimitedTextDecoder::new(256).decode(text.as_bytes()).unwrap();
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.samples()[1], vec![10.0, 20.0, 30.0]);
        assert_eq!(buffer.sample_rate_hz(), 256);
    }

    #[test]
    fn wide_rows_are_kept_as_channels() {
        let text = "1 2 3 4\n5 6 7 8\n";
        let buffer = DelimitedTextDecoder::new(500).decode(text.as_bytes()).unwrap();
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.total_samples(), 4);
    }

    #[test]
    fn reports_bad_input() {
        let decoder = DelimitedTextDecoder::new(500);
        assert!(matches!(decoder.decode(b""), Err(ViewerError::Decode(_))));
        assert!(matches!(decoder.decode(b"1,2\n3\n"), Err(ViewerError::Decode(_))));
        assert!(matches!(decoder.decode(b"1,2\nx,y\n"), Err(ViewerError::Decode(_))));
        assert!(matches!(decoder.decode(b"time,value\n"), Err(ViewerError::Decode(_))));
    }

    #[test]
    fn tabs_and_padding_are_accepted() {
        let text = "  1.5\t-2\n 3\t 4 \n\n";
        let buffer = DelimitedTextDecoder::new(100).decode(text.as_bytes()).unwrap();
        assert_eq!(buffer.samples()[0], vec![1.5, -2.0]);
        assert_eq!(buffer.samples()[1], vec![3.0, 4.0]);
    }
}
