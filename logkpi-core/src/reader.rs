//! Line-delimited JSON record reader.
//!
//! Yields one [`RecordCandidate`] per line that parses as a JSON object, in
//! file order. Lines that do not parse are skipped: each one is logged at
//! `warn` and kept as a [`MalformedLine`] so callers can count them. Schema
//! validation happens later, in [`crate::record::RawRecord::from_value`].
//!
//! The reader owns the file handle and releases it when dropped, whether the
//! sequence was exhausted or abandoned early.

use crate::error::KpiError;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// A line that parsed as a JSON object. Not yet schema-checked.
#[derive(Debug, Clone)]
pub struct RecordCandidate {
    /// 1-based line number.
    pub line_number: usize,
    pub value: Value,
}

/// Diagnostic for a skipped line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number.
    pub line_number: usize,
    pub message: String,
}

pub struct RecordReader<R = BufReader<File>> {
    lines: std::io::Lines<R>,
    line_number: usize,
    malformed: Vec<MalformedLine>,
    error: Option<KpiError>,
}

impl RecordReader<BufReader<File>> {
    /// Open `path` for reading. Fails with [`KpiError::NotFound`] before any
    /// line is read when the path does not exist.
    pub fn open(path: &Path) -> Result<Self, KpiError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KpiError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(KpiError::Io(e)),
        };
        debug!(path = %path.display(), "Opened input");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            malformed: Vec::new(),
            error: None,
        }
    }

    /// Lines skipped so far.
    pub fn malformed(&self) -> &[MalformedLine] {
        &self.malformed
    }

    /// Number of lines consumed so far, malformed ones included.
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    /// The I/O error that ended iteration early, if any.
    pub fn take_error(&mut self) -> Option<KpiError> {
        self.error.take()
    }

    fn skip(&mut self, message: String) {
        warn!(line = self.line_number, error = %message, "Skipping malformed line");
        self.malformed.push(MalformedLine {
            line_number: self.line_number,
            message,
        });
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = RecordCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    self.error = Some(KpiError::ReaderIo {
                        line: self.line_number,
                        source,
                    });
                    return None;
                }
            };
            self.line_number += 1;

            match serde_json::from_str::<Value>(&line) {
                Ok(value @ Value::Object(_)) => {
                    return Some(RecordCandidate {
                        line_number: self.line_number,
                        value,
                    });
                }
                Ok(other) => self.skip(format!("expected a JSON object, got {other}")),
                Err(e) => self.skip(e.to_string()),
            }
        }
    }
}
