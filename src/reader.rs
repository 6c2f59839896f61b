/// Stream reader: walks the source log sequentially and feeds each line to
/// the active parser. Batch modes read to exhaustion; follow mode seeks to
/// the current end and polls for appended content.
use crate::parser::LineParser;
use crate::record::ParsedRecord;
use crate::stats::{Aggregator, Summary};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised when opening or walking the source.
#[derive(Debug)]
pub enum ReadError {
    /// Source path did not exist at open time. Not retried.
    SourceNotFound { path: PathBuf },
    /// Any other I/O failure while opening or reading.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::SourceNotFound { path } => {
                write!(f, "source not found: {}", path.display())
            }
            ReadError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::SourceNotFound { .. } => None,
            ReadError::Io { source, .. } => Some(source),
        }
    }
}

/// Open the source for one mode invocation, mapping a missing path to the
/// user-visible `SourceNotFound` outcome.
pub fn open_source(path: &Path) -> Result<File, ReadError> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReadError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ReadError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn io_error(path: &Path, source: std::io::Error) -> ReadError {
    ReadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Line counts produced by `dry_run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    /// Physical lines in the source.
    pub total_lines: u64,
    /// Lines that produced a record under the active parser.
    pub valid: u64,
}

/// Batch ingest: read the whole source once, aggregate every surviving
/// record, and return the finished summary.
pub fn ingest_batch(path: &Path, parser: &dyn LineParser) -> Result<Summary, ReadError> {
    let reader = BufReader::new(open_source(path)?);
    let mut agg = Aggregator::new();

    for line in reader.lines() {
        let line = line.map_err(|e| io_error(path, e))?;
        if let Some(record) = parser.parse(&line) {
            agg.update(&record);
        }
    }

    tracing::debug!(records = agg.total(), "batch ingest complete");
    Ok(agg.summary())
}

/// Parse only the last `n` physical lines of the source, in original order.
///
/// The whole file is read and the final `n` lines sliced before parsing;
/// when the file holds fewer than `n` lines, all of them are used. `n` is
/// validated to be positive at the CLI boundary.
pub fn head_records(
    path: &Path,
    parser: &dyn LineParser,
    n: usize,
) -> Result<Vec<ParsedRecord>, ReadError> {
    let reader = BufReader::new(open_source(path)?);
    let lines: Vec<String> = reader
        .lines()
        .collect::<Result<_, _>>()
        .map_err(|e| io_error(path, e))?;

    let start = lines.len().saturating_sub(n);
    Ok(lines[start..]
        .iter()
        .filter_map(|line| parser.parse(line))
        .collect())
}

/// Count how many source lines the active parser accepts.
pub fn dry_run(path: &Path, parser: &dyn LineParser) -> Result<ValidationReport, ReadError> {
    let reader = BufReader::new(open_source(path)?);
    let mut report = ValidationReport {
        total_lines: 0,
        valid: 0,
    };

    for line in reader.lines() {
        let line = line.map_err(|e| io_error(path, e))?;
        report.total_lines += 1;
        if parser.parse(&line).is_some() {
            report.valid += 1;
        }
    }

    Ok(report)
}

/// Follow mode: seek to the current end of the source, then poll for
/// appended lines forever, routing each surviving record to `on_record`.
///
/// Pre-existing content is never replayed. The wait between polls is a
/// non-busy `tokio::time::sleep`. The loop has no natural termination;
/// cancellation comes from outside (the entry point races this future
/// against Ctrl-C), and the file handle is released whenever the future
/// is dropped.
pub async fn follow(
    path: &Path,
    parser: &dyn LineParser,
    poll_interval: Duration,
    mut on_record: impl FnMut(&ParsedRecord),
) -> Result<(), ReadError> {
    let mut reader = BufReader::new(open_source(path)?);
    reader
        .seek(SeekFrom::End(0))
        .map_err(|e| io_error(path, e))?;

    tracing::info!(
        path = %path.display(),
        poll_secs = poll_interval.as_secs_f64(),
        "following source for appended lines"
    );

    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).map_err(|e| io_error(path, e))?;
        if n == 0 {
            tokio::time::sleep(poll_interval).await;
            continue;
        }
        if let Some(record) = parser.parse(&line) {
            on_record(&record);
        }
    }
}
