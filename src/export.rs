/// JSONL export sink: replay the source through the parser and append one
/// JSON object per surviving record to the destination file.
use crate::parser::LineParser;
use crate::reader::{self, ReadError};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Errors raised by an export run.
#[derive(Debug)]
pub enum ExportError {
    /// Reading the source failed (missing path or I/O).
    Read(ReadError),
    /// The destination could not be created or written.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A record failed to serialize.
    Serialize { source: serde_json::Error },
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Read(e) => write!(f, "{e}"),
            ExportError::Write { path, source } => {
                write!(f, "failed to write export {}: {}", path.display(), source)
            }
            ExportError::Serialize { source } => {
                write!(f, "failed to serialize record: {source}")
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Read(e) => Some(e),
            ExportError::Write { source, .. } => Some(source),
            ExportError::Serialize { source } => Some(source),
        }
    }
}

/// Export every surviving record as newline-delimited JSON, in source order.
///
/// The destination is truncated on each run and its parent directories are
/// created when absent. Returns the number of records written.
pub fn export_jsonl(
    source: &Path,
    parser: &dyn LineParser,
    dest: &Path,
) -> Result<u64, ExportError> {
    let reader = BufReader::new(reader::open_source(source).map_err(ExportError::Read)?);

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::Write {
                path: dest.to_path_buf(),
                source: e,
            })?;
        }
    }
    let out = std::fs::File::create(dest).map_err(|e| ExportError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(out);

    let mut count = 0u64;
    for line in reader.lines() {
        let line = line.map_err(|e| {
            ExportError::Read(ReadError::Io {
                path: source.to_path_buf(),
                source: e,
            })
        })?;
        let record = match parser.parse(&line) {
            Some(r) => r,
            None => continue,
        };
        let json =
            serde_json::to_string(&record).map_err(|e| ExportError::Serialize { source: e })?;
        writeln!(writer, "{json}").map_err(|e| ExportError::Write {
            path: dest.to_path_buf(),
            source: e,
        })?;
        count += 1;
    }

    writer.flush().map_err(|e| ExportError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    tracing::info!(records = count, dest = %dest.display(), "export complete");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{AnchoredParser, PermissiveParser};

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_export_skips_malformed_and_reports_count() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("requests.log");
        std::fs::write(
            &source,
            concat!(
                r#"{"model":"gpt-4","latency":1.2,"prompt":"hi","status":"success"}"#,
                "\n",
                "malformed line\n",
                r#"{"model":"claude","status":"failure"}"#,
                "\n",
            ),
        )
        .unwrap();
        let dest = dir.path().join("out.jsonl");

        let count = export_jsonl(&source, &PermissiveParser, &dest).unwrap();
        assert_eq!(count, 2);

        let lines = read_lines(&dest);
        assert_eq!(lines.len(), 2);
        // Every exported line is itself a valid JSON object in source order
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["model"], "gpt-4");
        assert_eq!(first["latency"], 1.2);
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["model"], "claude");
        assert_eq!(second["latency"], -1.0);
    }

    #[test]
    fn test_export_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("requests.log");
        std::fs::write(&source, concat!(r#"{"model":"m"}"#, "\n")).unwrap();
        let dest = dir.path().join("nested/deeper/out.jsonl");

        let count = export_jsonl(&source, &PermissiveParser, &dest).unwrap();
        assert_eq!(count, 1);
        assert!(dest.exists());
    }

    #[test]
    fn test_export_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("requests.log");
        let dest = dir.path().join("out.jsonl");

        std::fs::write(
            &source,
            concat!(r#"{"model":"a"}"#, "\n", r#"{"model":"b"}"#, "\n"),
        )
        .unwrap();
        assert_eq!(export_jsonl(&source, &PermissiveParser, &dest).unwrap(), 2);

        std::fs::write(&source, concat!(r#"{"model":"c"}"#, "\n")).unwrap();
        assert_eq!(export_jsonl(&source, &PermissiveParser, &dest).unwrap(), 1);
        assert_eq!(read_lines(&dest).len(), 1);
    }

    #[test]
    fn test_export_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.jsonl");
        let err = export_jsonl(Path::new("/nonexistent/requests.log"), &PermissiveParser, &dest)
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::Read(ReadError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn test_anchored_export_carries_prefix_fields() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("requests.log");
        std::fs::write(
            &source,
            concat!(
                r#"2024-01-01 10:00:00 INFO {"model":"gpt-4","status":"success"}"#,
                "\n",
            ),
        )
        .unwrap();
        let dest = dir.path().join("out.jsonl");

        assert_eq!(export_jsonl(&source, &AnchoredParser, &dest).unwrap(), 1);
        let line: serde_json::Value = serde_json::from_str(&read_lines(&dest)[0]).unwrap();
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["timestamp"], "2024-01-01T10:00:00");
    }
}
