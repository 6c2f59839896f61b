/// Log line parsing: turn one raw gateway log line into a `ParsedRecord`.
///
/// Two contracts exist behind one trait. `PermissiveParser` accepts any line
/// carrying a trailing JSON object; `AnchoredParser` additionally requires a
/// `<timestamp> <INFO|ERROR>` prefix and captures it into the record. Which
/// one runs is a configuration decision, never an implicit mix.
use crate::record::ParsedRecord;
use chrono::NaiveDateTime;
use clap::ValueEnum;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

/// Prefix shape required by the anchored contract:
/// `<timestamp> <INFO|ERROR> ... {json}`.
static ANCHORED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?) (INFO|ERROR).*?(\{.*\})").unwrap());

/// Timestamp format of the anchored prefix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parser strategy selector (config key `observer.parser` / `--parser`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Any line with a trailing JSON object parses.
    #[default]
    Permissive,
    /// Lines must open with a timestamp and level token.
    Anchored,
}

/// Classifies one raw line. All failure is "no record" — parsers never panic
/// and never surface errors to the caller.
pub trait LineParser: Send + Sync {
    /// Strategy name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Parse one line, or `None` when the line does not satisfy the contract.
    fn parse(&self, line: &str) -> Option<ParsedRecord>;
}

/// Construct the parser selected by configuration.
pub fn make_parser(kind: ParserKind) -> Box<dyn LineParser> {
    match kind {
        ParserKind::Permissive => Box::new(PermissiveParser),
        ParserKind::Anchored => Box::new(AnchoredParser),
    }
}

/// Extracts the JSON object embedded after arbitrary prefix text.
///
/// Everything from the first `{` to the end of the line must decode as a
/// single JSON object; no diagnostics are emitted on failure. Pure function
/// over its argument.
pub struct PermissiveParser;

impl LineParser for PermissiveParser {
    fn name(&self) -> &str {
        "permissive"
    }

    fn parse(&self, line: &str) -> Option<ParsedRecord> {
        let start = line.find('{')?;
        let value: Value = serde_json::from_str(&line[start..]).ok()?;
        let payload = value.as_object()?;
        Some(ParsedRecord::from_payload(payload))
    }
}

/// Requires the `<timestamp> <INFO|ERROR> ... {json}` shape.
///
/// A line that misses the prefix fails silently even if it carries valid
/// trailing JSON. Once the prefix matches, a bad timestamp or malformed
/// payload is worth a diagnostic before the line is skipped.
pub struct AnchoredParser;

impl LineParser for AnchoredParser {
    fn name(&self) -> &str {
        "anchored"
    }

    fn parse(&self, line: &str) -> Option<ParsedRecord> {
        let caps = ANCHORED_LINE.captures(line)?;
        let (ts_text, level, json_text) = (&caps[1], &caps[2], &caps[3]);

        let timestamp = match NaiveDateTime::parse_from_str(ts_text, TIMESTAMP_FORMAT) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(error = %e, line = line.trim(), "failed to parse line: bad timestamp");
                return None;
            }
        };

        let value: Value = match serde_json::from_str(json_text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, line = line.trim(), "failed to parse line: bad payload");
                return None;
            }
        };
        let payload = value.as_object()?;

        let mut record = ParsedRecord::from_payload(payload);
        record.timestamp = Some(timestamp);
        record.level = Some(level.to_string());
        Some(record)
    }
}
