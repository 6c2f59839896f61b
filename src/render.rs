/// Console rendering of records and summaries. Presentation only: the core
/// types stay plain structured data and nothing here feeds back into them.
use crate::record::{ParsedRecord, NO_LATENCY};
use crate::stats::Summary;

/// Prompts longer than this are clipped in console output. The stored
/// record keeps the full text; the export sink is unaffected.
const PROMPT_CLIP_CHARS: usize = 50;

fn clip_prompt(prompt: &str) -> String {
    let mut clipped: String = prompt.chars().take(PROMPT_CLIP_CHARS).collect();
    if prompt.chars().count() > PROMPT_CLIP_CHARS {
        clipped.push_str("...");
    }
    clipped
}

fn latency_text(latency: f64) -> String {
    if latency == NO_LATENCY || latency < 0.0 {
        "n/a".to_string()
    } else {
        format!("{latency:.2}s")
    }
}

/// One console line per record, for tail and head output.
pub fn record_line(record: &ParsedRecord) -> String {
    let body = format!(
        "Model: {} | Latency: {} | Status: {} | Prompt: {}",
        record.model,
        latency_text(record.latency),
        record.status,
        clip_prompt(&record.prompt),
    );

    match (&record.timestamp, &record.level) {
        (Some(ts), Some(level)) => {
            format!("{} {} | {}", ts.format("%Y-%m-%d %H:%M:%S"), level, body)
        }
        _ => body,
    }
}

/// Multi-line report block for a finished summary.
pub fn summary_text(summary: &Summary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Requests: {} (success: {}, failure: {})\n",
        summary.total, summary.success, summary.failure
    ));
    out.push_str(&format!("Models: {}\n", summary.model_count));

    for row in &summary.models {
        let mean = match row.mean_latency {
            Some(m) => format!("{m:.2}s"),
            None => "no data".to_string(),
        };
        out.push_str(&format!(
            "  {}: {} requests, mean latency {}\n",
            row.model, row.requests, mean
        ));
    }

    if let Some(longest) = &summary.longest_prompt {
        out.push_str(&format!(
            "Longest prompt ({} chars): {}\n",
            longest.chars,
            clip_prompt(&longest.text)
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Aggregator;
    use chrono::NaiveDate;

    fn record(model: &str, latency: f64, prompt: &str, status: &str) -> ParsedRecord {
        ParsedRecord {
            model: model.to_string(),
            latency,
            prompt: prompt.to_string(),
            status: status.to_string(),
            timestamp: None,
            level: None,
        }
    }

    #[test]
    fn test_record_line_plain() {
        let line = record_line(&record("gpt-4", 1.2, "hello", "success"));
        assert_eq!(
            line,
            "Model: gpt-4 | Latency: 1.20s | Status: success | Prompt: hello"
        );
    }

    #[test]
    fn test_record_line_with_prefix_fields() {
        let mut r = record("gpt-4", 1.2, "hello", "success");
        r.timestamp = Some(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        );
        r.level = Some("INFO".to_string());
        let line = record_line(&r);
        assert!(line.starts_with("2024-01-01 10:00:00 INFO | "));
    }

    #[test]
    fn test_latency_sentinel_renders_na() {
        let line = record_line(&record("m", -1.0, "p", "unknown"));
        assert!(line.contains("Latency: n/a"));
    }

    #[test]
    fn test_long_prompt_is_clipped() {
        let prompt = "x".repeat(80);
        let line = record_line(&record("m", 0.1, &prompt, "success"));
        assert!(line.ends_with(&format!("Prompt: {}...", "x".repeat(50))));
    }

    #[test]
    fn test_short_prompt_is_not_clipped() {
        let line = record_line(&record("m", 0.1, "short", "success"));
        assert!(line.ends_with("Prompt: short"));
        assert!(!line.ends_with("..."));
    }

    #[test]
    fn test_summary_text_shape() {
        let mut agg = Aggregator::new();
        agg.update(&record("gpt-4", 1.0, "hello world", "success"));
        agg.update(&record("gpt-4", 2.0, "hi", "success"));
        agg.update(&record("claude", -1.0, "", "error"));
        let text = summary_text(&agg.summary());

        assert!(text.contains("Requests: 3 (success: 2, failure: 0)"));
        assert!(text.contains("Models: 2"));
        assert!(text.contains("  claude: 1 requests, mean latency no data"));
        assert!(text.contains("  gpt-4: 2 requests, mean latency 1.50s"));
        assert!(text.contains("Longest prompt (11 chars): hello world"));
    }

    #[test]
    fn test_summary_text_without_prompts() {
        let agg = Aggregator::new();
        let text = summary_text(&agg.summary());
        assert!(text.contains("Requests: 0"));
        assert!(!text.contains("Longest prompt"));
    }
}
