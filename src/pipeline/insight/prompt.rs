//! Prompt construction and reply parsing for the insight generator.

use serde_json::Value;

use crate::pipeline::types::ChartRecord;

pub const INSIGHT_SYSTEM_PROMPT: &str = r#"
You are a data analyst writing chart insights for a business report. You are
given the chart type and the data extracted from the chart image.

RULES:
1. Describe ONLY what the data shows. Never invent values that are not present.
2. Each insight is one short, self-contained sentence.
3. Output insights as a plain bullet list, one per line, prefixed with "-".
4. Write 2 to 4 insights. No preamble, no closing remarks.
5. If a reference dataset is provided, you may relate the chart to it.
"#;

pub const SUMMARY_SYSTEM_PROMPT: &str = r#"
You are a data analyst summarizing every chart found in a document. You are
given one JSON record per chart (type, page, data, per-chart insights).

RULES:
1. Write a single short paragraph covering the document as a whole.
2. Mention how many charts were found and the dominant chart types.
3. Describe ONLY what the records show. No preamble, no bullet list.
"#;

/// Build the user prompt for a single chart.
pub fn build_chart_prompt(chart_type: &str, data: &Value, reference: Option<&Value>) -> String {
    let reference_block = match reference {
        Some(dataset) => format!("\n<reference_dataset>\n{dataset}\n</reference_dataset>\n"),
        None => String::new(),
    };

    format!(
        "Chart type: {chart_type}\n\n<chart_data>\n{data}\n</chart_data>\n{reference_block}\nWrite the insights:"
    )
}

/// Build the user prompt for the cross-chart summary.
pub fn build_summary_prompt(charts: &[ChartRecord], reference: Option<&Value>) -> String {
    let mut records = String::new();
    for chart in charts {
        // Individual records are small; a serialization failure here would
        // mean the record was never constructible in the first place.
        let line = serde_json::to_string(chart).unwrap_or_default();
        records.push_str(&line);
        records.push('\n');
    }

    let reference_block = match reference {
        Some(dataset) => format!("\n<reference_dataset>\n{dataset}\n</reference_dataset>\n"),
        None => String::new(),
    };

    format!(
        "Charts found: {}\n\n<chart_records>\n{records}</chart_records>\n{reference_block}\nWrite the summary paragraph:",
        charts.len()
    )
}

/// Parse a model reply into ordered insight strings.
///
/// Accepts "-", "*", "•" and "1." style prefixes; lines without a prefix
/// are kept as-is. Blank lines are dropped. A blank reply yields an empty
/// list rather than an error — the record simply carries no insights.
pub fn parse_insight_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(strip_bullet)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    let trimmed = line.trim();
    for prefix in ["- ", "* ", "• "] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim();
        }
    }
    // Numbered list: "1. ", "12. "
    if let Some(dot) = trimmed.find(". ") {
        if dot > 0 && trimmed[..dot].bytes().all(|b| b.is_ascii_digit()) {
            return trimmed[dot + 2..].trim();
        }
    }
    trimmed
}
