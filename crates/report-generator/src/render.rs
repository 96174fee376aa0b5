//! Per-format renderers, mirroring `_render_html_report` /
//! `_render_markdown_report` / `_render_text_report` — hand-built
//! strings rather than a template engine, matching the fallback path the
//! original always exercises when no custom template is configured.

use crate::types::{ReportKind, ReportSection};
use chrono::{DateTime, Utc};
use serde_json::to_string_pretty;
use uuid::Uuid;

pub fn render_json(
    report_id: Uuid,
    kind: ReportKind,
    session_id: Option<Uuid>,
    timestamp: DateTime<Utc>,
    sections: &[ReportSection],
) -> String {
    let value = serde_json::json!({
        "report_id": report_id,
        "report_type": kind.as_str(),
        "session_id": session_id,
        "timestamp": timestamp,
        "sections": sections,
    });
    to_string_pretty(&value).unwrap_or_default()
}

pub fn render_html(kind: ReportKind, session_id: Option<Uuid>, timestamp: DateTime<Utc>, sections: &[ReportSection]) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{title} Report</title>\n<style>\n\
         body {{ font-family: Arial, sans-serif; margin: 20px; }}\n\
         .header {{ background-color: #f0f0f0; padding: 20px; border-radius: 5px; }}\n\
         .section {{ margin: 20px 0; padding: 15px; border: 1px solid #ddd; border-radius: 5px; }}\n\
         .critical, .error {{ background-color: #ffe6e6; }}\n\
         .warning {{ background-color: #fff3cd; }}\n\
         .info {{ background-color: #e6f3ff; }}\n\
         </style>\n</head>\n<body>\n\
         <div class=\"header\">\n<h1>{title} Report</h1>\n<p><strong>Generated:</strong> {timestamp}</p>\n\
         <p><strong>Session ID:</strong> {session}</p>\n</div>\n",
        title = title_case(kind.as_str()),
        timestamp = timestamp.to_rfc3339(),
        session = session_id.map(|s| s.to_string()).unwrap_or_else(|| "N/A".to_string()),
    );

    for section in sections {
        let severity_class = format!("{:?}", section.severity).to_lowercase();
        html.push_str(&format!(
            "<div class=\"section {severity_class}\">\n<h2>{}</h2>\n<pre>{}</pre>\n</div>\n",
            section.title,
            to_string_pretty(&section.content).unwrap_or_default(),
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

pub fn render_markdown(kind: ReportKind, session_id: Option<Uuid>, timestamp: DateTime<Utc>, sections: &[ReportSection]) -> String {
    let mut md = format!("# {} Report\n\n", title_case(kind.as_str()));
    md.push_str(&format!("**Generated:** {}\n", timestamp.to_rfc3339()));
    md.push_str(&format!("**Session ID:** {}\n\n", session_id.map(|s| s.to_string()).unwrap_or_else(|| "N/A".to_string())));

    for section in sections {
        md.push_str(&format!("## {}\n\n", section.title));
        md.push_str(&format!("```json\n{}\n```\n\n", to_string_pretty(&section.content).unwrap_or_default()));
    }
    md
}

pub fn render_text(kind: ReportKind, session_id: Option<Uuid>, timestamp: DateTime<Utc>, sections: &[ReportSection]) -> String {
    let mut text = format!("{} REPORT\n{}\n\n", kind.as_str().to_uppercase(), "=".repeat(50));
    text.push_str(&format!("Generated: {}\n", timestamp.to_rfc3339()));
    text.push_str(&format!("Session ID: {}\n\n", session_id.map(|s| s.to_string()).unwrap_or_else(|| "N/A".to_string())));

    for section in sections {
        text.push_str(&format!("{}\n{}\n", section.title.to_uppercase(), "-".repeat(30)));
        text.push_str(&to_string_pretty(&section.content).unwrap_or_default());
        text.push_str("\n\n");
    }
    text
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
