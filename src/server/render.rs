//! Minimal HTML for the form front end.

use html_escape::encode_text;

use crate::domain::{LogLevel, OutcomeResult, PipelineOutcome};

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Log Analysis Gateway</title>
<style>
body { font-family: sans-serif; max-width: 60rem; margin: 2rem auto; }
textarea { width: 100%; }
pre { background: #f4f4f4; padding: 0.75rem; white-space: pre-wrap; }
.error { color: #a00; }
.warn { color: #a60; }
</style>
</head>
<body>
<h1>Log Analysis Gateway</h1>
<form method="post" action="/submit-log">
<textarea name="log" rows="10" placeholder="Paste log lines here"></textarea>
<p><button type="submit">Analyze</button></p>
</form>
"#;

const TAIL: &str = "</body>\n</html>\n";

/// Render the form page, followed by the result of a run if there is one
pub fn page(result: Option<(&str, &PipelineOutcome)>) -> String {
    let mut html = String::from(HEAD);
    if let Some((submitted, outcome)) = result {
        html.push_str(&result_section(submitted, outcome));
    }
    html.push_str(TAIL);
    html
}

fn result_section(submitted: &str, outcome: &PipelineOutcome) -> String {
    let mut sections = vec![format!(
        "<h2>Submitted</h2>\n<pre>{}</pre>\n",
        encode_text(submitted)
    )];

    match &outcome.result {
        OutcomeResult::Success(success) => {
            let findings = serde_json::to_string_pretty(&success.analyzer_results)
                .unwrap_or_else(|_| success.analyzer_results.to_string());
            sections.push(format!(
                "<h2>Anonymized</h2>\n<pre>{}</pre>\n",
                encode_text(&success.anonymized_text)
            ));
            sections.push(format!(
                "<h2>Analysis</h2>\n<pre>{}</pre>\n",
                encode_text(&success.llm_analysis)
            ));
            sections.push(format!(
                "<h2>Findings</h2>\n<pre>{}</pre>\n",
                encode_text(&findings)
            ));
        }
        OutcomeResult::Failure(failure) => {
            sections.push(format!(
                "<h2 class=\"error\">{}</h2>\n<p>Stage: <code>{}</code></p>\n<pre>{}</pre>\n",
                encode_text(&failure.error),
                failure.stage,
                encode_text(&failure.details)
            ));
        }
    }

    if !outcome.timings_ms.is_empty() {
        let items: String = outcome
            .timings_ms
            .iter()
            .map(|(stage, ms)| format!("<li>{}: {} ms</li>\n", stage, ms))
            .collect();
        sections.push(format!("<h2>Timings</h2>\n<ul>\n{}</ul>\n", items));
    }

    if !outcome.logs.is_empty() {
        let lines: String = outcome
            .logs
            .iter()
            .map(|entry| {
                let class = match entry.level {
                    LogLevel::Info => "info",
                    LogLevel::Warn => "warn",
                };
                format!(
                    "<span class=\"{}\">{} {}</span>\n",
                    class,
                    entry.timestamp.format("%H:%M:%S%.3f"),
                    encode_text(&entry.message)
                )
            })
            .collect();
        sections.push(format!("<h2>Log</h2>\n<pre>{}</pre>\n", lines));
    }

    sections.concat()
}
