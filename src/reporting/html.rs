//! # HTML Reporting Module / HTML 报告模块
//!
//! Renders a single self-contained HTML page with summary counts, one row per
//! job and the captured output of failed jobs.
//!
//! 生成一个独立的 HTML 页面，包含汇总统计、每个作业一行以及失败作业的捕获输出。

use anyhow::{Context, Result};
use chrono::Local;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

use crate::core::models::JobResult;
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2em; color: #24292f; }
h1 { font-weight: 600; }
.generated { color: #57606a; font-size: 0.9em; }
.summary-container { display: flex; gap: 1.5em; margin: 1.5em 0; }
.summary-item { display: flex; flex-direction: column; align-items: center; padding: 0.8em 1.4em; border: 1px solid #d0d7de; border-radius: 6px; }
.summary-item .count { font-size: 1.8em; font-weight: 600; }
.passed-text { color: #1a7f37; } .failed-text { color: #cf222e; } .cancelled-text { color: #6e7781; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #d0d7de; padding: 0.5em 0.7em; text-align: left; vertical-align: top; }
.status-cell { display: inline-block; padding: 0.15em 0.6em; border-radius: 1em; font-size: 0.85em; color: #fff; }
.status-Passed { background: #1a7f37; } .status-Failed { background: #cf222e; }
.status-Timeout { background: #bc4c00; } .status-Cancelled { background: #6e7781; }
.duration-cell { text-align: right; white-space: nowrap; }
.output-toggle { cursor: pointer; color: #0969da; font-size: 0.85em; margin-top: 0.3em; }
.output-content { background: #f6f8fa; padding: 1em; overflow-x: auto; white-space: pre-wrap; }
"#;

/// Embedded JavaScript for HTML report interactivity / HTML 报告交互性的嵌入式 JavaScript
const HTML_SCRIPT: &str = r#"
function toggleOutput(id) {
  var row = document.getElementById(id);
  row.style.display = row.style.display === 'none' ? 'table-row' : 'none';
}
"#;

/// Generates an HTML report from job results and writes it to `output_path`.
///
/// 从作业结果生成 HTML 报告并写入 `output_path`。
///
/// # Errors / 错误
/// Returns an error if the file cannot be written.
pub fn generate_html_report(results: &[JobResult], output_path: &Path, locale: &str) -> Result<()> {
    let page = render_html_report(results, locale);
    fs::write(output_path, page.into_string())
        .with_context(|| t!("report.write_failed", locale = locale, path = output_path.display()))?;
    Ok(())
}

/// Renders the report page.
pub fn render_html_report(results: &[JobResult], locale: &str) -> Markup {
    let passed = results.iter().filter(|r| r.is_passed()).count();
    let failed = results.iter().filter(|r| r.is_failure()).count();
    let cancelled = results.iter().filter(|r| r.is_cancelled()).count();
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string();

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                p class="generated" {
                    (t!("html_report.generated_at", locale = locale, time = generated_at))
                }
                div class="summary-container" {
                    (summary_item(results.len(), "", &t!("html_report.summary.total", locale = locale)))
                    (summary_item(passed, "passed-text", &t!("html_report.summary.passed", locale = locale)))
                    (summary_item(failed, "failed-text", &t!("html_report.summary.failed", locale = locale)))
                    (summary_item(cancelled, "cancelled-text", &t!("html_report.summary.cancelled", locale = locale)))
                }
                table {
                    thead {
                        tr {
                            th { "#" }
                            th { (t!("html_report.table.header.os", locale = locale)) }
                            th { (t!("html_report.table.header.version", locale = locale)) }
                            th { (t!("html_report.table.header.test", locale = locale)) }
                            th { (t!("html_report.table.header.status", locale = locale)) }
                            th class="duration-cell" { (t!("html_report.table.header.duration", locale = locale)) }
                            th { (t!("html_report.table.header.coverage", locale = locale)) }
                        }
                    }
                    tbody {
                        @for result in results {
                            (job_rows(result, locale))
                        }
                    }
                }
                script { (PreEscaped(HTML_SCRIPT)) }
            }
        }
    }
}

fn summary_item(count: usize, class: &str, label: &str) -> Markup {
    html! {
        div class="summary-item" {
            span class={ "count " (class) } { (count) }
            span class="label" { (label) }
        }
    }
}

fn job_rows(result: &JobResult, locale: &str) -> Markup {
    let job = result.job();
    let output_id = format!("output-{}", job.index);
    let duration_str = result
        .duration()
        .map(|d| format!("{:.2}s", d.as_secs_f64()))
        .unwrap_or_else(|| "N/A".to_string());

    html! {
        tr {
            td { (job.index) }
            td { (job.os) }
            td { (job.version) }
            td { code { (job.test_group) } }
            td {
                div class={ "status-cell " (result.get_status_class()) } {
                    (result.get_status_str(locale))
                }
                @if result.is_failure() {
                    div class="output-toggle" onclick={ "toggleOutput('" (output_id) "')" } {
                        (t!("html_report.toggle_output", locale = locale))
                    }
                }
            }
            td class="duration-cell" { (duration_str) }
            td { (result.coverage().label(locale)) }
        }
        @if result.is_failure() {
            tr id=(output_id) style="display:none;" {
                td colspan="7" {
                    pre class="output-content" { (result.failure_output()) }
                }
            }
        }
    }
}
