//! # Console Reporting Module / 控制台报告模块
//!
//! Prints the job summary table and the details of failed jobs.
//!
//! 打印作业摘要表以及失败作业的详细信息。

use colored::*;

use crate::core::models::{JobResult, Step};
use crate::core::planner::ExecutionPlan;
use crate::infra::t;

/// Prints the planned jobs as a table, without running anything.
///
/// # Output Format / 输出格式
/// ```text
///   #   | OS               | Version  | Coverage | Test group
///   0   | ubuntu-latest    | 3.7      | yes      | tests/base
/// ```
pub fn print_plan(plan: &ExecutionPlan, locale: &str) {
    println!(
        "{}",
        t!(
            "plan.header",
            locale = locale,
            count = plan.jobs.len(),
            total = plan.matrix_size
        )
        .bold()
    );
    println!(
        "  {:<5} | {:<16} | {:<8} | {:<8} | {}",
        "#",
        t!("plan.column_os", locale = locale),
        t!("plan.column_version", locale = locale),
        t!("plan.column_coverage", locale = locale),
        t!("plan.column_test", locale = locale)
    );
    for job in &plan.jobs {
        let coverage = if job.uploads_coverage() {
            t!("plan.yes", locale = locale).green()
        } else {
            t!("plan.no", locale = locale).dimmed()
        };
        println!(
            "  {:<5} | {:<16} | {:<8} | {:<8} | {}",
            job.index, job.os, job.version, coverage, job.test_group
        );
    }
}

/// Prints a formatted summary of job results to the console.
///
/// 在控制台打印格式化的作业结果摘要。
///
/// # Output Format / 输出格式
/// ```text
/// --- Matrix Summary ---
///   - Passed     | ubuntu-latest / 3.7 / tests/base          |      1.23s | uploaded
///   - Failed     | ubuntu-latest / 3.8 / tests/em            |      0.45s | -
/// ```
pub fn print_summary(results: &[JobResult], locale: &str) {
    println!("\n{}", t!("summary_banner", locale = locale).bold());

    for result in results {
        let status_str = result.get_status_str(locale);
        let status_colored = match result {
            JobResult::Passed { .. } => status_str.green(),
            JobResult::Failed { .. } => status_str.red(),
            JobResult::Cancelled { .. } => status_str.dimmed(),
        };
        let duration_str = result
            .duration()
            .map(|d| format!("{:.2}s", d.as_secs_f64()))
            .unwrap_or_else(|| "N/A".to_string());

        println!(
            "  - {:<10} | {:<40} | {:>10} | {}",
            status_colored,
            result.job().id(),
            duration_str,
            result.coverage().label(locale)
        );
    }

    let passed = results.iter().filter(|r| r.is_passed()).count();
    let failed = results.iter().filter(|r| r.is_failure()).count();
    let cancelled = results.iter().filter(|r| r.is_cancelled()).count();
    println!(
        "\n{}",
        t!(
            "summary_counts",
            locale = locale,
            total = results.len(),
            passed = passed,
            failed = failed,
            cancelled = cancelled
        )
    );
}

/// Prints the captured output of every failed job, step by step.
///
/// 打印每个失败作业的捕获输出。
pub fn print_failure_details(failures: &[&JobResult], locale: &str) {
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        let reason = result
            .reason()
            .map(|r| r.label(locale))
            .unwrap_or_default();
        println!(
            "[{}/{}] {} '{}' ({})",
            i + 1,
            failures.len(),
            t!("report_header_failure", locale = locale).red(),
            result.job().id().cyan(),
            reason
        );

        for record in result.steps().iter().filter(|r| !r.passed) {
            println!("\n--- {} ---\n", log_header(record.step, locale).yellow());
            println!("{}", record.output.trim_end());
        }
        println!("\n{}", "-".repeat(80));
    }
}

fn log_header(step: Step, locale: &str) -> String {
    t!("step_log", locale = locale, step = step.label(locale)).to_string()
}
