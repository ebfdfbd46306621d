//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command, which expands the matrix,
//! executes this runner's jobs in parallel and reports their results.
//!
//! 此模块实现 `run` 命令：展开矩阵，并行执行此运行器的作业并报告结果。

use anyhow::{Context, Result};
use colored::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::{env, fs};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    cli::{RunArgs, commands::load_config_and_locale},
    core::{execution::run_matrix, models::JobResult, planner},
    infra::t,
    reporting::{generate_html_report, generate_json_report, print_failure_details, print_summary},
};

/// Executes the run command with the provided arguments.
///
/// # Returns
/// The process exit code: success when every executed job passed; the job's
/// own exit code when exactly one job ran; failure otherwise.
pub async fn execute(args: RunArgs, language_override: Option<String>) -> Result<ExitCode> {
    let (matrix_config, config_path, locale) =
        load_config_and_locale(&args.config, language_override)?;

    let project_root = fs::canonicalize(&args.project_dir).with_context(|| {
        t!("project_dir_not_found", locale = &locale, path = args.project_dir.display())
    })?;

    println!(
        "{}",
        t!("loading_matrix", locale = &locale, path = config_path.display())
    );
    println!(
        "{}",
        t!("project_root_detected", locale = &locale, path = project_root.display())
    );

    if !matrix_config.reference_version_declared() {
        println!(
            "{}",
            t!(
                "reference_version_missing",
                locale = &locale,
                version = &matrix_config.reference_version
            )
            .yellow()
        );
    }

    let plan = planner::plan_execution(
        &matrix_config,
        args.all_os,
        args.total_runners,
        args.runner_index,
    )?;

    println!(
        "{}",
        t!("current_os", locale = &locale, os = env::consts::OS).cyan()
    );
    if plan.filtered_os_count > 0 {
        println!(
            "{}",
            t!(
                "filtered_os_jobs",
                locale = &locale,
                filtered = plan.filtered_os_count,
                total = plan.matrix_size
            )
            .cyan()
        );
    }

    if let (Some(total), Some(index)) = (args.total_runners, args.runner_index) {
        println!(
            "{}",
            t!(
                "running_as_split_runner",
                locale = &locale,
                index = index + 1,
                total = total,
                count = plan.jobs.len()
            )
            .bold()
        );
    } else {
        println!(
            "{}",
            t!("running_as_single_runner", locale = &locale, count = plan.jobs.len()).bold()
        );
    }

    if plan.jobs.is_empty() {
        println!("{}", t!("no_jobs_to_run", locale = &locale).green());
        return Ok(ExitCode::SUCCESS);
    }

    let stop_token = setup_signal_handler(&locale);
    let parallelism = args.jobs.unwrap_or(num_cpus::get() / 2 + 1);

    let results = run_matrix(
        plan.jobs,
        Arc::new(matrix_config),
        project_root,
        parallelism,
        stop_token,
    )
    .await;

    print_summary(&results, &locale);

    if let Some(report_path) = &args.html {
        println!(
            "\n{}",
            t!("generating_html_report", locale = &locale, path = report_path.display())
        );
        if let Err(e) = generate_html_report(&results, report_path, &locale) {
            eprintln!("{} {:#}", t!("report_failed", locale = &locale).red(), e);
        }
    }
    if let Some(report_path) = &args.json {
        println!(
            "\n{}",
            t!("generating_json_report", locale = &locale, path = report_path.display())
        );
        if let Err(e) = generate_json_report(&results, report_path) {
            eprintln!("{} {:#}", t!("report_failed", locale = &locale).red(), e);
        }
    }

    let failures: Vec<&JobResult> = results.iter().filter(|r| !r.is_passed()).collect();
    if failures.is_empty() {
        println!("\n{}", t!("all_jobs_passed", locale = &locale).green().bold());
        return Ok(ExitCode::SUCCESS);
    }

    let failed: Vec<&JobResult> = failures.iter().copied().filter(|r| r.is_failure()).collect();
    print_failure_details(&failed, &locale);
    println!(
        "\n{}",
        t!("jobs_failed", locale = &locale, count = failures.len()).red().bold()
    );

    Ok(exit_code_for(&results))
}

/// With a single job the process reports that job's own exit status, so a
/// one-job-per-worker CI setup sees the test runner's code.
pub fn exit_code_for(results: &[JobResult]) -> ExitCode {
    match results {
        [] => ExitCode::SUCCESS,
        [only] => ExitCode::from(u8::try_from(only.exit_code()).unwrap_or(1)),
        many if many.iter().all(JobResult::is_passed) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
                token_clone.cancel();
            }
            Err(e) => eprintln!("{}", t!("signal_handler_failed", locale = &locale, error = e)),
        }
    });

    token
}
