//! # Job Execution Engine Module / 作业执行引擎模块
//!
//! Runs a single job's four-step pipeline (provision, install, test, coverage)
//! with fail-fast semantics inside the job, and fans a set of jobs out in
//! parallel with no failure propagation between them.
//!
//! 运行单个作业的四步流水线（创建环境、安装依赖、测试、覆盖率），
//! 作业内部遇到失败立即停止；并行分发多个作业，作业之间互不影响。

use colored::*;
use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::MatrixConfig,
        models::{CoverageStatus, FailureReason, Job, JobResult, Step, StepFailure, StepRecord},
    },
    infra::{
        command::{self, TemplateContext},
        fs::JobWorkspace,
        t,
    },
};

/// The main entry point for running a single job.
/// It wraps the pipeline with the configured job timeout. Every failure is
/// captured in the returned `JobResult`; nothing here aborts other jobs.
///
/// # Arguments
/// * `job` - The job to execute
/// * `config` - The matrix configuration (steps, dependencies, timeout)
/// * `project_root` - Path to the project under test
pub async fn run_job(job: Job, config: &MatrixConfig, project_root: &Path) -> JobResult {
    let start_time = Instant::now();
    println!("{}", t!("run.job_started", job = job).blue());

    let workspace = match JobWorkspace::create(&job, project_root, config.isolate) {
        Ok(workspace) => workspace,
        Err(e) => {
            let record = StepRecord {
                step: Step::ProvisionEnvironment,
                passed: false,
                exit_code: None,
                output: format!("{e:#}"),
                duration: start_time.elapsed(),
            };
            return finish_failed(job, vec![record], FailureReason::Provisioning, start_time);
        }
    };

    let mut steps = Vec::new();
    let outcome = {
        let pipeline = run_pipeline(&job, config, &workspace, &mut steps);
        match config.timeout_secs.map(Duration::from_secs) {
            Some(limit) => match tokio::time::timeout(limit, pipeline).await {
                Ok(outcome) => Some(outcome),
                Err(_) => None,
            },
            None => Some(pipeline.await),
        }
    };

    match outcome {
        Some(Ok(coverage)) => {
            let duration = start_time.elapsed();
            println!(
                "{}",
                t!("run.job_passed", job = job, duration = format!("{:.2}", duration.as_secs_f64()))
                    .green()
            );
            JobResult::Passed {
                job,
                steps,
                coverage,
                duration,
            }
        }
        Some(Err(failure)) => {
            let reason = failure.reason().unwrap_or(FailureReason::TestFailed);
            finish_failed(job, steps, reason, start_time)
        }
        None => {
            // The pipeline future was dropped, killing the running process.
            let timed_out_step = Step::SEQUENCE
                .get(steps.len())
                .copied()
                .unwrap_or(Step::UploadCoverage);
            let limit = config.timeout_secs.unwrap_or_default();
            steps.push(StepRecord {
                step: timed_out_step,
                passed: false,
                exit_code: None,
                output: t!("run.job_timeout_message", timeout = limit).to_string(),
                duration: Duration::ZERO,
            });
            println!("{}", t!("run.job_timeout", job = job, timeout = limit).red());
            finish_failed(job, steps, FailureReason::Timeout, start_time)
        }
    }
}

fn finish_failed(
    job: Job,
    steps: Vec<StepRecord>,
    reason: FailureReason,
    start_time: Instant,
) -> JobResult {
    let duration = start_time.elapsed();
    println!(
        "{}",
        t!(
            "run.job_failed",
            job = job,
            reason = reason.label(&rust_i18n::locale()),
            duration = format!("{:.2}", duration.as_secs_f64())
        )
        .red()
    );
    let coverage = if job.uploads_coverage() {
        CoverageStatus::NotRun
    } else {
        CoverageStatus::NotApplicable
    };
    JobResult::Failed {
        job,
        steps,
        reason,
        coverage,
        duration,
    }
}

/// Runs the four steps in order. The first failing mandatory step ends the
/// pipeline; a failing coverage upload is logged and reported, not returned.
async fn run_pipeline(
    job: &Job,
    config: &MatrixConfig,
    workspace: &JobWorkspace,
    steps: &mut Vec<StepRecord>,
) -> Result<CoverageStatus, StepFailure> {
    let ctx = TemplateContext {
        job,
        dependencies: &config.dependencies,
        workspace: &workspace.root,
    };
    let dir = workspace.working_dir.as_path();

    run_step(Step::ProvisionEnvironment, &config.steps.provision, &ctx, dir, steps).await?;
    run_step(Step::InstallDependencies, &config.steps.install, &ctx, dir, steps).await?;
    run_step(
        Step::RunTests,
        std::slice::from_ref(&config.steps.test),
        &ctx,
        dir,
        steps,
    )
    .await?;

    if !job.uploads_coverage() {
        return Ok(CoverageStatus::NotApplicable);
    }

    match run_step(Step::UploadCoverage, &config.steps.coverage, &ctx, dir, steps).await {
        Ok(()) => Ok(CoverageStatus::Uploaded),
        Err(failure) => {
            println!(
                "{}",
                t!("run.coverage_upload_failed", job = job, error = &failure).yellow()
            );
            Ok(CoverageStatus::Failed(failure.to_string()))
        }
    }
}

/// Runs every command of one step, stopping at the first that fails.
/// Exactly one `StepRecord` is appended for the step.
async fn run_step(
    step: Step,
    templates: &[String],
    ctx: &TemplateContext<'_>,
    working_dir: &Path,
    steps: &mut Vec<StepRecord>,
) -> Result<(), StepFailure> {
    println!(
        "{}",
        t!("run.step_started", job = ctx.job, step = step.label(&rust_i18n::locale())).dimmed()
    );

    let start_time = Instant::now();
    let mut output = String::new();
    let mut exit_code = Some(0);

    for template in templates {
        let (cmd, rendered) = match command::prepare_command(template, ctx, working_dir) {
            Ok(prepared) => prepared,
            Err(e) => {
                let message = format!("{e:#}");
                output.push_str(&message);
                return Err(record_failure(step, None, message, output, start_time, steps));
            }
        };

        output.push_str(&format!("{} {}\n", t!("run.command_prefix"), rendered));
        let (status_res, command_output) = command::spawn_and_capture(cmd).await;
        output.push_str(&command_output);

        match status_res {
            Ok(status) if status.success() => exit_code = status.code(),
            Ok(status) => {
                let message = t!("run.command_failed", command = rendered, status = status).to_string();
                return Err(record_failure(step, status.code(), message, output, start_time, steps));
            }
            Err(e) => {
                let message = t!("run.command_spawn_failed", command = rendered, error = e).to_string();
                output.push_str(&message);
                output.push('\n');
                return Err(record_failure(step, None, message, output, start_time, steps));
            }
        }
    }

    steps.push(StepRecord {
        step,
        passed: true,
        exit_code,
        output,
        duration: start_time.elapsed(),
    });
    Ok(())
}

fn record_failure(
    step: Step,
    exit_code: Option<i32>,
    message: String,
    output: String,
    start_time: Instant,
    steps: &mut Vec<StepRecord>,
) -> StepFailure {
    steps.push(StepRecord {
        step,
        passed: false,
        exit_code,
        output,
        duration: start_time.elapsed(),
    });
    StepFailure {
        step,
        exit_code,
        message,
    }
}

/// Runs `jobs` in parallel, at most `parallelism` at a time.
///
/// Jobs never cancel each other: a failed job only affects its own result.
/// Cancelling `stop_token` aborts every job still running and reports it as
/// `Cancelled`. Results are returned in job index order.
///
/// 并行运行 `jobs`，同时最多运行 `parallelism` 个。
/// 作业之间不会相互取消；取消 `stop_token` 会中止所有仍在运行的作业。
pub async fn run_matrix(
    jobs: Vec<Job>,
    config: Arc<MatrixConfig>,
    project_root: PathBuf,
    parallelism: usize,
    stop_token: CancellationToken,
) -> Vec<JobResult> {
    let mut results = stream::iter(jobs.into_iter().map(|job| {
        let config = Arc::clone(&config);
        let project_root = project_root.clone();
        let stop_token = stop_token.clone();

        async move {
            if stop_token.is_cancelled() {
                return JobResult::Cancelled { job };
            }

            let job_for_task = job.clone();
            let mut handle = tokio::spawn(async move {
                run_job(job_for_task, &config, &project_root).await
            });

            tokio::select! {
                biased;
                _ = stop_token.cancelled() => {
                    handle.abort();
                    JobResult::Cancelled { job }
                }
                joined = &mut handle => match joined {
                    Ok(result) => result,
                    Err(e) => {
                        let record = StepRecord {
                            step: Step::ProvisionEnvironment,
                            passed: false,
                            exit_code: None,
                            output: t!("run.job_task_failed", error = e).to_string(),
                            duration: Duration::ZERO,
                        };
                        JobResult::Failed {
                            coverage: if job.uploads_coverage() {
                                CoverageStatus::NotRun
                            } else {
                                CoverageStatus::NotApplicable
                            },
                            job,
                            steps: vec![record],
                            reason: FailureReason::Provisioning,
                            duration: Duration::ZERO,
                        }
                    }
                },
            }
        }
    }))
    .buffer_unordered(parallelism.max(1))
    .collect::<Vec<JobResult>>()
    .await;

    results.sort_by_key(|result| result.job().index);
    results
}
