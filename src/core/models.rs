//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the runner:
//! jobs produced by matrix expansion, the pipeline steps every job runs, and
//! the per-step and per-job results collected for reporting.
//!
//! 此模块定义了整个运行器中使用的核心数据结构：
//! 矩阵展开产生的作业、每个作业运行的流水线步骤，以及为报告收集的步骤和作业结果。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::infra::t;

/// Exit code reported for a job that was cancelled by the operator.
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// One concrete combination of axis values, executed as an isolated unit of work.
/// 轴值的一个具体组合，作为一个独立的工作单元执行。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    /// Position of the job in expansion order (0-based).
    /// 作业在展开顺序中的位置（从 0 开始）。
    pub index: usize,
    pub os: String,
    pub version: String,
    /// Passed through verbatim to the test command.
    /// 原样传递给测试命令。
    pub test_group: String,
    /// `true` when `version` equals the configured reference version.
    /// 当 `version` 等于配置的参考版本时为 `true`。
    pub reference: bool,
}

impl Job {
    /// A stable, human-readable identifier used in logs and reports.
    pub fn id(&self) -> String {
        format!("{} / {} / {}", self.os, self.version, self.test_group)
    }

    /// A name safe to use for an environment or a directory.
    pub fn env_name(&self) -> String {
        let version = self
            .version
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect::<String>();
        format!("ci-matrix-{}-{}", self.index, version)
    }

    /// Whether this job uploads coverage once its tests pass.
    pub fn uploads_coverage(&self) -> bool {
        self.reference
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.id())
    }
}

/// The fixed sequence of steps every job runs.
/// 每个作业运行的固定步骤序列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ProvisionEnvironment,
    InstallDependencies,
    RunTests,
    UploadCoverage,
}

impl Step {
    /// All steps in execution order.
    pub const SEQUENCE: [Step; 4] = [
        Step::ProvisionEnvironment,
        Step::InstallDependencies,
        Step::RunTests,
        Step::UploadCoverage,
    ];

    /// The failure a non-zero exit of this step causes. Coverage upload fails
    /// soft, so it has none.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Step::ProvisionEnvironment => Some(FailureReason::Provisioning),
            Step::InstallDependencies => Some(FailureReason::Dependency),
            Step::RunTests => Some(FailureReason::TestFailed),
            Step::UploadCoverage => None,
        }
    }

    pub fn label(&self, locale: &str) -> String {
        match self {
            Step::ProvisionEnvironment => t!("step.provision", locale = locale).to_string(),
            Step::InstallDependencies => t!("step.install", locale = locale).to_string(),
            Step::RunTests => t!("step.test", locale = locale).to_string(),
            Step::UploadCoverage => t!("step.coverage", locale = locale).to_string(),
        }
    }
}

/// Enumerates the job-fatal failure kinds.
/// 枚举导致作业失败的错误类型。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The interpreter environment could not be provisioned.
    /// 无法创建解释器环境。
    Provisioning,
    /// Dependency resolution or installation failed.
    /// 依赖解析或安装失败。
    Dependency,
    /// One or more tests failed.
    /// 一个或多个测试失败。
    TestFailed,
    /// The job exceeded its configured timeout.
    /// 作业超出了配置的超时时间。
    Timeout,
}

impl FailureReason {
    pub fn label(&self, locale: &str) -> String {
        match self {
            FailureReason::Provisioning => t!("reason.provisioning", locale = locale).to_string(),
            FailureReason::Dependency => t!("reason.dependency", locale = locale).to_string(),
            FailureReason::TestFailed => t!("reason.test_failed", locale = locale).to_string(),
            FailureReason::Timeout => t!("reason.timeout", locale = locale).to_string(),
        }
    }
}

/// A step that did not succeed, carried inside the pipeline until it is
/// folded into a `JobResult`.
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub step: Step,
    pub exit_code: Option<i32>,
    pub message: String,
}

impl StepFailure {
    /// The job-level failure this causes; `None` for soft failures.
    pub fn reason(&self) -> Option<FailureReason> {
        self.step.failure_reason()
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "{:?} exited with {}: {}", self.step, code, self.message),
            None => write!(f, "{:?} failed: {}", self.step, self.message),
        }
    }
}

impl std::error::Error for StepFailure {}

/// The record of one executed step.
/// 一个已执行步骤的记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub passed: bool,
    /// `None` when the process could not be spawned or was killed.
    /// 当进程无法启动或被终止时为 `None`。
    pub exit_code: Option<i32>,
    pub output: String,
    pub duration: Duration,
}

/// Outcome of the coverage upload step.
/// 覆盖率上传步骤的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "message")]
pub enum CoverageStatus {
    /// The job is not on the reference version.
    NotApplicable,
    /// The job is on the reference version but its tests did not pass.
    NotRun,
    Uploaded,
    /// Upload failed. Soft: the job status is unaffected.
    Failed(String),
}

impl CoverageStatus {
    pub fn label(&self, locale: &str) -> String {
        match self {
            CoverageStatus::NotApplicable => "-".to_string(),
            CoverageStatus::NotRun => t!("coverage.not_run", locale = locale).to_string(),
            CoverageStatus::Uploaded => t!("coverage.uploaded", locale = locale).to_string(),
            CoverageStatus::Failed(_) => t!("coverage.failed", locale = locale).to_string(),
        }
    }
}

/// Represents the final result of a single job.
/// 表示单个作业的最终结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobResult {
    /// Every mandatory step passed.
    /// 所有必需步骤均已通过。
    Passed {
        job: Job,
        steps: Vec<StepRecord>,
        coverage: CoverageStatus,
        duration: Duration,
    },
    /// A job-fatal step failed; later steps did not run.
    /// 某个致命步骤失败；后续步骤未运行。
    Failed {
        job: Job,
        steps: Vec<StepRecord>,
        reason: FailureReason,
        coverage: CoverageStatus,
        duration: Duration,
    },
    /// The job was stopped by the operator before it finished.
    /// 作业在完成之前被操作员停止。
    Cancelled { job: Job },
}

impl JobResult {
    pub fn job(&self) -> &Job {
        match self {
            JobResult::Passed { job, .. }
            | JobResult::Failed { job, .. }
            | JobResult::Cancelled { job } => job,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, JobResult::Passed { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobResult::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobResult::Cancelled { .. })
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            JobResult::Failed { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn steps(&self) -> &[StepRecord] {
        match self {
            JobResult::Passed { steps, .. } | JobResult::Failed { steps, .. } => steps,
            JobResult::Cancelled { .. } => &[],
        }
    }

    pub fn coverage(&self) -> CoverageStatus {
        match self {
            JobResult::Passed { coverage, .. } | JobResult::Failed { coverage, .. } => {
                coverage.clone()
            }
            JobResult::Cancelled { job } if job.uploads_coverage() => CoverageStatus::NotRun,
            JobResult::Cancelled { .. } => CoverageStatus::NotApplicable,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            JobResult::Passed { duration, .. } | JobResult::Failed { duration, .. } => {
                Some(*duration)
            }
            JobResult::Cancelled { .. } => None,
        }
    }

    /// Whether the given step ran at all.
    pub fn ran_step(&self, step: Step) -> bool {
        self.steps().iter().any(|r| r.step == step)
    }

    /// The job's exit status: the exit status of its `run_tests` step.
    /// Jobs that failed without a test exit code report 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            JobResult::Passed { .. } => 0,
            JobResult::Failed { steps, .. } => steps
                .iter()
                .find(|r| r.step == Step::RunTests)
                .and_then(|r| r.exit_code)
                .filter(|code| *code != 0)
                .unwrap_or(1),
            JobResult::Cancelled { .. } => CANCELLED_EXIT_CODE,
        }
    }

    /// Combined output of every step that failed.
    pub fn failure_output(&self) -> String {
        self.steps()
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.output.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Gets the appropriate CSS class for the job status.
    pub fn get_status_class(&self) -> &'static str {
        match self {
            JobResult::Passed { .. } => "status-Passed",
            JobResult::Failed {
                reason: FailureReason::Timeout,
                ..
            } => "status-Timeout",
            JobResult::Failed { .. } => "status-Failed",
            JobResult::Cancelled { .. } => "status-Cancelled",
        }
    }

    /// Gets the status of the job as a string for display.
    /// 以字符串形式获取作业的状态以供显示。
    pub fn get_status_str(&self, locale: &str) -> String {
        match self {
            JobResult::Passed { .. } => t!("report.status_passed", locale = locale).to_string(),
            JobResult::Failed {
                reason: FailureReason::Timeout,
                ..
            } => t!("report.status_timeout", locale = locale).to_string(),
            JobResult::Failed { .. } => t!("report.status_failed", locale = locale).to_string(),
            JobResult::Cancelled { .. } => {
                t!("report.status_cancelled", locale = locale).to_string()
            }
        }
    }
}
