//! # JSON Reporting Module / JSON 报告模块
//!
//! Writes a machine-readable report so an orchestrating CI system can read
//! each job's outcome independently.
//!
//! 输出机器可读的报告，以便编排 CI 系统独立读取每个作业的结果。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::models::{CoverageStatus, FailureReason, JobResult, Step};
use crate::infra::t;

#[derive(Debug, Serialize)]
pub struct MatrixReport {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub jobs: Vec<JobReport>,
}

#[derive(Debug, Serialize)]
pub struct JobReport {
    pub index: usize,
    pub os: String,
    pub version: String,
    pub test_group: String,
    pub status: &'static str,
    pub reason: Option<FailureReason>,
    pub exit_code: i32,
    pub coverage: CoverageStatus,
    pub duration_secs: Option<f64>,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub passed: bool,
    pub exit_code: Option<i32>,
    pub duration_secs: f64,
}

impl From<&JobResult> for JobReport {
    fn from(result: &JobResult) -> Self {
        let job = result.job();
        let status = match result {
            JobResult::Passed { .. } => "passed",
            JobResult::Failed { .. } => "failed",
            JobResult::Cancelled { .. } => "cancelled",
        };
        Self {
            index: job.index,
            os: job.os.clone(),
            version: job.version.clone(),
            test_group: job.test_group.clone(),
            status,
            reason: result.reason(),
            exit_code: result.exit_code(),
            coverage: result.coverage(),
            duration_secs: result.duration().map(|d| d.as_secs_f64()),
            steps: result
                .steps()
                .iter()
                .map(|r| StepReport {
                    step: r.step,
                    passed: r.passed,
                    exit_code: r.exit_code,
                    duration_secs: r.duration.as_secs_f64(),
                })
                .collect(),
        }
    }
}

impl MatrixReport {
    pub fn new(results: &[JobResult]) -> Self {
        Self {
            generated_at: Utc::now(),
            total: results.len(),
            passed: results.iter().filter(|r| r.is_passed()).count(),
            failed: results.iter().filter(|r| r.is_failure()).count(),
            cancelled: results.iter().filter(|r| r.is_cancelled()).count(),
            jobs: results.iter().map(JobReport::from).collect(),
        }
    }
}

/// Writes the JSON report for `results` to `output_path`.
pub fn generate_json_report(results: &[JobResult], output_path: &Path) -> Result<()> {
    let report = MatrixReport::new(results);
    let content = serde_json::to_string_pretty(&report)?;
    fs::write(output_path, content)
        .with_context(|| t!("report.write_failed", path = output_path.display()))?;
    Ok(())
}
