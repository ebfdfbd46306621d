//! # Matrix Planner Module / 矩阵计划模块
//!
//! Expands the configured axes into the job matrix and narrows it down to the
//! jobs this runner executes: jobs for the host operating system, then the
//! shard assigned to this runner when the matrix is split across CI workers.
//!
//! 将配置的轴展开为作业矩阵，并将其缩小到此运行器执行的作业：
//! 首先筛选适用于主机操作系统的作业，然后在矩阵拆分到多个 CI 工作节点时选取分配给此运行器的分片。

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use std::env;

use crate::core::config::MatrixConfig;
use crate::core::models::Job;
use crate::infra::t;

/// Identifier prefixes that name a host OS family, as used by CI services.
static OS_ALIASES: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("ubuntu", "linux"),
        ("linux", "linux"),
        ("debian", "linux"),
        ("fedora", "linux"),
        ("macos", "macos"),
        ("osx", "macos"),
        ("darwin", "macos"),
        ("windows", "windows"),
        ("win", "windows"),
    ]
});

/// Produces the Cartesian product of the three axes.
///
/// The outer loop runs over `os_list`, then `version_list`, then `test_list`,
/// so the order follows axis declaration order and is reproducible.
///
/// 生成三个轴的笛卡尔积。
/// 外层循环遍历 `os_list`，然后是 `version_list`，最后是 `test_list`。
pub fn expand(
    os_list: &[String],
    version_list: &[String],
    test_list: &[String],
    reference_version: &str,
) -> Vec<Job> {
    let mut jobs = Vec::with_capacity(os_list.len() * version_list.len() * test_list.len());
    for os in os_list {
        for version in version_list {
            for test_group in test_list {
                jobs.push(Job {
                    index: jobs.len(),
                    os: os.clone(),
                    version: version.clone(),
                    test_group: test_group.clone(),
                    reference: version == reference_version,
                });
            }
        }
    }
    jobs
}

/// Expands the matrix declared in a configuration.
pub fn expand_config(config: &MatrixConfig) -> Vec<Job> {
    expand(
        &config.matrix.os,
        &config.matrix.py_vers,
        &config.matrix.test,
        &config.reference_version,
    )
}

/// Maps an os identifier such as "ubuntu-latest" to a host OS family
/// (`std::env::consts::OS` values). Returns `None` for unknown identifiers.
pub fn host_family(os: &str) -> Option<&'static str> {
    let os = os.trim().to_ascii_lowercase();
    for family in ["linux", "macos", "windows", "freebsd", "netbsd", "openbsd"] {
        if os == family {
            return Some(family);
        }
    }
    OS_ALIASES
        .iter()
        .find(|(prefix, _)| os.starts_with(prefix))
        .map(|(_, family)| *family)
}

/// Whether a job declared for `os` can run on the current host.
pub fn matches_host(os: &str) -> bool {
    host_family(os) == Some(env::consts::OS)
}

/// The jobs this runner executes, plus what was left out and why.
/// 此运行器执行的作业，以及被排除的作业数量。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// Jobs to execute, in expansion order.
    /// 要执行的作业，按展开顺序排列。
    pub jobs: Vec<Job>,
    /// Size of the full matrix before any filtering.
    /// 过滤前完整矩阵的大小。
    pub matrix_size: usize,
    /// Jobs excluded because their os does not match the host.
    /// 由于操作系统与主机不匹配而被排除的作业数量。
    pub filtered_os_count: usize,
    /// Whether the jobs are a shard of a distributed run.
    /// 作业是否为分布式运行的一个分片。
    pub is_distributed: bool,
}

/// Creates an execution plan for the given configuration.
///
/// # Arguments
/// * `config` - The validated matrix configuration
/// * `all_os` - Run jobs for every os, not only the host's
/// * `total_runners` - Optional total number of runners for distributed execution
/// * `runner_index` - Optional index of this runner (0-based)
pub fn plan_execution(
    config: &MatrixConfig,
    all_os: bool,
    total_runners: Option<usize>,
    runner_index: Option<usize>,
) -> Result<ExecutionPlan> {
    let jobs = expand_config(config);
    let matrix_size = jobs.len();

    // Sharding is computed over the full matrix so that every runner agrees on
    // job ownership regardless of its own host.
    let (jobs, is_distributed) = match (total_runners, runner_index) {
        (Some(total), Some(index)) => {
            if total == 0 || index >= total {
                bail!(t!("plan.invalid_runner_index", index = index, total = total));
            }
            let shard = jobs
                .into_iter()
                .filter(|job| job.index % total == index)
                .collect::<Vec<_>>();
            (shard, true)
        }
        (None, None) => (jobs, false),
        _ => bail!(t!("plan.runner_flags_incomplete")),
    };

    let (jobs, filtered): (Vec<_>, Vec<_>) = if all_os {
        (jobs, vec![])
    } else {
        jobs.into_iter().partition(|job| matches_host(&job.os))
    };

    Ok(ExecutionPlan {
        jobs,
        matrix_size,
        filtered_os_count: filtered.len(),
        is_distributed,
    })
}
