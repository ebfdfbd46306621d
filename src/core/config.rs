//! # Configuration Module / 配置模块
//!
//! Defines the `CiMatrix.toml` configuration surface: the three matrix axes,
//! the reference version that gates coverage upload, the fixed dependency set
//! and the command templates for each pipeline step.
//!
//! 定义 `CiMatrix.toml` 配置：三个矩阵轴、控制覆盖率上传的参考版本、
//! 固定的依赖集合以及每个流水线步骤的命令模板。

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::infra::t;

/// The three axes of the job matrix, in declaration order.
/// 作业矩阵的三个轴，按声明顺序排列。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatrixAxes {
    /// Target operating system identifiers (e.g. "ubuntu-latest").
    /// 目标操作系统标识符（例如 "ubuntu-latest"）。
    #[serde(default)]
    pub os: Vec<String>,
    /// Interpreter version strings (e.g. "3.7").
    /// 解释器版本字符串（例如 "3.7"）。
    #[serde(default)]
    pub py_vers: Vec<String>,
    /// Opaque test-group expressions, passed verbatim to the test command.
    /// 不透明的测试组表达式，原样传递给测试命令。
    #[serde(default)]
    pub test: Vec<String>,
}

/// The dependency set installed identically into every job's environment.
/// 以相同方式安装到每个作业环境中的依赖集合。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DependencySet {
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default)]
    pub channel_packages: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

impl Default for DependencySet {
    fn default() -> Self {
        Self {
            packages: default_packages(),
            channel: default_channel(),
            channel_packages: vec![],
            requirements: vec![],
        }
    }
}

/// Command templates for each step of a job's pipeline.
/// Placeholders such as `{version}` or `{test}` are filled in per job.
///
/// 作业流水线中每个步骤的命令模板。
/// `{version}` 或 `{test}` 等占位符会针对每个作业进行填充。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StepCommands {
    #[serde(default = "default_provision")]
    pub provision: Vec<String>,
    #[serde(default = "default_install")]
    pub install: Vec<String>,
    #[serde(default = "default_test")]
    pub test: String,
    #[serde(default = "default_coverage")]
    pub coverage: Vec<String>,
}

impl Default for StepCommands {
    fn default() -> Self {
        Self {
            provision: default_provision(),
            install: default_install(),
            test: default_test(),
            coverage: default_coverage(),
        }
    }
}

/// The entire matrix configuration, loaded from a TOML file.
/// 从 TOML 文件加载的完整矩阵配置。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatrixConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,

    /// Jobs on this interpreter version upload coverage.
    /// 此解释器版本的作业会上传覆盖率。
    pub reference_version: String,

    /// An optional bound on the wall-clock time of a whole job, in seconds.
    /// 整个作业运行时间的可选上限（秒）。
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Copy the project into each job's workspace before running it.
    /// 在运行之前将项目复制到每个作业的工作区中。
    #[serde(default)]
    pub isolate: bool,

    pub matrix: MatrixAxes,

    #[serde(default)]
    pub dependencies: DependencySet,

    #[serde(default)]
    pub steps: StepCommands,
}

impl MatrixConfig {
    /// Checks the invariants the expander relies on: non-empty axes with
    /// unique, non-blank values, and a usable reference version.
    pub fn validate(&self) -> Result<()> {
        check_axis("os", &self.matrix.os)?;
        check_axis("py_vers", &self.matrix.py_vers)?;
        check_axis("test", &self.matrix.test)?;

        if self.reference_version.trim().is_empty() {
            bail!(t!("config.blank_reference_version"));
        }
        if self.steps.test.trim().is_empty() {
            bail!(t!("config.blank_test_command"));
        }
        Ok(())
    }

    /// Whether any job in the matrix will upload coverage.
    pub fn reference_version_declared(&self) -> bool {
        self.matrix.py_vers.iter().any(|v| v == &self.reference_version)
    }
}

fn check_axis(name: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        bail!(t!("config.empty_axis", axis = name));
    }
    let mut seen = HashSet::new();
    for value in values {
        if value.trim().is_empty() {
            bail!(t!("config.blank_axis_value", axis = name));
        }
        if !seen.insert(value.as_str()) {
            bail!(t!("config.duplicate_axis_value", axis = name, value = value));
        }
    }
    Ok(())
}

/// Reads, parses and validates a matrix configuration file.
/// 读取、解析并验证矩阵配置文件。
pub fn load_matrix_config(path: &Path) -> Result<MatrixConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| t!("config.read_failed", path = path.display()))?;
    let config: MatrixConfig =
        toml::from_str(&content).with_context(|| t!("config.parse_failed", path = path.display()))?;
    config.validate()?;
    Ok(config)
}

fn default_language() -> String {
    "en".to_string()
}

fn default_packages() -> Vec<String> {
    ["numpy", "scipy", "matplotlib", "ipython", "h5py"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_channel() -> String {
    "conda-forge".to_string()
}

fn default_provision() -> Vec<String> {
    vec!["conda create --yes --quiet --name {env} python={version}".to_string()]
}

fn default_install() -> Vec<String> {
    vec![
        "conda install --yes --quiet --name {env} {packages}".to_string(),
        "conda install --yes --quiet --name {env} -c {channel} {channel_packages}".to_string(),
        "conda run --name {env} pip install {requirements}".to_string(),
        "conda run --name {env} pip install -e .".to_string(),
    ]
}

fn default_test() -> String {
    "conda run --name {env} pytest {test} --cov-report=xml".to_string()
}

fn default_coverage() -> Vec<String> {
    vec!["conda run --name {env} codecov".to_string()]
}
