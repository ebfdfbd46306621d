//! # ci-matrix Library / ci-matrix 库
//!
//! This library provides the core functionality of the ci-matrix tool, a
//! configuration-driven CI job matrix runner. It expands operating system,
//! interpreter version and test-group axes into independent jobs and runs each
//! job's provision / install / test / coverage pipeline in isolation.
//!
//! 此库为 ci-matrix 工具提供核心功能，这是一个配置驱动的 CI 作业矩阵运行器。
//! 它将操作系统、解释器版本和测试组三个轴展开为独立的作业，
//! 并隔离地运行每个作业的 创建环境 / 安装依赖 / 测试 / 覆盖率 流水线。
//!
//! ## Modules / 模块
//!
//! - `core` - Configuration, data models, matrix expansion and job execution
//! - `infra` - Command rendering and execution, per-job workspaces
//! - `reporting` - Console, HTML and JSON reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 配置、数据模型、矩阵展开和作业执行
//! - `infra` - 命令渲染与执行、每个作业的工作区
//! - `reporting` - 控制台、HTML 和 JSON 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::execution;
pub use core::models;
pub use core::planner;

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");

/// The languages the runner's messages are available in.
pub fn available_languages() -> Vec<&'static str> {
    rust_i18n::available_locales!()
}

/// Picks the output language for a requested locale.
///
/// It attempts to match the full locale (e.g., "zh-CN"), then just the
/// language code (e.g., "en" from "en-US"), and finally falls back to "en".
pub fn resolve_locale(requested: &str) -> String {
    let available = available_languages();
    let requested = requested.replace('_', "-");

    if let Some(exact) = available.iter().find(|l| l.eq_ignore_ascii_case(&requested)) {
        return exact.to_string();
    }
    requested
        .split('-')
        .next()
        .and_then(|lang_code| available.iter().find(|l| l.eq_ignore_ascii_case(lang_code)))
        .map(|l| l.to_string())
        .unwrap_or_else(|| "en".to_string())
}

/// Initializes the application's internationalization (i18n).
///
/// Uses `requested` when given, otherwise the system locale, and returns the
/// language that was selected.
pub fn init(requested: Option<&str>) -> String {
    let locale = requested
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let lang = resolve_locale(&locale);
    rust_i18n::set_locale(&lang);
    lang
}
