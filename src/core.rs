//! # Core Module / 核心模块
//!
//! This module contains the core functionality of ci-matrix: configuration,
//! data models, matrix expansion and job execution.
//!
//! 此模块包含 ci-matrix 的核心功能：配置、数据模型、矩阵展开和作业执行。

pub mod config;
pub mod execution;
pub mod models;
pub mod planner;

// Re-exports
pub use config::MatrixConfig;
pub use execution::{run_job, run_matrix};
pub use models::{Job, JobResult};
pub use planner::expand;
