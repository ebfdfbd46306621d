//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for ci-matrix: command
//! rendering and execution, and per-job workspaces.
//!
//! 此模块为 ci-matrix 提供基础设施服务：命令渲染与执行，以及每个作业的工作区。

pub mod command;
pub mod fs;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
