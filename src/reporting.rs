//! # Reporting Module / 报告模块
//!
//! This module handles the display and export of job results: colorful
//! console summaries, a styled HTML page and a machine-readable JSON file.
//!
//! 此模块处理作业结果的显示和导出：彩色控制台摘要、样式化 HTML 页面和机器可读的 JSON 文件。

pub mod console;
pub mod html;
pub mod json;

// Re-export common reporting functions
pub use console::{print_failure_details, print_plan, print_summary};
pub use html::generate_html_report;
pub use json::generate_json_report;
