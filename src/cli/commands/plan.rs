//! # Plan Command Module / 计划命令模块
//!
//! Prints the expanded, filtered and sharded job list without running it.
//!
//! 打印展开、过滤和分片后的作业列表，但不运行。

use anyhow::Result;
use serde::Serialize;

use crate::{
    cli::{PlanArgs, commands::load_config_and_locale},
    core::{models::Job, planner},
    reporting::print_plan,
};

#[derive(Debug, Serialize)]
struct PlanDocument<'a> {
    matrix_size: usize,
    filtered_os_count: usize,
    is_distributed: bool,
    reference_version: &'a str,
    jobs: &'a [Job],
}

/// Executes the plan command.
pub fn execute(args: PlanArgs, language_override: Option<String>) -> Result<()> {
    let (matrix_config, _, locale) = load_config_and_locale(&args.config, language_override)?;
    let plan = planner::plan_execution(
        &matrix_config,
        args.all_os,
        args.total_runners,
        args.runner_index,
    )?;

    if args.json {
        let document = PlanDocument {
            matrix_size: plan.matrix_size,
            filtered_os_count: plan.filtered_os_count,
            is_distributed: plan.is_distributed,
            reference_version: &matrix_config.reference_version,
            jobs: &plan.jobs,
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print_plan(&plan, &locale);
    }
    Ok(())
}
