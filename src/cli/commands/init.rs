//! # Matrix Initialization Module / 矩阵初始化模块
//!
//! Creates a starter `CiMatrix.toml`, either from defaults or through an
//! interactive command-line wizard.
//!
//! 通过默认值或交互式命令行向导创建初始的 `CiMatrix.toml`。
//!
//! ## Features / 功能特性
//!
//! - **Interactive Wizard**: prompts for each axis and the reference version
//! - **Project Detection**: test directories and requirements files found in the current directory become defaults
//! - **Overwrite Protection**: refuses to replace an existing file without `--force` or confirmation
//!
//! - **交互式向导**: 逐个提示输入各个轴和参考版本
//! - **项目检测**: 当前目录中找到的测试目录和依赖文件将作为默认值
//! - **覆盖保护**: 没有 `--force` 或确认时拒绝替换已有文件

use anyhow::{Context, Result, bail};
use colored::*;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::fs;
use std::path::Path;

use crate::cli::InitArgs;
use crate::core::config::{DependencySet, MatrixAxes, MatrixConfig, StepCommands};
use crate::infra::t;

/// Executes the init command.
pub fn execute(args: InitArgs, language: &str) -> Result<()> {
    let theme = ColorfulTheme::default();

    if !args.non_interactive {
        println!("\n{}", t!("init.wizard_welcome", locale = language).cyan().bold());
        println!("{}", t!("init.wizard_description", locale = language));
    }

    if args.output.exists() && !args.force {
        if args.non_interactive {
            bail!(
                "{} {}",
                t!("init.file_exists", locale = language, path = args.output.display()),
                t!("init.use_force", locale = language)
            );
        }
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = language, path = args.output.display()))
            .default(false)
            .interact()
            .context(t!("init.user_input_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let default_config = default_matrix_config(Path::new("."), language);
    let final_config = if args.non_interactive {
        default_config
    } else {
        run_wizard(default_config, &theme, language)?
    };

    write_config(&args.output, &final_config, language)
}

fn run_wizard(defaults: MatrixConfig, theme: &ColorfulTheme, language: &str) -> Result<MatrixConfig> {
    let input_failed = || t!("init.user_input_failed", locale = language).to_string();

    let os: String = Input::with_theme(theme)
        .with_prompt(t!("init.os_prompt", locale = language))
        .default(defaults.matrix.os.join(", "))
        .interact_text()
        .with_context(input_failed)?;
    let py_vers: String = Input::with_theme(theme)
        .with_prompt(t!("init.versions_prompt", locale = language))
        .default(defaults.matrix.py_vers.join(", "))
        .interact_text()
        .with_context(input_failed)?;
    let test: String = Input::with_theme(theme)
        .with_prompt(t!("init.tests_prompt", locale = language))
        .default(defaults.matrix.test.join(", "))
        .interact_text()
        .with_context(input_failed)?;

    let matrix = MatrixAxes {
        os: split_list(&os),
        py_vers: split_list(&py_vers),
        test: split_list(&test),
    };

    let reference_version = match matrix.py_vers.as_slice() {
        [] => defaults.reference_version.clone(),
        [only] => only.clone(),
        versions => {
            let selection = Select::with_theme(theme)
                .with_prompt(t!("init.reference_prompt", locale = language))
                .items(versions)
                .default(0)
                .interact()
                .with_context(input_failed)?;
            versions[selection].clone()
        }
    };

    let isolate = Confirm::with_theme(theme)
        .with_prompt(t!("init.isolate_prompt", locale = language))
        .default(defaults.isolate)
        .interact()
        .with_context(input_failed)?;

    let config = MatrixConfig {
        reference_version,
        isolate,
        matrix,
        ..defaults
    };
    config.validate()?;
    Ok(config)
}

/// The configuration written by `init --non-interactive`, using whatever the
/// project directory reveals: `tests/*` directories become test groups and
/// `requirements*.txt` files are installed.
pub fn default_matrix_config(project_dir: &Path, language: &str) -> MatrixConfig {
    let mut test_groups = detect_test_groups(project_dir);
    if test_groups.is_empty() {
        test_groups.push("tests".to_string());
    }

    MatrixConfig {
        language: language.to_string(),
        reference_version: "3.7".to_string(),
        timeout_secs: Some(3600),
        isolate: false,
        matrix: MatrixAxes {
            os: vec!["ubuntu-latest".to_string()],
            py_vers: vec!["3.7".to_string()],
            test: test_groups,
        },
        dependencies: DependencySet {
            requirements: detect_requirements(project_dir),
            ..DependencySet::default()
        },
        steps: StepCommands::default(),
    }
}

fn detect_test_groups(project_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(project_dir.join("tests")) else {
        return vec![];
    };
    let mut groups: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(|name| format!("tests/{name}")))
        .filter(|name| !name.contains("__pycache__"))
        .collect();
    groups.sort();
    groups
}

fn detect_requirements(project_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(project_dir) else {
        return vec![];
    };
    let mut files: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.starts_with("requirements") && name.ends_with(".txt"))
        .collect();
    files.sort();
    files
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn write_config(path: &Path, config: &MatrixConfig, language: &str) -> Result<()> {
    let toml_string = toml::to_string_pretty(config)
        .context(t!("init.serialize_failed", locale = language).to_string())?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            t!("init.create_parent_dir_failed", locale = language, path = parent.display())
        })?;
    }

    fs::write(path, toml_string)
        .with_context(|| t!("init.write_failed", locale = language, path = path.display()))?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init.next_steps", locale = language));

    Ok(())
}
