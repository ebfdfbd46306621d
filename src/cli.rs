//! # CLI Module / 命令行模块
//!
//! Builds the localized command-line interface and dispatches to the
//! `run`, `plan` and `init` commands.
//!
//! 构建本地化的命令行接口并分派到 `run`、`plan` 和 `init` 命令。

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::infra::t;

pub mod commands;

/// Default configuration file name.
pub const DEFAULT_CONFIG: &str = "CiMatrix.toml";

/// Arguments of the `run` command.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub config: PathBuf,
    pub jobs: Option<usize>,
    pub project_dir: PathBuf,
    pub total_runners: Option<usize>,
    pub runner_index: Option<usize>,
    pub all_os: bool,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

/// Arguments of the `plan` command.
#[derive(Debug, Clone)]
pub struct PlanArgs {
    pub config: PathBuf,
    pub total_runners: Option<usize>,
    pub runner_index: Option<usize>,
    pub all_os: bool,
    pub json: bool,
}

/// Arguments of the `init` command.
#[derive(Debug, Clone)]
pub struct InitArgs {
    pub output: PathBuf,
    pub force: bool,
    pub non_interactive: bool,
}

#[derive(Debug, Clone)]
pub enum CliCommand {
    Run(RunArgs),
    Plan(PlanArgs),
    Init(InitArgs),
}

/// Parsed command line.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// The output language selected for this invocation.
    pub language: String,
    /// Whether the language came from `--lang` rather than detection.
    pub language_explicit: bool,
    pub command: Option<CliCommand>,
}

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for `--lang <VALUE>` or `--lang=<VALUE>`.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang=").map(str::to_string))
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("arg_config", locale = locale).to_string())
        .value_name("CONFIG")
        .default_value(DEFAULT_CONFIG)
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn sharding_args(locale: &str) -> [Arg; 3] {
    [
        Arg::new("total-runners")
            .long("total-runners")
            .help(t!("arg_total_runners", locale = locale).to_string())
            .value_name("TOTAL_RUNNERS")
            .value_parser(clap::value_parser!(usize))
            .action(ArgAction::Set)
            .requires("runner-index"),
        Arg::new("runner-index")
            .long("runner-index")
            .help(t!("arg_runner_index", locale = locale).to_string())
            .value_name("RUNNER_INDEX")
            .value_parser(clap::value_parser!(usize))
            .action(ArgAction::Set)
            .requires("total-runners"),
        Arg::new("all-os")
            .long("all-os")
            .help(t!("arg_all_os", locale = locale).to_string())
            .action(ArgAction::SetTrue),
    ]
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("ci-matrix")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help(t!("arg_jobs", locale = locale).to_string())
                        .value_name("JOBS")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .help(t!("arg_project_dir", locale = locale).to_string())
                        .value_name("PROJECT_DIR")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .args(sharding_args(locale))
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json_report", locale = locale).to_string())
                        .value_name("JSON")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about(t!("cmd_plan_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .args(sharding_args(locale))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json_plan", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg_output", locale = locale).to_string())
                        .value_name("OUTPUT")
                        .default_value(DEFAULT_CONFIG)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn path_arg(matches: &ArgMatches, id: &str) -> PathBuf {
    // Only called for arguments with a default value.
    matches.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

/// Parses the process arguments, initializing i18n first so help and error
/// messages are localized.
pub fn parse_args() -> CliArgs {
    let requested = pre_parse_language();
    let language = crate::init(requested.as_deref());
    let matches = build_cli(&language).get_matches();

    let command = match matches.subcommand() {
        Some(("run", m)) => Some(CliCommand::Run(RunArgs {
            config: path_arg(m, "config"),
            jobs: m.get_one::<usize>("jobs").copied(),
            project_dir: path_arg(m, "project-dir"),
            total_runners: m.get_one::<usize>("total-runners").copied(),
            runner_index: m.get_one::<usize>("runner-index").copied(),
            all_os: m.get_flag("all-os"),
            html: m.get_one::<PathBuf>("html").cloned(),
            json: m.get_one::<PathBuf>("json").cloned(),
        })),
        Some(("plan", m)) => Some(CliCommand::Plan(PlanArgs {
            config: path_arg(m, "config"),
            total_runners: m.get_one::<usize>("total-runners").copied(),
            runner_index: m.get_one::<usize>("runner-index").copied(),
            all_os: m.get_flag("all-os"),
            json: m.get_flag("json"),
        })),
        Some(("init", m)) => Some(CliCommand::Init(InitArgs {
            output: path_arg(m, "output"),
            force: m.get_flag("force"),
            non_interactive: m.get_flag("non-interactive"),
        })),
        _ => None,
    };

    CliArgs {
        language,
        language_explicit: requested.is_some(),
        command,
    }
}

/// Runs the parsed command and returns the process exit code.
pub async fn process_command(args: CliArgs) -> Result<ExitCode> {
    match args.command {
        Some(CliCommand::Run(run_args)) => {
            commands::run::execute(run_args, args.language_explicit.then_some(args.language)).await
        }
        Some(CliCommand::Plan(plan_args)) => {
            commands::plan::execute(plan_args, args.language_explicit.then_some(args.language))?;
            Ok(ExitCode::SUCCESS)
        }
        Some(CliCommand::Init(init_args)) => {
            if !args.language_explicit {
                println!(
                    "{}",
                    t!("system_language_detected", locale = &args.language, lang = &args.language)
                );
            }
            commands::init::execute(init_args, &args.language)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            build_cli(&args.language).print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
