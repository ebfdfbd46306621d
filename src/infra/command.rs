//! # Command Module / 命令模块
//!
//! Renders step command templates for a job and runs the resulting processes,
//! capturing their combined output.
//!
//! 为作业渲染步骤命令模板并运行生成的进程，捕获其合并输出。

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;

use crate::core::config::DependencySet;
use crate::core::models::Job;
use crate::infra::t;

/// Values available to command templates.
/// 命令模板可用的值。
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub job: &'a Job,
    pub dependencies: &'a DependencySet,
    pub workspace: &'a Path,
}

impl TemplateContext<'_> {
    fn placeholders(&self) -> [(&'static str, String); 9] {
        let requirements = self
            .dependencies
            .requirements
            .iter()
            .map(|file| format!("-r {file}"))
            .collect::<Vec<_>>()
            .join(" ");
        [
            ("{os}", self.job.os.clone()),
            ("{version}", self.job.version.clone()),
            ("{test}", self.job.test_group.clone()),
            ("{env}", self.job.env_name()),
            ("{packages}", self.dependencies.packages.join(" ")),
            ("{channel}", self.dependencies.channel.clone()),
            ("{channel_packages}", self.dependencies.channel_packages.join(" ")),
            ("{requirements}", requirements),
            ("{workspace}", self.workspace.display().to_string()),
        ]
    }

    /// Environment variables exported to every command of the job.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CI_MATRIX_OS", self.job.os.clone()),
            ("CI_MATRIX_VERSION", self.job.version.clone()),
            ("CI_MATRIX_TEST", self.job.test_group.clone()),
            ("CI_MATRIX_ENV", self.job.env_name()),
            ("CI_MATRIX_WORKSPACE", self.workspace.display().to_string()),
            ("CI_MATRIX_JOB_INDEX", self.job.index.to_string()),
            ("CI_MATRIX_REFERENCE", self.job.reference.to_string()),
        ]
    }
}

/// Substitutes the known `{...}` placeholders in a template. Unknown tokens
/// are left as written.
///
/// The template is scanned once, so a substituted value is never itself
/// scanned for placeholders: a test group containing `{env}` stays verbatim.
pub fn render_template(template: &str, ctx: &TemplateContext<'_>) -> String {
    let placeholders = ctx.placeholders();
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholders.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                rendered.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Expands environment variables in a command template and splits it into
/// shell words using POSIX rules.
///
/// Only the template text goes through `shellexpand`. Job values are
/// substituted afterwards, so a `$VAR` or `~` inside a test group is never
/// rewritten.
pub fn parse_command_line(command_line: &str) -> Result<Vec<String>> {
    let expanded = shellexpand::full(command_line)
        .with_context(|| t!("command.expand_failed", command = command_line))?
        .to_string();

    let parts = shlex::split(&expanded)
        .ok_or_else(|| anyhow!(t!("command.parse_failed", command = expanded)))?;

    if parts.is_empty() {
        return Err(anyhow!(t!("command.empty")));
    }
    Ok(parts)
}

/// Values for a word that consists of nothing but one list-valued
/// placeholder. Such a word becomes zero or more argv entries.
fn whole_word_values(word: &str, ctx: &TemplateContext<'_>) -> Option<Vec<String>> {
    let deps = ctx.dependencies;
    match word {
        // The group's own quoting is honoured; nothing in it is expanded.
        "{test}" => Some(
            shlex::split(&ctx.job.test_group)
                .unwrap_or_else(|| vec![ctx.job.test_group.clone()]),
        ),
        "{packages}" => Some(deps.packages.clone()),
        "{channel_packages}" => Some(deps.channel_packages.clone()),
        "{requirements}" => Some(
            deps.requirements
                .iter()
                .flat_map(|file| ["-r".to_string(), file.clone()])
                .collect(),
        ),
        _ => None,
    }
}

/// Turns a template into the argv of the process to run.
///
/// The template is expanded and split first; placeholders are then
/// substituted word by word. A word that is exactly `{test}` becomes the
/// test group's shell words, and a placeholder embedded in a larger word
/// (`sh -c "pytest {test}"`, `--group={test}`) is inserted as written.
pub fn render_args(template: &str, ctx: &TemplateContext<'_>) -> Result<Vec<String>> {
    let words = parse_command_line(template)?;
    let mut args = Vec::with_capacity(words.len());
    for word in &words {
        match whole_word_values(word, ctx) {
            Some(values) => args.extend(values),
            None => args.push(render_template(word, ctx)),
        }
    }

    if args.is_empty() {
        return Err(anyhow!(t!("command.empty")));
    }
    Ok(args)
}

/// Builds a `tokio::process::Command` for a template, ready to spawn.
///
/// # Returns
/// The command together with the rendered command line for logging.
pub fn prepare_command(
    template: &str,
    ctx: &TemplateContext<'_>,
    working_dir: &Path,
) -> Result<(tokio::process::Command, String)> {
    let args = render_args(template, ctx)?;
    let rendered = render_template(template, ctx);

    let mut cmd = tokio::process::Command::new(&args[0]);
    cmd.args(&args[1..])
        .envs(ctx.env_vars())
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    Ok((cmd, rendered))
}

/// Owns a spawned child. Dropping it kills the child's whole process group,
/// so processes the command started do not outlive a timed-out or cancelled
/// step.
struct ProcessGroupGuard {
    child: Child,
    #[cfg_attr(not(unix), allow(dead_code))]
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(child: Child) -> Self {
        let pgid = child.id();
        Self { child, pgid }
    }

    /// Kills every process left in the group. An already empty group is fine.
    fn kill_group(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            // SAFETY: killpg only sends a signal to the group this guard created.
            if unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) } == 0 {
                return;
            }
        }
        let _ = self.child.start_kill();
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill_group();
    }
}

/// Spawns a command, captures its stdout and stderr.
/// Both streams are merged line by line in arrival order. Bytes that are not
/// valid UTF-8 are replaced, never dropped.
///
/// On unix the command leads its own process group. When the command exits,
/// or when this future is dropped, whatever is left in that group is killed.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 两个流按到达顺序逐行合并；无效的 UTF-8 字节会被替换而不是丢弃。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> (std::io::Result<ExitStatus>, String) {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    cmd.process_group(0);

    let mut guard = match cmd.spawn() {
        Ok(child) => ProcessGroupGuard::new(child),
        Err(e) => return (Err(e), String::new()),
    };

    let (Some(stdout), Some(stderr)) = (guard.child.stdout.take(), guard.child.stderr.take())
    else {
        return (
            Err(std::io::Error::other(t!("command.capture_failed").to_string())),
            String::new(),
        );
    };

    let stdout_lines = SplitStream::new(BufReader::new(stdout).split(b'\n'));
    let stderr_lines = SplitStream::new(BufReader::new(stderr).split(b'\n'));
    let mut merged = stdout_lines.merge(stderr_lines);

    let reader = tokio::spawn(async move {
        let mut output = String::new();
        while let Some(segment) = merged.next().await {
            match segment {
                Ok(bytes) => {
                    let line = String::from_utf8_lossy(&bytes);
                    output.push_str(line.strip_suffix('\r').unwrap_or(&*line));
                }
                Err(e) => output.push_str(&t!("command.read_failed", error = e)),
            }
            output.push('\n');
        }
        output
    });

    let status = guard.child.wait().await;
    // Background processes still holding the pipes would keep the reader open.
    guard.kill_group();

    // Wait for the reader so that all output is captured.
    let output = match reader.await {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", t!("command.join_failed", error = e));
            String::new()
        }
    };

    (status, output)
}
