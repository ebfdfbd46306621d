//! Implementations of the CLI subcommands.
//! CLI 子命令的实现。

pub mod init;
pub mod plan;
pub mod run;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{self, MatrixConfig};
use crate::infra::t;

/// Loads the configuration and applies its language unless one was given on
/// the command line. Returns the config, its canonical path and the locale.
pub(crate) fn load_config_and_locale(
    config_path: &Path,
    language_override: Option<String>,
) -> Result<(MatrixConfig, PathBuf, String)> {
    let config_path = fs::canonicalize(config_path)
        .with_context(|| t!("config.read_failed", path = config_path.display()))?;
    let matrix_config = config::load_matrix_config(&config_path)?;

    let locale = crate::resolve_locale(
        language_override
            .as_deref()
            .unwrap_or(&matrix_config.language),
    );
    rust_i18n::set_locale(&locale);

    Ok((matrix_config, config_path, locale))
}
