//! # File System Operations Module / 文件系统操作模块
//!
//! Creates the isolated, per-job workspace directories.
//!
//! 创建隔离的、每个作业独立的工作区目录。

use anyhow::{Context, Result};
use fs_extra::dir::{CopyOptions, copy};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::core::models::Job;
use crate::infra::t;

/// A job's private workspace. The directory on disk is deleted when this
/// value is dropped.
///
/// 作业的私有工作区。当此值被丢弃时，磁盘上的目录将被删除。
pub struct JobWorkspace {
    _temp_root: TempDir,
    /// Root of the workspace.
    /// 工作区根目录。
    pub root: PathBuf,
    /// Directory commands run in: the project copy when isolated, otherwise
    /// the project directory itself.
    /// 命令运行的目录：隔离时为项目副本，否则为项目目录本身。
    pub working_dir: PathBuf,
}

impl JobWorkspace {
    /// Creates a workspace for `job`. When `isolate` is set, the project at
    /// `project_root` is copied into it.
    pub fn create(job: &Job, project_root: &Path, isolate: bool) -> Result<Self> {
        let temp_root = tempfile::Builder::new()
            .prefix(&format!("{}-", job.env_name()))
            .tempdir()
            .with_context(|| t!("fs.workspace_create_failed", job = job.id()))?;
        let root = temp_root.path().to_path_buf();

        let working_dir = if isolate {
            let project_copy = root.join("project");
            copy_dir_all(project_root, &project_copy)?;
            project_copy
        } else {
            project_root.to_path_buf()
        };

        Ok(Self {
            _temp_root: temp_root,
            root,
            working_dir,
        })
    }
}

impl fmt::Debug for JobWorkspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobWorkspace")
            .field("root", &self.root)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

/// Copies the content of `from` into `to`, creating `to` if needed.
pub fn copy_dir_all(from: &Path, to: &Path) -> Result<()> {
    let mut options = CopyOptions::new();
    options.overwrite = true;
    options.copy_inside = true;
    copy(from, to, &options).with_context(|| {
        t!("fs.copy_failed", from = from.display(), to = to.display())
    })?;
    Ok(())
}
