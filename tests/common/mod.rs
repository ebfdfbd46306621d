// Shared test helpers for integration tests
#![allow(dead_code)]

use ci_matrix::config::{DependencySet, MatrixAxes, MatrixConfig, StepCommands};
use std::fs;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// A configuration whose steps are plain shell commands, so no package
/// manager is needed to exercise the pipeline.
pub fn shell_config(os: &[&str], versions: &[&str], tests: &[&str]) -> MatrixConfig {
    MatrixConfig {
        language: "en".to_string(),
        reference_version: "3.7".to_string(),
        timeout_secs: None,
        isolate: false,
        matrix: MatrixAxes {
            os: strings(os),
            py_vers: strings(versions),
            test: strings(tests),
        },
        dependencies: DependencySet::default(),
        steps: StepCommands {
            provision: strings(&["true"]),
            install: strings(&["true"]),
            test: "echo running {test}".to_string(),
            coverage: strings(&["echo uploading coverage for {version}"]),
        },
    }
}

/// Creates an empty project directory.
pub fn setup_project() -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    fs::create_dir_all(temp_dir.path().join("tests")).expect("Failed to create tests directory");
    fs::write(temp_dir.path().join("setup.py"), "# sample project\n")
        .expect("Failed to write setup.py");
    temp_dir
}

/// Writes `content` as a configuration file inside `temp_dir`.
pub fn write_config(temp_dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let matrix_path = temp_dir.path().join(name);
    fs::write(&matrix_path, content).unwrap();
    matrix_path
}

/// Helper function to create a passing configuration for the host OS
pub fn create_success_config(temp_dir: &TempDir) -> PathBuf {
    write_config(
        temp_dir,
        "success.toml",
        &format!(
            r#"
language = "en"
reference_version = "3.7"

[matrix]
os = ["{os}"]
py_vers = ["3.7", "3.8"]
test = ["tests/base", "tests/em -k fast"]

[steps]
provision = ["true"]
install = ["true"]
test = "echo running {{test}}"
coverage = ["echo uploading"]
"#,
            os = std::env::consts::OS
        ),
    )
}

/// Helper function to create a configuration where dependency installation
/// fails for one interpreter version only
pub fn create_dependency_fail_config(temp_dir: &TempDir) -> PathBuf {
    write_config(
        temp_dir,
        "dependency_fail.toml",
        &format!(
            r#"
language = "en"
reference_version = "3.7"

[matrix]
os = ["{os}"]
py_vers = ["3.7", "3.8"]
test = ["tests/base"]

[steps]
provision = ["true"]
install = ["sh -c \"test {{version}} != 3.8\""]
test = "echo running {{test}}"
coverage = ["true"]
"#,
            os = std::env::consts::OS
        ),
    )
}

/// Helper function to create a single-job configuration whose tests exit 3
pub fn create_single_failing_job_config(temp_dir: &TempDir) -> PathBuf {
    write_config(
        temp_dir,
        "single_fail.toml",
        &format!(
            r#"
language = "en"
reference_version = "3.7"

[matrix]
os = ["{os}"]
py_vers = ["3.7"]
test = ["tests/base"]

[steps]
provision = ["true"]
install = ["true"]
test = "sh -c \"echo deliberate failure; exit 3\""
coverage = ["true"]
"#,
            os = std::env::consts::OS
        ),
    )
}

/// Helper function to create an invalid TOML configuration
pub fn create_invalid_toml(temp_dir: &TempDir) -> PathBuf {
    write_config(
        temp_dir,
        "invalid.toml",
        r#"
language = "en"
reference_version = "3.7"
# Invalid TOML - missing closing bracket
[matrix
os = ["linux"]
"#,
    )
}

/// Helper function to create a configuration with an empty axis
pub fn create_empty_axis_config(temp_dir: &TempDir) -> PathBuf {
    write_config(
        temp_dir,
        "empty_axis.toml",
        r#"
reference_version = "3.7"

[matrix]
os = ["linux"]
py_vers = []
test = ["tests"]
"#,
    )
}
