//! # Config Module Unit Tests / Config 模块单元测试
//!
//! Tests parsing, defaults and validation of `CiMatrix.toml`.
//!
//! 测试 `CiMatrix.toml` 的解析、默认值和验证。

mod common;

use ci_matrix::config::{MatrixConfig, StepCommands, load_matrix_config};
use common::{create_empty_axis_config, create_invalid_toml, shell_config, write_config};
use tempfile::TempDir;

#[cfg(test)]
mod parsing_tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml_str = r#"
            reference_version = "3.7"

            [matrix]
            os = ["ubuntu-latest"]
            py_vers = ["3.7"]
            test = ["tests/base"]
        "#;

        let config: MatrixConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.language, "en");
        assert_eq!(config.timeout_secs, None);
        assert!(!config.isolate);
        assert_eq!(
            config.dependencies.packages,
            vec!["numpy", "scipy", "matplotlib", "ipython", "h5py"]
        );
        assert_eq!(config.dependencies.channel, "conda-forge");
        assert_eq!(config.steps, StepCommands::default());
        assert!(config.steps.test.contains("{test}"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let toml_str = r#"
            language = "zh-CN"
            reference_version = "3.8"
            timeout_secs = 120
            isolate = true

            [matrix]
            os = ["ubuntu-latest", "macos-latest"]
            py_vers = ["3.7", "3.8"]
            test = ["tests/base", "tests/em"]

            [dependencies]
            packages = ["numpy"]
            channel = "defaults"
            channel_packages = ["discretize"]
            requirements = ["requirements_dev.txt"]

            [steps]
            provision = ["python{version} -m venv .venv"]
            install = ["pip install {packages}"]
            test = "pytest {test}"
            coverage = []
        "#;

        let config: MatrixConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.language, "zh-CN");
        assert_eq!(config.reference_version, "3.8");
        assert_eq!(config.timeout_secs, Some(120));
        assert!(config.isolate);
        assert_eq!(config.matrix.os.len(), 2);
        assert_eq!(config.dependencies.channel_packages, vec!["discretize"]);
        assert_eq!(config.dependencies.requirements, vec!["requirements_dev.txt"]);
        assert_eq!(config.steps.test, "pytest {test}");
        assert!(config.steps.coverage.is_empty());
        assert!(config.reference_version_declared());
    }

    #[test]
    fn test_missing_reference_version_is_rejected() {
        let toml_str = r#"
            [matrix]
            os = ["linux"]
            py_vers = ["3.7"]
            test = ["tests"]
        "#;
        assert!(toml::from_str::<MatrixConfig>(toml_str).is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = shell_config(&["linux"], &["3.7", "3.8"], &["tests/a"]);
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: MatrixConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_empty_axis_is_invalid() {
        let mut config = shell_config(&["linux"], &["3.7"], &["tests"]);
        config.matrix.test.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn test_duplicate_axis_value_is_invalid() {
        let config = shell_config(&["linux"], &["3.7", "3.7"], &["tests"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("3.7"));
    }

    #[test]
    fn test_blank_axis_value_is_invalid() {
        let config = shell_config(&["linux", "  "], &["3.7"], &["tests"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_reference_version_is_invalid() {
        let mut config = shell_config(&["linux"], &["3.7"], &["tests"]);
        config.reference_version = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_test_command_is_invalid() {
        let mut config = shell_config(&["linux"], &["3.7"], &["tests"]);
        config.steps.test = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_undeclared_reference_version_is_allowed() {
        let mut config = shell_config(&["linux"], &["3.8"], &["tests"]);
        config.reference_version = "3.7".to_string();
        assert!(config.validate().is_ok());
        assert!(!config.reference_version_declared());
    }
}

#[cfg(test)]
mod loading_tests {
    use super::*;

    #[test]
    fn test_load_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            "ok.toml",
            r#"
reference_version = "3.7"
[matrix]
os = ["ubuntu-latest"]
py_vers = ["3.7"]
test = ["tests/base", "tests/em"]
"#,
        );
        let config = load_matrix_config(&path).unwrap();
        assert_eq!(config.matrix.test.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_matrix_config(&temp_dir.path().join("missing.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_invalid_toml(&temp_dir);
        assert!(load_matrix_config(&path).is_err());
    }

    #[test]
    fn test_load_runs_validation() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_empty_axis_config(&temp_dir);
        let err = load_matrix_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("py_vers"));
    }
}
