//! # Planner Module Unit Tests / Planner 模块单元测试
//!
//! Tests matrix expansion, host filtering and sharding.
//!
//! 测试矩阵展开、主机过滤和分片。

mod common;

use ci_matrix::planner::{expand, expand_config, host_family, matches_host, plan_execution};
use common::{shell_config, strings};
use std::collections::HashSet;

#[cfg(test)]
mod expand_tests {
    use super::*;

    #[test]
    fn test_job_count_is_product_of_axis_lengths() {
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    let os: Vec<String> = (0..a).map(|i| format!("os-{i}")).collect();
                    let versions: Vec<String> = (0..b).map(|i| format!("3.{i}")).collect();
                    let tests: Vec<String> = (0..c).map(|i| format!("tests/{i}")).collect();

                    let jobs = expand(&os, &versions, &tests, "3.0");
                    assert_eq!(jobs.len(), a * b * c, "axes ({a}, {b}, {c})");
                }
            }
        }
    }

    #[test]
    fn test_every_triple_appears_exactly_once() {
        let os = strings(&["ubuntu-latest", "macos-latest"]);
        let versions = strings(&["3.7", "3.8", "3.9"]);
        let tests = strings(&["tests/base", "tests/em", "tests/dc"]);

        let jobs = expand(&os, &versions, &tests, "3.7");
        let triples: HashSet<_> = jobs
            .iter()
            .map(|j| (j.os.clone(), j.version.clone(), j.test_group.clone()))
            .collect();

        assert_eq!(triples.len(), jobs.len());
        for o in &os {
            for v in &versions {
                for t in &tests {
                    assert!(triples.contains(&(o.clone(), v.clone(), t.clone())));
                }
            }
        }
    }

    #[test]
    fn test_order_follows_axis_declaration() {
        let jobs = expand(
            &strings(&["a", "b"]),
            &strings(&["1", "2"]),
            &strings(&["x", "y"]),
            "1",
        );
        let order: Vec<String> = jobs
            .iter()
            .map(|j| format!("{}{}{}", j.os, j.version, j.test_group))
            .collect();
        assert_eq!(
            order,
            vec!["a1x", "a1y", "a2x", "a2y", "b1x", "b1y", "b2x", "b2y"]
        );
        for (i, job) in jobs.iter().enumerate() {
            assert_eq!(job.index, i);
        }
    }

    #[test]
    fn test_reference_flag_matches_reference_version() {
        let jobs = expand(
            &strings(&["linux"]),
            &strings(&["3.7", "3.8"]),
            &strings(&["tests"]),
            "3.7",
        );
        for job in &jobs {
            assert_eq!(job.uploads_coverage(), job.version == "3.7");
        }
    }

    #[test]
    fn test_single_version_eight_groups() {
        let groups = strings(&[
            "tests/base",
            "tests/dask",
            "tests/docs",
            "tests/em/fdem",
            "tests/em/tdem",
            "tests/em/static",
            "tests/flow",
            "tests/pf",
        ]);
        let jobs = expand(&strings(&["ubuntu-latest"]), &strings(&["3.7"]), &groups, "3.7");

        assert_eq!(jobs.len(), 8);
        assert!(jobs.iter().all(|j| j.os == "ubuntu-latest"));
        assert!(jobs.iter().all(|j| j.version == "3.7"));
        assert!(jobs.iter().all(|j| j.uploads_coverage()));
    }

    #[test]
    fn test_removing_a_group_removes_exactly_one_job() {
        let os = strings(&["ubuntu-latest"]);
        let versions = strings(&["3.7"]);
        let all = strings(&["tests/a", "tests/b", "tests/c", "tests/d"]);
        let fewer = strings(&["tests/a", "tests/b", "tests/d"]);

        let before = expand(&os, &versions, &all, "3.7");
        let after = expand(&os, &versions, &fewer, "3.7");

        assert_eq!(after.len(), before.len() - 1);
        let remaining: Vec<_> = before
            .iter()
            .filter(|j| j.test_group != "tests/c")
            .map(|j| (&j.os, &j.version, &j.test_group))
            .collect();
        let identities: Vec<_> = after
            .iter()
            .map(|j| (&j.os, &j.version, &j.test_group))
            .collect();
        assert_eq!(remaining, identities);
    }

    #[test]
    fn test_test_group_is_kept_verbatim() {
        let group = "tests/em -k 'not slow' --maxfail=1";
        let jobs = expand(&strings(&["linux"]), &strings(&["3.7"]), &strings(&[group]), "3.7");
        assert_eq!(jobs[0].test_group, group);
    }

    #[test]
    fn test_expand_config_uses_configured_axes() {
        let config = shell_config(&["linux", "macos"], &["3.7", "3.8"], &["tests"]);
        let jobs = expand_config(&config);
        assert_eq!(jobs.len(), 4);
        assert_eq!(jobs.iter().filter(|j| j.reference).count(), 2);
    }
}

#[cfg(test)]
mod host_tests {
    use super::*;

    #[test]
    fn test_host_family_aliases() {
        assert_eq!(host_family("ubuntu-latest"), Some("linux"));
        assert_eq!(host_family("ubuntu-20.04"), Some("linux"));
        assert_eq!(host_family("macos-13"), Some("macos"));
        assert_eq!(host_family("osx"), Some("macos"));
        assert_eq!(host_family("windows-latest"), Some("windows"));
        assert_eq!(host_family("Linux"), Some("linux"));
        assert_eq!(host_family("plan9"), None);
    }

    #[test]
    fn test_current_os_matches_itself() {
        assert!(matches_host(std::env::consts::OS));
        assert!(!matches_host("plan9"));
    }
}

#[cfg(test)]
mod plan_tests {
    use super::*;

    #[test]
    fn test_plan_filters_other_operating_systems() {
        let config = shell_config(&[std::env::consts::OS, "plan9"], &["3.7"], &["a", "b"]);
        let plan = plan_execution(&config, false, None, None).unwrap();

        assert_eq!(plan.matrix_size, 4);
        assert_eq!(plan.jobs.len(), 2);
        assert_eq!(plan.filtered_os_count, 2);
        assert!(!plan.is_distributed);
        assert!(plan.jobs.iter().all(|j| j.os == std::env::consts::OS));
    }

    #[test]
    fn test_plan_all_os_keeps_every_job() {
        let config = shell_config(&[std::env::consts::OS, "plan9"], &["3.7"], &["a", "b"]);
        let plan = plan_execution(&config, true, None, None).unwrap();
        assert_eq!(plan.jobs.len(), 4);
        assert_eq!(plan.filtered_os_count, 0);
    }

    #[test]
    fn test_shards_partition_the_matrix() {
        let config = shell_config(&["linux", "macos"], &["3.7", "3.8", "3.9"], &["a", "b", "c"]);
        let total = 4;
        let mut seen = Vec::new();

        for index in 0..total {
            let plan = plan_execution(&config, true, Some(total), Some(index)).unwrap();
            assert!(plan.is_distributed);
            seen.extend(plan.jobs.into_iter().map(|j| j.index));
        }

        seen.sort();
        let expected: Vec<usize> = (0..18).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_runner_index_out_of_range() {
        let config = shell_config(&["linux"], &["3.7"], &["a"]);
        assert!(plan_execution(&config, true, Some(2), Some(2)).is_err());
        assert!(plan_execution(&config, true, Some(0), Some(0)).is_err());
    }

    #[test]
    fn test_runner_flags_must_be_given_together() {
        let config = shell_config(&["linux"], &["3.7"], &["a"]);
        assert!(plan_execution(&config, true, Some(2), None).is_err());
        assert!(plan_execution(&config, true, None, Some(0)).is_err());
    }
}
