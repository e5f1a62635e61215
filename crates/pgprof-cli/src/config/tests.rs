//! Tests for run configuration

use super::*;
use chrono::TimeZone;
use std::io::Write;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 15, 0).unwrap()
}

fn args() -> CliArgs {
    CliArgs {
        dsn: Some("host=localhost user=app".into()),
        sql_file: Some(PathBuf::from("queries.sql")),
        ..CliArgs::default()
    }
}

fn configuration_message(err: PgprofError) -> String {
    match err {
        PgprofError::Configuration(message) => message,
        other => panic!("expected configuration error, got {other:?}"),
    }
}

mod defaults_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_filled() {
        let config = ProfileConfig::merge(args(), FileConfig::default(), now()).expect("valid");

        assert_eq!(config.out_dir, PathBuf::from("monitoring/query_runs"));
        assert_eq!(config.run_id, "20260314T091500Z");
        assert_eq!(config.statement_timeout_ms, None);
        assert_eq!(config.log_filter, "info");
        assert!(!config.strict);
        assert!(!config.json_log);
        assert_eq!(
            config.run_dir(),
            PathBuf::from("monitoring/query_runs/20260314T091500Z")
        );
    }

    #[test]
    fn test_default_run_id_format() {
        assert_eq!(default_run_id(now()), "20260314T091500Z");
    }
}

mod layering_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_supplies_missing_values() {
        let file = FileConfig::parse(
            r#"
            dsn = "postgresql://app@db/blog"
            sql_file = "bench/top_posts.sql"
            out_dir = "/var/tmp/runs"
            statement_timeout_ms = 5000
            strict = true
            "#,
        )
        .expect("valid toml");

        let config = ProfileConfig::merge(CliArgs::default(), file, now()).expect("valid");

        assert_eq!(config.dsn, "postgresql://app@db/blog");
        assert_eq!(config.sql_file, PathBuf::from("bench/top_posts.sql"));
        assert_eq!(config.out_dir, PathBuf::from("/var/tmp/runs"));
        assert_eq!(config.statement_timeout_ms, Some(5000));
        assert!(config.strict);
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            dsn: Some("host=file".into()),
            run_id: Some("from-file".into()),
            statement_timeout_ms: Some(100),
            log_filter: Some("warn".into()),
            ..FileConfig::default()
        };
        let args = CliArgs {
            run_id: Some("from-flag".into()),
            statement_timeout_ms: Some(250),
            ..args()
        };

        let config = ProfileConfig::merge(args, file, now()).expect("valid");

        assert_eq!(config.dsn, "host=localhost user=app");
        assert_eq!(config.run_id, "from-flag");
        assert_eq!(config.statement_timeout_ms, Some(250));
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_unknown_file_keys_are_rejected() {
        assert!(FileConfig::parse("dsn = \"x\"\ntimeout = 5").is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "json_log = true").expect("write");

        let loaded = FileConfig::load(file.path()).expect("load");

        assert_eq!(loaded.json_log, Some(true));
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let err = FileConfig::load(Path::new("/nonexistent/pgprof.toml")).unwrap_err();

        assert!(configuration_message(err).contains("/nonexistent/pgprof.toml"));
    }

    #[test]
    fn test_flags_parse() {
        let args = CliArgs::try_parse_from([
            "pgprof",
            "--dsn",
            "host=localhost",
            "--sql-file",
            "q.sql",
            "--statement-timeout-ms",
            "750",
            "--strict",
            "--json-log",
        ])
        .expect("valid flags");

        assert_eq!(args.statement_timeout_ms, Some(750));
        assert!(args.strict);
        assert!(args.json_log);
    }
}

mod validation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_dsn() {
        let args = CliArgs {
            dsn: None,
            ..args()
        };

        let err = ProfileConfig::merge(args, FileConfig::default(), now()).unwrap_err();

        assert!(configuration_message(err).contains("DSN is required"));
    }

    #[test]
    fn test_missing_sql_file() {
        let args = CliArgs {
            sql_file: None,
            ..args()
        };

        let err = ProfileConfig::merge(args, FileConfig::default(), now()).unwrap_err();

        assert!(configuration_message(err).contains("SQL file is required"));
    }

    #[test]
    fn test_zero_timeout_is_passed_through() {
        let args = CliArgs {
            statement_timeout_ms: Some(0),
            ..args()
        };

        let config = ProfileConfig::merge(args, FileConfig::default(), now()).expect("valid");

        assert_eq!(config.statement_timeout_ms, Some(0));
    }

    #[test]
    fn test_blank_run_id_falls_back_to_timestamp() {
        for run_id in ["", "  "] {
            let args = CliArgs {
                run_id: Some(run_id.to_string()),
                ..args()
            };

            let config = ProfileConfig::merge(args, FileConfig::default(), now()).expect("valid");

            assert_eq!(config.run_id, "20260314T091500Z");
        }
    }

    #[test]
    fn test_run_id_must_be_a_plain_name() {
        for run_id in ["a/b", ".", "..", "x\\y"] {
            let args = CliArgs {
                run_id: Some(run_id.to_string()),
                ..args()
            };

            assert!(
                ProfileConfig::merge(args, FileConfig::default(), now()).is_err(),
                "run id {run_id:?} should be rejected"
            );
        }
    }
}
