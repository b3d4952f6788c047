//! Tests for run configuration parsing
//!
//! This file tests the config module including:
//! - Loading the bundled JSON config files
//! - Resolving defaults for missing fields
//! - Handling invalid JSON, unknown fields and missing files
//! - Validating field values

use rust_linear_classifier::backend::ExecutionMode;
use rust_linear_classifier::config::{
    load_config, read_config, validate_config, BackendKind, RunConfig, Settings,
};
use rust_linear_classifier::format::Representation;
use rust_linear_classifier::ClassifierError;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

// ============================================================================
// Bundled Config Tests
// ============================================================================

mod bundled_config_tests {
    use super::*;

    #[test]
    fn test_load_int8_software() {
        let config = load_config("config/int8_software.json").expect("Failed to load int8 config");

        assert_eq!(config.representation, Some(Representation::Int8));
        assert_eq!(config.backend, Some(BackendKind::Software));
        assert_eq!(config.images, None);
        assert_eq!(config.execution_mode, None);
    }

    #[test]
    fn test_load_int4_host() {
        let config = load_config("config/int4_host.json").expect("Failed to load int4 config");

        assert_eq!(config.representation, Some(Representation::Int4));
        assert_eq!(config.backend, Some(BackendKind::Host));
        assert_eq!(config.execution_mode, Some(ExecutionMode::PerItem));
        assert_eq!(config.threads, Some(4));
        assert_eq!(
            config.images,
            Some(PathBuf::from("data/t10k-images.idx3-ubyte"))
        );
    }

    #[test]
    fn test_load_float_single_task() {
        let settings = load_config("config/float_single_task.json")
            .unwrap()
            .resolve();

        assert_eq!(settings.representation, Representation::Float);
        assert_eq!(settings.execution_mode, ExecutionMode::SingleTask);
        assert_eq!(settings.n_items_limit, Some(1000));
        assert_eq!(settings.weights_dir, PathBuf::from("weights_fp"));
    }
}

// ============================================================================
// Temporary Config Tests
// ============================================================================

mod temp_config_tests {
    use super::*;

    #[test]
    fn test_empty_object_is_all_defaults() {
        let temp = write_temp_config("{}");
        let settings = load_config(temp.path()).unwrap().resolve();

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_representation_tags_accepted() {
        for (name, expected) in [
            ("fp", Representation::Float),
            ("fxp8", Representation::Int8),
            ("fxp4", Representation::Int4),
        ] {
            let temp = write_temp_config(&format!(r#"{{ "representation": "{}" }}"#, name));
            let config = load_config(temp.path()).unwrap();
            assert_eq!(config.representation, Some(expected));
        }
    }

    #[test]
    fn test_explicit_weights_dir_kept() {
        let temp = write_temp_config(
            r#"{
  "representation": "int4",
  "weights_dir": "my_weights"
}"#,
        );
        let settings = load_config(temp.path()).unwrap().resolve();

        assert_eq!(settings.weights_dir, PathBuf::from("my_weights"));
    }

    #[test]
    fn test_resolve_without_file() {
        let settings = RunConfig {
            backend: Some(BackendKind::Host),
            ..Default::default()
        }
        .resolve();

        assert_eq!(settings.backend, BackendKind::Host);
        assert_eq!(settings.representation, Representation::Int8);
    }
}

// ============================================================================
// Invalid Config Tests
// ============================================================================

mod invalid_config_tests {
    use super::*;

    #[test]
    fn test_invalid_json() {
        let temp = write_temp_config("{ \"representation\": ");
        let err = load_config(temp.path()).unwrap_err();

        assert!(matches!(err, ClassifierError::Config(_)));
    }

    #[test]
    fn test_unknown_representation() {
        let temp = write_temp_config(r#"{ "representation": "int16" }"#);

        assert!(load_config(temp.path()).is_err());
    }

    #[test]
    fn test_unknown_field() {
        let temp = write_temp_config(r#"{ "learning_rate": 0.1 }"#);

        assert!(load_config(temp.path()).is_err());
    }

    #[test]
    fn test_zero_limit() {
        let temp = write_temp_config(r#"{ "n_items_limit": 0 }"#);
        let err = load_config(temp.path()).unwrap_err();

        assert!(matches!(err, ClassifierError::Precondition(_)));
    }

    #[test]
    fn test_read_config_defers_validation() {
        let temp = write_temp_config(r#"{ "threads": 0 }"#);
        let config = read_config(temp.path()).unwrap();

        assert_eq!(config.threads, Some(0));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("config/does_not_exist.json").unwrap_err();

        assert!(matches!(err, ClassifierError::Io { .. }));
    }
}
