//! Tests for error types

use std::error::Error as _;

use trueno_runs::Error;

#[test]
fn test_invalid_key_error() {
    let error = Error::InvalidKey {
        run_str: "evaluation".to_string(),
        key: "my-eval".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid evaluation key 'my-eval'"));
    assert!(error_str.contains("valid variable names"));
}

#[test]
fn test_run_exists_error() {
    let error = Error::RunExists {
        run_str: "brain method".to_string(),
        key: "similarity".to_string(),
    };
    assert_eq!(
        format!("{error}"),
        "A brain method with key 'similarity' already exists"
    );
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::TypeMismatch {
        run_str: "evaluation".to_string(),
        key: "eval".to_string(),
        existing: "evaluation.ClassificationConfig".to_string(),
        new: "evaluation.DetectionConfig".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("evaluation.ClassificationConfig"));
    assert!(error_str.contains("evaluation.DetectionConfig"));
    assert!(error_str.contains("choose a different key"));
}

#[test]
fn test_field_mismatch_error() {
    let error = Error::FieldMismatch {
        run_str: "evaluation".to_string(),
        key: "eval".to_string(),
        field: "gt_field".to_string(),
        existing: "ground_truth".to_string(),
        new: "labels".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("gt_field=ground_truth"));
    assert!(error_str.contains("gt_field=labels"));
}

#[test]
fn test_results_exist_error() {
    let error = Error::ResultsExist {
        run_str: "run".to_string(),
        key: "custom".to_string(),
    };
    assert!(format!("{error}").contains("already has results"));
}

#[test]
fn test_not_found_error() {
    let error = Error::NotFound {
        run_str: "evaluation".to_string(),
        key: "missing".to_string(),
    };
    assert_eq!(format!("{error}"), "Dataset has no evaluation key 'missing'");
}

#[test]
fn test_unknown_type_error() {
    let error = Error::UnknownType {
        kind: "results",
        tag: "evaluation.MissingResults".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Unknown results type 'evaluation.MissingResults'"));
    assert!(error_str.contains("registered"));
}

#[test]
fn test_version_skew_error() {
    let error = Error::VersionSkew {
        what: "results",
        run_str: "evaluation".to_string(),
        key: "eval".to_string(),
        stored: "0.1.0".to_string(),
        current: "0.2.0".to_string(),
        source: Box::new(Error::Other("bad field".to_string())),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Failed to load results for evaluation with key 'eval'"));
    assert!(error_str.contains("used version 0.1.0"));
    assert!(error_str.contains("using version 0.2.0"));
    assert!(error_str.contains("re-run the method"));
    assert!(error.is_version_skew());
    assert_eq!(error.source().map(ToString::to_string).as_deref(), Some("bad field"));
}

#[test]
fn test_detached_error() {
    let error = Error::Detached;
    assert!(format!("{error}").contains("may have been deleted"));
    assert!(!error.is_version_skew());
}

#[test]
fn test_invalid_argument_error() {
    let error = Error::InvalidArgument("OBJ mesh must be a .obj file".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid argument"));
    assert!(error_str.contains(".obj"));
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("blob missing".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("blob missing"));
}

#[test]
fn test_serialization_error_from_serde() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let error: Error = json_err.into();
    assert!(matches!(error, Error::Serialization(_)));
    assert!(format!("{error}").contains("Serialization error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    assert_eq!(format!("{error}"), "custom error message");
}

#[test]
fn test_error_debug() {
    let error = Error::Detached;
    assert!(format!("{error:?}").contains("Detached"));
}
