use duopane_core::{
    classify, EngineConfig, OperationError, OperationOutcome, OperationRequest, OperationType,
    DEFAULT_CHANNEL_SIZE, DEFAULT_PROGRESS_THRESHOLD,
};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};

#[test]
fn test_config_from_partial_json_uses_defaults() {
    let config: EngineConfig = serde_json::from_str(r#"{ "progress_threshold": 2 }"#).unwrap();

    assert_eq!(config.progress_threshold, 2);
    assert_eq!(config.channel_size, DEFAULT_CHANNEL_SIZE);
    assert!(config.copy_symlinks_as_links);
}

#[test]
fn test_config_json_is_validated() {
    let err = serde_json::from_str::<EngineConfig>(r#"{ "channel_size": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("Channel size must be greater than zero"));

    let config: EngineConfig = serde_json::from_str(r#"{ "channel_size": 8 }"#).unwrap();
    assert_eq!(config.channel_size, 8);
}

#[test]
fn test_config_default_matches_builder() {
    let built = EngineConfig::builder().build().unwrap();
    assert_eq!(built, EngineConfig::default());
    assert_eq!(built.progress_threshold, DEFAULT_PROGRESS_THRESHOLD);
}

#[test]
fn test_request_serialization_is_tagged_by_kind() {
    let request = OperationRequest::copy(vec![PathBuf::from("/src/a.txt")], "/dest");
    let json = serde_json::to_string(&request).unwrap();
    assert!(json.contains("Copy"));

    let back: OperationRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, request);
}

#[test]
fn test_classify_real_missing_file() {
    let missing = Path::new("/definitely/not/here/duopane.txt");
    let raw = std::fs::metadata(missing).unwrap_err();

    let err = classify(Box::new(raw), missing);
    assert!(matches!(err, OperationError::SourceNotFound(ref p) if p == missing));
    assert_eq!(err.path(), Some(missing));
}

#[test]
fn test_classify_is_idempotent() {
    let path = Path::new("/some/file");
    let first = classify(
        Box::new(io::Error::new(io::ErrorKind::PermissionDenied, "nope")),
        path,
    );
    let second = classify(Box::new(first.clone()), Path::new("/elsewhere"));

    assert!(matches!(second, OperationError::PermissionDenied(ref p) if p == path));
}

#[test]
fn test_classify_walks_source_chain() {
    #[derive(Debug)]
    struct Wrapper(io::Error);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "backend failure")
        }
    }

    impl Error for Wrapper {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    let raw = Wrapper(io::Error::new(io::ErrorKind::StorageFull, "no space"));
    let err = classify(Box::new(raw), Path::new("/vol/file"));
    assert!(matches!(err, OperationError::DiskFull));
}

#[test]
fn test_unknown_retains_cause_for_diagnostics() {
    let err = OperationError::from_io("/x", io::Error::new(io::ErrorKind::Interrupted, "eintr"));

    let source = err.source().expect("unknown keeps its cause");
    assert_eq!(source.to_string(), "eintr");
}

#[test]
fn test_outcome_partition_and_summary() {
    let mut outcome = OperationOutcome::new();
    outcome.record_success(PathBuf::from("/dest/a"));
    outcome.record_success(PathBuf::from("/dest/b"));
    outcome.record_skip(PathBuf::from("/src/c"));

    assert_eq!(outcome.processed(), 3);
    assert!(outcome.is_success());
    assert_eq!(
        outcome.summary(OperationType::Move),
        "Moved 2 items, 1 skipped"
    );
}
