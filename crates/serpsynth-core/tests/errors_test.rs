//! Error codes and conversions.

use serpsynth_core::errors::{
    PipelineError, SourceError, StageError, StorageError, SynthErrorCode,
};

#[test]
fn stage_errors_carry_distinct_codes() {
    let extraction = StageError::extraction("positions")(StorageError::sqlite("no such table"));
    let transformation = StageError::transformation("aggregated", "negative clicks");
    let load = StageError::load("clicks")(StorageError::sqlite("disk I/O error"));

    assert_eq!(extraction.error_code(), "EXTRACTION_ERROR");
    assert_eq!(transformation.error_code(), "TRANSFORMATION_ERROR");
    assert_eq!(load.error_code(), "LOAD_ERROR");
    assert_eq!(extraction.stage(), "positions");
    assert_eq!(transformation.stage(), "aggregated");
}

#[test]
fn pipeline_error_delegates_code_and_tags_message() {
    let err: PipelineError = StageError::transformation("aggregated", "bad device").into();
    assert_eq!(err.error_code(), "TRANSFORMATION_ERROR");
    let tagged = err.tagged();
    assert!(tagged.starts_with("[TRANSFORMATION_ERROR] "), "{tagged}");
    assert!(tagged.contains("bad device"));
}

#[test]
fn wrapped_storage_failure_keeps_stage_code() {
    let err: PipelineError = StageError::load("positions")(StorageError::sqlite("interrupted")).into();
    assert_eq!(err.error_code(), "LOAD_ERROR");
    assert_eq!(
        err.to_string(),
        "Stage error: positions: load failed: SQLite error: interrupted"
    );

    let err: PipelineError = SourceError::Unavailable {
        message: "down".into(),
    }
    .into();
    assert_eq!(err.error_code(), "SOURCE_ERROR");
}
