//! Alignment self-check (C9): verifies that the fixed-size on-disk regions
//! this crate assumes (see [`crate::layout`]) are internally consistent.
//!
//! The reference library runs an equivalent check at process init and aborts
//! on failure. A Rust library must never abort its host process, so this
//! returns a `Result` instead; callers who want abort-on-failure semantics
//! (matching a one-off diagnostic binary) can `.expect()` it themselves.
use crate::errors::MedError;
use crate::layout::{cmp, index, metadata, record, universal_header};

fn check(structure: &str, field: &str, expected: usize, found: usize) -> Result<(), MedError> {
    if expected == found {
        Ok(())
    } else {
        Err(MedError::AlignmentCheckFailed {
            structure: structure.to_string(),
            field: field.to_string(),
            expected,
            found,
        })
    }
}

/// Verify every layout invariant this crate depends on. Call once at startup
/// in contexts where silent offset drift would be catastrophic (e.g. before
/// a batch conversion job); the read/write paths do not call this
/// automatically since it duplicates no I/O and costs nothing to skip.
pub fn verify_layout() -> Result<(), MedError> {
    check(
        "UniversalHeader",
        "total_bytes",
        universal_header::DISCRETIONARY_REGION_OFFSET + universal_header::DISCRETIONARY_REGION_BYTES,
        crate::layout::UNIVERSAL_HEADER_BYTES,
    )?;
    check(
        "MetadataFile",
        "section_1_offset",
        universal_header::DISCRETIONARY_REGION_OFFSET + universal_header::DISCRETIONARY_REGION_BYTES,
        metadata::SECTION_1_OFFSET,
    )?;
    check(
        "MetadataFile",
        "section_2_offset",
        metadata::SECTION_1_OFFSET + metadata::SECTION_1_BYTES,
        metadata::SECTION_2_OFFSET,
    )?;
    check(
        "MetadataFile",
        "section_3_offset",
        metadata::SECTION_2_OFFSET + metadata::SECTION_2_BYTES,
        metadata::SECTION_3_OFFSET,
    )?;
    check(
        "MetadataFile",
        "total_bytes",
        metadata::SECTION_3_OFFSET + metadata::SECTION_3_BYTES,
        metadata::METADATA_FILE_BYTES,
    )?;
    check(
        "MetadataFile",
        "section_3_protected_end",
        metadata::SECTION_3_PROTECTED_OFFSET + metadata::SECTION_3_PROTECTED_BYTES,
        metadata::SECTION_3_DISCRETIONARY_OFFSET,
    )?;
    check(
        "MetadataFile",
        "section_3_discretionary_end",
        metadata::SECTION_3_DISCRETIONARY_OFFSET + metadata::SECTION_3_DISCRETIONARY_BYTES,
        metadata::METADATA_FILE_BYTES,
    )?;
    check(
        "RecordHeader",
        "total_bytes",
        record::ENCRYPTION_LEVEL_OFFSET + 1,
        record::RECORD_HEADER_BYTES,
    )?;
    check(
        "RecordIndex",
        "total_bytes",
        record::INDEX_ENCRYPTION_LEVEL_OFFSET + 1,
        record::RECORD_INDEX_BYTES,
    )?;
    check(
        "TimeSeriesIndex",
        "total_bytes",
        index::TS_START_SAMPLE_NUMBER_OFFSET + 8,
        index::TIME_SERIES_INDEX_BYTES,
    )?;
    check(
        "VideoIndex",
        "total_bytes",
        index::VIDEO_FILE_NUMBER_OFFSET + 4,
        index::VIDEO_INDEX_BYTES,
    )?;
    check(
        "CmpBlockHeader",
        "total_bytes",
        cmp::TOTAL_HEADER_BYTES_OFFSET + 4,
        cmp::CMP_BLOCK_HEADER_BYTES,
    )?;
    check(
        "CmpBlockHeader",
        "variable_region_offset",
        cmp::CMP_BLOCK_HEADER_BYTES,
        cmp::VARIABLE_REGION_OFFSET,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_internally_consistent() {
        verify_layout().expect("layout constants must agree with each other");
    }
}
