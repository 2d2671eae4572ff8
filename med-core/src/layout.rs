//! Named byte-offset constants for every on-disk MED structure.
//!
//! These are the ground truth the alignment self-check (C9, [`crate::align`])
//! verifies struct field offsets against, and the single source other modules
//! use when slicing raw buffers -- never a re-derived or hand-counted offset.

pub const UNIVERSAL_HEADER_BYTES: usize = 1024;

pub mod universal_header {
    pub const HEADER_CRC_OFFSET: usize = 0;
    pub const BODY_CRC_OFFSET: usize = 4;
    pub const FILE_END_TIME_OFFSET: usize = 8;
    pub const NUMBER_OF_ENTRIES_OFFSET: usize = 16;
    pub const MAXIMUM_ENTRY_SIZE_OFFSET: usize = 24;
    pub const SEGMENT_NUMBER_OFFSET: usize = 28;
    pub const TYPE_STRING_OFFSET: usize = 32;
    pub const VERSION_MAJOR_OFFSET: usize = 37;
    pub const VERSION_MINOR_OFFSET: usize = 38;
    pub const BYTE_ORDER_CODE_OFFSET: usize = 39;
    pub const SESSION_START_TIME_OFFSET: usize = 40;
    pub const FILE_START_TIME_OFFSET: usize = 48;
    pub const SESSION_NAME_OFFSET: usize = 56;
    pub const SESSION_NAME_BYTES: usize = 256;
    pub const CHANNEL_NAME_OFFSET: usize = 312;
    pub const CHANNEL_NAME_BYTES: usize = 256;
    pub const ANONYMIZED_SUBJECT_ID_OFFSET: usize = 568;
    pub const ANONYMIZED_SUBJECT_ID_BYTES: usize = 256;
    pub const SESSION_UID_OFFSET: usize = 824;
    pub const CHANNEL_UID_OFFSET: usize = 832;
    pub const SEGMENT_UID_OFFSET: usize = 840;
    pub const FILE_UID_OFFSET: usize = 848;
    pub const PROVENANCE_UID_OFFSET: usize = 856;
    pub const LEVEL_1_PASSWORD_VALIDATION_FIELD_OFFSET: usize = 864;
    pub const LEVEL_2_PASSWORD_VALIDATION_FIELD_OFFSET: usize = 880;
    pub const LEVEL_3_PASSWORD_VALIDATION_FIELD_OFFSET: usize = 896;
    pub const PROTECTED_REGION_OFFSET: usize = 912;
    pub const PROTECTED_REGION_BYTES: usize = 56;
    pub const DISCRETIONARY_REGION_OFFSET: usize = 968;
    pub const DISCRETIONARY_REGION_BYTES: usize = 56;
}

pub mod metadata {
    pub const METADATA_FILE_BYTES: usize = 16384;
    pub const SECTION_1_OFFSET: usize = 1024;
    pub const SECTION_1_BYTES: usize = 1024;
    pub const SECTION_2_OFFSET: usize = 2048;
    pub const SECTION_2_BYTES: usize = 10240;
    pub const SECTION_3_OFFSET: usize = 12288;
    pub const SECTION_3_BYTES: usize = 4096;

    pub const SECTION_2_ENCRYPTION_LEVEL_OFFSET: usize = 1536;
    pub const SECTION_3_ENCRYPTION_LEVEL_OFFSET: usize = 1537;

    pub const SECTION_1_PROTECTED_OFFSET: usize = 1539;
    pub const SECTION_1_PROTECTED_BYTES: usize = 253;
    pub const SECTION_1_DISCRETIONARY_OFFSET: usize = 1792;
    pub const SECTION_1_DISCRETIONARY_BYTES: usize = 256;

    // Time-series variant of section 2 (absolute file offsets).
    pub const TS_REFERENCE_DESCRIPTION_OFFSET: usize = 8192;
    pub const TS_REFERENCE_DESCRIPTION_BYTES: usize = 1024;
    pub const TS_SAMPLING_FREQUENCY_OFFSET: usize = 9216;
    pub const TS_LOW_FREQUENCY_FILTER_SETTING_OFFSET: usize = 9224;
    pub const TS_HIGH_FREQUENCY_FILTER_SETTING_OFFSET: usize = 9232;
    pub const TS_NOTCH_FILTER_FREQUENCY_SETTING_OFFSET: usize = 9240;
    pub const TS_AC_LINE_FREQUENCY_OFFSET: usize = 9248;
    pub const TS_AMPLITUDE_UNITS_CONVERSION_FACTOR_OFFSET: usize = 9256;
    pub const TS_AMPLITUDE_UNITS_DESCRIPTION_OFFSET: usize = 9264;
    pub const TS_AMPLITUDE_UNITS_DESCRIPTION_BYTES: usize = 128;
    pub const TS_TIME_BASE_UNITS_CONVERSION_FACTOR_OFFSET: usize = 9392;
    pub const TS_TIME_BASE_UNITS_DESCRIPTION_OFFSET: usize = 9400;
    pub const TS_TIME_BASE_UNITS_DESCRIPTION_BYTES: usize = 128;
    pub const TS_ABSOLUTE_START_SAMPLE_NUMBER_OFFSET: usize = 9528;
    pub const TS_NUMBER_OF_SAMPLES_OFFSET: usize = 9536;
    pub const TS_NUMBER_OF_BLOCKS_OFFSET: usize = 9544;
    pub const TS_MAXIMUM_BLOCK_BYTES_OFFSET: usize = 9552;
    pub const TS_MAXIMUM_BLOCK_SAMPLES_OFFSET: usize = 9560;
    pub const TS_MAXIMUM_BLOCK_KEYSAMPLE_BYTES_OFFSET: usize = 9564;
    pub const TS_MAXIMUM_BLOCK_DURATION_OFFSET: usize = 9568;
    pub const TS_NUMBER_OF_DISCONTINUITIES_OFFSET: usize = 9576;
    pub const TS_MAXIMUM_CONTIGUOUS_BLOCKS_OFFSET: usize = 9584;
    pub const TS_MAXIMUM_CONTIGUOUS_BLOCK_BYTES_OFFSET: usize = 9592;
    pub const TS_MAXIMUM_CONTIGUOUS_SAMPLES_OFFSET: usize = 9600;
    pub const TS_PROTECTED_OFFSET: usize = 9608;
    pub const TS_PROTECTED_BYTES: usize = 1344;
    pub const TS_DISCRETIONARY_OFFSET: usize = 10952;
    pub const TS_DISCRETIONARY_BYTES: usize = 1336;

    // Section 3 (shared by time-series and video channels).
    pub const RECORDING_TIME_OFFSET_OFFSET: usize = 12288;
    pub const DAYLIGHT_TIME_START_CODE_OFFSET: usize = 12296;
    pub const DAYLIGHT_TIME_END_CODE_OFFSET: usize = 12304;
    pub const SECTION_3_PROTECTED_OFFSET: usize = 15052;
    pub const SECTION_3_PROTECTED_BYTES: usize = 668;
    pub const SECTION_3_DISCRETIONARY_OFFSET: usize = 15720;
    pub const SECTION_3_DISCRETIONARY_BYTES: usize = 664;
}

pub mod record {
    pub const RECORD_HEADER_BYTES: usize = 24;
    pub const RECORD_CRC_OFFSET: usize = 0;
    pub const TOTAL_RECORD_BYTES_OFFSET: usize = 4;
    pub const START_TIME_OFFSET: usize = 8;
    pub const TYPE_STRING_OFFSET: usize = 16;
    pub const VERSION_MAJOR_OFFSET: usize = 21;
    pub const VERSION_MINOR_OFFSET: usize = 22;
    pub const ENCRYPTION_LEVEL_OFFSET: usize = 23;

    pub const RECORD_INDEX_BYTES: usize = 24;
    pub const INDEX_FILE_OFFSET_OFFSET: usize = 0;
    pub const INDEX_START_TIME_OFFSET: usize = 8;
    pub const INDEX_TYPE_STRING_OFFSET: usize = 16;
    pub const INDEX_VERSION_MAJOR_OFFSET: usize = 21;
    pub const INDEX_VERSION_MINOR_OFFSET: usize = 22;
    pub const INDEX_ENCRYPTION_LEVEL_OFFSET: usize = 23;
}

pub mod index {
    pub const TIME_SERIES_INDEX_BYTES: usize = 24;
    pub const TS_FILE_OFFSET_OFFSET: usize = 0;
    pub const TS_START_TIME_OFFSET: usize = 8;
    pub const TS_START_SAMPLE_NUMBER_OFFSET: usize = 16;

    pub const VIDEO_INDEX_BYTES: usize = 24;
    pub const VIDEO_FILE_OFFSET_OFFSET: usize = 0;
    pub const VIDEO_START_TIME_OFFSET: usize = 8;
    pub const VIDEO_START_FRAME_OFFSET: usize = 16;
    pub const VIDEO_FILE_NUMBER_OFFSET: usize = 20;
}

pub mod cmp {
    pub const CMP_BLOCK_HEADER_BYTES: usize = 56;
    pub const START_UID_OFFSET: usize = 0;
    pub const BLOCK_CRC_OFFSET: usize = 8;
    pub const BLOCK_FLAGS_OFFSET: usize = 12;
    pub const START_TIME_OFFSET: usize = 16;
    pub const ACQUISITION_CHANNEL_NUMBER_OFFSET: usize = 24;
    pub const TOTAL_BLOCK_BYTES_OFFSET: usize = 28;
    pub const NUMBER_OF_SAMPLES_OFFSET: usize = 32;
    pub const NUMBER_OF_RECORDS_OFFSET: usize = 36;
    pub const RECORD_REGION_BYTES_OFFSET: usize = 38;
    pub const PARAMETER_FLAGS_OFFSET: usize = 40;
    pub const PARAMETER_REGION_BYTES_OFFSET: usize = 44;
    pub const PROTECTED_REGION_BYTES_OFFSET: usize = 46;
    pub const DISCRETIONARY_REGION_BYTES_OFFSET: usize = 48;
    pub const MODEL_REGION_BYTES_OFFSET: usize = 50;
    pub const TOTAL_HEADER_BYTES_OFFSET: usize = 52;
    pub const VARIABLE_REGION_OFFSET: usize = 56;

    pub const CMP_BLOCK_START_UID: u64 = 0x0123_4567_89AB_CDEF;
}

pub mod record_payload {
    pub const SGMT_FIXED_BYTES: usize = 48;
    pub const STAT_BYTES: usize = 32;
    pub const EDFA_FIXED_BYTES: usize = 8;
    pub const SEIZ_FIXED_BYTES: usize = 1296;
    pub const SEIZ_CHANNEL_BLOCK_BYTES: usize = 280;
    pub const NLXP_BYTES: usize = 16;
    pub const CURS_BYTES: usize = 160;
    pub const EPOC_BYTES: usize = 176;
    pub const ESTI_BYTES: usize = 416;
    pub const CSTI_BYTES: usize = 208;
}
