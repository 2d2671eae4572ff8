//! The fixed on-disk structures shared by every MED file: the universal
//! header that prefixes every file, and the three metadata sections.
//!
//! Byte offsets quoted in field comments are absolute file offsets, per
//! [`crate::layout`]. Parsing (`from_bytes`) and serialization (`as_bytes`)
//! live in `med-in`/`med-out` respectively, following the teacher's split of
//! plain data structures in the core crate from I/O-facing conversions in
//! the read/write crates.
use crate::enums::FileTypeCode;
use crate::time::DaylightTimeChangeCode;

/// Prefixes every MED file (1024 bytes). See [`crate::layout::universal_header`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub struct UniversalHeader {
    /// CRC over bytes [4, 1024).
    pub header_crc: u32,
    /// CRC over bytes [1024, EOF).
    pub body_crc: u32,
    pub file_end_time: i64,
    pub number_of_entries: i64,
    pub maximum_entry_size: u32,
    /// Sentinel values used for channel-level/session-level files.
    pub segment_number: i32,
    pub type_string: String,
    pub version_major: u8,
    pub version_minor: u8,
    pub byte_order_code: u8,
    pub session_start_time: i64,
    pub file_start_time: i64,
    pub session_name: String,
    pub channel_name: String,
    pub anonymized_subject_id: String,
    pub session_uid: u64,
    pub channel_uid: u64,
    pub segment_uid: u64,
    pub file_uid: u64,
    pub provenance_uid: u64,
    pub level_1_password_validation_field: [u8; 16],
    pub level_2_password_validation_field: [u8; 16],
    pub level_3_password_validation_field: [u8; 16],
}

impl UniversalHeader {
    /// Sentinel meaning "this file has no segment (channel- or session-level)".
    pub const SEGMENT_NUMBER_NO_ENTRY: i32 = -1;

    pub fn new(type_code: FileTypeCode) -> Self {
        UniversalHeader {
            header_crc: 0,
            body_crc: 0,
            file_end_time: crate::time::UUTC_NO_ENTRY,
            number_of_entries: 0,
            maximum_entry_size: 0,
            segment_number: Self::SEGMENT_NUMBER_NO_ENTRY,
            type_string: type_code.as_str().to_string(),
            version_major: 1,
            version_minor: 0,
            byte_order_code: 0,
            session_start_time: crate::time::UUTC_NO_ENTRY,
            file_start_time: crate::time::UUTC_NO_ENTRY,
            session_name: String::new(),
            channel_name: String::new(),
            anonymized_subject_id: String::new(),
            session_uid: 0,
            channel_uid: 0,
            segment_uid: 0,
            file_uid: 0,
            provenance_uid: 0,
            level_1_password_validation_field: [0; 16],
            level_2_password_validation_field: [0; 16],
            level_3_password_validation_field: [0; 16],
        }
    }

    /// Validate this header's `type_string` against the file kind the caller
    /// expected to open.
    pub fn check_type(&self, expected: FileTypeCode) -> Result<(), crate::errors::MedError> {
        if self.type_string == expected.as_str() {
            Ok(())
        } else {
            Err(crate::errors::MedError::BadMagic {
                expected: expected.as_str().to_string(),
                found: self.type_string.clone(),
            })
        }
    }
}

impl std::fmt::Display for UniversalHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "UniversalHeader {{")?;
        writeln!(f, "    header_crc: {:#010x}", self.header_crc)?;
        writeln!(f, "    body_crc: {:#010x}", self.body_crc)?;
        writeln!(f, "    file_end_time: {}", self.file_end_time)?;
        writeln!(f, "    number_of_entries: {}", self.number_of_entries)?;
        writeln!(f, "    segment_number: {}", self.segment_number)?;
        writeln!(f, "    type_string: {}", self.type_string)?;
        writeln!(f, "    version: {}.{}", self.version_major, self.version_minor)?;
        writeln!(f, "    session_name: {}", self.session_name)?;
        writeln!(f, "    channel_name: {}", self.channel_name)?;
        write!(f, "}}")
    }
}

/// Metadata §1 (1024 bytes at offset 1024): password hints and per-section
/// encryption levels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub struct MetadataSection1 {
    pub section_2_encryption_level: i8,
    pub section_3_encryption_level: i8,
    pub level_1_password_hint: String,
    pub level_2_password_hint: String,
}

impl Default for MetadataSection1 {
    fn default() -> Self {
        MetadataSection1 {
            section_2_encryption_level: 1,
            section_3_encryption_level: 2,
            level_1_password_hint: String::new(),
            level_2_password_hint: String::new(),
        }
    }
}

/// Metadata §2 time-series variant fields (10240 bytes at absolute offset 2048).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeriesSection2 {
    pub reference_description: String,
    /// `FREQUENCY_NO_ENTRY = -1.0`, `FREQUENCY_VARIABLE = -2.0`.
    pub sampling_frequency: f64,
    pub low_frequency_filter_setting: f64,
    pub high_frequency_filter_setting: f64,
    pub notch_filter_frequency_setting: f64,
    pub ac_line_frequency: f64,
    pub amplitude_units_conversion_factor: f64,
    pub amplitude_units_description: String,
    pub time_base_units_conversion_factor: f64,
    pub time_base_units_description: String,
    pub absolute_start_sample_number: i64,
    pub number_of_samples: i64,
    pub number_of_blocks: i64,
    pub maximum_block_bytes: i64,
    pub maximum_block_samples: u32,
    pub maximum_block_keysample_bytes: u32,
    pub maximum_block_duration: f64,
    pub number_of_discontinuities: i64,
    pub maximum_contiguous_blocks: i64,
    pub maximum_contiguous_block_bytes: i64,
    pub maximum_contiguous_samples: i64,
}

impl TimeSeriesSection2 {
    pub const FREQUENCY_NO_ENTRY: f64 = -1.0;
    pub const FREQUENCY_VARIABLE: f64 = -2.0;
}

/// Metadata §2 video variant fields. Shares `reference_description` and a
/// frame-rate analog of `sampling_frequency` with the time-series variant,
/// but its protected/discretionary regions sit at different absolute offsets
/// (see [`crate::layout::metadata`]).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub struct VideoSection2 {
    pub reference_description: String,
    pub frame_rate: f64,
    pub number_of_frames: i64,
    pub number_of_clips: i64,
    pub maximum_clip_bytes: i64,
    pub number_of_discontinuities: i64,
    pub video_file_count: u32,
}

/// Sum type over the two metadata-§2 variants, discriminated by the owning
/// channel's directory extension (`.ticd` vs `.vicd`), per the design note on
/// codependent structs/unions in the reference format.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub enum MetadataSection2 {
    TimeSeries(TimeSeriesSection2),
    Video(VideoSection2),
}

impl MetadataSection2 {
    pub fn as_time_series(&self) -> Option<&TimeSeriesSection2> {
        match self {
            Self::TimeSeries(ts) => Some(ts),
            Self::Video(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoSection2> {
        match self {
            Self::Video(v) => Some(v),
            Self::TimeSeries(_) => None,
        }
    }
}

/// Metadata §3 (4096 bytes at absolute offset 12288): recording-time offset,
/// DST codes, timezone demographics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub struct MetadataSection3 {
    pub recording_time_offset: i64,
    pub daylight_time_start_code: DaylightTimeChangeCode,
    pub daylight_time_end_code: DaylightTimeChangeCode,
    pub standard_timezone_acronym: String,
    pub standard_timezone_string: String,
    pub daylight_timezone_acronym: String,
    pub daylight_timezone_string: String,
    /// `STANDARD_UTC_OFFSET_NO_ENTRY = 0x7FFFFFFF`.
    pub standard_utc_offset: i32,
    pub subject_name: String,
    pub subject_id: String,
    pub recording_location: String,
}

impl MetadataSection3 {
    pub const STANDARD_UTC_OFFSET_NO_ENTRY: i32 = 0x7FFF_FFFF;
}

/// Container for a full 16 KiB metadata file (universal header + 3 sections).
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFile {
    pub universal_header: UniversalHeader,
    pub section_1: MetadataSection1,
    pub section_2: MetadataSection2,
    pub section_3: MetadataSection3,
}
