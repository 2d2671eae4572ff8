//! `FromBytes`-style parsing of the fixed on-disk structures defined in
//! `med_core::header_structs`/`records`/`cmp`, grounded on the `HeaderFromBytes`
//! trait pattern used for SEG-Y's binary/trace headers: byte ranges pulled
//! with `try_into().unwrap()` against named offset constants, never a
//! hand-counted magic number.
//!
//! All multi-byte fields are little-endian; `UniversalHeader::byte_order_code`
//! is read and preserved but every file this crate writes or was written by
//! the MED reference tooling uses little-endian encoding, so no runtime
//! byte-swap path exists here (mirroring giga-segy-in's `use_le` flag
//! collapsing to a single branch when only one byte order is ever observed
//! in practice).
use std::convert::TryInto;

use med_core::cmp::{BlockFlags, CmpBlockHeader, ParameterFlags};
use med_core::enums::{EncryptionLevel, FileTypeCode, NlxTriggerMode, RecordTypeCode};
use med_core::errors::MedError;
use med_core::header_structs::{
    MetadataFile, MetadataSection1, MetadataSection2, MetadataSection3, TimeSeriesSection2,
    UniversalHeader, VideoSection2,
};
use med_core::layout::{cmp as cmp_layout, index, metadata, record, universal_header as uh};
use med_core::records::{
    CstiRecord, CursRecord, EdfaRecord, EpocRecord, EstiRecord, NlxpRecord, NoteRecord, Record,
    RecordHeader, RecordIndex, RecordPayload, SeizChannelBlock, SeizRecord, SgmtRecord, StatRecord,
    SylgRecord, TimeSeriesIndexEntry, VideoIndexEntry,
};
use med_core::text::fixed_bytes_to_string;
use med_core::time::DaylightTimeChangeCode;

fn u32le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn i32le(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn u64le(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn i64le(bytes: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn f64le(bytes: &[u8], offset: usize) -> f64 {
    f64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn f32le(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn str_field(bytes: &[u8], offset: usize, len: usize) -> String {
    fixed_bytes_to_string(&bytes[offset..offset + len])
}

/// Whether a channel's metadata §2/CMP data represents samples or frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    TimeSeries,
    Video,
}

pub fn parse_universal_header(bytes: &[u8]) -> Result<UniversalHeader, MedError> {
    if bytes.len() < universal_header_len() {
        return Err(MedError::FileTooShort);
    }
    let mut level_1 = [0u8; 16];
    let mut level_2 = [0u8; 16];
    let mut level_3 = [0u8; 16];
    level_1.copy_from_slice(&bytes[uh::LEVEL_1_PASSWORD_VALIDATION_FIELD_OFFSET..][..16]);
    level_2.copy_from_slice(&bytes[uh::LEVEL_2_PASSWORD_VALIDATION_FIELD_OFFSET..][..16]);
    level_3.copy_from_slice(&bytes[uh::LEVEL_3_PASSWORD_VALIDATION_FIELD_OFFSET..][..16]);

    Ok(UniversalHeader {
        header_crc: u32le(bytes, uh::HEADER_CRC_OFFSET),
        body_crc: u32le(bytes, uh::BODY_CRC_OFFSET),
        file_end_time: i64le(bytes, uh::FILE_END_TIME_OFFSET),
        number_of_entries: i64le(bytes, uh::NUMBER_OF_ENTRIES_OFFSET),
        maximum_entry_size: u32le(bytes, uh::MAXIMUM_ENTRY_SIZE_OFFSET),
        segment_number: i32le(bytes, uh::SEGMENT_NUMBER_OFFSET),
        type_string: str_field(bytes, uh::TYPE_STRING_OFFSET, 4),
        version_major: bytes[uh::VERSION_MAJOR_OFFSET],
        version_minor: bytes[uh::VERSION_MINOR_OFFSET],
        byte_order_code: bytes[uh::BYTE_ORDER_CODE_OFFSET],
        session_start_time: i64le(bytes, uh::SESSION_START_TIME_OFFSET),
        file_start_time: i64le(bytes, uh::FILE_START_TIME_OFFSET),
        session_name: str_field(bytes, uh::SESSION_NAME_OFFSET, uh::SESSION_NAME_BYTES),
        channel_name: str_field(bytes, uh::CHANNEL_NAME_OFFSET, uh::CHANNEL_NAME_BYTES),
        anonymized_subject_id: str_field(
            bytes,
            uh::ANONYMIZED_SUBJECT_ID_OFFSET,
            uh::ANONYMIZED_SUBJECT_ID_BYTES,
        ),
        session_uid: u64le(bytes, uh::SESSION_UID_OFFSET),
        channel_uid: u64le(bytes, uh::CHANNEL_UID_OFFSET),
        segment_uid: u64le(bytes, uh::SEGMENT_UID_OFFSET),
        file_uid: u64le(bytes, uh::FILE_UID_OFFSET),
        provenance_uid: u64le(bytes, uh::PROVENANCE_UID_OFFSET),
        level_1_password_validation_field: level_1,
        level_2_password_validation_field: level_2,
        level_3_password_validation_field: level_3,
    })
}

fn universal_header_len() -> usize {
    med_core::layout::UNIVERSAL_HEADER_BYTES
}

pub fn parse_metadata_file(bytes: &[u8], kind: ChannelKind) -> Result<MetadataFile, MedError> {
    if bytes.len() < metadata::METADATA_FILE_BYTES {
        return Err(MedError::FileTooShort);
    }
    let universal_header = parse_universal_header(bytes)?;
    universal_header.check_type(match kind {
        ChannelKind::TimeSeries => FileTypeCode::TimeSeriesMetadata,
        ChannelKind::Video => FileTypeCode::VideoMetadata,
    })?;

    // Password hints fill the 512 bytes preceding the two encryption-level
    // bytes, split evenly; nothing in `layout` names this split separately
    // since no other field reaches into it.
    const HINT_BYTES: usize = 256;
    let section_1 = MetadataSection1 {
        section_2_encryption_level: bytes[metadata::SECTION_2_ENCRYPTION_LEVEL_OFFSET] as i8,
        section_3_encryption_level: bytes[metadata::SECTION_3_ENCRYPTION_LEVEL_OFFSET] as i8,
        level_1_password_hint: str_field(bytes, metadata::SECTION_1_OFFSET, HINT_BYTES),
        level_2_password_hint: str_field(bytes, metadata::SECTION_1_OFFSET + HINT_BYTES, HINT_BYTES),
    };

    let section_2 = match kind {
        ChannelKind::TimeSeries => MetadataSection2::TimeSeries(TimeSeriesSection2 {
            reference_description: str_field(
                bytes,
                metadata::TS_REFERENCE_DESCRIPTION_OFFSET,
                metadata::TS_REFERENCE_DESCRIPTION_BYTES,
            ),
            sampling_frequency: f64le(bytes, metadata::TS_SAMPLING_FREQUENCY_OFFSET),
            low_frequency_filter_setting: f64le(bytes, metadata::TS_LOW_FREQUENCY_FILTER_SETTING_OFFSET),
            high_frequency_filter_setting: f64le(bytes, metadata::TS_HIGH_FREQUENCY_FILTER_SETTING_OFFSET),
            notch_filter_frequency_setting: f64le(bytes, metadata::TS_NOTCH_FILTER_FREQUENCY_SETTING_OFFSET),
            ac_line_frequency: f64le(bytes, metadata::TS_AC_LINE_FREQUENCY_OFFSET),
            amplitude_units_conversion_factor: f64le(bytes, metadata::TS_AMPLITUDE_UNITS_CONVERSION_FACTOR_OFFSET),
            amplitude_units_description: str_field(
                bytes,
                metadata::TS_AMPLITUDE_UNITS_DESCRIPTION_OFFSET,
                metadata::TS_AMPLITUDE_UNITS_DESCRIPTION_BYTES,
            ),
            time_base_units_conversion_factor: f64le(bytes, metadata::TS_TIME_BASE_UNITS_CONVERSION_FACTOR_OFFSET),
            time_base_units_description: str_field(
                bytes,
                metadata::TS_TIME_BASE_UNITS_DESCRIPTION_OFFSET,
                metadata::TS_TIME_BASE_UNITS_DESCRIPTION_BYTES,
            ),
            absolute_start_sample_number: i64le(bytes, metadata::TS_ABSOLUTE_START_SAMPLE_NUMBER_OFFSET),
            number_of_samples: i64le(bytes, metadata::TS_NUMBER_OF_SAMPLES_OFFSET),
            number_of_blocks: i64le(bytes, metadata::TS_NUMBER_OF_BLOCKS_OFFSET),
            maximum_block_bytes: i64le(bytes, metadata::TS_MAXIMUM_BLOCK_BYTES_OFFSET),
            maximum_block_samples: u32le(bytes, metadata::TS_MAXIMUM_BLOCK_SAMPLES_OFFSET),
            maximum_block_keysample_bytes: u32le(bytes, metadata::TS_MAXIMUM_BLOCK_KEYSAMPLE_BYTES_OFFSET),
            maximum_block_duration: f64le(bytes, metadata::TS_MAXIMUM_BLOCK_DURATION_OFFSET),
            number_of_discontinuities: i64le(bytes, metadata::TS_NUMBER_OF_DISCONTINUITIES_OFFSET),
            maximum_contiguous_blocks: i64le(bytes, metadata::TS_MAXIMUM_CONTIGUOUS_BLOCKS_OFFSET),
            maximum_contiguous_block_bytes: i64le(bytes, metadata::TS_MAXIMUM_CONTIGUOUS_BLOCK_BYTES_OFFSET),
            maximum_contiguous_samples: i64le(bytes, metadata::TS_MAXIMUM_CONTIGUOUS_SAMPLES_OFFSET),
        }),
        ChannelKind::Video => MetadataSection2::Video(VideoSection2 {
            reference_description: str_field(
                bytes,
                metadata::TS_REFERENCE_DESCRIPTION_OFFSET,
                metadata::TS_REFERENCE_DESCRIPTION_BYTES,
            ),
            frame_rate: f64le(bytes, metadata::TS_SAMPLING_FREQUENCY_OFFSET),
            number_of_frames: i64le(bytes, metadata::TS_NUMBER_OF_SAMPLES_OFFSET),
            number_of_clips: i64le(bytes, metadata::TS_NUMBER_OF_BLOCKS_OFFSET),
            maximum_clip_bytes: i64le(bytes, metadata::TS_MAXIMUM_BLOCK_BYTES_OFFSET),
            number_of_discontinuities: i64le(bytes, metadata::TS_NUMBER_OF_DISCONTINUITIES_OFFSET),
            video_file_count: u32le(bytes, metadata::TS_MAXIMUM_BLOCK_SAMPLES_OFFSET),
        }),
    };

    let section_3 = MetadataSection3 {
        recording_time_offset: i64le(bytes, metadata::RECORDING_TIME_OFFSET_OFFSET),
        daylight_time_start_code: DaylightTimeChangeCode::from_raw(i64le(bytes, metadata::DAYLIGHT_TIME_START_CODE_OFFSET)),
        daylight_time_end_code: DaylightTimeChangeCode::from_raw(i64le(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET)),
        standard_timezone_acronym: str_field(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET + 8, 8),
        standard_timezone_string: str_field(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET + 16, 64),
        daylight_timezone_acronym: str_field(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET + 80, 8),
        daylight_timezone_string: str_field(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET + 88, 64),
        standard_utc_offset: i32le(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET + 152),
        subject_name: str_field(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET + 156, 256),
        subject_id: str_field(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET + 412, 64),
        recording_location: str_field(bytes, metadata::DAYLIGHT_TIME_END_CODE_OFFSET + 476, 256),
    };

    Ok(MetadataFile {
        universal_header,
        section_1,
        section_2,
        section_3,
    })
}

pub fn parse_record_header(bytes: &[u8]) -> Result<RecordHeader, MedError> {
    if bytes.len() < record::RECORD_HEADER_BYTES {
        return Err(MedError::FileTooShort);
    }
    Ok(RecordHeader {
        record_crc: u32le(bytes, record::RECORD_CRC_OFFSET),
        total_record_bytes: u32le(bytes, record::TOTAL_RECORD_BYTES_OFFSET),
        start_time: i64le(bytes, record::START_TIME_OFFSET),
        type_code: RecordTypeCode::new(&str_field(bytes, record::TYPE_STRING_OFFSET, 4)),
        version_major: bytes[record::VERSION_MAJOR_OFFSET],
        version_minor: bytes[record::VERSION_MINOR_OFFSET],
        encryption_level: bytes[record::ENCRYPTION_LEVEL_OFFSET] as i8,
    })
}

pub fn parse_record_index(bytes: &[u8]) -> Result<RecordIndex, MedError> {
    if bytes.len() < record::RECORD_INDEX_BYTES {
        return Err(MedError::FileTooShort);
    }
    Ok(RecordIndex {
        file_offset: i64le(bytes, record::INDEX_FILE_OFFSET_OFFSET),
        start_time: i64le(bytes, record::INDEX_START_TIME_OFFSET),
        type_code: RecordTypeCode::new(&str_field(bytes, record::INDEX_TYPE_STRING_OFFSET, 4)),
        version_major: bytes[record::INDEX_VERSION_MAJOR_OFFSET],
        version_minor: bytes[record::INDEX_VERSION_MINOR_OFFSET],
        encryption_level: bytes[record::INDEX_ENCRYPTION_LEVEL_OFFSET] as i8,
    })
}

pub fn parse_time_series_index_entry(bytes: &[u8]) -> Result<TimeSeriesIndexEntry, MedError> {
    if bytes.len() < index::TIME_SERIES_INDEX_BYTES {
        return Err(MedError::FileTooShort);
    }
    Ok(TimeSeriesIndexEntry {
        file_offset: i64le(bytes, index::TS_FILE_OFFSET_OFFSET),
        start_time: i64le(bytes, index::TS_START_TIME_OFFSET),
        start_sample_number: i64le(bytes, index::TS_START_SAMPLE_NUMBER_OFFSET),
    })
}

pub fn parse_video_index_entry(bytes: &[u8]) -> Result<VideoIndexEntry, MedError> {
    if bytes.len() < index::VIDEO_INDEX_BYTES {
        return Err(MedError::FileTooShort);
    }
    Ok(VideoIndexEntry {
        file_offset: i64le(bytes, index::VIDEO_FILE_OFFSET_OFFSET),
        start_time: i64le(bytes, index::VIDEO_START_TIME_OFFSET),
        start_frame_number: i32le(bytes, index::VIDEO_START_FRAME_OFFSET),
        video_file_number: i32le(bytes, index::VIDEO_FILE_NUMBER_OFFSET),
    })
}

pub fn parse_cmp_block_header(bytes: &[u8]) -> Result<CmpBlockHeader, MedError> {
    if bytes.len() < cmp_layout::CMP_BLOCK_HEADER_BYTES {
        return Err(MedError::FileTooShort);
    }
    let start_uid = u64le(bytes, cmp_layout::START_UID_OFFSET);
    if start_uid != CmpBlockHeader::START_UID {
        return Err(MedError::BadBlockMagic { found: start_uid });
    }
    Ok(CmpBlockHeader {
        block_crc: u32le(bytes, cmp_layout::BLOCK_CRC_OFFSET),
        block_flags: BlockFlags(u32le(bytes, cmp_layout::BLOCK_FLAGS_OFFSET)),
        start_time: i64le(bytes, cmp_layout::START_TIME_OFFSET),
        acquisition_channel_number: i32le(bytes, cmp_layout::ACQUISITION_CHANNEL_NUMBER_OFFSET),
        total_block_bytes: u32le(bytes, cmp_layout::TOTAL_BLOCK_BYTES_OFFSET),
        number_of_samples: u32le(bytes, cmp_layout::NUMBER_OF_SAMPLES_OFFSET),
        number_of_records: u16::from_le_bytes(bytes[cmp_layout::NUMBER_OF_RECORDS_OFFSET..][..2].try_into().unwrap()),
        record_region_bytes: u16::from_le_bytes(bytes[cmp_layout::RECORD_REGION_BYTES_OFFSET..][..2].try_into().unwrap()),
        parameter_flags: ParameterFlags(u32le(bytes, cmp_layout::PARAMETER_FLAGS_OFFSET)),
        parameter_region_bytes: u16::from_le_bytes(bytes[cmp_layout::PARAMETER_REGION_BYTES_OFFSET..][..2].try_into().unwrap()),
        protected_region_bytes: u16::from_le_bytes(bytes[cmp_layout::PROTECTED_REGION_BYTES_OFFSET..][..2].try_into().unwrap()),
        discretionary_region_bytes: u16::from_le_bytes(bytes[cmp_layout::DISCRETIONARY_REGION_BYTES_OFFSET..][..2].try_into().unwrap()),
        model_region_bytes: u16::from_le_bytes(bytes[cmp_layout::MODEL_REGION_BYTES_OFFSET..][..2].try_into().unwrap()),
        total_header_bytes: u32le(bytes, cmp_layout::TOTAL_HEADER_BYTES_OFFSET),
    })
}

/// Parse a record body into its typed [`RecordPayload`], given the header's
/// type code and declared total length. `body` must be exactly
/// `header.total_record_bytes - RECORD_HEADER_BYTES` bytes; a shorter slice
/// is a truncation error, never a panic.
pub fn parse_record_body(header: &RecordHeader, body: &[u8]) -> Result<RecordPayload, MedError> {
    let declared = header.total_record_bytes.saturating_sub(record::RECORD_HEADER_BYTES as u32);
    if (body.len() as u32) < declared {
        return Err(MedError::RecordBodyTruncated {
            type_code: header.type_code.clone(),
            declared,
            available: body.len(),
        });
    }
    let body = &body[..declared as usize];

    use med_core::layout::record_payload as rp;
    let payload = match &header.type_code {
        RecordTypeCode::Sgmt => RecordPayload::Sgmt(SgmtRecord {
            end_time: i64le(body, 0),
            start_sample_number: i64le(body, 8),
            end_sample_number: i64le(body, 16),
            segment_uid: u64le(body, 24),
            segment_number: i32le(body, 32),
            acquisition_channel_number: i32le(body, 36),
            sampling_frequency: f64le(body, 40),
            segment_description: fixed_bytes_to_string(&body[rp::SGMT_FIXED_BYTES..]),
        }),
        RecordTypeCode::Stat => RecordPayload::Stat(StatRecord {
            minimum: i32le(body, 0),
            maximum: i32le(body, 4),
            mean: i32le(body, 8),
            median: i32le(body, 12),
            mode: i32le(body, 16),
            variance: f32le(body, 20),
            skewness: f32le(body, 24),
            kurtosis: f32le(body, 28),
        }),
        RecordTypeCode::Note => RecordPayload::Note(NoteRecord {
            text: fixed_bytes_to_string(body),
        }),
        RecordTypeCode::Edfa => RecordPayload::Edfa(EdfaRecord {
            duration_micros: i64le(body, 0),
            annotation: fixed_bytes_to_string(&body[rp::EDFA_FIXED_BYTES..]),
        }),
        RecordTypeCode::Seiz => {
            let onset_time = i64le(body, 0);
            let offset_time = i64le(body, 8);
            let onset_classification = str_field(body, 16, 256);
            let mut channels = Vec::new();
            let mut cursor = rp::SEIZ_FIXED_BYTES;
            while cursor + rp::SEIZ_CHANNEL_BLOCK_BYTES <= body.len() {
                let block = &body[cursor..cursor + rp::SEIZ_CHANNEL_BLOCK_BYTES];
                channels.push(SeizChannelBlock {
                    channel_name: str_field(block, 0, 32),
                    onset_time: i64le(block, 32),
                    offset_time: i64le(block, 40),
                    channel_description: str_field(block, 48, rp::SEIZ_CHANNEL_BLOCK_BYTES - 48),
                });
                cursor += rp::SEIZ_CHANNEL_BLOCK_BYTES;
            }
            RecordPayload::Seiz(SeizRecord {
                onset_time,
                offset_time,
                onset_classification,
                channels,
            })
        }
        RecordTypeCode::Sylg => RecordPayload::Sylg(SylgRecord {
            text: fixed_bytes_to_string(body),
        }),
        RecordTypeCode::Nlxp => RecordPayload::Nlxp(NlxpRecord {
            raw_port_value: u32le(body, 0),
            value: u32le(body, 4),
            subport: body[8],
            number_of_subports: body[9],
            trigger_mode: NlxTriggerMode::new(body[10]),
        }),
        RecordTypeCode::Curs => RecordPayload::Curs(CursRecord {
            id_number: i64le(body, 0),
            latency: i64le(body, 8),
            value: f64le(body, 16),
            name: str_field(body, 24, rp::CURS_BYTES - 24),
        }),
        RecordTypeCode::Epoc => RecordPayload::Epoc(EpocRecord {
            id_number: i64le(body, 0),
            end_time: i64le(body, 8),
            epoch_type: str_field(body, 16, 32),
            text: str_field(body, 48, rp::EPOC_BYTES - 48),
        }),
        RecordTypeCode::Esti => RecordPayload::Esti(EstiRecord {
            amplitude: f64le(body, 0),
            frequency: f64le(body, 8),
            pulse_width: i64le(body, 16),
            amplitude_unit_code: i32le(body, 24),
            mode_code: i32le(body, 28),
            waveform: str_field(body, 32, 32),
            anode: str_field(body, 64, 32),
            cathode: str_field(body, 96, rp::ESTI_BYTES - 96),
        }),
        RecordTypeCode::Csti => RecordPayload::Csti(CstiRecord {
            stimulus_duration: i64le(body, 0),
            task_type: str_field(body, 8, 32),
            stimulus_type: str_field(body, 40, 32),
            patient_response: str_field(body, 72, rp::CSTI_BYTES - 72),
        }),
        RecordTypeCode::Term => RecordPayload::Term,
        RecordTypeCode::Unknown(ref code) => {
            log::warn!("skipping record with unrecognized type code '{}'", code);
            RecordPayload::Unknown(body.to_vec())
        }
    };
    Ok(payload)
}

pub fn parse_record(header_bytes: &[u8], body: &[u8]) -> Result<Record, MedError> {
    let header = parse_record_header(header_bytes)?;
    let payload = parse_record_body(&header, body)?;
    Ok(Record { header, payload })
}

/// Encryption level wrapper used when deciding whether a parsed section
/// needs a decrypt pass before its fields are meaningful.
pub fn section_encryption(level: i8) -> EncryptionLevel {
    EncryptionLevel::from_raw(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_universal_header_bytes(type_string: &str) -> Vec<u8> {
        let mut bytes = vec![0u8; med_core::layout::UNIVERSAL_HEADER_BYTES];
        bytes[uh::HEADER_CRC_OFFSET..uh::HEADER_CRC_OFFSET + 4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        bytes[uh::TYPE_STRING_OFFSET..uh::TYPE_STRING_OFFSET + 4].copy_from_slice(type_string.as_bytes());
        bytes[uh::VERSION_MAJOR_OFFSET] = 1;
        bytes[uh::VERSION_MINOR_OFFSET] = 0;
        bytes[uh::SEGMENT_NUMBER_OFFSET..uh::SEGMENT_NUMBER_OFFSET + 4].copy_from_slice(&(-1i32).to_le_bytes());
        bytes
    }

    #[test]
    fn rejects_short_universal_header() {
        let short = vec![0u8; 100];
        assert!(matches!(parse_universal_header(&short), Err(MedError::FileTooShort)));
    }

    #[test]
    fn parses_universal_header_fields() {
        let bytes = make_universal_header_bytes("tmet");
        let header = parse_universal_header(&bytes).expect("parses");
        assert_eq!(header.header_crc, 0xDEAD_BEEF);
        assert_eq!(header.type_string, "tmet");
        assert_eq!(header.segment_number, -1);
        assert_eq!(header.version_major, 1);
    }

    #[test]
    fn metadata_file_rejects_wrong_type_string() {
        let mut bytes = vec![0u8; metadata::METADATA_FILE_BYTES];
        bytes[uh::TYPE_STRING_OFFSET..uh::TYPE_STRING_OFFSET + 4].copy_from_slice(b"vmet");
        let err = parse_metadata_file(&bytes, ChannelKind::TimeSeries).unwrap_err();
        assert!(matches!(err, MedError::BadMagic { .. }));
    }

    #[test]
    fn metadata_file_parses_time_series_section_2() {
        let mut bytes = vec![0u8; metadata::METADATA_FILE_BYTES];
        bytes[uh::TYPE_STRING_OFFSET..uh::TYPE_STRING_OFFSET + 4].copy_from_slice(b"tmet");
        bytes[metadata::TS_SAMPLING_FREQUENCY_OFFSET..metadata::TS_SAMPLING_FREQUENCY_OFFSET + 8]
            .copy_from_slice(&1000.0f64.to_le_bytes());
        let file = parse_metadata_file(&bytes, ChannelKind::TimeSeries).expect("parses");
        let ts = file.section_2.as_time_series().expect("time series variant");
        assert_eq!(ts.sampling_frequency, 1000.0);
    }

    #[test]
    fn cmp_block_header_rejects_bad_magic() {
        let bytes = vec![0u8; cmp_layout::CMP_BLOCK_HEADER_BYTES];
        assert!(matches!(
            parse_cmp_block_header(&bytes),
            Err(MedError::BadBlockMagic { found: 0 })
        ));
    }

    #[test]
    fn cmp_block_header_round_trips_fields() {
        let mut bytes = vec![0u8; cmp_layout::CMP_BLOCK_HEADER_BYTES];
        bytes[cmp_layout::START_UID_OFFSET..cmp_layout::START_UID_OFFSET + 8]
            .copy_from_slice(&CmpBlockHeader::START_UID.to_le_bytes());
        bytes[cmp_layout::NUMBER_OF_SAMPLES_OFFSET..cmp_layout::NUMBER_OF_SAMPLES_OFFSET + 4]
            .copy_from_slice(&256u32.to_le_bytes());
        let header = parse_cmp_block_header(&bytes).expect("parses");
        assert_eq!(header.number_of_samples, 256);
        assert_eq!(header.encryption_start_offset(), 256);
    }

    #[test]
    fn record_body_truncation_is_an_error_not_a_panic() {
        let mut header_bytes = vec![0u8; record::RECORD_HEADER_BYTES];
        header_bytes[record::TOTAL_RECORD_BYTES_OFFSET..record::TOTAL_RECORD_BYTES_OFFSET + 4]
            .copy_from_slice(&(record::RECORD_HEADER_BYTES as u32 + 32).to_le_bytes());
        header_bytes[record::TYPE_STRING_OFFSET..record::TYPE_STRING_OFFSET + 4].copy_from_slice(b"Stat");
        let header = parse_record_header(&header_bytes).expect("parses");
        let short_body = vec![0u8; 4];
        assert!(matches!(
            parse_record_body(&header, &short_body),
            Err(MedError::RecordBodyTruncated { .. })
        ));
    }

    #[test]
    fn parses_stat_record_body() {
        let mut header_bytes = vec![0u8; record::RECORD_HEADER_BYTES];
        header_bytes[record::TOTAL_RECORD_BYTES_OFFSET..record::TOTAL_RECORD_BYTES_OFFSET + 4]
            .copy_from_slice(&(record::RECORD_HEADER_BYTES as u32 + 32).to_le_bytes());
        header_bytes[record::TYPE_STRING_OFFSET..record::TYPE_STRING_OFFSET + 4].copy_from_slice(b"Stat");
        let header = parse_record_header(&header_bytes).expect("parses");

        let mut body = vec![0u8; 32];
        body[0..4].copy_from_slice(&(-5i32).to_le_bytes());
        body[4..8].copy_from_slice(&42i32.to_le_bytes());
        let payload = parse_record_body(&header, &body).expect("parses");
        match payload {
            RecordPayload::Stat(stat) => {
                assert_eq!(stat.minimum, -5);
                assert_eq!(stat.maximum, 42);
            }
            other => panic!("expected Stat payload, got {:?}", other),
        }
    }

    #[test]
    fn unknown_record_type_preserves_raw_body() {
        let mut header_bytes = vec![0u8; record::RECORD_HEADER_BYTES];
        header_bytes[record::TOTAL_RECORD_BYTES_OFFSET..record::TOTAL_RECORD_BYTES_OFFSET + 4]
            .copy_from_slice(&(record::RECORD_HEADER_BYTES as u32 + 3).to_le_bytes());
        header_bytes[record::TYPE_STRING_OFFSET..record::TYPE_STRING_OFFSET + 4].copy_from_slice(b"Xtra");
        let header = parse_record_header(&header_bytes).expect("parses");
        let body = vec![1, 2, 3];
        let payload = parse_record_body(&header, &body).expect("parses");
        assert_eq!(payload, RecordPayload::Unknown(vec![1, 2, 3]));
    }
}
