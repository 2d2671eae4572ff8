//! Serialization of the fixed on-disk structures (C4/C6 write side): the
//! inverse of `med_in::convert_headers`. Every multi-byte field is written
//! little-endian, matching the only byte order this crate ever produces.
use med_core::crc::crc32;
use med_core::header_structs::{MetadataFile, MetadataSection2, UniversalHeader};
use med_core::layout::{metadata, universal_header as uh, UNIVERSAL_HEADER_BYTES};
use med_core::text::string_to_fixed_bytes;

fn write_universal_header_fields(bytes: &mut [u8], header: &UniversalHeader) {
    bytes[uh::FILE_END_TIME_OFFSET..][..8].copy_from_slice(&header.file_end_time.to_le_bytes());
    bytes[uh::NUMBER_OF_ENTRIES_OFFSET..][..8].copy_from_slice(&header.number_of_entries.to_le_bytes());
    bytes[uh::MAXIMUM_ENTRY_SIZE_OFFSET..][..4].copy_from_slice(&header.maximum_entry_size.to_le_bytes());
    bytes[uh::SEGMENT_NUMBER_OFFSET..][..4].copy_from_slice(&header.segment_number.to_le_bytes());
    bytes[uh::TYPE_STRING_OFFSET..][..4].copy_from_slice(&string_to_fixed_bytes(&header.type_string, 4));
    bytes[uh::VERSION_MAJOR_OFFSET] = header.version_major;
    bytes[uh::VERSION_MINOR_OFFSET] = header.version_minor;
    bytes[uh::BYTE_ORDER_CODE_OFFSET] = header.byte_order_code;
    bytes[uh::SESSION_START_TIME_OFFSET..][..8].copy_from_slice(&header.session_start_time.to_le_bytes());
    bytes[uh::FILE_START_TIME_OFFSET..][..8].copy_from_slice(&header.file_start_time.to_le_bytes());
    bytes[uh::SESSION_NAME_OFFSET..][..uh::SESSION_NAME_BYTES]
        .copy_from_slice(&string_to_fixed_bytes(&header.session_name, uh::SESSION_NAME_BYTES));
    bytes[uh::CHANNEL_NAME_OFFSET..][..uh::CHANNEL_NAME_BYTES]
        .copy_from_slice(&string_to_fixed_bytes(&header.channel_name, uh::CHANNEL_NAME_BYTES));
    bytes[uh::ANONYMIZED_SUBJECT_ID_OFFSET..][..uh::ANONYMIZED_SUBJECT_ID_BYTES].copy_from_slice(
        &string_to_fixed_bytes(&header.anonymized_subject_id, uh::ANONYMIZED_SUBJECT_ID_BYTES),
    );
    bytes[uh::SESSION_UID_OFFSET..][..8].copy_from_slice(&header.session_uid.to_le_bytes());
    bytes[uh::CHANNEL_UID_OFFSET..][..8].copy_from_slice(&header.channel_uid.to_le_bytes());
    bytes[uh::SEGMENT_UID_OFFSET..][..8].copy_from_slice(&header.segment_uid.to_le_bytes());
    bytes[uh::FILE_UID_OFFSET..][..8].copy_from_slice(&header.file_uid.to_le_bytes());
    bytes[uh::PROVENANCE_UID_OFFSET..][..8].copy_from_slice(&header.provenance_uid.to_le_bytes());
    bytes[uh::LEVEL_1_PASSWORD_VALIDATION_FIELD_OFFSET..][..16]
        .copy_from_slice(&header.level_1_password_validation_field);
    bytes[uh::LEVEL_2_PASSWORD_VALIDATION_FIELD_OFFSET..][..16]
        .copy_from_slice(&header.level_2_password_validation_field);
    bytes[uh::LEVEL_3_PASSWORD_VALIDATION_FIELD_OFFSET..][..16]
        .copy_from_slice(&header.level_3_password_validation_field);
}

/// Write a complete 1024-byte universal header into `bytes[..1024]`.
/// `header.body_crc` must already be set by the caller (it is computed over
/// the body that follows the header, which this function never sees);
/// `header_crc` is computed here over bytes `[4, 1024)` once everything
/// else, including `body_crc`, is in place.
pub fn write_universal_header(bytes: &mut [u8], header: &mut UniversalHeader) {
    write_universal_header_fields(bytes, header);
    bytes[uh::BODY_CRC_OFFSET..][..4].copy_from_slice(&header.body_crc.to_le_bytes());
    header.header_crc = crc32(&bytes[uh::HEADER_CRC_OFFSET + 4..UNIVERSAL_HEADER_BYTES]);
    bytes[uh::HEADER_CRC_OFFSET..][..4].copy_from_slice(&header.header_crc.to_le_bytes());
}

/// Build a complete universal-header-only file body (for files whose only
/// content is the 1024-byte header, e.g. an empty records data file), with
/// `body_crc` computed over `body`.
pub fn finalize_universal_header(header: &mut UniversalHeader, body: &[u8]) -> Vec<u8> {
    header.body_crc = crc32(body);
    let mut bytes = vec![0u8; UNIVERSAL_HEADER_BYTES];
    write_universal_header(&mut bytes, header);
    bytes
}

/// Serialize a complete 16384-byte metadata file: universal header plus the
/// three metadata sections, with `body_crc` computed over bytes `[1024, 16384)`.
pub fn metadata_file_bytes(file: &mut MetadataFile) -> Vec<u8> {
    let mut bytes = vec![0u8; metadata::METADATA_FILE_BYTES];

    bytes[metadata::SECTION_2_ENCRYPTION_LEVEL_OFFSET] = file.section_1.section_2_encryption_level as u8;
    bytes[metadata::SECTION_3_ENCRYPTION_LEVEL_OFFSET] = file.section_1.section_3_encryption_level as u8;
    const HINT_BYTES: usize = 256;
    bytes[metadata::SECTION_1_OFFSET..][..HINT_BYTES]
        .copy_from_slice(&string_to_fixed_bytes(&file.section_1.level_1_password_hint, HINT_BYTES));
    bytes[metadata::SECTION_1_OFFSET + HINT_BYTES..][..HINT_BYTES]
        .copy_from_slice(&string_to_fixed_bytes(&file.section_1.level_2_password_hint, HINT_BYTES));

    match &file.section_2 {
        MetadataSection2::TimeSeries(ts) => {
            bytes[metadata::TS_REFERENCE_DESCRIPTION_OFFSET..][..metadata::TS_REFERENCE_DESCRIPTION_BYTES]
                .copy_from_slice(&string_to_fixed_bytes(&ts.reference_description, metadata::TS_REFERENCE_DESCRIPTION_BYTES));
            bytes[metadata::TS_SAMPLING_FREQUENCY_OFFSET..][..8].copy_from_slice(&ts.sampling_frequency.to_le_bytes());
            bytes[metadata::TS_LOW_FREQUENCY_FILTER_SETTING_OFFSET..][..8]
                .copy_from_slice(&ts.low_frequency_filter_setting.to_le_bytes());
            bytes[metadata::TS_HIGH_FREQUENCY_FILTER_SETTING_OFFSET..][..8]
                .copy_from_slice(&ts.high_frequency_filter_setting.to_le_bytes());
            bytes[metadata::TS_NOTCH_FILTER_FREQUENCY_SETTING_OFFSET..][..8]
                .copy_from_slice(&ts.notch_filter_frequency_setting.to_le_bytes());
            bytes[metadata::TS_AC_LINE_FREQUENCY_OFFSET..][..8].copy_from_slice(&ts.ac_line_frequency.to_le_bytes());
            bytes[metadata::TS_AMPLITUDE_UNITS_CONVERSION_FACTOR_OFFSET..][..8]
                .copy_from_slice(&ts.amplitude_units_conversion_factor.to_le_bytes());
            bytes[metadata::TS_AMPLITUDE_UNITS_DESCRIPTION_OFFSET..][..metadata::TS_AMPLITUDE_UNITS_DESCRIPTION_BYTES]
                .copy_from_slice(&string_to_fixed_bytes(&ts.amplitude_units_description, metadata::TS_AMPLITUDE_UNITS_DESCRIPTION_BYTES));
            bytes[metadata::TS_TIME_BASE_UNITS_CONVERSION_FACTOR_OFFSET..][..8]
                .copy_from_slice(&ts.time_base_units_conversion_factor.to_le_bytes());
            bytes[metadata::TS_TIME_BASE_UNITS_DESCRIPTION_OFFSET..][..metadata::TS_TIME_BASE_UNITS_DESCRIPTION_BYTES]
                .copy_from_slice(&string_to_fixed_bytes(&ts.time_base_units_description, metadata::TS_TIME_BASE_UNITS_DESCRIPTION_BYTES));
            bytes[metadata::TS_ABSOLUTE_START_SAMPLE_NUMBER_OFFSET..][..8]
                .copy_from_slice(&ts.absolute_start_sample_number.to_le_bytes());
            bytes[metadata::TS_NUMBER_OF_SAMPLES_OFFSET..][..8].copy_from_slice(&ts.number_of_samples.to_le_bytes());
            bytes[metadata::TS_NUMBER_OF_BLOCKS_OFFSET..][..8].copy_from_slice(&ts.number_of_blocks.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_BLOCK_BYTES_OFFSET..][..8].copy_from_slice(&ts.maximum_block_bytes.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_BLOCK_SAMPLES_OFFSET..][..4].copy_from_slice(&ts.maximum_block_samples.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_BLOCK_KEYSAMPLE_BYTES_OFFSET..][..4]
                .copy_from_slice(&ts.maximum_block_keysample_bytes.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_BLOCK_DURATION_OFFSET..][..8].copy_from_slice(&ts.maximum_block_duration.to_le_bytes());
            bytes[metadata::TS_NUMBER_OF_DISCONTINUITIES_OFFSET..][..8]
                .copy_from_slice(&ts.number_of_discontinuities.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_CONTIGUOUS_BLOCKS_OFFSET..][..8]
                .copy_from_slice(&ts.maximum_contiguous_blocks.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_CONTIGUOUS_BLOCK_BYTES_OFFSET..][..8]
                .copy_from_slice(&ts.maximum_contiguous_block_bytes.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_CONTIGUOUS_SAMPLES_OFFSET..][..8]
                .copy_from_slice(&ts.maximum_contiguous_samples.to_le_bytes());
        }
        MetadataSection2::Video(v) => {
            bytes[metadata::TS_REFERENCE_DESCRIPTION_OFFSET..][..metadata::TS_REFERENCE_DESCRIPTION_BYTES]
                .copy_from_slice(&string_to_fixed_bytes(&v.reference_description, metadata::TS_REFERENCE_DESCRIPTION_BYTES));
            bytes[metadata::TS_SAMPLING_FREQUENCY_OFFSET..][..8].copy_from_slice(&v.frame_rate.to_le_bytes());
            bytes[metadata::TS_NUMBER_OF_SAMPLES_OFFSET..][..8].copy_from_slice(&v.number_of_frames.to_le_bytes());
            bytes[metadata::TS_NUMBER_OF_BLOCKS_OFFSET..][..8].copy_from_slice(&v.number_of_clips.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_BLOCK_BYTES_OFFSET..][..8].copy_from_slice(&v.maximum_clip_bytes.to_le_bytes());
            bytes[metadata::TS_NUMBER_OF_DISCONTINUITIES_OFFSET..][..8]
                .copy_from_slice(&v.number_of_discontinuities.to_le_bytes());
            bytes[metadata::TS_MAXIMUM_BLOCK_SAMPLES_OFFSET..][..4].copy_from_slice(&v.video_file_count.to_le_bytes());
        }
    }

    let s3 = &file.section_3;
    let tz_base = metadata::DAYLIGHT_TIME_END_CODE_OFFSET;
    bytes[metadata::RECORDING_TIME_OFFSET_OFFSET..][..8].copy_from_slice(&s3.recording_time_offset.to_le_bytes());
    bytes[metadata::DAYLIGHT_TIME_START_CODE_OFFSET..][..8]
        .copy_from_slice(&s3.daylight_time_start_code.to_raw().to_le_bytes());
    bytes[metadata::DAYLIGHT_TIME_END_CODE_OFFSET..][..8]
        .copy_from_slice(&s3.daylight_time_end_code.to_raw().to_le_bytes());
    bytes[tz_base + 8..][..8].copy_from_slice(&string_to_fixed_bytes(&s3.standard_timezone_acronym, 8));
    bytes[tz_base + 16..][..64].copy_from_slice(&string_to_fixed_bytes(&s3.standard_timezone_string, 64));
    bytes[tz_base + 80..][..8].copy_from_slice(&string_to_fixed_bytes(&s3.daylight_timezone_acronym, 8));
    bytes[tz_base + 88..][..64].copy_from_slice(&string_to_fixed_bytes(&s3.daylight_timezone_string, 64));
    bytes[tz_base + 152..][..4].copy_from_slice(&s3.standard_utc_offset.to_le_bytes());
    bytes[tz_base + 156..][..256].copy_from_slice(&string_to_fixed_bytes(&s3.subject_name, 256));
    bytes[tz_base + 412..][..64].copy_from_slice(&string_to_fixed_bytes(&s3.subject_id, 64));
    bytes[tz_base + 476..][..256].copy_from_slice(&string_to_fixed_bytes(&s3.recording_location, 256));

    file.universal_header.body_crc = crc32(&bytes[metadata::SECTION_1_OFFSET..]);
    write_universal_header(&mut bytes[..UNIVERSAL_HEADER_BYTES], &mut file.universal_header);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use med_core::enums::FileTypeCode;
    use med_core::header_structs::{MetadataSection1, MetadataSection3, TimeSeriesSection2};
    use med_core::time::DaylightTimeChangeCode;
    use med_in::convert_headers;

    fn blank_metadata_file(type_code: FileTypeCode) -> MetadataFile {
        MetadataFile {
            universal_header: UniversalHeader::new(type_code),
            section_1: MetadataSection1::default(),
            section_2: MetadataSection2::TimeSeries(TimeSeriesSection2::default()),
            section_3: MetadataSection3 {
                recording_time_offset: 0,
                daylight_time_start_code: DaylightTimeChangeCode::from_raw(0),
                daylight_time_end_code: DaylightTimeChangeCode::from_raw(0),
                standard_timezone_acronym: String::new(),
                standard_timezone_string: String::new(),
                daylight_timezone_acronym: String::new(),
                daylight_timezone_string: String::new(),
                standard_utc_offset: MetadataSection3::STANDARD_UTC_OFFSET_NO_ENTRY,
                subject_name: String::new(),
                subject_id: String::new(),
                recording_location: String::new(),
            },
        }
    }

    #[test]
    fn universal_header_round_trips_through_the_reader() {
        let mut header = UniversalHeader::new(FileTypeCode::TimeSeriesMetadata);
        header.channel_name = "lfp_01".to_string();
        header.session_name = "session_a".to_string();
        header.segment_number = 3;
        let mut bytes = vec![0u8; UNIVERSAL_HEADER_BYTES];
        write_universal_header(&mut bytes, &mut header);

        let parsed = convert_headers::parse_universal_header(&bytes).expect("parses");
        assert_eq!(parsed.channel_name, "lfp_01");
        assert_eq!(parsed.session_name, "session_a");
        assert_eq!(parsed.segment_number, 3);
        assert_eq!(parsed.header_crc, header.header_crc);
    }

    #[test]
    fn metadata_file_round_trips_time_series_section_2() {
        let mut file = blank_metadata_file(FileTypeCode::TimeSeriesMetadata);
        file.universal_header.channel_name = "lfp_01".to_string();
        if let MetadataSection2::TimeSeries(ts) = &mut file.section_2 {
            ts.sampling_frequency = 2000.0;
            ts.number_of_samples = 123456;
        }
        let bytes = metadata_file_bytes(&mut file);

        let parsed = convert_headers::parse_metadata_file(&bytes, convert_headers::ChannelKind::TimeSeries).expect("parses");
        let ts = parsed.section_2.as_time_series().expect("time series variant");
        assert_eq!(ts.sampling_frequency, 2000.0);
        assert_eq!(ts.number_of_samples, 123456);
        assert_eq!(parsed.universal_header.channel_name, "lfp_01");
    }

    #[test]
    fn metadata_file_header_crc_matches_reader_expectations() {
        let mut file = blank_metadata_file(FileTypeCode::VideoMetadata);
        file.section_2 = MetadataSection2::Video(Default::default());
        let bytes = metadata_file_bytes(&mut file);
        let parsed = convert_headers::parse_metadata_file(&bytes, convert_headers::ChannelKind::Video).expect("parses");
        assert_eq!(parsed.universal_header.header_crc, file.universal_header.header_crc);
        assert_eq!(parsed.universal_header.body_crc, file.universal_header.body_crc);
    }
}
