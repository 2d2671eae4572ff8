//! Serialization of records and index entries (C6 write side): the inverse
//! of `med_in::convert_headers`'s record and index parsing.
use med_core::crc::crc32;
use med_core::enums::RecordTypeCode;
use med_core::layout::{index, record, record_payload as rp};
use med_core::records::{
    CstiRecord, CursRecord, EdfaRecord, EpocRecord, EstiRecord, NlxpRecord, NoteRecord, Record,
    RecordIndex, RecordPayload, SeizRecord, SgmtRecord, StatRecord, SylgRecord,
    TimeSeriesIndexEntry, VideoIndexEntry,
};
use med_core::text::string_to_fixed_bytes;
use num::ToPrimitive;

fn pad16(mut bytes: Vec<u8>) -> Vec<u8> {
    let rem = bytes.len() % 16;
    if rem != 0 {
        bytes.resize(bytes.len() + (16 - rem), 0);
    }
    bytes
}

fn sgmt_bytes(r: &SgmtRecord) -> Vec<u8> {
    let mut fixed = vec![0u8; rp::SGMT_FIXED_BYTES];
    fixed[0..8].copy_from_slice(&r.end_time.to_le_bytes());
    fixed[8..16].copy_from_slice(&r.start_sample_number.to_le_bytes());
    fixed[16..24].copy_from_slice(&r.end_sample_number.to_le_bytes());
    fixed[24..32].copy_from_slice(&r.segment_uid.to_le_bytes());
    fixed[32..36].copy_from_slice(&r.segment_number.to_le_bytes());
    fixed[36..40].copy_from_slice(&r.acquisition_channel_number.to_le_bytes());
    fixed[40..48].copy_from_slice(&r.sampling_frequency.to_le_bytes());
    fixed.extend_from_slice(r.segment_description.as_bytes());
    pad16(fixed)
}

fn stat_bytes(r: &StatRecord) -> Vec<u8> {
    let mut bytes = vec![0u8; rp::STAT_BYTES];
    bytes[0..4].copy_from_slice(&r.minimum.to_le_bytes());
    bytes[4..8].copy_from_slice(&r.maximum.to_le_bytes());
    bytes[8..12].copy_from_slice(&r.mean.to_le_bytes());
    bytes[12..16].copy_from_slice(&r.median.to_le_bytes());
    bytes[16..20].copy_from_slice(&r.mode.to_le_bytes());
    bytes[20..24].copy_from_slice(&r.variance.to_le_bytes());
    bytes[24..28].copy_from_slice(&r.skewness.to_le_bytes());
    bytes[28..32].copy_from_slice(&r.kurtosis.to_le_bytes());
    bytes
}

fn note_bytes(r: &NoteRecord) -> Vec<u8> {
    r.text.as_bytes().to_vec()
}

fn edfa_bytes(r: &EdfaRecord) -> Vec<u8> {
    let mut bytes = vec![0u8; rp::EDFA_FIXED_BYTES];
    bytes[0..8].copy_from_slice(&r.duration_micros.to_le_bytes());
    bytes.extend_from_slice(r.annotation.as_bytes());
    bytes
}

fn seiz_bytes(r: &SeizRecord) -> Vec<u8> {
    let mut bytes = vec![0u8; rp::SEIZ_FIXED_BYTES];
    bytes[0..8].copy_from_slice(&r.onset_time.to_le_bytes());
    bytes[8..16].copy_from_slice(&r.offset_time.to_le_bytes());
    bytes[16..][..256].copy_from_slice(&string_to_fixed_bytes(&r.onset_classification, 256));
    for channel in &r.channels {
        let mut block = vec![0u8; rp::SEIZ_CHANNEL_BLOCK_BYTES];
        block[0..32].copy_from_slice(&string_to_fixed_bytes(&channel.channel_name, 32));
        block[32..40].copy_from_slice(&channel.onset_time.to_le_bytes());
        block[40..48].copy_from_slice(&channel.offset_time.to_le_bytes());
        block[48..][..232].copy_from_slice(&string_to_fixed_bytes(&channel.channel_description, 232));
        bytes.extend_from_slice(&block);
    }
    bytes
}

fn sylg_bytes(r: &SylgRecord) -> Vec<u8> {
    r.text.as_bytes().to_vec()
}

fn nlxp_bytes(r: &NlxpRecord) -> Vec<u8> {
    let mut bytes = vec![0u8; rp::NLXP_BYTES];
    bytes[0..4].copy_from_slice(&r.raw_port_value.to_le_bytes());
    bytes[4..8].copy_from_slice(&r.value.to_le_bytes());
    bytes[8] = r.subport;
    bytes[9] = r.number_of_subports;
    bytes[10] = r.trigger_mode.to_u8().unwrap_or(0xFF);
    bytes
}

fn curs_bytes(r: &CursRecord) -> Vec<u8> {
    let mut bytes = vec![0u8; rp::CURS_BYTES];
    bytes[0..8].copy_from_slice(&r.id_number.to_le_bytes());
    bytes[8..16].copy_from_slice(&r.latency.to_le_bytes());
    bytes[16..24].copy_from_slice(&r.value.to_le_bytes());
    bytes[24..].copy_from_slice(&string_to_fixed_bytes(&r.name, rp::CURS_BYTES - 24));
    bytes
}

fn epoc_bytes(r: &EpocRecord) -> Vec<u8> {
    let mut bytes = vec![0u8; rp::EPOC_BYTES];
    bytes[0..8].copy_from_slice(&r.id_number.to_le_bytes());
    bytes[8..16].copy_from_slice(&r.end_time.to_le_bytes());
    bytes[16..][..32].copy_from_slice(&string_to_fixed_bytes(&r.epoch_type, 32));
    bytes[48..].copy_from_slice(&string_to_fixed_bytes(&r.text, rp::EPOC_BYTES - 48));
    bytes
}

fn esti_bytes(r: &EstiRecord) -> Vec<u8> {
    let mut bytes = vec![0u8; rp::ESTI_BYTES];
    bytes[0..8].copy_from_slice(&r.amplitude.to_le_bytes());
    bytes[8..16].copy_from_slice(&r.frequency.to_le_bytes());
    bytes[16..24].copy_from_slice(&r.pulse_width.to_le_bytes());
    bytes[24..28].copy_from_slice(&r.amplitude_unit_code.to_le_bytes());
    bytes[28..32].copy_from_slice(&r.mode_code.to_le_bytes());
    bytes[32..][..32].copy_from_slice(&string_to_fixed_bytes(&r.waveform, 32));
    bytes[64..][..32].copy_from_slice(&string_to_fixed_bytes(&r.anode, 32));
    bytes[96..].copy_from_slice(&string_to_fixed_bytes(&r.cathode, rp::ESTI_BYTES - 96));
    bytes
}

fn csti_bytes(r: &CstiRecord) -> Vec<u8> {
    let mut bytes = vec![0u8; rp::CSTI_BYTES];
    bytes[0..8].copy_from_slice(&r.stimulus_duration.to_le_bytes());
    bytes[8..][..32].copy_from_slice(&string_to_fixed_bytes(&r.task_type, 32));
    bytes[40..][..32].copy_from_slice(&string_to_fixed_bytes(&r.stimulus_type, 32));
    bytes[72..].copy_from_slice(&string_to_fixed_bytes(&r.patient_response, rp::CSTI_BYTES - 72));
    bytes
}

/// Serialize a record payload's body, matching the exact byte layout that
/// `convert_headers::parse_record_body` expects for this type code.
pub fn record_payload_bytes(payload: &RecordPayload) -> Vec<u8> {
    match payload {
        RecordPayload::Sgmt(r) => sgmt_bytes(r),
        RecordPayload::Stat(r) => stat_bytes(r),
        RecordPayload::Note(r) => note_bytes(r),
        RecordPayload::Edfa(r) => edfa_bytes(r),
        RecordPayload::Seiz(r) => seiz_bytes(r),
        RecordPayload::Sylg(r) => sylg_bytes(r),
        RecordPayload::Nlxp(r) => nlxp_bytes(r),
        RecordPayload::Curs(r) => curs_bytes(r),
        RecordPayload::Epoc(r) => epoc_bytes(r),
        RecordPayload::Esti(r) => esti_bytes(r),
        RecordPayload::Csti(r) => csti_bytes(r),
        RecordPayload::Term => Vec::new(),
        RecordPayload::Unknown(bytes) => bytes.clone(),
    }
}

/// Serialize a complete record: header followed by body, with
/// `record_crc` computed over bytes `[4, total_record_bytes)`.
pub fn record_bytes(record_value: &Record) -> Vec<u8> {
    let body = record_payload_bytes(&record_value.payload);
    let total = record::RECORD_HEADER_BYTES + body.len();
    let mut bytes = vec![0u8; total];

    bytes[record::TOTAL_RECORD_BYTES_OFFSET..][..4].copy_from_slice(&(total as u32).to_le_bytes());
    bytes[record::START_TIME_OFFSET..][..8].copy_from_slice(&record_value.header.start_time.to_le_bytes());
    bytes[record::TYPE_STRING_OFFSET..][..4]
        .copy_from_slice(&string_to_fixed_bytes(record_value.payload.type_code().as_str(), 4));
    bytes[record::VERSION_MAJOR_OFFSET] = record_value.header.version_major;
    bytes[record::VERSION_MINOR_OFFSET] = record_value.header.version_minor;
    bytes[record::ENCRYPTION_LEVEL_OFFSET] = record_value.header.encryption_level as u8;
    bytes[record::RECORD_HEADER_BYTES..].copy_from_slice(&body);

    let crc = crc32(&bytes[record::RECORD_CRC_OFFSET + 4..]);
    bytes[record::RECORD_CRC_OFFSET..][..4].copy_from_slice(&crc.to_le_bytes());
    bytes
}

/// Serialize a single 24-byte record index entry.
pub fn record_index_bytes(entry: &RecordIndex) -> [u8; 24] {
    let mut bytes = [0u8; 24];
    bytes[record::INDEX_FILE_OFFSET_OFFSET..][..8].copy_from_slice(&entry.file_offset.to_le_bytes());
    bytes[record::INDEX_START_TIME_OFFSET..][..8].copy_from_slice(&entry.start_time.to_le_bytes());
    bytes[record::INDEX_TYPE_STRING_OFFSET..][..4]
        .copy_from_slice(&string_to_fixed_bytes(entry.type_code.as_str(), 4));
    bytes[record::INDEX_VERSION_MAJOR_OFFSET] = entry.version_major;
    bytes[record::INDEX_VERSION_MINOR_OFFSET] = entry.version_minor;
    bytes[record::INDEX_ENCRYPTION_LEVEL_OFFSET] = entry.encryption_level as u8;
    bytes
}

/// Build the terminal record index sentinel that closes a records index file.
pub fn terminal_record_index_bytes(segment_end_time: i64, data_file_length: i64) -> [u8; 24] {
    record_index_bytes(&RecordIndex::terminal(segment_end_time, data_file_length))
}

/// Serialize a single 24-byte time-series index entry.
pub fn time_series_index_entry_bytes(entry: &TimeSeriesIndexEntry) -> [u8; 24] {
    let mut bytes = [0u8; 24];
    bytes[index::TS_FILE_OFFSET_OFFSET..][..8].copy_from_slice(&entry.file_offset.to_le_bytes());
    bytes[index::TS_START_TIME_OFFSET..][..8].copy_from_slice(&entry.start_time.to_le_bytes());
    bytes[index::TS_START_SAMPLE_NUMBER_OFFSET..][..8].copy_from_slice(&entry.start_sample_number.to_le_bytes());
    bytes
}

/// Serialize a single 24-byte video index entry.
pub fn video_index_entry_bytes(entry: &VideoIndexEntry) -> [u8; 24] {
    let mut bytes = [0u8; 24];
    bytes[index::VIDEO_FILE_OFFSET_OFFSET..][..8].copy_from_slice(&entry.file_offset.to_le_bytes());
    bytes[index::VIDEO_START_TIME_OFFSET..][..8].copy_from_slice(&entry.start_time.to_le_bytes());
    bytes[index::VIDEO_START_FRAME_OFFSET..][..4].copy_from_slice(&entry.start_frame_number.to_le_bytes());
    bytes[index::VIDEO_FILE_NUMBER_OFFSET..][..4].copy_from_slice(&entry.video_file_number.to_le_bytes());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use med_core::enums::{EncryptionLevel, NlxTriggerMode};
    use med_core::records::RecordHeader;
    use med_in::convert_headers;

    #[test]
    fn sgmt_record_round_trips() {
        let payload = RecordPayload::Sgmt(SgmtRecord {
            end_time: 1_000,
            start_sample_number: 0,
            end_sample_number: 999,
            segment_uid: 42,
            segment_number: 1,
            acquisition_channel_number: SgmtRecord::ALL_CHANNELS,
            sampling_frequency: 2000.0,
            segment_description: "baseline".to_string(),
        });
        let record = Record {
            header: RecordHeader {
                record_crc: 0,
                total_record_bytes: 0,
                start_time: 0,
                type_code: RecordTypeCode::Sgmt,
                version_major: 1,
                version_minor: 0,
                encryption_level: EncryptionLevel::None.to_raw(),
            },
            payload,
        };
        let bytes = record_bytes(&record);
        let (header_bytes, body_bytes) = bytes.split_at(record::RECORD_HEADER_BYTES);
        let parsed = convert_headers::parse_record(header_bytes, body_bytes).expect("parses");
        match parsed.payload {
            RecordPayload::Sgmt(r) => {
                assert_eq!(r.segment_uid, 42);
                assert_eq!(r.segment_description, "baseline");
            }
            other => panic!("expected Sgmt, got {:?}", other),
        }
    }

    #[test]
    fn note_record_round_trips() {
        let payload = RecordPayload::Note(NoteRecord { text: "impedance check".to_string() });
        let record = Record {
            header: RecordHeader {
                record_crc: 0,
                total_record_bytes: 0,
                start_time: 500,
                type_code: RecordTypeCode::Note,
                version_major: 1,
                version_minor: 0,
                encryption_level: EncryptionLevel::None.to_raw(),
            },
            payload,
        };
        let bytes = record_bytes(&record);
        let (header_bytes, body_bytes) = bytes.split_at(record::RECORD_HEADER_BYTES);
        let parsed = convert_headers::parse_record(header_bytes, body_bytes).expect("parses");
        assert_eq!(parsed.header.start_time, 500);
        match parsed.payload {
            RecordPayload::Note(r) => assert_eq!(r.text, "impedance check"),
            other => panic!("expected Note, got {:?}", other),
        }
    }

    #[test]
    fn nlxp_record_round_trips() {
        let payload = RecordPayload::Nlxp(NlxpRecord {
            raw_port_value: 7,
            value: 3,
            subport: 1,
            number_of_subports: 4,
            trigger_mode: NlxTriggerMode::AnyBitChange,
        });
        let record = Record {
            header: RecordHeader {
                record_crc: 0,
                total_record_bytes: 0,
                start_time: 10,
                type_code: RecordTypeCode::Nlxp,
                version_major: 1,
                version_minor: 0,
                encryption_level: EncryptionLevel::None.to_raw(),
            },
            payload,
        };
        let bytes = record_bytes(&record);
        let (header_bytes, body_bytes) = bytes.split_at(record::RECORD_HEADER_BYTES);
        let parsed = convert_headers::parse_record(header_bytes, body_bytes).expect("parses");
        match parsed.payload {
            RecordPayload::Nlxp(r) => {
                assert_eq!(r.raw_port_value, 7);
                assert_eq!(r.number_of_subports, 4);
            }
            other => panic!("expected Nlxp, got {:?}", other),
        }
    }

    #[test]
    fn time_series_index_entry_round_trips() {
        let entry = TimeSeriesIndexEntry { file_offset: 1024, start_time: 0, start_sample_number: 0 };
        let bytes = time_series_index_entry_bytes(&entry);
        let parsed = convert_headers::parse_time_series_index_entry(&bytes).expect("parses");
        assert_eq!(parsed.file_offset, 1024);
    }
}
