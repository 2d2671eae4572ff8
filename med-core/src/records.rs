//! Record headers, indices, typed payloads, and filter semantics (C6).
//!
//! Two parallel files per record stream (data + indices) carry a sequence of
//! [`RecordHeader`] + typed body pairs. Dispatch on the payload's 4-byte type
//! code follows the "static table keyed by type code" design note: a `match`
//! in [`RecordPayload`] with an `Unknown` fallback that preserves the raw
//! bytes so the body can be skipped using `total_record_bytes`.
use crate::enums::{NlxTriggerMode, RecordTypeCode};

/// Record header (24 bytes). See [`crate::layout::record`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    /// CRC over bytes [4, total_record_bytes).
    pub record_crc: u32,
    /// Header + body, at most 65535.
    pub total_record_bytes: u32,
    pub start_time: i64,
    pub type_code: RecordTypeCode,
    pub version_major: u8,
    pub version_minor: u8,
    pub encryption_level: i8,
}

/// Record index (24 bytes, no body). See [`crate::layout::record`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordIndex {
    /// Negative offsets do not occur for records (discontinuity is a
    /// data-file concept only); `-1` means "no entry".
    pub file_offset: i64,
    pub start_time: i64,
    pub type_code: RecordTypeCode,
    pub version_major: u8,
    pub version_minor: u8,
    pub encryption_level: i8,
}

impl RecordIndex {
    pub fn is_terminal(&self) -> bool {
        matches!(self.type_code, RecordTypeCode::Term)
    }

    /// Build the sentinel terminal index for a record stream ending at
    /// `segment_end_time`, with the data file reaching `data_file_length` bytes.
    pub fn terminal(segment_end_time: i64, data_file_length: i64) -> Self {
        RecordIndex {
            file_offset: data_file_length,
            start_time: segment_end_time + 1,
            type_code: RecordTypeCode::Term,
            version_major: 1,
            version_minor: 0,
            encryption_level: 0,
        }
    }
}

/// One entry of a time-series index file (24 bytes). See
/// [`crate::layout::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSeriesIndexEntry {
    pub file_offset: i64,
    pub start_time: i64,
    pub start_sample_number: i64,
}

/// One entry of a video index file (24 bytes). See [`crate::layout::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoIndexEntry {
    pub file_offset: i64,
    pub start_time: i64,
    pub start_frame_number: i32,
    pub video_file_number: i32,
}

/// Segment boundaries (48-byte fixed portion + optional description, padded
/// to 16-byte alignment). Indexed at session/channel level.
#[derive(Debug, Clone, PartialEq)]
pub struct SgmtRecord {
    pub end_time: i64,
    /// Aliased `start_frame_number` for video channels.
    pub start_sample_number: i64,
    /// Aliased `end_frame_number` for video channels.
    pub end_sample_number: i64,
    pub segment_uid: u64,
    pub segment_number: i32,
    /// `-2` = all channels.
    pub acquisition_channel_number: i32,
    /// Aliased `frame_rate` for video channels.
    pub sampling_frequency: f64,
    pub segment_description: String,
}

impl SgmtRecord {
    pub const ALL_CHANNELS: i32 = -2;
}

/// Summary statistics for a segment/block (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatRecord {
    /// `NAN_SI4 = 0x80000000` = no entry.
    pub minimum: i32,
    pub maximum: i32,
    pub mean: i32,
    pub median: i32,
    pub mode: i32,
    /// NaN = no entry.
    pub variance: f32,
    pub skewness: f32,
    pub kurtosis: f32,
}

impl StatRecord {
    pub const NAN_SI4_NO_ENTRY: i32 = i32::MIN;
}

/// Free-text annotation (variable-length UTF-8, no fixed prefix).
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    pub text: String,
}

/// European Data Format annotation (duration + text).
#[derive(Debug, Clone, PartialEq)]
pub struct EdfaRecord {
    pub duration_micros: i64,
    pub annotation: String,
}

/// Per-channel block within a `Seiz` record (280 bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct SeizChannelBlock {
    pub channel_name: String,
    pub onset_time: i64,
    pub offset_time: i64,
    pub channel_description: String,
}

/// Seizure onset/offset with per-channel times and onset classification
/// (1296-byte fixed portion + per-channel 280-byte blocks).
#[derive(Debug, Clone, PartialEq)]
pub struct SeizRecord {
    pub onset_time: i64,
    pub offset_time: i64,
    pub onset_classification: String,
    pub channels: Vec<SeizChannelBlock>,
}

/// System log entry (variable-length UTF-8, no fixed prefix).
#[derive(Debug, Clone, PartialEq)]
pub struct SylgRecord {
    pub text: String,
}

/// Parallel port trigger (16 bytes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlxpRecord {
    pub raw_port_value: u32,
    pub value: u32,
    pub subport: u8,
    pub number_of_subports: u8,
    pub trigger_mode: NlxTriggerMode,
}

/// Cursor annotation (160 bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct CursRecord {
    pub id_number: i64,
    pub latency: i64,
    pub value: f64,
    pub name: String,
}

/// Sleep-stage epoch (176 bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct EpocRecord {
    pub id_number: i64,
    pub end_time: i64,
    pub epoch_type: String,
    pub text: String,
}

/// Electrical stimulation (416 bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct EstiRecord {
    pub amplitude: f64,
    pub frequency: f64,
    pub pulse_width: i64,
    /// -1 = no entry, 0 = unknown, 1 = mA, 2 = V.
    pub amplitude_unit_code: i32,
    /// -1 = no entry, 0 = unknown, 1 = current, 2 = voltage.
    pub mode_code: i32,
    pub waveform: String,
    pub anode: String,
    pub cathode: String,
}

/// Cognitive stimulation (208 bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct CstiRecord {
    pub stimulus_duration: i64,
    pub task_type: String,
    pub stimulus_type: String,
    pub patient_response: String,
}

/// A record's typed body, dispatched by [`RecordTypeCode`]. `Unknown`
/// preserves the raw bytes of a body whose type code the library does not
/// recognize; such records are a warning, never an error (body is skipped
/// using `total_record_bytes`).
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    Sgmt(SgmtRecord),
    Stat(StatRecord),
    Note(NoteRecord),
    Edfa(EdfaRecord),
    Seiz(SeizRecord),
    Sylg(SylgRecord),
    Nlxp(NlxpRecord),
    Curs(CursRecord),
    Epoc(EpocRecord),
    Esti(EstiRecord),
    Csti(CstiRecord),
    Term,
    Unknown(Vec<u8>),
}

impl RecordPayload {
    pub fn type_code(&self) -> RecordTypeCode {
        match self {
            Self::Sgmt(_) => RecordTypeCode::Sgmt,
            Self::Stat(_) => RecordTypeCode::Stat,
            Self::Note(_) => RecordTypeCode::Note,
            Self::Edfa(_) => RecordTypeCode::Edfa,
            Self::Seiz(_) => RecordTypeCode::Seiz,
            Self::Sylg(_) => RecordTypeCode::Sylg,
            Self::Nlxp(_) => RecordTypeCode::Nlxp,
            Self::Curs(_) => RecordTypeCode::Curs,
            Self::Epoc(_) => RecordTypeCode::Epoc,
            Self::Esti(_) => RecordTypeCode::Esti,
            Self::Csti(_) => RecordTypeCode::Csti,
            Self::Term => RecordTypeCode::Term,
            Self::Unknown(_) => RecordTypeCode::Unknown("????".to_string()),
        }
    }
}

/// A complete record: header plus parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: RecordHeader,
    pub payload: RecordPayload,
}

/// A zero-terminated list of signed type codes controlling which records a
/// reader sees. Positive codes are *include* filters; negative codes are
/// *exclude* filters.
///
/// Per the design note resolving the source's ambiguous filter semantics
/// when both positive and negative codes are present: the result is the
/// union of "explicitly included" minus "explicitly excluded" -- i.e. a code
/// that is both implied-included (because only negative filters exist
/// elsewhere) and explicitly excluded is excluded; a record type absent from
/// both lists is included only if no positive (include) filters exist at all.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    include: Vec<RecordTypeCode>,
    exclude: Vec<RecordTypeCode>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, code: RecordTypeCode) -> Self {
        self.include.push(code);
        self
    }

    pub fn exclude(mut self, code: RecordTypeCode) -> Self {
        self.exclude.push(code);
        self
    }

    /// Whether a record of the given type passes this filter.
    pub fn allows(&self, code: &RecordTypeCode) -> bool {
        if self.exclude.contains(code) {
            return false;
        }
        if self.include.is_empty() {
            true
        } else {
            self.include.contains(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_only_filter_excludes_unlisted() {
        let f = RecordFilter::new().include(RecordTypeCode::Sgmt);
        assert!(f.allows(&RecordTypeCode::Sgmt));
        assert!(!f.allows(&RecordTypeCode::Note));
    }

    #[test]
    fn negative_only_filter_includes_unlisted() {
        let f = RecordFilter::new().exclude(RecordTypeCode::Note);
        assert!(f.allows(&RecordTypeCode::Sgmt));
        assert!(!f.allows(&RecordTypeCode::Note));
    }

    #[test]
    fn exclude_wins_over_include() {
        let f = RecordFilter::new()
            .include(RecordTypeCode::Sgmt)
            .exclude(RecordTypeCode::Sgmt);
        assert!(!f.allows(&RecordTypeCode::Sgmt));
    }

    #[test]
    fn terminal_index_matches_segment_end_plus_one() {
        let idx = RecordIndex::terminal(1000, 4096);
        assert!(idx.is_terminal());
        assert_eq!(idx.start_time, 1001);
        assert_eq!(idx.file_offset, 4096);
    }
}
