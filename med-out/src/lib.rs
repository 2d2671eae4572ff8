//! Writer for the MED (Multiscale Electrophysiology Data) file format: the
//! CMP encoder (`cmp_block`), the record/index serializers (`write_data`),
//! the fixed-structure serializers (`write_headers`), and the session ->
//! channel -> segment directory builder below (C4/C6/C7 write side).
//!
//! Every writer here buffers a file's body in memory and only touches the
//! filesystem once it has everything it needs, the same discipline
//! `cmp_block::encode_cmp_block` uses for a single block: compute, then
//! write, never the reverse.
pub mod cmp_block;
pub mod utils;
pub mod write_data;
pub mod write_headers;

use std::fs;
use std::path::{Path, PathBuf};

use med_core::crypto::PasswordData;
use med_core::dir_ext;
use med_core::enums::{FileTypeCode, RecordTypeCode};
use med_core::errors::MedError;
use med_core::header_structs::{
    MetadataFile, MetadataSection1, MetadataSection2, MetadataSection3, TimeSeriesSection2,
    UniversalHeader, VideoSection2,
};
use med_core::layout::UNIVERSAL_HEADER_BYTES;
use med_core::records::{
    Record, RecordHeader, RecordIndex, RecordPayload, SgmtRecord, TimeSeriesIndexEntry,
    VideoIndexEntry,
};
use med_core::settings::CmpDirectives;
use med_core::time::UUTC_NO_ENTRY;

pub use med_core::enums;
pub use med_core::errors::MedError as WriteError;
pub use med_core::header_structs::*;
pub use med_core::records::*;

/// Identifying fields shared by every file a channel writes: the session and
/// channel this data belongs to, threaded through so each segment's
/// universal header carries the same names and UIDs without the caller
/// repeating them at every call site.
#[derive(Clone)]
pub struct ChannelContext {
    pub session_name: String,
    pub channel_name: String,
    pub session_uid: u64,
    pub channel_uid: u64,
    pub session_start_time: i64,
}

fn stamp_universal_header(header: &mut UniversalHeader, ctx: &ChannelContext, segment_uid: u64, segment_number: i32) {
    header.session_name = ctx.session_name.clone();
    header.channel_name = ctx.channel_name.clone();
    header.session_uid = ctx.session_uid;
    header.channel_uid = ctx.channel_uid;
    header.segment_uid = segment_uid;
    header.session_start_time = ctx.session_start_time;
    header.segment_number = segment_number;
}

/// Accumulates a record stream (a `.rdat` + `.ridx` pair), closed with the
/// terminal sentinel `write_data::terminal_record_index_bytes` builds. Used
/// at segment, channel, and session level alike -- records are optional at
/// every level and the stream format does not depend on where it sits.
#[derive(Default)]
pub struct RecordsWriter {
    data_body: Vec<u8>,
    index_entries: Vec<RecordIndex>,
}

impl RecordsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.index_entries.is_empty()
    }

    /// Append one record, recording its offset in the data body for the
    /// index entry.
    pub fn push(&mut self, record: Record) {
        let index = RecordIndex {
            file_offset: (UNIVERSAL_HEADER_BYTES + self.data_body.len()) as i64,
            start_time: record.header.start_time,
            type_code: record.payload.type_code(),
            version_major: record.header.version_major,
            version_minor: record.header.version_minor,
            encryption_level: record.header.encryption_level,
        };
        self.data_body.extend_from_slice(&write_data::record_bytes(&record));
        self.index_entries.push(index);
    }

    /// Write `<stem>.rdat`/`<stem>.ridx` into a `<stem>.recd` subdirectory of
    /// `parent`, matching the nested records directory `med_in::hierarchy`
    /// expects at every level (segment, channel, session).
    pub fn finish(self, parent: &Path, stem: &str, ctx: &ChannelContext, segment_end_time: i64) -> Result<(), MedError> {
        let dir = utils::named_dir(parent, stem, dir_ext::RECORD_DIR_EXT);
        fs::create_dir_all(&dir)?;
        let dir = dir.as_path();

        let mut data_header = UniversalHeader::new(FileTypeCode::RecordsData);
        stamp_universal_header(&mut data_header, ctx, 0, UniversalHeader::SEGMENT_NUMBER_NO_ENTRY);
        data_header.file_end_time = segment_end_time;
        data_header.number_of_entries = self.index_entries.len() as i64;
        let mut data_file = write_headers::finalize_universal_header(&mut data_header, &self.data_body);
        data_file.extend_from_slice(&self.data_body);
        fs::write(utils::named_file(dir, stem, "rdat"), &data_file)?;

        let mut index_body = Vec::with_capacity((self.index_entries.len() + 1) * 24);
        for entry in &self.index_entries {
            index_body.extend_from_slice(&write_data::record_index_bytes(entry));
        }
        index_body.extend_from_slice(&write_data::terminal_record_index_bytes(
            segment_end_time,
            data_file.len() as i64,
        ));

        let mut index_header = UniversalHeader::new(FileTypeCode::RecordsIndices);
        stamp_universal_header(&mut index_header, ctx, 0, UniversalHeader::SEGMENT_NUMBER_NO_ENTRY);
        index_header.file_end_time = segment_end_time;
        index_header.number_of_entries = self.index_entries.len() as i64 + 1;
        let mut index_file = write_headers::finalize_universal_header(&mut index_header, &index_body);
        index_file.extend_from_slice(&index_body);
        fs::write(utils::named_file(dir, stem, "ridx"), &index_file)?;

        Ok(())
    }
}

/// Builds one time-series segment directory (`.tisd`): the CMP-compressed
/// `.tdat` data file, its `.tidx` index, and an optional segment-level
/// records stream.
pub struct TimeSeriesSegmentWriter {
    dir: PathBuf,
    stem: String,
    ctx: ChannelContext,
    segment_uid: u64,
    segment_number: i32,
    channel_number: i32,
    data_body: Vec<u8>,
    index_entries: Vec<TimeSeriesIndexEntry>,
    records: RecordsWriter,
    start_sample_number: i64,
    next_sample_number: i64,
    start_time: Option<i64>,
    end_time: i64,
}

impl TimeSeriesSegmentWriter {
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        channel_dir: &Path,
        ctx: ChannelContext,
        stem: &str,
        segment_number: i32,
        segment_uid: u64,
        channel_number: i32,
        start_sample_number: i64,
    ) -> Result<Self, MedError> {
        let dir = utils::segment_dir(
            channel_dir,
            stem,
            segment_number.max(0) as u32,
            dir_ext::TIME_SERIES_SEGMENT_DIR_EXT,
        );
        fs::create_dir_all(&dir)?;
        Ok(TimeSeriesSegmentWriter {
            dir,
            stem: stem.to_string(),
            ctx,
            segment_uid,
            segment_number,
            channel_number,
            data_body: Vec::new(),
            index_entries: Vec::new(),
            records: RecordsWriter::new(),
            start_sample_number,
            next_sample_number: start_sample_number,
            start_time: None,
            end_time: UUTC_NO_ENTRY,
        })
    }

    /// Compress and append one block of samples. `discontinuity` marks a
    /// break in sample contiguity since the previous block; per the index
    /// format, this is recorded as a negative file offset, not a flag field.
    pub fn append_block(
        &mut self,
        samples: &[i32],
        start_time: i64,
        discontinuity: bool,
        directives: &CmpDirectives,
        password: Option<&PasswordData>,
    ) -> Result<(), MedError> {
        let block = cmp_block::encode_cmp_block(
            samples,
            start_time,
            self.channel_number,
            discontinuity,
            directives,
            password,
        )?;
        let absolute_offset = (UNIVERSAL_HEADER_BYTES + self.data_body.len()) as i64;
        self.index_entries.push(TimeSeriesIndexEntry {
            file_offset: if discontinuity { -absolute_offset } else { absolute_offset },
            start_time,
            start_sample_number: self.next_sample_number,
        });
        self.next_sample_number += samples.len() as i64;
        self.start_time.get_or_insert(start_time);
        self.end_time = start_time;
        self.data_body.extend_from_slice(&block);
        Ok(())
    }

    /// Attach a segment-level record (e.g. `Stat`, `Note`).
    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Flush `.tdat`, `.tidx`, and (if any were attached) segment-level
    /// records to disk, returning the `Sgmt` record the owning channel
    /// registers to describe this segment's boundaries.
    pub fn finish(self, sampling_frequency: f64, segment_description: String) -> Result<SgmtRecord, MedError> {
        let mut data_header = UniversalHeader::new(FileTypeCode::TimeSeriesData);
        stamp_universal_header(&mut data_header, &self.ctx, self.segment_uid, self.segment_number);
        data_header.file_start_time = self.start_time.unwrap_or(UUTC_NO_ENTRY);
        data_header.file_end_time = self.end_time;
        data_header.number_of_entries = self.index_entries.len() as i64;
        let mut data_file = write_headers::finalize_universal_header(&mut data_header, &self.data_body);
        data_file.extend_from_slice(&self.data_body);
        fs::write(utils::named_file(&self.dir, &self.stem, "tdat"), &data_file)?;

        let mut index_body = Vec::with_capacity(self.index_entries.len() * 24);
        for entry in &self.index_entries {
            index_body.extend_from_slice(&write_data::time_series_index_entry_bytes(entry));
        }
        let mut index_header = UniversalHeader::new(FileTypeCode::TimeSeriesIndices);
        stamp_universal_header(&mut index_header, &self.ctx, self.segment_uid, self.segment_number);
        index_header.file_start_time = self.start_time.unwrap_or(UUTC_NO_ENTRY);
        index_header.file_end_time = self.end_time;
        index_header.number_of_entries = self.index_entries.len() as i64;
        let mut index_file = write_headers::finalize_universal_header(&mut index_header, &index_body);
        index_file.extend_from_slice(&index_body);
        fs::write(utils::named_file(&self.dir, &self.stem, "tidx"), &index_file)?;

        if !self.records.is_empty() {
            self.records.finish(&self.dir, &self.stem, &self.ctx, self.end_time)?;
        }

        Ok(SgmtRecord {
            end_time: self.end_time,
            start_sample_number: self.start_sample_number,
            end_sample_number: self.next_sample_number - 1,
            segment_uid: self.segment_uid,
            segment_number: self.segment_number,
            acquisition_channel_number: self.channel_number,
            sampling_frequency,
            segment_description,
        })
    }
}

/// Builds one video segment directory (`.visd`): raw clip bytes plus their
/// index. Video is never CMP-compressed, so this only tracks clip
/// boundaries, mirroring `med_in::VideoSegment`.
pub struct VideoSegmentWriter {
    dir: PathBuf,
    stem: String,
    ctx: ChannelContext,
    segment_uid: u64,
    segment_number: i32,
    data_body: Vec<u8>,
    index_entries: Vec<VideoIndexEntry>,
    start_frame_number: i32,
    next_frame_number: i32,
    start_time: Option<i64>,
    end_time: i64,
}

impl VideoSegmentWriter {
    pub fn create(
        channel_dir: &Path,
        ctx: ChannelContext,
        stem: &str,
        segment_number: i32,
        segment_uid: u64,
        start_frame_number: i32,
    ) -> Result<Self, MedError> {
        let dir = utils::segment_dir(
            channel_dir,
            stem,
            segment_number.max(0) as u32,
            dir_ext::VIDEO_SEGMENT_DIR_EXT,
        );
        fs::create_dir_all(&dir)?;
        Ok(VideoSegmentWriter {
            dir,
            stem: stem.to_string(),
            ctx,
            segment_uid,
            segment_number,
            data_body: Vec::new(),
            index_entries: Vec::new(),
            start_frame_number,
            next_frame_number: start_frame_number,
            start_time: None,
            end_time: UUTC_NO_ENTRY,
        })
    }

    /// Append one clip's raw bytes.
    pub fn append_clip(&mut self, clip: &[u8], start_time: i64, discontinuity: bool, video_file_number: i32) {
        let absolute_offset = (UNIVERSAL_HEADER_BYTES + self.data_body.len()) as i64;
        self.index_entries.push(VideoIndexEntry {
            file_offset: if discontinuity { -absolute_offset } else { absolute_offset },
            start_time,
            start_frame_number: self.next_frame_number,
            video_file_number,
        });
        self.next_frame_number += 1;
        self.start_time.get_or_insert(start_time);
        self.end_time = start_time;
        self.data_body.extend_from_slice(clip);
    }

    /// Flush `.vdat` and `.vidx` to disk, returning the `Sgmt` record the
    /// owning channel registers (sample/frame fields aliased to frame
    /// numbers, per [`SgmtRecord`]'s documented video aliasing).
    pub fn finish(self, frame_rate: f64, segment_description: String) -> Result<SgmtRecord, MedError> {
        let mut data_header = UniversalHeader::new(FileTypeCode::VideoData);
        stamp_universal_header(&mut data_header, &self.ctx, self.segment_uid, self.segment_number);
        data_header.file_start_time = self.start_time.unwrap_or(UUTC_NO_ENTRY);
        data_header.file_end_time = self.end_time;
        data_header.number_of_entries = self.index_entries.len() as i64;
        let mut data_file = write_headers::finalize_universal_header(&mut data_header, &self.data_body);
        data_file.extend_from_slice(&self.data_body);
        fs::write(utils::named_file(&self.dir, &self.stem, "vdat"), &data_file)?;

        let mut index_body = Vec::with_capacity(self.index_entries.len() * 24);
        for entry in &self.index_entries {
            index_body.extend_from_slice(&write_data::video_index_entry_bytes(entry));
        }
        let mut index_header = UniversalHeader::new(FileTypeCode::VideoIndices);
        stamp_universal_header(&mut index_header, &self.ctx, self.segment_uid, self.segment_number);
        index_header.file_start_time = self.start_time.unwrap_or(UUTC_NO_ENTRY);
        index_header.file_end_time = self.end_time;
        index_header.number_of_entries = self.index_entries.len() as i64;
        let mut index_file = write_headers::finalize_universal_header(&mut index_header, &index_body);
        index_file.extend_from_slice(&index_body);
        fs::write(utils::named_file(&self.dir, &self.stem, "vidx"), &index_file)?;

        Ok(SgmtRecord {
            end_time: self.end_time,
            start_sample_number: self.start_frame_number as i64,
            end_sample_number: (self.next_frame_number - 1) as i64,
            segment_uid: self.segment_uid,
            segment_number: self.segment_number,
            acquisition_channel_number: SgmtRecord::ALL_CHANNELS,
            sampling_frequency: frame_rate,
            segment_description,
        })
    }
}

fn sgmt_record(r: SgmtRecord, start_time: i64) -> Record {
    Record {
        header: RecordHeader {
            record_crc: 0,
            total_record_bytes: 0,
            start_time,
            type_code: RecordTypeCode::Sgmt,
            version_major: 1,
            version_minor: 0,
            encryption_level: 0,
        },
        payload: RecordPayload::Sgmt(r),
    }
}

/// Builds one time-series channel directory (`.ticd`): the `.tmet` metadata
/// file, its segments, and optional channel-level records. Each finished
/// segment's `Sgmt` record is appended to the channel's own records stream,
/// matching how `med_in::TimeSeriesChannelReader` resolves time slices
/// against that same stream.
pub struct TimeSeriesChannelWriter {
    dir: PathBuf,
    stem: String,
    ctx: ChannelContext,
    section_2: TimeSeriesSection2,
    section_1: MetadataSection1,
    section_3: MetadataSection3,
    channel_uid: u64,
    next_segment_number: i32,
    records: RecordsWriter,
    last_end_time: i64,
}

impl TimeSeriesChannelWriter {
    pub fn create(session_dir: &Path, ctx: ChannelContext, stem: &str, section_2: TimeSeriesSection2) -> Result<Self, MedError> {
        let dir = utils::named_dir(session_dir, stem, dir_ext::TIME_SERIES_CHANNEL_DIR_EXT);
        fs::create_dir_all(&dir)?;
        let channel_uid = ctx.channel_uid;
        Ok(TimeSeriesChannelWriter {
            dir,
            stem: stem.to_string(),
            ctx,
            section_2,
            section_1: MetadataSection1::default(),
            section_3: blank_section_3(),
            channel_uid,
            next_segment_number: 0,
            records: RecordsWriter::new(),
            last_end_time: UUTC_NO_ENTRY,
        })
    }

    /// Start a new segment; `start_sample_number` should continue from the
    /// previous segment's `end_sample_number + 1` for contiguous recordings.
    pub fn start_segment(&mut self, start_sample_number: i64, segment_uid: u64, channel_number: i32) -> Result<TimeSeriesSegmentWriter, MedError> {
        let segment_number = self.next_segment_number;
        self.next_segment_number += 1;
        TimeSeriesSegmentWriter::create(
            &self.dir,
            self.ctx.clone(),
            &self.stem,
            segment_number,
            segment_uid,
            channel_number,
            start_sample_number,
        )
    }

    /// Register a finished segment's boundaries in this channel's records stream.
    pub fn finish_segment(&mut self, segment: TimeSeriesSegmentWriter, sampling_frequency: f64, description: String) -> Result<(), MedError> {
        let sgmt = segment.finish(sampling_frequency, description)?;
        self.last_end_time = sgmt.end_time;
        self.records.push(sgmt_record(sgmt, self.last_end_time));
        Ok(())
    }

    /// Attach a channel-level record (not tied to any one segment).
    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Flush `.tmet` and the channel-level records stream.
    pub fn finish(mut self) -> Result<(), MedError> {
        self.section_2.number_of_blocks = self.next_segment_number as i64;
        let mut universal_header = UniversalHeader::new(FileTypeCode::TimeSeriesMetadata);
        stamp_universal_header(&mut universal_header, &self.ctx, 0, UniversalHeader::SEGMENT_NUMBER_NO_ENTRY);
        let mut file = MetadataFile {
            universal_header,
            section_1: self.section_1,
            section_2: MetadataSection2::TimeSeries(self.section_2),
            section_3: self.section_3,
        };
        let bytes = write_headers::metadata_file_bytes(&mut file);
        fs::write(utils::named_file(&self.dir, &self.stem, "tmet"), &bytes)?;

        if !self.records.is_empty() {
            self.records.finish(&self.dir, &self.stem, &self.ctx, self.last_end_time)?;
        }
        Ok(())
    }
}

/// Builds one video channel directory (`.vicd`): the `.vmet` metadata file,
/// its segments, and optional channel-level records.
pub struct VideoChannelWriter {
    dir: PathBuf,
    stem: String,
    ctx: ChannelContext,
    section_2: VideoSection2,
    section_1: MetadataSection1,
    section_3: MetadataSection3,
    next_segment_number: i32,
    records: RecordsWriter,
    last_end_time: i64,
}

impl VideoChannelWriter {
    pub fn create(session_dir: &Path, ctx: ChannelContext, stem: &str, section_2: VideoSection2) -> Result<Self, MedError> {
        let dir = utils::named_dir(session_dir, stem, dir_ext::VIDEO_CHANNEL_DIR_EXT);
        fs::create_dir_all(&dir)?;
        Ok(VideoChannelWriter {
            dir,
            stem: stem.to_string(),
            ctx,
            section_2,
            section_1: MetadataSection1::default(),
            section_3: blank_section_3(),
            next_segment_number: 0,
            records: RecordsWriter::new(),
            last_end_time: UUTC_NO_ENTRY,
        })
    }

    pub fn start_segment(&mut self, start_frame_number: i32, segment_uid: u64) -> Result<VideoSegmentWriter, MedError> {
        let segment_number = self.next_segment_number;
        self.next_segment_number += 1;
        VideoSegmentWriter::create(&self.dir, self.ctx.clone(), &self.stem, segment_number, segment_uid, start_frame_number)
    }

    pub fn finish_segment(&mut self, segment: VideoSegmentWriter, frame_rate: f64, description: String) -> Result<(), MedError> {
        let sgmt = segment.finish(frame_rate, description)?;
        self.last_end_time = sgmt.end_time;
        self.records.push(sgmt_record(sgmt, self.last_end_time));
        Ok(())
    }

    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn finish(mut self) -> Result<(), MedError> {
        self.section_2.number_of_clips = self.next_segment_number as i64;
        let mut universal_header = UniversalHeader::new(FileTypeCode::VideoMetadata);
        stamp_universal_header(&mut universal_header, &self.ctx, 0, UniversalHeader::SEGMENT_NUMBER_NO_ENTRY);
        let mut file = MetadataFile {
            universal_header,
            section_1: self.section_1,
            section_2: MetadataSection2::Video(self.section_2),
            section_3: self.section_3,
        };
        let bytes = write_headers::metadata_file_bytes(&mut file);
        fs::write(utils::named_file(&self.dir, &self.stem, "vmet"), &bytes)?;

        if !self.records.is_empty() {
            self.records.finish(&self.dir, &self.stem, &self.ctx, self.last_end_time)?;
        }
        Ok(())
    }
}

fn blank_section_3() -> MetadataSection3 {
    MetadataSection3 {
        recording_time_offset: 0,
        daylight_time_start_code: med_core::time::DaylightTimeChangeCode::from_raw(0),
        daylight_time_end_code: med_core::time::DaylightTimeChangeCode::from_raw(0),
        standard_timezone_acronym: String::new(),
        standard_timezone_string: String::new(),
        daylight_timezone_acronym: String::new(),
        daylight_timezone_string: String::new(),
        standard_utc_offset: MetadataSection3::STANDARD_UTC_OFFSET_NO_ENTRY,
        subject_name: String::new(),
        subject_id: String::new(),
        recording_location: String::new(),
    }
}

/// Builds one session directory (`.medd`): its time-series and video
/// channels, plus optional session-level records.
pub struct SessionWriter {
    dir: PathBuf,
    stem: String,
    records: RecordsWriter,
    last_end_time: i64,
}

impl SessionWriter {
    pub fn create(parent: &Path, stem: &str) -> Result<Self, MedError> {
        let dir = utils::named_dir(parent, stem, dir_ext::SESSION_DIR_EXT);
        fs::create_dir_all(&dir)?;
        Ok(SessionWriter {
            dir,
            stem: stem.to_string(),
            records: RecordsWriter::new(),
            last_end_time: UUTC_NO_ENTRY,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start a time-series channel under this session, stamping its
    /// universal headers with this session's name and UID.
    pub fn time_series_channel(
        &self,
        stem: &str,
        channel_uid: u64,
        session_uid: u64,
        session_start_time: i64,
        section_2: TimeSeriesSection2,
    ) -> Result<TimeSeriesChannelWriter, MedError> {
        let ctx = ChannelContext {
            session_name: self.stem.clone(),
            channel_name: stem.to_string(),
            session_uid,
            channel_uid,
            session_start_time,
        };
        TimeSeriesChannelWriter::create(&self.dir, ctx, stem, section_2)
    }

    /// Start a video channel under this session.
    pub fn video_channel(
        &self,
        stem: &str,
        channel_uid: u64,
        session_uid: u64,
        session_start_time: i64,
        section_2: VideoSection2,
    ) -> Result<VideoChannelWriter, MedError> {
        let ctx = ChannelContext {
            session_name: self.stem.clone(),
            channel_name: stem.to_string(),
            session_uid,
            channel_uid,
            session_start_time,
        };
        VideoChannelWriter::create(&self.dir, ctx, stem, section_2)
    }

    /// Attach a session-level record (not tied to any one channel).
    pub fn push_record(&mut self, record: Record) {
        self.last_end_time = self.last_end_time.max(record.header.start_time);
        self.records.push(record);
    }

    /// Flush the session-level records stream, if any records were attached.
    pub fn finish(self, session_uid: u64, session_start_time: i64) -> Result<(), MedError> {
        if self.records.is_empty() {
            return Ok(());
        }
        let ctx = ChannelContext {
            session_name: self.stem.clone(),
            channel_name: String::new(),
            session_uid,
            channel_uid: 0,
            session_start_time,
        };
        self.records.finish(&self.dir, &self.stem, &ctx, self.last_end_time)
    }
}

#[cfg(test)]
mod integration_tests;
