//! Reader for the MED (Multiscale Electrophysiology Data) file format:
//! hierarchy discovery, metadata parsing, CMP-block decoding, and record
//! reading.
//!
//! Files stay memory-mapped rather than loaded; only the typed headers and
//! indices are parsed eagerly, following the memory-mapped, parse-on-demand
//! model this crate's SEG-Y ancestor used for trace data.
extern crate memmap2;
extern crate num;

pub mod cmp_block;
pub mod convert_headers;
pub mod hierarchy;
pub mod memory_map;

use std::path::Path;

pub use med_core::enums;
pub use med_core::errors::*;
pub use med_core::header_structs::*;
pub use med_core::records::*;
pub use med_core::slice::{Contiguon, SampleBound, TimeSlice};

use convert_headers::ChannelKind;
use med_core::crypto::PasswordData;
use med_core::layout::{index as index_layout, record as record_layout};
use memory_map::MappedMedFile;

fn read_records(paths: &hierarchy::RecordsPaths, filter: &RecordFilter) -> Result<Vec<Record>, MedError> {
    let data = MappedMedFile::open(&paths.data_file)?;
    let index_map = MappedMedFile::open(&paths.index_file)?;
    let index_body = index_map.body();

    let mut out = Vec::new();
    for chunk in index_body.chunks_exact(record_layout::RECORD_INDEX_BYTES) {
        let index = convert_headers::parse_record_index(chunk)?;
        if index.is_terminal() || index.file_offset < 0 {
            continue;
        }
        if !filter.allows(&index.type_code) {
            continue;
        }
        let offset = index.file_offset as usize;
        let header_bytes = data.slice(offset, record_layout::RECORD_HEADER_BYTES)?;
        let header = convert_headers::parse_record_header(header_bytes)?;
        let body_start = offset + record_layout::RECORD_HEADER_BYTES;
        let body_len = (header.total_record_bytes as usize).saturating_sub(record_layout::RECORD_HEADER_BYTES);
        let body = data.slice(body_start, body_len)?;
        let payload = convert_headers::parse_record_body(&header, body)?;
        out.push(Record { header, payload });
    }
    Ok(out)
}

fn read_sgmt_records(paths: &hierarchy::RecordsPaths) -> Result<Vec<SgmtRecord>, MedError> {
    let filter = RecordFilter::new().include(enums::RecordTypeCode::Sgmt);
    let records = read_records(paths, &filter)?;
    Ok(records
        .into_iter()
        .filter_map(|r| match r.payload {
            RecordPayload::Sgmt(sgmt) => Some(sgmt),
            _ => None,
        })
        .collect())
}

/// One mapped time-series segment: its data/index files plus the parsed
/// index entries (one per CMP block, in acquisition order).
pub struct TimeSeriesSegment {
    pub paths: hierarchy::TimeSeriesSegmentPaths,
    data: MappedMedFile,
    index_entries: Vec<TimeSeriesIndexEntry>,
}

impl TimeSeriesSegment {
    fn open(paths: hierarchy::TimeSeriesSegmentPaths) -> Result<Self, MedError> {
        let data = MappedMedFile::open(&paths.data_file)?;
        let index_map = MappedMedFile::open(&paths.index_file)?;
        let mut index_entries = Vec::with_capacity(index_map.body().len() / index_layout::TIME_SERIES_INDEX_BYTES);
        for chunk in index_map.body().chunks_exact(index_layout::TIME_SERIES_INDEX_BYTES) {
            index_entries.push(convert_headers::parse_time_series_index_entry(chunk)?);
        }
        Ok(TimeSeriesSegment { paths, data, index_entries })
    }

    pub fn index_entries(&self) -> &[TimeSeriesIndexEntry] {
        &self.index_entries
    }

    /// Decode every CMP block in this segment, in file order.
    pub fn decode_all(&self, password: Option<&PasswordData>) -> Result<Vec<i32>, MedError> {
        let mut samples = Vec::new();
        for entry in &self.index_entries {
            if entry.file_offset < 0 {
                continue;
            }
            let offset = entry.file_offset as usize;
            let (_, block_samples) = cmp_block::decode_cmp_block(&self.data.as_bytes()[offset..], password)?;
            samples.extend(block_samples);
        }
        Ok(samples)
    }

    /// Decode only the blocks needed to cover `[start_sample, end_sample]`
    /// (inclusive), trimmed to exactly that range.
    pub fn decode_range(
        &self,
        start_sample: i64,
        end_sample: i64,
        password: Option<&PasswordData>,
    ) -> Result<Vec<i32>, MedError> {
        let mut samples = Vec::new();
        for entry in &self.index_entries {
            if entry.file_offset < 0 || entry.start_sample_number > end_sample {
                continue;
            }
            let offset = entry.file_offset as usize;
            let (header, block_samples) = cmp_block::decode_cmp_block(&self.data.as_bytes()[offset..], password)?;
            let block_end_sample = entry.start_sample_number + header.number_of_samples as i64 - 1;
            if block_end_sample < start_sample {
                continue;
            }
            for (i, sample) in block_samples.into_iter().enumerate() {
                let sample_number = entry.start_sample_number + i as i64;
                if sample_number >= start_sample && sample_number <= end_sample {
                    samples.push(sample);
                }
            }
        }
        Ok(samples)
    }
}

/// An opened time-series channel directory (`.ticd`): metadata, the
/// channel-level `Sgmt` records used to resolve time slices, and the
/// mapped segments themselves.
pub struct TimeSeriesChannelReader {
    pub paths: hierarchy::TimeSeriesChannelPaths,
    pub metadata: MetadataFile,
    pub segment_records: Vec<SgmtRecord>,
    pub segments: Vec<TimeSeriesSegment>,
}

impl TimeSeriesChannelReader {
    pub fn open<P: AsRef<Path>>(channel_dir: P) -> Result<Self, MedError> {
        let paths = hierarchy::discover_time_series_channel(channel_dir.as_ref())?;
        let meta_map = MappedMedFile::open(&paths.metadata_file)?;
        let metadata = convert_headers::parse_metadata_file(meta_map.as_bytes(), ChannelKind::TimeSeries)?;

        let segment_records = match &paths.records {
            Some(records) => read_sgmt_records(records)?,
            None => Vec::new(),
        };
        let segments = paths
            .segments
            .iter()
            .cloned()
            .map(TimeSeriesSegment::open)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TimeSeriesChannelReader { paths, metadata, segment_records, segments })
    }

    pub fn sampling_frequency(&self) -> Option<f64> {
        self.metadata.section_2.as_time_series().map(|s| s.sampling_frequency)
    }

    /// Resolve `slice` against this channel's segment records and decode the
    /// samples it covers.
    pub fn read_slice(&self, slice: TimeSlice, password: Option<&PasswordData>) -> Result<Vec<i32>, MedError> {
        let resolved = hierarchy::resolve_time_slice(slice, &self.segment_records);
        if self.segments.is_empty() {
            return Ok(Vec::new());
        }
        let start = resolved.start_segment_number.max(0) as usize;
        let end = (resolved.end_segment_number.max(0) as usize).min(self.segments.len() - 1);

        let mut samples = Vec::new();
        for segment in &self.segments[start.min(self.segments.len() - 1)..=end] {
            samples.extend(segment.decode_all(password)?);
        }
        Ok(samples)
    }

    /// Records attached directly to this channel (not to any one segment).
    pub fn records(&self, filter: &RecordFilter) -> Result<Vec<Record>, MedError> {
        match &self.paths.records {
            Some(records) => read_records(records, filter),
            None => Ok(Vec::new()),
        }
    }
}

/// One mapped video segment. Clips are stored raw on disk -- video is never
/// CMP-compressed -- so this only needs the index to locate clip boundaries.
pub struct VideoSegment {
    pub paths: hierarchy::VideoSegmentPaths,
    data: MappedMedFile,
    index_entries: Vec<VideoIndexEntry>,
}

impl VideoSegment {
    fn open(paths: hierarchy::VideoSegmentPaths) -> Result<Self, MedError> {
        let data = MappedMedFile::open(&paths.data_file)?;
        let index_map = MappedMedFile::open(&paths.index_file)?;
        let mut index_entries = Vec::with_capacity(index_map.body().len() / index_layout::VIDEO_INDEX_BYTES);
        for chunk in index_map.body().chunks_exact(index_layout::VIDEO_INDEX_BYTES) {
            index_entries.push(convert_headers::parse_video_index_entry(chunk)?);
        }
        Ok(VideoSegment { paths, data, index_entries })
    }

    pub fn index_entries(&self) -> &[VideoIndexEntry] {
        &self.index_entries
    }

    /// Raw clip bytes for the entry at `entry_index`, up to the next entry's
    /// offset (or end of file for the last entry).
    pub fn clip_bytes(&self, entry_index: usize) -> Result<&[u8], MedError> {
        let entry = self.index_entries.get(entry_index).ok_or(MedError::FileTooShort)?;
        let start = entry.file_offset as usize;
        let end = self
            .index_entries
            .get(entry_index + 1)
            .map(|next| next.file_offset as usize)
            .unwrap_or_else(|| self.data.len());
        self.data.slice(start, end - start)
    }
}

/// An opened video channel directory (`.vicd`).
pub struct VideoChannelReader {
    pub paths: hierarchy::VideoChannelPaths,
    pub metadata: MetadataFile,
    pub segments: Vec<VideoSegment>,
}

impl VideoChannelReader {
    pub fn open<P: AsRef<Path>>(channel_dir: P) -> Result<Self, MedError> {
        let paths = hierarchy::discover_video_channel(channel_dir.as_ref())?;
        let meta_map = MappedMedFile::open(&paths.metadata_file)?;
        let metadata = convert_headers::parse_metadata_file(meta_map.as_bytes(), ChannelKind::Video)?;
        let segments = paths
            .segments
            .iter()
            .cloned()
            .map(VideoSegment::open)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VideoChannelReader { paths, metadata, segments })
    }

    pub fn frame_rate(&self) -> Option<f64> {
        self.metadata.section_2.as_video().map(|s| s.frame_rate)
    }
}

/// An opened session directory (`.medd`): every time-series and video
/// channel it contains, plus session-level records.
pub struct SessionReader {
    pub paths: hierarchy::SessionPaths,
    pub time_series_channels: Vec<TimeSeriesChannelReader>,
    pub video_channels: Vec<VideoChannelReader>,
}

impl SessionReader {
    pub fn open<P: AsRef<Path>>(session_dir: P) -> Result<Self, MedError> {
        let paths = hierarchy::discover_session(session_dir.as_ref())?;
        let time_series_channels = paths
            .time_series_channels
            .iter()
            .map(TimeSeriesChannelReader::open)
            .collect::<Result<Vec<_>, _>>()?;
        let video_channels = paths
            .video_channels
            .iter()
            .map(VideoChannelReader::open)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SessionReader { paths, time_series_channels, video_channels })
    }

    /// Records attached directly to the session (not to any channel or segment).
    pub fn records(&self, filter: &RecordFilter) -> Result<Vec<Record>, MedError> {
        match &self.paths.records {
            Some(records) => read_records(records, filter),
            None => Ok(Vec::new()),
        }
    }

    pub fn time_series_channel(&self, channel_name: &str) -> Option<&TimeSeriesChannelReader> {
        self.time_series_channels
            .iter()
            .find(|c| c.metadata.universal_header.channel_name == channel_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use med_core::enums::CmpAlgorithm;
    use med_core::settings::CmpDirectives;
    use std::fs;

    fn write_universal_header(bytes: &mut [u8], type_string: &str, channel_name: &str) {
        use med_core::layout::universal_header as uh;
        bytes[uh::TYPE_STRING_OFFSET..uh::TYPE_STRING_OFFSET + 4].copy_from_slice(type_string.as_bytes());
        bytes[uh::VERSION_MAJOR_OFFSET] = 1;
        let name_bytes = channel_name.as_bytes();
        bytes[uh::CHANNEL_NAME_OFFSET..uh::CHANNEL_NAME_OFFSET + name_bytes.len()].copy_from_slice(name_bytes);
    }

    fn write_metadata_file(dir: &Path, stem: &str, sampling_frequency: f64) {
        let mut bytes = vec![0u8; med_core::layout::metadata::METADATA_FILE_BYTES];
        write_universal_header(&mut bytes, "tmet", stem);
        let freq_offset = med_core::layout::metadata::TS_SAMPLING_FREQUENCY_OFFSET;
        bytes[freq_offset..freq_offset + 8].copy_from_slice(&sampling_frequency.to_le_bytes());
        fs::write(dir.join(format!("{}.tmet", stem)), bytes).unwrap();
    }

    fn write_time_series_segment(dir: &Path, stem: &str, samples: &[i32], start_sample: i64) {
        fs::create_dir(dir).unwrap();
        let mut directives = CmpDirectives::default();
        directives.set_algorithm(CmpAlgorithm::Red);
        let block = med_out::cmp_block::encode_cmp_block(samples, 0, 0, false, &directives, None).unwrap();

        let mut data = vec![0u8; med_core::layout::UNIVERSAL_HEADER_BYTES];
        write_universal_header(&mut data, "tdat", stem);
        let block_offset = data.len();
        data.extend_from_slice(&block);
        fs::write(dir.join(format!("{}.tdat", stem)), &data).unwrap();

        let mut index = vec![0u8; med_core::layout::UNIVERSAL_HEADER_BYTES];
        write_universal_header(&mut index, "tidx", stem);
        let mut entry = vec![0u8; 24];
        entry[0..8].copy_from_slice(&(block_offset as i64).to_le_bytes());
        entry[8..16].copy_from_slice(&0i64.to_le_bytes());
        entry[16..24].copy_from_slice(&start_sample.to_le_bytes());
        index.extend_from_slice(&entry);
        fs::write(dir.join(format!("{}.tidx", stem)), &index).unwrap();
    }

    #[test]
    fn reads_a_single_segment_channel_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        let channel_dir = root.path().join("chan.ticd");
        fs::create_dir(&channel_dir).unwrap();
        write_metadata_file(&channel_dir, "chan", 1000.0);
        let segment_dir = channel_dir.join("chan-000000.tisd");
        let samples = vec![1, 2, 3, 4, 5, 6, 7, 8];
        write_time_series_segment(&segment_dir, "chan", &samples, 0);

        let reader = TimeSeriesChannelReader::open(&channel_dir).expect("opens channel");
        assert_eq!(reader.sampling_frequency(), Some(1000.0));
        assert_eq!(reader.segments.len(), 1);

        let decoded = reader.segments[0].decode_all(None).expect("decodes");
        assert_eq!(decoded, samples);
    }

    #[test]
    fn decode_range_trims_to_the_requested_samples() {
        let root = tempfile::tempdir().unwrap();
        let segment_dir = root.path().join("chan-000000.tisd");
        let samples: Vec<i32> = (0..20).collect();
        write_time_series_segment(&segment_dir, "chan", &samples, 100);

        let paths = hierarchy::discover_time_series_segment(&segment_dir).unwrap();
        let segment = TimeSeriesSegment::open(paths).unwrap();
        let trimmed = segment.decode_range(105, 110, None).unwrap();
        assert_eq!(trimmed, vec![5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn missing_channel_metadata_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let channel_dir = root.path().join("chan.ticd");
        fs::create_dir(&channel_dir).unwrap();
        assert!(TimeSeriesChannelReader::open(&channel_dir).is_err());
    }
}
