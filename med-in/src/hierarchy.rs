//! Directory discovery for the session -> channel -> segment hierarchy
//! (C7), keyed on the four-letter directory type strings confirmed against
//! the reference library's directory layout: `.medd` (session), `.ticd`/
//! `.vicd` (time-series/video channel), `.tisd`/`.visd` (time-series/video
//! segment), `.recd` (a records directory, found under a session or a
//! channel).
use std::path::{Path, PathBuf};

use med_core::errors::MedError;
use med_core::records::SgmtRecord;
use med_core::slice::{Contiguon, SampleBound, TimeSlice};

pub use med_core::dir_ext::{
    RECORD_DIR_EXT, SESSION_DIR_EXT, TIME_SERIES_CHANNEL_DIR_EXT, TIME_SERIES_SEGMENT_DIR_EXT,
    VIDEO_CHANNEL_DIR_EXT, VIDEO_SEGMENT_DIR_EXT,
};

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// List immediate subdirectories of `dir` whose extension is `ext`, sorted
/// by file name so segment order matches acquisition order (segment
/// directories are conventionally named with a zero-padded index).
fn subdirs_with_ext(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, MedError> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() && extension_of(&path) == Some(ext) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Find the single file directly inside `dir` whose extension is `ext`.
fn file_with_ext(dir: &Path, ext: &str) -> Result<PathBuf, MedError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && extension_of(&path) == Some(ext) {
            return Ok(path);
        }
    }
    Err(MedError::SettingsError {
        msg: format!("no .{} file found under {}", ext, dir.display()),
    })
}

fn opt_subdir_with_ext(dir: &Path, ext: &str) -> Result<Option<PathBuf>, MedError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() && extension_of(&path) == Some(ext) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// A discovered `.recd` records directory: data (`.rdat`) + indices (`.ridx`).
#[derive(Debug, Clone)]
pub struct RecordsPaths {
    pub data_file: PathBuf,
    pub index_file: PathBuf,
}

pub fn discover_records_dir(records_dir: &Path) -> Result<RecordsPaths, MedError> {
    Ok(RecordsPaths {
        data_file: file_with_ext(records_dir, "rdat")?,
        index_file: file_with_ext(records_dir, "ridx")?,
    })
}

/// The files making up one time-series segment directory (`.tisd`).
#[derive(Debug, Clone)]
pub struct TimeSeriesSegmentPaths {
    pub segment_dir: PathBuf,
    pub data_file: PathBuf,
    pub index_file: PathBuf,
    pub records: Option<RecordsPaths>,
}

pub fn discover_time_series_segment(segment_dir: &Path) -> Result<TimeSeriesSegmentPaths, MedError> {
    let records_dir = opt_subdir_with_ext(segment_dir, RECORD_DIR_EXT)?;
    Ok(TimeSeriesSegmentPaths {
        segment_dir: segment_dir.to_path_buf(),
        data_file: file_with_ext(segment_dir, "tdat")?,
        index_file: file_with_ext(segment_dir, "tidx")?,
        records: records_dir.map(|d| discover_records_dir(&d)).transpose()?,
    })
}

/// A discovered time-series channel directory (`.ticd`): one metadata file,
/// any channel-level records, and its ordered segment subdirectories.
#[derive(Debug, Clone)]
pub struct TimeSeriesChannelPaths {
    pub channel_dir: PathBuf,
    pub metadata_file: PathBuf,
    pub records: Option<RecordsPaths>,
    pub segments: Vec<TimeSeriesSegmentPaths>,
}

pub fn discover_time_series_channel(channel_dir: &Path) -> Result<TimeSeriesChannelPaths, MedError> {
    let segment_dirs = subdirs_with_ext(channel_dir, TIME_SERIES_SEGMENT_DIR_EXT)?;
    let segments = segment_dirs
        .iter()
        .map(|d| discover_time_series_segment(d))
        .collect::<Result<Vec<_>, _>>()?;
    let records_dir = opt_subdir_with_ext(channel_dir, RECORD_DIR_EXT)?;
    Ok(TimeSeriesChannelPaths {
        channel_dir: channel_dir.to_path_buf(),
        metadata_file: file_with_ext(channel_dir, "tmet")?,
        records: records_dir.map(|d| discover_records_dir(&d)).transpose()?,
        segments,
    })
}

/// The files making up one video segment directory (`.visd`). Video clip
/// bytes are stored raw (no CMP compression), so a segment is just a clip
/// file plus its index.
#[derive(Debug, Clone)]
pub struct VideoSegmentPaths {
    pub segment_dir: PathBuf,
    pub data_file: PathBuf,
    pub index_file: PathBuf,
    pub records: Option<RecordsPaths>,
}

pub fn discover_video_segment(segment_dir: &Path) -> Result<VideoSegmentPaths, MedError> {
    let records_dir = opt_subdir_with_ext(segment_dir, RECORD_DIR_EXT)?;
    Ok(VideoSegmentPaths {
        segment_dir: segment_dir.to_path_buf(),
        data_file: file_with_ext(segment_dir, "vdat")?,
        index_file: file_with_ext(segment_dir, "vidx")?,
        records: records_dir.map(|d| discover_records_dir(&d)).transpose()?,
    })
}

/// A discovered video channel directory (`.vicd`).
#[derive(Debug, Clone)]
pub struct VideoChannelPaths {
    pub channel_dir: PathBuf,
    pub metadata_file: PathBuf,
    pub records: Option<RecordsPaths>,
    pub segments: Vec<VideoSegmentPaths>,
}

pub fn discover_video_channel(channel_dir: &Path) -> Result<VideoChannelPaths, MedError> {
    let segment_dirs = subdirs_with_ext(channel_dir, VIDEO_SEGMENT_DIR_EXT)?;
    let segments = segment_dirs
        .iter()
        .map(|d| discover_video_segment(d))
        .collect::<Result<Vec<_>, _>>()?;
    let records_dir = opt_subdir_with_ext(channel_dir, RECORD_DIR_EXT)?;
    Ok(VideoChannelPaths {
        channel_dir: channel_dir.to_path_buf(),
        metadata_file: file_with_ext(channel_dir, "vmet")?,
        records: records_dir.map(|d| discover_records_dir(&d)).transpose()?,
        segments,
    })
}

/// A discovered session directory (`.medd`): its time-series and video
/// channel subdirectories plus any session-level records.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    pub session_dir: PathBuf,
    pub time_series_channels: Vec<PathBuf>,
    pub video_channels: Vec<PathBuf>,
    pub records: Option<RecordsPaths>,
}

pub fn discover_session(session_dir: &Path) -> Result<SessionPaths, MedError> {
    let records_dir = opt_subdir_with_ext(session_dir, RECORD_DIR_EXT)?;
    Ok(SessionPaths {
        session_dir: session_dir.to_path_buf(),
        time_series_channels: subdirs_with_ext(session_dir, TIME_SERIES_CHANNEL_DIR_EXT)?,
        video_channels: subdirs_with_ext(session_dir, VIDEO_CHANNEL_DIR_EXT)?,
        records: records_dir.map(|d| discover_records_dir(&d)).transpose()?,
    })
}

/// Resolve `slice`'s segment bounds against a channel's ordered `Sgmt`
/// records. A segment's start time is not stored directly -- it is the
/// previous segment's `end_time + 1`, the first segment's start being
/// whatever the slice already requested (or the recording start, for a
/// whole-recording slice).
pub fn resolve_time_slice(slice: TimeSlice, sgmt_records: &[SgmtRecord]) -> TimeSlice {
    if sgmt_records.is_empty() {
        return slice.condition(0, 0, 0);
    }

    let last_index = sgmt_records.len() - 1;
    let start_segment = sgmt_records
        .iter()
        .position(|record| record.end_time >= slice.start_time)
        .unwrap_or(0);
    let end_segment = sgmt_records
        .iter()
        .position(|record| record.end_time >= slice.end_time)
        .unwrap_or(last_index);

    slice.condition(sgmt_records.len() as i32, start_segment as i32, end_segment as i32)
}

/// One [`Contiguon`] per segment: in MED, segment boundaries are exactly
/// where acquisition discontinuities occur, so a discontinuity-free run
/// never spans more than one segment.
pub fn build_contigua(sgmt_records: &[SgmtRecord]) -> Vec<Contiguon> {
    let mut previous_end = 0i64;
    sgmt_records
        .iter()
        .map(|record| {
            let contiguon = Contiguon {
                start_time: previous_end,
                end_time: record.end_time,
                start_bound: SampleBound::Sample(record.start_sample_number),
                end_bound: SampleBound::Sample(record.end_sample_number),
                start_segment_number: record.segment_number,
                end_segment_number: record.segment_number,
            };
            previous_end = record.end_time + 1;
            contiguon
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sgmt(end_time: i64, start_sample: i64, end_sample: i64, number: i32) -> SgmtRecord {
        SgmtRecord {
            end_time,
            start_sample_number: start_sample,
            end_sample_number: end_sample,
            segment_uid: 0,
            segment_number: number,
            acquisition_channel_number: SgmtRecord::ALL_CHANNELS,
            sampling_frequency: 1000.0,
            segment_description: String::new(),
        }
    }

    #[test]
    fn resolve_time_slice_picks_the_segment_straddling_each_bound() {
        let segments = vec![sgmt(999, 0, 999, 0), sgmt(1999, 1000, 1999, 1), sgmt(2999, 2000, 2999, 2)];
        let slice = TimeSlice::from_time_range(1500, 2500);
        let resolved = resolve_time_slice(slice, &segments);
        assert!(resolved.is_conditioned());
        assert_eq!(resolved.start_segment_number, 1);
        assert_eq!(resolved.end_segment_number, 2);
        assert_eq!(resolved.number_of_segments, Some(3));
    }

    #[test]
    fn resolve_time_slice_on_empty_segments_is_conditioned_to_zero() {
        let slice = TimeSlice::whole_recording();
        let resolved = resolve_time_slice(slice, &[]);
        assert_eq!(resolved.number_of_segments, Some(0));
    }

    #[test]
    fn build_contigua_yields_one_run_per_segment() {
        let segments = vec![sgmt(999, 0, 999, 0), sgmt(1999, 1000, 1999, 1)];
        let contigua = build_contigua(&segments);
        assert_eq!(contigua.len(), 2);
        assert_eq!(contigua[0].end_time, 999);
        assert_eq!(contigua[1].start_time, 1000);
        assert_eq!(contigua[1].end_time, 1999);
    }

    #[test]
    fn discovers_a_two_segment_time_series_channel() {
        let root = tempfile::tempdir().unwrap();
        let channel_dir = root.path().join("chan_001.ticd");
        fs::create_dir(&channel_dir).unwrap();
        fs::write(channel_dir.join("chan_001.tmet"), []).unwrap();
        for i in 0..2 {
            let seg_dir = channel_dir.join(format!("chan_001-{:06}.tisd", i));
            fs::create_dir(&seg_dir).unwrap();
            fs::write(seg_dir.join("chan_001.tdat"), []).unwrap();
            fs::write(seg_dir.join("chan_001.tidx"), []).unwrap();
        }
        let discovered = discover_time_series_channel(&channel_dir).expect("discovers channel");
        assert_eq!(discovered.segments.len(), 2);
        assert!(discovered.segments[0].segment_dir < discovered.segments[1].segment_dir);
    }

    #[test]
    fn discovers_records_directory_when_present() {
        let root = tempfile::tempdir().unwrap();
        let segment_dir = root.path().join("seg.tisd");
        fs::create_dir(&segment_dir).unwrap();
        fs::write(segment_dir.join("seg.tdat"), []).unwrap();
        fs::write(segment_dir.join("seg.tidx"), []).unwrap();
        let records_dir = segment_dir.join("seg.recd");
        fs::create_dir(&records_dir).unwrap();
        fs::write(records_dir.join("seg.rdat"), []).unwrap();
        fs::write(records_dir.join("seg.ridx"), []).unwrap();

        let discovered = discover_time_series_segment(&segment_dir).expect("discovers segment");
        assert!(discovered.records.is_some());
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let segment_dir = root.path().join("seg.tisd");
        fs::create_dir(&segment_dir).unwrap();
        fs::write(segment_dir.join("seg.tdat"), []).unwrap();
        // no .tidx written
        assert!(discover_time_series_segment(&segment_dir).is_err());
    }
}
