//! Uses `med_out` to build a session on disk and `med_in` to read it back,
//! checking the two crates agree on-disk the same way the CMP block
//! encoder/decoder pair do at the block level.
use med_core::header_structs::TimeSeriesSection2;
use med_core::records::RecordFilter;
use med_core::settings::CmpDirectives;

use crate::{ChannelContext, SessionWriter};

#[test]
fn a_session_written_by_med_out_reads_back_through_med_in() {
    let dir = tempfile::tempdir().expect("tempdir");

    let session = SessionWriter::create(dir.path(), "patient_001").expect("create session");
    let session_dir = session.dir().to_path_buf();

    let mut section_2 = TimeSeriesSection2::default();
    section_2.sampling_frequency = 1000.0;

    let mut channel = session
        .time_series_channel("eeg_fp1", 7, 1, 0, section_2)
        .expect("create channel");

    let mut segment = channel.start_segment(0, 99, 0).expect("create segment");
    let directives = CmpDirectives::default();
    segment
        .append_block(&[1, 2, 3, 4, 5], 0, false, &directives, None)
        .expect("append block 1");
    segment
        .append_block(&[6, 7, 8, 9, 10], 5, false, &directives, None)
        .expect("append block 2");
    channel
        .finish_segment(segment, 1000.0, "baseline".to_string())
        .expect("finish segment");
    channel.finish().expect("finish channel");

    session.finish(1, 0).expect("finish session");

    let reader = med_in::SessionReader::open(&session_dir).expect("open session");
    assert_eq!(reader.time_series_channels.len(), 1);

    let eeg = &reader.time_series_channels[0];
    assert_eq!(eeg.sampling_frequency(), Some(1000.0));
    assert_eq!(eeg.segments.len(), 1);
    assert_eq!(eeg.segments[0].index_entries().len(), 2);

    let samples = eeg.segments[0].decode_all(None).expect("decode");
    assert_eq!(samples, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

    let records = eeg.records(&RecordFilter::new()).expect("channel records");
    assert_eq!(records.len(), 1);
}

#[test]
fn channel_context_is_cloneable_across_segments() {
    let ctx = ChannelContext {
        session_name: "s".to_string(),
        channel_name: "c".to_string(),
        session_uid: 1,
        channel_uid: 2,
        session_start_time: 0,
    };
    let cloned = ctx.clone();
    assert_eq!(cloned.channel_name, "c");
}
