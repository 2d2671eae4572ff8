//! Time-extent types (`TIME_SLICE_m11`/`CONTIGUON_m11`): the bounds a read
//! request is made against, and the contiguous (discontinuity-free) runs a
//! segment is made of.
use crate::time::UUTC_NO_ENTRY;

/// `number_of_segments == UNKNOWN` sentinel.
pub const UNKNOWN_SEGMENT_COUNT: i32 = -1;

/// Session-relative sample bound, aliased as a frame bound for video channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleBound {
    Sample(i64),
    Frame(i64),
}

/// A requested or resolved time/sample extent.
///
/// `conditioned` mirrors the reference library's tri-state `TERN_m11`: a
/// slice is unconditioned until [`TimeSlice::condition`] has resolved its
/// sample/frame bounds from its time bounds (or vice versa) against an
/// actual segment's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlice {
    conditioned: bool,
    /// `None` if the segment range spanned by this slice is not yet known.
    pub number_of_segments: Option<i32>,
    pub start_time: i64,
    pub end_time: i64,
    pub start_bound: SampleBound,
    pub end_bound: SampleBound,
    pub start_segment_number: i32,
    pub end_segment_number: i32,
}

impl TimeSlice {
    /// An unconditioned slice spanning the whole recording.
    pub fn whole_recording() -> Self {
        TimeSlice {
            conditioned: false,
            number_of_segments: None,
            start_time: UUTC_NO_ENTRY,
            end_time: UUTC_NO_ENTRY,
            start_bound: SampleBound::Sample(-1),
            end_bound: SampleBound::Sample(-1),
            start_segment_number: UNKNOWN_SEGMENT_COUNT,
            end_segment_number: UNKNOWN_SEGMENT_COUNT,
        }
    }

    pub fn from_time_range(start_time: i64, end_time: i64) -> Self {
        TimeSlice {
            start_time,
            end_time,
            ..Self::whole_recording()
        }
    }

    pub fn is_conditioned(&self) -> bool {
        self.conditioned
    }

    /// Mark this slice as conditioned: its sample/frame and segment bounds
    /// are now consistent with its time bounds (or the reverse) for a
    /// specific channel. The actual resolution against a channel's index is
    /// a `med-in` concern; this only records that the step has happened.
    pub fn condition(mut self, number_of_segments: i32, start_segment: i32, end_segment: i32) -> Self {
        self.conditioned = true;
        self.number_of_segments = Some(number_of_segments);
        self.start_segment_number = start_segment;
        self.end_segment_number = end_segment;
        self
    }
}

/// A contiguous (discontinuity-free) run within a segment, in session-relative
/// (global) sample/frame indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contiguon {
    pub start_time: i64,
    pub end_time: i64,
    pub start_bound: SampleBound,
    pub end_bound: SampleBound,
    pub start_segment_number: i32,
    pub end_segment_number: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_recording_is_unconditioned() {
        let slice = TimeSlice::whole_recording();
        assert!(!slice.is_conditioned());
        assert_eq!(slice.number_of_segments, None);
    }

    #[test]
    fn condition_resolves_segment_bounds() {
        let slice = TimeSlice::from_time_range(1000, 2000).condition(3, 0, 2);
        assert!(slice.is_conditioned());
        assert_eq!(slice.number_of_segments, Some(3));
        assert_eq!(slice.start_segment_number, 0);
        assert_eq!(slice.end_segment_number, 2);
    }
}
