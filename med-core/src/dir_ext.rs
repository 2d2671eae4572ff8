//! Directory/extension strings for the session -> channel -> segment
//! hierarchy (C7): one spelling shared by `med-in`'s discovery and
//! `med-out`'s builder.
pub const SESSION_DIR_EXT: &str = "medd";
pub const TIME_SERIES_CHANNEL_DIR_EXT: &str = "ticd";
pub const TIME_SERIES_SEGMENT_DIR_EXT: &str = "tisd";
pub const VIDEO_CHANNEL_DIR_EXT: &str = "vicd";
pub const VIDEO_SEGMENT_DIR_EXT: &str = "visd";
pub const RECORD_DIR_EXT: &str = "recd";
