//! This contains the enums used in MED's universal headers, CMP block flags,
//! and record type dispatch.
//!
//! As a general rule, enums with a fixed, closed set of on-disk values return
//! an error when an invalid code is found (`FileTypeCode`, `EncryptionLevel`);
//! enums read from a byte that can legitimately carry application-defined
//! values outside the known set fall back to an `Unknown` variant instead
//! (`CmpAlgorithm`).
use num::FromPrimitive;
#[cfg(any(feature = "to_json", feature = "serde"))]
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// Four-byte ASCII type codes found in a universal header's `type_string` field,
/// read little-endian as a `u32` (matching the reference library's anonymous
/// union of the string with a numeric type code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileTypeCode {
    SessionMetadata,
    SessionRecordsData,
    SessionRecordsIndices,
    TimeSeriesMetadata,
    TimeSeriesData,
    TimeSeriesIndices,
    VideoMetadata,
    VideoData,
    VideoIndices,
    RecordsData,
    RecordsIndices,
}

impl FileTypeCode {
    /// The four-letter extension/type-code string for this file kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionMetadata => "smet",
            Self::SessionRecordsData => "srdt",
            Self::SessionRecordsIndices => "srid",
            Self::TimeSeriesMetadata => "tmet",
            Self::TimeSeriesData => "tdat",
            Self::TimeSeriesIndices => "tidx",
            Self::VideoMetadata => "vmet",
            Self::VideoData => "vdat",
            Self::VideoIndices => "vidx",
            Self::RecordsData => "rdat",
            Self::RecordsIndices => "ridx",
        }
    }

    /// Parse a four-byte ASCII type code as found on disk.
    pub fn new(source: &str) -> Result<Self, MedError> {
        match source {
            "smet" => Ok(Self::SessionMetadata),
            "srdt" => Ok(Self::SessionRecordsData),
            "srid" => Ok(Self::SessionRecordsIndices),
            "tmet" => Ok(Self::TimeSeriesMetadata),
            "tdat" => Ok(Self::TimeSeriesData),
            "tidx" => Ok(Self::TimeSeriesIndices),
            "vmet" => Ok(Self::VideoMetadata),
            "vdat" => Ok(Self::VideoData),
            "vidx" => Ok(Self::VideoIndices),
            "rdat" => Ok(Self::RecordsData),
            "ridx" => Ok(Self::RecordsIndices),
            _ => Err(MedError::ParseEnum {
                f: "FileTypeCode".to_string(),
                code: u32::from_le_bytes({
                    let mut b = [0u8; 4];
                    let src = source.as_bytes();
                    let n = src.len().min(4);
                    b[..n].copy_from_slice(&src[..n]);
                    b
                }),
            }),
        }
    }
}

impl std::fmt::Display for FileTypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encryption level for a metadata section, record, or CMP block.
///
/// A negative value of `Level1`/`Level2` marks the section as "currently
/// decrypted in memory" (the reference library's sign-negation trick);
/// `no_entry()` is `-128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionLevel {
    NoEntry,
    None,
    Level1,
    Level2,
    Level1Decrypted,
    Level2Decrypted,
}

impl EncryptionLevel {
    pub const NO_ENTRY_RAW: i8 = -128;

    /// Build from the raw signed byte stored on disk / in memory.
    pub fn from_raw(raw: i8) -> Self {
        match raw {
            Self::NO_ENTRY_RAW => Self::NoEntry,
            0 => Self::None,
            1 => Self::Level1,
            2 => Self::Level2,
            -1 => Self::Level1Decrypted,
            -2 => Self::Level2Decrypted,
            _ => Self::NoEntry,
        }
    }

    /// Recover the raw signed byte representation.
    pub fn to_raw(self) -> i8 {
        match self {
            Self::NoEntry => Self::NO_ENTRY_RAW,
            Self::None => 0,
            Self::Level1 => 1,
            Self::Level2 => 2,
            Self::Level1Decrypted => -1,
            Self::Level2Decrypted => -2,
        }
    }

    /// Mark a currently-encrypted level as decrypted (sign negation), leaving
    /// `None`/`NoEntry` unchanged.
    pub fn mark_decrypted(self) -> Self {
        match self {
            Self::Level1 => Self::Level1Decrypted,
            Self::Level2 => Self::Level2Decrypted,
            other => other,
        }
    }

    /// Restore the positive (encrypted-on-disk) representation.
    pub fn mark_encrypted(self) -> Self {
        match self {
            Self::Level1Decrypted => Self::Level1,
            Self::Level2Decrypted => Self::Level2,
            other => other,
        }
    }

    /// The nominal level (1 or 2) regardless of current decrypted/encrypted state.
    pub fn nominal_level(self) -> i8 {
        match self {
            Self::Level1 | Self::Level1Decrypted => 1,
            Self::Level2 | Self::Level2Decrypted => 2,
            Self::None => 0,
            Self::NoEntry => Self::NO_ENTRY_RAW,
        }
    }
}

/// The four CMP encodings, packed into the low nibble of `block_flags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum CmpAlgorithm {
    Red = 0,
    Pred = 1,
    Mbe = 2,
    Vds = 3,
}

impl CmpAlgorithm {
    pub fn new(source: u8) -> Result<Self, MedError> {
        Self::from_u8(source).ok_or_else(|| MedError::ParseEnum {
            f: "CmpAlgorithm".to_string(),
            code: source as u32,
        })
    }
}

impl std::fmt::Display for CmpAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The sign category of a PRED residual, used to select among the three
/// parallel histograms/range coders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualSign {
    Nil,
    Pos,
    Neg,
}

impl ResidualSign {
    pub fn of(residual: i32) -> Self {
        match residual.cmp(&0) {
            std::cmp::Ordering::Equal => Self::Nil,
            std::cmp::Ordering::Greater => Self::Pos,
            std::cmp::Ordering::Less => Self::Neg,
        }
    }
}

/// Four-byte ASCII type codes found in a record header, dispatching the
/// record-body parser. Unknown codes are preserved verbatim so the body can
/// be skipped via `total_record_bytes` and logged as a warning, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordTypeCode {
    Sgmt,
    Stat,
    Note,
    Edfa,
    Seiz,
    Sylg,
    Nlxp,
    Curs,
    Epoc,
    Esti,
    Csti,
    Term,
    Unknown(String),
}

impl RecordTypeCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sgmt => "Sgmt",
            Self::Stat => "Stat",
            Self::Note => "Note",
            Self::Edfa => "EDFA",
            Self::Seiz => "Seiz",
            Self::Sylg => "SyLg",
            Self::Nlxp => "NlxP",
            Self::Curs => "Curs",
            Self::Epoc => "Epoc",
            Self::Esti => "ESti",
            Self::Csti => "CSti",
            Self::Term => "Term",
            Self::Unknown(s) => s,
        }
    }

    pub fn new(source: &str) -> Self {
        match source {
            "Sgmt" => Self::Sgmt,
            "Stat" => Self::Stat,
            "Note" => Self::Note,
            "EDFA" => Self::Edfa,
            "Seiz" => Self::Seiz,
            "SyLg" => Self::Sylg,
            "NlxP" => Self::Nlxp,
            "Curs" => Self::Curs,
            "Epoc" => Self::Epoc,
            "ESti" => Self::Esti,
            "CSti" => Self::Csti,
            "Term" => Self::Term,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for RecordTypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `trigger_mode` byte of an `NlxP` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum NlxTriggerMode {
    NoTrigger = 0,
    AnyBitChange = 1,
    HighBitSet = 2,
    Unknown = 0xFF,
}

impl NlxTriggerMode {
    pub fn new(source: u8) -> Self {
        Self::from_u8(source).unwrap_or(Self::Unknown)
    }
}
