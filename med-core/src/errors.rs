use crate::enums::RecordTypeCode;

/// Basic error types used across the `med-core`/`med-in`/`med-out` family.
#[derive(Debug)]
pub enum MedError {
    /// TryFromSliceError from the std library.
    TryFromSlice(std::array::TryFromSliceError),
    /// FromUtf8Error from the std library.
    TryFromUtf8(std::string::FromUtf8Error),
    /// IoError from the std library.
    StdIoError(std::io::Error),
    /// File is too short to contain a universal header.
    FileTooShort,
    /// A universal header's type code did not match the expected type for this file.
    BadMagic { expected: String, found: String },
    /// A CMP block's start UID did not match `CMP_BLOCK_START_UID`.
    BadBlockMagic { found: u64 },
    /// Header CRC (bytes [4, 1024)) does not match stored value.
    HeaderCrcMismatch,
    /// Body CRC (bytes [1024, EOF)) does not match stored value.
    BodyCrcMismatch,
    /// Per-block CRC mismatch, with the offending block's start sample for diagnosis.
    BlockCrcMismatch { block_start_sample: i64 },
    /// A field held a value outside its documented range (e.g. block samples > max_block_samples).
    FieldOutOfRange { field: String, value: i64 },
    /// A pad region required to be zero was not.
    NonZeroPadding { region: String },
    /// Decryption was requested at a level exceeding the caller's derived access level.
    EncryptionLevelExceeded { requested: i8, access_level: i8 },
    /// A password validation field failed to decrypt to its expected sentinel.
    PasswordValidationFailed { level: i8 },
    /// The alignment self-check (C9) found a struct field at an unexpected byte offset.
    AlignmentCheckFailed { structure: String, field: String, expected: usize, found: usize },
    /// Generic allocation failure (buffer too large, etc).
    Allocation { msg: String },
    /// Memory-map creation failed.
    MmapFailure(std::io::Error),
    /// The process predicted it would exceed `RLIMIT_NOFILE`.
    TooManyOpenFiles { requested: usize, limit: usize },
    /// An error in a `MedSettings`/directives value.
    SettingsError { msg: String },
    /// A record body failed to parse against its declared `total_record_bytes`.
    RecordBodyTruncated { type_code: RecordTypeCode, declared: u32, available: usize },
    /// Enum creation error.
    ParseEnum { f: String, code: u32 },
    /// Map file error (this is just a `std::io` error when mapping files).
    MapFile(std::io::Error),
    #[cfg(feature = "to_json")]
    /// Serialisation/Deserialisation error.
    SerdeError(serde_json::Error),
}

impl From<std::array::TryFromSliceError> for MedError {
    fn from(e: std::array::TryFromSliceError) -> Self {
        Self::TryFromSlice(e)
    }
}

impl From<std::string::FromUtf8Error> for MedError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::TryFromUtf8(e)
    }
}

impl From<std::io::Error> for MedError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl std::fmt::Display for MedError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use self::MedError::*;
        match self {
            #[cfg(feature = "to_json")]
            SerdeError(x) => write!(fmt, "{}", x),
            StdIoError(x) => write!(fmt, "{}", x),
            TryFromSlice(x) => write!(fmt, "{}", x),
            TryFromUtf8(x) => write!(fmt, "{}", x),
            FileTooShort => write!(fmt, "File is too short to contain a MED universal header"),
            BadMagic { expected, found } => write!(fmt, "Expected type code '{}' but found '{}'", expected, found),
            BadBlockMagic { found } => write!(fmt, "CMP block start UID is 0x{:016x}, expected 0x0123456789abcdef", found),
            HeaderCrcMismatch => write!(fmt, "Universal header CRC mismatch"),
            BodyCrcMismatch => write!(fmt, "Universal header body CRC mismatch"),
            BlockCrcMismatch { block_start_sample } => write!(fmt, "CMP block CRC mismatch at start sample {}", block_start_sample),
            FieldOutOfRange { field, value } => write!(fmt, "Field '{}' has out-of-range value {}", field, value),
            NonZeroPadding { region } => write!(fmt, "Padding region '{}' is required to be zero but is not", region),
            EncryptionLevelExceeded { requested, access_level } => write!(fmt, "Decryption at level {} requested but access level is only {}", requested, access_level),
            PasswordValidationFailed { level } => write!(fmt, "Password validation field for level {} failed to decrypt", level),
            AlignmentCheckFailed { structure, field, expected, found } => write!(fmt, "Alignment check failed: {}::{} expected at offset {} but computed {}", structure, field, expected, found),
            Allocation { msg } => write!(fmt, "Allocation failed: {}", msg),
            MmapFailure(e) => write!(fmt, "Memory map failed: {}", e),
            TooManyOpenFiles { requested, limit } => write!(fmt, "Requested {} open files but RLIMIT_NOFILE is {}", requested, limit),
            SettingsError { msg } => write!(fmt, "Error in settings: {}", msg),
            RecordBodyTruncated { type_code, declared, available } => write!(fmt, "Record body for '{}' declares {} bytes but only {} are available", type_code, declared, available),
            ParseEnum { f, code } => write!(fmt, "Could not parse source ({}) to {}.", code, f),
            MapFile(e) => write!(fmt, "Could not create file map: {}", e),
        }
    }
}

impl From<MedError> for String {
    fn from(e: MedError) -> String {
        e.to_string()
    }
}

impl std::error::Error for MedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::MedError::*;
        match self {
            #[cfg(feature = "to_json")]
            SerdeError(x) => x.source(),
            StdIoError(x) | MapFile(x) | MmapFailure(x) => x.source(),
            TryFromSlice(x) => x.source(),
            TryFromUtf8(x) => x.source(),
            _ => None,
        }
    }
}
