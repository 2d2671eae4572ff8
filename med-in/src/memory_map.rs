//! Memory-mapped access to MED files (C4 read path). A single thin wrapper
//! serves every MED file kind -- universal header, metadata, record, index,
//! and CMP-bearing data files -- since they all share the same 1024-byte
//! universal header prefix and otherwise differ only in how their body is
//! interpreted, which is `convert_headers`'s job, not this module's.
use std::path::Path;

use med_core::errors::MedError;
use med_core::layout::UNIVERSAL_HEADER_BYTES;
use memmap2::{Mmap, MmapOptions};

/// A memory-mapped MED file plus the open handle keeping the mapping valid.
pub struct MappedMedFile {
    map: Mmap,
    _file: std::fs::File,
}

impl MappedMedFile {
    /// Map `path` and check it is at least long enough to hold a universal header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MedError> {
        let (map, file) = map_file_to_memory(path.as_ref())?;
        if map.len() < UNIVERSAL_HEADER_BYTES {
            return Err(MedError::FileTooShort);
        }
        Ok(MappedMedFile { map, _file: file })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The file's 1024-byte universal header.
    pub fn universal_header(&self) -> &[u8] {
        &self.map[..UNIVERSAL_HEADER_BYTES]
    }

    /// Everything after the universal header.
    pub fn body(&self) -> &[u8] {
        &self.map[UNIVERSAL_HEADER_BYTES..]
    }

    /// A bounds-checked slice of the mapping; the common accessor every
    /// fixed-layout region (metadata sections, record/index entries, CMP
    /// block headers) is read through.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8], MedError> {
        let end = offset
            .checked_add(len)
            .ok_or(MedError::Allocation { msg: "slice offset+len overflowed".to_string() })?;
        if end > self.map.len() {
            return Err(MedError::FileTooShort);
        }
        Ok(&self.map[offset..end])
    }

    /// The whole mapping, for callers walking a sequence of fixed-size
    /// records (record/index files, time-series/video index files).
    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }
}

fn map_file_to_memory(path: &Path) -> Result<(Mmap, std::fs::File), MedError> {
    let file = std::fs::File::open(path).map_err(MedError::MapFile)?;
    let map = unsafe { MmapOptions::new().map(&file).map_err(MedError::MapFile)? };
    Ok((map, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn rejects_a_file_shorter_than_a_universal_header() {
        let f = write_temp(&[0u8; 100]);
        let err = MappedMedFile::open(f.path()).unwrap_err();
        assert!(matches!(err, MedError::FileTooShort));
    }

    #[test]
    fn exposes_header_and_body_slices() {
        let mut bytes = vec![0u8; UNIVERSAL_HEADER_BYTES + 16];
        bytes[UNIVERSAL_HEADER_BYTES] = 0xAB;
        let f = write_temp(&bytes);
        let mapped = MappedMedFile::open(f.path()).unwrap();
        assert_eq!(mapped.universal_header().len(), UNIVERSAL_HEADER_BYTES);
        assert_eq!(mapped.body()[0], 0xAB);
        assert_eq!(mapped.len(), bytes.len());
    }

    #[test]
    fn slice_out_of_bounds_errors() {
        let bytes = vec![0u8; UNIVERSAL_HEADER_BYTES];
        let f = write_temp(&bytes);
        let mapped = MappedMedFile::open(f.path()).unwrap();
        assert!(mapped.slice(0, UNIVERSAL_HEADER_BYTES + 1).is_err());
        assert!(mapped.slice(0, UNIVERSAL_HEADER_BYTES).is_ok());
    }
}
