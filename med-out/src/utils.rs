//! Miscellaneous helpers for building the on-disk session -> channel ->
//! segment directory tree (C7 write side), matching the naming convention
//! `med_in::hierarchy` discovers: `<name>.<dir_ext>` directories,
//! `<name>-{index:06}.<segment_dir_ext>` segment directories, and
//! `<name>.<file_ext>` files inside each directory.
use std::path::{Path, PathBuf};

/// Build a directory path named `<name>.<ext>` under `parent`.
pub fn named_dir(parent: &Path, name: &str, ext: &str) -> PathBuf {
    parent.join(format!("{}.{}", name, ext))
}

/// Build a zero-padded segment directory path `<name>-{index:06}.<ext>`
/// under `parent`.
pub fn segment_dir(parent: &Path, name: &str, index: u32, ext: &str) -> PathBuf {
    parent.join(format!("{}-{:06}.{}", name, index, ext))
}

/// Build a file path named `<name>.<ext>` under `dir`.
pub fn named_file(dir: &Path, name: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_dir_appends_extension() {
        let parent = Path::new("/sessions");
        assert_eq!(named_dir(parent, "chan_001", "ticd"), Path::new("/sessions/chan_001.ticd"));
    }

    #[test]
    fn segment_dir_zero_pads_the_index() {
        let parent = Path::new("/sessions/chan_001.ticd");
        assert_eq!(
            segment_dir(parent, "chan_001", 7, "tisd"),
            Path::new("/sessions/chan_001.ticd/chan_001-000007.tisd")
        );
    }

    #[test]
    fn named_file_appends_extension() {
        let dir = Path::new("/sessions/chan_001.ticd");
        assert_eq!(named_file(dir, "chan_001", "tmet"), Path::new("/sessions/chan_001.ticd/chan_001.tmet"));
    }
}
