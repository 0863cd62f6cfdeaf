//! Directory enumeration: a bulk scan into a caller buffer and a streaming
//! walk that hands every entry to a closure together with its full path.

use crate::{
    config::{FILENAME_MAX_LEN, SD_PATH_MAX},
    fs::{FatFs, FsError},
    path::PathBuffer,
};

mod iterate;
mod scan;

pub use iterate::iterate_dir;
pub use scan::{listing_names, scan_dir, ListingNames};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirError {
    /// The listing buffer cannot hold the next name and the end marker.
    BufferTooSmall,
    /// An entry's full path does not fit the path buffer.
    Path,
    Open(FsError),
    Read(FsError),
}

impl DirError {
    /// Status code reported to callers of the C-style interface.
    pub const fn code(self) -> i32 {
        match self {
            Self::BufferTooSmall | Self::Path => -1,
            Self::Open(_) => -2,
            Self::Read(_) => -3,
        }
    }
}

/// Room for a directory path of up to `SD_PATH_MAX` bytes, the separator,
/// one 8.3 name and the terminator.
pub const ITER_PATH_LEN: usize = SD_PATH_MAX + 1 + FILENAME_MAX_LEN + 1;

/// Path buffer used while walking a directory.
pub type IterPath = PathBuffer<ITER_PATH_LEN>;

fn close_quietly<F: FatFs>(fs: &mut F, dir: F::Dir, op: &str) {
    if let Err(err) = fs.close_dir(dir) {
        log::debug!("sdcard: {} close_dir_error={:?}", op, err);
    }
}
