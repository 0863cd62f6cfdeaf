use heapless::String;

use crate::config::FILENAME_MAX_LEN;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsError {
    NotReady,
    Disk,
    NotFound,
    InvalidPath,
    AlreadyExists,
    Denied,
    NotEmpty,
    NoFilesystem,
    Full,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, read only.
    Read,
    /// Write access; creates the file when missing, keeps its contents otherwise.
    WriteOpenAlways,
    /// Write access; always starts from an empty file.
    CreateAlways,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String<FILENAME_MAX_LEN>,
    pub is_dir: bool,
    pub size: u32,
}

impl DirEntry {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeStats {
    pub free_clusters: u32,
    /// FAT entry count, including the two reserved entries.
    pub fat_entries: u32,
    pub sectors_per_cluster: u32,
}

/// Filesystem library the card utilities run on.
///
/// Paths are `/`-separated and relative to the volume root; the root itself
/// is `""` or `"/"`.
pub trait FatFs {
    type Dir;
    type File;

    fn mount(&mut self) -> Result<(), FsError>;
    fn unmount(&mut self) -> Result<(), FsError>;

    fn open_dir(&mut self, path: &str) -> Result<Self::Dir, FsError>;
    /// Returns `Ok(None)` at end of directory.
    fn read_dir(&mut self, dir: &mut Self::Dir) -> Result<Option<DirEntry>, FsError>;
    fn close_dir(&mut self, dir: Self::Dir) -> Result<(), FsError>;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, FsError>;
    fn close(&mut self, file: Self::File) -> Result<(), FsError>;
    fn read(&mut self, file: &mut Self::File, out: &mut [u8]) -> Result<usize, FsError>;
    /// Reads one line, newline included, into `out`; at most `out.len() - 1`
    /// bytes are read. Returns `Ok(None)` when nothing was left to read.
    fn read_line(&mut self, file: &mut Self::File, out: &mut [u8])
        -> Result<Option<usize>, FsError>;
    fn write(&mut self, file: &mut Self::File, data: &[u8]) -> Result<usize, FsError>;
    fn seek(&mut self, file: &mut Self::File, offset: u32) -> Result<(), FsError>;
    fn size(&self, file: &Self::File) -> u32;

    fn mkdir(&mut self, path: &str) -> Result<(), FsError>;
    fn unlink(&mut self, path: &str) -> Result<(), FsError>;
    fn rename(&mut self, src: &str, dst: &str) -> Result<(), FsError>;
    fn getfree(&mut self) -> Result<VolumeStats, FsError>;
    /// Creates a fresh FAT32 volume over the whole card.
    fn mkfs(&mut self) -> Result<(), FsError>;
}
