//! File-level helpers over the mounted volume.
//!
//! Every helper opens and closes its own handle; a handle is closed on
//! every path out of the helper, including failures.

use crate::{
    config::SD_SECTOR_SIZE,
    dir::iterate_dir,
    fs::{FatFs, FsError, OpenMode},
};

/// Free and total space in MiB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeSpace {
    pub free_mib: u32,
    pub total_mib: u32,
}

const SECTORS_PER_MIB_SHIFT: u32 = 20 - SD_SECTOR_SIZE.trailing_zeros();

fn finish<F: FatFs, T>(
    fs: &mut F,
    file: F::File,
    result: Result<T, FsError>,
) -> Result<T, FsError> {
    let closed = fs.close(file);
    let value = result?;
    closed.map(|()| value)
}

pub fn file_exists<F: FatFs>(fs: &mut F, path: &str) -> bool {
    match fs.open(path, OpenMode::Read) {
        Ok(file) => {
            let _ = fs.close(file);
            true
        }
        Err(_) => false,
    }
}

/// Size of `path` in bytes, 0 when it cannot be opened.
pub fn file_size<F: FatFs>(fs: &mut F, path: &str) -> u32 {
    match fs.open(path, OpenMode::Read) {
        Ok(file) => {
            let size = fs.size(&file);
            let _ = fs.close(file);
            size
        }
        Err(_) => 0,
    }
}

/// Creates `path` as an empty file, truncating an existing one.
pub fn create_file<F: FatFs>(fs: &mut F, path: &str) -> Result<(), FsError> {
    let file = fs.open(path, OpenMode::CreateAlways)?;
    fs.close(file)
}

/// Appends `data` to `path`, creating the file when missing.
pub fn append_to_file<F: FatFs>(fs: &mut F, path: &str, data: &[u8]) -> Result<(), FsError> {
    let mut file = fs.open(path, OpenMode::WriteOpenAlways)?;
    let end = fs.size(&file);
    let result = fs
        .seek(&mut file, end)
        .and_then(|()| fs.write(&mut file, data).map(|_| ()));
    finish(fs, file, result)
}

/// Writes `data` at byte `offset` of `path`, creating the file when missing.
pub fn write_at_offset<F: FatFs>(
    fs: &mut F,
    path: &str,
    data: &[u8],
    offset: u32,
) -> Result<(), FsError> {
    let mut file = fs.open(path, OpenMode::WriteOpenAlways)?;
    let result = fs
        .seek(&mut file, offset)
        .and_then(|()| fs.write(&mut file, data).map(|_| ()));
    finish(fs, file, result)
}

/// Opens `path` for reading; the handle goes back through [`close_file`].
pub fn open_file<F: FatFs>(fs: &mut F, path: &str) -> Result<F::File, FsError> {
    fs.open(path, OpenMode::Read)
}

pub fn close_file<F: FatFs>(fs: &mut F, file: F::File) -> Result<(), FsError> {
    fs.close(file)
}

/// Reads the next line of an open file into `line_buf`, newline included.
///
/// Returns `Ok(None)` at end of file. The line is cut at
/// `line_buf.len() - 1` bytes and at the first byte that is not UTF-8.
pub fn read_file_line<'b, F: FatFs>(
    fs: &mut F,
    file: &mut F::File,
    line_buf: &'b mut [u8],
) -> Result<Option<&'b str>, FsError> {
    match fs.read_line(file, line_buf)? {
        Some(len) => Ok(Some(utf8_prefix(&line_buf[..len]))),
        None => Ok(None),
    }
}

/// Reads from an already open file into `out`, returning the bytes read.
pub fn read_binary<F: FatFs>(
    fs: &mut F,
    file: &mut F::File,
    out: &mut [u8],
) -> Result<usize, FsError> {
    fs.read(file, out)
}

/// Reads from an already open file starting at `offset`.
pub fn read_at_offset<F: FatFs>(
    fs: &mut F,
    file: &mut F::File,
    offset: u32,
    out: &mut [u8],
) -> Result<usize, FsError> {
    fs.seek(file, offset)?;
    fs.read(file, out)
}

/// Feeds `path` to `on_line` one line at a time until the file ends or
/// `on_line` returns `false`.
///
/// Lines keep their trailing newline and are at most `line_buf.len() - 1`
/// bytes; longer lines arrive in pieces. Bytes that are not UTF-8 end the
/// piece they appear in.
pub fn read_lines<F, H>(
    fs: &mut F,
    path: &str,
    line_buf: &mut [u8],
    mut on_line: H,
) -> Result<(), FsError>
where
    F: FatFs,
    H: FnMut(&str) -> bool,
{
    let mut file = fs.open(path, OpenMode::Read)?;
    let result = loop {
        match fs.read_line(&mut file, line_buf) {
            Ok(Some(len)) => {
                if !on_line(utf8_prefix(&line_buf[..len])) {
                    break Ok(());
                }
            }
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };
    finish(fs, file, result)
}

fn utf8_prefix(bytes: &[u8]) -> &str {
    match core::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => core::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or(""),
    }
}

pub fn delete_file<F: FatFs>(fs: &mut F, path: &str) -> Result<(), FsError> {
    fs.unlink(path)
}

pub fn create_dir<F: FatFs>(fs: &mut F, path: &str) -> Result<(), FsError> {
    fs.mkdir(path)
}

/// Renames `src` to `dst`; fails when `dst` already exists.
pub fn rename_file<F: FatFs>(fs: &mut F, src: &str, dst: &str) -> Result<(), FsError> {
    fs.rename(src, dst)
}

/// Deletes the files in `dir` and then `dir` itself.
///
/// Sub-folders are not descended into, so a folder holding non-empty
/// sub-folders cannot be removed. A folder that cannot be opened counts as
/// already gone.
pub fn delete_dir<F: FatFs>(fs: &mut F, dir: &str) -> Result<(), FsError> {
    let walked = iterate_dir(fs, dir, |fs, path, _| {
        if let Err(err) = fs.unlink(path) {
            log::debug!("sdcard: delete_dir skip path={} err={:?}", path, err);
        }
    });
    match (fs.unlink(dir), walked) {
        (Ok(()), _) => Ok(()),
        (Err(_), Err(crate::dir::DirError::Open(_))) => Ok(()),
        (Err(err), _) => Err(err),
    }
}

/// Free and total space, assuming 512-byte sectors.
pub fn free_space<F: FatFs>(fs: &mut F) -> Result<FreeSpace, FsError> {
    let stats = fs.getfree()?;
    let cluster_sectors = stats.sectors_per_cluster as u64;
    let total_sectors = (stats.fat_entries.saturating_sub(2) as u64) * cluster_sectors;
    let free_sectors = stats.free_clusters as u64 * cluster_sectors;
    Ok(FreeSpace {
        free_mib: (free_sectors >> SECTORS_PER_MIB_SHIFT) as u32,
        total_mib: (total_sectors >> SECTORS_PER_MIB_SHIFT) as u32,
    })
}

/// Formats the card as a single FAT32 volume.
pub fn format<F: FatFs>(fs: &mut F) -> Result<(), FsError> {
    log::info!("sdcard: format fat32");
    fs.mkfs()
}

#[cfg(test)]
mod tests;
