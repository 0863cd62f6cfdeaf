//! Folder-to-folder file moves and folder bootstrap.

use crate::{
    config::PATHNAME_MAX_LEN,
    dir::scan_dir,
    fs::{FatFs, FsError, OpenMode},
    path::PathBuffer,
};

type MovePath = PathBuffer<{ PATHNAME_MAX_LEN + 1 }>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveError {
    /// Source or destination path longer than the path limit.
    Path,
    SourceMissing,
    Rename(FsError),
}

impl From<FsError> for MoveError {
    fn from(value: FsError) -> Self {
        Self::Rename(value)
    }
}

/// Moves `src_folder/filename` to `dst_folder/filename`, replacing any file
/// already at the destination.
///
/// A folder with the same name at the destination is left alone and the
/// move fails. Not atomic: the old destination file is deleted before the
/// rename, so a failed rename leaves neither the old destination nor a
/// moved file there. A missing source fails before the destination is
/// touched.
pub fn move_file<F: FatFs>(
    fs: &mut F,
    dst_folder: &str,
    src_folder: &str,
    filename: &str,
) -> Result<(), MoveError> {
    let mut src = MovePath::new();
    let mut dst = MovePath::new();
    if !src.join(src_folder, filename) || !dst.join(dst_folder, filename) {
        log::debug!(
            "sdcard: move_file path too long src={} dst={} name={}",
            src_folder,
            dst_folder,
            filename
        );
        return Err(MoveError::Path);
    }

    match fs.open(src.as_str(), OpenMode::Read) {
        Ok(file) => {
            let _ = fs.close(file);
        }
        Err(_) => return Err(MoveError::SourceMissing),
    }

    // Only a file at the destination is replaced; a folder there makes the
    // rename fail.
    if let Ok(file) = fs.open(dst.as_str(), OpenMode::Read) {
        let _ = fs.close(file);
        if let Err(err) = fs.unlink(dst.as_str()) {
            log::debug!("sdcard: move_file old dst kept path={} err={:?}", dst.as_str(), err);
        }
    }

    fs.rename(src.as_str(), dst.as_str())?;
    log::debug!("sdcard: move_file src={} dst={}", src.as_str(), dst.as_str());
    Ok(())
}

/// Counts the entries of folder `name`, creating the folder when it cannot
/// be listed. Returns 0 for a folder that was just created or could not be
/// created.
pub fn folder_create_and_count<F: FatFs>(fs: &mut F, name: &str) -> usize {
    match scan_dir(fs, name, None) {
        Ok(count) => count,
        Err(err) => {
            if let Err(mkdir_err) = fs.mkdir(name) {
                log::warn!(
                    "sdcard: folder_create failed name={} scan={:?} err={:?}",
                    name,
                    err,
                    mkdir_err
                );
            }
            0
        }
    }
}
