use super::{close_quietly, DirError};
use crate::fs::FatFs;

/// Counts the entries of `dir`, optionally copying their names into `out`.
///
/// Names land in `out` as `name1\0name2\0...\0nameN\0\0`. Without a buffer
/// the call only counts, which doubles as an existence check. On
/// `BufferTooSmall` or a read failure the names written so far are kept
/// and the list is still closed with the end marker, always inside `out`.
pub fn scan_dir<F: FatFs>(
    fs: &mut F,
    dir: &str,
    mut out: Option<&mut [u8]>,
) -> Result<usize, DirError> {
    if out.as_ref().is_some_and(|buf| buf.is_empty()) {
        return Err(DirError::BufferTooSmall);
    }

    let mut handle = fs.open_dir(dir).map_err(DirError::Open)?;
    let mut cursor = 0usize;
    let mut count = 0usize;

    let result = loop {
        let entry = match fs.read_dir(&mut handle) {
            Ok(Some(entry)) => entry,
            Ok(None) => break Ok(count),
            Err(err) => break Err(DirError::Read(err)),
        };

        if let Some(buf) = out.as_deref_mut() {
            let name = entry.name().as_bytes();
            // One byte stays reserved for the end-of-list marker.
            let room = buf.len() - 1 - cursor;
            if name.len() >= room {
                break Err(DirError::BufferTooSmall);
            }
            buf[cursor..cursor + name.len()].copy_from_slice(name);
            buf[cursor + name.len()] = 0;
            cursor += name.len() + 1;
        }
        count += 1;
    };

    if let Some(buf) = out {
        buf[cursor] = 0;
    }
    close_quietly(fs, handle, "scan_dir");

    if let Err(err) = result {
        log::debug!("sdcard: scan_dir aborted dir={} after={} err={:?}", dir, count, err);
    }
    result
}

/// Names stored in a listing produced by [`scan_dir`].
pub fn listing_names(listing: &[u8]) -> ListingNames<'_> {
    ListingNames { rest: listing }
}

pub struct ListingNames<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for ListingNames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.rest.iter().position(|&b| b == 0)?;
        if end == 0 {
            self.rest = &[];
            return None;
        }
        let (name, tail) = self.rest.split_at(end);
        self.rest = &tail[1..];
        Some(core::str::from_utf8(name).unwrap_or(""))
    }
}
