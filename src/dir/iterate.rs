use super::{close_quietly, DirError, IterPath};
use crate::fs::FatFs;

/// Calls `visit(path, name)` for every entry of `dir` and returns how many
/// entries were visited.
///
/// `path` is `dir/name` built through [`crate::path::join`]. Once started,
/// the walk visits every remaining entry; it stops early only when a path
/// does not fit or the directory read fails.
pub fn iterate_dir<F, V>(fs: &mut F, dir: &str, mut visit: V) -> Result<usize, DirError>
where
    F: FatFs,
    V: FnMut(&mut F, &str, &str),
{
    let mut handle = fs.open_dir(dir).map_err(DirError::Open)?;
    let mut path = IterPath::new();
    let mut count = 0usize;

    let result = loop {
        let entry = match fs.read_dir(&mut handle) {
            Ok(Some(entry)) => entry,
            Ok(None) => break Ok(count),
            Err(err) => break Err(DirError::Read(err)),
        };
        if !path.join(dir, entry.name()) {
            break Err(DirError::Path);
        }
        count += 1;
        visit(fs, path.as_str(), entry.name());
    };

    close_quietly(fs, handle, "iterate_dir");
    if let Err(err) = result {
        log::debug!("sdcard: iterate_dir aborted dir={} after={} err={:?}", dir, count, err);
    }
    result
}
