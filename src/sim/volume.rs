use heapless::{Deque, String, Vec};

use crate::{
    config::{FILENAME_MAX_LEN, SD_PATH_MAX},
    fs::{DirEntry, FatFs, FsError, OpenMode, VolumeStats},
};

pub const SIM_MAX_NODES: usize = 32;
pub const SIM_FILE_MAX: usize = 512;
const SIM_MOUNT_SCRIPT_MAX: usize = 8;

struct Node {
    path: String<SD_PATH_MAX>,
    is_dir: bool,
    live: bool,
    data: Vec<u8, SIM_FILE_MAX>,
}

pub struct MemDir {
    path: String<SD_PATH_MAX>,
    next: usize,
    served: usize,
}

pub struct MemFile {
    path: String<SD_PATH_MAX>,
    pos: usize,
    writable: bool,
}

/// In-memory volume with 8.3 names and scriptable failures.
///
/// Nodes keep insertion order, so directory reads enumerate entries in the
/// order they were created. Unlinked nodes stay behind as dead slots until
/// space runs out, which keeps open directory cursors stable while entries
/// are deleted under them.
pub struct MemVolume {
    nodes: Vec<Node, SIM_MAX_NODES>,
    mounted: bool,
    mount_script: Deque<Result<(), FsError>, SIM_MOUNT_SCRIPT_MAX>,
    mount_calls: usize,
    unmount_result: Result<(), FsError>,
    read_dir_fail_after: Option<usize>,
    rename_error: Option<FsError>,
    stats: VolumeStats,
    opened: usize,
    closed: usize,
    reads: usize,
}

impl MemVolume {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            mounted: false,
            mount_script: Deque::new(),
            mount_calls: 0,
            unmount_result: Ok(()),
            read_dir_fail_after: None,
            rename_error: None,
            stats: VolumeStats {
                free_clusters: 0,
                fat_entries: 2,
                sectors_per_cluster: 1,
            },
            opened: 0,
            closed: 0,
            reads: 0,
        }
    }

    /// A volume that is already mounted, for exercising the file utilities
    /// without a session.
    pub fn mounted() -> Self {
        let mut volume = Self::new();
        volume.mounted = true;
        volume
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn mount_calls(&self) -> usize {
        self.mount_calls
    }

    /// Queues the outcome of the next `mount` call; unscripted mounts succeed.
    pub fn script_mount(&mut self, result: Result<(), FsError>) {
        let _ = self.mount_script.push_back(result);
    }

    pub fn set_unmount_result(&mut self, result: Result<(), FsError>) {
        self.unmount_result = result;
    }

    /// Makes `read_dir` fail once `served` entries of a directory were returned.
    pub fn fail_read_dir_after(&mut self, served: usize) {
        self.read_dir_fail_after = Some(served);
    }

    pub fn fail_rename(&mut self, error: FsError) {
        self.rename_error = Some(error);
    }

    pub fn set_stats(&mut self, stats: VolumeStats) {
        self.stats = stats;
    }

    /// Handles opened and not yet closed, files and directories alike.
    pub fn open_handles(&self) -> usize {
        self.opened - self.closed
    }

    /// Number of `read_line` calls served so far.
    pub fn line_reads(&self) -> usize {
        self.reads
    }

    pub fn insert_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.create(path, true).map(|_| ())
    }

    pub fn insert_file(&mut self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let idx = self.create(path, false)?;
        self.nodes[idx].data = Vec::from_slice(data).map_err(|_| FsError::Full)?;
        Ok(())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.find(normalize(path)).is_some()
    }

    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        let idx = self.find(normalize(path))?;
        let node = &self.nodes[idx];
        (!node.is_dir).then_some(node.data.as_slice())
    }

    fn ensure_mounted(&self) -> Result<(), FsError> {
        if self.mounted {
            Ok(())
        } else {
            Err(FsError::NotReady)
        }
    }

    fn find(&self, path: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.live && node.path.as_str() == path)
    }

    fn dir_exists(&self, path: &str) -> bool {
        path.is_empty() || self.find(path).is_some_and(|idx| self.nodes[idx].is_dir)
    }

    fn has_children(&self, path: &str) -> bool {
        self.nodes
            .iter()
            .any(|node| node.live && parent_of(node.path.as_str()) == path)
    }

    fn create(&mut self, path: &str, is_dir: bool) -> Result<usize, FsError> {
        let path = normalize(path);
        let name = name_of(path);
        if name.is_empty() || name.len() > FILENAME_MAX_LEN {
            return Err(FsError::InvalidPath);
        }
        if self.find(path).is_some() {
            return Err(FsError::AlreadyExists);
        }
        if !self.dir_exists(parent_of(path)) {
            return Err(FsError::NotFound);
        }
        let node = Node {
            path: String::try_from(path).map_err(|_| FsError::InvalidPath)?,
            is_dir,
            live: true,
            data: Vec::new(),
        };
        if self.nodes.is_full() {
            self.nodes.retain(|node| node.live);
        }
        self.nodes.push(node).map_err(|_| FsError::Full)?;
        Ok(self.nodes.len() - 1)
    }

    fn file_node(&self, file: &MemFile) -> Result<usize, FsError> {
        self.find(file.path.as_str()).ok_or(FsError::NotFound)
    }
}

impl Default for MemVolume {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn name_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

impl FatFs for MemVolume {
    type Dir = MemDir;
    type File = MemFile;

    fn mount(&mut self) -> Result<(), FsError> {
        self.mount_calls += 1;
        let result = self.mount_script.pop_front().unwrap_or(Ok(()));
        self.mounted = result.is_ok();
        result
    }

    fn unmount(&mut self) -> Result<(), FsError> {
        self.mounted = false;
        self.unmount_result
    }

    fn open_dir(&mut self, path: &str) -> Result<Self::Dir, FsError> {
        self.ensure_mounted()?;
        let path = normalize(path);
        if !self.dir_exists(path) {
            return Err(FsError::NotFound);
        }
        self.opened += 1;
        Ok(MemDir {
            path: String::try_from(path).map_err(|_| FsError::InvalidPath)?,
            next: 0,
            served: 0,
        })
    }

    fn read_dir(&mut self, dir: &mut Self::Dir) -> Result<Option<DirEntry>, FsError> {
        self.ensure_mounted()?;
        if self.read_dir_fail_after.is_some_and(|limit| dir.served >= limit) {
            return Err(FsError::Disk);
        }
        while dir.next < self.nodes.len() {
            let node = &self.nodes[dir.next];
            dir.next += 1;
            if !node.live || parent_of(node.path.as_str()) != dir.path.as_str() {
                continue;
            }
            dir.served += 1;
            return Ok(Some(DirEntry {
                name: String::try_from(name_of(node.path.as_str()))
                    .map_err(|_| FsError::InvalidPath)?,
                is_dir: node.is_dir,
                size: node.data.len() as u32,
            }));
        }
        Ok(None)
    }

    fn close_dir(&mut self, _dir: Self::Dir) -> Result<(), FsError> {
        self.closed += 1;
        Ok(())
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, FsError> {
        self.ensure_mounted()?;
        let path = normalize(path);
        let idx = match (self.find(path), mode) {
            (Some(idx), _) if self.nodes[idx].is_dir => return Err(FsError::Denied),
            (Some(idx), OpenMode::CreateAlways) => {
                self.nodes[idx].data.clear();
                idx
            }
            (Some(idx), _) => idx,
            (None, OpenMode::Read) => return Err(FsError::NotFound),
            (None, _) => self.create(path, false)?,
        };
        self.opened += 1;
        Ok(MemFile {
            path: self.nodes[idx].path.clone(),
            pos: 0,
            writable: !matches!(mode, OpenMode::Read),
        })
    }

    fn close(&mut self, _file: Self::File) -> Result<(), FsError> {
        self.closed += 1;
        Ok(())
    }

    fn read(&mut self, file: &mut Self::File, out: &mut [u8]) -> Result<usize, FsError> {
        self.ensure_mounted()?;
        let data = &self.nodes[self.file_node(file)?].data;
        let start = file.pos.min(data.len());
        let count = out.len().min(data.len() - start);
        out[..count].copy_from_slice(&data[start..start + count]);
        file.pos = start + count;
        Ok(count)
    }

    fn read_line(
        &mut self,
        file: &mut Self::File,
        out: &mut [u8],
    ) -> Result<Option<usize>, FsError> {
        self.ensure_mounted()?;
        self.reads += 1;
        let data = &self.nodes[self.file_node(file)?].data;
        let limit = out.len().saturating_sub(1);
        let mut count = 0usize;
        while count < limit && file.pos < data.len() {
            let byte = data[file.pos];
            out[count] = byte;
            count += 1;
            file.pos += 1;
            if byte == b'\n' {
                break;
            }
        }
        if let Some(terminator) = out.get_mut(count) {
            *terminator = 0;
        }
        Ok((count > 0).then_some(count))
    }

    fn write(&mut self, file: &mut Self::File, data: &[u8]) -> Result<usize, FsError> {
        self.ensure_mounted()?;
        if !file.writable {
            return Err(FsError::Denied);
        }
        let idx = self.file_node(file)?;
        let contents = &mut self.nodes[idx].data;
        let end = file.pos.checked_add(data.len()).ok_or(FsError::Full)?;
        if end > contents.capacity() {
            return Err(FsError::Full);
        }
        if end > contents.len() {
            contents.resize(end, 0).map_err(|_| FsError::Full)?;
        }
        contents[file.pos..end].copy_from_slice(data);
        file.pos = end;
        Ok(data.len())
    }

    fn seek(&mut self, file: &mut Self::File, offset: u32) -> Result<(), FsError> {
        self.ensure_mounted()?;
        let idx = self.file_node(file)?;
        let offset = offset as usize;
        let contents = &mut self.nodes[idx].data;
        if offset > contents.len() {
            if !file.writable {
                file.pos = contents.len();
                return Ok(());
            }
            contents.resize(offset, 0).map_err(|_| FsError::Full)?;
        }
        file.pos = offset;
        Ok(())
    }

    fn size(&self, file: &Self::File) -> u32 {
        self.find(file.path.as_str())
            .map_or(0, |idx| self.nodes[idx].data.len() as u32)
    }

    fn mkdir(&mut self, path: &str) -> Result<(), FsError> {
        self.ensure_mounted()?;
        self.create(path, true).map(|_| ())
    }

    fn unlink(&mut self, path: &str) -> Result<(), FsError> {
        self.ensure_mounted()?;
        let path = normalize(path);
        let idx = self.find(path).ok_or(FsError::NotFound)?;
        if self.nodes[idx].is_dir && self.has_children(path) {
            return Err(FsError::Denied);
        }
        self.nodes[idx].live = false;
        Ok(())
    }

    fn rename(&mut self, src: &str, dst: &str) -> Result<(), FsError> {
        self.ensure_mounted()?;
        if let Some(error) = self.rename_error {
            return Err(error);
        }
        let src = normalize(src);
        let dst = normalize(dst);
        self.find(src).ok_or(FsError::NotFound)?;
        if self.find(dst).is_some() {
            return Err(FsError::AlreadyExists);
        }
        if !self.dir_exists(parent_of(dst)) {
            return Err(FsError::NotFound);
        }
        let name = name_of(dst);
        if name.is_empty() || name.len() > FILENAME_MAX_LEN {
            return Err(FsError::InvalidPath);
        }

        for node in self.nodes.iter_mut().filter(|node| node.live) {
            let Some(rest) = node.path.strip_prefix(src) else {
                continue;
            };
            if !rest.is_empty() && !rest.starts_with('/') {
                continue;
            }
            let mut renamed: String<SD_PATH_MAX> = String::new();
            renamed.push_str(dst).map_err(|_| FsError::InvalidPath)?;
            renamed.push_str(rest).map_err(|_| FsError::InvalidPath)?;
            node.path = renamed;
        }
        Ok(())
    }

    fn getfree(&mut self) -> Result<VolumeStats, FsError> {
        self.ensure_mounted()?;
        Ok(self.stats)
    }

    fn mkfs(&mut self) -> Result<(), FsError> {
        self.nodes.clear();
        Ok(())
    }
}
