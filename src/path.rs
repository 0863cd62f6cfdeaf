//! `folder/name` construction into fixed buffers.
//!
//! [`join`] is the only place paths are concatenated; the directory
//! iterator, the file mover and the folder utilities all go through it.

/// Writes `folder`, `/` and `name` into `out` followed by a NUL byte.
///
/// Copying stops at `out.len() - 1` bytes and the result is always
/// NUL-terminated when `out` is not empty. Returns `false` when the full
/// path plus its terminator did not fit; `out` then holds a truncated,
/// still terminated prefix that must not be used as a path.
pub fn join(out: &mut [u8], folder: &str, name: &str) -> bool {
    let Some(last) = out.len().checked_sub(1) else {
        return false;
    };
    let mut len = 0usize;
    let mut complete = true;
    for part in [folder.as_bytes(), b"/", name.as_bytes()] {
        let room = last - len;
        let take = part.len().min(room);
        out[len..len + take].copy_from_slice(&part[..take]);
        len += take;
        if take < part.len() {
            complete = false;
            break;
        }
    }
    out[len] = 0;
    complete
}

/// Length `join` needs for `folder` and `name`, terminator included.
pub const fn joined_len(folder: &str, name: &str) -> usize {
    folder.len() + 1 + name.len() + 1
}

/// Caller-owned path storage of `N` bytes, terminator included.
#[derive(Clone)]
pub struct PathBuffer<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> PathBuffer<N> {
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Rebuilds the buffer as `folder/name`; on overflow the buffer is left
    /// empty and `false` is returned.
    pub fn join(&mut self, folder: &str, name: &str) -> bool {
        if join(&mut self.bytes, folder, name) {
            self.len = folder.len() + 1 + name.len();
            true
        } else {
            self.len = 0;
            false
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
    }

    /// Path bytes including the NUL terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        let end = (self.len + 1).min(N);
        &self.bytes[..end]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
        if let Some(first) = self.bytes.first_mut() {
            *first = 0;
        }
    }
}

impl<const N: usize> Default for PathBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for PathBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("PathBuffer").field(&self.as_str()).finish()
    }
}
