use crate::archive::reader::ArchiveReader;
use crate::error::Result;
use std::io::{Read, Seek};
use tracing::{debug, warn};

/// Result of listing into a caller-sized buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    /// The path does not resolve to a directory; nothing was written
    NotADirectory,
    /// Every child fit in the buffer
    Complete { written: usize },
    /// More children exist than the buffer holds; the first `written` were kept
    Truncated { written: usize },
}

impl ListOutcome {
    pub fn written(&self) -> usize {
        match self {
            Self::NotADirectory => 0,
            Self::Complete { written } | Self::Truncated { written } => *written,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

/// True if `name` is directly inside `prefix` (which ends with `/`).
///
/// The remainder after the prefix may end with one `/` (a subdirectory) but
/// must not contain any other.
fn is_immediate_child(name: &[u8], prefix: &[u8]) -> bool {
    let Some(rest) = name.strip_prefix(prefix) else {
        return false;
    };
    let rest = rest.strip_suffix(b"/").unwrap_or(rest);
    !rest.is_empty() && !rest.contains(&b'/')
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Immediate children of the directory `path` resolves to, in archive order.
    ///
    /// Names are the raw header bytes, so each one can be passed back to any
    /// other query. Returns an empty list when the path is not a directory.
    pub fn list(&mut self, path: impl AsRef<[u8]>) -> Result<Vec<Vec<u8>>> {
        let mut children = Vec::new();
        self.for_each_child(path.as_ref(), |name| children.push(name))?;
        Ok(children)
    }

    /// Like [`list`](Self::list), writing into a bounded buffer.
    ///
    /// When there are more children than `out.len()`, the first ones are kept and
    /// the outcome is `Truncated`.
    pub fn list_into(
        &mut self,
        path: impl AsRef<[u8]>,
        out: &mut [Vec<u8>],
    ) -> Result<ListOutcome> {
        let path = path.as_ref();
        let mut written = 0;
        let mut total = 0;
        let is_dir = self.for_each_child(path, |name| {
            if let Some(slot) = out.get_mut(written) {
                *slot = name;
                written += 1;
            }
            total += 1;
        })?;

        if !is_dir {
            return Ok(ListOutcome::NotADirectory);
        }
        if total > written {
            warn!(
                path = %String::from_utf8_lossy(path),
                total,
                capacity = out.len(),
                "directory listing truncated"
            );
            return Ok(ListOutcome::Truncated { written });
        }
        Ok(ListOutcome::Complete { written })
    }

    /// Feed every immediate child name to `visit`. Returns false if `path` is not a directory.
    fn for_each_child(&mut self, path: &[u8], mut visit: impl FnMut(Vec<u8>)) -> Result<bool> {
        let Some(prefix) = self.resolve_directory(path)? else {
            debug!(path = %String::from_utf8_lossy(path), "not a directory");
            return Ok(false);
        };

        for entry in self.scan()? {
            let entry = entry?;
            if is_immediate_child(&entry.header.name, &prefix) {
                visit(entry.header.name);
            }
        }
        Ok(true)
    }

    /// Resolve symlinks and return the directory name with a trailing `/`.
    ///
    /// Symlink targets usually omit the trailing slash that directory entries
    /// carry, so both spellings are tried.
    fn resolve_directory(&mut self, path: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut resolved = self.resolve_symlink(path)?;

        if self.is_dir(&resolved)? {
            if !resolved.ends_with(b"/") {
                resolved.push(b'/');
            }
            return Ok(Some(resolved));
        }

        if !resolved.ends_with(b"/") {
            resolved.push(b'/');
            if self.is_dir(&resolved)? {
                return Ok(Some(resolved));
            }
        }

        Ok(None)
    }
}
