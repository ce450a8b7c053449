use crate::archive::format::EntryType;
use crate::archive::reader::ArchiveReader;
use crate::error::{Result, UstarError};
use std::collections::HashSet;
use std::io::{Read, Seek};
use tracing::{debug, warn};

impl<R: Read + Seek> ArchiveReader<R> {
    /// Check if an entry named exactly `path` exists
    pub fn exists(&mut self, path: impl AsRef<[u8]>) -> Result<bool> {
        Ok(self.find_entry(path.as_ref())?.is_some())
    }

    /// Check if `path` names a directory entry
    pub fn is_dir(&mut self, path: impl AsRef<[u8]>) -> Result<bool> {
        self.has_type(path.as_ref(), |t| t == EntryType::Directory)
    }

    /// Check if `path` names a regular or contiguous file
    pub fn is_file(&mut self, path: impl AsRef<[u8]>) -> Result<bool> {
        self.has_type(path.as_ref(), EntryType::is_regular)
    }

    /// Check if `path` names a symbolic link. The link itself is tested, not its target.
    pub fn is_symlink(&mut self, path: impl AsRef<[u8]>) -> Result<bool> {
        self.has_type(path.as_ref(), |t| t == EntryType::Symlink)
    }

    fn has_type(&mut self, path: &[u8], predicate: impl Fn(EntryType) -> bool) -> Result<bool> {
        Ok(self
            .find_entry(path)?
            .is_some_and(|entry| predicate(entry.header.entry_type)))
    }

    /// Follow symlinks starting at `path` until a non-symlink path is reached.
    ///
    /// Each hop replaces the path with the link's raw target bytes. A path that
    /// is not a symlink, or does not exist, is returned unchanged. Revisiting a
    /// path or exceeding `max_symlink_hops` fails with `SymlinkCycle`.
    pub fn resolve_symlink(&mut self, path: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let max_hops = self.config.max_symlink_hops;
        let mut visited: HashSet<Vec<u8>> = HashSet::new();
        let mut current = path.as_ref().to_vec();

        loop {
            let target = match self.find_entry(&current)? {
                Some(entry) if entry.header.entry_type == EntryType::Symlink => {
                    entry.header.linkname
                }
                _ => return Ok(current),
            };

            if visited.len() >= max_hops || !visited.insert(current.clone()) {
                let at = String::from_utf8_lossy(&current).into_owned();
                warn!(at = %at, hops = visited.len(), "symlink resolution did not terminate");
                return Err(UstarError::SymlinkCycle(at));
            }

            debug!(
                from = %String::from_utf8_lossy(&current),
                to = %String::from_utf8_lossy(&target),
                "following symlink"
            );
            current = target;
        }
    }
}
