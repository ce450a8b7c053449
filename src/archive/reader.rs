use crate::archive::format::Header;
use crate::config::ReaderConfig;
use crate::error::{Result, UstarError};
use std::io::{self, Read, Seek, SeekFrom};
use tracing::debug;

/// Read-only accessor over a ustar archive
///
/// The reader owns the stream handle and repositions it on every call; it keeps
/// no index, so every query is a fresh linear scan from the archive start.
/// One reader must not be shared between threads without external locking.
/// Open a second stream on the same archive for concurrent queries instead.
pub struct ArchiveReader<R> {
    pub(super) stream: R,
    pub(super) origin: u64,
    pub(super) config: ReaderConfig,
}

/// Result of a windowed [`ArchiveReader::read_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes copied into the destination buffer
    pub copied: usize,
    /// Bytes left between the end of the copy and the end of the file
    pub remaining: u64,
}

impl ReadOutcome {
    /// The copy reached the end of the file content
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Wrap a stream positioned at the start of an archive
    pub fn new(stream: R) -> Result<Self> {
        Self::with_config(stream, ReaderConfig::default())
    }

    /// Wrap a stream with explicit configuration
    pub fn with_config(mut stream: R, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        let origin = stream.stream_position()?;
        Ok(Self {
            stream,
            origin,
            config,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Give the stream back to the caller
    pub fn into_inner(self) -> R {
        self.stream
    }

    /// Every header in archive order
    pub fn entries(&mut self) -> Result<Vec<Header>> {
        self.scan()?
            .map(|entry| entry.map(|e| e.header))
            .collect()
    }

    /// Header of the entry named exactly `path`
    pub fn get_entry(&mut self, path: impl AsRef<[u8]>) -> Result<Option<Header>> {
        Ok(self.find_entry(path.as_ref())?.map(|e| e.header))
    }

    /// Copy part of a regular file into `dest`, starting `offset` bytes into its content.
    ///
    /// Symlinks in `path` are followed first. At most `dest.len()` bytes are
    /// copied; the outcome reports how many bytes of the file remain after the
    /// copied window.
    pub fn read_file(
        &mut self,
        path: impl AsRef<[u8]>,
        offset: u64,
        dest: &mut [u8],
    ) -> Result<ReadOutcome> {
        let path = path.as_ref();
        let (data_offset, size) = self.locate_regular(path)?;

        if offset >= size {
            return Err(UstarError::OffsetOutOfRange { offset, size });
        }

        let available = size - offset;
        let copied = available.min(dest.len() as u64) as usize;

        self.stream.seek(SeekFrom::Start(data_offset + offset))?;
        self.stream.read_exact(&mut dest[..copied])?;

        debug!(path = %String::from_utf8_lossy(path), offset, copied, "read file window");

        Ok(ReadOutcome {
            copied,
            remaining: available - copied as u64,
        })
    }

    /// Read the whole content of a regular file, following symlinks
    pub fn read_to_end(&mut self, path: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let (data_offset, size) = self.locate_regular(path.as_ref())?;

        self.stream.seek(SeekFrom::Start(data_offset))?;
        let mut data = Vec::new();
        (&mut self.stream).take(size).read_to_end(&mut data)?;

        // Sizes come from the header; do not trust them to preallocate
        if (data.len() as u64) < size {
            return Err(UstarError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file data cut short: {} of {} bytes", data.len(), size),
            )));
        }

        Ok(data)
    }

    /// Data offset and size of the regular file `path` resolves to
    fn locate_regular(&mut self, path: &[u8]) -> Result<(u64, u64)> {
        let resolved = self.resolve_symlink(path)?;
        match self.find_entry(&resolved)? {
            Some(entry) if entry.header.entry_type.is_regular() => {
                Ok((entry.data_offset, entry.header.size))
            }
            _ => Err(UstarError::NotFoundOrNotRegularFile(
                String::from_utf8_lossy(path).into_owned(),
            )),
        }
    }
}
