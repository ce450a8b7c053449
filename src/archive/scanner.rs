use crate::archive::format::{computed_checksum, padded_size, Block, Header, BLOCK_SIZE};
use crate::archive::reader::ArchiveReader;
use crate::error::{Result, UstarError};
use std::io::{self, Read, Seek, SeekFrom};
use tracing::{debug, warn};

/// A header together with where it sits in the stream
#[derive(Debug, Clone)]
pub struct ScannedEntry {
    pub header: Header,
    /// Absolute stream offset of the header block
    pub header_offset: u64,
    /// Absolute stream offset of the first data byte
    pub data_offset: u64,
}

/// Sequential block-by-block traversal of an archive
///
/// Each step seeks to the next header, decodes it and jumps over its data
/// blocks. Iteration ends at the first all-zero block.
pub struct Scanner<'a, R> {
    stream: &'a mut R,
    position: u64,
    verify: bool,
    require_terminator: bool,
    done: bool,
}

impl<'a, R: Read + Seek> Scanner<'a, R> {
    pub fn new(stream: &'a mut R, origin: u64, verify: bool, require_terminator: bool) -> Self {
        Self {
            stream,
            position: origin,
            verify,
            require_terminator,
            done: false,
        }
    }

    /// Decode the next header, or `None` once the end of the archive is reached
    pub fn next_entry(&mut self) -> Result<Option<ScannedEntry>> {
        if self.done {
            return Ok(None);
        }

        // The caller may have moved the stream since the last step
        self.stream.seek(SeekFrom::Start(self.position))?;

        let mut block = [0u8; BLOCK_SIZE];
        if !read_block(self.stream, &mut block)? {
            self.done = true;
            if self.require_terminator {
                return Err(UstarError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "archive ended without an end-of-archive block",
                )));
            }
            warn!(offset = self.position, "archive ended without an end-of-archive block");
            return Ok(None);
        }

        let Some(header) = Header::from_block(&block) else {
            debug!(offset = self.position, "end-of-archive block");
            self.done = true;
            return Ok(None);
        };

        if self.verify {
            if let Err(err) = header.validate(computed_checksum(&block)) {
                warn!(offset = self.position, name = %header.name_lossy(), %err, "invalid header");
                self.done = true;
                return Err(err);
            }
        }

        let header_offset = self.position;
        let data_offset = header_offset + BLOCK_SIZE as u64;
        self.position = data_offset + padded_size(header.size);

        Ok(Some(ScannedEntry {
            header,
            header_offset,
            data_offset,
        }))
    }
}

impl<R: Read + Seek> Iterator for Scanner<'_, R> {
    type Item = Result<ScannedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_entry() {
            Ok(entry) => entry.map(Ok),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Fill `block` from the stream.
///
/// Returns `false` on a clean end of stream before the first byte; a block cut
/// short midway is an `UnexpectedEof` error.
fn read_block<R: Read>(stream: &mut R, block: &mut Block) -> Result<bool> {
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        match stream.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    match filled {
        0 => Ok(false),
        BLOCK_SIZE => Ok(true),
        _ => Err(UstarError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("truncated block: {} of {} bytes", filled, BLOCK_SIZE),
        ))),
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Start a fresh scan from the archive origin
    pub fn scan(&mut self) -> Result<Scanner<'_, R>> {
        self.stream.seek(SeekFrom::Start(self.origin))?;
        Ok(Scanner::new(
            &mut self.stream,
            self.origin,
            self.config.verify_headers,
            self.config.require_terminator,
        ))
    }

    /// Validate every header up to the end-of-archive block.
    ///
    /// Returns the number of headers on success. The first invalid header stops
    /// the scan and only its error is reported; headers are always validated
    /// here regardless of `verify_headers`.
    pub fn validate_archive(&mut self) -> Result<usize> {
        let mut scanner = Scanner::new(
            &mut self.stream,
            self.origin,
            true,
            self.config.require_terminator,
        );

        let mut count = 0;
        while scanner.next_entry()?.is_some() {
            count += 1;
        }

        debug!(headers = count, "archive validated");
        Ok(count)
    }

    /// First entry whose name is byte-exact equal to `path`
    pub(crate) fn find_entry(&mut self, path: &[u8]) -> Result<Option<ScannedEntry>> {
        for entry in self.scan()? {
            let entry = entry?;
            if entry.header.is_named(path) {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}
