use crate::error::{Result, UstarError};
use std::borrow::Cow;
use std::io::Write;
use std::ops::Range;

/// Every header and data region is aligned to this many bytes
pub const BLOCK_SIZE: usize = 512;

/// Magic value: "ustar" followed by a NUL
pub const USTAR_MAGIC: [u8; 6] = *b"ustar\0";

/// Version value, two ASCII zeros with no terminator
pub const USTAR_VERSION: [u8; 2] = *b"00";

/// Maximum length of the name and linkname fields in bytes
pub const MAX_NAME_LENGTH: usize = 100;

// Field layout within a header block
const NAME: Range<usize> = 0..100;
const MODE: Range<usize> = 100..108;
const UID: Range<usize> = 108..116;
const GID: Range<usize> = 116..124;
const SIZE: Range<usize> = 124..136;
const MTIME: Range<usize> = 136..148;
const CHECKSUM: Range<usize> = 148..156;
const TYPEFLAG: usize = 156;
const LINKNAME: Range<usize> = 157..257;
const MAGIC: Range<usize> = 257..263;
const VERSION: Range<usize> = 263..265;

/// A raw header block
pub type Block = [u8; BLOCK_SIZE];

/// Entry kind stored in the typeflag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// `'0'`, or NUL as written by pre-POSIX archivers
    Regular,
    HardLink,
    Symlink,
    CharDevice,
    BlockDevice,
    Directory,
    Fifo,
    /// `'7'`, treated as a regular file
    Contiguous,
    Other(u8),
}

impl EntryType {
    pub fn from_byte(value: u8) -> Self {
        match value {
            b'0' | b'\0' => Self::Regular,
            b'1' => Self::HardLink,
            b'2' => Self::Symlink,
            b'3' => Self::CharDevice,
            b'4' => Self::BlockDevice,
            b'5' => Self::Directory,
            b'6' => Self::Fifo,
            b'7' => Self::Contiguous,
            other => Self::Other(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Regular => b'0',
            Self::HardLink => b'1',
            Self::Symlink => b'2',
            Self::CharDevice => b'3',
            Self::BlockDevice => b'4',
            Self::Directory => b'5',
            Self::Fifo => b'6',
            Self::Contiguous => b'7',
            Self::Other(value) => value,
        }
    }

    /// Regular or contiguous-regular file
    pub fn is_regular(self) -> bool {
        matches!(self, Self::Regular | Self::Contiguous)
    }
}

/// Decode an ASCII octal field.
///
/// Leading spaces are skipped. Decoding stops at the first byte that is not an
/// octal digit (NUL and space included) or after `max_len` bytes. A field
/// without any digits decodes to 0.
pub fn decode_octal(bytes: &[u8], max_len: usize) -> u64 {
    let field = &bytes[..bytes.len().min(max_len)];
    let mut value: u64 = 0;
    for &b in field.iter().skip_while(|&&b| b == b' ') {
        if !(b'0'..=b'7').contains(&b) {
            break;
        }
        value = value.saturating_mul(8).saturating_add(u64::from(b - b'0'));
    }
    value
}

/// Encode `value` as zero-padded octal digits followed by a NUL, `width` bytes total
pub fn encode_octal(value: u64, width: usize) -> Result<Vec<u8>> {
    let digits = format!("{:0w$o}", value, w = width - 1);
    if digits.len() > width - 1 {
        return Err(UstarError::FieldOverflow(format!(
            "{} does not fit in a {}-byte octal field",
            value, width
        )));
    }
    let mut out = digits.into_bytes();
    out.push(0);
    Ok(out)
}

/// Unsigned sum of all header bytes with the checksum field counted as spaces
pub fn computed_checksum(block: &Block) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| if CHECKSUM.contains(&i) { b' ' } else { b })
        .map(u32::from)
        .sum()
}

/// True for the all-zero block that marks the end of an archive
pub fn is_end_marker(block: &Block) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Number of data blocks following a header for an entry of `size` bytes
pub fn data_blocks(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE as u64)
}

/// Entry size rounded up to whole blocks
pub fn padded_size(size: u64) -> u64 {
    data_blocks(size) * BLOCK_SIZE as u64
}

/// Bytes of a fixed-width string field up to its first NUL
fn field_str(field: &[u8]) -> Vec<u8> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    field[..end].to_vec()
}

/// One decoded ustar header block
///
/// Headers are rebuilt from raw bytes each time a scan visits them; nothing
/// holds on to them between queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: Vec<u8>,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: u64,
    pub checksum: u32,
    pub entry_type: EntryType,
    pub linkname: Vec<u8>,
    pub magic: [u8; 6],
    pub version: [u8; 2],
}

impl Header {
    /// Create a ustar header with default permissions for its type
    pub fn new(name: impl Into<Vec<u8>>, entry_type: EntryType, size: u64) -> Self {
        let mode = match entry_type {
            EntryType::Directory => 0o755,
            EntryType::Symlink => 0o777,
            _ => 0o644,
        };
        Self {
            name: name.into(),
            mode,
            uid: 0,
            gid: 0,
            size,
            mtime: 0,
            checksum: 0,
            entry_type,
            linkname: Vec::new(),
            magic: USTAR_MAGIC,
            version: USTAR_VERSION,
        }
    }

    pub fn with_linkname(mut self, linkname: impl Into<Vec<u8>>) -> Self {
        self.linkname = linkname.into();
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Decode a header block. Returns `None` for an end-of-archive marker.
    pub fn from_block(block: &Block) -> Option<Self> {
        if is_end_marker(block) {
            return None;
        }

        let mut magic = [0u8; 6];
        magic.copy_from_slice(&block[MAGIC]);
        let mut version = [0u8; 2];
        version.copy_from_slice(&block[VERSION]);

        Some(Self {
            name: field_str(&block[NAME]),
            mode: decode_octal(&block[MODE], MODE.len()) as u32,
            uid: decode_octal(&block[UID], UID.len()) as u32,
            gid: decode_octal(&block[GID], GID.len()) as u32,
            size: decode_octal(&block[SIZE], SIZE.len()),
            mtime: decode_octal(&block[MTIME], MTIME.len()),
            checksum: decode_octal(&block[CHECKSUM], CHECKSUM.len()) as u32,
            entry_type: EntryType::from_byte(block[TYPEFLAG]),
            linkname: field_str(&block[LINKNAME]),
            magic,
            version,
        })
    }

    /// Check magic, then version, then checksum. The first failure wins.
    pub fn validate(&self, computed: u32) -> Result<()> {
        if self.magic != USTAR_MAGIC {
            return Err(UstarError::bad_magic(&self.magic));
        }
        if self.version != USTAR_VERSION {
            return Err(UstarError::bad_version(&self.version));
        }
        if self.checksum != computed {
            return Err(UstarError::BadChecksum {
                expected: self.checksum,
                actual: computed,
            });
        }
        Ok(())
    }

    /// Encode into a block with a freshly computed checksum
    pub fn to_block(&self) -> Result<Block> {
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(UstarError::FieldOverflow(format!(
                "name is {} bytes (max {})",
                self.name.len(),
                MAX_NAME_LENGTH
            )));
        }
        if self.linkname.len() > MAX_NAME_LENGTH {
            return Err(UstarError::FieldOverflow(format!(
                "linkname is {} bytes (max {})",
                self.linkname.len(),
                MAX_NAME_LENGTH
            )));
        }

        let mut block = [0u8; BLOCK_SIZE];
        block[..self.name.len()].copy_from_slice(&self.name);
        block[MODE].copy_from_slice(&encode_octal(u64::from(self.mode), MODE.len())?);
        block[UID].copy_from_slice(&encode_octal(u64::from(self.uid), UID.len())?);
        block[GID].copy_from_slice(&encode_octal(u64::from(self.gid), GID.len())?);
        block[SIZE].copy_from_slice(&encode_octal(self.size, SIZE.len())?);
        block[MTIME].copy_from_slice(&encode_octal(self.mtime, MTIME.len())?);
        block[TYPEFLAG] = self.entry_type.as_byte();
        block[LINKNAME.start..LINKNAME.start + self.linkname.len()]
            .copy_from_slice(&self.linkname);
        block[MAGIC].copy_from_slice(&self.magic);
        block[VERSION].copy_from_slice(&self.version);

        // Six digits, NUL, space
        let checksum = computed_checksum(&block);
        let field = format!("{:06o}\0 ", checksum);
        block[CHECKSUM].copy_from_slice(field.as_bytes());

        Ok(block)
    }

    /// Write header block to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_block()?)?;
        Ok(())
    }

    /// Entry name as text, with invalid UTF-8 replaced
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Link target as text, with invalid UTF-8 replaced
    pub fn linkname_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.linkname)
    }

    /// Exact byte comparison against a lookup path
    pub fn is_named(&self, path: impl AsRef<[u8]>) -> bool {
        self.name == path.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_octal_stops_at_nul_and_space() {
        assert_eq!(decode_octal(b"0000644\0", 8), 0o644);
        assert_eq!(decode_octal(b"00000000005\0", 12), 5);
        assert_eq!(decode_octal(b"17 3", 4), 0o17);
        assert_eq!(decode_octal(b"   755 \0", 8), 0o755);
    }

    #[test]
    fn test_decode_octal_honors_max_len() {
        assert_eq!(decode_octal(b"1234", 2), 0o12);
        assert_eq!(decode_octal(b"777", 10), 0o777);
    }

    #[test]
    fn test_decode_octal_without_digits_is_zero() {
        assert_eq!(decode_octal(b"\0\0\0\0", 4), 0);
        assert_eq!(decode_octal(b"    ", 4), 0);
        assert_eq!(decode_octal(b"xyz", 3), 0);
        assert_eq!(decode_octal(b"", 8), 0);
    }

    #[test]
    fn test_encode_octal() {
        assert_eq!(encode_octal(5, 12).unwrap(), b"00000000005\0");
        assert_eq!(encode_octal(0o644, 8).unwrap(), b"0000644\0");
        assert!(encode_octal(0o10000000, 8).is_err());
    }

    #[test]
    fn test_entry_type_codes() {
        assert_eq!(EntryType::from_byte(b'0'), EntryType::Regular);
        assert_eq!(EntryType::from_byte(0), EntryType::Regular);
        assert_eq!(EntryType::from_byte(b'7'), EntryType::Contiguous);
        assert_eq!(EntryType::from_byte(b'5'), EntryType::Directory);
        assert_eq!(EntryType::from_byte(b'2'), EntryType::Symlink);
        assert_eq!(EntryType::from_byte(b'x'), EntryType::Other(b'x'));

        assert!(EntryType::Regular.is_regular());
        assert!(EntryType::Contiguous.is_regular());
        assert!(!EntryType::Directory.is_regular());
        assert!(!EntryType::Symlink.is_regular());
        assert!(!EntryType::HardLink.is_regular());
    }

    #[test]
    fn test_data_blocks() {
        assert_eq!(data_blocks(0), 0);
        assert_eq!(data_blocks(1), 1);
        assert_eq!(data_blocks(512), 1);
        assert_eq!(data_blocks(513), 2);
        assert_eq!(padded_size(5), 512);
        assert_eq!(padded_size(1024), 1024);
    }

    #[test]
    fn test_zero_block_is_not_a_header() {
        let block = [0u8; BLOCK_SIZE];
        assert!(is_end_marker(&block));
        assert!(Header::from_block(&block).is_none());
    }

    #[test]
    fn test_checksum_treats_field_as_spaces() {
        let mut block = [0u8; BLOCK_SIZE];
        assert_eq!(computed_checksum(&block), 8 * 0x20);

        // Bytes inside the checksum field never count
        block[150] = 0xFF;
        assert_eq!(computed_checksum(&block), 8 * 0x20);

        block[0] = b'a';
        assert_eq!(computed_checksum(&block), 8 * 0x20 + u32::from(b'a'));
    }

    #[test]
    fn test_encoded_header_validates() {
        let header = Header::new("dir/a.txt", EntryType::Regular, 5).with_mtime(1_700_000_000);
        let block = header.to_block().unwrap();

        assert_eq!(&block[CHECKSUM.start + 6..CHECKSUM.end], b"\0 ");

        let parsed = Header::from_block(&block).unwrap();
        assert!(parsed.is_named("dir/a.txt"));
        assert!(!parsed.is_named("dir/a.txt/"));
        assert_eq!(parsed.size, 5);
        assert_eq!(parsed.mode, 0o644);
        assert_eq!(parsed.mtime, 1_700_000_000);
        assert_eq!(parsed.entry_type, EntryType::Regular);
        assert!(parsed.validate(computed_checksum(&block)).is_ok());
    }

    #[test]
    fn test_validate_order() {
        let mut header = Header::new("file", EntryType::Regular, 0);
        header.magic = *b"ustaX\0";
        header.version = *b"01";
        header.checksum = 1;

        // Magic is reported even though version and checksum are also wrong
        assert!(matches!(header.validate(2), Err(UstarError::BadMagic { .. })));

        header.magic = USTAR_MAGIC;
        assert!(matches!(header.validate(2), Err(UstarError::BadVersion { .. })));

        header.version = USTAR_VERSION;
        match header.validate(2) {
            Err(UstarError::BadChecksum { expected, actual }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("Expected BadChecksum, got: {:?}", other),
        }

        assert!(header.validate(1).is_ok());
    }

    #[test]
    fn test_symlink_header_keeps_linkname() {
        let header = Header::new("link", EntryType::Symlink, 0).with_linkname("dir/");
        let parsed = Header::from_block(&header.to_block().unwrap()).unwrap();
        assert_eq!(parsed.entry_type, EntryType::Symlink);
        assert_eq!(parsed.linkname_lossy(), "dir/");
        assert_eq!(parsed.mode, 0o777);
    }

    #[test]
    fn test_non_utf8_names_survive_encoding() {
        let header = Header::new(&b"caf\xe9"[..], EntryType::Symlink, 0)
            .with_linkname(&b"dir/caf\xe9"[..])
            .with_mode(0o700);
        let parsed = Header::from_block(&header.to_block().unwrap()).unwrap();

        assert!(parsed.is_named(b"caf\xe9"));
        assert!(!parsed.is_named("caf\u{e9}"));
        assert_eq!(parsed.linkname, b"dir/caf\xe9");
        assert_eq!(parsed.mode, 0o700);
    }

    #[test]
    fn test_name_too_long() {
        let header = Header::new(vec![b'a'; MAX_NAME_LENGTH + 1], EntryType::Regular, 0);
        assert!(matches!(header.to_block(), Err(UstarError::FieldOverflow(_))));

        let header = Header::new(vec![b'a'; MAX_NAME_LENGTH], EntryType::Regular, 0);
        let parsed = Header::from_block(&header.to_block().unwrap()).unwrap();
        assert_eq!(parsed.name.len(), MAX_NAME_LENGTH);
    }
}
