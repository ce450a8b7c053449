mod format;
mod listing;
mod reader;
mod resolve;
mod scanner;

pub use format::{
    computed_checksum, data_blocks, decode_octal, encode_octal, is_end_marker, padded_size, Block,
    EntryType, Header, BLOCK_SIZE, MAX_NAME_LENGTH, USTAR_MAGIC, USTAR_VERSION,
};
pub use listing::ListOutcome;
pub use reader::{ArchiveReader, ReadOutcome};
pub use scanner::{ScannedEntry, Scanner};
