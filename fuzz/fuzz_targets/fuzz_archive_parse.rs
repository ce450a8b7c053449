#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use ustar_rs::{ArchiveReader, ReaderConfig};

fuzz_target!(|data: &[u8]| {
    // Unverified scans trust whatever sizes the headers claim
    for verify_headers in [true, false] {
        let config = ReaderConfig {
            verify_headers,
            ..ReaderConfig::default()
        };
        let mut reader = match ArchiveReader::with_config(Cursor::new(data), config) {
            Ok(r) => r,
            Err(_) => return,
        };

        // Validation - should never panic
        let _ = reader.validate_archive();

        // Every name the scan can see - should never panic
        let names: Vec<Vec<u8>> = match reader.entries() {
            Ok(headers) => headers.into_iter().map(|h| h.name).collect(),
            Err(_) => continue,
        };

        let mut buf = [0u8; 64];
        let mut listing = vec![Vec::new(); 4];
        for name in &names {
            let _ = reader.is_dir(name);
            let _ = reader.is_file(name);
            let _ = reader.is_symlink(name);
            let _ = reader.list(name);
            let _ = reader.list_into(name, &mut listing);
            let _ = reader.read_file(name, 0, &mut buf);
            let _ = reader.read_file(name, 1000, &mut buf);
        }

        let _ = reader.exists("");
        let _ = reader.list("/");
    }
});
