//! Content checksums.
//!
//! A matching checksum is a cheap signal that two files are bytewise identical;
//! it says nothing about visually identical images in different encodings.
use crate::error::{Error, Result};
use blake3::Hash as Blake3Hash;

use std::{fs::File, io::Read, path::Path};

/// Compute the checksum of a file's contents using the Blake3 algorithm
pub fn compute_cryptographic<P: AsRef<Path>>(path: P) -> Result<Blake3Hash> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;

    let mut hasher = blake3::Hasher::new();

    // Read the file in chunks and update the hasher
    let mut buffer = [0; 8192];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| Error::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_matches_in_memory_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        File::create(&path).unwrap().write_all(&data).unwrap();

        let result = compute_cryptographic(&path).unwrap();
        assert_eq!(result, blake3::hash(&data));
    }

    #[test]
    fn test_missing_file_names_path() {
        let result = compute_cryptographic("/path/that/does/not/exist.png");
        match result {
            Err(Error::Io { path, .. }) => {
                assert_eq!(path, Path::new("/path/that/does/not/exist.png"))
            }
            other => panic!("expected I/O error, got {:?}", other),
        }
    }
}
