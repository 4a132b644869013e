use crate::error::{DeclutterError, Result};
use crate::model::{ContentDigest, HashAlgorithm};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 8192;

/// Computes the content digest of a file with the given algorithm.
///
/// Streams the file in 8KB chunks so memory use does not depend on file size.
/// Any failure to open or read the file is reported as `UnreadableFile`.
pub fn hash_file<P: AsRef<Path>>(path: P, algorithm: HashAlgorithm) -> Result<ContentDigest> {
    let path = path.as_ref();
    let bytes = match algorithm {
        HashAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            stream_file(path, |chunk| {
                hasher.update(chunk);
            })?;
            hasher.finalize().as_bytes().to_vec()
        }
        HashAlgorithm::Md5 => {
            let mut hasher = Md5::new();
            stream_file(path, |chunk| hasher.update(chunk))?;
            hasher.finalize().to_vec()
        }
    };

    Ok(ContentDigest::new(algorithm, bytes))
}

/// Computes blake3 hash of a file as lower-case hex.
pub fn hash_file_blake3<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(hash_file(path, HashAlgorithm::Blake3)?.to_hex())
}

/// Computes MD5 hash of a file as lower-case hex.
pub fn hash_file_md5<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(hash_file(path, HashAlgorithm::Md5)?.to_hex())
}

fn stream_file<F: FnMut(&[u8])>(path: &Path, mut consume: F) -> Result<()> {
    let file = File::open(path).map_err(|e| DeclutterError::unreadable(path, e))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| DeclutterError::unreadable(path, e))?;
        if bytes_read == 0 {
            break;
        }
        consume(&buffer[..bytes_read]);
    }

    Ok(())
}
