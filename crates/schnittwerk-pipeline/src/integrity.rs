// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SHA-256 fingerprints for quarantined source images.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use schnittwerk_core::error::{Result, SchnittwerkError};
use sha2::{Digest, Sha256};

/// SHA-256 of `data` as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// SHA-256 of a file's contents, read in chunks so full-page scans are not
/// held in memory twice.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Check that `copy` has the same contents as `source`. Returns the digest.
pub fn verify_copy(source: &Path, copy: &Path) -> Result<String> {
    let expected = hash_file(source)?;
    let actual = hash_file(copy)?;
    if expected == actual {
        Ok(expected)
    } else {
        Err(SchnittwerkError::WriteFailure {
            path: copy.to_path_buf(),
            reason: format!("copy digest {actual} does not match source digest {expected}"),
        })
    }
}
