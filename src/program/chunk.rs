//! Splitting a program blob into offset-tagged loader chunks.

use crate::error::{DeployError, DeployResult};

/// A contiguous slice of the program blob, tagged with its write offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u32,
    pub bytes: Vec<u8>,
}

impl Chunk {
    /// Offset of the first byte after this chunk.
    pub fn end(&self) -> u32 {
        // Fits: `chunk_blob` rejects blobs longer than u32::MAX.
        self.offset + self.bytes.len() as u32
    }
}

/// Partition `blob` into chunks of at most `limit` bytes.
///
/// Offsets start at 0 and advance by `limit`; only the last chunk may be
/// shorter. A blob whose length is a multiple of `limit` produces no empty
/// trailing chunk.
pub fn chunk_blob(blob: &[u8], limit: usize) -> DeployResult<Vec<Chunk>> {
    if limit == 0 {
        return Err(DeployError::invalid("chunk limit must be positive"));
    }
    if blob.is_empty() {
        return Err(DeployError::invalid("program blob is empty"));
    }
    if u32::try_from(blob.len()).is_err() {
        return Err(DeployError::invalid(format!(
            "program blob of {} bytes exceeds the loader's u32 offset range",
            blob.len()
        )));
    }

    Ok(blob
        .chunks(limit)
        .enumerate()
        .map(|(i, bytes)| Chunk {
            offset: (i * limit) as u32,
            bytes: bytes.to_vec(),
        })
        .collect())
}
