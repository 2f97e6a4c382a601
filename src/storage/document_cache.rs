//! Hash-bucketed on-disk cache of extracted documents.
//!
//! The cache file stores one record per document, bucketed by an FNV-1a
//! hash of the document URI. Each bucket holds `[key, value]` pairs where
//! the key is the URI and the value is the serialized record; collisions
//! within a bucket are resolved by a linear scan over the keys. Records are
//! self-describing JSON, so the format survives model evolution without a
//! schema registry. Reads go through a memory map.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::{Mmap, MmapOptions};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::symbol::{Reference, Symbol};

/// Magic bytes identifying document cache files.
const MAGIC_BYTES: &[u8; 4] = b"PDXC";

/// Version of the cache format.
const VERSION: u32 = 1;

/// Number of hash buckets.
const BUCKET_COUNT: usize = 256;

/// Header size in bytes.
const HEADER_SIZE: usize = 32;

/// FNV-1a hash for bucket selection.
fn fnv1a_hash(data: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// The persisted artifacts of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedDocument {
    pub symbol: Symbol,
    pub references: Vec<Reference>,
}

/// Memory-mapped document cache.
#[derive(Debug)]
pub struct DocumentCache {
    path: PathBuf,
    mmap: Mmap,
    bucket_count: usize,
    document_count: usize,
    bucket_offsets: Vec<u64>,
}

impl DocumentCache {
    /// Open an existing cache file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        if mmap.len() < HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Cache file too small",
            ));
        }
        if &mmap[0..4] != MAGIC_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid cache file format",
            ));
        }

        let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);
        if version != VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported cache version: {version}"),
            ));
        }

        let bucket_count = u32::from_le_bytes([mmap[8], mmap[9], mmap[10], mmap[11]]) as usize;
        let document_count = u64::from_le_bytes([
            mmap[12], mmap[13], mmap[14], mmap[15], mmap[16], mmap[17], mmap[18], mmap[19],
        ]) as usize;

        let mut bucket_offsets = Vec::with_capacity(bucket_count);
        for i in 0..bucket_count {
            let pos = HEADER_SIZE + i * 8;
            if pos + 8 > mmap.len() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Cache bucket table truncated",
                ));
            }
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&mmap[pos..pos + 8]);
            bucket_offsets.push(u64::from_le_bytes(bytes));
        }

        Ok(Self {
            path,
            mmap,
            bucket_count,
            document_count,
            bucket_offsets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// Look up a document by URI. Bucket membership is decided by the URI
    /// hash; within the bucket, keys are compared byte for byte.
    pub fn get(&self, uri: &str) -> StorageResult<Option<CachedDocument>> {
        let bucket_index = (fnv1a_hash(uri.as_bytes()) as usize) % self.bucket_count;
        let bucket_start = self.bucket_offsets[bucket_index] as usize;
        let bucket_end = if bucket_index + 1 < self.bucket_count {
            self.bucket_offsets[bucket_index + 1] as usize
        } else {
            self.mmap.len()
        };

        let mut pos = bucket_start;
        let entry_count = match self.read_u32(pos, bucket_end) {
            Some(count) => count as usize,
            None => return Ok(None),
        };
        pos += 4;

        for _ in 0..entry_count {
            let Some(key_len) = self.read_u32(pos, bucket_end) else {
                return Err(StorageError::InvalidFormat {
                    reason: "bucket entry truncated".to_string(),
                });
            };
            pos += 4;
            let key_end = pos + key_len as usize;
            if key_end > bucket_end {
                return Err(StorageError::InvalidFormat {
                    reason: "bucket key overruns bucket".to_string(),
                });
            }
            let key = &self.mmap[pos..key_end];
            pos = key_end;

            let Some(value_len) = self.read_u32(pos, bucket_end) else {
                return Err(StorageError::InvalidFormat {
                    reason: "bucket value truncated".to_string(),
                });
            };
            pos += 4;
            let value_end = pos + value_len as usize;
            if value_end > bucket_end {
                return Err(StorageError::InvalidFormat {
                    reason: "bucket value overruns bucket".to_string(),
                });
            }

            if key == uri.as_bytes() {
                let document = serde_json::from_slice(&self.mmap[pos..value_end])?;
                return Ok(Some(document));
            }
            pos = value_end;
        }

        Ok(None)
    }

    fn read_u32(&self, pos: usize, end: usize) -> Option<u32> {
        if pos + 4 > end {
            return None;
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.mmap[pos..pos + 4]);
        Some(u32::from_le_bytes(bytes))
    }

    /// Build a cache file from documents. The whole file is rewritten; this
    /// runs after extraction, never during it.
    pub fn build<'a>(
        path: impl AsRef<Path>,
        documents: impl Iterator<Item = (&'a str, &'a CachedDocument)>,
    ) -> io::Result<()> {
        let path = path.as_ref();
        let mut buckets: Vec<Vec<(Vec<u8>, Vec<u8>)>> = vec![Vec::new(); BUCKET_COUNT];
        let mut document_count: u64 = 0;

        for (uri, document) in documents {
            let value = serde_json::to_vec(document)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let bucket_index = (fnv1a_hash(uri.as_bytes()) as usize) % BUCKET_COUNT;
            buckets[bucket_index].push((uri.as_bytes().to_vec(), value));
            document_count += 1;
        }

        let mut bucket_offsets = Vec::with_capacity(BUCKET_COUNT);
        let mut offset = HEADER_SIZE as u64 + (BUCKET_COUNT * 8) as u64;
        for bucket in &buckets {
            bucket_offsets.push(offset);
            offset += 4;
            for (key, value) in bucket {
                offset += 8 + key.len() as u64 + value.len() as u64;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        file.write_all(MAGIC_BYTES)?;
        file.write_all(&VERSION.to_le_bytes())?;
        file.write_all(&(BUCKET_COUNT as u32).to_le_bytes())?;
        file.write_all(&document_count.to_le_bytes())?;
        file.write_all(&[0u8; 12])?; // Reserved

        for offset in &bucket_offsets {
            file.write_all(&offset.to_le_bytes())?;
        }

        for bucket in &buckets {
            file.write_all(&(bucket.len() as u32).to_le_bytes())?;
            for (key, value) in bucket {
                file.write_all(&(key.len() as u32).to_le_bytes())?;
                file.write_all(key)?;
                file.write_all(&(value.len() as u32).to_le_bytes())?;
                file.write_all(value)?;
            }
        }

        file.sync_all()?;
        Ok(())
    }
}

/// Thread-safe wrapper for concurrent readers.
pub struct ConcurrentDocumentCache {
    inner: Arc<RwLock<DocumentCache>>,
}

impl ConcurrentDocumentCache {
    pub fn new(cache: DocumentCache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    pub fn get(&self, uri: &str) -> StorageResult<Option<CachedDocument>> {
        self.inner.read().get(uri)
    }

    pub fn document_count(&self) -> usize {
        self.inner.read().document_count()
    }
}
