// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Chain Log
//!
//! File-backed store. Every append is one frame, written and fsync'd before
//! `append_link` returns. Nothing is ever rewritten; the only truncation is
//! rolling back a failed append or dropping a torn tail on open.
//!
//! # File Format
//! ```text
//! [Header: 16 bytes][Frame][Frame][Frame]...
//! ```
//!
//! Header:
//! - magic: [u8; 4] ("EGAL")
//! - version: u32 (1)
//! - reserved: u64 (0)
//!
//! Frame:
//! - payload_len: u32
//! - payload: bincode(ChainLink)
//! - crc32(payload): u32

use ethos_chain::link::ChainLink;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ChainStore, Result, StoreError};

const MAGIC: &[u8; 4] = b"EGAL";
const VERSION: u32 = 1;
const HEADER_LEN: u64 = 16;
/// Length prefix + crc trailer.
const FRAME_OVERHEAD: usize = 8;
/// Largest payload `append_link` will write. A longer declared length can
/// only come from a damaged prefix, never from a torn append.
pub const MAX_FRAME_LEN: usize = 16 << 20;

/// Chain Log File Header (16 bytes)
struct ChainLogHeader {
    version: u32,
    reserved: u64,
}

impl ChainLogHeader {
    fn new() -> Self {
        Self {
            version: VERSION,
            reserved: 0,
        }
    }

    fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(MAGIC);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.reserved.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN as usize || &bytes[0..4] != MAGIC {
            return Err(StoreError::InvalidHeader);
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..8]);
        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&bytes[8..16]);
        let header = Self {
            version: u32::from_le_bytes(version),
            reserved: u64::from_le_bytes(reserved),
        };
        if header.version != VERSION {
            return Err(StoreError::InvalidHeader);
        }
        Ok(header)
    }
}

fn encode_frame(link: &ChainLink) -> Result<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(link, bincode::config::standard())
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(StoreError::Serialization("link exceeds frame size".to_string()));
    }
    let len = payload.len() as u32;

    let mut frame = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    Ok(frame)
}

/// Result of scanning the frames after the header.
struct Scan {
    links: Vec<ChainLink>,
    /// Offset just past the last complete frame.
    valid_len: u64,
}

/// Decode frames from `body`, which starts at file offset `HEADER_LEN`.
///
/// An incomplete final frame is treated as a torn write and excluded. A
/// complete frame with a bad checksum or payload is corruption, and so is a
/// length prefix no append could have written.
fn scan_frames(body: &[u8]) -> Result<Scan> {
    let mut links = Vec::new();
    let mut pos = 0usize;

    while pos < body.len() {
        let frame_offset = HEADER_LEN + pos as u64;
        if body.len() - pos < 4 {
            break;
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&body[pos..pos + 4]);
        let len = u32::from_le_bytes(len_bytes) as usize;
        if len > MAX_FRAME_LEN {
            return Err(StoreError::Corrupted { offset: frame_offset });
        }

        let end = match pos.checked_add(len + FRAME_OVERHEAD) {
            Some(end) if end <= body.len() => end,
            _ => break,
        };

        let payload = &body[pos + 4..pos + 4 + len];
        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&body[end - 4..end]);
        if crc32fast::hash(payload) != u32::from_le_bytes(crc_bytes) {
            return Err(StoreError::Corrupted { offset: frame_offset });
        }

        let (link, read) = bincode::serde::decode_from_slice::<ChainLink, _>(payload, bincode::config::standard())
            .map_err(|_| StoreError::Corrupted { offset: frame_offset })?;
        if read != len {
            return Err(StoreError::Corrupted { offset: frame_offset });
        }

        links.push(link);
        pos = end;
    }

    Ok(Scan {
        links,
        valid_len: HEADER_LEN + pos as u64,
    })
}

/// One write for the whole frame, then flush and fsync.
fn write_frame(file: &mut File, frame: &[u8]) -> std::io::Result<()> {
    file.write_all(frame)?;
    file.flush()?;
    file.sync_data()
}

struct Inner {
    file: File,
    /// Committed length in bytes. Everything before it is immutable.
    len: u64,
    tip: Option<ChainLink>,
    count: u64,
    /// A partial frame could not be rolled back. Appends are refused until
    /// the log is reopened.
    failed: bool,
}

/// Append-only file store.
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl FileStore {
    /// Open or create a chain log.
    ///
    /// An existing file must have a valid header and only whole, checksummed
    /// frames, except for a torn final frame, which is cut off.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file_exists = path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        let (len, tip, count) = if file_exists && file.metadata()?.len() > 0 {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            ChainLogHeader::from_bytes(&bytes)?;

            let scan = scan_frames(&bytes[HEADER_LEN as usize..])?;
            if scan.valid_len < bytes.len() as u64 {
                tracing::warn!(
                    "Dropping incomplete frame at end of {:?} (offset {}, {} bytes)",
                    path,
                    scan.valid_len,
                    bytes.len() as u64 - scan.valid_len
                );
                file.set_len(scan.valid_len)?;
                file.sync_all()?;
            }
            let count = scan.links.len() as u64;
            (scan.valid_len, scan.links.into_iter().last(), count)
        } else {
            file.write_all(&ChainLogHeader::new().to_bytes())?;
            file.sync_all()?;
            (HEADER_LEN, None, 0)
        };

        tracing::debug!("Opened chain log {:?}: {} links, {} bytes", path, count, len);

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                len,
                tip,
                count,
                failed: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of links in the log.
    pub fn link_count(&self) -> u64 {
        self.lock().count
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner is only updated after a successful write, so a panic while
        // holding the lock cannot leave it half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChainStore for FileStore {
    fn read_tip(&self) -> Result<Option<ChainLink>> {
        Ok(self.lock().tip.clone())
    }

    fn append_link(&self, link: &ChainLink) -> Result<()> {
        let frame = encode_frame(link)?;
        let mut inner = self.lock();
        if inner.failed {
            return Err(StoreError::Unavailable(format!(
                "{:?} has an unrolled partial frame; reopen to recover",
                self.path
            )));
        }
        let before = inner.len;

        if let Err(e) = write_frame(&mut inner.file, &frame) {
            // Roll back whatever part of the frame reached the file.
            let rollback = inner.file.set_len(before).and_then(|_| inner.file.sync_all());
            if let Err(truncate_err) = rollback {
                tracing::error!(
                    "Failed to roll back partial frame in {:?}: {}",
                    self.path,
                    truncate_err
                );
                inner.failed = true;
            }
            return Err(StoreError::Io(e));
        }

        inner.len = before + frame.len() as u64;
        inner.tip = Some(link.clone());
        inner.count += 1;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<ChainLink>> {
        // Bytes below the committed length never change, so read them
        // through a separate handle without holding the append lock.
        let committed = self.lock().len;

        let mut bytes = Vec::with_capacity(committed as usize);
        File::open(&self.path)?.take(committed).read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < committed {
            return Err(StoreError::Corrupted { offset: bytes.len() as u64 });
        }
        ChainLogHeader::from_bytes(&bytes)?;

        let scan = scan_frames(&bytes[HEADER_LEN as usize..])?;
        if scan.valid_len != committed {
            return Err(StoreError::Corrupted { offset: scan.valid_len });
        }
        Ok(scan.links)
    }
}
