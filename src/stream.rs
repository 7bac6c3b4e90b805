//! Generic caching block stream.
//!
//! [`BlockStream`] wraps a seekable byte stream and moves data through a
//! pluggable per-block [`BlockTransform`] in fixed-size units. Writes are
//! staged in a write-back cache and committed one transformed block at a
//! time; reads fetch whole underlying blocks, inverse-transform them and
//! copy out the requested sub-range.
//!
//! Invariants the stream enforces:
//!
//! - a block whose bytes reached the device is never rewritten, except
//!   block 1 (re-committed at finalisation) and the trailer region;
//! - an incompletely filled block is never silently abandoned by a seek;
//! - trailer content is staged in memory over zero placeholders and only
//!   lands on the device at [`BlockStream::finalise_write`], which is the
//!   single point where header and trailer inconsistencies surface.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::blocks::block_position;
use crate::types::VaultError;

/// Per-block transform plugged into a [`BlockStream`].
///
/// Implementations must be length-preserving: the transformed block is
/// written over the same byte span the plaintext block occupies.
pub trait BlockTransform {
    /// Transform a plaintext block before it reaches the device.
    fn transform_write(&mut self, buf: &mut Vec<u8>, block_number: u64) -> Result<(), VaultError>;

    /// Inverse-transform a block read from the device.
    fn transform_read(&mut self, buf: &mut Vec<u8>, block_number: u64) -> Result<(), VaultError>;
}

/// A seekable stream of fixed-size transformed blocks.
pub struct BlockStream<S, T> {
    inner: S,
    transform: T,
    block_len: usize,
    /// Logical cursor.
    position: u64,
    /// Logical length (highest position ever written, or the length a
    /// read-role caller installed via [`BlockStream::with_length`]).
    length: u64,
    /// Bytes durably on the device, placeholders included.
    committed: u64,
    /// Pending plaintext for the block starting at `committed`.
    cache: Vec<u8>,
    /// Reusable scratch for whole-block reads.
    block_buf: Vec<u8>,
    /// Plaintext copy of block 1 once committed; kept so the header can be
    /// re-committed at finalisation.
    header: Option<Vec<u8>>,
    header_dirty: bool,
    trailer_start: Option<u64>,
    trailer_buf: Vec<u8>,
    /// Bytes of `trailer_buf` actually written by the caller (gaps from
    /// forward seeks inside the trailer are reserved but never cached).
    trailer_cached: u64,
    finalised: bool,
}

impl<S, T: BlockTransform> BlockStream<S, T> {
    pub fn new(inner: S, transform: T, block_len: usize) -> Result<Self, VaultError> {
        if block_len == 0 {
            return Err(VaultError::Invalid("block length must be non-zero"));
        }
        Ok(Self {
            inner,
            transform,
            block_len,
            position: 0,
            length: 0,
            committed: 0,
            cache: Vec::with_capacity(block_len),
            block_buf: Vec::new(),
            header: None,
            header_dirty: false,
            trailer_start: None,
            trailer_buf: Vec::new(),
            trailer_cached: 0,
            finalised: false,
        })
    }

    /// Install the logical length for a read-role stream (e.g. the original
    /// plaintext length recovered from a trailer).
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = length;
        self
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// 1-indexed block containing the current position.
    pub fn block_number(&self) -> u64 {
        block_position(self.position, self.block_len as u64).number
    }

    /// Whether a trailer region is currently active.
    pub fn cache_trailer(&self) -> bool {
        self.trailer_start.is_some()
    }

    pub(crate) fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Move the logical cursor.
    ///
    /// Leaving a block with pending, incompletely filled cached bytes is
    /// refused with [`VaultError::AbandonBlock`]: such a block can never be
    /// revisited and completed once another block is committed after it.
    /// Block 1 is exempt (it stays rewritable until finalisation).
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, VaultError> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        }
        .ok_or(VaultError::Invalid("seek out of range"))?;

        if !self.cache.is_empty() {
            let cache_block = block_position(self.committed, self.block_len as u64).number;
            let target_block = block_position(target, self.block_len as u64).number;
            if target_block != cache_block && cache_block != 1 {
                return Err(VaultError::AbandonBlock(cache_block));
            }
        }
        self.position = target;
        Ok(target)
    }
}

impl<S: Read + Seek, T: BlockTransform> BlockStream<S, T> {
    /// Read up to `out.len()` bytes at the current position.
    ///
    /// Translates the request into covering blocks, reads and
    /// inverse-transforms each whole block, and copies out the requested
    /// sub-range. Reads are clamped to the logical length; the scratch
    /// buffer shrinks for a short final block.
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize, VaultError> {
        if self.position >= self.length {
            return Ok(0);
        }
        let want = (out.len() as u64).min(self.length - self.position) as usize;
        let mut done = 0;
        while done < want {
            let bp = block_position(self.position, self.block_len as u64);
            let block_bytes = (self.block_len as u64).min(self.length - bp.start_offset) as usize;
            self.block_buf.resize(block_bytes, 0);
            self.inner.seek(SeekFrom::Start(bp.start_offset))?;
            self.inner.read_exact(&mut self.block_buf)?;
            self.transform.transform_read(&mut self.block_buf, bp.number)?;

            let skip = bp.remainder as usize;
            let n = (want - done).min(block_bytes - skip);
            out[done..done + n].copy_from_slice(&self.block_buf[skip..skip + n]);
            self.position += n as u64;
            done += n;
        }
        Ok(done)
    }
}

impl<S: Write + Seek, T: BlockTransform> BlockStream<S, T> {
    /// Write all of `buf` at the current position.
    ///
    /// Bytes are staged in the write cache and committed one transformed
    /// block at a time. Writing into an already-committed block raises
    /// [`VaultError::DirtyBlock`] unless the block is block 1 (buffered and
    /// re-committed at finalisation) or lies inside the active trailer
    /// region (buffered in the trailer cache).
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, VaultError> {
        if self.finalised {
            return Err(VaultError::Finalised);
        }
        let mut rest = buf;
        while !rest.is_empty() {
            let n = if let Some(start) = self.trailer_start.filter(|&s| self.position >= s) {
                self.write_trailer_chunk(start, rest)?
            } else if self.position < self.committed {
                self.write_committed_chunk(rest)?
            } else {
                self.write_append_chunk(rest)?
            };
            rest = &rest[n..];
            self.position += n as u64;
            self.length = self.length.max(self.position);
        }
        Ok(buf.len())
    }

    fn write_trailer_chunk(&mut self, start: u64, chunk: &[u8]) -> Result<usize, VaultError> {
        let offset = (self.position - start) as usize;
        // A forward seek inside the trailer reserves a span that is never
        // cached; finalise_write reports the mismatch.
        if offset > self.trailer_buf.len() {
            self.trailer_buf.resize(offset, 0);
        }
        let overlap = chunk.len().min(self.trailer_buf.len() - offset);
        self.trailer_buf[offset..offset + overlap].copy_from_slice(&chunk[..overlap]);
        self.trailer_buf.extend_from_slice(&chunk[overlap..]);
        self.trailer_cached += (chunk.len() - overlap) as u64;

        // Advance the device with zero placeholders so position and length
        // stay accurate; the transformed content lands at finalisation.
        let end = start + self.trailer_buf.len() as u64;
        if end > self.committed {
            let zeros = vec![0u8; (end - self.committed) as usize];
            self.inner.seek(SeekFrom::Start(self.committed))?;
            self.inner.write_all(&zeros)?;
            self.committed = end;
        }
        Ok(chunk.len())
    }

    fn write_committed_chunk(&mut self, chunk: &[u8]) -> Result<usize, VaultError> {
        let bp = block_position(self.position, self.block_len as u64);
        if bp.number != 1 {
            return Err(VaultError::DirtyBlock(bp.number));
        }
        let header = self
            .header
            .as_mut()
            .ok_or(VaultError::Invalid("header block was never committed"))?;
        // block 1 starts at offset 0, so the position doubles as the offset
        let offset = self.position as usize;
        let n = chunk.len().min(header.len() - offset);
        header[offset..offset + n].copy_from_slice(&chunk[..n]);
        self.header_dirty = true;
        Ok(n)
    }

    fn write_append_chunk(&mut self, chunk: &[u8]) -> Result<usize, VaultError> {
        let cache_end = self.committed + self.cache.len() as u64;
        if self.position > cache_end {
            return Err(VaultError::Invalid("write would leave an unwritten gap"));
        }
        if self.cache.is_empty() && self.committed % self.block_len as u64 != 0 {
            // a short block was already flushed; its tail is committed
            let bp = block_position(self.position, self.block_len as u64);
            return Err(VaultError::DirtyBlock(bp.number));
        }
        let offset = (self.position - self.committed) as usize;
        let n = chunk.len().min(self.block_len - offset);
        let overlap = n.min(self.cache.len() - offset);
        self.cache[offset..offset + overlap].copy_from_slice(&chunk[..overlap]);
        self.cache.extend_from_slice(&chunk[overlap..n]);
        if self.cache.len() == self.block_len {
            self.flush_cache()?;
        }
        Ok(n)
    }

    /// Commit any buffered, not-yet-transformed write bytes as one
    /// transformed (possibly short) block.
    pub fn flush_cache(&mut self) -> Result<(), VaultError> {
        if self.finalised {
            return Err(VaultError::Finalised);
        }
        if self.cache.is_empty() {
            return Ok(());
        }
        let number = block_position(self.committed, self.block_len as u64).number;
        let mut block = self.cache.clone();
        self.transform.transform_write(&mut block, number)?;
        self.inner.seek(SeekFrom::Start(self.committed))?;
        self.inner.write_all(&block)?;
        self.committed += block.len() as u64;
        if number == 1 {
            self.header = Some(std::mem::take(&mut self.cache));
        } else {
            self.cache.clear();
        }
        Ok(())
    }

    /// Mark the current block as the start of the trailer region, or clear
    /// the region.
    ///
    /// While active, writes at or past the trailer start accumulate in the
    /// trailer cache and the device is advanced with zero placeholders.
    /// The position must sit on a block boundary at the end of committed
    /// data: the trailer is re-transformed block-wise at finalisation and a
    /// mid-block start could not be transformed independently.
    pub fn set_cache_trailer(&mut self, on: bool) -> Result<(), VaultError> {
        if self.finalised {
            return Err(VaultError::Finalised);
        }
        if !on {
            self.trailer_start = None;
            self.trailer_buf.clear();
            self.trailer_cached = 0;
            return Ok(());
        }
        if self.trailer_start.is_some() {
            return Err(VaultError::Invalid("trailer region already active"));
        }
        self.flush_cache()?;
        if self.position % self.block_len as u64 != 0 {
            return Err(VaultError::Invalid("trailer must start on a block boundary"));
        }
        if self.position != self.committed {
            return Err(VaultError::Invalid(
                "trailer must start at the end of committed data",
            ));
        }
        self.trailer_start = Some(self.position);
        Ok(())
    }

    /// Flush pending writes, re-commit block 1 if it changed after first
    /// commit, and replace trailer placeholders with transformed content.
    ///
    /// Must be called before the stream is considered durable. Errors with
    /// [`VaultError::TrailerMismatch`] when the cached trailer bytes do not
    /// cover the reserved placeholder span, and [`VaultError::Finalised`]
    /// when called twice.
    pub fn finalise_write(&mut self) -> Result<(), VaultError> {
        if self.finalised {
            return Err(VaultError::Finalised);
        }
        self.flush_cache()?;

        if self.header_dirty {
            let mut block = self
                .header
                .clone()
                .ok_or(VaultError::Invalid("header block was never committed"))?;
            self.transform.transform_write(&mut block, 1)?;
            self.inner.seek(SeekFrom::Start(0))?;
            self.inner.write_all(&block)?;
            self.header_dirty = false;
        }

        if let Some(start) = self.trailer_start.take() {
            let reserved = self.trailer_buf.len() as u64;
            if self.trailer_cached != reserved {
                return Err(VaultError::TrailerMismatch {
                    reserved,
                    cached: self.trailer_cached,
                });
            }
            let first = block_position(start, self.block_len as u64).number;
            self.inner.seek(SeekFrom::Start(start))?;
            let staged = std::mem::take(&mut self.trailer_buf);
            for (i, chunk) in staged.chunks(self.block_len).enumerate() {
                let mut block = chunk.to_vec();
                self.transform.transform_write(&mut block, first + i as u64)?;
                self.inner.write_all(&block)?;
            }
            self.trailer_cached = 0;
        }

        self.inner.flush()?;
        self.finalised = true;
        Ok(())
    }
}
