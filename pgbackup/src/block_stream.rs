//! The block-stream format: how one data file looks inside a backup.
//!
//! A backed-up data file is a sequence of records, each a little-endian
//! `{ block: u32, compressed_size: i32 }` header followed by the payload:
//!
//! * `0 < compressed_size < BLCKSZ`: compressed page, padded to 8 bytes;
//! * `compressed_size == BLCKSZ`: the raw page;
//! * `compressed_size == -2`: the relation ends at this block, no payload;
//! * `block == 0 && compressed_size == 0`: padding, skipped on read.
//!
//! Records are written in ascending block order and a strict reader rejects
//! a record whose block number goes backwards. The per-file CRC stored in
//! the file list covers the exact serialized byte stream.

use std::io::{ErrorKind, Read, Write};

use anyhow::{bail, ensure, Context};
use postgres_ffi::page::{page_header_is_valid, page_is_zeroed};
use postgres_ffi::{maxalign, BLCKSZ};

use crate::compress::{self, CompressAlg, ZLIB_MAGIC};

/// `compressed_size` marker: the relation was truncated at this block.
pub const PAGE_IS_TRUNCATED: i32 = -2;

pub const BLOCK_HEADER_SIZE: usize = 8;

/// Per-file CRC of the serialized stream. Recent producers use the
/// Castagnoli polynomial; images written before that carry a classic CRC-32
/// and are still accepted on read.
pub enum BackupCrc {
    Crc32c(u32),
    Classic(flate2::Crc),
}

impl BackupCrc {
    pub fn new(use_crc32c: bool) -> Self {
        if use_crc32c {
            BackupCrc::Crc32c(0)
        } else {
            BackupCrc::Classic(flate2::Crc::new())
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            BackupCrc::Crc32c(state) => *state = crc32c::crc32c_append(*state, data),
            BackupCrc::Classic(crc) => crc.update(data),
        }
    }

    pub fn finish(self) -> u32 {
        match self {
            BackupCrc::Crc32c(state) => state,
            BackupCrc::Classic(crc) => crc.sum(),
        }
    }
}

fn encode_header(block: u32, compressed_size: i32) -> [u8; BLOCK_HEADER_SIZE] {
    let mut hdr = [0u8; BLOCK_HEADER_SIZE];
    hdr[0..4].copy_from_slice(&block.to_le_bytes());
    hdr[4..8].copy_from_slice(&compressed_size.to_le_bytes());
    hdr
}

/// Writes block records, maintaining the running CRC and byte counter.
pub struct BlockStreamWriter<W: Write> {
    out: W,
    crc: BackupCrc,
    write_size: u64,
}

impl<W: Write> BlockStreamWriter<W> {
    pub fn new(out: W) -> Self {
        BlockStreamWriter {
            out,
            crc: BackupCrc::new(true),
            write_size: 0,
        }
    }

    fn put(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.crc.update(data);
        self.out.write_all(data)?;
        self.write_size += data.len() as u64;
        Ok(())
    }

    /// Compress and append one page. Pages that do not shrink are stored raw
    /// with `compressed_size == BLCKSZ`; the reader relies on that explicit
    /// marker, never on guessing.
    pub fn write_page(
        &mut self,
        blknum: u32,
        page: &[u8],
        alg: CompressAlg,
        level: u32,
    ) -> anyhow::Result<()> {
        ensure!(page.len() == BLCKSZ as usize, "page has wrong size");

        match compress::compress(alg, level, page) {
            Some(compressed) if compressed.len() < BLCKSZ as usize => {
                let hdr = encode_header(blknum, compressed.len() as i32);
                self.put(&hdr)?;
                self.put(&compressed)?;
                let padding = maxalign(compressed.len() as u32) as usize - compressed.len();
                if padding > 0 {
                    self.put(&[0u8; 8][..padding])?;
                }
            }
            _ => {
                let hdr = encode_header(blknum, BLCKSZ as i32);
                self.put(&hdr)?;
                self.put(page)?;
            }
        }
        Ok(())
    }

    /// Append a truncation marker: the reconstructed file ends at
    /// `blknum * BLCKSZ` bytes.
    pub fn write_truncation(&mut self, blknum: u32) -> anyhow::Result<()> {
        let hdr = encode_header(blknum, PAGE_IS_TRUNCATED);
        self.put(&hdr)
    }

    /// Flush and return `(crc, bytes_written)`.
    pub fn finish(mut self) -> anyhow::Result<(u32, u64)> {
        self.out.flush()?;
        Ok((self.crc.finish(), self.write_size))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum BlockRecord {
    /// A decoded page image.
    Page { blknum: u32, data: Vec<u8> },
    /// Truncation marker; no records may follow.
    Truncated { blknum: u32 },
}

/// Reads a block stream back, recomputing the CRC as it goes.
pub struct BlockStreamReader<R: Read> {
    input: R,
    alg: CompressAlg,
    crc: BackupCrc,
    /// Accept the ambiguous raw-with-size-BLCKSZ form of old producers.
    legacy_compressed_pages: bool,
    prev_block: Option<u32>,
    truncated: bool,
}

impl<R: Read> BlockStreamReader<R> {
    pub fn new(input: R, alg: CompressAlg, use_crc32c: bool, legacy_compressed_pages: bool) -> Self {
        BlockStreamReader {
            input,
            alg,
            crc: BackupCrc::new(use_crc32c),
            legacy_compressed_pages,
            prev_block: None,
            truncated: false,
        }
    }

    fn read_payload(&mut self, len: usize) -> anyhow::Result<Vec<u8>> {
        let mut payload = vec![0u8; len];
        self.input
            .read_exact(&mut payload)
            .context("truncated block record payload")?;
        self.crc.update(&payload);
        Ok(payload)
    }

    /// Read the next record. Returns `None` at end of stream.
    pub fn next_record(&mut self) -> anyhow::Result<Option<BlockRecord>> {
        loop {
            let mut hdr = [0u8; BLOCK_HEADER_SIZE];
            match self.input.read_exact(&mut hdr) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e).context("read block record header"),
            }
            self.crc.update(&hdr);

            let blknum = u32::from_le_bytes(hdr[0..4].try_into().unwrap());
            let compressed_size = i32::from_le_bytes(hdr[4..8].try_into().unwrap());

            // Historical padding record.
            if blknum == 0 && compressed_size == 0 {
                continue;
            }

            if self.truncated {
                bail!("block record after truncation marker");
            }
            if let Some(prev) = self.prev_block {
                ensure!(
                    blknum >= prev,
                    "backup is broken: block {blknum} follows block {prev}"
                );
            }
            self.prev_block = Some(blknum);

            if compressed_size == PAGE_IS_TRUNCATED {
                self.truncated = true;
                return Ok(Some(BlockRecord::Truncated { blknum }));
            }

            ensure!(
                compressed_size > 0 && compressed_size <= BLCKSZ as i32,
                "bogus compressed_size {compressed_size} at block {blknum}"
            );
            let stored_len = maxalign(compressed_size as u32) as usize;
            let payload = self.read_payload(stored_len)?;
            let payload = &payload[..compressed_size as usize];

            let data = if (compressed_size as u16) < BLCKSZ {
                compress::decompress(self.alg, payload, BLCKSZ as usize)
                    .with_context(|| format!("decompress block {blknum}"))?
            } else if self.legacy_compressed_pages && page_may_be_compressed(payload, self.alg) {
                // Writers before 2.0.23 could emit a compressed page whose
                // compressed size happened to equal BLCKSZ.
                compress::decompress(self.alg, payload, BLCKSZ as usize)
                    .with_context(|| format!("decompress legacy block {blknum}"))?
            } else {
                payload.to_vec()
            };

            return Ok(Some(BlockRecord::Page { blknum, data }));
        }
    }

    pub fn finish(self) -> u32 {
        self.crc.finish()
    }
}

/// Heuristic for the pre-2.0.23 ambiguity: a full-size payload whose page
/// header does not validate may actually be compressed. For zlib the stream
/// magic settles it.
fn page_may_be_compressed(payload: &[u8], alg: CompressAlg) -> bool {
    if page_header_is_valid(payload) || page_is_zeroed(payload) {
        return false;
    }
    if alg == CompressAlg::Zlib && payload[0] != ZLIB_MAGIC {
        return false;
    }
    alg != CompressAlg::None
}
