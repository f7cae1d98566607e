//!
//! WAL record framing.
//!
//! Walks WAL segment files record by record: skips page headers, reassembles
//! records that continue across pages and segments, verifies the per-record
//! CRC, and decodes the block-reference headers. Record *bodies* are opaque
//! to us, with one exception: the commit/abort timestamp sitting at the start
//! of transaction records' main data, which backup labelling needs.
//!
//! The layout knowledge is copied from PostgreSQL's `xlogrecord.h` and
//! `xlogreader.c` and rewritten in Rust.
//!

use std::fs::File;
use std::io::Read;

use bytes::{Buf, Bytes};
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::debug;
use utils::lsn::Lsn;

use crate::pg_constants::*;
use crate::xlog_utils::{
    XLogFileName, XLOG_RECORD_CRC_OFFS, XLOG_SIZE_OF_XLOG_LONG_PHD, XLOG_SIZE_OF_XLOG_RECORD,
    XLOG_SIZE_OF_XLOG_SHORT_PHD,
};
use crate::{BlockNumber, Oid, TimeLineID, TimestampTz, TransactionId, XLogSegNo, XLOG_BLCKSZ};

#[derive(Debug, Error)]
pub enum WalDecodeError {
    #[error("WAL segment {0} not found")]
    SegmentMissing(String),
    #[error("could not read WAL segment {path}: {source}")]
    SegmentIo {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("invalid WAL page header at {0}")]
    BadPageHeader(Lsn),
    #[error("invalid WAL record at {lsn}: {msg}")]
    InvalidRecord { lsn: Lsn, msg: String },
    #[error("WAL record CRC mismatch at {0}")]
    CrcMismatch(Lsn),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelFileNode {
    pub spcnode: Oid,
    pub dbnode: Oid,
    pub relnode: Oid,
}

/// One block reference decoded from a WAL record header.
#[derive(Debug, Clone, Copy)]
pub struct DecodedBkpBlock {
    pub rnode: RelFileNode,
    pub forknum: u8,
    pub blkno: BlockNumber,
}

#[derive(Debug)]
pub struct WalRecord {
    /// Start of the record.
    pub lsn: Lsn,
    /// First byte position after the record, 8-byte aligned: where the next
    /// record starts.
    pub end_lsn: Lsn,
    pub xl_xid: TransactionId,
    pub xl_info: u8,
    pub xl_rmid: u8,
    pub blocks: Vec<DecodedBkpBlock>,
    pub main_data: Bytes,
}

impl WalRecord {
    pub fn is_xact_commit_or_abort(&self) -> bool {
        self.xl_rmid == RM_XACT_ID
            && matches!(
                self.xl_info & XLOG_XACT_OPMASK,
                XLOG_XACT_COMMIT | XLOG_XACT_ABORT
            )
    }

    /// Commit and abort records store the transaction timestamp in the first
    /// eight bytes of their main data.
    pub fn xact_timestamp(&self) -> Option<TimestampTz> {
        if !self.is_xact_commit_or_abort() || self.main_data.len() < 8 {
            return None;
        }
        Some(i64::from_le_bytes(self.main_data[0..8].try_into().unwrap()))
    }
}

/// Reads the payload byte stream of a WAL directory: segment files
/// concatenated, with page headers stripped. Accepts plain segments,
/// gzip-compressed archive sidecars (`<segment>.gz`) and `.partial`
/// streaming leftovers.
struct WalByteReader {
    waldir: Utf8PathBuf,
    tli: TimeLineID,
    seg_size: usize,
    pos: Lsn,
    cur_seg: Option<(XLogSegNo, Vec<u8>)>,
}

impl WalByteReader {
    fn new(waldir: &Utf8Path, tli: TimeLineID, seg_size: usize, start: Lsn) -> Self {
        WalByteReader {
            waldir: waldir.to_owned(),
            tli,
            seg_size,
            pos: start,
            cur_seg: None,
        }
    }

    fn load_segment(&mut self, segno: XLogSegNo) -> Result<&[u8], WalDecodeError> {
        if self.cur_seg.as_ref().map(|(no, _)| *no) != Some(segno) {
            let fname = XLogFileName(self.tli, segno, self.seg_size);
            let mut data = open_wal_segment(&self.waldir, &fname)?;
            // A short (.partial) segment behaves as if zero-padded: the
            // first zero record length ends the scan.
            data.resize(self.seg_size, 0);
            self.cur_seg = Some((segno, data));
        }
        Ok(&self.cur_seg.as_ref().unwrap().1)
    }

    /// Fill `buf` from the WAL byte stream starting at `self.pos`, stepping
    /// over page headers.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WalDecodeError> {
        let mut filled = 0;
        while filled < buf.len() {
            let seg_size = self.seg_size;
            let segno = self.pos.segment_number(seg_size);
            let off_in_page = self.pos.block_offset() as usize;
            // The first page of each segment carries the long header.
            let hdr_size = if self.pos.segment_offset(seg_size) < XLOG_BLCKSZ {
                XLOG_SIZE_OF_XLOG_LONG_PHD
            } else {
                XLOG_SIZE_OF_XLOG_SHORT_PHD
            };

            if off_in_page < hdr_size {
                // Standing inside a page header: validate the magic and hop
                // over it.
                let page_start = self.pos.0 - off_in_page as u64;
                let page_off_in_seg = Lsn(page_start).segment_offset(seg_size);
                let seg = self.load_segment(segno)?;
                let magic = u16::from_le_bytes(
                    seg[page_off_in_seg..page_off_in_seg + 2].try_into().unwrap(),
                );
                if magic != XLOG_PAGE_MAGIC {
                    return Err(WalDecodeError::BadPageHeader(Lsn(page_start)));
                }
                self.pos = Lsn(page_start + hdr_size as u64);
                continue;
            }

            let off_in_seg = self.pos.segment_offset(seg_size);
            let page_remain = self.pos.remaining_in_block() as usize;
            let n = std::cmp::min(page_remain, buf.len() - filled);
            let seg = self.load_segment(segno)?;
            buf[filled..filled + n].copy_from_slice(&seg[off_in_seg..off_in_seg + n]);
            filled += n;
            self.pos += n as u64;
        }
        Ok(())
    }
}

fn open_wal_segment(waldir: &Utf8Path, fname: &str) -> Result<Vec<u8>, WalDecodeError> {
    let read_all = |path: &Utf8Path, gz: bool| -> Result<Vec<u8>, WalDecodeError> {
        let file = File::open(path).map_err(|source| WalDecodeError::SegmentIo {
            path: path.to_owned(),
            source,
        })?;
        let mut data = Vec::new();
        let res = if gz {
            flate2::read::GzDecoder::new(file).read_to_end(&mut data)
        } else {
            let mut file = file;
            file.read_to_end(&mut data)
        };
        res.map_err(|source| WalDecodeError::SegmentIo {
            path: path.to_owned(),
            source,
        })?;
        Ok(data)
    };

    let plain = waldir.join(fname);
    if plain.exists() {
        return read_all(&plain, false);
    }
    let gz = waldir.join(format!("{fname}.gz"));
    if gz.exists() {
        return read_all(&gz, true);
    }
    let partial = waldir.join(format!("{fname}.partial"));
    if partial.exists() {
        return read_all(&partial, false);
    }
    Err(WalDecodeError::SegmentMissing(fname.to_owned()))
}

/// Iterates over WAL records starting at a given LSN.
pub struct WalReader {
    inner: WalByteReader,
}

impl WalReader {
    pub fn new(waldir: &Utf8Path, tli: TimeLineID, seg_size: usize, start: Lsn) -> Self {
        WalReader {
            inner: WalByteReader::new(waldir, tli, seg_size, start),
        }
    }

    /// Position of the next record to be read.
    pub fn pos(&self) -> Lsn {
        self.inner.pos
    }

    /// Read the next record. `Ok(None)` means clean end of valid WAL: a zero
    /// record length, or a page that has not been written yet.
    pub fn next_record(&mut self) -> Result<Option<WalRecord>, WalDecodeError> {
        // Records start on 8-byte boundaries; if we are at a page boundary
        // the header skip inside read_exact does the rest.
        self.inner.pos = self.inner.pos.align();

        let mut len_buf = [0u8; 4];
        match self.inner.read_exact(&mut len_buf) {
            Ok(()) => {}
            // Unwritten page: the WAL ends here.
            Err(WalDecodeError::BadPageHeader(_)) => return Ok(None),
            Err(e) => return Err(e),
        }
        let xl_tot_len = u32::from_le_bytes(len_buf) as usize;
        if xl_tot_len == 0 {
            return Ok(None);
        }
        let start_lsn = Lsn(self.inner.pos.0 - 4);
        if xl_tot_len < XLOG_SIZE_OF_XLOG_RECORD {
            return Err(WalDecodeError::InvalidRecord {
                lsn: start_lsn,
                msg: format!("record length {xl_tot_len} too small"),
            });
        }

        let mut rec = vec![0u8; xl_tot_len];
        rec[0..4].copy_from_slice(&len_buf);
        self.inner.read_exact(&mut rec[4..])?;

        // Verify CRC: record body first, then the header prefix.
        let mut crc = crc32c::crc32c(&rec[XLOG_SIZE_OF_XLOG_RECORD..]);
        crc = crc32c::crc32c_append(crc, &rec[0..XLOG_RECORD_CRC_OFFS]);
        let stored_crc =
            u32::from_le_bytes(rec[XLOG_RECORD_CRC_OFFS..XLOG_RECORD_CRC_OFFS + 4].try_into().unwrap());
        if crc != stored_crc {
            return Err(WalDecodeError::CrcMismatch(start_lsn));
        }

        let end_lsn = self.inner.pos.align();
        self.inner.pos = end_lsn;

        let record = decode_wal_record(start_lsn, end_lsn, Bytes::from(rec))?;
        Ok(Some(record))
    }
}

/// Decode the header portion of a complete WAL record, mirroring
/// `DecodeXLogRecord`.
pub fn decode_wal_record(
    lsn: Lsn,
    end_lsn: Lsn,
    rec: Bytes,
) -> Result<WalRecord, WalDecodeError> {
    let invalid = |msg: String| WalDecodeError::InvalidRecord { lsn, msg };

    let mut buf = rec.clone();
    let xl_tot_len = buf.get_u32_le();
    let xl_xid = buf.get_u32_le();
    let _xl_prev = buf.get_u64_le();
    let xl_info = buf.get_u8();
    let xl_rmid = buf.get_u8();
    buf.advance(2); // padding
    let _xl_crc = buf.get_u32_le();

    let mut remaining = xl_tot_len as usize - XLOG_SIZE_OF_XLOG_RECORD;
    let mut datatotal: usize = 0;
    let mut main_data_len: usize = 0;
    let mut blocks = Vec::new();
    let mut rnode: Option<RelFileNode> = None;

    while remaining > datatotal {
        if buf.remaining() < 1 {
            return Err(invalid("truncated record header".to_owned()));
        }
        let block_id = buf.get_u8();
        remaining -= 1;

        match block_id {
            XLR_BLOCK_ID_DATA_SHORT => {
                main_data_len = buf.get_u8() as usize;
                remaining -= 1;
                datatotal += main_data_len;
                // by convention, the main data fragment is last
                break;
            }
            XLR_BLOCK_ID_DATA_LONG => {
                main_data_len = buf.get_u32_le() as usize;
                remaining -= 4;
                datatotal += main_data_len;
                break;
            }
            XLR_BLOCK_ID_ORIGIN => {
                buf.advance(2);
                remaining -= 2;
            }
            XLR_BLOCK_ID_TOPLEVEL_XID => {
                buf.advance(4);
                remaining -= 4;
            }
            id if id <= XLR_MAX_BLOCK_ID => {
                let fork_flags = buf.get_u8();
                let data_len = buf.get_u16_le() as usize;
                remaining -= 3;
                datatotal += data_len;

                if fork_flags & BKPBLOCK_HAS_IMAGE != 0 {
                    let bimg_len = buf.get_u16_le() as usize;
                    let _hole_offset = buf.get_u16_le();
                    let bimg_info = buf.get_u8();
                    remaining -= 5;
                    if bimg_info & BKPIMAGE_IS_COMPRESSED != 0
                        && bimg_info & BKPIMAGE_HAS_HOLE != 0
                    {
                        let _hole_length = buf.get_u16_le();
                        remaining -= 2;
                    }
                    datatotal += bimg_len;
                }
                if fork_flags & BKPBLOCK_SAME_REL == 0 {
                    rnode = Some(RelFileNode {
                        spcnode: buf.get_u32_le(),
                        dbnode: buf.get_u32_le(),
                        relnode: buf.get_u32_le(),
                    });
                    remaining -= 12;
                } else if rnode.is_none() {
                    return Err(invalid("BKPBLOCK_SAME_REL set but no previous rel".to_owned()));
                }
                let blkno = buf.get_u32_le();
                remaining -= 4;

                blocks.push(DecodedBkpBlock {
                    rnode: rnode.unwrap(),
                    forknum: fork_flags & BKPBLOCK_FORK_MASK,
                    blkno,
                });
            }
            _ => {
                return Err(invalid(format!("invalid block_id {block_id}")));
            }
        }
    }

    // Block data fragments come first, main data is the tail of the record.
    let main_data = if main_data_len > 0 {
        rec.slice(rec.len() - main_data_len..)
    } else {
        Bytes::new()
    };

    debug!(
        "decoded record at {}: rmid {} info {:x} {} block refs",
        lsn,
        xl_rmid,
        xl_info,
        blocks.len()
    );

    Ok(WalRecord {
        lsn,
        end_lsn,
        xl_xid,
        xl_info,
        xl_rmid,
        blocks,
        main_data,
    })
}

/// Check that the WAL directory holds a valid record starting at `lsn`.
pub fn wal_contains_lsn(
    waldir: &Utf8Path,
    lsn: Lsn,
    tli: TimeLineID,
    seg_size: usize,
) -> Result<bool, WalDecodeError> {
    let mut reader = WalReader::new(waldir, tli, seg_size, lsn);
    match reader.next_record() {
        Ok(Some(_)) => Ok(true),
        Ok(None) => Ok(false),
        Err(WalDecodeError::SegmentMissing(_)) => Ok(false),
        Err(WalDecodeError::CrcMismatch(_)) | Err(WalDecodeError::InvalidRecord { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Scan forward from `start` and return the start LSN of the last valid
/// record that ends at or before `target`.
pub fn find_last_record_lsn(
    waldir: &Utf8Path,
    tli: TimeLineID,
    seg_size: usize,
    start: Lsn,
    target: Lsn,
) -> Result<Option<Lsn>, WalDecodeError> {
    let mut reader = WalReader::new(waldir, tli, seg_size, start);
    let mut last: Option<Lsn> = None;
    loop {
        match reader.next_record() {
            Ok(Some(rec)) => {
                if rec.end_lsn > target {
                    break;
                }
                last = Some(rec.lsn);
            }
            Ok(None) => break,
            // The tail past the last valid record does not matter here.
            Err(WalDecodeError::CrcMismatch(_)) | Err(WalDecodeError::InvalidRecord { .. }) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(last)
}

/// Scan `[start, stop)` and recover the timestamp and xid of the latest
/// transaction commit/abort. Returns None if the range holds no transaction
/// records.
pub fn read_recovery_info(
    waldir: &Utf8Path,
    tli: TimeLineID,
    seg_size: usize,
    start: Lsn,
    stop: Lsn,
) -> Result<Option<(TimestampTz, TransactionId)>, WalDecodeError> {
    let mut reader = WalReader::new(waldir, tli, seg_size, start);
    let mut result = None;
    loop {
        match reader.next_record() {
            Ok(Some(rec)) => {
                if rec.lsn >= stop {
                    break;
                }
                if let Some(ts) = rec.xact_timestamp() {
                    result = Some((ts, rec.xl_xid));
                }
                if rec.end_lsn >= stop {
                    break;
                }
            }
            Ok(None) => break,
            Err(WalDecodeError::CrcMismatch(_)) | Err(WalDecodeError::InvalidRecord { .. }) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(result)
}

/// Synthesizes WAL segment files, for tests and tooling that need real-shaped
/// WAL without a running server. The inverse of [`WalReader`].
pub mod wal_generator {
    use super::*;
    use std::io::Write;

    pub struct WalGenerator {
        pub tli: TimeLineID,
        pub seg_size: usize,
        pub pos: Lsn,
        pub prev: Lsn,
        segments: Vec<(String, Vec<u8>)>,
    }

    impl WalGenerator {
        pub fn new(tli: TimeLineID, seg_size: usize, start: Lsn) -> Self {
            assert_eq!(start.block_offset(), 0, "start must be page-aligned");
            WalGenerator {
                tli,
                seg_size,
                pos: start,
                prev: Lsn(0),
                segments: Vec::new(),
            }
        }

        fn seg_buf(&mut self, segno: XLogSegNo) -> &mut Vec<u8> {
            let fname = XLogFileName(self.tli, segno, self.seg_size);
            if self.segments.last().map(|(n, _)| n.as_str()) != Some(fname.as_str()) {
                self.segments.push((fname, vec![0u8; self.seg_size]));
            }
            &mut self.segments.last_mut().unwrap().1
        }

        fn put_page_header(&mut self, rem_len: u32) {
            let page_start = self.pos;
            let seg_size = self.seg_size;
            let tli = self.tli;
            let long = page_start.segment_offset(seg_size) < XLOG_BLCKSZ;
            let mut hdr = Vec::new();
            hdr.extend_from_slice(&XLOG_PAGE_MAGIC.to_le_bytes());
            let mut info = if rem_len > 0 { XLP_FIRST_IS_CONTRECORD } else { 0 };
            if long {
                info |= XLP_LONG_HEADER;
            }
            hdr.extend_from_slice(&info.to_le_bytes());
            hdr.extend_from_slice(&tli.to_le_bytes());
            hdr.extend_from_slice(&page_start.0.to_le_bytes());
            hdr.extend_from_slice(&rem_len.to_le_bytes());
            hdr.extend_from_slice(&0u32.to_le_bytes()); // padding
            if long {
                hdr.extend_from_slice(&0x1122_3344_5566_7788u64.to_le_bytes()); // sysid
                hdr.extend_from_slice(&(seg_size as u32).to_le_bytes());
                hdr.extend_from_slice(&(XLOG_BLCKSZ as u32).to_le_bytes());
            }

            let segno = page_start.segment_number(seg_size);
            let off = page_start.segment_offset(seg_size);
            let hdr_len = hdr.len();
            let seg = self.seg_buf(segno);
            seg[off..off + hdr_len].copy_from_slice(&hdr);
            self.pos += hdr_len as u64;
        }

        /// Append raw record bytes, inserting page headers at page
        /// boundaries.
        fn put_bytes(&mut self, data: &[u8]) {
            let mut written = 0;
            while written < data.len() {
                if self.pos.block_offset() == 0 {
                    self.put_page_header((data.len() - written) as u32);
                }
                let page_remain = self.pos.remaining_in_block() as usize;
                let n = std::cmp::min(page_remain, data.len() - written);
                let segno = self.pos.segment_number(self.seg_size);
                let off = self.pos.segment_offset(self.seg_size);
                let seg = self.seg_buf(segno);
                seg[off..off + n].copy_from_slice(&data[written..written + n]);
                written += n;
                self.pos += n as u64;
            }
        }

        /// Append one record and return its start LSN.
        pub fn append_record(
            &mut self,
            xid: TransactionId,
            rmid: u8,
            info: u8,
            blocks: &[(RelFileNode, u8, BlockNumber)],
            main_data: &[u8],
        ) -> Lsn {
            // header area
            let mut body = Vec::new();
            let mut prev_rnode: Option<RelFileNode> = None;
            for (i, (rnode, forknum, blkno)) in blocks.iter().enumerate() {
                body.push(i as u8); // block_id
                let mut fork_flags = *forknum;
                if prev_rnode == Some(*rnode) {
                    fork_flags |= BKPBLOCK_SAME_REL;
                }
                body.push(fork_flags);
                body.extend_from_slice(&0u16.to_le_bytes()); // data_length
                if prev_rnode != Some(*rnode) {
                    body.extend_from_slice(&rnode.spcnode.to_le_bytes());
                    body.extend_from_slice(&rnode.dbnode.to_le_bytes());
                    body.extend_from_slice(&rnode.relnode.to_le_bytes());
                    prev_rnode = Some(*rnode);
                }
                body.extend_from_slice(&blkno.to_le_bytes());
            }
            if !main_data.is_empty() {
                assert!(main_data.len() < 256);
                body.push(XLR_BLOCK_ID_DATA_SHORT);
                body.push(main_data.len() as u8);
                body.extend_from_slice(main_data);
            }

            let tot_len = (XLOG_SIZE_OF_XLOG_RECORD + body.len()) as u32;
            let mut hdr = Vec::with_capacity(XLOG_SIZE_OF_XLOG_RECORD);
            hdr.extend_from_slice(&tot_len.to_le_bytes());
            hdr.extend_from_slice(&xid.to_le_bytes());
            hdr.extend_from_slice(&self.prev.0.to_le_bytes());
            hdr.push(info);
            hdr.push(rmid);
            hdr.extend_from_slice(&0u16.to_le_bytes()); // padding
            let mut crc = crc32c::crc32c(&body);
            crc = crc32c::crc32c_append(crc, &hdr);
            hdr.extend_from_slice(&crc.to_le_bytes());

            // Records begin at aligned positions; page headers are written
            // lazily by put_bytes.
            self.pos = self.pos.align();
            if self.pos.block_offset() == 0 {
                self.put_page_header(0);
            }
            let start = self.pos;

            let mut rec = hdr;
            rec.extend_from_slice(&body);
            self.put_bytes(&rec);
            self.prev = start;
            start
        }

        /// Write the accumulated segments into `waldir`. Set `gzip_last` to
        /// store the final segment as a `.gz` sidecar instead of a plain
        /// file.
        pub fn write_to_dir(&self, waldir: &Utf8Path, gzip_last: bool) -> std::io::Result<()> {
            for (i, (fname, data)) in self.segments.iter().enumerate() {
                let gz = gzip_last && i == self.segments.len() - 1;
                if gz {
                    let f = File::create(waldir.join(format!("{fname}.gz")))?;
                    let mut enc = flate2::write::GzEncoder::new(f, flate2::Compression::fast());
                    enc.write_all(data)?;
                    enc.finish()?;
                } else {
                    std::fs::write(waldir.join(fname), data)?;
                }
            }
            Ok(())
        }

        pub fn end_lsn(&self) -> Lsn {
            self.pos
        }
    }
}

#[cfg(test)]
mod tests {
    use super::wal_generator::WalGenerator;
    use super::*;
    use crate::WAL_SEGMENT_SIZE;
    use camino_tempfile::tempdir;

    const RNODE: RelFileNode = RelFileNode {
        spcnode: 1663,
        dbnode: 13010,
        relnode: 16384,
    };

    fn generate(start: Lsn, nrecords: u32, gzip_last: bool) -> (camino_tempfile::Utf8TempDir, Vec<Lsn>, Lsn) {
        let dir = tempdir().unwrap();
        let mut gen = WalGenerator::new(1, WAL_SEGMENT_SIZE, start);
        let mut lsns = Vec::new();
        for i in 0..nrecords {
            let lsn = gen.append_record(42 + i, 10, 0, &[(RNODE, 0, i)], b"payload");
            lsns.push(lsn);
        }
        let end = gen.end_lsn();
        gen.write_to_dir(dir.path(), gzip_last).unwrap();
        (dir, lsns, end)
    }

    #[test]
    fn roundtrip_simple_records() {
        let (dir, lsns, _end) = generate(Lsn(0x0100_0000), 10, false);

        let mut reader = WalReader::new(dir.path(), 1, WAL_SEGMENT_SIZE, lsns[0]);
        for (i, expected_lsn) in lsns.iter().enumerate() {
            let rec = reader.next_record().unwrap().expect("record missing");
            assert_eq!(rec.lsn, *expected_lsn);
            assert_eq!(rec.xl_xid, 42 + i as u32);
            assert_eq!(rec.blocks.len(), 1);
            assert_eq!(rec.blocks[0].rnode, RNODE);
            assert_eq!(rec.blocks[0].blkno, i as u32);
        }
        // End of valid WAL.
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn records_cross_page_boundaries() {
        let dir = tempdir().unwrap();
        let mut gen = WalGenerator::new(1, WAL_SEGMENT_SIZE, Lsn(0x0100_0000));
        let big = vec![7u8; 200];
        let mut lsns = Vec::new();
        // Enough records to cross several page boundaries.
        for i in 0..200u32 {
            lsns.push(gen.append_record(i, 10, 0, &[(RNODE, 0, i)], &big));
        }
        gen.write_to_dir(dir.path(), false).unwrap();

        let mut reader = WalReader::new(dir.path(), 1, WAL_SEGMENT_SIZE, lsns[0]);
        let mut count = 0;
        while let Some(rec) = reader.next_record().unwrap() {
            assert_eq!(rec.blocks[0].blkno, count);
            count += 1;
        }
        assert_eq!(count, 200);
    }

    #[test]
    fn gzip_segment_is_accepted() {
        let (dir, lsns, _) = generate(Lsn(0x0100_0000), 5, true);
        let mut reader = WalReader::new(dir.path(), 1, WAL_SEGMENT_SIZE, lsns[0]);
        let rec = reader.next_record().unwrap().unwrap();
        assert_eq!(rec.lsn, lsns[0]);
    }

    #[test]
    fn contains_lsn() {
        let (dir, lsns, _) = generate(Lsn(0x0100_0000), 5, false);
        assert!(wal_contains_lsn(dir.path(), lsns[2], 1, WAL_SEGMENT_SIZE).unwrap());
        // Pointing into the middle of a record is not a record boundary.
        assert!(!wal_contains_lsn(dir.path(), lsns[2] + 4, 1, WAL_SEGMENT_SIZE).unwrap());
        // A segment that does not exist.
        assert!(!wal_contains_lsn(dir.path(), Lsn(0x4200_0000), 1, WAL_SEGMENT_SIZE).unwrap());
    }

    #[test]
    fn last_record_lookup() {
        let (dir, lsns, end) = generate(Lsn(0x0100_0000), 5, false);
        let last =
            find_last_record_lsn(dir.path(), 1, WAL_SEGMENT_SIZE, lsns[0], end).unwrap();
        assert_eq!(last, Some(lsns[4]));

        // Target inside record 3 - only records 0..=2 fully precede it.
        let last =
            find_last_record_lsn(dir.path(), 1, WAL_SEGMENT_SIZE, lsns[0], lsns[3] + 4).unwrap();
        assert_eq!(last, Some(lsns[2]));
    }

    #[test]
    fn recovery_info_from_xact_records() {
        let dir = tempdir().unwrap();
        let mut gen = WalGenerator::new(1, WAL_SEGMENT_SIZE, Lsn(0x0100_0000));
        let start = gen.append_record(7, 10, 0, &[(RNODE, 0, 1)], b"x");
        let ts1: i64 = 694224000_000_000;
        let mut commit_data = ts1.to_le_bytes().to_vec();
        commit_data.extend_from_slice(&[0u8; 8]);
        gen.append_record(100, RM_XACT_ID, XLOG_XACT_COMMIT, &[], &commit_data);
        let ts2 = ts1 + 1_000_000;
        let mut commit_data2 = ts2.to_le_bytes().to_vec();
        commit_data2.extend_from_slice(&[0u8; 8]);
        gen.append_record(101, RM_XACT_ID, XLOG_XACT_COMMIT, &[], &commit_data2);
        let end = gen.end_lsn();
        gen.write_to_dir(dir.path(), false).unwrap();

        let info = read_recovery_info(dir.path(), 1, WAL_SEGMENT_SIZE, start, end).unwrap();
        assert_eq!(info, Some((ts2, 101)));
    }
}
