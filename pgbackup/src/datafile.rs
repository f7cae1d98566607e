//! Per-file copy machinery: the careful page-by-page read of live data
//! files, whole-file copies for everything else, and the reverse direction
//! used by restore.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::FileExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use postgres_ffi::page::{
    page_header_is_valid, page_is_zeroed, page_lsn, set_page_checksum, verify_page_checksum,
};
use postgres_ffi::{BLCKSZ, RELSEG_SIZE};
use tracing::{debug, warn};
use utils::lsn::Lsn;

use crate::block_stream::{BackupCrc, BlockRecord, BlockStreamReader, BlockStreamWriter};
use crate::catalog::{BackupMode, FileListEntry};
use crate::compress::CompressAlg;
use crate::inventory::PgFile;
use crate::pg_client::BlockFetcher;

/// How often we are willing to re-read a page that looks torn before
/// declaring corruption. Pages being flushed concurrently settle within a
/// few tries.
const PAGE_READ_ATTEMPTS: u32 = 100;
const PAGE_READ_RETRY_DELAY: Duration = Duration::from_millis(10);

enum PageReadResult {
    /// Short read of zero bytes: the relation was truncated under us.
    NotFound,
    Valid { page: Vec<u8>, lsn: Lsn },
    /// Torn page, bad header, or checksum mismatch; worth retrying.
    Invalid,
}

fn read_page_from_file(
    file: &File,
    path: &Utf8Path,
    blknum: u32,
    absolute_blkno: u32,
    checksum_version: u32,
) -> Result<PageReadResult> {
    let offset = blknum as u64 * BLCKSZ as u64;
    let mut page = vec![0u8; BLCKSZ as usize];

    let mut read_total = 0;
    while read_total < page.len() {
        match file.read_at(&mut page[read_total..], offset + read_total as u64) {
            Ok(0) => break,
            Ok(n) => read_total += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context(format!("cannot read block {blknum} of \"{path}\"")),
        }
    }
    if read_total == 0 {
        debug!("file {path}, block {blknum}: file was truncated");
        return Ok(PageReadResult::NotFound);
    }
    if read_total != page.len() {
        warn!(
            "file {path}, block {blknum}: expected {BLCKSZ} bytes, read {read_total}, try again"
        );
        return Ok(PageReadResult::Invalid);
    }

    if !page_header_is_valid(&page) {
        // A zeroed page is a valid state: newly extended, never flushed.
        if page_is_zeroed(&page) {
            debug!("file {path}, block {blknum}: empty page");
            return Ok(PageReadResult::Valid { page, lsn: Lsn(0) });
        }
        debug!("file {path}, block {blknum}: wrong page header, try again");
        return Ok(PageReadResult::Invalid);
    }

    if checksum_version != 0 && !verify_page_checksum(&page, absolute_blkno) {
        debug!("file {path}, block {blknum}: wrong checksum, try again");
        return Ok(PageReadResult::Invalid);
    }

    let lsn = page_lsn(&page);
    Ok(PageReadResult::Valid { page, lsn })
}

pub enum PreparedPage {
    Page(Vec<u8>),
    /// The relation ends before this block.
    Truncated,
    /// DELTA: the page predates the parent backup.
    Skip,
}

pub struct PageReadContext<'a> {
    pub source_path: &'a Utf8Path,
    pub mode: BackupMode,
    pub prev_start_lsn: Lsn,
    pub exists_in_prev: bool,
    pub checksum_version: u32,
    pub fetcher: Option<&'a dyn BlockFetcher>,
    pub interrupted: &'a AtomicBool,
}

/// Retrieve one block, tolerating concurrent flushes: a torn or
/// checksum-failing page is re-read up to [`PAGE_READ_ATTEMPTS`] times, then
/// fetched through the server if possible, and only then declared corrupt.
/// PTRACK-mode backups always go through the server, which is what makes
/// their bitmaps trustworthy.
pub fn prepare_page(
    ctx: &PageReadContext,
    file: &PgFile,
    in_file: &File,
    blknum: u32,
) -> Result<PreparedPage> {
    if ctx.interrupted.load(Ordering::Relaxed) {
        bail!("interrupted during page reading");
    }

    let absolute_blkno = file.segno * RELSEG_SIZE + blknum;
    let mut page: Option<(Vec<u8>, Lsn)> = None;
    let mut truncated = false;

    if ctx.mode != BackupMode::Ptrack {
        for _ in 0..PAGE_READ_ATTEMPTS {
            match read_page_from_file(
                in_file,
                ctx.source_path,
                blknum,
                absolute_blkno,
                ctx.checksum_version,
            )? {
                PageReadResult::NotFound => {
                    truncated = true;
                    break;
                }
                PageReadResult::Valid { page: p, lsn } => {
                    page = Some((p, lsn));
                    break;
                }
                PageReadResult::Invalid => {
                    // If the server can hand us the block there is no point
                    // in grinding through all the retries.
                    if ctx.fetcher.is_some() {
                        warn!(
                            "file {}, block {blknum}, try to fetch via SQL",
                            ctx.source_path
                        );
                        break;
                    }
                    std::thread::sleep(PAGE_READ_RETRY_DELAY);
                }
            }
        }

        if page.is_none() && !truncated && ctx.fetcher.is_none() {
            warn!("corruption in file {}, block {blknum}", ctx.source_path);
            bail!("data file corruption, canceling backup");
        }
    }

    if ctx.mode == BackupMode::Ptrack || (page.is_none() && !truncated) {
        let fetcher = ctx
            .fetcher
            .context("cannot fetch block via SQL: no server connection")?;
        match fetcher.fetch_block(file.tblspc_oid, file.db_oid, file.rel_oid, absolute_blkno)? {
            None => truncated = true,
            Some(mut fetched) => {
                anyhow::ensure!(
                    fetched.len() == BLCKSZ as usize,
                    "file {}, block {blknum}: expected block size {BLCKSZ}, but read {}",
                    ctx.source_path,
                    fetched.len()
                );
                // The block comes from shared buffers with a stale checksum.
                if ctx.checksum_version != 0 {
                    set_page_checksum(&mut fetched, absolute_blkno);
                }
                let lsn = if page_header_is_valid(&fetched) {
                    page_lsn(&fetched)
                } else if ctx.mode == BackupMode::Delta && ctx.exists_in_prev {
                    bail!("cannot parse page after fetching it via SQL; possible memory corruption");
                } else {
                    Lsn(0)
                };
                page = Some((fetched, lsn));
            }
        }
    }

    if truncated {
        return Ok(PreparedPage::Truncated);
    }
    let (page, lsn) = page.expect("page either read, fetched, or truncated");

    // Pages with a zero LSN were never stamped and must be copied, to be
    // safe.
    if ctx.mode == BackupMode::Delta
        && ctx.exists_in_prev
        && lsn != Lsn(0)
        && lsn < ctx.prev_start_lsn
    {
        return Ok(PreparedPage::Skip);
    }

    Ok(PreparedPage::Page(page))
}

#[derive(Debug)]
pub enum DataFileOutcome {
    /// Source vanished; prune the entry.
    NotFound,
    /// Incremental backup with no changed blocks; restore takes the file
    /// from an ancestor.
    Unchanged,
    Written {
        read_size: u64,
        write_size: u64,
        crc: u32,
        n_blocks: Option<u32>,
    },
}

/// Back up one data file block by block: verify, compress, append to the
/// block stream.
pub fn backup_data_file(
    ctx: &PageReadContext,
    file: &PgFile,
    to_path: &Utf8Path,
    calg: CompressAlg,
    clevel: u32,
) -> Result<DataFileOutcome> {
    // A file that exists in the parent and has a known-but-empty change map
    // has no work for us at all.
    let pagemap_empty = file.pagemap.as_ref().map_or(true, |m| m.is_empty());
    if matches!(ctx.mode, BackupMode::Page | BackupMode::Ptrack)
        && pagemap_empty
        && file.exists_in_prev
        && !file.pagemap_isabsent
    {
        debug!("skipping the unchanged file \"{}\"", file.rel_path);
        return Ok(DataFileOutcome::Unchanged);
    }

    let in_file = match File::open(ctx.source_path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("file \"{}\" is not found", ctx.source_path);
            return Ok(DataFileOutcome::NotFound);
        }
        Err(e) => return Err(e).context(format!("cannot open file \"{}\"", ctx.source_path)),
    };

    if file.size % BLCKSZ as u64 != 0 {
        warn!("file \"{}\", invalid file size {}", ctx.source_path, file.size);
    }
    let nblocks = (file.size / BLCKSZ as u64) as u32;

    let out = File::create(to_path)
        .with_context(|| format!("cannot open backup file \"{to_path}\""))?;
    let mut writer = BlockStreamWriter::new(BufWriter::new(out));

    let use_pagemap = !pagemap_empty && !file.pagemap_isabsent && file.exists_in_prev;
    let blocks: Vec<u32> = if use_pagemap {
        file.pagemap.as_ref().unwrap().iter().collect()
    } else {
        (0..nblocks).collect()
    };

    let mut n_read: u32 = 0;
    let mut n_skipped: u32 = 0;
    let mut read_size: u64 = 0;
    for blknum in blocks {
        match prepare_page(ctx, file, &in_file, blknum)? {
            PreparedPage::Skip => {
                n_read += 1;
                n_skipped += 1;
            }
            PreparedPage::Truncated => {
                writer.write_truncation(blknum)?;
                n_read += 1;
                break;
            }
            PreparedPage::Page(page) => {
                writer.write_page(blknum, &page, calg, clevel)?;
                n_read += 1;
                read_size += BLCKSZ as u64;
            }
        }
    }

    let (crc, write_size) = writer.finish()?;

    // DELTA has no pagemap to tell the restore about truncation, but it has
    // read the whole file and knows its exact block count.
    let n_blocks = (ctx.mode == BackupMode::Delta).then_some(n_read);

    // Everything was skipped by the LSN filter: drop the empty stream and
    // record the file as carried over.
    if n_read != 0 && n_read == n_skipped {
        std::fs::remove_file(to_path)
            .with_context(|| format!("cannot remove file \"{to_path}\""))?;
        return Ok(DataFileOutcome::Unchanged);
    }

    Ok(DataFileOutcome::Written {
        read_size,
        write_size,
        crc,
        n_blocks,
    })
}

/// Plain whole-file copy with CRC, for non-data files, the control file and
/// compressed-tablespace payloads. Returns None if the source vanished.
pub fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<Option<(u64, u32)>> {
    let in_file = match File::open(from) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("file \"{from}\" is not found");
            return Ok(None);
        }
        Err(e) => return Err(e).context(format!("cannot open source file \"{from}\"")),
    };
    let mut reader = BufReader::new(in_file);
    let out = File::create(to).with_context(|| format!("cannot open destination file \"{to}\""))?;
    let mut writer = BufWriter::new(out);

    let mut crc = BackupCrc::new(true);
    let mut size: u64 = 0;
    let mut buf = vec![0u8; BLCKSZ as usize];
    loop {
        let n = reader.read(&mut buf).with_context(|| format!("cannot read \"{from}\""))?;
        if n == 0 {
            break;
        }
        crc.update(&buf[..n]);
        writer.write_all(&buf[..n]).with_context(|| format!("cannot write to \"{to}\""))?;
        size += n as u64;
    }
    writer.flush()?;
    Ok(Some((size, crc.finish())))
}

/// CRC and size of an existing file, for the carried-over comparison and
/// for streamed WAL segments.
pub fn file_crc(path: &Utf8Path, use_crc32c: bool) -> Result<(u64, u32)> {
    let file = File::open(path).with_context(|| format!("cannot open file \"{path}\""))?;
    let mut reader = BufReader::new(file);
    let mut crc = BackupCrc::new(use_crc32c);
    let mut size: u64 = 0;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        crc.update(&buf[..n]);
        size += n as u64;
    }
    Ok((size, crc.finish()))
}

/// Apply one backed-up block stream onto the file being reconstructed.
/// Earlier chain members have already written their blocks; we overwrite
/// just the ones this backup recorded.
pub fn restore_data_file(
    payload_path: &Utf8Path,
    entry: &FileListEntry,
    dest_path: &Utf8Path,
    use_crc32c: bool,
    legacy_compressed_pages: bool,
) -> Result<()> {
    let payload = File::open(payload_path)
        .with_context(|| format!("cannot open backup file \"{payload_path}\""))?;
    let mut reader = BlockStreamReader::new(
        BufReader::new(payload),
        entry.compress_alg,
        use_crc32c,
        legacy_compressed_pages,
    );

    let mut out = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(dest_path)
        .with_context(|| format!("cannot open restore target file \"{dest_path}\""))?;

    while let Some(record) = reader
        .next_record()
        .with_context(|| format!("broken backup of \"{}\"", entry.path))?
    {
        match record {
            BlockRecord::Page { blknum, data } => {
                out.seek(SeekFrom::Start(blknum as u64 * BLCKSZ as u64))
                    .with_context(|| format!("cannot seek block {blknum} of \"{dest_path}\""))?;
                out.write_all(&data)
                    .with_context(|| format!("cannot write block {blknum} of \"{dest_path}\""))?;
            }
            BlockRecord::Truncated { blknum } => {
                out.set_len(blknum as u64 * BLCKSZ as u64)
                    .with_context(|| format!("cannot truncate \"{dest_path}\""))?;
                break;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Final truncation: the last backup of a chain knows the source block
/// count; anything beyond it is leftover from older chain members.
pub fn truncate_to_blocks(dest_path: &Utf8Path, n_blocks: u32) -> Result<()> {
    let expected = n_blocks as u64 * BLCKSZ as u64;
    let file = OpenOptions::new()
        .write(true)
        .open(dest_path)
        .with_context(|| format!("cannot open \"{dest_path}\""))?;
    if file.metadata()?.len() > expected {
        debug!("truncating \"{dest_path}\" to {n_blocks} blocks");
        file.set_len(expected)
            .with_context(|| format!("cannot truncate \"{dest_path}\""))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{list_data_directory, FileKind};
    use camino_tempfile::tempdir;
    use postgres_ffi::page::empty_page;

    fn make_relation(dir: &Utf8Path, rel_path: &str, lsns: &[Lsn]) -> camino::Utf8PathBuf {
        let path = dir.join(rel_path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut content = Vec::new();
        for (blkno, lsn) in lsns.iter().enumerate() {
            let mut page = empty_page(*lsn);
            page[100] = blkno as u8; // make pages distinguishable
            set_page_checksum(&mut page, blkno as u32);
            content.extend_from_slice(&page);
        }
        std::fs::write(&path, &content).unwrap();
        path
    }

    fn inventory_file<'a>(files: &'a [crate::inventory::PgFile], rel: &str) -> &'a PgFile {
        files.iter().find(|f| f.rel_path == rel).unwrap()
    }

    #[test]
    fn full_backup_and_restore_roundtrip() {
        let src = tempdir().unwrap();
        let source_path = make_relation(
            src.path(),
            "base/5/16384",
            &[Lsn(0x100), Lsn(0x200), Lsn(0x300)],
        );
        let files = list_data_directory(src.path()).unwrap();
        let file = inventory_file(&files, "base/5/16384");

        let backup_dir = tempdir().unwrap();
        let to_path = backup_dir.path().join("16384");
        let interrupted = AtomicBool::new(false);
        let ctx = PageReadContext {
            source_path: &source_path,
            mode: BackupMode::Full,
            prev_start_lsn: Lsn::INVALID,
            exists_in_prev: false,
            checksum_version: 1,
            fetcher: None,
            interrupted: &interrupted,
        };
        let outcome = backup_data_file(&ctx, file, &to_path, CompressAlg::Zlib, 1).unwrap();
        let (crc, write_size) = match outcome {
            DataFileOutcome::Written {
                read_size,
                write_size,
                crc,
                ..
            } => {
                assert_eq!(read_size, 3 * BLCKSZ as u64);
                (crc, write_size)
            }
            _ => panic!("expected Written"),
        };
        assert_eq!(std::fs::metadata(&to_path).unwrap().len(), write_size);

        // restore into an empty directory
        let dest = tempdir().unwrap();
        let dest_path = dest.path().join("16384");
        let entry = FileListEntry {
            path: "base/5/16384".to_owned(),
            size: write_size as i64,
            mode: 0o100600,
            is_datafile: true,
            is_cfs: false,
            crc,
            compress_alg: CompressAlg::Zlib,
            external_dir_num: 0,
            segno: Some(0),
            linked: None,
            n_blocks: None,
        };
        restore_data_file(&to_path, &entry, &dest_path, true, false).unwrap();

        assert_eq!(
            std::fs::read(&source_path).unwrap(),
            std::fs::read(&dest_path).unwrap()
        );
    }

    #[test]
    fn delta_skips_old_pages() {
        let src = tempdir().unwrap();
        let source_path = make_relation(
            src.path(),
            "base/5/16384",
            &[Lsn(0x100), Lsn(0x9000), Lsn(0x200)],
        );
        let mut files = list_data_directory(src.path()).unwrap();
        {
            let file = files.iter_mut().find(|f| f.rel_path == "base/5/16384").unwrap();
            file.exists_in_prev = true;
        }
        let file = inventory_file(&files, "base/5/16384");

        let backup_dir = tempdir().unwrap();
        let to_path = backup_dir.path().join("16384");
        let interrupted = AtomicBool::new(false);
        let ctx = PageReadContext {
            source_path: &source_path,
            mode: BackupMode::Delta,
            prev_start_lsn: Lsn(0x1000),
            exists_in_prev: true,
            checksum_version: 1,
            fetcher: None,
            interrupted: &interrupted,
        };
        let outcome = backup_data_file(&ctx, file, &to_path, CompressAlg::Zlib, 1).unwrap();
        match outcome {
            DataFileOutcome::Written {
                read_size, n_blocks, ..
            } => {
                // only block 1 is newer than the parent's start LSN
                assert_eq!(read_size, BLCKSZ as u64);
                assert_eq!(n_blocks, Some(3));
            }
            _ => panic!("expected Written"),
        }

        // decode: exactly one record, for block 1
        let mut reader = BlockStreamReader::new(
            BufReader::new(File::open(&to_path).unwrap()),
            CompressAlg::Zlib,
            true,
            false,
        );
        match reader.next_record().unwrap().unwrap() {
            BlockRecord::Page { blknum, .. } => assert_eq!(blknum, 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn delta_with_no_new_pages_is_unchanged() {
        let src = tempdir().unwrap();
        let source_path =
            make_relation(src.path(), "base/5/16384", &[Lsn(0x100), Lsn(0x200)]);
        let mut files = list_data_directory(src.path()).unwrap();
        files
            .iter_mut()
            .find(|f| f.rel_path == "base/5/16384")
            .unwrap()
            .exists_in_prev = true;
        let file = inventory_file(&files, "base/5/16384");

        let backup_dir = tempdir().unwrap();
        let to_path = backup_dir.path().join("16384");
        let interrupted = AtomicBool::new(false);
        let ctx = PageReadContext {
            source_path: &source_path,
            mode: BackupMode::Delta,
            prev_start_lsn: Lsn(0x1000),
            exists_in_prev: true,
            checksum_version: 1,
            fetcher: None,
            interrupted: &interrupted,
        };
        match backup_data_file(&ctx, file, &to_path, CompressAlg::Zlib, 1).unwrap() {
            DataFileOutcome::Unchanged => {}
            _ => panic!("expected Unchanged"),
        }
        assert!(!to_path.exists());
    }

    #[test]
    fn corrupt_page_without_fetcher_fails() {
        let src = tempdir().unwrap();
        let source_path = make_relation(src.path(), "base/5/16384", &[Lsn(0x100)]);
        // flip one byte in the page body
        let mut content = std::fs::read(&source_path).unwrap();
        content[4000] ^= 0x01;
        std::fs::write(&source_path, &content).unwrap();

        let files = list_data_directory(src.path()).unwrap();
        let file = inventory_file(&files, "base/5/16384");
        let backup_dir = tempdir().unwrap();
        let interrupted = AtomicBool::new(false);
        let ctx = PageReadContext {
            source_path: &source_path,
            mode: BackupMode::Full,
            prev_start_lsn: Lsn::INVALID,
            exists_in_prev: false,
            checksum_version: 1,
            fetcher: None,
            interrupted: &interrupted,
        };
        let err = backup_data_file(&ctx, file, &backup_dir.path().join("out"), CompressAlg::None, 0)
            .unwrap_err();
        assert!(err.to_string().contains("corruption"));
    }

    struct GoodPageFetcher(Vec<u8>);
    impl BlockFetcher for GoodPageFetcher {
        fn fetch_block(&self, _: u32, _: u32, _: u32, _: u32) -> Result<Option<Vec<u8>>> {
            Ok(Some(self.0.clone()))
        }
    }

    #[test]
    fn corrupt_page_recovers_via_fetcher() {
        let src = tempdir().unwrap();
        let source_path = make_relation(src.path(), "base/5/16384", &[Lsn(0x100)]);
        let good = std::fs::read(&source_path).unwrap();
        let mut corrupted = good.clone();
        corrupted[4000] ^= 0x01;
        std::fs::write(&source_path, &corrupted).unwrap();

        let files = list_data_directory(src.path()).unwrap();
        let file = inventory_file(&files, "base/5/16384");
        let backup_dir = tempdir().unwrap();
        let to_path = backup_dir.path().join("out");
        let interrupted = AtomicBool::new(false);
        let fetcher = GoodPageFetcher(good[0..BLCKSZ as usize].to_vec());
        let ctx = PageReadContext {
            source_path: &source_path,
            mode: BackupMode::Full,
            prev_start_lsn: Lsn::INVALID,
            exists_in_prev: false,
            checksum_version: 1,
            fetcher: Some(&fetcher),
            interrupted: &interrupted,
        };
        match backup_data_file(&ctx, file, &to_path, CompressAlg::None, 0).unwrap() {
            DataFileOutcome::Written { read_size, .. } => assert_eq!(read_size, BLCKSZ as u64),
            _ => panic!("expected Written"),
        }
    }

    #[test]
    fn missing_source_reports_not_found() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("base/5/777");
        let file = PgFile {
            rel_path: "base/5/777".into(),
            kind: FileKind::Reg,
            mode: 0o100600,
            size: 8192,
            mtime: 0,
            is_datafile: true,
            is_cfs: false,
            tblspc_oid: 1663,
            db_oid: 5,
            rel_oid: 777,
            forknum: Some(0),
            segno: 0,
            external_dir_num: 0,
            exists_in_prev: false,
            pagemap: None,
            pagemap_isabsent: false,
            claim: AtomicBool::new(false),
            result: std::sync::Mutex::new(Default::default()),
        };
        let interrupted = AtomicBool::new(false);
        let ctx = PageReadContext {
            source_path: &gone,
            mode: BackupMode::Full,
            prev_start_lsn: Lsn::INVALID,
            exists_in_prev: false,
            checksum_version: 1,
            fetcher: None,
            interrupted: &interrupted,
        };
        match backup_data_file(&ctx, &file, &dir.path().join("out"), CompressAlg::None, 0).unwrap()
        {
            DataFileOutcome::NotFound => {}
            _ => panic!("expected NotFound"),
        }
    }
}
