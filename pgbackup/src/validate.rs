//! Validation: re-read a finished backup and prove that what is on disk is
//! what the file list promises.

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use camino::Utf8Path;
use postgres_ffi::page::{page_header_is_valid, page_is_zeroed, page_lsn, verify_page_checksum};
use postgres_ffi::RELSEG_SIZE;
use tracing::{debug, info, warn};
use utils::lsn::Lsn;

use crate::block_stream::{BlockRecord, BlockStreamReader};
use crate::catalog::{Backup, BackupId, BackupStatus, Catalog, FileListEntry};
use crate::datafile;
use crate::{parse_program_version, LEGACY_COMPRESSED_PAGE_VERSION};

/// CLI entry: validate one backup by id, locking it first.
pub fn do_validate(catalog: &Catalog, id: BackupId) -> Result<()> {
    let mut backup = catalog.read_backup(id)?;
    let _lock = catalog.lock_backup_exclusive(id)?;
    if validate_backup(catalog, &mut backup)? {
        info!("backup {id} is valid");
        Ok(())
    } else {
        anyhow::bail!("backup {id} is corrupt")
    }
}

/// Check every archived file against its recorded CRC, and every page of
/// every data file against its own checksum and the backup's stop LSN.
/// Flips the status to OK or CORRUPT.
pub fn validate_backup(catalog: &Catalog, backup: &mut Backup) -> Result<bool> {
    anyhow::ensure!(
        matches!(backup.status, BackupStatus::Ok | BackupStatus::Done),
        "backup {} has status {}, cannot validate",
        backup.id,
        backup.status
    );
    info!("validating backup {}", backup.id);

    let version = parse_program_version(&backup.program_version);
    let use_crc32c = version <= 20021 || version >= 20025;
    let legacy_compressed_pages = version < LEGACY_COMPRESSED_PAGE_VERSION;

    let entries = catalog.read_backup_filelist(backup.id)?;
    let database_path = catalog.database_path(backup.id);

    let mut is_valid = true;
    for entry in &entries {
        if !entry.is_reg() || entry.size < 0 {
            continue;
        }
        let payload = if entry.external_dir_num == 0 {
            database_path.join(&entry.path)
        } else {
            catalog
                .external_dir_path(backup.id, entry.external_dir_num)
                .join(&entry.path)
        };
        if !payload.exists() {
            warn!("backup file \"{payload}\" is missing");
            is_valid = false;
            continue;
        }

        let file_ok = if entry.is_datafile && !entry.is_cfs {
            check_file_pages(
                &payload,
                entry,
                backup.stop_lsn,
                backup.checksum_version,
                use_crc32c,
                legacy_compressed_pages,
            )?
        } else {
            let (size, crc) = datafile::file_crc(&payload, use_crc32c)?;
            if size != entry.size as u64 {
                warn!(
                    "invalid size of backup file \"{payload}\": {size}, expected {}",
                    entry.size
                );
                false
            } else if crc != entry.crc {
                warn!(
                    "invalid CRC of backup file \"{payload}\": {crc:X}, expected {:X}",
                    entry.crc
                );
                false
            } else {
                true
            }
        };
        if !file_ok {
            is_valid = false;
        }
    }

    backup.status = if is_valid {
        BackupStatus::Ok
    } else {
        BackupStatus::Corrupt
    };
    catalog.write_backup_status(backup.id, backup.status)?;
    if !is_valid {
        warn!("backup {} data files are corrupted", backup.id);
    }
    Ok(is_valid)
}

/// Decode one block stream, sanity-checking every page on the way and
/// comparing the stream CRC at the end.
fn check_file_pages(
    payload: &Utf8Path,
    entry: &FileListEntry,
    stop_lsn: Lsn,
    checksum_version: u32,
    use_crc32c: bool,
    legacy_compressed_pages: bool,
) -> Result<bool> {
    debug!("validating relation blocks for file \"{payload}\"");
    let file = File::open(payload).with_context(|| format!("cannot open file \"{payload}\""))?;
    let mut reader = BlockStreamReader::new(
        BufReader::new(file),
        entry.compress_alg,
        use_crc32c,
        legacy_compressed_pages,
    );

    let segno = entry.segno.unwrap_or(0);
    let mut is_valid = true;
    loop {
        match reader.next_record() {
            Ok(Some(BlockRecord::Page { blknum, data })) => {
                if !validate_one_page(
                    &data,
                    payload,
                    segno * RELSEG_SIZE + blknum,
                    stop_lsn,
                    checksum_version,
                ) {
                    is_valid = false;
                }
            }
            Ok(Some(BlockRecord::Truncated { blknum })) => {
                debug!("block {blknum} of \"{payload}\" is truncated");
            }
            Ok(None) => break,
            Err(e) => {
                warn!("broken block stream in \"{payload}\": {e:#}");
                return Ok(false);
            }
        }
    }

    let crc = reader.finish();
    if crc != entry.crc {
        warn!(
            "invalid CRC of backup file \"{payload}\": {crc:X}, expected {:X}",
            entry.crc
        );
        is_valid = false;
    }
    Ok(is_valid)
}

fn validate_one_page(
    page: &[u8],
    payload: &Utf8Path,
    absolute_blkno: u32,
    stop_lsn: Lsn,
    checksum_version: u32,
) -> bool {
    // Zeroed pages carry neither header nor checksum.
    if page_is_zeroed(page) {
        return true;
    }
    if checksum_version != 0 && !verify_page_checksum(page, absolute_blkno) {
        warn!("file \"{payload}\", block {absolute_blkno} has a wrong checksum");
        return false;
    }
    if !page_header_is_valid(page) {
        warn!("page header is looking insane: \"{payload}\", block {absolute_blkno}");
        return false;
    }
    // The page must predate the moment the backup stopped.
    if stop_lsn.is_valid() {
        let lsn = page_lsn(page);
        if lsn > stop_lsn {
            warn!(
                "file \"{payload}\", block {absolute_blkno} is from future: \
                 page LSN {lsn}, stop LSN {stop_lsn}"
            );
            return false;
        }
    }
    true
}
