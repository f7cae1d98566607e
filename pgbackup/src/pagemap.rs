//! Page-map construction for incremental backups: which blocks of which
//! data files have changed since the parent backup.
//!
//! PAGE mode replays the archived WAL of `[parent.start_lsn,
//! current.start_lsn)` and collects every block reference. PTRACK mode asks
//! the server's change tracker for per-relation bitmaps. (FULL and DELTA
//! need no maps: FULL copies everything, DELTA filters per-block by LSN
//! while reading.)

use std::collections::HashMap;

use anyhow::{Context, Result};
use camino::Utf8Path;
use postgres_ffi::relfile_utils::MAIN_FORKNUM;
use postgres_ffi::waldecoder::{WalDecodeError, WalReader};
use postgres_ffi::{Oid, TimeLineID, RELSEG_SIZE};
use tracing::{debug, info};
use utils::lsn::Lsn;

use crate::datapagemap::DataPageMap;
use crate::inventory::PgFile;
use crate::pg_client::DatabaseClient;

/// Number of heap blocks tracked by one byte of a server-side bitmap.
const HEAPBLOCKS_PER_BYTE: u32 = 8;

/// Scan archived WAL in `[start_lsn, end_lsn)` of `tli` and set a bit for
/// every referenced block of every inventoried data file. Duplicate
/// references are naturally idempotent.
pub fn extract_pagemap(
    files: &mut [PgFile],
    wal_archive_dir: &Utf8Path,
    tli: TimeLineID,
    seg_size: usize,
    start_lsn: Lsn,
    end_lsn: Lsn,
) -> Result<()> {
    info!("compiling pagemap of changed blocks from WAL, {start_lsn}..{end_lsn}");

    // (tblspc, db, rel, segno) -> index into files
    let mut index: HashMap<(Oid, Oid, Oid, u32), usize> = HashMap::new();
    for (i, file) in files.iter().enumerate() {
        if file.is_datafile && !file.is_cfs {
            index.insert((file.tblspc_oid, file.db_oid, file.rel_oid, file.segno), i);
        }
    }

    let mut reader = WalReader::new(wal_archive_dir, tli, seg_size, start_lsn);
    let mut n_records: u64 = 0;
    loop {
        let record = match reader.next_record() {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(e @ WalDecodeError::SegmentMissing(_)) => {
                return Err(e).context("WAL archive is missing a segment required for PAGE backup")
            }
            Err(e) => return Err(e.into()),
        };
        if record.lsn >= end_lsn {
            break;
        }
        n_records += 1;

        for blk in &record.blocks {
            // Only main forks carry page maps; other forks travel whole.
            let key = (
                blk.rnode.spcnode,
                blk.rnode.dbnode,
                blk.rnode.relnode,
                blk.blkno / RELSEG_SIZE,
            );
            if blk.forknum != MAIN_FORKNUM {
                continue;
            }
            // A relation we have no record of did not exist at inventory
            // time, or is new; a new file is copied in full anyway.
            if let Some(&i) = index.get(&key) {
                let file = &mut files[i];
                file.pagemap
                    .get_or_insert_with(DataPageMap::new)
                    .add(blk.blkno % RELSEG_SIZE);
            }
        }

        if record.end_lsn >= end_lsn {
            break;
        }
    }

    debug!("pagemap compiled from {n_records} WAL records");
    Ok(())
}

/// Build per-file bitmaps from the server's change tracker. The returned
/// array packs eight heap blocks per byte; a relation segment's slice
/// starts at `(RELSEG_SIZE / 8) * segno`.
pub fn make_pagemap_from_ptrack(
    files: &mut [PgFile],
    client: &mut dyn DatabaseClient,
) -> Result<()> {
    info!("compiling pagemap from ptrack");

    // Databases with a ptrack_init marker bypassed tracking at some point;
    // their bitmaps cannot be trusted and every block gets copied.
    let mut databases: Vec<(Oid, Oid)> = files
        .iter()
        .filter(|f| f.is_datafile)
        .map(|f| (f.db_oid, f.tblspc_oid))
        .collect();
    databases.sort_unstable();
    databases.dedup();

    let mut untracked_dbs: Vec<(Oid, Oid)> = Vec::new();
    for &(db_oid, tblspc_oid) in &databases {
        use postgres_ffi::pg_constants::GLOBALTABLESPACE_OID;
        // Shared catalogs are not covered by per-database tracking.
        if tblspc_oid == GLOBALTABLESPACE_OID
            || client.ptrack_get_and_clear_db(db_oid, tblspc_oid)?
        {
            untracked_dbs.push((db_oid, tblspc_oid));
        }
    }

    // Bitmaps are fetched once per relation (at segment 0) and sliced per
    // segment; the inventory is path-sorted so segments are adjacent.
    let mut cached: Option<((Oid, Oid, Oid), Option<Vec<u8>>)> = None;
    for file in files.iter_mut() {
        if !file.is_datafile || file.is_cfs {
            continue;
        }

        if untracked_dbs.contains(&(file.db_oid, file.tblspc_oid)) {
            debug!("ignoring ptrack because of ptrack_init for \"{}\"", file.rel_path);
            file.pagemap_isabsent = true;
            continue;
        }

        let key = (file.tblspc_oid, file.db_oid, file.rel_oid);
        if cached.as_ref().map(|(k, _)| *k) != Some(key) {
            let map = client.ptrack_get_and_clear(file.tblspc_oid, file.db_oid, file.rel_oid)?;
            cached = Some((key, map));
        }
        let map = match &cached.as_ref().unwrap().1 {
            Some(map) => map,
            None => {
                // Nothing tracked: either created by a command that bypasses
                // the buffer manager, or the relation is gone. Copy whole.
                debug!("ptrack is missing for \"{}\"", file.rel_path);
                file.pagemap_isabsent = true;
                continue;
            }
        };

        let seg_bytes = (RELSEG_SIZE / HEAPBLOCKS_PER_BYTE) as usize;
        let start = seg_bytes * file.segno as usize;
        if start > map.len() {
            // Segment created after the bitmap was read.
            debug!("ptrack has no data for segment {} of \"{}\"", file.segno, file.rel_path);
            file.pagemap_isabsent = true;
            continue;
        }
        let end = std::cmp::min(start + seg_bytes, map.len());
        file.pagemap = Some(DataPageMap::from_raw_bytes(map[start..end].to_vec()));
    }

    info!("pagemap compiled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::list_data_directory;
    use camino_tempfile::tempdir;
    use postgres_ffi::pg_constants::DEFAULTTABLESPACE_OID;
    use postgres_ffi::waldecoder::wal_generator::WalGenerator;
    use postgres_ffi::waldecoder::RelFileNode;
    use postgres_ffi::WAL_SEGMENT_SIZE;
    use std::fs;

    #[test]
    fn page_mode_map_from_wal() {
        let datadir = tempdir().unwrap();
        fs::create_dir_all(datadir.path().join("base/5")).unwrap();
        fs::write(datadir.path().join("base/5/16384"), vec![0u8; 0]).unwrap();
        fs::write(datadir.path().join("base/5/16385"), vec![0u8; 0]).unwrap();
        let mut files = list_data_directory(datadir.path()).unwrap();

        let rnode_a = RelFileNode {
            spcnode: DEFAULTTABLESPACE_OID,
            dbnode: 5,
            relnode: 16384,
        };
        let rnode_unknown = RelFileNode {
            spcnode: DEFAULTTABLESPACE_OID,
            dbnode: 5,
            relnode: 99999,
        };

        let waldir = tempdir().unwrap();
        let mut gen = WalGenerator::new(1, WAL_SEGMENT_SIZE, Lsn(0x0100_0000));
        let start = gen.append_record(1, 10, 0, &[(rnode_a, 0, 2)], b"x");
        gen.append_record(2, 10, 0, &[(rnode_a, 0, 7), (rnode_a, 1, 3)], b"x");
        gen.append_record(3, 10, 0, &[(rnode_unknown, 0, 1)], b"x");
        // duplicate reference
        gen.append_record(4, 10, 0, &[(rnode_a, 0, 2)], b"x");
        let end = gen.end_lsn();
        // a record past the range must not contribute
        gen.append_record(5, 10, 0, &[(rnode_a, 0, 55)], b"x");
        gen.write_to_dir(waldir.path(), false).unwrap();

        extract_pagemap(&mut files, waldir.path(), 1, WAL_SEGMENT_SIZE, start, end).unwrap();

        let rel = files.iter().find(|f| f.rel_path == "base/5/16384").unwrap();
        let map = rel.pagemap.as_ref().unwrap();
        let blocks: Vec<u32> = map.iter().collect();
        // block 3 was an fsm-fork reference, block 55 is past end_lsn
        assert_eq!(blocks, vec![2, 7]);

        let other = files.iter().find(|f| f.rel_path == "base/5/16385").unwrap();
        assert!(other.pagemap.is_none());
    }
}
