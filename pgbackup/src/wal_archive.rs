//! Waiting on the WAL archive: block until the segment holding a target LSN
//! shows up on disk (plain or as a gzip sidecar) and actually contains a
//! valid record at that position.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use camino::Utf8Path;
use postgres_ffi::waldecoder::{find_last_record_lsn, wal_contains_lsn};
use postgres_ffi::{TimeLineID, XLogFileName};
use tracing::{debug, info, warn};
use utils::lsn::Lsn;

pub struct WalWaitParams<'a> {
    /// Either the instance WAL archive or the backup's own `pg_wal`.
    pub wal_dir: &'a Utf8Path,
    pub tli: TimeLineID,
    pub seg_size: usize,
    pub timeout: Duration,
    /// Wait for the segment *before* the one holding the LSN; existence is
    /// enough, the LSN itself is not checked.
    pub wait_prev_segment: bool,
    /// Shapes the slow-archiving hint only.
    pub is_start_lsn: bool,
    pub in_stream_mode: bool,
    /// Replica leniency: after a quarter of the timeout, accept the last
    /// valid record at or before the target as the effective LSN.
    pub from_replica: bool,
    /// Where the replica fallback scan starts (the backup's start LSN).
    pub scan_from: Lsn,
    pub interrupted: &'a AtomicBool,
}

/// Poll until `lsn` is safely on disk. Returns the effective LSN, which
/// differs from the requested one only on the replica fallback path.
/// `Lsn::INVALID` is returned in wait-previous-segment mode.
pub fn wait_wal_lsn(lsn: Lsn, params: &WalWaitParams) -> Result<Lsn> {
    let mut segno = lsn.segment_number(params.seg_size);
    if params.wait_prev_segment {
        segno = segno.saturating_sub(1);
    }
    let wal_segment = XLogFileName(params.tli, segno, params.seg_size);
    let segment_path = params.wal_dir.join(&wal_segment);
    let gz_segment_path = params.wal_dir.join(format!("{wal_segment}.gz"));

    if params.wait_prev_segment {
        debug!("looking for segment {wal_segment}");
    } else {
        debug!("looking for LSN {lsn} in segment {wal_segment}");
    }

    let mut file_exists = false;
    let mut try_count: u64 = 0;
    loop {
        if !file_exists {
            file_exists = segment_path.exists();
            if !file_exists && gz_segment_path.exists() {
                debug!("found compressed WAL segment {gz_segment_path}");
                file_exists = true;
            }
        }

        if file_exists {
            if params.wait_prev_segment {
                return Ok(Lsn::INVALID);
            }

            if wal_contains_lsn(params.wal_dir, lsn, params.tli, params.seg_size)? {
                debug!("found LSN {lsn}");
                return Ok(lsn);
            }

            // The segment is here but the record is not. On a replica the
            // target may sit in the middle of a record that never arrived;
            // settle for the last valid record before it.
            if params.from_replica && try_count > params.timeout.as_secs() / 4 {
                if let Some(prior) = find_last_record_lsn(
                    params.wal_dir,
                    params.tli,
                    params.seg_size,
                    params.scan_from,
                    lsn,
                )? {
                    info!("found prior LSN {prior}, it is used as stop LSN");
                    return Ok(prior);
                }
            }
        }

        if params.interrupted.load(Ordering::Relaxed) {
            bail!("interrupted during waiting for WAL archiving");
        }

        std::thread::sleep(Duration::from_secs(1));
        try_count += 1;

        if try_count == 1 {
            if params.wait_prev_segment {
                info!("wait for WAL segment {segment_path} to be archived");
            } else {
                info!("wait for LSN {lsn} in archived WAL segment {segment_path}");
            }
        }

        // The most common misconfiguration: no archiving set up at all.
        if !params.in_stream_mode && params.is_start_lsn && try_count == 30 {
            warn!(
                "WAL delivery is assumed to be via continuous archiving; if archiving is not \
                 set up, use the --stream option to take an autonomous backup; otherwise check \
                 that archiving works correctly"
            );
        }

        if try_count > params.timeout.as_secs() {
            if file_exists {
                bail!(
                    "WAL segment {wal_segment} was archived, but target LSN {lsn} could not be \
                     archived in {} seconds",
                    params.timeout.as_secs()
                );
            } else {
                bail!(
                    "switched WAL segment {wal_segment} could not be archived in {} seconds",
                    params.timeout.as_secs()
                );
            }
        }
    }
}
