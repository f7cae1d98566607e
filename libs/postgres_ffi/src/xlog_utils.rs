//
// This file contains common utilities for dealing with PostgreSQL WAL files
// and LSNs.
//
// Many of these functions have been copied from PostgreSQL, and rewritten in
// Rust. That's why they don't follow the usual Rust naming conventions, they
// have been named the same as the corresponding PostgreSQL functions instead.
//

use std::time::SystemTime;

use utils::lsn::Lsn;

use crate::{TimeLineID, TimestampTz, XLogSegNo};

pub const XLOG_FNAME_LEN: usize = 24;

pub const XLOG_SIZE_OF_XLOG_SHORT_PHD: usize = 2 + 2 + 4 + 8 + 4 + 4;
pub const XLOG_SIZE_OF_XLOG_LONG_PHD: usize = XLOG_SIZE_OF_XLOG_SHORT_PHD + 8 + 4 + 4;
pub const XLOG_SIZE_OF_XLOG_RECORD: usize = 24;
/* offset of xl_crc in the record header: xl_tot_len + xl_xid + xl_prev + xl_info + xl_rmid + padding */
pub const XLOG_RECORD_CRC_OFFS: usize = 4 + 4 + 8 + 1 + 1 + 2;

#[allow(non_snake_case)]
pub fn XLogSegmentsPerXLogId(wal_segsz_bytes: usize) -> XLogSegNo {
    (0x100000000u64 / wal_segsz_bytes as u64) as XLogSegNo
}

#[allow(non_snake_case)]
pub fn XLogSegNoOffsetToRecPtr(segno: XLogSegNo, offset: u32, wal_segsz_bytes: usize) -> Lsn {
    Lsn(segno * (wal_segsz_bytes as u64) + (offset as u64))
}

#[allow(non_snake_case)]
pub fn XLogFileName(tli: TimeLineID, log_seg_no: XLogSegNo, wal_segsz_bytes: usize) -> String {
    format!(
        "{:>08X}{:>08X}{:>08X}",
        tli,
        log_seg_no / XLogSegmentsPerXLogId(wal_segsz_bytes),
        log_seg_no % XLogSegmentsPerXLogId(wal_segsz_bytes)
    )
}

#[allow(non_snake_case)]
pub fn XLogFromFileName(fname: &str, wal_seg_size: usize) -> anyhow::Result<(XLogSegNo, TimeLineID)> {
    if fname.len() == XLOG_FNAME_LEN {
        let tli = u32::from_str_radix(&fname[0..8], 16)?;
        let log = u32::from_str_radix(&fname[8..16], 16)? as XLogSegNo;
        let seg = u32::from_str_radix(&fname[16..24], 16)? as XLogSegNo;
        Ok((log * XLogSegmentsPerXLogId(wal_seg_size) + seg, tli))
    } else {
        anyhow::bail!("invalid WAL file name {}", fname);
    }
}

#[allow(non_snake_case)]
pub fn IsXLogFileName(fname: &str) -> bool {
    fname.len() == XLOG_FNAME_LEN && fname.chars().all(|c| c.is_ascii_hexdigit())
}

#[allow(non_snake_case)]
pub fn IsPartialXLogFileName(fname: &str) -> bool {
    fname.ends_with(".partial") && IsXLogFileName(&fname[0..fname.len() - 8])
}

/// If LSN points to the beginning of the page, then shift it to first record,
/// otherwise align on 8-bytes boundary (required for WAL records)
pub fn normalize_lsn(lsn: Lsn, seg_sz: usize) -> Lsn {
    if lsn.0 % XLOG_BLCKSZ as u64 == 0 {
        let hdr_size = if lsn.0 % seg_sz as u64 == 0 {
            XLOG_SIZE_OF_XLOG_LONG_PHD
        } else {
            XLOG_SIZE_OF_XLOG_SHORT_PHD
        };
        lsn + hdr_size as u64
    } else {
        lsn.align()
    }
}

use crate::XLOG_BLCKSZ;

const UNIX_EPOCH_JDATE: u64 = 2440588; /* == date2j(1970, 1, 1) */
const POSTGRES_EPOCH_JDATE: u64 = 2451545; /* == date2j(2000, 1, 1) */
const SECS_PER_DAY: u64 = 86400;
const USECS_PER_SEC: u64 = 1000000;

/// Current time as a Postgres timestamp (microseconds since PG epoch).
pub fn get_current_timestamp() -> TimestampTz {
    to_pg_timestamp(SystemTime::now())
}

pub fn to_pg_timestamp(time: SystemTime) -> TimestampTz {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(n) => {
            ((n.as_secs() - ((POSTGRES_EPOCH_JDATE - UNIX_EPOCH_JDATE) * SECS_PER_DAY))
                * USECS_PER_SEC
                + n.subsec_micros() as u64) as i64
        }
        Err(_) => panic!("SystemTime before UNIX EPOCH!"),
    }
}

/// Convert a Postgres timestamp back to unix seconds, rounding down.
pub fn from_pg_timestamp_to_unix_secs(ts: TimestampTz) -> i64 {
    ts / USECS_PER_SEC as i64 + ((POSTGRES_EPOCH_JDATE - UNIX_EPOCH_JDATE) * SECS_PER_DAY) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_names() {
        let seg_sz = 16 * 1024 * 1024;
        assert_eq!(XLogFileName(1, 1, seg_sz), "000000010000000000000001");
        // segment numbers wrap into the "log id" part every 0x100000000 bytes
        assert_eq!(XLogFileName(1, 256, seg_sz), "000000010000000100000000");
        assert_eq!(XLogFileName(0x2A, 0x11, seg_sz), "0000002A0000000000000011");

        let (segno, tli) = XLogFromFileName("000000010000000100000000", seg_sz).unwrap();
        assert_eq!(segno, 256);
        assert_eq!(tli, 1);

        assert!(IsXLogFileName("000000010000000000000001"));
        assert!(!IsXLogFileName("00000001000000000000000"));
        assert!(!IsXLogFileName("00000001000000000000000G"));
        assert!(IsPartialXLogFileName("000000010000000000000001.partial"));
        assert!(!IsPartialXLogFileName("000000010000000000000001.gz"));
    }

    #[test]
    fn test_segment_arithmetic() {
        let seg_sz = 16 * 1024 * 1024;
        let lsn = Lsn(0x0100_0007);
        assert_eq!(lsn.segment_number(seg_sz), 1);
        assert_eq!(
            XLogSegNoOffsetToRecPtr(lsn.segment_number(seg_sz), 7, seg_sz),
            lsn
        );
    }

    #[test]
    fn test_normalize_lsn() {
        let seg_sz = 16 * 1024 * 1024;
        // start of segment: skip long header
        assert_eq!(
            normalize_lsn(Lsn(0x0100_0000), seg_sz),
            Lsn(0x0100_0000 + XLOG_SIZE_OF_XLOG_LONG_PHD as u64)
        );
        // start of page: skip short header
        assert_eq!(
            normalize_lsn(Lsn(0x0100_2000), seg_sz),
            Lsn(0x0100_2000 + XLOG_SIZE_OF_XLOG_SHORT_PHD as u64)
        );
        // mid page: align to 8
        assert_eq!(normalize_lsn(Lsn(0x0100_2009), seg_sz), Lsn(0x0100_2010));
    }

    #[test]
    fn test_pg_timestamp_conversions() {
        let now = SystemTime::now();
        let unix_secs = now
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let ts = to_pg_timestamp(now);
        assert_eq!(from_pg_timestamp_to_unix_secs(ts), unix_secs);
    }
}
