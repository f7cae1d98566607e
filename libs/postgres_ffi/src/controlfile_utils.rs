//!
//! Utilities for reading and writing the PostgreSQL control file
//! (`global/pg_control`).
//!
//! The file contains one ControlFileData struct, followed by zero padding up
//! to a full block. The layout constants below mirror the PG 11 struct; the
//! fields the backup engine does not care about travel through unparsed in
//! the raw image, so re-encoding preserves them. The last meaningful field
//! is a CRC-32C of everything before it.
//!

use anyhow::{bail, ensure, Result};
use utils::lsn::Lsn;

use crate::TimeLineID;

/// From pg_control.h for PG 11.
pub const PG_CONTROL_VERSION: u32 = 1100;

/// The control file is padded to this size on disk.
pub const PG_CONTROL_FILE_SIZE: usize = 8192;

/// Byte offsets of the fields we read or patch. Alignment padding included,
/// 64-bit platform rules (MAXALIGN 8).
const OFFSETOF_SYSTEM_IDENTIFIER: usize = 0;
const OFFSETOF_PG_CONTROL_VERSION: usize = 8;
const OFFSETOF_CHECKPOINT: usize = 32;
/// checkPointCopy starts at 40: redo, then the timeline ids.
const OFFSETOF_CHECKPOINT_REDO: usize = 40;
const OFFSETOF_THIS_TIMELINE_ID: usize = 48;
const OFFSETOF_MIN_RECOVERY_POINT: usize = 128;
const OFFSETOF_MIN_RECOVERY_POINT_TLI: usize = 136;
const OFFSETOF_BLCKSZ: usize = 208;
const OFFSETOF_XLOG_BLCKSZ: usize = 216;
const OFFSETOF_XLOG_SEG_SIZE: usize = 220;
const OFFSETOF_DATA_CHECKSUM_VERSION: usize = 244;
/// Offset of the crc field itself; the checksum covers everything before it.
const OFFSETOF_CRC: usize = 280;

pub const SIZEOF_CONTROLFILE_DATA: usize = OFFSETOF_CRC + 4;

#[derive(Debug, Clone)]
pub struct ControlFileData {
    pub system_identifier: u64,
    pub pg_control_version: u32,
    pub checkpoint: Lsn,
    pub checkpoint_redo: Lsn,
    pub timeline_id: TimeLineID,
    pub min_recovery_point: Lsn,
    pub min_recovery_point_tli: TimeLineID,
    pub blcksz: u32,
    pub xlog_blcksz: u32,
    pub xlog_seg_size: u32,
    pub data_checksum_version: u32,
    /// The original struct bytes; fields not modeled above are preserved
    /// through decode/encode round trips.
    raw: Vec<u8>,
}

fn get_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

fn get_u64(buf: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
}

impl ControlFileData {
    /// Parse and verify a control file image.
    pub fn decode(buf: &[u8]) -> Result<ControlFileData> {
        ensure!(
            buf.len() >= SIZEOF_CONTROLFILE_DATA,
            "control file is too short: {} bytes",
            buf.len()
        );

        let expected_crc = crc32c::crc32c(&buf[0..OFFSETOF_CRC]);
        let stored_crc = get_u32(buf, OFFSETOF_CRC);
        if expected_crc != stored_crc {
            bail!(
                "invalid control file CRC: expected {expected_crc:#x}, found {stored_crc:#x}; \
                 the file is corrupt or the cluster is of an unsupported version"
            );
        }

        Ok(ControlFileData {
            system_identifier: get_u64(buf, OFFSETOF_SYSTEM_IDENTIFIER),
            pg_control_version: get_u32(buf, OFFSETOF_PG_CONTROL_VERSION),
            checkpoint: Lsn(get_u64(buf, OFFSETOF_CHECKPOINT)),
            checkpoint_redo: Lsn(get_u64(buf, OFFSETOF_CHECKPOINT_REDO)),
            timeline_id: get_u32(buf, OFFSETOF_THIS_TIMELINE_ID),
            min_recovery_point: Lsn(get_u64(buf, OFFSETOF_MIN_RECOVERY_POINT)),
            min_recovery_point_tli: get_u32(buf, OFFSETOF_MIN_RECOVERY_POINT_TLI),
            blcksz: get_u32(buf, OFFSETOF_BLCKSZ),
            xlog_blcksz: get_u32(buf, OFFSETOF_XLOG_BLCKSZ),
            xlog_seg_size: get_u32(buf, OFFSETOF_XLOG_SEG_SIZE),
            data_checksum_version: get_u32(buf, OFFSETOF_DATA_CHECKSUM_VERSION),
            raw: buf[0..SIZEOF_CONTROLFILE_DATA].to_vec(),
        })
    }

    /// Produce a full-size control file image with a fresh CRC.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.raw.clone();
        buf.resize(SIZEOF_CONTROLFILE_DATA, 0);

        let put_u32 = |buf: &mut Vec<u8>, off: usize, v: u32| {
            buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
        };
        let put_u64 = |buf: &mut Vec<u8>, off: usize, v: u64| {
            buf[off..off + 8].copy_from_slice(&v.to_le_bytes());
        };

        put_u64(&mut buf, OFFSETOF_SYSTEM_IDENTIFIER, self.system_identifier);
        put_u32(&mut buf, OFFSETOF_PG_CONTROL_VERSION, self.pg_control_version);
        put_u64(&mut buf, OFFSETOF_CHECKPOINT, self.checkpoint.0);
        put_u64(&mut buf, OFFSETOF_CHECKPOINT_REDO, self.checkpoint_redo.0);
        put_u32(&mut buf, OFFSETOF_THIS_TIMELINE_ID, self.timeline_id);
        put_u64(&mut buf, OFFSETOF_MIN_RECOVERY_POINT, self.min_recovery_point.0);
        put_u32(
            &mut buf,
            OFFSETOF_MIN_RECOVERY_POINT_TLI,
            self.min_recovery_point_tli,
        );
        put_u32(&mut buf, OFFSETOF_BLCKSZ, self.blcksz);
        put_u32(&mut buf, OFFSETOF_XLOG_BLCKSZ, self.xlog_blcksz);
        put_u32(&mut buf, OFFSETOF_XLOG_SEG_SIZE, self.xlog_seg_size);
        put_u32(
            &mut buf,
            OFFSETOF_DATA_CHECKSUM_VERSION,
            self.data_checksum_version,
        );

        let crc = crc32c::crc32c(&buf[0..OFFSETOF_CRC]);
        put_u32(&mut buf, OFFSETOF_CRC, crc);

        buf.resize(PG_CONTROL_FILE_SIZE, 0);
        buf
    }

    /// A control file for a cluster that never existed. Tests and tools use
    /// this to synthesize data directories.
    pub fn new_synthetic(system_identifier: u64, timeline_id: TimeLineID, checksums: bool) -> Self {
        ControlFileData {
            system_identifier,
            pg_control_version: PG_CONTROL_VERSION,
            checkpoint: Lsn(0),
            checkpoint_redo: Lsn(0),
            timeline_id,
            min_recovery_point: Lsn(0),
            min_recovery_point_tli: 0,
            blcksz: crate::BLCKSZ as u32,
            xlog_blcksz: crate::XLOG_BLCKSZ as u32,
            xlog_seg_size: crate::WAL_SEGMENT_SIZE as u32,
            data_checksum_version: if checksums { 1 } else { 0 },
            raw: vec![0; SIZEOF_CONTROLFILE_DATA],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let mut cf = ControlFileData::new_synthetic(0xDEAD_BEEF_0123_4567, 3, true);
        cf.checkpoint = Lsn(0x1_0000_0028);
        cf.checkpoint_redo = Lsn(0x1_0000_0028);
        cf.min_recovery_point = Lsn(0x2_0000_0000);
        cf.min_recovery_point_tli = 3;

        let buf = cf.encode();
        assert_eq!(buf.len(), PG_CONTROL_FILE_SIZE);

        let decoded = ControlFileData::decode(&buf).unwrap();
        assert_eq!(decoded.system_identifier, 0xDEAD_BEEF_0123_4567);
        assert_eq!(decoded.timeline_id, 3);
        assert_eq!(decoded.checkpoint, Lsn(0x1_0000_0028));
        assert_eq!(decoded.min_recovery_point, Lsn(0x2_0000_0000));
        assert_eq!(decoded.data_checksum_version, 1);
    }

    #[test]
    fn corruption_detected() {
        let cf = ControlFileData::new_synthetic(1, 1, false);
        let mut buf = cf.encode();
        buf[OFFSETOF_CHECKPOINT] ^= 0xFF;
        assert!(ControlFileData::decode(&buf).is_err());
    }

    #[test]
    fn min_recovery_point_patch_keeps_rest() {
        let mut cf = ControlFileData::new_synthetic(99, 1, true);
        cf.checkpoint = Lsn(0x1000);
        let buf = cf.encode();

        let mut patched = ControlFileData::decode(&buf).unwrap();
        patched.min_recovery_point = Lsn(0x5000);
        patched.min_recovery_point_tli = 1;
        let buf2 = patched.encode();

        let redecoded = ControlFileData::decode(&buf2).unwrap();
        assert_eq!(redecoded.min_recovery_point, Lsn(0x5000));
        assert_eq!(redecoded.checkpoint, Lsn(0x1000));
        assert_eq!(redecoded.system_identifier, 99);
    }
}
