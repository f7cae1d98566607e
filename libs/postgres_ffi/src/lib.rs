//! Rust re-implementations of the small parts of PostgreSQL internals that a
//! physical backup tool has to understand: data page layout and checksums,
//! relation file naming, WAL segment naming and record framing, the control
//! file, and the PGLZ compression method.
//!
//! Many functions in this crate have been copied from PostgreSQL and
//! rewritten in Rust. Where it helps cross-referencing, they keep the
//! PostgreSQL names instead of the usual Rust conventions.

pub mod controlfile_utils;
pub mod page;
pub mod pg_constants;
pub mod pglz;
pub mod relfile_utils;
pub mod waldecoder;
pub mod xlog_utils;

/// Size of a data page or a WAL block, in bytes.
pub const BLCKSZ: u16 = 8192;
pub const XLOG_BLCKSZ: usize = 8192;

/// Number of blocks in one relation segment file.
pub const RELSEG_SIZE: u32 = 1024 * 1024 * 1024 / (BLCKSZ as u32);

/// Default WAL segment size. The actual value for a cluster is recorded in
/// its control file; all functions that need it take it as a parameter.
pub const WAL_SEGMENT_SIZE: usize = 16 * 1024 * 1024;

pub const MAXIMUM_ALIGNOF: u32 = 8;

/// Align the argument the way PostgreSQL's MAXALIGN does.
pub const fn maxalign(len: u32) -> u32 {
    (len + MAXIMUM_ALIGNOF - 1) & !(MAXIMUM_ALIGNOF - 1)
}

pub type Oid = u32;
pub type TransactionId = u32;
pub type BlockNumber = u32;
pub type TimeLineID = u32;
pub type XLogSegNo = u64;
pub type TimestampTz = i64;

pub use xlog_utils::{IsPartialXLogFileName, IsXLogFileName, XLogFileName, XLogFromFileName};
