//! Physical backup and point-in-time restore engine for PostgreSQL clusters.
//!
//! The on-disk catalog keeps one directory per backup under
//! `<backup-root>/backups/<instance>/<id>/`, with a key=value control file,
//! a newline-delimited JSON file list, and the copied data-directory tree.
//! Data files are stored as block streams: per-block headers, optionally
//! compressed payloads, an explicit truncation marker. Incremental backups
//! (PAGE, PTRACK, DELTA) record only changed blocks and link to their parent
//! backup; restore replays the chain from the base FULL image forward.

pub mod backup;
pub mod block_stream;
pub mod catalog;
pub mod compress;
pub mod config;
pub mod datafile;
pub mod datapagemap;
pub mod delete;
pub mod inventory;
pub mod pagemap;
pub mod pg_client;
pub mod restore;
pub mod show;
pub mod validate;
pub mod wal_archive;
pub mod wal_stream;

/// Written into every backup's control file; readers use it to decide
/// whether legacy payload quirks may apply.
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a `major.minor.patch` version string the way the control files
/// store it, into a comparable number (2.0.23 -> 20023). Unparseable input
/// counts as "oldest possible".
pub fn parse_program_version(version: &str) -> u32 {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    major * 10000 + minor * 100 + patch
}

/// Producers below this version could store a raw page with
/// `compressed_size == BLCKSZ` while the payload was in fact compressed.
pub const LEGACY_COMPRESSED_PAGE_VERSION: u32 = 20023;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_version_parses() {
        assert_eq!(parse_program_version("2.0.23"), 20023);
        assert_eq!(parse_program_version("2.1.0"), 20100);
        assert_eq!(parse_program_version(""), 0);
        assert_eq!(parse_program_version("garbage"), 0);
        assert!(parse_program_version(PROGRAM_VERSION) >= LEGACY_COMPRESSED_PAGE_VERSION);
    }
}
