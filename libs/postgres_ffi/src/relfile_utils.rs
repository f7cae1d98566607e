//!
//! Common utilities for dealing with PostgreSQL relation files.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilePathError {
    #[error("invalid relation fork name")]
    InvalidForkName,
    #[error("invalid relation data file name")]
    InvalidFileName,
}

/// Relation forks, from relpath.h. The main fork has no suffix in the
/// filename.
pub const MAIN_FORKNUM: u8 = 0;
pub const FSM_FORKNUM: u8 = 1;
pub const VISIBILITYMAP_FORKNUM: u8 = 2;
pub const INIT_FORKNUM: u8 = 3;

/// Convert Postgres relation file's fork suffix to fork number.
pub fn forkname_to_number(forkname: Option<&str>) -> Result<u8, FilePathError> {
    match forkname {
        // "main" is not in filenames, but it is accepted in the fork name
        // column of the filelist
        Some("main") => Ok(MAIN_FORKNUM),
        Some("fsm") => Ok(FSM_FORKNUM),
        Some("vm") => Ok(VISIBILITYMAP_FORKNUM),
        Some("init") => Ok(INIT_FORKNUM),
        Some(_) => Err(FilePathError::InvalidForkName),
        None => Ok(MAIN_FORKNUM),
    }
}

/// Convert fork number to the right suffix of the relation data file.
pub fn forknumber_to_name(forknum: u8) -> Option<&'static str> {
    match forknum {
        MAIN_FORKNUM => None,
        FSM_FORKNUM => Some("fsm"),
        VISIBILITYMAP_FORKNUM => Some("vm"),
        INIT_FORKNUM => Some("init"),
        _ => Some("UNKNOWN FORKNUM"),
    }
}

///
/// Parse a filename of a relation file. Returns (relfilenode, forknum, segno)
/// tuple. The caller has already stripped the directory part.
///
/// Formats:
/// ```text
///      <oid>
///      <oid>_<fork name>
///      <oid>.<segment number>
///      <oid>_<fork name>.<segment number>
/// ```
pub fn parse_relfilename(fname: &str) -> Result<(u32, u8, u32), FilePathError> {
    let (rel_part, segno) = match fname.split_once('.') {
        Some((rel_part, segno_str)) => {
            // Postgres never writes a ".0" suffix for the first segment, so
            // don't accept one.
            let segno: u32 = segno_str.parse().or(Err(FilePathError::InvalidFileName))?;
            if segno == 0 {
                return Err(FilePathError::InvalidFileName);
            }
            (rel_part, segno)
        }
        None => (fname, 0),
    };

    let (relnode_str, forkname) = match rel_part.split_once('_') {
        Some((relnode_str, forkname)) => (relnode_str, Some(forkname)),
        None => (rel_part, None),
    };

    let relnode: u32 = relnode_str
        .parse()
        .or(Err(FilePathError::InvalidFileName))?;

    // Exclude things like pg_internal.init and pg_filenode.map early: their
    // prefix is not numeric so the parse above already failed. "t"-prefixed
    // temp relations do not parse either, which is what we want.
    let forknum = forkname_to_number(forkname).or(Err(FilePathError::InvalidFileName))?;

    Ok((relnode, forknum, segno))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_main_fork() {
        assert_eq!(parse_relfilename("16384"), Ok((16384, MAIN_FORKNUM, 0)));
        assert_eq!(parse_relfilename("16384.1"), Ok((16384, MAIN_FORKNUM, 1)));
        assert_eq!(
            parse_relfilename("16384.123"),
            Ok((16384, MAIN_FORKNUM, 123))
        );
    }

    #[test]
    fn parse_other_forks() {
        assert_eq!(parse_relfilename("16384_fsm"), Ok((16384, FSM_FORKNUM, 0)));
        assert_eq!(
            parse_relfilename("16384_vm.2"),
            Ok((16384, VISIBILITYMAP_FORKNUM, 2))
        );
        assert_eq!(
            parse_relfilename("16384_init"),
            Ok((16384, INIT_FORKNUM, 0))
        );
    }

    #[test]
    fn reject_non_relation_files() {
        assert!(parse_relfilename("pg_filenode.map").is_err());
        assert!(parse_relfilename("pg_internal.init").is_err());
        assert!(parse_relfilename("PG_VERSION").is_err());
        assert!(parse_relfilename("t1_16400").is_err());
        assert!(parse_relfilename("16384_foo").is_err());
        assert!(parse_relfilename("16384.0").is_err());
        assert!(parse_relfilename("16384._fsm").is_err());
    }
}
