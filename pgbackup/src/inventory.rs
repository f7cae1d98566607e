//! Data-directory inventory: walk PGDATA (and external directories),
//! classify every entry, and produce the shared file list the copy workers
//! claim their work from.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use postgres_ffi::pg_constants::{
    DEFAULTTABLESPACE_OID, GLOBALTABLESPACE_OID, PG_BASE_DIR, PG_GLOBAL_DIR, PG_TBLSPC_DIR,
};
use postgres_ffi::relfile_utils::{parse_relfilename, INIT_FORKNUM, MAIN_FORKNUM};

use crate::catalog::{FileListEntry, BYTES_INVALID};
use crate::compress::CompressAlg;
use crate::datapagemap::DataPageMap;

/// Directories whose *contents* are skipped; the directory itself is kept so
/// restore recreates it. Runtime state the server rebuilds by itself.
const EXCLUDED_DIR_CONTENTS: &[&str] = &[
    "pg_wal",
    "pg_xlog",
    "pg_log",
    "log",
    "pg_stat_tmp",
    "pg_replslot",
    "pg_dynshmem",
    "pg_notify",
    "pg_serial",
    "pg_snapshots",
    "pg_subtrans",
];

/// Files never worth archiving.
const EXCLUDED_FILES: &[&str] = &[
    "pg_internal.init",
    "postmaster.pid",
    "postmaster.opts",
    "recovery.conf",
    "recovery.signal",
    "standby.signal",
];

/// Temp-table and temp-sort spill directories.
const PGSQL_TMP_PREFIX: &str = "pgsql_tmp";

/// The compressed-tablespace marker file.
const CFS_MARKER: &str = "pg_compression";

/// Fewer entries than this in a data directory means we are looking at a
/// permissions problem or a concurrent deletion, not a real cluster.
pub const DATADIR_MIN_FILES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Dir,
    Reg,
    Symlink { target: Utf8PathBuf },
}

/// Where the bytes of a file ended up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteState {
    /// Not processed (directories, symlinks, or work not yet done).
    #[default]
    Pending,
    /// Vanished between inventory and copy; pruned from the final list.
    NotFound,
    /// Unchanged since the parent backup; restore takes it from there.
    CarriedOver,
    Written(u64),
}

#[derive(Debug, Clone, Default)]
pub struct FileBackupResult {
    pub state: WriteState,
    pub read_size: u64,
    pub crc: u32,
    pub compress_alg: CompressAlg,
    /// Source block count, recorded so restore can truncate.
    pub n_blocks: Option<u32>,
}

/// One inventory entry. Classification fields are set before the worker
/// pool starts; afterwards the entry is shared read-only except for the
/// claim flag and the result.
#[derive(Debug)]
pub struct PgFile {
    /// Path relative to PGDATA, or to the external directory of
    /// `external_dir_num`.
    pub rel_path: Utf8PathBuf,
    pub kind: FileKind,
    /// Full st_mode of the source entry.
    pub mode: u32,
    pub size: u64,
    /// mtime in unix seconds, for the carried-over check.
    pub mtime: i64,
    pub is_datafile: bool,
    pub is_cfs: bool,
    pub tblspc_oid: u32,
    pub db_oid: u32,
    pub rel_oid: u32,
    pub forknum: Option<u8>,
    pub segno: u32,
    /// 0 means "inside the data directory".
    pub external_dir_num: usize,
    pub exists_in_prev: bool,
    pub pagemap: Option<DataPageMap>,
    /// Bitmap unknown; fall back to copying every block.
    pub pagemap_isabsent: bool,
    pub claim: AtomicBool,
    pub result: Mutex<FileBackupResult>,
}

impl PgFile {
    fn new(rel_path: Utf8PathBuf, kind: FileKind, mode: u32, size: u64, mtime: i64) -> PgFile {
        PgFile {
            rel_path,
            kind,
            mode,
            size,
            mtime,
            is_datafile: false,
            is_cfs: false,
            tblspc_oid: 0,
            db_oid: 0,
            rel_oid: 0,
            forknum: None,
            segno: 0,
            external_dir_num: 0,
            exists_in_prev: false,
            pagemap: None,
            pagemap_isabsent: false,
            claim: AtomicBool::new(false),
            result: Mutex::new(FileBackupResult::default()),
        }
    }

    /// An entry for a file the backup itself produced (stop-marker blobs,
    /// streamed WAL segments): regular file, backup-private permissions.
    pub fn synthetic_reg(rel_path: Utf8PathBuf, size: u64) -> PgFile {
        PgFile::new(rel_path, FileKind::Reg, 0o100600, size, 0)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, FileKind::Dir)
    }

    pub fn is_reg(&self) -> bool {
        matches!(self.kind, FileKind::Reg)
    }

    pub fn file_name(&self) -> &str {
        self.rel_path.file_name().unwrap_or(self.rel_path.as_str())
    }

    /// Atomically claim this entry for processing. Exactly one caller wins.
    pub fn try_claim(&self) -> bool {
        self.claim
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Convert to the durable file-list representation. `None` for entries
    /// that vanished during the backup.
    pub fn to_filelist_entry(&self) -> Option<FileListEntry> {
        let result = self.result.lock().unwrap();
        let size = match result.state {
            WriteState::NotFound => return None,
            WriteState::Pending | WriteState::CarriedOver => BYTES_INVALID,
            WriteState::Written(n) => n as i64,
        };
        Some(FileListEntry {
            path: self.rel_path.as_str().to_owned(),
            size,
            mode: self.mode,
            is_datafile: self.is_datafile,
            is_cfs: self.is_cfs,
            crc: result.crc,
            compress_alg: result.compress_alg,
            external_dir_num: self.external_dir_num,
            segno: self.is_datafile.then_some(self.segno),
            linked: match &self.kind {
                FileKind::Symlink { target } => Some(target.as_str().to_owned()),
                _ => None,
            },
            n_blocks: result.n_blocks,
        })
    }
}

/// None when the entry vanished between the walk and the stat, which is
/// routine on a live cluster.
fn entry_metadata(path: &Utf8Path) -> Result<Option<(u32, u64, i64)>> {
    use std::os::unix::fs::MetadataExt;
    let md = match std::fs::symlink_metadata(path) {
        Ok(md) => md,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context(format!("cannot stat \"{path}\"")),
    };
    let mtime = md
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    Ok(Some((md.mode(), md.len(), mtime)))
}

/// Walk one filesystem tree, appending entries with logical paths under
/// `logical_prefix`.
fn walk_tree(
    fs_root: &Utf8Path,
    logical_prefix: &Utf8Path,
    external_dir_num: usize,
    out: &mut Vec<PgFile>,
) -> Result<()> {
    let walker = WalkDir::new(fs_root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    let mut it = walker.into_iter();
    while let Some(entry) = it.next() {
        let entry = match entry {
            Ok(entry) => entry,
            // Concurrent deletion mid-walk is routine on a live cluster.
            Err(e) if e.io_error().map(|io| io.kind()) == Some(std::io::ErrorKind::NotFound) => {
                continue;
            }
            Err(e) => return Err(e).context("walk data directory"),
        };
        let path = Utf8Path::from_path(entry.path())
            .with_context(|| format!("non-UTF8 path {:?}", entry.path()))?;
        let rel = path.strip_prefix(fs_root).expect("walkdir stays under root");
        let logical = logical_prefix.join(rel);
        let name = logical.file_name().unwrap_or_default();

        let ftype = entry.file_type();
        if ftype.is_dir() {
            if name.starts_with(PGSQL_TMP_PREFIX) {
                it.skip_current_dir();
                continue;
            }
            let Some((mode, size, mtime)) = entry_metadata(path)? else {
                it.skip_current_dir();
                continue;
            };
            out.push(PgFile::new(logical.clone(), FileKind::Dir, mode, size, mtime));
            if external_dir_num == 0 && EXCLUDED_DIR_CONTENTS.contains(&name) {
                debug!("excluding contents of \"{logical}\"");
                it.skip_current_dir();
            }
            continue;
        }

        if ftype.is_symlink() {
            let target = std::fs::read_link(path)
                .with_context(|| format!("cannot read symlink \"{path}\""))?;
            let target = Utf8PathBuf::from_path_buf(target)
                .map_err(|p| anyhow::anyhow!("non-UTF8 symlink target {p:?}"))?;
            let Some((mode, size, mtime)) = entry_metadata(path)? else {
                continue;
            };
            out.push(PgFile::new(
                logical.clone(),
                FileKind::Symlink { target: target.clone() },
                mode,
                size,
                mtime,
            ));
            // Tablespace links get their target tree walked under the
            // pg_tblspc/<oid>/ logical namespace.
            if external_dir_num == 0 && logical.parent() == Some(Utf8Path::new(PG_TBLSPC_DIR)) {
                let resolved = if target.is_absolute() {
                    target
                } else {
                    fs_root.join(logical.parent().unwrap()).join(target)
                };
                walk_tree(&resolved, &logical, 0, out)?;
            }
            continue;
        }

        if ftype.is_file() {
            if external_dir_num == 0 && EXCLUDED_FILES.contains(&name) {
                continue;
            }
            let Some((mode, size, mtime)) = entry_metadata(path)? else {
                continue;
            };
            let mut file = PgFile::new(logical, FileKind::Reg, mode, size, mtime);
            file.external_dir_num = external_dir_num;
            if external_dir_num == 0 {
                classify_relation_file(&mut file);
            }
            out.push(file);
        }
    }
    Ok(())
}

/// Parse a logical path of the form `global/...`, `base/<db>/...` or
/// `pg_tblspc/<spc>/<version>/<db>/...` and fill the relation fields.
fn classify_relation_file(file: &mut PgFile) {
    let components: Vec<&str> = file.rel_path.as_str().split('/').collect();
    let (tblspc, db, fname) = match components.as_slice() {
        [PG_GLOBAL_DIR, fname] => (GLOBALTABLESPACE_OID, 0, fname),
        [PG_BASE_DIR, db, fname] => {
            let Ok(db) = db.parse() else { return };
            (DEFAULTTABLESPACE_OID, db, fname)
        }
        [PG_TBLSPC_DIR, spc, _version, db, fname] => {
            let (Ok(spc), Ok(db)) = (spc.parse(), db.parse()) else {
                return;
            };
            (spc, db, fname)
        }
        _ => return,
    };

    let Ok((rel_oid, forknum, segno)) = parse_relfilename(fname) else {
        return;
    };
    file.tblspc_oid = tblspc;
    file.db_oid = db;
    file.rel_oid = rel_oid;
    file.forknum = Some(forknum);
    file.segno = segno;
    // Only the main fork has page structure worth block-level treatment;
    // fsm/vm/init travel as whole files.
    file.is_datafile = forknum == MAIN_FORKNUM;
}

/// Post-walk fixups mirroring what the path grammar alone cannot express.
fn apply_special_rules(files: &mut Vec<PgFile>) {
    // Compressed tablespaces: a directory containing `pg_compression` holds
    // opaque files; the page codec must not touch them.
    let cfs_prefixes: Vec<Utf8PathBuf> = files
        .iter()
        .filter(|f| f.is_reg() && f.file_name() == CFS_MARKER)
        .filter_map(|f| f.rel_path.parent().map(|p| p.to_owned()))
        .collect();
    if !cfs_prefixes.is_empty() {
        for file in files.iter_mut() {
            if file.is_datafile && cfs_prefixes.iter().any(|p| file.rel_path.starts_with(p)) {
                debug!("marking \"{}\" as part of a compressed tablespace", file.rel_path);
                file.is_cfs = true;
            }
        }
    }

    // Unlogged relations: an init fork means every other fork of that
    // relation is transient and must not be archived.
    let unlogged: Vec<(u32, u32, u32)> = files
        .iter()
        .filter(|f| f.forknum == Some(INIT_FORKNUM))
        .map(|f| (f.tblspc_oid, f.db_oid, f.rel_oid))
        .collect();
    if !unlogged.is_empty() {
        files.retain(|f| {
            f.forknum.is_none()
                || f.forknum == Some(INIT_FORKNUM)
                || !unlogged.contains(&(f.tblspc_oid, f.db_oid, f.rel_oid))
        });
    }
}

/// Inventory of the data directory: classified, cleaned of unlogged
/// relations, sorted by path for directory-creation order.
pub fn list_data_directory(pgdata: &Utf8Path) -> Result<Vec<PgFile>> {
    let mut files = Vec::new();
    walk_tree(pgdata, Utf8Path::new(""), 0, &mut files)?;
    sort_by_path(&mut files);
    apply_special_rules(&mut files);
    Ok(files)
}

/// Inventory of one external directory, slot numbers starting at 1.
pub fn list_external_directory(path: &Utf8Path, dir_num: usize) -> Result<Vec<PgFile>> {
    let mut files = Vec::new();
    walk_tree(path, Utf8Path::new(""), dir_num, &mut files)?;
    for f in &mut files {
        f.external_dir_num = dir_num;
    }
    sort_by_path(&mut files);
    Ok(files)
}

/// Path-ascending order: parents sort before children, so directories can
/// be created sequentially.
pub fn sort_by_path(files: &mut [PgFile]) {
    files.sort_by(|a, b| {
        (a.external_dir_num, &a.rel_path).cmp(&(b.external_dir_num, &b.rel_path))
    });
}

/// Largest files first, for worker-pool balance.
pub fn sort_by_size_desc(files: &mut [PgFile]) {
    files.sort_by(|a, b| b.size.cmp(&a.size));
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use std::fs;

    fn touch(path: &Utf8Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn find<'a>(files: &'a [PgFile], rel: &str) -> Option<&'a PgFile> {
        files.iter().find(|f| f.rel_path == rel)
    }

    #[test]
    fn classify_and_sort() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("PG_VERSION"), b"11\n");
        touch(&root.join("global/pg_control"), &[0u8; 8192]);
        touch(&root.join("global/1262"), b"");
        touch(&root.join("base/13010/PG_VERSION"), b"11\n");
        touch(&root.join("base/13010/16384"), &[0u8; 16384]);
        touch(&root.join("base/13010/16384_fsm"), &[0u8; 8192]);
        touch(&root.join("base/13010/16384.1"), &[0u8; 8192]);
        touch(&root.join("base/13010/pg_filenode.map"), b"map");
        fs::create_dir_all(root.join("pg_wal")).unwrap();
        touch(&root.join("pg_wal/000000010000000000000001"), b"wal");
        touch(&root.join("postmaster.pid"), b"1234");

        let files = list_data_directory(root).unwrap();

        let rel = find(&files, "base/13010/16384").unwrap();
        assert!(rel.is_datafile);
        assert_eq!(rel.rel_oid, 16384);
        assert_eq!(rel.db_oid, 13010);
        assert_eq!(rel.tblspc_oid, DEFAULTTABLESPACE_OID);
        assert_eq!(rel.segno, 0);

        let seg1 = find(&files, "base/13010/16384.1").unwrap();
        assert!(seg1.is_datafile);
        assert_eq!(seg1.segno, 1);

        let fsm = find(&files, "base/13010/16384_fsm").unwrap();
        assert!(!fsm.is_datafile);

        let global_rel = find(&files, "global/1262").unwrap();
        assert_eq!(global_rel.tblspc_oid, GLOBALTABLESPACE_OID);
        assert!(global_rel.is_datafile);

        let control = find(&files, "global/pg_control").unwrap();
        assert!(!control.is_datafile);

        assert!(find(&files, "base/13010/pg_filenode.map").is_some());
        assert!(!find(&files, "base/13010/pg_filenode.map").unwrap().is_datafile);

        // pg_wal contents and the pid file are excluded, the dir survives
        assert!(find(&files, "pg_wal").is_some());
        assert!(find(&files, "pg_wal/000000010000000000000001").is_none());
        assert!(find(&files, "postmaster.pid").is_none());

        // path-sorted: base dir precedes its children
        let base_idx = files.iter().position(|f| f.rel_path == "base").unwrap();
        let child_idx = files
            .iter()
            .position(|f| f.rel_path == "base/13010/16384")
            .unwrap();
        assert!(base_idx < child_idx);
    }

    #[test]
    fn unlogged_relations_are_dropped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("base/5/777"), &[0u8; 8192]);
        touch(&root.join("base/5/777_init"), &[0u8; 8192]);
        touch(&root.join("base/5/777_fsm"), &[0u8; 8192]);
        touch(&root.join("base/5/777.1"), &[0u8; 8192]);
        touch(&root.join("base/5/778"), &[0u8; 8192]);

        let files = list_data_directory(root).unwrap();
        assert!(find(&files, "base/5/777").is_none());
        assert!(find(&files, "base/5/777_fsm").is_none());
        assert!(find(&files, "base/5/777.1").is_none());
        assert!(find(&files, "base/5/777_init").is_some());
        assert!(find(&files, "base/5/778").is_some());
    }

    #[test]
    fn cfs_tablespace_marks_files_opaque() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let tblspc = dir.path().join("tblspc_target");
        touch(&tblspc.join("PG_11_201809051/55/9999"), &[0u8; 8192]);
        touch(&tblspc.join("PG_11_201809051/pg_compression"), b"");
        fs::create_dir_all(root.join(PG_TBLSPC_DIR)).unwrap();
        std::os::unix::fs::symlink(&tblspc, root.join("pg_tblspc/16500")).unwrap();
        // something normal too
        touch(&root.join("base/5/111"), &[0u8; 8192]);

        let files = list_data_directory(root).unwrap();

        let link = find(&files, "pg_tblspc/16500").unwrap();
        assert!(matches!(link.kind, FileKind::Symlink { .. }));

        let cfs_file = find(&files, "pg_tblspc/16500/PG_11_201809051/55/9999").unwrap();
        assert!(cfs_file.is_datafile);
        assert!(cfs_file.is_cfs);
        assert_eq!(cfs_file.tblspc_oid, 16500);
        assert_eq!(cfs_file.db_oid, 55);

        let normal = find(&files, "base/5/111").unwrap();
        assert!(!normal.is_cfs);
    }

    #[test]
    fn claim_is_exclusive() {
        let file = PgFile::new(Utf8PathBuf::from("x"), FileKind::Reg, 0o100600, 0, 0);
        assert!(file.try_claim());
        assert!(!file.try_claim());
    }
}
