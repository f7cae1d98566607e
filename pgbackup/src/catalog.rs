//! Backup catalog: the on-disk registry of backups for an instance.
//!
//! Layout:
//! ```text
//! <backup-root>/backups/<instance>/<id>/backup.control          key=value metadata
//! <backup-root>/backups/<instance>/<id>/backup_content.control  one JSON object per file
//! <backup-root>/backups/<instance>/<id>/database/...            copied data directory
//! <backup-root>/backups/<instance>/<id>/external_directories/externaldir{N}/...
//! <backup-root>/backups/<instance>/<id>/backup.pid              exclusive lock
//! <backup-root>/wal/<instance>/...                              WAL archive
//! ```
//!
//! A backup's identifier is its start timestamp rendered in base 36, which
//! is also its directory name. Control files are always published with a
//! write-to-temp-and-rename so readers never observe a half-written file.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, ensure, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utils::crashsafe;
use utils::lock_file::{lock_pid_file, LockFileGuard, LockResult};
use utils::lsn::Lsn;

use postgres_ffi::{TimeLineID, BLCKSZ, XLOG_BLCKSZ};

use crate::compress::CompressAlg;

pub const BACKUPS_DIR: &str = "backups";
pub const WAL_DIR: &str = "wal";
pub const DATABASE_DIR: &str = "database";
pub const EXTERNAL_DIR: &str = "external_directories";
pub const BACKUP_CONTROL_FILE: &str = "backup.control";
pub const DATABASE_FILE_LIST: &str = "backup_content.control";
pub const BACKUP_PID_FILE: &str = "backup.pid";
pub const PG_XLOG_DIR: &str = "pg_wal";
pub const INSTANCE_CONFIG_FILE: &str = "pgbackup.toml";

/// Sentinel for `FileListEntry::size`: the payload lives in an ancestor
/// backup (unchanged file, carried over).
pub const BYTES_INVALID: i64 = -1;

const BASE36_DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Backup identifier: the session start time, in unix seconds. Rendered in
/// base 36, which is also the backup's directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupId(pub i64);

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0 as u64;
        let mut digits = [0u8; 14];
        let mut i = digits.len();
        loop {
            i -= 1;
            digits[i] = BASE36_DIGITS[(value % 36) as usize];
            value /= 36;
            if value == 0 {
                break;
            }
        }
        f.write_str(std::str::from_utf8(&digits[i..]).unwrap())
    }
}

impl FromStr for BackupId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ensure!(!s.is_empty() && s.len() <= 13, "invalid backup ID {s:?}");
        let mut value: u64 = 0;
        for c in s.bytes() {
            let digit = match c {
                b'0'..=b'9' => c - b'0',
                b'A'..=b'Z' => c - b'A' + 10,
                b'a'..=b'z' => c - b'a' + 10,
                _ => bail!("invalid backup ID {s:?}"),
            };
            value = value
                .checked_mul(36)
                .and_then(|v| v.checked_add(digit as u64))
                .with_context(|| format!("backup ID {s:?} out of range"))?;
        }
        Ok(BackupId(value as i64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupMode {
    Full,
    Page,
    Ptrack,
    Delta,
}

impl BackupMode {
    pub fn is_incremental(self) -> bool {
        self != BackupMode::Full
    }
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackupMode::Full => "FULL",
            BackupMode::Page => "PAGE",
            BackupMode::Ptrack => "PTRACK",
            BackupMode::Delta => "DELTA",
        };
        f.write_str(s)
    }
}

impl FromStr for BackupMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FULL" => Ok(BackupMode::Full),
            "PAGE" => Ok(BackupMode::Page),
            "PTRACK" => Ok(BackupMode::Ptrack),
            "DELTA" => Ok(BackupMode::Delta),
            _ => bail!("invalid backup-mode {s:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    Invalid,
    Ok,
    Error,
    Running,
    Merging,
    Deleting,
    Deleted,
    Done,
    Orphan,
    Corrupt,
}

impl BackupStatus {
    /// A backup in this state can serve as a restore source or an
    /// incremental parent.
    pub fn is_complete(self) -> bool {
        matches!(self, BackupStatus::Ok | BackupStatus::Done)
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackupStatus::Invalid => "INVALID",
            BackupStatus::Ok => "OK",
            BackupStatus::Error => "ERROR",
            BackupStatus::Running => "RUNNING",
            BackupStatus::Merging => "MERGING",
            BackupStatus::Deleting => "DELETING",
            BackupStatus::Deleted => "DELETED",
            BackupStatus::Done => "DONE",
            BackupStatus::Orphan => "ORPHAN",
            BackupStatus::Corrupt => "CORRUPT",
        };
        f.write_str(s)
    }
}

impl FromStr for BackupStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "INVALID" => Ok(BackupStatus::Invalid),
            "OK" => Ok(BackupStatus::Ok),
            "ERROR" => Ok(BackupStatus::Error),
            "RUNNING" => Ok(BackupStatus::Running),
            "MERGING" => Ok(BackupStatus::Merging),
            "DELETING" => Ok(BackupStatus::Deleting),
            "DELETED" => Ok(BackupStatus::Deleted),
            "DONE" => Ok(BackupStatus::Done),
            "ORPHAN" => Ok(BackupStatus::Orphan),
            "CORRUPT" => Ok(BackupStatus::Corrupt),
            _ => bail!("invalid backup status {s:?}"),
        }
    }
}

/// Durable metadata of one backup, stored in `backup.control`.
#[derive(Debug, Clone)]
pub struct Backup {
    /// Equals the start time; equals the directory basename.
    pub id: BackupId,
    pub mode: BackupMode,
    pub status: BackupStatus,
    pub tli: TimeLineID,
    pub start_lsn: Lsn,
    pub stop_lsn: Lsn,
    pub merge_time: Option<i64>,
    pub end_time: Option<i64>,
    pub recovery_xid: u64,
    pub recovery_time: Option<i64>,
    pub data_bytes: Option<u64>,
    pub wal_bytes: Option<u64>,
    pub compress_alg: CompressAlg,
    pub compress_level: u32,
    pub block_size: u32,
    pub wal_block_size: u32,
    pub checksum_version: u32,
    pub stream: bool,
    pub from_replica: bool,
    /// Non-null iff mode is not FULL.
    pub parent: Option<BackupId>,
    pub program_version: String,
    pub server_version: String,
    pub primary_conninfo: Option<String>,
    pub external_dir_str: Option<String>,
}

impl Backup {
    pub fn new(id: BackupId, mode: BackupMode) -> Backup {
        Backup {
            id,
            mode,
            status: BackupStatus::Invalid,
            tli: 0,
            start_lsn: Lsn::INVALID,
            stop_lsn: Lsn::INVALID,
            merge_time: None,
            end_time: None,
            recovery_xid: 0,
            recovery_time: None,
            data_bytes: None,
            wal_bytes: None,
            compress_alg: CompressAlg::None,
            compress_level: 1,
            block_size: BLCKSZ as u32,
            wal_block_size: XLOG_BLCKSZ as u32,
            checksum_version: 0,
            stream: false,
            from_replica: false,
            parent: None,
            program_version: crate::PROGRAM_VERSION.to_owned(),
            server_version: String::new(),
            primary_conninfo: None,
            external_dir_str: None,
        }
    }

    pub fn start_time(&self) -> i64 {
        self.id.0
    }
}

fn format_time(unix_secs: i64) -> String {
    let dt: DateTime<Utc> = Utc.timestamp_opt(unix_secs, 0).unwrap();
    dt.format("'%Y-%m-%d %H:%M:%S%z'").to_string()
}

fn parse_time(value: &str) -> Result<i64> {
    let dt = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z")
        .with_context(|| format!("invalid timestamp {value:?}"))?;
    Ok(dt.timestamp())
}

/// Render `backup.control`, key groups and order matching what every
/// released version wrote.
pub fn serialize_backup_control(backup: &Backup) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    writeln!(out, "#Configuration").unwrap();
    writeln!(out, "backup-mode = {}", backup.mode).unwrap();
    writeln!(out, "stream = {}", backup.stream).unwrap();
    writeln!(out, "compress-alg = {}", backup.compress_alg).unwrap();
    writeln!(out, "compress-level = {}", backup.compress_level).unwrap();
    writeln!(out, "from-replica = {}", backup.from_replica).unwrap();

    writeln!(out, "\n#Compatibility").unwrap();
    writeln!(out, "block-size = {}", backup.block_size).unwrap();
    writeln!(out, "xlog-block-size = {}", backup.wal_block_size).unwrap();
    writeln!(out, "checksum-version = {}", backup.checksum_version).unwrap();
    if !backup.program_version.is_empty() {
        writeln!(out, "program-version = {}", backup.program_version).unwrap();
    }
    if !backup.server_version.is_empty() {
        writeln!(out, "server-version = {}", backup.server_version).unwrap();
    }

    writeln!(out, "\n#Result backup info").unwrap();
    writeln!(out, "timelineid = {}", backup.tli).unwrap();
    writeln!(out, "start-lsn = {}", backup.start_lsn).unwrap();
    writeln!(out, "stop-lsn = {}", backup.stop_lsn).unwrap();
    writeln!(out, "start-time = {}", format_time(backup.start_time())).unwrap();
    if let Some(t) = backup.merge_time {
        writeln!(out, "merge-time = {}", format_time(t)).unwrap();
    }
    if let Some(t) = backup.end_time {
        writeln!(out, "end-time = {}", format_time(t)).unwrap();
    }
    writeln!(out, "recovery-xid = {}", backup.recovery_xid).unwrap();
    if let Some(t) = backup.recovery_time {
        writeln!(out, "recovery-time = {}", format_time(t)).unwrap();
    }
    if let Some(bytes) = backup.data_bytes {
        writeln!(out, "data-bytes = {bytes}").unwrap();
    }
    if let Some(bytes) = backup.wal_bytes {
        writeln!(out, "wal-bytes = {bytes}").unwrap();
    }
    writeln!(out, "status = {}", backup.status).unwrap();
    if let Some(parent) = backup.parent {
        writeln!(out, "parent-backup-id = '{parent}'").unwrap();
    }
    if let Some(conninfo) = &backup.primary_conninfo {
        writeln!(out, "primary_conninfo = '{conninfo}'").unwrap();
    }
    if let Some(dirs) = &backup.external_dir_str {
        writeln!(out, "external-dirs = '{dirs}'").unwrap();
    }
    out
}

/// Parse `backup.control`. `id` comes from the directory name; a mismatch
/// with the recorded start time is reported but not fatal.
pub fn deserialize_backup_control(id: BackupId, content: &str) -> Result<Backup> {
    let mut pairs: HashMap<&str, &str> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .with_context(|| format!("malformed control line {line:?}"))?;
        let value = value.trim().trim_matches('\'');
        pairs.insert(key.trim(), value);
    }

    let get = |key: &str| pairs.get(key).copied();
    let mode: BackupMode = get("backup-mode")
        .context("control file misses backup-mode")?
        .parse()?;

    let mut backup = Backup::new(id, mode);
    if let Some(v) = get("status") {
        backup.status = v.parse()?;
    }
    if let Some(v) = get("timelineid") {
        backup.tli = v.parse().context("invalid timelineid")?;
    }
    if let Some(v) = get("start-lsn") {
        backup.start_lsn = v.parse().map_err(|_| anyhow::anyhow!("invalid START_LSN {v:?}"))?;
    }
    if let Some(v) = get("stop-lsn") {
        backup.stop_lsn = v.parse().map_err(|_| anyhow::anyhow!("invalid STOP_LSN {v:?}"))?;
    }
    if let Some(v) = get("start-time") {
        let start_time = parse_time(v)?;
        if start_time != id.0 {
            warn!(
                "backup ID in control file ({}) does not match the backup directory name ({id})",
                BackupId(start_time)
            );
        }
    }
    if let Some(v) = get("merge-time") {
        backup.merge_time = Some(parse_time(v)?);
    }
    if let Some(v) = get("end-time") {
        backup.end_time = Some(parse_time(v)?);
    }
    if let Some(v) = get("recovery-time") {
        backup.recovery_time = Some(parse_time(v)?);
    }
    if let Some(v) = get("recovery-xid") {
        backup.recovery_xid = v.parse().context("invalid recovery-xid")?;
    }
    if let Some(v) = get("data-bytes") {
        backup.data_bytes = Some(v.parse().context("invalid data-bytes")?);
    }
    if let Some(v) = get("wal-bytes") {
        backup.wal_bytes = Some(v.parse().context("invalid wal-bytes")?);
    }
    if let Some(v) = get("block-size") {
        backup.block_size = v.parse().context("invalid block-size")?;
    }
    if let Some(v) = get("xlog-block-size") {
        backup.wal_block_size = v.parse().context("invalid xlog-block-size")?;
    }
    if let Some(v) = get("checksum-version") {
        backup.checksum_version = v.parse().context("invalid checksum-version")?;
    }
    if let Some(v) = get("compress-alg") {
        backup.compress_alg = v.parse()?;
    }
    if let Some(v) = get("compress-level") {
        backup.compress_level = v.parse().context("invalid compress-level")?;
    }
    if let Some(v) = get("stream") {
        backup.stream = v.parse().context("invalid stream flag")?;
    }
    if let Some(v) = get("from-replica") {
        backup.from_replica = v.parse().context("invalid from-replica flag")?;
    }
    if let Some(v) = get("parent-backup-id") {
        backup.parent = Some(v.parse()?);
    }
    if let Some(v) = get("program-version") {
        backup.program_version = v.to_owned();
    }
    if let Some(v) = get("server-version") {
        backup.server_version = v.to_owned();
    }
    if let Some(v) = get("primary_conninfo") {
        backup.primary_conninfo = Some(v.to_owned());
    }
    if let Some(v) = get("external-dirs") {
        backup.external_dir_str = Some(v.to_owned());
    }
    Ok(backup)
}

/// One line of `backup_content.control`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListEntry {
    pub path: String,
    /// Bytes written into the backup; [`BYTES_INVALID`] for a file carried
    /// over from an ancestor.
    pub size: i64,
    /// Full st_mode, type bits included.
    pub mode: u32,
    pub is_datafile: bool,
    pub is_cfs: bool,
    pub crc: u32,
    pub compress_alg: CompressAlg,
    pub external_dir_num: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub segno: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub linked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub n_blocks: Option<u32>,
}

impl FileListEntry {
    pub fn is_dir(&self) -> bool {
        self.mode & 0o170000 == 0o040000
    }

    pub fn is_symlink(&self) -> bool {
        self.mode & 0o170000 == 0o120000
    }

    pub fn is_reg(&self) -> bool {
        self.mode & 0o170000 == 0o100000
    }

    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Access to one instance's slice of the backup root.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub backup_root: Utf8PathBuf,
    pub instance: String,
}

impl Catalog {
    pub fn new(backup_root: impl Into<Utf8PathBuf>, instance: impl Into<String>) -> Catalog {
        Catalog {
            backup_root: backup_root.into(),
            instance: instance.into(),
        }
    }

    pub fn instance_backup_path(&self) -> Utf8PathBuf {
        self.backup_root.join(BACKUPS_DIR).join(&self.instance)
    }

    pub fn instance_wal_path(&self) -> Utf8PathBuf {
        self.backup_root.join(WAL_DIR).join(&self.instance)
    }

    pub fn instance_config_path(&self) -> Utf8PathBuf {
        self.instance_backup_path().join(INSTANCE_CONFIG_FILE)
    }

    pub fn backup_path(&self, id: BackupId) -> Utf8PathBuf {
        self.instance_backup_path().join(id.to_string())
    }

    pub fn database_path(&self, id: BackupId) -> Utf8PathBuf {
        self.backup_path(id).join(DATABASE_DIR)
    }

    pub fn backup_wal_path(&self, id: BackupId) -> Utf8PathBuf {
        self.database_path(id).join(PG_XLOG_DIR)
    }

    pub fn control_file_path(&self, id: BackupId) -> Utf8PathBuf {
        self.backup_path(id).join(BACKUP_CONTROL_FILE)
    }

    pub fn filelist_path(&self, id: BackupId) -> Utf8PathBuf {
        self.backup_path(id).join(DATABASE_FILE_LIST)
    }

    pub fn pid_file_path(&self, id: BackupId) -> Utf8PathBuf {
        self.backup_path(id).join(BACKUP_PID_FILE)
    }

    pub fn external_dir_path(&self, id: BackupId, dir_num: usize) -> Utf8PathBuf {
        self.backup_path(id)
            .join(EXTERNAL_DIR)
            .join(format!("externaldir{dir_num}"))
    }

    /// Create the `backups/` and `wal/` skeleton. Used by `init`.
    pub fn init_root(backup_root: &Utf8Path) -> Result<()> {
        if backup_root.exists() {
            ensure!(
                backup_root.read_dir()?.next().is_none(),
                "backup catalog already initialized, \"{backup_root}\" is not empty"
            );
        }
        crashsafe::create_dir_all(&backup_root.join(BACKUPS_DIR))?;
        crashsafe::create_dir_all(&backup_root.join(WAL_DIR))?;
        Ok(())
    }

    pub fn add_instance(&self) -> Result<()> {
        let backup_path = self.instance_backup_path();
        ensure!(
            !backup_path.exists(),
            "instance '{}' already exists",
            self.instance
        );
        crashsafe::create_dir_all(&backup_path)?;
        crashsafe::create_dir_all(&self.instance_wal_path())?;
        Ok(())
    }

    pub fn del_instance(&self) -> Result<()> {
        let backup_path = self.instance_backup_path();
        ensure!(backup_path.exists(), "instance '{}' does not exist", self.instance);
        std::fs::remove_dir_all(&backup_path)?;
        let wal_path = self.instance_wal_path();
        if wal_path.exists() {
            std::fs::remove_dir_all(wal_path)?;
        }
        Ok(())
    }

    /// Create the directory skeleton for a new backup.
    pub fn create_backup_dir(&self, backup: &Backup, n_external: usize) -> Result<()> {
        let path = self.backup_path(backup.id);
        if path.exists() {
            ensure!(
                path.read_dir()?.next().is_none(),
                "backup destination is not empty \"{path}\""
            );
        }
        crashsafe::create_dir_all(&path)?;
        crashsafe::create_dir_all(&self.database_path(backup.id))?;
        for dir_num in 1..=n_external {
            crashsafe::create_dir_all(&self.external_dir_path(backup.id, dir_num))?;
        }
        Ok(())
    }

    /// Take the per-backup exclusive lock. `LockResult::Busy` means a live
    /// process owns it; that is a refusal, not a failure.
    pub fn lock_backup(&self, id: BackupId) -> Result<LockResult> {
        lock_pid_file(&self.pid_file_path(id))
    }

    /// Like `lock_backup`, but a busy lock is an error.
    pub fn lock_backup_exclusive(&self, id: BackupId) -> Result<LockFileGuard> {
        match self.lock_backup(id)? {
            LockResult::Acquired(guard) => Ok(guard),
            LockResult::Busy { owner } => {
                bail!("cannot lock backup {id} directory: process {owner} is using it")
            }
        }
    }

    pub fn read_backup(&self, id: BackupId) -> Result<Backup> {
        let path = self.control_file_path(id);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read control file \"{path}\""))?;
        deserialize_backup_control(id, &content)
    }

    pub fn write_backup(&self, backup: &Backup) -> Result<()> {
        let path = self.control_file_path(backup.id);
        crashsafe::overwrite(&path, serialize_backup_control(backup).as_bytes())
            .with_context(|| format!("cannot write control file \"{path}\""))
    }

    /// Re-read the control file and update only the status, so concurrent
    /// metadata edits are not clobbered.
    pub fn write_backup_status(&self, id: BackupId, status: BackupStatus) -> Result<()> {
        let mut backup = self.read_backup(id)?;
        backup.status = status;
        self.write_backup(&backup)
    }

    /// Write the file list. Returns the payload byte total that goes into
    /// `data-bytes`: the sum of bytes actually copied for regular files.
    pub fn write_backup_filelist(&self, id: BackupId, entries: &[FileListEntry]) -> Result<u64> {
        let mut content = String::new();
        let mut data_bytes: u64 = 0;
        for entry in entries {
            if entry.is_reg() && entry.size > 0 {
                data_bytes += entry.size as u64;
            }
            content.push_str(&serde_json::to_string(entry)?);
            content.push('\n');
        }
        let path = self.filelist_path(id);
        crashsafe::overwrite(&path, content.as_bytes())
            .with_context(|| format!("cannot write file list \"{path}\""))?;
        Ok(data_bytes)
    }

    pub fn read_backup_filelist(&self, id: BackupId) -> Result<Vec<FileListEntry>> {
        let path = self.filelist_path(id);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read file list \"{path}\""))?;
        let mut entries = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(
                serde_json::from_str(line)
                    .with_context(|| format!("malformed file list line {line:?}"))?,
            );
        }
        Ok(entries)
    }

    /// Enumerate backups of this instance, newest first. A directory whose
    /// control file is unreadable shows up as INVALID rather than hiding.
    pub fn list_backups(&self) -> Result<Vec<Backup>> {
        let dir = self.instance_backup_path();
        let entries = dir
            .read_dir_utf8()
            .with_context(|| format!("cannot open directory \"{dir}\""))?;

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if !entry.file_type()?.is_dir() || name.starts_with('.') {
                continue;
            }
            let Ok(id) = name.parse::<BackupId>() else {
                continue;
            };
            match self.read_backup(id) {
                Ok(backup) => backups.push(backup),
                Err(e) => {
                    warn!("failed to read backup {name}: {e:#}");
                    let mut backup = Backup::new(id, BackupMode::Full);
                    backup.status = BackupStatus::Invalid;
                    backups.push(backup);
                }
            }
        }
        backups.sort_by_key(|b| std::cmp::Reverse(b.id));
        Ok(backups)
    }
}

/// Find the latest completed backup on the given timeline; the incremental
/// parent candidate.
pub fn last_completed_backup(backups: &[Backup], tli: TimeLineID) -> Option<&Backup> {
    // list is sorted newest first
    backups
        .iter()
        .find(|b| b.status.is_complete() && b.tli == tli)
}

pub fn find_backup(backups: &[Backup], id: BackupId) -> Option<&Backup> {
    backups.iter().find(|b| b.id == id)
}

/// Outcome of walking a backup's ancestry.
#[derive(Debug)]
pub enum ChainOutcome<'a> {
    /// An ancestor is missing; holds the oldest backup that still exists.
    Broken { oldest: &'a Backup },
    /// Chain is complete, but an ancestor is not usable; holds the oldest
    /// such backup.
    Invalid { oldest_invalid: &'a Backup },
    /// Chain is complete and every member is OK/DONE; holds the base FULL.
    Intact { full: &'a Backup },
}

/// Walk the parent links of `target` and classify the chain.
pub fn scan_parent_chain<'a>(backups: &'a [Backup], target: &'a Backup) -> ChainOutcome<'a> {
    let mut oldest_invalid: Option<&Backup> = None;
    let mut current = target;

    loop {
        if !current.status.is_complete() {
            oldest_invalid = Some(current);
        }
        match current.parent {
            Some(parent_id) => match find_backup(backups, parent_id) {
                Some(parent) => current = parent,
                None => return ChainOutcome::Broken { oldest: current },
            },
            None => break,
        }
    }

    if current.mode != BackupMode::Full {
        // The chain terminated on an incremental backup with no parent
        // recorded, which is as broken as a missing ancestor.
        return ChainOutcome::Broken { oldest: current };
    }
    if let Some(invalid) = oldest_invalid {
        return ChainOutcome::Invalid {
            oldest_invalid: invalid,
        };
    }
    ChainOutcome::Intact { full: current }
}

/// Find the base FULL backup of `target`, if its chain reaches one.
pub fn find_parent_full_backup<'a>(backups: &'a [Backup], target: &'a Backup) -> Option<&'a Backup> {
    match scan_parent_chain(backups, target) {
        ChainOutcome::Intact { full } => Some(full),
        ChainOutcome::Invalid { .. } => {
            let mut current = target;
            while let Some(parent_id) = current.parent {
                current = find_backup(backups, parent_id)?;
            }
            (current.mode == BackupMode::Full).then_some(current)
        }
        ChainOutcome::Broken { .. } => None,
    }
}

/// The ancestry of `target` ordered root FULL first, `target` last.
pub fn chain_of<'a>(backups: &'a [Backup], target: &'a Backup) -> Result<Vec<&'a Backup>> {
    let mut chain = vec![target];
    let mut current = target;
    while let Some(parent_id) = current.parent {
        current = find_backup(backups, parent_id)
            .with_context(|| format!("backup {parent_id} is missing"))?;
        chain.push(current);
    }
    ensure!(
        current.mode == BackupMode::Full,
        "failed to find parent FULL backup for {}",
        target.id
    );
    chain.reverse();
    Ok(chain)
}

/// Does `child` descend from the backup with start time `parent_id`?
/// This does not guarantee the chain is intact.
pub fn is_parent(backups: &[Backup], parent_id: BackupId, child: &Backup, inclusive: bool) -> bool {
    if inclusive && child.id == parent_id {
        return true;
    }
    let mut current = child;
    while let Some(pid) = current.parent {
        if pid == parent_id {
            return true;
        }
        match find_backup(backups, pid) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;

    #[test]
    fn base36_roundtrip() {
        for value in [0i64, 1, 35, 36, 1234567890, 1700000000] {
            let id = BackupId(value);
            let rendered = id.to_string();
            assert_eq!(rendered.parse::<BackupId>().unwrap(), id, "value {value}");
        }
        assert_eq!(BackupId(0).to_string(), "0");
        assert_eq!(BackupId(35).to_string(), "Z");
        assert_eq!(BackupId(36).to_string(), "10");
        // lowercase accepted on parse
        assert_eq!("z".parse::<BackupId>().unwrap(), BackupId(35));
        assert!("??".parse::<BackupId>().is_err());
    }

    fn sample_backup(id: i64, mode: BackupMode, parent: Option<i64>) -> Backup {
        let mut b = Backup::new(BackupId(id), mode);
        b.status = BackupStatus::Ok;
        b.tli = 1;
        b.start_lsn = Lsn(0x0100_0028);
        b.stop_lsn = Lsn(0x0100_0128);
        b.checksum_version = 1;
        b.compress_alg = CompressAlg::Zlib;
        b.compress_level = 3;
        b.server_version = "11".to_owned();
        b.end_time = Some(id + 10);
        b.recovery_time = Some(id + 9);
        b.recovery_xid = 573;
        b.data_bytes = Some(4242);
        b.parent = parent.map(BackupId);
        b
    }

    #[test]
    fn control_file_roundtrip() {
        let backup = sample_backup(1700000000, BackupMode::Page, Some(1690000000));
        let content = serialize_backup_control(&backup);
        let parsed = deserialize_backup_control(backup.id, &content).unwrap();

        assert_eq!(parsed.mode, BackupMode::Page);
        assert_eq!(parsed.status, BackupStatus::Ok);
        assert_eq!(parsed.tli, 1);
        assert_eq!(parsed.start_lsn, Lsn(0x0100_0028));
        assert_eq!(parsed.stop_lsn, Lsn(0x0100_0128));
        assert_eq!(parsed.parent, Some(BackupId(1690000000)));
        assert_eq!(parsed.end_time, Some(1700000010));
        assert_eq!(parsed.recovery_time, Some(1700000009));
        assert_eq!(parsed.recovery_xid, 573);
        assert_eq!(parsed.data_bytes, Some(4242));
        assert_eq!(parsed.compress_alg, CompressAlg::Zlib);
        assert_eq!(parsed.compress_level, 3);
        assert_eq!(parsed.checksum_version, 1);
        assert_eq!(parsed.server_version, "11");
    }

    #[test]
    fn catalog_write_read_list() {
        let dir = tempdir().unwrap();
        Catalog::init_root(dir.path()).unwrap();
        let catalog = Catalog::new(dir.path().to_owned(), "main");
        catalog.add_instance().unwrap();

        let full = sample_backup(1000000000, BackupMode::Full, None);
        let page = sample_backup(1000000100, BackupMode::Page, Some(1000000000));
        for b in [&full, &page] {
            catalog.create_backup_dir(b, 0).unwrap();
            catalog.write_backup(b).unwrap();
        }

        let listed = catalog.list_backups().unwrap();
        assert_eq!(listed.len(), 2);
        // newest first
        assert_eq!(listed[0].id, page.id);
        assert_eq!(listed[1].id, full.id);

        match scan_parent_chain(&listed, &listed[0]) {
            ChainOutcome::Intact { full: root } => assert_eq!(root.id, full.id),
            other => panic!("unexpected chain outcome {other:?}"),
        }
        assert!(is_parent(&listed, full.id, &listed[0], false));
        assert!(!is_parent(&listed, page.id, &listed[1], false));

        catalog.write_backup_status(page.id, BackupStatus::Corrupt).unwrap();
        let listed = catalog.list_backups().unwrap();
        assert_eq!(listed[0].status, BackupStatus::Corrupt);
        match scan_parent_chain(&listed, &listed[0]) {
            ChainOutcome::Invalid { oldest_invalid } => assert_eq!(oldest_invalid.id, page.id),
            other => panic!("unexpected chain outcome {other:?}"),
        }
    }

    #[test]
    fn broken_chain_detected() {
        let full = sample_backup(1000, BackupMode::Full, None);
        let page1 = sample_backup(2000, BackupMode::Page, Some(1000));
        let page2 = sample_backup(3000, BackupMode::Page, Some(2000));
        // page1's parent is gone
        let backups = vec![page2.clone(), page1.clone()];
        match scan_parent_chain(&backups, &backups[0]) {
            ChainOutcome::Broken { oldest } => assert_eq!(oldest.id, page1.id),
            other => panic!("unexpected chain outcome {other:?}"),
        }

        let backups = vec![page2, page1, full.clone()];
        match scan_parent_chain(&backups, &backups[0]) {
            ChainOutcome::Intact { full: root } => assert_eq!(root.id, full.id),
            other => panic!("unexpected chain outcome {other:?}"),
        }
        let chain = chain_of(&backups, &backups[0]).unwrap();
        let ids: Vec<_> = chain.iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![1000, 2000, 3000]);
    }

    #[test]
    fn filelist_roundtrip() {
        let dir = tempdir().unwrap();
        Catalog::init_root(dir.path()).unwrap();
        let catalog = Catalog::new(dir.path().to_owned(), "main");
        catalog.add_instance().unwrap();
        let backup = sample_backup(42424242, BackupMode::Full, None);
        catalog.create_backup_dir(&backup, 0).unwrap();

        let entries = vec![
            FileListEntry {
                path: "base".to_owned(),
                size: BYTES_INVALID,
                mode: 0o040700,
                is_datafile: false,
                is_cfs: false,
                crc: 0,
                compress_alg: CompressAlg::None,
                external_dir_num: 0,
                segno: None,
                linked: None,
                n_blocks: None,
            },
            FileListEntry {
                path: "base/1/16384".to_owned(),
                size: 8200,
                mode: 0o100600,
                is_datafile: true,
                is_cfs: false,
                crc: 0xDEADBEEF,
                compress_alg: CompressAlg::Zlib,
                external_dir_num: 0,
                segno: Some(0),
                linked: None,
                n_blocks: Some(2),
            },
        ];
        let data_bytes = catalog.write_backup_filelist(backup.id, &entries).unwrap();
        assert_eq!(data_bytes, 8200);

        let read_back = catalog.read_backup_filelist(backup.id).unwrap();
        assert_eq!(read_back.len(), 2);
        assert!(read_back[0].is_dir());
        assert!(read_back[1].is_reg());
        assert_eq!(read_back[1].crc, 0xDEADBEEF);
        assert_eq!(read_back[1].n_blocks, Some(2));
        assert_eq!(read_back[1].segno, Some(0));
    }

    #[test]
    fn lock_backup_busy_and_reclaim() {
        let dir = tempdir().unwrap();
        Catalog::init_root(dir.path()).unwrap();
        let catalog = Catalog::new(dir.path().to_owned(), "main");
        catalog.add_instance().unwrap();
        let backup = sample_backup(555555, BackupMode::Full, None);
        catalog.create_backup_dir(&backup, 0).unwrap();

        let guard = catalog.lock_backup_exclusive(backup.id).unwrap();
        // The file exists and contains our PID, so a hypothetical second
        // process would see Busy. Our own PID is treated as stale, which is
        // the boot-cycle-reuse rule, so don't assert Busy here; instead
        // check the stale-reclaim path.
        drop(guard);

        std::fs::write(catalog.pid_file_path(backup.id), "4194301\n").unwrap();
        let guard = catalog.lock_backup_exclusive(backup.id).unwrap();
        drop(guard);
    }
}
