//! The backup session coordinator: brackets the file copy between the
//! cluster's start and stop markers, runs the worker pool, keeps the WAL
//! streamer alive exactly as long as needed, and owns cleanup on every
//! failure path.
//!
//! ```text
//! INIT -> LOCKED -> STARTED -> STREAMING? -> COPYING -> STOPPED ->
//! WAL_WAITING -> FINALISED -> {DONE | ERROR}
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, ensure, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{TimeZone, Utc};
use postgres_ffi::controlfile_utils::ControlFileData;
use postgres_ffi::pg_constants::PG_CONTROL_FILE_NAME;
use postgres_ffi::xlog_utils::from_pg_timestamp_to_unix_secs;
use postgres_ffi::{waldecoder, BLCKSZ, XLOG_BLCKSZ};
use tracing::{debug, info, warn};
use utils::lsn::Lsn;

use crate::catalog::{
    self, Backup, BackupId, BackupMode, BackupStatus, Catalog, FileListEntry, PG_XLOG_DIR,
};
use crate::compress::CompressAlg;
use crate::config::InstanceConfig;
use crate::datafile::{self, DataFileOutcome, PageReadContext};
use crate::inventory::{
    self, FileBackupResult, PgFile, WriteState, DATADIR_MIN_FILES,
};
use crate::pagemap;
use crate::pg_client::{BlockFetcher, DatabaseClient};
use crate::validate;
use crate::wal_archive::{wait_wal_lsn, WalWaitParams};
use crate::wal_stream::{spawn_wal_streamer, WalStreamer};

/// How often the running file list is refreshed on disk during a long copy.
const FILELIST_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

pub struct BackupOptions {
    pub mode: BackupMode,
    pub stream: bool,
    pub compress_alg: CompressAlg,
    pub compress_level: u32,
    pub num_threads: usize,
    /// Request an immediate checkpoint from pg_start_backup.
    pub fast_checkpoint: bool,
    pub no_validate: bool,
}

/// Everything a session needs from the outside world.
pub struct BackupEnv<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a InstanceConfig,
    pub client: &'a mut dyn DatabaseClient,
    pub fetcher: Option<Arc<dyn BlockFetcher>>,
    pub streamer: Option<Box<dyn WalStreamer>>,
    pub interrupted: Arc<AtomicBool>,
}

/// Facts about the cluster gathered before the session starts.
struct NodeInfo {
    server_version_str: String,
    from_replica: bool,
    checksum_version: u32,
    exclusive: bool,
    ptrack_supported: bool,
    ptrack_enabled: bool,
}

/// Entry point of the `backup` command.
pub fn do_backup(mut env: BackupEnv, opts: &BackupOptions) -> Result<BackupId> {
    let node = pgdata_basic_setup(&mut env, opts)?;

    let id = allocate_backup_id(env.catalog)?;
    let mut current = Backup::new(id, opts.mode);
    current.status = BackupStatus::Running;
    current.stream = opts.stream;
    current.compress_alg = opts.compress_alg;
    current.compress_level = opts.compress_level;
    current.from_replica = node.from_replica;
    current.checksum_version = node.checksum_version;
    current.block_size = BLCKSZ as u32;
    current.wal_block_size = XLOG_BLCKSZ as u32;
    current.server_version = node.server_version_str.clone();
    current.primary_conninfo = Some(env.client.primary_conninfo());
    if !env.config.external_dirs.is_empty() {
        current.external_dir_str = Some(
            env.config
                .external_dirs
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(":"),
        );
    }

    env.catalog
        .create_backup_dir(&current, env.config.external_dirs.len())?;
    let _lock_guard = env.catalog.lock_backup_exclusive(id)?;
    env.catalog.write_backup(&current)?;
    info!("backup destination is initialized, backup {id}");

    let mut backup_in_progress = false;
    let result = run_backup_instance(&mut env, opts, &node, &mut current, &mut backup_in_progress);

    match result {
        Ok(()) => {
            current.end_time = Some(now_unix());
            current.status = BackupStatus::Done;
            env.catalog.write_backup(&current)?;

            if !opts.no_validate {
                validate::validate_backup(env.catalog, &mut current)?;
            }
            if current.status.is_complete() {
                info!("backup {id} completed");
                Ok(id)
            } else {
                bail!("backup {id} failed validation: {}", current.status)
            }
        }
        Err(e) => {
            // The cluster must not be left with a backup in progress.
            if backup_in_progress {
                warn!("backup in progress, stop backup");
                let timeout = env.config.archive_timeout();
                if let Err(stop_err) =
                    env.client
                        .stop_backup(node.exclusive, node.from_replica, timeout)
                {
                    warn!("failed to issue stop backup during cleanup: {stop_err:#}");
                }
            }
            warn!("backup {id} is running, setting its status to ERROR");
            current.end_time = Some(now_unix());
            current.status = BackupStatus::Error;
            if let Err(write_err) = env.catalog.write_backup(&current) {
                warn!("failed to record ERROR status of backup {id}: {write_err:#}");
            }
            Err(e)
        }
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}

/// Backup IDs are second-granularity timestamps; if a backup was started
/// within the same second, wait it out.
fn allocate_backup_id(catalog: &Catalog) -> Result<BackupId> {
    for _ in 0..10 {
        let id = BackupId(now_unix());
        if !catalog.backup_path(id).exists() {
            return Ok(id);
        }
        std::thread::sleep(Duration::from_secs(1));
    }
    bail!("could not allocate a backup ID");
}

/// Connection checks and basic facts, mirrored against the local PGDATA.
fn pgdata_basic_setup(env: &mut BackupEnv, opts: &BackupOptions) -> Result<NodeInfo> {
    let client = &mut *env.client;

    let (server_version_num, server_version_str) = client.server_version()?;
    ensure!(
        server_version_num >= 90600,
        "server version is {server_version_str}, must be 9.6 or higher"
    );

    confirm_block_size(client, "block_size", BLCKSZ as u64)?;
    confirm_block_size(client, "wal_block_size", XLOG_BLCKSZ as u64)?;

    let from_replica = client.is_in_recovery()?;
    let checksum_version = if client.current_setting("data_checksums")? == "on" {
        1
    } else {
        warn!(
            "this PostgreSQL instance was initialized without data block checksums; \
             data block corruption cannot be detected"
        );
        0
    };

    // The catalog, the connection and PGDATA must all describe the same
    // cluster.
    let system_id_conn = client.system_identifier()?;
    let control = read_pgdata_control_file(&env.config.pgdata)?;
    ensure!(
        system_id_conn == control.system_identifier,
        "data directory was initialized for system id {}, \
         but connected instance system id is {system_id_conn}",
        control.system_identifier
    );
    if env.config.system_identifier != 0 {
        ensure!(
            system_id_conn == env.config.system_identifier,
            "backup catalog was initialized for system id {}, \
             but connected instance system id is {system_id_conn}",
            env.config.system_identifier
        );
    }

    let ptrack_supported = client.ptrack_version()?.is_some();
    let ptrack_enabled = ptrack_supported && client.ptrack_enabled()?;
    if opts.mode == BackupMode::Ptrack {
        ensure!(
            ptrack_supported,
            "this PostgreSQL instance does not support ptrack"
        );
        ensure!(ptrack_enabled, "ptrack is disabled");
    }

    Ok(NodeInfo {
        server_version_str,
        from_replica,
        checksum_version,
        // Only old servers and the ptrack protocol still need the exclusive
        // marker.
        exclusive: server_version_num < 90600 || opts.mode == BackupMode::Ptrack,
        ptrack_supported,
        ptrack_enabled,
    })
}

fn confirm_block_size(client: &mut dyn DatabaseClient, name: &str, expected: u64) -> Result<()> {
    let value = client.current_setting(name)?;
    let value: u64 = value
        .parse()
        .with_context(|| format!("cannot get {name}"))?;
    ensure!(
        value == expected,
        "{name}({value}) is not compatible({expected} expected)"
    );
    Ok(())
}

fn read_pgdata_control_file(pgdata: &Utf8Path) -> Result<ControlFileData> {
    let path = pgdata.join(PG_CONTROL_FILE_NAME);
    let buf =
        std::fs::read(&path).with_context(|| format!("cannot read control file \"{path}\""))?;
    ControlFileData::decode(&buf)
}

/// The body of the session, from the start marker to the final file list.
/// `backup_in_progress` is kept truthful so the caller can release
/// cluster-side state whenever this errors out.
fn run_backup_instance(
    env: &mut BackupEnv,
    opts: &BackupOptions,
    node: &NodeInfo,
    current: &mut Backup,
    backup_in_progress: &mut bool,
) -> Result<()> {
    let catalog = env.catalog;
    let config = env.config;
    let database_path = catalog.database_path(current.id);
    let arclog_path = catalog.instance_wal_path();

    check_external_for_tablespaces(env.client, &config.external_dirs)?;

    current.tli = read_pgdata_control_file(&config.pgdata)?.timeline_id;

    // Incremental modes hang off the latest usable backup of this timeline.
    let mut prev_backup: Option<Backup> = None;
    let mut prev_filelist: HashMap<(String, usize), FileListEntry> = HashMap::new();
    if opts.mode.is_incremental() {
        let backups = catalog.list_backups()?;
        let prev = catalog::last_completed_backup(&backups, current.tli)
            .context(
                "valid backup on current timeline is not found, \
                 create new FULL backup before an incremental one",
            )?
            .clone();
        for entry in catalog.read_backup_filelist(prev.id)? {
            prev_filelist.insert((entry.path.clone(), entry.external_dir_num), entry);
        }
        current.parent = Some(prev.id);
        prev_backup = Some(prev);
        catalog.write_backup(current)?;
    }

    if opts.mode == BackupMode::Ptrack {
        let prev = prev_backup.as_ref().unwrap();
        let ptrack_lsn = env.client.ptrack_control_lsn()?;
        if ptrack_lsn > prev.stop_lsn || !ptrack_lsn.is_valid() {
            bail!(
                "LSN from ptrack_control {ptrack_lsn} differs from stop LSN of previous \
                 backup {}; create a new full backup before an incremental one",
                prev.stop_lsn
            );
        }
    }

    // Reset change tracking so the next PTRACK backup has a clean baseline.
    if opts.mode != BackupMode::Ptrack && node.ptrack_enabled {
        env.client.ptrack_clear()?;
    }

    // Notify the cluster: the copy starts here.
    let label_time = Utc.timestamp_opt(current.start_time(), 0).unwrap();
    let label = format!("{} with pgbackup", label_time.format("%Y-%m-%d %H:%M:%S"));
    current.start_lsn = env
        .client
        .start_backup(&label, opts.fast_checkpoint, node.exclusive)?;
    *backup_in_progress = true;
    info!(
        "backup start LSN {}, timeline {}, mode {}",
        current.start_lsn, current.tli, current.mode
    );

    if let Some(prev) = &prev_backup {
        ensure!(
            prev.start_lsn <= current.start_lsn,
            "current START LSN {} is lower than START LSN {} of previous backup {}; \
             it may indicate that we are trying to backup PostgreSQL instance from the past",
            current.start_lsn,
            prev.start_lsn,
            prev.id
        );
    }
    catalog.write_backup(current)?;

    // PAGE needs the segment holding start_lsn in the archive, so force the
    // cluster to close it out.
    if opts.mode == BackupMode::Page && !(current.from_replica && !node.exclusive) {
        env.client.switch_wal()?;
    }
    if opts.mode == BackupMode::Page {
        wait_wal_lsn(
            current.start_lsn,
            &WalWaitParams {
                wal_dir: &arclog_path,
                tli: current.tli,
                seg_size: config.xlog_seg_size,
                timeout: config.archive_timeout(),
                wait_prev_segment: false,
                is_start_lsn: true,
                in_stream_mode: opts.stream,
                from_replica: current.from_replica,
                scan_from: current.start_lsn,
                interrupted: &env.interrupted,
            },
        )?;
    } else if !opts.stream {
        wait_wal_lsn(
            current.start_lsn,
            &WalWaitParams {
                wal_dir: &arclog_path,
                tli: current.tli,
                seg_size: config.xlog_seg_size,
                timeout: config.archive_timeout(),
                wait_prev_segment: true,
                is_start_lsn: true,
                in_stream_mode: false,
                from_replica: current.from_replica,
                scan_from: current.start_lsn,
                interrupted: &env.interrupted,
            },
        )?;
    }

    // Spawn the WAL streamer; it runs for the whole copy and a precise
    // amount longer.
    let stream_handle = if opts.stream {
        let streamer = env
            .streamer
            .take()
            .context("stream mode requested but no replication client available")?;
        let stream_dir = catalog.backup_wal_path(current.id);
        utils::crashsafe::create_dir_all(&stream_dir)?;
        let checkpoint_timeout = env.client.checkpoint_timeout()?;
        let stop_timeout = checkpoint_timeout + checkpoint_timeout / 10;
        Some(spawn_wal_streamer(
            streamer,
            &stream_dir,
            current.start_lsn,
            current.tli,
            config.xlog_seg_size,
            Arc::clone(&env.interrupted),
            stop_timeout,
        ))
    } else {
        None
    };

    // Inventory.
    let mut files = inventory::list_data_directory(&config.pgdata)?;
    ensure!(
        files.len() >= DATADIR_MIN_FILES,
        "PGDATA is almost empty: either it was concurrently deleted or this process \
         does not possess sufficient permissions to list its content"
    );
    for (i, dir) in config.external_dirs.iter().enumerate() {
        files.extend(inventory::list_external_directory(dir, i + 1)?);
    }
    inventory::sort_by_path(&mut files);

    // Who already exists in the parent backup: decides skips and carry-overs.
    for file in files.iter_mut() {
        file.exists_in_prev = prev_filelist
            .contains_key(&(file.rel_path.as_str().to_owned(), file.external_dir_num));
    }

    // Page maps for the incremental modes that have them.
    match opts.mode {
        BackupMode::Page => {
            let prev = prev_backup.as_ref().unwrap();
            pagemap::extract_pagemap(
                &mut files,
                &arclog_path,
                current.tli,
                config.xlog_seg_size,
                prev.start_lsn,
                current.start_lsn,
            )?;
        }
        BackupMode::Ptrack => {
            pagemap::make_pagemap_from_ptrack(&mut files, env.client)?;
        }
        BackupMode::Full | BackupMode::Delta => {}
    }

    // Mirror the directory skeleton before any worker needs it.
    for file in &files {
        if file.is_dir() {
            let dirpath = dest_path(catalog, current.id, &database_path, file);
            create_dir_0700(&dirpath)?;
        }
    }

    inventory::sort_by_size_desc(&mut files);

    // Initial file list, so `show` displays the in-progress backup.
    write_filelist(catalog, current, &files)?;
    catalog.write_backup(current)?;

    info!("start transferring data files");
    let num_threads = if opts.num_threads > 0 {
        opts.num_threads
    } else {
        config.effective_num_threads()
    };
    let prev_start_lsn = prev_backup
        .as_ref()
        .map(|p| p.start_lsn)
        .unwrap_or(Lsn::INVALID);
    let parent_start_time = prev_backup.as_ref().map(|p| p.start_time());

    let worker_ctx = WorkerContext {
        catalog,
        backup_id: current.id,
        pgdata: &config.pgdata,
        database_path: &database_path,
        external_dirs: &config.external_dirs,
        files: &files,
        prev_filelist: &prev_filelist,
        mode: opts.mode,
        prev_start_lsn,
        parent_start_time,
        compress_alg: opts.compress_alg,
        compress_level: opts.compress_level,
        checksum_version: current.checksum_version,
        // Server-side block fetch only works where the ptrack extension is
        // installed.
        fetcher: if node.ptrack_supported {
            env.fetcher.as_deref()
        } else {
            None
        },
        interrupted: &env.interrupted,
    };
    run_worker_pool(&worker_ctx, num_threads)?;
    info!("data files are transferred");

    // Drop entries that disappeared while we were copying.
    files.retain(|f| f.result.lock().unwrap().state != WriteState::NotFound);

    // Notify the cluster: the copy is done.
    if !current.from_replica || node.exclusive {
        env.client
            .create_restore_point(&format!("pgbackup, backup_id {}", current.id))?;
    }
    let reply = env.client.stop_backup(
        node.exclusive,
        current.from_replica,
        config.archive_timeout(),
    )?;
    *backup_in_progress = false;
    let mut stop_backup_lsn = reply.stop_lsn;
    info!("stop backup LSN {stop_backup_lsn}");

    if let Some(label) = &reply.backup_label {
        files.push(persist_blob(&database_path, "backup_label", label)?);
    }
    if let Some(map) = &reply.tablespace_map {
        files.push(persist_blob(&database_path, "tablespace_map", map)?);
    }

    // A stop LSN at a block boundary does not point at a record; settle on
    // the last real record before it.
    let wal_wait_dir = if opts.stream {
        catalog.backup_wal_path(current.id)
    } else {
        arclog_path.clone()
    };
    let mut stop_lsn_exists = false;
    if stop_backup_lsn.block_offset() == 0 {
        wait_wal_lsn(
            stop_backup_lsn,
            &WalWaitParams {
                wal_dir: &wal_wait_dir,
                tli: current.tli,
                seg_size: config.xlog_seg_size,
                timeout: config.archive_timeout(),
                wait_prev_segment: true,
                is_start_lsn: false,
                in_stream_mode: opts.stream,
                from_replica: current.from_replica,
                scan_from: current.start_lsn,
                interrupted: &env.interrupted,
            },
        )?;
        stop_backup_lsn = waldecoder::find_last_record_lsn(
            &wal_wait_dir,
            current.tli,
            config.xlog_seg_size,
            current.start_lsn,
            stop_backup_lsn,
        )?
        .with_context(|| format!("cannot find a valid record below {stop_backup_lsn}"))?;
        debug!("stop LSN adjusted to {stop_backup_lsn}");
        stop_lsn_exists = true;
    }

    // Release the streamer: it exits once its position passes the stop LSN.
    if let Some(handle) = stream_handle {
        handle.publish_stop_lsn(stop_backup_lsn);
        let streamed_to = handle.join().context("WAL streaming failed")?;
        debug!("WAL streamed up to {streamed_to}");
    }
    if !stop_lsn_exists {
        stop_backup_lsn = wait_wal_lsn(
            stop_backup_lsn,
            &WalWaitParams {
                wal_dir: &wal_wait_dir,
                tli: current.tli,
                seg_size: config.xlog_seg_size,
                timeout: config.archive_timeout(),
                wait_prev_segment: false,
                is_start_lsn: false,
                in_stream_mode: opts.stream,
                from_replica: current.from_replica,
                scan_from: current.start_lsn,
                interrupted: &env.interrupted,
            },
        )?;
    }
    current.stop_lsn = stop_backup_lsn;

    // Recovery point bookkeeping: the newest transaction end in the backed
    // up WAL range, falling back to the stop-time snapshot.
    match waldecoder::read_recovery_info(
        &wal_wait_dir,
        current.tli,
        config.xlog_seg_size,
        current.start_lsn,
        current.stop_lsn,
    ) {
        Ok(Some((ts, xid))) => {
            current.recovery_time = Some(from_pg_timestamp_to_unix_secs(ts));
            current.recovery_xid = xid as u64;
        }
        Ok(None) | Err(_) => {
            debug!("failed to find recovery time in WAL, forced to trust current_timestamp");
            current.recovery_time = Some(reply.recovery_time);
            current.recovery_xid = reply.recovery_xid;
        }
    }

    // A replica's control file may point at a consistency point far behind
    // the data we copied; patch it so the restored cluster replays far
    // enough.
    if current.from_replica && !node.exclusive {
        set_min_recovery_point(&database_path, &files, current.stop_lsn, current.tli)?;
    }

    // Streamed WAL becomes part of the image.
    if opts.stream {
        let stream_dir = catalog.backup_wal_path(current.id);
        for entry in stream_dir.read_dir_utf8()? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let (size, crc) = datafile::file_crc(path, true)?;
            let mut file = PgFile::synthetic_reg(
                Utf8PathBuf::from(PG_XLOG_DIR).join(entry.file_name()),
                size,
            );
            file.result.get_mut().unwrap().state = WriteState::Written(size);
            file.result.get_mut().unwrap().crc = crc;
            files.push(file);
        }
    } else {
        let seg_size = config.xlog_seg_size as u64;
        current.wal_bytes = Some(
            seg_size * (current.stop_lsn.0 / seg_size - current.start_lsn.0 / seg_size + 1),
        );
    }

    // Final file list; readers accept only this version.
    let data_bytes = write_filelist(catalog, current, &files)?;
    current.data_bytes = Some(data_bytes);
    catalog.write_backup(current)?;
    Ok(())
}

fn persist_blob(database_path: &Utf8Path, name: &str, content: &str) -> Result<PgFile> {
    let path = database_path.join(name);
    std::fs::write(&path, content).with_context(|| format!("cannot write \"{path}\""))?;
    let mut file = PgFile::synthetic_reg(Utf8PathBuf::from(name), content.len() as u64);
    let result = file.result.get_mut().unwrap();
    result.state = WriteState::Written(content.len() as u64);
    result.crc = crc32c::crc32c(content.as_bytes());
    Ok(file)
}

fn write_filelist(catalog: &Catalog, current: &Backup, files: &[PgFile]) -> Result<u64> {
    let entries: Vec<FileListEntry> = files.iter().filter_map(|f| f.to_filelist_entry()).collect();
    catalog.write_backup_filelist(current.id, &entries)
}

fn create_dir_0700(path: &Utf8Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true).mode(0o700);
    builder
        .create(path)
        .with_context(|| format!("cannot create directory \"{path}\""))
}

fn dest_path(
    catalog: &Catalog,
    id: BackupId,
    database_path: &Utf8Path,
    file: &PgFile,
) -> Utf8PathBuf {
    if file.external_dir_num > 0 {
        catalog
            .external_dir_path(id, file.external_dir_num)
            .join(&file.rel_path)
    } else {
        database_path.join(&file.rel_path)
    }
}

fn source_path(pgdata: &Utf8Path, external_dirs: &[Utf8PathBuf], file: &PgFile) -> Utf8PathBuf {
    if file.external_dir_num > 0 {
        external_dirs[file.external_dir_num - 1].join(&file.rel_path)
    } else {
        pgdata.join(&file.rel_path)
    }
}

fn check_external_for_tablespaces(
    client: &mut dyn DatabaseClient,
    external_dirs: &[Utf8PathBuf],
) -> Result<()> {
    if external_dirs.is_empty() {
        return Ok(());
    }
    for location in client.tablespace_locations()? {
        let location = Utf8Path::new(&location);
        for external in external_dirs {
            ensure!(
                !location.starts_with(external),
                "external directory path \"{external}\" contains tablespace \"{location}\""
            );
            if external.starts_with(location) {
                warn!(
                    "external directory path \"{external}\" is in tablespace directory \
                     \"{location}\""
                );
            }
        }
    }
    for (i, a) in external_dirs.iter().enumerate() {
        for (j, b) in external_dirs.iter().enumerate() {
            if i != j {
                ensure!(
                    !b.starts_with(a),
                    "external directory path \"{a}\" contains another external directory \"{b}\""
                );
            }
        }
    }
    Ok(())
}

struct WorkerContext<'a> {
    catalog: &'a Catalog,
    backup_id: BackupId,
    pgdata: &'a Utf8Path,
    database_path: &'a Utf8Path,
    external_dirs: &'a [Utf8PathBuf],
    files: &'a [PgFile],
    prev_filelist: &'a HashMap<(String, usize), FileListEntry>,
    mode: BackupMode,
    prev_start_lsn: Lsn,
    parent_start_time: Option<i64>,
    compress_alg: CompressAlg,
    compress_level: u32,
    checksum_version: u32,
    fetcher: Option<&'a dyn BlockFetcher>,
    interrupted: &'a AtomicBool,
}

/// Fixed pool of workers claiming files off the shared list. Each file is
/// processed exactly once; which worker gets which file does not matter.
fn run_worker_pool(ctx: &WorkerContext, num_threads: usize) -> Result<()> {
    let results: Vec<Result<()>> = std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(num_threads);
        for worker_id in 0..num_threads {
            handles.push(scope.spawn(move || worker_loop(ctx, worker_id)));
        }
        handles.into_iter().map(|h| match h.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("backup worker panicked")),
        }).collect()
    });

    for result in results {
        result.context("data files transferring failed")?;
    }
    Ok(())
}

fn worker_loop(ctx: &WorkerContext, worker_id: usize) -> Result<()> {
    let mut last_refresh = Instant::now();
    for file in ctx.files {
        // One worker keeps the on-disk file list fresh for `show`.
        if worker_id == 0 && last_refresh.elapsed() > FILELIST_REFRESH_INTERVAL {
            last_refresh = Instant::now();
            let entries: Vec<FileListEntry> =
                ctx.files.iter().filter_map(|f| f.to_filelist_entry()).collect();
            if let Err(e) = ctx.catalog.write_backup_filelist(ctx.backup_id, &entries) {
                warn!("failed to refresh file list: {e:#}");
            }
        }

        if !file.try_claim() {
            continue;
        }
        if ctx.interrupted.load(Ordering::Relaxed) {
            bail!("interrupted during backup");
        }
        backup_one_file(ctx, file)
            .with_context(|| format!("could not backup \"{}\"", file.rel_path))?;
    }
    Ok(())
}

fn backup_one_file(ctx: &WorkerContext, file: &PgFile) -> Result<()> {
    if file.is_dir() || matches!(file.kind, crate::inventory::FileKind::Symlink { .. }) {
        return Ok(());
    }
    debug!("copying file \"{}\"", file.rel_path);

    let from = source_path(ctx.pgdata, ctx.external_dirs, file);
    let to = dest_path(ctx.catalog, ctx.backup_id, ctx.database_path, file);

    // Re-stat: the file may be gone by now, which is fine for anything
    // non-critical.
    match std::fs::symlink_metadata(&from) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("file \"{from}\" is not found");
            file.result.lock().unwrap().state = WriteState::NotFound;
            return Ok(());
        }
        Err(e) => return Err(e).context(format!("cannot stat file \"{from}\"")),
    }

    let prev_entry = ctx
        .prev_filelist
        .get(&(file.rel_path.as_str().to_owned(), file.external_dir_num));

    if file.is_datafile && !file.is_cfs {
        let page_ctx = PageReadContext {
            source_path: &from,
            mode: ctx.mode,
            prev_start_lsn: ctx.prev_start_lsn,
            exists_in_prev: file.exists_in_prev,
            checksum_version: ctx.checksum_version,
            fetcher: ctx.fetcher,
            interrupted: ctx.interrupted,
        };
        let outcome =
            datafile::backup_data_file(&page_ctx, file, &to, ctx.compress_alg, ctx.compress_level)?;
        let mut result = file.result.lock().unwrap();
        match outcome {
            DataFileOutcome::NotFound => result.state = WriteState::NotFound,
            DataFileOutcome::Unchanged => {
                result.state = WriteState::CarriedOver;
                if let Some(prev) = prev_entry {
                    result.crc = prev.crc;
                    result.n_blocks = prev.n_blocks;
                }
            }
            DataFileOutcome::Written {
                read_size,
                write_size,
                crc,
                n_blocks,
            } => {
                *result = FileBackupResult {
                    state: WriteState::Written(write_size),
                    read_size,
                    crc,
                    compress_alg: ctx.compress_alg,
                    n_blocks,
                };
            }
        }
        return Ok(());
    }

    // The control file is copied whole; the coordinator may patch its
    // consistency point afterwards.
    let is_pg_control = file.external_dir_num == 0 && file.rel_path == PG_CONTROL_FILE_NAME;

    // Unchanged non-data files are carried over from the parent: same
    // content (by CRC) and untouched since the parent's start.
    if !is_pg_control {
        if let (Some(prev), Some(parent_start)) = (prev_entry, ctx.parent_start_time) {
            if file.exists_in_prev && file.mtime < parent_start {
                match datafile::file_crc(&from, true) {
                    Ok((read_size, crc)) if crc == prev.crc => {
                        debug!("skipping unchanged file \"{}\"", file.rel_path);
                        let mut result = file.result.lock().unwrap();
                        result.state = WriteState::CarriedOver;
                        result.read_size = read_size;
                        result.crc = crc;
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(_) => {
                        // Fall through to the copy attempt, which sorts out
                        // whether the file is really gone.
                    }
                }
            }
        }
    }

    match datafile::copy_file(&from, &to)? {
        Some((size, crc)) => {
            let mut result = file.result.lock().unwrap();
            *result = FileBackupResult {
                state: WriteState::Written(size),
                read_size: size,
                crc,
                compress_alg: CompressAlg::None,
                n_blocks: None,
            };
        }
        None => {
            file.result.lock().unwrap().state = WriteState::NotFound;
        }
    }
    Ok(())
}

/// Patch `minRecoveryPoint` in the copied control file so a restore of a
/// replica-taken backup reaches a state covering everything we copied.
fn set_min_recovery_point(
    database_path: &Utf8Path,
    files: &[PgFile],
    stop_lsn: Lsn,
    tli: u32,
) -> Result<()> {
    let control_path = database_path.join(PG_CONTROL_FILE_NAME);
    let buf = std::fs::read(&control_path)
        .with_context(|| format!("cannot read copied control file \"{control_path}\""))?;
    let mut control = ControlFileData::decode(&buf)?;
    info!(
        "setting minRecoveryPoint to {stop_lsn} (was {})",
        control.min_recovery_point
    );
    control.min_recovery_point = stop_lsn;
    control.min_recovery_point_tli = tli;
    let encoded = control.encode();
    utils::crashsafe::overwrite(&control_path, &encoded)?;

    // The entry in the file list must match the patched bytes.
    if let Some(entry) = files.iter().find(|f| f.rel_path == PG_CONTROL_FILE_NAME) {
        let mut result = entry.result.lock().unwrap();
        result.state = WriteState::Written(encoded.len() as u64);
        result.read_size = encoded.len() as u64;
        result.crc = crc32c::crc32c(&encoded);
    }
    Ok(())
}
