//! The restore pipeline: reconstruct a data directory by replaying a
//! backup chain from its base FULL image forward.

use std::os::unix::fs::PermissionsExt;

use anyhow::{bail, ensure, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use postgres_ffi::pg_constants::PG_TBLSPC_DIR;
use tracing::{debug, info, warn};

use crate::catalog::{
    self, Backup, BackupId, BackupStatus, Catalog, ChainOutcome, FileListEntry,
};
use crate::datafile;
use crate::{parse_program_version, LEGACY_COMPRESSED_PAGE_VERSION};

#[derive(Default)]
pub struct RestoreOptions {
    /// Accept ancestors that are not OK/DONE.
    pub no_validate: bool,
    /// Write a standby recovery configuration into the restored directory.
    pub as_replica: bool,
    /// Tablespace relocations, old path -> new path, applied to recreated
    /// symlinks.
    pub tablespace_mapping: Vec<(Utf8PathBuf, Utf8PathBuf)>,
}

/// Restore `id` into `dest`, which must be empty (or absent).
pub fn do_restore(
    catalog: &Catalog,
    id: BackupId,
    dest: &Utf8Path,
    opts: &RestoreOptions,
) -> Result<()> {
    let backups = catalog.list_backups()?;
    let target = catalog::find_backup(&backups, id)
        .with_context(|| format!("backup {id} does not exist"))?;

    match catalog::scan_parent_chain(&backups, target) {
        ChainOutcome::Broken { oldest } => {
            // The missing ancestor makes every descendant unusable; make
            // that durable before failing.
            for backup in &backups {
                if backup.status.is_complete()
                    && catalog::is_parent(&backups, oldest.id, backup, true)
                {
                    warn!("backup {} is orphaned because of a missing ancestor", backup.id);
                    catalog.write_backup_status(backup.id, BackupStatus::Orphan)?;
                }
            }
            bail!(
                "backup chain of {id} is broken: an ancestor of {} is missing",
                oldest.id
            );
        }
        ChainOutcome::Invalid { oldest_invalid } => {
            if !opts.no_validate {
                bail!(
                    "backup {} has status {}; the chain of {id} is not restorable",
                    oldest_invalid.id,
                    oldest_invalid.status
                );
            }
            warn!(
                "proceeding past backup {} with status {} because validation is disabled",
                oldest_invalid.id, oldest_invalid.status
            );
        }
        ChainOutcome::Intact { .. } => {}
    }

    let chain = catalog::chain_of(&backups, target)?;

    if dest.exists() {
        ensure!(
            dest.read_dir()?.next().is_none(),
            "restore destination is not empty: \"{dest}\""
        );
    } else {
        utils::crashsafe::create_dir_all(dest)?;
    }

    // Hold every chain member against concurrent deletion for the whole
    // restore.
    let mut _locks = Vec::new();
    for backup in &chain {
        _locks.push(catalog.lock_backup_exclusive(backup.id)?);
    }

    info!(
        "restoring backup {id} (chain of {} backups) into \"{dest}\"",
        chain.len()
    );
    for &backup in &chain {
        apply_backup(catalog, backup, dest, opts)
            .with_context(|| format!("failed to apply backup {}", backup.id))?;
    }

    // The tail of the chain knows the exact source size of every data file
    // it scanned; cut off anything older chain members left beyond it.
    let target_entries = catalog.read_backup_filelist(target.id)?;
    for entry in &target_entries {
        if entry.is_datafile && !entry.is_cfs {
            if let Some(n_blocks) = entry.n_blocks {
                let path = restored_path(dest, target, entry)?;
                if path.exists() {
                    datafile::truncate_to_blocks(&path, n_blocks)?;
                }
            }
        }
    }

    if opts.as_replica {
        write_recovery_conf(dest, target)?;
    }

    info!("restore of backup {id} completed");
    Ok(())
}

/// Destination path of one entry: inside the new data directory, or the
/// recorded external directory slot.
fn restored_path(dest: &Utf8Path, backup: &Backup, entry: &FileListEntry) -> Result<Utf8PathBuf> {
    if entry.external_dir_num == 0 {
        return Ok(dest.join(&entry.path));
    }
    let dirs = backup
        .external_dir_str
        .as_deref()
        .context("backup has external files but no external-dirs record")?;
    let root = dirs
        .split(':')
        .nth(entry.external_dir_num - 1)
        .with_context(|| format!("external directory {} is not recorded", entry.external_dir_num))?;
    Ok(Utf8PathBuf::from(root).join(&entry.path))
}

fn apply_backup(
    catalog: &Catalog,
    backup: &Backup,
    dest: &Utf8Path,
    opts: &RestoreOptions,
) -> Result<()> {
    let version = parse_program_version(&backup.program_version);
    // Old image quirks, decided per producing version.
    let use_crc32c = version <= 20021 || version >= 20025;
    let legacy_compressed_pages = version < LEGACY_COMPRESSED_PAGE_VERSION;

    let mut entries = catalog.read_backup_filelist(backup.id)?;
    entries.sort_by(|a, b| (a.external_dir_num, &a.path).cmp(&(b.external_dir_num, &b.path)));

    let database_path = catalog.database_path(backup.id);

    for entry in &entries {
        let to = restored_path(dest, backup, entry)?;

        if entry.is_dir() {
            create_dir_with_mode(&to, entry.permissions())?;
            continue;
        }

        if entry.is_symlink() {
            restore_symlink(entry, &to, opts)?;
            continue;
        }

        // Carried-over entries were materialized by an earlier chain member.
        if entry.size < 0 {
            debug!("\"{}\" is unchanged in {}, kept from an ancestor", entry.path, backup.id);
            continue;
        }

        let payload = if entry.external_dir_num == 0 {
            database_path.join(&entry.path)
        } else {
            catalog
                .external_dir_path(backup.id, entry.external_dir_num)
                .join(&entry.path)
        };

        if entry.is_datafile && !entry.is_cfs {
            datafile::restore_data_file(&payload, entry, &to, use_crc32c, legacy_compressed_pages)?;
        } else {
            datafile::copy_file(&payload, &to)?
                .with_context(|| format!("backup payload \"{payload}\" is missing"))?;
        }
        set_mode(&to, entry.permissions())?;
    }
    Ok(())
}

fn restore_symlink(entry: &FileListEntry, to: &Utf8Path, opts: &RestoreOptions) -> Result<()> {
    let recorded = entry
        .linked
        .as_deref()
        .with_context(|| format!("symlink \"{}\" has no recorded target", entry.path))?;
    let mut target = Utf8PathBuf::from(recorded);
    for (old, new) in &opts.tablespace_mapping {
        if let Ok(suffix) = target.strip_prefix(old) {
            target = new.join(suffix);
            break;
        }
    }
    if !entry.path.starts_with(PG_TBLSPC_DIR) && target != Utf8PathBuf::from(recorded) {
        warn!("mapping applied to non-tablespace symlink \"{}\"", entry.path);
    }

    if to.symlink_metadata().is_ok() {
        // recreated by an earlier chain member
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        utils::crashsafe::create_dir_all(parent)?;
    }
    std::os::unix::fs::symlink(&target, to)
        .with_context(|| format!("cannot create symlink \"{to}\" -> \"{target}\""))?;
    // Tablespace roots must exist for the server to start.
    if !target.exists() {
        utils::crashsafe::create_dir_all(&target)?;
    }
    Ok(())
}

fn create_dir_with_mode(path: &Utf8Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if path.is_dir() {
        return Ok(());
    }
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true).mode(if mode == 0 { 0o700 } else { mode });
    builder
        .create(path)
        .with_context(|| format!("cannot create directory \"{path}\""))
}

fn set_mode(path: &Utf8Path, mode: u32) -> Result<()> {
    if mode == 0 {
        return Ok(());
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("cannot change mode of \"{path}\""))
}

/// Minimal standby configuration, enough for the restored cluster to come
/// up as a replica of the original primary.
fn write_recovery_conf(dest: &Utf8Path, backup: &Backup) -> Result<()> {
    let mut conf = String::new();
    conf.push_str("# recovery.conf generated by pgbackup\n");
    conf.push_str("standby_mode = 'on'\n");
    if let Some(conninfo) = &backup.primary_conninfo {
        conf.push_str(&format!("primary_conninfo = '{conninfo}'\n"));
    }
    let path = dest.join("recovery.conf");
    std::fs::write(&path, conf).with_context(|| format!("cannot write \"{path}\""))?;
    info!("recovery configuration written to \"{path}\"");
    Ok(())
}
