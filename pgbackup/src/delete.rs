//! Deleting a backup and everything that descends from it.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::catalog::{self, BackupId, BackupStatus, Catalog};

/// Delete `id` and all backups whose chain passes through it. The catalog
/// stays usable for everything else even if we are interrupted midway.
pub fn do_delete(catalog: &Catalog, id: BackupId) -> Result<()> {
    let backups = catalog.list_backups()?;
    catalog::find_backup(&backups, id).with_context(|| format!("backup {id} does not exist"))?;

    // Children first: the list is sorted newest-first, and every child is
    // newer than its parent.
    let victims: Vec<BackupId> = backups
        .iter()
        .filter(|b| catalog::is_parent(&backups, id, b, true))
        .map(|b| b.id)
        .collect();

    // Refuse the whole operation if any member is in use.
    let mut locks = Vec::new();
    for &victim in &victims {
        locks.push(catalog.lock_backup_exclusive(victim)?);
    }

    for &victim in &victims {
        if victim != id {
            warn!("backup {victim} descends from {id}, deleting it too");
        }
        catalog.write_backup_status(victim, BackupStatus::Deleting)?;
        let path = catalog.backup_path(victim);
        std::fs::remove_dir_all(&path)
            .with_context(|| format!("cannot remove backup directory \"{path}\""))?;
        info!("backup {victim} deleted");
    }
    drop(locks);
    Ok(())
}
