//! The `show` command: render the catalog for humans.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use comfy_table::{Cell, Table};

use crate::catalog::{self, BackupId, Catalog};

fn format_bytes(bytes: Option<u64>) -> String {
    match bytes {
        None => "----".to_owned(),
        Some(b) if b < 10 * 1024 => format!("{b}B"),
        Some(b) if b < 10 * 1024 * 1024 => format!("{}kB", b / 1024),
        Some(b) if b < 10 * 1024 * 1024 * 1024 => format!("{}MB", b / 1024 / 1024),
        Some(b) => format!("{}GB", b / 1024 / 1024 / 1024),
    }
}

fn format_time(unix_secs: Option<i64>) -> String {
    match unix_secs {
        None => "----".to_owned(),
        Some(t) => Utc
            .timestamp_opt(t, 0)
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    }
}

/// A table of all backups of the instance, newest first.
pub fn show_instance(catalog: &Catalog) -> Result<String> {
    let backups = catalog.list_backups()?;

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header([
        "Instance",
        "ID",
        "Parent",
        "Recovery Time",
        "Mode",
        "WAL",
        "TLI",
        "Data",
        "Start LSN",
        "Stop LSN",
        "Status",
    ]);

    for backup in &backups {
        table.add_row([
            Cell::new(&catalog.instance),
            Cell::new(backup.id),
            Cell::new(
                backup
                    .parent
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "----".to_owned()),
            ),
            Cell::new(format_time(backup.recovery_time)),
            Cell::new(backup.mode),
            Cell::new(if backup.stream { "STREAM" } else { "ARCHIVE" }),
            Cell::new(backup.tli),
            Cell::new(format_bytes(backup.data_bytes)),
            Cell::new(backup.start_lsn),
            Cell::new(backup.stop_lsn),
            Cell::new(backup.status),
        ]);
    }
    Ok(table.to_string())
}

/// Detailed view of one backup: its control file, verbatim.
pub fn show_backup(catalog: &Catalog, id: BackupId) -> Result<String> {
    let backup = catalog.read_backup(id)?;
    Ok(catalog::serialize_backup_control(&backup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Backup, BackupMode, BackupStatus};
    use camino_tempfile::tempdir;

    #[test]
    fn instance_table_renders() {
        let dir = tempdir().unwrap();
        Catalog::init_root(dir.path()).unwrap();
        let catalog = Catalog::new(dir.path().to_owned(), "main");
        catalog.add_instance().unwrap();

        let mut b = Backup::new(BackupId(1700000000), BackupMode::Full);
        b.status = BackupStatus::Ok;
        b.tli = 1;
        b.data_bytes = Some(42 * 1024 * 1024);
        b.recovery_time = Some(1700000009);
        catalog.create_backup_dir(&b, 0).unwrap();
        catalog.write_backup(&b).unwrap();

        let rendered = show_instance(&catalog).unwrap();
        assert!(rendered.contains("main"));
        assert!(rendered.contains("FULL"));
        assert!(rendered.contains("42MB"));
        assert!(rendered.contains("OK"));
        assert!(rendered.contains(&BackupId(1700000000).to_string()));

        let detail = show_backup(&catalog, b.id).unwrap();
        assert!(detail.contains("backup-mode = FULL"));
        assert!(detail.contains("status = OK"));
    }
}
