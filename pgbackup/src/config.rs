//! Per-instance configuration, stored as TOML next to the instance's
//! backups. Command-line flags override file values; `set-config` persists
//! them.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use utils::crashsafe;

use crate::catalog::Catalog;
use crate::compress::CompressAlg;

fn default_archive_timeout() -> u64 {
    300
}

fn default_replica_timeout() -> u64 {
    300
}

fn default_xlog_seg_size() -> usize {
    postgres_ffi::WAL_SEGMENT_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Data directory of the cluster being backed up.
    pub pgdata: Utf8PathBuf,

    /// Recorded at add-instance time; every backup cross-checks it against
    /// the live cluster and PGDATA.
    #[serde(default)]
    pub system_identifier: u64,

    /// libpq-style connection string for the backup connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,

    #[serde(default)]
    pub compress_alg: CompressAlg,
    #[serde(default = "default_compress_level")]
    pub compress_level: u32,

    /// How long to wait for WAL archiving / pg_stop_backup, in seconds.
    #[serde(default = "default_archive_timeout")]
    pub archive_timeout_secs: u64,
    /// How long to wait for a replica to catch up, in seconds.
    #[serde(default = "default_replica_timeout")]
    pub replica_timeout_secs: u64,

    /// Worker threads for the file copy; 0 picks the core count.
    #[serde(default)]
    pub num_threads: usize,

    #[serde(default = "default_xlog_seg_size")]
    pub xlog_seg_size: usize,

    /// Extra directories to archive, slot numbers 1.. in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_dirs: Vec<Utf8PathBuf>,
}

fn default_compress_level() -> u32 {
    1
}

impl InstanceConfig {
    pub fn new(pgdata: Utf8PathBuf) -> InstanceConfig {
        InstanceConfig {
            pgdata,
            system_identifier: 0,
            connection: None,
            compress_alg: CompressAlg::None,
            compress_level: default_compress_level(),
            archive_timeout_secs: default_archive_timeout(),
            replica_timeout_secs: default_replica_timeout(),
            num_threads: 0,
            xlog_seg_size: default_xlog_seg_size(),
            external_dirs: Vec::new(),
        }
    }

    pub fn load(catalog: &Catalog) -> Result<InstanceConfig> {
        let path = catalog.instance_config_path();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read instance config \"{path}\""))?;
        toml::from_str(&content).with_context(|| format!("malformed instance config \"{path}\""))
    }

    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let path = catalog.instance_config_path();
        let content = toml::to_string_pretty(self).context("serialize instance config")?;
        crashsafe::overwrite(&path, content.as_bytes())
            .with_context(|| format!("cannot write instance config \"{path}\""))
    }

    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads > 0 {
            self.num_threads
        } else {
            num_cpus::get()
        }
    }

    pub fn archive_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.archive_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;

    #[test]
    fn save_load_roundtrip() {
        let dir = tempdir().unwrap();
        Catalog::init_root(dir.path()).unwrap();
        let catalog = Catalog::new(dir.path().to_owned(), "main");
        catalog.add_instance().unwrap();

        let mut cfg = InstanceConfig::new(Utf8PathBuf::from("/var/lib/pgsql/11/data"));
        cfg.system_identifier = 0x1122334455667788;
        cfg.compress_alg = CompressAlg::Zlib;
        cfg.compress_level = 4;
        cfg.external_dirs = vec![Utf8PathBuf::from("/etc/postgresql")];
        cfg.save(&catalog).unwrap();

        let loaded = InstanceConfig::load(&catalog).unwrap();
        assert_eq!(loaded.pgdata, cfg.pgdata);
        assert_eq!(loaded.system_identifier, cfg.system_identifier);
        assert_eq!(loaded.compress_alg, CompressAlg::Zlib);
        assert_eq!(loaded.compress_level, 4);
        assert_eq!(loaded.external_dirs, cfg.external_dirs);
        assert_eq!(loaded.archive_timeout_secs, 300);
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let cfg: InstanceConfig = toml::from_str("pgdata = \"/data\"").unwrap();
        assert_eq!(cfg.pgdata, Utf8PathBuf::from("/data"));
        assert_eq!(cfg.xlog_seg_size, postgres_ffi::WAL_SEGMENT_SIZE);
        assert_eq!(cfg.compress_alg, CompressAlg::None);
        assert!(cfg.external_dirs.is_empty());
    }
}
