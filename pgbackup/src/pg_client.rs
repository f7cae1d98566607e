//! The narrow interface to the live cluster: labelled queries over a normal
//! connection. The engine talks to `DatabaseClient` (and `BlockFetcher`
//! from worker threads) so tests can substitute a fake cluster.

use std::str::FromStr;
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use postgres::types::PgLsn;
use postgres::{Client, NoTls};
use postgres_ffi::Oid;
use tracing::{info, warn};
use utils::lsn::Lsn;

/// Everything `pg_stop_backup` hands back. The label and tablespace map are
/// present on the non-exclusive protocol only and must be persisted into
/// the backup image by the caller.
#[derive(Debug, Clone)]
pub struct StopBackupReply {
    pub stop_lsn: Lsn,
    pub backup_label: Option<String>,
    pub tablespace_map: Option<String>,
    /// current_timestamp at stop time, unix seconds; the fallback recovery
    /// time when the WAL scan finds no transactions.
    pub recovery_time: i64,
    /// txid_snapshot_xmax at stop time; the fallback recovery xid.
    pub recovery_xid: u64,
}

/// Labelled queries the backup engine needs from the cluster.
pub trait DatabaseClient {
    /// (server_version_num, human-readable version)
    fn server_version(&mut self) -> Result<(u32, String)>;
    fn current_setting(&mut self, name: &str) -> Result<String>;
    fn is_in_recovery(&mut self) -> Result<bool>;
    fn system_identifier(&mut self) -> Result<u64>;
    fn checkpoint_timeout(&mut self) -> Result<Duration>;

    fn start_backup(&mut self, label: &str, fast: bool, exclusive: bool) -> Result<Lsn>;
    /// Issue the stop marker. The call is bounded: past `timeout` the query
    /// is cancelled and an error returned.
    fn stop_backup(
        &mut self,
        exclusive: bool,
        from_replica: bool,
        timeout: Duration,
    ) -> Result<StopBackupReply>;
    fn switch_wal(&mut self) -> Result<Lsn>;
    fn create_restore_point(&mut self, name: &str) -> Result<Lsn>;

    fn last_wal_replay_lsn(&mut self) -> Result<Lsn>;
    fn last_wal_receive_lsn(&mut self) -> Result<Lsn>;
    fn current_checkpoint_location(&mut self) -> Result<Lsn>;

    fn ptrack_version(&mut self) -> Result<Option<String>>;
    fn ptrack_enabled(&mut self) -> Result<bool>;
    fn ptrack_control_lsn(&mut self) -> Result<Lsn>;
    /// Clear change maps instance-wide (taken by FULL backups so the next
    /// PTRACK backup starts from a clean slate).
    fn ptrack_clear(&mut self) -> Result<()>;
    /// Fetch and reset the change bitmap of one relation; eight heap blocks
    /// per byte. None when the server tracked nothing for the relation.
    fn ptrack_get_and_clear(&mut self, tblspc_oid: Oid, db_oid: Oid, rel_oid: Oid)
        -> Result<Option<Vec<u8>>>;
    /// True if the database had a `ptrack_init` marker, which invalidates
    /// per-relation bitmaps for the whole database.
    fn ptrack_get_and_clear_db(&mut self, db_oid: Oid, tblspc_oid: Oid) -> Result<bool>;

    fn tablespace_locations(&mut self) -> Result<Vec<String>>;
    /// Connection string of this session, recorded into backup metadata.
    fn primary_conninfo(&self) -> String;
}

/// Single-block fetch through the server, used from copy workers when a
/// page keeps failing verification on disk.
pub trait BlockFetcher: Send + Sync {
    fn fetch_block(
        &self,
        tblspc_oid: Oid,
        db_oid: Oid,
        rel_oid: Oid,
        absolute_blkno: u32,
    ) -> Result<Option<Vec<u8>>>;
}

fn pglsn_to_lsn(lsn: PgLsn) -> Lsn {
    Lsn(u64::from(lsn))
}

/// Production implementation over a libpq-style connection string.
pub struct PostgresClient {
    conninfo: String,
    /// Taken out while a cancellable query is in flight on another thread.
    client: Option<Client>,
}

impl PostgresClient {
    pub fn connect(conninfo: &str) -> Result<PostgresClient> {
        let config =
            postgres::Config::from_str(conninfo).context("invalid connection string")?;
        let client = config
            .connect(NoTls)
            .with_context(|| format!("could not connect to {conninfo}"))?;
        Ok(PostgresClient {
            conninfo: conninfo.to_owned(),
            client: Some(client),
        })
    }

    fn client(&mut self) -> &mut Client {
        self.client.as_mut().expect("connection is checked out")
    }

    fn query_lsn(&mut self, sql: &str) -> Result<Lsn> {
        let row = self.client().query_one(sql, &[])?;
        let lsn: PgLsn = row.get(0);
        Ok(pglsn_to_lsn(lsn))
    }
}

impl DatabaseClient for PostgresClient {
    fn server_version(&mut self) -> Result<(u32, String)> {
        let num: String = self
            .client()
            .query_one("SELECT current_setting('server_version_num')", &[])?
            .get(0);
        let num: u32 = num.parse().context("unparseable server_version_num")?;
        let human: String = self
            .client()
            .query_one("SELECT current_setting('server_version')", &[])?
            .get(0);
        Ok((num, human))
    }

    fn current_setting(&mut self, name: &str) -> Result<String> {
        let row = self
            .client()
            .query_one("SELECT pg_catalog.current_setting($1)", &[&name])?;
        Ok(row.get(0))
    }

    fn is_in_recovery(&mut self) -> Result<bool> {
        let row = self
            .client()
            .query_one("SELECT pg_catalog.pg_is_in_recovery()", &[])?;
        Ok(row.get(0))
    }

    fn system_identifier(&mut self) -> Result<u64> {
        let row = self
            .client()
            .query_one("SELECT system_identifier FROM pg_catalog.pg_control_system()", &[])?;
        let id: i64 = row.get(0);
        Ok(id as u64)
    }

    fn checkpoint_timeout(&mut self) -> Result<Duration> {
        let value = self.current_setting("checkpoint_timeout")?;
        // The setting comes back with a unit, "300s" style.
        let timeout = humantime::parse_duration(&value)
            .with_context(|| format!("invalid checkpoint_timeout value {value:?}"))?;
        Ok(timeout)
    }

    fn start_backup(&mut self, label: &str, fast: bool, exclusive: bool) -> Result<Lsn> {
        let sql = if exclusive {
            "SELECT pg_catalog.pg_start_backup($1, $2)"
        } else {
            "SELECT pg_catalog.pg_start_backup($1, $2, false)"
        };
        let row = self.client().query_one(sql, &[&label, &fast])?;
        let lsn: PgLsn = row.get(0);
        Ok(pglsn_to_lsn(lsn))
    }

    fn stop_backup(
        &mut self,
        exclusive: bool,
        from_replica: bool,
        timeout: Duration,
    ) -> Result<StopBackupReply> {
        // The stop marker can hang on a broken archive_command, so it runs
        // on a helper thread while we keep the cancel token; past the
        // timeout the query is cancelled server-side.
        let sql = if exclusive {
            "SELECT pg_catalog.txid_snapshot_xmax(pg_catalog.txid_current_snapshot())::text,\
             extract(epoch from current_timestamp(0))::bigint,\
             pg_catalog.pg_stop_backup() AS lsn, NULL::text, NULL::text"
        } else if from_replica {
            // On a replica the reported stop LSN is not trustworthy; use the
            // latest replayed position instead.
            "SELECT pg_catalog.txid_snapshot_xmax(pg_catalog.txid_current_snapshot())::text,\
             extract(epoch from current_timestamp(0))::bigint,\
             pg_catalog.pg_last_wal_replay_lsn(), labelfile, spcmapfile\
             FROM pg_catalog.pg_stop_backup(false, false)"
        } else {
            "SELECT pg_catalog.txid_snapshot_xmax(pg_catalog.txid_current_snapshot())::text,\
             extract(epoch from current_timestamp(0))::bigint,\
             lsn, labelfile, spcmapfile\
             FROM pg_catalog.pg_stop_backup(false, false)"
        };

        let mut client = self.client.take().expect("connection is checked out");
        let cancel_token = client.cancel_token();
        let (tx, rx) = mpsc::channel();
        let worker = std::thread::spawn(move || {
            let result = client.query_one(sql, &[]);
            // The receiver may be gone after a timeout; nothing to do then.
            let _ = tx.send((client, result));
        });

        match rx.recv_timeout(timeout) {
            Ok((client, result)) => {
                let _ = worker.join();
                self.client = Some(client);
                let row = result.context("pg_stop_backup() failed")?;
                let xid: String = row.get(0);
                let recovery_time: i64 = row.get(1);
                let lsn: PgLsn = row.get(2);
                let backup_label: Option<String> = row.get(3);
                let tablespace_map: Option<String> = row.get(4);
                Ok(StopBackupReply {
                    stop_lsn: pglsn_to_lsn(lsn),
                    backup_label: backup_label.filter(|s| !s.is_empty()),
                    tablespace_map: tablespace_map.filter(|s| !s.is_empty()),
                    recovery_time,
                    recovery_xid: xid.parse().context("invalid txid_snapshot_xmax result")?,
                })
            }
            Err(_) => {
                warn!(
                    "pg_stop_backup doesn't answer in {} seconds, cancel it",
                    timeout.as_secs()
                );
                if let Err(e) = cancel_token.cancel_query(NoTls) {
                    warn!("failed to cancel pg_stop_backup: {e:#}");
                }
                // Reclaim the connection once the worker unblocks.
                if let Ok((client, _)) = rx.recv_timeout(Duration::from_secs(10)) {
                    self.client = Some(client);
                }
                let _ = worker.join();
                bail!(
                    "pg_stop_backup doesn't answer in {} seconds",
                    timeout.as_secs()
                );
            }
        }
    }

    fn switch_wal(&mut self) -> Result<Lsn> {
        self.client()
            .batch_execute("SET client_min_messages = warning")?;
        self.query_lsn("SELECT * FROM pg_catalog.pg_switch_wal()")
    }

    fn create_restore_point(&mut self, name: &str) -> Result<Lsn> {
        let row = self
            .client()
            .query_one("SELECT pg_catalog.pg_create_restore_point($1)", &[&name])?;
        let lsn: PgLsn = row.get(0);
        Ok(pglsn_to_lsn(lsn))
    }

    fn last_wal_replay_lsn(&mut self) -> Result<Lsn> {
        self.query_lsn("SELECT pg_catalog.pg_last_wal_replay_lsn()")
    }

    fn last_wal_receive_lsn(&mut self) -> Result<Lsn> {
        self.query_lsn("SELECT pg_catalog.pg_last_wal_receive_lsn()")
    }

    fn current_checkpoint_location(&mut self) -> Result<Lsn> {
        self.query_lsn("SELECT checkpoint_lsn FROM pg_catalog.pg_control_checkpoint()")
    }

    fn ptrack_version(&mut self) -> Result<Option<String>> {
        let rows = self.client().query(
            "SELECT proname FROM pg_proc WHERE proname = 'ptrack_version'",
            &[],
        )?;
        if rows.is_empty() {
            return Ok(None);
        }
        let row = self
            .client()
            .query_one("SELECT pg_catalog.ptrack_version()", &[])?;
        let version: String = row.get(0);
        // Versions older than 1.5 had an incompatible interface.
        if !matches!(version.as_str(), "1.5" | "1.6" | "1.7") {
            warn!("update the ptrack extension to version 1.5 or later, current version is {version}");
            return Ok(None);
        }
        Ok(Some(version))
    }

    fn ptrack_enabled(&mut self) -> Result<bool> {
        Ok(self.current_setting("ptrack_enable")? == "on")
    }

    fn ptrack_control_lsn(&mut self) -> Result<Lsn> {
        self.query_lsn("SELECT pg_catalog.pg_ptrack_control_lsn()")
    }

    fn ptrack_clear(&mut self) -> Result<()> {
        info!("clearing ptrack change maps");
        self.client()
            .batch_execute("SELECT pg_catalog.pg_ptrack_clear()")?;
        Ok(())
    }

    fn ptrack_get_and_clear(
        &mut self,
        tblspc_oid: Oid,
        db_oid: Oid,
        rel_oid: Oid,
    ) -> Result<Option<Vec<u8>>> {
        let row = self.client().query_one(
            "SELECT pg_catalog.pg_ptrack_get_and_clear($1, $2)",
            &[&(tblspc_oid as i64), &(rel_oid as i64)],
        )?;
        let _ = db_oid;
        let map: Option<Vec<u8>> = row.get(0);
        Ok(map.filter(|m| !m.is_empty()))
    }

    fn ptrack_get_and_clear_db(&mut self, db_oid: Oid, tblspc_oid: Oid) -> Result<bool> {
        let row = self.client().query_one(
            "SELECT pg_catalog.pg_ptrack_get_and_clear_db($1, $2)",
            &[&(db_oid as i64), &(tblspc_oid as i64)],
        )?;
        Ok(row.get(0))
    }

    fn tablespace_locations(&mut self) -> Result<Vec<String>> {
        let rows = self.client().query(
            "SELECT pg_catalog.pg_tablespace_location(oid) FROM pg_catalog.pg_tablespace \
             WHERE pg_catalog.pg_tablespace_location(oid) <> ''",
            &[],
        )?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    fn primary_conninfo(&self) -> String {
        self.conninfo.clone()
    }
}

/// PTRACK block fetch over its own lazily opened connection, shareable
/// between worker threads.
pub struct PostgresBlockFetcher {
    conninfo: String,
    conn: Mutex<Option<Client>>,
}

impl PostgresBlockFetcher {
    pub fn new(conninfo: String) -> PostgresBlockFetcher {
        PostgresBlockFetcher {
            conninfo,
            conn: Mutex::new(None),
        }
    }
}

impl BlockFetcher for PostgresBlockFetcher {
    fn fetch_block(
        &self,
        tblspc_oid: Oid,
        db_oid: Oid,
        rel_oid: Oid,
        absolute_blkno: u32,
    ) -> Result<Option<Vec<u8>>> {
        let mut guard = self.conn.lock().unwrap();
        if guard.is_none() {
            let config = postgres::Config::from_str(&self.conninfo)
                .context("invalid connection string")?;
            *guard = Some(config.connect(NoTls).context("ptrack fetch connection")?);
        }
        let client = guard.as_mut().unwrap();
        let row = client.query_one(
            "SELECT pg_catalog.pg_ptrack_get_block_2($1, $2, $3, $4)",
            &[
                &(tblspc_oid as i64),
                &(db_oid as i64),
                &(rel_oid as i64),
                &(absolute_blkno as i64),
            ],
        )?;
        let block: Option<Vec<u8>> = row.get(0);
        ensure!(
            block.as_ref().map_or(true, |b| b.len() == postgres_ffi::BLCKSZ as usize),
            "server returned a block of unexpected size"
        );
        Ok(block)
    }
}
