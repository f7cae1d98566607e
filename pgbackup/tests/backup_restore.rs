//! End-to-end exercises over a synthetic data directory and a mock cluster:
//! full and incremental backups, validation, corruption handling, restore.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::{tempdir, Utf8TempDir};

use pgbackup::backup::{do_backup, BackupEnv, BackupOptions};
use pgbackup::catalog::{BackupId, BackupMode, BackupStatus, Catalog};
use pgbackup::compress::CompressAlg;
use pgbackup::config::InstanceConfig;
use pgbackup::pg_client::{BlockFetcher, DatabaseClient, StopBackupReply};
use pgbackup::restore::{do_restore, RestoreOptions};

use postgres_ffi::controlfile_utils::ControlFileData;
use postgres_ffi::page::set_page_checksum;
use postgres_ffi::pg_constants::{RM_XACT_ID, XLOG_XACT_COMMIT};
use postgres_ffi::waldecoder::wal_generator::WalGenerator;
use postgres_ffi::waldecoder::RelFileNode;
use postgres_ffi::{Oid, BLCKSZ, RELSEG_SIZE, WAL_SEGMENT_SIZE};
use utils::lsn::Lsn;

const SYSID: u64 = 0x4A5B_6C7D_8E9F_0011;
const TLI: u32 = 1;
const DB_OID: Oid = 13010;
const REL_MAIN: Oid = 16384;
const REL_SMALL: Oid = 16385;

fn make_page(lsn: Lsn, absolute_blkno: u32, filler: u8) -> Vec<u8> {
    let mut page = vec![0u8; BLCKSZ as usize];
    page[0..4].copy_from_slice(&((lsn.0 >> 32) as u32).to_le_bytes());
    page[4..8].copy_from_slice(&(lsn.0 as u32).to_le_bytes());
    page[12..14].copy_from_slice(&24u16.to_le_bytes()); // pd_lower
    page[14..16].copy_from_slice(&BLCKSZ.to_le_bytes()); // pd_upper
    page[16..18].copy_from_slice(&BLCKSZ.to_le_bytes()); // pd_special
    page[18..20].copy_from_slice(&(BLCKSZ | 4).to_le_bytes()); // size | layout version
    for (i, b) in page.iter_mut().enumerate().skip(24) {
        *b = filler.wrapping_add(i as u8);
    }
    set_page_checksum(&mut page, absolute_blkno);
    page
}

fn write_relation(pgdata: &Utf8Path, rel_path: &str, n_pages: u32, lsn: Lsn, filler: u8) {
    let path = pgdata.join(rel_path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut content = Vec::with_capacity((n_pages * BLCKSZ as u32) as usize);
    for blkno in 0..n_pages {
        content.extend_from_slice(&make_page(lsn, blkno, filler.wrapping_add(blkno as u8)));
    }
    std::fs::write(&path, content).unwrap();
}

struct TestCluster {
    _pgdata_dir: Utf8TempDir,
    _root_dir: Utf8TempDir,
    pgdata: Utf8PathBuf,
    catalog: Catalog,
    config: InstanceConfig,
    /// Interesting LSNs laid into the WAL archive.
    start1: Lsn,
    stop1: Lsn,
    start2: Lsn,
    stop2: Lsn,
    commit2_xid: u32,
}

/// A small but complete-looking cluster: a 1 MiB relation, a few small
/// ones, enough filler entries to pass the sanity floor, a control file,
/// and a WAL archive with two backup windows worth of records.
fn setup_cluster() -> TestCluster {
    let pgdata_dir = tempdir().unwrap();
    let root_dir = tempdir().unwrap();
    let pgdata = pgdata_dir.path().to_owned();

    // 1 MiB main relation: 128 pages, stamped well before any backup LSN.
    write_relation(&pgdata, &format!("base/{DB_OID}/{REL_MAIN}"), 128, Lsn(0x0100_0010), 1);
    write_relation(&pgdata, &format!("base/{DB_OID}/{REL_SMALL}"), 3, Lsn(0x0100_0010), 77);
    std::fs::write(pgdata.join(format!("base/{DB_OID}/PG_VERSION")), "11\n").unwrap();
    std::fs::write(pgdata.join("PG_VERSION"), "11\n").unwrap();

    // Empty relations as filler, so the inventory clears its sanity floor.
    for oid in 20000..20110 {
        std::fs::write(pgdata.join(format!("base/{DB_OID}/{oid}")), b"").unwrap();
    }

    for dir in ["pg_wal", "pg_tblspc", "pg_notify", "pg_snapshots", "global"] {
        std::fs::create_dir_all(pgdata.join(dir)).unwrap();
    }

    let control = ControlFileData::new_synthetic(SYSID, TLI, true);
    std::fs::write(pgdata.join("global/pg_control"), control.encode()).unwrap();

    Catalog::init_root(root_dir.path()).unwrap();
    let catalog = Catalog::new(root_dir.path().to_owned(), "node1");
    catalog.add_instance().unwrap();

    let mut config = InstanceConfig::new(pgdata.clone());
    config.system_identifier = SYSID;
    config.compress_alg = CompressAlg::Zlib;
    config.compress_level = 1;
    config.archive_timeout_secs = 10;
    config.num_threads = 2;
    config.save(&catalog).unwrap();

    // WAL archive: two windows of records with commits in between. The
    // previous segment exists so start-marker waits succeed immediately.
    let wal_dir = catalog.instance_wal_path();
    std::fs::write(
        wal_dir.join(postgres_ffi::XLogFileName(TLI, 0, WAL_SEGMENT_SIZE)),
        b"",
    )
    .unwrap();

    let rnode = RelFileNode {
        spcnode: 1663,
        dbnode: DB_OID,
        relnode: REL_MAIN,
    };
    let mut gen = WalGenerator::new(TLI, WAL_SEGMENT_SIZE, Lsn(0x0100_0000));
    let start1 = gen.append_record(10, 10, 0, &[(rnode, 0, 1)], b"first");
    {
        let ts: i64 = 700_000_000_000_000;
        let mut data = ts.to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 8]);
        gen.append_record(501, RM_XACT_ID, XLOG_XACT_COMMIT, &[], &data);
    }
    let stop1 = gen.append_record(11, 10, 0, &[(rnode, 0, 2)], b"second");
    // a change landing between the two backup windows
    gen.append_record(12, 10, 0, &[(rnode, 0, 5)], b"between");
    let start2 = gen.append_record(13, 10, 0, &[(rnode, 0, 6)], b"third");
    let commit2_xid = 502;
    {
        let ts: i64 = 700_000_060_000_000;
        let mut data = ts.to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 8]);
        gen.append_record(commit2_xid, RM_XACT_ID, XLOG_XACT_COMMIT, &[], &data);
    }
    let stop2 = gen.append_record(14, 10, 0, &[(rnode, 0, 7)], b"fourth");
    // one trailing record so stop2 is a complete record in the archive
    gen.append_record(15, 10, 0, &[(rnode, 0, 8)], b"tail");
    gen.write_to_dir(&wal_dir, false).unwrap();

    TestCluster {
        _pgdata_dir: pgdata_dir,
        _root_dir: root_dir,
        pgdata,
        catalog,
        config,
        start1,
        stop1,
        start2,
        stop2,
        commit2_xid,
    }
}

/// Scripted stand-in for the live cluster.
struct MockClient {
    start_lsn: Lsn,
    stop_lsn: Lsn,
    in_recovery: bool,
    ptrack_version: Option<String>,
    ptrack_enabled: bool,
    ptrack_control_lsn: Lsn,
    /// (tblspc, db, rel) -> raw bitmap handed out by get_and_clear.
    ptrack_maps: HashMap<(Oid, Oid, Oid), Vec<u8>>,
    /// Invoked on the first per-database ptrack call; lets tests mutate the
    /// data directory between inventory and copy.
    on_ptrack_db: Option<Box<dyn FnMut() + Send>>,
    started: u32,
    stopped: u32,
}

impl MockClient {
    fn new(start_lsn: Lsn, stop_lsn: Lsn) -> MockClient {
        MockClient {
            start_lsn,
            stop_lsn,
            in_recovery: false,
            ptrack_version: None,
            ptrack_enabled: false,
            ptrack_control_lsn: Lsn::INVALID,
            ptrack_maps: HashMap::new(),
            on_ptrack_db: None,
            started: 0,
            stopped: 0,
        }
    }
}

impl DatabaseClient for MockClient {
    fn server_version(&mut self) -> Result<(u32, String)> {
        Ok((110005, "11.5".to_owned()))
    }

    fn current_setting(&mut self, name: &str) -> Result<String> {
        Ok(match name {
            "block_size" => "8192".to_owned(),
            "wal_block_size" => "8192".to_owned(),
            "data_checksums" => "on".to_owned(),
            "checkpoint_timeout" => "300s".to_owned(),
            other => anyhow::bail!("unexpected setting {other}"),
        })
    }

    fn is_in_recovery(&mut self) -> Result<bool> {
        Ok(self.in_recovery)
    }

    fn system_identifier(&mut self) -> Result<u64> {
        Ok(SYSID)
    }

    fn checkpoint_timeout(&mut self) -> Result<Duration> {
        Ok(Duration::from_secs(300))
    }

    fn start_backup(&mut self, _label: &str, _fast: bool, _exclusive: bool) -> Result<Lsn> {
        self.started += 1;
        Ok(self.start_lsn)
    }

    fn stop_backup(
        &mut self,
        exclusive: bool,
        _from_replica: bool,
        _timeout: Duration,
    ) -> Result<StopBackupReply> {
        self.stopped += 1;
        Ok(StopBackupReply {
            stop_lsn: self.stop_lsn,
            backup_label: (!exclusive).then(|| {
                format!("START WAL LOCATION: {} (file unknown)\n", self.start_lsn)
            }),
            tablespace_map: None,
            recovery_time: 1_600_000_000,
            recovery_xid: 4242,
        })
    }

    fn switch_wal(&mut self) -> Result<Lsn> {
        Ok(self.start_lsn)
    }

    fn create_restore_point(&mut self, _name: &str) -> Result<Lsn> {
        Ok(self.start_lsn)
    }

    fn last_wal_replay_lsn(&mut self) -> Result<Lsn> {
        Ok(self.stop_lsn)
    }

    fn last_wal_receive_lsn(&mut self) -> Result<Lsn> {
        Ok(self.stop_lsn)
    }

    fn current_checkpoint_location(&mut self) -> Result<Lsn> {
        Ok(self.start_lsn)
    }

    fn ptrack_version(&mut self) -> Result<Option<String>> {
        Ok(self.ptrack_version.clone())
    }

    fn ptrack_enabled(&mut self) -> Result<bool> {
        Ok(self.ptrack_enabled)
    }

    fn ptrack_control_lsn(&mut self) -> Result<Lsn> {
        Ok(self.ptrack_control_lsn)
    }

    fn ptrack_clear(&mut self) -> Result<()> {
        Ok(())
    }

    fn ptrack_get_and_clear(
        &mut self,
        tblspc_oid: Oid,
        db_oid: Oid,
        rel_oid: Oid,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self.ptrack_maps.get(&(tblspc_oid, db_oid, rel_oid)).cloned())
    }

    fn ptrack_get_and_clear_db(&mut self, _db_oid: Oid, _tblspc_oid: Oid) -> Result<bool> {
        if let Some(mut hook) = self.on_ptrack_db.take() {
            hook();
        }
        Ok(false)
    }

    fn tablespace_locations(&mut self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn primary_conninfo(&self) -> String {
        "host=db.example port=5432 user=backup".to_owned()
    }
}

/// Serves blocks out of the live data directory, with optional overrides;
/// what the server-side ptrack block fetch would return.
struct PgdataFetcher {
    pgdata: Utf8PathBuf,
    overrides: Mutex<HashMap<(Oid, u32), Vec<u8>>>,
}

impl PgdataFetcher {
    fn new(pgdata: Utf8PathBuf) -> PgdataFetcher {
        PgdataFetcher {
            pgdata,
            overrides: Mutex::new(HashMap::new()),
        }
    }

    fn with_override(self, rel_oid: Oid, blkno: u32, page: Vec<u8>) -> PgdataFetcher {
        self.overrides.lock().unwrap().insert((rel_oid, blkno), page);
        self
    }
}

impl BlockFetcher for PgdataFetcher {
    fn fetch_block(
        &self,
        _tblspc_oid: Oid,
        db_oid: Oid,
        rel_oid: Oid,
        absolute_blkno: u32,
    ) -> Result<Option<Vec<u8>>> {
        if let Some(page) = self.overrides.lock().unwrap().get(&(rel_oid, absolute_blkno)) {
            return Ok(Some(page.clone()));
        }
        let segno = absolute_blkno / RELSEG_SIZE;
        let blkno = absolute_blkno % RELSEG_SIZE;
        let mut path = self.pgdata.join(format!("base/{db_oid}/{rel_oid}"));
        if segno > 0 {
            path = Utf8PathBuf::from(format!("{path}.{segno}"));
        }
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let offset = blkno as usize * BLCKSZ as usize;
        if offset + BLCKSZ as usize > content.len() {
            return Ok(None);
        }
        Ok(Some(content[offset..offset + BLCKSZ as usize].to_vec()))
    }
}

fn run_backup(
    cluster: &TestCluster,
    client: &mut MockClient,
    mode: BackupMode,
    fetcher: Option<Arc<dyn BlockFetcher>>,
) -> Result<BackupId> {
    let opts = BackupOptions {
        mode,
        stream: false,
        compress_alg: CompressAlg::Zlib,
        compress_level: 1,
        num_threads: 2,
        fast_checkpoint: true,
        no_validate: false,
    };
    let env = BackupEnv {
        catalog: &cluster.catalog,
        config: &cluster.config,
        client,
        fetcher,
        streamer: None,
        interrupted: Arc::new(AtomicBool::new(false)),
    };
    do_backup(env, &opts)
}

fn assert_same_file(a: &Utf8Path, b: &Utf8Path) {
    assert_eq!(
        std::fs::read(a).unwrap(),
        std::fs::read(b).unwrap(),
        "{a} and {b} differ"
    );
}

#[test]
fn full_backup_restore_roundtrip() {
    let cluster = setup_cluster();
    let mut client = MockClient::new(cluster.start1, cluster.stop1);

    let id = run_backup(&cluster, &mut client, BackupMode::Full, None).unwrap();
    assert_eq!(client.started, 1);
    assert_eq!(client.stopped, 1);

    let backup = cluster.catalog.read_backup(id).unwrap();
    assert_eq!(backup.status, BackupStatus::Ok);
    assert_eq!(backup.mode, BackupMode::Full);
    assert_eq!(backup.start_lsn, cluster.start1);
    assert_eq!(backup.stop_lsn, cluster.stop1);
    assert_eq!(backup.tli, TLI);
    assert!(backup.parent.is_none());
    // pages compress, but the image must at least hold the control file
    let data_bytes = backup.data_bytes.unwrap();
    assert!(data_bytes > BLCKSZ as u64 && data_bytes < 2 * 1024 * 1024);
    // the commit between start and stop is the recovery point
    assert_eq!(backup.recovery_xid, 501);
    assert!(backup.checksum_version == 1);
    assert!(backup.wal_bytes.is_some());

    let dest = tempdir().unwrap();
    do_restore(&cluster.catalog, id, dest.path(), &RestoreOptions::default()).unwrap();

    for rel in [
        format!("base/{DB_OID}/{REL_MAIN}"),
        format!("base/{DB_OID}/{REL_SMALL}"),
        format!("base/{DB_OID}/PG_VERSION"),
        "PG_VERSION".to_owned(),
        "global/pg_control".to_owned(),
    ] {
        assert_same_file(&cluster.pgdata.join(&rel), &dest.path().join(&rel));
    }
    // the stop-marker blob made it into the image
    assert!(dest.path().join("backup_label").exists());
    // excluded runtime directories were recreated empty
    assert!(dest.path().join("pg_wal").is_dir());
}

#[test]
fn delta_backup_copies_one_changed_page() {
    let cluster = setup_cluster();

    let mut client = MockClient::new(cluster.start1, cluster.stop1);
    let full_id = run_backup(&cluster, &mut client, BackupMode::Full, None).unwrap();

    // Change exactly one page, stamping it past the parent's start LSN.
    let rel_path = cluster.pgdata.join(format!("base/{DB_OID}/{REL_MAIN}"));
    let mut content = std::fs::read(&rel_path).unwrap();
    let new_page = make_page(cluster.start2, 5, 0xEE);
    let off = 5 * BLCKSZ as usize;
    content[off..off + BLCKSZ as usize].copy_from_slice(&new_page);
    std::fs::write(&rel_path, &content).unwrap();

    let mut client = MockClient::new(cluster.start2, cluster.stop2);
    let delta_id = run_backup(&cluster, &mut client, BackupMode::Delta, None).unwrap();
    assert!(delta_id > full_id);

    let delta = cluster.catalog.read_backup(delta_id).unwrap();
    assert_eq!(delta.status, BackupStatus::Ok);
    assert_eq!(delta.parent, Some(full_id));
    assert_eq!(delta.recovery_xid, cluster.commit2_xid as u64);
    // one changed page plus the control file and the stop-marker blob
    let data_bytes = delta.data_bytes.unwrap();
    assert!(
        data_bytes >= BLCKSZ as u64 && data_bytes <= 4 * BLCKSZ as u64,
        "delta data_bytes = {data_bytes}"
    );

    let dest = tempdir().unwrap();
    do_restore(&cluster.catalog, delta_id, dest.path(), &RestoreOptions::default()).unwrap();
    assert_same_file(&rel_path, &dest.path().join(format!("base/{DB_OID}/{REL_MAIN}")));
    assert_same_file(
        &cluster.pgdata.join(format!("base/{DB_OID}/{REL_SMALL}")),
        &dest.path().join(format!("base/{DB_OID}/{REL_SMALL}")),
    );
}

#[test]
fn corrupt_page_fails_without_server_fallback() {
    let cluster = setup_cluster();

    // Flip a byte in block 7 so its checksum no longer matches.
    let rel_path = cluster.pgdata.join(format!("base/{DB_OID}/{REL_MAIN}"));
    let mut content = std::fs::read(&rel_path).unwrap();
    let good_page = content[7 * BLCKSZ as usize..8 * BLCKSZ as usize].to_vec();
    content[7 * BLCKSZ as usize + 100] ^= 0x01;
    std::fs::write(&rel_path, &content).unwrap();

    let mut client = MockClient::new(cluster.start1, cluster.stop1);
    let err = run_backup(&cluster, &mut client, BackupMode::Full, None).unwrap_err();
    assert!(format!("{err:#}").contains("corruption"), "got: {err:#}");
    // the cluster-side marker was released on the failure path
    assert_eq!(client.started, 1);
    assert_eq!(client.stopped, 1);
    // no DONE/OK backup was produced
    let backups = cluster.catalog.list_backups().unwrap();
    assert!(backups.iter().all(|b| b.status == BackupStatus::Error));

    // With the server-side fetch available the same backup completes, using
    // the intact copy of block 7.
    let mut client = MockClient::new(cluster.start1, cluster.stop1);
    client.ptrack_version = Some("1.7".to_owned());
    let fetcher = Arc::new(
        PgdataFetcher::new(cluster.pgdata.clone()).with_override(REL_MAIN, 7, good_page.clone()),
    );
    let id = run_backup(&cluster, &mut client, BackupMode::Full, Some(fetcher)).unwrap();
    let backup = cluster.catalog.read_backup(id).unwrap();
    assert_eq!(backup.status, BackupStatus::Ok);

    let dest = tempdir().unwrap();
    do_restore(&cluster.catalog, id, dest.path(), &RestoreOptions::default()).unwrap();
    let restored = std::fs::read(dest.path().join(format!("base/{DB_OID}/{REL_MAIN}"))).unwrap();
    assert_eq!(&restored[7 * BLCKSZ as usize..8 * BLCKSZ as usize], &good_page[..]);
}

#[test]
fn ptrack_backup_with_concurrent_deletion() {
    let cluster = setup_cluster();

    let mut client = MockClient::new(cluster.start1, cluster.stop1);
    let full_id = run_backup(&cluster, &mut client, BackupMode::Full, None).unwrap();
    let full = cluster.catalog.read_backup(full_id).unwrap();

    // Change page 5 and page 9 of the main relation.
    let rel_path = cluster.pgdata.join(format!("base/{DB_OID}/{REL_MAIN}"));
    let mut content = std::fs::read(&rel_path).unwrap();
    for blkno in [5usize, 9] {
        let page = make_page(cluster.start2, blkno as u32, 0xAB);
        content[blkno * BLCKSZ as usize..(blkno + 1) * BLCKSZ as usize].copy_from_slice(&page);
    }
    std::fs::write(&rel_path, &content).unwrap();

    // A non-critical file that will vanish between inventory and copy.
    let doomed = cluster.pgdata.join(format!("base/{DB_OID}/doomed.conf"));
    std::fs::write(&doomed, "going away\n").unwrap();

    let mut client = MockClient::new(cluster.start2, cluster.stop2);
    client.ptrack_version = Some("1.7".to_owned());
    client.ptrack_enabled = true;
    client.ptrack_control_lsn = full.stop_lsn;
    // bits for blocks 5 and 9: bytes 0b0010_0000 and 0b0000_0010
    client
        .ptrack_maps
        .insert((1663, DB_OID, REL_MAIN), vec![0b0010_0000, 0b0000_0010]);
    // every other relation reports an empty map of the right size, meaning
    // "tracked, nothing changed"
    client
        .ptrack_maps
        .insert((1663, DB_OID, REL_SMALL), vec![0, 0]);
    let doomed_clone = doomed.clone();
    client.on_ptrack_db = Some(Box::new(move || {
        std::fs::remove_file(&doomed_clone).unwrap();
    }));

    let fetcher = Arc::new(PgdataFetcher::new(cluster.pgdata.clone()));
    let ptrack_id =
        run_backup(&cluster, &mut client, BackupMode::Ptrack, Some(fetcher)).unwrap();

    let ptrack = cluster.catalog.read_backup(ptrack_id).unwrap();
    assert_eq!(ptrack.status, BackupStatus::Ok);
    assert_eq!(ptrack.parent, Some(full_id));

    // The vanished file is absent from the final file list.
    let entries = cluster.catalog.read_backup_filelist(ptrack_id).unwrap();
    assert!(entries.iter().all(|e| !e.path.ends_with("doomed.conf")));

    let dest = tempdir().unwrap();
    do_restore(&cluster.catalog, ptrack_id, dest.path(), &RestoreOptions::default()).unwrap();
    assert_same_file(&rel_path, &dest.path().join(format!("base/{DB_OID}/{REL_MAIN}")));
    assert!(!dest.path().join(format!("base/{DB_OID}/doomed.conf")).exists());
}

#[test]
fn page_backup_collects_blocks_from_wal() {
    let cluster = setup_cluster();

    let mut client = MockClient::new(cluster.start1, cluster.stop1);
    let full_id = run_backup(&cluster, &mut client, BackupMode::Full, None).unwrap();

    // The WAL archive references blocks 1, 2 and 5 of the main relation in
    // [start1, start2); rewrite those pages on disk to match.
    let rel_path = cluster.pgdata.join(format!("base/{DB_OID}/{REL_MAIN}"));
    let mut content = std::fs::read(&rel_path).unwrap();
    for blkno in [1usize, 2, 5] {
        let page = make_page(cluster.start2, blkno as u32, 0xC0);
        content[blkno * BLCKSZ as usize..(blkno + 1) * BLCKSZ as usize].copy_from_slice(&page);
    }
    std::fs::write(&rel_path, &content).unwrap();

    let mut client = MockClient::new(cluster.start2, cluster.stop2);
    let page_id = run_backup(&cluster, &mut client, BackupMode::Page, None).unwrap();

    let page_backup = cluster.catalog.read_backup(page_id).unwrap();
    assert_eq!(page_backup.status, BackupStatus::Ok);
    assert_eq!(page_backup.mode, BackupMode::Page);
    assert_eq!(page_backup.parent, Some(full_id));

    // The untouched small relation is carried over, not copied again.
    let entries = cluster.catalog.read_backup_filelist(page_id).unwrap();
    let small = entries
        .iter()
        .find(|e| e.path == format!("base/{DB_OID}/{REL_SMALL}"))
        .unwrap();
    assert!(small.size < 0, "unchanged file was copied: size {}", small.size);

    let dest = tempdir().unwrap();
    do_restore(&cluster.catalog, page_id, dest.path(), &RestoreOptions::default()).unwrap();
    assert_same_file(&rel_path, &dest.path().join(format!("base/{DB_OID}/{REL_MAIN}")));
}

#[test]
fn incremental_without_full_is_refused() {
    let cluster = setup_cluster();
    let mut client = MockClient::new(cluster.start1, cluster.stop1);
    let err = run_backup(&cluster, &mut client, BackupMode::Delta, None).unwrap_err();
    assert!(format!("{err:#}").contains("FULL backup"));
}

#[test]
fn backup_from_the_past_is_refused() {
    let cluster = setup_cluster();
    let mut client = MockClient::new(cluster.start2, cluster.stop2);
    run_backup(&cluster, &mut client, BackupMode::Full, None).unwrap();

    // A delta whose start LSN precedes the parent's start LSN.
    let mut client = MockClient::new(cluster.start1, cluster.stop1);
    let err = run_backup(&cluster, &mut client, BackupMode::Delta, None).unwrap_err();
    assert!(format!("{err:#}").contains("from the past"), "got: {err:#}");
}
