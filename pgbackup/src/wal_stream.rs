//! The WAL streaming task of a stream backup.
//!
//! A dedicated thread owns a replication connection and writes incoming WAL
//! into the backup's `pg_wal` directory. The coordinator publishes the stop
//! LSN (known only after the stop marker) through a shared atomic with
//! release semantics; the streamer observes it at segment boundaries and
//! keepalives, and exits once its position passes it. A deadline bounds how
//! long streaming may continue after the stop LSN is published.

use std::fs::File;
use std::os::unix::fs::FileExt;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use futures::StreamExt;
use postgres_ffi::{TimeLineID, XLogFileName};
use tracing::{debug, info, warn};
use utils::lsn::{AtomicLsn, Lsn};

/// Shared coordination between the backup coordinator and the streaming
/// thread.
pub struct StreamControl {
    stop_lsn: AtomicLsn,
    interrupted: Arc<AtomicBool>,
    /// How long streaming may lag behind once the stop LSN is known;
    /// checkpoint_timeout with some slack.
    stop_timeout: Duration,
    stop_begin: Mutex<Option<Instant>>,
}

impl StreamControl {
    pub fn new(interrupted: Arc<AtomicBool>, stop_timeout: Duration) -> StreamControl {
        StreamControl {
            stop_lsn: AtomicLsn::new(0),
            interrupted,
            stop_timeout,
            stop_begin: Mutex::new(None),
        }
    }

    /// Called by the coordinator once `pg_stop_backup` reported the stop
    /// LSN. Release ordering pairs with the streamer's loads.
    pub fn publish_stop_lsn(&self, lsn: Lsn) {
        self.stop_lsn.store(lsn);
    }

    /// The streamer's stop predicate: to be called on every segment
    /// boundary and keepalive with the current stream position.
    pub fn should_stop(&self, xlogpos: Lsn, segment_finished: bool) -> Result<bool> {
        if self.interrupted.load(Ordering::Relaxed) {
            bail!("interrupted during WAL streaming");
        }
        if segment_finished {
            debug!("finished segment at {xlogpos}");
        }

        let stop_lsn = self.stop_lsn.load();
        if !stop_lsn.is_valid() {
            return Ok(false);
        }
        if xlogpos >= stop_lsn {
            return Ok(true);
        }

        let mut stop_begin = self.stop_begin.lock().unwrap();
        let began = stop_begin.get_or_insert_with(|| {
            info!("wait for LSN {stop_lsn} to be streamed");
            Instant::now()
        });
        if began.elapsed() > self.stop_timeout {
            bail!(
                "target LSN {stop_lsn} could not be streamed in {} seconds",
                self.stop_timeout.as_secs()
            );
        }
        Ok(false)
    }
}

/// Consumes a physical replication stream. The production implementation
/// sits on the replication protocol; tests substitute their own.
pub trait WalStreamer: Send {
    /// Stream WAL into `wal_dir` starting at `start` (segment-aligned),
    /// until the control says stop. Returns the final streamed position.
    fn stream(
        &mut self,
        wal_dir: &Utf8Path,
        start: Lsn,
        tli: TimeLineID,
        control: &StreamControl,
    ) -> Result<Lsn>;
}

pub struct WalStreamHandle {
    control: Arc<StreamControl>,
    thread: std::thread::JoinHandle<Result<Lsn>>,
}

impl WalStreamHandle {
    pub fn publish_stop_lsn(&self, lsn: Lsn) {
        self.control.publish_stop_lsn(lsn);
    }

    /// Wait for the streaming thread. Its own deadline bounds the wait once
    /// the stop LSN is published.
    pub fn join(self) -> Result<Lsn> {
        match self.thread.join() {
            Ok(result) => result,
            Err(_) => bail!("WAL streaming thread panicked"),
        }
    }
}

/// Spawn the streaming task. `start` is rounded down to a segment boundary:
/// replication always begins at the start of a segment.
pub fn spawn_wal_streamer(
    mut streamer: Box<dyn WalStreamer>,
    wal_dir: &Utf8Path,
    start: Lsn,
    tli: TimeLineID,
    seg_size: usize,
    interrupted: Arc<AtomicBool>,
    stop_timeout: Duration,
) -> WalStreamHandle {
    let control = Arc::new(StreamControl::new(interrupted, stop_timeout));
    let thread_control = Arc::clone(&control);
    let wal_dir = wal_dir.to_owned();
    let startpos = start.segment_lsn(seg_size);

    let thread = std::thread::Builder::new()
        .name("wal-streamer".to_owned())
        .spawn(move || {
            info!("started streaming WAL at {startpos} (timeline {tli})");
            let result = streamer.stream(&wal_dir, startpos, tli, &thread_control);
            match &result {
                Ok(stop) => info!("finished streaming WAL at {stop} (timeline {tli})"),
                Err(e) => warn!("WAL streaming failed: {e:#}"),
            }
            result
        })
        .expect("spawn wal-streamer thread");

    WalStreamHandle { control, thread }
}

/// Sink that lays a WAL byte stream into fixed-size segment files.
struct WalSegmentSink {
    wal_dir: Utf8PathBuf,
    tli: TimeLineID,
    seg_size: usize,
    current: Option<(u64, File, Utf8PathBuf)>,
}

impl WalSegmentSink {
    fn new(wal_dir: Utf8PathBuf, tli: TimeLineID, seg_size: usize) -> WalSegmentSink {
        WalSegmentSink {
            wal_dir,
            tli,
            seg_size,
            current: None,
        }
    }

    /// Write `data` at WAL position `pos`; returns true when a segment
    /// boundary was crossed (a natural point to check the stop predicate).
    fn write(&mut self, mut pos: Lsn, mut data: &[u8]) -> Result<bool> {
        let mut segment_finished = false;
        while !data.is_empty() {
            let segno = pos.segment_number(self.seg_size);
            if self.current.as_ref().map(|(no, _, _)| *no) != Some(segno) {
                self.finish_current()?;
                let fname = XLogFileName(self.tli, segno, self.seg_size);
                let path = self.wal_dir.join(&fname);
                let file = File::create(&path)
                    .with_context(|| format!("cannot create WAL segment \"{path}\""))?;
                // Pre-size the file so a restart of the server reading this
                // directory sees full-size segments.
                file.set_len(self.seg_size as u64)?;
                self.current = Some((segno, file, path));
            }

            let off = pos.segment_offset(self.seg_size);
            let n = std::cmp::min(self.seg_size - off, data.len());
            let (_, file, path) = self.current.as_ref().unwrap();
            file.write_at(&data[..n], off as u64)
                .with_context(|| format!("cannot write WAL segment \"{path}\""))?;
            pos += n as u64;
            data = &data[n..];

            if pos.segment_offset(self.seg_size) == 0 {
                self.finish_current()?;
                segment_finished = true;
            }
        }
        Ok(segment_finished)
    }

    fn finish_current(&mut self) -> Result<()> {
        if let Some((_, file, path)) = self.current.take() {
            file.sync_all()
                .with_context(|| format!("cannot fsync WAL segment \"{path}\""))?;
        }
        Ok(())
    }
}

/// Physical replication over the standard streaming protocol. The heavy
/// lifting (connection, CopyBoth framing) comes from the client library;
/// this only interprets XLogData/keepalive envelopes and writes segments.
pub struct ReplicationStreamer {
    pub conninfo: String,
    pub seg_size: usize,
    /// Create a temporary replication slot for the session.
    pub temp_slot: bool,
    pub slot_name: String,
}

impl ReplicationStreamer {
    pub fn new(conninfo: String, seg_size: usize, temp_slot: bool) -> ReplicationStreamer {
        ReplicationStreamer {
            conninfo,
            seg_size,
            temp_slot,
            slot_name: "pgbackup_slot".to_owned(),
        }
    }

    async fn run(
        &mut self,
        wal_dir: &Utf8Path,
        start: Lsn,
        tli: TimeLineID,
        control: &StreamControl,
    ) -> Result<Lsn> {
        use postgres_protocol::message::backend::ReplicationMessage;
        use tokio_postgres::replication::ReplicationStream;

        let mut config: tokio_postgres::Config = self
            .conninfo
            .parse()
            .context("invalid connection string")?;
        config.application_name("pgbackup");
        config.replication_mode(tokio_postgres::config::ReplicationMode::Physical);
        let (client, connection) = config
            .connect(tokio_postgres::NoTls)
            .await
            .context("cannot continue backup because stream connect has failed")?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("replication connection error: {e}");
            }
        });

        let slot_clause = if self.temp_slot {
            client
                .simple_query(&format!(
                    "CREATE_REPLICATION_SLOT \"{}\" TEMPORARY PHYSICAL",
                    self.slot_name
                ))
                .await
                .context("cannot create temporary replication slot")?;
            format!("SLOT \"{}\" ", self.slot_name)
        } else {
            String::new()
        };

        let query = format!("START_REPLICATION {slot_clause}PHYSICAL {start} TIMELINE {tli}");
        let copy_stream = client
            .copy_both_simple::<bytes::Bytes>(&query)
            .await
            .context("START_REPLICATION failed")?;
        let mut physical_stream = pin!(ReplicationStream::new(copy_stream));

        let mut sink = WalSegmentSink::new(wal_dir.to_owned(), tli, self.seg_size);
        let mut flushed = start;

        while let Some(message) = physical_stream.next().await {
            let message = message.context("replication stream error")?;
            match message {
                ReplicationMessage::XLogData(xlog_data) => {
                    let wal_start = Lsn(xlog_data.wal_start());
                    let data = xlog_data.data();
                    let segment_finished = sink.write(wal_start, data)?;
                    let pos = wal_start + data.len() as u64;
                    if segment_finished {
                        flushed = pos.segment_lsn(self.seg_size);
                    }
                    if control.should_stop(pos, segment_finished)? {
                        sink.finish_current()?;
                        return Ok(pos);
                    }
                }
                ReplicationMessage::PrimaryKeepAlive(keepalive) => {
                    let wal_end = Lsn(keepalive.wal_end());
                    if control.should_stop(wal_end, false)? {
                        sink.finish_current()?;
                        return Ok(wal_end);
                    }
                    if keepalive.reply() != 0 {
                        let ts = postgres_ffi::xlog_utils::get_current_timestamp();
                        let ts = *postgres_protocol::PG_EPOCH + Duration::from_micros(ts as u64);
                        physical_stream
                            .as_mut()
                            .standby_status_update(
                                postgres::types::PgLsn::from(flushed.0),
                                postgres::types::PgLsn::from(flushed.0),
                                postgres::types::PgLsn::from(Lsn::INVALID.0),
                                ts,
                                0,
                            )
                            .await
                            .context("standby status update failed")?;
                    }
                }
                _ => {}
            }
        }

        bail!("replication stream ended before the stop LSN was reached");
    }
}

impl WalStreamer for ReplicationStreamer {
    fn stream(
        &mut self,
        wal_dir: &Utf8Path,
        start: Lsn,
        tli: TimeLineID,
        control: &StreamControl,
    ) -> Result<Lsn> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("cannot build replication runtime")?;
        runtime.block_on(self.run(wal_dir, start, tli, control))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use postgres_ffi::WAL_SEGMENT_SIZE;

    /// Emits synthetic WAL bytes in chunks until told to stop.
    struct FakeStreamer {
        chunk: usize,
    }

    impl WalStreamer for FakeStreamer {
        fn stream(
            &mut self,
            wal_dir: &Utf8Path,
            start: Lsn,
            tli: TimeLineID,
            control: &StreamControl,
        ) -> Result<Lsn> {
            let mut sink = WalSegmentSink::new(wal_dir.to_owned(), tli, WAL_SEGMENT_SIZE);
            let mut pos = start;
            loop {
                let data = vec![0xAAu8; self.chunk];
                let segment_finished = sink.write(pos, &data)?;
                pos += data.len() as u64;
                if control.should_stop(pos, segment_finished)? {
                    sink.finish_current()?;
                    return Ok(pos);
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    #[test]
    fn streamer_stops_past_published_lsn() {
        let dir = tempdir().unwrap();
        let interrupted = Arc::new(AtomicBool::new(false));
        let handle = spawn_wal_streamer(
            Box::new(FakeStreamer { chunk: 256 * 1024 }),
            dir.path(),
            Lsn(0x0100_0007),
            1,
            WAL_SEGMENT_SIZE,
            interrupted,
            Duration::from_secs(30),
        );

        handle.publish_stop_lsn(Lsn(0x0110_0000));
        let final_pos = handle.join().unwrap();
        assert!(final_pos >= Lsn(0x0110_0000));
        // started at the segment boundary below the start position
        assert!(dir.path().join(XLogFileName(1, 1, WAL_SEGMENT_SIZE)).exists());
    }

    #[test]
    fn interrupt_aborts_streaming() {
        let dir = tempdir().unwrap();
        let interrupted = Arc::new(AtomicBool::new(false));
        let handle = spawn_wal_streamer(
            Box::new(FakeStreamer { chunk: 4096 }),
            dir.path(),
            Lsn(0x0100_0000),
            1,
            WAL_SEGMENT_SIZE,
            Arc::clone(&interrupted),
            Duration::from_secs(30),
        );
        interrupted.store(true, Ordering::Relaxed);
        assert!(handle.join().is_err());
    }

    #[test]
    fn stop_timeout_enforced() {
        let control = StreamControl::new(
            Arc::new(AtomicBool::new(false)),
            Duration::from_millis(20),
        );
        control.publish_stop_lsn(Lsn(0x5000_0000));
        // position behind the stop lsn: first call starts the clock
        assert!(!control.should_stop(Lsn(0x1000), true).unwrap());
        std::thread::sleep(Duration::from_millis(50));
        assert!(control.should_stop(Lsn(0x1000), true).is_err());
    }
}
