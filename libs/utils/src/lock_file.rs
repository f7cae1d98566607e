//! A tolerant exclusive lock file, in the tradition of `postmaster.pid`.
//!
//! The lock is an O_EXCL-created file containing the owner's PID. If the file
//! already exists, the previous owner may have died without cleaning up, so
//! the PID inside is probed with signal 0 and the file is reclaimed when the
//! process is gone. A PID equal to our own or our parent's is treated as a
//! leftover from a previous boot cycle (PID reuse) and reclaimed as well.

use std::fs;
use std::io::{ErrorKind, Write};

use anyhow::{bail, Context};
use camino::{Utf8Path, Utf8PathBuf};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::{getpid, getppid, Pid};
use tracing::warn;

/// How many times we are willing to race against other would-be lockers
/// before giving up. A non-writable directory would otherwise loop forever.
const LOCK_RETRIES: u32 = 100;

/// Owns the lock file; dropping the guard unlinks it. If the process is
/// killed without running destructors, the next locker reclaims the stale
/// file through the PID probe.
#[must_use]
pub struct LockFileGuard {
    path: Utf8PathBuf,
}

impl LockFileGuard {
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for LockFileGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("could not remove lock file {}: {e}", self.path);
            }
        }
    }
}

/// The result of a lock attempt.
pub enum LockResult {
    Acquired(LockFileGuard),
    /// Another live process holds the lock. This is not an error; the caller
    /// decides how loudly to report it.
    Busy {
        owner: Pid,
    },
}

/// Try to take an exclusive PID-file lock at `path`.
pub fn lock_pid_file(path: &Utf8Path) -> anyhow::Result<LockResult> {
    let my_pid = getpid();
    let my_parent_pid = getppid();

    for _ in 0..LOCK_RETRIES {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // Somebody else created it first. Find out who, and whether
                // they are still alive.
                let content = match fs::read_to_string(path) {
                    Ok(content) => content,
                    // Deleted between our create and read attempts; try again.
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e).context(format!("read lock file {path}")),
                };
                let owner = content
                    .trim()
                    .parse::<i32>()
                    .ok()
                    .filter(|pid| *pid > 0)
                    .map(Pid::from_raw)
                    .with_context(|| format!("bogus data in lock file {path:?}: {content:?}"))?;

                if owner != my_pid && owner != my_parent_pid {
                    match kill(owner, None) {
                        Ok(()) => return Ok(LockResult::Busy { owner }),
                        Err(Errno::ESRCH) => {
                            warn!("process {owner} which held lock file {path} no longer exists");
                        }
                        Err(e) => bail!("failed to probe process {owner}: {e}"),
                    }
                }

                // Stale lock. Unlink and retry; the create is what arbitrates
                // the race against other reclaimers.
                match fs::remove_file(path) {
                    Ok(()) => continue,
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e).context(format!("remove stale lock file {path}")),
                }
            }
            Err(e) => return Err(e).context(format!("create lock file {path}")),
        };

        let res = file
            .write_all(format!("{my_pid}\n").as_bytes())
            .and_then(|()| file.sync_all());
        if let Err(e) = res {
            // Don't leave a half-written file behind, it would wedge the
            // next locker on the empty-content check.
            let _ = fs::remove_file(path);
            return Err(e).context(format!("write lock file {path}"));
        }

        return Ok(LockResult::Acquired(LockFileGuard {
            path: path.to_owned(),
        }));
    }

    bail!("could not create lock file {path} in {LOCK_RETRIES} attempts");
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;

    #[test]
    fn acquire_and_release() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.pid");

        let guard = match lock_pid_file(&path).unwrap() {
            LockResult::Acquired(g) => g,
            LockResult::Busy { .. } => panic!("fresh lock file reported busy"),
        };
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim().parse::<i32>().unwrap(), getpid().as_raw());

        drop(guard);
        assert!(!path.exists());
    }

    #[test]
    fn busy_when_owner_alive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.pid");

        // PID 1 always exists.
        fs::write(&path, "1\n").unwrap();
        match lock_pid_file(&path).unwrap() {
            LockResult::Busy { owner } => assert_eq!(owner.as_raw(), 1),
            LockResult::Acquired(_) => panic!("stole lock from a live process"),
        }
        assert!(path.exists());
    }

    #[test]
    fn reclaim_stale_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.pid");

        // A PID that is almost certainly not running: the maximum value
        // accepted by the kernel is rarely allocated.
        fs::write(&path, "4194303\n").unwrap();
        let guard = match lock_pid_file(&path).unwrap() {
            LockResult::Acquired(g) => g,
            LockResult::Busy { .. } => panic!("did not reclaim stale lock"),
        };
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim().parse::<i32>().unwrap(), getpid().as_raw());
        drop(guard);
    }

    #[test]
    fn own_pid_is_treated_as_stale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.pid");

        fs::write(&path, format!("{}\n", getpid())).unwrap();
        match lock_pid_file(&path).unwrap() {
            LockResult::Acquired(_) => {}
            LockResult::Busy { .. } => panic!("our own pid should not hold the lock"),
        }
    }

    #[test]
    fn bogus_content_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.pid");

        fs::write(&path, "not a pid\n").unwrap();
        assert!(lock_pid_file(&path).is_err());
    }
}
