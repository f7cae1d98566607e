//! Helpers for writing files so that a crash never leaves a half-written
//! version visible under the final name: write to a `.tmp` sibling, fsync,
//! rename over the destination, fsync the directory.

use std::fs::{self, File};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};

/// Similar to [`std::fs::create_dir_all`], except we fsync all
/// newly created directories and the pre-existing parent.
pub fn create_dir_all(path: &Utf8Path) -> io::Result<()> {
    let mut dirs_to_create = Vec::new();
    let mut path: &Utf8Path = path;

    // Figure out which directories we need to create.
    loop {
        match path.metadata() {
            Ok(metadata) if metadata.is_dir() => break,
            Ok(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("non-directory found in path: {path}"),
                ));
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        dirs_to_create.push(path);

        match path.parent() {
            Some(parent) => path = parent,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("can't find parent of path '{path}'"),
                ));
            }
        }
    }

    // Create directories from parent to child.
    for &path in dirs_to_create.iter().rev() {
        fs::create_dir(path)?;
    }

    // Fsync the created directories from child to parent.
    for &path in dirs_to_create.iter() {
        fsync_dir(path)?;
    }

    // If we created any new directories, fsync the parent.
    if !dirs_to_create.is_empty() {
        fsync_dir(path)?;
    }

    Ok(())
}

fn tmp_name(path: &Utf8Path) -> Utf8PathBuf {
    let mut s = path.as_str().to_owned();
    s.push_str(".tmp");
    Utf8PathBuf::from(s)
}

/// Durably replace the file at `path` with `content`. The live file is never
/// truncated in place; readers observe either the old or the new version.
pub fn overwrite(path: &Utf8Path, content: &[u8]) -> io::Result<()> {
    let tmp_path = tmp_name(path);
    let res = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        if let Some(parent) = path.parent() {
            fsync_dir(parent)?;
        }
        Ok(())
    })();
    if res.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    res
}

pub fn fsync_dir(dirname: &Utf8Path) -> io::Result<()> {
    // On Linux, opening a directory read-only is enough to fsync it.
    let dir = File::open(dirname)?;
    dir.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;

    #[test]
    fn overwrite_is_atomic_per_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.control");

        overwrite(&path, b"status = RUNNING\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"status = RUNNING\n");

        overwrite(&path, b"status = DONE\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"status = DONE\n");

        // No temp file left behind.
        assert!(!dir.path().join("backup.control.tmp").exists());
    }

    #[test]
    fn create_dir_all_nested() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c");
        create_dir_all(&path).unwrap();
        assert!(path.is_dir());
        // idempotent
        create_dir_all(&path).unwrap();
    }
}
