use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time;

use fs2::FileExt;

use crate::env::{Env, FileLock, RandomAccess};
use crate::error::{Result, Status, StatusCode};
use crate::infolog::Logger;

#[cfg(unix)]
fn read_at(f: &fs::File, off: usize, dst: &mut [u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt as _;
    f.read_at(dst, off as u64)
}

#[cfg(windows)]
fn read_at(f: &fs::File, off: usize, dst: &mut [u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt as _;
    f.seek_read(dst, off as u64)
}

impl RandomAccess for fs::File {
    fn read_at(&self, off: usize, dst: &mut [u8]) -> Result<usize> {
        Ok(read_at(self, off, dst)?)
    }
}

/// The "real" `Env`, backed by the host filesystem. Advisory `LOCK`-file locking is implemented
/// with `fs2`, which wraps `flock(2)`/`LockFileEx` so a second process opening the same database
/// directory gets a clean error instead of silent corruption.
pub struct PosixDiskEnv;

impl PosixDiskEnv {
    pub fn new() -> PosixDiskEnv {
        PosixDiskEnv
    }
}

impl Default for PosixDiskEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Env for PosixDiskEnv {
    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn Read>> {
        Ok(Box::new(fs::OpenOptions::new().read(true).open(path)?))
    }

    fn new_random_access_file(&self, path: &Path) -> Result<Box<dyn RandomAccess>> {
        Ok(Box::new(fs::OpenOptions::new().read(true).open(path)?))
    }

    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn Write>> {
        Ok(Box::new(
            fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(path)?,
        ))
    }

    fn new_appendable_file(&self, path: &Path) -> Result<Box<dyn Write>> {
        Ok(Box::new(
            fs::OpenOptions::new().create(true).append(true).open(path)?,
        ))
    }

    fn file_exists(&self, path: &Path) -> Result<bool> {
        Ok(path.exists())
    }

    fn children(&self, dir: &Path) -> Result<Vec<String>> {
        let dir_reader = fs::read_dir(dir)?;
        let filenames = dir_reader
            .filter_map(|r| r.ok())
            .filter_map(|e| e.file_name().into_string().ok());
        Ok(filenames.collect())
    }

    fn file_size(&self, path: &Path) -> Result<usize> {
        Ok(fs::metadata(path)?.len() as usize)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        Ok(fs::remove_file(path)?)
    }

    fn mkdir(&self, dir: &Path) -> Result<()> {
        Ok(fs::create_dir(dir)?)
    }

    fn rmdir(&self, dir: &Path) -> Result<()> {
        Ok(fs::remove_dir_all(dir)?)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        Ok(fs::rename(from, to)?)
    }

    fn lock(&self, path: &Path) -> Result<FileLock> {
        let f = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)?;
        f.try_lock_exclusive().map_err(|_| {
            Status::new(StatusCode::LockError, &format!("lock held: {:?}", path))
        })?;
        Ok(FileLock {
            id: path.to_string_lossy().into_owned(),
            file: Some(f),
        })
    }

    fn unlock(&self, l: FileLock) -> Result<()> {
        if let Some(f) = l.file {
            FileExt::unlock(&f)?;
        }
        Ok(())
    }

    fn new_logger(&self, path: &Path) -> Result<Logger> {
        self.new_appendable_file(path).map(Logger)
    }

    fn micros(&self) -> u64 {
        loop {
            let now = time::SystemTime::now().duration_since(time::UNIX_EPOCH);
            match now {
                Err(_) => continue,
                Ok(dur) => return dur.as_secs() * 1_000_000 + dur.subsec_micros() as u64,
            }
        }
    }
}
