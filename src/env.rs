//! An `Env` is an abstraction layer that lets the engine run against different platforms, and
//! against both a real filesystem and an in-memory stand-in for tests, without the core caring
//! which. It is one of the three external collaborators the engine only consumes (the others
//! being `TableCache` and the `LogWriter`/`LogReader` pair).

use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::infolog::Logger;

/// Random (non-sequential) read access to an open file, used by table readers to fetch
/// individual blocks without holding a `Read + Seek` handle per reader.
pub trait RandomAccess {
    fn read_at(&self, off: usize, dst: &mut [u8]) -> Result<usize>;
}

/// A simple in-memory buffer implementing `RandomAccess`, handy for tests and for the minimal
/// stand-in table format.
pub type BufferBackedFile = Vec<u8>;

impl RandomAccess for BufferBackedFile {
    fn read_at(&self, off: usize, dst: &mut [u8]) -> Result<usize> {
        if off > self.len() {
            return Ok(0);
        }
        let remaining = self.len() - off;
        let to_read = std::cmp::min(dst.len(), remaining);
        dst[0..to_read].copy_from_slice(&self[off..off + to_read]);
        Ok(to_read)
    }
}

/// An OS-level advisory lock on the database's `LOCK` file, held for the lifetime of an open
/// database to prevent two processes from opening it concurrently (not reentrant, and not a
/// substitute for within-process synchronization — see the concurrency model). The lock is
/// released by dropping (or explicitly `unlock`ing) the handle that created it; an `Env` is free
/// to stash whatever it needs here to make that happen.
pub struct FileLock {
    pub id: String,
    pub(crate) file: Option<std::fs::File>,
}

/// The interface the engine consumes for everything that touches persistent storage. Named and
/// shaped after spec's consumed-interfaces list: `new_sequential_file`, `new_appendable_file`,
/// `rename`, `delete_file`, `file_exists`, `file_size`, `new_logger`, plus a handful of companion
/// methods (`new_writable_file`, `new_random_access_file`, directory and lock operations) that a
/// real engine needs but which the distilled spec folds into "Env" generically.
pub trait Env {
    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn Read>>;
    fn new_random_access_file(&self, path: &Path) -> Result<Box<dyn RandomAccess>>;
    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn Write>>;
    fn new_appendable_file(&self, path: &Path) -> Result<Box<dyn Write>>;

    fn file_exists(&self, path: &Path) -> Result<bool>;
    fn children(&self, path: &Path) -> Result<Vec<String>>;
    fn file_size(&self, path: &Path) -> Result<usize>;

    fn delete_file(&self, path: &Path) -> Result<()>;
    fn mkdir(&self, path: &Path) -> Result<()>;
    fn rmdir(&self, path: &Path) -> Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    fn lock(&self, path: &Path) -> Result<FileLock>;
    fn unlock(&self, l: FileLock) -> Result<()>;

    fn new_logger(&self, path: &Path) -> Result<Logger>;

    fn micros(&self) -> u64;
}

pub fn path_to_string(p: &Path) -> String {
    p.to_str().map(String::from).unwrap()
}

pub fn path_to_str(p: &Path) -> &str {
    p.to_str().unwrap()
}
