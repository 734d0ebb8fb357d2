//! An in-memory `Env`, used by tests and by `Options::for_test()` so fixtures don't touch the
//! real filesystem. Modeled after the engine's on-disk `Env`, but files are just shared,
//! growable byte buffers keyed by path.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time;

use crate::env::{Env, FileLock, RandomAccess};
use crate::error::{Result, Status, StatusCode};
use crate::infolog::Logger;
use crate::types::{share, Shared};

type FileContents = Shared<Vec<u8>>;

#[derive(Default)]
struct State {
    files: HashMap<PathBuf, FileContents>,
}

pub struct MemEnv {
    state: Shared<State>,
}

impl MemEnv {
    pub fn new() -> MemEnv {
        MemEnv {
            state: share(State::default()),
        }
    }
}

impl Default for MemEnv {
    fn default() -> Self {
        Self::new()
    }
}

struct MemFileReader {
    contents: FileContents,
    pos: usize,
}

impl Read for MemFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let contents = self.contents.borrow();
        let remaining = contents.len().saturating_sub(self.pos);
        let n = std::cmp::min(buf.len(), remaining);
        buf[..n].copy_from_slice(&contents[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl RandomAccess for FileContents {
    fn read_at(&self, off: usize, dst: &mut [u8]) -> Result<usize> {
        let contents = self.borrow();
        if off >= contents.len() {
            return Ok(0);
        }
        let n = std::cmp::min(dst.len(), contents.len() - off);
        dst[..n].copy_from_slice(&contents[off..off + n]);
        Ok(n)
    }
}

struct MemFileWriter {
    contents: FileContents,
}

impl Write for MemFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.contents.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn not_found(path: &Path) -> Status {
    Status::new(StatusCode::NotFound, &format!("{:?}", path))
}

impl Env for MemEnv {
    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn Read>> {
        let state = self.state.borrow();
        let contents = state.files.get(path).ok_or_else(|| not_found(path))?;
        Ok(Box::new(MemFileReader {
            contents: contents.clone(),
            pos: 0,
        }))
    }

    fn new_random_access_file(&self, path: &Path) -> Result<Box<dyn RandomAccess>> {
        let state = self.state.borrow();
        let contents = state.files.get(path).ok_or_else(|| not_found(path))?;
        Ok(Box::new(contents.clone()))
    }

    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn Write>> {
        let mut state = self.state.borrow_mut();
        let contents = share(Vec::new());
        state.files.insert(path.to_path_buf(), contents.clone());
        Ok(Box::new(MemFileWriter { contents }))
    }

    fn new_appendable_file(&self, path: &Path) -> Result<Box<dyn Write>> {
        let mut state = self.state.borrow_mut();
        let contents = state
            .files
            .entry(path.to_path_buf())
            .or_insert_with(|| share(Vec::new()))
            .clone();
        Ok(Box::new(MemFileWriter { contents }))
    }

    fn file_exists(&self, path: &Path) -> Result<bool> {
        Ok(self.state.borrow().files.contains_key(path))
    }

    fn children(&self, dir: &Path) -> Result<Vec<String>> {
        let state = self.state.borrow();
        Ok(state
            .files
            .keys()
            .filter_map(|p| p.strip_prefix(dir).ok())
            .filter(|p| p.components().count() == 1)
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    }

    fn file_size(&self, path: &Path) -> Result<usize> {
        let state = self.state.borrow();
        let contents = state.files.get(path).ok_or_else(|| not_found(path))?;
        Ok(contents.borrow().len())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        self.state
            .borrow_mut()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn mkdir(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    fn rmdir(&self, dir: &Path) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.files.retain(|p, _| p.strip_prefix(dir).is_err());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let contents = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), contents);
        Ok(())
    }

    fn lock(&self, path: &Path) -> Result<FileLock> {
        Ok(FileLock {
            id: path.to_string_lossy().into_owned(),
            file: None,
        })
    }

    fn unlock(&self, _l: FileLock) -> Result<()> {
        Ok(())
    }

    fn new_logger(&self, _path: &Path) -> Result<Logger> {
        Ok(crate::infolog::sink())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memenv_read_write_roundtrip() {
        let env = MemEnv::new();
        {
            let mut f = env.new_writable_file(Path::new("a/b.txt")).unwrap();
            f.write_all(b"hello").unwrap();
        }
        assert!(env.file_exists(Path::new("a/b.txt")).unwrap());
        assert_eq!(env.file_size(Path::new("a/b.txt")).unwrap(), 5);

        let mut f = env.new_sequential_file(Path::new("a/b.txt")).unwrap();
        let mut buf = Vec::new();
        f.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn test_memenv_random_access() {
        let env = MemEnv::new();
        {
            let mut f = env.new_writable_file(Path::new("f")).unwrap();
            f.write_all(b"0123456789").unwrap();
        }
        let r = env.new_random_access_file(Path::new("f")).unwrap();
        let mut buf = [0u8; 4];
        let n = r.read_at(3, &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"3456");
    }

    #[test]
    fn test_memenv_delete_and_not_found() {
        let env = MemEnv::new();
        assert!(env.file_exists(Path::new("x")).unwrap() == false);
        assert!(env.delete_file(Path::new("x")).is_err());
    }
}
