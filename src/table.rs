//! A minimal stand-in for the on-disk sorted-table format. The real format (data blocks, a
//! block index, a footer, optional filters) is out of scope here; `Version`/`Compaction` only
//! need something that can be built once (entries added in increasing internal-key order),
//! persisted through an `Env`, and then opened for point lookups and forward/backward iteration.
//! This table keeps its entries as one length-prefixed run of (key, value) pairs and loads them
//! into memory wholesale on open, which is adequate for an engine that never claimed to handle
//! blocks larger than available memory.

use std::cmp::Ordering;
use std::path::Path;
use std::rc::Rc;

use integer_encoding::{FixedInt, VarInt};

use crate::cmp::InternalKeyCmp;
use crate::env::Env;
use crate::error::{Result, Status};
use crate::options::Options;
use crate::types::LdbIterator;

/// Builds a table file by appending entries in increasing key order, then flushing the result
/// through an `Env`-provided writer.
pub struct TableBuilder {
    opts: Options,
    dst: Box<dyn std::io::Write>,
    buf: Vec<u8>,
    num_entries: usize,
}

impl TableBuilder {
    pub fn new(opts: Options, dst: Box<dyn std::io::Write>) -> TableBuilder {
        TableBuilder {
            opts,
            dst,
            buf: Vec::new(),
            num_entries: 0,
        }
    }

    pub fn add(&mut self, key: &[u8], val: &[u8]) -> Result<()> {
        let _ = &self.opts;
        put_lenprefixed(&mut self.buf, key);
        put_lenprefixed(&mut self.buf, val);
        self.num_entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.num_entries
    }

    /// Flushes the table to its backing writer, returning the size written.
    pub fn finish(mut self) -> Result<usize> {
        self.dst.write_all(&self.buf)?;
        Ok(self.buf.len())
    }
}

fn put_lenprefixed(dst: &mut Vec<u8>, data: &[u8]) {
    let mut lenbuf = vec![0; data.len().required_space()];
    let n = data.len().encode_var(&mut lenbuf);
    dst.extend_from_slice(&lenbuf[..n]);
    dst.extend_from_slice(data);
}

fn get_lenprefixed(src: &[u8]) -> Option<(&[u8], usize)> {
    let (len, n): (usize, usize) = VarInt::decode_var(src)?;
    if src.len() < n + len {
        return None;
    }
    Some((&src[n..n + len], n + len))
}

/// An opened table: its entries, parsed once at open time and kept sorted in memory. Entries are
/// ordered by `InternalKeyCmp`, not raw byte order — a table that (legitimately) holds several
/// sequence numbers of the same user key sorts newest-first, and a plain `Vec<u8>` comparison of
/// the little-endian-encoded tag would not agree with that.
pub struct Table {
    entries: Rc<Vec<(Vec<u8>, Vec<u8>)>>,
    cmp: InternalKeyCmp,
}

impl Table {
    pub fn open(env: &dyn Env, path: &Path, size: usize, opts: &Options) -> Result<Table> {
        let f = env.new_random_access_file(path)?;
        let mut raw = vec![0u8; size];
        let mut off = 0;
        while off < size {
            let n = f.read_at(off, &mut raw[off..])?;
            if n == 0 {
                break;
            }
            off += n;
        }
        raw.truncate(off);

        let mut entries = Vec::new();
        let mut rest: &[u8] = &raw;
        while !rest.is_empty() {
            let (key, n) = get_lenprefixed(rest)
                .ok_or_else(|| Status::corruption("truncated table entry (key)"))?;
            rest = &rest[n..];
            let (val, n) = get_lenprefixed(rest)
                .ok_or_else(|| Status::corruption("truncated table entry (value)"))?;
            rest = &rest[n..];
            entries.push((key.to_vec(), val.to_vec()));
        }

        Ok(Table {
            entries: Rc::new(entries),
            cmp: InternalKeyCmp(opts.cmp.clone()),
        })
    }

    /// Returns the entry with the smallest key >= `key`, if any. Callers using an
    /// `InternalKeyCmp`-ordered table must re-check the returned key's user-key portion, since
    /// this is a next-or-equal lookup, not an exact match.
    pub fn get(&self, key: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        let ix = self
            .entries
            .binary_search_by(|(k, _)| match self.cmp.cmp(k, key) {
                Ordering::Equal => Ordering::Greater,
                o => o,
            })
            .unwrap_or_else(|i| i);
        self.entries.get(ix).cloned()
    }

    pub fn iter(&self) -> TableIterator {
        TableIterator {
            entries: self.entries.clone(),
            cmp: self.cmp.clone(),
            ix: None,
        }
    }
}

/// Iterates over a table's entries in key order, supporting both forward and backward motion.
pub struct TableIterator {
    entries: Rc<Vec<(Vec<u8>, Vec<u8>)>>,
    cmp: InternalKeyCmp,
    ix: Option<usize>,
}

impl LdbIterator for TableIterator {
    fn advance(&mut self) -> bool {
        let next = match self.ix {
            None => 0,
            Some(i) => i + 1,
        };
        if next >= self.entries.len() {
            self.ix = None;
            return false;
        }
        self.ix = Some(next);
        true
    }

    fn current(&self, key: &mut Vec<u8>, val: &mut Vec<u8>) -> bool {
        match self.ix {
            Some(i) if i < self.entries.len() => {
                key.clear();
                key.extend_from_slice(&self.entries[i].0);
                val.clear();
                val.extend_from_slice(&self.entries[i].1);
                true
            }
            _ => false,
        }
    }

    fn seek(&mut self, key: &[u8]) {
        let ix = self
            .entries
            .binary_search_by(|(k, _)| match self.cmp.cmp(k, key) {
                Ordering::Equal => Ordering::Greater,
                o => o,
            })
            .unwrap_or_else(|i| i);
        if ix < self.entries.len() {
            self.ix = Some(ix);
        } else {
            self.ix = None;
        }
    }

    fn reset(&mut self) {
        self.ix = None;
    }

    fn valid(&self) -> bool {
        matches!(self.ix, Some(i) if i < self.entries.len())
    }

    fn prev(&mut self) -> bool {
        match self.ix {
            Some(0) | None => {
                self.ix = None;
                false
            }
            Some(i) => {
                self.ix = Some(i - 1);
                true
            }
        }
    }
}
