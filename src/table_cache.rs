//! Opening a table file is comparatively expensive (it reads the whole file); `TableCache` keeps
//! the most recently used tables open so repeated lookups and compaction scans don't reopen the
//! same file on every call. Eviction is plain LRU over a fixed capacity, matching the
//! `max_open_files`-sized cache the original engine keeps per database.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::Result;
use crate::key_types::InternalKey;
use crate::options::Options;
use crate::table::Table;
use crate::types::FileNum;

pub fn table_name(dbname: &str, num: FileNum, suffix: &str) -> String {
    format!("{}/{:06}.{}", dbname, num, suffix)
}

pub struct TableCache {
    dbname: String,
    opts: Options,
    cap: usize,
    cache: HashMap<FileNum, Rc<Table>>,
    lru: VecDeque<FileNum>,
}

impl TableCache {
    pub fn new(dbname: &str, opts: Options, entries: usize) -> TableCache {
        TableCache {
            dbname: dbname.to_string(),
            opts,
            cap: entries.max(1),
            cache: HashMap::new(),
            lru: VecDeque::new(),
        }
    }

    /// Returns the table with the given file number, opening and inserting it into the cache if
    /// it isn't already resident.
    pub fn get_table(&mut self, file_num: FileNum) -> Result<Rc<Table>> {
        if let Some(t) = self.cache.get(&file_num) {
            self.touch(file_num);
            return Ok(t.clone());
        }

        let path = PathBuf::from(table_name(&self.dbname, file_num, "ldb"));
        let size = self.opts.env.file_size(&path)?;
        let table = Rc::new(Table::open(&**self.opts.env, &path, size, &self.opts)?);

        self.evict_if_needed();
        self.cache.insert(file_num, table.clone());
        self.lru.push_back(file_num);
        Ok(table)
    }

    /// Looks up a single key in the given table, returning the stored (internal key, value)
    /// pair with the smallest key >= `key`. The caller must still verify the returned internal
    /// key's user-key portion matches, since this is a next-or-equal search.
    pub fn get(
        &mut self,
        file_num: FileNum,
        key: InternalKey,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let table = self.get_table(file_num)?;
        Ok(table.get(key))
    }

    pub fn evict(&mut self, file_num: FileNum) {
        self.cache.remove(&file_num);
        self.lru.retain(|n| *n != file_num);
    }

    fn touch(&mut self, file_num: FileNum) {
        self.lru.retain(|n| *n != file_num);
        self.lru.push_back(file_num);
    }

    fn evict_if_needed(&mut self) {
        while self.cache.len() >= self.cap {
            if let Some(oldest) = self.lru.pop_front() {
                self.cache.remove(&oldest);
            } else {
                break;
            }
        }
    }
}
