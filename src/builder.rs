//! `Builder` accumulates one or more `VersionEdit`s and applies them on top of a base `Version`
//! to produce the next one. Keeping this separate from `VersionSet` lets several edits (as
//! happens during `recover()`, replaying a whole MANIFEST) be folded together before a single,
//! possibly expensive, `save_to` pass sorts and validates each level.

use std::collections::HashSet;
use std::rc::Rc;

use crate::cmp::{Cmp, InternalKeyCmp};
use crate::error::{Result, Status};
use crate::types::{share, FileMetaData, FileNum, Shared, NUM_LEVELS};
use crate::version::{FileMetaHandle, Version};
use crate::version_edit::VersionEdit;

#[derive(Default)]
struct LevelState {
    deleted: HashSet<FileNum>,
    added: Vec<FileMetaHandle>,
}

pub struct Builder {
    base: Shared<Version>,
    cmp: Rc<Box<dyn Cmp>>,
    levels: [LevelState; NUM_LEVELS],
}

impl Builder {
    pub fn new(base: Shared<Version>, cmp: Rc<Box<dyn Cmp>>) -> Builder {
        Builder {
            base,
            cmp,
            levels: Default::default(),
        }
    }

    /// Folds one more edit's deletions/additions/compaction-pointer updates into the
    /// accumulator. `compact_pointer` is the VersionSet's per-level next-compaction-start table,
    /// updated in place as a side effect.
    pub fn apply(&mut self, edit: &VersionEdit, compact_pointer: &mut [Vec<u8>; NUM_LEVELS]) {
        for (level, key) in &edit.compact_pointers {
            compact_pointer[*level] = key.clone();
        }
        for (level, num) in &edit.deleted_files {
            self.levels[*level].deleted.insert(*num);
        }
        for nf in &edit.new_files {
            let f = FileMetaData::new(nf.num, nf.size, nf.smallest.clone(), nf.largest.clone());
            // A file just added by this edit cannot also have been deleted by it; guard against
            // a malformed MANIFEST record resurrecting a file that was deleted earlier in the
            // same batch.
            self.levels[nf.level].deleted.remove(&nf.num);
            self.levels[nf.level].added.push(share(f));
        }
    }

    /// Materializes the accumulated edits into `dst`, starting from `self.base`. Levels beyond
    /// L0 must end up disjoint and sorted by key range; if an edit produces an overlap there
    /// (only possible if two concurrently-planned compactions raced), the whole edit is rejected
    /// as `StatusCode::CompactionObsolete` rather than corrupting the version.
    pub fn save_to(&self, dst: &mut Version) -> Result<()> {
        let icmp = InternalKeyCmp(self.cmp.clone());

        for level in 0..NUM_LEVELS {
            let base_files = &self.base.borrow().files[level];
            let mut files: Vec<FileMetaHandle> = base_files
                .iter()
                .filter(|f| !self.levels[level].deleted.contains(&f.borrow().num))
                .cloned()
                .chain(self.levels[level].added.iter().cloned())
                .collect();

            if level == 0 {
                files.sort_by(|a, b| a.borrow().num.cmp(&b.borrow().num));
            } else {
                files.sort_by(|a, b| icmp.cmp(&a.borrow().smallest, &b.borrow().smallest));
                for w in files.windows(2) {
                    if icmp.cmp(&w[0].borrow().largest, &w[1].borrow().smallest) != std::cmp::Ordering::Less {
                        return Err(Status::compaction_obsolete(format!(
                            "overlapping files {} and {} in level {}",
                            w[0].borrow().num,
                            w[1].borrow().num,
                            level
                        )));
                    }
                }
            }

            dst.files[level] = files;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmp::DefaultCmp;
    use crate::table_cache::TableCache;
    use crate::version::testutil::make_version;

    #[test]
    fn test_builder_apply_add_and_delete() {
        let (v, opts) = make_version();
        let cmp: Rc<Box<dyn Cmp>> = Rc::new(Box::new(DefaultCmp));
        let base = share(v);

        let mut edit = VersionEdit::new();
        edit.delete_file(0, 1);
        edit.new_file(
            0,
            &FileMetaData::new(100, 4096, b"aaz".to_vec(), b"aba".to_vec()),
        );

        let mut builder = Builder::new(base.clone(), cmp.clone());
        let mut compact_pointer: [Vec<u8>; NUM_LEVELS] = Default::default();
        builder.apply(&edit, &mut compact_pointer);

        let cache = share(TableCache::new("db", opts.clone(), 100));
        let mut out = Version::new(cache, cmp.clone());
        builder.save_to(&mut out).unwrap();

        let nums: Vec<_> = out.files[0].iter().map(|f| f.borrow().num).collect();
        assert_eq!(nums, vec![2, 100]);
    }

    #[test]
    fn test_builder_save_to_rejects_overlap() {
        let (v, opts) = make_version();
        let cmp: Rc<Box<dyn Cmp>> = Rc::new(Box::new(DefaultCmp));
        let base = share(v);

        let mut edit = VersionEdit::new();
        // Level 1 already holds files 3, 4, 5; inserting a file overlapping file 3's range
        // without deleting it must be rejected.
        edit.new_file(
            1,
            &FileMetaData::new(200, 4096, b"aaa".to_vec(), b"bbb".to_vec()),
        );

        let mut builder = Builder::new(base.clone(), cmp.clone());
        let mut compact_pointer: [Vec<u8>; NUM_LEVELS] = Default::default();
        builder.apply(&edit, &mut compact_pointer);

        let cache = share(TableCache::new("db", opts.clone(), 100));
        let mut out = Version::new(cache, cmp.clone());
        assert!(builder.save_to(&mut out).is_err());
    }
}
