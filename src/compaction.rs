//! A `Compaction` describes one planned merge: an input level `L`, the files chosen from `L`
//! and `L+1` ("parent" inputs 0 and 1), and the `VersionEdit` that will record the result. Most
//! of its methods exist to let the compaction driver decide, key by key, whether it is safe to
//! drop a deletion marker (`is_base_level_for`) and whether the current output file has grown
//! large enough that a grandparent-overlap budget says to start a new one
//! (`should_stop_before`).

use std::cmp::Ordering;
use std::rc::Rc;

use crate::cmp::{Cmp, InternalKeyCmp};
use crate::key_types::{parse_internal_key, InternalKey, UserKey};
use crate::options::Options;
use crate::types::{Shared, NUM_LEVELS};
use crate::version::{FileMetaHandle, Version};
use crate::version_edit::VersionEdit;

pub struct Compaction {
    pub level: usize,
    max_file_size: usize,
    pub input_version: Option<Shared<Version>>,
    level_ixs: [usize; NUM_LEVELS],
    cmp: Rc<Box<dyn Cmp>>,

    /// "parent" inputs: `inputs[0]` from `level`, `inputs[1]` from `level + 1`.
    pub inputs: [Vec<FileMetaHandle>; 2],
    grandparent_ix: usize,
    /// Files from `level + 2`, if that level exists, used to bound output file size.
    grandparents: Option<Vec<FileMetaHandle>>,
    overlapped_bytes: usize,
    seen_key: bool,
    pub edit: VersionEdit,
}

impl Compaction {
    /// `opt.cmp` must be the user-supplied (not internal-key) comparator.
    pub fn new(opt: &Options, level: usize) -> Compaction {
        Compaction {
            level,
            max_file_size: opt.max_file_size,
            input_version: None,
            level_ixs: Default::default(),
            cmp: opt.cmp.clone(),

            inputs: Default::default(),
            grandparent_ix: 0,
            grandparents: Default::default(),
            overlapped_bytes: 0,
            seen_key: false,
            edit: VersionEdit::new(),
        }
    }

    pub fn set_grandparents(&mut self, grandparents: Vec<FileMetaHandle>) {
        self.grandparents = Some(grandparents);
    }

    /// Marks the current input files as deleted in the inner `VersionEdit`.
    pub fn add_input_deletions(&mut self) {
        for parent in 0..2 {
            for f in &self.inputs[parent] {
                self.edit.delete_file(self.level + parent, f.borrow().num);
            }
        }
    }

    pub fn input(&self, parent: usize, i: usize) -> FileMetaHandle {
        assert!(parent < 2);
        assert!(i < self.inputs[parent].len());
        self.inputs[parent][i].clone()
    }

    /// Returns whether `k` cannot exist in any level beyond this compaction's outputs — i.e.
    /// whether a deletion marker for `k` may be dropped entirely rather than carried forward.
    pub fn is_base_level_for(&mut self, k: UserKey) -> bool {
        if let Some(ref inp_version) = self.input_version {
            for level in self.level + 2..NUM_LEVELS {
                let files = &inp_version.borrow().files[level];
                while self.level_ixs[level] < files.len() {
                    let f = files[self.level_ixs[level]].borrow();
                    if self.cmp.cmp(k, parse_internal_key(&f.largest).2) <= Ordering::Equal {
                        if self.cmp.cmp(k, parse_internal_key(&f.smallest).2) >= Ordering::Equal {
                            return false;
                        }
                        break;
                    }
                    self.level_ixs[level] += 1;
                }
            }
            true
        } else {
            unreachable!("is_base_level_for called before input_version was set")
        }
    }

    pub fn num_inputs(&self, parent: usize) -> usize {
        assert!(parent < 2);
        self.inputs[parent].len()
    }

    /// A trivial move just renames a single L-file into L+1 without rewriting anything, and is
    /// only safe when it won't blow up the grandparent-overlap budget.
    pub fn is_trivial_move(&self) -> bool {
        let inputs_size: usize = self
            .grandparents
            .as_ref()
            .map(|gp| gp.iter().fold(0, |a, f| a + f.borrow().size))
            .unwrap_or(0);
        self.num_inputs(0) == 1 && self.num_inputs(1) == 0 && inputs_size < 10 * self.max_file_size
    }

    /// Returns true once accumulated overlap with the grandparent level since the last output
    /// file started exceeds the `10 * max_file_size` budget, in which case the current output
    /// should be closed and a new one started before writing `k`.
    pub fn should_stop_before(&mut self, k: InternalKey) -> bool {
        assert!(self.grandparents.is_some());
        let grandparents = self.grandparents.as_ref().unwrap();
        let icmp = InternalKeyCmp(self.cmp.clone());
        while self.grandparent_ix < grandparents.len()
            && icmp.cmp(k, &grandparents[self.grandparent_ix].borrow().largest) == Ordering::Greater
        {
            if self.seen_key {
                self.overlapped_bytes += grandparents[self.grandparent_ix].borrow().size;
            }
            self.grandparent_ix += 1;
        }
        self.seen_key = true;

        if self.overlapped_bytes > 10 * self.max_file_size {
            self.overlapped_bytes = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::testutil::new_file;

    #[test]
    fn test_is_trivial_move() {
        let opt = Options::for_test();
        let mut c = Compaction::new(&opt, 1);
        c.inputs[0] = vec![new_file(1, b"a", 1, b"b", 2)];
        c.set_grandparents(vec![]);
        assert!(c.is_trivial_move());

        c.inputs[1] = vec![new_file(2, b"a", 1, b"b", 2)];
        assert!(!c.is_trivial_move());
    }

    #[test]
    fn test_should_stop_before_budget() {
        let mut opt = Options::for_test();
        opt.max_file_size = 10;
        let mut c = Compaction::new(&opt, 1);
        c.set_grandparents(vec![
            new_file(10, b"a", 0, b"m", 1),
            new_file(11, b"n", 0, b"z", 1),
        ]);
        // grandparent files are ~163840 bytes each (see testutil::new_file), comfortably over
        // the 10*max_file_size=100 byte budget once both have been passed.
        use crate::key_types::LookupKey;
        assert!(!c.should_stop_before(LookupKey::new(b"b", 5).internal_key()));
        assert!(c.should_stop_before(LookupKey::new(b"z", 5).internal_key()));
    }
}
