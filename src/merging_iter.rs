//! An N-way merging iterator: presents several already-ordered child iterators (one per L0
//! table, one per concatenated non-L0 level) as a single ordered stream. A `BinaryHeap` keyed by
//! each child's current entry picks the next key in O(log n) per step rather than scanning all
//! children linearly.
//!
//! The iterator is bidirectional. Since the heap's ordering depends on which way we're walking,
//! switching direction requires reseating every child that isn't the current one: a child that
//! was lagging behind in reverse order must be moved forward to (and past, if equal) the key we
//! just left, or it would re-yield an entry already produced.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use crate::cmp::Cmp;
use crate::types::LdbIterator;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Direction {
    Forward,
    Reverse,
}

struct HeapItem {
    cmp: Rc<Box<dyn Cmp>>,
    idx: usize,
    key: Vec<u8>,
    val: Vec<u8>,
    /// Forward iteration wants the *smallest* key at the top of the (max-)heap, reverse wants
    /// the *largest*; flipping this flag inverts the comparison so the same `BinaryHeap<HeapItem>`
    /// serves both.
    want_max: bool,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp.cmp(&self.key, &other.key) == Ordering::Equal
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        let o = self.cmp.cmp(&self.key, &other.key);
        if self.want_max {
            o
        } else {
            o.reverse()
        }
    }
}

/// Merges an arbitrary number of child `LdbIterator`s, all ordered by the same comparator, into
/// a single ordered iterator.
pub struct MergingIter {
    cmp: Rc<Box<dyn Cmp>>,
    children: Vec<Box<dyn LdbIterator>>,
    heap: BinaryHeap<HeapItem>,
    direction: Direction,
    initialized: bool,
}

impl MergingIter {
    pub fn new(cmp: Rc<Box<dyn Cmp>>, children: Vec<Box<dyn LdbIterator>>) -> MergingIter {
        MergingIter {
            cmp,
            children,
            heap: BinaryHeap::new(),
            direction: Direction::Forward,
            initialized: false,
        }
    }

    fn want_max(&self) -> bool {
        self.direction == Direction::Reverse
    }

    fn push_if_valid(&mut self, idx: usize) {
        let mut key = Vec::new();
        let mut val = Vec::new();
        if self.children[idx].current(&mut key, &mut val) {
            self.heap.push(HeapItem {
                cmp: self.cmp.clone(),
                idx,
                key,
                val,
                want_max: self.want_max(),
            });
        }
    }

    /// Reseats every child other than `keep_idx` so it is positioned forward at-or-past `key`,
    /// skipping an exact match (an entry equal to `key` was already produced while walking
    /// backwards).
    fn reseat_forward(&mut self, keep_idx: usize, key: &[u8]) {
        for (idx, child) in self.children.iter_mut().enumerate() {
            if idx == keep_idx {
                continue;
            }
            child.seek(key);
            let mut k = Vec::new();
            let mut v = Vec::new();
            if child.valid() && child.current(&mut k, &mut v) && self.cmp.cmp(&k, key) == Ordering::Equal {
                child.advance();
            }
        }
    }

    /// Symmetric to `reseat_forward`: moves every other child backward to before `key`.
    fn reseat_backward(&mut self, keep_idx: usize, key: &[u8]) {
        for (idx, child) in self.children.iter_mut().enumerate() {
            if idx == keep_idx {
                continue;
            }
            child.seek(key);
            if child.valid() {
                // seek() landed on the first entry >= key; step back once to the predecessor.
                child.prev();
            } else {
                // Every entry in this child is < key: walk it to its last entry instead. The
                // trait has no `seek_to_last`, so the last key is found by scanning once and
                // then re-seeking to it, which lands back on the exact same entry.
                child.reset();
                let mut last_key = None;
                let (mut k, mut v) = (Vec::new(), Vec::new());
                while child.advance() {
                    if child.current(&mut k, &mut v) {
                        last_key = Some(k.clone());
                    }
                }
                if let Some(lk) = last_key {
                    child.seek(&lk);
                }
            }
        }
    }

    fn rebuild_heap(&mut self) {
        self.heap.clear();
        for idx in 0..self.children.len() {
            self.push_if_valid(idx);
        }
    }

    fn switch_to_forward(&mut self) {
        if let Some(top) = self.heap.peek() {
            let key = top.key.clone();
            let keep = top.idx;
            self.reseat_forward(keep, &key);
        }
        self.direction = Direction::Forward;
        self.rebuild_heap();
    }

    fn switch_to_reverse(&mut self) {
        if let Some(top) = self.heap.peek() {
            let key = top.key.clone();
            let keep = top.idx;
            self.reseat_backward(keep, &key);
        }
        self.direction = Direction::Reverse;
        self.rebuild_heap();
    }
}

impl LdbIterator for MergingIter {
    fn advance(&mut self) -> bool {
        if !self.initialized {
            for idx in 0..self.children.len() {
                self.children[idx].advance();
                self.push_if_valid(idx);
            }
            self.initialized = true;
            self.direction = Direction::Forward;
            return !self.heap.is_empty();
        }

        if self.direction != Direction::Forward {
            self.switch_to_forward();
        }

        if let Some(top) = self.heap.pop() {
            let idx = top.idx;
            self.children[idx].advance();
            self.push_if_valid(idx);
        }
        !self.heap.is_empty()
    }

    fn current(&self, key: &mut Vec<u8>, val: &mut Vec<u8>) -> bool {
        if let Some(top) = self.heap.peek() {
            key.clear();
            key.extend_from_slice(&top.key);
            val.clear();
            val.extend_from_slice(&top.val);
            true
        } else {
            false
        }
    }

    fn seek(&mut self, key: &[u8]) {
        for child in self.children.iter_mut() {
            child.seek(key);
        }
        self.direction = Direction::Forward;
        self.initialized = true;
        self.rebuild_heap();
    }

    fn reset(&mut self) {
        for child in self.children.iter_mut() {
            child.reset();
        }
        self.heap.clear();
        self.direction = Direction::Forward;
        self.initialized = false;
    }

    fn valid(&self) -> bool {
        self.initialized && !self.heap.is_empty()
    }

    fn prev(&mut self) -> bool {
        if !self.initialized {
            return false;
        }

        if self.direction != Direction::Reverse {
            self.switch_to_reverse();
        }

        if let Some(top) = self.heap.pop() {
            let idx = top.idx;
            self.children[idx].prev();
            self.push_if_valid(idx);
        }
        !self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmp::DefaultCmp;
    use crate::test_util::{test_iterator_properties, LdbIteratorIter, TestLdbIter};

    fn make(cmp: Rc<Box<dyn Cmp>>) -> MergingIter {
        let iter1 = TestLdbIter::new(vec![
            (b"aaa".to_vec(), b"1".to_vec()),
            (b"ccc".to_vec(), b"3".to_vec()),
            (b"eee".to_vec(), b"5".to_vec()),
        ]);
        let iter2 = TestLdbIter::new(vec![
            (b"bbb".to_vec(), b"2".to_vec()),
            (b"ddd".to_vec(), b"4".to_vec()),
        ]);
        MergingIter::new(
            cmp,
            vec![Box::new(iter1) as Box<dyn LdbIterator>, Box::new(iter2)],
        )
    }

    #[test]
    fn test_merging_forward() {
        let cmp: Rc<Box<dyn Cmp>> = Rc::new(Box::new(DefaultCmp));
        let mut iter = make(cmp);
        let entries: Vec<_> = LdbIteratorIter::wrap(&mut iter).collect();
        assert_eq!(
            entries,
            vec![
                (b"aaa".to_vec(), b"1".to_vec()),
                (b"bbb".to_vec(), b"2".to_vec()),
                (b"ccc".to_vec(), b"3".to_vec()),
                (b"ddd".to_vec(), b"4".to_vec()),
                (b"eee".to_vec(), b"5".to_vec()),
            ]
        );
    }

    #[test]
    fn test_merging_seek() {
        let cmp: Rc<Box<dyn Cmp>> = Rc::new(Box::new(DefaultCmp));
        let mut iter = make(cmp);
        iter.seek(b"ccc");
        let mut k = Vec::new();
        let mut v = Vec::new();
        assert!(iter.current(&mut k, &mut v));
        assert_eq!(k, b"ccc");
    }

    #[test]
    fn test_merging_fwd_then_bckwd() {
        let cmp: Rc<Box<dyn Cmp>> = Rc::new(Box::new(DefaultCmp));
        let mut iter = make(cmp);
        assert!(iter.advance());
        assert!(iter.advance());
        assert!(iter.advance());

        let mut k = Vec::new();
        let mut v = Vec::new();
        iter.current(&mut k, &mut v);
        assert_eq!(k, b"ccc");

        assert!(iter.prev());
        iter.current(&mut k, &mut v);
        assert_eq!(k, b"bbb");
    }

    #[test]
    fn test_merging_properties() {
        let cmp: Rc<Box<dyn Cmp>> = Rc::new(Box::new(DefaultCmp));
        let iter = make(cmp);
        test_iterator_properties(iter);
    }
}
