//! Shared test helpers: a trivial in-memory `LdbIterator` for feeding fixed data into iterator
//! tests, an adapter that lets any `LdbIterator` be driven with `std::iter::Iterator` combinators
//! like `.collect()`/`.count()`, and a small battery of sanity checks every `LdbIterator`
//! implementation should satisfy.

use std::cmp::Ordering;

use crate::cmp::{Cmp, DefaultCmp};
use crate::types::LdbIterator;

pub struct TestLdbIter {
    v: Vec<(Vec<u8>, Vec<u8>)>,
    ix: Option<usize>,
}

impl TestLdbIter {
    pub fn new(v: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        TestLdbIter { v, ix: None }
    }
}

impl LdbIterator for TestLdbIter {
    fn advance(&mut self) -> bool {
        let next = match self.ix {
            None => 0,
            Some(i) => i + 1,
        };
        if next >= self.v.len() {
            self.ix = None;
            return false;
        }
        self.ix = Some(next);
        true
    }

    fn current(&self, key: &mut Vec<u8>, val: &mut Vec<u8>) -> bool {
        match self.ix {
            Some(i) if i < self.v.len() => {
                key.clear();
                key.extend_from_slice(&self.v[i].0);
                val.clear();
                val.extend_from_slice(&self.v[i].1);
                true
            }
            _ => false,
        }
    }

    fn seek(&mut self, key: &[u8]) {
        let cmp = DefaultCmp;
        let mut i = 0;
        while i < self.v.len() && cmp.cmp(&self.v[i].0, key) == Ordering::Less {
            i += 1;
        }
        self.ix = if i < self.v.len() { Some(i) } else { None };
    }

    fn reset(&mut self) {
        self.ix = None;
    }

    fn valid(&self) -> bool {
        matches!(self.ix, Some(i) if i < self.v.len())
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

/// Adapts any `LdbIterator` into a `std::iter::Iterator` yielding owned (key, value) pairs, for
/// use with `.collect()`/`.count()`/`.fold()` in tests.
pub struct LdbIteratorIter<'a> {
    inner: &'a mut dyn LdbIterator,
}

impl<'a> LdbIteratorIter<'a> {
    pub fn wrap(inner: &'a mut dyn LdbIterator) -> Self {
        LdbIteratorIter { inner }
    }
}

impl<'a> Iterator for LdbIteratorIter<'a> {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.inner.advance() {
            return None;
        }
        let mut k = Vec::new();
        let mut v = Vec::new();
        if self.inner.current(&mut k, &mut v) {
            Some((k, v))
        } else {
            None
        }
    }
}

/// Exercises the basic contract every `LdbIterator` is expected to satisfy: starts invalid,
/// `advance()` walks forward in order, `reset()` followed by `advance()` returns to the start,
/// and `seek()` lands on the first entry >= the target.
pub fn test_iterator_properties<It: LdbIterator>(mut it: It) {
    assert!(!it.valid());

    let mut entries = Vec::new();
    {
        let mut iter = LdbIteratorIter::wrap(&mut it);
        while let Some(e) = iter.next() {
            entries.push(e);
        }
    }
    assert!(!entries.is_empty(), "iterator under test yielded no entries");

    let cmp = DefaultCmp;
    for w in entries.windows(2) {
        assert_eq!(cmp.cmp(&w[0].0, &w[1].0), Ordering::Less);
    }

    it.reset();
    assert!(!it.valid());
    assert!(it.advance());

    let mut k = Vec::new();
    let mut v = Vec::new();
    assert!(it.current(&mut k, &mut v));
    assert_eq!((k, v), entries[0]);

    if entries.len() > 1 {
        it.seek(&entries[1].0);
        assert!(it.valid());
        let mut k = Vec::new();
        let mut v = Vec::new();
        it.current(&mut k, &mut v);
        assert_eq!(k, entries[1].0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_ldb_iter_basic() {
        let mut it = TestLdbIter::new(vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
        ]);
        assert!(!it.valid());
        assert!(it.advance());
        let mut k = Vec::new();
        let mut v = Vec::new();
        it.current(&mut k, &mut v);
        assert_eq!((k, v), (b"a".to_vec(), b"1".to_vec()));
        assert!(it.advance());
        assert!(!it.advance());
        assert!(!it.valid());
    }

    #[test]
    fn test_iterator_properties_on_fixture() {
        let it = TestLdbIter::new(vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
            (b"c".to_vec(), b"3".to_vec()),
        ]);
        test_iterator_properties(it);
    }
}
