//! `VersionSet` is the root of the catalogue: it owns the current `Version`, persists every
//! transition to the MANIFEST log, and recovers that history on reopen. It is also where
//! compactions are chosen (`pick_compaction`), since picking one requires comparing the current
//! version's per-level scores against the file-size budgets tracked here.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use std::rc::{Rc, Weak};

use crate::builder::Builder;
use crate::cmp::{Cmp, InternalKeyCmp};
use crate::compaction::Compaction;
use crate::error::{Result, Status};
use crate::key_types::parse_internal_key;
use crate::log::{LogReader, LogWriter};
use crate::options::Options;
use crate::snapshot::{Snapshot, SnapshotList};
use crate::table_cache::TableCache;
use crate::types::{share, FileMetaData, FileNum, SequenceNumber, Shared, NUM_LEVELS};
use crate::version::{total_size, FileMetaHandle, Version};
use crate::version_edit::VersionEdit;

/// Number of L0 files that makes `compaction_score` reach 1.0, matching the trigger level used
/// throughout the compaction heuristics.
const L0_COMPACTION_TRIGGER: usize = 4;

/// A compaction is allowed to pull in extra same-level files (beyond the one that tripped it) as
/// long as doing so doesn't grow the total input size past this multiple of `max_file_size`.
const EXPANDED_COMPACTION_BYTE_SIZE_LIMIT_FACTOR: usize = 25;

fn max_bytes_for_level(level: usize) -> f64 {
    let mut result = 10. * 1048576.0;
    let mut l = level;
    while l > 1 {
        result *= 10.0;
        l -= 1;
    }
    result
}

fn manifest_file_name(dbname: &str, num: FileNum) -> String {
    format!("{}/MANIFEST-{:06}", dbname, num)
}

fn current_file_name(dbname: &str) -> String {
    format!("{}/CURRENT", dbname)
}

fn manifest_number_from_name(name: &str) -> Option<FileNum> {
    name.strip_prefix("MANIFEST-").and_then(|s| s.parse().ok())
}

/// Returns the smallest and largest internal key spanned by `files`. Panics on an empty slice;
/// every call site only reaches this after checking its input is non-empty.
fn base_range(cmp: &InternalKeyCmp, files: &[FileMetaHandle]) -> (Vec<u8>, Vec<u8>) {
    let mut smallest = files[0].borrow().smallest.clone();
    let mut largest = files[0].borrow().largest.clone();
    for f in &files[1..] {
        let f = f.borrow();
        if cmp.cmp(&f.smallest, &smallest) == Ordering::Less {
            smallest = f.smallest.clone();
        }
        if cmp.cmp(&f.largest, &largest) == Ordering::Greater {
            largest = f.largest.clone();
        }
    }
    (smallest, largest)
}

fn total_range(
    cmp: &InternalKeyCmp,
    a: &[FileMetaHandle],
    b: &[FileMetaHandle],
) -> (Vec<u8>, Vec<u8>) {
    if b.is_empty() {
        return base_range(cmp, a);
    }
    if a.is_empty() {
        return base_range(cmp, b);
    }
    let (s1, l1) = base_range(cmp, a);
    let (s2, l2) = base_range(cmp, b);
    let smallest = if cmp.cmp(&s1, &s2) == Ordering::Less { s1 } else { s2 };
    let largest = if cmp.cmp(&l1, &l2) == Ordering::Greater { l1 } else { l2 };
    (smallest, largest)
}

/// Widens `inputs` (assumed from a single level) to include any file in `level_files` whose
/// smallest user key equals the current largest user key in `inputs`. Without this, a compaction
/// could stop in the middle of a run of entries sharing a user key, and a later read could see a
/// newer version in the untouched file alongside an older one in the new output — while `prev()`
/// and an equal-seqnum tie-break rely on every version of a key living in a contiguous run.
fn add_boundary_inputs(cmp: &InternalKeyCmp, level_files: &[FileMetaHandle], inputs: &mut Vec<FileMetaHandle>) {
    if inputs.is_empty() {
        return;
    }
    inputs.sort_by(|a, b| cmp.cmp(&a.borrow().smallest, &b.borrow().smallest));

    loop {
        let largest = inputs.last().unwrap().borrow().largest.clone();
        let largest_ukey = parse_internal_key(&largest).2.to_vec();

        let next = level_files.iter().find(|f| {
            let already_in = inputs.iter().any(|x| x.borrow().num == f.borrow().num);
            if already_in {
                return false;
            }
            let fsmallest = f.borrow().smallest.clone();
            parse_internal_key(&fsmallest).2 == largest_ukey.as_slice()
        });

        match next {
            Some(f) => inputs.push(f.clone()),
            None => break,
        }
    }
}

pub struct VersionSet {
    dbname: String,
    opt: Options,
    table_cache: Shared<TableCache>,

    next_file_number: FileNum,
    manifest_file_number: FileNum,
    last_sequence: SequenceNumber,
    log_number: FileNum,
    prev_log_number: FileNum,

    manifest_writer: Option<LogWriter<Box<dyn std::io::Write>>>,

    current: Option<Shared<Version>>,
    /// Per-level cursor recording where the previous size-triggered compaction on that level left
    /// off, so repeated compactions sweep through the whole key space rather than always picking
    /// the same file.
    compact_pointer: [Vec<u8>; NUM_LEVELS],

    /// Versions superseded by a newer `current` but still referenced by a live iterator/snapshot.
    active: Vec<Weak<std::cell::RefCell<Version>>>,

    /// Sequence numbers pinned by open snapshot reads; consulted by compactions deciding whether
    /// an overwritten or deleted key is still visible to some reader.
    snapshots: SnapshotList,
}

impl VersionSet {
    pub fn new(dbname: &str, opt: Options, table_cache: Shared<TableCache>) -> VersionSet {
        let mut vs = VersionSet {
            dbname: dbname.to_string(),
            opt: opt.clone(),
            table_cache: table_cache.clone(),
            next_file_number: 2,
            manifest_file_number: 0,
            last_sequence: 0,
            log_number: 0,
            prev_log_number: 0,
            manifest_writer: None,
            current: None,
            compact_pointer: Default::default(),
            active: Vec::new(),
            snapshots: SnapshotList::new(),
        };
        let v = share(Version::new(table_cache, opt.cmp.clone()));
        vs.current = Some(v);
        vs
    }

    pub fn new_file_number(&mut self) -> FileNum {
        let n = self.next_file_number;
        self.next_file_number += 1;
        n
    }

    pub fn mark_file_number_used(&mut self, num: FileNum) {
        if self.next_file_number <= num {
            self.next_file_number = num + 1;
        }
    }

    /// Registers a new snapshot pinned at the current last-assigned sequence number.
    pub fn new_snapshot(&mut self) -> Snapshot {
        self.snapshots.new_snapshot(self.last_sequence)
    }

    pub fn release_snapshot(&mut self, ss: Snapshot) {
        self.snapshots.delete(ss)
    }

    /// The oldest sequence number still visible to some open snapshot, or `last_sequence` if none
    /// are open (nothing pins the past, so a compaction may drop any obsolete version).
    pub fn oldest_snapshot(&self) -> SequenceNumber {
        if self.snapshots.empty() {
            self.last_sequence
        } else {
            self.snapshots.oldest()
        }
    }

    pub fn last_sequence(&self) -> SequenceNumber {
        self.last_sequence
    }

    pub fn set_last_sequence(&mut self, s: SequenceNumber) {
        self.last_sequence = s;
    }

    pub fn log_number(&self) -> FileNum {
        self.log_number
    }

    pub fn current(&self) -> Shared<Version> {
        self.current
            .clone()
            .expect("VersionSet always has a current version")
    }

    fn append_version(&mut self, v: Shared<Version>) {
        if let Some(old) = self.current.take() {
            self.active.push(Rc::downgrade(&old));
        }
        self.current = Some(v);
        self.active.retain(|w| w.strong_count() > 0);
    }

    /// Returns every `Version` that some live reference (the current one, or an older one still
    /// pinned by a snapshot or iterator) might read from — the set `get_live_files` must preserve
    /// on disk.
    pub fn live_versions(&self) -> Vec<Shared<Version>> {
        let mut out: Vec<Shared<Version>> = self.active.iter().filter_map(|w| w.upgrade()).collect();
        out.push(self.current());
        out
    }

    pub fn get_live_files(&self) -> HashSet<FileNum> {
        let mut files = HashSet::new();
        for v in self.live_versions() {
            for level in v.borrow().files.iter() {
                for f in level {
                    files.insert(f.borrow().num);
                }
            }
        }
        files
    }

    pub fn needs_compaction(&self) -> bool {
        let v = self.current();
        let v = v.borrow();
        v.compaction_score.map(|s| s >= 1.0).unwrap_or(false) || v.file_to_compact.is_some()
    }

    fn finalize_version(&self, v: &mut Version) {
        let mut best_level = 0;
        let mut best_score = -1.0;
        for level in 0..NUM_LEVELS - 1 {
            let score = if level == 0 {
                v.files[0].len() as f64 / L0_COMPACTION_TRIGGER as f64
            } else {
                total_size(v.files[level].iter()) as f64 / max_bytes_for_level(level)
            };
            if score > best_score {
                best_score = score;
                best_level = level;
            }
        }
        v.compaction_level = Some(best_level);
        v.compaction_score = Some(best_score);
    }

    /// Applies `edit` atop the current version, persists it to the MANIFEST, and makes the
    /// resulting version current. If the edit conflicts with the base version (two overlapping
    /// files land on the same non-L0 level — only possible for a racing, now-stale compaction),
    /// the edit is rejected with `StatusCode::CompactionObsolete` and nothing is changed.
    pub fn log_and_apply(&mut self, mut edit: VersionEdit) -> Result<()> {
        if edit.log_number.is_none() {
            edit.set_log_number(self.log_number);
        }
        if edit.next_file_number.is_none() {
            edit.set_next_file(self.next_file_number);
        }
        if edit.last_sequence.is_none() {
            edit.set_last_sequence(self.last_sequence);
        }

        let mut builder = Builder::new(self.current(), self.opt.cmp.clone());
        builder.apply(&edit, &mut self.compact_pointer);
        let mut v = Version::new(self.table_cache.clone(), self.opt.cmp.clone());
        builder.save_to(&mut v)?;
        self.finalize_version(&mut v);

        if self.manifest_writer.is_none() {
            // `create_manifest` writes CURRENT itself once the new descriptor is in place; a
            // record appended below an already-current manifest never needs to touch CURRENT.
            self.create_manifest()?;
        }

        let mut record = Vec::new();
        edit.encode_to(&mut record);
        if let Some(ref mut w) = self.manifest_writer {
            w.add_record(&record)?;
        }

        if let Some(n) = edit.log_number {
            self.log_number = n;
        }
        if let Some(n) = edit.prev_log_number {
            self.prev_log_number = n;
        }
        if let Some(n) = edit.last_sequence {
            self.last_sequence = n;
        }

        self.append_version(share(v));
        Ok(())
    }

    fn set_current_file(&self, manifest_number: FileNum) -> Result<()> {
        let tmp = format!("{}/CURRENT.dbtmp", self.dbname);
        let manifest_base = format!("MANIFEST-{:06}", manifest_number);
        {
            let mut f = self.opt.env.new_writable_file(Path::new(&tmp))?;
            f.write_all(manifest_base.as_bytes())?;
            f.write_all(b"\n")?;
        }
        self.opt
            .env
            .rename(Path::new(&tmp), Path::new(&current_file_name(&self.dbname)))
    }

    fn create_manifest(&mut self) -> Result<()> {
        let num = self.new_file_number();
        self.manifest_file_number = num;
        let path = manifest_file_name(&self.dbname, num);
        let f = self.opt.env.new_writable_file(Path::new(&path))?;
        let mut writer = LogWriter::new(f);

        let mut edit = VersionEdit::new();
        edit.set_comparator_name(self.opt.cmp.id());
        edit.set_log_number(self.log_number);
        edit.set_prev_log_number(self.prev_log_number);
        edit.set_next_file(self.next_file_number);
        edit.set_last_sequence(self.last_sequence);
        for level in 0..NUM_LEVELS {
            for fh in &self.current().borrow().files[level] {
                let f = fh.borrow();
                edit.new_file(
                    level,
                    &FileMetaData::new(f.num, f.size, f.smallest.clone(), f.largest.clone()),
                );
            }
        }

        let mut record = Vec::new();
        edit.encode_to(&mut record);
        writer.add_record(&record)?;

        self.manifest_writer = Some(writer);
        self.set_current_file(num)
    }

    /// Reads `CURRENT` and replays its MANIFEST to rebuild the current version and all
    /// bookkeeping counters. Returns an error if no database exists at `dbname` yet; the caller
    /// (the DB façade, out of scope here) is responsible for deciding whether to create one.
    pub fn recover(&mut self) -> Result<()> {
        use std::io::Read;

        let current_path = current_file_name(&self.dbname);
        if !self.opt.env.file_exists(Path::new(&current_path))? {
            return Err(Status::invalid_argument("CURRENT file not found"));
        }

        let mut buf = Vec::new();
        {
            let mut f = self.opt.env.new_sequential_file(Path::new(&current_path))?;
            f.read_to_end(&mut buf)?;
        }
        let manifest_base = String::from_utf8_lossy(&buf).trim().to_string();
        if manifest_base.is_empty() {
            return Err(Status::corruption("CURRENT file is empty"));
        }
        let manifest_path = format!("{}/{}", self.dbname, manifest_base);

        let f = self.opt.env.new_sequential_file(Path::new(&manifest_path))?;
        let mut reader = LogReader::new(f, true);
        let mut builder = Builder::new(self.current(), self.opt.cmp.clone());

        let mut next_file = self.next_file_number;
        let mut last_seq = self.last_sequence;
        let mut log_number = self.log_number;
        let mut prev_log_number = self.prev_log_number;

        let mut record = Vec::new();
        loop {
            let n = reader.read(&mut record)?;
            if n == 0 {
                break;
            }
            let edit = VersionEdit::decode_from(&record)?;
            builder.apply(&edit, &mut self.compact_pointer);
            if let Some(v) = edit.next_file_number {
                next_file = v;
            }
            if let Some(v) = edit.last_sequence {
                last_seq = v;
            }
            if let Some(v) = edit.log_number {
                log_number = v;
            }
            if let Some(v) = edit.prev_log_number {
                prev_log_number = v;
            }
        }

        let mut v = Version::new(self.table_cache.clone(), self.opt.cmp.clone());
        builder.save_to(&mut v)?;
        self.finalize_version(&mut v);
        self.append_version(share(v));

        self.next_file_number = next_file;
        self.last_sequence = last_seq;
        self.log_number = log_number;
        self.prev_log_number = prev_log_number;
        if let Some(n) = manifest_number_from_name(&manifest_base) {
            self.manifest_file_number = n;
            self.mark_file_number_used(n);
        }

        let mf = self.opt.env.new_appendable_file(Path::new(&manifest_path))?;
        self.manifest_writer = Some(LogWriter::new(mf));

        log!(
            self.opt.logger,
            "Recovered manifest {}: next_file={} last_seq={} {}",
            manifest_base,
            self.next_file_number,
            self.last_sequence,
            self.current().borrow().level_summary()
        );
        Ok(())
    }

    /// Chooses the next compaction to run, preferring a size-triggered compaction on the level
    /// with the highest `compaction_score` over a seek-triggered one (`file_to_compact`), and
    /// `None` if neither is due. Returns the compaction with its input files selected but not yet
    /// run.
    pub fn pick_compaction(&mut self) -> Option<Compaction> {
        let current = self.current();
        let size_triggered = current.borrow().compaction_score.unwrap_or(0.0) >= 1.0;

        let mut c = if size_triggered {
            let level = current.borrow().compaction_level.unwrap_or(0);
            let icmp = InternalKeyCmp(self.opt.cmp.clone());
            let chosen = {
                let v = current.borrow();
                let files = &v.files[level];
                if files.is_empty() {
                    None
                } else {
                    let pointer = &self.compact_pointer[level];
                    let after_pointer = if !pointer.is_empty() {
                        files
                            .iter()
                            .find(|f| icmp.cmp(&f.borrow().largest, pointer) == Ordering::Greater)
                            .cloned()
                    } else {
                        None
                    };
                    Some(after_pointer.unwrap_or_else(|| files[0].clone()))
                }
            };
            let f = chosen?;
            let mut c = Compaction::new(&self.opt, level);
            c.inputs[0] = vec![f];
            c
        } else if let Some(f) = current.borrow().file_to_compact.clone() {
            let level = current.borrow().file_to_compact_lvl;
            let mut c = Compaction::new(&self.opt, level);
            c.inputs[0] = vec![f];
            c
        } else {
            return None;
        };

        c.input_version = Some(current.clone());

        if c.level == 0 {
            let icmp = InternalKeyCmp(self.opt.cmp.clone());
            let (smallest, largest) = base_range(&icmp, &c.inputs[0]);
            c.inputs[0] = current.borrow().overlapping_inputs(0, &smallest, &largest);
            assert!(!c.inputs[0].is_empty());
        }

        self.setup_other_inputs(&mut c);
        log!(
            self.opt.logger,
            "Compacting level {} ({} + {} files)",
            c.level,
            c.inputs[0].len(),
            c.inputs[1].len()
        );
        Some(c)
    }

    fn setup_other_inputs(&mut self, c: &mut Compaction) {
        let icmp = InternalKeyCmp(self.opt.cmp.clone());
        let level = c.level;
        let current = self.current();

        {
            let level_files = current.borrow().files[level].clone();
            add_boundary_inputs(&icmp, &level_files, &mut c.inputs[0]);
        }

        let (smallest, largest) = base_range(&icmp, &c.inputs[0]);
        c.inputs[1] = current.borrow().overlapping_inputs(level + 1, &smallest, &largest);
        {
            let next_level_files = current.borrow().files[level + 1].clone();
            add_boundary_inputs(&icmp, &next_level_files, &mut c.inputs[1]);
        }

        let (mut all_smallest, mut all_largest) = total_range(&icmp, &c.inputs[0], &c.inputs[1]);

        if !c.inputs[1].is_empty() {
            let expanded0 = current
                .borrow()
                .overlapping_inputs(level, &all_smallest, &all_largest);
            let grown_size = total_size(c.inputs[1].iter()) + total_size(expanded0.iter());
            if expanded0.len() > c.inputs[0].len()
                && grown_size
                    < EXPANDED_COMPACTION_BYTE_SIZE_LIMIT_FACTOR * self.opt.max_file_size
            {
                let (new_smallest, new_largest) = base_range(&icmp, &expanded0);
                let expanded1 = current
                    .borrow()
                    .overlapping_inputs(level + 1, &new_smallest, &new_largest);
                if expanded1.len() == c.inputs[1].len() {
                    c.inputs[0] = expanded0;
                    c.inputs[1] = expanded1;
                    let (s, l) = total_range(&icmp, &c.inputs[0], &c.inputs[1]);
                    all_smallest = s;
                    all_largest = l;
                }
            }
        }

        if level + 2 < NUM_LEVELS {
            let grandparents = current
                .borrow()
                .overlapping_inputs(level + 2, &all_smallest, &all_largest);
            c.set_grandparents(grandparents);
        } else {
            c.set_grandparents(vec![]);
        }

        c.edit.set_compact_pointer(level, &all_largest);
    }
}
