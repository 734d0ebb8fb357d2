use std::rc::Rc;

use crate::cmp::{Cmp, DefaultCmp};
use crate::disk_env::PosixDiskEnv;
use crate::env::Env;
use crate::infolog::{self, Logger};
use crate::types::{share, SequenceNumber, Shared};

/// Options controls the behavior of a database: which comparator orders keys, which `Env` it
/// runs against, how large memtables/tables/compactions are allowed to grow, and where its
/// informational log goes. A fresh `Options` is cheap to construct (`Options::default()`); tests
/// should prefer `Options::for_test()`, which points the comparator and env at in-memory
/// stand-ins and shrinks the size thresholds so fixtures don't need megabytes of data to exercise
/// level transitions.
pub struct Options {
    pub cmp: Rc<Box<dyn Cmp>>,
    pub env: Rc<Box<dyn Env>>,
    pub logger: Shared<Logger>,

    pub create_if_missing: bool,
    pub error_if_exists: bool,
    pub paranoid_checks: bool,

    pub write_buffer_size: usize,
    pub max_open_files: usize,
    pub block_size: usize,
    pub block_restart_interval: usize,

    /// Target size of a single table file. Compaction input-growth and output-splitting
    /// heuristics are all expressed as multiples of this value.
    pub max_file_size: usize,

    pub reuse_logs: bool,
}

impl Clone for Options {
    fn clone(&self) -> Self {
        Options {
            cmp: self.cmp.clone(),
            env: self.env.clone(),
            logger: self.logger.clone(),
            create_if_missing: self.create_if_missing,
            error_if_exists: self.error_if_exists,
            paranoid_checks: self.paranoid_checks,
            write_buffer_size: self.write_buffer_size,
            max_open_files: self.max_open_files,
            block_size: self.block_size,
            block_restart_interval: self.block_restart_interval,
            max_file_size: self.max_file_size,
            reuse_logs: self.reuse_logs,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            cmp: Rc::new(Box::new(DefaultCmp)),
            env: Rc::new(Box::new(PosixDiskEnv::new())),
            logger: share(infolog::stderr()),
            create_if_missing: true,
            error_if_exists: false,
            paranoid_checks: false,
            write_buffer_size: 4 << 20,
            max_open_files: 1 << 10,
            block_size: 4 << 10,
            block_restart_interval: 16,
            max_file_size: 2 << 20,
            reuse_logs: false,
        }
    }
}

impl Options {
    /// Options suited for unit tests: an in-memory env, a tiny file-size target so a handful of
    /// entries is enough to trigger compactions, and a logger that discards output.
    pub fn for_test() -> Options {
        use crate::mem_env::MemEnv;
        let mut o = Options {
            env: Rc::new(Box::new(MemEnv::new())),
            max_file_size: 2048,
            write_buffer_size: 1 << 12,
            ..Options::default()
        };
        o.logger = share(infolog::sink());
        o
    }

    pub fn set_comparator(&mut self, cmp: Box<dyn Cmp>) {
        self.cmp = Rc::new(cmp);
    }

    pub fn set_env(&mut self, env: Box<dyn Env>) {
        self.env = Rc::new(env);
    }
}

/// Convenience free function mirroring `Options::for_test()`, for call sites that `use
/// crate::options` and reach for `options::for_test()`.
pub fn for_test() -> Options {
    Options::for_test()
}

/// Supplied to read operations.
pub struct ReadOptions {
    pub verify_checksums: bool,
    pub fill_cache: bool,
    pub snapshot: Option<SequenceNumber>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            verify_checksums: false,
            fill_cache: true,
            snapshot: None,
        }
    }
}

/// Supplied to write operations.
#[derive(Default)]
pub struct WriteOptions {
    pub sync: bool,
}
