#![allow(dead_code)]

mod builder;
mod cmp;
mod compaction;
mod disk_env;
mod env;
mod error;
#[macro_use]
mod infolog;
mod key_types;
mod log;
mod mem_env;
mod merging_iter;
mod options;
mod snapshot;
mod table;
mod table_cache;
#[cfg(test)]
mod test_util;
mod types;
mod version;
mod version_edit;
mod version_set;

pub use cmp::{Cmp, DefaultCmp};
pub use error::{Result, Status, StatusCode};
pub use options::{Options, ReadOptions, WriteOptions};
pub use snapshot::Snapshot;
pub use types::LdbIterator;
pub use version_set::VersionSet;
