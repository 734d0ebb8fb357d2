use std::convert::From;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::result;
use std::{io, sync};

/// StatusCode describes various failure modes of database operations.
#[derive(Clone, Debug, PartialEq)]
#[allow(dead_code)]
pub enum StatusCode {
    OK,

    AlreadyExists,
    Corruption,
    /// A compaction found an overlap at `Builder::save_to` time. The compaction that produced
    /// this edit is abandoned; its inputs are untouched and the planner may retry later.
    CompactionObsolete,
    IOError,
    InvalidArgument,
    LockError,
    NotFound,
    NotSupported,
    PermissionDenied,
}

/// Status encapsulates a `StatusCode` and an error message. It can be displayed, and also
/// implements `Error`.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub code: StatusCode,
    pub err: String,
}

impl Default for Status {
    fn default() -> Status {
        Status {
            code: StatusCode::OK,
            err: String::new(),
        }
    }
}

impl Display for Status {
    fn fmt(&self, fmt: &mut Formatter) -> result::Result<(), fmt::Error> {
        fmt.write_str(&self.err)
    }
}

impl Error for Status {}

impl Status {
    pub fn new(code: StatusCode, msg: &str) -> Status {
        let err = if msg.is_empty() {
            format!("{:?}", code)
        } else {
            format!("{:?}: {}", code, msg)
        };
        Status { code, err }
    }

    pub fn corruption<S: AsRef<str>>(msg: S) -> Status {
        Status::new(StatusCode::Corruption, msg.as_ref())
    }

    pub fn invalid_argument<S: AsRef<str>>(msg: S) -> Status {
        Status::new(StatusCode::InvalidArgument, msg.as_ref())
    }

    pub fn compaction_obsolete<S: AsRef<str>>(msg: S) -> Status {
        Status::new(StatusCode::CompactionObsolete, msg.as_ref())
    }

    pub fn annotate<S: AsRef<str>>(self, msg: S) -> Status {
        Status {
            code: self.code,
            err: format!("{}: {}", msg.as_ref(), self.err),
        }
    }

    /// True if this status should be treated as retryable by the compaction driver rather than
    /// fatal to the database.
    pub fn is_retryable(&self) -> bool {
        self.code == StatusCode::CompactionObsolete
    }
}

/// LevelDB's result type
pub type Result<T> = result::Result<T, Status>;

impl From<io::Error> for Status {
    fn from(e: io::Error) -> Status {
        let c = match e.kind() {
            io::ErrorKind::NotFound => StatusCode::NotFound,
            io::ErrorKind::InvalidData => StatusCode::Corruption,
            io::ErrorKind::InvalidInput => StatusCode::InvalidArgument,
            io::ErrorKind::PermissionDenied => StatusCode::PermissionDenied,
            io::ErrorKind::AlreadyExists => StatusCode::AlreadyExists,
            _ => StatusCode::IOError,
        };

        Status::new(c, &e.to_string())
    }
}

impl<T> From<sync::PoisonError<T>> for Status {
    fn from(_: sync::PoisonError<T>) -> Status {
        Status::new(StatusCode::LockError, "lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_includes_code_and_message() {
        let s = Status::new(StatusCode::Corruption, "bad tag");
        assert_eq!(format!("{}", s), "Corruption: bad tag");
    }

    #[test]
    fn test_status_annotate_prefixes_message() {
        let s = Status::new(StatusCode::IOError, "disk full").annotate("flush");
        assert_eq!(s.err, "flush: IOError: disk full");
    }

    #[test]
    fn test_compaction_obsolete_is_retryable() {
        let s = Status::compaction_obsolete("overlap");
        assert!(s.is_retryable());
        assert!(!Status::new(StatusCode::Corruption, "x").is_retryable());
    }
}
