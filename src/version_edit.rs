//! `VersionEdit` is the unit of change applied to a `Version`: a small, serializable delta
//! ("add these files to level L", "drop these files from level L", "bump the log number") that
//! both drives in-memory `Builder::apply` and gets appended to the MANIFEST so a restarted
//! process can replay history instead of rescanning the directory.
//!
//! Wire format: a record is a sequence of (tag: varint32, payload) pairs; a decoder that sees an
//! unknown tag treats it as corruption rather than skipping it, since silently ignoring a field
//! could hide a downgrade-compatibility bug.

use integer_encoding::{FixedInt, VarInt};

use crate::error::{Result, Status};
use crate::types::{FileMetaData, FileNum, SequenceNumber, NUM_LEVELS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Comparator = 1,
    LogNumber = 2,
    NextFileNumber = 3,
    LastSequence = 4,
    CompactPointer = 5,
    DeletedFile = 6,
    NewFile = 7,
    PrevLogNumber = 9,
}

impl Tag {
    fn from_u32(t: u32) -> Option<Tag> {
        match t {
            1 => Some(Tag::Comparator),
            2 => Some(Tag::LogNumber),
            3 => Some(Tag::NextFileNumber),
            4 => Some(Tag::LastSequence),
            5 => Some(Tag::CompactPointer),
            6 => Some(Tag::DeletedFile),
            7 => Some(Tag::NewFile),
            9 => Some(Tag::PrevLogNumber),
            _ => None,
        }
    }
}

/// One file added by a `VersionEdit`, before it has been wrapped in the refcounted
/// `FileMetaHandle` that `Version` actually stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFileEntry {
    pub level: usize,
    pub num: FileNum,
    pub size: usize,
    pub smallest: Vec<u8>,
    pub largest: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct VersionEdit {
    pub comparator: Option<String>,
    pub log_number: Option<FileNum>,
    pub prev_log_number: Option<FileNum>,
    pub next_file_number: Option<FileNum>,
    pub last_sequence: Option<SequenceNumber>,

    pub compact_pointers: Vec<(usize, Vec<u8>)>,
    pub deleted_files: Vec<(usize, FileNum)>,
    pub new_files: Vec<NewFileEntry>,
}

impl VersionEdit {
    pub fn new() -> VersionEdit {
        VersionEdit::default()
    }

    pub fn set_comparator_name(&mut self, name: &str) {
        self.comparator = Some(name.to_string());
    }

    pub fn set_log_number(&mut self, num: FileNum) {
        self.log_number = Some(num);
    }

    pub fn set_prev_log_number(&mut self, num: FileNum) {
        self.prev_log_number = Some(num);
    }

    pub fn set_next_file(&mut self, num: FileNum) {
        self.next_file_number = Some(num);
    }

    pub fn set_last_sequence(&mut self, seq: SequenceNumber) {
        self.last_sequence = Some(seq);
    }

    pub fn set_compact_pointer(&mut self, level: usize, key: &[u8]) {
        self.compact_pointers.push((level, key.to_vec()));
    }

    pub fn delete_file(&mut self, level: usize, num: FileNum) {
        self.deleted_files.push((level, num));
    }

    pub fn new_file(&mut self, level: usize, f: &FileMetaData) {
        self.new_files.push(NewFileEntry {
            level,
            num: f.num,
            size: f.size,
            smallest: f.smallest.clone(),
            largest: f.largest.clone(),
        });
    }

    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        if let Some(ref name) = self.comparator {
            put_varint(dst, Tag::Comparator as u32);
            put_lenprefixed(dst, name.as_bytes());
        }
        if let Some(n) = self.log_number {
            put_varint(dst, Tag::LogNumber as u32);
            put_varint64(dst, n);
        }
        if let Some(n) = self.prev_log_number {
            put_varint(dst, Tag::PrevLogNumber as u32);
            put_varint64(dst, n);
        }
        if let Some(n) = self.next_file_number {
            put_varint(dst, Tag::NextFileNumber as u32);
            put_varint64(dst, n);
        }
        if let Some(s) = self.last_sequence {
            put_varint(dst, Tag::LastSequence as u32);
            put_varint64(dst, s);
        }
        for (level, key) in &self.compact_pointers {
            put_varint(dst, Tag::CompactPointer as u32);
            put_varint(dst, *level as u32);
            put_lenprefixed(dst, key);
        }
        for (level, num) in &self.deleted_files {
            put_varint(dst, Tag::DeletedFile as u32);
            put_varint(dst, *level as u32);
            put_varint64(dst, *num);
        }
        for f in &self.new_files {
            put_varint(dst, Tag::NewFile as u32);
            put_varint(dst, f.level as u32);
            put_varint64(dst, f.num);
            put_varint64(dst, f.size as u64);
            put_lenprefixed(dst, &f.smallest);
            put_lenprefixed(dst, &f.largest);
        }
    }

    pub fn decode_from(src: &[u8]) -> Result<VersionEdit> {
        let mut edit = VersionEdit::new();
        let mut rest = src;

        while !rest.is_empty() {
            let (tag_val, n) = get_varint(rest)?;
            rest = &rest[n..];
            let tag = Tag::from_u32(tag_val)
                .ok_or_else(|| Status::corruption("unknown VersionEdit tag"))?;

            match tag {
                Tag::Comparator => {
                    let (s, n) = get_lenprefixed(rest)?;
                    rest = &rest[n..];
                    edit.comparator = Some(String::from_utf8_lossy(s).into_owned());
                }
                Tag::LogNumber => {
                    let (v, n) = get_varint64(rest)?;
                    rest = &rest[n..];
                    edit.log_number = Some(v);
                }
                Tag::PrevLogNumber => {
                    let (v, n) = get_varint64(rest)?;
                    rest = &rest[n..];
                    edit.prev_log_number = Some(v);
                }
                Tag::NextFileNumber => {
                    let (v, n) = get_varint64(rest)?;
                    rest = &rest[n..];
                    edit.next_file_number = Some(v);
                }
                Tag::LastSequence => {
                    let (v, n) = get_varint64(rest)?;
                    rest = &rest[n..];
                    edit.last_sequence = Some(v);
                }
                Tag::CompactPointer => {
                    let (level, n) = get_level(rest)?;
                    rest = &rest[n..];
                    let (key, n) = get_lenprefixed(rest)?;
                    rest = &rest[n..];
                    edit.compact_pointers.push((level, key.to_vec()));
                }
                Tag::DeletedFile => {
                    let (level, n) = get_level(rest)?;
                    rest = &rest[n..];
                    let (num, n) = get_varint64(rest)?;
                    rest = &rest[n..];
                    edit.deleted_files.push((level, num));
                }
                Tag::NewFile => {
                    let (level, n) = get_level(rest)?;
                    rest = &rest[n..];
                    let (num, n) = get_varint64(rest)?;
                    rest = &rest[n..];
                    let (size, n) = get_varint64(rest)?;
                    rest = &rest[n..];
                    let (smallest, n) = get_lenprefixed(rest)?;
                    rest = &rest[n..];
                    let (largest, n) = get_lenprefixed(rest)?;
                    rest = &rest[n..];
                    edit.new_files.push(NewFileEntry {
                        level,
                        num,
                        size: size as usize,
                        smallest: smallest.to_vec(),
                        largest: largest.to_vec(),
                    });
                }
            }
        }

        Ok(edit)
    }
}

fn get_level(src: &[u8]) -> Result<(usize, usize)> {
    let (v, n) = get_varint(src)?;
    let level = v as usize;
    if level >= NUM_LEVELS {
        return Err(Status::corruption("level out of range in VersionEdit"));
    }
    Ok((level, n))
}

fn put_varint(dst: &mut Vec<u8>, v: u32) {
    let mut buf = vec![0; v.required_space()];
    let n = v.encode_var(&mut buf);
    dst.extend_from_slice(&buf[..n]);
}

fn put_varint64(dst: &mut Vec<u8>, v: u64) {
    let mut buf = vec![0; v.required_space()];
    let n = v.encode_var(&mut buf);
    dst.extend_from_slice(&buf[..n]);
}

fn put_lenprefixed(dst: &mut Vec<u8>, data: &[u8]) {
    put_varint(dst, data.len() as u32);
    dst.extend_from_slice(data);
}

fn get_varint(src: &[u8]) -> Result<(u32, usize)> {
    u32::decode_var(src).ok_or_else(|| Status::corruption("truncated varint in VersionEdit"))
}

fn get_varint64(src: &[u8]) -> Result<(u64, usize)> {
    u64::decode_var(src).ok_or_else(|| Status::corruption("truncated varint in VersionEdit"))
}

fn get_lenprefixed(src: &[u8]) -> Result<(&[u8], usize)> {
    let (len, n) = get_varint(src)?;
    let len = len as usize;
    if src.len() < n + len {
        return Err(Status::corruption("truncated length-prefixed field"));
    }
    Ok((&src[n..n + len], n + len))
}
