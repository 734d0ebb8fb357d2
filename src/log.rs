#![allow(dead_code)]

//! A log consists of a number of blocks.
//! A block consists of a number of records, and an optional trailer (filler).
//! A record is a bytestring: [checksum: uint32, length: uint16, type: uint8, data: [u8]]
//! checksum is the crc32 sum of type and data; type is one of RecordType::{Full/First/Middle/Last}
//!
//! This framing is used both for the write-ahead log (out of scope here) and for the MANIFEST,
//! which is how a `VersionSet` persists and recovers its sequence of `VersionEdit`s.

use std::io::{Read, Write};

use crc::{crc32, Hasher32};
use integer_encoding::FixedInt;

use crate::error::{Result, Status, StatusCode};

const BLOCK_SIZE: usize = 32 * 1024;
const HEADER_SIZE: usize = 4 + 2 + 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordType {
    Full = 1,
    First = 2,
    Middle = 3,
    Last = 4,
}

impl RecordType {
    fn from_u8(b: u8) -> Option<RecordType> {
        match b {
            1 => Some(RecordType::Full),
            2 => Some(RecordType::First),
            3 => Some(RecordType::Middle),
            4 => Some(RecordType::Last),
            _ => None,
        }
    }
}

pub struct LogWriter<W: Write> {
    dst: W,
    current_block_offset: usize,
}

impl<W: Write> LogWriter<W> {
    pub fn new(writer: W) -> LogWriter<W> {
        LogWriter {
            dst: writer,
            current_block_offset: 0,
        }
    }

    pub fn add_record(&mut self, r: &[u8]) -> Result<usize> {
        let mut record = r;
        let mut first_frag = true;
        let mut result = 0;

        while !record.is_empty() {
            let space_left = BLOCK_SIZE - self.current_block_offset;
            // Fill up block; go to the next block.
            if space_left < HEADER_SIZE {
                self.dst.write_all(&[0, 0, 0, 0, 0, 0][0..space_left])?;
                self.current_block_offset = 0;
            }

            let avail_for_data = BLOCK_SIZE - self.current_block_offset - HEADER_SIZE;

            let data_frag_len = if record.len() < avail_for_data {
                record.len()
            } else {
                avail_for_data
            };

            let recordtype = if first_frag && data_frag_len == record.len() {
                RecordType::Full
            } else if first_frag {
                RecordType::First
            } else if data_frag_len == record.len() {
                RecordType::Last
            } else {
                RecordType::Middle
            };

            result += self.emit_record(recordtype, record, data_frag_len)?;
            record = &record[data_frag_len..];
            first_frag = false;
        }

        Ok(result)
    }

    fn emit_record(&mut self, t: RecordType, data: &[u8], len: usize) -> Result<usize> {
        assert!(len < 256 * 256);

        let mut digest = crc32::Digest::new(crc32::CASTAGNOLI);
        digest.write(&[t as u8]);
        digest.write(data);
        let chksum = digest.sum32();

        let mut s = 0;
        s += self.dst.write(&chksum.encode_fixed_vec())?;
        s += self.dst.write(&(len as u16).encode_fixed_vec())?;
        s += self.dst.write(&[t as u8])?;
        s += self.dst.write(&data[..len])?;

        self.current_block_offset += s;
        Ok(s)
    }
}

/// Reads records written by a `LogWriter` back out, reassembling First/Middle/Last fragments
/// and verifying the checksum of every physical record it reads.
pub struct LogReader<R: Read> {
    src: R,
    blk_off: usize,
    blk: Vec<u8>,
    verify_checksums: bool,
}

impl<R: Read> LogReader<R> {
    pub fn new(src: R, verify_checksums: bool) -> LogReader<R> {
        LogReader {
            src,
            blk_off: 0,
            blk: Vec::new(),
            verify_checksums,
        }
    }

    /// Reads the next logical record into `dst`, returning its length, or an error with
    /// `StatusCode::Corruption` if the underlying bytes are malformed or fail a checksum. Returns
    /// `Ok(0)` at end of file.
    pub fn read(&mut self, dst: &mut Vec<u8>) -> Result<usize> {
        dst.clear();
        let mut in_fragmented_record = false;

        loop {
            let (t, data) = match self.read_physical_record()? {
                Some(x) => x,
                None => {
                    if in_fragmented_record {
                        return Err(Status::corruption("unexpected eof mid-record"));
                    }
                    return Ok(0);
                }
            };

            match t {
                RecordType::Full => {
                    dst.extend_from_slice(&data);
                    return Ok(dst.len());
                }
                RecordType::First => {
                    dst.extend_from_slice(&data);
                    in_fragmented_record = true;
                }
                RecordType::Middle => {
                    if !in_fragmented_record {
                        return Err(Status::corruption("missing start of fragmented record"));
                    }
                    dst.extend_from_slice(&data);
                }
                RecordType::Last => {
                    if !in_fragmented_record {
                        return Err(Status::corruption("missing start of fragmented record"));
                    }
                    dst.extend_from_slice(&data);
                    return Ok(dst.len());
                }
            }
        }
    }

    fn read_physical_record(&mut self) -> Result<Option<(RecordType, Vec<u8>)>> {
        if BLOCK_SIZE - self.blk_off < HEADER_SIZE {
            self.blk.clear();
            self.blk_off = 0;
        }

        if self.blk_off == 0 {
            let mut buf = vec![0u8; BLOCK_SIZE];
            let n = read_fully(&mut self.src, &mut buf)?;
            if n == 0 {
                return Ok(None);
            }
            buf.truncate(n);
            self.blk = buf;
        }

        if self.blk.len() < self.blk_off + HEADER_SIZE {
            return Ok(None);
        }

        let header = &self.blk[self.blk_off..self.blk_off + HEADER_SIZE];
        let chksum: u32 = FixedInt::decode_fixed(&header[0..4]).unwrap();
        let len: u16 = FixedInt::decode_fixed(&header[4..6]).unwrap();
        let rtype = RecordType::from_u8(header[6])
            .ok_or_else(|| Status::corruption("bad record type"))?;

        let data_start = self.blk_off + HEADER_SIZE;
        let data_end = data_start + len as usize;
        if data_end > self.blk.len() {
            return Err(Status::corruption("record length exceeds block"));
        }
        let data = self.blk[data_start..data_end].to_vec();

        if self.verify_checksums {
            let mut digest = crc32::Digest::new(crc32::CASTAGNOLI);
            digest.write(&[rtype as u8]);
            digest.write(&data);
            if digest.sum32() != chksum {
                return Err(Status::new(StatusCode::Corruption, "checksum mismatch"));
            }
        }

        self.blk_off = data_end;
        Ok(Some((rtype, data)))
    }
}

fn read_fully<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match src.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer() {
        let data = "hello world, My first Log entry".as_bytes();
        let mut lw = LogWriter::new(Vec::new());

        let _ = lw.add_record(data);

        assert_eq!(lw.current_block_offset, data.len() + HEADER_SIZE);
        assert_eq!(&lw.dst[HEADER_SIZE..], data)
    }

    #[test]
    fn test_roundtrip_single_record() {
        let mut buf = Vec::new();
        let mut lw = LogWriter::new(&mut buf);
        lw.add_record(b"a short record").unwrap();

        let mut lr = LogReader::new(buf.as_slice(), true);
        let mut out = Vec::new();
        let n = lr.read(&mut out).unwrap();
        assert_eq!(n, out.len());
        assert_eq!(out, b"a short record");
        assert_eq!(lr.read(&mut Vec::new()).unwrap(), 0);
    }

    #[test]
    fn test_roundtrip_multiple_records() {
        let mut buf = Vec::new();
        {
            let mut lw = LogWriter::new(&mut buf);
            lw.add_record(b"first").unwrap();
            lw.add_record(b"second").unwrap();
            lw.add_record(b"third").unwrap();
        }

        let mut lr = LogReader::new(buf.as_slice(), true);
        let mut out = Vec::new();
        lr.read(&mut out).unwrap();
        assert_eq!(out, b"first");
        lr.read(&mut out).unwrap();
        assert_eq!(out, b"second");
        lr.read(&mut out).unwrap();
        assert_eq!(out, b"third");
        assert_eq!(lr.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn test_roundtrip_spans_multiple_blocks() {
        let mut buf = Vec::new();
        let big = vec![7u8; BLOCK_SIZE * 2 + 100];
        {
            let mut lw = LogWriter::new(&mut buf);
            lw.add_record(&big).unwrap();
            lw.add_record(b"trailer").unwrap();
        }

        let mut lr = LogReader::new(buf.as_slice(), true);
        let mut out = Vec::new();
        lr.read(&mut out).unwrap();
        assert_eq!(out, big);
        lr.read(&mut out).unwrap();
        assert_eq!(out, b"trailer");
    }

    #[test]
    fn test_checksum_mismatch_is_corruption() {
        let mut buf = Vec::new();
        {
            let mut lw = LogWriter::new(&mut buf);
            lw.add_record(b"tamper me").unwrap();
        }
        // flip a data byte without updating the checksum.
        let data_start = HEADER_SIZE;
        buf[data_start] ^= 0xff;

        let mut lr = LogReader::new(buf.as_slice(), true);
        let mut out = Vec::new();
        let err = lr.read(&mut out).unwrap_err();
        assert_eq!(err.code, StatusCode::Corruption);
    }
}
