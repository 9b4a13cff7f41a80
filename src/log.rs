//! Log File Module
//!
//! Owns the append-only data file: a buffered append handle plus an
//! independent buffered read handle over the same path.
//!
//! ## Responsibilities
//! - Append framed records and report their offsets
//! - Positioned reads for GET, recovery and compaction
//! - fsync on demand (every mutation syncs before it is durable)
//! - Torn-tail truncation during recovery
//! - Atomic whole-file replace during compaction

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Append-only log file with an independent read handle.
///
/// The append handle is opened in append mode, so the tracked write
/// position is valid as long as this process is the only writer.
pub struct LogFile {
    /// Path of the live log file
    path: PathBuf,

    /// Buffered append handle
    writer: BufWriter<File>,

    /// Independent buffered read handle
    reader: BufReader<File>,

    /// Offset one past the last byte written
    write_pos: u64,
}

impl LogFile {
    /// Open or create the log file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let write_pos = file.metadata()?.len();

        let reader = BufReader::new(File::open(path)?);

        Ok(LogFile {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            reader,
            write_pos,
        })
    }

    /// Append `bytes`, flush the write buffer, and return the file offset
    /// of the first byte written.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.write_pos;
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        self.write_pos += bytes.len() as u64;
        Ok(offset)
    }

    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// A short read surfaces as `Io` with kind `UnexpectedEof`; callers
    /// that treat it as a framing failure map it themselves.
    pub fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read one `\n`-terminated line starting at `offset`.
    ///
    /// Returns the raw line without its newline plus the offset one past
    /// the newline. Returns `None` at EOF or when the bytes at `offset`
    /// end without a newline (a torn tail).
    pub fn read_line_at(&mut self, offset: u64) -> Result<Option<(Vec<u8>, u64)>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line)?;
        if n == 0 || line.last() != Some(&b'\n') {
            return Ok(None);
        }
        line.pop();
        Ok(Some((line, offset + n as u64)))
    }

    /// Flush application buffers and fsync to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Current size of the log in bytes.
    pub fn size(&self) -> u64 {
        self.write_pos
    }

    /// Path of the live log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the file to `len` bytes. Used only by recovery to drop a
    /// torn tail; subsequent appends begin at `len`.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().set_len(len)?;
        self.write_pos = len;
        // Discard any buffered stale bytes in the read handle.
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Atomically replace the live log with the file at `other_path`.
    ///
    /// Fresh handles are opened on `other_path`, the file is renamed over
    /// the live path, and only then are the old handles swapped out, so a
    /// failed rename leaves this log untouched. An interrupted replace
    /// leaves either the old or the new complete file on disk. Both
    /// handles refer to the new file when this returns.
    pub fn atomic_replace(&mut self, other_path: &Path) -> Result<()> {
        self.writer.flush()?;

        let file = OpenOptions::new().append(true).open(other_path)?;
        let write_pos = file.metadata()?.len();
        let reader = BufReader::new(File::open(other_path)?);

        std::fs::rename(other_path, &self.path)?;

        self.writer = BufWriter::new(file);
        self.reader = reader;
        self.write_pos = write_pos;
        Ok(())
    }
}
