//! # Durable Journal
//!
//! Append-only JSON-lines file. Each line is one committed write-set:
//!
//! ```text
//! {"seq":1,"writes":[{"op":"put_product",...},{"op":"put_event",...},...]}
//! ```
//!
//! A line is written and `sync_data`'d before its writes are applied in
//! memory. If the append fails part way, the file is truncated back to its
//! previous length so a torn line never reaches the next replay.
//!
//! A process that dies mid-append can still leave an unterminated, undecodable
//! final line. That entry was never acknowledged: [`Journal::open`] cuts it
//! off and [`Journal::replay`] skips it. An undecodable line anywhere before
//! the end is corruption.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write as _};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::store::Write;

#[derive(Deserialize)]
struct Entry {
    seq: u64,
    writes: Vec<Write>,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    seq: u64,
    writes: &'a [Write],
}

/// What a pass over the file found.
#[derive(Default)]
struct Scan {
    batches: Vec<Vec<Write>>,
    /// Bytes up to the end of the last decodable line.
    committed_len: u64,
    /// The last decodable line has no trailing newline.
    unterminated: bool,
    /// Length of an undecodable, unterminated final fragment.
    torn: Option<usize>,
}

/// Handle to an open journal file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
    len: u64,
    next_seq: u64,
}

impl Journal {
    /// Open `path` for appending, creating it if missing, and return the
    /// write-sets already in it.
    ///
    /// A torn final entry is truncated away before the file is handed out.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<Vec<Write>>), StorageError> {
        let path = path.as_ref().to_path_buf();
        let scan = if path.exists() {
            Self::scan(&path)?
        } else {
            Scan::default()
        };
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if let Some(bytes) = scan.torn {
            tracing::warn!(
                path = %path.display(),
                bytes,
                kept = scan.batches.len(),
                "discarding torn journal entry left by an interrupted append"
            );
            file.set_len(scan.committed_len)?;
            file.sync_data()?;
        }
        if scan.unterminated {
            file.write_all(b"\n")?;
            file.sync_data()?;
        }
        let len = file.metadata()?.len();
        let journal = Self {
            path,
            file,
            len,
            next_seq: scan.batches.len() as u64 + 1,
        };
        Ok((journal, scan.batches))
    }

    /// Read every write-set in the file at `path`, ignoring a torn final
    /// entry. Safe to run against a journal another process is appending to.
    ///
    /// # Errors
    ///
    /// [`StorageError::Corrupt`] for an undecodable line before the end of
    /// the file, or a sequence gap.
    pub fn replay(path: &Path) -> Result<Vec<Vec<Write>>, StorageError> {
        let scan = Self::scan(path)?;
        if let Some(bytes) = scan.torn {
            tracing::debug!(path = %path.display(), bytes, "ignoring unterminated trailing entry");
        }
        Ok(scan.batches)
    }

    fn scan(path: &Path) -> Result<Scan, StorageError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut scan = Scan::default();
        let mut buf = Vec::new();
        let mut line = 0usize;
        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            line += 1;
            let terminated = buf.last() == Some(&b'\n');
            if buf.iter().all(u8::is_ascii_whitespace) {
                scan.committed_len += read as u64;
                continue;
            }
            let entry: Entry = match serde_json::from_slice(&buf) {
                Ok(entry) => entry,
                Err(_) if !terminated => {
                    scan.torn = Some(read);
                    break;
                }
                Err(e) => {
                    return Err(StorageError::Corrupt {
                        line,
                        reason: e.to_string(),
                    })
                }
            };
            let expected = scan.batches.len() as u64 + 1;
            if entry.seq != expected {
                return Err(StorageError::Corrupt {
                    line,
                    reason: format!("sequence {} out of order, expected {expected}", entry.seq),
                });
            }
            scan.batches.push(entry.writes);
            scan.committed_len += read as u64;
            scan.unterminated = !terminated;
        }
        Ok(scan)
    }

    /// Append one write-set and sync it to disk.
    pub fn append(&mut self, writes: &[Write]) -> Result<(), StorageError> {
        let entry = EntryRef {
            seq: self.next_seq,
            writes,
        };
        let mut line =
            serde_json::to_vec(&entry).map_err(|e| StorageError::Encode(e.to_string()))?;
        line.push(b'\n');

        if let Err(e) = self
            .file
            .write_all(&line)
            .and_then(|()| self.file.sync_data())
        {
            if let Err(truncate) = self.file.set_len(self.len) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %truncate,
                    "failed to truncate torn journal entry"
                );
            }
            return Err(StorageError::Io(e));
        }

        self.len += line.len() as u64;
        self.next_seq += 1;
        tracing::debug!(seq = entry.seq, writes = writes.len(), "journal entry appended");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of write-sets in the journal.
    pub fn entries(&self) -> u64 {
        self.next_seq - 1
    }

    /// Attach to a file without replaying it.
    #[cfg(test)]
    pub(crate) fn attach_unchecked(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            len: 0,
            next_seq: 1,
        })
    }
}
