//! Record streaming from generated files.

use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

const CHUNK_SIZE: usize = 64 * 1024;

/// Reads a sequence of files as one stream of records, stripping the
/// generator's trailing field delimiter from every line.
///
/// Output is yielded in chunks of roughly 64 KiB, always on line boundaries.
pub struct RecordReader {
    pending: VecDeque<PathBuf>,
    current: Option<BufReader<File>>,
    delimiter: u8,
    line: Vec<u8>,
}

impl RecordReader {
    pub fn new(sources: Vec<PathBuf>, delimiter: u8) -> Self {
        Self {
            pending: sources.into(),
            current: None,
            delimiter,
            line: Vec::new(),
        }
    }

    /// Next chunk of records, or `None` once every file is exhausted.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let mut chunk = BytesMut::with_capacity(CHUNK_SIZE);

        while chunk.len() < CHUNK_SIZE {
            if self.current.is_none() {
                let Some(path) = self.pending.pop_front() else {
                    break;
                };
                let file = File::open(&path).await.map_err(|e| {
                    io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
                })?;
                self.current = Some(BufReader::new(file));
            }
            let Some(reader) = self.current.as_mut() else {
                break;
            };

            self.line.clear();
            if reader.read_until(b'\n', &mut self.line).await? == 0 {
                self.current = None;
                continue;
            }
            strip_trailing_delimiter(&mut self.line, self.delimiter);
            chunk.extend_from_slice(&self.line);
        }

        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk.freeze()))
        }
    }
}

/// Remove one delimiter immediately before the line terminator, and always
/// leave the line newline-terminated.
fn strip_trailing_delimiter(line: &mut Vec<u8>, delimiter: u8) {
    let mut terminator_len = 0;
    if line.ends_with(b"\r\n") {
        terminator_len = 2;
    } else if line.ends_with(b"\n") {
        terminator_len = 1;
    }
    line.truncate(line.len() - terminator_len);
    if line.last() == Some(&delimiter) {
        line.pop();
    }
    line.push(b'\n');
}
