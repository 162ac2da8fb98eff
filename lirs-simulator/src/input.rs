//! Trace input for cache simulation
//!
//! A trace is a CSV file with a `timestamp,key,size` header. A directory of
//! traces is replayed file by file in name order. Records are streamed, so
//! memory use does not grow with the trace length.

use crate::models::Request;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading a trace
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed record in {path}: {source}")]
    Record {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("no trace files found in {0}")]
    Empty(PathBuf),
}

/// Reader for one trace file or a directory of trace files
#[derive(Debug, Clone)]
pub struct TraceReader {
    input: PathBuf,
}

impl TraceReader {
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
        }
    }

    /// Trace files to replay, sorted by name.
    pub fn trace_files(&self) -> Result<Vec<PathBuf>, TraceError> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }

        let io_err = |source| TraceError::Io {
            path: self.input.clone(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.input).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_trace = path
                .extension()
                .is_some_and(|ext| ext == "csv" || ext == "log" || ext == "txt");
            if path.is_file() && is_trace {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(TraceError::Empty(self.input.clone()));
        }
        files.sort();
        Ok(files)
    }

    /// Streams every request of every trace file.
    pub fn stream_requests(&self) -> Result<RequestIterator, TraceError> {
        let mut files = self.trace_files()?;
        files.reverse();
        Ok(RequestIterator {
            pending: files,
            current: None,
        })
    }

    /// Reads the whole trace into memory.
    pub fn read_all(&self) -> Result<Vec<Request>, TraceError> {
        self.stream_requests()?.collect()
    }
}

/// Streaming iterator over the requests of a trace
pub struct RequestIterator {
    /// Files still to open, last one first
    pending: Vec<PathBuf>,
    current: Option<(PathBuf, csv::DeserializeRecordsIntoIter<File, Request>)>,
}

impl RequestIterator {
    fn open_next(&mut self) -> Option<Result<(), TraceError>> {
        let path = self.pending.pop()?;
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .flexible(true)
            .from_path(&path);
        match reader {
            Ok(reader) => {
                tracing::debug!(path = %path.display(), "opened trace file");
                self.current = Some((path, reader.into_deserialize()));
                Some(Ok(()))
            }
            Err(source) => Some(Err(TraceError::Record { path, source })),
        }
    }
}

impl Iterator for RequestIterator {
    type Item = Result<Request, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((path, records)) = &mut self.current {
                match records.next() {
                    Some(Ok(request)) => return Some(Ok(request)),
                    Some(Err(source)) => {
                        return Some(Err(TraceError::Record {
                            path: path.clone(),
                            source,
                        }))
                    }
                    None => self.current = None,
                }
            }
            if let Err(err) = self.open_next()? {
                return Some(Err(err));
            }
        }
    }
}
