use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;

use crate::types::Fragment;
use crate::{DEFAULT_FRAGMENT_SIZE, TransferError};

// ---------------------------------------------------------------------------
// FragmentReader
// ---------------------------------------------------------------------------

/// Reads a source sequentially in fixed-size fragments.
///
/// Every fragment except the last is exactly `fragment_size` bytes; the last
/// one may be shorter. Iteration stops at end-of-file or after the first
/// read error, and cannot be restarted.
pub struct FragmentReader<R = File> {
    source: R,
    fragment_size: usize,
    next_index: u64,
    offset: u64,
    done: bool,
}

impl FragmentReader<File> {
    /// Opens `path` for fragmented reading.
    ///
    /// If `fragment_size` is 0, [`DEFAULT_FRAGMENT_SIZE`] (4 MiB) is used.
    pub fn open(path: &Path, fragment_size: usize) -> Result<Self, TransferError> {
        let file = File::open(path)?;
        Ok(Self::new(file, fragment_size))
    }
}

impl<R: Read> FragmentReader<R> {
    /// Wraps an already open source.
    pub fn new(source: R, fragment_size: usize) -> Self {
        let fragment_size = if fragment_size == 0 {
            DEFAULT_FRAGMENT_SIZE
        } else {
            fragment_size
        };
        Self {
            source,
            fragment_size,
            next_index: 0,
            offset: 0,
            done: false,
        }
    }

    /// Reads the next fragment. Returns `None` at EOF.
    pub fn next_fragment(&mut self) -> Result<Option<Fragment>, TransferError> {
        if self.done {
            return Ok(None);
        }

        // `take` + `read_to_end` keeps reading across short reads, so only
        // the final fragment can come back smaller than `fragment_size`.
        // Capacity is capped; the buffer grows with the data actually read.
        let mut buf = Vec::with_capacity(self.fragment_size.min(DEFAULT_FRAGMENT_SIZE));
        let n = match (&mut self.source)
            .take(self.fragment_size as u64)
            .read_to_end(&mut buf)
        {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Err(e.into());
            }
        };
        if n == 0 {
            self.done = true;
            return Ok(None);
        }
        if n < self.fragment_size {
            self.done = true;
        }

        let fragment = Fragment {
            index: self.next_index,
            offset: self.offset,
            data: Bytes::from(buf),
        };
        self.next_index += 1;
        self.offset += n as u64;
        Ok(Some(fragment))
    }

    /// Bytes read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of fragments produced so far.
    pub fn produced(&self) -> u64 {
        self.next_index
    }

    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }
}

impl<R: Read> Iterator for FragmentReader<R> {
    type Item = Result<Fragment, TransferError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_fragment().transpose()
    }
}

impl<R: Read> std::iter::FusedIterator for FragmentReader<R> {}
