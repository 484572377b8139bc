/// Splits a payload into slices sized for the peer's receive buffer.
///
/// The sequence is `len / max_chunk` full slices followed by one final slice
/// holding the remainder. When the payload length is an exact multiple of
/// `max_chunk` (including an empty payload) that final slice is empty. The
/// peer treats any slice shorter than `max_chunk` as end of payload, so the
/// empty slice is still sent.

use std::iter::FusedIterator;

/// Number of slices `Chunks` yields for a payload of `len` bytes.
///
/// # Panics
/// Panics if `max_chunk` is zero.
pub fn chunk_count(len: usize, max_chunk: usize) -> usize {
    assert!(max_chunk > 0, "max_chunk must be non-zero");
    len / max_chunk + 1
}

/// Restartable view of a payload as a chunk sequence.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter<'a> {
    payload: &'a [u8],
    max_chunk: usize,
}

impl<'a> Segmenter<'a> {
    /// # Panics
    /// Panics if `max_chunk` is zero.
    pub fn new(payload: &'a [u8], max_chunk: usize) -> Self {
        assert!(max_chunk > 0, "max_chunk must be non-zero");
        Self { payload, max_chunk }
    }

    /// Start a fresh pass over the payload.
    pub fn iter(&self) -> Chunks<'a> {
        Chunks {
            payload: self.payload,
            max_chunk: self.max_chunk,
            offset: 0,
            done: false,
        }
    }

    pub fn len(&self) -> usize {
        chunk_count(self.payload.len(), self.max_chunk)
    }

    /// Always false: even an empty payload yields its terminal slice.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<'a> IntoIterator for Segmenter<'a> {
    type Item = &'a [u8];
    type IntoIter = Chunks<'a>;

    fn into_iter(self) -> Chunks<'a> {
        self.iter()
    }
}

impl<'a> IntoIterator for &Segmenter<'a> {
    type Item = &'a [u8];
    type IntoIter = Chunks<'a>;

    fn into_iter(self) -> Chunks<'a> {
        self.iter()
    }
}

/// Lazy, forward-only chunk iterator.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    payload: &'a [u8],
    max_chunk: usize,
    offset: usize,
    done: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.done {
            return None;
        }
        let remaining = self.payload.len() - self.offset;
        if remaining >= self.max_chunk {
            let chunk = &self.payload[self.offset..self.offset + self.max_chunk];
            self.offset += self.max_chunk;
            Some(chunk)
        } else {
            self.done = true;
            Some(&self.payload[self.offset..])
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.done {
            0
        } else {
            (self.payload.len() - self.offset) / self.max_chunk + 1
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl FusedIterator for Chunks<'_> {}
