#[remain::sorted]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Err {
    #[error("Out of bounds: {len} bytes at offset {offset} exceed a region of {available} bytes")]
    OutOfBounds { offset: usize, len: usize, available: usize },
}

/// A contiguous, bounds-checked byte window inside the binary blob.
///
/// Offsets passed to [`BufferSlice::get`] are relative to the start of the window,
/// and no read may leave the window even if the underlying blob is larger.
#[derive(Debug, Clone, Copy)]
pub struct BufferSlice<'a> {
    bytes: &'a [u8],
}

impl<'a> BufferSlice<'a> {
    /// Creates the window `blob[offset..offset + len]`.
    pub fn new(blob: &'a [u8], offset: usize, len: usize) -> Result<Self, Err> {
        let bytes = checked_range(blob, offset, len)?;
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns `len` bytes starting at `offset` within the window.
    pub fn get(&self, offset: usize, len: usize) -> Result<&'a [u8], Err> {
        checked_range(self.bytes, offset, len)
    }
}

fn checked_range(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], Err> {
    let out_of_bounds = || Err::OutOfBounds { offset, len, available: bytes.len() };
    let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
    bytes.get(offset..end).ok_or_else(out_of_bounds)
}
