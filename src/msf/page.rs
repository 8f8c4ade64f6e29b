use crate::error::{PdbError, Result};

/// Read-only view of a whole container as fixed-size pages.
///
/// The buffer is never mutated after construction, so a `PageStore` can be
/// shared freely between threads decoding different streams.
#[derive(Debug, Clone)]
pub struct PageStore {
    data:      Vec<u8>,
    page_size: usize,
}

impl PageStore {
    pub fn new(data: Vec<u8>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(PdbError::InvalidPageSize(0));
        }
        if page_size > i32::MAX as usize {
            return Err(PdbError::PageSizeTooLarge(page_size));
        }
        Ok(Self { data, page_size })
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of complete pages in the buffer.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.data.len() / self.page_size
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Contents of page `n`, exactly `page_size` bytes.
    pub fn page(&self, n: u32) -> Result<&[u8]> {
        let start = (n as usize).checked_mul(self.page_size);
        let end = start.and_then(|s| s.checked_add(self.page_size));
        match (start, end) {
            (Some(start), Some(end)) if end <= self.data.len() => Ok(&self.data[start..end]),
            _ => Err(PdbError::OutOfRange {
                page:       n,
                page_size:  self.page_size,
                buffer_len: self.data.len(),
            }),
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
