use crate::error::{PdbError, Result};
use crate::msf::page::PageStore;

/// Concatenates `pages` in order and truncates to `declared_size`.
///
/// The tail of the last page beyond the logical size is never returned.
/// Fails with `TruncatedData` when the pages cannot cover the declared size.
pub fn read_stream(store: &PageStore, pages: &[u16], declared_size: usize) -> Result<Vec<u8>> {
    let page_size = store.page_size();
    let available = pages.len() as u64 * page_size as u64;
    if available < declared_size as u64 {
        return Err(PdbError::TruncatedData {
            context: "stream pages",
            offset: 0,
            needed: declared_size as u64,
            available,
        });
    }

    let mut out = Vec::with_capacity(declared_size);
    for &page in pages {
        let remaining = declared_size - out.len();
        if remaining == 0 {
            break;
        }
        let data = store.page(page as u32)?;
        out.extend_from_slice(&data[..remaining.min(page_size)]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PageStore {
        let mut data = Vec::new();
        for page in 0..4u8 {
            data.extend(std::iter::repeat(page).take(8));
        }
        PageStore::new(data, 8).unwrap()
    }

    #[test]
    fn truncates_final_page() {
        let out = read_stream(&store(), &[3, 1], 11).unwrap();
        assert_eq!(out, [3, 3, 3, 3, 3, 3, 3, 3, 1, 1, 1]);
    }

    #[test]
    fn empty_stream() {
        assert!(read_stream(&store(), &[], 0).unwrap().is_empty());
    }

    #[test]
    fn short_page_list_is_truncated() {
        assert!(matches!(
            read_stream(&store(), &[0], 9),
            Err(PdbError::TruncatedData { needed: 9, available: 8, .. })
        ));
    }

    #[test]
    fn page_past_buffer_is_out_of_range() {
        assert!(matches!(read_stream(&store(), &[9], 4), Err(PdbError::OutOfRange { page: 9, .. })));
    }
}
