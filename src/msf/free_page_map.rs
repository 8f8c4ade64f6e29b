use serde::Serialize;

use crate::error::Result;
use crate::msf::page::PageStore;

/// One page of bits reporting which pages are free.
///
/// Bit `p % 8` of byte `p / 8` is set when page `p` is unused. Stream
/// reconstruction never consults this map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreePageMap {
    #[serde(serialize_with = "crate::bytes::serialize_hex")]
    bits: Vec<u8>,
}

impl FreePageMap {
    pub fn from_bytes(bits: Vec<u8>) -> Self {
        Self { bits }
    }

    pub fn read(store: &PageStore, page: u32) -> Result<Self> {
        Ok(Self::from_bytes(store.page(page)?.to_vec()))
    }

    /// Pages past the end of the bitmap are reported as in use.
    pub fn is_free(&self, page: u32) -> bool {
        let byte = (page / 8) as usize;
        let mask = 1u8 << (page % 8);
        self.bits.get(byte).map_or(false, |b| b & mask != 0)
    }

    /// Free pages among the first `page_count`.
    pub fn free_pages(&self, page_count: u32) -> impl Iterator<Item = u32> + '_ {
        (0..page_count).filter(move |&p| self.is_free(p))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_order_is_lsb_first() {
        let fpm = FreePageMap::from_bytes(vec![0b0000_0101, 0b1000_0000]);
        assert!(fpm.is_free(0));
        assert!(!fpm.is_free(1));
        assert!(fpm.is_free(2));
        assert!(fpm.is_free(15));
        assert!(!fpm.is_free(14));
        assert!(!fpm.is_free(16));
        assert_eq!(fpm.free_pages(32).collect::<Vec<_>>(), vec![0, 2, 15]);
    }

    #[test]
    fn reads_from_page_store() {
        let mut data = vec![0u8; 64];
        data[32] = 0xff;
        let store = PageStore::new(data, 32).unwrap();
        let fpm = FreePageMap::read(&store, 1).unwrap();
        assert!(fpm.is_free(7));
        assert!(!fpm.is_free(8));
        assert!(FreePageMap::read(&store, 2).is_err());
    }
}
