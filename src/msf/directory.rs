//! Stream directory: the table of every stream's size and pages.
//!
//! Suppose a container with 4 KiB pages and four streams of
//! {1000, 8000, 16000, 9000} bytes. Each stream needs ⌈size / 4096⌉ pages,
//! so the page lists have lengths {1, 2, 4, 3}:
//!
//! ```text
//! stream_count = 4
//! stream_infos = [1000, 8000, 16000, 9000]
//! page lists   = [4] [5, 6] [11, 9, 7, 8] [10, 15, 12]
//! ```
//!
//! The lists are jagged, so they live in a single [`PageArena`] rather than
//! a padded matrix.

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Write};
use std::ops::Range;

use crate::bytes::{ceil_div, ByteReader};
use crate::error::{PdbError, Result};

/// Size of a stream as recorded in the directory.
///
/// `reserved` is an on-disk pointer slot left over from the in-memory
/// structure; it is carried but never interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
    pub size:     i32,
    pub reserved: i32,
}

impl StreamInfo {
    /// Marker for a stream slot that exists but holds no data.
    pub const DELETED_SIZE: i32 = -1;

    /// Logical byte length; the deleted-stream marker counts as empty.
    #[inline]
    pub fn len(&self) -> usize {
        self.size.max(0) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn read(r: &mut ByteReader<'_>, context: &'static str) -> Result<Self> {
        Ok(Self {
            size:     r.read_i32(context)?,
            reserved: r.read_i32(context)?,
        })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(self.size)?;
        writer.write_i32::<LittleEndian>(self.reserved)?;
        Ok(())
    }
}

/// Flat storage for per-stream page lists of differing lengths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageArena {
    pages:  Vec<u16>,
    ranges: Vec<Range<usize>>,
}

impl PageArena {
    pub fn push(&mut self, pages: &[u16]) {
        let start = self.pages.len();
        self.pages.extend_from_slice(pages);
        self.ranges.push(start..self.pages.len());
    }

    pub fn get(&self, stream: usize) -> Option<&[u16]> {
        self.ranges.get(stream).map(|r| &self.pages[r.clone()])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u16]> + '_ {
        self.ranges.iter().map(move |r| &self.pages[r.clone()])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamDirectory {
    pub stream_count: u32,
    pub stream_infos: Vec<StreamInfo>,
    pub page_lists:   PageArena,
}

impl StreamDirectory {
    /// Parses a directory blob. `max_streams` bounds the stream count before
    /// anything is allocated for it.
    pub fn read(data: &[u8], page_size: usize, max_streams: u32) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let stream_count = r.read_u32("stream count")?;
        if stream_count > max_streams {
            return Err(PdbError::DirectoryTooLarge { count: stream_count, limit: max_streams });
        }
        // Every stream needs at least its 8-byte info record.
        let needed = stream_count as u64 * 8;
        if r.remaining() < needed {
            return Err(PdbError::TruncatedData {
                context:   "stream infos",
                offset:    r.position(),
                needed,
                available: r.remaining(),
            });
        }

        let mut stream_infos = Vec::with_capacity(stream_count as usize);
        for _ in 0..stream_count {
            stream_infos.push(StreamInfo::read(&mut r, "stream info")?);
        }

        let mut page_lists = PageArena::default();
        for info in &stream_infos {
            let n = ceil_div(info.size as i64, page_size);
            page_lists.push(&r.read_u16_vec(n, "stream page list")?);
        }

        Ok(Self { stream_count, stream_infos, page_lists })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.stream_count)?;
        for info in &self.stream_infos {
            info.write(&mut writer)?;
        }
        for pages in self.page_lists.iter() {
            for &page in pages {
                writer.write_u16::<LittleEndian>(page)?;
            }
        }
        Ok(())
    }

    pub fn stream_size(&self, stream: usize) -> Option<usize> {
        self.stream_infos.get(stream).map(StreamInfo::len)
    }

    pub fn pages(&self, stream: usize) -> Option<&[u16]> {
        self.page_lists.get(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(sizes: &[i32], page_size: usize) -> StreamDirectory {
        let mut page_lists = PageArena::default();
        let mut next = 3u16;
        for &size in sizes {
            let n = ceil_div(size as i64, page_size);
            let pages: Vec<u16> = (next..next + n as u16).collect();
            next += n as u16;
            page_lists.push(&pages);
        }
        StreamDirectory {
            stream_count: sizes.len() as u32,
            stream_infos: sizes.iter().map(|&size| StreamInfo { size, reserved: 0 }).collect(),
            page_lists,
        }
    }

    #[test]
    fn jagged_page_lists() {
        let dir = directory(&[1000, 8000, 16000, 9000], 4096);
        let mut buf = Vec::new();
        dir.write(&mut buf).unwrap();

        let parsed = StreamDirectory::read(&buf, 4096, u32::MAX).unwrap();
        let lens: Vec<usize> = parsed.page_lists.iter().map(<[u16]>::len).collect();
        assert_eq!(lens, vec![1, 2, 4, 3]);
        assert_eq!(parsed.pages(2).unwrap(), &[6, 7, 8, 9]);
        assert_eq!(parsed, dir);
    }

    #[test]
    fn empty_and_deleted_streams_have_no_pages() {
        let dir = directory(&[0, StreamInfo::DELETED_SIZE, 10], 512);
        let mut buf = Vec::new();
        dir.write(&mut buf).unwrap();

        let parsed = StreamDirectory::read(&buf, 512, 16).unwrap();
        assert!(parsed.pages(0).unwrap().is_empty());
        assert!(parsed.pages(1).unwrap().is_empty());
        assert_eq!(parsed.pages(2).unwrap().len(), 1);
        assert_eq!(parsed.stream_size(1), Some(0));
    }

    #[test]
    fn truncated_page_list() {
        let dir = directory(&[5000], 4096);
        let mut buf = Vec::new();
        dir.write(&mut buf).unwrap();
        buf.pop();
        assert!(matches!(
            StreamDirectory::read(&buf, 4096, 16),
            Err(PdbError::TruncatedData { context: "stream page list", .. })
        ));
    }

    #[test]
    fn absurd_stream_count_rejected_early() {
        let buf = 0xFFFF_FFF0u32.to_le_bytes();
        assert!(matches!(
            StreamDirectory::read(&buf, 4096, 1 << 16),
            Err(PdbError::DirectoryTooLarge { count: 0xFFFF_FFF0, .. })
        ));
        assert!(matches!(
            StreamDirectory::read(&buf, 4096, u32::MAX),
            Err(PdbError::TruncatedData { context: "stream infos", .. })
        ));
    }
}
