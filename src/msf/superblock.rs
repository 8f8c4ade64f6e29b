//! Container superblock, stored at the start of page 0.
//!
//! # Layout (little-endian)
//!
//! | Offset | Size | Field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 44   | magic                                   |
//! | 44     | 4    | page size (i32)                         |
//! | 48     | 2    | free page map page number (u16)         |
//! | 50     | 2    | page count (u16)                        |
//! | 52     | 4    | stream directory size (i32)             |
//! | 56     | 4    | reserved                                |
//! | 60     | 2×n  | directory page numbers, n = ⌈size/page⌉ |
//!
//! Whatever follows up to the end of page 0 is padding and is not inspected.

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Write};

use crate::bytes::{ceil_div, ByteReader};
use crate::error::{PdbError, Result};
use crate::msf::directory::StreamInfo;

pub const MAGIC: &[u8; 44] = b"Microsoft C/C++ program database 2.00\r\n\x1a\x4a\x47\x00\x00";

/// Size of the fixed part, before the directory page list.
pub const SUPERBLOCK_FIXED_SIZE: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Superblock {
    #[serde(skip)]
    pub magic:              [u8; 44],
    pub page_size:          i32,
    pub free_page_map_page: u16,
    pub page_count:         u16,
    /// Size of the stream directory; `reserved` is carried verbatim.
    pub directory:          StreamInfo,
    /// Pages holding the stream directory, in order.
    pub directory_pages:    Vec<u16>,
}

impl Superblock {
    pub fn new(page_size: i32) -> Self {
        Self {
            magic:              *MAGIC,
            page_size,
            free_page_map_page: 1,
            page_count:         0,
            directory:          StreamInfo::default(),
            directory_pages:    Vec::new(),
        }
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size as usize
    }

    /// Number of directory pages implied by the directory size.
    pub fn directory_page_count(&self) -> usize {
        ceil_div(self.directory.size as i64, self.page_size())
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_i32::<LittleEndian>(self.page_size)?;
        writer.write_u16::<LittleEndian>(self.free_page_map_page)?;
        writer.write_u16::<LittleEndian>(self.page_count)?;
        self.directory.write(&mut writer)?;
        for &page in &self.directory_pages {
            writer.write_u16::<LittleEndian>(page)?;
        }
        Ok(())
    }

    pub fn read(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let magic: [u8; 44] = r.read_array("superblock magic")?;
        if &magic != MAGIC {
            return Err(PdbError::InvalidSignature { found: magic.to_vec() });
        }
        let page_size = r.read_i32("superblock page size")?;
        if page_size <= 0 {
            return Err(PdbError::InvalidPageSize(page_size));
        }
        let free_page_map_page = r.read_u16("superblock free page map")?;
        let page_count = r.read_u16("superblock page count")?;
        let directory = StreamInfo::read(&mut r, "superblock directory info")?;
        let n = ceil_div(directory.size as i64, page_size as usize);
        let directory_pages = r.read_u16_vec(n, "superblock directory pages")?;
        Ok(Self {
            magic,
            page_size,
            free_page_map_page,
            page_count,
            directory,
            directory_pages,
        })
    }
}
