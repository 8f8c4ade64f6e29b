//! Multi-stream file (MSF) layer: pages, superblock, directory and streams.
//!
//! Everything above this module works on logical stream bytes; nothing
//! outside it knows about page numbers.

pub mod directory;
pub mod free_page_map;
pub mod page;
pub mod reader;
pub mod superblock;

pub use directory::{PageArena, StreamDirectory, StreamInfo};
pub use free_page_map::FreePageMap;
pub use page::PageStore;
pub use reader::read_stream;
pub use superblock::{Superblock, MAGIC};
