use std::io;
use thiserror::Error;

/// Errors raised while decoding a container.
///
/// Unrecognised stream numbers and record kinds are not errors; they are
/// reported as [`Notice`](crate::diagnostics::Notice)s instead.
#[derive(Error, Debug)]
pub enum PdbError {
    #[error("invalid MSF signature: found {}", hex::encode(.found))]
    InvalidSignature { found: Vec<u8> },

    #[error("invalid page size: {0}")]
    InvalidPageSize(i32),

    #[error("page size {0} does not fit the 32-bit page size field")]
    PageSizeTooLarge(usize),

    #[error("page {page} out of range (page size {page_size}, buffer {buffer_len} bytes)")]
    OutOfRange { page: u32, page_size: usize, buffer_len: usize },

    #[error("truncated {context} at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedData {
        context:   &'static str,
        offset:    u64,
        needed:    u64,
        available: u64,
    },

    #[error("stream directory declares {count} streams (limit {limit})")]
    DirectoryTooLarge { count: u32, limit: u32 },

    #[error("type record body of {len} bytes does not fit the 16-bit size field")]
    RecordTooLarge { len: usize },

    #[error("no stream {0} in directory")]
    NoSuchStream(u32),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PdbError>;
