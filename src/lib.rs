pub mod diagnostics;
pub mod error;
pub mod file;
pub mod info;
pub mod msf;
pub mod stream;
pub mod tpi;

mod bytes;

pub use diagnostics::{Diagnostics, Notice};
pub use error::{PdbError, Result};
pub use file::{ParseOptions, PdbFile};
pub use info::{Guid, InfoStream, InfoStreamHeader, PdbVersion};
pub use msf::{FreePageMap, PageStore, StreamDirectory, StreamInfo, Superblock};
pub use stream::{Stream, StreamId};
pub use tpi::{TypeIndex, TypeIndexKind, TypeRecord, TypeRecordKind, TypeStream, TypeStreamHeader};
