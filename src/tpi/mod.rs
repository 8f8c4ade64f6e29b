//! Type stream (stream 2): a header followed by back-to-back type records.
//!
//! Two header layouts exist. Versions older than V 7.0 used 16-bit type
//! indices and a 14-byte header; V 7.0 onwards uses 32-bit indices and a
//! 56-byte header that also describes the auxiliary hash stream.
//!
//! # Narrow header (before V 7.0)
//!
//! | Offset | Size | Field               |
//! |--------|------|---------------------|
//! | 0      | 4    | version             |
//! | 4      | 2    | first index         |
//! | 6      | 2    | last index (excl.)  |
//! | 8      | 4    | record bytes        |
//! | 12     | 2    | hash stream         |
//!
//! # Wide header (V 7.0 and later, and unknown versions)
//!
//! | Offset | Size | Field                    |
//! |--------|------|--------------------------|
//! | 0      | 4    | version                  |
//! | 4      | 4    | header size              |
//! | 8      | 4    | first index              |
//! | 12     | 4    | last index (excl.)       |
//! | 16     | 4    | record bytes             |
//! | 20     | 2    | hash stream              |
//! | 22     | 2    | auxiliary hash stream    |
//! | 24     | 4    | hash key size            |
//! | 28     | 4    | hash bucket count        |
//! | 32     | 8    | hash values buffer       |
//! | 40     | 8    | index offsets buffer     |
//! | 48     | 8    | hash adjusters buffer    |
//!
//! The record region starts at the next 4-byte boundary after the header
//! (or after the declared header size, if larger) and is exactly
//! `record bytes` long. Anything after it belongs to the hash data.

pub mod record;
pub mod type_index;

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use crate::bytes::ByteReader;
use crate::diagnostics::Notice;
use crate::error::Result;

pub use record::{PointerAttributes, TypeRecord, TypeRecordBody, TypeRecordKind};
pub use type_index::{BuiltInType, TypeIndex, TypeIndexKind, TypeKind, TypeMode, FIRST_USER_INDEX};

pub const NARROW_HEADER_SIZE: usize = 14;
pub const WIDE_HEADER_SIZE:   usize = 56;

/// Hash stream slot meaning "no stream".
pub const NO_STREAM: u16 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TpiVersion(pub u32);

impl TpiVersion {
    pub const V40:         TpiVersion = TpiVersion(19950410);
    pub const V41:         TpiVersion = TpiVersion(19951122);
    pub const V50_INTERIM: TpiVersion = TpiVersion(19960307);
    pub const V50:         TpiVersion = TpiVersion(19961031);
    pub const V70:         TpiVersion = TpiVersion(19990903);
    pub const V80:         TpiVersion = TpiVersion(20040203);

    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::V40         => "V 4.0 (1995-04-10)",
            Self::V41         => "V 4.1 (1995-11-22)",
            Self::V50_INTERIM => "V 5.0 - interim (1996-03-07)",
            Self::V50         => "V 5.0 (1996-10-31)",
            Self::V70         => "V 7.0 (1999-09-03)",
            Self::V80         => "V 8.0 (2004-02-03)",
            _ => return None,
        })
    }

    /// Header layout used by this version.
    pub fn index_width(self) -> IndexWidth {
        if self.0 < Self::V70.0 {
            IndexWidth::Narrow
        } else {
            IndexWidth::Wide
        }
    }
}

impl fmt::Display for TpiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "TpiVersion({})", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexWidth {
    /// 16-bit type indices.
    Narrow,
    /// 32-bit type indices.
    Wide,
}

/// Offset and length of a buffer inside the hash stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmbeddedBuf {
    pub offset: i32,
    pub length: u32,
}

impl EmbeddedBuf {
    fn read(r: &mut ByteReader<'_>, context: &'static str) -> Result<Self> {
        Ok(Self { offset: r.read_i32(context)?, length: r.read_u32(context)? })
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(self.offset)?;
        writer.write_u32::<LittleEndian>(self.length)
    }
}

/// Hash layout carried only by wide headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HashLayout {
    pub aux_stream_index: u16,
    pub key_size:         u32,
    pub bucket_count:     u32,
    pub hash_values:      EmbeddedBuf,
    pub index_offsets:    EmbeddedBuf,
    pub hash_adjusters:   EmbeddedBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeStreamHeader {
    pub version:           TpiVersion,
    /// Declared header size; the layout size for narrow headers.
    pub header_size:       u32,
    /// Index of the first record, inclusive.
    pub first_index:       TypeIndex,
    /// One past the index of the last record.
    pub last_index:        TypeIndex,
    pub record_bytes:      u32,
    pub hash_stream_index: u16,
    pub hash:              Option<HashLayout>,
}

impl TypeStreamHeader {
    pub fn index_width(&self) -> IndexWidth {
        self.version.index_width()
    }

    /// Record count implied by the index range; zero when the range is empty
    /// or inverted.
    pub fn expected_records(&self) -> u32 {
        self.last_index.0.saturating_sub(self.first_index.0)
    }

    /// Offset of the record region from the start of the stream.
    pub fn records_offset(&self) -> u64 {
        let layout = match self.index_width() {
            IndexWidth::Narrow => NARROW_HEADER_SIZE,
            IndexWidth::Wide => WIDE_HEADER_SIZE,
        } as u64;
        let start = layout.max(self.header_size as u64);
        (start + 3) & !3
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let version = TpiVersion(r.read_u32("type stream version")?);
        match version.index_width() {
            IndexWidth::Narrow => Ok(Self {
                version,
                header_size:       NARROW_HEADER_SIZE as u32,
                first_index:       TypeIndex(r.read_u16("type stream first index")? as u32),
                last_index:        TypeIndex(r.read_u16("type stream last index")? as u32),
                record_bytes:      r.read_u32("type stream record bytes")?,
                hash_stream_index: r.read_u16("type stream hash stream")?,
                hash:              None,
            }),
            IndexWidth::Wide => {
                let header_size = r.read_u32("type stream header size")?;
                let first_index = TypeIndex(r.read_u32("type stream first index")?);
                let last_index = TypeIndex(r.read_u32("type stream last index")?);
                let record_bytes = r.read_u32("type stream record bytes")?;
                let hash_stream_index = r.read_u16("type stream hash stream")?;
                let hash = HashLayout {
                    aux_stream_index: r.read_u16("type stream aux hash stream")?,
                    key_size:         r.read_u32("type stream hash key size")?,
                    bucket_count:     r.read_u32("type stream hash buckets")?,
                    hash_values:      EmbeddedBuf::read(r, "type stream hash values")?,
                    index_offsets:    EmbeddedBuf::read(r, "type stream index offsets")?,
                    hash_adjusters:   EmbeddedBuf::read(r, "type stream hash adjusters")?,
                };
                Ok(Self {
                    version,
                    header_size,
                    first_index,
                    last_index,
                    record_bytes,
                    hash_stream_index,
                    hash: Some(hash),
                })
            }
        }
    }

    /// Writes the header followed by padding up to the record region.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.version.0)?;
        let written = match self.index_width() {
            IndexWidth::Narrow => {
                writer.write_u16::<LittleEndian>(narrow_index(self.first_index)?)?;
                writer.write_u16::<LittleEndian>(narrow_index(self.last_index)?)?;
                writer.write_u32::<LittleEndian>(self.record_bytes)?;
                writer.write_u16::<LittleEndian>(self.hash_stream_index)?;
                NARROW_HEADER_SIZE
            }
            IndexWidth::Wide => {
                let hash = self.hash.unwrap_or_default();
                writer.write_u32::<LittleEndian>(self.header_size)?;
                writer.write_u32::<LittleEndian>(self.first_index.0)?;
                writer.write_u32::<LittleEndian>(self.last_index.0)?;
                writer.write_u32::<LittleEndian>(self.record_bytes)?;
                writer.write_u16::<LittleEndian>(self.hash_stream_index)?;
                writer.write_u16::<LittleEndian>(hash.aux_stream_index)?;
                writer.write_u32::<LittleEndian>(hash.key_size)?;
                writer.write_u32::<LittleEndian>(hash.bucket_count)?;
                hash.hash_values.write(&mut writer)?;
                hash.index_offsets.write(&mut writer)?;
                hash.hash_adjusters.write(&mut writer)?;
                WIDE_HEADER_SIZE
            }
        };
        let pad = self.records_offset() as usize - written;
        writer.write_all(&vec![0u8; pad])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeStream {
    pub header:  TypeStreamHeader,
    pub records: Vec<TypeRecord>,
}

impl TypeStream {
    /// Decodes a type stream. Record-level findings that do not stop the
    /// decode are returned alongside the stream.
    pub fn parse(data: &[u8]) -> Result<(Self, Vec<Notice>)> {
        let mut r = ByteReader::new(data);
        let header = TypeStreamHeader::read(&mut r)?;
        let pad = header.records_offset().saturating_sub(r.position());
        r.skip(pad, "type stream header padding")?;
        let region = r.read_slice(header.record_bytes as u64, "type record region")?;

        let mut notices = Vec::new();
        let mut unrecognized: BTreeMap<TypeRecordKind, u32> = BTreeMap::new();
        let mut records = Vec::new();
        let mut rr = ByteReader::new(region);
        while rr.remaining() > 0 {
            let offset = rr.position();
            let tail = &region[offset as usize..];
            if is_zero_padding(tail) {
                break;
            }
            // A tail that cannot hold a whole record ends the walk; what was
            // decoded so far is kept.
            if !record::frames_record(tail) {
                tracing::warn!(offset, len = tail.len(), "trailing bytes in type record region");
                notices.push(Notice::TrailingBytes { offset, len: tail.len() as u64 });
                break;
            }
            let (size, kind, body) = record::read_record(&mut rr)?;
            let ordinal = records.len() as u32;
            let body = match TypeRecordBody::decode(kind, body) {
                Ok(Some(decoded)) => decoded,
                Ok(None) => {
                    *unrecognized.entry(kind).or_default() += 1;
                    TypeRecordBody::Raw { bytes: body.to_vec() }
                }
                Err(e) => {
                    notices.push(Notice::MalformedRecord { ordinal, kind, reason: e.to_string() });
                    TypeRecordBody::Raw { bytes: body.to_vec() }
                }
            };
            records.push(TypeRecord { size, kind, body });
        }

        notices.extend(
            unrecognized
                .into_iter()
                .map(|(kind, count)| Notice::UnrecognizedRecordKind { kind, count }),
        );
        let expected = header.expected_records();
        let found = records.len() as u32;
        if expected != found {
            tracing::warn!(expected, found, "type record count mismatch");
            notices.push(Notice::RecordCountMismatch { expected, found });
        }

        Ok((Self { header, records }, notices))
    }

    /// Record named by `index`, if it falls inside this stream's range.
    pub fn get(&self, index: TypeIndex) -> Option<&TypeRecord> {
        let offset = index.0.checked_sub(self.header.first_index.0)?;
        self.records.get(offset as usize)
    }
}

fn narrow_index(index: TypeIndex) -> io::Result<u16> {
    u16::try_from(index.0).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("type index 0x{:x} does not fit a 16-bit header", index.0),
        )
    })
}

fn is_zero_padding(tail: &[u8]) -> bool {
    tail.iter().all(|&b| b == 0)
}
