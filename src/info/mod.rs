//! Info stream (stream 1): format version and the identity that ties a
//! debug file to the binary it describes.
//!
//! # Layout (little-endian)
//!
//! | Offset | Size | Field                         |
//! |--------|------|-------------------------------|
//! | 0      | 4    | version                       |
//! | 4      | 4    | creation time, unix seconds   |
//! | 8      | 4    | age (revision counter)        |
//! | 12     | 16   | unique id                     |
//! | 28     | …    | named stream map (kept raw)   |

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use uuid::Uuid;

use crate::bytes::ByteReader;
use crate::error::Result;

pub const INFO_HEADER_SIZE: usize = 28;

/// Toolchain version that produced the file. In practice VC 7.0 is written
/// even by much newer toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PdbVersion(pub u32);

impl PdbVersion {
    pub const VC2:      PdbVersion = PdbVersion(19941610);
    pub const VC4:      PdbVersion = PdbVersion(19950623);
    pub const VC41:     PdbVersion = PdbVersion(19950814);
    pub const VC50:     PdbVersion = PdbVersion(19960307);
    pub const VC98:     PdbVersion = PdbVersion(19970604);
    pub const VC70_DEP: PdbVersion = PdbVersion(19990604);
    pub const VC70:     PdbVersion = PdbVersion(20000404);
    pub const VC80:     PdbVersion = PdbVersion(20030901);
    pub const VC110:    PdbVersion = PdbVersion(20091201);
    pub const VC140:    PdbVersion = PdbVersion(20140508);

    /// Historical name, or `None` for values this crate does not know.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::VC2      => "VC 2 (1994-10-16)",
            Self::VC4      => "VC 4 (1995-06-23)",
            Self::VC41     => "VC 4.1 (1995-08-14)",
            Self::VC50     => "VC 5.0 (1996-03-07)",
            Self::VC98     => "VC 98 (1997-06-04)",
            Self::VC70_DEP => "VC 7.0 - deprecated (1999-06-04)",
            Self::VC70     => "VC 7.0 (2000-04-04)",
            Self::VC80     => "VC 8.0 (2003-09-01)",
            Self::VC110    => "VC 11.0 (2009-12-01)",
            Self::VC140    => "VC 14.0 (2014-05-08)",
            _ => return None,
        })
    }
}

impl fmt::Display for PdbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "PdbVersion({})", self.0),
        }
    }
}

/// 128-bit identity. Stored exactly as read; compare for equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Views the raw bytes as a UUID without reordering any fields.
    pub fn as_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for Guid {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoStreamHeader {
    pub version:   PdbVersion,
    /// Creation time in seconds since the unix epoch.
    pub signature: u32,
    pub age:       u32,
    pub unique_id: Guid,
}

impl InfoStreamHeader {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.signature as i64, 0)
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.version.0)?;
        writer.write_u32::<LittleEndian>(self.signature)?;
        writer.write_u32::<LittleEndian>(self.age)?;
        writer.write_all(&self.unique_id.0)?;
        Ok(())
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            version:   PdbVersion(r.read_u32("info stream version")?),
            signature: r.read_u32("info stream signature")?,
            age:       r.read_u32("info stream age")?,
            unique_id: Guid(r.read_array("info stream unique id")?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoStream {
    pub header: InfoStreamHeader,
    /// Bytes after the header. Their named stream map layout is not decoded;
    /// the section may be empty.
    #[serde(serialize_with = "crate::bytes::serialize_hex")]
    pub named_stream_map_raw: Vec<u8>,
}

impl InfoStream {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let header = InfoStreamHeader::read(&mut r)?;
        let named_stream_map_raw = r.rest().to_vec();
        Ok(Self { header, named_stream_map_raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdbError;

    fn header() -> InfoStreamHeader {
        InfoStreamHeader {
            version:   PdbVersion::VC70,
            signature: 1_500_000_000,
            age:       3,
            unique_id: Guid([0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88,
                             0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00]),
        }
    }

    #[test]
    fn parses_header_and_keeps_trailer() {
        let mut buf = Vec::new();
        header().write(&mut buf).unwrap();
        assert_eq!(buf.len(), INFO_HEADER_SIZE);
        buf.extend_from_slice(&[1, 2, 3]);

        let info = InfoStream::parse(&buf).unwrap();
        assert_eq!(info.header, header());
        assert_eq!(info.named_stream_map_raw, vec![1, 2, 3]);
        assert_eq!(info.header.version.to_string(), "VC 7.0 (2000-04-04)");
        assert_eq!(info.header.created().unwrap().timestamp(), 1_500_000_000);
        assert_eq!(info.header.unique_id.as_uuid().as_bytes(), &header().unique_id.0);
    }

    #[test]
    fn trailer_is_optional() {
        let mut buf = Vec::new();
        header().write(&mut buf).unwrap();
        assert!(InfoStream::parse(&buf).unwrap().named_stream_map_raw.is_empty());
    }

    #[test]
    fn unknown_version_preserved() {
        let mut h = header();
        h.version = PdbVersion(42);
        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        let info = InfoStream::parse(&buf).unwrap();
        assert_eq!(info.header.version, PdbVersion(42));
        assert_eq!(info.header.version.to_string(), "PdbVersion(42)");
    }

    #[test]
    fn short_stream_is_truncated() {
        let mut buf = Vec::new();
        header().write(&mut buf).unwrap();
        buf.truncate(20);
        assert!(matches!(
            InfoStream::parse(&buf),
            Err(PdbError::TruncatedData { context: "info stream unique id", offset: 12, .. })
        ));
    }
}
