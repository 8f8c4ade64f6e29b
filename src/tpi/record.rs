//! Type records.
//!
//! Every record starts with a little-endian `u16` length (counting the kind
//! tag and body, not the length itself) and a `u16` kind. The length alone
//! is enough to step over records of kinds this crate cannot decode.

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

use crate::bytes::ByteReader;
use crate::error::{PdbError, Result};
use crate::tpi::type_index::TypeIndex;

/// Size of the length and kind fields.
pub const RECORD_HEADER_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeRecordKind(pub u16);

impl TypeRecordKind {
    pub const VTSHAPE:    TypeRecordKind = TypeRecordKind(0x000a);
    pub const LABEL:      TypeRecordKind = TypeRecordKind(0x000e);
    pub const MODIFIER:   TypeRecordKind = TypeRecordKind(0x1001);
    pub const POINTER:    TypeRecordKind = TypeRecordKind(0x1002);
    pub const PROCEDURE:  TypeRecordKind = TypeRecordKind(0x1008);
    pub const MFUNCTION:  TypeRecordKind = TypeRecordKind(0x1009);
    pub const ARGLIST:    TypeRecordKind = TypeRecordKind(0x1201);
    pub const FIELDLIST:  TypeRecordKind = TypeRecordKind(0x1203);
    pub const BITFIELD:   TypeRecordKind = TypeRecordKind(0x1205);
    pub const METHODLIST: TypeRecordKind = TypeRecordKind(0x1206);
    pub const ARRAY:      TypeRecordKind = TypeRecordKind(0x1503);
    pub const CLASS:      TypeRecordKind = TypeRecordKind(0x1504);
    pub const STRUCTURE:  TypeRecordKind = TypeRecordKind(0x1505);
    pub const UNION:      TypeRecordKind = TypeRecordKind(0x1506);
    pub const ENUM:       TypeRecordKind = TypeRecordKind(0x1507);

    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::VTSHAPE    => "LF_VTSHAPE",
            Self::LABEL      => "LF_LABEL",
            Self::MODIFIER   => "LF_MODIFIER",
            Self::POINTER    => "LF_POINTER",
            Self::PROCEDURE  => "LF_PROCEDURE",
            Self::MFUNCTION  => "LF_MFUNCTION",
            Self::ARGLIST    => "LF_ARGLIST",
            Self::FIELDLIST  => "LF_FIELDLIST",
            Self::BITFIELD   => "LF_BITFIELD",
            Self::METHODLIST => "LF_METHODLIST",
            Self::ARRAY      => "LF_ARRAY",
            Self::CLASS      => "LF_CLASS",
            Self::STRUCTURE  => "LF_STRUCTURE",
            Self::UNION      => "LF_UNION",
            Self::ENUM       => "LF_ENUM",
            _ => return None,
        })
    }
}

impl fmt::Display for TypeRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:04x}", self.0),
        }
    }
}

/// Pointer attribute word of an `LF_POINTER` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PointerAttributes(pub u32);

impl PointerAttributes {
    /// Addressing model (near, far, 64-bit, …), bits 0..5.
    pub fn pointer_kind(self) -> u8 {
        (self.0 & 0x1f) as u8
    }

    /// Pointer, reference, member pointer, …, bits 5..8.
    pub fn pointer_mode(self) -> u8 {
        ((self.0 >> 5) & 0x07) as u8
    }

    pub fn is_volatile(self) -> bool {
        self.0 & (1 << 9) != 0
    }

    pub fn is_const(self) -> bool {
        self.0 & (1 << 10) != 0
    }

    pub fn is_unaligned(self) -> bool {
        self.0 & (1 << 11) != 0
    }

    pub fn is_restrict(self) -> bool {
        self.0 & (1 << 12) != 0
    }

    /// Size of the pointer in bytes, bits 13..19.
    pub fn size(self) -> u8 {
        ((self.0 >> 13) & 0x3f) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "leaf", rename_all = "snake_case")]
pub enum TypeRecordBody {
    Modifier {
        modified_type: TypeIndex,
        modifiers:     u16,
    },
    Pointer {
        referent:   TypeIndex,
        attributes: PointerAttributes,
    },
    Procedure {
        return_type:        TypeIndex,
        calling_convention: u8,
        options:            u8,
        parameter_count:    u16,
        argument_list:      TypeIndex,
    },
    ArgList {
        arguments: Vec<TypeIndex>,
    },
    /// Body of a kind without a specific decoder.
    Raw {
        #[serde(serialize_with = "crate::bytes::serialize_hex")]
        bytes: Vec<u8>,
    },
}

impl TypeRecordBody {
    /// Decodes `body` for kinds that have a specific decoder; `Ok(None)` for
    /// everything else. Bytes past the decoded fields (trailing padding,
    /// member pointer extras) are ignored.
    pub fn decode(kind: TypeRecordKind, body: &[u8]) -> Result<Option<Self>> {
        let mut r = ByteReader::new(body);
        let decoded = match kind {
            TypeRecordKind::MODIFIER => TypeRecordBody::Modifier {
                modified_type: TypeIndex(r.read_u32("LF_MODIFIER type")?),
                modifiers:     r.read_u16("LF_MODIFIER attributes")?,
            },
            TypeRecordKind::POINTER => TypeRecordBody::Pointer {
                referent:   TypeIndex(r.read_u32("LF_POINTER referent")?),
                attributes: PointerAttributes(r.read_u32("LF_POINTER attributes")?),
            },
            TypeRecordKind::PROCEDURE => TypeRecordBody::Procedure {
                return_type:        TypeIndex(r.read_u32("LF_PROCEDURE return type")?),
                calling_convention: r.read_u8("LF_PROCEDURE calling convention")?,
                options:            r.read_u8("LF_PROCEDURE options")?,
                parameter_count:    r.read_u16("LF_PROCEDURE parameter count")?,
                argument_list:      TypeIndex(r.read_u32("LF_PROCEDURE argument list")?),
            },
            TypeRecordKind::ARGLIST => {
                let count = r.read_u32("LF_ARGLIST count")?;
                let needed = count as u64 * 4;
                if r.remaining() < needed {
                    return Err(PdbError::TruncatedData {
                        context:   "LF_ARGLIST arguments",
                        offset:    r.position(),
                        needed,
                        available: r.remaining(),
                    });
                }
                let mut arguments = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    arguments.push(TypeIndex(r.read_u32("LF_ARGLIST argument")?));
                }
                TypeRecordBody::ArgList { arguments }
            }
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }

    /// Number of bytes [`write`](Self::write) produces.
    pub fn encoded_len(&self) -> usize {
        match self {
            TypeRecordBody::Modifier { .. } => 6,
            TypeRecordBody::Pointer { .. } => 8,
            TypeRecordBody::Procedure { .. } => 12,
            TypeRecordBody::ArgList { arguments } => 4 + 4 * arguments.len(),
            TypeRecordBody::Raw { bytes } => bytes.len(),
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        match self {
            TypeRecordBody::Modifier { modified_type, modifiers } => {
                writer.write_u32::<LittleEndian>(modified_type.0)?;
                writer.write_u16::<LittleEndian>(*modifiers)?;
            }
            TypeRecordBody::Pointer { referent, attributes } => {
                writer.write_u32::<LittleEndian>(referent.0)?;
                writer.write_u32::<LittleEndian>(attributes.0)?;
            }
            TypeRecordBody::Procedure {
                return_type,
                calling_convention,
                options,
                parameter_count,
                argument_list,
            } => {
                writer.write_u32::<LittleEndian>(return_type.0)?;
                writer.write_u8(*calling_convention)?;
                writer.write_u8(*options)?;
                writer.write_u16::<LittleEndian>(*parameter_count)?;
                writer.write_u32::<LittleEndian>(argument_list.0)?;
            }
            TypeRecordBody::ArgList { arguments } => {
                writer.write_u32::<LittleEndian>(arguments.len() as u32)?;
                for arg in arguments {
                    writer.write_u32::<LittleEndian>(arg.0)?;
                }
            }
            TypeRecordBody::Raw { bytes } => writer.write_all(bytes)?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRecord {
    /// Declared length, excluding the length field itself.
    pub size: u16,
    pub kind: TypeRecordKind,
    pub body: TypeRecordBody,
}

impl TypeRecord {
    /// Builds a record whose size is computed from the encoded body.
    /// Fails when the body is too long for the 16-bit size field.
    pub fn new(kind: TypeRecordKind, body: TypeRecordBody) -> Result<Self> {
        let len = body.encoded_len();
        let size = len
            .checked_add(2)
            .and_then(|n| u16::try_from(n).ok())
            .ok_or(PdbError::RecordTooLarge { len })?;
        Ok(Self { size, kind, body })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.size)?;
        writer.write_u16::<LittleEndian>(self.kind.0)?;
        self.body.write(&mut writer)
    }
}

/// Whether `tail` starts with a complete record: a length field of at least
/// 2 whose record fits inside `tail`.
pub(crate) fn frames_record(tail: &[u8]) -> bool {
    if tail.len() < RECORD_HEADER_SIZE {
        return false;
    }
    let size = u16::from_le_bytes([tail[0], tail[1]]) as usize;
    size >= 2 && size + 2 <= tail.len()
}

/// Reads one record's length and kind and borrows its `size - 2` body bytes.
pub(crate) fn read_record<'a>(r: &mut ByteReader<'a>) -> Result<(u16, TypeRecordKind, &'a [u8])> {
    let offset = r.position();
    let size = r.read_u16("type record size")?;
    if size < 2 {
        return Err(PdbError::TruncatedData {
            context:   "type record kind",
            offset,
            needed:    2,
            available: size as u64,
        });
    }
    let kind = TypeRecordKind(r.read_u16("type record kind")?);
    let body = r.read_slice(size as u64 - 2, "type record body")?;
    Ok((size, kind, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_keeps_body_width() {
        let mut buf = Vec::new();
        TypeRecord::new(TypeRecordKind(0x7777), TypeRecordBody::Raw { bytes: vec![9; 6] })
            .unwrap()
            .write(&mut buf)
            .unwrap();
        buf.extend_from_slice(&[0xAA, 0xBB]);

        let mut r = ByteReader::new(&buf);
        let (size, kind, body) = read_record(&mut r).unwrap();
        assert_eq!(size, 8);
        assert_eq!(kind, TypeRecordKind(0x7777));
        assert_eq!(body, &[9; 6]);
        assert_eq!(r.position(), 10);
        assert!(TypeRecordBody::decode(kind, body).unwrap().is_none());
    }

    #[test]
    fn pointer_body() {
        let rec = TypeRecord::new(
            TypeRecordKind::POINTER,
            TypeRecordBody::Pointer {
                referent:   TypeIndex(0x1004),
                attributes: PointerAttributes(0x0001_040c),
            },
        )
        .unwrap();
        assert_eq!(rec.size, 10);
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();

        let mut r = ByteReader::new(&buf);
        let (_, kind, body) = read_record(&mut r).unwrap();
        let decoded = TypeRecordBody::decode(kind, body).unwrap().unwrap();
        assert_eq!(decoded, rec.body);
        if let TypeRecordBody::Pointer { attributes, .. } = decoded {
            assert_eq!(attributes.pointer_kind(), 0x0c);
            assert!(attributes.is_const());
            assert_eq!(attributes.size(), 8);
        }
    }

    #[test]
    fn encoded_len_matches_written_bytes() {
        let bodies = [
            TypeRecordBody::Modifier { modified_type: TypeIndex(0x74), modifiers: 1 },
            TypeRecordBody::Pointer { referent: TypeIndex(0x74), attributes: PointerAttributes(0) },
            TypeRecordBody::Procedure {
                return_type:        TypeIndex(0x03),
                calling_convention: 0,
                options:            0,
                parameter_count:    2,
                argument_list:      TypeIndex(0x1001),
            },
            TypeRecordBody::ArgList { arguments: vec![TypeIndex(0x74), TypeIndex(0x70)] },
            TypeRecordBody::Raw { bytes: vec![1, 2, 3] },
        ];
        for body in bodies {
            let mut buf = Vec::new();
            body.write(&mut buf).unwrap();
            assert_eq!(buf.len(), body.encoded_len(), "{body:?}");
        }
    }

    #[test]
    fn oversized_body_is_rejected() {
        let arguments = vec![TypeIndex(0x74); 16_384];
        assert!(matches!(
            TypeRecord::new(TypeRecordKind::ARGLIST, TypeRecordBody::ArgList { arguments }),
            Err(PdbError::RecordTooLarge { len: 65_540 })
        ));

        let fits = TypeRecord::new(TypeRecordKind(0x7777), TypeRecordBody::Raw { bytes: vec![0; 65_533] });
        assert_eq!(fits.unwrap().size, u16::MAX);
    }

    #[test]
    fn arglist_count_beyond_body_is_truncated() {
        let mut body = Vec::new();
        body.extend_from_slice(&100u32.to_le_bytes());
        body.extend_from_slice(&0x74u32.to_le_bytes());
        assert!(matches!(
            TypeRecordBody::decode(TypeRecordKind::ARGLIST, &body),
            Err(PdbError::TruncatedData { context: "LF_ARGLIST arguments", .. })
        ));
    }

    #[test]
    fn body_shorter_than_declared_size() {
        let buf = [0x10, 0x00, 0x02, 0x10, 0x00, 0x00];
        let mut r = ByteReader::new(&buf);
        assert!(matches!(
            read_record(&mut r),
            Err(PdbError::TruncatedData { context: "type record body", needed: 14, available: 2, .. })
        ));
    }

    #[test]
    fn framing_checks_length_against_tail() {
        assert!(frames_record(&[0x02, 0x00, 0x01, 0x10]));
        assert!(!frames_record(&[0xf2, 0xf1]));
        assert!(!frames_record(&[0x01, 0x00, 0x01, 0x10]));
        assert!(!frames_record(&[0x04, 0x00, 0x01, 0x10, 0xff]));
    }

    #[test]
    fn size_below_kind_width() {
        let buf = [0x01, 0x00, 0xff];
        let mut r = ByteReader::new(&buf);
        assert!(matches!(read_record(&mut r), Err(PdbError::TruncatedData { context: "type record kind", .. })));
    }
}
