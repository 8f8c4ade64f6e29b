//! Type indices and the built-in types packed into the low ones.
//!
//! An index at or above [`FIRST_USER_INDEX`] names a record in the type
//! stream. Anything below is a built-in type laid out as:
//!
//! ```text
//!  15      12 11       8 7                0
//! +----------+----------+------------------+
//! | unused   | mode     | kind             |
//! +----------+----------+------------------+
//! ```
//!
//! e.g. `0x0603` is mode 6 (64-bit pointer) over kind 3 (`void`).

use serde::Serialize;
use std::fmt;

/// First index handed out to records of the type stream.
pub const FIRST_USER_INDEX: u32 = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeIndex(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeIndexKind {
    /// Index of a record in the type stream; resolving it is up to the caller.
    Reference(u32),
    BuiltIn(BuiltInType),
}

impl TypeIndex {
    pub fn decompose(self) -> TypeIndexKind {
        if self.0 >= FIRST_USER_INDEX {
            return TypeIndexKind::Reference(self.0);
        }
        TypeIndexKind::BuiltIn(BuiltInType {
            kind: TypeKind((self.0 & 0xff) as u8),
            mode: TypeMode(((self.0 >> 8) & 0x0f) as u8),
        })
    }

    #[inline]
    pub fn is_built_in(self) -> bool {
        self.0 < FIRST_USER_INDEX
    }
}

impl From<BuiltInType> for TypeIndex {
    fn from(t: BuiltInType) -> Self {
        t.compose()
    }
}

impl fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decompose() {
            TypeIndexKind::Reference(i) => write!(f, "TypeIndex(0x{i:x})"),
            TypeIndexKind::BuiltIn(t) => t.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuiltInType {
    pub kind: TypeKind,
    pub mode: TypeMode,
}

impl BuiltInType {
    pub fn compose(self) -> TypeIndex {
        TypeIndex(((self.mode.0 as u32 & 0x0f) << 8) | self.kind.0 as u32)
    }
}

impl fmt::Display for BuiltInType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode == TypeMode::DIRECT {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} pointer to {}", self.mode, self.kind)
        }
    }
}

/// Pointer mode of a built-in type (4 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeMode(pub u8);

impl TypeMode {
    pub const DIRECT:       TypeMode = TypeMode(0);
    pub const NEAR16:       TypeMode = TypeMode(1);
    pub const FAR16:        TypeMode = TypeMode(2);
    pub const HUGE16:       TypeMode = TypeMode(3);
    pub const NEAR32:       TypeMode = TypeMode(4);
    pub const FAR32:        TypeMode = TypeMode(5);
    pub const NEAR64:       TypeMode = TypeMode(6);
    pub const NEAR128:      TypeMode = TypeMode(7);

    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::DIRECT  => "direct",
            Self::NEAR16  => "16 bit",
            Self::FAR16   => "16:16 far",
            Self::HUGE16  => "16:16 huge",
            Self::NEAR32  => "32 bit",
            Self::FAR32   => "16:32 far",
            Self::NEAR64  => "64 bit",
            Self::NEAR128 => "128 bit",
            _ => return None,
        })
    }
}

impl fmt::Display for TypeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "mode(0x{:x})", self.0),
        }
    }
}

/// Kind of a built-in type (8 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKind(pub u8);

impl TypeKind {
    pub const NONE:             TypeKind = TypeKind(0x00);
    pub const ABS:              TypeKind = TypeKind(0x01);
    pub const SEGMENT:          TypeKind = TypeKind(0x02);
    pub const VOID:             TypeKind = TypeKind(0x03);
    pub const CURRENCY:         TypeKind = TypeKind(0x04);
    pub const NEAR_BASIC_STR:   TypeKind = TypeKind(0x05);
    pub const FAR_BASIC_STR:    TypeKind = TypeKind(0x06);
    pub const NOT_TRANSLATED:   TypeKind = TypeKind(0x07);
    pub const HRESULT:          TypeKind = TypeKind(0x08);

    pub const SIGNED_CHAR:      TypeKind = TypeKind(0x10);
    pub const SHORT:            TypeKind = TypeKind(0x11);
    pub const LONG:             TypeKind = TypeKind(0x12);
    pub const QUAD:             TypeKind = TypeKind(0x13);
    pub const OCT:              TypeKind = TypeKind(0x14);
    pub const UNSIGNED_CHAR:    TypeKind = TypeKind(0x20);
    pub const USHORT:           TypeKind = TypeKind(0x21);
    pub const ULONG:            TypeKind = TypeKind(0x22);
    pub const UQUAD:            TypeKind = TypeKind(0x23);
    pub const UOCT:             TypeKind = TypeKind(0x24);

    pub const BOOL8:            TypeKind = TypeKind(0x30);
    pub const BOOL16:           TypeKind = TypeKind(0x31);
    pub const BOOL32:           TypeKind = TypeKind(0x32);
    pub const BOOL64:           TypeKind = TypeKind(0x33);
    pub const BOOL128:          TypeKind = TypeKind(0x34);

    pub const FLOAT32:          TypeKind = TypeKind(0x40);
    pub const FLOAT64:          TypeKind = TypeKind(0x41);
    pub const FLOAT80:          TypeKind = TypeKind(0x42);
    pub const FLOAT128:         TypeKind = TypeKind(0x43);
    pub const FLOAT48:          TypeKind = TypeKind(0x44);
    pub const FLOAT32_PP:       TypeKind = TypeKind(0x45);
    pub const FLOAT16:          TypeKind = TypeKind(0x46);

    pub const COMPLEX32:        TypeKind = TypeKind(0x50);
    pub const COMPLEX64:        TypeKind = TypeKind(0x51);
    pub const COMPLEX80:        TypeKind = TypeKind(0x52);
    pub const COMPLEX128:       TypeKind = TypeKind(0x53);

    pub const BIT:              TypeKind = TypeKind(0x60);
    pub const PASCAL_CHAR:      TypeKind = TypeKind(0x61);
    pub const BOOL32_FF:        TypeKind = TypeKind(0x62);

    pub const INT8:             TypeKind = TypeKind(0x68);
    pub const UINT8:            TypeKind = TypeKind(0x69);
    pub const CHAR:             TypeKind = TypeKind(0x70);
    pub const WCHAR:            TypeKind = TypeKind(0x71);
    pub const INT16:            TypeKind = TypeKind(0x72);
    pub const UINT16:           TypeKind = TypeKind(0x73);
    pub const INT32:            TypeKind = TypeKind(0x74);
    pub const UINT32:           TypeKind = TypeKind(0x75);
    pub const INT64:            TypeKind = TypeKind(0x76);
    pub const UINT64:           TypeKind = TypeKind(0x77);
    pub const INT128:           TypeKind = TypeKind(0x78);
    pub const UINT128:          TypeKind = TypeKind(0x79);
    pub const CHAR16:           TypeKind = TypeKind(0x7a);
    pub const CHAR32:           TypeKind = TypeKind(0x7b);
    pub const CHAR8:            TypeKind = TypeKind(0x7c);

    pub const INTERNAL:         TypeKind = TypeKind(0xf0);

    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::NONE           => "<no type>",
            Self::ABS            => "<absolute>",
            Self::SEGMENT        => "<segment>",
            Self::VOID           => "void",
            Self::CURRENCY       => "<currency>",
            Self::NEAR_BASIC_STR => "<near basic string>",
            Self::FAR_BASIC_STR  => "<far basic string>",
            Self::NOT_TRANSLATED => "<not translated>",
            Self::HRESULT        => "HRESULT",
            Self::SIGNED_CHAR    => "signed char",
            Self::SHORT          => "short",
            Self::LONG           => "long",
            Self::QUAD           => "__int64",
            Self::OCT            => "__int128",
            Self::UNSIGNED_CHAR  => "unsigned char",
            Self::USHORT         => "unsigned short",
            Self::ULONG          => "unsigned long",
            Self::UQUAD          => "unsigned __int64",
            Self::UOCT           => "unsigned __int128",
            Self::BOOL8          => "bool",
            Self::BOOL16         => "__bool16",
            Self::BOOL32         => "__bool32",
            Self::BOOL64         => "__bool64",
            Self::BOOL128        => "__bool128",
            Self::FLOAT32        => "float",
            Self::FLOAT64        => "double",
            Self::FLOAT80        => "long double",
            Self::FLOAT128       => "__float128",
            Self::FLOAT48        => "__float48",
            Self::FLOAT32_PP     => "__float32pp",
            Self::FLOAT16        => "__half",
            Self::COMPLEX32      => "_Complex float",
            Self::COMPLEX64      => "_Complex double",
            Self::COMPLEX80      => "_Complex long double",
            Self::COMPLEX128     => "_Complex __float128",
            Self::BIT            => "<bit>",
            Self::PASCAL_CHAR    => "<pascal char>",
            Self::BOOL32_FF      => "<bool32 0xffffffff>",
            Self::INT8           => "int8_t",
            Self::UINT8          => "uint8_t",
            Self::CHAR           => "char",
            Self::WCHAR          => "wchar_t",
            Self::INT16          => "int16_t",
            Self::UINT16         => "uint16_t",
            Self::INT32          => "int",
            Self::UINT32         => "unsigned",
            Self::INT64          => "int64_t",
            Self::UINT64         => "uint64_t",
            Self::INT128         => "int128_t",
            Self::UINT128        => "uint128_t",
            Self::CHAR16         => "char16_t",
            Self::CHAR32         => "char32_t",
            Self::CHAR8          => "char8_t",
            Self::INTERNAL       => "<internal>",
            _ => return None,
        })
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "kind(0x{:x})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_to_void() {
        let t = TypeIndex(0x0603);
        assert_eq!(
            t.decompose(),
            TypeIndexKind::BuiltIn(BuiltInType { kind: TypeKind::VOID, mode: TypeMode::NEAR64 })
        );
        assert_eq!(t.to_string(), "64 bit pointer to void");
    }

    #[test]
    fn direct_types_render_kind_only() {
        assert_eq!(TypeIndex(0x0074).to_string(), "int");
        assert_eq!(TypeIndex(0x0003).to_string(), "void");
        assert_eq!(TypeIndex(0x0470).to_string(), "32 bit pointer to char");
    }

    #[test]
    fn unknown_bits_render_numerically() {
        assert_eq!(TypeIndex(0x009a).to_string(), "kind(0x9a)");
        assert_eq!(TypeIndex(0x0803).to_string(), "mode(0x8) pointer to void");
    }

    #[test]
    fn user_indices_are_references() {
        assert_eq!(TypeIndex(0x1000).decompose(), TypeIndexKind::Reference(0x1000));
        assert_eq!(TypeIndex(0x1000).to_string(), "TypeIndex(0x1000)");
        assert!(!TypeIndex(0xffff_ffff).is_built_in());
    }

    #[test]
    fn compose_inverts_decompose() {
        let t = BuiltInType { kind: TypeKind::FLOAT64, mode: TypeMode::NEAR32 };
        assert_eq!(t.compose(), TypeIndex(0x0441));
        assert_eq!(TypeIndex::from(t).decompose(), TypeIndexKind::BuiltIn(t));
    }
}
