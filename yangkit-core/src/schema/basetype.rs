//! Built-in YANG base types and their static properties

use super::TypeFlags;
use serde::{Deserialize, Serialize};

/// The built-in type at the root of every typedef chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    /// Chain not yet resolved; never present in a compiled type
    #[default]
    Unknown,
    /// Any binary data
    Binary,
    /// A set of bits or flags
    Bits,
    /// "true" or "false"
    Boolean,
    /// 64-bit signed decimal number
    Decimal64,
    /// A leaf that does not have any value
    Empty,
    /// One of an enumerated set of strings
    Enumeration,
    /// A reference to an abstract identity
    IdentityRef,
    /// A reference to a data tree node
    InstanceIdentifier,
    /// A reference to a leaf instance
    LeafRef,
    /// A character string
    String,
    /// Choice of member types
    Union,
    /// 8-bit signed integer
    Int8,
    /// 8-bit unsigned integer
    Uint8,
    /// 16-bit signed integer
    Int16,
    /// 16-bit unsigned integer
    Uint16,
    /// 32-bit signed integer
    Int32,
    /// 32-bit unsigned integer
    Uint32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit unsigned integer
    Uint64,
}

impl BaseType {
    /// Resolve a built-in type name; `None` for user typedef names
    #[must_use]
    pub fn from_name(name: &str) -> Option<BaseType> {
        Some(match name {
            "binary" => BaseType::Binary,
            "bits" => BaseType::Bits,
            "boolean" => BaseType::Boolean,
            "decimal64" => BaseType::Decimal64,
            "empty" => BaseType::Empty,
            "enumeration" => BaseType::Enumeration,
            "identityref" => BaseType::IdentityRef,
            "instance-identifier" => BaseType::InstanceIdentifier,
            "leafref" => BaseType::LeafRef,
            "string" => BaseType::String,
            "union" => BaseType::Union,
            "int8" => BaseType::Int8,
            "uint8" => BaseType::Uint8,
            "int16" => BaseType::Int16,
            "uint16" => BaseType::Uint16,
            "int32" => BaseType::Int32,
            "uint32" => BaseType::Uint32,
            "int64" => BaseType::Int64,
            "uint64" => BaseType::Uint64,
            _ => return None,
        })
    }

    /// The YANG keyword naming this type
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BaseType::Unknown => "unknown",
            BaseType::Binary => "binary",
            BaseType::Bits => "bits",
            BaseType::Boolean => "boolean",
            BaseType::Decimal64 => "decimal64",
            BaseType::Empty => "empty",
            BaseType::Enumeration => "enumeration",
            BaseType::IdentityRef => "identityref",
            BaseType::InstanceIdentifier => "instance-identifier",
            BaseType::LeafRef => "leafref",
            BaseType::String => "string",
            BaseType::Union => "union",
            BaseType::Int8 => "int8",
            BaseType::Uint8 => "uint8",
            BaseType::Int16 => "int16",
            BaseType::Uint16 => "uint16",
            BaseType::Int32 => "int32",
            BaseType::Uint32 => "uint32",
            BaseType::Int64 => "int64",
            BaseType::Uint64 => "uint64",
        }
    }

    /// The restriction substatements this base type accepts anywhere in
    /// a derivation chain
    #[must_use]
    pub fn allowed_restrictions(self) -> TypeFlags {
        match self {
            BaseType::Unknown | BaseType::Boolean | BaseType::Empty => TypeFlags::empty(),
            BaseType::Binary => TypeFlags::LENGTH,
            BaseType::Bits => TypeFlags::BIT,
            BaseType::Decimal64 => TypeFlags::FRACTION_DIGITS | TypeFlags::RANGE,
            BaseType::Enumeration => TypeFlags::ENUM,
            BaseType::IdentityRef => TypeFlags::BASE,
            BaseType::InstanceIdentifier => TypeFlags::REQUIRE_INSTANCE,
            BaseType::LeafRef => TypeFlags::REQUIRE_INSTANCE | TypeFlags::PATH,
            BaseType::String => TypeFlags::LENGTH | TypeFlags::PATTERN,
            BaseType::Union => TypeFlags::TYPE,
            BaseType::Int8
            | BaseType::Uint8
            | BaseType::Int16
            | BaseType::Uint16
            | BaseType::Int32
            | BaseType::Uint32
            | BaseType::Int64
            | BaseType::Uint64 => TypeFlags::RANGE,
        }
    }

    /// Whether range/length bounds of this type compare as unsigned
    #[must_use]
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            BaseType::Binary
                | BaseType::String
                | BaseType::Uint8
                | BaseType::Uint16
                | BaseType::Uint32
                | BaseType::Uint64
        )
    }

    /// Smallest value a range/length part of this type may hold
    #[must_use]
    pub fn min_value(self) -> i128 {
        match self {
            BaseType::Int8 => i128::from(i8::MIN),
            BaseType::Int16 => i128::from(i16::MIN),
            BaseType::Int32 => i128::from(i32::MIN),
            BaseType::Int64 | BaseType::Decimal64 => i128::from(i64::MIN),
            _ => 0,
        }
    }

    /// Largest value a range/length part of this type may hold
    #[must_use]
    pub fn max_value(self) -> i128 {
        match self {
            BaseType::Int8 => i128::from(i8::MAX),
            BaseType::Int16 => i128::from(i16::MAX),
            BaseType::Int32 => i128::from(i32::MAX),
            BaseType::Int64 | BaseType::Decimal64 => i128::from(i64::MAX),
            BaseType::Uint8 => i128::from(u8::MAX),
            BaseType::Uint16 => i128::from(u16::MAX),
            BaseType::Uint32 => i128::from(u32::MAX),
            _ => i128::from(u64::MAX),
        }
    }

    /// Whether the bound expression of this type is a `length` (as
    /// opposed to a `range`)
    #[must_use]
    pub fn uses_length(self) -> bool {
        matches!(self, BaseType::Binary | BaseType::String)
    }
}

impl std::fmt::Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
