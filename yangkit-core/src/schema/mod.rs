//! Schema model: the parsed (source-faithful) and compiled (linked,
//! restriction-merged) trees plus the pieces shared between them.

pub mod basetype;
pub mod compiled;
pub mod iffeature;
pub mod parsed;

pub use basetype::BaseType;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Index of a module handle inside its owning context.
///
/// Handles are never removed from a context while it lives, so an id
/// stays valid for the lifetime of the context that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

/// YANG language version a module was written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum YangVersion {
    /// RFC 6020
    #[default]
    V1_0,
    /// RFC 7950
    V1_1,
}

/// Definition lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    /// Definition is current and valid
    Current,
    /// Obsolescence announced, still valid
    Deprecated,
    /// Definition must not be implemented
    Obsolete,
}

impl Status {
    /// The YANG keyword for this status
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Deprecated => "deprecated",
            Status::Obsolete => "obsolete",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

bitflags! {
    /// Statement flags shared by parsed and compiled schema elements
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct NodeFlags: u16 {
        /// `config true`
        const CONFIG_W = 0x0001;
        /// `config false`
        const CONFIG_R = 0x0002;
        /// `status current`
        const STATUS_CURRENT = 0x0004;
        /// `status deprecated`
        const STATUS_DEPRECATED = 0x0008;
        /// `status obsolete`
        const STATUS_OBSOLETE = 0x0010;
        /// `mandatory true`
        const MAND_TRUE = 0x0020;
        /// `mandatory false`
        const MAND_FALSE = 0x0040;
        /// `ordered-by user`
        const ORDBY_USER = 0x0080;
        /// Feature is currently enabled (compiled features only)
        const ENABLED = 0x0100;
    }
}

impl NodeFlags {
    /// Both config bits
    pub const CONFIG_MASK: NodeFlags = NodeFlags::CONFIG_W.union(NodeFlags::CONFIG_R);
    /// All three status bits
    pub const STATUS_MASK: NodeFlags = NodeFlags::STATUS_CURRENT
        .union(NodeFlags::STATUS_DEPRECATED)
        .union(NodeFlags::STATUS_OBSOLETE);

    /// The status encoded in these flags; unset bits mean `current`
    #[must_use]
    pub fn status(self) -> Status {
        if self.contains(NodeFlags::STATUS_OBSOLETE) {
            Status::Obsolete
        } else if self.contains(NodeFlags::STATUS_DEPRECATED) {
            Status::Deprecated
        } else {
            Status::Current
        }
    }

    /// Whether the status bits were explicitly set
    #[must_use]
    pub fn has_explicit_status(self) -> bool {
        self.intersects(NodeFlags::STATUS_MASK)
    }
}

bitflags! {
    /// Which restriction substatements a parsed type carries.
    ///
    /// Computed from statement presence rather than stored, so the
    /// parsed tree cannot get out of sync with itself.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct TypeFlags: u16 {
        /// `range`
        const RANGE = 0x0001;
        /// `length`
        const LENGTH = 0x0002;
        /// `pattern`
        const PATTERN = 0x0004;
        /// `enum`
        const ENUM = 0x0008;
        /// `bit`
        const BIT = 0x0010;
        /// `fraction-digits`
        const FRACTION_DIGITS = 0x0020;
        /// `base`
        const BASE = 0x0040;
        /// `path`
        const PATH = 0x0080;
        /// `require-instance`
        const REQUIRE_INSTANCE = 0x0100;
        /// member `type` statements of a union
        const TYPE = 0x0200;
    }
}
