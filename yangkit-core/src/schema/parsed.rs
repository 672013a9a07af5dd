//! The parsed schema tree: a source-faithful mirror of one module
//!
//! Everything here is plain data produced by a source parser. String
//! fields are context-pool handles, references (typedef names, feature
//! names, identity bases) are unresolved text, and statement order is
//! preserved. The tree is mutable while a parser builds it and treated
//! as immutable afterwards.

use super::{ModuleId, NodeFlags, TypeFlags, YangVersion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Marker byte a source parser prepends to a pattern argument compiled
/// with `invert-match` semantics.
pub const PATTERN_INVERT_MARK: char = '\u{15}';

/// Marker byte a source parser may prepend to a regular pattern
/// argument; stripped before compilation.
pub const PATTERN_MATCH_MARK: char = '\u{6}';

/// A parsed module or submodule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedModule {
    /// Module name
    pub name: Arc<str>,
    /// Path of the source file the module was read from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<Arc<str>>,
    /// Module namespace; `None` for submodules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Arc<str>>,
    /// Prefix the module declares for itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Arc<str>>,
    /// YANG language version
    #[serde(default)]
    pub version: YangVersion,
    /// Whether this is a submodule
    #[serde(default)]
    pub submodule: bool,
    /// Main module name; submodules only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub belongs_to: Option<Arc<str>>,

    /// Import statements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Import>,
    /// Include statements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<Include>,

    /// Organization responsible for the module
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Arc<str>>,
    /// Contact information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Arc<str>>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,

    /// Revision history, sorted newest first once inserted into a context
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<Revision>,
    /// Extension statement definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<ExtensionDef>,
    /// Feature definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<FeatureDef>,
    /// Identity definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<IdentityDef>,
    /// Module-level typedefs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typedefs: Vec<Typedef>,
    /// Module-level groupings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
    /// Top-level data nodes in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<ParsedNode>,
    /// Augment statements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub augments: Vec<Augment>,
    /// RPC definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rpcs: Vec<RpcDef>,
    /// Notification definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<NotificationDef>,
    /// Deviation statements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deviations: Vec<Deviation>,
    /// Extension instances attached to the module itself
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exts: Vec<ExtensionInstance>,
}

impl ParsedModule {
    /// The newest revision date, if the module has any revision
    #[must_use]
    pub fn latest_revision(&self) -> Option<&Arc<str>> {
        self.revisions.first().map(|r| &r.date)
    }
}

/// An `import` statement
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Import {
    /// Name of the imported module
    pub name: Arc<str>,
    /// Prefix the importing module uses for it
    pub prefix: Arc<str>,
    /// Exact revision requested, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<Arc<str>>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
    /// Handle of the resolved module; filled during dependency resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleId>,
}

/// An `include` statement
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Include {
    /// Name of the included submodule
    pub name: Arc<str>,
    /// Exact revision requested, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<Arc<str>>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
    /// The parsed submodule; filled during dependency resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submodule: Option<Box<ParsedModule>>,
}

/// One `revision` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Revision {
    /// Revision date, `YYYY-MM-DD`
    pub date: Arc<str>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// A `feature` definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureDef {
    /// Feature name
    pub name: Arc<str>,
    /// `if-feature` expressions guarding the feature
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<Arc<str>>,
    /// Status flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// An `identity` definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentityDef {
    /// Identity name
    pub name: Arc<str>,
    /// `if-feature` expressions guarding the identity
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<Arc<str>>,
    /// Base identities, optionally prefixed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<Arc<str>>,
    /// Status flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// A `typedef` statement
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Typedef {
    /// Typedef name
    pub name: Arc<str>,
    /// The derived type
    #[serde(rename = "type")]
    pub type_: ParsedType,
    /// Units of the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Arc<str>>,
    /// Default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Arc<str>>,
    /// Status flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// A `type` statement: the referenced base plus local restrictions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedType {
    /// Referenced type name: a built-in or an optionally prefixed typedef
    pub name: Arc<str>,
    /// `range` restriction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Restriction>,
    /// `length` restriction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<Restriction>,
    /// `pattern` restrictions; the argument may start with
    /// [`PATTERN_INVERT_MARK`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<Restriction>,
    /// `enum` items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumSpec>,
    /// `bit` items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bits: Vec<EnumSpec>,
    /// `fraction-digits`; 0 when absent
    #[serde(default)]
    pub fraction_digits: u8,
    /// `path` of a leafref
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Arc<str>>,
    /// `base` identities of an identityref
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<Arc<str>>,
    /// Member types of a union
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<ParsedType>,
    /// `require-instance`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_instance: Option<bool>,
}

impl ParsedType {
    /// Which restriction substatements are present
    #[must_use]
    pub fn restrictions(&self) -> TypeFlags {
        let mut flags = TypeFlags::empty();
        if self.range.is_some() {
            flags |= TypeFlags::RANGE;
        }
        if self.length.is_some() {
            flags |= TypeFlags::LENGTH;
        }
        if !self.patterns.is_empty() {
            flags |= TypeFlags::PATTERN;
        }
        if !self.enums.is_empty() {
            flags |= TypeFlags::ENUM;
        }
        if !self.bits.is_empty() {
            flags |= TypeFlags::BIT;
        }
        if self.fraction_digits != 0 {
            flags |= TypeFlags::FRACTION_DIGITS;
        }
        if !self.bases.is_empty() {
            flags |= TypeFlags::BASE;
        }
        if self.path.is_some() {
            flags |= TypeFlags::PATH;
        }
        if self.require_instance.is_some() {
            flags |= TypeFlags::REQUIRE_INSTANCE;
        }
        if !self.types.is_empty() {
            flags |= TypeFlags::TYPE;
        }
        flags
    }
}

/// A restriction argument (`range`, `length`, `pattern`, `must`) with
/// its error strings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Restriction {
    /// The restriction expression
    pub arg: Arc<str>,
    /// `error-message`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<Arc<str>>,
    /// `error-app-tag`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_app_tag: Option<Arc<str>>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// One `enum` or `bit` item of a parsed type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnumSpec {
    /// Item name
    pub name: Arc<str>,
    /// Explicitly assigned value or position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// `if-feature` expressions guarding the item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<Arc<str>>,
    /// Status flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// A `grouping` statement
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Grouping {
    /// Grouping name
    pub name: Arc<str>,
    /// Status flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Local typedefs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typedefs: Vec<Typedef>,
    /// Nested groupings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
    /// Data nodes in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<ParsedNode>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// A `when` condition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct When {
    /// XPath condition text
    pub condition: Arc<str>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// Statement parts shared by every data node kind
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeCommon {
    /// Node name
    pub name: Arc<str>,
    /// Config, status and mandatory flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// `when` condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<When>,
    /// `if-feature` expressions guarding the node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<Arc<str>>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// A parsed data-tree node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ParsedNode {
    /// `container`
    Container(ContainerNode),
    /// `leaf`
    Leaf(LeafNode),
    /// `leaf-list`
    LeafList(LeafListNode),
    /// `list`
    List(ListNode),
    /// `choice`
    Choice(ChoiceNode),
    /// `case`
    Case(CaseNode),
    /// `uses`
    Uses(UsesNode),
    /// `anyxml`
    AnyXml(AnyDataNode),
    /// `anydata`
    AnyData(AnyDataNode),
}

impl ParsedNode {
    /// The statement parts every node kind shares
    #[must_use]
    pub fn common(&self) -> &NodeCommon {
        match self {
            ParsedNode::Container(n) => &n.common,
            ParsedNode::Leaf(n) => &n.common,
            ParsedNode::LeafList(n) => &n.common,
            ParsedNode::List(n) => &n.common,
            ParsedNode::Choice(n) => &n.common,
            ParsedNode::Case(n) => &n.common,
            ParsedNode::Uses(n) => &n.common,
            ParsedNode::AnyXml(n) | ParsedNode::AnyData(n) => &n.common,
        }
    }

    /// Node name
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.common().name
    }

    /// Child nodes, for the kinds that have them
    #[must_use]
    pub fn children(&self) -> &[ParsedNode] {
        match self {
            ParsedNode::Container(n) => &n.children,
            ParsedNode::List(n) => &n.children,
            ParsedNode::Choice(n) => &n.children,
            ParsedNode::Case(n) => &n.children,
            _ => &[],
        }
    }

    /// Local typedefs, for the kinds that may declare them
    #[must_use]
    pub fn typedefs(&self) -> &[Typedef] {
        match self {
            ParsedNode::Container(n) => &n.typedefs,
            ParsedNode::List(n) => &n.typedefs,
            _ => &[],
        }
    }
}

/// A `container` node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContainerNode {
    /// Shared statement parts
    pub common: NodeCommon,
    /// `must` constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<Restriction>,
    /// `presence` statement argument
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<Arc<str>>,
    /// Local typedefs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typedefs: Vec<Typedef>,
    /// Local groupings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
    /// Child nodes in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParsedNode>,
}

/// A `leaf` node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LeafNode {
    /// Shared statement parts
    pub common: NodeCommon,
    /// `must` constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<Restriction>,
    /// The leaf type
    #[serde(rename = "type")]
    pub type_: ParsedType,
    /// Units of the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Arc<str>>,
    /// Default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Arc<str>>,
}

/// A `leaf-list` node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LeafListNode {
    /// Shared statement parts
    pub common: NodeCommon,
    /// `must` constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<Restriction>,
    /// The entry type
    #[serde(rename = "type")]
    pub type_: ParsedType,
    /// Units of the values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Arc<str>>,
    /// Default values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<Arc<str>>,
    /// `min-elements`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_elements: Option<u32>,
    /// `max-elements`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_elements: Option<u32>,
}

/// A `list` node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListNode {
    /// Shared statement parts
    pub common: NodeCommon,
    /// `must` constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<Restriction>,
    /// `key` argument: space-separated leaf names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Arc<str>>,
    /// Local typedefs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typedefs: Vec<Typedef>,
    /// Local groupings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
    /// Child nodes in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParsedNode>,
    /// `unique` arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uniques: Vec<Arc<str>>,
    /// `min-elements`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_elements: Option<u32>,
    /// `max-elements`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_elements: Option<u32>,
}

/// A `choice` node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChoiceNode {
    /// Shared statement parts
    pub common: NodeCommon,
    /// Cases in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParsedNode>,
    /// Default case name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Arc<str>>,
}

/// A `case` node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseNode {
    /// Shared statement parts
    pub common: NodeCommon,
    /// Child nodes in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParsedNode>,
}

/// A `uses` node referencing a grouping
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsesNode {
    /// Shared statement parts; the name is the referenced grouping
    pub common: NodeCommon,
    /// `refine` statements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refines: Vec<Refine>,
    /// `augment` statements scoped to this uses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub augments: Vec<Augment>,
}

/// An `anyxml` or `anydata` node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnyDataNode {
    /// Shared statement parts
    pub common: NodeCommon,
    /// `must` constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<Restriction>,
}

/// A `refine` statement of a uses
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Refine {
    /// Descendant schema node identifier the refine targets
    pub node_id: Arc<str>,
    /// `if-feature` expressions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<Arc<str>>,
    /// `must` constraints added by the refine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<Restriction>,
    /// `presence` override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<Arc<str>>,
    /// Default value overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<Arc<str>>,
    /// Flag overrides (config, mandatory)
    #[serde(default)]
    pub flags: NodeFlags,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// An `augment` statement
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Augment {
    /// Schema node identifier of the augment target
    pub node_id: Arc<str>,
    /// `when` condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<When>,
    /// `if-feature` expressions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<Arc<str>>,
    /// Nodes the augment inserts, in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParsedNode>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// One `deviate` of a deviation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Deviate {
    /// `deviate not-supported`
    NotSupported,
    /// `deviate add`
    Add {
        /// Added units
        units: Option<Arc<str>>,
        /// Added `must` constraints
        musts: Vec<Restriction>,
        /// Added `unique` arguments
        uniques: Vec<Arc<str>>,
        /// Added default values
        defaults: Vec<Arc<str>>,
        /// Added flags (config, mandatory)
        flags: NodeFlags,
    },
    /// `deviate delete`
    Delete {
        /// Deleted units
        units: Option<Arc<str>>,
        /// Deleted `must` constraints
        musts: Vec<Restriction>,
        /// Deleted `unique` arguments
        uniques: Vec<Arc<str>>,
        /// Deleted default values
        defaults: Vec<Arc<str>>,
    },
    /// `deviate replace`
    Replace {
        /// Replacement type
        type_: Option<Box<ParsedType>>,
        /// Replacement units
        units: Option<Arc<str>>,
        /// Replacement default
        default: Option<Arc<str>>,
        /// Replacement flags (config, mandatory)
        flags: NodeFlags,
    },
}

/// A `deviation` statement
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Deviation {
    /// Schema node identifier of the deviation target
    pub node_id: Arc<str>,
    /// The individual deviates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deviates: Vec<Deviate>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// An `extension` statement definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtensionDef {
    /// Extension name
    pub name: Arc<str>,
    /// Argument name, if the extension takes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<Arc<str>>,
    /// Status flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// An instance of an extension, `prefix:name argument;`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtensionInstance {
    /// Prefixed extension name
    pub name: Arc<str>,
    /// Argument value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<Arc<str>>,
}

/// An `rpc` or `action` definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RpcDef {
    /// RPC name
    pub name: Arc<str>,
    /// `if-feature` expressions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<Arc<str>>,
    /// Status flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Local typedefs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typedefs: Vec<Typedef>,
    /// Local groupings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
    /// `input` statement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<RpcInOut>,
    /// `output` statement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<RpcInOut>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

/// The `input` or `output` of an RPC
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RpcInOut {
    /// `must` constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<Restriction>,
    /// Local typedefs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typedefs: Vec<Typedef>,
    /// Local groupings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
    /// Data nodes in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<ParsedNode>,
}

/// A `notification` definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationDef {
    /// Notification name
    pub name: Arc<str>,
    /// `if-feature` expressions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_features: Vec<Arc<str>>,
    /// Status flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// `must` constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub musts: Vec<Restriction>,
    /// Local typedefs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typedefs: Vec<Typedef>,
    /// Local groupings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
    /// Data nodes in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<ParsedNode>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,
    /// Cross-reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Arc<str>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restriction_flags_computed() {
        let mut t = ParsedType {
            name: Arc::from("string"),
            ..Default::default()
        };
        assert!(t.restrictions().is_empty());

        t.length = Some(Restriction {
            arg: Arc::from("1..10"),
            ..Default::default()
        });
        t.patterns.push(Restriction {
            arg: Arc::from("[a-z]+"),
            ..Default::default()
        });
        assert_eq!(t.restrictions(), TypeFlags::LENGTH | TypeFlags::PATTERN);
    }

    #[test]
    fn test_latest_revision() {
        let module = ParsedModule {
            name: Arc::from("m"),
            revisions: vec![
                Revision {
                    date: Arc::from("2021-06-01"),
                    ..Default::default()
                },
                Revision {
                    date: Arc::from("2020-01-01"),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(module.latest_revision().map(|d| &**d), Some("2021-06-01"));
    }

    #[test]
    fn test_node_accessors() {
        let leaf = ParsedNode::Leaf(LeafNode {
            common: NodeCommon {
                name: Arc::from("mtu"),
                ..Default::default()
            },
            type_: ParsedType {
                name: Arc::from("uint16"),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(&**leaf.name(), "mtu");
        assert!(leaf.children().is_empty());
        assert!(leaf.typedefs().is_empty());
    }
}
