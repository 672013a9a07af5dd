//! The compiled schema tree: linked, restriction-merged, immutable
//!
//! A compiled module is produced from a parsed module in one pass and
//! never mutated afterwards, with one exception: the `ENABLED` bit of
//! feature flags, which the context flips through its feature API.
//! Cross-module links (imports, feature dependents, derived
//! identities) are `(module, index)` references into the owning
//! context rather than pointers, and child nodes are owned by their
//! parent in source order.

use super::iffeature::{FeatureRef, IfFeatureExpr};
use super::{BaseType, ModuleId, NodeFlags, YangVersion};
use crate::xpath::XPathExpr;
use regex::Regex;
use std::sync::Arc;

/// A compiled module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledModule {
    /// Module name
    pub name: Arc<str>,
    /// Module namespace
    pub namespace: Option<Arc<str>>,
    /// Module prefix
    pub prefix: Option<Arc<str>>,
    /// Newest revision date at compile time
    pub revision: Option<Arc<str>>,
    /// YANG language version
    pub version: YangVersion,
    /// Resolved imports
    pub imports: Vec<CompiledImport>,
    /// Compiled features
    pub features: Vec<CompiledFeature>,
    /// Compiled identities
    pub identities: Vec<CompiledIdentity>,
    /// Top-level data nodes in source order
    pub data: Vec<CompiledNode>,
    /// Extension instances attached to the module
    pub exts: Vec<CompiledExtInstance>,
}

impl CompiledModule {
    /// Find the module a prefix resolves to; the module's own prefix
    /// resolves to `self_id`
    #[must_use]
    pub fn find_prefix(&self, prefix: &str, self_id: ModuleId) -> Option<ModuleId> {
        if self.prefix.as_deref() == Some(prefix) {
            return Some(self_id);
        }
        self.imports
            .iter()
            .find(|imp| &*imp.prefix == prefix)
            .map(|imp| imp.module)
    }

    /// Index of a feature by name
    #[must_use]
    pub fn find_feature(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| &*f.name == name)
    }

    /// Index of an identity by name
    #[must_use]
    pub fn find_identity(&self, name: &str) -> Option<usize> {
        self.identities.iter().position(|i| &*i.name == name)
    }
}

/// A resolved `import`
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledImport {
    /// Prefix used for the imported module
    pub prefix: Arc<str>,
    /// The imported module's handle
    pub module: ModuleId,
}

/// A compiled feature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFeature {
    /// Feature name
    pub name: Arc<str>,
    /// Status flags plus the `ENABLED` bit
    pub flags: NodeFlags,
    /// Compiled `if-feature` expressions, all of which must hold for
    /// the feature to be enabled
    pub if_features: Vec<IfFeatureExpr>,
    /// Features whose `if-feature` expressions reference this one
    pub dependents: Vec<FeatureRef>,
}

impl CompiledFeature {
    /// Whether the feature is currently enabled
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.flags.contains(NodeFlags::ENABLED)
    }
}

/// Reference to a compiled identity inside a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRef {
    /// Module the identity belongs to
    pub module: ModuleId,
    /// Index into that module's compiled identity array
    pub identity: usize,
}

/// A compiled identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledIdentity {
    /// Identity name
    pub name: Arc<str>,
    /// Status flags
    pub flags: NodeFlags,
    /// Compiled `if-feature` expressions guarding the identity
    pub if_features: Vec<IfFeatureExpr>,
    /// Identities directly derived from this one, appended in the
    /// order they were compiled
    pub derived: Vec<IdentityRef>,
}

/// A compiled extension instance
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExtInstance {
    /// Prefixed extension name
    pub name: Arc<str>,
    /// Argument value
    pub argument: Option<Arc<str>>,
    /// Module holding the extension definition
    pub def_module: ModuleId,
}

/// A compiled `when` condition
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWhen {
    /// The parsed XPath condition
    pub condition: XPathExpr,
}

/// A compiled `must` constraint
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMust {
    /// The parsed XPath condition
    pub condition: XPathExpr,
    /// `error-message`
    pub error_message: Option<Arc<str>>,
    /// `error-app-tag`
    pub error_app_tag: Option<Arc<str>>,
}

/// Statement parts shared by every compiled node kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledNodeCommon {
    /// Node name
    pub name: Arc<str>,
    /// Effective flags after config/status inheritance
    pub flags: NodeFlags,
    /// Module the node was defined in
    pub module: ModuleId,
    /// Compiled `when` condition
    pub when: Option<CompiledWhen>,
    /// Compiled `if-feature` expressions
    pub if_features: Vec<IfFeatureExpr>,
}

/// A compiled data-tree node
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledNode {
    /// `container`
    Container(CompiledContainer),
    /// `leaf`
    Leaf(CompiledLeaf),
    /// `leaf-list`
    LeafList(CompiledLeafList),
    /// `list`
    List(CompiledList),
    /// `choice`
    Choice(CompiledChoice),
    /// `case`
    Case(CompiledCase),
    /// `uses` shell; grouping expansion is not performed
    Uses(CompiledUses),
    /// `anyxml`
    AnyXml(CompiledAnyData),
    /// `anydata`
    AnyData(CompiledAnyData),
}

impl CompiledNode {
    /// The statement parts every node kind shares
    #[must_use]
    pub fn common(&self) -> &CompiledNodeCommon {
        match self {
            CompiledNode::Container(n) => &n.common,
            CompiledNode::Leaf(n) => &n.common,
            CompiledNode::LeafList(n) => &n.common,
            CompiledNode::List(n) => &n.common,
            CompiledNode::Choice(n) => &n.common,
            CompiledNode::Case(n) => &n.common,
            CompiledNode::Uses(n) => &n.common,
            CompiledNode::AnyXml(n) | CompiledNode::AnyData(n) => &n.common,
        }
    }

    /// Node name
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.common().name
    }

    /// Child nodes in source order, for the kinds that have them
    #[must_use]
    pub fn children(&self) -> &[CompiledNode] {
        match self {
            CompiledNode::Container(n) => &n.children,
            CompiledNode::List(n) => &n.children,
            CompiledNode::Choice(n) => &n.children,
            CompiledNode::Case(n) => &n.children,
            _ => &[],
        }
    }

    /// Depth-first iterator over this node and every descendant
    pub fn descendants(&self) -> impl Iterator<Item = &CompiledNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }
}

/// A compiled `container`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledContainer {
    /// Shared statement parts
    pub common: CompiledNodeCommon,
    /// Compiled `must` constraints
    pub musts: Vec<CompiledMust>,
    /// Presence statement argument; `None` for non-presence containers
    pub presence: Option<Arc<str>>,
    /// Child nodes in source order
    pub children: Vec<CompiledNode>,
}

/// A compiled `leaf`
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLeaf {
    /// Shared statement parts
    pub common: CompiledNodeCommon,
    /// Compiled `must` constraints
    pub musts: Vec<CompiledMust>,
    /// The leaf's compiled type, shared along the typedef chain
    pub type_: Arc<CompiledType>,
    /// Units of the value
    pub units: Option<Arc<str>>,
    /// Default value
    pub default: Option<Arc<str>>,
}

/// A compiled `leaf-list`
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLeafList {
    /// Shared statement parts
    pub common: CompiledNodeCommon,
    /// Compiled `must` constraints
    pub musts: Vec<CompiledMust>,
    /// The entry type, shared along the typedef chain
    pub type_: Arc<CompiledType>,
    /// Units of the values
    pub units: Option<Arc<str>>,
    /// Default values
    pub defaults: Vec<Arc<str>>,
    /// `min-elements`
    pub min_elements: Option<u32>,
    /// `max-elements`
    pub max_elements: Option<u32>,
}

/// A compiled `list`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledList {
    /// Shared statement parts
    pub common: CompiledNodeCommon,
    /// Compiled `must` constraints
    pub musts: Vec<CompiledMust>,
    /// Key leaf names in declaration order
    pub keys: Vec<Arc<str>>,
    /// Child nodes in source order
    pub children: Vec<CompiledNode>,
    /// `unique` arguments
    pub uniques: Vec<Arc<str>>,
    /// `min-elements`
    pub min_elements: Option<u32>,
    /// `max-elements`
    pub max_elements: Option<u32>,
}

/// A compiled `choice`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledChoice {
    /// Shared statement parts
    pub common: CompiledNodeCommon,
    /// Cases in source order
    pub children: Vec<CompiledNode>,
    /// Name of the default case
    pub default: Option<Arc<str>>,
}

/// A compiled `case`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledCase {
    /// Shared statement parts
    pub common: CompiledNodeCommon,
    /// Child nodes in source order
    pub children: Vec<CompiledNode>,
}

/// A compiled `uses` shell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledUses {
    /// Shared statement parts; the name is the referenced grouping
    pub common: CompiledNodeCommon,
}

/// A compiled `anyxml` or `anydata`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledAnyData {
    /// Shared statement parts
    pub common: CompiledNodeCommon,
    /// Compiled `must` constraints
    pub musts: Vec<CompiledMust>,
}

/// One `[min, max]` interval of a range or length constraint.
///
/// Bounds are widened to `i128` so a single comparison path covers
/// signed, unsigned and decimal64-scaled domains; the owning type's
/// signedness governs parsing and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePart {
    /// Lower bound, inclusive
    pub min: i128,
    /// Upper bound, inclusive
    pub max: i128,
}

/// A compiled `range` or `length` constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    /// Intervals in ascending order, pairwise disjoint
    pub parts: Vec<RangePart>,
    /// `error-message`
    pub error_message: Option<Arc<str>>,
    /// `error-app-tag`
    pub error_app_tag: Option<Arc<str>>,
}

impl Range {
    /// Whether a value lies in one of the parts
    #[must_use]
    pub fn contains(&self, value: i128) -> bool {
        self.parts.iter().any(|p| p.min <= value && value <= p.max)
    }
}

/// A compiled, shared pattern
#[derive(Debug)]
pub struct CompiledPattern {
    /// The rewritten pattern source handed to the regex backend,
    /// without the leading start anchor
    pub source: String,
    /// The compiled regular expression
    pub regex: Regex,
    /// Match semantics are inverted (`invert-match`)
    pub inverted: bool,
    /// `error-message`
    pub error_message: Option<Arc<str>>,
    /// `error-app-tag`
    pub error_app_tag: Option<Arc<str>>,
}

impl CompiledPattern {
    /// Whether a value satisfies the pattern, honouring inversion
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value) != self.inverted
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.inverted == other.inverted
            && self.error_message == other.error_message
            && self.error_app_tag == other.error_app_tag
    }
}

/// One compiled `enum` item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumItem {
    /// Item name
    pub name: Arc<str>,
    /// Assigned value
    pub value: i32,
    /// Compiled `if-feature` expressions guarding the item
    pub if_features: Vec<IfFeatureExpr>,
}

/// One compiled `bit` item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BitItem {
    /// Item name
    pub name: Arc<str>,
    /// Assigned position
    pub position: u32,
    /// Compiled `if-feature` expressions guarding the item
    pub if_features: Vec<IfFeatureExpr>,
}

/// The immutable result of collapsing a typedef chain.
///
/// Shared by `Arc` between the leaves and typedef chain slots that
/// reference it; a derivation step that adds no restriction aliases
/// the deeper type instead of allocating.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledType {
    /// `boolean`
    Boolean,
    /// `empty`
    Empty,
    /// `binary` with an optional length constraint
    Binary {
        /// Octet-count constraint
        length: Option<Range>,
    },
    /// One of the eight integer types with an optional range
    Number {
        /// The concrete integer type
        basetype: BaseType,
        /// Value constraint
        range: Option<Range>,
    },
    /// `decimal64`
    Decimal64 {
        /// Number of fraction digits; fixed for the whole chain
        fraction_digits: u8,
        /// Value constraint, scaled by `10^fraction_digits`
        range: Option<Range>,
    },
    /// `string`
    String {
        /// Character-count constraint
        length: Option<Range>,
        /// Patterns the value must satisfy, inherited ones first
        patterns: Vec<Arc<CompiledPattern>>,
    },
    /// `enumeration`
    Enumeration {
        /// Items in source order
        enums: Vec<EnumItem>,
    },
    /// `bits`
    Bits {
        /// Items sorted ascending by position
        bits: Vec<BitItem>,
    },
    /// `identityref`
    IdentityRef {
        /// Resolved base identities
        bases: Vec<IdentityRef>,
    },
    /// `instance-identifier`
    InstanceIdentifier {
        /// `require-instance`
        require_instance: bool,
    },
    /// `leafref`
    LeafRef {
        /// The target path
        path: XPathExpr,
        /// `require-instance`
        require_instance: bool,
    },
    /// `union`
    Union {
        /// Member types in source order
        types: Vec<Arc<CompiledType>>,
    },
}

impl CompiledType {
    /// The built-in type at the root of this type's chain
    #[must_use]
    pub fn basetype(&self) -> BaseType {
        match self {
            CompiledType::Boolean => BaseType::Boolean,
            CompiledType::Empty => BaseType::Empty,
            CompiledType::Binary { .. } => BaseType::Binary,
            CompiledType::Number { basetype, .. } => *basetype,
            CompiledType::Decimal64 { .. } => BaseType::Decimal64,
            CompiledType::String { .. } => BaseType::String,
            CompiledType::Enumeration { .. } => BaseType::Enumeration,
            CompiledType::Bits { .. } => BaseType::Bits,
            CompiledType::IdentityRef { .. } => BaseType::IdentityRef,
            CompiledType::InstanceIdentifier { .. } => BaseType::InstanceIdentifier,
            CompiledType::LeafRef { .. } => BaseType::LeafRef,
            CompiledType::Union { .. } => BaseType::Union,
        }
    }

    /// The range or length constraint, for the kinds that carry one
    #[must_use]
    pub fn range(&self) -> Option<&Range> {
        match self {
            CompiledType::Binary { length } | CompiledType::String { length, .. } => {
                length.as_ref()
            }
            CompiledType::Number { range, .. } | CompiledType::Decimal64 { range, .. } => {
                range.as_ref()
            }
            _ => None,
        }
    }
}
