//! The source-parser interface and parser context
//!
//! Token-level parsing of YANG or YIN text is the job of a separate
//! front end. The compiler consumes it through the [`ModuleParser`]
//! trait: a registered parser turns source text into a [`ParsedModule`]
//! while sharing a [`ParserContext`] so submodules contribute to their
//! main module's typedef and grouping scope tables.

use std::path::Path;
use std::sync::Arc;
use yangkit_core::error::{Result, YangError};
use yangkit_core::schema::parsed::{Grouping, ParsedModule, ParsedNode, Revision, Typedef};
use yangkit_core::string_pool::StringPool;

/// Supported schema input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaFormat {
    /// YANG compact notation
    Yang,
    /// YIN, the XML form of YANG
    Yin,
}

impl SchemaFormat {
    /// Derive the format from a file path's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<SchemaFormat> {
        match path.extension()?.to_str()? {
            "yang" => Some(SchemaFormat::Yang),
            "yin" => Some(SchemaFormat::Yin),
            _ => None,
        }
    }
}

/// A pluggable source parser producing parsed module trees
pub trait ModuleParser {
    /// Parse one module or submodule out of `data`
    ///
    /// Strings must be interned through `pool`; `pctx` carries the
    /// line counter across nested parses.
    ///
    /// # Errors
    ///
    /// Returns a syntax error describing the first offending statement.
    fn parse(&self, pool: &StringPool, data: &str, pctx: &mut ParserContext)
        -> Result<ParsedModule>;
}

/// Placeholder parser for the YIN format
#[derive(Debug, Default)]
pub struct YinParser;

impl ModuleParser for YinParser {
    fn parse(
        &self,
        _pool: &StringPool,
        _data: &str,
        _pctx: &mut ParserContext,
    ) -> Result<ParsedModule> {
        Err(YangError::not_implemented("YIN input format"))
    }
}

/// A typedef or grouping name together with the scope defining it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedName {
    /// Scope path; empty for module level, `/a/b` for nested nodes
    pub scope: String,
    /// The defined name
    pub name: Arc<str>,
}

/// State shared between a main module's parse and its submodules'
///
/// The typedef and grouping tables accumulate across the main module
/// and every included submodule, so name collisions are detected over
/// the whole module set.
#[derive(Debug, Default)]
pub struct ParserContext {
    /// Current source line, maintained by the parser front end
    pub line: usize,
    /// Typedef names with their defining scopes
    pub typedef_names: Vec<ScopedName>,
    /// Grouping names with their defining scopes
    pub grouping_names: Vec<ScopedName>,
}

impl ParserContext {
    /// Create an empty parser context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module's typedef and grouping names to the scope tables
    pub fn collect(&mut self, module: &ParsedModule) {
        self.collect_typedefs("", &module.typedefs);
        self.collect_groupings("", &module.groupings);
        for node in &module.data {
            self.collect_node("", node);
        }
        for rpc in &module.rpcs {
            let scope = format!("/{}", rpc.name);
            self.collect_typedefs(&scope, &rpc.typedefs);
            self.collect_groupings(&scope, &rpc.groupings);
        }
        for notif in &module.notifications {
            let scope = format!("/{}", notif.name);
            self.collect_typedefs(&scope, &notif.typedefs);
            self.collect_groupings(&scope, &notif.groupings);
        }
    }

    fn collect_typedefs(&mut self, scope: &str, typedefs: &[Typedef]) {
        for tpdf in typedefs {
            self.typedef_names.push(ScopedName {
                scope: scope.to_string(),
                name: tpdf.name.clone(),
            });
        }
    }

    fn collect_groupings(&mut self, scope: &str, groupings: &[Grouping]) {
        for grp in groupings {
            self.grouping_names.push(ScopedName {
                scope: scope.to_string(),
                name: grp.name.clone(),
            });
            let inner = format!("{scope}/{}", grp.name);
            self.collect_typedefs(&inner, &grp.typedefs);
            self.collect_groupings(&inner, &grp.groupings);
            for node in &grp.data {
                self.collect_node(&inner, node);
            }
        }
    }

    fn collect_node(&mut self, scope: &str, node: &ParsedNode) {
        let inner = format!("{scope}/{}", node.name());
        self.collect_typedefs(&inner, node.typedefs());
        match node {
            ParsedNode::Container(n) => self.collect_groupings(&inner, &n.groupings),
            ParsedNode::List(n) => self.collect_groupings(&inner, &n.groupings),
            _ => {}
        }
        for child in node.children() {
            self.collect_node(&inner, child);
        }
    }

    /// Verify that typedef and grouping names are unique within their
    /// scope and do not shadow an enclosing scope
    ///
    /// # Errors
    ///
    /// Returns a semantic error naming the first colliding identifier.
    pub fn check_unique(&self) -> Result<()> {
        Self::check_set(&self.typedef_names, "typedef")?;
        Self::check_set(&self.grouping_names, "grouping")
    }

    fn check_set(names: &[ScopedName], what: &str) -> Result<()> {
        for (i, a) in names.iter().enumerate() {
            for b in &names[..i] {
                if a.name != b.name {
                    continue;
                }
                if a.scope == b.scope {
                    return Err(YangError::semantic(format!(
                        "Duplicate {what} name \"{}\" in the same scope.",
                        a.name
                    )));
                }
                if Self::encloses(&b.scope, &a.scope) || Self::encloses(&a.scope, &b.scope) {
                    return Err(YangError::semantic(format!(
                        "Name \"{}\" of {what} collides with a {what} of an enclosing scope.",
                        a.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn encloses(outer: &str, inner: &str) -> bool {
        outer.is_empty() || (inner.len() > outer.len() && inner.as_bytes()[outer.len()] == b'/' && inner.starts_with(outer))
    }
}

/// Sort a revision array descending, newest revision first
pub fn sort_revisions(revisions: &mut [Revision]) {
    revisions.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Validate a `YYYY-MM-DD` revision date string
///
/// # Errors
///
/// Returns a syntax error when the string is not a valid date.
pub fn check_date(date: &str) -> Result<()> {
    if date.len() != 10 || chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(YangError::syntax(format!(
            "Invalid value \"{date}\" of revision date."
        )));
    }
    Ok(())
}
