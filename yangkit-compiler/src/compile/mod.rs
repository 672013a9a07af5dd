//! Compilation of parsed modules into compiled modules
//!
//! Compilation is a single pass over one parsed module. Everything it
//! produces is assembled locally and only installed into the context
//! afterwards, so a failed compilation leaves the context untouched.
//! Links into other modules (feature dependents, derived identities)
//! are collected as [`Backlinks`] and applied by the context once the
//! new module is in place.

pub(crate) mod enums;
pub(crate) mod feature;
pub(crate) mod identity;
pub(crate) mod node;
pub(crate) mod range;
pub(crate) mod types;

use crate::context::Context;
use bitflags::bitflags;
use std::collections::HashMap;
use std::sync::Arc;
use yangkit_core::error::{Diagnostic, Result, YangError};
use yangkit_core::schema::compiled::{
    CompiledExtInstance, CompiledImport, CompiledModule, CompiledMust, CompiledType, CompiledWhen,
    IdentityRef,
};
use yangkit_core::schema::iffeature::FeatureRef;
use yangkit_core::schema::parsed::{
    ExtensionInstance, ParsedModule, Restriction, Typedef, When,
};
use yangkit_core::schema::{ModuleId, NodeFlags};
use yangkit_core::xpath::XPathExpr;

bitflags! {
    /// Options of a single compile call
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct CompileOptions: u8 {
        /// Release the parsed tree once compilation succeeds
        const FREE_PARSED = 0x01;
    }
}

/// Cross-module link insertions collected during one compilation
#[derive(Debug, Default)]
pub(crate) struct Backlinks {
    /// `(referenced feature, referencing feature)` dependent links
    pub feature_dependents: Vec<(FeatureRef, FeatureRef)>,
    /// `(base identity, derived identity)` links
    pub identity_derived: Vec<(IdentityRef, IdentityRef)>,
}

/// State of one compile call
pub(crate) struct CompileCtx<'a> {
    /// The owning context, read-only during compilation
    pub ctx: &'a Context,
    /// Handle of the module being compiled
    pub module: ModuleId,
    /// Its parsed tree
    pub parsed: &'a ParsedModule,
    /// Compile options
    pub options: CompileOptions,
    /// Typedef visibility, innermost scope last; level 0 holds the
    /// module-level typedefs of the module and its submodules
    pub tpdf_scopes: Vec<Vec<&'a Typedef>>,
    /// Compiled types memoized per module-level typedef
    pub memo: HashMap<(ModuleId, Arc<str>), Arc<CompiledType>>,
    /// Link insertions to apply after the module is installed
    pub backlinks: Backlinks,
    /// Diagnostics produced so far, failed attempts included
    pub diags: Vec<Diagnostic>,
    path: Vec<String>,
}

impl<'a> CompileCtx<'a> {
    pub(crate) fn new(
        ctx: &'a Context,
        module: ModuleId,
        parsed: &'a ParsedModule,
        options: CompileOptions,
    ) -> Self {
        let mut module_scope: Vec<&'a Typedef> = parsed.typedefs.iter().collect();
        for inc in &parsed.includes {
            if let Some(sub) = &inc.submodule {
                module_scope.extend(sub.typedefs.iter());
            }
        }
        Self {
            ctx,
            module,
            parsed,
            options,
            tpdf_scopes: vec![module_scope],
            memo: HashMap::new(),
            backlinks: Backlinks::default(),
            diags: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Enter a schema path segment
    pub fn push_path(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    /// Leave the innermost schema path segment
    pub fn pop_path(&mut self) {
        self.path.pop();
    }

    /// The current schema path, `/mod:container/leaf` style
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            format!("/{}", self.parsed.name)
        } else {
            format!("/{}", self.path.join("/"))
        }
    }

    /// Record a diagnostic at the current schema path
    pub fn diag(&mut self, code: &'static str, message: impl Into<String>) {
        self.diags
            .push(Diagnostic::new(self.path_string(), code, message));
    }

    /// Record a diagnostic and build the matching syntax error
    pub fn syntax_err(&mut self, code: &'static str, message: impl Into<String>) -> YangError {
        let message = message.into();
        self.diag(code, message.clone());
        YangError::syntax_at(message, self.path_string())
    }

    /// Record a diagnostic and build the matching semantic error
    pub fn semantic_err(&mut self, code: &'static str, message: impl Into<String>) -> YangError {
        let message = message.into();
        self.diag(code, message.clone());
        YangError::semantic_at(message, self.path_string())
    }

    /// Record a diagnostic and build the matching reference error
    pub fn reference_err(&mut self, code: &'static str, message: impl Into<String>) -> YangError {
        let message = message.into();
        self.diag(code, message.clone());
        YangError::reference_at(message, self.path_string())
    }

    /// Find a memoized compiled type of a module-level typedef
    pub fn memoized(&self, module: ModuleId, name: &str) -> Option<Arc<CompiledType>> {
        self.memo
            .get(&(module, Arc::from(name)))
            .or_else(|| self.ctx.cached_typedef(module, name))
            .cloned()
    }

    /// The compiled features of a module; `mod_c` stands in for the
    /// module currently being compiled
    pub fn features_of<'m>(
        &'m self,
        mod_c: &'m CompiledModule,
        id: ModuleId,
    ) -> Option<&'m [yangkit_core::schema::compiled::CompiledFeature]> {
        if id == self.module {
            Some(&mod_c.features)
        } else {
            self.ctx
                .module(id)
                .compiled()
                .map(|c| c.features.as_slice())
        }
    }

    /// The compiled identities of a module; `mod_c` stands in for the
    /// module currently being compiled
    pub fn identities_of<'m>(
        &'m self,
        mod_c: &'m CompiledModule,
        id: ModuleId,
    ) -> Option<&'m [yangkit_core::schema::compiled::CompiledIdentity]> {
        if id == self.module {
            Some(&mod_c.identities)
        } else {
            self.ctx
                .module(id)
                .compiled()
                .map(|c| c.identities.as_slice())
        }
    }

    /// Resolve an import prefix of an arbitrary module through its
    /// parsed tree; the module's own prefix resolves to itself
    pub fn resolve_prefix_parsed(&self, id: ModuleId, prefix: &str) -> Option<ModuleId> {
        let parsed = if id == self.module {
            self.parsed
        } else {
            self.ctx.module(id).parsed()?
        };
        if parsed.prefix.as_deref() == Some(prefix) {
            return Some(id);
        }
        parsed
            .imports
            .iter()
            .find(|imp| &*imp.prefix == prefix)
            .and_then(|imp| imp.module)
    }
}

/// Compile a whole module; the entry point used by the context
pub(crate) fn compile_module(cctx: &mut CompileCtx<'_>) -> Result<CompiledModule> {
    let sp = cctx.parsed;

    let mut mod_c = CompiledModule {
        name: sp.name.clone(),
        namespace: sp.namespace.clone(),
        prefix: sp.prefix.clone(),
        revision: sp.revisions.first().map(|rev| rev.date.clone()),
        version: sp.version,
        ..Default::default()
    };

    for imp in &sp.imports {
        let Some(target) = imp.module else {
            return Err(YangError::internal(format!(
                "import of \"{}\" was not resolved before compilation",
                imp.name
            )));
        };
        mod_c.imports.push(CompiledImport {
            prefix: imp.prefix.clone(),
            module: target,
        });
    }

    feature::compile_features(cctx, &mut mod_c)?;
    identity::compile_identities(cctx, &mut mod_c)?;

    let mut data = Vec::with_capacity(sp.data.len());
    for node_p in &sp.data {
        node::compile_node(cctx, &mod_c, node_p, None, &mut data)?;
    }
    mod_c.data = data;

    mod_c.exts = compile_ext_instances(cctx, &mod_c, &sp.exts)?;

    Ok(mod_c)
}

/// Compile the extension instances of one statement
pub(crate) fn compile_ext_instances(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    exts: &[ExtensionInstance],
) -> Result<Vec<CompiledExtInstance>> {
    exts.iter()
        .map(|ext| compile_ext(cctx, mod_c, ext))
        .collect()
}

/// Resolve one extension instance against its defining module.
///
/// Plugins interpreting the instances are not supported; resolution
/// stops at locating the definition.
fn compile_ext(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    ext: &ExtensionInstance,
) -> Result<CompiledExtInstance> {
    let Some((prefix, name)) = ext.name.split_once(':') else {
        let message = format!(
            "Missing prefix in extension instance identifier \"{}\".",
            ext.name
        );
        return Err(cctx.reference_err("ext-prefix", message));
    };

    let Some(def_module) = mod_c
        .find_prefix(prefix, cctx.module)
        .or_else(|| cctx.resolve_prefix_parsed(cctx.module, prefix))
    else {
        let message = format!(
            "Invalid prefix \"{prefix}\" used for extension instance identifier."
        );
        return Err(cctx.reference_err("ext-prefix", message));
    };

    let def_parsed = if def_module == cctx.module {
        Some(cctx.parsed)
    } else {
        cctx.ctx.module(def_module).parsed()
    };
    let found = def_parsed
        .map(|parsed| parsed.extensions.iter().any(|def| &*def.name == name))
        .unwrap_or(false);
    if !found {
        let message = format!(
            "Extension definition of extension instance \"{}\" not found.",
            ext.name
        );
        return Err(cctx.reference_err("ext-def", message));
    }

    Ok(CompiledExtInstance {
        name: ext.name.clone(),
        argument: ext.argument.clone(),
        def_module,
    })
}

/// Compile a `when` condition
pub(crate) fn compile_when(cctx: &mut CompileCtx<'_>, when: &When) -> Result<CompiledWhen> {
    let condition = XPathExpr::parse(&when.condition).map_err(|err| {
        cctx.diag("when-cond", err.to_string());
        err
    })?;
    Ok(CompiledWhen { condition })
}

/// Compile the `must` constraints of one statement
pub(crate) fn compile_musts(
    cctx: &mut CompileCtx<'_>,
    musts: &[Restriction],
) -> Result<Vec<CompiledMust>> {
    musts
        .iter()
        .map(|must| {
            let condition = XPathExpr::parse(&must.arg).map_err(|err| {
                cctx.diag("must-cond", err.to_string());
                err
            })?;
            Ok(CompiledMust {
                condition,
                error_message: must.error_message.clone(),
                error_app_tag: must.error_app_tag.clone(),
            })
        })
        .collect()
}

/// Enforce status compatibility between a referencing and a referenced
/// definition: `current` may not reference `deprecated` or `obsolete`,
/// `deprecated` may not reference `obsolete`.
pub(crate) fn check_status(
    cctx: &mut CompileCtx<'_>,
    referencer_flags: NodeFlags,
    referencer_name: &str,
    referenced_flags: NodeFlags,
    referenced_name: &str,
) -> Result<()> {
    let from = referencer_flags.status();
    let to = referenced_flags.status();
    if to > from {
        let message = format!(
            "A \"{from}\" definition \"{referencer_name}\" is not allowed to reference \
             \"{to}\" definition \"{referenced_name}\"."
        );
        return Err(cctx.semantic_err("status-ref", message));
    }
    Ok(())
}
