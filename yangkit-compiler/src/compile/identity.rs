//! Compilation of identities and their derivation links
//!
//! Identities compile in two steps: first every identity of the module
//! gets its compiled shell, then the `base` references are resolved and
//! each derived identity is appended to its bases' `derived` lists.
//! The deferred second step lets an identity derive from one declared
//! later in the same module.

use super::{feature, CompileCtx};
use yangkit_core::error::Result;
use yangkit_core::schema::compiled::{CompiledIdentity, CompiledModule, IdentityRef};
use yangkit_core::schema::parsed::IdentityDef;
use yangkit_core::schema::NodeFlags;

/// Compile the identities of a module, submodule identities included
pub(crate) fn compile_identities(
    cctx: &mut CompileCtx<'_>,
    mod_c: &mut CompiledModule,
) -> Result<()> {
    let mut specs: Vec<&IdentityDef> = cctx.parsed.identities.iter().collect();
    for inc in &cctx.parsed.includes {
        if let Some(sub) = &inc.submodule {
            specs.extend(sub.identities.iter());
        }
    }

    mod_c.identities = specs
        .iter()
        .map(|spec| CompiledIdentity {
            name: spec.name.clone(),
            flags: spec.flags & NodeFlags::STATUS_MASK,
            ..Default::default()
        })
        .collect();

    let mut compiled_exprs = Vec::with_capacity(specs.len());
    for spec in &specs {
        cctx.push_path(format!("{}:{}", cctx.parsed.name, spec.name));
        let result: Result<Vec<_>> = spec
            .if_features
            .iter()
            .map(|expr| feature::compile_iffeature(cctx, mod_c, expr))
            .collect();
        cctx.pop_path();
        compiled_exprs.push(result?);
    }
    for (idx, exprs) in compiled_exprs.into_iter().enumerate() {
        mod_c.identities[idx].if_features = exprs;
    }

    // derivation links can be resolved only now that every identity of
    // the module exists
    for (idx, spec) in specs.iter().enumerate() {
        let derived = IdentityRef {
            module: cctx.module,
            identity: idx,
        };
        for base in &spec.bases {
            let base_ref = resolve_identity(cctx, mod_c, base, &spec.name)?;
            cctx.backlinks.identity_derived.push((base_ref, derived));
        }
    }

    Ok(())
}

/// Resolve an optionally prefixed identity name
pub(crate) fn resolve_identity(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    name: &str,
    referencer: &str,
) -> Result<IdentityRef> {
    let (module, ident_name) = match name.split_once(':') {
        Some((prefix, rest)) => {
            let Some(target) = mod_c.find_prefix(prefix, cctx.module) else {
                let message = format!(
                    "Invalid prefix used for base ({name}) of identity \"{referencer}\"."
                );
                return Err(cctx.reference_err("identity-prefix", message));
            };
            (target, rest)
        }
        None => (cctx.module, name),
    };

    cctx.identities_of(mod_c, module)
        .and_then(|identities| identities.iter().position(|i| &*i.name == ident_name))
        .map(|identity| IdentityRef { module, identity })
        .ok_or_else(|| {
            let message =
                format!("Unable to find base ({name}) of identity \"{referencer}\".");
            cctx.reference_err("identity-base", message)
        })
}
