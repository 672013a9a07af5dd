//! The type compiler: collapsing typedef chains into compiled types
//!
//! A leaf's type names either a built-in or a typedef, which in turn
//! derives from another typedef or a built-in. Compilation walks that
//! chain to its built-in root, then merges restrictions from the root
//! toward the leaf. A step that adds no restriction shares the deeper
//! compiled type instead of allocating; a step that does add one gets
//! a fresh compiled type whose base patterns are shared and whose
//! range parts are copied. Module-level typedefs are memoized so later
//! leaves reuse the collapsed result.

use super::{check_status, enums, identity, range, CompileCtx};
use crate::pattern;
use std::sync::Arc;
use yangkit_core::error::Result;
use yangkit_core::schema::compiled::{CompiledModule, CompiledType};
use yangkit_core::schema::parsed::{ParsedType, Typedef};
use yangkit_core::schema::{BaseType, ModuleId, NodeFlags};
use yangkit_core::xpath::XPathExpr;

/// Where a typedef reference resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypedefScope {
    /// A scope level of the module being compiled; 0 is module level
    Local(usize),
    /// The module level of another module
    Foreign(ModuleId),
}

/// One resolved link of a typedef chain
#[derive(Clone, Copy)]
struct ChainStep<'a> {
    tpdf: &'a Typedef,
    module: ModuleId,
    scope: TypedefScope,
}

impl ChainStep<'_> {
    fn is_module_level(&self) -> bool {
        matches!(self.scope, TypedefScope::Foreign(_) | TypedefScope::Local(0))
    }
}

/// Compile the type of a leaf or leaf-list
pub(crate) fn compile_leaf_type(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    leaf_name: &str,
    leaf_flags: NodeFlags,
    type_p: &ParsedType,
) -> Result<Arc<CompiledType>> {
    cctx.push_path("type");
    let scope = TypedefScope::Local(cctx.tpdf_scopes.len() - 1);
    let result = compile_type(cctx, mod_c, leaf_name, leaf_flags, type_p, scope);
    cctx.pop_path();
    result
}

/// Compile any type reference: walk the chain, then merge root-first
fn compile_type(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    referencer_name: &str,
    referencer_flags: NodeFlags,
    type_p: &ParsedType,
    scope: TypedefScope,
) -> Result<Arc<CompiledType>> {
    let mut chain: Vec<ChainStep<'_>> = Vec::new();
    let mut base: Option<Arc<CompiledType>> = None;
    let mut basetype = BaseType::Unknown;

    let mut cur_name: &str = &type_p.name;
    let mut cur_scope = scope;
    let mut ref_flags = referencer_flags;
    let mut ref_name = referencer_name.to_string();

    loop {
        if !cur_name.contains(':') {
            if let Some(found) = BaseType::from_name(cur_name) {
                basetype = found;
                break;
            }
        }
        let Some(step) = find_typedef(cctx, cur_name, cur_scope) else {
            let message = format!("Referenced type \"{cur_name}\" not found.");
            return Err(cctx.reference_err("type-ref", message));
        };
        let tpdf = step.tpdf;
        if chain.iter().any(|s| std::ptr::eq(s.tpdf, tpdf)) {
            let message = format!("Circular dependency of typedef \"{}\".", tpdf.name);
            return Err(cctx.reference_err("type-circular", message));
        }
        check_status(cctx, ref_flags, &ref_name, tpdf.flags, &tpdf.name)?;

        if step.is_module_level() {
            if let Some(cached) = cctx.memoized(step.module, &tpdf.name) {
                // the rest of the chain was collapsed earlier
                basetype = cached.basetype();
                base = Some(cached);
                break;
            }
        }

        ref_flags = tpdf.flags;
        ref_name = tpdf.name.to_string();
        cur_name = &tpdf.type_.name;
        cur_scope = step.scope;
        chain.push(step);
    }

    // every chain level and the referencing statement itself may only
    // carry substatements the base type accepts
    let allowed = basetype.allowed_restrictions();
    for step in &chain {
        let flags = step.tpdf.type_.restrictions();
        if !allowed.contains(flags) {
            let message = format!(
                "Invalid type \"{}\" restriction(s) for {basetype} type.",
                step.tpdf.name
            );
            return Err(cctx.semantic_err("type-restr", message));
        }
    }
    let leaf_flags_set = type_p.restrictions();
    if !allowed.contains(leaf_flags_set) {
        let message = format!("Invalid type restrictions for {basetype} type.");
        return Err(cctx.semantic_err("type-restr", message));
    }

    // merge from the built-in end toward the referencing statement
    for step in chain.iter().rev().copied() {
        let flags = step.tpdf.type_.restrictions();
        if flags.is_empty() && base.is_some() {
            let aliased = base.clone().expect("base was just checked");
            memoize(cctx, &step, aliased);
            continue;
        }
        let built = build_step(
            cctx,
            mod_c,
            basetype,
            &step.tpdf.type_,
            base.as_deref(),
            step.scope,
            Some(&*step.tpdf.name),
            step.tpdf.flags,
        )?;
        memoize(cctx, &step, built.clone());
        base = Some(built);
    }

    if !leaf_flags_set.is_empty() {
        build_step(
            cctx,
            mod_c,
            basetype,
            type_p,
            base.as_deref(),
            scope,
            None,
            referencer_flags,
        )
    } else if let Some(base) = base {
        // no restrictions on the referencing statement, share the base
        Ok(base)
    } else {
        // a bare built-in reference
        build_step(
            cctx, mod_c, basetype, type_p, None, scope, None, referencer_flags,
        )
    }
}

fn memoize(cctx: &mut CompileCtx<'_>, step: &ChainStep<'_>, compiled: Arc<CompiledType>) {
    if step.is_module_level() {
        cctx.memo
            .insert((step.module, step.tpdf.name.clone()), compiled);
    }
}

/// Resolve a typedef name from the given scope
fn find_typedef<'a>(
    cctx: &CompileCtx<'a>,
    name: &str,
    scope: TypedefScope,
) -> Option<ChainStep<'a>> {
    match name.split_once(':') {
        Some((prefix, base_name)) => {
            let from_module = match scope {
                TypedefScope::Local(_) => cctx.module,
                TypedefScope::Foreign(module) => module,
            };
            let target = cctx.resolve_prefix_parsed(from_module, prefix)?;
            find_module_level(cctx, target, base_name)
        }
        None => match scope {
            TypedefScope::Local(level) => {
                for level in (0..=level).rev() {
                    if let Some(tpdf) = cctx.tpdf_scopes[level]
                        .iter()
                        .copied()
                        .find(|t| &*t.name == name)
                    {
                        return Some(ChainStep {
                            tpdf,
                            module: cctx.module,
                            scope: TypedefScope::Local(level),
                        });
                    }
                }
                None
            }
            TypedefScope::Foreign(module) => find_module_level(cctx, module, name),
        },
    }
}

/// Search the module-level typedefs of a module, submodules included
fn find_module_level<'a>(
    cctx: &CompileCtx<'a>,
    module: ModuleId,
    name: &str,
) -> Option<ChainStep<'a>> {
    if module == cctx.module {
        return cctx.tpdf_scopes[0]
            .iter()
            .copied()
            .find(|t| &*t.name == name)
            .map(|tpdf| ChainStep {
                tpdf,
                module,
                scope: TypedefScope::Local(0),
            });
    }

    let ctx = cctx.ctx;
    let parsed = ctx.module(module).parsed()?;
    let mut candidates = parsed.typedefs.iter();
    let found = candidates.find(|t| &*t.name == name).or_else(|| {
        parsed.includes.iter().find_map(|inc| {
            inc.submodule
                .as_ref()
                .and_then(|sub| sub.typedefs.iter().find(|t| &*t.name == name))
        })
    })?;
    Some(ChainStep {
        tpdf: found,
        module,
        scope: TypedefScope::Foreign(module),
    })
}

/// Build the compiled type of one restriction-carrying derivation step
#[allow(clippy::too_many_arguments)]
fn build_step(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    basetype: BaseType,
    type_p: &ParsedType,
    base: Option<&CompiledType>,
    scope: TypedefScope,
    owner: Option<&str>,
    owner_flags: NodeFlags,
) -> Result<Arc<CompiledType>> {
    let built = match basetype {
        BaseType::Unknown => {
            return Err(yangkit_core::YangError::internal(
                "basetype left unresolved after chain discovery",
            ));
        }
        BaseType::Boolean => CompiledType::Boolean,
        BaseType::Empty => CompiledType::Empty,
        BaseType::Binary => CompiledType::Binary {
            length: compile_bound(cctx, type_p.length.as_ref(), basetype, 0, base)?,
        },
        BaseType::Int8
        | BaseType::Uint8
        | BaseType::Int16
        | BaseType::Uint16
        | BaseType::Int32
        | BaseType::Uint32
        | BaseType::Int64
        | BaseType::Uint64 => CompiledType::Number {
            basetype,
            range: compile_bound(cctx, type_p.range.as_ref(), basetype, 0, base)?,
        },
        BaseType::Decimal64 => {
            let base_digits = match base {
                Some(CompiledType::Decimal64 {
                    fraction_digits, ..
                }) => Some(*fraction_digits),
                _ => None,
            };
            let fraction_digits = match (base_digits, type_p.fraction_digits) {
                (Some(digits), 0) => digits,
                (Some(_), _) => {
                    let message =
                        "Invalid fraction-digits substatement - the value cannot be changed in \
                         the derived type.";
                    return Err(cctx.semantic_err("dec64-digits", message));
                }
                (None, 0) => {
                    let message = "Missing fraction-digits substatement for decimal64 type.";
                    return Err(cctx.semantic_err("dec64-digits", message));
                }
                (None, digits) => {
                    if digits > 18 {
                        let message = format!(
                            "Invalid fraction-digits value \"{digits}\" - only 1 to 18 are allowed."
                        );
                        return Err(cctx.syntax_err("dec64-digits", message));
                    }
                    digits
                }
            };
            CompiledType::Decimal64 {
                fraction_digits,
                range: compile_bound(cctx, type_p.range.as_ref(), basetype, fraction_digits, base)?,
            }
        }
        BaseType::String => {
            let (base_length, base_patterns) = match base {
                Some(CompiledType::String { length, patterns }) => {
                    (length.as_ref(), patterns.as_slice())
                }
                _ => (None, &[][..]),
            };
            let length = match &type_p.length {
                Some(restr) => {
                    cctx.push_path("length");
                    let merged = range::compile_range(cctx, restr, basetype, 0, base_length);
                    cctx.pop_path();
                    Some(merged?)
                }
                None => base_length.cloned(),
            };
            // inherited patterns stay shared, new ones are appended
            let mut patterns = base_patterns.to_vec();
            if !type_p.patterns.is_empty() {
                cctx.push_path("pattern");
                for restr in &type_p.patterns {
                    match pattern::compile_pattern(restr) {
                        Ok(compiled) => patterns.push(compiled),
                        Err(err) => {
                            cctx.diag("pattern-regex", err.to_string());
                            cctx.pop_path();
                            return Err(err);
                        }
                    }
                }
                cctx.pop_path();
            }
            CompiledType::String { length, patterns }
        }
        BaseType::Enumeration => {
            let base_enums = match base {
                Some(CompiledType::Enumeration { enums }) => Some(enums.as_slice()),
                _ => None,
            };
            if type_p.enums.is_empty() {
                match base_enums {
                    Some(enums) => CompiledType::Enumeration {
                        enums: enums.to_vec(),
                    },
                    None => {
                        let message = match owner {
                            Some(name) => format!(
                                "Missing enum substatement for enumeration type \"{name}\"."
                            ),
                            None => "Missing enum substatement for enumeration type.".to_string(),
                        };
                        return Err(cctx.semantic_err("enum-missing", message));
                    }
                }
            } else {
                CompiledType::Enumeration {
                    enums: enums::compile_enum_items(cctx, mod_c, &type_p.enums, base_enums)?,
                }
            }
        }
        BaseType::Bits => {
            let base_bits = match base {
                Some(CompiledType::Bits { bits }) => Some(bits.as_slice()),
                _ => None,
            };
            if type_p.bits.is_empty() {
                match base_bits {
                    Some(bits) => CompiledType::Bits {
                        bits: bits.to_vec(),
                    },
                    None => {
                        let message = match owner {
                            Some(name) => {
                                format!("Missing bit substatement for bits type \"{name}\".")
                            }
                            None => "Missing bit substatement for bits type.".to_string(),
                        };
                        return Err(cctx.semantic_err("bits-missing", message));
                    }
                }
            } else {
                CompiledType::Bits {
                    bits: enums::compile_bit_items(cctx, mod_c, &type_p.bits, base_bits)?,
                }
            }
        }
        BaseType::IdentityRef => {
            let base_bases = match base {
                Some(CompiledType::IdentityRef { bases }) => Some(bases),
                _ => None,
            };
            match (base_bases, type_p.bases.is_empty()) {
                (Some(bases), true) => CompiledType::IdentityRef {
                    bases: bases.clone(),
                },
                (Some(_), false) => {
                    let message =
                        "Invalid base substatement - the base cannot be modified in the derived \
                         type.";
                    return Err(cctx.semantic_err("identityref-base", message));
                }
                (None, true) => {
                    let message = "Missing base substatement for identityref type.";
                    return Err(cctx.semantic_err("identityref-base", message));
                }
                (None, false) => {
                    let referencer = owner.unwrap_or("leaf");
                    let bases = type_p
                        .bases
                        .iter()
                        .map(|name| identity::resolve_identity(cctx, mod_c, name, referencer))
                        .collect::<Result<Vec<_>>>()?;
                    CompiledType::IdentityRef { bases }
                }
            }
        }
        BaseType::InstanceIdentifier => {
            let inherited = match base {
                Some(CompiledType::InstanceIdentifier { require_instance }) => {
                    Some(*require_instance)
                }
                _ => None,
            };
            CompiledType::InstanceIdentifier {
                require_instance: type_p.require_instance.or(inherited).unwrap_or(true),
            }
        }
        BaseType::LeafRef => {
            let (base_path, base_require) = match base {
                Some(CompiledType::LeafRef {
                    path,
                    require_instance,
                }) => (Some(path), Some(*require_instance)),
                _ => (None, None),
            };
            let path = match (&type_p.path, base_path) {
                (Some(text), None) => XPathExpr::parse(text).map_err(|err| {
                    cctx.diag("leafref-path", err.to_string());
                    err
                })?,
                (None, Some(path)) => path.clone(),
                (Some(_), Some(_)) => {
                    let message =
                        "Invalid path substatement - the path cannot be modified in the derived \
                         type.";
                    return Err(cctx.semantic_err("leafref-path", message));
                }
                (None, None) => {
                    let message = "Missing path substatement for leafref type.";
                    return Err(cctx.semantic_err("leafref-path", message));
                }
            };
            CompiledType::LeafRef {
                path,
                require_instance: type_p.require_instance.or(base_require).unwrap_or(true),
            }
        }
        BaseType::Union => match base {
            Some(CompiledType::Union { types }) => {
                if type_p.types.is_empty() {
                    CompiledType::Union {
                        types: types.clone(),
                    }
                } else {
                    let message =
                        "Invalid type substatement - the member types cannot be modified in the \
                         derived type.";
                    return Err(cctx.semantic_err("union-types", message));
                }
            }
            _ => {
                if type_p.types.is_empty() {
                    let message = "Missing type substatement for union type.";
                    return Err(cctx.semantic_err("union-types", message));
                }
                let referencer = owner.unwrap_or("union").to_string();
                let mut members = Vec::with_capacity(type_p.types.len());
                for member in &type_p.types {
                    members.push(compile_type(
                        cctx,
                        mod_c,
                        &referencer,
                        owner_flags,
                        member,
                        scope,
                    )?);
                }
                CompiledType::Union { types: members }
            }
        },
    };

    Ok(Arc::new(built))
}

/// Merge a `range`/`length` restriction over the base's, or inherit
/// the base's as-is
fn compile_bound(
    cctx: &mut CompileCtx<'_>,
    restr: Option<&yangkit_core::schema::parsed::Restriction>,
    basetype: BaseType,
    fraction_digits: u8,
    base: Option<&CompiledType>,
) -> Result<Option<yangkit_core::schema::compiled::Range>> {
    let base_range = base.and_then(CompiledType::range);
    match restr {
        Some(restr) => {
            let segment = if basetype.uses_length() {
                "length"
            } else {
                "range"
            };
            cctx.push_path(segment);
            let merged = range::compile_range(cctx, restr, basetype, fraction_digits, base_range);
            cctx.pop_path();
            Ok(Some(merged?))
        }
        None => Ok(base_range.cloned()),
    }
}
