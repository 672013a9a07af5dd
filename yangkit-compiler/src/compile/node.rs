//! Compilation of data-tree nodes
//!
//! Nodes compile strictly in source order, children after their
//! parent's own statements, so sibling vectors preserve the source
//! layout. Config bits are inherited from the parent when unset;
//! status is not inherited by the language, but a child left unmarked
//! under a deprecated or obsolete parent takes the parent's status
//! with a warning, and an explicitly "fresher" status than the
//! parent's is rejected.

use super::{compile_musts, compile_when, feature, types, CompileCtx};
use tracing::warn;
use yangkit_core::error::Result;
use yangkit_core::schema::compiled::{
    CompiledAnyData, CompiledCase, CompiledChoice, CompiledContainer, CompiledLeaf,
    CompiledLeafList, CompiledList, CompiledModule, CompiledNode, CompiledNodeCommon,
    CompiledUses,
};
use yangkit_core::schema::parsed::{NodeCommon, ParsedNode};
use yangkit_core::schema::{NodeFlags, Status};

/// Compile one parsed node and append it to `siblings`
pub(crate) fn compile_node<'a>(
    cctx: &mut CompileCtx<'a>,
    mod_c: &CompiledModule,
    node_p: &'a ParsedNode,
    parent_flags: Option<NodeFlags>,
    siblings: &mut Vec<CompiledNode>,
) -> Result<()> {
    let common_p = node_p.common();

    let segment = if parent_flags.is_none() {
        format!("{}:{}", cctx.parsed.name, common_p.name)
    } else {
        common_p.name.to_string()
    };
    cctx.push_path(segment);
    let result = compile_node_inner(cctx, mod_c, node_p, parent_flags, siblings);
    cctx.pop_path();
    result
}

fn compile_node_inner<'a>(
    cctx: &mut CompileCtx<'a>,
    mod_c: &CompiledModule,
    node_p: &'a ParsedNode,
    parent_flags: Option<NodeFlags>,
    siblings: &mut Vec<CompiledNode>,
) -> Result<()> {
    let common_p = node_p.common();
    let flags = effective_flags(cctx, common_p, parent_flags)?;

    let mut common = CompiledNodeCommon {
        name: common_p.name.clone(),
        flags,
        module: cctx.module,
        when: None,
        if_features: Vec::with_capacity(common_p.if_features.len()),
    };
    if let Some(when) = &common_p.when {
        common.when = Some(compile_when(cctx, when)?);
    }
    for expr in &common_p.if_features {
        common
            .if_features
            .push(feature::compile_iffeature(cctx, mod_c, expr)?);
    }

    let node = match node_p {
        ParsedNode::Container(cont_p) => {
            let mut children = Vec::with_capacity(cont_p.children.len());
            cctx.tpdf_scopes.push(cont_p.typedefs.iter().collect());
            let result: Result<()> = cont_p
                .children
                .iter()
                .try_for_each(|child| compile_node(cctx, mod_c, child, Some(flags), &mut children));
            cctx.tpdf_scopes.pop();
            result?;

            CompiledNode::Container(CompiledContainer {
                common,
                musts: compile_musts(cctx, &cont_p.musts)?,
                presence: cont_p.presence.clone(),
                children,
            })
        }
        ParsedNode::Leaf(leaf_p) => {
            let type_ = types::compile_leaf_type(
                cctx,
                mod_c,
                &leaf_p.common.name,
                flags,
                &leaf_p.type_,
            )?;
            CompiledNode::Leaf(CompiledLeaf {
                common,
                musts: compile_musts(cctx, &leaf_p.musts)?,
                type_,
                units: leaf_p.units.clone(),
                default: leaf_p.default.clone(),
            })
        }
        ParsedNode::LeafList(ll_p) => {
            let type_ =
                types::compile_leaf_type(cctx, mod_c, &ll_p.common.name, flags, &ll_p.type_)?;
            CompiledNode::LeafList(CompiledLeafList {
                common,
                musts: compile_musts(cctx, &ll_p.musts)?,
                type_,
                units: ll_p.units.clone(),
                defaults: ll_p.defaults.clone(),
                min_elements: ll_p.min_elements,
                max_elements: ll_p.max_elements,
            })
        }
        ParsedNode::List(list_p) => {
            let mut children = Vec::with_capacity(list_p.children.len());
            cctx.tpdf_scopes.push(list_p.typedefs.iter().collect());
            let result: Result<()> = list_p
                .children
                .iter()
                .try_for_each(|child| compile_node(cctx, mod_c, child, Some(flags), &mut children));
            cctx.tpdf_scopes.pop();
            result?;

            let keys = list_p
                .key
                .as_deref()
                .map(|key| {
                    key.split_ascii_whitespace()
                        .map(|name| cctx.ctx.pool().intern(name))
                        .collect()
                })
                .unwrap_or_default();

            CompiledNode::List(CompiledList {
                common,
                musts: compile_musts(cctx, &list_p.musts)?,
                keys,
                children,
                uniques: list_p.uniques.clone(),
                min_elements: list_p.min_elements,
                max_elements: list_p.max_elements,
            })
        }
        ParsedNode::Choice(choice_p) => {
            let mut children = Vec::with_capacity(choice_p.children.len());
            for child in &choice_p.children {
                compile_node(cctx, mod_c, child, Some(flags), &mut children)?;
            }
            CompiledNode::Choice(CompiledChoice {
                common,
                children,
                default: choice_p.default.clone(),
            })
        }
        ParsedNode::Case(case_p) => {
            let mut children = Vec::with_capacity(case_p.children.len());
            for child in &case_p.children {
                compile_node(cctx, mod_c, child, Some(flags), &mut children)?;
            }
            CompiledNode::Case(CompiledCase { common, children })
        }
        ParsedNode::Uses(_) => CompiledNode::Uses(CompiledUses { common }),
        ParsedNode::AnyXml(any_p) => CompiledNode::AnyXml(CompiledAnyData {
            common,
            musts: compile_musts(cctx, &any_p.musts)?,
        }),
        ParsedNode::AnyData(any_p) => CompiledNode::AnyData(CompiledAnyData {
            common,
            musts: compile_musts(cctx, &any_p.musts)?,
        }),
    };

    siblings.push(node);
    Ok(())
}

/// Apply config and status inheritance to a node's flags
fn effective_flags(
    cctx: &mut CompileCtx<'_>,
    common_p: &NodeCommon,
    parent_flags: Option<NodeFlags>,
) -> Result<NodeFlags> {
    let mut flags = common_p.flags;

    if !flags.intersects(NodeFlags::CONFIG_MASK) {
        match parent_flags {
            Some(parent) => flags |= parent & NodeFlags::CONFIG_MASK,
            // top-level default is config true
            None => flags |= NodeFlags::CONFIG_W,
        }
    }

    let parent_status = parent_flags.map(NodeFlags::status);
    if !flags.has_explicit_status() {
        if let Some(status @ (Status::Deprecated | Status::Obsolete)) = parent_status {
            warn!(
                node = %common_p.name,
                status = %status,
                "missing explicit status that was already specified in parent, inheriting"
            );
            flags |= match status {
                Status::Deprecated => NodeFlags::STATUS_DEPRECATED,
                _ => NodeFlags::STATUS_OBSOLETE,
            };
        } else {
            flags |= NodeFlags::STATUS_CURRENT;
        }
    } else if let Some(parent_status) = parent_status {
        if parent_status > flags.status() {
            let message = format!(
                "A \"{}\" status is in conflict with the parent's \"{parent_status}\" status.",
                flags.status()
            );
            return Err(cctx.semantic_err("status-parent", message));
        }
    }

    Ok(flags)
}
