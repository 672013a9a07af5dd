//! Merging of `enum` and `bit` item sets along a typedef chain
//!
//! A derived enumeration or bits type may only restrict the base set:
//! every derived item must exist in the base by name and keep the
//! value or position assigned there. Values left implicit are
//! inherited from the base, or auto-assigned as the successor of the
//! highest value seen so far when there is no base.

use super::{feature, CompileCtx};
use yangkit_core::error::Result;
use yangkit_core::schema::compiled::{BitItem, CompiledModule, EnumItem};
use yangkit_core::schema::iffeature::IfFeatureExpr;
use yangkit_core::schema::parsed::EnumSpec;

/// Compile the enum items of one derivation step
pub(crate) fn compile_enum_items(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    specs: &[EnumSpec],
    base: Option<&[EnumItem]>,
) -> Result<Vec<EnumItem>> {
    let mut items: Vec<EnumItem> = Vec::with_capacity(specs.len());
    // next value to auto-assign, one past the highest value seen
    let mut next_value: i64 = 0;

    for (u, spec) in specs.iter().enumerate() {
        let base_match = match base {
            Some(base_items) => {
                let Some(idx) = base_items.iter().position(|b| b.name == spec.name) else {
                    let message = format!(
                        "Invalid enumeration - derived type adds new item \"{}\".",
                        spec.name
                    );
                    return Err(cctx.semantic_err("enum-subset", message));
                };
                Some(&base_items[idx])
            }
            None => None,
        };

        let value: i32 = match spec.value {
            Some(explicit) => {
                let Ok(value) = i32::try_from(explicit) else {
                    let message = format!(
                        "Invalid enumeration - value \"{explicit}\" of item \"{}\" does not fit int32.",
                        spec.name
                    );
                    return Err(cctx.syntax_err("enum-value", message));
                };
                if let Some(collision) = items.iter().find(|e| e.value == value) {
                    let message = format!(
                        "Invalid enumeration - value {value} collide in items \"{}\" and \"{}\".",
                        spec.name, collision.name
                    );
                    return Err(cctx.semantic_err("enum-dup", message));
                }
                value
            }
            None => match base_match {
                Some(base_item) => base_item.value,
                None => {
                    if u > 0 && next_value > i64::from(i32::MAX) {
                        let message = format!(
                            "Invalid enumeration - it is not possible to auto-assign enum value for \
                             \"{}\" since the highest value is already 2147483647.",
                            spec.name
                        );
                        return Err(cctx.semantic_err("enum-overflow", message));
                    }
                    next_value as i32
                }
            },
        };
        if u == 0 || i64::from(value) >= next_value {
            next_value = i64::from(value) + 1;
        }

        if let Some(base_item) = base_match {
            if value != base_item.value {
                let message = format!(
                    "Invalid enumeration - value of the item \"{}\" has changed from {} to {value} \
                     in the derived type.",
                    spec.name, base_item.value
                );
                return Err(cctx.semantic_err("enum-changed", message));
            }
        }

        items.push(EnumItem {
            name: spec.name.clone(),
            value,
            if_features: compile_item_iffeatures(cctx, mod_c, spec)?,
        });
    }

    Ok(items)
}

/// Compile the bit items of one derivation step; the result is sorted
/// ascending by position regardless of source order
pub(crate) fn compile_bit_items(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    specs: &[EnumSpec],
    base: Option<&[BitItem]>,
) -> Result<Vec<BitItem>> {
    let mut items: Vec<BitItem> = Vec::with_capacity(specs.len());
    // next position to auto-assign, one past the highest position seen
    let mut next_position: u64 = 0;

    for (u, spec) in specs.iter().enumerate() {
        let base_match = match base {
            Some(base_items) => {
                let Some(idx) = base_items.iter().position(|b| b.name == spec.name) else {
                    let message = format!(
                        "Invalid bits - derived type adds new item \"{}\".",
                        spec.name
                    );
                    return Err(cctx.semantic_err("bits-subset", message));
                };
                Some(&base_items[idx])
            }
            None => None,
        };

        let position: u32 = match spec.value {
            Some(explicit) => {
                let Ok(position) = u32::try_from(explicit) else {
                    let message = format!(
                        "Invalid bits - position \"{explicit}\" of item \"{}\" does not fit uint32.",
                        spec.name
                    );
                    return Err(cctx.syntax_err("bits-position", message));
                };
                if let Some(collision) = items.iter().find(|b| b.position == position) {
                    let message = format!(
                        "Invalid bits - position {position} collide in items \"{}\" and \"{}\".",
                        spec.name, collision.name
                    );
                    return Err(cctx.semantic_err("bits-dup", message));
                }
                position
            }
            None => match base_match {
                Some(base_item) => base_item.position,
                None => {
                    if u > 0 && next_position > u64::from(u32::MAX) {
                        let message = format!(
                            "Invalid bits - it is not possible to auto-assign bit position for \
                             \"{}\" since the highest position is already 4294967295.",
                            spec.name
                        );
                        return Err(cctx.semantic_err("bits-overflow", message));
                    }
                    next_position as u32
                }
            },
        };
        if u == 0 || u64::from(position) >= next_position {
            next_position = u64::from(position) + 1;
        }

        if let Some(base_item) = base_match {
            if position != base_item.position {
                let message = format!(
                    "Invalid bits - position of the item \"{}\" has changed from {} to {position} \
                     in the derived type.",
                    spec.name, base_item.position
                );
                return Err(cctx.semantic_err("bits-changed", message));
            }
        }

        items.push(BitItem {
            name: spec.name.clone(),
            position,
            if_features: compile_item_iffeatures(cctx, mod_c, spec)?,
        });
    }

    items.sort_by_key(|item| item.position);
    Ok(items)
}

fn compile_item_iffeatures(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    spec: &EnumSpec,
) -> Result<Vec<IfFeatureExpr>> {
    spec.if_features
        .iter()
        .map(|expr| feature::compile_iffeature(cctx, mod_c, expr))
        .collect()
}
