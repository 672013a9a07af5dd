//! Compilation of features and their `if-feature` expressions
//!
//! An `if-feature` argument is a boolean expression over feature names
//! with `not` binding tightest, then `and`, then `or`, and parentheses
//! overriding. Compilation makes two passes: a left-to-right
//! measurement pass that sizes the arrays and validates the syntax,
//! then a right-to-left emit pass that turns the expression into
//! postfix through an operator stack. Double `not` cancels out during
//! both passes.

use super::CompileCtx;
use yangkit_core::error::Result;
use yangkit_core::schema::compiled::{CompiledFeature, CompiledModule};
use yangkit_core::schema::iffeature::{FeatureRef, IfFeatureExpr, IfFeatureOp};
use yangkit_core::schema::parsed::FeatureDef;
use yangkit_core::schema::{NodeFlags, YangVersion};
use yangkit_core::YangError;

/// Operator-stack entries of the emit pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackOp {
    Not,
    And,
    Or,
    RParen,
}

impl StackOp {
    fn opcode(self) -> IfFeatureOp {
        match self {
            StackOp::Not => IfFeatureOp::Not,
            StackOp::And => IfFeatureOp::And,
            StackOp::Or => IfFeatureOp::Or,
            StackOp::RParen => unreachable!("parenthesis left on the operator stack"),
        }
    }
}

/// Compile the features of a module, submodule features included
pub(crate) fn compile_features(
    cctx: &mut CompileCtx<'_>,
    mod_c: &mut CompiledModule,
) -> Result<()> {
    let mut specs: Vec<&FeatureDef> = cctx.parsed.features.iter().collect();
    for inc in &cctx.parsed.includes {
        if let Some(sub) = &inc.submodule {
            specs.extend(sub.features.iter());
        }
    }

    mod_c.features = specs
        .iter()
        .map(|spec| CompiledFeature {
            name: spec.name.clone(),
            flags: spec.flags & NodeFlags::STATUS_MASK,
            ..Default::default()
        })
        .collect();

    // if-feature expressions may reference any feature of the module,
    // including ones declared later, so they are compiled only after
    // every shell exists
    let mut compiled_exprs = Vec::with_capacity(specs.len());
    for spec in &specs {
        cctx.push_path(format!("{}:{}", cctx.parsed.name, spec.name));
        let result: Result<Vec<IfFeatureExpr>> = spec
            .if_features
            .iter()
            .map(|expr| compile_iffeature(cctx, mod_c, expr))
            .collect();
        cctx.pop_path();
        compiled_exprs.push(result?);
    }

    for (idx, exprs) in compiled_exprs.into_iter().enumerate() {
        let dependent = FeatureRef {
            module: cctx.module,
            feature: idx,
        };
        for expr in &exprs {
            for fref in &expr.features {
                cctx.backlinks.feature_dependents.push((*fref, dependent));
            }
        }
        mod_c.features[idx].if_features = exprs;
    }

    Ok(())
}

/// Compile one textual `if-feature` expression into postfix form
pub(crate) fn compile_iffeature(
    cctx: &mut CompileCtx<'_>,
    mod_c: &CompiledModule,
    value: &str,
) -> Result<IfFeatureExpr> {
    let bytes = value.as_bytes();

    // measurement pass: array sizes plus syntax checks; the counters
    // are signed because double-not elimination dips below zero before
    // the next token corrects it
    let mut f_size = 0i64;
    let mut expr_size = 0i64;
    let mut f_exp = 1i64;
    let mut paren_depth = 0i32;
    let mut checkversion = false;
    let mut last_not = false;

    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                paren_depth += 1;
                checkversion = true;
                i += 1;
                continue;
            }
            b')' => {
                paren_depth -= 1;
                i += 1;
                continue;
            }
            c if c.is_ascii_whitespace() => {
                checkversion = true;
                i += 1;
                continue;
            }
            _ => {}
        }

        let op_len = operator_length(&bytes[i..]);
        if let Some(r) = op_len {
            match bytes.get(i + r) {
                None => {
                    let message = format!(
                        "Invalid value \"{value}\" of if-feature - unexpected end of expression."
                    );
                    return Err(cctx.syntax_err("if-feature-syntax", message));
                }
                Some(&next) if !next.is_ascii_whitespace() => {
                    // a feature name that merely starts with not/and/or
                    last_not = false;
                    f_size += 1;
                }
                _ => {
                    if bytes[i] == b'n' {
                        if last_not {
                            // double negation cancels out
                            expr_size -= 2;
                            last_not = false;
                        } else {
                            last_not = true;
                        }
                    } else {
                        f_exp += 1;
                        last_not = false;
                    }
                }
            }
            i += r;
        } else {
            f_size += 1;
            last_not = false;
        }
        expr_size += 1;

        // skip the rest of the token and the single separator after it
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b')' {
            i += 1;
        }
        if i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
    }

    if paren_depth != 0 || f_exp != f_size {
        let message = format!(
            "Invalid value \"{value}\" of if-feature - non-matching amount of operands and operators."
        );
        return Err(cctx.syntax_err("if-feature-syntax", message));
    }

    if (checkversion || expr_size > 1) && cctx.parsed.version != YangVersion::V1_1 {
        let message = format!(
            "Invalid value \"{value}\" of if-feature - YANG 1.1 expression in YANG 1.0 module."
        );
        return Err(cctx.syntax_err("if-feature-version", message));
    }
    if expr_size < 1 || f_size < 1 {
        let message = format!("Invalid value \"{value}\" of if-feature - empty expression.");
        return Err(cctx.syntax_err("if-feature-syntax", message));
    }
    let f_size = f_size as usize;
    let expr_size = expr_size as usize;

    // emit pass: right-to-left with an operator stack
    let mut expr = IfFeatureExpr::with_capacity(f_size, expr_size);
    let mut features: Vec<Option<FeatureRef>> = vec![None; f_size];
    let mut stack: Vec<StackOp> = Vec::with_capacity(expr_size);
    let mut next_slot = expr_size;
    let mut next_feat = f_size;

    let mut emit = |expr: &mut IfFeatureExpr, op: StackOp, next_slot: &mut usize| -> Result<()> {
        if *next_slot == 0 {
            return Err(YangError::internal(format!(
                "if-feature expression \"{value}\" processing error"
            )));
        }
        *next_slot -= 1;
        expr.set_op(op.opcode(), *next_slot);
        Ok(())
    };

    let mut i = bytes.len();
    while i > 0 {
        let c = bytes[i - 1];
        if c == b')' {
            stack.push(StackOp::RParen);
            i -= 1;
            continue;
        }
        if c == b'(' {
            while let Some(op) = stack.pop() {
                if op == StackOp::RParen {
                    break;
                }
                emit(&mut expr, op, &mut next_slot)?;
            }
            i -= 1;
            continue;
        }
        if c.is_ascii_whitespace() {
            i -= 1;
            continue;
        }

        // token end found, scan back to its beginning
        let end = i;
        while i > 0 && !bytes[i - 1].is_ascii_whitespace() && bytes[i - 1] != b'(' {
            i -= 1;
        }
        let start = i;
        let token = &value[start..end];

        if is_operator(bytes, start, "not") {
            if stack.last() == Some(&StackOp::Not) {
                stack.pop();
            } else {
                // highest precedence, nothing is popped first
                stack.push(StackOp::Not);
            }
        } else if is_operator(bytes, start, "and") {
            while matches!(stack.last(), Some(StackOp::Not | StackOp::And)) {
                let op = stack.pop().expect("stack top was just observed");
                emit(&mut expr, op, &mut next_slot)?;
            }
            stack.push(StackOp::And);
        } else if is_operator(bytes, start, "or") {
            while matches!(stack.last(), Some(StackOp::Not | StackOp::And | StackOp::Or)) {
                let op = stack.pop().expect("stack top was just observed");
                emit(&mut expr, op, &mut next_slot)?;
            }
            stack.push(StackOp::Or);
        } else {
            if next_slot == 0 {
                return Err(YangError::internal(format!(
                    "if-feature expression \"{value}\" processing error"
                )));
            }
            next_slot -= 1;
            expr.set_op(IfFeatureOp::Feature, next_slot);

            let Some(fref) = find_feature(cctx, mod_c, token) else {
                let message = format!(
                    "Invalid value \"{value}\" of if-feature - unable to find feature \"{token}\"."
                );
                return Err(cctx.reference_err("if-feature-ref", message));
            };
            if next_feat == 0 {
                return Err(YangError::internal(format!(
                    "if-feature expression \"{value}\" processing error"
                )));
            }
            next_feat -= 1;
            features[next_feat] = Some(fref);
        }
    }
    while let Some(op) = stack.pop() {
        emit(&mut expr, op, &mut next_slot)?;
    }

    if next_slot != 0 || next_feat != 0 {
        return Err(YangError::internal(format!(
            "if-feature expression \"{value}\" processing error"
        )));
    }

    expr.features = features
        .into_iter()
        .map(|f| f.expect("every feature slot was filled"))
        .collect();
    Ok(expr)
}

/// Length of the operator a byte slice starts with
fn operator_length(bytes: &[u8]) -> Option<usize> {
    if bytes.starts_with(b"not") || bytes.starts_with(b"and") {
        Some(3)
    } else if bytes.starts_with(b"or") {
        Some(2)
    } else {
        None
    }
}

/// Whether the token at `start` is the given operator followed by a
/// space; anything else is a feature name
fn is_operator(bytes: &[u8], start: usize, op: &str) -> bool {
    bytes[start..].starts_with(op.as_bytes())
        && bytes
            .get(start + op.len())
            .is_some_and(|c| c.is_ascii_whitespace())
}

/// Resolve a feature name, optionally prefixed, against the module
/// being compiled and its imports
pub(crate) fn find_feature(
    cctx: &CompileCtx<'_>,
    mod_c: &CompiledModule,
    name: &str,
) -> Option<FeatureRef> {
    let (module, feature_name) = match name.split_once(':') {
        Some((prefix, rest)) => (mod_c.find_prefix(prefix, cctx.module)?, rest),
        None => (cctx.module, name),
    };
    let features = cctx.features_of(mod_c, module)?;
    features
        .iter()
        .position(|f| &*f.name == feature_name)
        .map(|feature| FeatureRef { module, feature })
}
