//! Parsing and derivation checking of `range` and `length` expressions
//!
//! An expression is a `|`-separated list of parts, each a single value
//! or a `lo .. hi` interval, with `min` and `max` standing for the
//! type's limits. Part boundaries must ascend strictly across the
//! whole expression. When the type derives from one that already has a
//! constraint, every derived part must lie inside some base part.
//!
//! All bounds are handled as `i128`; the base type governs parsing
//! limits, and decimal64 literals are scaled into their integral
//! representation by `fraction-digits`.

use super::CompileCtx;
use yangkit_core::error::Result;
use yangkit_core::schema::compiled::{Range, RangePart};
use yangkit_core::schema::parsed::Restriction;
use yangkit_core::schema::BaseType;

/// Compile one `range` or `length` restriction, checking it against
/// the constraint inherited from the base type
pub(crate) fn compile_range(
    cctx: &mut CompileCtx<'_>,
    restr: &Restriction,
    basetype: BaseType,
    fraction_digits: u8,
    base: Option<&Range>,
) -> Result<Range> {
    let kind = if basetype.uses_length() {
        "length"
    } else {
        "range"
    };

    let parts = parse_parts(cctx, &restr.arg, basetype, fraction_digits, kind)?;
    if let Some(base) = base {
        check_containment(cctx, &parts, base, kind, &restr.arg)?;
    }

    Ok(Range {
        parts,
        error_message: restr
            .error_message
            .clone()
            .or_else(|| base.and_then(|b| b.error_message.clone())),
        error_app_tag: restr
            .error_app_tag
            .clone()
            .or_else(|| base.and_then(|b| b.error_app_tag.clone())),
    })
}

fn parse_parts(
    cctx: &mut CompileCtx<'_>,
    arg: &str,
    basetype: BaseType,
    fraction_digits: u8,
    kind: &str,
) -> Result<Vec<RangePart>> {
    let min_bound = basetype.min_value();
    let max_bound = basetype.max_value();

    let mut parts: Vec<RangePart> = Vec::new();
    let mut parts_done = 0usize;
    let mut range_expected = false;
    let mut rest = arg;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            if range_expected {
                let message = format!(
                    "Invalid {kind} restriction - unexpected end of the expression after \"..\" ({arg})."
                );
                return Err(cctx.syntax_err("range-syntax", message));
            }
            if parts.is_empty() || parts_done == parts.len() {
                let message =
                    format!("Invalid {kind} restriction - unexpected end of the expression ({arg}).");
                return Err(cctx.syntax_err("range-syntax", message));
            }
            break;
        } else if let Some(after) = rest.strip_prefix("min") {
            if !parts.is_empty() {
                let consumed = &arg[..arg.len() - rest.len()];
                let message = format!(
                    "Invalid {kind} restriction - unexpected data before min keyword ({consumed})."
                );
                return Err(cctx.syntax_err("range-syntax", message));
            }
            rest = after;
            parts.push(RangePart {
                min: min_bound,
                max: min_bound,
            });
        } else if let Some(after) = rest.strip_prefix('|') {
            if parts.is_empty() || range_expected {
                let message = format!(
                    "Invalid {kind} restriction - unexpected beginning of the expression ({rest})."
                );
                return Err(cctx.syntax_err("range-syntax", message));
            }
            rest = after;
            parts_done += 1;
        } else if let Some(after) = rest.strip_prefix("..") {
            rest = after;
            if parts.is_empty() || parts.len() == parts_done {
                let message = format!(
                    "Invalid {kind} restriction - unexpected \"..\" without a lower bound."
                );
                return Err(cctx.syntax_err("range-syntax", message));
            }
            range_expected = true;
        } else if rest.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
            let (value, used) = scan_number(cctx, rest, basetype, fraction_digits, kind)?;
            if range_expected {
                let part = parts.last_mut().expect("a lower bound exists");
                check_ascending(cctx, value, part.min, kind, arg)?;
                part.max = value;
                range_expected = false;
            } else {
                if parts_done > 0 {
                    let prev = parts.last().expect("a finished part exists").max;
                    check_ascending(cctx, value, prev, kind, arg)?;
                }
                parts.push(RangePart {
                    min: value,
                    max: value,
                });
            }
            rest = &rest[used..];
        } else if let Some(after) = rest.strip_prefix("max") {
            rest = after.trim_start();
            if !rest.is_empty() {
                let message = format!(
                    "Invalid {kind} restriction - unexpected data after max keyword ({rest})."
                );
                return Err(cctx.syntax_err("range-syntax", message));
            }
            if range_expected {
                let part = parts.last_mut().expect("a lower bound exists");
                check_ascending(cctx, max_bound, part.min, kind, arg)?;
                part.max = max_bound;
                range_expected = false;
            } else {
                if parts_done > 0 {
                    let prev = parts.last().expect("a finished part exists").max;
                    check_ascending(cctx, max_bound, prev, kind, arg)?;
                }
                parts.push(RangePart {
                    min: max_bound,
                    max: max_bound,
                });
            }
        } else {
            let message = format!("Invalid {kind} restriction - unexpected data ({rest}).");
            return Err(cctx.syntax_err("range-syntax", message));
        }
    }

    Ok(parts)
}

/// Parse one numeric literal, returning the value and its byte length
fn scan_number(
    cctx: &mut CompileCtx<'_>,
    s: &str,
    basetype: BaseType,
    fraction_digits: u8,
    kind: &str,
) -> Result<(i128, usize)> {
    let bytes = s.as_bytes();
    let mut len = 0usize;
    if bytes[0] == b'+' || bytes[0] == b'-' {
        len = 1;
    }
    let digits_start = len;
    while len < bytes.len() && bytes[len].is_ascii_digit() {
        len += 1;
    }
    if len == digits_start {
        let message = format!("Invalid {kind} restriction - invalid value \"{s}\".");
        return Err(cctx.syntax_err("range-value", message));
    }

    // a decimal64 literal may carry a single decimal point
    let mut fraction = "";
    if basetype == BaseType::Decimal64
        && bytes.get(len) == Some(&b'.')
        && bytes.get(len + 1).is_some_and(u8::is_ascii_digit)
    {
        let start = len + 1;
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        fraction = &s[start..end];
        len = end;
    }

    let token = &s[..len];
    let integral = &s[..len - if fraction.is_empty() { 0 } else { fraction.len() + 1 }];
    let Ok(mut value) = integral.parse::<i128>() else {
        let message = format!("Invalid {kind} restriction - invalid value \"{token}\".");
        return Err(cctx.syntax_err("range-value", message));
    };

    if basetype == BaseType::Decimal64 {
        if fraction.len() > usize::from(fraction_digits) {
            let message = format!("Invalid {kind} restriction - invalid value \"{token}\".");
            return Err(cctx.syntax_err("range-value", message));
        }
        let fraction_value: i128 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().expect("fraction is all digits")
        };
        let scaled_fraction = fraction_value
            * 10i128.pow((usize::from(fraction_digits) - fraction.len()) as u32);
        value = match value
            .checked_mul(10i128.pow(u32::from(fraction_digits)))
            .and_then(|v| {
                v.checked_add(if bytes[0] == b'-' {
                    -scaled_fraction
                } else {
                    scaled_fraction
                })
            }) {
            Some(value) => value,
            None => {
                let message = format!(
                    "Invalid {kind} restriction - value \"{token}\" does not fit the type limitations."
                );
                return Err(cctx.syntax_err("range-limits", message));
            }
        };
    }

    if value < basetype.min_value() || value > basetype.max_value() {
        let message = format!(
            "Invalid {kind} restriction - value \"{token}\" does not fit the type limitations."
        );
        return Err(cctx.syntax_err("range-limits", message));
    }

    Ok((value, len))
}

fn check_ascending(
    cctx: &mut CompileCtx<'_>,
    value: i128,
    prev: i128,
    kind: &str,
    arg: &str,
) -> Result<()> {
    if value <= prev {
        let message =
            format!("Invalid {kind} restriction - values are not in ascending order ({arg}).");
        return Err(cctx.syntax_err("range-order", message));
    }
    Ok(())
}

/// Verify that every derived part lies within some base part.
///
/// Single values relax the rule in two directions: a derived single
/// value may coincide with a base single value, and a base single
/// value may be skipped by the derived set entirely.
fn check_containment(
    cctx: &mut CompileCtx<'_>,
    parts: &[RangePart],
    base: &Range,
    kind: &str,
    arg: &str,
) -> Result<()> {
    let base_parts = &base.parts;
    let mut u = 0usize;
    let mut v = 0usize;

    while u < parts.len() && v < base_parts.len() {
        let d = parts[u];
        let b = base_parts[v];

        if d.min < b.min {
            break;
        }
        if b.min == b.max {
            if b.min == d.min {
                if d.min != d.max {
                    // derived continues past the base single value
                    break;
                }
                u += 1;
                v += 1;
            } else {
                // the base single value is omitted from the derived set
                v += 1;
            }
        } else if d.min == d.max {
            if d.max > b.max {
                // behind this base part, try the next one
                v += 1;
            } else {
                u += 1;
            }
        } else if d.max > b.max {
            if d.min > b.max {
                // whole base part omitted
                v += 1;
            } else {
                // starts inside the base part but ends behind it
                break;
            }
        } else {
            u += 1;
        }
    }

    if u != parts.len() {
        let message = format!(
            "Invalid {kind} restriction - the derived restriction ({arg}) is not equally or more limiting."
        );
        return Err(cctx.semantic_err("range-narrowing", message));
    }
    Ok(())
}
