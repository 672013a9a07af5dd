//! Opaque holder for XPath conditions
//!
//! `when`/`must` conditions and leafref paths are XPath expressions.
//! Their evaluation belongs to a separate XPath engine; the schema
//! core only needs to keep the source around and reject text that no
//! engine could accept, so parsing here is limited to quote and
//! bracket well-formedness.

use crate::error::{Result, YangError};
use std::sync::Arc;

/// A syntactically screened XPath expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathExpr {
    source: Arc<str>,
}

impl XPathExpr {
    /// Screen and wrap an XPath expression
    ///
    /// # Errors
    ///
    /// Returns a syntax error for empty input, unterminated string
    /// literals, or unbalanced parentheses/brackets.
    pub fn parse(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(YangError::syntax("Empty XPath expression."));
        }

        let mut parens = 0i32;
        let mut brackets = 0i32;
        let mut quote: Option<char> = None;
        for c in source.chars() {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '\'' | '"' => quote = Some(c),
                    '(' => parens += 1,
                    ')' => parens -= 1,
                    '[' => brackets += 1,
                    ']' => brackets -= 1,
                    _ => {}
                },
            }
            if parens < 0 || brackets < 0 {
                break;
            }
        }

        if let Some(q) = quote {
            return Err(YangError::syntax(format!(
                "Unterminated {q}...{q} literal in XPath expression \"{source}\"."
            )));
        }
        if parens != 0 || brackets != 0 {
            return Err(YangError::syntax(format!(
                "Unbalanced parentheses in XPath expression \"{source}\"."
            )));
        }

        Ok(Self {
            source: Arc::from(source),
        })
    }

    /// The expression text
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for XPathExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_paths() {
        let expr = XPathExpr::parse("../config/enabled = 'true'").unwrap();
        assert_eq!(expr.source(), "../config/enabled = 'true'");

        XPathExpr::parse("/if:interfaces/if:interface[if:name = current()]/if:mtu").unwrap();
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(XPathExpr::parse("").is_err());
        assert!(XPathExpr::parse("   ").is_err());
        assert!(XPathExpr::parse("count(../leaf").is_err());
        assert!(XPathExpr::parse("a[1]]").is_err());
        assert!(XPathExpr::parse("name = 'unterminated").is_err());
    }

    #[test]
    fn test_brackets_inside_literals_ignored() {
        XPathExpr::parse("name = '(['").unwrap();
    }
}
