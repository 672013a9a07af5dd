#![allow(dead_code)]

//! Shared fixtures: parsed-tree builders, a canned parser handing a
//! prebuilt tree to the context, and a minimal file-format parser for
//! the lifecycle tests.

use std::cell::RefCell;
use std::sync::Arc;
use yangkit_compiler::{Context, ContextOptions, ModuleParser, ParserContext, SchemaFormat};
use yangkit_core::error::{Result, YangError};
use yangkit_core::schema::parsed::{
    EnumSpec, FeatureDef, IdentityDef, Import, Include, LeafNode, NodeCommon, ParsedModule,
    ParsedNode, ParsedType, Restriction, Revision, Typedef,
};
use yangkit_core::schema::{ModuleId, YangVersion};
use yangkit_core::string_pool::StringPool;

/// A context with filesystem search disabled
pub fn ctx() -> Context {
    Context::with_options(ContextOptions {
        search_paths: Vec::new(),
        search_cwd: false,
    })
}

/// Insert a prebuilt parsed module through the parser interface
pub fn add_module(ctx: &mut Context, module: ParsedModule) -> Result<ModuleId> {
    ctx.register_parser(SchemaFormat::Yang, Box::new(CannedParser::new(module)));
    ctx.parse_module("", SchemaFormat::Yang)
}

/// Parser stub that returns one prepared tree regardless of input
pub struct CannedParser {
    module: RefCell<Option<ParsedModule>>,
}

impl CannedParser {
    pub fn new(module: ParsedModule) -> Self {
        Self {
            module: RefCell::new(Some(module)),
        }
    }
}

impl ModuleParser for CannedParser {
    fn parse(
        &self,
        _pool: &StringPool,
        _data: &str,
        _pctx: &mut ParserContext,
    ) -> Result<ParsedModule> {
        self.module
            .borrow_mut()
            .take()
            .ok_or_else(|| YangError::internal("canned module already consumed"))
    }
}

pub fn module(name: &str) -> ParsedModule {
    ParsedModule {
        name: Arc::from(name),
        namespace: Some(Arc::from(format!("urn:test:{name}"))),
        prefix: Some(Arc::from(name)),
        version: YangVersion::V1_1,
        ..Default::default()
    }
}

pub fn revision(date: &str) -> Revision {
    Revision {
        date: Arc::from(date),
        ..Default::default()
    }
}

pub fn import(name: &str, prefix: &str) -> Import {
    Import {
        name: Arc::from(name),
        prefix: Arc::from(prefix),
        ..Default::default()
    }
}

pub fn feature(name: &str) -> FeatureDef {
    FeatureDef {
        name: Arc::from(name),
        ..Default::default()
    }
}

pub fn feature_if(name: &str, if_features: &[&str]) -> FeatureDef {
    FeatureDef {
        name: Arc::from(name),
        if_features: if_features.iter().map(|s| Arc::from(*s)).collect(),
        ..Default::default()
    }
}

pub fn identity(name: &str, bases: &[&str]) -> IdentityDef {
    IdentityDef {
        name: Arc::from(name),
        bases: bases.iter().map(|s| Arc::from(*s)).collect(),
        ..Default::default()
    }
}

pub fn ptype(name: &str) -> ParsedType {
    ParsedType {
        name: Arc::from(name),
        ..Default::default()
    }
}

pub fn restr(arg: &str) -> Restriction {
    Restriction {
        arg: Arc::from(arg),
        ..Default::default()
    }
}

pub fn enum_spec(name: &str, value: Option<i64>) -> EnumSpec {
    EnumSpec {
        name: Arc::from(name),
        value,
        ..Default::default()
    }
}

pub fn typedef(name: &str, type_: ParsedType) -> Typedef {
    Typedef {
        name: Arc::from(name),
        type_,
        ..Default::default()
    }
}

pub fn leaf(name: &str, type_: ParsedType) -> ParsedNode {
    ParsedNode::Leaf(LeafNode {
        common: NodeCommon {
            name: Arc::from(name),
            ..Default::default()
        },
        type_,
        ..Default::default()
    })
}

/// Just enough of a YANG statement parser for the lifecycle tests:
/// `module`/`submodule` headers with `namespace`, `prefix`,
/// `yang-version`, `revision`, `belongs-to`, `feature`, `import` and
/// `include` statements.
pub struct MiniYangParser;

fn next_token<'t>(tokens: &[&'t str], pos: &mut usize) -> Result<&'t str> {
    let token = tokens
        .get(*pos)
        .copied()
        .ok_or_else(|| YangError::syntax("Unexpected end of input."))?;
    *pos += 1;
    Ok(token.trim_matches('"'))
}

fn expect_token(tokens: &[&str], pos: &mut usize, want: &str) -> Result<()> {
    let token = next_token(tokens, pos)?;
    if token == want {
        Ok(())
    } else {
        Err(YangError::syntax(format!(
            "Expected \"{want}\", found \"{token}\"."
        )))
    }
}

/// Consume a trailing `;` or a balanced `{ ... }` block
fn skip_body(tokens: &[&str], pos: &mut usize) -> Result<()> {
    match next_token(tokens, pos)? {
        ";" => Ok(()),
        "{" => {
            let mut depth = 1u32;
            while depth > 0 {
                match next_token(tokens, pos)? {
                    "{" => depth += 1,
                    "}" => depth -= 1,
                    _ => {}
                }
            }
            Ok(())
        }
        token => Err(YangError::syntax(format!(
            "Expected \";\" or \"{{\", found \"{token}\"."
        ))),
    }
}

impl ModuleParser for MiniYangParser {
    fn parse(
        &self,
        pool: &StringPool,
        data: &str,
        _pctx: &mut ParserContext,
    ) -> Result<ParsedModule> {
        let spaced = data
            .replace('{', " { ")
            .replace('}', " } ")
            .replace(';', " ; ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        let mut pos = 0usize;

        let submodule = match next_token(&tokens, &mut pos)? {
            "module" => false,
            "submodule" => true,
            other => {
                return Err(YangError::syntax(format!(
                    "Expected a module or submodule, found \"{other}\"."
                )))
            }
        };
        let mut parsed = ParsedModule {
            name: pool.intern(next_token(&tokens, &mut pos)?),
            submodule,
            ..Default::default()
        };
        expect_token(&tokens, &mut pos, "{")?;

        loop {
            match next_token(&tokens, &mut pos)? {
                "}" => break,
                "namespace" => {
                    parsed.namespace = Some(pool.intern(next_token(&tokens, &mut pos)?));
                    expect_token(&tokens, &mut pos, ";")?;
                }
                "prefix" => {
                    parsed.prefix = Some(pool.intern(next_token(&tokens, &mut pos)?));
                    expect_token(&tokens, &mut pos, ";")?;
                }
                "yang-version" => {
                    parsed.version = match next_token(&tokens, &mut pos)? {
                        "1.1" => YangVersion::V1_1,
                        _ => YangVersion::V1_0,
                    };
                    expect_token(&tokens, &mut pos, ";")?;
                }
                "revision" => {
                    parsed.revisions.push(Revision {
                        date: pool.intern(next_token(&tokens, &mut pos)?),
                        ..Default::default()
                    });
                    skip_body(&tokens, &mut pos)?;
                }
                "belongs-to" => {
                    parsed.belongs_to = Some(pool.intern(next_token(&tokens, &mut pos)?));
                    skip_body(&tokens, &mut pos)?;
                }
                "feature" => {
                    parsed.features.push(FeatureDef {
                        name: pool.intern(next_token(&tokens, &mut pos)?),
                        ..Default::default()
                    });
                    skip_body(&tokens, &mut pos)?;
                }
                "import" => {
                    let name = pool.intern(next_token(&tokens, &mut pos)?);
                    expect_token(&tokens, &mut pos, "{")?;
                    expect_token(&tokens, &mut pos, "prefix")?;
                    let prefix = pool.intern(next_token(&tokens, &mut pos)?);
                    expect_token(&tokens, &mut pos, ";")?;
                    expect_token(&tokens, &mut pos, "}")?;
                    parsed.imports.push(Import {
                        name,
                        prefix,
                        ..Default::default()
                    });
                }
                "include" => {
                    let name = pool.intern(next_token(&tokens, &mut pos)?);
                    skip_body(&tokens, &mut pos)?;
                    parsed.includes.push(Include {
                        name,
                        ..Default::default()
                    });
                }
                other => {
                    return Err(YangError::syntax(format!(
                        "Unexpected statement \"{other}\"."
                    )))
                }
            }
        }

        Ok(parsed)
    }
}
