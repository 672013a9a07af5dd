//! Schema processing for YANG (RFC 6020/7950) modules
//!
//! The compiler turns parsed module trees into semantically validated,
//! link-resolved compiled schema trees. A [`Context`] owns the module
//! set: sources enter through a registered [`ModuleParser`], are
//! deduplicated by `(name, revision)`, have their imports and includes
//! resolved through the filesystem [`loader`], and compile into the
//! immutable trees of `yangkit-core`. Feature state is switched
//! through the context's feature API, which re-evaluates dependent
//! `if-feature` conditions transitively.
//!
//! ```no_run
//! use yangkit_compiler::{CompileOptions, Context, SchemaFormat};
//!
//! # fn parser() -> Box<dyn yangkit_compiler::ModuleParser> { unimplemented!() }
//! let mut ctx = Context::new();
//! ctx.register_parser(SchemaFormat::Yang, parser());
//! ctx.add_search_path("/usr/share/yang/modules");
//!
//! let module = ctx.parse_file(std::path::Path::new("example.yang"))?;
//! ctx.compile(module, CompileOptions::empty())?;
//! ctx.enable_feature(module, "*")?;
//! # Ok::<(), yangkit_core::YangError>(())
//! ```

pub mod compile;
pub mod context;
pub mod loader;
pub mod parser;
pub mod pattern;

pub use compile::CompileOptions;
pub use context::{Context, ContextOptions, Module};
pub use parser::{ModuleParser, ParserContext, SchemaFormat, YinParser};
