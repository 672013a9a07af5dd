//! Core types for the yangkit YANG schema processor
//!
//! This crate holds the pieces every layer of the processor shares:
//! the error taxonomy and diagnostic records, the per-context string
//! pool, the parsed (source-faithful) and compiled (linked,
//! restriction-merged) schema models, and the compact postfix form of
//! `if-feature` expressions.
//!
//! The parsing lifecycle, type compiler and feature engine that
//! produce and operate on these types live in `yangkit-compiler`.

pub mod error;
pub mod schema;
pub mod string_pool;
pub mod xpath;

pub use error::{Diagnostic, Result, YangError};
pub use schema::{BaseType, ModuleId, NodeFlags, Status, TypeFlags, YangVersion};
pub use string_pool::StringPool;
