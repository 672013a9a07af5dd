#![allow(missing_docs)]

//! Module lifecycle behavior: parsing, deduplication, revision
//! selection, dependency resolution and compilation options.

mod common;

use common::{add_module, leaf, module, ptype, revision, typedef, MiniYangParser};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use yangkit_compiler::{CompileOptions, Context, ContextOptions, SchemaFormat};
use yangkit_core::YangError;

/// A context searching only `dir`, with the mini parser registered
fn file_ctx(dir: &Path) -> Context {
    let mut ctx = Context::with_options(ContextOptions {
        search_paths: vec![dir.to_path_buf()],
        search_cwd: false,
    });
    ctx.register_parser(SchemaFormat::Yang, Box::new(MiniYangParser));
    ctx
}

#[test]
fn loading_without_revision_picks_the_newest() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("mod@2020-01-01.yang"),
        "module mod { namespace \"urn:mod\"; prefix m; revision 2020-01-01; }",
    )?;
    fs::write(
        tmp.path().join("mod@2021-06-01.yang"),
        "module mod { namespace \"urn:mod\"; prefix m; revision 2021-06-01; }",
    )?;

    let mut ctx = file_ctx(tmp.path());
    let id = ctx.load_module("mod", None)?;
    assert_eq!(
        ctx.module(id).revision().map(|r| &**r),
        Some("2021-06-01")
    );
    assert!(ctx.module(id).is_latest());
    assert!(!ctx.module(id).is_implemented());
    Ok(())
}

#[test]
fn loading_an_exact_revision() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("mod@2020-01-01.yang"),
        "module mod { namespace \"urn:mod\"; prefix m; revision 2020-01-01; }",
    )?;
    fs::write(
        tmp.path().join("mod@2021-06-01.yang"),
        "module mod { namespace \"urn:mod\"; prefix m; revision 2021-06-01; }",
    )?;

    let mut ctx = file_ctx(tmp.path());
    let old = ctx.load_module("mod", Some("2020-01-01"))?;
    assert_eq!(ctx.module(old).revision().map(|r| &**r), Some("2020-01-01"));

    // the older revision arrived first, so it was the latest; loading
    // the newer one takes the flag over
    assert!(ctx.module(old).is_latest());
    let new = ctx.load_module("mod", Some("2021-06-01"))?;
    assert!(!ctx.module(old).is_latest());
    assert!(ctx.module(new).is_latest());

    // a revision-less request now resolves to the newer handle
    assert_eq!(ctx.load_module("mod", None)?, new);
    Ok(())
}

#[test]
fn missing_module_is_not_found() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    let mut ctx = file_ctx(tmp.path());
    let err = ctx.load_module("ghost", None).unwrap_err();
    assert!(matches!(err, YangError::NotFound { .. }));
    Ok(())
}

#[test]
fn duplicate_revision_is_rejected() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("mod@2020-01-01.yang"),
        "module mod { namespace \"urn:mod\"; prefix m; revision 2020-01-01; }",
    )?;

    let mut ctx = file_ctx(tmp.path());
    ctx.load_module("mod", Some("2020-01-01"))?;
    // same (name, revision) again, this time as an implemented parse
    let err = ctx
        .parse_module(
            "module mod { namespace \"urn:mod\"; prefix m; revision 2020-01-01; }",
            SchemaFormat::Yang,
        )
        .unwrap_err();
    assert!(matches!(err, YangError::AlreadyExists { .. }));
    assert!(err.to_string().contains("already present"));
    Ok(())
}

#[test]
fn second_implemented_module_of_a_name_is_rejected() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    let mut ctx = file_ctx(tmp.path());
    ctx.parse_module(
        "module mod { namespace \"urn:mod\"; prefix m; revision 2020-01-01; }",
        SchemaFormat::Yang,
    )?;
    let err = ctx
        .parse_module(
            "module mod { namespace \"urn:mod\"; prefix m; revision 2021-06-01; }",
            SchemaFormat::Yang,
        )
        .unwrap_err();
    assert!(matches!(err, YangError::AlreadyExists { .. }));
    assert!(err.to_string().contains("already implemented"));
    Ok(())
}

#[test]
fn parsed_tree_reattaches_to_a_compiled_only_handle() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    let source = "module mod { namespace \"urn:mod\"; prefix m; revision 2020-01-01; }";
    fs::write(tmp.path().join("mod@2020-01-01.yang"), source)?;

    let mut ctx = file_ctx(tmp.path());
    let id = ctx.load_module("mod", Some("2020-01-01"))?;
    ctx.compile(id, CompileOptions::FREE_PARSED)?;
    assert!(ctx.module(id).parsed().is_none());
    assert!(ctx.module(id).compiled().is_some());

    // the same source parses again onto the existing handle
    let again = ctx.parse_module(source, SchemaFormat::Yang)?;
    assert_eq!(again, id);
    assert!(ctx.module(id).parsed().is_some());
    assert!(ctx.module(id).is_implemented());
    Ok(())
}

#[test]
fn imports_resolve_through_the_loader() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("dep.yang"),
        "module dep { namespace \"urn:dep\"; prefix d; feature extras; }",
    )?;

    let mut ctx = file_ctx(tmp.path());
    let id = ctx.parse_module(
        "module top { namespace \"urn:top\"; prefix t; import dep { prefix d; } }",
        SchemaFormat::Yang,
    )?;
    ctx.compile(id, CompileOptions::empty())?;

    let dep = ctx.get_module("dep", None).expect("dependency was loaded");
    assert!(!ctx.module(dep).is_implemented());
    assert!(ctx.module(dep).compiled().is_some());

    let compiled = ctx.module(id).compiled().unwrap();
    assert_eq!(compiled.imports.len(), 1);
    assert_eq!(&*compiled.imports[0].prefix, "d");
    assert_eq!(compiled.imports[0].module, dep);
    Ok(())
}

#[test]
fn importing_one_module_twice_is_rejected() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("dep.yang"),
        "module dep { namespace \"urn:dep\"; prefix d; }",
    )?;

    let mut ctx = file_ctx(tmp.path());
    let err = ctx
        .parse_module(
            "module top { namespace \"urn:top\"; prefix t; \
             import dep { prefix d1; } import dep { prefix d2; } }",
            SchemaFormat::Yang,
        )
        .unwrap_err();
    assert!(matches!(err, YangError::Reference { .. }));
    assert!(err.to_string().contains("referred twice"));

    // the failed module is gone; its dependency stays
    assert_eq!(ctx.get_module("top", None), None);
    assert!(ctx.get_module("dep", None).is_some());
    Ok(())
}

#[test]
fn includes_pull_submodule_content_in() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("main-sub.yang"),
        "submodule main-sub { belongs-to main { prefix m; } feature from-sub; }",
    )?;

    let mut ctx = file_ctx(tmp.path());
    let id = ctx.parse_module(
        "module main { namespace \"urn:main\"; prefix m; include main-sub; }",
        SchemaFormat::Yang,
    )?;

    let parsed = ctx.module(id).parsed().unwrap();
    let sub = parsed.includes[0].submodule.as_deref().unwrap();
    assert!(sub.submodule);
    assert_eq!(&*sub.name, "main-sub");

    // submodule features become part of the main module
    ctx.compile(id, CompileOptions::empty())?;
    ctx.enable_feature(id, "from-sub")?;
    assert!(ctx.feature_value(id, "from-sub")?);
    Ok(())
}

#[test]
fn include_of_a_foreign_submodule_is_rejected() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("stray.yang"),
        "submodule stray { belongs-to other { prefix o; } }",
    )?;

    let mut ctx = file_ctx(tmp.path());
    let err = ctx
        .parse_module(
            "module main { namespace \"urn:main\"; prefix m; include stray; }",
            SchemaFormat::Yang,
        )
        .unwrap_err();
    assert!(matches!(err, YangError::Reference { .. }));
    assert!(err.to_string().contains("belongs to module \"other\""));
    Ok(())
}

#[test]
fn submodule_text_cannot_be_parsed_directly() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    let mut ctx = file_ctx(tmp.path());
    let err = ctx
        .parse_module(
            "submodule sub { belongs-to main { prefix m; } }",
            SchemaFormat::Yang,
        )
        .unwrap_err();
    assert!(matches!(err, YangError::InvalidArgument { .. }));
    Ok(())
}

#[test]
fn free_source_detaches_the_parsed_tree() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    parsed.revisions = vec![revision("2024-02-29")];
    parsed.data = vec![leaf("x", ptype("string"))];

    let mut ctx = common::ctx();
    let id = add_module(&mut ctx, parsed)?;
    ctx.compile(id, CompileOptions::FREE_PARSED)?;

    assert!(ctx.module(id).parsed().is_none());
    let compiled = ctx.module(id).compiled().unwrap();
    assert_eq!(compiled.revision.as_deref(), Some("2024-02-29"));
    assert_eq!(compiled.data.len(), 1);
    Ok(())
}

#[test]
fn compile_failure_keeps_the_parsed_tree_for_retry() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    parsed.data = vec![leaf("x", ptype("nowhere"))];

    let mut ctx = common::ctx();
    let id = add_module(&mut ctx, parsed)?;
    assert!(ctx.compile(id, CompileOptions::FREE_PARSED).is_err());

    assert!(ctx.module(id).compiled().is_none());
    assert!(ctx.module(id).parsed().is_some());

    let diags = ctx.drain_diagnostics();
    assert!(!diags.is_empty());
    assert!(diags[0].path.starts_with("/m:x"));
    Ok(())
}

#[test]
fn duplicate_typedef_names_are_rejected_at_parse() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    parsed.typedefs = vec![
        typedef("twice", ptype("uint8")),
        typedef("twice", ptype("string")),
    ];

    let mut ctx = common::ctx();
    let err = add_module(&mut ctx, parsed).unwrap_err();
    assert!(matches!(err, YangError::Semantic { .. }));
    assert!(err.to_string().contains("Duplicate typedef name"));
    // the rejected module left no handle behind
    assert_eq!(ctx.get_module("m", None), None);
    Ok(())
}

#[test]
fn invalid_revision_date_is_rejected() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    parsed.revisions = vec![revision("2020-13-77")];

    let mut ctx = common::ctx();
    let err = add_module(&mut ctx, parsed).unwrap_err();
    assert!(matches!(err, YangError::Syntax { .. }));
    Ok(())
}

#[test]
fn modules_iterator_skips_dead_handles() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    fs::write(
        tmp.path().join("dep.yang"),
        "module dep { namespace \"urn:dep\"; prefix d; }",
    )?;
    let mut ctx = file_ctx(tmp.path());

    // leaves a dead handle for "top" behind
    let _ = ctx.parse_module(
        "module top { namespace \"urn:top\"; prefix t; \
         import dep { prefix d1; } import dep { prefix d2; } }",
        SchemaFormat::Yang,
    );

    let names: Vec<_> = ctx.modules().map(|(_, m)| m.name().to_string()).collect();
    assert_eq!(names, ["dep"]);
    Ok(())
}

#[test]
fn parse_file_records_the_source_path() -> Result<(), anyhow::Error> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("disk@2022-01-01.yang");
    fs::write(
        &path,
        "module disk { namespace \"urn:disk\"; prefix d; revision 2022-01-01; }",
    )?;

    let mut ctx = file_ctx(tmp.path());
    let id = ctx.parse_file(&path)?;
    let parsed = ctx.module(id).parsed().unwrap();
    assert!(parsed
        .filepath
        .as_deref()
        .is_some_and(|p| p.ends_with("disk@2022-01-01.yang")));
    assert!(ctx.module(id).is_implemented());
    Ok(())
}
