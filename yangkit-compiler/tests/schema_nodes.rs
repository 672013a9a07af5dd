#![allow(missing_docs)]

//! Data-tree node compilation: flag inheritance, source order and
//! per-kind payloads.

mod common;

use common::{add_module, ctx, leaf, module, ptype};
use std::sync::Arc;
use yangkit_compiler::CompileOptions;
use yangkit_core::schema::compiled::CompiledNode;
use yangkit_core::schema::parsed::{
    AnyDataNode, CaseNode, ChoiceNode, ContainerNode, LeafListNode, ListNode, NodeCommon,
    ParsedNode, Restriction, UsesNode, When,
};
use yangkit_core::schema::NodeFlags;
use yangkit_core::YangError;

fn container(name: &str, children: Vec<ParsedNode>) -> ContainerNode {
    ContainerNode {
        common: NodeCommon {
            name: Arc::from(name),
            ..Default::default()
        },
        children,
        ..Default::default()
    }
}

#[test]
fn config_state_is_inherited_from_the_parent() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    let mut state = container("state", vec![leaf("counter", ptype("uint32"))]);
    state.common.flags = NodeFlags::CONFIG_R;
    parsed.data = vec![
        ParsedNode::Container(state),
        leaf("plain", ptype("string")),
    ];

    let mut ctx = ctx();
    let id = add_module(&mut ctx, parsed)?;
    ctx.compile(id, CompileOptions::empty())?;

    let compiled = ctx.module(id).compiled().unwrap();
    let state = &compiled.data[0];
    assert!(state.common().flags.contains(NodeFlags::CONFIG_R));
    // the leaf under the state container inherits config false
    assert!(state.children()[0]
        .common()
        .flags
        .contains(NodeFlags::CONFIG_R));
    // an unmarked top-level node defaults to config true
    assert!(compiled.data[1]
        .common()
        .flags
        .contains(NodeFlags::CONFIG_W));
    Ok(())
}

#[test]
fn current_child_under_obsolete_parent_is_rejected() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    let mut child = leaf("fresh", ptype("string"));
    if let ParsedNode::Leaf(leaf) = &mut child {
        leaf.common.flags = NodeFlags::STATUS_CURRENT;
    }
    let mut parent = container("legacy", vec![child]);
    parent.common.flags = NodeFlags::STATUS_OBSOLETE;
    parsed.data = vec![ParsedNode::Container(parent)];

    let mut ctx = ctx();
    let id = add_module(&mut ctx, parsed)?;
    let err = ctx.compile(id, CompileOptions::empty()).unwrap_err();
    assert!(matches!(err, YangError::Semantic { .. }));
    assert!(err.to_string().contains("in conflict with the parent's"));
    Ok(())
}

#[test]
fn unmarked_child_inherits_deprecated_status() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    let mut parent = container("aging", vec![leaf("value", ptype("string"))]);
    parent.common.flags = NodeFlags::STATUS_DEPRECATED;
    parsed.data = vec![ParsedNode::Container(parent)];

    let mut ctx = ctx();
    let id = add_module(&mut ctx, parsed)?;
    ctx.compile(id, CompileOptions::empty())?;

    let compiled = ctx.module(id).compiled().unwrap();
    let child = &compiled.data[0].children()[0];
    assert!(child.common().flags.contains(NodeFlags::STATUS_DEPRECATED));
    Ok(())
}

#[test]
fn siblings_keep_source_order() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    parsed.data = vec![
        leaf("one", ptype("string")),
        leaf("two", ptype("string")),
        ParsedNode::Container(container("three", Vec::new())),
        leaf("four", ptype("string")),
    ];

    let mut ctx = ctx();
    let id = add_module(&mut ctx, parsed)?;
    ctx.compile(id, CompileOptions::empty())?;

    let compiled = ctx.module(id).compiled().unwrap();
    let names: Vec<_> = compiled.data.iter().map(|n| n.name().to_string()).collect();
    assert_eq!(names, ["one", "two", "three", "four"]);
    Ok(())
}

#[test]
fn when_and_must_conditions_are_compiled() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    let mut guarded = container("tunnel", vec![]);
    guarded.common.when = Some(When {
        condition: Arc::from("../mode = 'tunnel'"),
        ..Default::default()
    });
    guarded.musts = vec![Restriction {
        arg: Arc::from("count(child) <= 8"),
        error_message: Some(Arc::from("too many children")),
        ..Default::default()
    }];
    parsed.data = vec![ParsedNode::Container(guarded)];

    let mut ctx = ctx();
    let id = add_module(&mut ctx, parsed)?;
    ctx.compile(id, CompileOptions::empty())?;

    let compiled = ctx.module(id).compiled().unwrap();
    let CompiledNode::Container(tunnel) = &compiled.data[0] else {
        panic!("expected a container");
    };
    assert_eq!(
        tunnel.common.when.as_ref().unwrap().condition.source(),
        "../mode = 'tunnel'"
    );
    assert_eq!(tunnel.musts.len(), 1);
    assert_eq!(
        tunnel.musts[0].error_message.as_deref(),
        Some("too many children")
    );
    Ok(())
}

#[test]
fn malformed_when_condition_fails_compilation() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    let mut guarded = container("broken", vec![]);
    guarded.common.when = Some(When {
        condition: Arc::from("count(../leaf"),
        ..Default::default()
    });
    parsed.data = vec![ParsedNode::Container(guarded)];

    let mut ctx = ctx();
    let id = add_module(&mut ctx, parsed)?;
    let err = ctx.compile(id, CompileOptions::empty()).unwrap_err();
    assert!(matches!(err, YangError::Syntax { .. }));
    Ok(())
}

#[test]
fn list_keys_split_into_leaf_names() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    parsed.data = vec![ParsedNode::List(ListNode {
        common: NodeCommon {
            name: Arc::from("interface"),
            ..Default::default()
        },
        key: Some(Arc::from("name unit")),
        children: vec![
            leaf("name", ptype("string")),
            leaf("unit", ptype("uint8")),
        ],
        min_elements: Some(1),
        ..Default::default()
    })];

    let mut ctx = ctx();
    let id = add_module(&mut ctx, parsed)?;
    ctx.compile(id, CompileOptions::empty())?;

    let compiled = ctx.module(id).compiled().unwrap();
    let CompiledNode::List(list) = &compiled.data[0] else {
        panic!("expected a list");
    };
    let keys: Vec<_> = list.keys.iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, ["name", "unit"]);
    assert_eq!(list.min_elements, Some(1));
    assert_eq!(list.children.len(), 2);
    Ok(())
}

#[test]
fn every_node_kind_compiles() -> Result<(), anyhow::Error> {
    let mut parsed = module("m");
    parsed.data = vec![
        ParsedNode::Choice(ChoiceNode {
            common: NodeCommon {
                name: Arc::from("transport"),
                ..Default::default()
            },
            children: vec![ParsedNode::Case(CaseNode {
                common: NodeCommon {
                    name: Arc::from("tcp"),
                    ..Default::default()
                },
                children: vec![leaf("port", ptype("uint16"))],
            })],
            default: Some(Arc::from("tcp")),
        }),
        ParsedNode::LeafList(LeafListNode {
            common: NodeCommon {
                name: Arc::from("search"),
                ..Default::default()
            },
            type_: ptype("string"),
            max_elements: Some(3),
            ..Default::default()
        }),
        ParsedNode::Uses(UsesNode {
            common: NodeCommon {
                name: Arc::from("common-fields"),
                ..Default::default()
            },
            ..Default::default()
        }),
        ParsedNode::AnyXml(AnyDataNode {
            common: NodeCommon {
                name: Arc::from("blob"),
                ..Default::default()
            },
            ..Default::default()
        }),
    ];

    let mut ctx = ctx();
    let id = add_module(&mut ctx, parsed)?;
    ctx.compile(id, CompileOptions::empty())?;

    let compiled = ctx.module(id).compiled().unwrap();
    assert!(matches!(compiled.data[0], CompiledNode::Choice(_)));
    let CompiledNode::Choice(choice) = &compiled.data[0] else {
        unreachable!();
    };
    assert_eq!(choice.default.as_deref(), Some("tcp"));
    assert!(matches!(choice.children[0], CompiledNode::Case(_)));
    assert!(matches!(compiled.data[1], CompiledNode::LeafList(_)));
    assert!(matches!(compiled.data[2], CompiledNode::Uses(_)));
    assert!(matches!(compiled.data[3], CompiledNode::AnyXml(_)));
    Ok(())
}
