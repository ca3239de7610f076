use std::path::{Path, PathBuf};

use super::FakeResolver;
use crate::{BuildContext, DependencyGraph, DiagnosticKind, NodeId, NodeSpec, SerializedNode};

fn resolver() -> FakeResolver {
    FakeResolver::new(&[
        "/app/src/A.tsx",
        "/app/src/B.tsx",
        "/app/src/C.tsx",
        "/app/src/Button.stories.tsx",
    ])
}

#[test]
fn same_resolved_path_yields_same_node() {
    let ctx = BuildContext::new(false);
    let resolver = resolver();
    let mut graph = DependencyGraph::new("/app", &ctx);

    let a = graph.create_or_get_node(NodeSpec::entry("src/A"), &resolver);
    let parent = graph.create_or_get_node(NodeSpec::entry("src/B.tsx"), &resolver);
    let via_child = graph.create_or_get_node(NodeSpec::child("./A", parent), &resolver);
    let absolute = graph.create_or_get_node(NodeSpec::child("/app/src/A.tsx", parent), &resolver);

    assert_eq!(a, via_child);
    assert_eq!(a, absolute);
    assert_eq!(graph.len(), 2);
    assert_eq!(
        graph.find_by_path(Path::new("/app/src/A.tsx")),
        Some(a)
    );
}

#[test]
fn duplicate_entry_is_reported() {
    let ctx = BuildContext::new(false);
    let resolver = resolver();
    let mut graph = DependencyGraph::new("/app", &ctx);

    let first = graph.create_or_get_node(NodeSpec::entry("src/A.tsx"), &resolver);
    let second = graph.create_or_get_node(NodeSpec::entry("./src/A"), &resolver);

    assert_eq!(first, second);
    assert_eq!(ctx.diagnostics_of(DiagnosticKind::DuplicateKey).len(), 1);
}

#[test]
fn single_entry_is_the_root() {
    let ctx = BuildContext::new(false);
    let mut graph = DependencyGraph::new("/app", &ctx);

    let root = graph
        .build_root(&["src/A.tsx".to_string()], &resolver())
        .unwrap();

    let node = graph.node(root);
    assert!(node.is_root);
    assert!(!node.is_virtual_root);
    assert_eq!(node.file_path, PathBuf::from("/app/src/A.tsx"));
    assert_eq!(node.name, "A");
}

#[test]
fn several_entries_get_a_virtual_root() {
    let ctx = BuildContext::new(false);
    let mut graph = DependencyGraph::new("/app", &ctx);
    let entries = vec![
        "src/A.tsx".to_string(),
        "src/B.tsx".to_string(),
        "src/C.tsx".to_string(),
    ];

    let root = graph.build_root(&entries, &resolver()).unwrap();

    let node = graph.node(root);
    assert!(node.is_virtual_root);
    assert!(node.is_root);
    assert_eq!(node.children().len(), 3);
    assert!(graph.find_by_path(&node.file_path).is_none());
    for &child in node.children() {
        assert!(graph.node(child).is_root);
        assert!(!graph.node(child).is_virtual_root);
    }
}

#[test]
fn third_party_specifiers_are_not_resolved() {
    let ctx = BuildContext::new(false);
    let mut graph = DependencyGraph::new("/app", &ctx);
    let resolver = resolver();
    let root = graph
        .build_root(&["src/A.tsx".to_string()], &resolver)
        .unwrap();

    let react = graph.create_or_get_node(NodeSpec::child("react", root), &resolver);
    let scoped = graph.create_or_get_node(NodeSpec::child("@emotion/styled", root), &resolver);

    for id in [react, scoped] {
        let node = graph.node(id);
        assert!(node.is_third_party);
        assert!(node.resolution_error.is_none());
    }
    assert_eq!(graph.node(react).file_path, PathBuf::from("react"));
}

#[test]
fn caller_resolved_specifier_keeps_raw_import_path() {
    let ctx = BuildContext::new(false);
    let mut graph = DependencyGraph::new("/app", &ctx);
    let resolver = resolver();
    let root = graph
        .build_root(&["src/A.tsx".to_string()], &resolver)
        .unwrap();

    let spec = NodeSpec::child("@/B", root).with_resolved("/app/src/B.tsx");
    let aliased = graph.create_or_get_node(spec, &resolver);

    let node = graph.node(aliased);
    assert!(!node.is_third_party);
    assert!(node.resolution_error.is_none());
    assert_eq!(node.import_path, "@/B");
    assert_eq!(node.file_path, PathBuf::from("/app/src/B.tsx"));

    let relative = graph.create_or_get_node(NodeSpec::child("./B", root), &resolver);
    assert_eq!(relative, aliased);
}

#[test]
fn unresolved_specifier_keeps_error_on_node() {
    let ctx = BuildContext::new(false);
    let mut graph = DependencyGraph::new("/app", &ctx);
    let resolver = resolver();
    let root = graph
        .build_root(&["src/A.tsx".to_string()], &resolver)
        .unwrap();

    let missing = graph.create_or_get_node(NodeSpec::child("./Missing", root), &resolver);

    let node = graph.node(missing);
    assert!(!node.is_third_party);
    assert_eq!(node.file_path, PathBuf::from("/app/src/Missing"));
    let error = node.resolution_error.as_ref().unwrap();
    assert_eq!(error.specifier, "./Missing");
}

#[test]
fn story_files_are_flagged() {
    let ctx = BuildContext::new(false);
    let mut graph = DependencyGraph::new("/app", &ctx);

    let id = graph.create_or_get_node(NodeSpec::entry("src/Button.stories.tsx"), &resolver());
    assert!(graph.node(id).is_story_file);
    assert_eq!(graph.node(id).name, "Button");
}

#[test]
fn traverse_is_preorder_and_survives_cycles() {
    let ctx = BuildContext::new(false);
    let resolver = resolver();
    let mut graph = DependencyGraph::new("/app", &ctx);
    let a = graph
        .build_root(&["src/A.tsx".to_string()], &resolver)
        .unwrap();
    let b = graph.create_or_get_node(NodeSpec::child("./B", a), &resolver);
    let c = graph.create_or_get_node(NodeSpec::child("./C", a), &resolver);
    graph.add_child(a, b);
    graph.add_child(a, c);
    graph.add_child(b, a);
    graph.add_child(c, b);

    let mut order: Vec<NodeId> = Vec::new();
    graph
        .traverse(|_, id| {
            order.push(id);
            Ok(())
        })
        .unwrap();

    assert_eq!(order, vec![a, b, c]);
}

#[test]
fn traverse_walks_children_added_by_the_visitor() {
    let ctx = BuildContext::new(false);
    let resolver = resolver();
    let mut graph = DependencyGraph::new("/app", &ctx);
    graph
        .build_root(&["src/A.tsx".to_string()], &resolver)
        .unwrap();

    let mut visited = Vec::new();
    graph
        .traverse(|graph, id| {
            visited.push(graph.node(id).name.clone());
            if graph.node(id).name == "A" {
                let child = graph.create_or_get_node(NodeSpec::child("./B", id), &resolver);
                graph.add_child(id, child);
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(visited, vec!["A", "B"]);
}

#[test]
fn serialize_cuts_repeated_nodes() {
    let ctx = BuildContext::new(false);
    let resolver = resolver();
    let mut graph = DependencyGraph::new("/app", &ctx);
    let a = graph
        .build_root(&["src/A.tsx".to_string()], &resolver)
        .unwrap();
    let b = graph.create_or_get_node(NodeSpec::child("./B", a), &resolver);
    graph.add_child(a, b);
    graph.add_child(b, a);

    let tree = graph.serialize().unwrap();
    assert_eq!(
        tree,
        SerializedNode {
            file_path: "/app/src/A.tsx".to_string(),
            children: vec![SerializedNode {
                file_path: "/app/src/B.tsx".to_string(),
                children: vec![SerializedNode {
                    file_path: "/app/src/A.tsx".to_string(),
                    children: vec![],
                }],
            }],
        }
    );
}
