//! Walker behavior over in-memory programs.

use std::path::PathBuf;

use storymap_graph::{
    BuildContext, DependencyGraph, DiagnosticKind, Error, ExampleCatalog, ExampleRecord,
};

use super::test_helpers::program;
use crate::config::StoryMapConfig;
use crate::csf::StoryReader;
use crate::resolver::ModuleResolver;
use crate::walker::{SkipReason, SyntaxWalker, WalkMode, WalkOutcome};

const TREE: WalkMode = WalkMode {
    discover_children: true,
    generate_uids: true,
};

const UIDS_ONLY: WalkMode = WalkMode {
    discover_children: false,
    generate_uids: true,
};

#[test]
fn test_children_and_skip_reasons() {
    let config = StoryMapConfig::default().with_path_alias("@", "src");
    let program = program(
        &config,
        &[
            (
                "src/A.tsx",
                r#"
            import { BrowserRouter } from 'react-router-dom';
            import { Missing } from './missing';
            import { B } from '@/B';
            export const load = () => import('./C');
        "#,
            ),
            ("src/B.tsx", "export const B = () => null;"),
            ("src/C.tsx", "export default function C() { return null; }"),
        ],
    );
    let ctx = BuildContext::new(false);
    let resolver =
        ModuleResolver::new(&program, &ctx).with_path_aliases(config.path_aliases.clone());
    let mut catalog = ExampleCatalog::default();
    let mut graph = DependencyGraph::new(program.root(), &ctx);
    let root = graph
        .build_root(&["/app/src/A.tsx".to_string()], &resolver)
        .expect("one entry");
    let mut walker = SyntaxWalker::new(&resolver, &config.metadata_key, &ctx);

    let outcome = walker.walk_node(&mut graph, &mut catalog, root, TREE).unwrap();
    assert_eq!(
        outcome,
        WalkOutcome::Parsed {
            children: 4,
            identifiers: 0
        }
    );

    let children = graph.node(root).children().to_vec();
    let outcomes: Vec<WalkOutcome> = children
        .iter()
        .map(|&child| walker.walk_node(&mut graph, &mut catalog, child, TREE).unwrap())
        .collect();
    let parsed = WalkOutcome::Parsed {
        children: 0,
        identifiers: 0,
    };
    assert_eq!(
        outcomes,
        [
            WalkOutcome::Skipped(SkipReason::ThirdParty),
            WalkOutcome::Skipped(SkipReason::ResolutionError),
            parsed,
            parsed,
        ]
    );

    let router = graph.node(children[0]);
    assert!(router.is_third_party);
    assert!(router.uses_router);
    assert!(!router.uses_state_binding);
    let aliased = graph.node(children[2]);
    assert_eq!(aliased.file_path, PathBuf::from("/app/src/B.tsx"));
    assert_eq!(aliased.import_path, "@/B");
    assert!(!aliased.is_third_party);
    assert_eq!(graph.node(children[3]).file_path, PathBuf::from("/app/src/C.tsx"));
    assert_eq!(ctx.diagnostics_of(DiagnosticKind::Resolution).len(), 1);
    assert!(graph.nodes().iter().all(|node| node.parsed));

    let again = walker.walk_node(&mut graph, &mut catalog, root, TREE).unwrap();
    assert_eq!(again, WalkOutcome::Skipped(SkipReason::AlreadyParsed));
}

#[test]
fn test_metadata_behind_barrel_and_alias() {
    let config = StoryMapConfig::default();
    let program = program(
        &config,
        &[
            (
                "src/ui/Button.tsx",
                r#"
            export const Button = () => null;
            Button.metadata = { kind: "primary" };
        "#,
            ),
            (
                "src/ui/index.ts",
                "export { Button as PrimaryButton } from './Button';",
            ),
            (
                "src/Button.stories.tsx",
                r#"
            import { PrimaryButton as Btn } from './ui';
            export default { title: "Button", component: Btn };
            export const Main = {};
        "#,
            ),
        ],
    );
    let ctx = BuildContext::new(false);
    let resolver = ModuleResolver::new(&program, &ctx);
    let mut catalog =
        StoryReader::new(&resolver, &config.placeholder_functions, &ctx).read_catalog();
    assert_eq!(catalog.len(), 1);

    let mut graph = DependencyGraph::new(program.root(), &ctx);
    graph.build_root(&["/app/src/Button.stories.tsx".to_string()], &resolver);
    let mut walker = SyntaxWalker::new(&resolver, &config.metadata_key, &ctx);
    graph
        .traverse(|graph, id| {
            walker
                .walk_node(graph, &mut catalog, id, UIDS_ONLY)
                .map(|_| ())
        })
        .unwrap();

    let identifiers = graph.identifiers();
    assert_eq!(identifiers.len(), 1);
    let identifier = identifiers.values().next().unwrap();
    assert_eq!(identifier.component_name, "PrimaryButton");
    assert_eq!(identifier.uid, r#"kind-"primary""#);
    assert_eq!(identifier.story_ids, ["Main"]);
    assert!(catalog.unused().is_empty());
}

#[test]
fn test_missing_story_source_is_fatal() {
    let config = StoryMapConfig::default();
    let program = program(
        &config,
        &[(
            "src/Comp.tsx",
            "export const Comp = () => null; Comp.metadata = { a: 1 };",
        )],
    );
    let ctx = BuildContext::new(false);
    let resolver = ModuleResolver::new(&program, &ctx);

    let mut record = ExampleRecord::new("/app/src/Gone.stories.tsx");
    record.component_path = Some(PathBuf::from("/app/src/Comp.tsx"));
    record.component_name = "Comp".to_string();
    record.component_alias = "Comp".to_string();
    let mut catalog = ExampleCatalog::new(vec![record]);

    let mut graph = DependencyGraph::new(program.root(), &ctx);
    let root = graph
        .build_root(&["/app/src/Comp.tsx".to_string()], &resolver)
        .expect("one entry");
    let mut walker = SyntaxWalker::new(&resolver, &config.metadata_key, &ctx);

    let err = walker
        .walk_node(&mut graph, &mut catalog, root, TREE)
        .unwrap_err();
    assert!(matches!(err, Error::MissingSource { .. }));
}
