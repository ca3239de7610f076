//! Bare-specifier rewrites: configured aliases and tsconfig `paths`.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use storymap_graph::path::clean_join;

/// Rewrite `specifier` through the configured aliases (e.g. `@` -> `src`).
///
/// An alias matches the whole specifier or a `/`-separated prefix of it.
/// Targets are relative to `root`.
pub fn resolve_path_alias(
    specifier: &str,
    root: &Path,
    path_aliases: &IndexMap<String, String>,
) -> Option<PathBuf> {
    for (alias, target) in path_aliases {
        let Some(rest) = specifier.strip_prefix(alias.as_str()) else {
            continue;
        };
        if !(rest.is_empty() || rest.starts_with('/') || alias.ends_with('/')) {
            continue;
        }

        let rest = rest.trim_start_matches('/');
        let base = clean_join(root, target);
        return Some(if rest.is_empty() { base } else { base.join(rest) });
    }
    None
}

/// Text captured by a tsconfig `paths` pattern with at most one `*`.
pub fn match_paths_pattern<'s>(pattern: &str, specifier: &'s str) -> Option<&'s str> {
    match pattern.split_once('*') {
        None => (pattern == specifier).then_some(""),
        Some((prefix, suffix)) => {
            let rest = specifier.strip_prefix(prefix)?;
            let captured = rest.strip_suffix(suffix)?;
            Some(captured)
        }
    }
}

/// All `paths` targets for `specifier`, in declaration order.
pub fn resolve_tsconfig_paths(
    specifier: &str,
    base: &Path,
    paths: &IndexMap<String, Vec<String>>,
) -> Vec<PathBuf> {
    // The longest matching prefix wins, as in tsc.
    let mut matched: Vec<(&String, &Vec<String>, &str)> = paths
        .iter()
        .filter_map(|(pattern, targets)| {
            match_paths_pattern(pattern, specifier).map(|captured| (pattern, targets, captured))
        })
        .collect();
    matched.sort_by_key(|(pattern, _, _)| {
        std::cmp::Reverse(pattern.split('*').next().map_or(0, str::len))
    });

    matched
        .into_iter()
        .flat_map(|(_, targets, captured)| {
            targets
                .iter()
                .map(move |target| clean_join(base, target.replacen('*', captured, 1)))
        })
        .collect()
}
