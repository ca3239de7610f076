//! The parts of `tsconfig.json` that affect module resolution.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use storymap_graph::path::{clean_join, is_third_party};

/// `compilerOptions.baseUrl` and `compilerOptions.paths` after following
/// `extends`, with `baseUrl` already made absolute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    pub base_url: Option<PathBuf>,
    /// Pattern (at most one `*`) to replacement targets, in declaration order.
    pub paths: IndexMap<String, Vec<String>>,
    /// Directory of the tsconfig that declared `paths`.
    pub paths_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    extends: Option<RawExtends>,
    #[serde(default, rename = "compilerOptions")]
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExtends {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct RawCompilerOptions {
    #[serde(default, rename = "baseUrl")]
    base_url: Option<String>,
    #[serde(default)]
    paths: Option<IndexMap<String, Vec<String>>>,
}

/// One tsconfig file as written, before `extends` is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TsConfigFile {
    pub path: PathBuf,
    /// `extends` entries in declaration order.
    pub extends: Vec<String>,
    base_url: Option<PathBuf>,
    paths: Option<IndexMap<String, Vec<String>>>,
}

impl TsConfigFile {
    /// Parse the tsconfig at `path`.
    ///
    /// Comments and trailing commas are tolerated. Unknown options are
    /// ignored.
    pub fn parse(path: &Path, text: &str) -> serde_json::Result<Self> {
        let raw: RawConfig = serde_json::from_str(&strip_jsonc(text))?;
        let dir = config_dir(path);

        let extends = match raw.extends {
            None => Vec::new(),
            Some(RawExtends::One(base)) => vec![base],
            Some(RawExtends::Many(bases)) => bases,
        };

        Ok(Self {
            path: path.to_path_buf(),
            extends,
            base_url: raw
                .compiler_options
                .base_url
                .map(|base| path_clean::clean(dir.join(base))),
            paths: raw.compiler_options.paths,
        })
    }

    /// Candidate files for `extends` entry `base`, in lookup order.
    ///
    /// Relative and absolute entries are files (`.json` may be omitted).
    /// Anything else names a package config below `node_modules`.
    pub fn extends_candidates(&self, base: &str) -> Vec<PathBuf> {
        let dir = config_dir(&self.path);
        let target = if is_third_party(base) {
            dir.join("node_modules").join(base)
        } else {
            clean_join(dir, base)
        };

        if target.extension().is_some_and(|ext| ext == "json") {
            return vec![target];
        }
        vec![
            PathBuf::from(format!("{}.json", target.display())),
            target.join("tsconfig.json"),
        ]
    }
}

impl CompilerOptions {
    /// Options of a single tsconfig without `extends`.
    pub fn parse(config_path: &Path, text: &str) -> serde_json::Result<Self> {
        let mut options = Self::default();
        options.overlay(TsConfigFile::parse(config_path, text)?);
        Ok(options)
    }

    /// Apply `file` on top of the options collected so far. Options the file
    /// sets replace inherited ones.
    pub fn overlay(&mut self, file: TsConfigFile) {
        if let Some(base_url) = file.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(paths) = file.paths {
            self.paths = paths;
            self.paths_dir = Some(config_dir(&file.path).to_path_buf());
        }
    }

    /// Directory `paths` targets are relative to: `baseUrl`, else the
    /// directory of the tsconfig declaring `paths`, else `config_dir`.
    pub fn paths_base<'a>(&'a self, config_dir: &'a Path) -> &'a Path {
        self.base_url
            .as_deref()
            .or(self.paths_dir.as_deref())
            .unwrap_or(config_dir)
    }
}

fn config_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Remove `//` and `/* */` comments and trailing commas, leaving string
/// contents untouched.
fn strip_jsonc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            match ch {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            _ => out.push(ch),
        }
    }

    remove_trailing_commas(&out)
}

fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if in_string {
            out.push(ch);
            if ch == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
            out.push(ch);
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(ch);
            }
        } else {
            out.push(ch);
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commented_config() {
        let text = r#"{
            // editor settings
            "compilerOptions": {
                "baseUrl": "./src", /* relative */
                "paths": {
                    "@/*": ["./*"],
                    "~utils": ["lib/utils/index.ts"],
                },
                "jsx": "react-jsx",
            },
        }"#;

        let options = CompilerOptions::parse(Path::new("/app/tsconfig.json"), text).unwrap();
        assert_eq!(options.base_url, Some(PathBuf::from("/app/src")));
        assert_eq!(options.paths["@/*"], ["./*"]);
        assert_eq!(options.paths["~utils"], ["lib/utils/index.ts"]);
    }

    #[test]
    fn keeps_comment_markers_inside_strings() {
        let text = r#"{ "compilerOptions": { "paths": { "//x/*": ["a/*,"] } } }"#;
        let options = CompilerOptions::parse(Path::new("/app/tsconfig.json"), text).unwrap();
        assert_eq!(options.paths["//x/*"], ["a/*,"]);
        assert_eq!(options.base_url, None);
        assert_eq!(options.paths_base(Path::new("/app")), Path::new("/app"));
    }

    #[test]
    fn missing_compiler_options_is_empty() {
        let options = CompilerOptions::parse(Path::new("/app/tsconfig.json"), "{}").unwrap();
        assert_eq!(options, CompilerOptions::default());
    }

    #[test]
    fn child_options_override_extended_ones() {
        let base = TsConfigFile::parse(
            Path::new("/app/config/tsconfig.base.json"),
            r#"{ "compilerOptions": { "baseUrl": "..", "paths": { "@/*": ["src/*"] } } }"#,
        )
        .unwrap();
        let child = TsConfigFile::parse(
            Path::new("/app/tsconfig.json"),
            r#"{ "extends": ["./config/tsconfig.base"], "compilerOptions": { "baseUrl": "lib" } }"#,
        )
        .unwrap();
        assert_eq!(child.extends, ["./config/tsconfig.base"]);

        let mut options = CompilerOptions::default();
        options.overlay(base);
        assert_eq!(options.base_url, Some(PathBuf::from("/app")));
        options.overlay(child);

        assert_eq!(options.base_url, Some(PathBuf::from("/app/lib")));
        assert_eq!(options.paths["@/*"], ["src/*"]);
        assert_eq!(options.paths_dir.as_deref(), Some(Path::new("/app/config")));
    }

    #[test]
    fn extends_candidates() {
        let file = TsConfigFile::parse(Path::new("/app/tsconfig.json"), "{}").unwrap();

        assert_eq!(
            file.extends_candidates("./tsconfig.base.json"),
            [PathBuf::from("/app/tsconfig.base.json")]
        );
        assert_eq!(
            file.extends_candidates("../shared/base"),
            [
                PathBuf::from("/shared/base.json"),
                PathBuf::from("/shared/base/tsconfig.json")
            ]
        );
        assert_eq!(
            file.extends_candidates("@tsconfig/strictest"),
            [
                PathBuf::from("/app/node_modules/@tsconfig/strictest.json"),
                PathBuf::from("/app/node_modules/@tsconfig/strictest/tsconfig.json")
            ]
        );
    }
}
