//! Extension and index-file candidates.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extensions tried, in order, for an extensionless specifier.
pub const EXTENSIONS: &[&str] = &["ts", "tsx", "d.ts", "js", "jsx", "mjs", "cjs", "json"];

/// TypeScript sources that may stand behind a `.js`-style specifier.
const TS_REPLACEMENTS: &[&str] = &["ts", "tsx", "d.ts"];

/// `.js` specifiers written in TypeScript sources point at `.ts` files.
const JS_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// `Button` + `tsx` -> `Button.tsx`, keeping any dots already in the name.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Every path `base` may refer to, most specific first:
/// the exact path, `base.<ext>`, a TypeScript file behind a `.js` name, then
/// `base/index.<ext>`.
pub fn candidates(base: &Path) -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(2 + EXTENSIONS.len() * 2);
    out.push(base.to_path_buf());

    for ext in EXTENSIONS {
        out.push(append_extension(base, ext));
    }

    let js_ext = base.extension().and_then(|e| e.to_str());
    if js_ext.is_some_and(|ext| JS_EXTENSIONS.contains(&ext)) {
        let stem = base.with_extension("");
        for ext in TS_REPLACEMENTS {
            out.push(append_extension(&stem, ext));
        }
    }

    for ext in EXTENSIONS {
        out.push(base.join(format!("index.{ext}")));
    }

    out
}

/// First candidate accepted by `exists`.
pub fn resolve_with_extensions(base: &Path, exists: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    candidates(base).into_iter().find(|candidate| exists(candidate))
}
