//! Path helpers shared by the graph and the resolver.
//!
//! Entry paths reported by editors and dev servers may use Windows drive
//! letters, WSL network shares or `file://` URLs. [`normalize_entry_path`]
//! maps them onto the convention of the host so that every spelling of a file
//! ends up as the same graph node.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

const FILE_URL_PREFIX: &str = "file://";
const WSL_SHARES: &[&str] = &["wsl$", "wsl.localhost"];
const MOUNT_ROOT: &str = "/mnt";

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty())
}

/// `C:`, `C:\...` or `C:/...`
fn drive_letter(path: &str) -> Option<char> {
    let bytes = path.as_bytes();
    let is_drive = bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\');
    is_drive.then(|| bytes[0] as char)
}

fn from_wsl_share(path: &str) -> Option<String> {
    let parts: Vec<&str> = segments(path).collect();
    let share = parts
        .iter()
        .position(|s| WSL_SHARES.iter().any(|w| s.eq_ignore_ascii_case(w)))?;
    // Skip the share marker and the distribution name.
    let rest = parts.get(share + 2..)?;
    Some(format!("/{}", rest.join("/")))
}

fn from_drive_path(path: &str) -> Option<String> {
    let drive = drive_letter(path)?.to_ascii_lowercase();
    let rest: Vec<&str> = segments(&path[2..]).collect();
    if rest.is_empty() {
        Some(format!("{MOUNT_ROOT}/{drive}"))
    } else {
        Some(format!("{MOUNT_ROOT}/{drive}/{}", rest.join("/")))
    }
}

fn from_mount_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix(MOUNT_ROOT)?.strip_prefix('/')?;
    let mut parts = segments(rest);
    let drive = parts.next().filter(|d| d.len() == 1)?;
    let tail: Vec<&str> = parts.collect();
    Some(format!("{}:\\{}", drive.to_ascii_uppercase(), tail.join("\\")))
}

/// Translate an entry path into the host's path convention.
///
/// On Unix hosts WSL shares (`\\wsl$\Ubuntu\home\me\app`) become `/home/me/app`
/// and drive paths (`C:\app`) become `/mnt/c/app`. On Windows `/mnt/c/app`
/// becomes `C:\app`. A leading `file://` is always removed.
pub fn normalize_entry_path(raw: &str) -> String {
    let mut path = raw.strip_prefix(FILE_URL_PREFIX).unwrap_or(raw);
    // file:///C:/app
    if path.starts_with('/') && drive_letter(&path[1..]).is_some() {
        path = &path[1..];
    }

    if cfg!(windows) {
        return from_mount_path(path).unwrap_or_else(|| path.to_string());
    }

    from_wsl_share(path)
        .or_else(|| from_drive_path(path))
        .unwrap_or_else(|| path.to_string())
}

/// Whether an import specifier names a package instead of a file.
///
/// Anything not starting with `/`, `\`, `.` or a drive letter is third-party.
pub fn is_third_party(specifier: &str) -> bool {
    !specifier.starts_with('/')
        && !specifier.starts_with('\\')
        && !specifier.starts_with('.')
        && drive_letter(specifier).is_none()
}

/// Story files follow the `Name.stories.tsx` naming convention.
pub fn is_story_file(file_name: &str) -> bool {
    file_name.contains(".stories.")
}

/// Human readable name for a file.
///
/// Uses the file name up to the first `.`; `index` files take the name of
/// their directory. Leading non-letters and non-alphanumerics are dropped.
pub fn display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();

    let base = if stem == "index" {
        path.parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| stem.to_string())
    } else {
        stem.to_string()
    };

    let identifier: String = base
        .trim_start_matches(|c: char| !c.is_ascii_alphabetic())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if !identifier.is_empty() {
        identifier
    } else if !stem.is_empty() {
        stem.to_string()
    } else {
        file_name
    }
}

/// Join `path` onto `base` (unless absolute) and remove `.`/`..` segments.
pub fn clean_join(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf().clean()
    } else {
        base.join(path).clean()
    }
}
