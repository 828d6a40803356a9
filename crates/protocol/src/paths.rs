use std::fmt;
use std::path::{Component, Path, MAIN_SEPARATOR};

/// Canonical separator used in every descriptor id and relative path.
pub const SEPARATOR: char = '/';

/// Collapse platform separators, `.` segments and repeated slashes into the canonical form.
///
/// Only the host separator is rewritten: on Unix a `\` is an ordinary file name byte.
pub fn normalize_relative_path(raw: &str) -> String {
    unify_separators(raw)
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn unify_separators(raw: &str) -> String {
    if MAIN_SEPARATOR == SEPARATOR {
        raw.to_string()
    } else {
        raw.replace(MAIN_SEPARATOR, "/")
    }
}

/// Relative path of `path` under `root`, joined with [`SEPARATOR`].
///
/// Returns `None` when `path` is not inside `root` or resolves to `root` itself.
pub fn relative_path_from(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Last segment of a canonical relative path.
pub fn base_name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRejection {
    Empty,
    Absolute,
    ParentTraversal,
}

impl fmt::Display for PathRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Empty => "path is empty",
            Self::Absolute => "path must be relative to the root",
            Self::ParentTraversal => "path must not contain '..'",
        };
        f.write_str(text)
    }
}

/// Validate a client-supplied path and return its canonical form.
///
/// Whitespace is kept: a leading or trailing space is part of a file name.
pub fn validate_relative_path(raw: &str) -> Result<String, PathRejection> {
    let unified = unify_separators(raw);
    if unified.starts_with(SEPARATOR) || has_drive_prefix(&unified) {
        return Err(PathRejection::Absolute);
    }
    if unified.split(SEPARATOR).any(|segment| segment == "..") {
        return Err(PathRejection::ParentTraversal);
    }

    let normalized = normalize_relative_path(&unified);
    if normalized.is_empty() {
        return Err(PathRejection::Empty);
    }
    Ok(normalized)
}

fn has_drive_prefix(path: &str) -> bool {
    if !cfg!(windows) {
        return false;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
