// Path algebra for the explorer. Paths are absolute strings using `/` as the
// separator, and a trailing `/` is what makes a path a folder. Nothing in here
// looks at the map; the explorer builds all of its hierarchy on top of these.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

pub const SEPARATOR: char = '/';
pub const ROOT: &str = "/";

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
}

pub fn classify(path: &str) -> ItemKind {
    if path.ends_with(SEPARATOR) {
        ItemKind::Folder
    } else {
        ItemKind::File
    }
}

pub fn is_folder(path: &str) -> bool {
    classify(path) == ItemKind::Folder
}

fn segments(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Last non-empty segment of the path. Root has no name.
pub fn item_name(path: &str) -> &str {
    segments(path).next_back().unwrap_or("")
}

/// Folder containing `path`, always with a trailing separator.
pub fn parent_path(path: &str) -> String {
    let parts: Vec<&str> = segments(path).collect();
    if parts.len() <= 1 {
        return ROOT.to_string();
    }
    let mut parent = String::from(ROOT);
    for part in &parts[..parts.len() - 1] {
        parent.push_str(part);
        parent.push(SEPARATOR);
    }
    parent
}

pub fn is_valid_name(name: &str) -> bool {
    if name.starts_with('.') || name.contains("//") || name.contains("..") {
        return false;
    }
    NAME_PATTERN.is_match(name)
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with(SEPARATOR) && !path.contains("//")
}

/// The folder form of a path.
pub fn as_folder(path: &str) -> Cow<'_, str> {
    if path.ends_with(SEPARATOR) {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("{}{}", path, SEPARATOR))
    }
}

/// Segment-aware containment: `path` is `target` itself or lies beneath it.
/// `/foobar` is never within `/foo`.
pub fn is_within(path: &str, target: &str) -> bool {
    if path == target {
        return true;
    }
    if target.ends_with(SEPARATOR) {
        return path.starts_with(target);
    }
    path.len() > target.len()
        && path.starts_with(target)
        && path[target.len()..].starts_with(SEPARATOR)
}

/// Folder paths strictly between root and `path`, shallowest first.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut current = parent_path(path);
    while current != ROOT {
        let next = parent_path(&current);
        found.push(current);
        current = next;
    }
    found.reverse();
    found
}

/// Number of segments in the path; root has depth zero.
pub fn depth(path: &str) -> usize {
    segments(path).count()
}

/// Substitute `replacement` for every segment exactly equal to `segment`,
/// keeping the path's kind. `None` when no segment matches.
pub(crate) fn substitute_segment(path: &str, segment: &str, replacement: &str) -> Option<String> {
    let parts: Vec<&str> = segments(path).collect();
    if !parts.iter().any(|part| *part == segment) {
        return None;
    }
    let mut rebuilt = String::from(ROOT);
    for (i, part) in parts.iter().enumerate() {
        rebuilt.push_str(if *part == segment { replacement } else { part });
        if i + 1 < parts.len() || is_folder(path) {
            rebuilt.push(SEPARATOR);
        }
    }
    Some(rebuilt)
}
