//! 工作区逻辑路径工具
//!
//! Logical paths are `/`-delimited and start with the root directory's own
//! name, e.g. `proj/src/index.ts`. They never start or end with `/`.

pub const SEPARATOR: char = '/';

pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        return name.to_string();
    }
    let mut path = String::with_capacity(parent.len() + 1 + name.len());
    path.push_str(parent);
    path.push(SEPARATOR);
    path.push_str(name);
    path
}

/// Splits `a/b/c` into (`a/b`, `c`). A single segment has no parent.
pub fn split_parent(path: &str) -> (Option<&str>, &str) {
    match path.rfind(SEPARATOR) {
        Some(idx) => (Some(&path[..idx]), &path[idx + 1..]),
        None => (None, path),
    }
}

pub fn parent(path: &str) -> Option<&str> {
    split_parent(path).0
}

pub fn file_name(path: &str) -> &str {
    split_parent(path).1
}

/// True when `path` is `ancestor` itself or lies underneath it.
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}

/// Replaces the `old_prefix` of `path` with `new_prefix`; `None` if `path`
/// is not under `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_same_or_descendant(path, old_prefix) {
        return None;
    }
    let mut rebased = String::with_capacity(new_prefix.len() + path.len() - old_prefix.len());
    rebased.push_str(new_prefix);
    rebased.push_str(&path[old_prefix.len()..]);
    Some(rebased)
}

/// Canonical form: trims whitespace, drops empty and `.` segments.
pub fn normalize(path: &str) -> String {
    path.trim()
        .split(SEPARATOR)
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Segments below the root, or `None` when `path` is not rooted at `root`.
pub fn relative_segments<'a>(path: &'a str, root: &str) -> Option<Vec<&'a str>> {
    if path == root {
        return Some(Vec::new());
    }
    let rest = path.strip_prefix(root)?.strip_prefix(SEPARATOR)?;
    Some(rest.split(SEPARATOR).filter(|seg| !seg.is_empty()).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/models/path.rs"]
mod tests;
