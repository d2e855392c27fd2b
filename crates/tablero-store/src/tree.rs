//! Path and JSON-tree helpers shared by the store backends.
//!
//! Paths are `/`-separated segment lists. The empty path names the root.
//! A `null` value or an empty object is never stored: writing one deletes
//! the node, and removing the last child of an object removes the object.

use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']'];

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Normalize a path: drop empty segments and surrounding slashes.
pub fn normalize(path: &str) -> String {
    segments(path).join("/")
}

/// Join a relative path onto a base path.
pub fn join(base: &str, rel: &str) -> String {
    let mut segs = segments(base);
    segs.extend(segments(rel));
    segs.join("/")
}

/// Reject segments containing characters the store does not allow in keys.
pub fn validate(path: &str) -> StoreResult<()> {
    if let Some(seg) = segments(path).into_iter().find(|s| s.contains(FORBIDDEN)) {
        return Err(StoreError::InvalidPath(format!(
            "segment '{}' in '{}' contains one of . # $ [ ]",
            seg, path
        )));
    }
    Ok(())
}

/// True when one path is an ancestor of (or equal to) the other.
///
/// A change at either end invalidates a snapshot taken at the other.
pub fn overlaps(a: &str, b: &str) -> bool {
    let a = segments(a);
    let b = segments(b);
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// Every proper ancestor of `path`, root excluded, shallowest first.
pub fn ancestors(path: &str) -> Vec<String> {
    let segs = segments(path);
    (1..segs.len()).map(|i| segs[..i].join("/")).collect()
}

/// True for values that the store treats as absent.
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Read the node at `segs`.
pub fn get_at<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segs {
        node = node.as_object()?.get(*seg)?;
    }
    if is_absent(node) {
        None
    } else {
        Some(node)
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Replace the node at `segs`, creating intermediate objects as needed.
///
/// Intermediate leaves are overwritten by objects. Absent values delete.
pub fn set_at(root: &mut Value, segs: &[&str], value: Value) {
    if is_absent(&value) {
        remove_at(root, segs);
        return;
    }
    let Some((last, parents)) = segs.split_last() else {
        *root = value;
        return;
    };
    let mut node = root;
    for seg in parents {
        node = ensure_object(node)
            .entry((*seg).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert((*last).to_string(), value);
}

/// Remove the node at `segs`, pruning parents left empty.
///
/// Returns whether anything was removed.
pub fn remove_at(root: &mut Value, segs: &[&str]) -> bool {
    let Some((first, rest)) = segs.split_first() else {
        let had_content = !is_absent(root);
        *root = Value::Object(Map::new());
        return had_content;
    };
    let Value::Object(map) = root else {
        return false;
    };
    if rest.is_empty() {
        return map.remove(*first).is_some();
    }
    let Some(child) = map.get_mut(*first) else {
        return false;
    };
    let removed = remove_at(child, rest);
    if is_absent(child) {
        map.remove(*first);
    }
    removed
}

/// Flatten a value into `(path, leaf)` pairs.
///
/// Objects are descended into; everything else, arrays included, is a leaf.
pub fn flatten(path: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&join(path, key), child, out);
            }
        }
        leaf => out.push((normalize(path), leaf.clone())),
    }
}

/// Rebuild the subtree rooted at `base` from flattened leaves.
pub fn inflate(base: &str, leaves: Vec<(String, Value)>) -> Option<Value> {
    let base_segs = segments(base);
    let mut root = Value::Object(Map::new());
    for (path, value) in leaves {
        let segs = segments(&path);
        if !segs.starts_with(&base_segs) {
            continue;
        }
        let rel = &segs[base_segs.len()..];
        if rel.is_empty() {
            return Some(value);
        }
        set_at(&mut root, rel, value);
    }
    if is_absent(&root) {
        None
    } else {
        Some(root)
    }
}
