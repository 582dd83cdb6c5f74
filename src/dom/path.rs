use crate::dom::element::DomNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an element in a snapshot: child indices from the root element
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub Vec<usize>);

impl NodeHandle {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

impl From<Vec<usize>> for NodeHandle {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

/// Sibling-indexed tag path from below the root element, e.g.
/// `body > form > div:nth-of-type(2) > input`.
///
/// Deterministic for a given DOM shape and usable as a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralPath(String);

impl StructuralPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the `index`-th child of the element at `self`
    pub(crate) fn descend(&self, parent: &DomNode, index: usize) -> StructuralPath {
        let selector = step_selector(parent, index);
        if self.0.is_empty() {
            StructuralPath(selector)
        } else {
            StructuralPath(format!("{} > {}", self.0, selector))
        }
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selector for one step: the tag, qualified with `:nth-of-type` when the
/// parent has more than one child of that tag
fn step_selector(parent: &DomNode, index: usize) -> String {
    let tag = &parent.children[index].tag_name;
    let mut count = 0;
    let mut position = 0;
    for (i, sibling) in parent.children.iter().enumerate() {
        if sibling.tag_name.eq_ignore_ascii_case(tag) {
            if i == index {
                position = count;
            }
            count += 1;
        }
    }
    let tag = tag.to_ascii_lowercase();
    if count > 1 {
        format!("{}:nth-of-type({})", tag, position + 1)
    } else {
        tag
    }
}

/// Compute the structural path of the element at `handle`; `None` if the handle
/// does not resolve. The root element itself has the empty path.
pub fn structural_path(root: &DomNode, handle: &NodeHandle) -> Option<StructuralPath> {
    let mut node = root;
    let mut path = StructuralPath::new("");
    for &index in &handle.0 {
        if index >= node.children.len() {
            return None;
        }
        path = path.descend(node, index);
        node = &node.children[index];
    }
    Some(path)
}

/// Handle of the element whose structural path is `path`
pub fn locate(root: &DomNode, path: &StructuralPath) -> Option<NodeHandle> {
    let mut node = root;
    let mut here = StructuralPath::new("");
    let mut handle = NodeHandle::root();
    while here != *path {
        let (index, next) = (0..node.children.len())
            .map(|index| (index, here.descend(node, index)))
            .find(|(_, step)| step == path || path.as_str().starts_with(&format!("{} > ", step)))?;
        handle = handle.child(index);
        node = &node.children[index];
        here = next;
    }
    Some(handle)
}

/// Root-to-element chain for `handle`, element last
pub fn lineage<'a>(root: &'a DomNode, handle: &NodeHandle) -> Option<Vec<&'a DomNode>> {
    let mut chain = vec![root];
    let mut node = root;
    for &index in &handle.0 {
        node = node.children.get(index)?;
        chain.push(node);
    }
    Some(chain)
}

/// First element in document order matching `predicate`
pub fn find_first<'a>(root: &'a DomNode, predicate: &dyn Fn(&DomNode) -> bool) -> Option<&'a DomNode> {
    if predicate(root) {
        return Some(root);
    }
    root.children.iter().find_map(|child| find_first(child, predicate))
}

/// True when the element or one of its ancestors carries one of `ids`
pub fn within_subtree(root: &DomNode, handle: &NodeHandle, ids: &[String]) -> bool {
    lineage(root, handle).is_some_and(|chain| {
        chain
            .iter()
            .any(|node| node.id().is_some_and(|id| ids.iter().any(|candidate| candidate == id)))
    })
}
