use crate::dom::descriptor::InteractableDescriptor;
use crate::dom::element::{DomNode, Viewport};
use crate::dom::page::PageSnapshot;
use crate::dom::path::StructuralPath;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Short-lived element identifier (`el_<n>`), meaningful within one scan generation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(counter: usize) -> Self {
        Self(format!("el_{}", counter))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bidirectional uid/path mapping produced by one scan.
///
/// Immutable once built; a rescan produces a new generation.
#[derive(Debug, Clone, Default)]
pub struct ScanGeneration {
    serial: u64,
    uid_to_path: IndexMap<Uid, StructuralPath>,
    path_to_uid: HashMap<StructuralPath, Uid>,
}

impl ScanGeneration {
    pub fn empty() -> Self {
        Self::default()
    }

    fn register(&mut self, path: StructuralPath) -> Uid {
        let uid = Uid::new(self.uid_to_path.len());
        self.uid_to_path.insert(uid.clone(), path.clone());
        self.path_to_uid.insert(path, uid.clone());
        uid
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn uid_for(&self, path: &StructuralPath) -> Option<&Uid> {
        self.path_to_uid.get(path)
    }

    pub fn path_for(&self, uid: &Uid) -> Option<&StructuralPath> {
        self.uid_to_path.get(uid)
    }

    /// Iterate over all (uid, path) pairs in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&Uid, &StructuralPath)> {
        self.uid_to_path.iter()
    }

    pub fn len(&self) -> usize {
        self.uid_to_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uid_to_path.is_empty()
    }
}

/// Result of scanning a page snapshot
#[derive(Debug, Clone)]
pub struct Scan {
    pub generation: ScanGeneration,

    /// Descriptors of the visible interactables, in document order
    pub interactables: Vec<InteractableDescriptor>,

    /// Every overflowing scroll container, visible or not
    pub scrollables: Vec<StructuralPath>,
}

/// Enumerate visible, in-viewport interactables and assign fresh uids.
///
/// Rebuilds everything from the snapshot; nothing carries over from earlier scans.
pub fn scan_page(snapshot: &PageSnapshot, serial: u64) -> Scan {
    let mut scan = Scan {
        generation: ScanGeneration { serial, ..Default::default() },
        interactables: Vec::new(),
        scrollables: Vec::new(),
    };
    let mut ancestors = Vec::new();
    visit(
        &snapshot.root,
        &snapshot.root,
        StructuralPath::new(""),
        &mut ancestors,
        &snapshot.viewport,
        &mut scan,
    );
    scan
}

fn visit<'a>(
    node: &'a DomNode,
    root: &'a DomNode,
    path: StructuralPath,
    ancestors: &mut Vec<&'a DomNode>,
    viewport: &Viewport,
    scan: &mut Scan,
) {
    if node.is_scrollable() {
        scan.scrollables.push(path.clone());
    }

    let in_viewport = node.bounding_box.is_some_and(|b| b.intersects(viewport));
    if node.is_interactable() && node.is_visible() && in_viewport {
        let uid = scan.generation.register(path.clone());
        scan.interactables
            .push(InteractableDescriptor::describe(uid, node, root, ancestors));
    }

    ancestors.push(node);
    for (index, child) in node.children.iter().enumerate() {
        visit(child, root, path.descend(node, index), ancestors, viewport, scan);
    }
    ancestors.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::element::ComputedStyle;

    fn create_test_page() -> PageSnapshot {
        let root = DomNode::new("html").with_child(
            DomNode::new("body")
                .with_child(
                    DomNode::new("form")
                        .with_child(
                            DomNode::new("label")
                                .with_attribute("for", "email")
                                .with_text("Email"),
                        )
                        .with_child(
                            DomNode::new("input")
                                .with_attribute("id", "email")
                                .with_bounding_box(10.0, 10.0, 200.0, 20.0),
                        )
                        .with_child(
                            DomNode::new("input")
                                .with_attribute("type", "hidden")
                                .with_style(ComputedStyle { display: "none".to_string(), ..Default::default() })
                                .with_bounding_box(10.0, 40.0, 200.0, 20.0),
                        )
                        .with_child(
                            DomNode::new("button")
                                .with_text("Sign in")
                                .with_bounding_box(10.0, 70.0, 80.0, 20.0),
                        ),
                )
                .with_child(DomNode::new("a").with_text("Below fold").with_bounding_box(10.0, 2000.0, 80.0, 20.0))
                .with_child(
                    DomNode::new("div")
                        .with_scroll(2000.0, 300.0, 0.0)
                        .with_bounding_box(300.0, 10.0, 200.0, 300.0),
                )
                .with_child(
                    DomNode::new("div")
                        .with_scroll(2000.0, 300.0, 0.0)
                        .with_style(ComputedStyle {
                            overflow_y: "scroll".to_string(),
                            visibility: "hidden".to_string(),
                            ..Default::default()
                        })
                        .with_bounding_box(300.0, 400.0, 200.0, 300.0),
                ),
        );

        PageSnapshot::new("https://example.com/login", root)
    }

    #[test]
    fn test_scan_assigns_uids_in_document_order() {
        let scan = scan_page(&create_test_page(), 1);

        let assigned: Vec<_> = scan
            .generation
            .iter()
            .map(|(uid, path)| (uid.as_str().to_string(), path.as_str().to_string()))
            .collect();

        assert_eq!(
            assigned,
            vec![
                ("el_0".to_string(), "body > form > input:nth-of-type(1)".to_string()),
                ("el_1".to_string(), "body > form > button".to_string()),
                ("el_2".to_string(), "body > div:nth-of-type(1)".to_string()),
            ]
        );
        assert_eq!(scan.generation.serial(), 1);
    }

    #[test]
    fn test_scan_descriptors() {
        let scan = scan_page(&create_test_page(), 0);

        assert_eq!(scan.interactables.len(), 3);
        assert_eq!(scan.interactables[0].label.as_deref(), Some("Email"));
        assert_eq!(scan.interactables[1].text, "Sign in");
        assert_eq!(scan.interactables[2].tag, "div");
    }

    #[test]
    fn test_scan_collects_all_scrollables() {
        let scan = scan_page(&create_test_page(), 0);
        let paths: Vec<_> = scan.scrollables.iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["body > div:nth-of-type(1)", "body > div:nth-of-type(2)"]);
    }

    #[test]
    fn test_lookup_both_directions() {
        let scan = scan_page(&create_test_page(), 0);
        let path = StructuralPath::new("body > form > button");

        let uid = scan.generation.uid_for(&path).unwrap();
        assert_eq!(uid.as_str(), "el_1");
        assert_eq!(scan.generation.path_for(uid), Some(&path));
        assert!(scan.generation.uid_for(&StructuralPath::new("body > a")).is_none());
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let page = create_test_page();
        let first = scan_page(&page, 1);
        let second = scan_page(&page, 2);

        let paths = |scan: &Scan| scan.generation.iter().map(|(_, p)| p.clone()).collect::<Vec<_>>();
        assert_eq!(paths(&first), paths(&second));
        assert_eq!(first.interactables, second.interactables);
        assert_ne!(first.generation.serial(), second.generation.serial());
    }

    #[test]
    fn test_empty_page() {
        let scan = scan_page(&PageSnapshot::new("about:blank", DomNode::new("html")), 0);
        assert!(scan.generation.is_empty());
        assert!(scan.interactables.is_empty());
        assert!(scan.scrollables.is_empty());
    }
}
