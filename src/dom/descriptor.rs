use crate::dom::element::DomNode;
use crate::dom::path::find_first;
use crate::dom::scan::Uid;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Snapshot of one interactable element, valid until the next scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractableDescriptor {
    pub uid: Uid,
    pub tag: String,
    pub text: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub input_mode: Option<String>,
    pub autocomplete: Option<String>,
    pub aria_label: Option<String>,
    pub placeholder: Option<String>,
    pub alt: Option<String>,
    pub role: Option<String>,
    pub label: Option<String>,
    pub data_attrs: Option<IndexMap<String, String>>,
    pub options: Option<Vec<String>>,
}

impl InteractableDescriptor {
    /// Describe `node`; `ancestors` runs from the root element to the node's parent
    pub fn describe(uid: Uid, node: &DomNode, root: &DomNode, ancestors: &[&DomNode]) -> Self {
        let inner = node.inner_text();
        let text = if inner.is_empty() {
            node.value.as_deref().unwrap_or_default().trim().to_string()
        } else {
            inner
        };

        Self {
            uid,
            tag: node.tag_name.clone(),
            text,
            name: node.attribute_text("name"),
            input_type: node.attribute_text("type"),
            input_mode: node.attribute_text("inputmode"),
            autocomplete: node.attribute_text("autocomplete"),
            aria_label: node.attribute_text("aria-label"),
            placeholder: node.attribute_text("placeholder"),
            alt: node.attribute_text("alt"),
            role: node.attribute_text("role"),
            label: label_text(node, root, ancestors),
            data_attrs: data_attributes(node),
            options: options(node),
        }
    }
}

/// Text of `label[for=<id>]`, else of the nearest enclosing `label`
pub fn label_text(node: &DomNode, root: &DomNode, ancestors: &[&DomNode]) -> Option<String> {
    if let Some(id) = node.id() {
        let for_label = find_first(root, &|n: &DomNode| {
            n.is_tag("label") && n.get_attribute("for").is_some_and(|target| target == id)
        });
        if let Some(label) = for_label {
            return non_empty(label.inner_text());
        }
    }

    ancestors
        .iter()
        .rev()
        .find(|ancestor| ancestor.is_tag("label"))
        .and_then(|label| non_empty(label.inner_text()))
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn data_attributes(node: &DomNode) -> Option<IndexMap<String, String>> {
    let data: IndexMap<String, String> = node
        .attributes
        .iter()
        .filter(|(name, _)| name.starts_with("data-"))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    (!data.is_empty()).then_some(data)
}

fn options(node: &DomNode) -> Option<Vec<String>> {
    if node.is_tag("select") {
        let mut texts = Vec::new();
        collect_options(node, &mut texts);
        return Some(texts);
    }

    let input_type = node.get_attribute("type").map(|t| t.to_ascii_lowercase());
    if matches!(input_type.as_deref(), Some("radio") | Some("checkbox")) {
        let value = node
            .value
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| node.attribute_text("value"))
            .or_else(|| node.attribute_text("name"))
            .unwrap_or_default();
        return Some(vec![value]);
    }

    None
}

fn collect_options(node: &DomNode, texts: &mut Vec<String>) {
    for child in &node.children {
        if child.is_tag("option") {
            texts.push(child.inner_text());
        } else {
            collect_options(child, texts);
        }
    }
}

/// Normalize free text into a field name: lower-case, whitespace runs become
/// `_`, everything outside `[A-Za-z0-9_]` is dropped
pub fn sanitize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Field name for a value typed into `node`: label text, then aria-label, then
/// placeholder, then `fallback`
pub fn infer_field_name(node: &DomNode, label: Option<&str>, fallback: &str) -> String {
    let candidates = [
        label.map(str::to_string),
        node.attribute_text("aria-label"),
        node.attribute_text("placeholder"),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|text| sanitize_key(&text))
        .find(|key| !key.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("  Email  Address: "), "email_address");
        assert_eq!(sanitize_key("First-name *"), "firstname_");
        assert_eq!(sanitize_key("!!!"), "");
    }

    #[test]
    fn test_infer_field_name_priority() {
        let input = DomNode::new("input")
            .with_attribute("aria-label", "Work Email")
            .with_attribute("placeholder", "you@example.com");

        assert_eq!(infer_field_name(&input, Some("E-mail"), "unknown_field"), "email");
        assert_eq!(infer_field_name(&input, None, "unknown_field"), "work_email");

        let placeholder_only = DomNode::new("input").with_attribute("placeholder", "Your City");
        assert_eq!(infer_field_name(&placeholder_only, None, "unknown_field"), "your_city");

        let bare = DomNode::new("input");
        assert_eq!(infer_field_name(&bare, Some("***"), "unknown_field"), "unknown_field");
    }

    #[test]
    fn test_label_for_attribute() {
        let input = DomNode::new("input").with_attribute("id", "email");
        let root = DomNode::new("html").with_child(
            DomNode::new("body")
                .with_child(DomNode::new("label").with_attribute("for", "email").with_text(" Email "))
                .with_child(input.clone()),
        );
        let body = &root.children[0];

        assert_eq!(label_text(&input, &root, &[&root, body]), Some("Email".to_string()));
    }

    #[test]
    fn test_label_enclosing() {
        let input = DomNode::new("input").with_attribute("type", "checkbox").with_attribute("name", "terms");
        let label = DomNode::new("label").with_text("Accept terms").with_child(input.clone());
        let root = DomNode::new("html").with_child(DomNode::new("body").with_child(label));
        let body = &root.children[0];
        let label = &body.children[0];

        assert_eq!(label_text(&input, &root, &[&root, body, label]), Some("Accept terms".to_string()));
        assert_eq!(label_text(&input, &root, &[&root, body]), None);
    }

    #[test]
    fn test_describe_select() {
        let select = DomNode::new("select")
            .with_attribute("name", "country")
            .with_attribute("data-test", "country-select")
            .with_child(DomNode::new("option").with_text("Germany"))
            .with_child(DomNode::new("optgroup").with_child(DomNode::new("option").with_text("France")));
        let root = DomNode::new("html");

        let descriptor = InteractableDescriptor::describe(Uid::new(3), &select, &root, &[&root]);

        assert_eq!(descriptor.uid.as_str(), "el_3");
        assert_eq!(descriptor.tag, "select");
        assert_eq!(descriptor.name.as_deref(), Some("country"));
        assert_eq!(descriptor.options, Some(vec!["Germany".to_string(), "France".to_string()]));
        assert_eq!(
            descriptor.data_attrs.unwrap().get("data-test").map(String::as_str),
            Some("country-select")
        );
        assert!(descriptor.label.is_none());
    }

    #[test]
    fn test_describe_input_text_falls_back_to_value() {
        let input = DomNode::new("input")
            .with_attribute("type", "text")
            .with_attribute("inputmode", "email")
            .with_attribute("autocomplete", "email")
            .with_value("  typed ");
        let root = DomNode::new("html");

        let descriptor = InteractableDescriptor::describe(Uid::new(0), &input, &root, &[&root]);

        assert_eq!(descriptor.text, "typed");
        assert_eq!(descriptor.input_type.as_deref(), Some("text"));
        assert_eq!(descriptor.input_mode.as_deref(), Some("email"));
        assert_eq!(descriptor.autocomplete.as_deref(), Some("email"));
        assert!(descriptor.options.is_none());
        assert!(descriptor.data_attrs.is_none());

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "text");
        assert!(json["placeholder"].is_null());
    }

    #[test]
    fn test_describe_radio_options() {
        let radio = DomNode::new("input")
            .with_attribute("type", "radio")
            .with_attribute("name", "plan");
        let root = DomNode::new("html");

        let descriptor = InteractableDescriptor::describe(Uid::new(1), &radio, &root, &[&root]);
        assert_eq!(descriptor.options, Some(vec!["plan".to_string()]));
    }
}
