use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tags that are always considered interactable
pub const INTERACTABLE_TAGS: [&str; 5] = ["input", "button", "select", "textarea", "a"];

/// Roles that make an arbitrary element interactable
pub const CLICKABLE_ROLES: [&str; 5] = ["button", "link", "checkbox", "radio", "switch"];

/// Represents one element of a page snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomNode {
    /// Lower-case tag name (e.g., "div", "button", "input")
    pub tag_name: String,

    /// Element attributes in document order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Text directly owned by the element (not its descendants)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Current value of form controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DomNode>,

    #[serde(default)]
    pub style: ComputedStyle,

    /// Bounding client rect, relative to the viewport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<ScrollMetrics>,

    /// A click handler was attached from script (not visible as an attribute)
    #[serde(default)]
    pub has_click_handler: bool,
}

/// The subset of computed style the scanner inspects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    pub pointer_events: String,
    pub overflow_y: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            pointer_events: "auto".to_string(),
            overflow_y: "visible".to_string(),
        }
    }
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub client_height: f64,
    pub scroll_top: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280.0, height: 800.0 }
    }
}

impl DomNode {
    /// Create a new DomNode with default style and no geometry
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            text_content: None,
            value: None,
            children: Vec::new(),
            style: ComputedStyle::default(),
            bounding_box: None,
            scroll: None,
            has_click_handler: false,
        }
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set the form control value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder method: append one child
    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: set computed style
    pub fn with_style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }

    /// Builder method: make the element a vertical scroll container
    pub fn with_scroll(mut self, scroll_height: f64, client_height: f64, scroll_top: f64) -> Self {
        self.style.overflow_y = "auto".to_string();
        self.scroll = Some(ScrollMetrics { scroll_height, client_height, scroll_top });
        self
    }

    /// Builder method: mark a script-attached click handler
    pub fn with_click_handler(mut self) -> Self {
        self.has_click_handler = true;
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Get a non-empty attribute value as owned text
    pub fn attribute_text(&self, key: &str) -> Option<String> {
        self.get_attribute(key).filter(|v| !v.is_empty()).cloned()
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id").filter(|id| !id.is_empty())
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Rendered text of the element and its descendants, whitespace-normalized
    pub fn inner_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        if let Some(text) = &self.text_content {
            parts.extend(text.split_whitespace());
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }

    /// Scroll container whose content overflows vertically
    pub fn is_scrollable(&self) -> bool {
        matches!(self.style.overflow_y.as_str(), "auto" | "scroll")
            && self
                .scroll
                .is_some_and(|s| s.scroll_height > s.client_height)
    }

    /// Interactable tag, clickable role/handler, focusable tabindex, or scroll container
    pub fn is_interactable(&self) -> bool {
        if INTERACTABLE_TAGS.iter().any(|&tag| self.is_tag(tag)) {
            return true;
        }

        let has_clickable_role = self
            .get_attribute("role")
            .is_some_and(|r| CLICKABLE_ROLES.contains(&r.to_ascii_lowercase().as_str()));

        let focusable = self
            .get_attribute("tabindex")
            .and_then(|t| t.trim().parse::<i64>().ok())
            .is_some_and(|t| t >= 0);

        self.has_click_handler
            || self.attributes.contains_key("onclick")
            || has_clickable_role
            || focusable
            || self.is_scrollable()
    }

    /// Not hidden by display, visibility, opacity or pointer-events
    pub fn is_visible(&self) -> bool {
        self.style.display != "none"
            && self.style.visibility != "hidden"
            && self.style.opacity != 0.0
            && self.style.pointer_events != "none"
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if the bounding box has non-zero dimensions
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Non-empty box that overlaps the viewport
    pub fn intersects(&self, viewport: &Viewport) -> bool {
        let bottom = self.y + self.height;
        let right = self.x + self.width;
        self.is_visible()
            && bottom >= 0.0
            && self.y <= viewport.height
            && right >= 0.0
            && self.x <= viewport.width
    }
}
