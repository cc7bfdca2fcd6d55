use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Host-assigned numeric id. Only meaningful within one workspace session.
pub type BlockId = u64;

/// Ordered property list; order is kept as written.
pub type Properties = Vec<(String, String)>;

pub const PAGE_TYPE_KEY: &str = "page-type";
pub const BACKGROUND_COLOR_KEY: &str = "background-color";

/// A node of a page's block tree.
///
/// `parent`, `page` and `left` are lookup keys into host state, not owned
/// links; children are owned and their order is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub uuid: Uuid,
    pub content: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub children: Vec<Block>,
    pub parent: Option<BlockId>,
    pub page: BlockId,
    pub left: Option<BlockId>,
}

impl Block {
    pub fn property(&self, key: &str) -> Option<&str> {
        get_property(&self.properties, key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// No text and no properties.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty() && self.properties.is_empty()
    }

    /// Whether this block carries the page-level marker written by the template.
    pub fn is_page_root(&self) -> bool {
        self.has_property(PAGE_TYPE_KEY)
    }
}

/// A page handle. Pages are always addressed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: BlockId,
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
}

pub fn get_property<'a>(properties: &'a Properties, key: &str) -> Option<&'a str> {
    properties
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Insert or replace `key`, keeping the position of an existing entry.
pub fn set_property(properties: &mut Properties, key: &str, value: &str) {
    match properties.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => properties.push((key.to_string(), value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(content: &str) -> Block {
        Block {
            id: 1,
            uuid: Uuid::new_v4(),
            content: content.to_string(),
            properties: Vec::new(),
            children: Vec::new(),
            parent: None,
            page: 0,
            left: None,
        }
    }

    #[test]
    fn blank_requires_no_properties() {
        let mut b = block("  ");
        assert!(b.is_blank());
        set_property(&mut b.properties, PAGE_TYPE_KEY, "news");
        assert!(!b.is_blank());
        assert!(b.is_page_root());
    }

    #[test]
    fn set_property_keeps_order() {
        let mut props = Properties::new();
        set_property(&mut props, "page-type", "news");
        set_property(&mut props, "author", "");
        set_property(&mut props, "page-type", "weekly");
        assert_eq!(
            props,
            vec![
                ("page-type".to_string(), "weekly".to_string()),
                ("author".to_string(), String::new()),
            ]
        );
        assert_eq!(get_property(&props, "author"), Some(""));
        assert_eq!(get_property(&props, "topics"), None);
    }
}
