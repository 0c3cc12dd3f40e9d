//! # Snapshots
//!
//! Immutable value copies of the visual tree, the payload submitted to the
//! host. Snapshots never hold live references; equality is structural.
//!
//! Wire shape:
//!
//! ```text
//! {tag, id, classes: [string], attrs: {k: v}, styles: {k: v}, children: [Snapshot | {text}]}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    Element(ElementSnapshot),
    Text(TextSnapshot),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,

    /// Empty only in hand-written snapshots; the serializer always assigns one
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub classes: Vec<String>,

    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    #[serde(default)]
    pub styles: BTreeMap<String, String>,

    #[serde(default)]
    pub children: Vec<Snapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSnapshot {
    pub text: String,
}

impl Snapshot {
    pub fn element(tag: impl Into<String>, id: impl Into<String>) -> Self {
        Snapshot::Element(ElementSnapshot {
            tag: tag.into(),
            id: id.into(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Snapshot::Text(TextSnapshot { text: text.into() })
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        if let Snapshot::Element(ref mut element) = self {
            element.classes.push(class.into());
        }
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Snapshot::Element(ref mut element) = self {
            element.attrs.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Snapshot::Element(ref mut element) = self {
            element.styles.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: Snapshot) -> Self {
        if let Snapshot::Element(ref mut element) = self {
            element.children.push(child);
        }
        self
    }

    pub fn as_element(&self) -> Option<&ElementSnapshot> {
        match self {
            Snapshot::Element(element) => Some(element),
            Snapshot::Text(_) => None,
        }
    }

    /// Total number of nodes, text included
    pub fn node_count(&self) -> usize {
        match self {
            Snapshot::Element(element) => {
                1 + element.children.iter().map(Snapshot::node_count).sum::<usize>()
            }
            Snapshot::Text(_) => 1,
        }
    }

    /// Find an element by id anywhere in the snapshot
    pub fn find(&self, id: &str) -> Option<&ElementSnapshot> {
        let element = self.as_element()?;
        if element.id == id {
            return Some(element);
        }
        element.children.iter().find_map(|c| c.find(id))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
