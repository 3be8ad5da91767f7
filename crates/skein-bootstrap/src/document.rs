//! Host document abstraction.

use std::collections::BTreeMap;

/// The page an application is mounted into.
pub trait HostDocument {
    type Element;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
}

/// Element of a [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryElement {
    pub id: String,
    pub tag: String,
}

/// A document held in memory, for tests and non-browser hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: BTreeMap<String, MemoryElement>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, id: impl Into<String>, tag: impl Into<String>) -> Self {
        self.insert(id, tag);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, tag: impl Into<String>) {
        let id = id.into();
        let element = MemoryElement {
            id: id.clone(),
            tag: tag.into(),
        };
        self.elements.insert(id, element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl HostDocument for MemoryDocument {
    type Element = MemoryElement;

    fn element_by_id(&self, id: &str) -> Option<MemoryElement> {
        self.elements.get(id).cloned()
    }
}

impl<D: HostDocument + ?Sized> HostDocument for &D {
    type Element = D::Element;

    fn element_by_id(&self, id: &str) -> Option<Self::Element> {
        (**self).element_by_id(id)
    }
}

#[cfg(feature = "web")]
pub mod web {
    use super::HostDocument;

    impl HostDocument for web_sys::Document {
        type Element = web_sys::Element;

        fn element_by_id(&self, id: &str) -> Option<web_sys::Element> {
            self.get_element_by_id(id)
        }
    }

    /// The page's document, when running in a browser window.
    pub fn browser_document() -> Option<web_sys::Document> {
        web_sys::window()?.document()
    }
}
