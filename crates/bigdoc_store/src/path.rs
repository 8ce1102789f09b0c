//! Document addressing.

use std::fmt;

/// The address of a single document: a collection path plus a document id.
///
/// Collection paths may be nested. The parts of a logical record live in
/// the sub-collection `"{collection}/{id}/{sub}"`, built with
/// [`DocPath::child_collection`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    /// Collection path, e.g. `menus` or `menus/m1/parts`.
    pub collection: String,
    /// Document id within the collection.
    pub id: String,
}

impl DocPath {
    /// Creates a document path.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Returns the path of the sub-collection `sub` under a document.
    #[must_use]
    pub fn child_collection(collection: &str, id: &str, sub: &str) -> String {
        format!("{collection}/{id}/{sub}")
    }

    /// Returns the path of a document inside the sub-collection `sub` of this
    /// document.
    #[must_use]
    pub fn child(&self, sub: &str, child_id: impl Into<String>) -> Self {
        Self::new(
            Self::child_collection(&self.collection, &self.id, sub),
            child_id,
        )
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_path_nests_under_parent() {
        let parent = DocPath::new("orders", "o-17");
        let child = parent.child("parts", "p0");
        assert_eq!(child.collection, "orders/o-17/parts");
        assert_eq!(child.id, "p0");
        assert_eq!(child.to_string(), "orders/o-17/parts/p0");
    }
}
