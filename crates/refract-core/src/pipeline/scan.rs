//! Image reference extraction from a document tree.

use crate::document::{DocumentTree, Node};

/// One image reference as it appears in a document.
///
/// Attributes are raw strings; validation happens during option resolution,
/// not here.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReference {
    /// Raw source path from the `src` attribute
    pub src: String,
    /// Raw `width` attribute, if any
    pub width: Option<String>,
    /// Raw `quality` attribute, if any
    pub quality: Option<String>,
}

/// Iterate over a tree's image references in document (depth-first,
/// pre-order) order.
///
/// Only `img` elements with a non-empty `src` are yielded; elements without
/// one are skipped silently — malformed markup is tolerated.
pub fn image_refs(tree: &DocumentTree) -> ImageRefs<'_> {
    ImageRefs {
        stack: tree.children.iter().rev().collect(),
    }
}

/// Explicit-stack pre-order traversal; restartable by calling
/// [`image_refs`] again.
pub struct ImageRefs<'a> {
    stack: Vec<&'a Node>,
}

impl Iterator for ImageRefs<'_> {
    type Item = ImageReference;

    fn next(&mut self) -> Option<ImageReference> {
        while let Some(node) = self.stack.pop() {
            let Node::Element(element) = node else {
                continue;
            };
            self.stack.extend(element.children.iter().rev());
            if element.tag != "img" {
                continue;
            }
            let Some(src) = element.property("src").filter(|src| !src.is_empty()) else {
                continue;
            };
            return Some(ImageReference {
                src: src.to_string(),
                width: element.property("width").map(String::from),
                quality: element.property("quality").map(String::from),
            });
        }
        None
    }
}
