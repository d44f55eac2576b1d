//! Document model: the parsed tree and its producers/consumers.
//!
//! Markdown text is parsed into an element tree ([`DocumentTree`]), scanned
//! for image references by the pipeline, and serialized back to HTML. Front
//! matter is split off before parsing and handled separately.

mod frontmatter;
mod html;
mod markdown;
mod tree;

pub use frontmatter::{split, string_value, Metadata};
pub use html::to_html;
pub use markdown::MarkdownParser;
pub use tree::{DocumentTree, Element, Node, Properties};
