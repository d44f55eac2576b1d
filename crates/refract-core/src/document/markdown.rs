//! Markdown → tree parsing on a pulldown-cmark event stream.
//!
//! The builder keeps an explicit element stack and, instead of matching end
//! tags structurally, records how many elements each start event opened — any
//! end event pops exactly that many. Unrecognized container tags become
//! transparent: their children attach to the enclosing node.

use once_cell::sync::Lazy;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;

use super::{DocumentTree, Element, Node};

static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());
static IMG_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([a-zA-Z][a-zA-Z0-9-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Markdown → [`DocumentTree`] parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser {
    include_img: bool,
}

impl MarkdownParser {
    /// Create a parser. With `include_img`, raw inline `<img>` HTML is lifted
    /// into element nodes so the scanner can see it; other raw markup passes
    /// through untouched either way.
    pub fn new(include_img: bool) -> Self {
        Self { include_img }
    }

    /// Parse a markdown body (front matter already split off).
    pub fn parse(&self, body: &str) -> DocumentTree {
        let mut builder = TreeBuilder::new(self.include_img);
        for event in Parser::new(body) {
            builder.event(event);
        }
        builder.finish()
    }
}

/// A markdown image whose alt text is still being collected.
struct PendingImage {
    src: String,
    title: String,
    alt: String,
}

impl PendingImage {
    fn into_element(self) -> Element {
        let mut element = Element::new("img")
            .with_property("src", self.src)
            .with_property("alt", self.alt);
        if !self.title.is_empty() {
            element = element.with_property("title", self.title);
        }
        element
    }
}

struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Element>,
    /// Elements opened per start event; end events pop this many
    frames: Vec<u8>,
    image: Option<PendingImage>,
    include_img: bool,
}

impl TreeBuilder {
    fn new(include_img: bool) -> Self {
        Self {
            root: Vec::new(),
            stack: Vec::new(),
            frames: Vec::new(),
            image: None,
            include_img,
        }
    }

    fn finish(mut self) -> DocumentTree {
        // Tolerate unbalanced input: close anything still open
        while !self.stack.is_empty() {
            self.close();
        }
        DocumentTree::new(self.root)
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::End(TagEnd::Image) => {
                if let Some(pending) = self.image.take() {
                    self.push_node(pending.into_element().into());
                }
            }
            // Inside an image, only text contributes (to the alt attribute)
            event if self.image.is_some() => {
                if let Event::Text(text) = event {
                    if let Some(pending) = self.image.as_mut() {
                        pending.alt.push_str(&text);
                    }
                }
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                self.image = Some(PendingImage {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.push_node(Node::Text(text.to_string())),
            Event::Code(code) => {
                let mut element = Element::new("code");
                element.children.push(Node::Text(code.to_string()));
                self.push_node(element.into());
            }
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::SoftBreak => self.push_node(Node::Text("\n".to_string())),
            Event::HardBreak => self.push_node(Element::new("br").into()),
            Event::Rule => self.push_node(Element::new("hr").into()),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let opened = match tag {
            Tag::Paragraph => self.open(Element::new("p")),
            Tag::Heading { level, .. } => self.open(Element::new(heading_tag(level))),
            Tag::BlockQuote(..) => self.open(Element::new("blockquote")),
            Tag::CodeBlock(kind) => {
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(language) = &kind {
                    if !language.is_empty() {
                        code.properties
                            .insert("class".to_string(), format!("language-{language}"));
                    }
                }
                self.open(Element::new("pre")) + self.open(code)
            }
            Tag::List(Some(_)) => self.open(Element::new("ol")),
            Tag::List(None) => self.open(Element::new("ul")),
            Tag::Item => self.open(Element::new("li")),
            Tag::Emphasis => self.open(Element::new("em")),
            Tag::Strong => self.open(Element::new("strong")),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut anchor = Element::new("a").with_property("href", dest_url.to_string());
                if !title.is_empty() {
                    anchor = anchor.with_property("title", title.to_string());
                }
                self.open(anchor)
            }
            // Transparent container
            _ => 0,
        };
        self.frames.push(opened);
    }

    fn end(&mut self) {
        if let Some(opened) = self.frames.pop() {
            for _ in 0..opened {
                self.close();
            }
        }
    }

    fn open(&mut self, element: Element) -> u8 {
        self.stack.push(element);
        1
    }

    fn close(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.push_node(Node::Element(element));
        }
    }

    fn push_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn raw_html(&mut self, html: &str) {
        if !self.include_img || !IMG_TAG.is_match(html) {
            self.push_node(Node::Raw(html.to_string()));
            return;
        }
        let mut last = 0;
        for found in IMG_TAG.find_iter(html) {
            if found.start() > last {
                self.push_node(Node::Raw(html[last..found.start()].to_string()));
            }
            self.push_node(parse_img_tag(found.as_str()).into());
            last = found.end();
        }
        if last < html.len() {
            self.push_node(Node::Raw(html[last..].to_string()));
        }
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

/// Lift one raw `<img …>` tag into an element, lowercasing attribute names.
fn parse_img_tag(tag: &str) -> Element {
    let mut element = Element::new("img");
    for capture in IMG_ATTR.captures_iter(tag) {
        let name = capture[1].to_ascii_lowercase();
        let value = capture
            .get(2)
            .or_else(|| capture.get(3))
            .map(|group| group.as_str())
            .unwrap_or("");
        element.properties.insert(name, value.to_string());
    }
    element
}
