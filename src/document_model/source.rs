//! Source Document - the immutable tree handed over by the parser
//!
//! Nothing in the view or controller layers mutates these values; they are
//! built once per render by the parser and dropped with the render.

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    /// Source order is display order
    pub attributes: Vec<Attribute>,
    pub children: Vec<SourceNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// True if at least one child would produce a visual line:
    /// an element, a comment, or text that is not blank after trimming.
    pub fn has_renderable_children(&self) -> bool {
        self.children.iter().any(SourceNode::is_renderable)
    }

    /// Number of elements in this subtree, this one included
    pub fn count_elements(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| match child {
                SourceNode::Element(element) => element.count_elements(),
                _ => 0,
            })
            .sum::<usize>()
    }
}

/// The `<?xml ...?>` pragma as it appeared in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub raw: String,
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Declaration {
    /// Rebuild the pragma from its parts, defaulting the encoding to UTF-8
    pub fn reconstructed(&self) -> String {
        let encoding = self.encoding.as_deref().unwrap_or("UTF-8");
        match &self.standalone {
            Some(standalone) => format!(
                "<?xml version=\"{}\" encoding=\"{}\" standalone=\"{}\"?>",
                self.version, encoding, standalone
            ),
            None => format!("<?xml version=\"{}\" encoding=\"{}\"?>", self.version, encoding),
        }
    }

    /// Text shown on the declaration line
    pub fn display_text(&self) -> String {
        if self.raw.is_empty() {
            self.reconstructed()
        } else {
            self.raw.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceNode {
    Element(Element),
    Text(String),
    Comment(String),
    Declaration(Declaration),
    /// Processing instructions, CDATA, doctype: kept for structure, never shown
    Other,
}

impl SourceNode {
    pub fn is_renderable(&self) -> bool {
        match self {
            SourceNode::Element(_) | SourceNode::Comment(_) => true,
            SourceNode::Text(text) => !text.trim().is_empty(),
            SourceNode::Declaration(_) | SourceNode::Other => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceDocument {
    /// Top level nodes in document order: the declaration if any, comments,
    /// and at most one element
    pub children: Vec<SourceNode>,
}

impl SourceDocument {
    pub fn declaration(&self) -> Option<&Declaration> {
        self.children.iter().find_map(|node| match node {
            SourceNode::Declaration(declaration) => Some(declaration),
            _ => None,
        })
    }

    pub fn root(&self) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            SourceNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn count_elements(&self) -> usize {
        self.root().map_or(0, Element::count_elements)
    }
}
