//! Visual Tree - the rendered, display-ready form of a Source Document
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. The structure is
//! fixed once the renderer has built it; the only mutable part is the
//! collapse flag on each element's child container.
use super::style::StyleRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub role: StyleRole,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    pub fn single(text: impl Into<String>, role: StyleRole) -> Self {
        Self::new().with(text, role)
    }

    pub fn with(mut self, text: impl Into<String>, role: StyleRole) -> Self {
        self.push(text, role);
        self
    }

    pub fn push(&mut self, text: impl Into<String>, role: StyleRole) {
        let text = text.into();
        if !text.is_empty() {
            self.spans.push(Span { text, role });
        }
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Expanded,
    Collapsed,
}

impl ToggleState {
    pub fn glyph(self) -> char {
        match self {
            ToggleState::Expanded => '-',
            ToggleState::Collapsed => '+',
        }
    }
}

/// Children of an element plus its closing line. Only elements with
/// renderable children get one, so it doubles as the toggle marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub children: Vec<NodeId>,
    pub closing: Line,
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub opening: Line,
    pub container: Option<Container>,
}

impl Block {
    pub fn has_toggle(&self) -> bool {
        self.container.is_some()
    }

    pub fn toggle_state(&self) -> Option<ToggleState> {
        self.container.as_ref().map(|c| {
            if c.collapsed {
                ToggleState::Collapsed
            } else {
                ToggleState::Expanded
            }
        })
    }

    pub(crate) fn set_collapsed(&mut self, collapsed: bool) -> bool {
        match self.container.as_mut() {
            Some(container) => {
                container.collapsed = collapsed;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Declaration,
    Text,
    Comment,
    /// Stand-in for a whole tree: the empty-input or error message
    Notice,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualNode {
    Block(Block),
    Line { kind: LineKind, line: Line },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePart {
    Opening,
    Closing,
    Single,
}

/// One line of the flattened tree, ready for a display surface
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLine<'a> {
    pub node: NodeId,
    pub depth: usize,
    pub part: LinePart,
    pub line: &'a Line,
    /// Set on opening lines of blocks that carry a toggle marker
    pub toggle: Option<ToggleState>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualTree {
    nodes: Vec<VisualNode>,
    roots: Vec<NodeId>,
}

impl VisualTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, node: VisualNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn add_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&VisualNode> {
        self.nodes.get(id.0)
    }

    pub fn block(&self, id: NodeId) -> Option<&Block> {
        match self.nodes.get(id.0) {
            Some(VisualNode::Block(block)) => Some(block),
            _ => None,
        }
    }

    pub(crate) fn block_mut(&mut self, id: NodeId) -> Option<&mut Block> {
        match self.nodes.get_mut(id.0) {
            Some(VisualNode::Block(block)) => Some(block),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &VisualNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn blocks(&self) -> impl Iterator<Item = (NodeId, &Block)> {
        self.iter().filter_map(|(id, node)| match node {
            VisualNode::Block(block) => Some((id, block)),
            _ => None,
        })
    }

    pub(crate) fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.nodes.iter_mut().filter_map(|node| match node {
            VisualNode::Block(block) => Some(block),
            _ => None,
        })
    }

    /// Blocks that carry a toggle marker, in arena order
    pub fn toggle_markers(&self) -> Vec<NodeId> {
        self.blocks()
            .filter(|(_, block)| block.has_toggle())
            .map(|(id, _)| id)
            .collect()
    }

    /// Lines currently shown: the contents of collapsed containers are left out
    pub fn visible_lines(&self) -> Vec<DisplayLine<'_>> {
        let mut out = Vec::new();
        self.flatten(&self.roots, 0, false, &mut out);
        out
    }

    /// Every line of the subtree rooted at `id`, hidden or not
    pub fn subtree_lines(&self, id: NodeId) -> Vec<DisplayLine<'_>> {
        let mut out = Vec::new();
        self.flatten(&[id], 0, true, &mut out);
        out
    }

    fn flatten<'a>(
        &'a self,
        ids: &[NodeId],
        depth: usize,
        include_hidden: bool,
        out: &mut Vec<DisplayLine<'a>>,
    ) {
        for &id in ids {
            match self.get(id) {
                Some(VisualNode::Block(block)) => {
                    out.push(DisplayLine {
                        node: id,
                        depth,
                        part: LinePart::Opening,
                        line: &block.opening,
                        toggle: block.toggle_state(),
                    });
                    if let Some(container) = &block.container {
                        if include_hidden || !container.collapsed {
                            self.flatten(&container.children, depth + 1, include_hidden, out);
                            out.push(DisplayLine {
                                node: id,
                                depth,
                                part: LinePart::Closing,
                                line: &container.closing,
                                toggle: None,
                            });
                        }
                    }
                }
                Some(VisualNode::Line { line, .. }) => out.push(DisplayLine {
                    node: id,
                    depth,
                    part: LinePart::Single,
                    line,
                    toggle: None,
                }),
                None => {}
            }
        }
    }
}
