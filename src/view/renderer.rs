use super::style::StyleRole;
use super::visual_tree::{Block, Container, Line, LineKind, NodeId, VisualNode, VisualTree};
use crate::document_model::{
    Declaration, Element, MAX_NESTING_DEPTH, ParseError, SourceDocument, SourceNode,
    parse_document_with_limit,
};
use log::{debug, info, warn};
use thiserror::Error;

pub const NO_DATA_MESSAGE: &str = "No XML data provided";
pub const DEFAULT_MAX_DEPTH: usize = MAX_NESTING_DEPTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A single message shown in place of a tree
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    pub fn role(&self) -> StyleRole {
        match self.severity {
            Severity::Info => StyleRole::Info,
            Severity::Error => StyleRole::Error,
        }
    }

    pub fn line(&self) -> Line {
        Line::single(self.text.clone(), self.role())
    }

    /// One-line tree holding just this message, for surfaces that only
    /// know how to show trees
    pub fn to_tree(&self) -> VisualTree {
        let mut tree = VisualTree::new();
        let id = tree.add(VisualNode::Line {
            kind: LineKind::Notice,
            line: self.line(),
        });
        tree.add_root(id);
        tree
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Tree(VisualTree),
    Notice(Notice),
}

impl RenderOutcome {
    pub fn tree(&self) -> Option<&VisualTree> {
        match self {
            RenderOutcome::Tree(tree) => Some(tree),
            RenderOutcome::Notice(_) => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            RenderOutcome::Tree(_) => None,
            RenderOutcome::Notice(notice) => Some(notice),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("XML parsing error: {0}")]
    Parse(#[from] ParseError),
    #[error("Error rendering XML: elements nested deeper than {limit} levels")]
    DepthLimit { limit: usize },
}

/// Turns XML text into a [`VisualTree`].
///
/// Every call starts from scratch: nothing is carried over from an earlier
/// render, so all blocks come out expanded.
#[derive(Debug, Clone)]
pub struct TreeRenderer {
    max_depth: usize,
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeRenderer {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit is clamped to `1..=MAX_NESTING_DEPTH`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.clamp(1, MAX_NESTING_DEPTH),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Render `source_text`. Never fails: empty input and every error come
    /// back as a [`Notice`].
    pub fn render(&self, source_text: &str) -> RenderOutcome {
        if source_text.trim().is_empty() {
            info!("render: empty input");
            return RenderOutcome::Notice(Notice::info(NO_DATA_MESSAGE));
        }

        match self.try_render(source_text) {
            Ok(tree) => {
                debug!("render: {} visual node(s)", tree.len());
                RenderOutcome::Tree(tree)
            }
            Err(err) => {
                warn!("render failed: {err}");
                RenderOutcome::Notice(Notice::error(err.to_string()))
            }
        }
    }

    pub fn try_render(&self, source_text: &str) -> Result<VisualTree, RenderError> {
        let document = match parse_document_with_limit(source_text, self.max_depth) {
            Ok(document) => document,
            Err(ParseError::TooDeep { limit, .. }) => {
                return Err(RenderError::DepthLimit { limit });
            }
            Err(err) => return Err(err.into()),
        };
        self.build(&document)
    }

    /// Build the visual tree for an already parsed document
    pub fn build(&self, document: &SourceDocument) -> Result<VisualTree, RenderError> {
        let mut tree = VisualTree::new();

        if let Some(declaration) = document.declaration() {
            let id = Self::add_declaration(&mut tree, declaration);
            tree.add_root(id);
        }

        for node in &document.children {
            if matches!(node, SourceNode::Declaration(_)) {
                continue;
            }
            if let Some(id) = self.render_node(&mut tree, node, 0)? {
                tree.add_root(id);
            }
        }

        Ok(tree)
    }

    fn render_node(
        &self,
        tree: &mut VisualTree,
        node: &SourceNode,
        depth: usize,
    ) -> Result<Option<NodeId>, RenderError> {
        let id = match node {
            SourceNode::Element(element) => self.render_element(tree, element, depth)?,
            SourceNode::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                tree.add(VisualNode::Line {
                    kind: LineKind::Text,
                    line: Line::single(text, StyleRole::Text),
                })
            }
            SourceNode::Comment(comment) => {
                let comment = comment.trim();
                let text = if comment.is_empty() {
                    "<!-- -->".to_string()
                } else {
                    format!("<!-- {comment} -->")
                };
                tree.add(VisualNode::Line {
                    kind: LineKind::Comment,
                    line: Line::single(text, StyleRole::Comment),
                })
            }
            // only meaningful at the top of the document
            SourceNode::Declaration(_) | SourceNode::Other => return Ok(None),
        };
        Ok(Some(id))
    }

    fn render_element(
        &self,
        tree: &mut VisualTree,
        element: &Element,
        depth: usize,
    ) -> Result<NodeId, RenderError> {
        if depth >= self.max_depth {
            return Err(RenderError::DepthLimit {
                limit: self.max_depth,
            });
        }

        // Reserve the slot first so block ids follow document order
        let id = tree.add(VisualNode::Block(Block {
            name: element.name.clone(),
            opening: Line::new(),
            container: None,
        }));

        let mut children = Vec::new();
        for child in &element.children {
            if let Some(child_id) = self.render_node(tree, child, depth + 1)? {
                children.push(child_id);
            }
        }

        let mut opening = Line::single(format!("<{}", element.name), StyleRole::Tag);
        for attr in &element.attributes {
            opening.push(" ", StyleRole::Punctuation);
            opening.push(attr.name.as_str(), StyleRole::AttrName);
            opening.push("=\"", StyleRole::Punctuation);
            opening.push(attr.value.as_str(), StyleRole::AttrValue);
            opening.push("\"", StyleRole::Punctuation);
        }

        let container = if !element.has_renderable_children() {
            opening.push(" />", StyleRole::Tag);
            None
        } else {
            opening.push(">", StyleRole::Tag);
            Some(Container {
                children,
                closing: Line::single(format!("</{}>", element.name), StyleRole::Tag),
                collapsed: false,
            })
        };

        if let Some(block) = tree.block_mut(id) {
            block.opening = opening;
            block.container = container;
        }
        Ok(id)
    }

    fn add_declaration(tree: &mut VisualTree, declaration: &Declaration) -> NodeId {
        tree.add(VisualNode::Line {
            kind: LineKind::Declaration,
            line: Line::single(declaration.display_text(), StyleRole::Declaration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::visual_tree::{LinePart, ToggleState};

    fn render_tree(source: &str) -> VisualTree {
        match TreeRenderer::new().render(source) {
            RenderOutcome::Tree(tree) => tree,
            RenderOutcome::Notice(notice) => panic!("unexpected notice: {}", notice.text),
        }
    }

    fn visible_texts(tree: &VisualTree) -> Vec<String> {
        tree.visible_lines()
            .iter()
            .map(|l| l.line.plain_text())
            .collect()
    }

    #[test]
    fn test_nested_document_scenario() {
        let tree = render_tree(r#"<a><b x="1">hi</b><!--note--></a>"#);

        assert_eq!(
            visible_texts(&tree),
            vec!["<a>", "<b x=\"1\">", "hi", "</b>", "<!-- note -->", "</a>"]
        );

        let root = tree.roots()[0];
        let a = tree.block(root).unwrap();
        assert_eq!(a.toggle_state(), Some(ToggleState::Expanded));
        let container = a.container.as_ref().unwrap();
        assert_eq!(container.children.len(), 2);

        let b = tree.block(container.children[0]).unwrap();
        assert!(b.has_toggle());
        let attr_spans: Vec<(&str, StyleRole)> = b
            .opening
            .spans
            .iter()
            .map(|s| (s.text.as_str(), s.role))
            .collect();
        assert!(attr_spans.contains(&("x", StyleRole::AttrName)));
        assert!(attr_spans.contains(&("1", StyleRole::AttrValue)));

        assert!(matches!(
            tree.get(container.children[1]),
            Some(VisualNode::Line { kind: LineKind::Comment, .. })
        ));
    }

    #[test]
    fn test_self_closing_element_scenario() {
        let tree = render_tree("<a/>");
        assert_eq!(visible_texts(&tree), vec!["<a />"]);
        assert!(tree.toggle_markers().is_empty());
    }

    #[test]
    fn test_empty_input_is_an_info_notice() {
        for input in ["", "   \n  "] {
            let outcome = TreeRenderer::new().render(input);
            assert_eq!(outcome, RenderOutcome::Notice(Notice::info(NO_DATA_MESSAGE)));
        }
    }

    #[test]
    fn test_mismatched_tags_give_a_single_error_notice() {
        let outcome = TreeRenderer::new().render("<a><b></a>");
        let notice = outcome.notice().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.text.starts_with("XML parsing error: "));
        assert!(outcome.tree().is_none());
    }

    #[test]
    fn test_declaration_is_the_first_line() {
        let tree = render_tree(r#"<?xml version="1.0" encoding="UTF-8"?><r/>"#);
        let lines = visible_texts(&tree);
        assert_eq!(lines, vec![r#"<?xml version="1.0" encoding="UTF-8"?>"#, "<r />"]);
    }

    #[test]
    fn test_opening_lines_match_element_count() {
        let source = "<root><a><b/><c>t</c></a><!--x--><d k='v'><e/></d></root>";
        let tree = render_tree(source);
        let document = crate::document_model::parse_document(source).unwrap();

        let opening_lines = tree
            .visible_lines()
            .iter()
            .filter(|l| l.part == LinePart::Opening)
            .count();
        assert_eq!(opening_lines, document.count_elements());
    }

    #[test]
    fn test_whitespace_only_text_produces_no_lines() {
        let tree = render_tree("<a>\n    <b>  </b>\n    <c> text </c>\n</a>");
        assert_eq!(
            visible_texts(&tree),
            vec!["<a>", "<b />", "<c>", "text", "</c>", "</a>"]
        );

        let b = tree.blocks().find(|(_, block)| block.name == "b").unwrap().1;
        assert!(!b.has_toggle());
    }

    #[test]
    fn test_toggle_marker_iff_container() {
        let tree = render_tree("<a><b/><c><!----></c><d><![CDATA[x]]></d></a>");
        for (_, block) in tree.blocks() {
            let expect_toggle = matches!(block.name.as_str(), "a" | "c");
            assert_eq!(block.has_toggle(), expect_toggle, "block {}", block.name);
            assert_eq!(
                block.opening.plain_text().ends_with("/>"),
                !expect_toggle,
                "block {}",
                block.name
            );
        }
    }

    #[test]
    fn test_attribute_order_is_preserved() {
        let tree = render_tree(r#"<a z="1" a="2" m="3"/>"#);
        assert_eq!(visible_texts(&tree), vec![r#"<a z="1" a="2" m="3" />"#]);
    }

    #[test]
    fn test_processing_instructions_are_skipped() {
        let tree = render_tree("<a><?target data?>text</a>");
        assert_eq!(visible_texts(&tree), vec!["<a>", "text", "</a>"]);
    }

    #[test]
    fn test_top_level_comments_render_in_order() {
        let tree = render_tree("<!-- head --><r/><!-- tail -->");
        assert_eq!(visible_texts(&tree), vec!["<!-- head -->", "<r />", "<!-- tail -->"]);
    }

    #[test]
    fn test_depth_limit_becomes_error_notice() {
        let renderer = TreeRenderer::with_max_depth(2);
        let outcome = renderer.render("<a><b><c/></b></a>");
        let notice = outcome.notice().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.text.starts_with("Error rendering XML: "));

        assert!(renderer.render("<a><b/></a>").tree().is_some());
    }

    #[test]
    fn test_huge_nesting_gives_error_notice() {
        let source = format!("{}{}", "<a>".repeat(200_000), "</a>".repeat(200_000));
        let outcome = TreeRenderer::new().render(&source);
        let notice = outcome.notice().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(
            notice.text,
            format!("Error rendering XML: elements nested deeper than {MAX_NESTING_DEPTH} levels")
        );
    }

    #[test]
    fn test_depth_limit_is_clamped() {
        assert_eq!(TreeRenderer::with_max_depth(0).max_depth(), 1);
        assert_eq!(
            TreeRenderer::with_max_depth(usize::MAX).max_depth(),
            MAX_NESTING_DEPTH
        );
    }

    #[test]
    fn test_deep_document_renders_every_element() {
        let depth = 300;
        let source = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let tree = render_tree(&source);
        let lines = tree.visible_lines();
        let opening = lines.iter().filter(|l| l.part == LinePart::Opening).count();
        assert_eq!(opening, depth);
        // the innermost element is self-closing
        assert_eq!(lines.len(), 2 * depth - 1);
    }

    #[test]
    fn test_misplaced_declaration_is_an_error_notice() {
        for source in [
            r#"<r><?xml version="1.0"?></r>"#,
            r#"<r/><?xml version="1.0"?>"#,
            r#"<?xml version="1.0"?><?xml version="1.0"?><r/>"#,
        ] {
            let outcome = TreeRenderer::new().render(source);
            let notice = outcome.notice().unwrap();
            assert_eq!(notice.severity, Severity::Error, "{source}");
            assert!(notice.text.starts_with("XML parsing error: "), "{source}");
        }
    }

    #[test]
    fn test_notice_tree_has_one_line_and_no_markers() {
        let tree = Notice::error("boom").to_tree();
        let lines = tree.visible_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line.spans[0].role, StyleRole::Error);
        assert!(tree.toggle_markers().is_empty());
    }

    #[test]
    fn test_rerender_starts_expanded() {
        let renderer = TreeRenderer::new();
        let first = renderer.render("<a><b/></a>");
        let second = renderer.render("<a><b/></a>");
        assert_eq!(first, second);
    }
}
