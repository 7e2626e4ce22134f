//! HTML projection of a rendered tree, for hosting the viewer in a browser page.
//!
//! Markup follows the block convention the toggle script relies on: each
//! element is a `node-block` whose first `line` holds the toggle marker, and
//! whose child container (`xml-node`) and closing `line` follow it as
//! siblings. Collapsed content carries the `collapsed` class.

use super::renderer::Notice;
use super::style::STYLESHEET;
use super::visual_tree::{Line, NodeId, VisualNode, VisualTree};
use quick_xml::escape::escape;
use std::fmt::Write;

const TOGGLE_SCRIPT: &str = r#"
(function () {
  var root = document.currentScript.closest('.pure-xml-view');
  function content(block) {
    return block.querySelectorAll(':scope > .xml-node, :scope > .line:not(:first-child)');
  }
  root.querySelectorAll('.toggle-btn').forEach(function (btn) {
    btn.addEventListener('click', function () {
      var items = content(btn.closest('.node-block'));
      if (items.length === 0) return;
      var collapse = !items[0].classList.contains('collapsed');
      items.forEach(function (el) { el.classList.toggle('collapsed', collapse); });
      btn.textContent = collapse ? '+' : '-';
    });
  });
  function setAll(collapse) {
    root.querySelectorAll('.node-block').forEach(function (block) {
      var btn = block.querySelector(':scope > .line > .toggle-btn');
      if (!btn) return;
      content(block).forEach(function (el) { el.classList.toggle('collapsed', collapse); });
      btn.textContent = collapse ? '+' : '-';
    });
  }
  root.querySelector('#expand-all-btn').addEventListener('click', function () { setAll(false); });
  root.querySelector('#collapse-all-btn').addEventListener('click', function () { setAll(true); });
})();
"#;

/// Markup for the contents of the `xml-container` element
pub fn tree_fragment(tree: &VisualTree) -> String {
    let mut out = String::new();
    for &id in tree.roots() {
        write_node(&mut out, tree, id);
    }
    out
}

pub fn notice_fragment(notice: &Notice) -> String {
    let class = notice.role().css_class().unwrap_or_default();
    format!(
        "<div class=\"line {class}\">{}</div>",
        escape(&notice.text)
    )
}

/// A standalone page: stylesheet, toolbar, tree and the toggle script
pub fn render_page(fragment: &str, title: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape(title));
    let _ = writeln!(out, "<style>{STYLESHEET}</style>");
    out.push_str("</head>\n<body>\n<div class=\"pure-xml-view\">\n");
    out.push_str("<div class=\"toolbar\">");
    out.push_str("<button class=\"toolbar-button\" id=\"expand-all-btn\">Expand All</button>");
    out.push_str("<button class=\"toolbar-button\" id=\"collapse-all-btn\">Collapse All</button>");
    out.push_str("</div>\n<div class=\"xml-container\">");
    out.push_str(fragment);
    out.push_str("</div>\n");
    let _ = writeln!(out, "<script>{TOGGLE_SCRIPT}</script>");
    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn write_node(out: &mut String, tree: &VisualTree, id: NodeId) {
    match tree.get(id) {
        Some(VisualNode::Block(block)) => {
            let _ = write!(out, "<div class=\"node-block\" data-node=\"{}\">", id.index());
            out.push_str("<div class=\"line\">");
            if let Some(state) = block.toggle_state() {
                let _ = write!(
                    out,
                    "<span class=\"toggle-btn\" data-action=\"toggle\">{}</span>",
                    state.glyph()
                );
            }
            write_spans(out, &block.opening);
            out.push_str("</div>");

            if let Some(container) = &block.container {
                let hidden = if container.collapsed { " collapsed" } else { "" };
                let _ = write!(out, "<div class=\"xml-node{hidden}\">");
                for &child in &container.children {
                    write_node(out, tree, child);
                }
                out.push_str("</div>");
                let _ = write!(out, "<div class=\"line{hidden}\">");
                write_spans(out, &container.closing);
                out.push_str("</div>");
            }
            out.push_str("</div>");
        }
        Some(VisualNode::Line { line, .. }) => {
            out.push_str("<div class=\"line\">");
            write_spans(out, line);
            out.push_str("</div>");
        }
        None => {}
    }
}

fn write_spans(out: &mut String, line: &Line) {
    for span in &line.spans {
        match span.role.css_class() {
            Some(class) => {
                let _ = write!(
                    out,
                    "<span class=\"{class}\">{}</span>",
                    escape(&span.text)
                );
            }
            _ => {
                let _ = write!(out, "<span>{}</span>", escape(&span.text));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ToggleController;
    use crate::view::{RenderOutcome, TreeRenderer};

    fn render(source: &str) -> RenderOutcome {
        TreeRenderer::new().render(source)
    }

    fn fragment(source: &str) -> String {
        match render(source) {
            RenderOutcome::Tree(tree) => tree_fragment(&tree),
            RenderOutcome::Notice(notice) => notice_fragment(&notice),
        }
    }

    #[test]
    fn test_self_closing_fragment() {
        let html = fragment("<a/>");
        assert_eq!(
            html,
            "<div class=\"node-block\" data-node=\"0\"><div class=\"line\">\
             <span class=\"xml-tag\">&lt;a</span><span class=\"xml-tag\"> /&gt;</span>\
             </div></div>"
        );
    }

    #[test]
    fn test_block_with_children_has_toggle_container_and_closing_line() {
        let html = fragment("<a><b/></a>");
        assert_eq!(html.matches("toggle-btn").count(), 1);
        assert!(html.contains("<span class=\"toggle-btn\" data-action=\"toggle\">-</span>"));
        assert!(html.contains("<div class=\"xml-node\">"));
        assert!(html.contains("&lt;/a&gt;"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = fragment(r#"<a q="&quot;x&apos;">&lt;script&gt; &amp;</a>"#);
        assert!(html.contains("&lt;script&gt; &amp;"));
        assert!(html.contains("&quot;x&apos;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_all_reserved_characters_are_escaped() {
        let html = notice_fragment(&Notice::info(r#"<a href="x">Tom & 'Jerry'</a>"#));
        assert_eq!(
            html,
            "<div class=\"line xml-info\">\
             &lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;</div>"
        );
    }

    #[test]
    fn test_entities_in_text_are_escaped_again() {
        let html = notice_fragment(&Notice::info("&amp;"));
        assert!(html.contains(">&amp;amp;<"));
    }

    #[test]
    fn test_collapsed_state_is_projected() {
        let RenderOutcome::Tree(tree) = render("<a><b>t</b></a>") else {
            panic!("expected tree");
        };
        let mut controller = ToggleController::attach(tree);
        controller.collapse_all();

        let html = tree_fragment(controller.tree());
        assert_eq!(html.matches("class=\"xml-node collapsed\"").count(), 2);
        assert_eq!(html.matches("class=\"line collapsed\"").count(), 2);
        assert!(!html.contains(">-</span>"));
    }

    #[test]
    fn test_error_notice_is_escaped() {
        let html = fragment("<a><b></a>");
        assert!(html.starts_with("<div class=\"line xml-error\">XML parsing error: "));
        assert!(!html.contains("</a>"));
    }

    #[test]
    fn test_info_notice_has_no_error_class() {
        let html = fragment("");
        assert_eq!(html, "<div class=\"line xml-info\">No XML data provided</div>");
    }

    #[test]
    fn test_page_contains_toolbar_and_style() {
        let page = render_page(&fragment("<a/>"), "doc <1>");
        assert!(page.contains("<title>doc &lt;1&gt;</title>"));
        assert!(page.contains("id=\"expand-all-btn\""));
        assert!(page.contains("id=\"collapse-all-btn\""));
        assert!(page.contains(".collapsed { display: none !important; }"));
    }
}
