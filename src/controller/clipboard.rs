use crate::view::{NodeId, VisualTree};
use arboard::Clipboard;

/// Text of a node and everything under it, hidden lines included, indented
/// relative to the node itself.
pub fn subtree_text(tree: &VisualTree, id: NodeId, indent: usize) -> String {
    let lines = tree.subtree_lines(id);
    let base = lines.first().map(|l| l.depth).unwrap_or(0);

    let mut out = String::new();
    for line in &lines {
        out.push_str(&" ".repeat(line.depth.saturating_sub(base) * indent));
        out.push_str(&line.line.plain_text());
        out.push('\n');
    }
    out
}

pub fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    Clipboard::new().and_then(|mut c| c.set_text(text.to_string()))
}
