use crate::view::StyleRole;
use crate::view::visual_tree::{Line, LineKind, VisualNode, VisualTree};

const HELP_LINES: &[&str] = &[
    "PURE XML VIEW HELP",
    "==================",
    "",
    "MOVEMENT:",
    "  j, ↓ - Next line",
    "  k, ↑ - Previous line",
    "  p - Parent element",
    "  gg, Home - First line",
    "  G, End - Last line",
    "  Ctrl+f, Page Down - Page down",
    "  Ctrl+b, Page Up - Page up",
    "  Ctrl+d - Half page down",
    "  Ctrl+u - Half page up",
    "",
    "FOLDING:",
    "  Enter, Space, za - Toggle element under cursor",
    "  l, →, zo - Expand element under cursor",
    "  h, ←, zc - Collapse element (or jump to parent)",
    "  E, zR - Expand all",
    "  C, zM - Collapse all",
    "  Mouse click on -/+ - Toggle that element",
    "",
    "SEARCH:",
    "  / - Search visible lines",
    "  n - Next match",
    "  N - Previous match",
    "",
    "OTHER:",
    "  y - Copy element under cursor to the clipboard",
    "  # - Toggle line numbers",
    "  r, Ctrl+r - Reload file",
    "  Ctrl+l - Redraw screen",
    "  ? - Show this help",
    "  q, Esc - Quit",
    "",
    "Press any key to close this help",
];

pub fn help_lines() -> &'static [&'static str] {
    HELP_LINES
}

/// Help text as a flat tree so the normal screen can show it
pub fn create_help_tree() -> VisualTree {
    let mut tree = VisualTree::new();
    for text in HELP_LINES {
        let role = if text.ends_with(':') || text.starts_with('=') || text.ends_with("HELP") {
            StyleRole::Tag
        } else {
            StyleRole::Info
        };
        let id = tree.add(VisualNode::Line {
            kind: LineKind::Text,
            line: Line::single(*text, role),
        });
        tree.add_root(id);
    }
    tree
}
