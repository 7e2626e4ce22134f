/// View subsystem - turns a parsed document into something a user can look at
///
/// This module owns the Visual Tree, the renderer that builds it, and the two
/// display surfaces it can be projected onto: an HTML fragment and the terminal.

pub mod html;
pub mod renderer;
pub mod style;
pub mod terminal;
pub mod visual_tree;

// Re-export public interface
pub use renderer::{Notice, RenderError, RenderOutcome, Severity, TreeRenderer};
pub use style::{StyleRole, Theme};
pub use terminal::{Screen, ScreenParams};
pub use visual_tree::{Block, DisplayLine, LinePart, NodeId, ToggleState, VisualNode, VisualTree};
