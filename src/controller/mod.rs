/// Controller subsystem - Handles user interaction with a rendered tree
///
/// The toggle controller owns the expand/collapse state of one tree. The
/// host element wraps it with the input and lifecycle a surface drives, and
/// the session runs that element interactively in the terminal.

pub mod clipboard;
pub mod help;
pub mod host;
pub mod key_handler;
pub mod search;
pub mod session;
pub mod toggle;

// Re-export public interface
pub use host::{ELEMENT_NAME, HostElement, XmlView, is_registered, register_element};
pub use key_handler::{Command, KeyHandler};
pub use search::{SearchDirection, SearchError, SearchState};
pub use session::ViewerSession;
pub use toggle::{ToggleController, ToggleError};
