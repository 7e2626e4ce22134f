use super::toggle::{ToggleController, ToggleError};
use crate::view::html;
use crate::view::{DisplayLine, Notice, NodeId, RenderOutcome, ToggleState, TreeRenderer, VisualTree};
use log::{debug, info};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Mutex;

pub const ELEMENT_NAME: &str = "pure-xml-view";

/// Lifecycle callbacks a host surface drives the widget through
pub trait HostElement {
    fn on_input_changed(&mut self, new_text: &str);
    fn on_mount(&mut self);
    fn on_unmount(&mut self);
}

static REGISTRY: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Register an element name once per process. Returns false when the name
/// was already registered, so callers can run this unconditionally.
pub fn register_element(name: &str) -> bool {
    let mut names = REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let inserted = names.insert(name.to_string());
    if inserted {
        info!("registered element <{name}>");
    }
    inserted
}

pub fn is_registered(name: &str) -> bool {
    REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .contains(name)
}

/// The XML viewer widget.
///
/// Holds the current input text and the tree rendered from it. Every new
/// input throws the old tree (and its toggle handlers) away and renders from
/// scratch, so collapse state never survives an update.
pub struct XmlView {
    renderer: TreeRenderer,
    data: String,
    controller: ToggleController,
    notice: Option<Notice>,
    mounted: bool,
}

impl XmlView {
    pub fn new() -> Self {
        Self::with_renderer(TreeRenderer::new())
    }

    pub fn with_renderer(renderer: TreeRenderer) -> Self {
        let mut view = Self {
            renderer,
            data: String::new(),
            controller: ToggleController::attach(VisualTree::new()),
            notice: None,
            mounted: false,
        };
        view.rerender();
        view
    }

    /// Replace the input and re-render
    pub fn set_data(&mut self, xml_text: impl Into<String>) {
        self.data = xml_text.into();
        self.rerender();
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn expand_all(&mut self) {
        self.controller.expand_all();
    }

    pub fn collapse_all(&mut self) {
        self.controller.collapse_all();
    }

    pub fn toggle(&mut self, id: NodeId) -> Result<ToggleState, ToggleError> {
        self.controller.toggle(id)
    }

    pub fn set_state(&mut self, id: NodeId, state: ToggleState) -> Result<(), ToggleError> {
        self.controller.set_state(id, state)
    }

    pub fn tree(&self) -> &VisualTree {
        self.controller.tree()
    }

    /// The message shown instead of a tree, if the last render produced one
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn visible_lines(&self) -> Vec<DisplayLine<'_>> {
        self.controller.tree().visible_lines()
    }

    /// Current state as markup for the `xml-container` element
    pub fn to_html_fragment(&self) -> String {
        match &self.notice {
            Some(notice) => html::notice_fragment(notice),
            None => html::tree_fragment(self.controller.tree()),
        }
    }

    fn rerender(&mut self) {
        let (tree, notice) = match self.renderer.render(&self.data) {
            RenderOutcome::Tree(tree) => (tree, None),
            RenderOutcome::Notice(notice) => (notice.to_tree(), Some(notice)),
        };
        // the previous controller and its handlers go away here
        self.controller = ToggleController::attach(tree);
        self.notice = notice;
        debug!(
            "re-rendered {} byte(s) of input, notice: {}",
            self.data.len(),
            self.notice.is_some()
        );
    }
}

impl Default for XmlView {
    fn default() -> Self {
        Self::new()
    }
}

impl HostElement for XmlView {
    fn on_input_changed(&mut self, new_text: &str) {
        if new_text != self.data {
            self.set_data(new_text);
        }
    }

    fn on_mount(&mut self) {
        self.mounted = true;
        // an unmounted view has no tree; anything else is already current
        if self.controller.tree().is_empty() {
            self.rerender();
        }
    }

    fn on_unmount(&mut self) {
        self.mounted = false;
        self.controller = ToggleController::attach(VisualTree::new());
        self.notice = None;
    }
}
