use crate::view::{NodeId, ToggleState, VisualTree};
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("node {0} has no toggle marker")]
    NoMarker(usize),
}

/// Expand/collapse state machine over a rendered tree.
///
/// Attaching wires one handler per toggle marker; dropping the controller
/// (on the next render) drops them together with the tree. Only the collapse
/// flags change, the structure of the tree never does.
#[derive(Debug, Clone)]
pub struct ToggleController {
    tree: VisualTree,
    markers: Vec<NodeId>,
}

impl ToggleController {
    pub fn attach(tree: VisualTree) -> Self {
        let markers = tree.toggle_markers();
        debug!("toggle controller attached to {} marker(s)", markers.len());
        Self { tree, markers }
    }

    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    pub fn markers(&self) -> &[NodeId] {
        &self.markers
    }

    pub fn state(&self, id: NodeId) -> Option<ToggleState> {
        self.tree.block(id).and_then(|block| block.toggle_state())
    }

    /// Flip one block between expanded and collapsed; descendants keep
    /// whatever state they already had.
    pub fn toggle(&mut self, id: NodeId) -> Result<ToggleState, ToggleError> {
        let next = match self.wired_state(id)? {
            ToggleState::Expanded => ToggleState::Collapsed,
            ToggleState::Collapsed => ToggleState::Expanded,
        };
        self.set_state(id, next)?;
        Ok(next)
    }

    pub fn set_state(&mut self, id: NodeId, state: ToggleState) -> Result<(), ToggleError> {
        self.wired_state(id)?;
        let block = self
            .tree
            .block_mut(id)
            .ok_or(ToggleError::NoMarker(id.index()))?;
        block.set_collapsed(state == ToggleState::Collapsed);
        debug!("block {} <{}> -> {:?}", id.index(), block.name, state);
        Ok(())
    }

    pub fn expand_all(&mut self) {
        self.set_all(false);
        debug!("expanded all blocks");
    }

    pub fn collapse_all(&mut self) {
        self.set_all(true);
        debug!("collapsed all blocks");
    }

    fn set_all(&mut self, collapsed: bool) {
        for block in self.tree.blocks_mut() {
            // blocks without a marker have nothing to hide
            block.set_collapsed(collapsed);
        }
    }

    fn wired_state(&self, id: NodeId) -> Result<ToggleState, ToggleError> {
        if self.markers.binary_search(&id).is_err() {
            return Err(ToggleError::NoMarker(id.index()));
        }
        self.state(id).ok_or(ToggleError::NoMarker(id.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{RenderOutcome, TreeRenderer};

    const SAMPLE: &str = r#"<a><b x="1">hi</b><c><d/><e>t</e></c><!--note--></a>"#;

    fn controller(source: &str) -> ToggleController {
        match TreeRenderer::new().render(source) {
            RenderOutcome::Tree(tree) => ToggleController::attach(tree),
            RenderOutcome::Notice(notice) => panic!("unexpected notice: {}", notice.text),
        }
    }

    fn find(controller: &ToggleController, name: &str) -> NodeId {
        controller
            .tree()
            .blocks()
            .find(|(_, block)| block.name == name)
            .map(|(id, _)| id)
            .unwrap()
    }

    fn visible_texts(controller: &ToggleController) -> Vec<String> {
        controller
            .tree()
            .visible_lines()
            .iter()
            .map(|l| l.line.plain_text())
            .collect()
    }

    #[test]
    fn test_everything_starts_expanded() {
        let controller = controller(SAMPLE);
        assert_eq!(controller.markers().len(), 4);
        for &id in controller.markers() {
            assert_eq!(controller.state(id), Some(ToggleState::Expanded));
        }
    }

    #[test]
    fn test_toggle_hides_children_and_closing_line() {
        let mut controller = controller(SAMPLE);
        let c = find(&controller, "c");

        assert_eq!(controller.toggle(c), Ok(ToggleState::Collapsed));
        let lines = visible_texts(&controller);
        assert!(lines.contains(&"<c>".to_string()));
        assert!(!lines.contains(&"<d />".to_string()));
        assert!(!lines.contains(&"</c>".to_string()));
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut controller = controller(SAMPLE);
        let before = controller.tree().clone();
        let b = find(&controller, "b");

        controller.toggle(b).unwrap();
        assert_ne!(controller.tree(), &before);
        assert_eq!(controller.toggle(b), Ok(ToggleState::Expanded));
        assert_eq!(controller.tree(), &before);
    }

    #[test]
    fn test_collapsing_parent_keeps_descendant_state() {
        let mut controller = controller(SAMPLE);
        let a = find(&controller, "a");
        let e = find(&controller, "e");

        controller.toggle(e).unwrap();
        controller.toggle(a).unwrap();
        assert_eq!(visible_texts(&controller), vec!["<a>"]);
        assert_eq!(controller.state(e), Some(ToggleState::Collapsed));

        controller.toggle(a).unwrap();
        let lines = visible_texts(&controller);
        assert!(lines.contains(&"<e>".to_string()));
        assert!(!lines.contains(&"t".to_string()));
    }

    #[test]
    fn test_collapse_all_then_expand_all_restores_everything() {
        let mut controller = controller(SAMPLE);
        let expanded = controller.tree().clone();
        let b = find(&controller, "b");
        controller.toggle(b).unwrap();

        controller.collapse_all();
        for &id in controller.markers() {
            assert_eq!(controller.state(id), Some(ToggleState::Collapsed));
        }
        assert_eq!(visible_texts(&controller), vec!["<a>"]);

        controller.expand_all();
        assert_eq!(controller.tree(), &expanded);
    }

    #[test]
    fn test_bulk_operations_are_idempotent() {
        let mut controller = controller(SAMPLE);

        controller.collapse_all();
        let once = controller.tree().clone();
        controller.collapse_all();
        assert_eq!(controller.tree(), &once);

        controller.expand_all();
        let once = controller.tree().clone();
        controller.expand_all();
        assert_eq!(controller.tree(), &once);
    }

    #[test]
    fn test_blocks_without_marker_are_unaffected() {
        let mut controller = controller(SAMPLE);
        let d = find(&controller, "d");

        controller.collapse_all();
        assert_eq!(controller.state(d), None);
        assert_eq!(controller.toggle(d), Err(ToggleError::NoMarker(d.index())));
    }

    #[test]
    fn test_toggle_leaves_structure_untouched() {
        let mut controller = controller(SAMPLE);
        let before: Vec<String> = controller
            .tree()
            .subtree_lines(controller.tree().roots()[0])
            .iter()
            .map(|l| l.line.plain_text())
            .collect();

        controller.collapse_all();
        let after: Vec<String> = controller
            .tree()
            .subtree_lines(controller.tree().roots()[0])
            .iter()
            .map(|l| l.line.plain_text())
            .collect();
        assert_eq!(before, after);
    }
}
