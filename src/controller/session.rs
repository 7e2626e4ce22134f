use super::clipboard::{copy_to_clipboard, subtree_text};
use super::help::create_help_tree;
use super::host::{HostElement, XmlView};
use super::key_handler::{Command, KeyHandler, PromptInput};
use super::search::{SearchDirection, SearchState};
use crate::config::RcConfig;
use crate::view::{LinePart, NodeId, Screen, ScreenParams, ToggleState, VisualTree};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Write, stdout};
use std::path::PathBuf;

/// Interactive terminal session around one [`XmlView`]
pub struct ViewerSession {
    view: XmlView,
    screen: Screen,
    search: SearchState,
    cursor: usize,
    pending_key: Option<char>,
    prompt: Option<String>,
    help: Option<VisualTree>,
    status_message: String,
    source: Option<PathBuf>,
    title: String,
    mouse: bool,
}

impl ViewerSession {
    pub fn new(view: XmlView, source: Option<PathBuf>, config: &RcConfig) -> Self {
        let mut screen = Screen::new();
        config.apply_to_screen(&mut screen);

        let title = match &source {
            Some(path) => path.display().to_string(),
            None => "[stdin]".to_string(),
        };

        let status_message = view
            .notice()
            .map(|notice| notice.text.clone())
            .unwrap_or_default();

        Self {
            view,
            screen,
            search: SearchState::new(),
            cursor: 0,
            pending_key: None,
            prompt: None,
            help: None,
            status_message,
            source,
            title,
            mouse: config.mouse,
        }
    }

    pub fn view(&self) -> &XmlView {
        &self.view
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut out = stdout();
        enable_raw_mode()?;
        if let Err(err) = enter_screen(&mut out, self.mouse) {
            if let Err(restore_err) = restore_terminal(&mut out, self.mouse) {
                warn!("could not restore terminal: {restore_err}");
            }
            return Err(err.into());
        }
        self.view.on_mount();

        let result = self.run_loop();

        self.view.on_unmount();
        let restored = restore_terminal(&mut out, self.mouse);
        if let (Err(_), Err(restore_err)) = (&result, &restored) {
            warn!("could not restore terminal: {restore_err}");
        }
        result?;
        Ok(restored?)
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            {
                let lines = match &self.help {
                    Some(help) => help.visible_lines(),
                    None => self.view.visible_lines(),
                };
                let params = ScreenParams {
                    cursor: self.cursor,
                    status_message: &self.status_message,
                    prompt: self.prompt.as_deref(),
                    title: &self.title,
                };
                self.screen.render(&lines, &params)?;
            }

            match event::read()? {
                // only react to presses; some terminals also report releases
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    if self.handle_key(&key_event) {
                        break;
                    }
                }
                Event::Mouse(mouse_event) if self.mouse => self.handle_mouse(&mouse_event),
                Event::Resize(_, _) => self.screen.force_redraw(),
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns true when the session should end
    pub fn handle_key(&mut self, key_event: &KeyEvent) -> bool {
        if self.help.take().is_some() {
            self.cursor = 0;
            self.screen.reset_scroll();
            self.status_message.clear();
            return false;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(key_event);
            return false;
        }

        match KeyHandler::parse_key_with_state(key_event, &mut self.pending_key) {
            Some(command) => self.execute_command(command),
            None => false,
        }
    }

    fn handle_prompt_key(&mut self, key_event: &KeyEvent) {
        let Some(input) = KeyHandler::parse_prompt_key(key_event) else {
            return;
        };
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };

        match input {
            PromptInput::Char(c) => prompt.push(c),
            PromptInput::Backspace => {
                if prompt.pop().is_none() {
                    self.prompt = None;
                }
            }
            PromptInput::Cancel => self.prompt = None,
            PromptInput::Submit => {
                let pattern = prompt.clone();
                self.prompt = None;
                self.start_search(&pattern);
            }
        }
    }

    pub fn execute_command(&mut self, command: Command) -> bool {
        self.status_message.clear();
        let line_count = self.view.visible_lines().len();
        let page = self.screen.page_size();

        match command {
            Command::MoveUp => self.cursor = self.cursor.saturating_sub(1),
            Command::MoveDown => self.move_to(self.cursor + 1),
            Command::MovePageUp => self.cursor = self.cursor.saturating_sub(page),
            Command::MovePageDown => self.move_to(self.cursor + page),
            Command::MoveHalfPageUp => self.cursor = self.cursor.saturating_sub((page / 2).max(1)),
            Command::MoveHalfPageDown => self.move_to(self.cursor + (page / 2).max(1)),
            Command::MoveDocumentStart => self.cursor = 0,
            Command::MoveDocumentEnd => self.cursor = line_count.saturating_sub(1),
            Command::MoveToParent => self.move_to_parent(),

            Command::ToggleNode => {
                self.toggle_at_cursor(None);
            }
            Command::ExpandNode => {
                self.toggle_at_cursor(Some(ToggleState::Expanded));
            }
            Command::CollapseNode => {
                let collapsed = self.toggle_at_cursor(Some(ToggleState::Collapsed));
                if !collapsed {
                    self.move_to_parent();
                }
            }
            Command::ExpandAll => {
                let node = self.node_at_cursor();
                self.view.expand_all();
                self.follow_node(node);
                self.status_message = "Expanded all".to_string();
            }
            Command::CollapseAll => {
                let node = self.node_at_cursor();
                self.view.collapse_all();
                self.follow_node(node);
                self.status_message = "Collapsed all".to_string();
            }

            Command::EnterSearchMode => self.prompt = Some(String::new()),
            Command::SearchNext => self.repeat_search(true),
            Command::SearchPrevious => self.repeat_search(false),

            Command::YankSubtree => self.yank_at_cursor(),
            Command::ToggleLineNumbers => {
                let show = !self.screen.shows_line_numbers();
                self.screen.set_line_numbers(show);
            }
            Command::Reload => self.reload(),
            Command::ShowHelp => {
                self.help = Some(create_help_tree());
                self.screen.reset_scroll();
            }
            Command::Redraw => self.screen.force_redraw(),
            Command::Quit => return true,
        }

        self.clamp_cursor();
        false
    }

    fn move_to(&mut self, line: usize) {
        let last = self.view.visible_lines().len().saturating_sub(1);
        self.cursor = line.min(last);
    }

    fn clamp_cursor(&mut self) {
        self.move_to(self.cursor);
    }

    fn node_at_cursor(&self) -> Option<NodeId> {
        self.view.visible_lines().get(self.cursor).map(|l| l.node)
    }

    /// Put the cursor back on `node`'s opening line, or on its nearest
    /// visible ancestor, after the visible lines changed.
    fn follow_node(&mut self, node: Option<NodeId>) {
        let Some(node) = node else {
            return;
        };
        let lines = self.view.visible_lines();
        if let Some(idx) = lines
            .iter()
            .position(|l| l.node == node && l.part != LinePart::Closing)
        {
            self.cursor = idx;
            return;
        }

        let path = ancestors_of(self.view.tree(), node);
        for ancestor in path.iter().rev() {
            if let Some(idx) = lines
                .iter()
                .position(|l| l.node == *ancestor && l.part == LinePart::Opening)
            {
                self.cursor = idx;
                return;
            }
        }
        self.cursor = 0;
    }

    /// Flip (or force) the fold of the element under the cursor. Returns
    /// whether its state changed.
    fn toggle_at_cursor(&mut self, target: Option<ToggleState>) -> bool {
        let Some(node) = self.node_at_cursor() else {
            return false;
        };
        let Some(current) = self.view.tree().block(node).and_then(|b| b.toggle_state()) else {
            return false;
        };

        let next = target.unwrap_or(match current {
            ToggleState::Expanded => ToggleState::Collapsed,
            ToggleState::Collapsed => ToggleState::Expanded,
        });
        if next == current {
            return false;
        }

        match self.view.set_state(node, next) {
            Ok(()) => {
                self.follow_node(Some(node));
                true
            }
            Err(e) => {
                warn!("toggle failed: {e}");
                self.status_message = e.to_string();
                false
            }
        }
    }

    fn move_to_parent(&mut self) {
        let lines = self.view.visible_lines();
        let Some(current) = lines.get(self.cursor) else {
            return;
        };
        let depth = current.depth;
        if let Some(idx) = lines[..self.cursor]
            .iter()
            .rposition(|l| l.depth < depth && l.part == LinePart::Opening)
        {
            self.cursor = idx;
        }
    }

    fn handle_mouse(&mut self, mouse_event: &MouseEvent) {
        match mouse_event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.click(mouse_event.row, mouse_event.column);
            }
            MouseEventKind::ScrollDown => {
                self.execute_command(Command::MoveDown);
            }
            MouseEventKind::ScrollUp => {
                self.execute_command(Command::MoveUp);
            }
            _ => {}
        }
    }

    /// A click on a `-`/`+` glyph toggles that element; anywhere else on a
    /// line just moves the cursor there.
    fn click(&mut self, row: u16, column: u16) {
        if self.help.is_some() {
            return;
        }
        let Some(idx) = self.screen.line_at_row(row) else {
            return;
        };
        let (depth, on_marker) = {
            let lines = self.view.visible_lines();
            let Some(line) = lines.get(idx) else {
                return;
            };
            (line.depth, line.toggle.is_some())
        };

        self.cursor = idx;
        let glyph_column = self.screen.toggle_column(depth);
        let column = column as usize;
        if on_marker && (glyph_column..glyph_column + 2).contains(&column) {
            debug!("click on toggle at line {idx}");
            self.toggle_at_cursor(None);
        }
    }

    fn start_search(&mut self, pattern: &str) {
        if let Err(e) = self.search.set_pattern(pattern, SearchDirection::Forward) {
            self.status_message = e.to_string();
            return;
        }
        self.repeat_search(true);
    }

    fn repeat_search(&mut self, forward: bool) {
        if !self.search.has_pattern() {
            self.status_message = "No previous search pattern".to_string();
            return;
        }

        let lines = self.view.visible_lines();
        self.search.search_lines(&lines);
        let found = if forward {
            self.search.repeat_last_search(self.cursor)
        } else {
            self.search.repeat_last_search_reverse(self.cursor)
        };

        match found.map(|m| m.line) {
            Some(line) => {
                self.cursor = line;
                let total = self.search.matches.len();
                let current = self.search.current_match_index().map_or(0, |i| i + 1);
                self.status_message = format!("/{} [{current}/{total}]", self.search.pattern);
            }
            None => {
                self.status_message = format!("Pattern not found: {}", self.search.pattern);
            }
        }
    }

    fn yank_at_cursor(&mut self) {
        let Some(node) = self.node_at_cursor() else {
            return;
        };
        let text = subtree_text(self.view.tree(), node, self.screen.indent());
        let line_count = text.lines().count();
        match copy_to_clipboard(&text) {
            Ok(()) => {
                info!("copied {line_count} line(s) to the clipboard");
                self.status_message = format!("{line_count} line(s) copied");
            }
            Err(e) => {
                warn!("clipboard unavailable: {e}");
                self.status_message = format!("Error: Could not access clipboard: {e}");
            }
        }
    }

    fn reload(&mut self) {
        let Some(path) = self.source.clone() else {
            self.status_message = "Nothing to reload: input came from stdin".to_string();
            return;
        };

        match fs::read_to_string(&path) {
            Ok(text) => {
                self.view.on_input_changed(&text);
                self.cursor = 0;
                self.screen.reset_scroll();
                self.status_message = match self.view.notice() {
                    Some(notice) => notice.text.clone(),
                    None => format!("Reloaded {}", path.display()),
                };
                info!("reloaded {}", path.display());
            }
            Err(e) => {
                warn!("reload of {} failed: {e}", path.display());
                self.status_message = format!("Error reading {}: {e}", path.display());
            }
        }
    }
}

/// Block ids from the root down to (not including) `target`
fn ancestors_of(tree: &VisualTree, target: NodeId) -> Vec<NodeId> {
    fn walk(tree: &VisualTree, id: NodeId, target: NodeId, path: &mut Vec<NodeId>) -> bool {
        if id == target {
            return true;
        }
        let Some(container) = tree.block(id).and_then(|b| b.container.as_ref()) else {
            return false;
        };
        path.push(id);
        if container
            .children
            .iter()
            .any(|&child| walk(tree, child, target, path))
        {
            return true;
        }
        path.pop();
        false
    }

    let mut path = Vec::new();
    for &root in tree.roots() {
        if walk(tree, root, target, &mut path) {
            break;
        }
    }
    path
}

fn enter_screen<W: Write>(out: &mut W, mouse: bool) -> io::Result<()> {
    execute!(out, EnterAlternateScreen)?;
    if mouse {
        execute!(out, EnableMouseCapture)?;
    }
    Ok(())
}

/// Undo everything `run` set up. Every step is attempted even if an
/// earlier one fails; the first error is returned.
fn leave_screen<W: Write>(out: &mut W, mouse: bool) -> io::Result<()> {
    let mouse_result = if mouse {
        execute!(out, DisableMouseCapture)
    } else {
        Ok(())
    };
    let screen_result = execute!(out, LeaveAlternateScreen);
    mouse_result.and(screen_result)
}

fn restore_terminal<W: Write>(out: &mut W, mouse: bool) -> io::Result<()> {
    let screen_result = leave_screen(out, mouse);
    let raw_result = disable_raw_mode();
    screen_result.and(raw_result)
}
