use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveHalfPageUp,
    MoveHalfPageDown,
    MoveDocumentStart,
    MoveDocumentEnd,
    MoveToParent,

    ToggleNode,
    ExpandNode,
    CollapseNode,
    ExpandAll,
    CollapseAll,

    EnterSearchMode,
    SearchNext,
    SearchPrevious,

    YankSubtree,
    ToggleLineNumbers,
    Reload,
    ShowHelp,
    Redraw,
    Quit,
}

/// What a key does while the search prompt is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    Char(char),
    Backspace,
    Submit,
    Cancel,
}

pub struct KeyHandler;

impl KeyHandler {
    /// Map a key to a command. `pending_key` carries the first half of
    /// two-key sequences such as `gg` between calls.
    pub fn parse_key_with_state(
        key_event: &KeyEvent,
        pending_key: &mut Option<char>,
    ) -> Option<Command> {
        let key = key_event.code;
        let modifiers = key_event.modifiers;

        if let Some(pending) = pending_key.take() {
            return match (pending, key) {
                ('g', KeyCode::Char('g')) => Some(Command::MoveDocumentStart),
                ('z', KeyCode::Char('M')) => Some(Command::CollapseAll),
                ('z', KeyCode::Char('R')) => Some(Command::ExpandAll),
                ('z', KeyCode::Char('a')) => Some(Command::ToggleNode),
                ('z', KeyCode::Char('o')) => Some(Command::ExpandNode),
                ('z', KeyCode::Char('c')) => Some(Command::CollapseNode),
                // unknown sequence: drop the prefix and treat the key on its own
                _ => Self::parse_key(key, modifiers, pending_key),
            };
        }

        Self::parse_key(key, modifiers, pending_key)
    }

    fn parse_key(
        key: KeyCode,
        modifiers: KeyModifiers,
        pending_key: &mut Option<char>,
    ) -> Option<Command> {
        match key {
            // Control keys first (more specific)
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
            KeyCode::Char('f') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::MovePageDown)
            }
            KeyCode::Char('b') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::MovePageUp)
            }
            KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::MoveHalfPageDown)
            }
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::MoveHalfPageUp)
            }
            KeyCode::Char('l') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Redraw)
            }
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Reload)
            }

            // Movement
            KeyCode::Char('j') | KeyCode::Down => Some(Command::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Command::MoveUp),
            KeyCode::PageDown => Some(Command::MovePageDown),
            KeyCode::PageUp => Some(Command::MovePageUp),
            KeyCode::Home => Some(Command::MoveDocumentStart),
            KeyCode::End | KeyCode::Char('G') => Some(Command::MoveDocumentEnd),
            KeyCode::Char('p') => Some(Command::MoveToParent),
            KeyCode::Char('g') | KeyCode::Char('z') => {
                if let KeyCode::Char(c) = key {
                    *pending_key = Some(c);
                }
                None
            }

            // Folding
            KeyCode::Enter | KeyCode::Char(' ') => Some(Command::ToggleNode),
            KeyCode::Char('l') | KeyCode::Right => Some(Command::ExpandNode),
            KeyCode::Char('h') | KeyCode::Left => Some(Command::CollapseNode),
            KeyCode::Char('E') => Some(Command::ExpandAll),
            KeyCode::Char('C') => Some(Command::CollapseAll),

            // Search
            KeyCode::Char('/') => Some(Command::EnterSearchMode),
            KeyCode::Char('n') => Some(Command::SearchNext),
            KeyCode::Char('N') => Some(Command::SearchPrevious),

            KeyCode::Char('y') => Some(Command::YankSubtree),
            KeyCode::Char('#') => Some(Command::ToggleLineNumbers),
            KeyCode::Char('r') => Some(Command::Reload),
            KeyCode::Char('?') | KeyCode::F(1) => Some(Command::ShowHelp),
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),

            _ => None,
        }
    }

    pub fn parse_prompt_key(key_event: &KeyEvent) -> Option<PromptInput> {
        match key_event.code {
            KeyCode::Esc => Some(PromptInput::Cancel),
            KeyCode::Enter => Some(PromptInput::Submit),
            KeyCode::Backspace => Some(PromptInput::Backspace),
            KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(PromptInput::Char(c))
            }
            _ => None,
        }
    }
}
