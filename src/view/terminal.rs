use super::style::{StyleRole, Theme};
use super::visual_tree::DisplayLine;
use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType, size},
};
use std::io::{self, Write, stdout};
use unicode_width::UnicodeWidthChar;

pub const TOOLBAR_TEXT: &str = "[E] Expand All  [C] Collapse All  [/] Search  [?] Help  [q] Quit";

/// Per-frame inputs to [`Screen::render`]
#[derive(Clone)]
pub struct ScreenParams<'a> {
    pub cursor: usize,
    pub status_message: &'a str,
    /// Text being typed at the bottom prompt, e.g. a search pattern
    pub prompt: Option<&'a str>,
    pub title: &'a str,
}

/// Gutter, indentation and glyph for one display line, without colours
pub fn plain_line(line: &DisplayLine<'_>, indent: usize) -> String {
    let mut out = " ".repeat(line.depth * indent);
    out.push_str(&gutter(line));
    out.push_str(&line.line.plain_text());
    out
}

fn gutter(line: &DisplayLine<'_>) -> String {
    match line.toggle {
        Some(state) => format!("{} ", state.glyph()),
        None => "  ".to_string(),
    }
}

/// Colour a display line for the terminal, clipped to `width` columns
pub fn styled_line(line: &DisplayLine<'_>, indent: usize, width: usize, theme: &Theme) -> String {
    let mut out = String::new();
    let mut remaining = width;

    let lead = " ".repeat(line.depth * indent);
    push_clipped(&mut out, &lead, &mut remaining);

    let gutter = gutter(line);
    out.push_str(&format!("{}", SetForegroundColor(theme.color_for(StyleRole::Toggle))));
    push_clipped(&mut out, &gutter, &mut remaining);

    for span in &line.line.spans {
        if remaining == 0 {
            break;
        }
        out.push_str(&format!("{}", SetForegroundColor(theme.color_for(span.role))));
        push_clipped(&mut out, &span.text, &mut remaining);
    }
    out.push_str(&format!("{ResetColor}"));
    out
}

fn push_clipped(out: &mut String, text: &str, remaining: &mut usize) {
    for ch in text.chars() {
        let ch = if ch == '\t' || ch.is_control() { ' ' } else { ch };
        let w = ch.width().unwrap_or(1);
        if w > *remaining {
            *remaining = 0;
            return;
        }
        *remaining -= w;
        out.push(ch);
    }
}

/// Write every line once, for non-interactive output
pub fn write_lines<W: Write>(
    out: &mut W,
    lines: &[DisplayLine<'_>],
    indent: usize,
    theme: Option<&Theme>,
) -> io::Result<()> {
    for line in lines {
        match theme {
            Some(theme) => writeln!(out, "{}", styled_line(line, indent, usize::MAX, theme))?,
            None => writeln!(out, "{}", plain_line(line, indent))?,
        }
    }
    Ok(())
}

/// Interactive terminal surface: redraws only what changed between frames
pub struct Screen {
    last_lines: Vec<String>,
    last_toolbar: Option<String>,
    last_status: String,
    last_terminal_size: (u16, u16),
    number_width: usize,
    scroll_offset: usize,
    needs_full_redraw: bool,
    render_count: usize,
    show_line_numbers: bool,
    show_toolbar: bool,
    indent: usize,
    theme: Theme,
}

impl Screen {
    pub fn new() -> Self {
        Self {
            last_lines: Vec::new(),
            last_toolbar: None,
            last_status: String::new(),
            last_terminal_size: (0, 0),
            number_width: 0,
            scroll_offset: 0,
            needs_full_redraw: true,
            render_count: 0,
            show_line_numbers: false,
            show_toolbar: true,
            indent: 2,
            theme: Theme::default(),
        }
    }

    fn clear_screen(&self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))
    }

    fn move_cursor(&self, line: usize, column: usize) -> io::Result<()> {
        execute!(stdout(), cursor::MoveTo(column as u16, line as u16))
    }

    fn first_content_row(&self) -> usize {
        if self.show_toolbar { 1 } else { 0 }
    }

    pub fn render(&mut self, lines: &[DisplayLine<'_>], params: &ScreenParams<'_>) -> io::Result<()> {
        let (width, height) = size()?;
        let start_line = self.first_content_row();

        self.render_count += 1;

        // Force full redraw every 50 renders to prevent state drift
        if self.render_count % 50 == 0 {
            self.needs_full_redraw = true;
        }

        let current_size = (width, height);
        if self.last_terminal_size != current_size {
            self.needs_full_redraw = true;
            self.last_terminal_size = current_size;
        }

        if self.needs_full_redraw {
            self.clear_screen()?;
            self.needs_full_redraw = false;
            self.last_lines.clear();
            self.last_toolbar = None;
            self.last_status.clear();
        }

        if self.show_toolbar {
            let toolbar = format!("{}  {}", params.title, TOOLBAR_TEXT);
            if self.last_toolbar.as_deref() != Some(toolbar.as_str()) {
                self.move_cursor(0, 0)?;
                execute!(stdout(), Clear(ClearType::CurrentLine))?;
                let mut clipped = String::new();
                let mut remaining = width as usize;
                push_clipped(&mut clipped, &toolbar, &mut remaining);
                queue!(
                    stdout(),
                    SetAttribute(Attribute::Reverse),
                    Print(clipped),
                    SetAttribute(Attribute::Reset)
                )?;
                self.last_toolbar = Some(toolbar);
            }
        }

        let max_lines = (height as usize).saturating_sub(1 + start_line);
        self.adjust_scroll_to_cursor(params.cursor, max_lines);

        let number_width = if self.show_line_numbers {
            (lines.len().to_string().len() + 1).max(4)
        } else {
            0
        };
        if self.number_width != number_width {
            self.number_width = number_width;
            self.last_lines.clear();
        }
        let text_width = (width as usize).saturating_sub(number_width).max(1);

        let visible_lines: Vec<String> = (0..max_lines)
            .map(|i| {
                let idx = self.scroll_offset + i;
                let Some(line) = lines.get(idx) else {
                    return String::new();
                };
                let number = if self.show_line_numbers {
                    format!("{:>width$} ", idx + 1, width = number_width - 1)
                } else {
                    String::new()
                };
                let body = styled_line(line, self.indent, text_width, &self.theme);
                if idx == params.cursor {
                    format!(
                        "{number}{}{body}{}",
                        SetAttribute(Attribute::Reverse),
                        SetAttribute(Attribute::Reset)
                    )
                } else {
                    format!("{number}{body}")
                }
            })
            .collect();

        if self.last_lines != visible_lines {
            for (i, line) in visible_lines.iter().enumerate() {
                if i >= self.last_lines.len() || self.last_lines[i] != *line {
                    self.move_cursor(i + start_line, 0)?;
                    execute!(stdout(), Clear(ClearType::CurrentLine))?;
                    print!("{line}");
                }
            }
            self.last_lines = visible_lines;
        }

        let current_status = match params.prompt {
            Some(prompt) => format!("/{prompt}"),
            None if !params.status_message.is_empty() => params.status_message.to_string(),
            None => format!("line {}/{}", (params.cursor + 1).min(lines.len()), lines.len()),
        };

        if self.last_status != current_status {
            self.move_cursor((height as usize).saturating_sub(1), 0)?;
            execute!(stdout(), Clear(ClearType::CurrentLine))?;
            let mut clipped = String::new();
            let mut remaining = width as usize;
            push_clipped(&mut clipped, &current_status, &mut remaining);
            print!("{clipped}");
            self.last_status = current_status;
        }

        stdout().flush()?;
        Ok(())
    }

    pub fn force_redraw(&mut self) {
        self.needs_full_redraw = true;
    }

    pub fn reset_scroll(&mut self) {
        self.scroll_offset = 0;
        self.needs_full_redraw = true;
    }

    pub fn set_line_numbers(&mut self, show: bool) {
        if self.show_line_numbers != show {
            self.show_line_numbers = show;
            self.needs_full_redraw = true;
        }
    }

    pub fn set_toolbar(&mut self, show: bool) {
        if self.show_toolbar != show {
            self.show_toolbar = show;
            self.needs_full_redraw = true;
        }
    }

    pub fn set_indent(&mut self, indent: usize) {
        if self.indent != indent {
            self.indent = indent;
            self.needs_full_redraw = true;
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.needs_full_redraw = true;
    }

    pub fn shows_line_numbers(&self) -> bool {
        self.show_line_numbers
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Visible line index under a terminal row, if the row shows content
    pub fn line_at_row(&self, row: u16) -> Option<usize> {
        let row = row as usize;
        let start = self.first_content_row();
        let (_, height) = self.last_terminal_size;
        if row < start || row + 1 >= height as usize {
            return None;
        }
        Some(self.scroll_offset + row - start)
    }

    /// Column span of the toggle glyph for a line at `depth`
    pub fn toggle_column(&self, depth: usize) -> usize {
        self.number_width + depth * self.indent
    }

    pub fn page_size(&self) -> usize {
        let (_, height) = self.last_terminal_size;
        (height as usize)
            .saturating_sub(1 + self.first_content_row())
            .max(1)
    }

    fn adjust_scroll_to_cursor(&mut self, cursor: usize, visible_lines: usize) {
        if visible_lines == 0 {
            return;
        }
        if cursor < self.scroll_offset {
            self.scroll_offset = cursor;
            self.needs_full_redraw = true;
        } else if cursor >= self.scroll_offset + visible_lines {
            self.scroll_offset = cursor - visible_lines + 1;
            self.needs_full_redraw = true;
        }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::visual_tree::{Line, LinePart, NodeId, ToggleState};
    use crate::view::{RenderOutcome, TreeRenderer};

    fn display<'a>(line: &'a Line, depth: usize, toggle: Option<ToggleState>) -> DisplayLine<'a> {
        DisplayLine {
            node: NodeId::from_index(0),
            depth,
            part: LinePart::Opening,
            line,
            toggle,
        }
    }

    #[test]
    fn test_plain_line_layout() {
        let line = Line::single("<b>", StyleRole::Tag);
        assert_eq!(plain_line(&display(&line, 0, Some(ToggleState::Expanded)), 2), "- <b>");
        assert_eq!(plain_line(&display(&line, 2, Some(ToggleState::Collapsed)), 2), "    + <b>");
        assert_eq!(plain_line(&display(&line, 1, None), 4), "      <b>");
    }

    #[test]
    fn test_styled_line_is_clipped_by_display_width() {
        let line = Line::single("中中中中", StyleRole::Text);
        let styled = styled_line(&display(&line, 0, None), 2, 6, &Theme::monochrome());
        assert!(styled.contains("中中"));
        assert!(!styled.contains("中中中"));
    }

    #[test]
    fn test_write_lines_plain() {
        let tree = TreeRenderer::new().render("<a><b>x</b></a>");
        let RenderOutcome::Tree(tree) = tree else {
            panic!("expected tree");
        };
        let mut out = Vec::new();
        write_lines(&mut out, &tree.visible_lines(), 2, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "- <a>\n  - <b>\n      x\n    </b>\n  </a>\n");
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let mut screen = Screen::new();
        screen.adjust_scroll_to_cursor(30, 10);
        assert_eq!(screen.scroll_offset(), 21);
        screen.adjust_scroll_to_cursor(5, 10);
        assert_eq!(screen.scroll_offset(), 5);
    }
}
