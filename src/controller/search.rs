use crate::view::DisplayLine;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Index into the visible lines the search ran over
    pub line: usize,
    pub start_col: usize,
    pub end_col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
    #[error("No search pattern")]
    NoPattern,
}

/// Incremental text search over the lines currently on screen
#[derive(Debug, Clone)]
pub struct SearchState {
    pub pattern: String,
    pub direction: SearchDirection,
    pub matches: Vec<SearchMatch>,
    pub current_match: Option<usize>,
    regex: Option<Regex>,
    pub case_sensitive: bool,
    pub wrap_search: bool,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            pattern: String::new(),
            direction: SearchDirection::Forward,
            matches: Vec::new(),
            current_match: None,
            regex: None,
            case_sensitive: false,
            wrap_search: true,
        }
    }

    pub fn has_pattern(&self) -> bool {
        self.regex.is_some()
    }

    /// Compile a literal pattern. Tag names are full of regex metacharacters
    /// (`.` and `-`), so the text is escaped rather than taken as a regex.
    pub fn set_pattern(
        &mut self,
        pattern: &str,
        direction: SearchDirection,
    ) -> Result<(), SearchError> {
        self.pattern = pattern.to_string();
        self.direction = direction;
        self.matches.clear();
        self.current_match = None;

        if pattern.is_empty() {
            self.regex = None;
            return Err(SearchError::NoPattern);
        }

        let escaped = regex::escape(pattern);
        let regex_str = if self.case_sensitive {
            escaped
        } else {
            format!("(?i){escaped}")
        };

        match Regex::new(&regex_str) {
            Ok(regex) => {
                self.regex = Some(regex);
                Ok(())
            }
            Err(e) => {
                self.regex = None;
                Err(SearchError::InvalidPattern(e.to_string()))
            }
        }
    }

    /// Recollect matches. Needed whenever the visible lines change, e.g.
    /// after a fold is toggled.
    pub fn search_lines(&mut self, lines: &[DisplayLine<'_>]) {
        self.matches.clear();
        self.current_match = None;

        let Some(regex) = &self.regex else {
            return;
        };

        for (line_idx, line) in lines.iter().enumerate() {
            let text = line.line.plain_text();
            for mat in regex.find_iter(&text) {
                self.matches.push(SearchMatch {
                    line: line_idx,
                    start_col: mat.start(),
                    end_col: mat.end(),
                });
            }
        }
    }

    /// First match on a line after `from_line`, wrapping if allowed
    pub fn find_next_match(&mut self, from_line: usize) -> Option<&SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }

        let idx = match self.matches.iter().position(|m| m.line > from_line) {
            Some(idx) => idx,
            None if self.wrap_search => 0,
            None => return None,
        };
        self.current_match = Some(idx);
        self.matches.get(idx)
    }

    pub fn find_prev_match(&mut self, from_line: usize) -> Option<&SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }

        let idx = match self.matches.iter().rposition(|m| m.line < from_line) {
            Some(idx) => idx,
            None if self.wrap_search => self.matches.len() - 1,
            None => return None,
        };
        self.current_match = Some(idx);
        self.matches.get(idx)
    }

    /// `n`: repeat in the direction of the last search
    pub fn repeat_last_search(&mut self, from_line: usize) -> Option<&SearchMatch> {
        match self.direction {
            SearchDirection::Forward => self.find_next_match(from_line),
            SearchDirection::Backward => self.find_prev_match(from_line),
        }
    }

    /// `N`: repeat against the direction of the last search
    pub fn repeat_last_search_reverse(&mut self, from_line: usize) -> Option<&SearchMatch> {
        match self.direction {
            SearchDirection::Forward => self.find_prev_match(from_line),
            SearchDirection::Backward => self.find_next_match(from_line),
        }
    }

    pub fn current_match_index(&self) -> Option<usize> {
        self.current_match
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}
