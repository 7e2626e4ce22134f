use crossterm::style::Color;

/// Visual category of a piece of rendered text.
///
/// Every role must stay distinguishable from the others on every display
/// surface; the exact colours are a theme choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleRole {
    Tag,
    AttrName,
    AttrValue,
    /// `="`, `"` and separating spaces inside a tag
    Punctuation,
    Text,
    Comment,
    Declaration,
    Toggle,
    Info,
    Error,
}

impl StyleRole {
    pub const ALL: [StyleRole; 10] = [
        StyleRole::Tag,
        StyleRole::AttrName,
        StyleRole::AttrValue,
        StyleRole::Punctuation,
        StyleRole::Text,
        StyleRole::Comment,
        StyleRole::Declaration,
        StyleRole::Toggle,
        StyleRole::Info,
        StyleRole::Error,
    ];

    /// CSS class used by the HTML projection
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            StyleRole::Tag => Some("xml-tag"),
            StyleRole::AttrName => Some("xml-attr-name"),
            StyleRole::AttrValue => Some("xml-attr-value"),
            StyleRole::Punctuation => None,
            StyleRole::Text => Some("xml-content"),
            StyleRole::Comment => Some("xml-comment"),
            StyleRole::Declaration => Some("xml-declaration"),
            StyleRole::Toggle => Some("toggle-btn"),
            StyleRole::Info => Some("xml-info"),
            StyleRole::Error => Some("xml-error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub tag: Color,
    pub attr_name: Color,
    pub attr_value: Color,
    pub punctuation: Color,
    pub text: Color,
    pub comment: Color,
    pub declaration: Color,
    pub toggle: Color,
    pub info: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            tag: Color::Blue,
            attr_name: Color::DarkRed,
            attr_value: Color::DarkGreen,
            punctuation: Color::Blue,
            text: Color::Reset,
            comment: Color::DarkGrey,
            declaration: Color::Grey,
            toggle: Color::Yellow,
            info: Color::Cyan,
            error: Color::Red,
        }
    }
}

impl Theme {
    /// No colours at all, for `--no-color` and dumb terminals
    pub fn monochrome() -> Self {
        Self {
            tag: Color::Reset,
            attr_name: Color::Reset,
            attr_value: Color::Reset,
            punctuation: Color::Reset,
            text: Color::Reset,
            comment: Color::Reset,
            declaration: Color::Reset,
            toggle: Color::Reset,
            info: Color::Reset,
            error: Color::Reset,
        }
    }

    pub fn color_for(&self, role: StyleRole) -> Color {
        match role {
            StyleRole::Tag => self.tag,
            StyleRole::AttrName => self.attr_name,
            StyleRole::AttrValue => self.attr_value,
            StyleRole::Punctuation => self.punctuation,
            StyleRole::Text => self.text,
            StyleRole::Comment => self.comment,
            StyleRole::Declaration => self.declaration,
            StyleRole::Toggle => self.toggle,
            StyleRole::Info => self.info,
            StyleRole::Error => self.error,
        }
    }
}

/// Stylesheet for the HTML projection
pub const STYLESHEET: &str = r#"
.pure-xml-view { font-family: monospace; white-space: pre-wrap; background-color: #f5f5f5; border-radius: 4px; }
.toolbar { display: flex; justify-content: flex-end; padding: 8px; background-color: #e0e0e0; border-bottom: 1px solid #ccc; }
.toolbar-button { background-color: #fff; border: 1px solid #ccc; border-radius: 3px; padding: 4px 8px; margin-right: 8px; cursor: pointer; font-family: sans-serif; font-size: 12px; }
.xml-container { margin: 0; padding: 1rem 1rem 1rem 2rem; overflow: auto; }
.xml-node { margin-left: 20px; position: relative; }
.xml-tag { color: #0000cc; }
.xml-attr-name { color: #990000; }
.xml-attr-value { color: #006600; }
.xml-content { color: #333; }
.xml-comment { color: #888888; font-style: italic; }
.xml-declaration { color: #888888; font-weight: bold; }
.xml-info { color: #555555; }
.xml-error { color: #cc0000; }
.toggle-btn { cursor: pointer; width: 16px; height: 16px; display: inline-block; text-align: center; line-height: 14px; border: 1px solid #ccc; position: absolute; left: -20px; top: 2px; background-color: #fff; border-radius: 3px; font-size: 12px; }
.collapsed { display: none !important; }
.line { min-height: 18px; line-height: 18px; position: relative; }
.node-block { position: relative; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_content_roles_have_distinct_css_classes() {
        let classes: Vec<&str> = StyleRole::ALL.iter().filter_map(|r| r.css_class()).collect();
        let unique: HashSet<&str> = classes.iter().copied().collect();
        assert_eq!(classes.len(), unique.len());
        assert_eq!(classes.len(), StyleRole::ALL.len() - 1);
    }

    #[test]
    fn test_default_theme_distinguishes_syntax_roles() {
        let theme = Theme::default();
        let roles = [
            StyleRole::Tag,
            StyleRole::AttrName,
            StyleRole::AttrValue,
            StyleRole::Text,
            StyleRole::Comment,
            StyleRole::Declaration,
            StyleRole::Error,
        ];
        let colors: HashSet<String> = roles
            .iter()
            .map(|r| format!("{:?}", theme.color_for(*r)))
            .collect();
        assert_eq!(colors.len(), roles.len());
    }
}
