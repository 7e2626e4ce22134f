use super::source::{Attribute, Declaration, Element, SourceDocument, SourceNode};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{message} (at byte {position})")]
    Syntax { message: String, position: u64 },
    #[error("unexpected end of input, expected closing tag </{0}>")]
    UnclosedElement(String),
    #[error("no root element found")]
    NoRootElement,
    #[error("extra content after the document element: <{0}>")]
    MultipleRoots(String),
    #[error("text outside the document element (at byte {0})")]
    TextOutsideRoot(u64),
    #[error("elements nested deeper than {limit} levels (at byte {position})")]
    TooDeep { limit: usize, position: u64 },
}

/// Deepest element nesting accepted. Rendering, flattening and dropping a
/// tree all recurse once per level, so this has to fit a default thread stack.
pub const MAX_NESTING_DEPTH: usize = 1024;

/// Parse XML text into a [`SourceDocument`].
///
/// quick-xml does the tokenizing and end-tag matching; this only assembles
/// the tree and enforces the document-level rules quick-xml leaves to its
/// callers (single root, nothing left open, no stray text).
pub fn parse_document(source: &str) -> Result<SourceDocument, ParseError> {
    parse_document_with_limit(source, MAX_NESTING_DEPTH)
}

/// Like [`parse_document`], refusing documents whose elements nest deeper
/// than `max_depth` (capped at [`MAX_NESTING_DEPTH`]). The check happens
/// while reading, so an over-deep tree is never built.
pub fn parse_document_with_limit(
    source: &str,
    max_depth: usize,
) -> Result<SourceDocument, ParseError> {
    let max_depth = max_depth.clamp(1, MAX_NESTING_DEPTH);
    let document = TreeBuilder::new(source, max_depth).build()?;
    debug!(
        "parsed document: {} element(s), declaration: {}",
        document.count_elements(),
        document.declaration().is_some()
    );
    Ok(document)
}

struct TreeBuilder<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    stack: Vec<Element>,
    document: SourceDocument,
    max_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str, max_depth: usize) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            source,
            reader,
            stack: Vec::new(),
            document: SourceDocument::default(),
            max_depth,
        }
    }

    fn build(mut self) -> Result<SourceDocument, ParseError> {
        loop {
            let event_start = self.reader.buffer_position();

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    self.check_depth(event_start)?;
                    let element = Self::open_element(&e, event_start)?;
                    self.stack.push(element);
                }
                Ok(Event::End(_)) => {
                    // quick-xml has already matched the end name against the open tag
                    let Some(element) = self.stack.pop() else {
                        return Err(ParseError::Syntax {
                            message: "end tag without a matching start tag".to_string(),
                            position: event_start,
                        });
                    };
                    self.attach(SourceNode::Element(element))?;
                }
                Ok(Event::Empty(e)) => {
                    self.check_depth(event_start)?;
                    let element = Self::open_element(&e, event_start)?;
                    self.attach(SourceNode::Element(element))?;
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| ParseError::Syntax {
                        message: err.to_string(),
                        position: event_start,
                    })?;
                    self.attach_text(text.into_owned(), event_start)?;
                }
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.attach(SourceNode::Comment(text))?;
                }
                Ok(Event::Decl(_)) => {
                    if !self.at_document_start(event_start) {
                        return Err(ParseError::Syntax {
                            message: "XML declaration allowed only at the start of the document"
                                .to_string(),
                            position: event_start,
                        });
                    }
                    let event_end = self.reader.buffer_position();
                    let raw = self
                        .source
                        .get(event_start as usize..event_end as usize)
                        .unwrap_or_default()
                        .trim();
                    let declaration = parse_declaration(raw);
                    self.document.children.push(SourceNode::Declaration(declaration));
                }
                Ok(Event::CData(_) | Event::PI(_) | Event::DocType(_)) => {
                    self.attach(SourceNode::Other)?;
                }
                Ok(Event::Eof) => break,
                Err(err) => {
                    return Err(ParseError::Syntax {
                        message: err.to_string(),
                        position: self.reader.error_position(),
                    });
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(ParseError::UnclosedElement(open.name.clone()));
        }
        if self.document.root().is_none() {
            return Err(ParseError::NoRootElement);
        }

        Ok(self.document)
    }

    fn check_depth(&self, position: u64) -> Result<(), ParseError> {
        if self.stack.len() >= self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
                position,
            });
        }
        Ok(())
    }

    /// Nothing but a byte order mark may come before the declaration
    fn at_document_start(&self, position: u64) -> bool {
        self.stack.is_empty()
            && self.document.children.is_empty()
            && self
                .source
                .get(..position as usize)
                .is_some_and(|before| before.trim_start_matches('\u{feff}').is_empty())
    }

    fn open_element(start: &BytesStart<'_>, position: u64) -> Result<Element, ParseError> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));

        for attr_result in start.attributes() {
            let attr = attr_result.map_err(|err| ParseError::Syntax {
                message: err.to_string(),
                position,
            })?;
            let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|err| ParseError::Syntax {
                message: format!("invalid value for attribute '{name}': {err}"),
                position,
            })?;
            element.attributes.push(Attribute::new(name, value.into_owned()));
        }

        Ok(element)
    }

    fn attach(&mut self, node: SourceNode) -> Result<(), ParseError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }

        if let SourceNode::Element(element) = &node {
            if self.document.root().is_some() {
                return Err(ParseError::MultipleRoots(element.name.clone()));
            }
        }
        self.document.children.push(node);
        Ok(())
    }

    fn attach_text(&mut self, text: String, position: u64) -> Result<(), ParseError> {
        if self.stack.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(ParseError::TextOutsideRoot(position));
        }
        self.attach(SourceNode::Text(text))
    }
}

/// Pull the pseudo-attributes out of an `<?xml ...?>` pragma.
fn parse_declaration(raw: &str) -> Declaration {
    let mut declaration = Declaration {
        raw: raw.to_string(),
        version: "1.0".to_string(),
        encoding: None,
        standalone: None,
    };

    let Ok(pattern) = Regex::new(r#"([A-Za-z]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#) else {
        return declaration;
    };

    for caps in pattern.captures_iter(raw) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        match &caps[1] {
            "version" => declaration.version = value,
            "encoding" => declaration.encoding = Some(value),
            "standalone" => declaration.standalone = Some(value),
            _ => {}
        }
    }

    declaration
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(source: &str) -> Element {
        parse_document(source).unwrap().root().unwrap().clone()
    }

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let root = root_of(r#"<a><b x="1" y='two'>hi</b><!--note--></a>"#);

        assert_eq!(root.name, "a");
        assert_eq!(root.children.len(), 2);

        let SourceNode::Element(b) = &root.children[0] else {
            panic!("expected element");
        };
        assert_eq!(b.attributes, vec![Attribute::new("x", "1"), Attribute::new("y", "two")]);
        assert_eq!(b.children, vec![SourceNode::Text("hi".to_string())]);
        assert_eq!(root.children[1], SourceNode::Comment("note".to_string()));
    }

    #[test]
    fn test_entities_are_resolved() {
        let root = root_of(r#"<a t="&lt;&amp;&gt;">x &amp; y</a>"#);
        assert_eq!(root.attributes[0].value, "<&>");
        assert_eq!(root.children[0], SourceNode::Text("x & y".to_string()));
    }

    #[test]
    fn test_whitespace_text_is_kept_in_the_tree() {
        let root = root_of("<a>\n  <b/>\n</a>");
        assert_eq!(root.children.len(), 3);
        assert!(!root.children[0].is_renderable());
        assert!(root.children[1].is_renderable());
    }

    #[test]
    fn test_declaration_is_captured_verbatim() {
        let document = parse_document(r#"<?xml version="1.0" encoding="UTF-8"?><r/>"#).unwrap();
        let declaration = document.declaration().unwrap();
        assert_eq!(declaration.raw, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        assert_eq!(declaration.version, "1.0");
        assert_eq!(declaration.encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_declaration_pseudo_attributes() {
        let declaration = parse_declaration("<?xml version='1.1' standalone=\"yes\"?>");
        assert_eq!(declaration.version, "1.1");
        assert_eq!(declaration.encoding, None);
        assert_eq!(declaration.standalone.as_deref(), Some("yes"));
    }

    #[test]
    fn test_top_level_comments_are_kept_in_order() {
        let document = parse_document("<!--before--><r/><!--after-->").unwrap();
        assert_eq!(document.children.len(), 3);
        assert_eq!(document.children[0], SourceNode::Comment("before".to_string()));
        assert_eq!(document.children[2], SourceNode::Comment("after".to_string()));
    }

    #[test]
    fn test_cdata_and_processing_instructions_are_not_renderable() {
        let root = root_of("<a><![CDATA[raw]]><?pi data?></a>");
        assert_eq!(root.children, vec![SourceNode::Other, SourceNode::Other]);
        assert!(!root.has_renderable_children());
    }

    #[test]
    fn test_mismatched_end_tag_is_rejected() {
        let result = parse_document("<a><b></a>");
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_unclosed_element_is_rejected() {
        // depending on the reader, this surfaces at EOF or from the open-tag check
        assert!(matches!(
            parse_document("<a><b/>"),
            Err(ParseError::UnclosedElement(_) | ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn test_multiple_roots_are_rejected() {
        assert_eq!(
            parse_document("<a/><b/>"),
            Err(ParseError::MultipleRoots("b".to_string()))
        );
    }

    #[test]
    fn test_text_outside_root_is_rejected() {
        assert!(matches!(
            parse_document("hello <a/>"),
            Err(ParseError::TextOutsideRoot(_))
        ));
    }

    #[test]
    fn test_document_without_root_is_rejected() {
        assert_eq!(parse_document("<!-- only -->"), Err(ParseError::NoRootElement));
    }

    #[test]
    fn test_declaration_inside_root_is_rejected() {
        assert!(matches!(
            parse_document(r#"<r><?xml version="1.0"?></r>"#),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn test_declaration_after_root_is_rejected() {
        assert!(matches!(
            parse_document(r#"<r/><?xml version="1.0"?>"#),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn test_second_declaration_is_rejected() {
        assert!(matches!(
            parse_document(r#"<?xml version="1.0"?><?xml version="1.0"?><r/>"#),
            Err(ParseError::Syntax { .. })
        ));
        assert!(matches!(
            parse_document("<?xml version=\"1.0\"?>\n<?xml version=\"1.0\"?><r/>"),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn test_declaration_after_whitespace_is_rejected() {
        assert!(matches!(
            parse_document("  <?xml version=\"1.0\"?><r/>"),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn test_nesting_limit_stops_parsing_early() {
        let deep = format!("{}{}", "<a>".repeat(200_000), "</a>".repeat(200_000));
        assert!(matches!(
            parse_document(&deep),
            Err(ParseError::TooDeep {
                limit: MAX_NESTING_DEPTH,
                ..
            })
        ));
    }

    #[test]
    fn test_custom_nesting_limit() {
        assert!(parse_document_with_limit("<a><b/></a>", 2).is_ok());
        assert!(matches!(
            parse_document_with_limit("<a><b><c/></b></a>", 2),
            Err(ParseError::TooDeep { limit: 2, .. })
        ));
        // self-closing elements count too
        assert!(matches!(
            parse_document_with_limit("<a><b/></a>", 1),
            Err(ParseError::TooDeep { limit: 1, .. })
        ));
    }

    #[test]
    fn test_limit_cannot_exceed_ceiling() {
        let depth = MAX_NESTING_DEPTH + 1;
        let deep = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert!(matches!(
            parse_document_with_limit(&deep, usize::MAX),
            Err(ParseError::TooDeep {
                limit: MAX_NESTING_DEPTH,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_attribute_is_rejected() {
        assert!(matches!(
            parse_document(r#"<a x="1" x="2"/>"#),
            Err(ParseError::Syntax { .. })
        ));
    }
}
