/// Document model subsystem - the parsed XML the viewer displays
///
/// This module holds the read-only Source Document and the parser that
/// builds it from raw text. The view layer consumes it, nothing writes back.

pub mod parser;
pub mod source;

// Re-export main types for convenience
pub use parser::{MAX_NESTING_DEPTH, ParseError, parse_document, parse_document_with_limit};
pub use source::{Attribute, Declaration, Element, SourceDocument, SourceNode};
