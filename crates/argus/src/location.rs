use std::fmt;

use swc_core::common::{SourceMap, Span};

/// A single position in the original source.
///
/// Lines are 1-based and columns 0-based, exactly as the parser delivers
/// them. The id table shifts columns to 1-based at serialization time; this
/// type keeps the parser's coordinates verbatim so diagnostics and the table
/// agree with the source map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl CodeLoc {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A start/end pair of positions covering one syntactic construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CodeRange {
    pub start: CodeLoc,
    pub end: CodeLoc,
}

impl CodeRange {
    #[must_use]
    pub fn new(start: CodeLoc, end: CodeLoc) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// Resolves a parser span against the source map.
///
/// Dummy spans (synthesized sites) have no position; callers treat `None` as
/// "no table entry".
pub(crate) fn convert_span(cm: &SourceMap, span: Span) -> Option<CodeRange> {
    if span.is_dummy() {
        return None;
    }
    let start = cm.lookup_char_pos(span.lo);
    let end = cm.lookup_char_pos(span.hi);
    Some(CodeRange::new(
        CodeLoc::new(u32::try_from(start.line).expect("line number exceeds u32"), start.col.0 as u32),
        CodeLoc::new(u32::try_from(end.line).expect("line number exceeds u32"), end.col.0 as u32),
    ))
}
