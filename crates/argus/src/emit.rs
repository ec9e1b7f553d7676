use std::fmt::Write as _;

/// Indented output writer for the instrumented source.
///
/// A plain string accumulator that knows the current depth, so statement
/// emission never does ad-hoc whitespace math. Expression fragments are built
/// as `String`s and handed to [`Writer::line`]; multi-line fragments embedded
/// inside expressions (function bodies) are produced by a child writer and
/// re-attached with [`Writer::into_embedded`].
#[derive(Debug, Clone)]
pub(crate) struct Writer {
    buffer: String,
    indent_width: usize,
    depth: usize,
    newline: &'static str,
}

impl Writer {
    pub fn new() -> Self {
        Self::with_depth(2, 0)
    }

    pub fn with_depth(indent_width: usize, depth: usize) -> Self {
        Self {
            buffer: String::new(),
            indent_width,
            depth,
            newline: "\n",
        }
    }

    /// A fresh writer starting at this writer's current depth.
    pub fn child(&self) -> Self {
        Self::with_depth(self.indent_width, self.depth)
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.depth > 0, "dedent below zero");
        self.depth -= 1;
    }

    /// Writes one statement line at the current depth.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let _ = write!(
            self.buffer,
            "{:width$}{}{}",
            "",
            text.as_ref(),
            self.newline,
            width = self.indent_width * self.depth
        );
    }

    pub fn into_string(self) -> String {
        self.buffer
    }

    /// Converts the buffer into a fragment embeddable inside an expression:
    /// the first line's indent is stripped (the fragment continues an
    /// existing line) and the trailing newline removed.
    pub fn into_embedded(self) -> String {
        let lead = self.indent_width * self.depth;
        let mut text = self.buffer;
        if text.ends_with('\n') {
            text.pop();
        }
        let strip = text.chars().take(lead).take_while(|c| *c == ' ').count();
        text.split_off(strip)
    }
}
