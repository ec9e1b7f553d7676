use indexmap::IndexMap;
use swc_core::common::{SourceMap, Span, sync::Lrc};

use crate::location::{CodeRange, convert_span};

/// One entry of the id table: `[startLine, startColumn, endLine, endColumn]`,
/// everything 1-based (the parser's 0-based columns are shifted by one at
/// registration time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SiteLocation(pub [u32; 4]);

/// Allocates site ids and remembers where each instrumented site came from.
///
/// Ids are plain integers handed out in visit order, strictly increasing,
/// never reused, and carrying no structure. They are scoped to one file: each
/// produced file publishes its own table at script-enter, so ids need not be
/// unique across files.
pub struct IdRegistry {
    cm: Lrc<SourceMap>,
    next: u32,
    locations: IndexMap<u32, SiteLocation>,
}

impl std::fmt::Debug for IdRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdRegistry")
            .field("next", &self.next)
            .field("locations", &self.locations)
            .finish_non_exhaustive()
    }
}

impl IdRegistry {
    #[must_use]
    pub fn new(cm: Lrc<SourceMap>) -> Self {
        Self {
            cm,
            next: 0,
            locations: IndexMap::new(),
        }
    }

    /// Returns the next id. If the span is real, the table gains an entry for
    /// it; synthesized (dummy) spans get an id but no entry.
    pub fn new_id(&mut self, span: Span) -> u32 {
        let id = self.next;
        self.next += 1;
        if let Some(range) = convert_span(&self.cm, span) {
            self.locations.insert(
                id,
                SiteLocation([
                    range.start.line,
                    range.start.column + 1,
                    range.end.line,
                    range.end.column + 1,
                ]),
            );
        }
        id
    }

    /// Source coordinates for diagnostics; `None` for synthesized spans.
    #[must_use]
    pub fn range(&self, span: Span) -> Option<CodeRange> {
        convert_span(&self.cm, span)
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn allocated(&self) -> u32 {
        self.next
    }

    #[must_use]
    pub fn location_of(&self, id: u32) -> Option<SiteLocation> {
        self.locations.get(&id).copied()
    }

    /// The table as a JavaScript object literal keyed by id, in id order.
    #[must_use]
    pub fn serialized_table(&self) -> String {
        serde_json::to_string(&self.locations).expect("id table serialization cannot fail")
    }
}
