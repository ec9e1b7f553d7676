#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "numeric narrowing is checked")]

mod emit;
mod hooks;
mod location;
mod pattern;
mod registry;
mod run;
mod scope;
mod transform;

pub use crate::{
    hooks::{Hook, NO_INSTRUMENT_MARKER, RUNTIME_GLOBAL},
    location::{CodeLoc, CodeRange},
    pattern::{BoundNames, PatternError, collect_identifiers},
    registry::{IdRegistry, SiteLocation},
    run::{InstrumentError, InstrumentedOutput, TOOL_NAME, instrument_file, instrument_source, output_path_for},
    scope::{Declaration, ScopeStack, VarKind},
    transform::TransformError,
};
