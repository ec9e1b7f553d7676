//! The runtime hook table.
//!
//! Instrumented code reports every observable event by calling a fixed set of
//! short names under one runtime-global object. The short names are a wire
//! contract shared with the analyses that implement the hooks: they must be
//! preserved bit-exactly, or existing analyses stop matching events.
//!
//! Every hook takes the site id as its first argument. Hooks that wrap an
//! expression return the expression's original value, so a wrapped fragment
//! evaluates to exactly what the unwrapped fragment would have.
//!
//! | Hook | Code | Event |
//! |------|------|-------|
//! | [`Hook::ScriptEnter`] / [`Hook::ScriptExit`] | `Se` / `Sx` | script enter/exit |
//! | [`Hook::FunctionEnter`] / [`Hook::FunctionExit`] | `Fe` / `Fx` | function enter/exit |
//! | [`Hook::FunctionWrapper`] / [`Hook::MethodWrapper`] | `F` / `M` | call / method-call wrapper |
//! | [`Hook::Return`] | `Re` | return-value capture |
//! | [`Hook::Throw`] / [`Hook::Uncaught`] | `Th` / `X` | throw / uncaught exception |
//! | [`Hook::Expression`] | `E` | expression result |
//! | [`Hook::Literal`] | `L` | literal value |
//! | [`Hook::Read`] / [`Hook::Write`] / [`Hook::Declare`] | `R` / `W` / `D` | variable read/write/declare |
//! | [`Hook::Binary`] / [`Hook::Unary`] / [`Hook::Update`] | `B` / `U` / `Up` | operators |
//! | [`Hook::Condition`] | `C` | branch condition |
//! | [`Hook::SwitchDiscriminant`] / [`Hook::SwitchCase`] | `Swl` / `Swr` | switch discriminant / case test |
//! | [`Hook::GetField`] / [`Hook::PutField`] / [`Hook::Delete`] | `G` / `P` / `De` | field access |
//! | [`Hook::IterationObject`] | `O` | for-in/for-of object |

/// The global object the emitted code reports to.
///
/// The runtime side of the framework publishes the hook implementations (and
/// receives the id table) on this name before any instrumented script runs.
pub const RUNTIME_GLOBAL: &str = "A$";

/// Marker string disabling instrumentation.
///
/// A source containing this string anywhere is passed through unchanged; the
/// preamble of every produced file carries it so re-instrumentation is a
/// no-op.
pub const NO_INSTRUMENT_MARKER: &str = "ARGUS_NO_INSTRUMENT";

/// Binding name used by the emitted `catch` scaffolds.
///
/// Deliberately inside the runtime-global's `$`-prefixed namespace so it
/// cannot collide with ordinary program identifiers.
pub(crate) const EXC_BINDING: &str = "A$_e";

/// One entry point of the runtime hook table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Hook {
    Literal,
    Expression,
    Binary,
    Unary,
    Update,
    Condition,
    SwitchDiscriminant,
    SwitchCase,
    Declare,
    Read,
    Write,
    Throw,
    Uncaught,
    FunctionWrapper,
    MethodWrapper,
    FunctionEnter,
    FunctionExit,
    Return,
    ScriptEnter,
    ScriptExit,
    GetField,
    PutField,
    Delete,
    IterationObject,
}

impl Hook {
    /// The short wire name of this hook.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Literal => "L",
            Self::Expression => "E",
            Self::Binary => "B",
            Self::Unary => "U",
            Self::Update => "Up",
            Self::Condition => "C",
            Self::SwitchDiscriminant => "Swl",
            Self::SwitchCase => "Swr",
            Self::Declare => "D",
            Self::Read => "R",
            Self::Write => "W",
            Self::Throw => "Th",
            Self::Uncaught => "X",
            Self::FunctionWrapper => "F",
            Self::MethodWrapper => "M",
            Self::FunctionEnter => "Fe",
            Self::FunctionExit => "Fx",
            Self::Return => "Re",
            Self::ScriptEnter => "Se",
            Self::ScriptExit => "Sx",
            Self::GetField => "G",
            Self::PutField => "P",
            Self::Delete => "De",
            Self::IterationObject => "O",
        }
    }

    /// The full call target, e.g. `A$.L`.
    #[must_use]
    pub fn target(self) -> String {
        format!("{RUNTIME_GLOBAL}.{}", self.code())
    }
}

/// Renders one hook call with the site id first.
///
/// Arguments are already-emitted fragments; this only does the joining.
pub(crate) fn hook_call(hook: Hook, id: u32, args: &[&str]) -> String {
    let mut call = format!("{RUNTIME_GLOBAL}.{}({id}", hook.code());
    for arg in args {
        call.push_str(", ");
        call.push_str(arg);
    }
    call.push(')');
    call
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn hook_call_renders_id_first() {
        assert_eq!(hook_call(Hook::Literal, 7, &["42", "3"]), "A$.L(7, 42, 3)");
        assert_eq!(hook_call(Hook::ScriptExit, 0, &[]), "A$.Sx(0)");
    }

    #[test]
    fn wire_codes_are_unique() {
        let codes: Vec<&str> = Hook::iter().map(Hook::code).collect();
        let mut deduped = codes.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len(), "duplicate short name in the hook table");
    }
}
