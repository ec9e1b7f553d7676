use std::{borrow::Cow, fmt};

use smallvec::SmallVec;
use swc_core::{
    common::{Span, Spanned},
    ecma::ast::{ObjectPatProp, Pat},
};

/// Bound names collected from one binding pattern.
pub type BoundNames = SmallVec<[String; 4]>;

/// A pattern shape the walker cannot bind names from.
///
/// Carries the raw parser span; the transformer converts it to source
/// coordinates when it surfaces the failure.
#[derive(Debug, Clone)]
pub struct PatternError {
    pub msg: Cow<'static, str>,
    pub span: Span,
}

impl PatternError {
    fn new(msg: impl Into<Cow<'static, str>>, span: Span) -> Self {
        Self { msg: msg.into(), span }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for PatternError {}

/// Collects the bound identifier names of a binding pattern, in source order.
///
/// - a plain name binds itself;
/// - object patterns recurse into each property value (shorthand binds the
///   key, rest recurses into its argument);
/// - array patterns recurse into each element, holes contribute nothing;
/// - a default (`x = e`) recurses into the left side only; the default
///   expression is an ordinary expression and is walked later, not here.
///
/// Non-binding pattern kinds (member targets, parser error nodes) are
/// rejected: they can only reach this walker through a caller bug or through
/// syntax the transformer should have refused earlier.
pub fn collect_identifiers(pat: &Pat) -> Result<BoundNames, PatternError> {
    let mut names = BoundNames::new();
    walk(pat, &mut names)?;
    Ok(names)
}

fn walk(pat: &Pat, names: &mut BoundNames) -> Result<(), PatternError> {
    match pat {
        Pat::Ident(binding) => names.push(binding.id.sym.to_string()),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                walk(elem, names)?;
            }
        }
        Pat::Rest(rest) => walk(&rest.arg, names)?,
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => walk(&kv.value, names)?,
                    ObjectPatProp::Assign(assign) => names.push(assign.key.sym.to_string()),
                    ObjectPatProp::Rest(rest) => walk(&rest.arg, names)?,
                }
            }
        }
        Pat::Assign(assign) => walk(&assign.left, names)?,
        Pat::Expr(expr) => {
            return Err(PatternError::new("expression in binding pattern position", expr.span()));
        }
        Pat::Invalid(invalid) => {
            return Err(PatternError::new("invalid binding pattern", invalid.span));
        }
    }
    Ok(())
}
