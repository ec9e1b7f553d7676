//! Scope analysis for instrumented regions.
//!
//! A region (program, function body, block, lexical for-header, catch clause,
//! switch body) owns one frame on the scope chain. Before a region's body is
//! walked, two single-level passes over its immediate statements compute the
//! names the region introduces: the hoisted pass (`var` declarators and
//! function declarations) and the lexical pass (`let`/`const`). Both passes
//! stop at nested functions and classes, which introduce regions of their
//! own, and neither descends into block-scoped containers; a nested block
//! runs its own passes when the walk reaches it.
//!
//! Hoisted names always attach to the innermost function/program frame, no
//! matter how deep the declaring region sits; lexical names attach to the
//! frame of the region that declared them. TDZ applies to `Let` and `Const`
//! exactly: their declare hooks are emitted without a value at region entry,
//! and the binding itself is not pre-created.

use ahash::{AHashMap, AHashSet};
use swc_core::{
    common::{Span, Spanned},
    ecma::ast::{Decl, ForHead, Stmt, VarDecl, VarDeclKind, VarDeclOrExpr},
};

use crate::pattern::{PatternError, collect_identifiers};

/// How a name was introduced into its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum VarKind {
    Var,
    Let,
    Const,
    Func,
    Param,
    CatchParam,
    Arguments,
}

impl VarKind {
    /// Kinds whose declare hook is emitted without a value: the binding does
    /// not exist yet at region entry and reading it would be an error in the
    /// original program too.
    #[must_use]
    pub fn has_tdz(self) -> bool {
        matches!(self, Self::Let | Self::Const)
    }

    /// Kinds that attach to the innermost function/program frame instead of
    /// the declaring frame.
    #[must_use]
    pub fn is_hoisted(self) -> bool {
        matches!(self, Self::Var | Self::Func)
    }

    /// The wire string emitted into declare hook calls.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// One name a region introduces, with the span of its declaration site.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub kind: VarKind,
    pub span: Span,
}

impl Declaration {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: VarKind, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            span,
        }
    }
}

#[derive(Debug, Default)]
struct ScopeFrame {
    names: AHashMap<String, VarKind>,
    /// True for program and function frames; hoisted names land on the
    /// nearest frame with this flag.
    function_boundary: bool,
}

/// The chain of frames owned by one transformation run.
///
/// Frames are pushed when the walk enters a region and popped on exit;
/// nothing outlives the walk.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_function(&mut self) {
        self.frames.push(ScopeFrame {
            names: AHashMap::new(),
            function_boundary: true,
        });
    }

    pub fn push_lexical(&mut self) {
        self.frames.push(ScopeFrame::default());
    }

    pub fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty(), "pop on an empty scope chain");
        self.frames.pop();
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Records a name in the chain. Hoisted kinds attach to the innermost
    /// function/program frame, everything else to the current frame.
    pub fn declare(&mut self, name: &str, kind: VarKind) {
        debug_assert!(!self.frames.is_empty(), "declare outside any region");
        let frame = if kind.is_hoisted() {
            self.frames
                .iter_mut()
                .rev()
                .find(|f| f.function_boundary)
                .expect("scope chain has no function frame")
        } else {
            self.frames.last_mut().expect("scope chain is empty")
        };
        frame.names.entry(name.to_owned()).or_insert(kind);
    }

    /// Innermost-first lookup.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<VarKind> {
        self.frames.iter().rev().find_map(|f| f.names.get(name).copied())
    }
}

/// Collects the hoisted names of a region: `var` declarators and function
/// declarations among the immediate statements, plus `var` bindings in
/// `for`/`for-in`/`for-of` heads. Non-block single-statement bodies are
/// followed (`if (c) var x;` still hoists), blocks and nested
/// function/class bodies are not.
pub(crate) fn hoisted_declarations<'a>(stmts: impl IntoIterator<Item = &'a Stmt>) -> Result<Vec<Declaration>, PatternError> {
    let mut out = Vec::new();
    let mut seen = AHashSet::new();
    for stmt in stmts {
        collect_hoisted(stmt, &mut out, &mut seen)?;
    }
    Ok(out)
}

/// Collects the lexical (`let`/`const`) names declared by the immediate
/// statements of a region.
pub(crate) fn lexical_declarations<'a>(stmts: impl IntoIterator<Item = &'a Stmt>) -> Result<Vec<Declaration>, PatternError> {
    let mut out = Vec::new();
    let mut seen = AHashSet::new();
    for stmt in stmts {
        if let Stmt::Decl(Decl::Var(var)) = stmt
            && var.kind != VarDeclKind::Var
        {
            push_var_names(var, &mut out, &mut seen)?;
        }
    }
    Ok(out)
}

fn collect_hoisted(stmt: &Stmt, out: &mut Vec<Declaration>, seen: &mut AHashSet<String>) -> Result<(), PatternError> {
    match stmt {
        Stmt::Decl(Decl::Var(var)) if var.kind == VarDeclKind::Var => push_var_names(var, out, seen)?,
        Stmt::Decl(Decl::Fn(func)) => {
            let name = func.ident.sym.to_string();
            if seen.insert(name.clone()) {
                out.push(Declaration::new(name, VarKind::Func, func.ident.span));
            }
        }
        Stmt::For(stmt) => {
            if let Some(VarDeclOrExpr::VarDecl(var)) = &stmt.init
                && var.kind == VarDeclKind::Var
            {
                push_var_names(var, out, seen)?;
            }
            collect_hoisted_body(&stmt.body, out, seen)?;
        }
        Stmt::ForIn(stmt) => {
            collect_hoisted_head(&stmt.left, out, seen)?;
            collect_hoisted_body(&stmt.body, out, seen)?;
        }
        Stmt::ForOf(stmt) => {
            collect_hoisted_head(&stmt.left, out, seen)?;
            collect_hoisted_body(&stmt.body, out, seen)?;
        }
        Stmt::If(stmt) => {
            collect_hoisted_body(&stmt.cons, out, seen)?;
            if let Some(alt) = &stmt.alt {
                collect_hoisted_body(alt, out, seen)?;
            }
        }
        Stmt::While(stmt) => collect_hoisted_body(&stmt.body, out, seen)?,
        Stmt::DoWhile(stmt) => collect_hoisted_body(&stmt.body, out, seen)?,
        Stmt::Labeled(stmt) => collect_hoisted_body(&stmt.body, out, seen)?,
        _ => {}
    }
    Ok(())
}

/// Follows a loop/branch body only when it is a bare statement; block bodies
/// run their own passes at block entry.
fn collect_hoisted_body(body: &Stmt, out: &mut Vec<Declaration>, seen: &mut AHashSet<String>) -> Result<(), PatternError> {
    if matches!(body, Stmt::Block(_)) {
        return Ok(());
    }
    collect_hoisted(body, out, seen)
}

fn collect_hoisted_head(head: &ForHead, out: &mut Vec<Declaration>, seen: &mut AHashSet<String>) -> Result<(), PatternError> {
    if let ForHead::VarDecl(var) = head
        && var.kind == VarDeclKind::Var
    {
        push_var_names(var, out, seen)?;
    }
    Ok(())
}

fn push_var_names(var: &VarDecl, out: &mut Vec<Declaration>, seen: &mut AHashSet<String>) -> Result<(), PatternError> {
    let kind = match var.kind {
        VarDeclKind::Var => VarKind::Var,
        VarDeclKind::Let => VarKind::Let,
        VarDeclKind::Const => VarKind::Const,
    };
    for declarator in &var.decls {
        for name in collect_identifiers(&declarator.name)? {
            if seen.insert(name.clone()) {
                out.push(Declaration::new(name, kind, declarator.name.span()));
            }
        }
    }
    Ok(())
}
