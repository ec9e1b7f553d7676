//! The instrumenting walk.
//!
//! One handler per supported AST kind. Statement handlers write indented
//! lines into the output buffer; expression handlers return the rewritten
//! fragment as a string. Every handler allocates ids as it visits, so ids are
//! strictly increasing in visit order, and every hook call carries the id of
//! the site it was emitted for.
//!
//! Fragments that are not syntactically atomic (assignments, logical and
//! conditional expressions, sequences) are parenthesized on emission so they
//! compose inside any surrounding fragment without precedence surprises.

use std::{borrow::Cow, fmt};

use swc_core::{
    common::{Span, Spanned},
    ecma::ast::{
        ArrowExpr, AssignExpr, AssignOp, AssignTarget, AssignTargetPat, BinExpr, BinaryOp, BlockStmtOrExpr, CallExpr,
        Callee, CondExpr, Decl, Expr, ExprOrSpread, FnDecl, ForHead, ForStmt, Function, Ident, IfStmt, Lit,
        MemberExpr, MemberProp, NewExpr, ObjectLit, ObjectPatProp, Pat, Prop, PropName, PropOrSpread, Script,
        SimpleAssignTarget, Stmt, SwitchStmt, TryStmt, UnaryExpr, UnaryOp, UpdateExpr, UpdateOp, VarDecl, VarDeclKind,
        VarDeclOrExpr, VarDeclarator,
    },
};

use crate::{
    emit::Writer,
    hooks::{EXC_BINDING, Hook, RUNTIME_GLOBAL, hook_call},
    location::CodeRange,
    pattern::{PatternError, collect_identifiers},
    registry::IdRegistry,
    scope::{Declaration, ScopeStack, VarKind, hoisted_declarations, lexical_declarations},
};

/// A transform-time failure. These abort the whole transformation; there is
/// no partial output.
#[derive(Debug, Clone)]
pub enum TransformError {
    /// The parser rejected the source.
    Syntax {
        msg: Cow<'static, str>,
        position: Option<CodeRange>,
    },
    /// Syntax the instrumenter deliberately does not rewrite. Passing such
    /// code through silently would mean un-observed execution, so it is a
    /// hard error naming the construct.
    NotImplemented {
        construct: Cow<'static, str>,
        position: Option<CodeRange>,
    },
    /// A binding pattern shape the pattern walker cannot bind names from.
    Pattern {
        msg: Cow<'static, str>,
        position: Option<CodeRange>,
    },
}

impl TransformError {
    pub(crate) fn syntax(msg: impl Into<Cow<'static, str>>, position: Option<CodeRange>) -> Self {
        Self::Syntax {
            msg: msg.into(),
            position,
        }
    }

    pub(crate) fn not_implemented(construct: impl Into<Cow<'static, str>>, position: Option<CodeRange>) -> Self {
        Self::NotImplemented {
            construct: construct.into(),
            position,
        }
    }

    /// Source coordinates of the offending construct, when the parser
    /// delivered any.
    #[must_use]
    pub fn position(&self) -> Option<CodeRange> {
        match self {
            Self::Syntax { position, .. } | Self::NotImplemented { position, .. } | Self::Pattern { position, .. } => {
                *position
            }
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = self.position();
        let at = position.map(|p| format!(" at {p}")).unwrap_or_default();
        match self {
            Self::Syntax { msg, .. } => write!(f, "syntax error{at}: {msg}"),
            Self::NotImplemented { construct, .. } => {
                write!(f, "not yet implemented{at}: cannot instrument {construct}")
            }
            Self::Pattern { msg, .. } => write!(f, "unsupported binding pattern{at}: {msg}"),
        }
    }
}

impl std::error::Error for TransformError {}

/// Runs the walk over a parsed script and returns the instrumented body
/// together with the registry holding the id table.
pub(crate) fn transform_script(
    script: &Script,
    registry: IdRegistry,
    orig_path: &str,
    inst_path: &str,
) -> Result<(String, IdRegistry), TransformError> {
    let mut transformer = Transformer {
        registry,
        scopes: ScopeStack::new(),
        out: Writer::new(),
        lhs: false,
        orig_path: orig_path.to_owned(),
        inst_path: inst_path.to_owned(),
    };
    transformer.emit_program(script)?;
    let Transformer { registry, out, .. } = transformer;
    Ok((out.into_string(), registry))
}

/// Per-file walk state: output buffer, id registry, scope chain and the
/// LHS-context flag.
struct Transformer {
    registry: IdRegistry,
    scopes: ScopeStack,
    out: Writer,
    /// True while the walker is writing a binding target; identifiers are
    /// then emitted as their literal name instead of a read hook.
    lhs: bool,
    orig_path: String,
    inst_path: String,
}

impl Transformer {
    fn new_id(&mut self, span: Span) -> u32 {
        self.registry.new_id(span)
    }

    fn range(&self, span: Span) -> Option<CodeRange> {
        self.registry.range(span)
    }

    fn unsupported(&self, construct: &'static str, span: Span) -> TransformError {
        TransformError::not_implemented(construct, self.range(span))
    }

    fn pattern_error(&self, error: PatternError) -> TransformError {
        TransformError::Pattern {
            position: self.range(error.span),
            msg: error.msg,
        }
    }

    /// Runs `f` with the LHS-context flag set, restoring it afterwards. The
    /// flag never needs to span more than the single subtree `f` visits.
    fn with_lhs<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prev = std::mem::replace(&mut self.lhs, true);
        let result = f(self);
        self.lhs = prev;
        result
    }

    fn with_rhs<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prev = std::mem::replace(&mut self.lhs, false);
        let result = f(self);
        self.lhs = prev;
        result
    }

    // === program ===

    fn emit_program(&mut self, script: &Script) -> Result<(), TransformError> {
        let hoisted = hoisted_declarations(&script.body).map_err(|e| self.pattern_error(e))?;
        let lexical = lexical_declarations(&script.body).map_err(|e| self.pattern_error(e))?;
        self.scopes.push_function();

        let body = self.emit_directive_prologue(&script.body);

        let enter_id = self.new_id(script.span);
        let inst = js_string(&self.inst_path);
        let orig = js_string(&self.orig_path);
        self.out.line("try {");
        self.out.indent();
        self.out
            .line(format!("{};", hook_call(Hook::ScriptEnter, enter_id, &[&inst, &orig])));
        self.emit_declarations(&hoisted);
        self.emit_declarations(&lexical);
        for stmt in body {
            self.emit_statement(stmt)?;
        }
        self.out.dedent();
        self.out.line(format!("}} catch ({EXC_BINDING}) {{"));
        self.out.indent();
        let uncaught_id = self.new_id(script.span);
        self.out
            .line(format!("{};", hook_call(Hook::Uncaught, uncaught_id, &[EXC_BINDING])));
        self.out.line(format!("throw {EXC_BINDING};"));
        self.out.dedent();
        self.out.line("} finally {");
        self.out.indent();
        let exit_id = self.new_id(script.span);
        self.out.line(format!("{};", hook_call(Hook::ScriptExit, exit_id, &[])));
        self.out.dedent();
        self.out.line("}");

        self.scopes.pop();
        Ok(())
    }

    /// Re-emits leading string-literal statements verbatim and returns the
    /// rest of the body. Directives have to precede the try scaffold or they
    /// lose their force.
    fn emit_directive_prologue<'a>(&mut self, stmts: &'a [Stmt]) -> &'a [Stmt] {
        let (directives, rest) = split_prologue(stmts);
        for directive in directives {
            self.out.line(directive);
        }
        rest
    }

    /// Declares each name on the scope chain and emits its declare hook.
    /// TDZ kinds are declared without a value: the binding must not exist
    /// before the original declaration runs.
    fn emit_declarations(&mut self, declarations: &[Declaration]) {
        for decl in declarations {
            self.scopes.declare(&decl.name, decl.kind);
            let id = self.new_id(decl.span);
            let name = js_string(&decl.name);
            let kind = js_string(decl.kind.as_str());
            let call = if decl.kind.has_tdz() {
                hook_call(Hook::Declare, id, &[&name, &kind])
            } else {
                hook_call(Hook::Declare, id, &[&name, &kind, &decl.name])
            };
            self.out.line(format!("{call};"));
        }
    }

    /// Emits the body of a region that owns a lexical frame: the region's own
    /// declare hooks (plus `extra` redeclarations handed down by a synthesized
    /// enclosing region, e.g. the per-iteration copies of a lexical for
    /// header), then the statements.
    fn emit_region_body(&mut self, stmts: &[Stmt], extra: &[Declaration]) -> Result<(), TransformError> {
        let hoisted = hoisted_declarations(stmts).map_err(|e| self.pattern_error(e))?;
        let lexical = lexical_declarations(stmts).map_err(|e| self.pattern_error(e))?;
        self.scopes.push_lexical();
        self.emit_declarations(extra);
        self.emit_declarations(&hoisted);
        self.emit_declarations(&lexical);
        for stmt in stmts {
            self.emit_statement(stmt)?;
        }
        self.scopes.pop();
        Ok(())
    }

    /// A loop or branch body: blocks become regions, a bare statement is
    /// emitted inside the braces the caller opened.
    fn emit_body_statement(&mut self, body: &Stmt, extra: &[Declaration]) -> Result<(), TransformError> {
        match body {
            Stmt::Block(block) => self.emit_region_body(&block.stmts, extra),
            other => {
                self.emit_declarations(extra);
                self.emit_statement(other)
            }
        }
    }

    // === statements ===

    fn emit_statement(&mut self, stmt: &Stmt) -> Result<(), TransformError> {
        match stmt {
            Stmt::Block(block) => {
                self.out.line("{");
                self.out.indent();
                self.emit_region_body(&block.stmts, &[])?;
                self.out.dedent();
                self.out.line("}");
                Ok(())
            }
            Stmt::Empty(_) => {
                self.out.line(";");
                Ok(())
            }
            Stmt::Debugger(_) => {
                self.out.line("debugger;");
                Ok(())
            }
            Stmt::Expr(stmt) => {
                let id = self.new_id(stmt.span);
                let expr = self.emit_expression(&stmt.expr)?;
                self.out.line(format!("{};", hook_call(Hook::Expression, id, &[&expr])));
                Ok(())
            }
            Stmt::Decl(Decl::Var(var)) => self.emit_var_decl(var),
            Stmt::Decl(Decl::Fn(decl)) => self.emit_fn_decl(decl),
            Stmt::Decl(Decl::Class(decl)) => Err(self.unsupported("a class declaration", decl.class.span)),
            Stmt::Decl(decl) => Err(self.unsupported("this declaration form", decl.span())),
            Stmt::Return(stmt) => {
                let id = self.new_id(stmt.span);
                let value = match &stmt.arg {
                    Some(arg) => {
                        let expr_id = self.new_id(arg.span());
                        let arg = self.emit_expression(arg)?;
                        hook_call(Hook::Expression, expr_id, &[&arg])
                    }
                    None => "void 0".to_owned(),
                };
                self.out
                    .line(format!("return {};", hook_call(Hook::Return, id, &[&value])));
                Ok(())
            }
            Stmt::Throw(stmt) => {
                let id = self.new_id(stmt.span);
                let expr_id = self.new_id(stmt.arg.span());
                let arg = self.emit_expression(&stmt.arg)?;
                let value = hook_call(Hook::Expression, expr_id, &[&arg]);
                self.out.line(format!("throw {};", hook_call(Hook::Throw, id, &[&value])));
                Ok(())
            }
            Stmt::If(stmt) => self.emit_if(stmt),
            Stmt::While(stmt) => {
                let test = self.emit_condition("while", &stmt.test)?;
                self.out.line(format!("while ({test}) {{"));
                self.out.indent();
                self.emit_body_statement(&stmt.body, &[])?;
                self.out.dedent();
                self.out.line("}");
                Ok(())
            }
            Stmt::DoWhile(stmt) => {
                self.out.line("do {");
                self.out.indent();
                self.emit_body_statement(&stmt.body, &[])?;
                self.out.dedent();
                let test = self.emit_condition("do-while", &stmt.test)?;
                self.out.line(format!("}} while ({test});"));
                Ok(())
            }
            Stmt::For(stmt) => self.emit_for(stmt),
            Stmt::ForIn(stmt) => self.emit_for_in_of(stmt.span, &stmt.left, &stmt.right, &stmt.body, true),
            Stmt::ForOf(stmt) => {
                if stmt.is_await {
                    return Err(self.unsupported("for-await-of", stmt.span));
                }
                self.emit_for_in_of(stmt.span, &stmt.left, &stmt.right, &stmt.body, false)
            }
            Stmt::Switch(stmt) => self.emit_switch(stmt),
            Stmt::Try(stmt) => self.emit_try(stmt),
            Stmt::Labeled(stmt) => {
                self.out.line(format!("{}:", stmt.label.sym));
                self.emit_statement(&stmt.body)
            }
            Stmt::Break(stmt) => {
                match &stmt.label {
                    Some(label) => self.out.line(format!("break {};", label.sym)),
                    None => self.out.line("break;"),
                }
                Ok(())
            }
            Stmt::Continue(stmt) => {
                match &stmt.label {
                    Some(label) => self.out.line(format!("continue {};", label.sym)),
                    None => self.out.line("continue;"),
                }
                Ok(())
            }
            Stmt::With(stmt) => Err(self.unsupported("a with statement", stmt.span)),
        }
    }

    /// `C(id, op, E(id', test))`: the shared wrapper for every branch test.
    fn emit_condition(&mut self, op: &str, test: &Expr) -> Result<String, TransformError> {
        let cond_id = self.new_id(test.span());
        let expr_id = self.new_id(test.span());
        let test = self.emit_expression(test)?;
        let wrapped = hook_call(Hook::Expression, expr_id, &[&test]);
        Ok(hook_call(Hook::Condition, cond_id, &[&js_string(op), &wrapped]))
    }

    fn emit_if(&mut self, stmt: &IfStmt) -> Result<(), TransformError> {
        let test = self.emit_condition("if", &stmt.test)?;
        self.out.line(format!("if ({test}) {{"));
        self.out.indent();
        self.emit_body_statement(&stmt.cons, &[])?;
        self.out.dedent();
        if let Some(alt) = &stmt.alt {
            self.out.line("} else {");
            self.out.indent();
            self.emit_body_statement(alt, &[])?;
            self.out.dedent();
        }
        self.out.line("}");
        Ok(())
    }

    fn emit_var_decl(&mut self, var: &VarDecl) -> Result<(), TransformError> {
        let declarators = self.emit_declarators(var)?;
        self.out.line(format!("{} {};", var_kind_keyword(var.kind), declarators));
        Ok(())
    }

    fn emit_declarators(&mut self, var: &VarDecl) -> Result<String, TransformError> {
        let mut parts = Vec::with_capacity(var.decls.len());
        for declarator in &var.decls {
            parts.push(self.emit_declarator(declarator)?);
        }
        Ok(parts.join(", "))
    }

    /// A declarator without initializer emits the pattern alone; with an
    /// initializer it becomes `pattern = W(id, [names], E(id', init))`, so
    /// evaluating the declaration performs the original binding and reports
    /// the write.
    fn emit_declarator(&mut self, declarator: &VarDeclarator) -> Result<String, TransformError> {
        let pattern = self.with_lhs(|t| t.emit_pattern(&declarator.name))?;
        let Some(init) = &declarator.init else {
            return Ok(pattern);
        };
        let write_id = self.new_id(declarator.span);
        let names = collect_identifiers(&declarator.name).map_err(|e| self.pattern_error(e))?;
        let expr_id = self.new_id(init.span());
        let init = self.emit_expression(init)?;
        let value = hook_call(Hook::Expression, expr_id, &[&init]);
        let write = hook_call(Hook::Write, write_id, &[&js_string_array(names.as_slice()), &value]);
        Ok(format!("{pattern} = {write}"))
    }

    fn emit_fn_decl(&mut self, decl: &FnDecl) -> Result<(), TransformError> {
        let function = self.emit_function(Some(&decl.ident), &decl.function, false)?;
        self.out.line(function);
        Ok(())
    }

    fn emit_for(&mut self, stmt: &ForStmt) -> Result<(), TransformError> {
        // A lexical header gets a synthesized outer block owning the header
        // names, and the loop body redeclares them so every iteration
        // observes a fresh binding.
        let header = match &stmt.init {
            Some(VarDeclOrExpr::VarDecl(var)) if var.kind != VarDeclKind::Var => {
                let mut decls = Vec::new();
                let mut seen = ahash::AHashSet::new();
                let kind = if var.kind == VarDeclKind::Let {
                    VarKind::Let
                } else {
                    VarKind::Const
                };
                for declarator in &var.decls {
                    for name in collect_identifiers(&declarator.name).map_err(|e| self.pattern_error(e))? {
                        if seen.insert(name.clone()) {
                            decls.push(Declaration::new(name, kind, declarator.name.span()));
                        }
                    }
                }
                decls
            }
            _ => Vec::new(),
        };

        if !header.is_empty() {
            self.out.line("{");
            self.out.indent();
            self.scopes.push_lexical();
            self.emit_declarations(&header);
        }

        let init = match &stmt.init {
            None => String::new(),
            Some(VarDeclOrExpr::VarDecl(var)) => {
                format!("{} {}", var_kind_keyword(var.kind), self.emit_declarators(var)?)
            }
            Some(VarDeclOrExpr::Expr(expr)) => self.emit_expression(expr)?,
        };
        let test = match &stmt.test {
            Some(test) => self.emit_condition("for", test)?,
            None => String::new(),
        };
        let update = match &stmt.update {
            Some(update) => self.emit_expression(update)?,
            None => String::new(),
        };
        self.out.line(format!("for ({init}; {test}; {update}) {{"));
        self.out.indent();
        self.emit_body_statement(&stmt.body, &header)?;
        self.out.dedent();
        self.out.line("}");

        if !header.is_empty() {
            self.scopes.pop();
            self.out.dedent();
            self.out.line("}");
        }
        Ok(())
    }

    /// Both enumeration loops share one shape: the header binds the runtime
    /// temporary, and the body assigns the user's binding from it through the
    /// ordinary write machinery, so a write event fires per iteration.
    fn emit_for_in_of(
        &mut self,
        span: Span,
        left: &ForHead,
        right: &Expr,
        body: &Stmt,
        is_for_in: bool,
    ) -> Result<(), TransformError> {
        enum Target<'a> {
            Binding(String, VarDeclKind),
            Plain(String),
            Member(&'a MemberExpr),
        }

        let target = match left {
            ForHead::VarDecl(var) => {
                let [declarator] = var.decls.as_slice() else {
                    return Err(self.unsupported("a multi-declarator loop head", var.span));
                };
                match &declarator.name {
                    Pat::Ident(binding) => Target::Binding(binding.id.sym.to_string(), var.kind),
                    other => return Err(self.unsupported("a destructuring loop head", other.span())),
                }
            }
            ForHead::Pat(pat) => match &**pat {
                Pat::Ident(binding) => Target::Plain(binding.id.sym.to_string()),
                Pat::Expr(expr) => match &**expr {
                    Expr::Member(member) => Target::Member(member),
                    other => return Err(self.unsupported("this loop target", other.span())),
                },
                other => return Err(self.unsupported("a destructuring loop head", other.span())),
            },
            ForHead::UsingDecl(using) => return Err(self.unsupported("a using declaration", using.span)),
        };

        let object_id = self.new_id(right.span());
        let object = self.emit_expression(right)?;
        let keyword = if is_for_in { "in" } else { "of" };
        let wrapped = hook_call(
            Hook::IterationObject,
            object_id,
            &[&object, if is_for_in { "true" } else { "false" }],
        );
        self.out
            .line(format!("for ({RUNTIME_GLOBAL}._t {keyword} {wrapped}) {{"));
        self.out.indent();

        let lexical = matches!(&target, Target::Binding(_, kind) if *kind != VarDeclKind::Var);
        if lexical {
            self.scopes.push_lexical();
        }
        match &target {
            Target::Binding(name, kind) => {
                let var_kind = match kind {
                    VarDeclKind::Var => VarKind::Var,
                    VarDeclKind::Let => VarKind::Let,
                    VarDeclKind::Const => VarKind::Const,
                };
                if var_kind.has_tdz() {
                    self.emit_declarations(&[Declaration::new(name.clone(), var_kind, span)]);
                }
                let write_id = self.new_id(span);
                let write = hook_call(
                    Hook::Write,
                    write_id,
                    &[&js_string_array(&[name.clone()]), &format!("{RUNTIME_GLOBAL}._t")],
                );
                self.out
                    .line(format!("{} {name} = {write};", var_kind_keyword(*kind)));
            }
            Target::Plain(name) => {
                let write_id = self.new_id(span);
                let write = hook_call(
                    Hook::Write,
                    write_id,
                    &[&js_string_array(&[name.clone()]), &format!("{RUNTIME_GLOBAL}._t")],
                );
                self.out.line(format!("{name} = {write};"));
            }
            Target::Member(member) => {
                let put_id = self.new_id(member.span);
                let base = self.emit_expression(&member.obj)?;
                let prop = self.emit_member_prop(&member.prop)?;
                let put = hook_call(Hook::PutField, put_id, &[&base, &prop, &format!("{RUNTIME_GLOBAL}._t")]);
                self.out.line(format!("{put};"));
            }
        }

        self.emit_body_statement(body, &[])?;
        if lexical {
            self.scopes.pop();
        }
        self.out.dedent();
        self.out.line("}");
        Ok(())
    }

    /// `switch (Swl(id, E(id', disc))) { case Swr(id'', E(id''', test)): … }`
    /// The runtime stores the discriminant on `Swl` (a stack, so nested
    /// switches stay sound) and reports the comparison from `Swr`; both hooks
    /// return their value argument, so matching is unchanged.
    fn emit_switch(&mut self, stmt: &SwitchStmt) -> Result<(), TransformError> {
        let hoisted =
            hoisted_declarations(stmt.cases.iter().flat_map(|c| &c.cons)).map_err(|e| self.pattern_error(e))?;
        let lexical =
            lexical_declarations(stmt.cases.iter().flat_map(|c| &c.cons)).map_err(|e| self.pattern_error(e))?;
        let wrap = !(hoisted.is_empty() && lexical.is_empty());

        self.scopes.push_lexical();
        if wrap {
            self.out.line("{");
            self.out.indent();
            self.emit_declarations(&hoisted);
            self.emit_declarations(&lexical);
        }

        let left_id = self.new_id(stmt.discriminant.span());
        let expr_id = self.new_id(stmt.discriminant.span());
        let discriminant = self.emit_expression(&stmt.discriminant)?;
        let wrapped = hook_call(Hook::Expression, expr_id, &[&discriminant]);
        let discriminant = hook_call(Hook::SwitchDiscriminant, left_id, &[&wrapped]);
        self.out.line(format!("switch ({discriminant}) {{"));
        self.out.indent();
        for case in &stmt.cases {
            match &case.test {
                Some(test) => {
                    let case_id = self.new_id(test.span());
                    let test_expr_id = self.new_id(test.span());
                    let test = self.emit_expression(test)?;
                    let wrapped = hook_call(Hook::Expression, test_expr_id, &[&test]);
                    let label = hook_call(Hook::SwitchCase, case_id, &[&wrapped]);
                    self.out.line(format!("case {label}:"));
                }
                None => self.out.line("default:"),
            }
            self.out.indent();
            for inner in &case.cons {
                self.emit_statement(inner)?;
            }
            self.out.dedent();
        }
        self.out.dedent();
        self.out.line("}");

        if wrap {
            self.out.dedent();
            self.out.line("}");
        }
        self.scopes.pop();
        Ok(())
    }

    fn emit_try(&mut self, stmt: &TryStmt) -> Result<(), TransformError> {
        self.out.line("try {");
        self.out.indent();
        self.emit_region_body(&stmt.block.stmts, &[])?;
        self.out.dedent();
        if let Some(handler) = &stmt.handler {
            let param = match &handler.param {
                Some(Pat::Ident(binding)) => Some(binding.id.sym.to_string()),
                Some(other) => return Err(self.unsupported("a destructuring catch parameter", other.span())),
                None => None,
            };
            match &param {
                Some(name) => self.out.line(format!("}} catch ({name}) {{")),
                None => self.out.line("} catch {"),
            }
            self.out.indent();
            self.scopes.push_lexical();
            if let Some(name) = &param {
                let declaration = Declaration::new(name.clone(), VarKind::CatchParam, handler.span);
                self.emit_declarations(std::slice::from_ref(&declaration));
            }
            let hoisted = hoisted_declarations(&handler.body.stmts).map_err(|e| self.pattern_error(e))?;
            let lexical = lexical_declarations(&handler.body.stmts).map_err(|e| self.pattern_error(e))?;
            self.emit_declarations(&hoisted);
            self.emit_declarations(&lexical);
            for inner in &handler.body.stmts {
                self.emit_statement(inner)?;
            }
            self.scopes.pop();
            self.out.dedent();
        }
        if let Some(finalizer) = &stmt.finalizer {
            self.out.line("} finally {");
            self.out.indent();
            self.emit_region_body(&finalizer.stmts, &[])?;
            self.out.dedent();
        }
        self.out.line("}");
        Ok(())
    }

    // === functions ===

    /// Emits a whole function (declaration or expression) as a fragment. The
    /// body is wrapped in the enter/uncaught/exit scaffold, with every name
    /// the function region introduces declared up front.
    fn emit_function(
        &mut self,
        ident: Option<&Ident>,
        function: &Function,
        is_expression: bool,
    ) -> Result<String, TransformError> {
        let Some(body) = &function.body else {
            return Err(self.unsupported("a function without a body", function.span));
        };

        let mut header = String::new();
        if function.is_async {
            header.push_str("async ");
        }
        header.push_str("function");
        if function.is_generator {
            header.push('*');
        }
        if let Some(ident) = ident {
            header.push(' ');
            header.push_str(&ident.sym);
        }

        self.scopes.push_function();
        let mut seeds = vec![Declaration::new("arguments", VarKind::Arguments, function.span)];
        if is_expression && let Some(ident) = ident {
            seeds.push(Declaration::new(ident.sym.to_string(), VarKind::Func, ident.span));
        }
        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            for name in collect_identifiers(&param.pat).map_err(|e| self.pattern_error(e))? {
                seeds.push(Declaration::new(name, VarKind::Param, param.span));
            }
            params.push(self.with_lhs(|t| t.emit_pattern(&param.pat))?);
        }
        header.push_str(&format!("({}) {{", params.join(", ")));
        seeds.extend(hoisted_declarations(&body.stmts).map_err(|e| self.pattern_error(e))?);
        seeds.extend(lexical_declarations(&body.stmts).map_err(|e| self.pattern_error(e))?);

        let callee = ident.map_or_else(|| "null".to_owned(), |i| i.sym.to_string());
        let text = self.emit_function_body(&header, function.span, &callee, "arguments", &seeds, &body.stmts)?;
        self.scopes.pop();
        Ok(text)
    }

    /// Arrow functions are function regions too, but bind no `arguments`
    /// object (and have no name), so function-enter reports `void 0` in the
    /// arguments position.
    fn emit_arrow(&mut self, arrow: &ArrowExpr) -> Result<String, TransformError> {
        let mut header = String::new();
        if arrow.is_async {
            header.push_str("async ");
        }

        self.scopes.push_function();
        let mut seeds = Vec::new();
        let mut params = Vec::with_capacity(arrow.params.len());
        for param in &arrow.params {
            for name in collect_identifiers(param).map_err(|e| self.pattern_error(e))? {
                seeds.push(Declaration::new(name, VarKind::Param, param.span()));
            }
            params.push(self.with_lhs(|t| t.emit_pattern(param))?);
        }
        header.push_str(&format!("({}) => {{", params.join(", ")));

        let text = match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => {
                seeds.extend(hoisted_declarations(&block.stmts).map_err(|e| self.pattern_error(e))?);
                seeds.extend(lexical_declarations(&block.stmts).map_err(|e| self.pattern_error(e))?);
                self.emit_function_body(&header, arrow.span, "null", "void 0", &seeds, &block.stmts)?
            }
            BlockStmtOrExpr::Expr(expr) => {
                // An expression body is reported like `return expr`.
                self.emit_function_body_with(&header, arrow.span, "null", "void 0", &seeds, &[], |t| {
                    let return_id = t.new_id(expr.span());
                    let expr_id = t.new_id(expr.span());
                    let value = t.emit_expression(expr)?;
                    let wrapped = hook_call(Hook::Expression, expr_id, &[&value]);
                    t.out
                        .line(format!("return {};", hook_call(Hook::Return, return_id, &[&wrapped])));
                    Ok(())
                })?
            }
        };
        self.scopes.pop();
        Ok(text)
    }

    fn emit_function_body(
        &mut self,
        header: &str,
        span: Span,
        callee: &str,
        arguments: &str,
        seeds: &[Declaration],
        stmts: &[Stmt],
    ) -> Result<String, TransformError> {
        // Directives must precede the try scaffold here as well, or a
        // function-level "use strict" loses its force.
        let (prologue, body) = split_prologue(stmts);
        self.emit_function_body_with(header, span, callee, arguments, seeds, &prologue, |t| {
            for stmt in body {
                t.emit_statement(stmt)?;
            }
            Ok(())
        })
    }

    fn emit_function_body_with(
        &mut self,
        header: &str,
        span: Span,
        callee: &str,
        arguments: &str,
        seeds: &[Declaration],
        prologue: &[String],
        emit_stmts: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<String, TransformError> {
        let child = self.out.child();
        let outer = std::mem::replace(&mut self.out, child);

        self.out.line(header);
        self.out.indent();
        for directive in prologue {
            self.out.line(directive);
        }
        let result = self.emit_scaffold(span, callee, arguments, seeds, emit_stmts);
        self.out.dedent();
        self.out.line("}");

        let child = std::mem::replace(&mut self.out, outer);
        result?;
        Ok(child.into_embedded())
    }

    fn emit_scaffold(
        &mut self,
        span: Span,
        callee: &str,
        arguments: &str,
        seeds: &[Declaration],
        emit_stmts: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        let enter_id = self.new_id(span);
        self.out.line("try {");
        self.out.indent();
        self.out.line(format!(
            "{};",
            hook_call(Hook::FunctionEnter, enter_id, &[callee, "this", arguments])
        ));
        self.emit_declarations(seeds);
        emit_stmts(self)?;
        self.out.dedent();
        self.out.line(format!("}} catch ({EXC_BINDING}) {{"));
        self.out.indent();
        let uncaught_id = self.new_id(span);
        self.out
            .line(format!("{};", hook_call(Hook::Uncaught, uncaught_id, &[EXC_BINDING])));
        self.out.line(format!("throw {EXC_BINDING};"));
        self.out.dedent();
        self.out.line("} finally {");
        self.out.indent();
        let exit_id = self.new_id(span);
        self.out.line(format!("{};", hook_call(Hook::FunctionExit, exit_id, &[])));
        self.out.dedent();
        self.out.line("}");
        Ok(())
    }

    // === expressions ===

    fn emit_expression(&mut self, expr: &Expr) -> Result<String, TransformError> {
        match expr {
            Expr::This(_) => Ok("this".to_owned()),
            Expr::Ident(ident) => Ok(self.emit_ident(ident)),
            Expr::Lit(lit) => self.emit_literal(lit),
            Expr::Paren(paren) => {
                let inner = self.emit_expression(&paren.expr)?;
                Ok(format!("({inner})"))
            }
            Expr::Seq(seq) => {
                let mut parts = Vec::with_capacity(seq.exprs.len());
                for expr in &seq.exprs {
                    parts.push(self.emit_expression(expr)?);
                }
                Ok(format!("({})", parts.join(", ")))
            }
            Expr::Array(array) => {
                let mut parts = Vec::with_capacity(array.elems.len());
                for elem in &array.elems {
                    match elem {
                        None => parts.push(String::new()),
                        Some(ExprOrSpread { spread: Some(span), .. }) => {
                            return Err(self.unsupported("a spread element", *span));
                        }
                        Some(ExprOrSpread { expr, .. }) => parts.push(self.emit_expression(expr)?),
                    }
                }
                Ok(format!("[{}]", parts.join(", ")))
            }
            Expr::Object(object) => self.emit_object(object),
            Expr::Fn(expr) => {
                // The function value itself is reported as a literal.
                let literal_id = self.new_id(expr.function.span);
                let function = self.emit_function(expr.ident.as_ref(), &expr.function, true)?;
                Ok(hook_call(Hook::Literal, literal_id, &[&function]))
            }
            Expr::Arrow(arrow) => {
                let literal_id = self.new_id(arrow.span);
                let arrow = self.emit_arrow(arrow)?;
                Ok(hook_call(Hook::Literal, literal_id, &[&arrow]))
            }
            Expr::Unary(unary) => self.emit_unary(unary),
            Expr::Update(update) => self.emit_update(update),
            Expr::Bin(bin) => self.emit_binary(bin),
            Expr::Assign(assign) => self.emit_assign(assign),
            Expr::Cond(cond) => self.emit_conditional(cond),
            Expr::Call(call) => self.emit_call(call),
            Expr::New(new) => self.emit_new(new),
            Expr::Member(member) => self.emit_member_read(member),
            Expr::Tpl(tpl) => Err(self.unsupported("a template literal", tpl.span)),
            Expr::TaggedTpl(tpl) => Err(self.unsupported("a tagged template", tpl.span)),
            Expr::Class(class) => Err(self.unsupported("a class expression", class.class.span)),
            Expr::Yield(expr) => Err(self.unsupported("a yield expression", expr.span)),
            Expr::Await(expr) => Err(self.unsupported("an await expression", expr.span)),
            Expr::MetaProp(expr) => Err(self.unsupported("a meta-property", expr.span)),
            Expr::OptChain(expr) => Err(self.unsupported("optional chaining", expr.span)),
            Expr::SuperProp(expr) => Err(self.unsupported("a super property access", expr.span)),
            Expr::PrivateName(expr) => Err(self.unsupported("a private identifier", expr.span)),
            other => Err(self.unsupported("this expression kind", other.span())),
        }
    }

    /// In LHS context an identifier denotes the binding target and stays
    /// bare; everywhere else it becomes a read hook receiving the current
    /// value.
    fn emit_ident(&mut self, ident: &Ident) -> String {
        if self.lhs {
            return ident.sym.to_string();
        }
        let id = self.new_id(ident.span);
        hook_call(Hook::Read, id, &[&js_string(&ident.sym), &ident.sym])
    }

    fn emit_literal(&mut self, lit: &Lit) -> Result<String, TransformError> {
        let id = self.new_id(lit.span());
        let (text, type_code) = match lit {
            Lit::Str(lit) => {
                let text = lit
                    .raw
                    .as_ref()
                    .map_or_else(|| js_string(&lit.value), ToString::to_string);
                (text, LITERAL_STRING)
            }
            Lit::Bool(lit) => (lit.value.to_string(), LITERAL_BOOLEAN),
            Lit::Null(_) => ("null".to_owned(), LITERAL_NULL),
            Lit::Num(lit) => {
                let text = lit.raw.as_ref().map_or_else(|| lit.value.to_string(), ToString::to_string);
                (text, LITERAL_NUMBER)
            }
            Lit::Regex(lit) => (format!("/{}/{}", lit.exp, lit.flags), LITERAL_REGEXP),
            Lit::BigInt(lit) => {
                let text = lit
                    .raw
                    .as_ref()
                    .map_or_else(|| format!("{}n", lit.value), ToString::to_string);
                (text, LITERAL_BIGINT)
            }
            other => return Err(self.unsupported("this literal kind", other.span())),
        };
        Ok(hook_call(Hook::Literal, id, &[&text, &type_code.to_string()]))
    }

    fn emit_unary(&mut self, unary: &UnaryExpr) -> Result<String, TransformError> {
        if unary.op == UnaryOp::Delete {
            return match peel_parens(&unary.arg) {
                Expr::Member(member) => {
                    let id = self.new_id(unary.span);
                    let base = self.emit_expression(&member.obj)?;
                    let prop = self.emit_member_prop(&member.prop)?;
                    Ok(hook_call(Hook::Delete, id, &[&base, &prop]))
                }
                other => Err(self.unsupported("delete of a non-member expression", other.span())),
            };
        }
        let id = self.new_id(unary.span);
        let arg = self.emit_expression(&unary.arg)?;
        Ok(hook_call(Hook::Unary, id, &[&js_string(unary_op_str(unary.op)), &arg]))
    }

    /// `Up(id, binId, op, prefix, arg, writer)`: the runtime derives the old
    /// value, reports a synthesized binary op under `binId`, and stores the
    /// new value through the writer closure, which performs the original
    /// target update and reports the write or put-field.
    fn emit_update(&mut self, update: &UpdateExpr) -> Result<String, TransformError> {
        let id = self.new_id(update.span);
        let bin_id = self.new_id(update.span);
        let op = match update.op {
            UpdateOp::PlusPlus => "++",
            UpdateOp::MinusMinus => "--",
        };
        let prefix = if update.prefix { "true" } else { "false" };
        match peel_parens(&update.arg) {
            Expr::Ident(ident) => {
                let read_id = self.new_id(ident.span);
                let arg = hook_call(Hook::Read, read_id, &[&js_string(&ident.sym), &ident.sym]);
                let write_id = self.new_id(ident.span);
                let write = hook_call(
                    Hook::Write,
                    write_id,
                    &[&js_string_array(&[ident.sym.to_string()]), "v"],
                );
                let writer = format!("function (v) {{ return {} = {}; }}", ident.sym, write);
                Ok(hook_call(
                    Hook::Update,
                    id,
                    &[&bin_id.to_string(), &js_string(op), prefix, &arg, &writer],
                ))
            }
            Expr::Member(member) => {
                let get_id = self.new_id(member.span);
                let base = self.emit_expression(&member.obj)?;
                let prop = self.emit_member_prop(&member.prop)?;
                let arg = hook_call(Hook::GetField, get_id, &[&base, &prop]);
                // The writer re-walks the base under fresh ids; the base
                // expression is evaluated once more when the new value is
                // stored.
                let put_id = self.new_id(member.span);
                let base_again = self.emit_expression(&member.obj)?;
                let prop_again = self.emit_member_prop(&member.prop)?;
                let put = hook_call(Hook::PutField, put_id, &[&base_again, &prop_again, "v"]);
                let writer = format!("function (v) {{ return {put}; }}");
                Ok(hook_call(
                    Hook::Update,
                    id,
                    &[&bin_id.to_string(), &js_string(op), prefix, &arg, &writer],
                ))
            }
            other => Err(self.unsupported("this update target", other.span())),
        }
    }

    fn emit_binary(&mut self, bin: &BinExpr) -> Result<String, TransformError> {
        if let Some(op) = logical_op_str(bin.op) {
            // Short-circuiting stays with the host: only the left operand is
            // wrapped, and the condition hook returns its value unchanged.
            let id = self.new_id(bin.span);
            let left = self.emit_expression(&bin.left)?;
            let right = self.emit_expression(&bin.right)?;
            let condition = hook_call(Hook::Condition, id, &[&js_string(op), &left]);
            return Ok(format!("({condition} {op} {right})"));
        }
        let id = self.new_id(bin.span);
        let op = binary_op_str(bin.op).ok_or_else(|| self.unsupported("this binary operator", bin.span))?;
        let left = self.emit_expression(&bin.left)?;
        let right = self.emit_expression(&bin.right)?;
        Ok(hook_call(Hook::Binary, id, &[&js_string(op), &left, &right]))
    }

    fn emit_conditional(&mut self, cond: &CondExpr) -> Result<String, TransformError> {
        let id = self.new_id(cond.test.span());
        let test = self.emit_expression(&cond.test)?;
        let wrapped = hook_call(Hook::Condition, id, &[&js_string("?"), &test]);
        let cons = self.emit_expression(&cond.cons)?;
        let alt = self.emit_expression(&cond.alt)?;
        Ok(format!("({wrapped} ? {cons} : {alt})"))
    }

    /// Plain assignment to a name becomes `name = W(id, [name], E(id', rhs))`
    /// (the emitted fragment performs the binding, the hook reports it).
    /// Member targets go through the put-field hook, which receives base and
    /// property and performs the store itself. Compound operators expand to
    /// the read (or get-field), the binary hook, and the same write
    /// machinery, all under fresh ids.
    fn emit_assign(&mut self, assign: &AssignExpr) -> Result<String, TransformError> {
        let compound = match assign.op {
            AssignOp::Assign => None,
            AssignOp::AndAssign | AssignOp::OrAssign | AssignOp::NullishAssign => {
                return Err(self.unsupported("a logical assignment operator", assign.span));
            }
            op => Some(
                compound_op_str(op).ok_or_else(|| self.unsupported("this compound assignment operator", assign.span))?,
            ),
        };

        match &assign.left {
            AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => {
                let name = binding.id.sym.to_string();
                let write_id = self.new_id(assign.span);
                let rhs = self.emit_assign_rhs(assign, compound, |t| {
                    let read_id = t.new_id(binding.id.span);
                    Ok(hook_call(Hook::Read, read_id, &[&js_string(&name), &name]))
                })?;
                let write = hook_call(Hook::Write, write_id, &[&js_string_array(&[name.clone()]), &rhs]);
                Ok(format!("({name} = {write})"))
            }
            AssignTarget::Simple(SimpleAssignTarget::Member(member)) => {
                let put_id = self.new_id(assign.span);
                let base = self.emit_expression(&member.obj)?;
                let prop = self.emit_member_prop(&member.prop)?;
                let rhs = self.emit_assign_rhs(assign, compound, |t| {
                    // The compound read re-walks the member under fresh ids.
                    let get_id = t.new_id(member.span);
                    let base = t.emit_expression(&member.obj)?;
                    let prop = t.emit_member_prop(&member.prop)?;
                    Ok(hook_call(Hook::GetField, get_id, &[&base, &prop]))
                })?;
                Ok(hook_call(Hook::PutField, put_id, &[&base, &prop, &rhs]))
            }
            AssignTarget::Simple(other) => Err(self.unsupported("this assignment target", other.span())),
            AssignTarget::Pat(pat) => match pat {
                AssignTargetPat::Array(p) => Err(self.unsupported("a destructuring assignment", p.span)),
                AssignTargetPat::Object(p) => Err(self.unsupported("a destructuring assignment", p.span)),
                AssignTargetPat::Invalid(p) => Err(self.unsupported("an invalid assignment target", p.span)),
            },
        }
    }

    /// The rewritten right-hand side of an assignment: `E(id, rhs)` for plain
    /// `=`, `E(id, B(id', op, read(), rhs))` for a compound operator.
    fn emit_assign_rhs(
        &mut self,
        assign: &AssignExpr,
        compound: Option<&'static str>,
        read_target: impl FnOnce(&mut Self) -> Result<String, TransformError>,
    ) -> Result<String, TransformError> {
        let expr_id = self.new_id(assign.right.span());
        let value = match compound {
            None => self.emit_expression(&assign.right)?,
            Some(op) => {
                let bin_id = self.new_id(assign.span);
                let current = read_target(self)?;
                let right = self.emit_expression(&assign.right)?;
                hook_call(Hook::Binary, bin_id, &[&js_string(op), &current, &right])
            }
        };
        Ok(hook_call(Hook::Expression, expr_id, &[&value]))
    }

    /// Calls go through a wrapper so the runtime can bracket the invocation:
    /// `F(id, callee, isCtor)(args…)` for plain calls, `M(id, base, prop,
    /// isCtor)(args…)` for method calls, which keeps the base's identity for
    /// the `this` binding. A bare identifier callee is passed unwrapped; the
    /// wrapper itself reports the callee value.
    fn emit_call(&mut self, call: &CallExpr) -> Result<String, TransformError> {
        let callee = match &call.callee {
            Callee::Expr(expr) => expr,
            Callee::Super(span) => return Err(self.unsupported("a super call", span.span())),
            Callee::Import(import) => return Err(self.unsupported("a dynamic import", import.span)),
        };
        let id = self.new_id(call.span);
        let wrapper = match peel_parens(callee) {
            Expr::Member(member) => {
                let base = self.emit_expression(&member.obj)?;
                let prop = self.emit_member_prop(&member.prop)?;
                hook_call(Hook::MethodWrapper, id, &[&base, &prop, "false"])
            }
            Expr::Ident(ident) => hook_call(Hook::FunctionWrapper, id, &[&ident.sym, "false"]),
            other => {
                let callee = self.emit_expression(other)?;
                hook_call(Hook::FunctionWrapper, id, &[&callee, "false"])
            }
        };
        let args = self.emit_args(&call.args)?;
        Ok(format!("{wrapper}({args})"))
    }

    fn emit_new(&mut self, new: &NewExpr) -> Result<String, TransformError> {
        let id = self.new_id(new.span);
        let wrapper = match peel_parens(&new.callee) {
            Expr::Member(member) => {
                let base = self.emit_expression(&member.obj)?;
                let prop = self.emit_member_prop(&member.prop)?;
                hook_call(Hook::MethodWrapper, id, &[&base, &prop, "true"])
            }
            Expr::Ident(ident) => hook_call(Hook::FunctionWrapper, id, &[&ident.sym, "true"]),
            other => {
                let callee = self.emit_expression(other)?;
                hook_call(Hook::FunctionWrapper, id, &[&callee, "true"])
            }
        };
        let args = match &new.args {
            Some(args) => self.emit_args(args)?,
            None => String::new(),
        };
        Ok(format!("{wrapper}({args})"))
    }

    fn emit_args(&mut self, args: &[ExprOrSpread]) -> Result<String, TransformError> {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            if let Some(span) = arg.spread {
                return Err(self.unsupported("a spread argument", span));
            }
            parts.push(self.emit_expression(&arg.expr)?);
        }
        Ok(parts.join(", "))
    }

    fn emit_member_read(&mut self, member: &MemberExpr) -> Result<String, TransformError> {
        let id = self.new_id(member.span);
        let base = self.emit_expression(&member.obj)?;
        let prop = self.emit_member_prop(&member.prop)?;
        Ok(hook_call(Hook::GetField, id, &[&base, &prop]))
    }

    /// A non-computed property becomes a string literal; a computed one is an
    /// ordinary walked expression.
    fn emit_member_prop(&mut self, prop: &MemberProp) -> Result<String, TransformError> {
        match prop {
            MemberProp::Ident(ident) => Ok(js_string(&ident.sym)),
            MemberProp::Computed(computed) => self.emit_expression(&computed.expr),
            MemberProp::PrivateName(name) => Err(self.unsupported("a private identifier", name.span())),
        }
    }

    fn emit_object(&mut self, object: &ObjectLit) -> Result<String, TransformError> {
        let mut parts = Vec::with_capacity(object.props.len());
        for prop in &object.props {
            match prop {
                PropOrSpread::Spread(spread) => {
                    return Err(self.unsupported("a spread property", spread.expr.span()));
                }
                PropOrSpread::Prop(prop) => match &**prop {
                    Prop::Shorthand(ident) => {
                        let value = self.emit_ident(ident);
                        parts.push(format!("{}: {}", ident.sym, value));
                    }
                    Prop::KeyValue(kv) => {
                        let key = self.emit_prop_name(&kv.key)?;
                        let value = self.emit_expression(&kv.value)?;
                        parts.push(format!("{key}: {value}"));
                    }
                    Prop::Getter(getter) => return Err(self.unsupported("an object getter", getter.span)),
                    Prop::Setter(setter) => return Err(self.unsupported("an object setter", setter.span)),
                    Prop::Method(method) => return Err(self.unsupported("an object method", method.function.span)),
                    Prop::Assign(assign) => return Err(self.unsupported("an invalid object property", assign.key.span)),
                },
            }
        }
        Ok(format!("{{ {} }}", parts.join(", ")))
    }

    fn emit_prop_name(&mut self, name: &PropName) -> Result<String, TransformError> {
        match name {
            PropName::Ident(ident) => Ok(ident.sym.to_string()),
            PropName::Str(text) => Ok(text
                .raw
                .as_ref()
                .map_or_else(|| js_string(&text.value), ToString::to_string)),
            PropName::Num(num) => Ok(num.raw.as_ref().map_or_else(|| num.value.to_string(), ToString::to_string)),
            PropName::BigInt(int) => Ok(int
                .raw
                .as_ref()
                .map_or_else(|| format!("{}n", int.value), ToString::to_string)),
            PropName::Computed(computed) => {
                let key = self.emit_expression(&computed.expr)?;
                Ok(format!("[{key}]"))
            }
        }
    }

    // === patterns (LHS context) ===

    /// Re-emits a binding pattern. Names stay bare (they denote targets);
    /// default values are ordinary expressions and are walked with hooks.
    fn emit_pattern(&mut self, pat: &Pat) -> Result<String, TransformError> {
        match pat {
            Pat::Ident(binding) => Ok(self.emit_ident(&binding.id)),
            Pat::Array(array) => {
                let mut parts = Vec::with_capacity(array.elems.len());
                for elem in &array.elems {
                    match elem {
                        None => parts.push(String::new()),
                        Some(pat) => parts.push(self.emit_pattern(pat)?),
                    }
                }
                Ok(format!("[{}]", parts.join(", ")))
            }
            Pat::Rest(rest) => {
                let arg = self.emit_pattern(&rest.arg)?;
                Ok(format!("...{arg}"))
            }
            Pat::Object(object) => {
                let mut parts = Vec::with_capacity(object.props.len());
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            let key = self.emit_prop_name(&kv.key)?;
                            let value = self.emit_pattern(&kv.value)?;
                            parts.push(format!("{key}: {value}"));
                        }
                        ObjectPatProp::Assign(assign) => {
                            let mut part = assign.key.sym.to_string();
                            if let Some(default) = &assign.value {
                                let default = self.with_rhs(|t| t.emit_expression(default))?;
                                part.push_str(&format!(" = {default}"));
                            }
                            parts.push(part);
                        }
                        ObjectPatProp::Rest(rest) => {
                            let arg = self.emit_pattern(&rest.arg)?;
                            parts.push(format!("...{arg}"));
                        }
                    }
                }
                Ok(format!("{{ {} }}", parts.join(", ")))
            }
            Pat::Assign(assign) => {
                let left = self.emit_pattern(&assign.left)?;
                let default = self.with_rhs(|t| t.emit_expression(&assign.right))?;
                Ok(format!("{left} = {default}"))
            }
            Pat::Expr(expr) => Err(self.unsupported("an expression in binding position", expr.span())),
            Pat::Invalid(invalid) => Err(TransformError::syntax("invalid pattern", self.range(invalid.span))),
        }
    }
}

// === literal type codes ===

const LITERAL_STRING: u8 = 0;
const LITERAL_BOOLEAN: u8 = 1;
const LITERAL_NULL: u8 = 2;
const LITERAL_NUMBER: u8 = 3;
const LITERAL_REGEXP: u8 = 4;
const LITERAL_BIGINT: u8 = 5;

// === helpers ===

/// Splits the directive prologue (leading string-literal statements) off a
/// body, each rendered as its source line.
fn split_prologue(stmts: &[Stmt]) -> (Vec<String>, &[Stmt]) {
    let mut directives = Vec::new();
    let mut rest = stmts;
    while let [Stmt::Expr(stmt), tail @ ..] = rest {
        let Expr::Lit(Lit::Str(text)) = &*stmt.expr else { break };
        let directive = text
            .raw
            .as_ref()
            .map_or_else(|| js_string(&text.value), ToString::to_string);
        directives.push(format!("{directive};"));
        rest = tail;
    }
    (directives, rest)
}

/// Escapes a Rust string into a JavaScript string literal. JSON string
/// syntax is a subset of JavaScript's, so the JSON encoder does the work.
fn js_string(text: &str) -> String {
    serde_json::to_string(text).expect("string escaping cannot fail")
}

fn js_string_array(names: &[String]) -> String {
    serde_json::to_string(names).expect("string array escaping cannot fail")
}

fn var_kind_keyword(kind: VarDeclKind) -> &'static str {
    match kind {
        VarDeclKind::Var => "var",
        VarDeclKind::Let => "let",
        VarDeclKind::Const => "const",
    }
}

fn peel_parens(expr: &Expr) -> &Expr {
    let mut expr = expr;
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

fn logical_op_str(op: BinaryOp) -> Option<&'static str> {
    match op {
        BinaryOp::LogicalAnd => Some("&&"),
        BinaryOp::LogicalOr => Some("||"),
        BinaryOp::NullishCoalescing => Some("??"),
        _ => None,
    }
}

fn binary_op_str(op: BinaryOp) -> Option<&'static str> {
    match op {
        BinaryOp::EqEq => Some("=="),
        BinaryOp::NotEq => Some("!="),
        BinaryOp::EqEqEq => Some("==="),
        BinaryOp::NotEqEq => Some("!=="),
        BinaryOp::Lt => Some("<"),
        BinaryOp::LtEq => Some("<="),
        BinaryOp::Gt => Some(">"),
        BinaryOp::GtEq => Some(">="),
        BinaryOp::LShift => Some("<<"),
        BinaryOp::RShift => Some(">>"),
        BinaryOp::ZeroFillRShift => Some(">>>"),
        BinaryOp::Add => Some("+"),
        BinaryOp::Sub => Some("-"),
        BinaryOp::Mul => Some("*"),
        BinaryOp::Div => Some("/"),
        BinaryOp::Mod => Some("%"),
        BinaryOp::BitOr => Some("|"),
        BinaryOp::BitXor => Some("^"),
        BinaryOp::BitAnd => Some("&"),
        BinaryOp::In => Some("in"),
        BinaryOp::InstanceOf => Some("instanceof"),
        BinaryOp::Exp => Some("**"),
        _ => None,
    }
}

fn unary_op_str(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Minus => "-",
        UnaryOp::Plus => "+",
        UnaryOp::Bang => "!",
        UnaryOp::Tilde => "~",
        UnaryOp::TypeOf => "typeof",
        UnaryOp::Void => "void",
        UnaryOp::Delete => "delete",
    }
}

fn compound_op_str(op: AssignOp) -> Option<&'static str> {
    match op {
        AssignOp::AddAssign => Some("+"),
        AssignOp::SubAssign => Some("-"),
        AssignOp::MulAssign => Some("*"),
        AssignOp::DivAssign => Some("/"),
        AssignOp::ModAssign => Some("%"),
        AssignOp::LShiftAssign => Some("<<"),
        AssignOp::RShiftAssign => Some(">>"),
        AssignOp::ZeroFillRShiftAssign => Some(">>>"),
        AssignOp::BitOrAssign => Some("|"),
        AssignOp::BitXorAssign => Some("^"),
        AssignOp::BitAndAssign => Some("&"),
        AssignOp::ExpAssign => Some("**"),
        _ => None,
    }
}
