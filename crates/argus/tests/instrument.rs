use argus::{InstrumentedOutput, instrument_source};
use pretty_assertions::assert_eq;

fn instrument(source: &str) -> InstrumentedOutput {
    instrument_source(source, "test.js", "test__argus__.js").expect("transformation should succeed")
}

/// Position of a needle in the emitted text, with a readable failure.
fn offset_of(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("expected {needle:?} in emitted code:\n{code}"))
}

#[test]
fn preamble_carries_marker_table_and_stamp() {
    let out = instrument("var x = 1;");
    assert!(out.code.starts_with("// ARGUS_NO_INSTRUMENT\nA$.ids = {\"0\":[1,1,"));
    assert!(out.code.contains("// INSTRUMENTED BY argus\n"));
}

#[test]
fn script_scaffold_brackets_the_body() {
    let out = instrument("var x = 1;");
    let enter = offset_of(&out.code, "A$.Se(0, \"test__argus__.js\", \"test.js\");");
    let body = offset_of(&out.code, "var x = ");
    let uncaught = offset_of(&out.code, "A$.X(");
    let rethrow = offset_of(&out.code, "throw A$_e;");
    let exit = offset_of(&out.code, "A$.Sx(");
    assert!(enter < body && body < uncaught && uncaught < rethrow && rethrow < exit);
    assert!(out.code.contains("} catch (A$_e) {"));
    assert!(out.code.contains("} finally {"));
}

#[test]
fn var_initializer_reports_literals_binary_and_write() {
    let out = instrument("var x = 1 + 2;");
    assert_eq!(
        out.code.lines().nth(6).expect("body line"),
        "  var x = A$.W(2, [\"x\"], A$.E(3, A$.B(4, \"+\", A$.L(5, 1, 3), A$.L(6, 2, 3))));"
    );
    let declare = offset_of(&out.code, "A$.D(1, \"x\", \"var\", x);");
    let write = offset_of(&out.code, "A$.W(2");
    assert!(declare < write, "declare hook must precede the statement using the name");
}

#[test]
fn literal_type_codes_follow_the_wire_contract() {
    let out = instrument("var s = \"a\", b = true, n = null, f = 1.5, r = /ab/g, big = 10n;");
    assert!(out.code.contains("A$.L(") && out.code.contains("\"a\", 0)"));
    assert!(out.code.contains("true, 1)"));
    assert!(out.code.contains("null, 2)"));
    assert!(out.code.contains("1.5, 3)"));
    assert!(out.code.contains("/ab/g, 4)"));
    assert!(out.code.contains("10n, 5)"));
}

#[test]
fn if_test_is_wrapped_in_condition_and_expression_hooks() {
    let out = instrument("if (a > 0) { let y = a; }");
    assert!(out.code.contains("if (A$.C(1, \"if\", A$.E(2, A$.B(3, \">\", A$.R(4, \"a\", a), A$.L(5, 0, 3))))) {"));
    let declare = offset_of(&out.code, "A$.D(6, \"y\", \"let\");");
    let read = offset_of(&out.code, "A$.R(9, \"a\", a)");
    assert!(declare < read, "block-entry declare must precede any read in the block");
}

#[test]
fn function_declaration_gets_the_enter_exit_scaffold() {
    let out = instrument("function f(n) { return n * 2; } f(3);");
    assert!(out.code.contains("A$.D(1, \"f\", \"func\", f);"));
    assert!(out.code.contains("function f(n) {"));
    assert!(out.code.contains("A$.Fe(2, f, this, arguments);"));
    assert!(out.code.contains("A$.D(3, \"arguments\", \"arguments\", arguments);"));
    assert!(out.code.contains("A$.D(4, \"n\", \"param\", n);"));
    assert!(out.code.contains("return A$.Re(5, A$.E(6, A$.B(7, \"*\", A$.R(8, \"n\", n), A$.L(9, 2, 3))));"));
    assert!(out.code.contains("A$.Fx(11);"));
    assert!(out.code.contains("A$.E(12, A$.F(13, f, false)(A$.L(14, 3, 3)));"));
    let enter = offset_of(&out.code, "A$.Fe(");
    let exit = offset_of(&out.code, "A$.Fx(");
    assert!(enter < exit);
}

#[test]
fn method_calls_capture_the_base_object() {
    let out = instrument("o.m(1);");
    assert!(out.code.contains("A$.M(2, A$.R(3, \"o\", o), \"m\", false)(A$.L(4, 1, 3))"));
}

#[test]
fn constructor_calls_set_the_constructor_flag() {
    let out = instrument("new C(1);");
    assert!(out.code.contains("A$.F(2, C, true)(A$.L(3, 1, 3))"));
}

#[test]
fn member_reads_and_writes_use_field_hooks() {
    let out = instrument("a.b.c = q.r;");
    assert!(out.code.contains("A$.P(2, A$.G(3, A$.R(4, \"a\", a), \"b\"), \"c\", A$.E(5, A$.G(6, A$.R(7, \"q\", q), \"r\")))"));
}

#[test]
fn computed_members_walk_the_key_expression() {
    let out = instrument("o[k];");
    assert!(out.code.contains("A$.G(2, A$.R(3, \"o\", o), A$.R(4, \"k\", k))"));
}

#[test]
fn delete_of_a_member_uses_the_delete_hook() {
    let out = instrument("delete o.p;");
    assert!(out.code.contains("A$.De(2, A$.R(3, \"o\", o), \"p\")"));
}

#[test]
fn typeof_and_void_go_through_the_unary_hook() {
    let out = instrument("typeof x; void 0;");
    assert!(out.code.contains("A$.U(2, \"typeof\", A$.R(3, \"x\", x))"));
    assert!(out.code.contains("A$.U(5, \"void\", A$.L(6, 0, 3))"));
}

#[test]
fn update_expression_passes_a_writer_closure() {
    let out = instrument("x++;");
    assert!(out.code.contains("A$.Up(2, 3, \"++\", false, A$.R(4, \"x\", x), function (v) { return x = A$.W(5, [\"x\"], v); })"));
}

#[test]
fn prefix_update_sets_the_prefix_flag() {
    let out = instrument("--y;");
    assert!(out.code.contains("A$.Up(2, 3, \"--\", true, A$.R(4, \"y\", y), function (v) { return y = A$.W(5, [\"y\"], v); })"));
}

#[test]
fn member_update_writes_through_the_put_field_hook() {
    let out = instrument("o.p++;");
    assert!(out.code.contains(
        "A$.Up(2, 3, \"++\", false, A$.G(4, A$.R(5, \"o\", o), \"p\"), function (v) { return A$.P(6, A$.R(7, \"o\", o), \"p\", v); })"
    ));
}

#[test]
fn assignment_performs_the_binding_and_reports_the_write() {
    let out = instrument("x = 1;");
    assert!(out.code.contains("A$.E(1, (x = A$.W(2, [\"x\"], A$.E(3, A$.L(4, 1, 3)))));"));
}

#[test]
fn compound_assignment_expands_to_read_binary_write() {
    let out = instrument("x += 2;");
    assert!(out.code.contains("(x = A$.W(2, [\"x\"], A$.E(3, A$.B(4, \"+\", A$.R(5, \"x\", x), A$.L(6, 2, 3)))))"));
}

#[test]
fn logical_operators_wrap_only_the_left_operand() {
    let out = instrument("a && b;");
    assert!(out.code.contains("(A$.C(2, \"&&\", A$.R(3, \"a\", a)) && A$.R(4, \"b\", b))"));
}

#[test]
fn conditional_expression_wraps_only_the_test() {
    let out = instrument("c ? 1 : 2;");
    assert!(out.code.contains("(A$.C(2, \"?\", A$.R(3, \"c\", c)) ? A$.L(4, 1, 3) : A$.L(5, 2, 3))"));
}

#[test]
fn switch_reports_discriminant_and_case_tests() {
    let out = instrument("switch (v) { case 1: break; default: break; }");
    assert!(out.code.contains("switch (A$.Swl(1, A$.E(2, A$.R(3, \"v\", v)))) {"));
    assert!(out.code.contains("case A$.Swr(4, A$.E(5, A$.L(6, 1, 3))):"));
    assert!(out.code.contains("default:"));
}

#[test]
fn throw_is_wrapped_in_the_throw_hook() {
    let out = instrument("try { throw \"e\"; } catch (x) { }");
    assert!(out.code.contains("throw A$.Th(1, A$.E(2, A$.L(3, \"e\", 0)));"));
    assert!(out.code.contains("} catch (x) {"));
    assert!(out.code.contains("A$.D(4, \"x\", \"catch-param\", x);"));
}

#[test]
fn for_in_uses_the_runtime_temporary_and_fires_writes() {
    let out = instrument("for (var k in o) {}");
    assert!(out.code.contains("A$.D(1, \"k\", \"var\", k);"));
    assert!(out.code.contains("for (A$._t in A$.O(2, A$.R(3, \"o\", o), true)) {"));
    assert!(out.code.contains("var k = A$.W(4, [\"k\"], A$._t);"));
}

#[test]
fn for_of_sets_the_iteration_flag_to_false() {
    let out = instrument("for (const v of xs) {}");
    assert!(out.code.contains("of A$.O(1, A$.R(2, \"xs\", xs), false)) {"));
    assert!(out.code.contains("A$.D(3, \"v\", \"const\");"));
    assert!(out.code.contains("const v = A$.W(4, [\"v\"], A$._t);"));
}

#[test]
fn return_without_argument_reports_undefined() {
    let out = instrument("function f() { return; }");
    assert!(out.code.contains("return A$.Re(4, void 0);"));
}

#[test]
fn function_expression_is_reported_as_a_literal() {
    let out = instrument("var g = function h() { return 1; };");
    assert!(out.code.contains("A$.L(4, function h() {"));
    assert!(out.code.contains("A$.D(7, \"h\", \"func\", h);"));
}

#[test]
fn arrow_function_reports_no_arguments_object() {
    let out = instrument("var g = (x) => x + 1;");
    assert!(out.code.contains("(x) => {"));
    assert!(out.code.contains("A$.Fe(5, null, this, void 0);"));
    assert!(out.code.contains("A$.D(6, \"x\", \"param\", x);"));
    assert!(out.code.contains("return A$.Re("));
}

#[test]
fn directive_prologue_stays_ahead_of_the_scaffold() {
    let out = instrument("\"use strict\";\nvar x = 1;");
    assert!(out.code.contains("// INSTRUMENTED BY argus\n\"use strict\";\ntry {"));
}

#[test]
fn function_directives_stay_ahead_of_the_function_scaffold() {
    let out = instrument("function f() { \"use strict\"; return 1; }");
    let header = offset_of(&out.code, "function f() {");
    let directive = offset_of(&out.code, "\"use strict\";");
    let scaffold = offset_of(&out.code, "A$.Fe(");
    assert!(header < directive && directive < scaffold);
}

#[test]
fn destructuring_bindings_collect_names_in_source_order() {
    let out = instrument("var {a, b: c, d = 1} = o;");
    assert!(out.code.contains("[\"a\",\"c\",\"d\"]"), "write hook must list all bound names");
    assert!(out.code.contains("d = A$.L("), "pattern defaults are walked as expressions");
}

#[test]
fn array_pattern_holes_are_preserved() {
    let out = instrument("var [p, , q] = o;");
    assert!(out.code.contains("var [p, , q] = A$.W("));
    assert!(out.code.contains("[\"p\",\"q\"]"));
}

#[test]
fn object_literals_walk_their_values() {
    let out = instrument("var o = { a: 1, b };");
    assert!(out.code.contains("{ a: A$.L("));
    assert!(out.code.contains("b: A$.R("));
}

#[test]
fn sequence_and_paren_expressions_pass_through() {
    let out = instrument("(a, b);");
    assert!(out.code.contains("(A$.R(2, \"a\", a), A$.R(3, \"b\", b))"));
}

#[test]
fn labeled_break_survives() {
    let out = instrument("outer: for (;;) { break outer; }");
    assert!(out.code.contains("outer:"));
    assert!(out.code.contains("break outer;"));
}

#[test]
fn marker_in_source_skips_the_walk() {
    let source = "var x = 1; // ARGUS_NO_INSTRUMENT keep me\n";
    let out = instrument(source);
    assert!(out.code.ends_with(source), "source must be passed through verbatim");
    assert!(out.code.starts_with("// ARGUS_NO_INSTRUMENT\nA$.ids = {};\n"));
    assert!(!out.code.contains("A$.Se("), "no hook calls beyond the preamble");
    assert_eq!(out.registry.allocated(), 0);
}

#[test]
fn instrumenting_own_output_is_the_identity() {
    let first = instrument("function f(n) { return n * 2; } f(3);");
    let second = instrument(&first.code);
    assert_eq!(first.code, second.code);
    assert_eq!(second.registry.allocated(), 0, "the marker check must short-circuit the walk");
}

#[test]
fn while_and_do_while_wrap_their_tests() {
    let out = instrument("while (a) {} do {} while (b);");
    assert!(out.code.contains("while (A$.C(1, \"while\", A$.E(2, A$.R(3, \"a\", a)))) {"));
    assert!(out.code.contains("} while (A$.C(4, \"do-while\", A$.E(5, A$.R(6, \"b\", b))));"));
}
