use argus::{InstrumentedOutput, SiteLocation, instrument_source};
use regex::Regex;

fn instrument(source: &str) -> InstrumentedOutput {
    instrument_source(source, "test.js", "test__argus__.js").expect("transformation should succeed")
}

/// Every id used as the first argument of a hook call, in text order.
fn first_arg_ids(code: &str) -> Vec<u32> {
    let call = Regex::new(r"A\$\.[A-Za-z]+\((\d+)").expect("valid pattern");
    call.captures_iter(code)
        .map(|c| c[1].parse().expect("numeric id"))
        .collect()
}

/// The synthesized binary ids passed as the second argument of update hooks.
fn update_binary_ids(code: &str) -> Vec<u32> {
    let update = Regex::new(r"A\$\.Up\(\d+, (\d+)").expect("valid pattern");
    update
        .captures_iter(code)
        .map(|c| c[1].parse().expect("numeric id"))
        .collect()
}

const SAMPLE: &str = "var x = 1 + 2;\nfunction f(n) { return n * 2; }\nfor (let i = 0; i < 2; i++) { f(x); }\no.p++;\n";

#[test]
fn first_argument_ids_are_unique() {
    let out = instrument(SAMPLE);
    let ids = first_arg_ids(&out.code);
    let mut deduped = ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len(), "an id appeared twice as a hook's first argument");
}

#[test]
fn first_argument_ids_are_strictly_increasing_in_visit_order() {
    let out = instrument(SAMPLE);
    let ids = first_arg_ids(&out.code);
    assert!(!ids.is_empty());
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1], "ids must increase in visit order: {pair:?}");
    }
}

#[test]
fn every_allocated_id_appears_in_the_emitted_text() {
    let out = instrument(SAMPLE);
    let mut ids = first_arg_ids(&out.code);
    ids.extend(update_binary_ids(&out.code));
    ids.sort_unstable();
    let expected: Vec<u32> = (0..out.registry.allocated()).collect();
    assert_eq!(ids, expected, "allocation and emission must agree exactly");
}

#[test]
fn literal_locations_are_one_based_with_shifted_columns() {
    let out = instrument("var x = 1;");
    // Ids in visit order: script-enter, declare, write, expression, literal.
    assert_eq!(out.registry.location_of(4), Some(SiteLocation([1, 9, 1, 10])));
}

#[test]
fn locations_track_their_source_lines() {
    let out = instrument("var x = 1;\nvar y = 2;");
    // The second declarator's literal is the last id before the scaffold tail.
    let literal = out.registry.location_of(8).expect("second literal entry");
    assert_eq!(literal.0[0], 2, "the literal on line 2 must map to line 2");
    let script = out.registry.location_of(0).expect("script-enter entry");
    assert_eq!((script.0[0], script.0[1]), (1, 1));
}

#[test]
fn the_table_is_serialized_into_the_preamble() {
    let out = instrument("var x = 1;");
    assert!(out.code.contains("A$.ids = {\"0\":[1,1,"));
    let allocated = out.registry.allocated();
    assert_eq!(allocated, 7, "script-enter, declare, write, expression, literal, uncaught, script-exit");
    for id in 0..allocated {
        assert!(out.registry.location_of(id).is_some(), "id {id} has a real source span");
    }
}

#[test]
fn registry_counts_match_between_runs() {
    let first = instrument(SAMPLE);
    let second = instrument(SAMPLE);
    assert_eq!(first.registry.allocated(), second.registry.allocated(), "the walk is deterministic");
    assert_eq!(first.code, second.code);
}
