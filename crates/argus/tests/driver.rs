use std::{env, fs, path::Path};

use argus::{InstrumentError, instrument_file, output_path_for};

#[test]
fn derived_names_keep_stem_and_extension() {
    assert_eq!(
        output_path_for(Path::new("dir/app.js")),
        Path::new("dir/app__argus__.js")
    );
    assert_eq!(output_path_for(Path::new("plain")), Path::new("plain__argus__"));
}

#[test]
fn instrument_file_writes_the_derived_file_beside_the_input() {
    let dir = env::temp_dir().join("argus-driver-test");
    fs::create_dir_all(&dir).expect("temp dir");
    let input = dir.join("sample.js");
    fs::write(&input, "var x = 1;\n").expect("write input");

    let out_path = instrument_file(&input).expect("instrumentation should succeed");
    assert_eq!(out_path, dir.join("sample__argus__.js"));

    let produced = fs::read_to_string(&out_path).expect("read output");
    assert!(produced.starts_with("// ARGUS_NO_INSTRUMENT\n"));
    assert!(produced.contains("A$.W("));

    fs::remove_file(&input).ok();
    fs::remove_file(&out_path).ok();
}

#[test]
fn missing_inputs_surface_as_io_errors() {
    let err = instrument_file(Path::new("definitely/not/here.js")).expect_err("expected an I/O failure");
    assert!(matches!(err, InstrumentError::Io { .. }));
    assert!(err.to_string().contains("here.js"));
}

#[test]
fn transform_failures_convert_into_the_driver_error() {
    let dir = env::temp_dir().join("argus-driver-test");
    fs::create_dir_all(&dir).expect("temp dir");
    let input = dir.join("unsupported.js");
    fs::write(&input, "class X {}\n").expect("write input");

    let err = instrument_file(&input).expect_err("class syntax is rejected");
    assert!(matches!(err, InstrumentError::Transform(_)));

    fs::remove_file(&input).ok();
}
