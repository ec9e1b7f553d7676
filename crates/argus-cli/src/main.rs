use std::{env, path::Path, process::ExitCode};

use argus::instrument_file;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: argus <file.js>...");
        return ExitCode::FAILURE;
    }

    for path in &args[1..] {
        match instrument_file(Path::new(path)) {
            Ok(out_path) => println!("{path} -> {}", out_path.display()),
            Err(err) => {
                eprintln!("\x1b[31merror\x1b[0m: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
