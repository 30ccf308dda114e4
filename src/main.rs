//! Binary entry point for the `hashlife` command-line tool.
//!
//! With no arguments the built-in big-integer self-test runs. With one
//! pattern-file argument the file is parsed and re-emitted on stdout,
//! choosing the codec by extension (`.rle` → run-length encoding, anything
//! else → dense matrix). Diagnostics go to stderr; the exit code is 0 on
//! success and 1 on any parse or I/O failure.

use hashlife::cli::constants::{display_level, set_display_level, PROGRAM_NAME};
use hashlife::cli::run_file;

fn print_usage() {
    eprintln!("usage: {PROGRAM_NAME} [-v | -q] [pattern-file]");
    eprintln!("  no file   run the arithmetic self-test");
    eprintln!("  file.rle  parse and re-emit an RLE pattern");
    eprintln!("  file.*    parse and re-emit a dense matrix pattern");
}

fn run() -> i32 {
    let mut input: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-v" => set_display_level(display_level() + 1),
            "-q" => set_display_level(display_level().saturating_sub(1)),
            "-h" | "--help" => {
                print_usage();
                return 0;
            }
            _ if arg.starts_with('-') => {
                eprintln!("{PROGRAM_NAME}: unknown option {arg}");
                print_usage();
                return 1;
            }
            _ if input.is_some() => {
                eprintln!("{PROGRAM_NAME}: expected at most one pattern file");
                print_usage();
                return 1;
            }
            _ => input = Some(arg),
        }
    }

    match input {
        None => {
            if hashlife::bigint::self_test() {
                hashlife::displaylevel!(2, "bigint self-test passed\n");
                0
            } else {
                1
            }
        }
        Some(path) => match run_file(&path) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{PROGRAM_NAME}: {e:#}");
                1
            }
        },
    }
}

fn main() {
    std::process::exit(run());
}
