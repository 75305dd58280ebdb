use std::env;
use std::process;

use tree_lox::lox::{self, Lox, Reporter};

fn run(args: Vec<String>) -> i32 {
    let mut lox_runtime = Lox::new();
    let result = match args.len() {
        1 => lox_runtime.run_prompt(),
        2 => lox_runtime.run_file(&args[1]),
        _ => {
            println!("Usage: tree_lox [script]");
            return 64;
        }
    };
    if let Err(err) = result {
        eprintln!("{}", err);
        return 74;
    }
    if lox_runtime.reporter.had_error() {
        return 65;
    }
    if lox_runtime.reporter.had_runtime_error() {
        return 70;
    }
    0
}

fn main() {
    let args: Vec<String> = env::args().collect();
    match lox::with_stack(move || run(args)) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(70);
        }
    }
}
