// cinder - A Clojure-compatible Lisp runtime written in Rust
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod host;

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::thread;

use cinder_embed::{BackendKind, Engine, Error, EvalConfig, render_error};

/// Evaluation recurses on the native stack; give it room.
const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

const USAGE: &str = "\
Usage: cinder [OPTIONS] [FILE...]

Evaluates each FILE in order, or starts a REPL when none are given.

Options:
  --vm          Run on the bytecode VM
  --tree        Run on the tree-walking interpreter (default)
  --stress-gc   Collect garbage at every safe point
  -v, --version Print the version
  -h, --help    Print this help";

struct Options {
    backend: BackendKind,
    config: EvalConfig,
    files: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        backend: BackendKind::default(),
        config: EvalConfig::default(),
        files: Vec::new(),
    };
    for arg in args {
        match arg.as_str() {
            "--vm" => options.backend = BackendKind::Vm,
            "--tree" => options.backend = BackendKind::TreeWalk,
            "--stress-gc" => options.config = options.config.with_stress_gc(true),
            flag if flag.starts_with('-') => return Err(format!("unknown option '{}'", flag)),
            file => options.files.push(file.to_string()),
        }
    }
    Ok(options)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("cinder v{}", env!("CARGO_PKG_VERSION"));
        return;
    }
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}\n\n{}", message, USAGE);
            process::exit(2);
        }
    };

    let worker = thread::Builder::new()
        .name("cinder-eval".into())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || run(options));
    let code = match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => {
            eprintln!("Error: evaluation thread panicked");
            1
        }
        Err(e) => {
            eprintln!("Error: cannot start evaluation thread: {}", e);
            1
        }
    };
    process::exit(code);
}

fn run(options: Options) -> i32 {
    let mut engine = match Engine::with_config(options.backend, options.config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to load prelude: {}", e);
            return 1;
        }
    };
    if let Err(e) = host::register(&mut engine) {
        eprintln!("Failed to register host module: {}", e);
        return 1;
    }
    log::info!("running on the {} backend", engine.backend_kind());

    if options.files.is_empty() {
        run_repl(&mut engine);
        return 0;
    }
    for file in &options.files {
        if let Err(message) = run_file(&mut engine, file) {
            eprintln!("{}", message);
            return 1;
        }
    }
    0
}

/// Evaluate a single source file, rendering any error against its text.
fn run_file(engine: &mut Engine, file_path: &str) -> Result<(), String> {
    let path = Path::new(file_path);
    match path.extension().and_then(|e| e.to_str()) {
        Some("clj") | Some("cljc") => {}
        Some(ext) => {
            return Err(format!(
                "Error: unsupported file extension '.{}' for '{}'",
                ext, file_path
            ));
        }
        None => {
            return Err(format!(
                "Error: file '{}' has no extension (expected .clj or .cljc)",
                file_path
            ));
        }
    }

    let source =
        fs::read_to_string(path).map_err(|e| format!("Error reading '{}': {}", file_path, e))?;
    engine
        .eval(&source)
        .map(|_| ())
        .map_err(|e| render_error(&e, &source, file_path))
}

/// A reader error that more input could fix.
fn is_incomplete(err: &Error) -> bool {
    err.message.starts_with("Unterminated") || err.message.starts_with("Unexpected end of input")
}

/// Run the interactive REPL. Input is read until it forms complete forms.
fn run_repl(engine: &mut Engine) {
    println!("cinder v{} ({})", env!("CARGO_PKG_VERSION"), engine.backend_kind());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut pending = String::new();
    loop {
        print!("{}", if pending.is_empty() { "user=> " } else { "   #_=> " });
        if io::stdout().flush().is_err() {
            break;
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Read error: {}", e);
                break;
            }
            None => {
                println!();
                break;
            }
        };
        pending.push_str(&line);
        pending.push('\n');
        if pending.trim().is_empty() {
            pending.clear();
            continue;
        }

        match engine.eval(&pending) {
            Ok(v) => println!("{}", engine.repr(v)),
            Err(e) if is_incomplete(&e) => continue,
            Err(e) => eprintln!("{}", render_error(&e, &pending, "<repl>")),
        }
        pending.clear();
    }
}
