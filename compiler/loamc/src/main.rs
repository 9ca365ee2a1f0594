//! Loam compiler CLI.

use loamc::commands::{lex_file, run_compiler};

const USAGE: &str = "\
loam compiler

Usage: loam --help
       loam lex <file.loam>
       loam <input-files>
";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print!("{USAGE}");
        return;
    }

    match args[0].as_str() {
        "lex" => {
            if args.len() != 2 {
                eprintln!("Usage: loam lex <file.loam>");
                std::process::exit(1);
            }
            if let Err(e) = lex_file(&args[1]) {
                eprintln!("loam: error: {e}");
                std::process::exit(1);
            }
        }
        _ => {
            let error_count = run_compiler(&args);
            if error_count > 0 {
                std::process::exit(1);
            }
        }
    }
}
