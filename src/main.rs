use std::{
    fs::read_to_string,
    io::{self, Read},
    process::exit,
    time::Instant,
};

use ilocc::{compile_source, config::CompilerConfig};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Exit status for usage and I/O failures.
const USAGE_EXIT_CODE: i32 = 2;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = match CompilerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ilocc: {}", err);
            eprintln!("usage: ilocc [--emit ast|check|iloc] [--call-args children|chained] [--fn-link tail|header] [--stack-base N] [--rbss N] [FILE]");
            exit(USAGE_EXIT_CODE);
        }
    };

    let (source, file) = match read_input(&config) {
        Ok(input) => input,
        Err(err) => {
            error!(%err, "failed to read the program");
            eprintln!("ilocc: {}", err);
            exit(USAGE_EXIT_CODE);
        }
    };

    let start = Instant::now();
    let result = compile_source(&source, &file, &config);
    debug!(elapsed = ?start.elapsed(), emit = ?config.emit, "finished");

    match result {
        Ok(output) => print!("{}", output),
        Err(err) => {
            debug!(code = err.code(), name = err.get_error_name(), detail = %err.get_error(), "compilation failed");
            println!("{}", err.render(&source));
            exit(err.code());
        }
    }
}

/// Reads the program from the configured file or from standard input.
fn read_input(config: &CompilerConfig) -> io::Result<(String, String)> {
    match &config.input {
        Some(path) => Ok((read_to_string(path)?, path.to_string_lossy().into_owned())),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok((source, "stdin".to_string()))
        }
    }
}
