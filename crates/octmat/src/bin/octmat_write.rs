//! `octmat-write`: write a JSON bundle (stdin) to a MAT file.
//!
//! Usage:
//!   octmat-write [--oned-as row|column] [--no-float] [--compress] <path>
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use octmat::cli::{parse_args, write_json};
use std::io::{self, Read};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    if let Err(e) = write_json(buf.trim(), &args.path, &args.options) {
        eprintln!("{e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
