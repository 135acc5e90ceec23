//! Papackino CLI - Command-line interface for packing HTML documents

use clap::Parser;
use papackino::{InlineError, OnError, PackReport, Packer};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Papackino - pack an HTML document and its assets into a single file
#[derive(Parser, Debug)]
#[command(name = "papackino")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HTML document to pack
    input: PathBuf,

    /// Where to write the packed document (overwritten if present)
    output: PathBuf,

    /// Custom User-Agent for remote resources
    #[arg(long)]
    user_agent: Option<String>,

    /// Connect and request timeout for remote resources, in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// What to do when a resource cannot be inlined: abort or skip
    #[arg(long, value_name = "POLICY", default_value = "abort")]
    on_error: OnError,

    /// Leave references that cannot be inlined in place instead of failing
    /// (same as `--on-error skip`)
    #[arg(long, conflicts_with = "on_error")]
    keep_going: bool,

    /// Do not inject the runtime shim script into <head>
    #[arg(long)]
    no_shim: bool,

    /// Print a JSON report of inlined resources to stdout
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() {
    // Exits with code 2 and a usage message on missing arguments
    let cli = Cli::parse();

    init_tracing();

    let packer = build_packer(&cli);
    match packer.pack_file(&cli.input, &cli.output).await {
        Ok(report) => {
            if cli.report {
                print_report(&report);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e));
            std::process::exit(1);
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_packer(cli: &Cli) -> Packer {
    let on_error = if cli.keep_going {
        OnError::Skip
    } else {
        cli.on_error
    };
    let mut builder = Packer::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .inject_shim(!cli.no_shim)
        .on_error(on_error);

    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }

    builder.build()
}

fn format_error(err: &InlineError) -> String {
    match err {
        InlineError::InputNotFound(_) => err.to_string(),
        _ => format!("Error: {}", err),
    }
}

fn print_report(report: &PackReport) {
    let json = serde_json::to_string_pretty(report).unwrap_or_else(|e| {
        eprintln!("Error serializing report: {}", e);
        std::process::exit(1);
    });
    writeln_safe(&json);
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
