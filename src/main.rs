#![cfg_attr(feature = "strict", deny(warnings))]
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use serde::Serialize;

use setsum::Setsum;

/// Compute an order-independent digest over the lines of the inputs.
///
/// Every line (without its trailing newline) is one item.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Files whose lines are inserted (stdin if none are given).
    files: Vec<PathBuf>,
    /// Files whose lines are removed.
    #[clap(long)]
    remove: Vec<PathBuf>,
    /// Hex digest to compare against; exit with status 1 on mismatch.
    #[clap(long)]
    expect: Option<String>,
    /// Print a JSON report instead of the bare hex digest.
    #[clap(long)]
    json: bool,
    /// More logging (repeat for more).
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    inserted: usize,
    removed: usize,
    digest: Setsum,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<bool>,
}

/// Feed every line of `reader` to `f`; returns the number of lines.
fn for_each_line<R: BufRead>(reader: R, mut f: impl FnMut(&[u8])) -> io::Result<usize> {
    let mut count = 0;
    for line in reader.split(b'\n') {
        f(&line?);
        count += 1;
    }
    Ok(count)
}

fn for_each_line_in(path: &Path, f: impl FnMut(&[u8])) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let count = for_each_line(BufReader::new(file), f)
        .with_context(|| format!("reading {}", path.display()))?;
    info!("{}: {} lines", path.display(), count);
    Ok(count)
}

fn init_logging(verbose: usize) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Returns whether the digest matched `--expect` (always true without it).
fn run(args: Args, out: &mut impl Write) -> Result<bool> {
    let expected = args
        .expect
        .as_deref()
        .map(str::parse::<Setsum>)
        .transpose()
        .context("parsing --expect")?;

    let mut setsum = Setsum::default();
    let mut inserted = 0;
    if args.files.is_empty() {
        let stdin = io::stdin();
        inserted += for_each_line(stdin.lock(), |item| setsum.insert(item))
            .context("reading stdin")?;
        info!("stdin: {} lines", inserted);
    }
    for path in &args.files {
        inserted += for_each_line_in(path, |item| setsum.insert(item))?;
    }
    let mut removed = 0;
    for path in &args.remove {
        removed += for_each_line_in(path, |item| setsum.remove(item))?;
    }
    if removed > inserted {
        warn!(
            "removed {} lines but only inserted {}; digest reflects over-removal",
            removed, inserted
        );
    }

    let matches = expected.map(|expected| expected == setsum);
    if args.json {
        let report = Report {
            inserted,
            removed,
            digest: setsum,
            matches,
        };
        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", setsum)?;
    }
    Ok(matches.unwrap_or(true))
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    let stdout = io::stdout();
    match run(args, &mut stdout.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::from(2)
        }
    }
}
