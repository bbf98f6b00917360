//! Binary entry point for the `lzopar` command-line tool.
//!
//! Post-parse validation, default-output-path resolution, and dispatch into
//! `driver::compress`/`driver::decompress`. Argument parsing happens in
//! `cli::args`; this file is the thin post-parse dispatcher that turns a
//! [`Cli`] into an exit code.

use std::io::{IsTerminal, Read, Write};
use std::process::ExitCode;

use clap::Parser;

use lzopar::cli::args::Cli;
use lzopar::cli::constants::{set_display_level, EXTENSION};
use lzopar::config::{nb_workers_default, LEVEL_DEFAULT};
use lzopar::driver::{self, CompressOptions, DecompressOptions};
use lzopar::lzo::level::Level;

/// `-` denotes stdin (as an input path) or stdout (as an output path).
const STD_MARK: &str = "-";

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("lzopar: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if cli.benchmark {
        set_display_level(3);
    }

    let workers = cli.threads.unwrap_or_else(nb_workers_default);
    if cli.input == STD_MARK && cli.output.is_none() {
        return Err("refusing to guess an output filename for stdin input; pass an explicit output path".to_string());
    }

    let input = read_input(&cli.input)?;

    if cli.decompress {
        run_decompress(&cli, &input, workers)
    } else {
        run_compress(&cli, &input, workers)
    }
}

fn run_compress(cli: &Cli, input: &[u8], workers: usize) -> Result<(), String> {
    let level = cli.level.unwrap_or(Level::from_cli(LEVEL_DEFAULT));
    let opts = CompressOptions {
        level,
        workers,
        verify: cli.verify,
        benchmark: cli.benchmark,
    };

    let outcome = driver::compress(input, &opts).map_err(|e| e.to_string())?;

    report_benchmark(&outcome.benchmark);
    if cli.verify && cli.output.is_none() {
        lzopar::displaylevel!(
            2,
            "verify ok ({} bytes -> {} bytes); no output file written\n",
            input.len(),
            outcome.container.len()
        );
        return Ok(());
    }

    let output_path = cli.output.clone().unwrap_or_else(|| default_compress_output(&cli.input));
    write_output(&output_path, &outcome.container)
}

fn run_decompress(cli: &Cli, input: &[u8], workers: usize) -> Result<(), String> {
    let opts = DecompressOptions {
        workers,
        verify: cli.verify,
        benchmark: cli.benchmark,
    };

    let outcome = driver::decompress(input, &opts).map_err(|e| e.to_string())?;

    report_benchmark(&outcome.benchmark);
    if cli.verify && cli.output.is_none() {
        lzopar::displaylevel!(
            2,
            "verify ok ({} bytes -> {} bytes); no output file written\n",
            input.len(),
            outcome.output.len()
        );
        return Ok(());
    }

    let output_path = cli.output.clone().unwrap_or_else(|| default_decompress_output(&cli.input));
    write_output(&output_path, &outcome.output)
}

fn report_benchmark(benchmark: &Option<driver::BenchmarkReport>) {
    if let Some(report) = benchmark {
        lzopar::displaylevel!(
            2,
            "benchmark: single-block {:?}, multi-block {:?}\n",
            report.single_block,
            report.multi_block
        );
    }
}

/// Compress appends `.lzo`.
fn default_compress_output(input_path: &str) -> String {
    format!("{input_path}{EXTENSION}")
}

/// Decompress strips `.lzo` if present, else prefixes `decompressed_`.
fn default_decompress_output(input_path: &str) -> String {
    match input_path.strip_suffix(EXTENSION) {
        Some(stripped) => stripped.to_string(),
        None => format!("decompressed_{input_path}"),
    }
}

fn read_input(path: &str) -> Result<Vec<u8>, String> {
    if path == STD_MARK {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        Ok(buf)
    } else {
        std::fs::read(path).map_err(|e| format!("failed to read `{path}`: {e}"))
    }
}

fn write_output(path: &str, bytes: &[u8]) -> Result<(), String> {
    if path == STD_MARK {
        let mut stdout = std::io::stdout();
        if stdout.is_terminal() {
            return Err("refusing to write binary output to a terminal; redirect stdout or pass an output path".to_string());
        }
        stdout.write_all(bytes).map_err(|e| format!("failed to write stdout: {e}"))
    } else {
        std::fs::write(path, bytes).map_err(|e| format!("failed to write `{path}`: {e}"))
    }
}
