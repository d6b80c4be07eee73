//! A CLI tool for inspecting and converting DICOM P10 files.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use dcmio_core::Tag;

mod anonymize;
mod commands;
mod error;

/// Inspect and convert DICOM P10 files
#[derive(Debug, Parser)]
#[command(name = "dcmio", version)]
struct App {
    #[command(subcommand)]
    command: Command,

    /// Write timing and peak memory usage to stderr on exit
    #[clap(long = "print-stats", global = true)]
    print_stats: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a DICOM file in a human readable format
    Print {
        /// The DICOM file to print
        file: PathBuf,
        /// The width of the output
        /// (default is the terminal width)
        #[clap(short = 'w', long = "width")]
        width: Option<usize>,
    },

    /// Convert a DICOM file to DICOM JSON
    ToJson {
        /// The DICOM file to read
        input: PathBuf,
        /// The JSON file to write
        output: PathBuf,
        /// Pretty-print the JSON output
        #[clap(long = "pretty")]
        pretty: bool,
        /// Store encapsulated pixel data inline as Base64
        #[clap(long = "store-encapsulated-pixel-data")]
        store_encapsulated_pixel_data: bool,
    },

    /// Convert a DICOM JSON file to a DICOM file
    ToDcm {
        /// The JSON file to read
        input: PathBuf,
        /// The DICOM file to write
        output: PathBuf,
    },

    /// Extract the pixel data of a DICOM file into separate files
    ExtractPixelData {
        /// The DICOM file to read
        file: PathBuf,
        /// The prefix of the written files
        /// (default is the input file name)
        #[clap(long = "output-prefix")]
        output_prefix: Option<PathBuf>,
    },

    /// Rewrite a DICOM file, optionally changing its transfer syntax and
    /// removing data elements
    Modify {
        /// The DICOM file to read
        input: PathBuf,
        /// The DICOM file to write
        output: PathBuf,
        /// The transfer syntax UID of the output
        #[clap(long = "transfer-syntax")]
        transfer_syntax: Option<String>,
        /// The zlib compression level for deflated output (0-9)
        #[clap(long = "zlib-compression-level", default_value_t = 6)]
        zlib_compression_level: u32,
        /// Remove data elements that identify the patient
        #[clap(long = "anonymize")]
        anonymize: bool,
        /// Comma-separated tags to remove, e.g. 00100010,00100030
        #[clap(long = "delete-tags", value_delimiter = ',', value_parser = parse_tag)]
        delete_tags: Vec<Tag>,
    },
}

fn parse_tag(s: &str) -> Result<Tag, String> {
    s.trim()
        .parse::<Tag>()
        .map_err(|e| format!("{}: {:?}", e, s))
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let app = App::parse();
    let started = Instant::now();

    let result = match app.command {
        Command::Print { file, width } => commands::print::run(&file, width),
        Command::ToJson {
            input,
            output,
            pretty,
            store_encapsulated_pixel_data,
        } => commands::to_json::run(&input, &output, pretty, store_encapsulated_pixel_data),
        Command::ToDcm { input, output } => commands::to_dcm::run(&input, &output),
        Command::ExtractPixelData {
            file,
            output_prefix,
        } => commands::extract_pixel_data::run(&file, output_prefix.as_deref()),
        Command::Modify {
            input,
            output,
            transfer_syntax,
            zlib_compression_level,
            anonymize,
            delete_tags,
        } => commands::modify::run(
            &input,
            &output,
            transfer_syntax.as_deref(),
            zlib_compression_level,
            anonymize,
            delete_tags,
        ),
    };

    if app.print_stats {
        print_stats(started);
    }

    if let Err(error) = result {
        error.print();
        std::process::exit(1);
    }
}

/// Write elapsed wall time and peak resident memory to stderr.
fn print_stats(started: Instant) {
    eprintln!("Time elapsed: {:.2?}", started.elapsed());
    if let Some(peak_kib) = peak_memory_kib() {
        eprintln!("Peak memory: {} KiB", peak_kib);
    }
}

/// The process's peak resident set size in KiB, when the platform exposes
/// it.
fn peak_memory_kib() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find(|line| line.starts_with("VmHWM:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}
