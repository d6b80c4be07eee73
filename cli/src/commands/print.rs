//! The `print` subcommand.

use std::io::IsTerminal;
use std::path::Path;

use dcmio_p10::transforms::{PrintOptions, PrintTransform};

use crate::commands::stream_parts;
use crate::error::CliError;

pub fn run(file: &Path, width: Option<usize>) -> Result<(), CliError> {
    let task = format!("printing \"{}\"", file.display());

    let width = width
        .or_else(|| terminal_size::terminal_size().map(|(width, _)| width.0 as usize))
        .unwrap_or(80);
    let styled = std::io::stdout().is_terminal();

    let mut transform = PrintTransform::new(PrintOptions {
        max_width: width,
        styled,
    });

    stream_parts(file, &task, |part| {
        for line in transform.add_part(&part) {
            println!("{}", line);
        }
        Ok(())
    })
}
