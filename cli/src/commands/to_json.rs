//! The `to-json` subcommand.

use std::path::Path;

use dcmio_json::{JsonConfig, JsonSerializer};

use crate::commands::stream_parts;
use crate::error::CliError;

pub fn run(
    input: &Path,
    output: &Path,
    pretty: bool,
    store_encapsulated_pixel_data: bool,
) -> Result<(), CliError> {
    let task = format!("converting \"{}\" to DICOM JSON", input.display());

    let mut serializer = JsonSerializer::new(JsonConfig {
        store_encapsulated_pixel_data,
        pretty_print: pretty,
    });

    stream_parts(input, &task, |part| {
        serializer
            .add_part(&part)
            .map_err(CliError::json_serialize(&task))
    })?;

    let json = serializer.finish().map_err(CliError::json_serialize(&task))?;

    std::fs::write(output, json).map_err(|source| CliError::P10 {
        task: task.clone(),
        source: dcmio_p10::P10Error::FileError {
            context: format!("writing \"{}\"", output.display()),
            source,
        },
    })
}
