//! The `to-dcm` subcommand.

use std::path::Path;

use dcmio_json::data_set_from_json;
use dcmio_p10::{data_set_to_bytes, P10Error, WriteConfig};

use crate::error::CliError;

pub fn run(input: &Path, output: &Path) -> Result<(), CliError> {
    let task = format!("converting \"{}\" to DICOM P10", input.display());

    let json = std::fs::read_to_string(input).map_err(|source| CliError::P10 {
        task: task.clone(),
        source: P10Error::FileError {
            context: format!("opening \"{}\"", input.display()),
            source,
        },
    })?;

    let data_set = data_set_from_json(&json).map_err(CliError::json_deserialize(&task))?;

    let bytes =
        data_set_to_bytes(&data_set, WriteConfig::default()).map_err(CliError::p10(&task))?;

    std::fs::write(output, bytes).map_err(|source| CliError::P10 {
        task: task.clone(),
        source: P10Error::FileError {
            context: format!("writing \"{}\"", output.display()),
            source,
        },
    })
}
