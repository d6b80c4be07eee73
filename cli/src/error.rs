//! Error reporting for the command line front end.

use dcmio_json::{JsonDeserializeError, JsonSerializeError};
use dcmio_p10::P10Error;

/// A failed CLI task: the error plus a description of what was being done,
/// rendered as multi-line human-readable output.
#[derive(Debug)]
pub enum CliError {
    P10 {
        task: String,
        source: P10Error,
    },
    JsonSerialize {
        task: String,
        source: JsonSerializeError,
    },
    JsonDeserialize {
        task: String,
        source: JsonDeserializeError,
    },
}

impl CliError {
    pub fn p10(task: impl Into<String>) -> impl FnOnce(P10Error) -> CliError {
        let task = task.into();
        |source| CliError::P10 { task, source }
    }

    pub fn json_serialize(task: impl Into<String>) -> impl FnOnce(JsonSerializeError) -> CliError {
        let task = task.into();
        |source| CliError::JsonSerialize { task, source }
    }

    pub fn json_deserialize(
        task: impl Into<String>,
    ) -> impl FnOnce(JsonDeserializeError) -> CliError {
        let task = task.into();
        |source| CliError::JsonDeserialize { task, source }
    }

    /// Print the error to stderr.
    pub fn print(&self) {
        match self {
            CliError::P10 { task, source } => {
                for line in source.to_lines(task) {
                    eprintln!("{}", line);
                }
            }
            CliError::JsonSerialize { task, source } => {
                eprintln!("DICOM JSON error {}", task);
                eprintln!("  Error: {}", source);
            }
            CliError::JsonDeserialize { task, source } => {
                eprintln!("DICOM JSON error {}", task);
                eprintln!("  Error: {}", source);
            }
        }
    }
}
