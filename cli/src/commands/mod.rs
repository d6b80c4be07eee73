//! The CLI subcommands.

pub mod extract_pixel_data;
pub mod modify;
pub mod print;
pub mod to_dcm;
pub mod to_json;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use dcmio_p10::{P10Error, P10Reader, Part, ReadConfig};

use crate::error::CliError;

/// Files are fed to the reader in chunks of this size.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Stream the parts of a DICOM P10 file through a handler, feeding the
/// reader from disk whenever it needs more bytes.
pub(crate) fn stream_parts<F>(path: &Path, task: &str, mut handle: F) -> Result<(), CliError>
where
    F: FnMut(Part) -> Result<(), CliError>,
{
    let mut file = File::open(path).map_err(|source| CliError::P10 {
        task: task.to_owned(),
        source: P10Error::FileError {
            context: format!("opening \"{}\"", path.display()),
            source,
        },
    })?;

    let mut reader = P10Reader::with_config(ReadConfig::default());
    let mut buffer = vec![0u8; READ_CHUNK_SIZE];

    loop {
        match reader.read_parts() {
            Ok(parts) => {
                for part in parts {
                    let ended = part == Part::End;
                    handle(part)?;
                    if ended {
                        return Ok(());
                    }
                }
            }
            Err(P10Error::DataRequired { .. }) => {
                let count = file.read(&mut buffer).map_err(|source| CliError::P10 {
                    task: task.to_owned(),
                    source: P10Error::FileStreamError {
                        context: format!("reading \"{}\"", path.display()),
                        source,
                    },
                })?;
                reader
                    .write_bytes(buffer[..count].to_vec(), count == 0)
                    .map_err(CliError::p10(task))?;
            }
            Err(source) => {
                return Err(CliError::P10 {
                    task: task.to_owned(),
                    source,
                })
            }
        }
    }
}
