//! The `extract-pixel-data` subcommand.

use std::path::{Path, PathBuf};

use dcmio_core::dictionary::tags;
use dcmio_core::{DataElementValue, DataSetPath};
use dcmio_p10::transforms::FilterTransform;
use dcmio_p10::P10Error;

use crate::commands::stream_parts;
use crate::error::CliError;

pub fn run(file: &Path, output_prefix: Option<&Path>) -> Result<(), CliError> {
    let task = format!("extracting pixel data from \"{}\"", file.display());

    // materialize only the pixel data group
    let mut filter = FilterTransform::new(
        Box::new(|tag, _, _| tag.group() == 0x7FE0),
        true,
    );

    stream_parts(file, &task, |part| {
        filter.add_part(&part).map_err(CliError::p10(&task))?;
        Ok(())
    })?;

    let data_set = filter.data_set().map_err(CliError::p10(&task))?;

    let prefix: PathBuf = output_prefix
        .map(Path::to_path_buf)
        .unwrap_or_else(|| file.with_extension(""));

    let value = data_set
        .get(tags::PIXEL_DATA)
        .ok_or_else(|| CliError::P10 {
            task: task.clone(),
            source: P10Error::DataInvalid {
                when: "Extracting pixel data".into(),
                details: "The file has no pixel data".into(),
                path: DataSetPath::new_with_data_element(tags::PIXEL_DATA),
                offset: 0,
            },
        })?;

    match value {
        DataElementValue::PixelSequence { fragments, .. } => {
            // the first item is the Basic Offset Table, not a frame
            for (index, fragment) in fragments.iter().skip(1).enumerate() {
                let path = prefix.with_extension(format!("{:04}.bin", index));
                write_file(&path, fragment, &task)?;
                println!("Wrote \"{}\"", path.display());
            }
        }
        DataElementValue::Binary { bytes, .. } => {
            let path = prefix.with_extension("bin");
            write_file(&path, bytes, &task)?;
            println!("Wrote \"{}\"", path.display());
        }
        other => {
            return Err(CliError::P10 {
                task: task.clone(),
                source: P10Error::DataInvalid {
                    when: "Extracting pixel data".into(),
                    details: format!("Pixel data has an unexpected value: {}", other),
                    path: DataSetPath::new_with_data_element(tags::PIXEL_DATA),
                    offset: 0,
                },
            })
        }
    }

    Ok(())
}

fn write_file(path: &Path, bytes: &[u8], task: &str) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::P10 {
        task: task.to_owned(),
        source: P10Error::FileError {
            context: format!("writing \"{}\"", path.display()),
            source,
        },
    })
}
