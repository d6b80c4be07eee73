//! The `modify` subcommand.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use dcmio_core::dictionary::tags;
use dcmio_core::{DataSetPath, Tag, TransferSyntax, VR};
use dcmio_p10::transforms::FilterTransform;
use dcmio_p10::{P10Error, P10Writer, Part, WriteConfig};

use crate::anonymize;
use crate::commands::stream_parts;
use crate::error::CliError;

pub fn run(
    input: &Path,
    output: &Path,
    transfer_syntax: Option<&str>,
    zlib_compression_level: u32,
    anonymize: bool,
    delete_tags: Vec<Tag>,
) -> Result<(), CliError> {
    let task = format!("modifying \"{}\"", input.display());

    let target_syntax = transfer_syntax
        .map(|uid| {
            TransferSyntax::from_uid(uid)
                .filter(|ts| !ts.is_encapsulated)
                .ok_or_else(|| CliError::P10 {
                    task: task.clone(),
                    source: P10Error::UnsupportedTransferSyntax {
                        uid: uid.to_owned(),
                    },
                })
        })
        .transpose()?;

    let delete_tags: BTreeSet<Tag> = delete_tags.into_iter().collect();
    let mut filter = FilterTransform::new(
        Box::new(move |tag, vr, _| {
            if delete_tags.contains(&tag) {
                return false;
            }
            !anonymize || anonymize::keep_tag(tag, vr)
        }),
        false,
    );

    let mut out = File::create(output).map_err(|source| CliError::P10 {
        task: task.clone(),
        source: P10Error::FileError {
            context: format!("creating \"{}\"", output.display()),
            source,
        },
    })?;

    let mut writer = P10Writer::with_config(
        WriteConfig::default().zlib_compression_level(zlib_compression_level),
    );

    stream_parts(input, &task, |mut part| {
        if !filter.add_part(&part).map_err(CliError::p10(&task))? {
            return Ok(());
        }

        match &mut part {
            Part::FileMetaInformation { data_set } => {
                if let Some(target) = target_syntax {
                    data_set
                        .insert_string_value(tags::TRANSFER_SYNTAX_UID, VR::UI, &[target.uid])
                        .expect("transfer syntax UIDs are valid UI values");
                }
            }
            // re-encoding encapsulated fragments into a native transfer
            // syntax would require decoding the frames
            Part::SequenceStart { tag, vr: VR::OB | VR::OW }
                if target_syntax.is_some() && *tag == tags::PIXEL_DATA =>
            {
                return Err(CliError::P10 {
                    task: task.clone(),
                    source: P10Error::DataInvalid {
                        when: "Changing transfer syntax".into(),
                        details: "Encapsulated pixel data cannot be rewritten into a native \
                                  transfer syntax"
                            .into(),
                        path: DataSetPath::new_with_data_element(*tag),
                        offset: 0,
                    },
                });
            }
            _ => {}
        }

        writer.write_part(&part).map_err(CliError::p10(&task))?;

        let bytes = writer.pending_bytes();
        if !bytes.is_empty() {
            out.write_all(&bytes).map_err(|source| CliError::P10 {
                task: task.clone(),
                source: P10Error::FileStreamError {
                    context: format!("writing \"{}\"", output.display()),
                    source,
                },
            })?;
        }

        Ok(())
    })
}
