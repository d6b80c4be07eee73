//! The error taxonomy shared by reading, writing and transforming DICOM P10
//! streams.

use dcmio_core::{DataSetPath, Tag};
use snafu::Snafu;

/// An error raised while reading, writing or transforming DICOM P10 data.
///
/// Reader errors carry the active [`DataSetPath`] and the byte offset since
/// the start of the stream. [`P10Error::DataRequired`] is not fatal: it
/// signals that the reader needs more bytes before the next part can be
/// produced.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum P10Error {
    /// The bytes or parts do not form legal DICOM content.
    #[snafu(display("Invalid data while {}: {}", when, details))]
    DataInvalid {
        when: String,
        details: String,
        path: DataSetPath,
        offset: u64,
    },

    /// More input bytes are required before the operation can make progress.
    #[snafu(display("More data required while {}", when))]
    DataRequired { when: String },

    /// The stream ended part-way through an element or header.
    #[snafu(display("Data ended unexpectedly while {}", when))]
    DataEndedUnexpectedly {
        when: String,
        path: DataSetPath,
        offset: u64,
    },

    /// A configured maximum was exceeded.
    #[snafu(display("Maximum exceeded: {}", details))]
    MaximumExceeded {
        details: String,
        path: DataSetPath,
        offset: u64,
    },

    /// A data element was encountered out of ascending tag order.
    #[snafu(display(
        "Data element {} is not in ascending order (previous was {})",
        tag,
        previous
    ))]
    InvalidOrder {
        tag: Tag,
        previous: Tag,
        path: DataSetPath,
        offset: u64,
    },

    /// The transfer syntax is not supported for the attempted operation.
    #[snafu(display("Transfer syntax '{}' is not supported", uid))]
    UnsupportedTransferSyntax { uid: String },

    /// Deflated data failed to inflate or deflate.
    #[snafu(display("Zlib data error while {}", when))]
    ZlibDataError {
        when: String,
        path: DataSetPath,
        offset: u64,
    },

    /// A write was attempted after the final bytes of the stream.
    #[snafu(display("Write after completion of the stream"))]
    WriteAfterCompletion,

    /// The writer was handed a part sequence that is not well formed.
    #[snafu(display("Invalid part stream: {}", details))]
    PartStreamInvalid { details: String },

    /// A file could not be opened or created. Raised by collaborators
    /// performing I/O on behalf of the stream codec.
    #[snafu(display("File error {}: {}", context, source))]
    FileError {
        context: String,
        source: std::io::Error,
    },

    /// A file read or write failed mid-stream. Raised by collaborators
    /// performing I/O on behalf of the stream codec.
    #[snafu(display("File stream error {}: {}", context, source))]
    FileStreamError {
        context: String,
        source: std::io::Error,
    },
}

pub type Result<T, E = P10Error> = std::result::Result<T, E>;

impl P10Error {
    /// Render this error as human-readable lines describing the failed task,
    /// suitable for terminal output.
    pub fn to_lines(&self, task_description: &str) -> Vec<String> {
        let mut lines = vec![format!("DICOM P10 error {}", task_description)];

        match self {
            P10Error::DataInvalid {
                when,
                details,
                path,
                offset,
            } => {
                lines.push(format!("  Error: invalid data while {}", when));
                lines.push(format!("  Details: {}", details));
                push_location(&mut lines, path, *offset);
            }
            P10Error::DataRequired { when } => {
                lines.push(format!("  Error: more data required while {}", when));
            }
            P10Error::DataEndedUnexpectedly { when, path, offset } => {
                lines.push(format!("  Error: data ended unexpectedly while {}", when));
                push_location(&mut lines, path, *offset);
            }
            P10Error::MaximumExceeded {
                details,
                path,
                offset,
            } => {
                lines.push(format!("  Error: maximum exceeded, {}", details));
                push_location(&mut lines, path, *offset);
            }
            P10Error::InvalidOrder {
                tag,
                previous,
                path,
                offset,
            } => {
                lines.push(format!(
                    "  Error: {} does not follow {} in ascending order",
                    dcmio_core::dictionary::tag_with_name(*tag, None),
                    previous
                ));
                push_location(&mut lines, path, *offset);
            }
            P10Error::UnsupportedTransferSyntax { uid } => {
                lines.push(format!("  Error: unsupported transfer syntax '{}'", uid));
            }
            P10Error::ZlibDataError { when, path, offset } => {
                lines.push(format!("  Error: invalid zlib data while {}", when));
                push_location(&mut lines, path, *offset);
            }
            P10Error::WriteAfterCompletion => {
                lines.push("  Error: write after completion".to_owned());
            }
            P10Error::PartStreamInvalid { details } => {
                lines.push(format!("  Error: invalid part stream, {}", details));
            }
            P10Error::FileError { context, source } => {
                lines.push(format!("  Error: file error {}", context));
                lines.push(format!("  Details: {}", source));
            }
            P10Error::FileStreamError { context, source } => {
                lines.push(format!("  Error: file stream error {}", context));
                lines.push(format!("  Details: {}", source));
            }
        }

        if let Some(tag) = self.path().and_then(DataSetPath::last_data_element) {
            lines.push(format!(
                "  Tag: {}",
                dcmio_core::dictionary::tag_with_name(tag, None)
            ));
        }

        lines
    }

    /// The data set path attached to the error, if any.
    pub fn path(&self) -> Option<&DataSetPath> {
        match self {
            P10Error::DataInvalid { path, .. }
            | P10Error::DataEndedUnexpectedly { path, .. }
            | P10Error::MaximumExceeded { path, .. }
            | P10Error::InvalidOrder { path, .. }
            | P10Error::ZlibDataError { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether the error is fatal. Only [`P10Error::DataRequired`] is not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, P10Error::DataRequired { .. })
    }
}

fn push_location(lines: &mut Vec<String>, path: &DataSetPath, offset: u64) {
    if !path.is_root() {
        lines.push(format!("  Path: {}", path));
    }
    lines.push(format!("  Offset: 0x{:X}", offset));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_includes_task_and_location() {
        let error = P10Error::DataInvalid {
            when: "Reading data element header".into(),
            details: "Unrecognized VR".into(),
            path: DataSetPath::new_with_data_element(Tag(0x0010, 0x0010)),
            offset: 0x160,
        };

        let lines = error.to_lines("reading \"a.dcm\"");
        assert_eq!(lines[0], "DICOM P10 error reading \"a.dcm\"");
        assert!(lines.iter().any(|l| l.contains("Offset: 0x160")));
        assert!(lines.iter().any(|l| l.contains("Patient's Name")));
    }

    #[test]
    fn only_data_required_is_non_fatal() {
        assert!(!P10Error::DataRequired { when: "".into() }.is_fatal());
        assert!(P10Error::WriteAfterCompletion.is_fatal());
    }
}
