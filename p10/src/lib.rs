#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications)]

//! Streaming codec for DICOM P10 byte streams.
//!
//! The reader turns bytes into a stream of [`Part`] events; the writer
//! turns parts back into bytes. In between, transforms filter, insert and
//! print, and [`DataSetBuilder`] materializes a
//! [`DataSet`](dcmio_core::DataSet). All components are plain state
//! machines driven by the caller: feeding input, draining output, and
//! resuming on [`P10Error::DataRequired`].
//!
//! ```no_run
//! use dcmio_p10::{data_set_from_bytes, data_set_to_bytes, WriteConfig};
//!
//! let bytes = std::fs::read("image.dcm")?;
//! let data_set = data_set_from_bytes(&bytes)?;
//! let rewritten = data_set_to_bytes(&data_set, WriteConfig::default())?;
//! # Result::<(), Box<dyn std::error::Error>>::Ok(())
//! ```

pub mod builder;
pub mod byte_stream;
pub mod error;
mod location;
pub mod part;
pub mod reader;
pub mod text;
pub mod transforms;
pub mod writer;

pub use builder::DataSetBuilder;
pub use byte_stream::{ByteStream, ByteStreamError};
pub use error::{P10Error, Result};
pub use part::{data_set_parts, element_parts, Part};
pub use reader::{P10Reader, ReadConfig};
pub use text::{SpecificCharacterSet, TextCodec};
pub use writer::{P10Writer, WriteConfig};

use dcmio_core::dictionary::tags;
use dcmio_core::DataSet;

/// Read a complete DICOM P10 data set from a byte slice.
pub fn data_set_from_bytes(bytes: &[u8]) -> Result<DataSet> {
    data_set_from_bytes_with_config(bytes, ReadConfig::default())
}

/// Read a complete DICOM P10 data set from a byte slice with the given
/// read configuration.
pub fn data_set_from_bytes_with_config(bytes: &[u8], config: ReadConfig) -> Result<DataSet> {
    let mut reader = P10Reader::with_config(config);
    reader.write_bytes(bytes.to_vec(), true)?;

    let mut builder = DataSetBuilder::new();
    while !builder.is_complete() {
        let parts = reader.read_parts()?;
        builder.add_parts(&parts)?;
    }
    builder.final_data_set()
}

/// The part stream encoding a data set as a complete P10 file: a zero
/// preamble, the File Meta Information assembled from the data set's group
/// 0x0002 elements, the main data set, and `End`.
pub fn file_parts(data_set: &DataSet) -> Vec<Part> {
    let mut fmi = DataSet::new();
    let mut main = DataSet::new();
    for (tag, value) in data_set {
        if tag.group() == 0x0002 {
            if *tag != tags::FILE_META_INFORMATION_GROUP_LENGTH {
                fmi.insert(*tag, value.clone());
            }
        } else {
            main.insert(*tag, value.clone());
        }
    }

    let mut parts = Vec::with_capacity(main.len() * 2 + 3);
    parts.push(Part::FilePreambleAndDicmPrefix {
        preamble: Box::new([0u8; 128]),
    });
    parts.push(Part::FileMetaInformation { data_set: fmi });
    parts.extend(data_set_parts(&main));
    parts.push(Part::End);
    parts
}

/// Encode a data set as complete DICOM P10 bytes. The transfer syntax is
/// taken from the data set's *(0002,0010)* element, defaulting to Implicit
/// VR Little Endian.
pub fn data_set_to_bytes(data_set: &DataSet, config: WriteConfig) -> Result<Vec<u8>> {
    let mut writer = P10Writer::with_config(config);
    writer.write_parts(&file_parts(data_set))?;
    Ok(writer.pending_bytes())
}
