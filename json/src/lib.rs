#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications)]

//! DICOM JSON serialization to and from dcmio data sets, per PS3.18
//! Annex F.
//!
//! Serialization is streaming: [`JsonSerializer`] consumes
//! [`Part`](dcmio_p10::Part)s and appends JSON fragments as they complete,
//! so a data set never needs to be materialized to convert it.
//! Deserialization parses a JSON document back into a
//! [`DataSet`](dcmio_core::DataSet) by the inverse rules.

mod de;
mod ser;

pub use de::data_set_from_json;
pub use ser::{data_set_to_json, JsonSerializer};

use dcmio_core::DataSetPath;
use snafu::Snafu;

/// Configuration for DICOM JSON serialization.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JsonConfig {
    /// Store encapsulated pixel data inline: the exact on-wire
    /// concatenation of its `(FFFE,E000)` fragment items becomes a single
    /// `InlineBinary`. Without this, encapsulated pixel data fails to
    /// serialize.
    pub store_encapsulated_pixel_data: bool,

    /// Pretty-print the JSON output.
    pub pretty_print: bool,
}

/// An error raised while serializing to DICOM JSON.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum JsonSerializeError {
    /// The data has no DICOM JSON representation.
    #[snafu(display("Data cannot be serialized to DICOM JSON: {}", details))]
    DataInvalid { details: String, path: DataSetPath },

    /// The part stream itself was malformed.
    #[snafu(display("Invalid part stream: {}", details))]
    PartStreamInvalid { details: String },
}

/// An error raised while reading DICOM JSON.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum JsonDeserializeError {
    /// The input is not valid JSON at all.
    #[snafu(display("Input is not valid JSON: {}", source))]
    JsonInvalid { source: serde_json::Error },

    /// The JSON is structurally valid but does not encode a DICOM data
    /// set.
    #[snafu(display("Invalid DICOM JSON at {}: {}", path, details))]
    JsonDataInvalid { details: String, path: DataSetPath },
}
