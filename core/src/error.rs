//! Errors of the core data model.

use crate::dataset::path::DataSetPath;
use crate::tag::Tag;
use crate::vr::VR;
use snafu::Snafu;

/// An error raised by the value model: a value failed validation on
/// construction, or an accessor was asked for something the value does not
/// hold. Codec-level errors wrap this type with stream context.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum DataError {
    /// The bytes or text do not form a legal value for the VR.
    #[snafu(display("Invalid value for VR {}: {}", vr, details))]
    ValueInvalid { vr: VR, details: String },

    /// The value length is not legal for the VR.
    #[snafu(display("Invalid length {} for VR {}: {}", length, vr, details))]
    ValueLengthInvalid {
        vr: VR,
        length: usize,
        details: String,
    },

    /// A requested tag has no data element in the data set.
    #[snafu(display("Tag {} not present in data set", tag))]
    TagNotPresent { tag: Tag },

    /// The value does not hold data of the requested type.
    #[snafu(display("Value is not of the requested type: {}", details))]
    ValueTypeMismatch { details: String },

    /// One value was requested but the data element holds several.
    #[snafu(display("Value has multiplicity {}, expected exactly one", count))]
    MultiplicityMismatch { count: usize },
}

impl DataError {
    /// Attach a data set path to the error's rendering, for reporting
    /// failures that occur while walking nested data sets.
    pub fn to_lines_at(&self, path: &DataSetPath) -> Vec<String> {
        let mut lines = vec![format!("DICOM data error: {}", self)];
        if !path.is_root() {
            lines.push(format!("  Path: {}", path));
        }
        lines
    }
}

/// Result alias for operations of the core data model.
pub type Result<T, E = DataError> = std::result::Result<T, E>;
