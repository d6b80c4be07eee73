#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications)]

//! This is the core crate of the dcmio project, containing the concepts and
//! data structures shared by every layer of the toolkit: attribute tags,
//! value representations, validated data element values, ordered data sets,
//! data set paths, the standard attribute dictionary, and the transfer syntax
//! descriptors.
//!
//! No byte-level encoding or decoding lives here; that is the role of the
//! `dcmio-p10` crate.

pub mod dataset;
pub mod dictionary;
pub mod error;
pub mod tag;
pub mod transfer_syntax;
pub mod value;
pub mod vr;

pub use dataset::path::{DataSetPath, DataSetPathEntry};
pub use dataset::DataSet;
pub use error::{DataError, Result};
pub use tag::Tag;
pub use transfer_syntax::TransferSyntax;
pub use value::DataElementValue;
pub use vr::{ValueMultiplicity, VR};
