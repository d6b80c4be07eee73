//! The data element value model.
//!
//! A [`DataElementValue`] owns a validated representation of one data
//! element's value: a little-endian byte blob for primitive VRs, a list of
//! nested data sets for sequences, or a list of fragments for encapsulated
//! pixel data. Checked constructors reject illegal values at the point of
//! creation; accessors parse the stored bytes on demand.

use std::fmt;

use byteordered::byteorder::{ByteOrder, LittleEndian};
use chrono::{NaiveDate, NaiveTime};
use num_traits::NumCast;
use smallvec::SmallVec;
use snafu::OptionExt;

use crate::dataset::DataSet;
use crate::error::{
    DataError, MultiplicityMismatchSnafu, Result, ValueTypeMismatchSnafu,
};
use crate::tag::Tag;
use crate::vr::{LengthSize, VR};

pub mod person_name;

pub use person_name::{PersonNameComponents, StructuredPersonName};

/// The value of a single data element.
///
/// Primitive values store the exact on-wire little-endian encoding: UTF-8
/// for text VRs, IEEE-754 for float VRs, two's complement for integer VRs.
#[derive(Debug, Clone, PartialEq)]
pub enum DataElementValue {
    /// A primitive value held as validated bytes.
    Binary { vr: VR, bytes: Vec<u8> },

    /// The value of one of the lookup table descriptor data elements, whose
    /// second 16-bit word is interpreted as signed even when the VR is US.
    LookupTableDescriptor { vr: VR, bytes: Vec<u8> },

    /// A sequence of nested data sets.
    Sequence { items: Vec<DataSet> },

    /// Encapsulated pixel data: a list of opaque fragments. The first
    /// fragment is the Basic Offset Table and may be empty.
    PixelSequence { vr: VR, fragments: Vec<Vec<u8>> },
}

/// The three lookup table descriptor tags whose second word is signed.
const LOOKUP_TABLE_DESCRIPTOR_TAGS: [Tag; 4] = [
    Tag(0x0028, 0x1101),
    Tag(0x0028, 0x1102),
    Tag(0x0028, 0x1103),
    Tag(0x0028, 0x3002),
];

/// Whether the tag names a lookup table descriptor data element.
pub fn is_lookup_table_descriptor_tag(tag: Tag) -> bool {
    LOOKUP_TABLE_DESCRIPTOR_TAGS.contains(&tag)
}

impl DataElementValue {
    /// Create a primitive value, validating the bytes against the VR.
    ///
    /// String values of odd length are padded to even length with the VR's
    /// padding byte before validation.
    pub fn new_binary(vr: VR, mut bytes: Vec<u8>) -> Result<DataElementValue> {
        if bytes.len() % 2 == 1 && vr.is_string() {
            bytes.push(vr.padding_byte());
        }
        validate_binary(vr, &bytes)?;
        Ok(DataElementValue::Binary { vr, bytes })
    }

    /// Create a primitive value from bytes already known to be structurally
    /// valid, e.g. taken from the wire. No validation is performed.
    pub fn new_binary_unchecked(vr: VR, bytes: Vec<u8>) -> DataElementValue {
        DataElementValue::Binary { vr, bytes }
    }

    /// Create a lookup table descriptor value. The VR must be US or SS and
    /// the value must be exactly three 16-bit words.
    pub fn new_lookup_table_descriptor(vr: VR, bytes: Vec<u8>) -> Result<DataElementValue> {
        if vr != VR::US && vr != VR::SS {
            return Err(DataError::ValueInvalid {
                vr,
                details: "Lookup table descriptors must have a VR of US or SS".into(),
            });
        }
        if bytes.len() != 6 {
            return Err(DataError::ValueLengthInvalid {
                vr,
                length: bytes.len(),
                details: "Lookup table descriptors are exactly three 16-bit words".into(),
            });
        }
        Ok(DataElementValue::LookupTableDescriptor { vr, bytes })
    }

    /// As [`DataElementValue::new_lookup_table_descriptor`], without
    /// validation.
    pub fn new_lookup_table_descriptor_unchecked(vr: VR, bytes: Vec<u8>) -> DataElementValue {
        DataElementValue::LookupTableDescriptor { vr, bytes }
    }

    /// Create a sequence value from its items.
    pub fn new_sequence(items: Vec<DataSet>) -> DataElementValue {
        DataElementValue::Sequence { items }
    }

    /// Create an encapsulated pixel data value. The VR must be OB or OW.
    pub fn new_pixel_sequence(vr: VR, fragments: Vec<Vec<u8>>) -> Result<DataElementValue> {
        if vr != VR::OB && vr != VR::OW {
            return Err(DataError::ValueInvalid {
                vr,
                details: "Encapsulated pixel data must have a VR of OB or OW".into(),
            });
        }
        Ok(DataElementValue::PixelSequence { vr, fragments })
    }

    /// Create a string value. Multiple strings are joined with backslashes
    /// for multi-valued VRs; passing several strings for a single-valued VR
    /// is an error.
    pub fn new_string(vr: VR, values: &[&str]) -> Result<DataElementValue> {
        if !vr.is_string() {
            return Err(DataError::ValueInvalid {
                vr,
                details: "Not a string VR".into(),
            });
        }
        if values.len() > 1 && !vr.is_multi_valued_string() {
            return Err(DataError::MultiplicityMismatch {
                count: values.len(),
            });
        }
        let joined = values.join("\\");
        DataElementValue::new_binary(vr, joined.into_bytes())
    }

    /// Create an integer value for one of the integer VRs, including the
    /// string-encoded IS.
    pub fn new_ints(vr: VR, values: &[i64]) -> Result<DataElementValue> {
        let bytes = match vr {
            VR::IS => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                return DataElementValue::new_string(VR::IS, &rendered.iter().map(String::as_str).collect::<Vec<_>>());
            }
            VR::SS => encode_ints(values, 2, <i64 as From<i16>>::from(i16::MIN), <i64 as From<i16>>::from(i16::MAX), vr)?,
            VR::US => encode_ints(values, 2, 0, <i64 as From<u16>>::from(u16::MAX), vr)?,
            VR::SL => encode_ints(values, 4, <i64 as From<i32>>::from(i32::MIN), <i64 as From<i32>>::from(i32::MAX), vr)?,
            VR::UL => encode_ints(values, 4, 0, <i64 as From<u32>>::from(u32::MAX), vr)?,
            VR::SV => {
                let mut bytes = Vec::with_capacity(values.len() * 8);
                for v in values {
                    bytes.extend_from_slice(&v.to_le_bytes());
                }
                bytes
            }
            VR::UV => {
                let mut bytes = Vec::with_capacity(values.len() * 8);
                for v in values {
                    if *v < 0 {
                        return Err(DataError::ValueInvalid {
                            vr,
                            details: format!("Value {} is out of range", v),
                        });
                    }
                    bytes.extend_from_slice(&(*v as u64).to_le_bytes());
                }
                bytes
            }
            _ => {
                return Err(DataError::ValueInvalid {
                    vr,
                    details: "Not an integer VR".into(),
                })
            }
        };
        Ok(DataElementValue::Binary { vr, bytes })
    }

    /// Create a floating point value for one of the float VRs, including the
    /// string-encoded DS.
    pub fn new_floats(vr: VR, values: &[f64]) -> Result<DataElementValue> {
        match vr {
            VR::DS => {
                let rendered: Vec<String> = values.iter().map(|v| format_ds(*v)).collect();
                DataElementValue::new_string(VR::DS, &rendered.iter().map(String::as_str).collect::<Vec<_>>())
            }
            VR::FL => {
                let mut bytes = Vec::with_capacity(values.len() * 4);
                for v in values {
                    bytes.extend_from_slice(&(*v as f32).to_le_bytes());
                }
                Ok(DataElementValue::Binary { vr, bytes })
            }
            VR::FD => {
                let mut bytes = Vec::with_capacity(values.len() * 8);
                for v in values {
                    bytes.extend_from_slice(&v.to_le_bytes());
                }
                Ok(DataElementValue::Binary { vr, bytes })
            }
            _ => Err(DataError::ValueInvalid {
                vr,
                details: "Not a float VR".into(),
            }),
        }
    }

    /// Create an AT value referencing the given tags.
    pub fn new_attribute_tags(tags: &[Tag]) -> DataElementValue {
        let mut bytes = Vec::with_capacity(tags.len() * 4);
        for tag in tags {
            bytes.extend_from_slice(&tag.group().to_le_bytes());
            bytes.extend_from_slice(&tag.element().to_le_bytes());
        }
        DataElementValue::Binary { vr: VR::AT, bytes }
    }

    /// The value representation of this value. Sequences report SQ.
    pub fn vr(&self) -> VR {
        match self {
            DataElementValue::Binary { vr, .. } => *vr,
            DataElementValue::LookupTableDescriptor { vr, .. } => *vr,
            DataElementValue::Sequence { .. } => VR::SQ,
            DataElementValue::PixelSequence { vr, .. } => *vr,
        }
    }

    /// The raw bytes of a primitive value.
    pub fn bytes(&self) -> Result<&[u8]> {
        match self {
            DataElementValue::Binary { bytes, .. }
            | DataElementValue::LookupTableDescriptor { bytes, .. } => Ok(bytes),
            _ => ValueTypeMismatchSnafu {
                details: "Value is not primitive",
            }
            .fail(),
        }
    }

    /// The items of a sequence value.
    pub fn sequence_items(&self) -> Result<&[DataSet]> {
        match self {
            DataElementValue::Sequence { items } => Ok(items),
            _ => ValueTypeMismatchSnafu {
                details: "Value is not a sequence",
            }
            .fail(),
        }
    }

    /// The fragments of an encapsulated pixel data value.
    pub fn fragments(&self) -> Result<&[Vec<u8>]> {
        match self {
            DataElementValue::PixelSequence { fragments, .. } => Ok(fragments),
            _ => ValueTypeMismatchSnafu {
                details: "Value is not encapsulated pixel data",
            }
            .fail(),
        }
    }

    /// All string values of a text element, with trailing padding trimmed.
    /// Multi-valued VRs are split on backslashes.
    pub fn get_strings(&self) -> Result<SmallVec<[String; 1]>> {
        let vr = self.vr();
        if !vr.is_string() {
            return ValueTypeMismatchSnafu {
                details: format!("VR {} is not a string VR", vr),
            }
            .fail();
        }
        let bytes = self.bytes()?;
        let text = std::str::from_utf8(bytes).map_err(|_| DataError::ValueInvalid {
            vr,
            details: "String value is not valid UTF-8".into(),
        })?;
        let trim: &[char] = if vr == VR::UI { &['\0'] } else { &[' '] };
        let values = if vr.is_multi_valued_string() {
            text.split('\\')
                .map(|s| s.trim_end_matches(trim).to_owned())
                .collect()
        } else {
            let mut one = SmallVec::new();
            one.push(text.trim_end_matches(trim).to_owned());
            one
        };
        Ok(values)
    }

    /// The single string value of a text element. Errors when the element
    /// holds more than one value.
    pub fn get_string(&self) -> Result<String> {
        let mut values = self.get_strings()?;
        if values.len() != 1 {
            return MultiplicityMismatchSnafu {
                count: values.len(),
            }
            .fail();
        }
        Ok(values.remove(0))
    }

    /// All integer values of this element, converted to the requested
    /// integer type. Covers the binary integer VRs and IS.
    pub fn get_ints<T: NumCast>(&self) -> Result<SmallVec<[T; 1]>> {
        let wide = self.get_big_ints()?;
        let vr = self.vr();
        wide.into_iter()
            .map(|v| {
                NumCast::from(v).context(ValueTypeMismatchSnafu {
                    details: format!("Integer {} of VR {} does not fit the requested type", v, vr),
                })
            })
            .collect()
    }

    /// The single integer value of this element.
    pub fn get_int<T: NumCast>(&self) -> Result<T> {
        let mut values = self.get_ints()?;
        if values.len() != 1 {
            return MultiplicityMismatchSnafu {
                count: values.len(),
            }
            .fail();
        }
        Ok(values.remove(0))
    }

    /// All integer values of this element, decoded at full width. SV and UV
    /// values are decoded through 128-bit arithmetic so no precision is lost.
    pub fn get_big_ints(&self) -> Result<SmallVec<[i128; 1]>> {
        let vr = self.vr();
        match vr {
            VR::IS => {
                let strings = self.get_strings()?;
                strings
                    .iter()
                    .map(|s| {
                        s.trim().parse::<i128>().map_err(|_| DataError::ValueInvalid {
                            vr,
                            details: format!("Invalid integer string {:?}", s),
                        })
                    })
                    .collect()
            }
            VR::SS => Ok(decode_units(self.bytes()?, 2, |b| <i128 as From<i16>>::from(LittleEndian::read_i16(b)))),
            VR::US => {
                // The second word of a lookup table descriptor is signed
                // even under US
                if let DataElementValue::LookupTableDescriptor { bytes, .. } = self {
                    let mut words = decode_units(bytes, 2, |b| <i128 as From<u16>>::from(LittleEndian::read_u16(b)));
                    words[1] = <i128 as From<i16>>::from(LittleEndian::read_i16(&bytes[2..4]));
                    return Ok(words);
                }
                Ok(decode_units(self.bytes()?, 2, |b| <i128 as From<u16>>::from(LittleEndian::read_u16(b))))
            }
            VR::SL => Ok(decode_units(self.bytes()?, 4, |b| <i128 as From<i32>>::from(LittleEndian::read_i32(b)))),
            VR::UL => Ok(decode_units(self.bytes()?, 4, |b| <i128 as From<u32>>::from(LittleEndian::read_u32(b)))),
            VR::SV => Ok(decode_units(self.bytes()?, 8, |b| <i128 as From<i64>>::from(LittleEndian::read_i64(b)))),
            VR::UV => Ok(decode_units(self.bytes()?, 8, |b| <i128 as From<u64>>::from(LittleEndian::read_u64(b)))),
            _ => ValueTypeMismatchSnafu {
                details: format!("VR {} is not an integer VR", vr),
            }
            .fail(),
        }
    }

    /// All floating point values of this element. Covers FL, FD, OF, OD
    /// and the string-encoded DS.
    pub fn get_floats(&self) -> Result<SmallVec<[f64; 1]>> {
        let vr = self.vr();
        match vr {
            VR::DS => {
                let strings = self.get_strings()?;
                strings
                    .iter()
                    .map(|s| {
                        s.trim().parse::<f64>().map_err(|_| DataError::ValueInvalid {
                            vr,
                            details: format!("Invalid decimal string {:?}", s),
                        })
                    })
                    .collect()
            }
            VR::FL | VR::OF => Ok(decode_units(self.bytes()?, 4, |b| {
                <f64 as From<f32>>::from(LittleEndian::read_f32(b))
            })),
            VR::FD | VR::OD => Ok(decode_units(self.bytes()?, 8, LittleEndian::read_f64)),
            _ => ValueTypeMismatchSnafu {
                details: format!("VR {} is not a float VR", vr),
            }
            .fail(),
        }
    }

    /// The single floating point value of this element.
    pub fn get_float(&self) -> Result<f64> {
        let mut values = self.get_floats()?;
        if values.len() != 1 {
            return MultiplicityMismatchSnafu {
                count: values.len(),
            }
            .fail();
        }
        Ok(values.remove(0))
    }

    /// The tags referenced by an AT value.
    pub fn get_attribute_tags(&self) -> Result<Vec<Tag>> {
        if self.vr() != VR::AT {
            return ValueTypeMismatchSnafu {
                details: format!("VR {} is not AT", self.vr()),
            }
            .fail();
        }
        let bytes = self.bytes()?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| {
                Tag(
                    LittleEndian::read_u16(&c[0..2]),
                    LittleEndian::read_u16(&c[2..4]),
                )
            })
            .collect())
    }

    /// The structured person names of a PN value.
    pub fn get_person_names(&self) -> Result<Vec<StructuredPersonName>> {
        let vr = self.vr();
        if vr != VR::PN {
            return ValueTypeMismatchSnafu {
                details: format!("VR {} is not PN", vr),
            }
            .fail();
        }
        self.get_strings()?
            .iter()
            .map(|s| {
                StructuredPersonName::parse(s).map_err(|details| DataError::ValueInvalid {
                    vr,
                    details,
                })
            })
            .collect()
    }

    /// The single DA value parsed as a calendar date.
    pub fn get_date(&self) -> Result<NaiveDate> {
        let vr = self.vr();
        if vr != VR::DA {
            return ValueTypeMismatchSnafu {
                details: format!("VR {} is not DA", vr),
            }
            .fail();
        }
        let s = self.get_string()?;
        NaiveDate::parse_from_str(s.trim(), "%Y%m%d").map_err(|_| DataError::ValueInvalid {
            vr,
            details: format!("Invalid date {:?}", s),
        })
    }

    /// The single TM value parsed as a time of day. Fractional seconds and
    /// the abbreviated `HHMM`/`HH` forms are accepted.
    pub fn get_time(&self) -> Result<NaiveTime> {
        let vr = self.vr();
        if vr != VR::TM {
            return ValueTypeMismatchSnafu {
                details: format!("VR {} is not TM", vr),
            }
            .fail();
        }
        let s = self.get_string()?;
        let s = s.trim();
        for format in ["%H%M%S%.f", "%H%M%S", "%H%M", "%H"] {
            if let Ok(time) = NaiveTime::parse_from_str(s, format) {
                return Ok(time);
            }
        }
        Err(DataError::ValueInvalid {
            vr,
            details: format!("Invalid time {:?}", s),
        })
    }

    /// The three words of a lookup table descriptor: entry count, first
    /// input value mapped (signed, per the standard's interpretation of the
    /// second word), and bits per entry.
    pub fn get_lookup_table_descriptor(&self) -> Result<(u16, i16, u16)> {
        match self {
            DataElementValue::LookupTableDescriptor { bytes, .. } => Ok((
                LittleEndian::read_u16(&bytes[0..2]),
                LittleEndian::read_i16(&bytes[2..4]),
                LittleEndian::read_u16(&bytes[4..6]),
            )),
            _ => ValueTypeMismatchSnafu {
                details: "Value is not a lookup table descriptor",
            }
            .fail(),
        }
    }

    /// The number of individual values held by this element.
    pub fn multiplicity(&self) -> usize {
        match self {
            DataElementValue::Binary { vr, bytes } => {
                if bytes.is_empty() {
                    0
                } else if vr.is_multi_valued_string() {
                    bytes.split(|b| *b == b'\\').count()
                } else if vr.is_string() {
                    1
                } else {
                    let unit = match vr {
                        VR::AT => 4,
                        _ => vr.unit_size(),
                    };
                    bytes.len() / unit
                }
            }
            DataElementValue::LookupTableDescriptor { .. } => 3,
            DataElementValue::Sequence { items } => items.len(),
            DataElementValue::PixelSequence { fragments, .. } => fragments.len(),
        }
    }

    /// An estimate of the in-memory size of this value in bytes, counting
    /// nested data sets recursively.
    pub fn total_byte_size(&self) -> u64 {
        match self {
            DataElementValue::Binary { bytes, .. }
            | DataElementValue::LookupTableDescriptor { bytes, .. } => bytes.len() as u64,
            DataElementValue::Sequence { items } => {
                items.iter().map(DataSet::total_byte_size).sum()
            }
            DataElementValue::PixelSequence { fragments, .. } => {
                fragments.iter().map(|f| f.len() as u64).sum()
            }
        }
    }
}

impl fmt::Display for DataElementValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataElementValue::Binary { vr, bytes } => {
                write!(f, "{} value of {} bytes", vr, bytes.len())
            }
            DataElementValue::LookupTableDescriptor { vr, .. } => {
                write!(f, "{} lookup table descriptor", vr)
            }
            DataElementValue::Sequence { items } => {
                write!(f, "sequence of {} items", items.len())
            }
            DataElementValue::PixelSequence { fragments, .. } => {
                write!(f, "pixel data with {} fragments", fragments.len())
            }
        }
    }
}

fn decode_units<T, F>(bytes: &[u8], unit: usize, decode: F) -> SmallVec<[T; 1]>
where
    F: Fn(&[u8]) -> T,
{
    bytes.chunks_exact(unit).map(|c| decode(c)).collect()
}

fn encode_ints(values: &[i64], unit: usize, min: i64, max: i64, vr: VR) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(values.len() * unit);
    for v in values {
        if *v < min || *v > max {
            return Err(DataError::ValueInvalid {
                vr,
                details: format!("Value {} is out of range", v),
            });
        }
        bytes.extend_from_slice(&v.to_le_bytes()[..unit]);
    }
    Ok(bytes)
}

/// Render a decimal value within DS's 16-character limit.
fn format_ds(value: f64) -> String {
    let s = value.to_string();
    if s.len() <= 16 {
        s
    } else {
        format!("{:.10e}", value)
    }
}

/// Maximum byte lengths per value for the string VRs that define one.
fn max_string_value_length(vr: VR) -> Option<usize> {
    match vr {
        VR::AE | VR::CS | VR::DS | VR::SH | VR::TM => Some(16),
        VR::AS => Some(4),
        VR::DA => Some(8),
        VR::DT => Some(26),
        VR::IS => Some(12),
        VR::LO => Some(64),
        VR::UI => Some(64),
        _ => None,
    }
}

fn validate_binary(vr: VR, bytes: &[u8]) -> Result<()> {
    if bytes.len() % 2 == 1 {
        return Err(DataError::ValueLengthInvalid {
            vr,
            length: bytes.len(),
            details: "Values must have even length".into(),
        });
    }

    if let LengthSize::U16 = vr.length_size() {
        if bytes.len() > 0xFFFF {
            return Err(DataError::ValueLengthInvalid {
                vr,
                length: bytes.len(),
                details: "Value exceeds the 16-bit length field of its VR".into(),
            });
        }
    }

    if vr.is_string() {
        let text = std::str::from_utf8(bytes).map_err(|_| DataError::ValueInvalid {
            vr,
            details: "String value is not valid UTF-8".into(),
        })?;
        let values: Vec<&str> = if vr.is_multi_valued_string() {
            text.split('\\').collect()
        } else {
            vec![text]
        };
        for value in values {
            validate_string_value(vr, value)?;
        }
        return Ok(());
    }

    let unit = match vr {
        VR::AT => 4,
        other => other.unit_size(),
    };
    if unit > 1 && bytes.len() % unit != 0 {
        return Err(DataError::ValueLengthInvalid {
            vr,
            length: bytes.len(),
            details: format!("Length is not a multiple of {}", unit),
        });
    }

    Ok(())
}

fn validate_string_value(vr: VR, value: &str) -> Result<()> {
    if let Some(max) = max_string_value_length(vr) {
        // the padding applied to reach even length may push a value one
        // byte past its nominal maximum
        if value.len() > max && value.trim_end_matches([' ', '\0']).len() > max {
            return Err(DataError::ValueLengthInvalid {
                vr,
                length: value.len(),
                details: format!("Value exceeds {} characters", max),
            });
        }
    }

    let ok = match vr {
        VR::AS => {
            let v = value.trim_end().as_bytes();
            v.is_empty()
                || (v.len() == 4
                    && v[..3].iter().all(u8::is_ascii_digit)
                    && matches!(v[3], b'D' | b'W' | b'M' | b'Y'))
        }
        VR::CS => value
            .bytes()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == b' ' || c == b'_'),
        VR::DA => value.bytes().all(|c| c.is_ascii_digit() || c == b' '),
        VR::DS => {
            value
                .bytes()
                .all(|c| c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.' | b'e' | b'E' | b' '))
        }
        VR::DT => value
            .bytes()
            .all(|c| c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.' | b' ')),
        VR::IS => {
            let trimmed = value.trim();
            value
                .bytes()
                .all(|c| c.is_ascii_digit() || matches!(c, b'+' | b'-' | b' '))
                && (trimmed.is_empty()
                    || trimmed
                        .parse::<i64>()
                        .map(|v| <i64 as From<i32>>::from(i32::MIN) <= v && v <= <i64 as From<i32>>::from(i32::MAX))
                        .unwrap_or(false))
        }
        VR::TM => value
            .bytes()
            .all(|c| c.is_ascii_digit() || c == b'.' || c == b' '),
        VR::UI => value
            .trim_end_matches('\0')
            .bytes()
            .all(|c| c.is_ascii_digit() || c == b'.'),
        // The remaining string VRs admit any character of the repertoire
        // other than control codes; non-UTF-8 data was already rejected.
        _ => true,
    };

    if ok {
        Ok(())
    } else {
        Err(DataError::ValueInvalid {
            vr,
            details: format!("String value {:?} has characters not permitted by {}", value, vr),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_length_strings_are_padded() {
        let value = DataElementValue::new_binary(VR::SH, b"ABC".to_vec()).unwrap();
        assert_eq!(value.bytes().unwrap(), b"ABC ");

        let value = DataElementValue::new_binary(VR::UI, b"1.2.840.10008.1.2".to_vec()).unwrap();
        assert_eq!(value.bytes().unwrap(), b"1.2.840.10008.1.2\0");
        assert_eq!(value.get_string().unwrap(), "1.2.840.10008.1.2");
    }

    #[test]
    fn string_multiplicity() {
        let value = DataElementValue::new_string(VR::CS, &["ORIGINAL", "PRIMARY"]).unwrap();
        assert_eq!(value.bytes().unwrap(), b"ORIGINAL\\PRIMARY");
        assert_eq!(value.multiplicity(), 2);
        assert_eq!(
            value.get_strings().unwrap().to_vec(),
            vec!["ORIGINAL".to_owned(), "PRIMARY".to_owned()]
        );
        assert!(value.get_string().is_err());
        assert!(DataElementValue::new_string(VR::ST, &["a", "b"]).is_err());
    }

    #[test]
    fn character_class_validation() {
        assert!(DataElementValue::new_binary(VR::CS, b"lowercase ".to_vec()).is_err());
        assert!(DataElementValue::new_binary(VR::UI, b"1.2.X3".to_vec()).is_err());
        assert!(DataElementValue::new_binary(VR::AS, b"042Y".to_vec()).is_ok());
        assert!(DataElementValue::new_binary(VR::AS, b"42Y ".to_vec()).is_err());
        assert!(DataElementValue::new_binary(VR::IS, b"123456789012345".to_vec()).is_err());
    }

    #[test]
    fn integer_string_parsing_trims_whitespace() {
        let value = DataElementValue::new_binary(VR::IS, b"  12  ".to_vec()).unwrap();
        assert_eq!(value.get_int::<i32>().unwrap(), 12);
    }

    #[test]
    fn integer_range_validation() {
        assert!(DataElementValue::new_ints(VR::US, &[0x1_0000]).is_err());
        assert!(DataElementValue::new_ints(VR::SS, &[-40000]).is_err());
        let value = DataElementValue::new_ints(VR::US, &[1, 2]).unwrap();
        assert_eq!(value.bytes().unwrap(), &[1, 0, 2, 0]);
    }

    #[test]
    fn big_integer_precision() {
        let huge = 0x7FFF_FFFF_FFFF_FFFFu64;
        let mut bytes = huge.to_le_bytes().to_vec();
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        let value = DataElementValue::new_binary(VR::UV, bytes).unwrap();
        let ints = value.get_big_ints().unwrap();
        assert_eq!(ints[0], <i128 as From<u64>>::from(huge));
        assert_eq!(ints[1], <i128 as From<u64>>::from(u64::MAX));
        assert!(value.get_int::<i64>().is_err());
    }

    #[test]
    fn float_decoding() {
        let value = DataElementValue::new_floats(VR::FL, &[0.5, -2.0]).unwrap();
        let floats = value.get_floats().unwrap();
        assert_eq!(floats.to_vec(), vec![0.5, -2.0]);

        let value = DataElementValue::new_binary(VR::DS, b"1.5\\-0.25 ".to_vec()).unwrap();
        assert_eq!(value.get_floats().unwrap().to_vec(), vec![1.5, -0.25]);
    }

    #[test]
    fn attribute_tag_round_trip() {
        let tags = vec![Tag(0x0010, 0x0010), Tag(0x7FE0, 0x0010)];
        let value = DataElementValue::new_attribute_tags(&tags);
        assert_eq!(value.get_attribute_tags().unwrap(), tags);
    }

    #[test]
    fn lookup_table_descriptor_signed_second_word() {
        // 256 entries, first input value -1024, 16 bits per entry
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&256u16.to_le_bytes());
        bytes.extend_from_slice(&(-1024i16).to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());

        let value = DataElementValue::new_lookup_table_descriptor(VR::US, bytes).unwrap();
        assert_eq!(value.get_lookup_table_descriptor().unwrap(), (256, -1024, 16));
        let ints = value.get_big_ints().unwrap();
        assert_eq!(ints.to_vec(), vec![256, -1024, 16]);
    }

    #[test]
    fn date_and_time_accessors() {
        let value = DataElementValue::new_binary(VR::DA, b"20240229".to_vec()).unwrap();
        assert_eq!(
            value.get_date().unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );

        let value = DataElementValue::new_binary(VR::TM, b"115500.25 ".to_vec()).unwrap();
        assert_eq!(
            value.get_time().unwrap(),
            NaiveTime::from_hms_milli_opt(11, 55, 0, 250).unwrap()
        );
    }

    #[test]
    fn length_parity_enforced_for_binary() {
        assert!(DataElementValue::new_binary(VR::US, vec![0x01]).is_err());
        assert!(DataElementValue::new_binary(VR::FD, vec![0; 12]).is_err());
        assert!(DataElementValue::new_binary(VR::FD, vec![0; 16]).is_ok());
    }
}
