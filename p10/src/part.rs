//! Interpretation of DICOM P10 streams as sequences of parts.
//!
//! A [`Part`] is one event of the reader/writer alphabet: the preamble, the
//! File Meta Information, data element headers and value chunks, sequence
//! and item boundaries, encapsulated pixel data fragments, and the end of
//! the stream.

use std::fmt;

use dcmio_core::{DataElementValue, DataSet, Tag, VR};

/// A part of a DICOM P10 stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// The 128-byte File Preamble and the `DICM` prefix that follows it.
    FilePreambleAndDicmPrefix { preamble: Box<[u8; 128]> },

    /// The File Meta Information group, fully materialized.
    FileMetaInformation { data_set: DataSet },

    /// The start of a primitive data element.
    DataElementHeader { tag: Tag, vr: VR, length: u32 },

    /// One chunk of a primitive data element's value. The final chunk
    /// carries `bytes_remaining == 0`.
    DataElementValueBytes {
        vr: VR,
        data: Vec<u8>,
        bytes_remaining: u32,
    },

    /// The start of a sequence, or of an encapsulated pixel data element
    /// (distinguished by its VR of OB or OW).
    SequenceStart { tag: Tag, vr: VR },

    /// The end of the current sequence or encapsulated pixel data element.
    SequenceDelimiter,

    /// The start of an item in the current sequence.
    SequenceItemStart,

    /// The end of the current sequence item.
    SequenceItemDelimiter,

    /// The header of one encapsulated pixel data fragment. Fragment bytes
    /// follow as value-bytes parts.
    PixelDataItem { length: u32 },

    /// The end of the stream of parts.
    End,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Part::FilePreambleAndDicmPrefix { .. } => f.write_str("FilePreambleAndDicmPrefix"),
            Part::FileMetaInformation { data_set } => {
                write!(f, "FileMetaInformation({} elements)", data_set.len())
            }
            Part::DataElementHeader { tag, vr, length } => {
                write!(f, "DataElementHeader({}, {}, {} bytes)", tag, vr, length)
            }
            Part::DataElementValueBytes {
                data,
                bytes_remaining,
                ..
            } => write!(
                f,
                "DataElementValueBytes({} bytes, {} remaining)",
                data.len(),
                bytes_remaining
            ),
            Part::SequenceStart { tag, vr } => write!(f, "SequenceStart({}, {})", tag, vr),
            Part::SequenceDelimiter => f.write_str("SequenceDelimiter"),
            Part::SequenceItemStart => f.write_str("SequenceItemStart"),
            Part::SequenceItemDelimiter => f.write_str("SequenceItemDelimiter"),
            Part::PixelDataItem { length } => write!(f, "PixelDataItem({} bytes)", length),
            Part::End => f.write_str("End"),
        }
    }
}

impl Part {
    /// Whether this part opens a new data element at the level of its data
    /// set, i.e. is a header or a sequence start.
    pub fn is_element_start(&self) -> bool {
        matches!(
            self,
            Part::DataElementHeader { .. } | Part::SequenceStart { .. }
        )
    }
}

/// Swap value bytes between little endian and big endian in place,
/// according to the VR's unit size. Chunk boundaries are kept at multiples
/// of 8 by the reader and writer, so units are never split across chunks.
pub(crate) fn swap_value_endianness(vr: VR, data: &mut [u8]) {
    let unit = vr.unit_size();
    if unit > 1 {
        for chunk in data.chunks_exact_mut(unit) {
            chunk.reverse();
        }
    }
}

/// Decompose a data set into the part stream that encodes it: headers and
/// value bytes for primitive elements, sequence and item events for nested
/// data sets, pixel data items for encapsulated fragments.
///
/// The produced stream carries no preamble, File Meta Information or `End`;
/// callers wanting a complete P10 stream wrap the output accordingly.
pub fn data_set_parts(data_set: &DataSet) -> Vec<Part> {
    let mut parts = Vec::new();
    for (tag, value) in data_set {
        element_parts(*tag, value, &mut parts);
    }
    parts
}

/// Append the parts encoding a single data element to `parts`.
pub fn element_parts(tag: Tag, value: &DataElementValue, parts: &mut Vec<Part>) {
    match value {
        DataElementValue::Binary { vr, bytes }
        | DataElementValue::LookupTableDescriptor { vr, bytes } => {
            parts.push(Part::DataElementHeader {
                tag,
                vr: *vr,
                length: bytes.len() as u32,
            });
            parts.push(Part::DataElementValueBytes {
                vr: *vr,
                data: bytes.clone(),
                bytes_remaining: 0,
            });
        }
        DataElementValue::Sequence { items } => {
            parts.push(Part::SequenceStart { tag, vr: VR::SQ });
            for item in items {
                parts.push(Part::SequenceItemStart);
                for (item_tag, item_value) in item {
                    element_parts(*item_tag, item_value, parts);
                }
                parts.push(Part::SequenceItemDelimiter);
            }
            parts.push(Part::SequenceDelimiter);
        }
        DataElementValue::PixelSequence { vr, fragments } => {
            parts.push(Part::SequenceStart { tag, vr: *vr });
            for fragment in fragments {
                parts.push(Part::PixelDataItem {
                    length: fragment.len() as u32,
                });
                if !fragment.is_empty() {
                    parts.push(Part::DataElementValueBytes {
                        vr: *vr,
                        data: fragment.clone(),
                        bytes_remaining: 0,
                    });
                }
            }
            parts.push(Part::SequenceDelimiter);
        }
    }
}
