//! Materialization of a part stream into a [`DataSet`].

use dcmio_core::dictionary::tags;
use dcmio_core::{DataElementValue, DataSet, Tag, VR};

use crate::part::Part;
use crate::reader::is_lut_descriptor;
use crate::{P10Error, Result};

#[derive(Debug)]
enum Frame {
    DataSet {
        data_set: DataSet,
    },
    Sequence {
        tag: Tag,
        items: Vec<DataSet>,
    },
    PixelSequence {
        tag: Tag,
        vr: VR,
        fragments: Vec<Vec<u8>>,
        current_fragment: Option<Vec<u8>>,
    },
}

/// Consumes [`Part`]s and builds the data set they describe.
///
/// The builder keeps a stack of frames: the root data set, plus one frame
/// per open sequence, open sequence item, and open encapsulated pixel data
/// element. [`Part::End`] is only legal once every frame but the root has
/// been closed.
#[derive(Debug)]
pub struct DataSetBuilder {
    frames: Vec<Frame>,
    current_element: Option<(Tag, VR, Vec<u8>)>,
    file_preamble: Option<Box<[u8; 128]>>,
    complete: bool,
}

impl Default for DataSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSetBuilder {
    /// Create a builder holding an empty root data set.
    pub fn new() -> DataSetBuilder {
        DataSetBuilder {
            frames: vec![Frame::DataSet {
                data_set: DataSet::new(),
            }],
            current_element: None,
            file_preamble: None,
            complete: false,
        }
    }

    /// The file preamble, when the stream carried one.
    pub fn file_preamble(&self) -> Option<&[u8; 128]> {
        self.file_preamble.as_deref()
    }

    /// Whether [`Part::End`] has been received.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Feed a stream of parts.
    pub fn add_parts<'a, I>(&mut self, parts: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Part>,
    {
        for part in parts {
            self.add_part(part)?;
        }
        Ok(())
    }

    /// Feed the next part of the stream.
    pub fn add_part(&mut self, part: &Part) -> Result<()> {
        if self.complete {
            return Err(invalid(format!("Part {} received after End", part)));
        }

        match part {
            Part::FilePreambleAndDicmPrefix { preamble } => {
                self.file_preamble = Some(preamble.clone());
            }

            Part::FileMetaInformation { data_set } => {
                let root = self.root_data_set_mut()?;
                for (tag, value) in data_set {
                    root.insert(*tag, value.clone());
                }
            }

            Part::DataElementHeader { tag, vr, length } => {
                if self.current_element.is_some() {
                    return Err(invalid(format!(
                        "Data element header {} while a value is in progress",
                        tag
                    )));
                }
                self.current_element = Some((*tag, *vr, Vec::with_capacity(*length as usize)));
            }

            Part::DataElementValueBytes {
                data,
                bytes_remaining,
                ..
            } => {
                // Value bytes belong either to an open pixel data fragment
                // or to the element whose header was last received
                if let Some(Frame::PixelSequence {
                    fragments,
                    current_fragment,
                    ..
                }) = self.frames.last_mut()
                {
                    if let Some(fragment) = current_fragment.as_mut() {
                        fragment.extend_from_slice(data);
                        if *bytes_remaining == 0 {
                            fragments.push(current_fragment.take().expect("fragment is open"));
                        }
                        return Ok(());
                    }
                }

                let (tag, vr, mut bytes) =
                    self.current_element
                        .take()
                        .ok_or_else(|| invalid("Value bytes without a data element header"))?;
                bytes.extend_from_slice(data);

                if *bytes_remaining == 0 {
                    let value = if is_lut_descriptor(tag, vr) && bytes.len() == 6 {
                        DataElementValue::new_lookup_table_descriptor_unchecked(vr, bytes)
                    } else {
                        DataElementValue::new_binary_unchecked(vr, bytes)
                    };
                    self.top_data_set_mut()?.insert(tag, value);
                } else {
                    self.current_element = Some((tag, vr, bytes));
                }
            }

            Part::SequenceStart { tag, vr } => match vr {
                VR::OB | VR::OW if *tag == tags::PIXEL_DATA => {
                    self.frames.push(Frame::PixelSequence {
                        tag: *tag,
                        vr: *vr,
                        fragments: Vec::new(),
                        current_fragment: None,
                    });
                }
                _ => {
                    self.frames.push(Frame::Sequence {
                        tag: *tag,
                        items: Vec::new(),
                    });
                }
            },

            Part::SequenceItemStart => {
                match self.frames.last() {
                    Some(Frame::Sequence { .. }) => {}
                    _ => return Err(invalid("Item start outside of a sequence")),
                }
                self.frames.push(Frame::DataSet {
                    data_set: DataSet::new(),
                });
            }

            Part::SequenceItemDelimiter => {
                let item = match self.frames.pop() {
                    Some(Frame::DataSet { data_set }) if self.frames.len() > 1 => data_set,
                    other => {
                        if let Some(frame) = other {
                            self.frames.push(frame);
                        }
                        return Err(invalid("Item delimiter without an open item"));
                    }
                };
                match self.frames.last_mut() {
                    Some(Frame::Sequence { items, .. }) => items.push(item),
                    _ => return Err(invalid("Item delimiter without an enclosing sequence")),
                }
            }

            Part::SequenceDelimiter => match self.frames.pop() {
                Some(Frame::Sequence { tag, items }) => {
                    let value = DataElementValue::new_sequence(items);
                    self.top_data_set_mut()?.insert(tag, value);
                }
                Some(Frame::PixelSequence {
                    tag,
                    vr,
                    fragments,
                    current_fragment,
                }) => {
                    if current_fragment.is_some() {
                        return Err(invalid("Sequence delimiter inside an open fragment"));
                    }
                    let value = DataElementValue::new_pixel_sequence(vr, fragments)
                        .map_err(|e| invalid(e.to_string()))?;
                    self.top_data_set_mut()?.insert(tag, value);
                }
                other => {
                    if let Some(frame) = other {
                        self.frames.push(frame);
                    }
                    return Err(invalid("Sequence delimiter without an open sequence"));
                }
            },

            Part::PixelDataItem { length } => match self.frames.last_mut() {
                Some(Frame::PixelSequence {
                    fragments,
                    current_fragment,
                    ..
                }) => {
                    if *length == 0 {
                        fragments.push(Vec::new());
                    } else {
                        *current_fragment = Some(Vec::with_capacity(*length as usize));
                    }
                }
                _ => {
                    return Err(invalid(
                        "Pixel data item outside of encapsulated pixel data",
                    ))
                }
            },

            Part::End => {
                if self.frames.len() != 1 || self.current_element.is_some() {
                    return Err(invalid("End with unclosed sequences, items or elements"));
                }
                self.complete = true;
            }
        }

        Ok(())
    }

    /// Extract the completed root data set. Fails when the stream has not
    /// ended yet.
    pub fn final_data_set(&mut self) -> Result<DataSet> {
        if !self.complete {
            return Err(invalid("Data set requested before the part stream ended"));
        }
        match self.frames.last_mut() {
            Some(Frame::DataSet { data_set }) => Ok(std::mem::take(data_set)),
            _ => Err(invalid("Builder has no root data set")),
        }
    }

    fn root_data_set_mut(&mut self) -> Result<&mut DataSet> {
        match self.frames.first_mut() {
            Some(Frame::DataSet { data_set }) => Ok(data_set),
            _ => Err(invalid("Builder has no root data set")),
        }
    }

    fn top_data_set_mut(&mut self) -> Result<&mut DataSet> {
        match self.frames.last_mut() {
            Some(Frame::DataSet { data_set }) => Ok(data_set),
            _ => Err(invalid("The current part is not valid inside a sequence")),
        }
    }
}

fn invalid(details: impl Into<String>) -> P10Error {
    P10Error::PartStreamInvalid {
        details: details.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_primitive_elements_from_chunks() {
        let mut builder = DataSetBuilder::new();
        builder
            .add_parts(&[
                Part::DataElementHeader {
                    tag: Tag(0x0010, 0x0010),
                    vr: VR::PN,
                    length: 8,
                },
                Part::DataElementValueBytes {
                    vr: VR::PN,
                    data: b"Doe^".to_vec(),
                    bytes_remaining: 4,
                },
                Part::DataElementValueBytes {
                    vr: VR::PN,
                    data: b"John".to_vec(),
                    bytes_remaining: 0,
                },
                Part::End,
            ])
            .unwrap();

        assert!(builder.is_complete());
        let data_set = builder.final_data_set().unwrap();
        assert_eq!(data_set.get_string(Tag(0x0010, 0x0010)).unwrap(), "Doe^John");
    }

    #[test]
    fn builds_nested_sequences() {
        let mut builder = DataSetBuilder::new();
        builder
            .add_parts(&[
                Part::SequenceStart {
                    tag: Tag(0x0040, 0x0275),
                    vr: VR::SQ,
                },
                Part::SequenceItemStart,
                Part::DataElementHeader {
                    tag: Tag(0x0008, 0x0100),
                    vr: VR::SH,
                    length: 8,
                },
                Part::DataElementValueBytes {
                    vr: VR::SH,
                    data: b"T-D1213 ".to_vec(),
                    bytes_remaining: 0,
                },
                Part::SequenceItemDelimiter,
                Part::SequenceItemStart,
                Part::SequenceItemDelimiter,
                Part::SequenceDelimiter,
                Part::End,
            ])
            .unwrap();

        let data_set = builder.final_data_set().unwrap();
        let items = data_set.get_sequence_items(Tag(0x0040, 0x0275)).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get_string(Tag(0x0008, 0x0100)).unwrap(), "T-D1213");
        assert!(items[1].is_empty());
    }

    #[test]
    fn builds_encapsulated_pixel_data() {
        let mut builder = DataSetBuilder::new();
        builder
            .add_parts(&[
                Part::SequenceStart {
                    tag: tags::PIXEL_DATA,
                    vr: VR::OB,
                },
                Part::PixelDataItem { length: 0 },
                Part::PixelDataItem { length: 4 },
                Part::DataElementValueBytes {
                    vr: VR::OB,
                    data: vec![1, 2],
                    bytes_remaining: 2,
                },
                Part::DataElementValueBytes {
                    vr: VR::OB,
                    data: vec![3, 4],
                    bytes_remaining: 0,
                },
                Part::SequenceDelimiter,
                Part::End,
            ])
            .unwrap();

        let data_set = builder.final_data_set().unwrap();
        let fragments = data_set.get(tags::PIXEL_DATA).unwrap().fragments().unwrap();
        assert_eq!(fragments, &[vec![], vec![1, 2, 3, 4]]);
    }

    #[test]
    fn lut_descriptors_get_their_own_value_type() {
        let mut builder = DataSetBuilder::new();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&256u16.to_le_bytes());
        bytes.extend_from_slice(&(-1024i16).to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());

        builder
            .add_parts(&[
                Part::DataElementHeader {
                    tag: Tag(0x0028, 0x3002),
                    vr: VR::US,
                    length: 6,
                },
                Part::DataElementValueBytes {
                    vr: VR::US,
                    data: bytes,
                    bytes_remaining: 0,
                },
                Part::End,
            ])
            .unwrap();

        let data_set = builder.final_data_set().unwrap();
        let value = data_set.get(Tag(0x0028, 0x3002)).unwrap();
        assert_eq!(value.get_lookup_table_descriptor().unwrap(), (256, -1024, 16));
    }

    #[test]
    fn file_meta_information_merges_into_root() {
        let mut fmi = DataSet::new();
        fmi.insert_string_value(tags::TRANSFER_SYNTAX_UID, VR::UI, &["1.2.840.10008.1.2.1"])
            .unwrap();

        let mut builder = DataSetBuilder::new();
        builder
            .add_parts(&[Part::FileMetaInformation { data_set: fmi }, Part::End])
            .unwrap();

        let data_set = builder.final_data_set().unwrap();
        assert_eq!(
            data_set.get_string(tags::TRANSFER_SYNTAX_UID).unwrap(),
            "1.2.840.10008.1.2.1"
        );
    }

    #[test]
    fn end_with_open_frames_is_rejected() {
        let mut builder = DataSetBuilder::new();
        builder
            .add_part(&Part::SequenceStart {
                tag: Tag(0x0040, 0x0275),
                vr: VR::SQ,
            })
            .unwrap();

        assert!(builder.add_part(&Part::End).is_err());
        assert!(!builder.is_complete());
        assert!(builder.final_data_set().is_err());
    }
}
