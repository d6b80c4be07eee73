//! The streaming DICOM P10 writer: the inverse of the reader.
//!
//! [`P10Writer`] accepts [`Part`]s and produces encoded bytes, which the
//! caller drains with [`P10Writer::pending_bytes`]. Sequences and items are
//! always written with undefined lengths and explicit delimiters, which is
//! what makes one-pass streaming possible: defined lengths would require
//! seeking back to patch headers.

use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;

use dcmio_core::dictionary::tags;
use dcmio_core::transfer_syntax::{self, VrSerialization};
use dcmio_core::vr::LengthSize;
use dcmio_core::{DataElementValue, DataSet, DataSetPath, Tag, TransferSyntax, VR};

use crate::part::Part;
use crate::{P10Error, Result};

/// Configuration for writing DICOM P10 data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteConfig {
    pub(crate) zlib_compression_level: u32,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            zlib_compression_level: 6,
        }
    }
}

impl WriteConfig {
    /// The zlib compression level used when the transfer syntax is
    /// deflated, from 0 (no compression) to 9 (best). Default: 6.
    pub fn zlib_compression_level(mut self, value: u32) -> Self {
        self.zlib_compression_level = value.clamp(0, 9);
        self
    }
}

const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Deflated output is produced in chunks of this size.
const DEFLATE_CHUNK_SIZE: usize = 32 * 1024;

#[derive(Debug, PartialEq)]
enum OpenFrame {
    Sequence,
    Item,
    PixelSequence { vr: VR },
}

/// A streaming writer of [`Part`]s into DICOM P10 bytes.
#[derive(Debug)]
pub struct P10Writer {
    config: WriteConfig,
    transfer_syntax: &'static TransferSyntax,
    deflater: Option<flate2::Compress>,
    pending: Vec<u8>,
    frames: Vec<OpenFrame>,
    /// the VR and remaining byte count of the element whose value chunks
    /// are expected next
    expecting_value: Option<(VR, u32)>,
    last_tag: Tag,
    parts_written: u64,
    fmi_written: bool,
    ended: bool,
}

impl Default for P10Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl P10Writer {
    /// Create a writer with the default configuration.
    pub fn new() -> P10Writer {
        P10Writer::with_config(WriteConfig::default())
    }

    /// Create a writer with the given configuration.
    pub fn with_config(config: WriteConfig) -> P10Writer {
        P10Writer {
            config,
            transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
            deflater: None,
            pending: Vec::new(),
            frames: Vec::new(),
            expecting_value: None,
            last_tag: Tag::ZERO,
            parts_written: 0,
            fmi_written: false,
            ended: false,
        }
    }

    /// The transfer syntax the main data set is encoded under, as selected
    /// by the File Meta Information part.
    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        self.transfer_syntax
    }

    /// Take the bytes encoded so far. Deflated output may lag behind the
    /// parts written until the stream ends.
    pub fn pending_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }

    /// Encode a stream of parts.
    pub fn write_parts<'a, I>(&mut self, parts: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Part>,
    {
        for part in parts {
            self.write_part(part)?;
        }
        Ok(())
    }

    /// Encode the next part of the stream.
    pub fn write_part(&mut self, part: &Part) -> Result<()> {
        if self.ended {
            return Err(P10Error::PartStreamInvalid {
                details: format!("Part {} received after the end of the stream", part),
            });
        }

        if self.expecting_value.is_some()
            && !matches!(part, Part::DataElementValueBytes { .. })
        {
            return Err(P10Error::PartStreamInvalid {
                details: format!(
                    "Expected value bytes for the data element at {} but received {}",
                    self.last_tag, part
                ),
            });
        }

        match part {
            Part::FilePreambleAndDicmPrefix { preamble } => {
                if self.parts_written > 0 {
                    return Err(P10Error::PartStreamInvalid {
                        details: "File preamble must be the first part".into(),
                    });
                }
                let mut bytes = Vec::with_capacity(132);
                bytes.extend_from_slice(&preamble[..]);
                bytes.extend_from_slice(b"DICM");
                self.output(bytes)?;
            }

            Part::FileMetaInformation { data_set } => {
                if self.fmi_written || !self.frames.is_empty() || self.last_tag != Tag::ZERO {
                    return Err(P10Error::PartStreamInvalid {
                        details: "File Meta Information must precede the main data set".into(),
                    });
                }
                self.fmi_written = true;

                if let Ok(uid) = data_set.get_string(tags::TRANSFER_SYNTAX_UID) {
                    self.transfer_syntax = TransferSyntax::from_uid(&uid)
                        .ok_or(P10Error::UnsupportedTransferSyntax { uid })?;
                }

                let bytes = encode_file_meta_information(data_set)?;
                self.output(bytes)?;

                // All output following a deflated File Meta Information
                // passes through streaming deflate
                if self.transfer_syntax.is_deflated {
                    self.deflater = Some(flate2::Compress::new(
                        flate2::Compression::new(self.config.zlib_compression_level),
                        false,
                    ));
                }
            }

            Part::DataElementHeader { tag, vr, length } => {
                let bytes = self.encode_element_header(*tag, *vr, *length)?;
                self.last_tag = *tag;
                self.expecting_value = Some((*vr, *length));
                self.output(bytes)?;
            }

            Part::DataElementValueBytes {
                vr,
                data,
                bytes_remaining,
            } => {
                let (_, remaining) =
                    self.expecting_value
                        .ok_or_else(|| P10Error::PartStreamInvalid {
                            details: "Value bytes received without a data element header".into(),
                        })?;

                let after = remaining
                    .checked_sub(data.len() as u32)
                    .filter(|after| after == bytes_remaining)
                    .ok_or_else(|| P10Error::PartStreamInvalid {
                        details: format!(
                            "Value bytes for the data element at {} do not match its length",
                            self.last_tag
                        ),
                    })?;

                let mut data = data.clone();
                if self.transfer_syntax.endianness == Endianness::Big {
                    crate::part::swap_value_endianness(*vr, &mut data);
                }
                self.output(data)?;

                self.expecting_value = if after == 0 { None } else { Some((*vr, after)) };
            }

            Part::SequenceStart { tag, vr } => {
                let bytes = match vr {
                    // Encapsulated pixel data
                    VR::OB | VR::OW => {
                        self.frames.push(OpenFrame::PixelSequence { vr: *vr });
                        self.encode_element_header(*tag, *vr, UNDEFINED_LENGTH)?
                    }
                    _ => {
                        self.frames.push(OpenFrame::Sequence);
                        self.encode_element_header(*tag, VR::SQ, UNDEFINED_LENGTH)?
                    }
                };
                self.last_tag = *tag;
                self.expecting_value = None;
                self.output(bytes)?;
            }

            Part::SequenceItemStart => {
                match self.frames.last() {
                    Some(OpenFrame::Sequence) => {}
                    _ => {
                        return Err(P10Error::PartStreamInvalid {
                            details: "Item start outside of a sequence".into(),
                        })
                    }
                }
                self.frames.push(OpenFrame::Item);
                let bytes = self.encode_no_vr_header(tags::ITEM, UNDEFINED_LENGTH);
                self.output(bytes)?;
            }

            Part::SequenceItemDelimiter => {
                if self.frames.pop() != Some(OpenFrame::Item) {
                    return Err(P10Error::PartStreamInvalid {
                        details: "Item delimiter without an open item".into(),
                    });
                }
                let bytes = self.encode_no_vr_header(tags::ITEM_DELIMITATION_ITEM, 0);
                self.output(bytes)?;
            }

            Part::SequenceDelimiter => {
                match self.frames.pop() {
                    Some(OpenFrame::Sequence) | Some(OpenFrame::PixelSequence { .. }) => {}
                    _ => {
                        return Err(P10Error::PartStreamInvalid {
                            details: "Sequence delimiter without an open sequence".into(),
                        })
                    }
                }
                let bytes = self.encode_no_vr_header(tags::SEQUENCE_DELIMITATION_ITEM, 0);
                self.output(bytes)?;
            }

            Part::PixelDataItem { length } => {
                let vr = match self.frames.last() {
                    Some(OpenFrame::PixelSequence { vr }) => *vr,
                    _ => {
                        return Err(P10Error::PartStreamInvalid {
                            details: "Pixel data item outside of encapsulated pixel data".into(),
                        })
                    }
                };
                if *length == UNDEFINED_LENGTH {
                    return Err(P10Error::PartStreamInvalid {
                        details: "Pixel data items must have a defined length".into(),
                    });
                }
                let bytes = self.encode_no_vr_header(tags::ITEM, *length);
                if *length > 0 {
                    self.expecting_value = Some((vr, *length));
                }
                self.output(bytes)?;
            }

            Part::End => {
                if !self.frames.is_empty() {
                    return Err(P10Error::PartStreamInvalid {
                        details: format!(
                            "End of stream with {} unclosed sequences or items",
                            self.frames.len()
                        ),
                    });
                }
                self.finish_deflate()?;
                self.ended = true;
            }
        }

        self.parts_written += 1;
        Ok(())
    }

    /// Whether [`Part::End`] has been written.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Encode a data element header under the active transfer syntax.
    fn encode_element_header(&self, tag: Tag, vr: VR, length: u32) -> Result<Vec<u8>> {
        let endianness = self.transfer_syntax.endianness;

        let mut bytes = Vec::with_capacity(12);
        put_u16(&mut bytes, tag.group(), endianness);
        put_u16(&mut bytes, tag.element(), endianness);

        match self.transfer_syntax.vr_serialization {
            VrSerialization::VrImplicit => {
                put_u32(&mut bytes, length, endianness);
            }
            VrSerialization::VrExplicit => {
                bytes.extend_from_slice(&vr.to_bytes());
                match vr.length_size() {
                    LengthSize::U16 => {
                        if length > 0xFFFF {
                            return Err(P10Error::DataInvalid {
                                when: "Writing data element header".into(),
                                details: format!(
                                    "Length {} exceeds the 16-bit length field of VR {}",
                                    length, vr
                                ),
                                path: DataSetPath::new_with_data_element(tag),
                                offset: 0,
                            });
                        }
                        put_u16(&mut bytes, length as u16, endianness);
                    }
                    LengthSize::U32 => {
                        bytes.extend_from_slice(&[0x00, 0x00]);
                        put_u32(&mut bytes, length, endianness);
                    }
                }
            }
        }

        Ok(bytes)
    }

    /// Encode an item or delimiter header, which never carries a VR.
    fn encode_no_vr_header(&self, tag: Tag, length: u32) -> Vec<u8> {
        let endianness = self.transfer_syntax.endianness;
        let mut bytes = Vec::with_capacity(8);
        put_u16(&mut bytes, tag.group(), endianness);
        put_u16(&mut bytes, tag.element(), endianness);
        put_u32(&mut bytes, length, endianness);
        bytes
    }

    /// Append encoded bytes to the pending output, deflating when the
    /// transfer syntax calls for it.
    fn output(&mut self, bytes: Vec<u8>) -> Result<()> {
        if self.deflater.is_some() {
            let deflated = self.deflate(&bytes, false)?;
            self.pending.extend_from_slice(&deflated);
        } else {
            self.pending.extend_from_slice(&bytes);
        }
        Ok(())
    }

    fn finish_deflate(&mut self) -> Result<()> {
        if self.deflater.is_some() {
            let deflated = self.deflate(&[], true)?;
            self.pending.extend_from_slice(&deflated);
        }
        Ok(())
    }

    fn deflate(&mut self, data: &[u8], finish: bool) -> Result<Vec<u8>> {
        let deflater = self.deflater.as_mut().expect("deflater is active");
        let flush = if finish {
            flate2::FlushCompress::Finish
        } else {
            flate2::FlushCompress::None
        };

        let mut input = data;
        let mut output = Vec::new();
        loop {
            let mut buffer = Vec::with_capacity(DEFLATE_CHUNK_SIZE);
            let before_in = deflater.total_in();
            let status = deflater
                .compress_vec(input, &mut buffer, flush)
                .map_err(|_| P10Error::ZlibDataError {
                    when: "Deflating output".into(),
                    path: DataSetPath::new(),
                    offset: 0,
                })?;
            let consumed = (deflater.total_in() - before_in) as usize;
            input = &input[consumed..];
            output.extend_from_slice(&buffer);

            match status {
                flate2::Status::StreamEnd => break,
                _ if !finish && input.is_empty() => break,
                _ => {}
            }
        }

        Ok(output)
    }
}

/// Encode the File Meta Information group in Explicit VR Little Endian,
/// computing and prepending the *(0002,0000)* group length.
fn encode_file_meta_information(data_set: &DataSet) -> Result<Vec<u8>> {
    let mut group = Vec::new();

    for (tag, value) in data_set {
        if *tag == tags::FILE_META_INFORMATION_GROUP_LENGTH {
            continue;
        }
        if tag.group() != 0x0002 {
            return Err(P10Error::PartStreamInvalid {
                details: format!(
                    "File Meta Information contains the non-0002 data element {}",
                    tag
                ),
            });
        }

        let (vr, bytes) = match value {
            DataElementValue::Binary { vr, bytes } => (*vr, bytes),
            _ => {
                return Err(P10Error::PartStreamInvalid {
                    details: format!(
                        "File Meta Information data element {} is not a primitive value",
                        tag
                    ),
                })
            }
        };

        group.extend_from_slice(&tag.group().to_le_bytes());
        group.extend_from_slice(&tag.element().to_le_bytes());
        group.extend_from_slice(&vr.to_bytes());
        match vr.length_size() {
            LengthSize::U16 => {
                if bytes.len() > 0xFFFF {
                    return Err(P10Error::PartStreamInvalid {
                        details: format!(
                            "File Meta Information data element {} is too long for its VR",
                            tag
                        ),
                    });
                }
                group.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
            }
            LengthSize::U32 => {
                group.extend_from_slice(&[0x00, 0x00]);
                group.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            }
        }
        group.extend_from_slice(bytes);
    }

    let mut bytes = Vec::with_capacity(12 + group.len());
    bytes.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00]);
    bytes.extend_from_slice(&(group.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&group);
    Ok(bytes)
}

fn put_u16(bytes: &mut Vec<u8>, value: u16, endianness: Endianness) {
    let mut buffer = [0u8; 2];
    match endianness {
        Endianness::Little => LittleEndian::write_u16(&mut buffer, value),
        Endianness::Big => BigEndian::write_u16(&mut buffer, value),
    }
    bytes.extend_from_slice(&buffer);
}

fn put_u32(bytes: &mut Vec<u8>, value: u32, endianness: Endianness) {
    let mut buffer = [0u8; 4];
    match endianness {
        Endianness::Little => LittleEndian::write_u32(&mut buffer, value),
        Endianness::Big => BigEndian::write_u32(&mut buffer, value),
    }
    bytes.extend_from_slice(&buffer);
}
