//! The streaming DICOM P10 reader.
//!
//! [`P10Reader`] is a push/pull state machine: bytes go in through
//! [`P10Reader::write_bytes`], parts come out of [`P10Reader::read_parts`].
//! When the buffered bytes cannot complete the next part the reader returns
//! [`P10Error::DataRequired`] and the caller resumes after feeding more
//! input. No internal threads, no async machinery.

use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use tracing::warn;

use dcmio_core::dictionary::{self, tags};
use dcmio_core::transfer_syntax::{self, VrSerialization};
use dcmio_core::value::is_lookup_table_descriptor_tag;
use dcmio_core::vr::LengthSize;
use dcmio_core::{DataElementValue, DataSet, DataSetPath, Tag, TransferSyntax, VR};

use crate::byte_stream::{ByteStream, ByteStreamError};
use crate::location::Location;
use crate::part::Part;
use crate::text::{self, SpecificCharacterSet, TextCodec};
use crate::{P10Error, Result};

/// Configuration for reading DICOM P10 data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadConfig {
    pub(crate) max_part_size: u32,
    pub(crate) max_string_size: u32,
    pub(crate) max_sequence_depth: usize,
    pub(crate) require_ordered_tags: bool,
    pub(crate) max_read_size: u64,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            max_part_size: 64 * 1024,
            max_string_size: 0xFFFF_FFFF,
            max_sequence_depth: 10_000,
            require_ordered_tags: true,
            max_read_size: 256 * 1024 * 1024,
        }
    }
}

impl ReadConfig {
    /// The maximum size in bytes of one `DataElementValueBytes` part. Values
    /// longer than this are split across multiple parts. Rounded down to a
    /// multiple of 8 so that chunk boundaries never split a numeric unit.
    ///
    /// Default: 64 KiB.
    pub fn max_part_size(mut self, value: u32) -> Self {
        self.max_part_size = (value / 8).max(1) * 8;
        self
    }

    /// The maximum length of a text value that must be materialized for
    /// character set conversion. Longer text values are rejected.
    ///
    /// Default: no meaningful limit.
    pub fn max_string_size(mut self, value: u32) -> Self {
        self.max_string_size = value;
        self
    }

    /// The maximum sequence nesting depth. Deeper nesting is rejected, which
    /// bounds the reader's memory and protects the host stack when the
    /// resulting parts are processed recursively.
    ///
    /// Default: 10 000.
    pub fn max_sequence_depth(mut self, value: usize) -> Self {
        self.max_sequence_depth = value;
        self
    }

    /// Whether data elements must appear in strictly ascending tag order
    /// within each data set. Out-of-order data is malformed and can produce
    /// incorrect results if accepted, so this is enforced by default.
    pub fn require_ordered_tags(mut self, value: bool) -> Self {
        self.require_ordered_tags = value;
        self
    }

    /// The maximum number of bytes the reader's byte stream may buffer, and
    /// the ceiling on the encoded size of the File Meta Information, which
    /// is materialized eagerly.
    ///
    /// Default: 256 MiB.
    pub fn max_read_size(mut self, value: u64) -> Self {
        self.max_read_size = value;
        self
    }
}

/// What the reader will attempt to produce next.
#[derive(Debug)]
enum NextAction {
    ReadPreambleAndDicmPrefix,
    ReadFileMetaInformation {
        starts_at: u64,
        ends_at: Option<u64>,
        data_set: DataSet,
    },
    ReadDataElementHeader,
    ReadValueBytes {
        tag: Tag,
        vr: VR,
        length: u32,
        bytes_remaining: u32,
        emit_parts: bool,
    },
    ReadPixelDataItem {
        vr: VR,
    },
    Ended,
}

/// A decoded data element header. Item and delimiter tags carry no VR.
#[derive(Debug, Clone, Copy)]
struct RawHeader {
    tag: Tag,
    vr: Option<VR>,
    length: u32,
}

const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// A streaming reader of DICOM P10 bytes, producing [`Part`]s.
#[derive(Debug)]
pub struct P10Reader {
    config: ReadConfig,
    stream: ByteStream,
    next_action: NextAction,
    transfer_syntax: &'static TransferSyntax,
    path: DataSetPath,
    location: Location,
    emitted_charset_element: bool,
}

impl Default for P10Reader {
    fn default() -> Self {
        Self::new()
    }
}

impl P10Reader {
    /// Create a reader with the default configuration.
    pub fn new() -> P10Reader {
        P10Reader::with_config(ReadConfig::default())
    }

    /// Create a reader with the given configuration.
    pub fn with_config(config: ReadConfig) -> P10Reader {
        P10Reader {
            config,
            stream: ByteStream::new(config.max_read_size),
            next_action: NextAction::ReadPreambleAndDicmPrefix,
            transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
            path: DataSetPath::new(),
            location: Location::new(),
            emitted_charset_element: false,
        }
    }

    /// The transfer syntax of the main data set. Defaults to Implicit VR
    /// Little Endian until the File Meta Information has been read.
    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        self.transfer_syntax
    }

    /// Feed raw P10 bytes to the reader. Passing `done` marks the end of
    /// the input; later writes fail.
    pub fn write_bytes(&mut self, bytes: Vec<u8>, done: bool) -> Result<()> {
        self.stream
            .write(bytes, done)
            .map_err(|e| self.map_stream_error(e, "Writing data to DICOM P10 reader"))
    }

    /// Produce the next parts of the stream. Zero or more parts are
    /// returned per call; after [`Part::End`] has been produced further
    /// calls return no parts.
    ///
    /// [`P10Error::DataRequired`] means more bytes must be written before
    /// the next part can be produced; it is the only non-fatal error.
    pub fn read_parts(&mut self) -> Result<Vec<Part>> {
        match &self.next_action {
            NextAction::ReadPreambleAndDicmPrefix => self.read_preamble_and_dicm_prefix(),
            NextAction::ReadFileMetaInformation { .. } => self.read_file_meta_information(),
            NextAction::ReadDataElementHeader => {
                // Defined-length sequences and items end by stream offset
                // rather than by delimiter elements
                if let Some(part) = self.location.next_delimiter(self.stream.bytes_read()) {
                    if matches!(part, Part::SequenceDelimiter | Part::SequenceItemDelimiter) {
                        self.path.pop();
                    }
                    return Ok(vec![part]);
                }

                if self.stream.is_fully_consumed() {
                    // Input that stops on a data element boundary is ended
                    // gracefully, closing any sequences and items left open
                    let mut parts = self.location.pending_delimiters();
                    parts.push(Part::End);
                    self.next_action = NextAction::Ended;
                    return Ok(parts);
                }

                let is_at_root = self.path.is_root();
                let (mut parts, tag) = self.read_data_element_header_parts()?;

                // Guarantee a Specific Character Set element in the output,
                // declaring the UTF-8 that all emitted text now uses
                if !self.emitted_charset_element && is_at_root {
                    if tag > tags::SPECIFIC_CHARACTER_SET {
                        parts.splice(0..0, synthetic_utf8_charset_parts());
                        self.emitted_charset_element = true;
                    } else if tag == tags::SPECIFIC_CHARACTER_SET {
                        self.emitted_charset_element = true;
                    }
                }

                Ok(parts)
            }
            NextAction::ReadValueBytes {
                tag,
                vr,
                length,
                bytes_remaining,
                emit_parts,
            } => {
                let (tag, vr, length, bytes_remaining, emit_parts) =
                    (*tag, *vr, *length, *bytes_remaining, *emit_parts);
                self.read_value_bytes_parts(tag, vr, length, bytes_remaining, emit_parts)
            }
            NextAction::ReadPixelDataItem { vr } => {
                let vr = *vr;
                self.read_pixel_data_item_part(vr)
            }
            NextAction::Ended => Ok(vec![]),
        }
    }

    /// Read the 128-byte preamble and `DICM` prefix. When the prefix is not
    /// present the input is treated as a bare data set and no preamble part
    /// is emitted.
    fn read_preamble_and_dicm_prefix(&mut self) -> Result<Vec<Part>> {
        let parts = match self.stream.peek(132) {
            Ok(data) if &data[128..132] == b"DICM" => {
                self.stream
                    .read(132)
                    .map_err(|e| self.map_stream_error(e, "Reading file header"))?;
                let mut preamble = [0u8; 128];
                preamble.copy_from_slice(&data[0..128]);
                vec![Part::FilePreambleAndDicmPrefix {
                    preamble: Box::new(preamble),
                }]
            }
            // No prefix: leave the bytes in place for data set parsing
            Ok(_) | Err(ByteStreamError::DataEnd) => vec![],
            Err(e) => return Err(self.map_stream_error(e, "Reading file header")),
        };

        self.next_action = NextAction::ReadFileMetaInformation {
            starts_at: self.stream.bytes_read(),
            ends_at: None,
            data_set: DataSet::new(),
        };

        Ok(parts)
    }

    /// Read the File Meta Information into a data set and emit it as one
    /// part. The *(0002,0000)* group length delimits the group when
    /// present; otherwise elements are read while their group is 0x0002.
    fn read_file_meta_information(&mut self) -> Result<Vec<Part>> {
        const WHEN: &str = "Reading File Meta Information";

        loop {
            let (starts_at, ends_at, group_ended) = match &self.next_action {
                NextAction::ReadFileMetaInformation {
                    starts_at, ends_at, ..
                } => (
                    *starts_at,
                    *ends_at,
                    ends_at.is_some_and(|e| self.stream.bytes_read() >= e),
                ),
                _ => unreachable!(),
            };

            if group_ended {
                break;
            }

            // The tag, VR, and a 16-bit length fit in 8 bytes
            let data = match self.stream.peek(8) {
                Ok(data) => data,
                // Data ending cleanly before the FMI means a bare or empty
                // data set; defer to the main data set loop
                Err(ByteStreamError::DataEnd) if ends_at.is_none() => break,
                Err(e) => return Err(self.map_stream_error(e, WHEN)),
            };

            let tag = Tag(
                LittleEndian::read_u16(&data[0..2]),
                LittleEndian::read_u16(&data[2..4]),
            );

            if tag.group() != 0x0002 {
                if ends_at.is_none() {
                    break;
                }
                return Err(P10Error::DataInvalid {
                    when: WHEN.into(),
                    details: "Data element in File Meta Information does not have the group 0x0002"
                        .into(),
                    path: DataSetPath::new_with_data_element(tag),
                    offset: self.stream.bytes_read(),
                });
            }

            let vr = VR::from_binary([data[4], data[5]]).ok_or_else(|| P10Error::DataInvalid {
                when: WHEN.into(),
                details: format!("Data element has invalid VR {:?}", &data[4..6]),
                path: DataSetPath::new_with_data_element(tag),
                offset: self.stream.bytes_read(),
            })?;

            if vr == VR::SQ {
                return Err(P10Error::DataInvalid {
                    when: WHEN.into(),
                    details: "Data element in File Meta Information is a sequence".into(),
                    path: DataSetPath::new_with_data_element(tag),
                    offset: self.stream.bytes_read(),
                });
            }

            let (value_offset, value_length) = match vr.length_size() {
                LengthSize::U16 => (8usize, LittleEndian::read_u16(&data[6..8]) as usize),
                LengthSize::U32 => {
                    let data = self
                        .stream
                        .peek(12)
                        .map_err(|e| self.map_stream_error(e, WHEN))?;
                    (12, LittleEndian::read_u32(&data[8..12]) as usize)
                }
            };

            let fmi_size = match &self.next_action {
                NextAction::ReadFileMetaInformation { data_set, .. } => data_set.total_byte_size(),
                _ => unreachable!(),
            };
            if fmi_size + (value_offset + value_length) as u64 > self.config.max_read_size {
                return Err(P10Error::MaximumExceeded {
                    details: format!(
                        "File Meta Information exceeds the configured ceiling of {} bytes",
                        self.config.max_read_size
                    ),
                    path: DataSetPath::new_with_data_element(tag),
                    offset: self.stream.bytes_read(),
                });
            }

            let data = self
                .stream
                .read(value_offset + value_length)
                .map_err(|e| self.map_stream_error(e, "Reading File Meta Information value"))?;
            let value_bytes = data[value_offset..].to_vec();
            let value = DataElementValue::new_binary_unchecked(vr, value_bytes);

            if tag == tags::FILE_META_INFORMATION_GROUP_LENGTH {
                let offset = self.stream.bytes_read();
                let group_length: u32 = value.get_int().map_err(|e| P10Error::DataInvalid {
                    when: WHEN.into(),
                    details: format!("Group length is invalid: {}", e),
                    path: DataSetPath::new_with_data_element(tag),
                    offset,
                })?;

                let NextAction::ReadFileMetaInformation {
                    ends_at, data_set, ..
                } = &mut self.next_action
                else {
                    unreachable!()
                };
                if ends_at.is_none() && data_set.is_empty() {
                    *ends_at = Some(starts_at + 12 + u64::from(group_length));
                }
                continue;
            }

            if tag == tags::TRANSFER_SYNTAX_UID {
                let uid = value.get_string().map_err(|e| P10Error::DataInvalid {
                    when: WHEN.into(),
                    details: e.to_string(),
                    path: DataSetPath::new_with_data_element(tag),
                    offset: self.stream.bytes_read(),
                })?;
                self.transfer_syntax = TransferSyntax::from_uid(&uid)
                    .ok_or(P10Error::UnsupportedTransferSyntax { uid })?;
            }

            let NextAction::ReadFileMetaInformation { data_set, .. } = &mut self.next_action
            else {
                unreachable!()
            };
            data_set.insert(tag, value);
        }

        // Everything after a deflated File Meta Information is one raw
        // deflate stream
        if self.transfer_syntax.is_deflated {
            self.stream.start_inflate();
        }

        let NextAction::ReadFileMetaInformation { data_set, .. } = &mut self.next_action else {
            unreachable!()
        };
        let mut fmi = std::mem::take(data_set);

        if self.transfer_syntax != &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN {
            fmi.insert_string_value(tags::TRANSFER_SYNTAX_UID, VR::UI, &[self.transfer_syntax.uid])
                .expect("transfer syntax UIDs are valid UI values");
        }

        self.next_action = NextAction::ReadDataElementHeader;

        Ok(vec![Part::FileMetaInformation { data_set: fmi }])
    }

    /// Read one data element header and emit the parts it opens.
    fn read_data_element_header_parts(&mut self) -> Result<(Vec<Part>, Tag)> {
        const WHEN: &str = "Reading data element header";

        let header = self.read_raw_header()?;

        // In implicit VR mode unknown tags decode as UN; sequences of
        // undefined length are recognized below via CP-246
        let vr = header.vr;

        match (header.tag, vr, header.length) {
            // Sequences, and unknown-VR elements of undefined length
            // (CP-246: decoded as implicit VR)
            (tag, Some(VR::SQ), _) | (tag, Some(VR::UN), UNDEFINED_LENGTH) => {
                self.check_ordering(tag)?;

                let ends_at = match header.length {
                    UNDEFINED_LENGTH => None,
                    length => Some(self.stream.bytes_read() + u64::from(length)),
                };
                let implicit_vr_forced = vr == Some(VR::UN);

                self.location
                    .add_sequence(tag, implicit_vr_forced, ends_at)
                    .map_err(|details| self.data_invalid(WHEN, details))?;

                if self.location.sequence_depth() > self.config.max_sequence_depth {
                    return Err(P10Error::MaximumExceeded {
                        details: "Maximum allowed sequence depth reached".into(),
                        path: self.path.clone(),
                        offset: self.stream.bytes_read(),
                    });
                }

                self.path
                    .add_data_element(tag)
                    .map_err(|details| self.data_invalid(WHEN, details))?;

                let mut parts = vec![Part::SequenceStart { tag, vr: VR::SQ }];

                // A zero-length defined sequence ends immediately
                if ends_at == Some(self.stream.bytes_read()) {
                    self.location
                        .end_sequence()
                        .map_err(|details| self.data_invalid(WHEN, details))?;
                    self.path.pop();
                    parts.push(Part::SequenceDelimiter);
                }

                Ok((parts, tag))
            }

            // Sequence items
            (tag, None, length) if tag == tags::ITEM => {
                let ends_at = match length {
                    UNDEFINED_LENGTH => None,
                    length => Some(self.stream.bytes_read() + u64::from(length)),
                };

                let index = self
                    .location
                    .add_item(ends_at)
                    .map_err(|details| self.data_invalid(WHEN, details))?;
                self.path
                    .add_sequence_item(index)
                    .map_err(|details| self.data_invalid(WHEN, details))?;

                let mut parts = vec![Part::SequenceItemStart];

                // Items can be empty
                if ends_at == Some(self.stream.bytes_read()) {
                    self.location
                        .end_item()
                        .map_err(|details| self.data_invalid(WHEN, details))?;
                    self.path.pop();
                    parts.push(Part::SequenceItemDelimiter);
                }

                Ok((parts, tag))
            }

            // Encapsulated pixel data
            (tag, Some(vr @ (VR::OB | VR::OW)), UNDEFINED_LENGTH) if tag == tags::PIXEL_DATA => {
                self.check_ordering(tag)?;

                self.location
                    .add_sequence(tag, false, None)
                    .map_err(|details| self.data_invalid(WHEN, details))?;
                self.path
                    .add_data_element(tag)
                    .map_err(|details| self.data_invalid(WHEN, details))?;

                self.next_action = NextAction::ReadPixelDataItem { vr };

                Ok((vec![Part::SequenceStart { tag, vr }], tag))
            }

            // Sequence delimiters
            (tag, None, 0) if tag == tags::SEQUENCE_DELIMITATION_ITEM => {
                let parts = match self.location.end_sequence() {
                    Ok(_) => {
                        self.path.pop();
                        vec![Part::SequenceDelimiter]
                    }
                    Err(_) => {
                        // Rogue sequence delimiters have been observed in
                        // the wild; they are skipped rather than fatal
                        warn!(
                            "Sequence delimiter outside of a sequence at offset 0x{:X}",
                            self.stream.bytes_read()
                        );
                        vec![]
                    }
                };
                Ok((parts, tag))
            }

            // Item delimiters
            (tag, None, 0) if tag == tags::ITEM_DELIMITATION_ITEM => {
                self.location
                    .end_item()
                    .map_err(|details| self.data_invalid(WHEN, details))?;
                self.path.pop();
                Ok((vec![Part::SequenceItemDelimiter], tag))
            }

            // Primitive data elements
            (tag, Some(vr), length) if length != UNDEFINED_LENGTH => {
                self.check_ordering(tag)?;

                let materialize = self.is_materialized_value_required(tag, vr);
                if materialize && length > self.config.max_string_size {
                    return Err(P10Error::MaximumExceeded {
                        details: format!(
                            "Value for '{}' with VR {} and length {} bytes exceeds the maximum \
                             allowed string size of {} bytes",
                            dictionary::tag_with_name(tag, None),
                            vr,
                            length,
                            self.config.max_string_size
                        ),
                        path: self.path.clone(),
                        offset: self.stream.bytes_read(),
                    });
                }

                self.path
                    .add_data_element(tag)
                    .map_err(|details| self.data_invalid(WHEN, details))?;

                // Group length elements and Data Set Trailing Padding carry
                // no information a re-encoded stream could keep consistent,
                // so they are consumed without emitting parts
                let emit_parts =
                    tag != tags::DATA_SET_TRAILING_PADDING && !tag.is_group_length();

                // Materialized values emit their header only once the value
                // is available, as UTF-8 conversion may change the length
                let parts = if emit_parts && !materialize {
                    vec![Part::DataElementHeader { tag, vr, length }]
                } else {
                    vec![]
                };

                self.next_action = NextAction::ReadValueBytes {
                    tag,
                    vr,
                    length,
                    bytes_remaining: length,
                    emit_parts,
                };

                Ok((parts, tag))
            }

            (tag, _, _) => Err(P10Error::DataInvalid {
                when: WHEN.into(),
                details: format!("Invalid data element '{}' with undefined length", tag),
                path: self.path.clone(),
                offset: self.stream.bytes_read(),
            }),
        }
    }

    /// Decode one raw header at the current position: tag, VR (explicit or
    /// inferred) and length.
    fn read_raw_header(&mut self) -> Result<RawHeader> {
        const WHEN: &str = "Reading data element header";

        let endianness = self.active_transfer_syntax().endianness;

        let data = self
            .stream
            .peek(4)
            .map_err(|e| self.map_stream_error(e, WHEN))?;
        let tag = match endianness {
            Endianness::Little => Tag(
                LittleEndian::read_u16(&data[0..2]),
                LittleEndian::read_u16(&data[2..4]),
            ),
            Endianness::Big => Tag(
                BigEndian::read_u16(&data[0..2]),
                BigEndian::read_u16(&data[2..4]),
            ),
        };

        // File Meta Information elements must not appear in the main data
        // set's root
        if tag.group() == 0x0002 && self.path.is_root() {
            return Err(P10Error::DataInvalid {
                when: WHEN.into(),
                details: format!(
                    "File Meta Information data element '{}' found in the main data set",
                    tag
                ),
                path: DataSetPath::new_with_data_element(tag),
                offset: self.stream.bytes_read(),
            });
        }

        // Item and delimiter tags always encode without a VR
        if tag == tags::ITEM
            || tag == tags::ITEM_DELIMITATION_ITEM
            || tag == tags::SEQUENCE_DELIMITATION_ITEM
        {
            let data = self
                .stream
                .read(8)
                .map_err(|e| self.map_stream_error(e, WHEN))?;
            let length = match endianness {
                Endianness::Little => LittleEndian::read_u32(&data[4..8]),
                Endianness::Big => BigEndian::read_u32(&data[4..8]),
            };
            return Ok(RawHeader {
                tag,
                vr: None,
                length,
            });
        }

        match self.active_transfer_syntax().vr_serialization {
            VrSerialization::VrImplicit => {
                let data = self
                    .stream
                    .read(8)
                    .map_err(|e| self.map_stream_error(e, WHEN))?;
                let length = match endianness {
                    Endianness::Little => LittleEndian::read_u32(&data[4..8]),
                    Endianness::Big => BigEndian::read_u32(&data[4..8]),
                };
                let vr = dictionary::vr_for_tag(tag);
                Ok(RawHeader {
                    tag,
                    vr: Some(vr),
                    length,
                })
            }
            VrSerialization::VrExplicit => {
                let data = self
                    .stream
                    .peek(6)
                    .map_err(|e| self.map_stream_error(e, WHEN))?;
                let vr = match VR::from_binary([data[4], data[5]]) {
                    Some(vr) => vr,
                    // Two NULs or two spaces in place of a VR have been
                    // observed in the wild and decode as UN
                    None if matches!(&data[4..6], [0x00, 0x00] | [0x20, 0x20]) => VR::UN,
                    None => {
                        return Err(P10Error::DataInvalid {
                            when: "Reading data element VR".into(),
                            details: format!(
                                "Unrecognized VR {:?} for tag '{}'",
                                &data[4..6],
                                dictionary::tag_with_name(tag, None)
                            ),
                            path: self.path.clone(),
                            offset: self.stream.bytes_read(),
                        })
                    }
                };

                let header_size = match vr.length_size() {
                    LengthSize::U16 => 8,
                    LengthSize::U32 => 12,
                };
                let data = self
                    .stream
                    .read(header_size)
                    .map_err(|e| self.map_stream_error(e, WHEN))?;
                let length = match (vr.length_size(), endianness) {
                    (LengthSize::U16, Endianness::Little) => {
                        u32::from(LittleEndian::read_u16(&data[6..8]))
                    }
                    (LengthSize::U16, Endianness::Big) => {
                        u32::from(BigEndian::read_u16(&data[6..8]))
                    }
                    (LengthSize::U32, Endianness::Little) => LittleEndian::read_u32(&data[8..12]),
                    (LengthSize::U32, Endianness::Big) => BigEndian::read_u32(&data[8..12]),
                };
                Ok(RawHeader {
                    tag,
                    vr: Some(vr),
                    length,
                })
            }
        }
    }

    /// Read value bytes for the current data element, emitting chunks of at
    /// most `max_part_size` with a countdown of the bytes remaining.
    fn read_value_bytes_parts(
        &mut self,
        tag: Tag,
        vr: VR,
        length: u32,
        bytes_remaining: u32,
        emit_parts: bool,
    ) -> Result<Vec<Part>> {
        let materialize = self.is_materialized_value_required(tag, vr);

        let bytes_to_read = if materialize {
            length
        } else {
            bytes_remaining.min(self.config.max_part_size)
        };

        let mut data = self.stream.read(bytes_to_read as usize).map_err(|e| {
            let when = format!(
                "Reading {} data element value bytes, VR: {}",
                bytes_to_read, vr
            );
            self.map_stream_error(e, &when)
        })?;

        // Value bytes are always emitted little endian
        if self.active_transfer_syntax().endianness == Endianness::Big {
            crate::part::swap_value_endianness(vr, &mut data);
        }

        let bytes_remaining = bytes_remaining - bytes_to_read;

        if materialize {
            data = self.process_materialized_value(tag, vr, data)?;
        }

        let mut parts = Vec::with_capacity(2);
        if emit_parts {
            if materialize {
                let max_length = vr.length_size().max_length();
                if data.len() as u32 > max_length {
                    return Err(P10Error::DataInvalid {
                        when: "Reading data element value bytes".into(),
                        details: format!(
                            "Length of {} bytes exceeds the maximum of {} bytes after \
                             conversion to UTF-8",
                            data.len(),
                            max_length
                        ),
                        path: self.path.clone(),
                        offset: self.stream.bytes_read(),
                    });
                }
                parts.push(Part::DataElementHeader {
                    tag,
                    vr,
                    length: data.len() as u32,
                });
            }
            parts.push(Part::DataElementValueBytes {
                vr,
                data,
                bytes_remaining,
            });
        }

        if bytes_remaining == 0 {
            self.path.pop();
            self.next_action = if tag == tags::ITEM {
                NextAction::ReadPixelDataItem { vr }
            } else {
                NextAction::ReadDataElementHeader
            };
        } else {
            self.next_action = NextAction::ReadValueBytes {
                tag,
                vr,
                length,
                bytes_remaining,
                emit_parts,
            };
        }

        Ok(parts)
    }

    /// Read the next encapsulated pixel data item header, or the sequence
    /// delimiter that ends the pixel data.
    fn read_pixel_data_item_part(&mut self, vr: VR) -> Result<Vec<Part>> {
        const WHEN: &str = "Reading encapsulated pixel data item";

        let header = self.read_raw_header()?;

        match header {
            // Pixel data fragments have a defined length
            RawHeader {
                tag,
                vr: None,
                length,
            } if tag == tags::ITEM && length != UNDEFINED_LENGTH => {
                let parts = vec![Part::PixelDataItem { length }];

                if length == 0 {
                    // An empty fragment, e.g. an absent Basic Offset Table,
                    // produces no value bytes
                    self.next_action = NextAction::ReadPixelDataItem { vr };
                    self.location.next_pixel_item_index();
                } else {
                    let index = self.location.next_pixel_item_index();
                    self.path
                        .add_sequence_item(index)
                        .map_err(|details| self.data_invalid(WHEN, details))?;
                    self.next_action = NextAction::ReadValueBytes {
                        tag: tags::ITEM,
                        vr,
                        length,
                        bytes_remaining: length,
                        emit_parts: true,
                    };
                }

                Ok(parts)
            }

            RawHeader {
                tag,
                vr: None,
                length: 0,
            } if tag == tags::SEQUENCE_DELIMITATION_ITEM => {
                self.location
                    .end_sequence()
                    .map_err(|details| self.data_invalid(WHEN, details))?;
                self.path.pop();
                self.next_action = NextAction::ReadDataElementHeader;
                Ok(vec![Part::SequenceDelimiter])
            }

            RawHeader { tag, .. } => Err(P10Error::DataInvalid {
                when: WHEN.into(),
                details: format!("Invalid data element '{}' in encapsulated pixel data", tag),
                path: self.path.clone(),
                offset: self.stream.bytes_read(),
            }),
        }
    }

    /// Whether the element's whole value must be read into memory before
    /// parts can be emitted.
    fn is_materialized_value_required(&self, tag: Tag, vr: VR) -> bool {
        if tag == tags::SPECIFIC_CHARACTER_SET {
            return true;
        }

        // Encoded strings already in UTF-8 compatible data pass through;
        // everything else textual is materialized so it can be converted
        // or sanitized. Private creators always use the default repertoire
        // (PS3.5 7.8.1).
        if vr.is_encoded_string() && !tag.is_private_creator() {
            return !self.location.active_charset().is_utf8_compatible();
        }

        vr.is_string()
    }

    /// Convert a fully materialized value: decode text to UTF-8, re-pad to
    /// even length, and track clarifying elements.
    fn process_materialized_value(&mut self, tag: Tag, vr: VR, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let mut text = if vr.is_encoded_string() && !tag.is_private_creator() {
            self.location.active_charset().decode(&bytes)
        } else {
            text::decode_default_repertoire(&bytes)
        };

        if tag == tags::SPECIFIC_CHARACTER_SET {
            match SpecificCharacterSet::from_code(&text) {
                Some(charset) => self.location.set_charset(charset),
                None => {
                    warn!(
                        "Unsupported specific character set {:?}, using the default repertoire",
                        text.trim()
                    );
                    self.location.set_charset(SpecificCharacterSet::default());
                }
            }
            // The emitted stream carries UTF-8 text regardless of the
            // original character set
            text = "ISO_IR 192".to_owned();
        }

        let mut bytes = text.into_bytes();
        if bytes.len() % 2 == 1 {
            bytes.push(vr.padding_byte());
        }
        Ok(bytes)
    }

    fn check_ordering(&mut self, tag: Tag) -> Result<()> {
        if !self.config.require_ordered_tags {
            return Ok(());
        }
        self.location
            .check_ordering(tag)
            .map_err(|previous| P10Error::InvalidOrder {
                tag,
                previous,
                path: self.path.clone(),
                offset: self.stream.bytes_read(),
            })
    }

    /// The transfer syntax governing the bytes at the current position,
    /// accounting for CP-246 forced implicit VR inside UN sequences.
    fn active_transfer_syntax(&self) -> &'static TransferSyntax {
        if self.location.is_implicit_vr_forced() {
            &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN
        } else {
            self.transfer_syntax
        }
    }

    fn data_invalid(&self, when: &str, details: String) -> P10Error {
        P10Error::DataInvalid {
            when: when.into(),
            details,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
        }
    }

    fn map_stream_error(&self, error: ByteStreamError, when: &str) -> P10Error {
        let offset = self.stream.bytes_read();
        match error {
            ByteStreamError::DataRequired => P10Error::DataRequired { when: when.into() },
            ByteStreamError::DataEnd => P10Error::DataEndedUnexpectedly {
                when: when.into(),
                path: self.path.clone(),
                offset,
            },
            ByteStreamError::ReadOversized => P10Error::MaximumExceeded {
                details: format!(
                    "Read exceeds the maximum read size of {} bytes",
                    self.config.max_read_size
                ),
                path: self.path.clone(),
                offset,
            },
            ByteStreamError::ZlibDataError => P10Error::ZlibDataError {
                when: when.into(),
                path: self.path.clone(),
                offset,
            },
            ByteStreamError::WriteAfterCompletion => P10Error::WriteAfterCompletion,
        }
    }
}

/// The parts of a synthetic *(0008,0005) Specific Character Set* element
/// declaring UTF-8.
fn synthetic_utf8_charset_parts() -> [Part; 2] {
    let data = b"ISO_IR 192";
    [
        Part::DataElementHeader {
            tag: tags::SPECIFIC_CHARACTER_SET,
            vr: VR::CS,
            length: data.len() as u32,
        },
        Part::DataElementValueBytes {
            vr: VR::CS,
            data: data.to_vec(),
            bytes_remaining: 0,
        },
    ]
}

/// Whether a value with the given tag should become a lookup table
/// descriptor value when materialized into a data set.
pub(crate) fn is_lut_descriptor(tag: Tag, vr: VR) -> bool {
    is_lookup_table_descriptor_tag(tag) && matches!(vr, VR::US | VR::SS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Feed all bytes at once and collect every part until `End`.
    fn read_all(data: &[u8]) -> Result<Vec<Part>> {
        read_all_with_config(data, ReadConfig::default())
    }

    fn read_all_with_config(data: &[u8], config: ReadConfig) -> Result<Vec<Part>> {
        let mut reader = P10Reader::with_config(config);
        reader.write_bytes(data.to_vec(), true)?;

        let mut parts = Vec::new();
        loop {
            let new_parts = reader.read_parts()?;
            let ended = new_parts.contains(&Part::End);
            parts.extend(new_parts);
            if ended {
                return Ok(parts);
            }
        }
    }

    #[test]
    fn preamble_detection() {
        // 128 zero bytes, "DICM", then a minimal File Meta Information
        let mut data = vec![0u8; 128];
        data.extend_from_slice(b"DICM");
        #[rustfmt::skip]
        data.extend_from_slice(&[
            0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00, // (0002,0000) UL 4
            0x1A, 0x00, 0x00, 0x00, // group length: 26
            0x02, 0x00, 0x10, 0x00, b'U', b'I', 0x12, 0x00, // (0002,0010) UI 18
        ]);
        data.extend_from_slice(b"1.2.840.10008.1.2\0");

        let parts = read_all(&data).unwrap();

        let mut fmi = DataSet::new();
        fmi.insert(
            Tag(0x0002, 0x0010),
            DataElementValue::new_binary_unchecked(VR::UI, b"1.2.840.10008.1.2\0".to_vec()),
        );

        assert_eq!(
            parts,
            vec![
                Part::FilePreambleAndDicmPrefix {
                    preamble: Box::new([0u8; 128]),
                },
                Part::FileMetaInformation { data_set: fmi },
                Part::End,
            ]
        );
    }

    #[test]
    fn implicit_vr_element() {
        // (0010,0010) under Implicit VR Little Endian, no preamble
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, // tag: (0010,0010) PatientName
            0x08, 0x00, 0x00, 0x00, // length: 8
            b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
        ];

        let parts = read_all(DATA).unwrap();

        assert_eq!(
            parts,
            vec![
                Part::FileMetaInformation {
                    data_set: DataSet::new(),
                },
                // the input declares no character set, so one is synthesized
                Part::DataElementHeader {
                    tag: Tag(0x0008, 0x0005),
                    vr: VR::CS,
                    length: 10,
                },
                Part::DataElementValueBytes {
                    vr: VR::CS,
                    data: b"ISO_IR 192".to_vec(),
                    bytes_remaining: 0,
                },
                Part::DataElementHeader {
                    tag: Tag(0x0010, 0x0010),
                    vr: VR::PN,
                    length: 8,
                },
                Part::DataElementValueBytes {
                    vr: VR::PN,
                    data: b"Doe^John".to_vec(),
                    bytes_remaining: 0,
                },
                Part::End,
            ]
        );
    }

    #[test]
    fn sequence_with_one_empty_item() {
        // Explicit VR LE: (0040,0275) SQ of undefined length, one item of
        // defined length zero, then a sequence delimiter
        let mut data = explicit_le_fmi();
        #[rustfmt::skip]
        data.extend_from_slice(&[
            0x40, 0x00, 0x75, 0x02, b'S', b'Q', 0x00, 0x00, // (0040,0275) SQ
            0xFF, 0xFF, 0xFF, 0xFF, // undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00, // item, length 0
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00, // sequence delimiter
        ]);

        let parts = read_all(&data).unwrap();
        let sequence_parts: Vec<&Part> = parts
            .iter()
            .filter(|p| {
                matches!(
                    p,
                    Part::SequenceStart { .. }
                        | Part::SequenceItemStart
                        | Part::SequenceItemDelimiter
                        | Part::SequenceDelimiter
                )
            })
            .collect();

        assert_eq!(
            sequence_parts,
            vec![
                &Part::SequenceStart {
                    tag: Tag(0x0040, 0x0275),
                    vr: VR::SQ,
                },
                &Part::SequenceItemStart,
                &Part::SequenceItemDelimiter,
                &Part::SequenceDelimiter,
            ]
        );
    }

    #[test]
    fn encapsulated_pixel_data() {
        // JPEG Baseline: (7FE0,0010) OB undefined length, two fragments of
        // lengths 0 and 4, then a sequence delimiter
        let mut data = fmi_with_transfer_syntax("1.2.840.10008.1.2.4.50");
        #[rustfmt::skip]
        data.extend_from_slice(&[
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, // (7FE0,0010) OB
            0xFF, 0xFF, 0xFF, 0xFF, // undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00, // item, length 0
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, // item, length 4
            0x01, 0x02, 0x03, 0x04,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00, // sequence delimiter
        ]);

        let parts = read_all(&data).unwrap();
        let tail = &parts[parts.len() - 6..];

        assert_eq!(
            tail,
            &[
                Part::SequenceStart {
                    tag: Tag(0x7FE0, 0x0010),
                    vr: VR::OB,
                },
                Part::PixelDataItem { length: 0 },
                Part::PixelDataItem { length: 4 },
                Part::DataElementValueBytes {
                    vr: VR::OB,
                    data: vec![1, 2, 3, 4],
                    bytes_remaining: 0,
                },
                Part::SequenceDelimiter,
                Part::End,
            ]
        );
    }

    #[test]
    fn out_of_order_tags_are_rejected() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, // (0010,0010), empty
            0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00, // (0008,0060) after it
            b'M', b'R',
        ];

        let error = read_all(DATA).unwrap_err();
        assert!(matches!(
            error,
            P10Error::InvalidOrder {
                tag: Tag(0x0008, 0x0060),
                previous: Tag(0x0010, 0x0010),
                ..
            }
        ));
    }

    #[test]
    fn out_of_order_tags_can_be_allowed() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00,
            b'M', b'R',
        ];

        let config = ReadConfig::default().require_ordered_tags(false);
        let parts = read_all_with_config(DATA, config).unwrap();
        assert!(parts.iter().any(|p| matches!(
            p,
            Part::DataElementHeader {
                tag: Tag(0x0008, 0x0060),
                ..
            }
        )));
    }

    #[test]
    fn data_required_until_bytes_arrive() {
        let mut reader = P10Reader::new();
        reader.write_bytes(vec![0u8; 64], false).unwrap();

        match reader.read_parts() {
            Err(P10Error::DataRequired { .. }) => {}
            other => panic!("expected DataRequired, got {:?}", other),
        }
    }

    #[test]
    fn truncation_inside_element_is_fatal() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, // (0010,0010)
            0x08, 0x00, 0x00, 0x00, // length: 8
            b'D', b'o', b'e', // truncated value
        ];

        let error = read_all(DATA).unwrap_err();
        assert!(matches!(error, P10Error::DataEndedUnexpectedly { .. }));
    }

    #[test]
    fn value_chunking_respects_max_part_size() {
        let mut data = explicit_le_fmi();
        #[rustfmt::skip]
        data.extend_from_slice(&[
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, // (7FE0,0010) OB
            0x20, 0x00, 0x00, 0x00, // length: 32
        ]);
        data.extend_from_slice(&[0xAB; 32]);

        let config = ReadConfig::default().max_part_size(8);
        let parts = read_all_with_config(&data, config).unwrap();

        let chunks: Vec<(usize, u32)> = parts
            .iter()
            .filter_map(|p| match p {
                Part::DataElementValueBytes {
                    data,
                    bytes_remaining,
                    ..
                } => Some((data.len(), *bytes_remaining)),
                _ => None,
            })
            .collect();
        assert_eq!(chunks, vec![(8, 24), (8, 16), (8, 8), (8, 0)]);
    }

    #[test]
    fn latin1_text_is_converted_to_utf8() {
        let mut data = explicit_le_fmi();
        #[rustfmt::skip]
        data.extend_from_slice(&[
            0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00, // (0008,0005) CS 10
        ]);
        data.extend_from_slice(b"ISO_IR 100");
        #[rustfmt::skip]
        data.extend_from_slice(&[
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x06, 0x00, // (0010,0010) PN 6
        ]);
        data.extend_from_slice(b"M\xFCller");

        let parts = read_all(&data).unwrap();

        // the character set element itself is rewritten to UTF-8
        assert!(parts.contains(&Part::DataElementValueBytes {
            vr: VR::CS,
            data: b"ISO_IR 192".to_vec(),
            bytes_remaining: 0,
        }));
        // "Müller" re-encodes to 7 bytes of UTF-8, padded to 8
        assert!(parts.contains(&Part::DataElementHeader {
            tag: Tag(0x0010, 0x0010),
            vr: VR::PN,
            length: 8,
        }));
        assert!(parts.contains(&Part::DataElementValueBytes {
            vr: VR::PN,
            data: "Müller ".as_bytes().to_vec(),
            bytes_remaining: 0,
        }));
    }

    #[test]
    fn big_endian_values_are_swabbed() {
        let mut data = fmi_with_transfer_syntax("1.2.840.10008.1.2.2");
        #[rustfmt::skip]
        data.extend_from_slice(&[
            0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, // (0028,0010) US 2, BE
            0x02, 0x00, // value: 512, big endian
        ]);

        let parts = read_all(&data).unwrap();
        assert!(parts.contains(&Part::DataElementValueBytes {
            vr: VR::US,
            data: vec![0x00, 0x02], // little endian 512
            bytes_remaining: 0,
        }));
    }

    #[test]
    fn deflated_data_set_is_inflated() {
        use std::io::Write;

        #[rustfmt::skip]
        static ELEMENT: &[u8] = &[
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00,
            b'M', b'R',
        ];
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(6));
        encoder.write_all(ELEMENT).unwrap();
        let deflated = encoder.finish().unwrap();

        let mut data = fmi_with_transfer_syntax("1.2.840.10008.1.2.1.99");
        data.extend_from_slice(&deflated);

        let parts = read_all(&data).unwrap();
        assert!(parts.contains(&Part::DataElementValueBytes {
            vr: VR::CS,
            data: b"MR".to_vec(),
            bytes_remaining: 0,
        }));
    }

    #[test]
    fn unsupported_transfer_syntax() {
        let data = fmi_with_transfer_syntax("1.2.3.4.5");
        let error = read_all(&data).unwrap_err();
        assert!(matches!(
            error,
            P10Error::UnsupportedTransferSyntax { uid } if uid == "1.2.3.4.5"
        ));
    }

    #[test]
    fn group_length_elements_are_swallowed() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x08, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, // (0008,0000) group length
            0x0A, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00, // (0008,0060)
            b'M', b'R',
        ];

        let parts = read_all(DATA).unwrap();
        assert!(!parts.iter().any(|p| matches!(
            p,
            Part::DataElementHeader {
                tag: Tag(0x0008, 0x0000),
                ..
            }
        )));
        assert!(parts.iter().any(|p| matches!(
            p,
            Part::DataElementHeader {
                tag: Tag(0x0008, 0x0060),
                ..
            }
        )));
    }

    /// A File Meta Information declaring Explicit VR Little Endian.
    fn explicit_le_fmi() -> Vec<u8> {
        fmi_with_transfer_syntax("1.2.840.10008.1.2.1")
    }

    /// A preamble plus a File Meta Information declaring the given
    /// transfer syntax.
    fn fmi_with_transfer_syntax(uid: &str) -> Vec<u8> {
        let mut uid_bytes = uid.as_bytes().to_vec();
        if uid_bytes.len() % 2 == 1 {
            uid_bytes.push(0x00);
        }

        let group_length = 8 + uid_bytes.len() as u32;

        let mut data = vec![0u8; 128];
        data.extend_from_slice(b"DICM");
        data.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00]);
        data.extend_from_slice(&group_length.to_le_bytes());
        data.extend_from_slice(&[0x02, 0x00, 0x10, 0x00, b'U', b'I']);
        data.extend_from_slice(&(uid_bytes.len() as u16).to_le_bytes());
        data.extend_from_slice(&uid_bytes);
        data
    }
}
