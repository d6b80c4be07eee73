//! A transform that removes data elements from a part stream.

use dcmio_core::{DataSet, Tag, VR};

use crate::builder::DataSetBuilder;
use crate::part::Part;
use crate::{P10Error, Result};

/// One frame of the filter's location stack: a data element the stream is
/// currently inside, and whether it was kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationEntry {
    /// The tag of the data element or sequence.
    pub tag: Tag,
    /// Whether the predicate kept it.
    pub kept: bool,
    /// Whether the entry is a sequence (or encapsulated pixel data).
    pub is_sequence: bool,
}

/// The predicate deciding which data elements pass the filter. It receives
/// the element's tag and VR together with the stack of enclosing data
/// elements, outermost first.
pub type FilterPredicate = Box<dyn FnMut(Tag, VR, &[LocationEntry]) -> bool>;

/// A transform that filters data elements out of a part stream.
///
/// The predicate is invoked once per data element, at its start. Elements
/// whose ancestors were filtered out are dropped without consulting the
/// predicate, so a rejected sequence disappears along with everything
/// nested inside it.
pub struct FilterTransform {
    predicate: FilterPredicate,
    location: Vec<LocationEntry>,
    builder: Option<DataSetBuilder>,
}

impl std::fmt::Debug for FilterTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FilterTransform")
            .field("location", &self.location)
            .field("materializing", &self.builder.is_some())
            .finish()
    }
}

impl FilterTransform {
    /// Create a filter from a predicate. When `materialize` is set, the
    /// parts that pass are additionally collected into a data set,
    /// available from [`FilterTransform::data_set`] once the stream ends.
    pub fn new(predicate: FilterPredicate, materialize: bool) -> FilterTransform {
        FilterTransform {
            predicate,
            location: Vec::new(),
            builder: materialize.then(DataSetBuilder::new),
        }
    }

    /// Feed the next part. Returns whether the part passes the filter.
    pub fn add_part(&mut self, part: &Part) -> Result<bool> {
        let keep = match part {
            Part::FilePreambleAndDicmPrefix { .. }
            | Part::FileMetaInformation { .. }
            | Part::End => true,

            Part::DataElementHeader { tag, vr, .. } => {
                let kept = self.ancestors_kept() && (self.predicate)(*tag, *vr, &self.location);
                self.location.push(LocationEntry {
                    tag: *tag,
                    kept,
                    is_sequence: false,
                });
                kept
            }

            Part::SequenceStart { tag, vr } => {
                let kept = self.ancestors_kept() && (self.predicate)(*tag, *vr, &self.location);
                self.location.push(LocationEntry {
                    tag: *tag,
                    kept,
                    is_sequence: true,
                });
                kept
            }

            Part::SequenceDelimiter => {
                let entry = self
                    .location
                    .pop()
                    .ok_or_else(|| P10Error::PartStreamInvalid {
                        details: "Sequence delimiter without an open sequence".into(),
                    })?;
                entry.kept
            }

            Part::SequenceItemStart
            | Part::SequenceItemDelimiter
            | Part::PixelDataItem { .. } => self.ancestors_kept(),

            Part::DataElementValueBytes {
                bytes_remaining, ..
            } => {
                let entry = *self
                    .location
                    .last()
                    .ok_or_else(|| P10Error::PartStreamInvalid {
                        details: "Value bytes outside of any data element".into(),
                    })?;
                // primitive elements close on their final chunk; fragments
                // inside encapsulated pixel data leave the sequence open
                if !entry.is_sequence && *bytes_remaining == 0 {
                    self.location.pop();
                }
                entry.kept
            }
        };

        if keep {
            if let Some(builder) = self.builder.as_mut() {
                builder.add_part(part)?;
            }
        }

        Ok(keep)
    }

    /// The data set of everything that passed the filter. Only available
    /// when materialization was requested and the stream has ended.
    pub fn data_set(&mut self) -> Result<DataSet> {
        match self.builder.as_mut() {
            Some(builder) => builder.final_data_set(),
            None => Err(P10Error::PartStreamInvalid {
                details: "Filter transform was not materializing a data set".into(),
            }),
        }
    }

    fn ancestors_kept(&self) -> bool {
        self.location.iter().all(|entry| entry.kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(tag: Tag, vr: VR, length: u32) -> Part {
        Part::DataElementHeader { tag, vr, length }
    }

    fn value(vr: VR, data: &[u8]) -> Part {
        Part::DataElementValueBytes {
            vr,
            data: data.to_vec(),
            bytes_remaining: 0,
        }
    }

    #[test]
    fn drops_matching_elements_and_their_values() {
        let mut filter = FilterTransform::new(
            Box::new(|tag, _, _| tag != Tag(0x0010, 0x0010)),
            false,
        );

        assert!(filter
            .add_part(&header(Tag(0x0008, 0x0060), VR::CS, 2))
            .unwrap());
        assert!(filter.add_part(&value(VR::CS, b"MR")).unwrap());

        assert!(!filter
            .add_part(&header(Tag(0x0010, 0x0010), VR::PN, 8))
            .unwrap());
        assert!(!filter.add_part(&value(VR::PN, b"Doe^John")).unwrap());

        assert!(filter.add_part(&Part::End).unwrap());
    }

    #[test]
    fn descendants_of_rejected_sequences_skip_the_predicate() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let calls = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&calls);

        let mut filter = FilterTransform::new(
            Box::new(move |tag, _, _| {
                recorded.borrow_mut().push(tag);
                tag != Tag(0x0040, 0x0275)
            }),
            false,
        );

        let parts = [
            Part::SequenceStart {
                tag: Tag(0x0040, 0x0275),
                vr: VR::SQ,
            },
            Part::SequenceItemStart,
            header(Tag(0x0008, 0x0100), VR::SH, 2),
            value(VR::SH, b"A "),
            Part::SequenceItemDelimiter,
            Part::SequenceDelimiter,
            header(Tag(0x0020, 0x0013), VR::IS, 2),
            value(VR::IS, b"1 "),
        ];

        let kept: Vec<bool> = parts
            .iter()
            .map(|p| filter.add_part(p).unwrap())
            .collect();

        assert_eq!(kept, vec![false, false, false, false, false, false, true, true]);
        // the nested element was never offered to the predicate
        assert_eq!(*calls.borrow(), vec![Tag(0x0040, 0x0275), Tag(0x0020, 0x0013)]);
    }

    #[test]
    fn materializes_the_kept_data_set() {
        let mut filter = FilterTransform::new(
            Box::new(|tag, _, _| !tag.is_private()),
            true,
        );

        for part in [
            header(Tag(0x0008, 0x0060), VR::CS, 2),
            value(VR::CS, b"MR"),
            header(Tag(0x0009, 0x1001), VR::LO, 4),
            value(VR::LO, b"ACME"),
            Part::End,
        ] {
            filter.add_part(&part).unwrap();
        }

        let data_set = filter.data_set().unwrap();
        assert_eq!(data_set.len(), 1);
        assert_eq!(data_set.get_string(Tag(0x0008, 0x0060)).unwrap(), "MR");
    }
}
