//! The reader's model of where it is inside the data set: a stack of open
//! sequences and items, together with the per-data-set state that clarifies
//! how later bytes are to be interpreted (the active character set, tag
//! ordering, CP-246 implicit VR forcing).

use dcmio_core::Tag;

use crate::part::Part;
use crate::text::SpecificCharacterSet;

#[derive(Debug)]
enum Frame {
    RootDataSet {
        last_tag: Tag,
        charset: SpecificCharacterSet,
    },
    Sequence {
        tag: Tag,
        ends_at: Option<u64>,
        /// CP-246: a sequence read from a VR of UN with undefined length is
        /// decoded as Implicit VR Little Endian, along with everything
        /// nested inside it.
        implicit_vr_forced: bool,
        item_count: usize,
    },
    Item {
        ends_at: Option<u64>,
        last_tag: Tag,
        charset: SpecificCharacterSet,
    },
}

/// The stack of open frames at the reader's current position.
#[derive(Debug)]
pub(crate) struct Location {
    frames: Vec<Frame>,
}

impl Location {
    pub fn new() -> Location {
        Location {
            frames: vec![Frame::RootDataSet {
                last_tag: Tag::ZERO,
                charset: SpecificCharacterSet::default(),
            }],
        }
    }

    /// The number of sequences currently open.
    pub fn sequence_depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| matches!(f, Frame::Sequence { .. }))
            .count()
    }

    /// Whether the current position is inside a CP-246 forced-implicit
    /// sequence.
    pub fn is_implicit_vr_forced(&self) -> bool {
        self.frames
            .iter()
            .any(|f| matches!(f, Frame::Sequence { implicit_vr_forced: true, .. }))
    }

    /// Check that `tag` is strictly greater than the previous tag of the
    /// innermost data set, and record it as the new previous tag. On
    /// violation the previous tag is returned.
    pub fn check_ordering(&mut self, tag: Tag) -> Result<(), Tag> {
        let last_tag = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|f| match f {
                Frame::RootDataSet { last_tag, .. } | Frame::Item { last_tag, .. } => {
                    Some(last_tag)
                }
                Frame::Sequence { .. } => None,
            })
            .expect("a data set frame is always open");

        if tag <= *last_tag {
            return Err(*last_tag);
        }
        *last_tag = tag;
        Ok(())
    }

    /// The character set of the innermost data set.
    pub fn active_charset(&self) -> SpecificCharacterSet {
        self.frames
            .iter()
            .rev()
            .find_map(|f| match f {
                Frame::RootDataSet { charset, .. } | Frame::Item { charset, .. } => Some(*charset),
                Frame::Sequence { .. } => None,
            })
            .expect("a data set frame is always open")
    }

    /// Set the character set of the innermost data set.
    pub fn set_charset(&mut self, new: SpecificCharacterSet) {
        for frame in self.frames.iter_mut().rev() {
            match frame {
                Frame::RootDataSet { charset, .. } | Frame::Item { charset, .. } => {
                    *charset = new;
                    return;
                }
                Frame::Sequence { .. } => {}
            }
        }
    }

    /// Open a sequence. The current frame must be a data set.
    pub fn add_sequence(
        &mut self,
        tag: Tag,
        implicit_vr_forced: bool,
        ends_at: Option<u64>,
    ) -> Result<(), String> {
        match self.frames.last() {
            Some(Frame::RootDataSet { .. }) | Some(Frame::Item { .. }) => {
                self.frames.push(Frame::Sequence {
                    tag,
                    ends_at,
                    implicit_vr_forced,
                    item_count: 0,
                });
                Ok(())
            }
            _ => Err(format!("Sequence {} is not valid here", tag)),
        }
    }

    /// Close the innermost sequence, returning its tag.
    pub fn end_sequence(&mut self) -> Result<Tag, String> {
        match self.frames.last() {
            Some(Frame::Sequence { tag, .. }) => {
                let tag = *tag;
                self.frames.pop();
                Ok(tag)
            }
            _ => Err("Sequence delimiter encountered outside of a sequence".to_owned()),
        }
    }

    /// Open an item of the innermost sequence, returning its index. The
    /// item's character set is inherited from the enclosing data set.
    pub fn add_item(&mut self, ends_at: Option<u64>) -> Result<usize, String> {
        let charset = self.active_charset();
        match self.frames.last_mut() {
            Some(Frame::Sequence { item_count, .. }) => {
                let index = *item_count;
                *item_count += 1;
                self.frames.push(Frame::Item {
                    ends_at,
                    last_tag: Tag::ZERO,
                    charset,
                });
                Ok(index)
            }
            _ => Err("Item encountered outside of a sequence".to_owned()),
        }
    }

    /// Close the innermost item.
    pub fn end_item(&mut self) -> Result<(), String> {
        match self.frames.last() {
            Some(Frame::Item { .. }) => {
                self.frames.pop();
                Ok(())
            }
            _ => Err("Item delimiter encountered outside of an item".to_owned()),
        }
    }

    /// The next fragment index of the innermost sequence, used for
    /// encapsulated pixel data items.
    pub fn next_pixel_item_index(&mut self) -> usize {
        match self.frames.last_mut() {
            Some(Frame::Sequence { item_count, .. }) => {
                let index = *item_count;
                *item_count += 1;
                index
            }
            _ => 0,
        }
    }

    /// If a defined-length sequence or item ends at the given stream
    /// offset, pop it and return the corresponding delimiter part.
    pub fn next_delimiter(&mut self, bytes_read: u64) -> Option<Part> {
        match self.frames.last() {
            Some(Frame::Sequence {
                ends_at: Some(ends_at),
                ..
            }) if bytes_read >= *ends_at => {
                self.frames.pop();
                Some(Part::SequenceDelimiter)
            }
            Some(Frame::Item {
                ends_at: Some(ends_at),
                ..
            }) if bytes_read >= *ends_at => {
                self.frames.pop();
                Some(Part::SequenceItemDelimiter)
            }
            _ => None,
        }
    }

    /// The delimiter parts that close every open sequence and item, for
    /// ending a stream that was truncated on a data element boundary.
    pub fn pending_delimiters(&mut self) -> Vec<Part> {
        let mut parts = Vec::new();
        while let Some(frame) = self.frames.last() {
            match frame {
                Frame::RootDataSet { .. } => break,
                Frame::Sequence { .. } => {
                    parts.push(Part::SequenceDelimiter);
                    self.frames.pop();
                }
                Frame::Item { .. } => {
                    parts.push(Part::SequenceItemDelimiter);
                    self.frames.pop();
                }
            }
        }
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_per_data_set() {
        let mut location = Location::new();
        location.check_ordering(Tag(0x0008, 0x0005)).unwrap();
        location.check_ordering(Tag(0x0040, 0x0275)).unwrap();

        location.add_sequence(Tag(0x0040, 0x0275), false, None).unwrap();
        location.add_item(None).unwrap();
        // items restart the ordering
        location.check_ordering(Tag(0x0008, 0x0100)).unwrap();
        assert_eq!(
            location.check_ordering(Tag(0x0008, 0x0100)),
            Err(Tag(0x0008, 0x0100))
        );

        location.end_item().unwrap();
        location.end_sequence().unwrap();
        assert_eq!(
            location.check_ordering(Tag(0x0010, 0x0010)),
            Err(Tag(0x0040, 0x0275))
        );
    }

    #[test]
    fn charset_is_inherited_and_scoped() {
        let mut location = Location::new();
        let latin1 = SpecificCharacterSet::from_code("ISO_IR 100").unwrap();
        location.set_charset(latin1);

        location.add_sequence(Tag(0x0040, 0x0275), false, None).unwrap();
        location.add_item(None).unwrap();
        assert_eq!(location.active_charset(), latin1);

        let utf8 = SpecificCharacterSet::ISO_IR_192;
        location.set_charset(utf8);
        assert_eq!(location.active_charset(), utf8);

        location.end_item().unwrap();
        location.end_sequence().unwrap();
        assert_eq!(location.active_charset(), latin1);
    }

    #[test]
    fn pending_delimiters_unwind_the_stack() {
        let mut location = Location::new();
        location.add_sequence(Tag(0x0040, 0x0275), false, None).unwrap();
        location.add_item(None).unwrap();

        assert_eq!(
            location.pending_delimiters(),
            vec![Part::SequenceItemDelimiter, Part::SequenceDelimiter]
        );
        assert!(location.pending_delimiters().is_empty());
    }

    #[test]
    fn defined_length_delimiters() {
        let mut location = Location::new();
        location.add_sequence(Tag(0x0040, 0x0275), false, Some(100)).unwrap();
        location.add_item(Some(60)).unwrap();

        assert_eq!(location.next_delimiter(59), None);
        assert_eq!(location.next_delimiter(60), Some(Part::SequenceItemDelimiter));
        assert_eq!(location.next_delimiter(100), Some(Part::SequenceDelimiter));
        assert_eq!(location.next_delimiter(200), None);
    }
}
