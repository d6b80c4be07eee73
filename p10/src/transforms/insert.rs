//! A transform that merges data elements into the root of a part stream.

use std::collections::BTreeSet;
use std::collections::VecDeque;

use dcmio_core::{DataElementValue, DataSet, Tag};

use crate::part::{element_parts, Part};
use crate::transforms::filter::FilterTransform;
use crate::Result;

/// A transform that inserts the elements of a data set into the root data
/// set of a part stream.
///
/// Pending insertions are flushed in tag order: whenever the stream opens a
/// root-level data element with a higher tag, every pending element with a
/// lower tag is emitted first as synthetic parts, and whatever remains is
/// flushed before `End`. Original elements whose tags collide with an
/// insertion are removed by an internal filter, so the output never holds
/// duplicates and stays strictly ascending.
#[derive(Debug)]
pub struct InsertTransform {
    pending: VecDeque<(Tag, DataElementValue)>,
    filter: FilterTransform,
    sequence_depth: usize,
}

impl InsertTransform {
    /// Create an insert transform from the data set to merge.
    pub fn new(data_set: DataSet) -> InsertTransform {
        let tags: BTreeSet<Tag> = data_set.tags().collect();
        let filter = FilterTransform::new(
            Box::new(move |tag, _, location| {
                !(location.is_empty() && tags.contains(&tag))
            }),
            false,
        );

        InsertTransform {
            pending: data_set.into_iter().collect(),
            filter,
            sequence_depth: 0,
        }
    }

    /// Feed the next part, producing the parts to pass downstream: any
    /// flushed insertions followed by the part itself (unless it was an
    /// original copy of an inserted element).
    pub fn add_part(&mut self, part: Part) -> Result<Vec<Part>> {
        // drop original elements that are being replaced
        if !self.filter.add_part(&part)? {
            return Ok(vec![]);
        }

        let mut parts = Vec::new();

        match &part {
            Part::DataElementHeader { tag, .. } | Part::SequenceStart { tag, .. }
                if self.sequence_depth == 0 =>
            {
                self.flush_up_to(Some(*tag), &mut parts);
            }
            Part::End => self.flush_up_to(None, &mut parts),
            _ => {}
        }

        match &part {
            Part::SequenceStart { .. } => self.sequence_depth += 1,
            Part::SequenceDelimiter => self.sequence_depth -= 1,
            _ => {}
        }

        parts.push(part);
        Ok(parts)
    }

    /// Emit pending insertions with tags lower than `before`, or all of
    /// them when `before` is `None`.
    fn flush_up_to(&mut self, before: Option<Tag>, parts: &mut Vec<Part>) {
        while let Some((tag, _)) = self.pending.front() {
            if before.is_some_and(|limit| *tag >= limit) {
                break;
            }
            let (tag, value) = self.pending.pop_front().expect("front was just checked");
            element_parts(tag, &value, parts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::VR;
    use pretty_assertions::assert_eq;

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

    fn element_tags(parts: &[Part]) -> Vec<Tag> {
        parts
            .iter()
            .filter_map(|p| match p {
                Part::DataElementHeader { tag, .. } => Some(*tag),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn inserts_interleave_in_tag_order() {
        let mut to_insert = DataSet::new();
        to_insert
            .insert_string_value(Tag(0x0008, 0x0060), VR::CS, &["MR"])
            .unwrap();
        to_insert
            .insert_string_value(Tag(0x0010, 0x0040), VR::CS, &["F"])
            .unwrap();

        let mut transform = InsertTransform::new(to_insert);

        let mut output = Vec::new();
        for part in [
            header(Tag(0x0008, 0x0020), VR::DA, 8),
            value(VR::DA, b"20240101"),
            header(Tag(0x0010, 0x0010), VR::PN, 8),
            value(VR::PN, b"Doe^John"),
            Part::End,
        ] {
            output.extend(transform.add_part(part).unwrap());
        }

        assert_eq!(
            element_tags(&output),
            vec![
                Tag(0x0008, 0x0020),
                Tag(0x0008, 0x0060),
                Tag(0x0010, 0x0010),
                Tag(0x0010, 0x0040),
            ]
        );
        assert_eq!(output.last(), Some(&Part::End));
    }

    #[test]
    fn original_copies_of_inserted_tags_are_replaced() {
        let mut to_insert = DataSet::new();
        to_insert
            .insert_string_value(Tag(0x0008, 0x0060), VR::CS, &["CT"])
            .unwrap();

        let mut transform = InsertTransform::new(to_insert);

        let mut output = Vec::new();
        for part in [
            header(Tag(0x0008, 0x0060), VR::CS, 2),
            value(VR::CS, b"MR"),
            header(Tag(0x0010, 0x0010), VR::PN, 8),
            value(VR::PN, b"Doe^John"),
            Part::End,
        ] {
            output.extend(transform.add_part(part).unwrap());
        }

        assert_eq!(
            element_tags(&output),
            vec![Tag(0x0008, 0x0060), Tag(0x0010, 0x0010)]
        );
        assert!(output.contains(&value(VR::CS, b"CT")));
        assert!(!output.contains(&value(VR::CS, b"MR")));
    }

    #[test]
    fn insertions_do_not_reach_into_sequences() {
        let mut to_insert = DataSet::new();
        to_insert
            .insert_string_value(Tag(0x0018, 0x0015), VR::CS, &["HEAD"])
            .unwrap();

        let mut transform = InsertTransform::new(to_insert);

        let mut output = Vec::new();
        for part in [
            Part::SequenceStart {
                tag: Tag(0x0008, 0x1110),
                vr: VR::SQ,
            },
            Part::SequenceItemStart,
            // a tag above the insertion, but nested: no flush may happen
            header(Tag(0x0020, 0x0013), VR::IS, 2),
            value(VR::IS, b"1 "),
            Part::SequenceItemDelimiter,
            Part::SequenceDelimiter,
            Part::End,
        ] {
            output.extend(transform.add_part(part).unwrap());
        }

        // the insertion lands after the sequence, right before End
        let insert_position = output
            .iter()
            .position(|p| matches!(p, Part::DataElementHeader { tag, .. } if *tag == Tag(0x0018, 0x0015)))
            .unwrap();
        let delimiter_position = output
            .iter()
            .position(|p| *p == Part::SequenceDelimiter)
            .unwrap();
        assert!(insert_position > delimiter_position);
    }
}
