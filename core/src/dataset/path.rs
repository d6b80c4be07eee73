//! Paths that address data elements inside nested data sets.

use std::fmt;

use crate::tag::Tag;

/// One step of a [`DataSetPath`]: either a data element in the current data
/// set, or an item index inside the sequence addressed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSetPathEntry {
    /// A data element, addressed by tag.
    DataElement { tag: Tag },
    /// An item of a sequence, addressed by zero-based index.
    SequenceItem { index: usize },
}

/// The location of a data element or sequence item in a nested data set.
///
/// A valid path alternates data element and sequence item entries, starting
/// with a data element, e.g. `(0040,0275)/[0]/(0008,0100)`. Paths locate
/// errors raised while reading and are used to reconstruct context during
/// recursive JSON decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataSetPath {
    entries: Vec<DataSetPathEntry>,
}

impl DataSetPath {
    /// Create an empty path pointing at the root data set.
    pub fn new() -> DataSetPath {
        DataSetPath {
            entries: Vec::new(),
        }
    }

    /// Create a path pointing at a data element of the root data set.
    pub fn new_with_data_element(tag: Tag) -> DataSetPath {
        DataSetPath {
            entries: vec![DataSetPathEntry::DataElement { tag }],
        }
    }

    /// The entries of this path, outermost first.
    pub fn entries(&self) -> &[DataSetPathEntry] {
        &self.entries
    }

    /// Whether the path points at the root data set.
    pub fn is_root(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of entries in the path.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the path is empty. Equivalent to [`DataSetPath::is_root`].
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of sequence items on the path, i.e. the sequence nesting
    /// depth of the location.
    pub fn sequence_item_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DataSetPathEntry::SequenceItem { .. }))
            .count()
    }

    /// The tag of the data element the path points at, if it points at one.
    pub fn last_data_element(&self) -> Option<Tag> {
        match self.entries.last() {
            Some(DataSetPathEntry::DataElement { tag }) => Some(*tag),
            _ => None,
        }
    }

    /// Append a data element entry. Fails if the path currently ends in a
    /// data element, as two elements cannot nest directly.
    pub fn add_data_element(&mut self, tag: Tag) -> Result<(), String> {
        match self.entries.last() {
            None | Some(DataSetPathEntry::SequenceItem { .. }) => {
                self.entries.push(DataSetPathEntry::DataElement { tag });
                Ok(())
            }
            _ => Err(format!("Invalid data set path entry: {}", tag)),
        }
    }

    /// Append a sequence item entry. Fails unless the path currently ends in
    /// a data element (the sequence the item belongs to).
    pub fn add_sequence_item(&mut self, index: usize) -> Result<(), String> {
        match self.entries.last() {
            Some(DataSetPathEntry::DataElement { .. }) => {
                self.entries.push(DataSetPathEntry::SequenceItem { index });
                Ok(())
            }
            _ => Err(format!("Invalid data set path entry: [{}]", index)),
        }
    }

    /// Remove the last entry of the path.
    pub fn pop(&mut self) -> Option<DataSetPathEntry> {
        self.entries.pop()
    }
}

impl fmt::Display for DataSetPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for entry in &self.entries {
            if !first {
                f.write_str("/")?;
            }
            first = false;
            match entry {
                DataSetPathEntry::DataElement { tag } => write!(f, "{}", tag)?,
                DataSetPathEntry::SequenceItem { index } => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_construction_rules() {
        let mut path = DataSetPath::new();
        assert!(path.is_root());

        path.add_data_element(Tag(0x0040, 0x0275)).unwrap();
        assert!(path.add_data_element(Tag(0x0008, 0x0100)).is_err());

        path.add_sequence_item(0).unwrap();
        assert!(path.add_sequence_item(1).is_err());

        path.add_data_element(Tag(0x0008, 0x0100)).unwrap();
        assert_eq!(path.to_string(), "(0040,0275)/[0]/(0008,0100)");
        assert_eq!(path.last_data_element(), Some(Tag(0x0008, 0x0100)));
        assert_eq!(path.sequence_item_count(), 1);
    }

    #[test]
    fn path_pop() {
        let mut path = DataSetPath::new_with_data_element(Tag(0x0010, 0x0010));
        assert_eq!(
            path.pop(),
            Some(DataSetPathEntry::DataElement {
                tag: Tag(0x0010, 0x0010)
            })
        );
        assert!(path.is_root());
    }
}
