//! The in-memory DICOM data set.

use std::borrow::Cow;
use std::collections::btree_map;
use std::collections::BTreeMap;

use num_traits::NumCast;
use smallvec::SmallVec;

use crate::dictionary;
use crate::error::{DataError, Result};
use crate::tag::Tag;
use crate::value::DataElementValue;
use crate::vr::VR;

pub mod path;

pub use path::{DataSetPath, DataSetPathEntry};

/// An ordered mapping from tags to data element values.
///
/// Iteration yields elements in ascending tag order, which is the order the
/// DICOM encoding of a data set requires. Inserting at a tag that is already
/// present overwrites the previous value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSet {
    elements: BTreeMap<Tag, DataElementValue>,
}

impl DataSet {
    /// Create an empty data set.
    pub fn new() -> DataSet {
        DataSet {
            elements: BTreeMap::new(),
        }
    }

    /// The number of data elements in this data set.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether this data set has no data elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Insert a data element, replacing any previous value at the same tag.
    pub fn insert(&mut self, tag: Tag, value: DataElementValue) -> Option<DataElementValue> {
        self.elements.insert(tag, value)
    }

    /// Insert a string data element with the given VR.
    pub fn insert_string_value(&mut self, tag: Tag, vr: VR, values: &[&str]) -> Result<()> {
        let value = DataElementValue::new_string(vr, values)?;
        self.elements.insert(tag, value);
        Ok(())
    }

    /// Remove the data element at the given tag, returning its value.
    pub fn remove(&mut self, tag: Tag) -> Option<DataElementValue> {
        self.elements.remove(&tag)
    }

    /// Borrow the value at the given tag.
    pub fn get(&self, tag: Tag) -> Option<&DataElementValue> {
        self.elements.get(&tag)
    }

    /// Whether the data set has a data element at the given tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.elements.contains_key(&tag)
    }

    /// Iterate over the data elements in ascending tag order.
    pub fn iter(&self) -> btree_map::Iter<'_, Tag, DataElementValue> {
        self.elements.iter()
    }

    /// The tags present in this data set, in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.elements.keys().copied()
    }

    fn require(&self, tag: Tag) -> Result<&DataElementValue> {
        self.elements
            .get(&tag)
            .ok_or(DataError::TagNotPresent { tag })
    }

    /// The single string value of the element at `tag`.
    pub fn get_string(&self, tag: Tag) -> Result<String> {
        self.require(tag)?.get_string()
    }

    /// All string values of the element at `tag`.
    pub fn get_strings(&self, tag: Tag) -> Result<SmallVec<[String; 1]>> {
        self.require(tag)?.get_strings()
    }

    /// The single integer value of the element at `tag`.
    pub fn get_int<T: NumCast>(&self, tag: Tag) -> Result<T> {
        self.require(tag)?.get_int()
    }

    /// All integer values of the element at `tag`.
    pub fn get_ints<T: NumCast>(&self, tag: Tag) -> Result<SmallVec<[T; 1]>> {
        self.require(tag)?.get_ints()
    }

    /// The single floating point value of the element at `tag`.
    pub fn get_float(&self, tag: Tag) -> Result<f64> {
        self.require(tag)?.get_float()
    }

    /// All floating point values of the element at `tag`.
    pub fn get_floats(&self, tag: Tag) -> Result<SmallVec<[f64; 1]>> {
        self.require(tag)?.get_floats()
    }

    /// The items of the sequence at `tag`.
    pub fn get_sequence_items(&self, tag: Tag) -> Result<&[DataSet]> {
        self.require(tag)?.sequence_items()
    }

    /// The private creator string owning the block of the given private tag,
    /// looked up in this data set.
    pub fn private_creator_for_tag(&self, tag: Tag) -> Option<String> {
        let block = tag.private_creator_element()?;
        let creator_tag = Tag(tag.group(), block);
        if creator_tag == tag {
            return None;
        }
        self.get(creator_tag)?.get_string().ok()
    }

    /// The display name for a tag, resolving private creators through this
    /// data set's contents.
    pub fn tag_name(&self, tag: Tag) -> Cow<'static, str> {
        let private_creator = self.private_creator_for_tag(tag);
        dictionary::tag_name(tag, private_creator.as_deref())
    }

    /// An estimate of the in-memory size of the data set in bytes, counting
    /// a fixed overhead per data element.
    pub fn total_byte_size(&self) -> u64 {
        self.elements
            .values()
            .map(|v| v.total_byte_size() + 32)
            .sum()
    }
}

impl IntoIterator for DataSet {
    type Item = (Tag, DataElementValue);
    type IntoIter = btree_map::IntoIter<Tag, DataElementValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = (&'a Tag, &'a DataElementValue);
    type IntoIter = btree_map::Iter<'a, Tag, DataElementValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl FromIterator<(Tag, DataElementValue)> for DataSet {
    fn from_iter<I: IntoIterator<Item = (Tag, DataElementValue)>>(iter: I) -> DataSet {
        DataSet {
            elements: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_is_tag_ordered() {
        let mut data_set = DataSet::new();
        data_set
            .insert_string_value(Tag(0x0010, 0x0010), VR::PN, &["Doe^John"])
            .unwrap();
        data_set
            .insert_string_value(Tag(0x0008, 0x0060), VR::CS, &["MR"])
            .unwrap();
        data_set
            .insert_string_value(Tag(0x0008, 0x0018), VR::UI, &["1.2.3"])
            .unwrap();

        let tags: Vec<Tag> = data_set.tags().collect();
        assert_eq!(
            tags,
            vec![
                Tag(0x0008, 0x0018),
                Tag(0x0008, 0x0060),
                Tag(0x0010, 0x0010)
            ]
        );
    }

    #[test]
    fn duplicate_insert_overwrites() {
        let mut data_set = DataSet::new();
        data_set
            .insert_string_value(Tag(0x0008, 0x0060), VR::CS, &["MR"])
            .unwrap();
        data_set
            .insert_string_value(Tag(0x0008, 0x0060), VR::CS, &["CT"])
            .unwrap();
        assert_eq!(data_set.len(), 1);
        assert_eq!(data_set.get_string(Tag(0x0008, 0x0060)).unwrap(), "CT");
    }

    #[test]
    fn missing_tag_error() {
        let data_set = DataSet::new();
        assert!(matches!(
            data_set.get_string(Tag(0x0010, 0x0010)),
            Err(DataError::TagNotPresent { tag }) if tag == Tag(0x0010, 0x0010)
        ));
    }

    #[test]
    fn private_creator_resolution() {
        let mut data_set = DataSet::new();
        data_set
            .insert_string_value(Tag(0x0009, 0x0010), VR::LO, &["ACME 1.1"])
            .unwrap();
        assert_eq!(
            data_set.private_creator_for_tag(Tag(0x0009, 0x1002)),
            Some("ACME 1.1".to_owned())
        );
        assert_eq!(data_set.private_creator_for_tag(Tag(0x0009, 0x0010)), None);
        assert_eq!(data_set.private_creator_for_tag(Tag(0x0010, 0x0010)), None);
    }
}
