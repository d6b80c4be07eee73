//! The standard data element dictionary.
//!
//! The dictionary maps tags to their keyword, display name, VR and VM. It is
//! consulted to infer VRs under Implicit VR transfer syntaxes and to resolve
//! human-readable names when printing. The table is a curated subset of
//! PS3.6 covering the attributes this toolkit works with; unknown tags
//! degrade gracefully to `UN` and tag-formatted names.

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::tag::Tag;
use crate::vr::{ValueMultiplicity, VR};

mod entries;

use entries::ENTRIES;

/// One entry of the data element dictionary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    /// The data element tag.
    pub tag: Tag,
    /// The attribute keyword, e.g. `PatientName`.
    pub keyword: &'static str,
    /// The attribute's display name, e.g. `Patient's Name`.
    pub name: &'static str,
    /// The value representation. For attributes defined as `US or SS` the
    /// unsigned variant is listed.
    pub vr: VR,
    /// The value multiplicity.
    pub vm: ValueMultiplicity,
}

static INDEX: Lazy<HashMap<Tag, &'static Entry>> = Lazy::new(|| {
    let mut index = HashMap::with_capacity(ENTRIES.len());
    for entry in ENTRIES {
        index.insert(entry.tag, entry);
    }
    index
});

/// Look up the dictionary entry for a tag.
pub fn find(tag: Tag) -> Option<&'static Entry> {
    INDEX.get(&tag).copied()
}

/// The VR to use for a tag when decoding Implicit VR data. Unknown tags,
/// including private tags whose creator has no registered dictionary, decode
/// as `UN`.
pub fn vr_for_tag(tag: Tag) -> VR {
    if let Some(entry) = find(tag) {
        return entry.vr;
    }
    if tag.is_group_length() {
        VR::UL
    } else if tag.is_private_creator() {
        VR::LO
    } else {
        VR::UN
    }
}

/// The display name for a tag. Private tags are qualified with their private
/// creator when one is supplied; tags absent from the dictionary render as
/// their block classification or nothing at all.
pub fn tag_name(tag: Tag, private_creator: Option<&str>) -> Cow<'static, str> {
    if let Some(entry) = find(tag) {
        return Cow::Borrowed(entry.name);
    }
    if tag.is_group_length() {
        return Cow::Borrowed("Group Length");
    }
    if tag.is_private_creator() {
        return Cow::Borrowed("Private Creator");
    }
    if tag.is_private() {
        return match private_creator {
            Some(creator) => Cow::Owned(format!("Private Data ({})", creator.trim())),
            None => Cow::Borrowed("Private Data"),
        };
    }
    Cow::Borrowed("")
}

/// Format a tag followed by its display name, e.g.
/// `(0010,0010) Patient's Name`, for error messages and printed output.
pub fn tag_with_name(tag: Tag, private_creator: Option<&str>) -> String {
    let name = tag_name(tag, private_creator);
    if name.is_empty() {
        tag.to_string()
    } else {
        format!("{} {}", tag, name)
    }
}

/// Well-known tag constants for the attributes this toolkit addresses by
/// name.
pub mod tags {
    use crate::tag::Tag;

    pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
    pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
    pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
    pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
    pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
    pub const IMPLEMENTATION_VERSION_NAME: Tag = Tag(0x0002, 0x0013);

    pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
    pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
    pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);

    pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
    pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
    pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);

    pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
    pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);

    pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
    pub const ROWS: Tag = Tag(0x0028, 0x0010);
    pub const COLUMNS: Tag = Tag(0x0028, 0x0011);

    pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

    pub const DATA_SET_TRAILING_PADDING: Tag = Tag(0xFFFC, 0xFFFC);

    pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
    pub const ITEM_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE00D);
    pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE0DD);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_lookup() {
        let entry = find(tags::PATIENT_NAME).unwrap();
        assert_eq!(entry.keyword, "PatientName");
        assert_eq!(entry.vr, VR::PN);

        assert_eq!(vr_for_tag(tags::TRANSFER_SYNTAX_UID), VR::UI);
        assert_eq!(vr_for_tag(Tag(0x0028, 0x0010)), VR::US);
    }

    #[test]
    fn synthetic_entries() {
        assert_eq!(vr_for_tag(Tag(0x0008, 0x0000)), VR::UL);
        assert_eq!(vr_for_tag(Tag(0x0009, 0x0010)), VR::LO);
        assert_eq!(vr_for_tag(Tag(0x0009, 0x1001)), VR::UN);
        assert_eq!(tag_name(Tag(0x0009, 0x0010), None), "Private Creator");
    }

    #[test]
    fn name_formatting() {
        assert_eq!(
            tag_with_name(tags::PATIENT_NAME, None),
            "(0010,0010) Patient's Name"
        );
        assert_eq!(
            tag_name(Tag(0x0009, 0x1001), Some("ACME 1.1")),
            "Private Data (ACME 1.1)"
        );
        assert_eq!(tag_with_name(Tag(0x0051, 0x0000), None), "(0051,0000) Group Length");
        assert_eq!(tag_with_name(Tag(0x0024, 0x9999), None), "(0024,9999)");
    }

    #[test]
    fn entries_are_sorted_and_unique() {
        for pair in ENTRIES.windows(2) {
            assert!(pair[0].tag < pair[1].tag, "{} out of order", pair[1].tag);
        }
    }
}
