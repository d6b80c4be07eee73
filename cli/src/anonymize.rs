//! The anonymization predicate: which data elements survive `--anonymize`.

use dcmio_core::{Tag, VR};

/// Data elements that identify the patient or could contribute to
/// identification, removed on top of the private and patient-group rules.
/// Sorted for binary search.
#[rustfmt::skip]
const IDENTIFYING_TAGS: [Tag; 41] = [
    Tag(0x0008, 0x0014), // Instance Creator UID
    Tag(0x0008, 0x0050), // Accession Number
    Tag(0x0008, 0x0080), // Institution Name
    Tag(0x0008, 0x0081), // Institution Address
    Tag(0x0008, 0x0082), // Institution Code Sequence
    Tag(0x0008, 0x0090), // Referring Physician's Name
    Tag(0x0008, 0x0092), // Referring Physician's Address
    Tag(0x0008, 0x0094), // Referring Physician's Telephone Numbers
    Tag(0x0008, 0x0096), // Referring Physician Identification Sequence
    Tag(0x0008, 0x0201), // Timezone Offset From UTC
    Tag(0x0008, 0x1000), // Network ID
    Tag(0x0008, 0x1010), // Station Name
    Tag(0x0008, 0x1030), // Study Description
    Tag(0x0008, 0x1032), // Procedure Code Sequence
    Tag(0x0008, 0x103E), // Series Description
    Tag(0x0008, 0x103F), // Series Description Code Sequence
    Tag(0x0008, 0x1040), // Institutional Department Name
    Tag(0x0008, 0x1041), // Institutional Department Type Code Sequence
    Tag(0x0008, 0x1048), // Physician(s) of Record
    Tag(0x0008, 0x1049), // Physician(s) of Record Identification Sequence
    Tag(0x0008, 0x1050), // Performing Physician's Name
    Tag(0x0008, 0x1052), // Performing Physician Identification Sequence
    Tag(0x0008, 0x1060), // Name of Physician(s) Reading Study
    Tag(0x0008, 0x1062), // Physician(s) Reading Study Identification Sequence
    Tag(0x0008, 0x1070), // Operators' Name
    Tag(0x0008, 0x1072), // Operator Identification Sequence
    Tag(0x0008, 0x1080), // Admitting Diagnoses Description
    Tag(0x0008, 0x1084), // Admitting Diagnoses Code Sequence
    Tag(0x0018, 0x1030), // Protocol Name
    Tag(0x0020, 0x0010), // Study ID
    Tag(0x0032, 0x1033), // Requesting Service
    Tag(0x0038, 0x0500), // Patient State
    Tag(0x0040, 0x0009), // Scheduled Procedure Step ID
    Tag(0x0040, 0x0275), // Request Attributes Sequence
    Tag(0x0040, 0x1102), // Person's Address
    Tag(0x0040, 0x1103), // Person's Telephone Numbers
    Tag(0x0040, 0x1104), // Person's Telecom Information
    Tag(0x0040, 0xA124), // UID
    Tag(0x0040, 0xA730), // Content Sequence
    Tag(0x0088, 0x0140), // Storage Media File-set UID
    Tag(0x3006, 0x0024), // Referenced Frame of Reference UID
];

/// Returns whether a data element is allowed through anonymization.
///
/// Application entity titles, private data elements, the whole patient
/// group and the identifying attributes listed above are removed;
/// structural identifiers such as Study Instance UID survive.
pub fn keep_tag(tag: Tag, vr: VR) -> bool {
    if vr == VR::AE {
        return false;
    }
    if tag.is_private() {
        return false;
    }
    if tag.group() == 0x0010 {
        return false;
    }
    IDENTIFYING_TAGS.binary_search(&tag).is_err()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifying_tags_are_sorted() {
        for pair in IDENTIFYING_TAGS.windows(2) {
            assert!(pair[0] < pair[1], "{} out of order", pair[1]);
        }
    }

    #[test]
    fn patient_and_private_elements_are_removed() {
        assert!(!keep_tag(Tag(0x0010, 0x0010), VR::PN));
        assert!(!keep_tag(Tag(0x0010, 0x0030), VR::DA));
        assert!(!keep_tag(Tag(0x0009, 0x0010), VR::LO));
        assert!(!keep_tag(Tag(0x0008, 0x0050), VR::SH));
        assert!(!keep_tag(Tag(0x0008, 0x0055), VR::AE));
        // Content Sequence can carry embedded person and observer names
        assert!(!keep_tag(Tag(0x0040, 0xA730), VR::SQ));
    }

    #[test]
    fn structural_identifiers_survive() {
        assert!(keep_tag(Tag(0x0020, 0x000D), VR::UI));
        assert!(keep_tag(Tag(0x0008, 0x0016), VR::UI));
        assert!(keep_tag(Tag(0x0008, 0x0005), VR::CS));
        assert!(keep_tag(Tag(0x7FE0, 0x0010), VR::OW));
    }

    #[test]
    fn anonymize_with_deletions_keeps_study_instance_uid() {
        use dcmio_p10::transforms::FilterTransform;
        use dcmio_p10::{data_set_parts, Part};

        let delete_tags = [Tag(0x0010, 0x0010), Tag(0x0010, 0x0030)];
        let mut filter = FilterTransform::new(
            Box::new(move |tag, vr, _| !delete_tags.contains(&tag) && keep_tag(tag, vr)),
            true,
        );

        let mut data_set = dcmio_core::DataSet::new();
        data_set
            .insert_string_value(Tag(0x0010, 0x0010), VR::PN, &["Doe^John"])
            .unwrap();
        data_set
            .insert_string_value(Tag(0x0010, 0x0030), VR::DA, &["19700101"])
            .unwrap();
        data_set
            .insert_string_value(Tag(0x0020, 0x000D), VR::UI, &["1.2.840.99.1"])
            .unwrap();

        for part in data_set_parts(&data_set) {
            filter.add_part(&part).unwrap();
        }
        filter.add_part(&Part::End).unwrap();

        let filtered = filter.data_set().unwrap();
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains(Tag(0x0020, 0x000D)));
    }
}
