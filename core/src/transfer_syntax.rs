//! Transfer syntax descriptors.

use std::fmt;

use byteordered::Endianness;

/// How value representations are carried in a data set's encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrSerialization {
    /// VRs are inferred from the dictionary.
    VrImplicit,
    /// VRs are encoded in each data element header.
    VrExplicit,
}

/// A transfer syntax: the set of encoding rules for a data set.
///
/// The four uncompressed syntaxes are fully decodable and encodable; the
/// encapsulated syntaxes are recognized so their pixel data fragments can be
/// carried through opaquely.
#[derive(Debug, PartialEq, Eq)]
pub struct TransferSyntax {
    /// The unique identifier of this transfer syntax.
    pub uid: &'static str,
    /// The transfer syntax's name, e.g. "Explicit VR Little Endian".
    pub name: &'static str,
    /// The byte order of the encoding.
    pub endianness: Endianness,
    /// Whether VRs are implicit or explicit in the encoding.
    pub vr_serialization: VrSerialization,
    /// Whether the main data set is wrapped in a raw deflate stream.
    pub is_deflated: bool,
    /// Whether pixel data is stored as encapsulated fragments.
    pub is_encapsulated: bool,
}

const fn ts(
    uid: &'static str,
    name: &'static str,
    endianness: Endianness,
    vr_serialization: VrSerialization,
    is_deflated: bool,
    is_encapsulated: bool,
) -> TransferSyntax {
    TransferSyntax {
        uid,
        name,
        endianness,
        vr_serialization,
        is_deflated,
        is_encapsulated,
    }
}

pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = ts(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    VrSerialization::VrImplicit,
    false,
    false,
);

pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = ts(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    false,
);

pub const ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = ts(
    "1.2.840.10008.1.2.1.98",
    "Encapsulated Uncompressed Explicit VR Little Endian",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = ts(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
    Endianness::Little,
    VrSerialization::VrExplicit,
    true,
    false,
);

pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = ts(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Endianness::Big,
    VrSerialization::VrExplicit,
    false,
    false,
);

pub const JPEG_BASELINE_8BIT: TransferSyntax = ts(
    "1.2.840.10008.1.2.4.50",
    "JPEG Baseline (Process 1)",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const JPEG_EXTENDED_12BIT: TransferSyntax = ts(
    "1.2.840.10008.1.2.4.51",
    "JPEG Extended (Process 2 & 4)",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const JPEG_LOSSLESS_NON_HIERARCHICAL: TransferSyntax = ts(
    "1.2.840.10008.1.2.4.57",
    "JPEG Lossless, Non-Hierarchical (Process 14)",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const JPEG_LOSSLESS_SV1: TransferSyntax = ts(
    "1.2.840.10008.1.2.4.70",
    "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const JPEG_LS_LOSSLESS: TransferSyntax = ts(
    "1.2.840.10008.1.2.4.80",
    "JPEG-LS Lossless",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const JPEG_LS_LOSSY_NEAR_LOSSLESS: TransferSyntax = ts(
    "1.2.840.10008.1.2.4.81",
    "JPEG-LS Lossy (Near-Lossless)",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const JPEG_2000_LOSSLESS_ONLY: TransferSyntax = ts(
    "1.2.840.10008.1.2.4.90",
    "JPEG 2000 (Lossless Only)",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const JPEG_2000: TransferSyntax = ts(
    "1.2.840.10008.1.2.4.91",
    "JPEG 2000",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

pub const RLE_LOSSLESS: TransferSyntax = ts(
    "1.2.840.10008.1.2.5",
    "RLE Lossless",
    Endianness::Little,
    VrSerialization::VrExplicit,
    false,
    true,
);

/// All recognized transfer syntaxes.
pub static ALL: &[&TransferSyntax] = &[
    &IMPLICIT_VR_LITTLE_ENDIAN,
    &EXPLICIT_VR_LITTLE_ENDIAN,
    &ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN,
    &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    &EXPLICIT_VR_BIG_ENDIAN,
    &JPEG_BASELINE_8BIT,
    &JPEG_EXTENDED_12BIT,
    &JPEG_LOSSLESS_NON_HIERARCHICAL,
    &JPEG_LOSSLESS_SV1,
    &JPEG_LS_LOSSLESS,
    &JPEG_LS_LOSSY_NEAR_LOSSLESS,
    &JPEG_2000_LOSSLESS_ONLY,
    &JPEG_2000,
    &RLE_LOSSLESS,
];

impl TransferSyntax {
    /// Look up a transfer syntax by its UID. Trailing NUL padding is
    /// tolerated.
    pub fn from_uid(uid: &str) -> Option<&'static TransferSyntax> {
        let uid = uid.trim_end_matches(['\0', ' ']);
        ALL.iter().find(|ts| ts.uid == uid).copied()
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_uid() {
        assert_eq!(
            TransferSyntax::from_uid("1.2.840.10008.1.2"),
            Some(&IMPLICIT_VR_LITTLE_ENDIAN)
        );
        assert_eq!(
            TransferSyntax::from_uid("1.2.840.10008.1.2.1.99\0"),
            Some(&DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN)
        );
        assert_eq!(TransferSyntax::from_uid("1.2.3.4"), None);
    }

    #[test]
    fn classification() {
        assert!(DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.is_deflated);
        assert!(JPEG_BASELINE_8BIT.is_encapsulated);
        assert_eq!(EXPLICIT_VR_BIG_ENDIAN.endianness, Endianness::Big);
        assert_eq!(
            IMPLICIT_VR_LITTLE_ENDIAN.vr_serialization,
            VrSerialization::VrImplicit
        );
    }
}
