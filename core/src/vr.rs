//! Value representations and their classification tables.

use std::fmt;
use std::str::{from_utf8, FromStr};

/// An enum type for a DICOM value representation.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Very Long
    OV,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Signed Very Long
    SV,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier (UID)
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Universal Resource Locator (URI/URL)
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
    /// Unsigned Very Long
    UV,
}

/// The size of the length field of an explicit VR data element header.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum LengthSize {
    /// A 16-bit length field; the header is 8 bytes long.
    U16,
    /// A 32-bit length field preceded by two reserved bytes; the header is
    /// 12 bytes long.
    U32,
}

impl LengthSize {
    /// The largest value length this length field can carry. Length fields
    /// of 32 bits reserve `0xFFFF_FFFF` for undefined lengths.
    pub fn max_length(self) -> u32 {
        match self {
            LengthSize::U16 => 0xFFFF,
            LengthSize::U32 => 0xFFFF_FFFE,
        }
    }
}

impl VR {
    /// Obtain the value representation corresponding to the given two bytes.
    /// Each byte should represent an alphabetic character in upper case.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(chars.as_ref())
            .ok()
            .and_then(|s| VR::from_str(s).ok())
    }

    /// Retrieve a string representation of this VR.
    pub fn to_string(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OD => "OD",
            OF => "OF",
            OL => "OL",
            OV => "OV",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            SV => "SV",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
            UV => "UV",
        }
    }

    /// Retrieve a copy of this VR's byte representation.
    /// The function returns two alphabetic characters in upper case.
    pub fn to_bytes(self) -> [u8; 2] {
        let bytes = self.to_string().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// The size of this VR's length field under explicit VR encoding.
    pub fn length_size(self) -> LengthSize {
        use VR::*;
        match self {
            OB | OD | OF | OL | OV | OW | SQ | SV | UC | UN | UR | UT | UV => LengthSize::U32,
            _ => LengthSize::U16,
        }
    }

    /// The byte used to pad values of this VR to an even length:
    /// `0x20` (space) for text, `0x00` for everything else.
    pub fn padding_byte(self) -> u8 {
        if self == VR::UI {
            0x00
        } else if self.is_string() {
            0x20
        } else {
            0x00
        }
    }

    /// Whether values of this VR hold character data.
    pub fn is_string(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UC | UI | UR | UT
        )
    }

    /// Whether values of this VR are subject to the Specific Character Set,
    /// as opposed to always using the default repertoire.
    pub fn is_encoded_string(self) -> bool {
        use VR::*;
        matches!(self, LO | LT | PN | SH | ST | UC | UT)
    }

    /// Whether string values of this VR hold multiple backslash-separated
    /// values. The text VRs LT, ST and UT are single-valued by definition and
    /// may contain backslashes in their data.
    pub fn is_multi_valued_string(self) -> bool {
        self.is_string() && !matches!(self, VR::LT | VR::ST | VR::UT | VR::UR)
    }

    /// The size in bytes of one numeric unit of this VR, used when swapping
    /// the endianness of values. VRs without fixed-size units report 1.
    pub fn unit_size(self) -> usize {
        use VR::*;
        match self {
            AT | OW | SS | US => 2,
            FL | OF | OL | SL | UL => 4,
            FD | OD | OV | SV | UV => 8,
            _ => 1,
        }
    }
}

/// Obtain the value representation corresponding to the given string.
/// The string should hold exactly two UTF-8 encoded alphabetic characters
/// in upper case, otherwise no match is made.
impl FromStr for VR {
    type Err = &'static str;

    fn from_str(string: &str) -> std::result::Result<Self, Self::Err> {
        use VR::*;
        match string {
            "AE" => Ok(AE),
            "AS" => Ok(AS),
            "AT" => Ok(AT),
            "CS" => Ok(CS),
            "DA" => Ok(DA),
            "DS" => Ok(DS),
            "DT" => Ok(DT),
            "FL" => Ok(FL),
            "FD" => Ok(FD),
            "IS" => Ok(IS),
            "LO" => Ok(LO),
            "LT" => Ok(LT),
            "OB" => Ok(OB),
            "OD" => Ok(OD),
            "OF" => Ok(OF),
            "OL" => Ok(OL),
            "OV" => Ok(OV),
            "OW" => Ok(OW),
            "PN" => Ok(PN),
            "SH" => Ok(SH),
            "SL" => Ok(SL),
            "SQ" => Ok(SQ),
            "SS" => Ok(SS),
            "ST" => Ok(ST),
            "SV" => Ok(SV),
            "TM" => Ok(TM),
            "UC" => Ok(UC),
            "UI" => Ok(UI),
            "UL" => Ok(UL),
            "UN" => Ok(UN),
            "UR" => Ok(UR),
            "US" => Ok(US),
            "UT" => Ok(UT),
            "UV" => Ok(UV),
            _ => Err("no such value representation"),
        }
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(VR::to_string(*self))
    }
}

/// The permitted number of values in a data element, as declared by the
/// dictionary. A `max` of `None` means unbounded. This is metadata only;
/// multiplicity is not enforced on write.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct ValueMultiplicity {
    /// The minimum number of values.
    pub min: u16,
    /// The maximum number of values, if bounded.
    pub max: Option<u16>,
}

impl ValueMultiplicity {
    /// Exactly one value.
    pub const ONE: ValueMultiplicity = ValueMultiplicity {
        min: 1,
        max: Some(1),
    };

    /// One or more values.
    pub const ONE_TO_MANY: ValueMultiplicity = ValueMultiplicity { min: 1, max: None };
}

impl fmt::Display for ValueMultiplicity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.min, self.max) {
            (min, Some(max)) if min == max => write!(f, "{}", min),
            (min, Some(max)) => write!(f, "{}-{}", min, max),
            (min, None) => write!(f, "{}-n", min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LengthSize, VR};

    #[test]
    fn vr_binary_conversions() {
        assert_eq!(VR::from_binary([b'P', b'N']), Some(VR::PN));
        assert_eq!(VR::from_binary([b'x', b'x']), None);
        assert_eq!(VR::OB.to_bytes(), [b'O', b'B']);
    }

    #[test]
    fn vr_length_sizes() {
        assert_eq!(VR::PN.length_size(), LengthSize::U16);
        assert_eq!(VR::US.length_size(), LengthSize::U16);
        for vr in [
            VR::OB,
            VR::OD,
            VR::OF,
            VR::OL,
            VR::OV,
            VR::OW,
            VR::SQ,
            VR::SV,
            VR::UC,
            VR::UN,
            VR::UR,
            VR::UT,
            VR::UV,
        ] {
            assert_eq!(vr.length_size(), LengthSize::U32, "VR {}", vr);
        }
        assert_eq!(LengthSize::U16.max_length(), 0xFFFF);
    }

    #[test]
    fn vr_padding() {
        assert_eq!(VR::PN.padding_byte(), 0x20);
        assert_eq!(VR::UI.padding_byte(), 0x00);
        assert_eq!(VR::OB.padding_byte(), 0x00);
    }

    #[test]
    fn vr_unit_sizes() {
        assert_eq!(VR::US.unit_size(), 2);
        assert_eq!(VR::FL.unit_size(), 4);
        assert_eq!(VR::FD.unit_size(), 8);
        assert_eq!(VR::OB.unit_size(), 1);
    }
}
