//! The DICOM attribute tag type and its conversions.

use std::fmt;
use std::str::FromStr;

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// The data type for DICOM data element tags.
///
/// A tag is an ordered `(group, element)` pair of 16-bit numbers. Ordering is
/// lexicographic over the pair, which matches the ascending order required of
/// data elements within a data set. Both `(u16, u16)` and `[u16; 2]` can be
/// efficiently converted to this type.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// The smallest possible tag, `(0000,0000)`.
    pub const ZERO: Tag = Tag(0x0000, 0x0000);

    /// The item tag, `(FFFE,E000)`.
    pub const ITEM: Tag = Tag(0xFFFE, 0xE000);

    /// The item delimitation tag, `(FFFE,E00D)`.
    pub const ITEM_DELIMITATION: Tag = Tag(0xFFFE, 0xE00D);

    /// The sequence delimitation tag, `(FFFE,E0DD)`.
    pub const SEQUENCE_DELIMITATION: Tag = Tag(0xFFFE, 0xE0DD);

    /// Getter for the tag's group value.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// Getter for the tag's element value.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Whether this tag belongs to a private (odd) group.
    #[inline]
    pub fn is_private(self) -> bool {
        self.0 & 1 == 1
    }

    /// Whether this tag reserves a private block, i.e. its group is odd and
    /// its element is in the range `0x0010..=0x00FF`.
    #[inline]
    pub fn is_private_creator(self) -> bool {
        self.is_private() && (0x0010..=0x00FF).contains(&self.1)
    }

    /// Whether this is a group length tag (element `0x0000`).
    #[inline]
    pub fn is_group_length(self) -> bool {
        self.1 == 0x0000
    }

    /// For a tag inside a private block, the element of the private creator
    /// tag that owns the block. Returns `None` for non-private tags and for
    /// tags outside any block.
    pub fn private_creator_element(self) -> Option<ElementNumber> {
        if !self.is_private() {
            return None;
        }
        let block = self.1 >> 8;
        if (0x10..=0xFF).contains(&block) {
            Some(block)
        } else {
            None
        }
    }

    /// Render the tag as eight uppercase hexadecimal digits, the form used
    /// as a key in DICOM JSON.
    pub fn to_hex_string(self) -> String {
        format!("{:04X}{:04X}", self.0, self.1)
    }

    /// Parse a tag from eight hexadecimal digits.
    pub fn from_hex_str(s: &str) -> Option<Tag> {
        if s.len() != 8 || !s.bytes().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let group = u16::from_str_radix(&s[0..4], 16).ok()?;
        let element = u16::from_str_radix(&s[4..8], 16).ok()?;
        Some(Tag(group, element))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X?}, {:#06X?})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl PartialEq<(u16, u16)> for Tag {
    fn eq(&self, other: &(u16, u16)) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl PartialEq<[u16; 2]> for Tag {
    fn eq(&self, other: &[u16; 2]) -> bool {
        self.0 == other[0] && self.1 == other[1]
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

impl From<[u16; 2]> for Tag {
    #[inline]
    fn from(value: [u16; 2]) -> Tag {
        Tag(value[0], value[1])
    }
}

/// Parse a tag from the text forms `(GGGG,EEEE)`, `GGGG,EEEE` or `GGGGEEEE`.
impl FromStr for Tag {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<_> = s.split(',').collect();
        let (g, e) = match parts.as_slice() {
            [all] if all.len() == 8 => (&all[0..4], &all[4..8]),
            [g, e] => (g.trim(), e.trim()),
            _ => return Err("invalid tag format"),
        };
        let group = u16::from_str_radix(g, 16).map_err(|_| "invalid group number")?;
        let element = u16::from_str_radix(e, 16).map_err(|_| "invalid element number")?;
        Ok(Tag(group, element))
    }
}

#[cfg(test)]
mod tests {
    use super::Tag;

    #[test]
    fn tag_from_u16_pair() {
        let t = Tag::from((0x0010u16, 0x0020u16));
        assert_eq!(0x0010u16, t.group());
        assert_eq!(0x0020u16, t.element());
    }

    #[test]
    fn tag_display_and_hex() {
        assert_eq!(Tag(0x7FE0, 0x0010).to_string(), "(7FE0,0010)");
        assert_eq!(Tag(0x0008, 0x0005).to_hex_string(), "00080005");
        assert_eq!(Tag::from_hex_str("00100010"), Some(Tag(0x0010, 0x0010)));
        assert_eq!(Tag::from_hex_str("0010001"), None);
    }

    #[test]
    fn tag_parsing() {
        assert_eq!("(0010,0010)".parse(), Ok(Tag(0x0010, 0x0010)));
        assert_eq!("0002,0010".parse(), Ok(Tag(0x0002, 0x0010)));
        assert_eq!("7FE00010".parse(), Ok(Tag(0x7FE0, 0x0010)));
        assert!("10,20,30".parse::<Tag>().is_err());
    }

    #[test]
    fn private_classification() {
        assert!(Tag(0x0009, 0x0001).is_private());
        assert!(!Tag(0x0010, 0x0010).is_private());
        assert!(Tag(0x0009, 0x0010).is_private_creator());
        assert!(Tag(0x0009, 0x00FF).is_private_creator());
        assert!(!Tag(0x0009, 0x0100).is_private_creator());
        assert_eq!(Tag(0x0009, 0x1012).private_creator_element(), Some(0x10));
        assert_eq!(Tag(0x0010, 0x1012).private_creator_element(), None);
    }
}
