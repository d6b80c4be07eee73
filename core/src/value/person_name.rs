//! Structured access to Person Name (PN) values.

use std::fmt;

/// One component group of a person name: five `^`-separated name parts.
///
/// Trailing empty parts are omitted when formatting, as the standard
/// requires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonNameComponents {
    pub family_name: String,
    pub given_name: String,
    pub middle_name: String,
    pub prefix: String,
    pub suffix: String,
}

impl PersonNameComponents {
    /// Parse a `^`-separated component group. More than five parts is an
    /// error.
    pub fn parse(s: &str) -> Result<PersonNameComponents, String> {
        let parts: Vec<&str> = s.split('^').collect();
        if parts.len() > 5 {
            return Err(format!(
                "Person name component group has {} parts, at most 5 are allowed",
                parts.len()
            ));
        }
        let part = |i: usize| parts.get(i).map(|p| (*p).to_owned()).unwrap_or_default();
        Ok(PersonNameComponents {
            family_name: part(0),
            given_name: part(1),
            middle_name: part(2),
            prefix: part(3),
            suffix: part(4),
        })
    }

    /// Whether every name part is empty.
    pub fn is_empty(&self) -> bool {
        self.family_name.is_empty()
            && self.given_name.is_empty()
            && self.middle_name.is_empty()
            && self.prefix.is_empty()
            && self.suffix.is_empty()
    }
}

impl fmt::Display for PersonNameComponents {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts = [
            self.family_name.as_str(),
            self.given_name.as_str(),
            self.middle_name.as_str(),
            self.prefix.as_str(),
            self.suffix.as_str(),
        ];
        let last = parts.iter().rposition(|p| !p.is_empty()).map_or(0, |i| i + 1);
        f.write_str(&parts[..last].join("^"))
    }
}

/// A person name value: up to three `=`-separated component groups holding
/// the alphabetic, ideographic and phonetic renderings of the name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredPersonName {
    pub alphabetic: Option<PersonNameComponents>,
    pub ideographic: Option<PersonNameComponents>,
    pub phonetic: Option<PersonNameComponents>,
}

impl StructuredPersonName {
    /// Parse a complete person name value. More than three component groups
    /// is an error.
    pub fn parse(s: &str) -> Result<StructuredPersonName, String> {
        let groups: Vec<&str> = s.split('=').collect();
        if groups.len() > 3 {
            return Err(format!(
                "Person name has {} component groups, at most 3 are allowed",
                groups.len()
            ));
        }
        let group = |i: usize| -> Result<Option<PersonNameComponents>, String> {
            match groups.get(i) {
                Some(g) => PersonNameComponents::parse(g).map(Some),
                None => Ok(None),
            }
        };
        Ok(StructuredPersonName {
            alphabetic: group(0)?,
            ideographic: group(1)?,
            phonetic: group(2)?,
        })
    }
}

impl fmt::Display for StructuredPersonName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let groups = [
            self.alphabetic.as_ref().map(|g| g.to_string()),
            self.ideographic.as_ref().map(|g| g.to_string()),
            self.phonetic.as_ref().map(|g| g.to_string()),
        ];
        let rendered: Vec<String> = groups.iter().map(|g| g.clone().unwrap_or_default()).collect();
        let last = rendered.iter().rposition(|g| !g.is_empty()).map_or(0, |i| i + 1);
        f.write_str(&rendered[..last].join("="))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_name() {
        let name = StructuredPersonName::parse("Doe^John").unwrap();
        let alphabetic = name.alphabetic.as_ref().unwrap();
        assert_eq!(alphabetic.family_name, "Doe");
        assert_eq!(alphabetic.given_name, "John");
        assert!(name.ideographic.is_none());
        assert_eq!(name.to_string(), "Doe^John");
    }

    #[test]
    fn parse_component_groups() {
        let name = StructuredPersonName::parse("Yamada^Tarou=山田^太郎=やまだ^たろう").unwrap();
        assert_eq!(name.alphabetic.as_ref().unwrap().family_name, "Yamada");
        assert_eq!(name.ideographic.as_ref().unwrap().family_name, "山田");
        assert_eq!(name.phonetic.as_ref().unwrap().given_name, "たろう");
        assert_eq!(
            name.to_string(),
            "Yamada^Tarou=山田^太郎=やまだ^たろう"
        );
    }

    #[test]
    fn trailing_empty_parts_elided() {
        let name = StructuredPersonName::parse("Doe^^^^").unwrap();
        assert_eq!(name.to_string(), "Doe");
    }

    #[test]
    fn too_many_parts() {
        assert!(StructuredPersonName::parse("a^b^c^d^e^f").is_err());
        assert!(StructuredPersonName::parse("a=b=c=d").is_err());
    }
}
