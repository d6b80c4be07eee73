//! A transform that renders a part stream as human-readable lines.

use std::collections::HashMap;

use owo_colors::OwoColorize;

use dcmio_core::{dictionary, DataElementValue, DataSet, Tag, VR};

use crate::part::Part;

/// Options for formatting printed output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintOptions {
    /// The maximum width of an output line; longer lines are truncated
    /// with an ellipsis.
    pub max_width: usize,
    /// Whether to color the output with ANSI styles.
    pub styled: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            max_width: 80,
            styled: false,
        }
    }
}

/// A transform that formats a part stream as aligned, optionally colored
/// lines of text, one line per data element, sequence boundary or pixel
/// data fragment.
#[derive(Debug)]
pub struct PrintTransform {
    options: PrintOptions,
    indent: usize,
    /// per nesting level: private block element → private creator value
    private_creators: Vec<HashMap<u16, String>>,
    pending_header: Option<(Tag, VR, u32)>,
}

impl PrintTransform {
    /// Create a print transform with the given options.
    pub fn new(options: PrintOptions) -> PrintTransform {
        PrintTransform {
            options,
            indent: 0,
            private_creators: vec![HashMap::new()],
            pending_header: None,
        }
    }

    /// Feed the next part, producing the lines it completes.
    pub fn add_part(&mut self, part: &Part) -> Vec<String> {
        match part {
            Part::FilePreambleAndDicmPrefix { .. } | Part::End => vec![],

            Part::FileMetaInformation { data_set } => self.format_file_meta(data_set),

            Part::DataElementHeader { tag, vr, length } => {
                self.pending_header = Some((*tag, *vr, *length));
                vec![]
            }

            Part::DataElementValueBytes {
                data,
                bytes_remaining,
                ..
            } => {
                let Some((tag, vr, length)) = self.pending_header.take() else {
                    // continuation chunks of an already printed element
                    return vec![];
                };

                if tag.is_private_creator() {
                    let creator = String::from_utf8_lossy(data).trim_end().to_owned();
                    if let Some(level) = self.private_creators.last_mut() {
                        level.insert(tag.element(), creator);
                    }
                }

                let value = DataElementValue::new_binary_unchecked(vr, data.clone());
                let preview = format_value_preview(&value, *bytes_remaining > 0);
                vec![self.format_element_line(tag, vr, length, &preview)]
            }

            Part::SequenceStart { tag, vr } => {
                let line = self.format_element_line(*tag, *vr, 0xFFFF_FFFF, "");
                self.indent += 1;
                vec![line]
            }

            Part::SequenceItemStart => {
                let line = self.format_marker_line("item:");
                self.indent += 1;
                self.private_creators.push(HashMap::new());
                vec![line]
            }

            Part::SequenceItemDelimiter => {
                self.indent = self.indent.saturating_sub(1);
                self.private_creators.pop();
                vec![]
            }

            Part::SequenceDelimiter => {
                self.indent = self.indent.saturating_sub(1);
                vec![]
            }

            Part::PixelDataItem { length } => {
                vec![self.format_marker_line(&format!("fragment: {} bytes", length))]
            }
        }
    }

    fn format_file_meta(&mut self, data_set: &DataSet) -> Vec<String> {
        let mut lines = Vec::new();
        for (tag, value) in data_set {
            let preview = format_value_preview(value, false);
            let length = value.total_byte_size() as u32;
            lines.push(self.format_element_line(*tag, value.vr(), length, &preview));
        }
        lines
    }

    fn format_element_line(&self, tag: Tag, vr: VR, length: u32, preview: &str) -> String {
        let private_creator = tag
            .private_creator_element()
            .and_then(|block| self.private_creators.last()?.get(&block))
            .cloned();
        let name = dictionary::tag_name(tag, private_creator.as_deref());

        let indent = "  ".repeat(self.indent);
        let length = if length == 0xFFFF_FFFF {
            "u/l".to_owned()
        } else {
            format!("{}", length)
        };

        let line = if self.options.styled {
            format!(
                "{}{} {:<34} {} {:>8}  {}",
                indent,
                tag.cyan(),
                name,
                vr.green(),
                length,
                preview.yellow(),
            )
        } else {
            format!(
                "{}{} {:<34} {} {:>8}  {}",
                indent, tag, name, vr, length, preview
            )
        };

        truncate_line(line, self.options.max_width, self.options.styled)
    }

    fn format_marker_line(&self, marker: &str) -> String {
        let indent = "  ".repeat(self.indent);
        let line = format!("{}{}", indent, marker);
        truncate_line(line, self.options.max_width, self.options.styled)
    }
}

/// Render a short preview of a primitive value, with an ellipsis when more
/// chunks follow or the value is abbreviated.
fn format_value_preview(value: &DataElementValue, partial: bool) -> String {
    let vr = value.vr();
    let mut preview = if vr.is_string() {
        match value.get_strings() {
            Ok(strings) => format!("\"{}\"", strings.join("\\")),
            Err(_) => {
                let bytes = value.bytes().unwrap_or_default();
                format!("\"{}\"", String::from_utf8_lossy(bytes))
            }
        }
    } else {
        match vr {
            VR::AT => match value.get_attribute_tags() {
                Ok(tags) => tags
                    .iter()
                    .map(Tag::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                Err(_) => String::new(),
            },
            VR::FL | VR::FD => match value.get_floats() {
                Ok(floats) => floats
                    .iter()
                    .map(f64::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                Err(_) => String::new(),
            },
            VR::SS | VR::US | VR::SL | VR::UL | VR::SV | VR::UV => match value.get_big_ints() {
                Ok(ints) => ints
                    .iter()
                    .map(i128::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                Err(_) => String::new(),
            },
            VR::SQ => String::new(),
            _ => format!("[{} bytes of data]", value.total_byte_size()),
        }
    };

    if partial {
        preview.push('…');
    }
    preview
}

/// Truncate a line to the maximum width, appending an ellipsis. Styled
/// lines are not truncated, as ANSI escapes make character counting
/// unreliable without stripping them.
fn truncate_line(line: String, max_width: usize, styled: bool) -> String {
    if styled || line.chars().count() <= max_width {
        return line;
    }
    let mut truncated: String = line.chars().take(max_width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_for(parts: &[Part]) -> Vec<String> {
        let mut transform = PrintTransform::new(PrintOptions {
            max_width: 100,
            styled: false,
        });
        parts.iter().flat_map(|p| transform.add_part(p)).collect()
    }

    #[test]
    fn formats_elements_with_names_and_values() {
        let lines = lines_for(&[
            Part::DataElementHeader {
                tag: Tag(0x0010, 0x0010),
                vr: VR::PN,
                length: 8,
            },
            Part::DataElementValueBytes {
                vr: VR::PN,
                data: b"Doe^John".to_vec(),
                bytes_remaining: 0,
            },
        ]);

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("(0010,0010)"));
        assert!(lines[0].contains("Patient's Name"));
        assert!(lines[0].contains("PN"));
        assert!(lines[0].contains("\"Doe^John\""));
    }

    #[test]
    fn indents_sequence_content() {
        let lines = lines_for(&[
            Part::SequenceStart {
                tag: Tag(0x0040, 0x0275),
                vr: VR::SQ,
            },
            Part::SequenceItemStart,
            Part::DataElementHeader {
                tag: Tag(0x0008, 0x0100),
                vr: VR::SH,
                length: 2,
            },
            Part::DataElementValueBytes {
                vr: VR::SH,
                data: b"A ".to_vec(),
                bytes_remaining: 0,
            },
            Part::SequenceItemDelimiter,
            Part::SequenceDelimiter,
        ]);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("(0040,0275)"));
        assert!(lines[1].starts_with("  item:"));
        assert!(lines[2].starts_with("    (0008,0100)"));
    }

    #[test]
    fn resolves_private_tag_names_through_creators() {
        let lines = lines_for(&[
            Part::DataElementHeader {
                tag: Tag(0x0009, 0x0010),
                vr: VR::LO,
                length: 8,
            },
            Part::DataElementValueBytes {
                vr: VR::LO,
                data: b"ACME 1.1".to_vec(),
                bytes_remaining: 0,
            },
            Part::DataElementHeader {
                tag: Tag(0x0009, 0x1002),
                vr: VR::UN,
                length: 2,
            },
            Part::DataElementValueBytes {
                vr: VR::UN,
                data: vec![0, 0],
                bytes_remaining: 0,
            },
        ]);

        assert!(lines[1].contains("Private Data (ACME 1.1)"));
    }

    #[test]
    fn truncates_long_lines() {
        let mut transform = PrintTransform::new(PrintOptions {
            max_width: 40,
            styled: false,
        });

        let lines: Vec<String> = [
            Part::DataElementHeader {
                tag: Tag(0x0008, 0x1030),
                vr: VR::LO,
                length: 60,
            },
            Part::DataElementValueBytes {
                vr: VR::LO,
                data: vec![b'x'; 60],
                bytes_remaining: 0,
            },
        ]
        .iter()
        .flat_map(|p| transform.add_part(p))
        .collect();

        assert_eq!(lines[0].chars().count(), 40);
        assert!(lines[0].ends_with('…'));
    }
}
