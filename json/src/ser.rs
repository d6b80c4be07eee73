//! Streaming serialization of part streams into DICOM JSON.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Number, Value as Json};

use dcmio_core::dictionary::tags;
use dcmio_core::value::is_lookup_table_descriptor_tag;
use dcmio_core::{DataElementValue, DataSet, DataSetPath, Tag, VR};
use dcmio_p10::{file_parts, Part};

use crate::{JsonConfig, JsonSerializeError};

type Result<T, E = JsonSerializeError> = std::result::Result<T, E>;

/// Serialize a data set to a DICOM JSON string. Group 0x0002 elements are
/// serialized alongside the main data set (the group length excluded), so
/// the transfer syntax always accompanies the data.
pub fn data_set_to_json(data_set: &DataSet, config: JsonConfig) -> Result<String> {
    let mut serializer = JsonSerializer::new(config);
    for part in file_parts(data_set) {
        serializer.add_part(&part)?;
    }
    serializer.finish()
}

/// A transform that consumes [`Part`]s and accumulates the DICOM JSON
/// rendering of the stream.
#[derive(Debug)]
pub struct JsonSerializer {
    config: JsonConfig,
    output: String,
    /// comma bookkeeping for each open JSON container
    needs_comma: Vec<bool>,
    pending: Option<(Tag, VR, Vec<u8>)>,
    /// the on-wire reconstruction of encapsulated pixel data, when active
    encapsulated: Option<(Tag, VR, Vec<u8>)>,
    ended: bool,
}

impl JsonSerializer {
    /// Create a serializer for one part stream.
    pub fn new(config: JsonConfig) -> JsonSerializer {
        JsonSerializer {
            config,
            output: String::from("{"),
            needs_comma: vec![false],
            pending: None,
            encapsulated: None,
            ended: false,
        }
    }

    /// Feed the next part of the stream.
    pub fn add_part(&mut self, part: &Part) -> Result<()> {
        match part {
            Part::FilePreambleAndDicmPrefix { .. } => {}

            Part::FileMetaInformation { data_set } => {
                for (tag, value) in data_set {
                    if *tag == tags::FILE_META_INFORMATION_GROUP_LENGTH {
                        continue;
                    }
                    let json = value_json(*tag, value)?;
                    self.write_entry(*tag, &json);
                }
            }

            Part::DataElementHeader { tag, vr, .. } => {
                self.pending = Some((*tag, *vr, Vec::new()));
            }

            Part::DataElementValueBytes {
                data,
                bytes_remaining,
                ..
            } => {
                if let Some((_, _, buffer)) = self.encapsulated.as_mut() {
                    buffer.extend_from_slice(data);
                    return Ok(());
                }

                let (tag, vr, mut bytes) =
                    self.pending
                        .take()
                        .ok_or_else(|| JsonSerializeError::PartStreamInvalid {
                            details: "Value bytes without a data element header".into(),
                        })?;
                bytes.extend_from_slice(data);

                if *bytes_remaining > 0 {
                    self.pending = Some((tag, vr, bytes));
                } else {
                    let value = if is_lookup_table_descriptor_tag(tag)
                        && matches!(vr, VR::US | VR::SS)
                        && bytes.len() == 6
                    {
                        DataElementValue::new_lookup_table_descriptor_unchecked(vr, bytes)
                    } else {
                        DataElementValue::new_binary_unchecked(vr, bytes)
                    };
                    let json = value_json(tag, &value)?;
                    self.write_entry(tag, &json);
                }
            }

            Part::SequenceStart { tag, vr } => match vr {
                VR::OB | VR::OW => {
                    if !self.config.store_encapsulated_pixel_data {
                        return Err(JsonSerializeError::DataInvalid {
                            details: "Encapsulated pixel data requires the \
                                      store_encapsulated_pixel_data configuration"
                                .into(),
                            path: DataSetPath::new_with_data_element(*tag),
                        });
                    }
                    self.encapsulated = Some((*tag, *vr, Vec::new()));
                }
                _ => {
                    self.begin_entry();
                    self.output
                        .push_str(&format!("\"{}\":{{\"vr\":\"SQ\",\"Value\":[", tag.to_hex_string()));
                    self.needs_comma.push(false);
                }
            },

            Part::SequenceItemStart => {
                self.begin_entry();
                self.output.push('{');
                self.needs_comma.push(false);
            }

            Part::SequenceItemDelimiter => {
                self.needs_comma.pop();
                self.output.push('}');
            }

            Part::SequenceDelimiter => {
                if let Some((tag, vr, buffer)) = self.encapsulated.take() {
                    let mut object = Map::new();
                    object.insert("vr".into(), Json::String(vr.to_string().into()));
                    object.insert("InlineBinary".into(), Json::String(BASE64.encode(buffer)));
                    self.write_entry(tag, &Json::Object(object));
                } else {
                    self.needs_comma.pop();
                    self.output.push_str("]}");
                }
            }

            Part::PixelDataItem { length } => {
                let (_, _, buffer) =
                    self.encapsulated
                        .as_mut()
                        .ok_or_else(|| JsonSerializeError::PartStreamInvalid {
                            details: "Pixel data item outside of encapsulated pixel data".into(),
                        })?;
                // the exact on-wire fragment framing is preserved
                buffer.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0]);
                buffer.extend_from_slice(&length.to_le_bytes());
            }

            Part::End => {
                self.output.push('}');
                self.ended = true;
            }
        }

        Ok(())
    }

    /// Return the accumulated JSON document. The stream must have ended.
    pub fn finish(self) -> Result<String> {
        if !self.ended {
            return Err(JsonSerializeError::PartStreamInvalid {
                details: "JSON requested before the part stream ended".into(),
            });
        }

        if self.config.pretty_print {
            let value: Json = serde_json::from_str(&self.output)
                .expect("the serializer always produces valid JSON");
            Ok(serde_json::to_string_pretty(&value)
                .expect("serialization to a string cannot fail"))
        } else {
            Ok(self.output)
        }
    }

    fn begin_entry(&mut self) {
        if let Some(needs_comma) = self.needs_comma.last_mut() {
            if *needs_comma {
                self.output.push(',');
            }
            *needs_comma = true;
        }
    }

    fn write_entry(&mut self, tag: Tag, json: &Json) {
        self.begin_entry();
        self.output.push_str(&format!(
            "\"{}\":{}",
            tag.to_hex_string(),
            serde_json::to_string(json).expect("serialization to a string cannot fail")
        ));
    }
}

/// The JSON object for one primitive data element value.
fn value_json(tag: Tag, value: &DataElementValue) -> Result<Json> {
    let vr = value.vr();

    let mut object = Map::new();
    object.insert("vr".into(), Json::String(vr.to_string().into()));

    let data_error = |details: String| JsonSerializeError::DataInvalid {
        details,
        path: DataSetPath::new_with_data_element(tag),
    };

    match vr {
        VR::AE
        | VR::AS
        | VR::CS
        | VR::DA
        | VR::DT
        | VR::LO
        | VR::LT
        | VR::SH
        | VR::ST
        | VR::TM
        | VR::UC
        | VR::UI
        | VR::UR
        | VR::UT => {
            let strings = value.get_strings().map_err(|e| data_error(e.to_string()))?;
            if !(strings.len() == 1 && strings[0].is_empty() || strings.is_empty()) {
                let values: Vec<Json> = strings
                    .iter()
                    .map(|s| {
                        if s.is_empty() {
                            Json::Null
                        } else {
                            Json::String(s.clone())
                        }
                    })
                    .collect();
                object.insert("Value".into(), Json::Array(values));
            }
        }

        VR::PN => {
            let names = value
                .get_person_names()
                .map_err(|e| data_error(e.to_string()))?;
            let empty = names.len() == 1
                && names[0].alphabetic.as_ref().map_or(true, |g| g.is_empty())
                && names[0].ideographic.is_none()
                && names[0].phonetic.is_none();
            if !names.is_empty() && !empty {
                let values: Vec<Json> = names.iter().map(person_name_json).collect();
                object.insert("Value".into(), Json::Array(values));
            }
        }

        VR::IS => {
            let strings = value.get_strings().map_err(|e| data_error(e.to_string()))?;
            if !(strings.len() == 1 && strings[0].is_empty() || strings.is_empty()) {
                let values = strings
                    .iter()
                    .map(|s| {
                        let s = s.trim();
                        if s.is_empty() {
                            return Ok(Json::Null);
                        }
                        s.parse::<i64>()
                            .map(|v| Json::Number(v.into()))
                            .map_err(|_| data_error(format!("Invalid integer string {:?}", s)))
                    })
                    .collect::<Result<Vec<Json>>>()?;
                object.insert("Value".into(), Json::Array(values));
            }
        }

        VR::DS => {
            let strings = value.get_strings().map_err(|e| data_error(e.to_string()))?;
            if !(strings.len() == 1 && strings[0].is_empty() || strings.is_empty()) {
                let values = strings
                    .iter()
                    .map(|s| {
                        let s = s.trim();
                        if s.is_empty() {
                            return Ok(Json::Null);
                        }
                        s.parse::<f64>()
                            .ok()
                            .and_then(Number::from_f64)
                            .map(Json::Number)
                            .ok_or_else(|| data_error(format!("Invalid decimal string {:?}", s)))
                    })
                    .collect::<Result<Vec<Json>>>()?;
                object.insert("Value".into(), Json::Array(values));
            }
        }

        VR::SS | VR::US | VR::SL | VR::UL => {
            let ints = value
                .get_big_ints()
                .map_err(|e| data_error(e.to_string()))?;
            if !ints.is_empty() {
                let values: Vec<Json> = ints
                    .iter()
                    .map(|v| Json::Number(Number::from(*v as i64)))
                    .collect();
                object.insert("Value".into(), Json::Array(values));
            }
        }

        VR::SV | VR::UV => {
            let ints = value
                .get_big_ints()
                .map_err(|e| data_error(e.to_string()))?;
            if !ints.is_empty() {
                // values beyond 2^53 lose precision as JSON numbers and
                // are emitted as strings instead
                let values: Vec<Json> = ints
                    .iter()
                    .map(|v| {
                        if v.unsigned_abs() > (1 << 53) {
                            Json::String(v.to_string())
                        } else {
                            Json::Number(Number::from(*v as i64))
                        }
                    })
                    .collect();
                object.insert("Value".into(), Json::Array(values));
            }
        }

        VR::FL | VR::FD => {
            let floats = value.get_floats().map_err(|e| data_error(e.to_string()))?;
            if !floats.is_empty() {
                let values: Vec<Json> = floats.iter().map(|v| float_json(*v)).collect();
                object.insert("Value".into(), Json::Array(values));
            }
        }

        VR::AT => {
            let referenced = value
                .get_attribute_tags()
                .map_err(|e| data_error(e.to_string()))?;
            if !referenced.is_empty() {
                let values: Vec<Json> = referenced
                    .iter()
                    .map(|t| Json::String(t.to_hex_string()))
                    .collect();
                object.insert("Value".into(), Json::Array(values));
            }
        }

        VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN => {
            let bytes = value.bytes().map_err(|e| data_error(e.to_string()))?;
            if !bytes.is_empty() {
                object.insert("InlineBinary".into(), Json::String(BASE64.encode(bytes)));
            }
        }

        VR::SQ => {
            return Err(data_error(
                "Sequence values cannot be rendered as primitive JSON".into(),
            ))
        }
    }

    Ok(Json::Object(object))
}

/// One non-finite-aware JSON number for FL/FD values.
fn float_json(value: f64) -> Json {
    if value.is_nan() {
        Json::String("NaN".into())
    } else if value == f64::INFINITY {
        Json::String("Infinity".into())
    } else if value == f64::NEG_INFINITY {
        Json::String("-Infinity".into())
    } else {
        Number::from_f64(value)
            .map(Json::Number)
            .unwrap_or(Json::Null)
    }
}

fn person_name_json(name: &dcmio_core::value::StructuredPersonName) -> Json {
    let mut object = Map::new();
    if let Some(group) = name.alphabetic.as_ref().filter(|g| !g.is_empty()) {
        object.insert("Alphabetic".into(), Json::String(group.to_string()));
    }
    if let Some(group) = name.ideographic.as_ref().filter(|g| !g.is_empty()) {
        object.insert("Ideographic".into(), Json::String(group.to_string()));
    }
    if let Some(group) = name.phonetic.as_ref().filter(|g| !g.is_empty()) {
        object.insert("Phonetic".into(), Json::String(group.to_string()));
    }
    if object.is_empty() {
        Json::Null
    } else {
        Json::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::dictionary::tags;
    use pretty_assertions::assert_eq;

    fn to_json(data_set: &DataSet) -> String {
        data_set_to_json(data_set, JsonConfig::default()).unwrap()
    }

    #[test]
    fn non_finite_floats_serialize_as_strings() {
        let mut data_set = DataSet::new();
        data_set.insert(
            Tag(0x0018, 0x9353),
            DataElementValue::new_floats(VR::FL, &[f64::INFINITY]).unwrap(),
        );
        data_set.insert(
            Tag(0x0018, 0x9402),
            DataElementValue::new_floats(VR::FL, &[f64::NEG_INFINITY]).unwrap(),
        );
        data_set.insert(
            Tag(0x0018, 0x9403),
            DataElementValue::new_floats(VR::FL, &[f64::NAN]).unwrap(),
        );

        assert_eq!(
            to_json(&data_set),
            "{\"00189353\":{\"vr\":\"FL\",\"Value\":[\"Infinity\"]},\
             \"00189402\":{\"vr\":\"FL\",\"Value\":[\"-Infinity\"]},\
             \"00189403\":{\"vr\":\"FL\",\"Value\":[\"NaN\"]}}"
        );
    }

    #[test]
    fn strings_and_empty_values() {
        let mut data_set = DataSet::new();
        data_set
            .insert_string_value(Tag(0x0008, 0x0008), VR::CS, &["ORIGINAL", "", "PRIMARY"])
            .unwrap();
        data_set
            .insert_string_value(Tag(0x0010, 0x0010), VR::PN, &[""])
            .unwrap();

        assert_eq!(
            to_json(&data_set),
            "{\"00080008\":{\"vr\":\"CS\",\"Value\":[\"ORIGINAL\",null,\"PRIMARY\"]},\
             \"00100010\":{\"vr\":\"PN\"}}"
        );
    }

    #[test]
    fn person_names_become_component_objects() {
        let mut data_set = DataSet::new();
        data_set
            .insert_string_value(Tag(0x0010, 0x0010), VR::PN, &["Yamada^Tarou=山田^太郎"])
            .unwrap();

        assert_eq!(
            to_json(&data_set),
            "{\"00100010\":{\"vr\":\"PN\",\"Value\":[{\"Alphabetic\":\"Yamada^Tarou\",\
             \"Ideographic\":\"山田^太郎\"}]}}"
        );
    }

    #[test]
    fn large_very_long_integers_become_strings() {
        let mut data_set = DataSet::new();
        data_set.insert(
            Tag(0x0040, 0xA161),
            DataElementValue::new_ints(VR::UV, &[42, 1 << 60]).unwrap(),
        );

        assert_eq!(
            to_json(&data_set),
            "{\"0040A161\":{\"vr\":\"UV\",\"Value\":[42,\"1152921504606846976\"]}}"
        );
    }

    #[test]
    fn attribute_tags_become_hex_strings() {
        let mut data_set = DataSet::new();
        data_set.insert(
            Tag(0x0020, 0x9165),
            DataElementValue::new_attribute_tags(&[Tag(0x0010, 0x0010)]),
        );

        assert_eq!(
            to_json(&data_set),
            "{\"00209165\":{\"vr\":\"AT\",\"Value\":[\"00100010\"]}}"
        );
    }

    #[test]
    fn binary_values_become_inline_base64() {
        let mut data_set = DataSet::new();
        data_set.insert(
            Tag(0x7FE0, 0x0010),
            DataElementValue::new_binary(VR::OW, vec![0x01, 0x02, 0x03, 0x04]).unwrap(),
        );

        assert_eq!(
            to_json(&data_set),
            "{\"7FE00010\":{\"vr\":\"OW\",\"InlineBinary\":\"AQIDBA==\"}}"
        );
    }

    #[test]
    fn sequences_nest() {
        let mut item = DataSet::new();
        item.insert_string_value(Tag(0x0008, 0x0100), VR::SH, &["A"])
            .unwrap();

        let mut data_set = DataSet::new();
        data_set.insert(
            Tag(0x0040, 0x0275),
            DataElementValue::new_sequence(vec![item, DataSet::new()]),
        );

        assert_eq!(
            to_json(&data_set),
            "{\"00400275\":{\"vr\":\"SQ\",\"Value\":[{\"00080100\":{\"vr\":\"SH\",\
             \"Value\":[\"A\"]}},{}]}}"
        );
    }

    #[test]
    fn encapsulated_pixel_data_keeps_fragment_framing() {
        let mut data_set = DataSet::new();
        data_set
            .insert_string_value(tags::TRANSFER_SYNTAX_UID, VR::UI, &["1.2.840.10008.1.2.4.50"])
            .unwrap();
        data_set.insert(
            tags::PIXEL_DATA,
            DataElementValue::new_pixel_sequence(VR::OB, vec![vec![], vec![1, 2, 3, 4]]).unwrap(),
        );

        let config = JsonConfig {
            store_encapsulated_pixel_data: true,
            pretty_print: false,
        };
        let json = data_set_to_json(&data_set, config).unwrap();

        // (FFFE,E000) len 0, (FFFE,E000) len 4, then the fragment bytes
        let mut framing = Vec::new();
        framing.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0, 0, 0, 0]);
        framing.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 4, 0, 0, 0]);
        framing.extend_from_slice(&[1, 2, 3, 4]);
        let expected = BASE64.encode(&framing);

        assert!(json.contains(&expected));
        assert!(json.contains("\"00020010\""));
    }

    #[test]
    fn encapsulated_pixel_data_requires_the_flag() {
        let mut data_set = DataSet::new();
        data_set.insert(
            tags::PIXEL_DATA,
            DataElementValue::new_pixel_sequence(VR::OB, vec![vec![]]).unwrap(),
        );

        let error = data_set_to_json(&data_set, JsonConfig::default()).unwrap_err();
        assert!(matches!(error, JsonSerializeError::DataInvalid { .. }));
    }
}
