//! Deserialization of DICOM JSON into data sets.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value as Json};
use snafu::ResultExt;

use dcmio_core::dictionary::tags;
use dcmio_core::value::is_lookup_table_descriptor_tag;
use dcmio_core::{DataElementValue, DataSet, DataSetPath, Tag, TransferSyntax, VR};

use crate::{JsonDeserializeError, JsonInvalidSnafu};

type Result<T, E = JsonDeserializeError> = std::result::Result<T, E>;

/// Parse a DICOM JSON document into a data set.
///
/// `Value` and `InlineBinary` are mutually exclusive; `BulkDataURI` is not
/// supported and raises an error. When the document carries an
/// encapsulated transfer syntax, the Pixel Data element's `InlineBinary`
/// is parsed as a raw `(FFFE,E000)` fragment stream.
pub fn data_set_from_json(json: &str) -> Result<DataSet> {
    let root: Json = serde_json::from_str(json).context(JsonInvalidSnafu)?;

    let object = root.as_object().ok_or_else(|| invalid(
        "Root is not an object",
        DataSetPath::new(),
    ))?;

    // the transfer syntax decides how inline Pixel Data bytes are read
    let encapsulated = object
        .get(&tags::TRANSFER_SYNTAX_UID.to_hex_string())
        .and_then(|e| e.get("Value"))
        .and_then(|v| v.get(0))
        .and_then(Json::as_str)
        .and_then(TransferSyntax::from_uid)
        .map(|ts| ts.is_encapsulated)
        .unwrap_or(false);

    let mut path = DataSetPath::new();
    convert_object(object, &mut path, encapsulated)
}

fn invalid(details: impl Into<String>, path: DataSetPath) -> JsonDeserializeError {
    JsonDeserializeError::JsonDataInvalid {
        details: details.into(),
        path,
    }
}

fn convert_object(
    object: &Map<String, Json>,
    path: &mut DataSetPath,
    encapsulated: bool,
) -> Result<DataSet> {
    let mut data_set = DataSet::new();

    for (key, raw) in object {
        let tag = Tag::from_hex_str(key)
            .ok_or_else(|| invalid(format!("Invalid tag key {:?}", key), path.clone()))?;

        path.add_data_element(tag)
            .map_err(|details| invalid(details, path.clone()))?;
        let value = convert_element(tag, raw, path, encapsulated)?;
        path.pop();

        data_set.insert(tag, value);
    }

    Ok(data_set)
}

fn convert_element(
    tag: Tag,
    raw: &Json,
    path: &mut DataSetPath,
    encapsulated: bool,
) -> Result<DataElementValue> {
    let object = raw
        .as_object()
        .ok_or_else(|| invalid("Data element is not an object", path.clone()))?;

    let vr = object
        .get("vr")
        .and_then(Json::as_str)
        .and_then(|s| s.parse::<VR>().ok())
        .ok_or_else(|| invalid("Data element has a missing or invalid vr", path.clone()))?;

    if object.contains_key("BulkDataURI") {
        return Err(invalid("BulkDataURI is not supported", path.clone()));
    }

    let value = object.get("Value");
    let inline = object.get("InlineBinary");
    if value.is_some() && inline.is_some() {
        return Err(invalid(
            "Value and InlineBinary are mutually exclusive",
            path.clone(),
        ));
    }

    if vr == VR::SQ {
        let items = match value {
            None => Vec::new(),
            Some(Json::Array(items)) => {
                let mut data_sets = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_object = item
                        .as_object()
                        .ok_or_else(|| invalid("Sequence item is not an object", path.clone()))?;
                    path.add_sequence_item(index)
                        .map_err(|details| invalid(details, path.clone()))?;
                    data_sets.push(convert_object(item_object, path, encapsulated)?);
                    path.pop();
                }
                data_sets
            }
            Some(_) => return Err(invalid("Sequence Value is not an array", path.clone())),
        };
        return Ok(DataElementValue::new_sequence(items));
    }

    if let Some(inline) = inline {
        let encoded = inline
            .as_str()
            .ok_or_else(|| invalid("InlineBinary is not a string", path.clone()))?;
        let mut bytes = BASE64
            .decode(encoded)
            .map_err(|e| invalid(format!("Invalid Base64: {}", e), path.clone()))?;
        // length parity is restored by padding
        if bytes.len() % 2 == 1 {
            bytes.push(0x00);
        }

        if tag == tags::PIXEL_DATA && encapsulated && matches!(vr, VR::OB | VR::OW) {
            let fragments = parse_fragment_stream(&bytes, path)?;
            return DataElementValue::new_pixel_sequence(vr, fragments)
                .map_err(|e| invalid(e.to_string(), path.clone()));
        }

        return DataElementValue::new_binary(vr, bytes)
            .map_err(|e| invalid(e.to_string(), path.clone()));
    }

    let items = match value {
        None => return Ok(DataElementValue::new_binary_unchecked(vr, Vec::new())),
        Some(Json::Array(items)) => items,
        Some(_) => return Err(invalid("Value is not an array", path.clone())),
    };

    convert_primitive(tag, vr, items, path)
}

fn convert_primitive(
    tag: Tag,
    vr: VR,
    items: &[Json],
    path: &mut DataSetPath,
) -> Result<DataElementValue> {
    let map_data_error =
        |e: dcmio_core::DataError, path: &DataSetPath| invalid(e.to_string(), path.clone());

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
            let strings = items
                .iter()
                .map(|item| match item {
                    Json::Null => Ok(String::new()),
                    Json::String(s) => Ok(s.clone()),
                    other => Err(invalid(
                        format!("String value is not a string: {}", other),
                        path.clone(),
                    )),
                })
                .collect::<Result<Vec<String>>>()?;
            let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
            DataElementValue::new_string(vr, &refs).map_err(|e| map_data_error(e, path))
        }

        VR::PN => {
            let strings = items
                .iter()
                .map(|item| person_name_string(item, path))
                .collect::<Result<Vec<String>>>()?;
            let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
            DataElementValue::new_string(VR::PN, &refs).map_err(|e| map_data_error(e, path))
        }

        VR::IS => {
            let strings = items
                .iter()
                .map(|item| match item {
                    Json::Null => Ok(String::new()),
                    Json::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
                    Json::String(s) => Ok(s.clone()),
                    other => Err(invalid(
                        format!("IS value is not an integer: {}", other),
                        path.clone(),
                    )),
                })
                .collect::<Result<Vec<String>>>()?;
            let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
            DataElementValue::new_string(VR::IS, &refs).map_err(|e| map_data_error(e, path))
        }

        VR::DS => {
            let strings = items
                .iter()
                .map(|item| match item {
                    Json::Null => Ok(String::new()),
                    Json::Number(n) => Ok(n.to_string()),
                    Json::String(s) => Ok(s.clone()),
                    other => Err(invalid(
                        format!("DS value is not a number: {}", other),
                        path.clone(),
                    )),
                })
                .collect::<Result<Vec<String>>>()?;
            let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
            DataElementValue::new_string(VR::DS, &refs).map_err(|e| map_data_error(e, path))
        }

        VR::SS | VR::US | VR::SL | VR::UL | VR::SV | VR::UV => {
            let ints = items
                .iter()
                .map(|item| match item {
                    Json::Number(n) => n
                        .as_i64()
                        .map(i128::from)
                        .or_else(|| n.as_u64().map(i128::from))
                        .ok_or_else(|| {
                            invalid(format!("Invalid integer {}", n), path.clone())
                        }),
                    // SV and UV values beyond 2^53 arrive as strings
                    Json::String(s) if matches!(vr, VR::SV | VR::UV) => s
                        .trim()
                        .parse::<i128>()
                        .map_err(|_| invalid(format!("Invalid integer {:?}", s), path.clone())),
                    other => Err(invalid(
                        format!("Integer value is not a number: {}", other),
                        path.clone(),
                    )),
                })
                .collect::<Result<Vec<i128>>>()?;

            // the lookup table descriptor's second word is signed even
            // under US
            if is_lookup_table_descriptor_tag(tag) && ints.len() == 3 && matches!(vr, VR::US | VR::SS)
            {
                let words = encode_lut_descriptor(&ints, vr, path)?;
                return DataElementValue::new_lookup_table_descriptor(vr, words)
                    .map_err(|e| map_data_error(e, path));
            }

            encode_ints(vr, &ints, path)
        }

        VR::FL | VR::FD => {
            let floats = items
                .iter()
                .map(|item| match item {
                    Json::Number(n) => n.as_f64().ok_or_else(|| {
                        invalid(format!("Invalid number {}", n), path.clone())
                    }),
                    Json::String(s) => match s.as_str() {
                        "Infinity" => Ok(f64::INFINITY),
                        "-Infinity" => Ok(f64::NEG_INFINITY),
                        "NaN" => Ok(f64::NAN),
                        other => Err(invalid(
                            format!("Invalid float string {:?}", other),
                            path.clone(),
                        )),
                    },
                    other => Err(invalid(
                        format!("Float value is not a number: {}", other),
                        path.clone(),
                    )),
                })
                .collect::<Result<Vec<f64>>>()?;
            DataElementValue::new_floats(vr, &floats).map_err(|e| map_data_error(e, path))
        }

        VR::AT => {
            let referenced = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .and_then(Tag::from_hex_str)
                        .ok_or_else(|| invalid(format!("Invalid AT value {}", item), path.clone()))
                })
                .collect::<Result<Vec<Tag>>>()?;
            Ok(DataElementValue::new_attribute_tags(&referenced))
        }

        VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN | VR::SQ => Err(invalid(
            format!("VR {} cannot carry a Value array", vr),
            path.clone(),
        )),
    }
}

fn person_name_string(item: &Json, path: &DataSetPath) -> Result<String> {
    match item {
        Json::Null => Ok(String::new()),
        Json::String(s) => Ok(s.clone()),
        Json::Object(groups) => {
            let group = |key: &str| -> Result<String> {
                match groups.get(key) {
                    None => Ok(String::new()),
                    Some(Json::String(s)) => Ok(s.clone()),
                    Some(other) => Err(invalid(
                        format!("Person name group is not a string: {}", other),
                        path.clone(),
                    )),
                }
            };
            let rendered = [group("Alphabetic")?, group("Ideographic")?, group("Phonetic")?];
            let last = rendered
                .iter()
                .rposition(|g| !g.is_empty())
                .map_or(0, |i| i + 1);
            Ok(rendered[..last].join("="))
        }
        other => Err(invalid(
            format!("Person name is not an object: {}", other),
            path.clone(),
        )),
    }
}

fn encode_ints(vr: VR, ints: &[i128], path: &DataSetPath) -> Result<DataElementValue> {
    let (unit, min, max): (usize, i128, i128) = match vr {
        VR::SS => (2, i128::from(i16::MIN), i128::from(i16::MAX)),
        VR::US => (2, 0, i128::from(u16::MAX)),
        VR::SL => (4, i128::from(i32::MIN), i128::from(i32::MAX)),
        VR::UL => (4, 0, i128::from(u32::MAX)),
        VR::SV => (8, i128::from(i64::MIN), i128::from(i64::MAX)),
        VR::UV => (8, 0, i128::from(u64::MAX)),
        _ => unreachable!("only integer VRs reach here"),
    };

    let mut bytes = Vec::with_capacity(ints.len() * unit);
    for v in ints {
        if *v < min || *v > max {
            return Err(invalid(
                format!("Integer {} is out of range for VR {}", v, vr),
                path.clone(),
            ));
        }
        bytes.extend_from_slice(&v.to_le_bytes()[..unit]);
    }

    Ok(DataElementValue::new_binary_unchecked(vr, bytes))
}

fn encode_lut_descriptor(ints: &[i128], vr: VR, path: &DataSetPath) -> Result<Vec<u8>> {
    let word = |v: i128, signed: bool| -> Result<[u8; 2]> {
        let in_range = if signed {
            v >= i128::from(i16::MIN) && v <= i128::from(i16::MAX)
        } else {
            (0..=i128::from(u16::MAX)).contains(&v)
        };
        if !in_range {
            return Err(invalid(
                format!("Lookup table descriptor word {} is out of range", v),
                path.clone(),
            ));
        }
        Ok([(v & 0xFF) as u8, ((v >> 8) & 0xFF) as u8])
    };

    let mut bytes = Vec::with_capacity(6);
    bytes.extend_from_slice(&word(ints[0], false)?);
    bytes.extend_from_slice(&word(ints[1], true)?);
    bytes.extend_from_slice(&word(ints[2], vr == VR::SS)?);
    Ok(bytes)
}

/// Split the on-wire `(FFFE,E000) <length> <bytes>` framing back into
/// fragments.
fn parse_fragment_stream(bytes: &[u8], path: &DataSetPath) -> Result<Vec<Vec<u8>>> {
    let mut fragments = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        if bytes.len() - offset < 8 || bytes[offset..offset + 4] != [0xFE, 0xFF, 0x00, 0xE0] {
            return Err(invalid(
                "Encapsulated pixel data does not follow the item framing",
                path.clone(),
            ));
        }
        let length = u32::from_le_bytes(
            bytes[offset + 4..offset + 8]
                .try_into()
                .expect("slice is four bytes"),
        ) as usize;
        offset += 8;

        if bytes.len() - offset < length {
            return Err(invalid(
                "Encapsulated pixel data fragment is truncated",
                path.clone(),
            ));
        }
        fragments.push(bytes[offset..offset + length].to_vec());
        offset += length;
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::data_set_to_json;
    use crate::JsonConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_a_mixed_data_set() {
        let mut item = DataSet::new();
        item.insert_string_value(Tag(0x0008, 0x0100), VR::SH, &["T-D1213"])
            .unwrap();

        let mut data_set = DataSet::new();
        data_set
            .insert_string_value(Tag(0x0008, 0x0008), VR::CS, &["ORIGINAL", "PRIMARY"])
            .unwrap();
        data_set
            .insert_string_value(Tag(0x0010, 0x0010), VR::PN, &["Doe^John"])
            .unwrap();
        data_set.insert(
            Tag(0x0020, 0x0013),
            DataElementValue::new_ints(VR::IS, &[7]).unwrap(),
        );
        data_set.insert(
            Tag(0x0028, 0x0010),
            DataElementValue::new_ints(VR::US, &[512]).unwrap(),
        );
        data_set.insert(
            Tag(0x0040, 0x0275),
            DataElementValue::new_sequence(vec![item]),
        );
        data_set.insert(
            Tag(0x0040, 0xA161),
            DataElementValue::new_ints(VR::UV, &[1 << 60]).unwrap(),
        );
        data_set.insert(
            Tag(0x7FE0, 0x0010),
            DataElementValue::new_binary(VR::OW, vec![1, 2, 3, 4]).unwrap(),
        );

        let json = data_set_to_json(&data_set, JsonConfig::default()).unwrap();
        let decoded = data_set_from_json(&json).unwrap();

        assert_eq!(decoded, data_set);
    }

    #[test]
    fn round_trips_non_finite_floats() {
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

        let json = data_set_to_json(&data_set, JsonConfig::default()).unwrap();
        let decoded = data_set_from_json(&json).unwrap();

        // NaN compares unequal, so check the raw encodings
        for tag in [Tag(0x0018, 0x9353), Tag(0x0018, 0x9402), Tag(0x0018, 0x9403)] {
            assert_eq!(
                decoded.get(tag).unwrap().bytes().unwrap(),
                data_set.get(tag).unwrap().bytes().unwrap(),
                "bytes differ for {}",
                tag
            );
        }
    }

    #[test]
    fn round_trips_encapsulated_pixel_data() {
        let mut data_set = DataSet::new();
        data_set
            .insert_string_value(tags::TRANSFER_SYNTAX_UID, VR::UI, &["1.2.840.10008.1.2.4.50"])
            .unwrap();
        data_set.insert(
            tags::PIXEL_DATA,
            DataElementValue::new_pixel_sequence(VR::OB, vec![vec![], vec![9, 8, 7, 6]]).unwrap(),
        );

        let config = JsonConfig {
            store_encapsulated_pixel_data: true,
            pretty_print: false,
        };
        let json = data_set_to_json(&data_set, config).unwrap();
        let decoded = data_set_from_json(&json).unwrap();

        assert_eq!(decoded, data_set);
    }

    #[test]
    fn bulk_data_uri_is_rejected() {
        let error = data_set_from_json(
            "{\"7FE00010\":{\"vr\":\"OW\",\"BulkDataURI\":\"https://example.com/bulk\"}}",
        )
        .unwrap_err();
        assert!(matches!(
            error,
            JsonDeserializeError::JsonDataInvalid { .. }
        ));
    }

    #[test]
    fn value_and_inline_binary_are_mutually_exclusive() {
        let error = data_set_from_json(
            "{\"7FE00010\":{\"vr\":\"OW\",\"Value\":[1],\"InlineBinary\":\"AQID\"}}",
        )
        .unwrap_err();
        assert!(matches!(
            error,
            JsonDeserializeError::JsonDataInvalid { .. }
        ));
    }

    #[test]
    fn null_strings_become_empty_values() {
        let decoded =
            data_set_from_json("{\"00080008\":{\"vr\":\"CS\",\"Value\":[\"A\",null,\"B\"]}}")
                .unwrap();
        assert_eq!(
            decoded.get(Tag(0x0008, 0x0008)).unwrap().bytes().unwrap(),
            b"A\\\\B"
        );
    }

    #[test]
    fn errors_carry_the_data_set_path() {
        let error = data_set_from_json(
            "{\"00400275\":{\"vr\":\"SQ\",\"Value\":[{\"00080100\":{\"vr\":\"SH\",\
             \"Value\":[17]}}]}}",
        )
        .unwrap_err();

        match error {
            JsonDeserializeError::JsonDataInvalid { path, .. } => {
                assert_eq!(path.to_string(), "(0040,0275)/[0]/(0008,0100)");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
