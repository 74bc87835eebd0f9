//! Wire codec: the compact JSON dialect.
//!
//! Every node kind encodes as a JSON object with short camelCase keys. A
//! field is written only when it differs from its default, and an absent
//! field decodes to its default. Parameters use full field names
//! (`name`, `type`, `value`).
//!
//! The codec is a lossless identity over already-normalized trees:
//! `decode(encode(x)) == x`.

use crate::info::{ClassInfo, InfoKind, InfoNode};
use thiserror::Error;

/// Malformed wire text.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a message root.
pub fn encode(root: &ClassInfo) -> Result<String, CodecError> {
    serde_json::to_string(root).map_err(CodecError::Encode)
}

/// Encode a message root with indentation, for humans.
pub fn encode_pretty(root: &ClassInfo) -> Result<String, CodecError> {
    serde_json::to_string_pretty(root).map_err(CodecError::Encode)
}

/// Encode a message root to bytes.
pub fn encode_to_vec(root: &ClassInfo) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(root).map_err(CodecError::Encode)
}

/// Decode a message root.
pub fn decode(text: &str) -> Result<ClassInfo, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

/// Decode a message root from bytes.
pub fn decode_slice(bytes: &[u8]) -> Result<ClassInfo, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}

/// Decode every message root in `text`, in order. Roots may be separated
/// by any whitespace, so JSON lines and concatenated documents both work.
pub fn decode_all(text: &str) -> Result<Vec<ClassInfo>, CodecError> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<ClassInfo>()
        .collect::<Result<_, _>>()
        .map_err(CodecError::Decode)
}

/// Encode any single node.
pub fn encode_node(node: &InfoNode) -> Result<String, CodecError> {
    serde_json::to_string(node).map_err(CodecError::Encode)
}

/// Decode a single node whose kind is known from context.
pub fn decode_node(kind: InfoKind, text: &str) -> Result<InfoNode, CodecError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(CodecError::Decode)?;
    InfoNode::from_value(kind, value).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{
        EventInfo, MethodInfo, NodeGroupInfo, NodeInfo, ParameterInfo, PropertyInfo,
        SubscribeAction,
    };
    use crate::result::{ErrorCode, InfoResult};
    use serde_json::json;

    #[test]
    fn test_method_round_trip_exact() {
        let mut method = MethodInfo::new("Test", "Test test.").with_execute(true);
        for name in ["Param1", "Param2", "Param3"] {
            method.params.push(ParameterInfo::new(name, ""));
        }

        let text = encode_node(&InfoNode::Method(method.clone())).unwrap();
        assert_eq!(
            text,
            r#"{"name":"Test","help":"Test test.","execute":true,"params":[{"name":"Param1"},{"name":"Param2"},{"name":"Param3"}]}"#
        );

        let InfoNode::Method(decoded) = decode_node(InfoKind::Method, &text).unwrap() else {
            panic!("Expected MethodInfo");
        };
        assert_eq!(decoded, method);
        let names: Vec<&str> = decoded.params.iter().map(|p| p.header.name.as_str()).collect();
        assert_eq!(names, ["Param1", "Param2", "Param3"]);
    }

    #[test]
    fn test_parameter_with_type_and_value() {
        let param = ParameterInfo::new("Speed", "")
            .with_type("f64")
            .with_value(2.5);
        let text = encode_node(&InfoNode::Parameter(param)).unwrap();
        assert_eq!(text, r#"{"name":"Speed","type":"f64","value":2.5}"#);
    }

    #[test]
    fn test_node_group_keys_are_decimal_strings() {
        let mut group = NodeGroupInfo::new("Axes", "");
        for key in 1..=3 {
            group.insert(key, ClassInfo::new("Axis", "")).unwrap();
        }
        let mut root = ClassInfo::new("Robot", "");
        root.add_node_group(group).unwrap();

        let text = encode(&root).unwrap();
        assert!(text.contains(
            r#""nodes":{"1":{"name":"Axis"},"2":{"name":"Axis"},"3":{"name":"Axis"}}"#
        ));

        let decoded = decode(&text).unwrap();
        assert_eq!(decoded.node_group("Axes").unwrap().node_count(), 3);
        assert_eq!(decoded, root);
    }

    #[test]
    fn test_invalid_group_key_is_decode_error() {
        let text = r#"{"name":"Robot","nodeGroups":[{"name":"Axes","nodes":{"x":{}}}]}"#;
        assert!(matches!(decode(text), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_defaults_are_omitted() {
        let mut root = ClassInfo::new("Robot", "");
        root.add_property(PropertyInfo::new("Speed", "")).unwrap();
        root.add_event(EventInfo::new("Moved", "")).unwrap();
        root.add_method(MethodInfo::new("Stop", "")).unwrap();

        let text = encode(&root).unwrap();
        assert_eq!(
            text,
            r#"{"name":"Robot","events":[{"name":"Moved"}],"methods":[{"name":"Stop"}],"properties":[{"name":"Speed"}]}"#
        );
    }

    #[test]
    fn test_absent_fields_decode_to_defaults() {
        let root = decode("{}").unwrap();
        assert_eq!(root, ClassInfo::default());

        let root = decode(r#"{"events":[{"name":"Moved","subscribeAction":1}]}"#).unwrap();
        assert_eq!(root.events[0].subscribe_action, SubscribeAction::Subscribe);
    }

    #[test]
    fn test_full_tree_round_trip() {
        let mut axis = ClassInfo::new("Axis", "");
        let mut position = PropertyInfo::new("Position", "").with_value(json!(10.5));
        position.header.result = Some(InfoResult::ok_value("f64", json!(10.5)));
        axis.add_property(position).unwrap();

        let mut group = NodeGroupInfo::new("Axes", "Robot axes");
        group.insert(7, axis).unwrap();

        let mut arm = NodeInfo::new("Arm", "");
        arm.header.result = Some(InfoResult::error(ErrorCode::MissingNode, "gone"));

        let mut root = ClassInfo::new("Robot", "");
        root.is_proxy = true;
        root.add_proxy_type("Robot").unwrap();
        root.add_node_group(group).unwrap();
        root.add_node(arm).unwrap();
        root.add_event(EventInfo::new("Moved", "").with_action(SubscribeAction::Unsubscribe))
            .unwrap();

        let text = encode(&root).unwrap();
        assert_eq!(decode(&text).unwrap(), root);
        assert_eq!(decode_slice(&encode_to_vec(&root).unwrap()).unwrap(), root);
    }

    #[test]
    fn test_malformed_text_is_decode_error() {
        assert!(matches!(decode("{not json"), Err(CodecError::Decode(_))));
        assert!(matches!(
            decode(r#"{"methods":[{"execute":"yes"}]}"#),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_all_reads_every_root() {
        let text = "{\"name\":\"A\"}\n\n{\"name\":\"B\",\n \"properties\":[{\"name\":\"P\"}]}\n";
        let roots = decode_all(text).unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].header.name, "A");
        assert_eq!(roots[1].properties[0].header.name, "P");

        assert!(decode_all("").unwrap().is_empty());
        assert!(decode_all("{\"name\":\"A\"} {").is_err());
    }
}
