// Match tree as JSON
// {"type":"*","s":2,"e":4,"data":"21","subs":[...]}
// `s` is 1-based, `e` is one past the last byte (also 1-based), and `subs`
// is omitted for leaf captures.

use crate::encoder::{EncodeContext, Encoder};
use crate::rosie_vm::{RosieError, RosieResult};
use crate::rpl_pattern::MatchNode;
use serde_json::{Map, Value};

pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, cx: &EncodeContext) -> RosieResult<Option<Vec<u8>>> {
        let mut out = Vec::with_capacity(64 + cx.node.end.saturating_sub(cx.node.start) * 2);
        write_node(&mut out, cx.node, cx.input)?;
        Ok(Some(out))
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) -> RosieResult<()> {
    serde_json::to_writer(&mut *out, s)
        .map_err(|e| RosieError::Internal(format!("json encoding failed: {}", e)))
}

fn write_node(out: &mut Vec<u8>, node: &MatchNode, input: &[u8]) -> RosieResult<()> {
    let mut int_buffer = itoa::Buffer::new();

    out.extend_from_slice(b"{\"type\":");
    write_str(out, &node.kind)?;
    out.extend_from_slice(b",\"s\":");
    out.extend_from_slice(int_buffer.format(node.start + 1).as_bytes());
    out.extend_from_slice(b",\"e\":");
    out.extend_from_slice(int_buffer.format(node.end + 1).as_bytes());
    out.extend_from_slice(b",\"data\":");
    write_str(out, &String::from_utf8_lossy(node.text(input)))?;
    if !node.subs.is_empty() {
        out.extend_from_slice(b",\"subs\":[");
        for (i, sub) in node.subs.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            write_node(out, sub, input)?;
        }
        out.push(b']');
    }
    out.push(b'}');
    Ok(())
}

/// Same tree, indented for people.
pub struct JsonPrettyEncoder;

impl Encoder for JsonPrettyEncoder {
    fn encode(&self, cx: &EncodeContext) -> RosieResult<Option<Vec<u8>>> {
        let value = node_value(cx.node, cx.input);
        serde_json::to_vec_pretty(&value)
            .map(Some)
            .map_err(|e| RosieError::Internal(format!("json encoding failed: {}", e)))
    }
}

fn node_value(node: &MatchNode, input: &[u8]) -> Value {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::from(node.kind.as_str()));
    map.insert("s".to_string(), Value::from(node.start + 1));
    map.insert("e".to_string(), Value::from(node.end + 1));
    map.insert(
        "data".to_string(),
        Value::from(String::from_utf8_lossy(node.text(input)).into_owned()),
    );
    if !node.subs.is_empty() {
        map.insert(
            "subs".to_string(),
            Value::Array(node.subs.iter().map(|sub| node_value(sub, input)).collect()),
        );
    }
    Value::Object(map)
}
