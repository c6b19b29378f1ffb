use crate::encoder::{ColorMap, EncodeContext, Encoder};
use crate::rosie_vm::{Engine, EngineOption, RosieError, RosieResult};
use crate::test::new_engine;
use std::sync::Arc;

struct KindEncoder;

impl Encoder for KindEncoder {
    fn encode(&self, cx: &EncodeContext) -> RosieResult<Option<Vec<u8>>> {
        Ok(Some(cx.node.kind.as_bytes().to_vec()))
    }
}

#[test]
fn test_line_encoder_returns_record() {
    let engine = new_engine();
    let id = engine.compile(b"[:digit:]+").unwrap();
    let result = engine.match_input(id, b"42 apples", 1, "line").unwrap();
    assert_eq!(result.data_bytes(), b"42 apples");
}

#[test]
fn test_json_escapes_data() {
    let engine = new_engine();
    let id = engine.compile(b"{\"\\\"\" [:alpha:]+}").unwrap();
    let result = engine.match_input(id, b"\"quoted", 1, "json").unwrap();
    let json: serde_json::Value = serde_json::from_slice(result.data_bytes()).unwrap();
    assert_eq!(json["data"], "\"quoted");
    assert_eq!(json["e"], 8);
}

#[test]
fn test_jsonpp_matches_json() {
    let engine = new_engine();
    assert!(engine.import("num", None).unwrap().ok);
    let id = engine.compile(b"num.any").unwrap();
    let compact = engine.match_input(id, b"-3.5e2", 1, "json").unwrap();
    let pretty = engine.match_input(id, b"-3.5e2", 1, "jsonpp").unwrap();
    assert!(pretty.data_bytes().contains(&b'\n'));

    let a: serde_json::Value = serde_json::from_slice(compact.data_bytes()).unwrap();
    let b: serde_json::Value = serde_json::from_slice(pretty.data_bytes()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a["type"], "num.any");
    assert_eq!(a["subs"][0]["type"], "num.float");
}

#[test]
fn test_color_encoder() {
    let engine = new_engine();
    assert!(engine.import("net", None).unwrap().ok);
    let id = engine.compile(b"net.any").unwrap();
    let result = engine.match_input(id, b"1.2.3", 1, "color").unwrap();
    assert!(result.matched);
    assert_eq!(result.data_bytes(), b"\x1b[31;4m1.2.3\x1b[0m");
}

#[test]
fn test_color_encoder_keeps_unmatched_text() {
    let engine = new_engine();
    let id = engine.compile(b"[:digit:]+").unwrap();
    let result = engine.match_input(id, b"ab12cd", 3, "color").unwrap();
    assert_eq!(result.data_bytes(), b"ab\x1b[39;1m12\x1b[0mcd");
}

#[test]
fn test_session_colors() {
    let engine = Engine::new(EngineOption::default().with_libpath("").with_colors("*=green")).unwrap();
    let id = engine.compile(b"[:alpha:]+").unwrap();
    let result = engine.match_input(id, b"abc", 1, "color").unwrap();
    assert_eq!(result.data_bytes(), b"\x1b[32mabc\x1b[0m");
}

#[test]
fn test_color_map_lookup() {
    let mut colors = ColorMap::default();
    assert_eq!(colors.lookup("net.ipv4"), Some("31"));
    assert_eq!(colors.lookup("net.fqdn"), Some("31;4"));
    assert_eq!(colors.lookup("other"), Some("39;1"));

    colors.merge("net.ipv4=blue;bold").unwrap();
    assert_eq!(colors.lookup("net.ipv4"), Some("34;1"));
    assert!(colors.merge("x=nocolor").is_err());
    assert!(colors.to_spec().contains("net.ipv4=blue;bold"));
}

#[test]
fn test_register_encoder() {
    let engine = new_engine();
    engine.register_encoder("kind", Arc::new(KindEncoder)).unwrap();
    let id = engine.compile(b"[:alpha:]+").unwrap();
    let result = engine.match_input(id, b"abc", 1, "kind").unwrap();
    assert_eq!(result.data_bytes(), b"*");

    assert!(matches!(
        engine.register_encoder("", Arc::new(KindEncoder)),
        Err(RosieError::InvalidEncoder(_))
    ));
    let config = engine.config().unwrap();
    let encoders = config.get("ENCODERS").and_then(|e| e.value.clone()).unwrap();
    assert!(encoders.split(',').any(|name| name == "kind"));
}
