use crate::rosie_vm::RosieError;
use crate::test::new_engine;

#[test]
fn test_trace_condensed() {
    let engine = new_engine();
    assert!(engine.import("net", None).unwrap().ok);

    let any = engine.compile(b"net.any").unwrap();
    let trace = engine.trace(any, b"1.2.3", 1, "condensed").unwrap();
    assert!(trace.matched);
    assert!(!trace.abend);
    assert!(!trace.text.is_empty());
    assert!(trace.text.contains("net.fqdn"));

    let ip = engine.compile(b"net.ip").unwrap();
    let trace = engine.trace(ip, b"1.2.3", 1, "condensed").unwrap();
    assert!(!trace.matched);
    assert!(!trace.text.is_empty());
    assert!(trace.text.contains("net.ipv4"));
}

#[test]
fn test_trace_agrees_with_match() {
    let engine = new_engine();
    let id = engine.compile(b"[:digit:]+ \"x\"").unwrap();
    for input in [&b"12 x"[..], b"12x", b"x"] {
        let matched = engine.match_input(id, input, 1, "bool").unwrap().matched;
        let traced = engine.trace(id, input, 1, "full").unwrap().matched;
        assert_eq!(matched, traced, "{:?}", String::from_utf8_lossy(input));
    }
}

#[test]
fn test_trace_full_lists_subexpressions() {
    let engine = new_engine();
    let id = engine.compile(b"\"a\" / \"b\"").unwrap();
    let condensed = engine.trace(id, b"b", 1, "condensed").unwrap();
    let full = engine.trace(id, b"b", 1, "full").unwrap();
    assert!(full.matched);
    assert!(full.text.contains("\"a\""));
    assert!(full.text.len() > condensed.text.len());
}

#[test]
fn test_trace_json() {
    let engine = new_engine();
    let id = engine.compile(b"[:alpha:]+").unwrap();
    let trace = engine.trace(id, b"abc", 1, "json").unwrap();
    let json: serde_json::Value = serde_json::from_str(&trace.text).unwrap();
    assert!(json.is_object());
    assert_eq!(json["matched"], true);
}

#[test]
fn test_trace_past_end() {
    let engine = new_engine();
    let id = engine.compile(b"[:alpha:]+").unwrap();
    let trace = engine.trace(id, b"abc", 9, "condensed").unwrap();
    assert!(!trace.matched);
    assert!(!trace.text.is_empty());
}

#[test]
fn test_trace_bad_style() {
    let engine = new_engine();
    let id = engine.compile(b"\"a\"").unwrap();
    assert!(matches!(
        engine.trace(id, b"a", 1, "fancy"),
        Err(RosieError::InvalidTraceStyle(_))
    ));
    let long = "c".repeat(100);
    assert!(matches!(
        engine.trace(id, b"a", 1, &long),
        Err(RosieError::InvalidTraceStyle(_))
    ));
}
