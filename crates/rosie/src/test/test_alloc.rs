use crate::rosie_vm::RosieError;
use crate::rosie_vm::rosie_limits::MIN_ALLOC_LIMIT_KB;
use crate::test::new_engine;

#[test]
fn test_alloc_limit_set_and_query() {
    let engine = new_engine();
    let limit = engine.alloc_limit().unwrap();
    assert_eq!(limit.limit_kb, 0);
    assert!(limit.usage_kb > 0);

    engine.set_alloc_limit(MIN_ALLOC_LIMIT_KB as i64).unwrap();
    assert_eq!(engine.alloc_limit().unwrap().limit_kb, MIN_ALLOC_LIMIT_KB);

    engine.set_alloc_limit(8199).unwrap();
    assert_eq!(engine.alloc_limit().unwrap().limit_kb, 8199);

    engine.set_alloc_limit(0).unwrap();
    assert_eq!(engine.alloc_limit().unwrap().limit_kb, 0);
}

#[test]
fn test_alloc_limit_below_minimum() {
    let engine = new_engine();
    engine.set_alloc_limit(MIN_ALLOC_LIMIT_KB as i64).unwrap();
    let result = engine.set_alloc_limit(MIN_ALLOC_LIMIT_KB as i64 - 1);
    assert!(matches!(
        result,
        Err(RosieError::AllocLimit {
            requested: 8191,
            minimum: 8192
        })
    ));
    // the previous limit stays in force
    assert_eq!(engine.alloc_limit().unwrap().limit_kb, MIN_ALLOC_LIMIT_KB);
}

#[test]
fn test_usage_grows_with_patterns() {
    let engine = new_engine();
    let before = engine.alloc_limit().unwrap().usage_kb;
    for _ in 0..200 {
        engine
            .compile(b"{[:alpha:] [:alnum:]*} / {[:digit:]+ \".\" [:digit:]+}")
            .unwrap();
    }
    assert!(engine.alloc_limit().unwrap().usage_kb > before);
}

#[test]
fn test_alloc_limit_abends_large_match() {
    let engine = new_engine();
    assert!(engine.load(b"d = [:digit:]").unwrap().ok);
    let id = engine.compile(b"findall:d").unwrap();
    let input = "7".repeat(300_000);

    // no limit: every digit is captured
    let result = engine.match_input(id, input.as_bytes(), 1, "bool").unwrap();
    assert!(result.matched);
    assert!(!result.abend);

    engine.set_alloc_limit(MIN_ALLOC_LIMIT_KB as i64).unwrap();
    let result = engine.match_input(id, input.as_bytes(), 1, "json").unwrap();
    assert!(!result.matched);
    assert!(result.abend);
    assert!(result.data.is_none());

    // small inputs still match under the limit
    let result = engine.match_input(id, b"123", 1, "json").unwrap();
    assert!(result.matched);
    assert!(!result.abend);
}
