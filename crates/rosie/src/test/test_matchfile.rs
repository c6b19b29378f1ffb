use crate::matchfile::{MatchFileCounts, MatchFileRequest};
use crate::rosie_vm::{Engine, EngineOption, RosieError};
use crate::test::new_engine;

const TEN_LINES: &str = "123\nabc\n456\ndef\n789\nghi\n012\njkl\n345\nmno\n";

#[test]
fn test_match_file_counts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    let errors = dir.path().join("err.txt");
    std::fs::write(&input, TEN_LINES).unwrap();

    let engine = new_engine();
    let id = engine.compile(b"[:digit:]+").unwrap();
    let request = MatchFileRequest {
        input: Some(input.as_path()),
        output: Some(output.as_path()),
        errors: Some(errors.as_path()),
        whole_file: false,
    };
    let counts = engine.match_file(id, "line", &request).unwrap();
    assert_eq!(
        counts,
        MatchFileCounts {
            cin: 10,
            cout: 5,
            cerr: 5
        }
    );
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "123\n456\n789\n012\n345\n");
    assert_eq!(std::fs::read_to_string(&errors).unwrap(), "abc\ndef\nghi\njkl\nmno\n");
}

#[test]
fn test_match_file_bool_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    let errors = dir.path().join("err.txt");
    std::fs::write(&input, "1\n\nx").unwrap();

    let engine = new_engine();
    let id = engine.compile(b"[:digit:]").unwrap();
    let request = MatchFileRequest {
        input: Some(input.as_path()),
        output: Some(output.as_path()),
        errors: Some(errors.as_path()),
        whole_file: false,
    };
    let counts = engine.match_file(id, "bool", &request).unwrap();
    // the last record has no newline; the empty one never matches
    assert_eq!((counts.cin, counts.cout, counts.cerr), (3, 1, 2));
    assert!(std::fs::read(&output).unwrap().is_empty());
    assert_eq!(std::fs::read_to_string(&errors).unwrap(), "\nx\n");
}

#[test]
fn test_match_file_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    let errors = dir.path().join("err.txt");
    std::fs::write(&input, "123\nabc\n").unwrap();

    let engine = new_engine();
    let id = engine.compile(b"{[:digit:]+ \"\\n\" [:alpha:]+}").unwrap();
    let request = MatchFileRequest {
        input: Some(input.as_path()),
        output: Some(output.as_path()),
        errors: Some(errors.as_path()),
        whole_file: true,
    };
    let counts = engine.match_file(id, "byte", &request).unwrap();
    assert_eq!((counts.cin, counts.cout, counts.cerr), (1, 1, 0));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "123\nabc\n");
}

#[test]
fn test_match_file_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.txt");
    let output = dir.path().join("out.txt");
    let errors = dir.path().join("err.txt");

    let engine = new_engine();
    let id = engine.compile(b"[:digit:]+").unwrap();
    let request = MatchFileRequest {
        input: Some(input.as_path()),
        output: Some(output.as_path()),
        errors: Some(errors.as_path()),
        whole_file: false,
    };
    let Err(RosieError::Io { path, .. }) = engine.match_file(id, "json", &request) else {
        panic!("missing input file was not reported");
    };
    assert_eq!(path, input);
}

#[test]
fn test_match_file_bad_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    std::fs::write(&input, TEN_LINES).unwrap();

    let engine = new_engine();
    let id = engine.compile(b"[:digit:]+").unwrap();
    let request = MatchFileRequest {
        input: Some(input.as_path()),
        ..Default::default()
    };
    assert!(matches!(
        engine.match_file(id, "nosuch", &request),
        Err(RosieError::InvalidEncoder(_))
    ));
}

#[test]
fn test_match_file_stops_on_abend() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    let errors = dir.path().join("err.txt");
    std::fs::write(&input, "123\n").unwrap();

    let engine = Engine::new(
        EngineOption::default()
            .with_libpath("")
            .with_max_match_depth(2),
    )
    .unwrap();
    let id = engine.compile(b"[:digit:]+").unwrap();
    assert!(engine.match_input(id, b"123", 1, "json").unwrap().abend);

    let request = MatchFileRequest {
        input: Some(input.as_path()),
        output: Some(output.as_path()),
        errors: Some(errors.as_path()),
        whole_file: false,
    };
    let result = engine.match_file(id, "json", &request);
    assert!(matches!(result, Err(RosieError::Abend { record: 1 })));
    // an aborted record is not reported as a non-match
    assert!(std::fs::read(&errors).unwrap().is_empty());
}
