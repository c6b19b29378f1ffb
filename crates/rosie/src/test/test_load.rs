use crate::rosie_vm::{RosieError, Who};
use crate::test::new_engine;
use std::io::Write;

#[test]
fn test_load_package_declaration() {
    let engine = new_engine();
    let outcome = engine.load(b"package x; foo = \"foo\"").unwrap();
    assert!(outcome.ok, "{:?}", outcome.diagnostics);
    assert_eq!(outcome.package.as_deref(), Some("x"));

    let id = engine.compile(b"x.foo").unwrap();
    let result = engine.match_input(id, b"foo", 1, "json").unwrap();
    assert_eq!(result.data_bytes(), br#"{"type":"x.foo","s":1,"e":4,"data":"foo"}"#);
}

#[test]
fn test_load_without_package() {
    let engine = new_engine();
    let outcome = engine.load(b"-- top level\nword = [:alpha:]+\npair = word word").unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.package, None);

    let id = engine.compile(b"pair").unwrap();
    let result = engine.match_input(id, b"hello world", 1, "json").unwrap();
    let json: serde_json::Value = serde_json::from_slice(result.data_bytes()).unwrap();
    assert_eq!(json["type"], "pair");
    assert_eq!(json["subs"][1]["data"], "world");
}

#[test]
fn test_alias_has_no_capture() {
    let engine = new_engine();
    assert!(engine.load(b"alias d = [:digit:]\nn = d+").unwrap().ok);
    let id = engine.compile(b"n").unwrap();
    let result = engine.match_input(id, b"12", 1, "json").unwrap();
    assert_eq!(result.data_bytes(), br#"{"type":"n","s":1,"e":3,"data":"12"}"#);
}

#[test]
fn test_local_binding_is_hidden() {
    let engine = new_engine();
    let outcome = engine
        .load(b"package p\nlocal secret = \"s\"\nopen = secret")
        .unwrap();
    assert!(outcome.ok);
    assert!(engine.compile(b"p.open").is_ok());
    let Err(RosieError::Compile(diagnostics)) = engine.compile(b"p.secret") else {
        panic!("local binding was visible outside its package");
    };
    assert!(diagnostics[0].message.contains("local"));
}

#[test]
fn test_compile_diagnostic_unknown_charset() {
    let engine = new_engine();
    let Err(err) = engine.compile(b"[:foobar:]+") else {
        panic!("unknown charset compiled");
    };
    let diagnostics = err.diagnostics().unwrap();
    assert_eq!(diagnostics[0].who, Who::Compiler);
    assert!(diagnostics[0].message.contains("foobar"));
}

#[test]
fn test_load_parse_error() {
    let engine = new_engine();
    let outcome = engine.load(b"foo = \"").unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].who, Who::Parser);
    assert!(outcome.diagnostics[0].line.is_some());
    assert!(matches!(outcome.into_result(), Err(RosieError::Load(_))));
}

#[test]
fn test_load_keeps_good_statements() {
    let engine = new_engine();
    let outcome = engine.load(b"a = \"a\"\nb = nosuch\nc = \"c\"").unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("nosuch"));
    assert!(engine.compile(b"a").is_ok());
    assert!(engine.compile(b"c").is_ok());
    assert!(engine.compile(b"b").is_err());
}

#[test]
fn test_import_with_prefix() {
    let engine = new_engine();
    let outcome = engine.import("net", Some("foobar")).unwrap();
    assert!(outcome.ok, "{:?}", outcome.diagnostics);
    assert_eq!(outcome.package.as_deref(), Some("net"));
    assert!(engine.compile(b"foobar.any").is_ok());
    assert!(engine.compile(b"net.any").is_err());
}

#[test]
fn test_import_statement() {
    let engine = new_engine();
    let outcome = engine.load(b"import num, word as w\nn = num.int").unwrap();
    assert!(outcome.ok, "{:?}", outcome.diagnostics);
    let id = engine.compile(b"n").unwrap();
    assert!(engine.match_input(id, b"-42", 1, "bool").unwrap().matched);
    assert!(engine.compile(b"w.any").is_ok());
}

#[test]
fn test_import_unknown_package() {
    let engine = new_engine();
    let outcome = engine.import("nosuchpackage", None).unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.diagnostics[0].who, Who::Loader);
    assert!(outcome.diagnostics[0].message.contains("nosuchpackage"));
    assert!(matches!(outcome.into_result(), Err(RosieError::Import(_))));
}

#[test]
fn test_import_from_libpath() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mine.rpl"), "package mine\nyes = \"yes\"\n").unwrap();
    let engine = new_engine();
    engine.set_libpath(&dir.path().display().to_string()).unwrap();

    let outcome = engine.import("mine", None).unwrap();
    assert!(outcome.ok, "{:?}", outcome.diagnostics);
    let id = engine.compile(b"mine.yes").unwrap();
    assert!(engine.match_input(id, b"yes", 1, "bool").unwrap().matched);
}

#[test]
fn test_import_cycle() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.rpl"), "package a\nimport b\nx = \"x\"\n").unwrap();
    std::fs::write(dir.path().join("b.rpl"), "package b\nimport a\ny = \"y\"\n").unwrap();
    let engine = new_engine();
    engine.set_libpath(&dir.path().display().to_string()).unwrap();

    let outcome = engine.import("a", None).unwrap();
    assert!(!outcome.ok);
    assert!(outcome.diagnostics.iter().any(|d| d.message.contains("cycle")));
}

#[test]
fn test_failed_import_keeps_its_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("good.rpl"), "package good\nyes = \"y\"\n").unwrap();
    std::fs::write(
        dir.path().join("bad.rpl"),
        "package bad\nimport good\nfine = good.yes\nbroken = nosuchthing\n",
    )
    .unwrap();
    let engine = new_engine();
    engine.set_libpath(&dir.path().display().to_string()).unwrap();

    let outcome = engine.import("bad", None).unwrap();
    assert!(!outcome.ok);
    assert!(engine.compile(b"bad.fine").is_err());

    // good was registered while bad loaded, so it resolves without its file
    std::fs::remove_file(dir.path().join("good.rpl")).unwrap();
    let outcome = engine.import("good", None).unwrap();
    assert!(outcome.ok, "{:?}", outcome.diagnostics);
    assert!(engine.compile(b"good.yes").is_ok());
}

#[test]
fn test_load_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "package f").unwrap();
    writeln!(file, "hex = [[:xdigit:]]+").unwrap();
    file.flush().unwrap();

    let engine = new_engine();
    let outcome = engine.load_file(file.path()).unwrap();
    assert!(outcome.ok, "{:?}", outcome.diagnostics);
    assert_eq!(outcome.package.as_deref(), Some("f"));
    let id = engine.compile(b"f.hex").unwrap();
    let result = engine.match_input(id, b"c0ffee!", 1, "byte").unwrap();
    assert_eq!(result.data_bytes(), b"c0ffee");
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine();
    let outcome = engine.load_file(&dir.path().join("absent.rpl")).unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.diagnostics[0].who, Who::Loader);
}
