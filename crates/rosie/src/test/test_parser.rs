use crate::compiler::ast::{Expr, Statement};
use crate::compiler::parser::{Reader, RplParser, RplTokenKind, RplTokenize};
use crate::rosie_vm::rosie_limits::MAXCCALLS_PARSER;

fn token_kinds(text: &str) -> Vec<RplTokenKind> {
    RplTokenize::new(Reader::new(text))
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia())
        .collect()
}

#[test]
fn test_tokenize_binding() {
    use RplTokenKind::*;
    assert_eq!(
        token_kinds("local alias x = [[:alpha:][0-9]]+ -- note\n"),
        vec![TkLocal, TkAlias, TkName, TkAssign, TkCharset, TkPlus]
    );
}

#[test]
fn test_tokenize_qualified_names() {
    use RplTokenKind::*;
    assert_eq!(token_kinds("net.ipv4 import"), vec![TkName, TkImport]);
    // keywords only count unqualified
    assert_eq!(token_kinds("p.import"), vec![TkName]);
}

#[test]
fn test_tokenize_unterminated_string() {
    let result = RplTokenize::new(Reader::new("x = \"abc")).tokenize();
    assert!(result.is_err());
}

#[test]
fn test_parse_choice_of_sequences() {
    let expr = RplParser::parse_pattern("\"a\" \"b\" / .").unwrap();
    let Expr::Choice(alternatives) = expr else {
        panic!("expected a choice");
    };
    assert_eq!(alternatives.len(), 2);
    assert!(matches!(&alternatives[0], Expr::Seq(items) if items.len() == 2));
    assert_eq!(alternatives[1], Expr::Any);
}

#[test]
fn test_parse_repetition_bounds() {
    let expr = RplParser::parse_pattern("\"x\"{2,5}").unwrap();
    assert!(matches!(expr, Expr::Repeat { min: 2, max: Some(5), .. }));
    let expr = RplParser::parse_pattern("\"x\"{3}").unwrap();
    assert!(matches!(expr, Expr::Repeat { min: 3, max: Some(3), .. }));
    let expr = RplParser::parse_pattern("\"x\"{,4}").unwrap();
    assert!(matches!(expr, Expr::Repeat { min: 0, max: Some(4), .. }));
    assert!(RplParser::parse_pattern("\"x\"{5,2}").is_err());
}

#[test]
fn test_parse_groups_and_predicates() {
    let expr = RplParser::parse_pattern("!{\"a\" \"b\"}").unwrap();
    let Expr::Not(inner) = expr else {
        panic!("expected a negation");
    };
    assert!(matches!(*inner, Expr::Group { cooked: false, .. }));

    let expr = RplParser::parse_pattern(">(\"a\")").unwrap();
    let Expr::Ahead(inner) = expr else {
        panic!("expected a look-ahead");
    };
    assert!(matches!(*inner, Expr::Group { cooked: true, .. }));
}

#[test]
fn test_parse_macro() {
    let expr = RplParser::parse_pattern("findall:net.any").unwrap();
    let Expr::Macro { name, arg, .. } = expr else {
        panic!("expected a macro");
    };
    assert_eq!(name, "findall");
    assert!(matches!(*arg, Expr::Ref(ref r, _) if r == "net.any"));
}

#[test]
fn test_parse_string_escapes() {
    let expr = RplParser::parse_pattern(r#""a\tb\x41\\""#).unwrap();
    assert_eq!(expr, Expr::Literal(b"a\tbA\\".to_vec()));
    assert!(RplParser::parse_pattern(r#""\q""#).is_err());
}

#[test]
fn test_parse_errors() {
    assert!(RplParser::parse_pattern("").is_err());
    assert!(RplParser::parse_pattern("(\"a\"").is_err());
    assert!(RplParser::parse_pattern("\"a\" )").is_err());
    assert!(RplParser::parse_pattern("/ \"a\"").is_err());
}

#[test]
fn test_parse_depth_limit() {
    let deep = format!("{}\"a\"{}", "(".repeat(MAXCCALLS_PARSER + 10), ")".repeat(MAXCCALLS_PARSER + 10));
    assert!(RplParser::parse_pattern(&deep).is_err());
    let shallow = format!("{}\"a\"{}", "(".repeat(10), ")".repeat(10));
    assert!(RplParser::parse_pattern(&shallow).is_ok());
}

#[test]
fn test_parse_source_statements() {
    let block = RplParser::parse_source(
        "package demo\nimport net, \"lib/extra\" as extra\nlocal alias d = [:digit:]\nn = d+ ; m = n \"x\"\n",
    )
    .unwrap();
    assert_eq!(block.package.as_deref(), Some("demo"));
    assert_eq!(block.statements.len(), 4);

    let Statement::Import(specs) = &block.statements[0] else {
        panic!("expected an import");
    };
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].path, "net");
    assert_eq!(specs[1].path, "lib/extra");
    assert_eq!(specs[1].as_name.as_deref(), Some("extra"));

    assert!(matches!(
        &block.statements[1],
        Statement::Binding { local: true, alias: true, name, .. } if name == "d"
    ));
    assert!(matches!(
        &block.statements[3],
        Statement::Binding { expr: Expr::Seq(items), .. } if items.len() == 2
    ));
}

#[test]
fn test_parse_source_bindings_end_at_next_name() {
    let block = RplParser::parse_source("a = \"x\" \"y\"\nb = a").unwrap();
    assert_eq!(block.statements.len(), 2);
    assert!(matches!(
        &block.statements[0],
        Statement::Binding { expr: Expr::Seq(items), .. } if items.len() == 2
    ));
}

#[test]
fn test_parse_source_package_rules() {
    assert!(RplParser::parse_source("package a.b\n").is_err());
    assert!(RplParser::parse_source("package a\npackage b\n").is_err());
    assert!(RplParser::parse_source("x = ").is_err());
    assert_eq!(RplParser::parse_source("").unwrap().statements.len(), 0);
}

#[test]
fn test_parse_spaced_colon_is_not_a_macro() {
    let parsed = RplParser::parse_pattern("find :x");
    assert!(!matches!(parsed, Ok(Expr::Macro { .. })));
}
