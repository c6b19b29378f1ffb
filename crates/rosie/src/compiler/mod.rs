pub mod ast;
mod charset;
mod environment;
pub mod parser;

pub use environment::{Binding, Environment, Package};

use crate::compiler::ast::{Block, Expr, Statement};
use crate::compiler::charset::parse_charset;
use crate::compiler::parser::{RplParser, SourceRange};
use crate::package::PackageSearcher;
use crate::rosie_vm::Diagnostic;
use crate::rosie_vm::rosie_limits::MAX_IMPORT_DEPTH;
use crate::rpl_pattern::{CharSet, Pattern, SetItem};
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

/// Result of loading source text into an environment.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Package the source declared, if any
    pub package: Option<SmolStr>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolves, compiles and loads pattern source against an environment.
pub struct RplCompiler<'e> {
    env: &'e mut Environment,
    searcher: &'e PackageSearcher,
    importing: Vec<SmolStr>,
}

impl<'e> RplCompiler<'e> {
    pub fn new(env: &'e mut Environment, searcher: &'e PackageSearcher) -> Self {
        RplCompiler {
            env,
            searcher,
            importing: Vec::new(),
        }
    }

    /// Compile a standalone expression against the top level. The result is
    /// always a capture: a bare reference keeps its own type, anything else
    /// is captured as `*`.
    pub fn compile_expression(&self, source: &str) -> Result<Pattern, Vec<Diagnostic>> {
        let expr = RplParser::parse_pattern(source).map_err(|e| vec![e.to_diagnostic(source)])?;
        let pattern = compile_expr(&expr, &self.env.top, true, source).map_err(|d| vec![d])?;
        if pattern.is_capture() {
            Ok(pattern)
        } else {
            Ok(Pattern::Capture {
                name: SmolStr::new_static("*"),
                pattern: Arc::new(pattern),
            })
        }
    }

    /// Apply every statement of `source` in order. Statements that fail are
    /// reported; the ones before and after them still take effect.
    pub fn load_source(&mut self, source: &str) -> LoadReport {
        let block = match RplParser::parse_source(source) {
            Ok(block) => block,
            Err(e) => {
                return LoadReport {
                    package: None,
                    diagnostics: vec![e.to_diagnostic(source)],
                };
            }
        };

        match block.package.clone() {
            None => {
                let mut unit = std::mem::take(&mut self.env.top);
                let diagnostics = self.process_block(&mut unit, &block, source);
                self.env.top = unit;
                LoadReport {
                    package: None,
                    diagnostics,
                }
            }
            Some(name) => {
                // loading into an existing package extends it
                let mut unit = match self.env.packages.get(&name) {
                    Some(existing) => (**existing).clone(),
                    None => Package::new(name.clone(), "<source>"),
                };
                let diagnostics = self.process_block(&mut unit, &block, source);
                let unit = Arc::new(unit);
                self.env.packages.insert(name.clone(), unit.clone());
                self.env.top.prefixes.insert(name.clone(), unit);
                LoadReport {
                    package: Some(name),
                    diagnostics,
                }
            }
        }
    }

    /// Import `path` into the top level under `as_name` (default: the package's own name).
    /// Returns the name the package declares.
    pub fn import(&mut self, path: &str, as_name: Option<&str>) -> Result<SmolStr, Vec<Diagnostic>> {
        let mut unit = std::mem::take(&mut self.env.top);
        let result = self.import_into(&mut unit, path, as_name);
        self.env.top = unit;
        result
    }

    fn import_into(
        &mut self,
        unit: &mut Package,
        path: &str,
        as_name: Option<&str>,
    ) -> Result<SmolStr, Vec<Diagnostic>> {
        let package = self.load_package(path)?;
        let name = package.name.clone();
        let prefix = as_name.map(SmolStr::new).unwrap_or_else(|| name.clone());
        unit.prefixes.insert(prefix, package);
        Ok(name)
    }

    fn load_package(&mut self, path: &str) -> Result<Arc<Package>, Vec<Diagnostic>> {
        if let Some(package) = self.env.packages.get(path) {
            return Ok(package.clone());
        }
        if self.importing.iter().any(|p| p == path) {
            let chain: Vec<&str> = self.importing.iter().map(SmolStr::as_str).collect();
            return Err(vec![Diagnostic::loader(format!(
                "import cycle: {} -> {}",
                chain.join(" -> "),
                path
            ))]);
        }
        if self.importing.len() >= MAX_IMPORT_DEPTH {
            return Err(vec![Diagnostic::loader(format!(
                "imports nested more than {} deep at '{}'",
                MAX_IMPORT_DEPTH, path
            ))]);
        }

        let source = self
            .searcher
            .search(path)
            .map_err(|message| vec![Diagnostic::loader(message)])?;
        let block = RplParser::parse_source(&source.text).map_err(|e| {
            vec![in_origin(e.to_diagnostic(&source.text), &source.origin)]
        })?;

        let name = match &block.package {
            Some(name) => name.clone(),
            None => SmolStr::new(path.rsplit('/').next().unwrap_or(path)),
        };
        let mut package = Package::new(name, source.origin.as_str());

        self.importing.push(SmolStr::new(path));
        let diagnostics = self.process_block(&mut package, &block, &source.text);
        self.importing.pop();

        if !diagnostics.is_empty() {
            return Err(diagnostics
                .into_iter()
                .map(|d| in_origin(d, &source.origin))
                .collect());
        }

        debug!(
            package = %package.name,
            origin = %package.origin,
            bindings = package.bindings.len(),
            "imported package"
        );
        let package = Arc::new(package);
        self.env.packages.insert(SmolStr::new(path), package.clone());
        Ok(package)
    }

    fn process_block(&mut self, unit: &mut Package, block: &Block, text: &str) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];
        for statement in &block.statements {
            match statement {
                Statement::Import(specs) => {
                    for spec in specs {
                        if let Err(errors) = self.import_into(unit, &spec.path, spec.as_name.as_deref()) {
                            let (line, column) = spec.range.line_col(text);
                            diagnostics.extend(errors.into_iter().map(|d| {
                                if d.line.is_none() { d.at(line, column) } else { d }
                            }));
                        }
                    }
                }
                Statement::Binding {
                    local,
                    alias,
                    name,
                    expr,
                    ..
                } => match compile_expr(expr, unit, true, text) {
                    Ok(pattern) => {
                        let binding = Binding {
                            name: unit.qualify(name),
                            pattern: Arc::new(pattern),
                            alias: *alias,
                            local: *local,
                        };
                        unit.bindings.insert(name.clone(), binding);
                    }
                    Err(d) => diagnostics.push(d),
                },
            }
        }
        diagnostics
    }
}

fn in_origin(mut d: Diagnostic, origin: &str) -> Diagnostic {
    d.message = format!("{}: {}", origin, d.message);
    d
}

fn compiler_error(message: impl Into<String>, range: &SourceRange, text: &str) -> Diagnostic {
    let (line, column) = range.line_col(text);
    Diagnostic::compiler(message).at(line, column)
}

fn resolve<'s>(scope: &'s Package, name: &str) -> Result<&'s Binding, String> {
    match name.split_once('.') {
        Some((prefix, local)) => {
            let package = scope
                .prefixes
                .get(prefix)
                .ok_or_else(|| format!("undefined package: {}", prefix))?;
            let binding = package
                .bindings
                .get(local)
                .ok_or_else(|| format!("undefined identifier: {}", name))?;
            if binding.local {
                return Err(format!("{} is local to package {}", name, package.name));
            }
            Ok(binding)
        }
        None => scope
            .bindings
            .get(name)
            .ok_or_else(|| format!("undefined identifier: {}", name)),
    }
}

/// Compile one expression in `scope`. In cooked mode a token boundary is
/// placed between the elements of every sequence.
fn compile_expr(expr: &Expr, scope: &Package, cooked: bool, text: &str) -> Result<Pattern, Diagnostic> {
    let pattern = match expr {
        Expr::Literal(bytes) => Pattern::Literal(bytes.clone().into_boxed_slice()),
        Expr::Charset(raw, range) => {
            let set = parse_charset(raw).map_err(|m| compiler_error(m, range, text))?;
            Pattern::Set(set)
        }
        Expr::Any => Pattern::Any,
        Expr::Boundary => Pattern::Boundary,
        Expr::Start => Pattern::Start,
        Expr::End => Pattern::End,
        Expr::Ref(name, range) => resolve(scope, name)
            .map_err(|m| compiler_error(m, range, text))?
            .reference(),
        Expr::Seq(items) => {
            let mut seq = Vec::with_capacity(items.len() * 2);
            for (i, item) in items.iter().enumerate() {
                if cooked && i > 0 {
                    seq.push(Pattern::Boundary);
                }
                seq.push(compile_expr(item, scope, cooked, text)?);
            }
            Pattern::Seq(seq)
        }
        Expr::Choice(items) => Pattern::Choice(
            items
                .iter()
                .map(|item| compile_expr(item, scope, cooked, text))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Expr::Group { expr, cooked } => compile_expr(expr, scope, *cooked, text)?,
        Expr::Repeat { expr, min, max } => Pattern::Repeat {
            pattern: Box::new(compile_expr(expr, scope, cooked, text)?),
            min: *min,
            max: *max,
        },
        Expr::Not(expr) => Pattern::Not(Box::new(compile_expr(expr, scope, cooked, text)?)),
        Expr::Ahead(expr) => Pattern::Ahead(Box::new(compile_expr(expr, scope, cooked, text)?)),
        Expr::Macro { name, arg, range } => {
            let arg = compile_expr(arg, scope, cooked, text)?;
            match name.as_str() {
                "find" => Pattern::Find {
                    pattern: Box::new(arg),
                    all: false,
                },
                "findall" => Pattern::Find {
                    pattern: Box::new(arg),
                    all: true,
                },
                "ci" => case_insensitive(arg),
                other => {
                    return Err(compiler_error(
                        format!("undefined macro: {}", other),
                        range,
                        text,
                    ));
                }
            }
        }
    };
    Ok(pattern)
}

// ci: rewrites literals and single letters in sets; referenced bindings are left alone
fn case_insensitive(p: Pattern) -> Pattern {
    match p {
        Pattern::Literal(bytes) => Pattern::LiteralCi(bytes.to_ascii_lowercase().into_boxed_slice()),
        Pattern::Set(set) => Pattern::Set(set_case_insensitive(set)),
        Pattern::Seq(items) => Pattern::Seq(items.into_iter().map(case_insensitive).collect()),
        Pattern::Choice(items) => Pattern::Choice(items.into_iter().map(case_insensitive).collect()),
        Pattern::Repeat { pattern, min, max } => Pattern::Repeat {
            pattern: Box::new(case_insensitive(*pattern)),
            min,
            max,
        },
        Pattern::Not(pattern) => Pattern::Not(Box::new(case_insensitive(*pattern))),
        Pattern::Ahead(pattern) => Pattern::Ahead(Box::new(case_insensitive(*pattern))),
        Pattern::Find { pattern, all } => Pattern::Find {
            pattern: Box::new(case_insensitive(*pattern)),
            all,
        },
        other => other,
    }
}

fn set_case_insensitive(set: CharSet) -> CharSet {
    let items = set
        .items
        .into_iter()
        .map(|item| match item {
            SetItem::Char(c) if c.is_ascii_alphabetic() => SetItem::Nested(CharSet {
                items: vec![
                    SetItem::Char(c.to_ascii_lowercase()),
                    SetItem::Char(c.to_ascii_uppercase()),
                ],
                negated: false,
            }),
            SetItem::Nested(inner) => SetItem::Nested(set_case_insensitive(inner)),
            other => other,
        })
        .collect();
    CharSet {
        items,
        negated: set.negated,
    }
}
