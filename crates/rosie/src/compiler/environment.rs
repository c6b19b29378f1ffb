use crate::rpl_pattern::Pattern;
use ahash::AHashMap;
use smol_str::SmolStr;
use std::sync::Arc;

/// A name bound to a pattern.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Capture type: the bare name at top level, `pkg.name` inside a package
    pub name: SmolStr,
    pub pattern: Arc<Pattern>,
    pub alias: bool,
    /// Invisible outside the package that defines it
    pub local: bool,
}

impl Binding {
    /// The pattern a reference to this binding compiles to.
    pub fn reference(&self) -> Pattern {
        if self.alias {
            Pattern::Alias {
                name: self.name.clone(),
                pattern: self.pattern.clone(),
            }
        } else {
            Pattern::Capture {
                name: self.name.clone(),
                pattern: self.pattern.clone(),
            }
        }
    }

    pub fn footprint(&self) -> usize {
        self.name.len() + self.pattern.footprint()
    }
}

/// A namespace: its own bindings plus the packages it imported, by prefix.
/// The top level of a session is a package with an empty name.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: SmolStr,
    pub origin: SmolStr,
    pub bindings: AHashMap<SmolStr, Binding>,
    pub prefixes: AHashMap<SmolStr, Arc<Package>>,
}

impl Package {
    pub fn new(name: impl Into<SmolStr>, origin: impl Into<SmolStr>) -> Self {
        Package {
            name: name.into(),
            origin: origin.into(),
            ..Default::default()
        }
    }

    /// Capture type for a binding defined here.
    pub fn qualify(&self, name: &str) -> SmolStr {
        if self.name.is_empty() {
            SmolStr::new(name)
        } else {
            SmolStr::new(format!("{}.{}", self.name, name))
        }
    }

    pub fn footprint(&self) -> usize {
        self.bindings.values().map(Binding::footprint).sum()
    }
}

/// Everything a session has loaded.
#[derive(Debug, Default)]
pub struct Environment {
    pub top: Package,
    /// Packages loaded so far, keyed by import path
    pub packages: AHashMap<SmolStr, Arc<Package>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// Bytes held by bindings, counted once per package.
    pub fn footprint(&self) -> usize {
        self.top.footprint() + self.packages.values().map(|p| p.footprint()).sum::<usize>()
    }

    pub fn binding_count(&self) -> usize {
        self.top.bindings.len() + self.packages.values().map(|p| p.bindings.len()).sum::<usize>()
    }
}
