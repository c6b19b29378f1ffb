// Package resolution for `import`
// Searchers run in order: each directory of the library path, then the
// built-in prelude. The first one that finds the package wins.

pub mod prelude;

use crate::rosie_vm::EngineOption;
use crate::rosie_vm::rosie_limits::{
    COLOCATED_LIBDIR, LIBPATH_ENV, LIBPATH_SEPARATOR, RPL_EXTENSION, SYSTEM_LIBDIRS,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source text of a package found by a searcher.
#[derive(Debug, Clone)]
pub struct PackageSource {
    pub text: String,
    /// File path, or `builtin:<name>` for prelude packages
    pub origin: String,
}

pub struct PackageSearcher {
    dirs: Vec<PathBuf>,
}

impl PackageSearcher {
    pub fn new(libpath: &str) -> Self {
        let dirs = libpath
            .split(LIBPATH_SEPARATOR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .collect();
        PackageSearcher { dirs }
    }

    /// Find `path` (e.g. `net` or `my/lib/pkg`). On failure the error lists every place tried.
    pub fn search(&self, path: &str) -> Result<PackageSource, String> {
        let mut tried = Vec::new();

        // Searcher 1: library path directories
        for dir in &self.dirs {
            let candidate = dir.join(format!("{}.{}", path, RPL_EXTENSION));
            if candidate.is_file() {
                return match std::fs::read_to_string(&candidate) {
                    Ok(text) => {
                        debug!(package = path, file = %candidate.display(), "found package file");
                        Ok(PackageSource {
                            text,
                            origin: candidate.display().to_string(),
                        })
                    }
                    Err(e) => Err(format!("cannot read {}: {}", candidate.display(), e)),
                };
            }
            tried.push(format!("no file '{}'", candidate.display()));
        }

        // Searcher 2: built-in prelude
        if let Some(text) = prelude::lookup(path) {
            debug!(package = path, "using built-in package");
            return Ok(PackageSource {
                text: text.to_string(),
                origin: format!("builtin:{}", path),
            });
        }
        tried.push(format!("no built-in package '{}'", path));

        Err(format!(
            "cannot find package '{}':\n\t{}",
            path,
            tried.join("\n\t")
        ))
    }
}

/// Library path a session starts with: explicit option, then `ROSIE_LIBPATH`,
/// then the directory next to the executable and the system directories.
pub fn resolve_libpath(option: &EngineOption) -> String {
    if let Some(libpath) = &option.libpath {
        return libpath.clone();
    }
    if let Ok(libpath) = std::env::var(LIBPATH_ENV)
        && !libpath.is_empty()
    {
        return libpath;
    }
    default_libpath()
}

pub fn default_libpath() -> String {
    let mut dirs: Vec<String> = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
    {
        dirs.push(dir.join(COLOCATED_LIBDIR).display().to_string());
    }
    dirs.extend(SYSTEM_LIBDIRS.iter().map(|dir| dir.to_string()));
    dirs.join(&LIBPATH_SEPARATOR.to_string())
}
