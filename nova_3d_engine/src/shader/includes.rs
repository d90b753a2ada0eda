/// `#include "file"` discovery and expansion for shader sources
///
/// Includes are resolved relative to the directory of the including file.
/// Each file is visited once, so include cycles terminate.

use std::fs;
use std::path::{Path, PathBuf};
use rustc_hash::FxHashSet;
use crate::error::{Error, Result};

/// Parse the target of an `#include "x"` line
pub fn parse_include_line(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("include")?.trim();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    let target = &rest[..end];
    if target.is_empty() { None } else { Some(target) }
}

/// Direct includes of a source text, resolved against `base_dir`
pub fn direct_includes(source: &str, base_dir: &Path) -> Vec<PathBuf> {
    source
        .lines()
        .filter_map(parse_include_line)
        .map(|target| base_dir.join(target))
        .collect()
}

/// All files transitively included by `path`, in discovery order
///
/// Unreadable includes are still reported (their timestamp check fails and
/// the caller treats that as stale) but are not descended into.
pub fn collect_includes(path: &Path) -> Vec<PathBuf> {
    let mut visited = FxHashSet::default();
    let mut ordered = Vec::new();
    visited.insert(path.to_path_buf());
    collect_recursive(path, &mut visited, &mut ordered);
    ordered
}

fn collect_recursive(path: &Path, visited: &mut FxHashSet<PathBuf>, ordered: &mut Vec<PathBuf>) {
    let Ok(source) = fs::read_to_string(path) else {
        return;
    };
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    for include in direct_includes(&source, base_dir) {
        if visited.insert(include.clone()) {
            ordered.push(include.clone());
            collect_recursive(&include, visited, ordered);
        }
    }
}

/// Read `path` and splice every include in place
///
/// A file included twice is only expanded the first time.
pub fn expand_includes(path: &Path) -> Result<String> {
    let mut visited = FxHashSet::default();
    expand_recursive(path, &mut visited)
}

fn expand_recursive(path: &Path, visited: &mut FxHashSet<PathBuf>) -> Result<String> {
    visited.insert(path.to_path_buf());
    let source = fs::read_to_string(path)
        .map_err(|e| Error::FileNotFound(format!("{}: {}", path.display(), e)))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut expanded = String::with_capacity(source.len());
    for line in source.lines() {
        match parse_include_line(line) {
            Some(target) => {
                let include = base_dir.join(target);
                if !visited.contains(&include) {
                    expanded.push_str(&expand_recursive(&include, visited)?);
                }
            }
            None => expanded.push_str(line),
        }
        expanded.push('\n');
    }
    Ok(expanded)
}

#[cfg(test)]
#[path = "includes_tests.rs"]
mod tests;
