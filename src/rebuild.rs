//! Staleness decisions.
//!
//! Two entry points: a plain mtime comparison of listed inputs against one
//! output, and a transitive variant that follows `#include` directives
//! through the project's headers. Both fail safe: if the output's own
//! timestamp cannot be read, the answer is [`Freshness::Stale`].
//!
//! The transitive check runs on a [`RebuildContext`], whose dependency
//! table persists across checks so a header shared by many translation
//! units is only stat'ed once per build run.

use crate::depcache::DepTable;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The output is at least as new as every (transitive) input.
    Fresh,
    /// Some input is newer than the output, or the output cannot be read.
    Stale,
}

fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Plain staleness check: no include scanning. Returns an error when an
/// input's timestamp cannot be read (freshness cannot be concluded either
/// way); a missing or unreadable output is simply [`Freshness::Stale`].
pub fn needs_rebuild(output: &Path, inputs: &[PathBuf]) -> Result<Freshness> {
    let Ok(output_time) = modified_time(output) else {
        return Ok(Freshness::Stale);
    };
    for input in inputs {
        let input_time = modified_time(input).with_context(|| {
            format!("could not read modification time of {}", input.display())
        })?;
        if input_time > output_time {
            return Ok(Freshness::Stale);
        }
    }
    Ok(Freshness::Fresh)
}

/// Process-wide rebuild state: the dependency cache plus the extra include
/// search directories. Construct once in the build driver and thread through
/// every check of the run.
#[derive(Debug, Default)]
pub struct RebuildContext {
    table: DepTable,
    include_dirs: Vec<PathBuf>,
}

impl RebuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_dirs(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            table: DepTable::new(),
            include_dirs,
        }
    }

    pub fn add_include_dir(&mut self, dir: impl Into<PathBuf>) {
        self.include_dirs.push(dir.into());
    }

    /// Number of paths currently cached.
    pub fn cached_paths(&self) -> usize {
        self.table.len()
    }

    /// Transitive staleness check: walks the `#include` closure of `inputs`
    /// and reports [`Freshness::Stale`] as soon as any reachable file is
    /// newer than `output`.
    ///
    /// Include targets are resolved against the directory of the including
    /// file, then the working directory, then each configured include
    /// directory; a target found nowhere is treated as a system header and
    /// not followed. A file whose timestamp cannot be read aborts the check
    /// with an error; a file whose *contents* cannot be read is just not
    /// scanned further (its timestamp was already checked).
    pub fn needs_rebuild_with_includes(
        &mut self,
        output: &Path,
        inputs: &[PathBuf],
    ) -> Result<Freshness> {
        let Ok(output_time) = modified_time(output) else {
            return Ok(Freshness::Stale);
        };

        // Worklist state is per-check; only the mtime table persists.
        let mut pending: Vec<PathBuf> = inputs.to_vec();
        let mut done: Vec<PathBuf> = Vec::new();

        while let Some(path) = pending.pop() {
            done.push(path.clone());

            let mtime = match self.table.get(&path) {
                Some(cached) => cached,
                None => {
                    let fresh = modified_time(&path).with_context(|| {
                        format!("could not read modification time of {}", path.display())
                    })?;
                    self.table.insert(&path, fresh)
                }
            };
            if mtime > output_time {
                return Ok(Freshness::Stale);
            }

            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let contents = String::from_utf8_lossy(&bytes);
            let local_dir = path.parent().unwrap_or(Path::new("."));

            for target in scan_includes(&contents) {
                match resolve_include(local_dir, &target, &self.include_dirs) {
                    Some(found) => {
                        if !done.contains(&found) && !pending.contains(&found) {
                            pending.push(found);
                        }
                    }
                    None => {
                        // System or otherwise unresolvable header; remember
                        // it so it is not retried from another includer.
                        let unresolved = PathBuf::from(target);
                        if !done.contains(&unresolved) {
                            done.push(unresolved);
                        }
                    }
                }
            }
        }

        Ok(Freshness::Fresh)
    }
}

/// Lexically extracts `#include` targets from source text. Both `"..."` and
/// `<...>` forms are reported; a macro-valued target has no literal filename
/// and is skipped.
pub fn scan_includes(contents: &str) -> Vec<String> {
    let mut targets = Vec::new();
    for line in contents.lines() {
        let Some(rest) = line.trim_start().strip_prefix('#') else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix("include") else {
            continue;
        };
        let rest = rest.trim_start();
        let closing = match rest.chars().next() {
            Some('"') => '"',
            Some('<') => '>',
            _ => continue,
        };
        let body = &rest[1..];
        if let Some(end) = body.find(closing) {
            targets.push(body[..end].to_string());
        }
    }
    targets
}

/// First match wins: the including file's directory, the working directory,
/// then the configured include directories.
fn resolve_include(local_dir: &Path, target: &str, include_dirs: &[PathBuf]) -> Option<PathBuf> {
    let local = local_dir.join(target);
    if local.exists() {
        return Some(local);
    }
    let relative = PathBuf::from(target);
    if relative.exists() {
        return Some(relative);
    }
    for dir in include_dirs {
        let candidate = dir.join(target);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_quoted_and_angled_targets() {
        let src = r#"
            #include "local.h"
            #include <vector>
            # include "spaced.h"
              #  include  <deep/nested.hpp>
            int main() { return 0; }
        "#;
        assert_eq!(
            scan_includes(src),
            vec!["local.h", "vector", "spaced.h", "deep/nested.hpp"]
        );
    }

    #[test]
    fn scan_skips_macro_valued_targets() {
        let src = "#include CONFIG_HEADER\n#include \"real.h\"\n";
        assert_eq!(scan_includes(src), vec!["real.h"]);
    }

    #[test]
    fn scan_ignores_non_include_directives() {
        let src = "#define FOO 1\n#pragma once\n#ifdef BAR\n#endif\n";
        assert!(scan_includes(src).is_empty());
    }

    #[test]
    fn scan_ignores_unterminated_targets() {
        assert!(scan_includes("#include \"broken.h\n").is_empty());
    }
}
