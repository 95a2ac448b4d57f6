//! Integration tests for the rebuild decision engine.
//!
//! Each test builds a small source tree in a temp directory and drives the
//! staleness checks by setting file timestamps explicitly, so no sleeping
//! and no real compiler is involved.

use mason::rebuild::{self, Freshness, RebuildContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Writes `contents` and pins the file's mtime at `base + offset_secs`.
fn write_at(path: &Path, contents: &str, base: SystemTime, offset_secs: u64) {
    fs::write(path, contents).expect("write file");
    let file = fs::File::options()
        .write(true)
        .open(path)
        .expect("reopen file");
    file.set_modified(base + Duration::from_secs(offset_secs))
        .expect("set mtime");
}

fn base_time() -> SystemTime {
    // Comfortably in the past so freshly created outputs never race it.
    SystemTime::now() - Duration::from_secs(100_000)
}

#[test]
fn fresh_when_all_inputs_are_older() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let input_a = dir.path().join("a.c");
    let input_b = dir.path().join("b.c");
    let output = dir.path().join("app");
    write_at(&input_a, "int a;", base, 10);
    write_at(&input_b, "int b;", base, 20);
    write_at(&output, "", base, 20);

    let result = rebuild::needs_rebuild(&output, &[input_a, input_b]).unwrap();
    assert_eq!(result, Freshness::Fresh);
}

#[test]
fn stale_when_any_input_is_newer() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let input_a = dir.path().join("a.c");
    let input_b = dir.path().join("b.c");
    let output = dir.path().join("app");
    write_at(&input_a, "int a;", base, 10);
    write_at(&input_b, "int b;", base, 50);
    write_at(&output, "", base, 20);

    let result = rebuild::needs_rebuild(&output, &[input_a, input_b]).unwrap();
    assert_eq!(result, Freshness::Stale);
}

#[test]
fn missing_output_is_stale_fail_safe() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let input = dir.path().join("a.c");
    write_at(&input, "int a;", base, 10);

    let result = rebuild::needs_rebuild(&dir.path().join("no-such-app"), &[input]).unwrap();
    assert_eq!(result, Freshness::Stale);
}

#[test]
fn unreadable_input_is_an_error_not_a_guess() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let output = dir.path().join("app");
    write_at(&output, "", base, 20);

    let missing = dir.path().join("gone.c");
    assert!(rebuild::needs_rebuild(&output, &[missing]).is_err());
}

#[test]
fn touching_a_transitive_header_forces_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let a_c = dir.path().join("a.c");
    let b_h = dir.path().join("b.h");
    let c_h = dir.path().join("c.h");
    let output = dir.path().join("app");

    write_at(&a_c, "#include \"b.h\"\nint main() { return 0; }\n", base, 10);
    write_at(&b_h, "#include \"c.h\"\n", base, 10);
    write_at(&output, "", base, 20);
    // Only the deepest header is newer than the output.
    write_at(&c_h, "#define C 1\n", base, 30);

    let mut ctx = RebuildContext::new();
    let result = ctx
        .needs_rebuild_with_includes(&output, &[a_c.clone()])
        .unwrap();
    assert_eq!(result, Freshness::Stale);

    // With every file older than the output the same graph is fresh.
    write_at(&c_h, "#define C 1\n", base, 10);
    let mut ctx = RebuildContext::new();
    let result = ctx.needs_rebuild_with_includes(&output, &[a_c]).unwrap();
    assert_eq!(result, Freshness::Fresh);
}

#[test]
fn include_cycles_terminate() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let a_h = dir.path().join("a.h");
    let b_h = dir.path().join("b.h");
    let main_c = dir.path().join("main.c");
    let output = dir.path().join("app");

    write_at(&a_h, "#include \"b.h\"\n", base, 10);
    write_at(&b_h, "#include \"a.h\"\n", base, 10);
    write_at(&main_c, "#include \"a.h\"\nint main() { return 0; }\n", base, 10);
    write_at(&output, "", base, 20);

    let mut ctx = RebuildContext::new();
    let result = ctx
        .needs_rebuild_with_includes(&output, &[main_c.clone()])
        .unwrap();
    assert_eq!(result, Freshness::Fresh);

    write_at(&b_h, "#include \"a.h\"\n", base, 30);
    let mut ctx = RebuildContext::new();
    let result = ctx.needs_rebuild_with_includes(&output, &[main_c]).unwrap();
    assert_eq!(result, Freshness::Stale);
}

#[test]
fn unresolvable_headers_are_skipped_not_errors() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let main_c = dir.path().join("main.c");
    let output = dir.path().join("app");

    write_at(
        &main_c,
        "#include <stdio.h>\n#include \"nowhere_to_be_found.h\"\nint main() { return 0; }\n",
        base,
        10,
    );
    write_at(&output, "", base, 20);

    let mut ctx = RebuildContext::new();
    let result = ctx.needs_rebuild_with_includes(&output, &[main_c]).unwrap();
    assert_eq!(result, Freshness::Fresh);
}

#[test]
fn extra_include_dirs_are_searched_last() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let include_dir = dir.path().join("include");
    fs::create_dir(&include_dir).unwrap();

    let main_c = dir.path().join("main.c");
    let deep_h = include_dir.join("deep.h");
    let output = dir.path().join("app");

    write_at(&main_c, "#include \"deep.h\"\nint main() { return 0; }\n", base, 10);
    write_at(&output, "", base, 20);
    write_at(&deep_h, "#define DEEP 1\n", base, 30);

    // Without the include dir the header is treated as external: fresh.
    let mut ctx = RebuildContext::new();
    let result = ctx
        .needs_rebuild_with_includes(&output, &[main_c.clone()])
        .unwrap();
    assert_eq!(result, Freshness::Fresh);

    // With it, the newer header is found and forces a rebuild.
    let mut ctx = RebuildContext::with_include_dirs(vec![include_dir]);
    let result = ctx.needs_rebuild_with_includes(&output, &[main_c]).unwrap();
    assert_eq!(result, Freshness::Stale);
}

#[test]
fn cache_persists_across_checks_in_one_context() {
    let dir = tempfile::tempdir().unwrap();
    let base = base_time();
    let shared_h = dir.path().join("shared.h");
    let a_c = dir.path().join("a.c");
    let b_c = dir.path().join("b.c");
    let a_o = dir.path().join("a.o");
    let b_o = dir.path().join("b.o");

    write_at(&shared_h, "#define S 1\n", base, 10);
    write_at(&a_c, "#include \"shared.h\"\n", base, 10);
    write_at(&b_c, "#include \"shared.h\"\n", base, 10);
    write_at(&a_o, "", base, 20);
    write_at(&b_o, "", base, 20);

    let mut ctx = RebuildContext::new();
    assert_eq!(
        ctx.needs_rebuild_with_includes(&a_o, &[a_c]).unwrap(),
        Freshness::Fresh
    );
    let cached_after_first = ctx.cached_paths();
    assert_eq!(
        ctx.needs_rebuild_with_includes(&b_o, &[PathBuf::from(&b_c)])
            .unwrap(),
        Freshness::Fresh
    );
    // Second check adds only b.c; shared.h was a cache hit.
    assert_eq!(ctx.cached_paths(), cached_after_first + 1);
}
