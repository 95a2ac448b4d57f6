//! Build driver.
//!
//! Walks `src/` for translation units, asks the rebuild engine which ones
//! are stale (following their `#include` closure), compiles the stale ones
//! through the bounded process pool and links when any object file is newer
//! than the binary.

use crate::command::Cmd;
use crate::config::MasonConfig;
use crate::pool::ProcPool;
use crate::process::{self, Redirections};
use crate::rebuild::{self, Freshness, RebuildContext};
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

const C_EXTENSIONS: [&str; 4] = ["c", "cpp", "cc", "cxx"];

pub fn clean() -> Result<()> {
    if Path::new("build").exists() {
        fs::remove_dir_all("build").context("Failed to remove build directory")?;
        println!("{} Build directory cleaned", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(())
}

fn collect_sources() -> (Vec<PathBuf>, bool) {
    let mut sources = Vec::new();
    let mut has_cpp = false;
    for entry in WalkDir::new("src").into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy();
            if C_EXTENSIONS.contains(&ext.as_ref()) {
                if ext != "c" {
                    has_cpp = true;
                }
                sources.push(path.to_owned());
            }
        }
    }
    (sources, has_cpp)
}

fn pick_compiler(config: &MasonConfig, has_cpp: bool) -> String {
    if let Some(build) = &config.build {
        if let Some(compiler) = &build.compiler {
            return compiler.clone();
        }
    }
    if has_cpp {
        std::env::var("CXX").unwrap_or_else(|_| "c++".to_string())
    } else {
        std::env::var("CC").unwrap_or_else(|_| "cc".to_string())
    }
}

fn binary_path(config: &MasonConfig) -> PathBuf {
    let basename = config
        .build
        .as_ref()
        .and_then(|b| b.bin.clone())
        .unwrap_or_else(|| config.package.name.clone());
    let name = if cfg!(target_os = "windows") {
        format!("{basename}.exe")
    } else {
        basename
    };
    Path::new("build").join(name)
}

/// Compiles and links the project. Returns `true` when the binary is up to
/// date at the end, `false` on a compile/link failure already reported to
/// the user.
pub fn build_project(config: &MasonConfig, release: bool) -> Result<bool> {
    let start_time = Instant::now();

    let (sources, has_cpp) = collect_sources();
    if sources.is_empty() {
        println!("{} No source files found.", "!".yellow());
        return Ok(false);
    }

    let obj_dir = Path::new("build").join("obj");
    fs::create_dir_all(&obj_dir).context("Failed to create build directory")?;

    let compiler = pick_compiler(config, has_cpp);
    let build_cfg = config.build.as_ref();
    let include_dirs = build_cfg
        .and_then(|b| b.include_dirs.clone())
        .unwrap_or_default();
    let jobs = build_cfg.and_then(|b| b.jobs);

    let mut ctx = RebuildContext::with_include_dirs(include_dirs.clone());
    let mut pool = ProcPool::new(jobs);
    let mut cmd = Cmd::new();
    let mut objects = Vec::new();
    let mut compiled = 0usize;

    for source in &sources {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let object = obj_dir.join(format!("{stem}.o"));

        let freshness = ctx
            .needs_rebuild_with_includes(&object, std::slice::from_ref(source))
            .with_context(|| format!("could not check staleness of {}", source.display()))?;
        objects.push(object.clone());
        if freshness == Freshness::Fresh {
            continue;
        }

        cmd.arg(compiler.as_str())
            .arg("-c")
            .arg(source.to_string_lossy())
            .arg("-o")
            .arg(object.to_string_lossy())
            .arg(format!("-std={}", config.package.edition));
        if release {
            cmd.arg("-O2");
        } else {
            cmd.arg("-g").arg("-Wall");
        }
        for dir in &include_dirs {
            cmd.arg(format!("-I{}", dir.display()));
        }
        if let Some(flags) = build_cfg.and_then(|b| b.flags.as_ref()) {
            cmd.args(flags.iter().cloned());
        }

        if let Err(e) = pool.submit(&mut cmd, &Redirections::default()) {
            pool.flush().ok();
            println!("{} Build failed: {}", "x".red(), e);
            return Ok(false);
        }
        compiled += 1;
    }

    if pool.flush().is_err() {
        println!("{} Build failed", "x".red());
        return Ok(false);
    }

    let output_bin = binary_path(config);
    let needs_link = rebuild::needs_rebuild(&output_bin, &objects)?;
    if compiled == 0 && needs_link == Freshness::Fresh {
        println!("{} Up to date", "⚡".green());
        return Ok(true);
    }

    if needs_link == Freshness::Stale {
        println!("   {} Linking...", "🔗".cyan());
        cmd.arg(compiler.as_str());
        cmd.args(objects.iter().map(|o| o.to_string_lossy().to_string()));
        cmd.arg("-o").arg(output_bin.to_string_lossy());
        if let Some(libs) = build_cfg.and_then(|b| b.libs.as_ref()) {
            for lib in libs {
                cmd.arg(format!("-l{lib}"));
            }
        }
        if process::run(&mut cmd, &Redirections::default()).is_err() {
            println!("{} Linking failed", "x".red());
            return Ok(false);
        }
    }

    println!(
        "{} Build finished in {:.2?} ({} of {} units compiled, {} paths cached)",
        "✓".green(),
        start_time.elapsed(),
        compiled,
        sources.len(),
        ctx.cached_paths()
    );
    Ok(true)
}

pub fn build_and_run(config: &MasonConfig, release: bool, run_args: &[String]) -> Result<()> {
    if !build_project(config, release)? {
        return Ok(());
    }

    let bin_path = binary_path(config);
    println!("{} Running...\n", "▶".green());
    let mut cmd = Cmd::new();
    cmd.arg(bin_path.to_string_lossy());
    cmd.args(run_args.iter().cloned());
    let mut handle = process::spawn(&cmd, &Redirections::default())?;
    // the target program's exit code is its own business
    let _ = process::wait(&mut handle)?;
    Ok(())
}
