//! # mason - Incremental C/C++ Build Orchestrator
//!
//! mason answers two questions and nothing more: does this output need
//! rebuilding, and how do we run this compiler command, optionally pooled
//! with others?
//!
//! ## Features
//!
//! - **Header-aware staleness**: recursively follows `#include` directives
//!   so touching a deep header rebuilds exactly the units that see it
//! - **Bounded parallelism**: compiler processes run through an
//!   admission-controlled pool (CPU count + 1 by default)
//! - **In-run caching**: file timestamps are cached in a hand-rolled hash
//!   table shared across every check of one build run
//! - **Cross-Platform**: argv spawning on POSIX, correctly quoted
//!   command-line strings on Windows
//!
//! ## Module Organization
//!
//! - [`rebuild`] - staleness decisions and include scanning
//! - [`depcache`] - the path -> mtime dependency table
//! - [`pool`] - the bounded process pool
//! - [`process`] - spawning, waiting, redirections
//! - [`command`] - argument lists and command-line quoting

/// Build driver: walks sources, checks staleness, compiles and links.
pub mod build;

/// External command construction and quoting.
pub mod command;

/// Configuration file parsing (`mason.toml`).
pub mod config;

/// Dependency cache: chained hash table of path -> mtime.
pub mod depcache;

/// Bounded process pool with admission control.
pub mod pool;

/// Child process spawning and waiting.
pub mod process;

/// Rebuild decision engine.
pub mod rebuild;

/// Leveled diagnostic output.
pub mod ui;
