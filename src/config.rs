//! Project manifest parsing (`mason.toml`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Default)]
pub struct MasonConfig {
    pub package: PackageConfig,
    pub build: Option<BuildConfig>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PackageConfig {
    pub name: String,
    #[allow(dead_code)]
    pub version: String,
    #[serde(default = "default_edition")]
    pub edition: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct BuildConfig {
    /// Compiler override; falls back to `$CC`/`$CXX`, then `cc`/`c++`.
    pub compiler: Option<String>,
    /// Output binary name; defaults to the package name.
    pub bin: Option<String>,
    pub flags: Option<Vec<String>>,
    pub libs: Option<Vec<String>>,
    /// Extra directories searched when resolving `#include` targets, also
    /// passed to the compiler as `-I`.
    pub include_dirs: Option<Vec<PathBuf>>,
    /// Maximum concurrent compiler processes; defaults to CPU count + 1.
    pub jobs: Option<usize>,
}

fn default_edition() -> String {
    "c17".to_string()
}

pub fn load_config() -> Result<MasonConfig> {
    if !Path::new("mason.toml").exists() {
        anyhow::bail!("mason.toml not found in current directory");
    }
    let config_str = fs::read_to_string("mason.toml")
        .context("Failed to read mason.toml - check file permissions")?;
    let config: MasonConfig = toml::from_str(&config_str)
        .context("Failed to parse mason.toml - check for syntax errors")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_manifest() {
        let config: MasonConfig = toml::from_str(
            r#"
            [package]
            name = "demo"
            version = "0.1.0"
            edition = "c11"

            [build]
            compiler = "clang"
            flags = ["-Wall", "-Wextra"]
            libs = ["m"]
            include_dirs = ["include", "vendor/include"]
            jobs = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.package.name, "demo");
        assert_eq!(config.package.edition, "c11");
        let build = config.build.unwrap();
        assert_eq!(build.compiler.as_deref(), Some("clang"));
        assert_eq!(build.jobs, Some(4));
        assert_eq!(build.include_dirs.unwrap().len(), 2);
    }

    #[test]
    fn edition_defaults_to_c17() {
        let config: MasonConfig =
            toml::from_str("[package]\nname = \"demo\"\nversion = \"0.1.0\"\n").unwrap();
        assert_eq!(config.package.edition, "c17");
    }
}
