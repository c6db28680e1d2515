//! Shell-script predictors for integration tests.
//!
//! Every script is written up front, before any test forks a child. A file
//! that a concurrently forked child still holds open for writing cannot be
//! exec'd (ETXTBSY), so tests must reach their fixtures through a
//! `LazyLock` that has finished building before they spawn anything.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use appraiser::consts::default_executable_name;

/// One fixture root: `<name>/dist/<file>` holding `body` as a shell script.
pub struct Script {
    pub name: &'static str,
    pub file: Option<&'static str>,
    pub body: &'static str,
    pub executable: bool,
}

impl Script {
    pub const fn new(name: &'static str, body: &'static str) -> Self {
        Self {
            name,
            file: None,
            body,
            executable: true,
        }
    }

    /// Install under a custom executable name instead of the platform default.
    pub const fn named(mut self, file: &'static str) -> Self {
        self.file = Some(file);
        self
    }

    /// Install without the execute bit.
    pub const fn not_executable(mut self) -> Self {
        self.executable = false;
        self
    }
}

/// Write every script under a fresh directory in cargo's test tmp dir.
pub fn build(scripts: &[Script]) -> PathBuf {
    let root = tempfile::Builder::new()
        .prefix("fixtures-")
        .tempdir_in(env!("CARGO_TARGET_TMPDIR"))
        .unwrap()
        .keep();
    for script in scripts {
        install(&root.join(script.name), script);
    }
    root
}

fn install(dir: &Path, script: &Script) {
    let dist = dir.join("dist");
    fs::create_dir_all(&dist).unwrap();
    let file = script
        .file
        .map(str::to_string)
        .unwrap_or_else(default_executable_name);
    let path = dist.join(file);
    fs::write(&path, format!("#!/bin/sh\n{}\n", script.body)).unwrap();
    let mode = if script.executable { 0o755 } else { 0o644 };
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
}
