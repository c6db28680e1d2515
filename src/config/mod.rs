//! Where the predictor lives and what environment it runs with.

use std::path::{Path, PathBuf};

use crate::consts::{DIST_DIR, default_executable_name};

/// Configuration for the process invoker.
///
/// The environment is an explicit snapshot: the child sees exactly `env`,
/// never whatever the parent process happens to hold at spawn time.
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// The invoker's own directory. The child runs with this as its cwd.
    pub root_dir: PathBuf,
    /// File name of the executable under `<root_dir>/dist`.
    pub executable_name: String,
    /// Environment passed to the child.
    pub env: Vec<(String, String)>,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self::new(default_root_dir())
    }
}

impl InvokerConfig {
    /// Config rooted at `root_dir`, inheriting a snapshot of the current environment.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            executable_name: default_executable_name(),
            env: current_env(),
        }
    }

    /// Replace the environment snapshot.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Absolute path of the predictor: `<root_dir>/dist/<executable_name>`.
    pub fn executable_path(&self) -> PathBuf {
        self.absolute_root().join(DIST_DIR).join(&self.executable_name)
    }

    /// `root_dir` made absolute against the current directory.
    pub fn absolute_root(&self) -> PathBuf {
        std::path::absolute(&self.root_dir).unwrap_or_else(|_| self.root_dir.clone())
    }
}

/// Snapshot of the caller's environment at this moment.
pub fn current_env() -> Vec<(String, String)> {
    std::env::vars().collect()
}

/// Directory holding the running binary, or `.` if it cannot be determined.
pub fn default_root_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
