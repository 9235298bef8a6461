//! Where configuration files live
//!
//! The pipeline asks a [`PathResolver`] for the global and user directories
//! and appends `<file_name>.<extension>` itself.

use std::fmt;
use std::path::PathBuf;

/// Application identity used to build configuration directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub author: String,
    pub version: Option<String>,
}

impl AppInfo {
    /// Relative directory for this application under a platform base directory
    ///
    /// `<author>/<name>` on Windows, `<name>` elsewhere; the version, when
    /// set, is appended as a further component.
    #[must_use]
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::new();
        if cfg!(windows) {
            dir.push(&self.author);
        }
        dir.push(&self.name);
        if let Some(version) = &self.version {
            dir.push(version);
        }
        dir
    }
}

/// Resolves the system-wide and per-user configuration directories
pub trait PathResolver: fmt::Debug + Send + Sync {
    /// Directory holding the system-wide file, if the platform has one
    fn global_dir(&self, app: &AppInfo) -> Option<PathBuf>;

    /// Directory holding the per-user file, if it can be determined
    fn user_dir(&self, app: &AppInfo) -> Option<PathBuf>;
}

/// Platform conventions
///
/// - Linux/BSD: `$XDG_CONFIG_HOME` (or `~/.config`) for the user file, the
///   first entry of `$XDG_CONFIG_DIRS` (or `/etc/xdg`) for the global file
/// - macOS: `~/Library/Application Support` and `/Library/Application Support`
/// - Windows: `%APPDATA%` and `%PROGRAMDATA%`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPaths;

impl PathResolver for SystemPaths {
    fn global_dir(&self, app: &AppInfo) -> Option<PathBuf> {
        system_config_base().map(|base| base.join(app.relative_dir()))
    }

    fn user_dir(&self, app: &AppInfo) -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join(app.relative_dir()))
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn system_config_base() -> Option<PathBuf> {
    let from_env = std::env::var("XDG_CONFIG_DIRS").ok().and_then(|dirs| {
        dirs.split(':')
            .find(|dir| !dir.is_empty())
            .map(PathBuf::from)
    });
    Some(from_env.unwrap_or_else(|| PathBuf::from("/etc/xdg")))
}

#[cfg(target_os = "macos")]
fn system_config_base() -> Option<PathBuf> {
    Some(PathBuf::from("/Library/Application Support"))
}

#[cfg(windows)]
fn system_config_base() -> Option<PathBuf> {
    std::env::var_os("PROGRAMDATA").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn system_config_base() -> Option<PathBuf> {
    None
}

/// Explicit directories, ignoring the platform
///
/// A `None` directory disables that layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedPaths {
    pub global: Option<PathBuf>,
    pub user: Option<PathBuf>,
}

impl FixedPaths {
    #[must_use]
    pub fn new(global: impl Into<PathBuf>, user: impl Into<PathBuf>) -> Self {
        Self {
            global: Some(global.into()),
            user: Some(user.into()),
        }
    }
}

impl PathResolver for FixedPaths {
    fn global_dir(&self, _app: &AppInfo) -> Option<PathBuf> {
        self.global.clone()
    }

    fn user_dir(&self, _app: &AppInfo) -> Option<PathBuf> {
        self.user.clone()
    }
}
