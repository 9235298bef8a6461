//! File-format backends
//!
//! The resolution pipeline only talks to [`Backend`]; adding a format means
//! implementing the trait and registering it in a [`BackendRegistry`].

pub mod ini;
pub mod toml_file;

use crate::error::{Result, SchemaError};
use crate::section::Section;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub use ini::IniBackend;
pub use toml_file::TomlBackend;

/// Persistence contract for one configuration file format
pub trait Backend: Send + Sync {
    /// Name the format is registered under, e.g. `ini`
    fn name(&self) -> &str;

    /// File extension without the dot, e.g. `cfg`
    fn extension(&self) -> &str;

    /// Reject trees this format cannot represent (`InvalidConfigTree`)
    fn validate(&self, tree: &Section) -> Result<()>;

    /// Overlay values found in the file at `path` onto `tree`
    ///
    /// Keys missing from the file must leave the existing values untouched.
    fn read(&self, path: &Path, tree: &mut Section) -> Result<()>;

    /// Render an annotated template of `tree`, headed by `doc`
    fn write(&self, tree: &Section, doc: Option<&str>) -> String;
}

/// Explicit name → backend lookup
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the bundled `ini` and `toml` backends
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(IniBackend);
        registry.register(TomlBackend);
        registry
    }

    /// Register a backend, replacing any backend with the same name
    pub fn register(&mut self, backend: impl Backend + 'static) -> &mut Self {
        let name = backend.name().to_string();
        if let Some(position) = self.backends.iter().position(|b| b.name() == name) {
            tracing::warn!("Replacing previously registered backend '{}'", name);
            self.backends.remove(position);
        }
        self.backends.push(Arc::new(backend));
        self
    }

    /// Find a backend by name
    pub fn get(&self, name: &str) -> std::result::Result<Arc<dyn Backend>, SchemaError> {
        self.backends
            .iter()
            .find(|b| b.name() == name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownBackend {
                name: name.to_string(),
                suggestion: self.suggest(name).map(str::to_string),
            })
    }

    /// Registered names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Closest registered name, if within 2 edits
    #[must_use]
    pub fn suggest(&self, name: &str) -> Option<&str> {
        if name.is_empty() {
            return None;
        }

        self.backends
            .iter()
            .map(|b| (b.name(), levenshtein_distance(name, b.name())))
            .min_by_key(|(_, dist)| *dist)
            .filter(|(_, dist)| *dist <= 2)
            .map(|(backend_name, _)| backend_name)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

/// Edit distance between two names, one row of the table at a time
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }

    row[b.len()]
}
