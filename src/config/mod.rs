//! Layered configuration for an application
//!
//! Values are resolved from four layers, later ones winning:
//! declared defaults, the global file, the user file and the command line.
//!
//! # Example
//!
//! ```no_run
//! use userconf::{Config, ConfigElement, Section};
//!
//! let schema = Config::builder()
//!     .application("demo")
//!     .author("acme")
//!     .section(
//!         "general",
//!         Section::builder()
//!             .element("name", ConfigElement::string().doc("Your name").build()?)
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let config = schema.load()?;
//! println!("Hello {}", config.get_str("general.name")?.unwrap_or("stranger"));
//! # Ok::<(), userconf::ConfigError>(())
//! ```

pub mod schema;

pub use schema::{ConfigBuilder, ConfigSchema, LoadOutcome};

use crate::element::ConfigElement;
use crate::error::{ConfigError, Result};
use crate::paths::AppInfo;
use crate::section::{Node, Section};
use crate::value::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// One of the resolution layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Defaults,
    Global,
    User,
    CommandLine,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::Global => write!(f, "global"),
            Self::User => write!(f, "user"),
            Self::CommandLine => write!(f, "command line"),
        }
    }
}

/// A layer that contributed to a loaded configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub layer: Layer,
    /// File read for this layer, if any
    pub path: Option<PathBuf>,
}

/// A fully resolved and validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    app: AppInfo,
    root: Section,
    sources: Vec<ConfigSource>,
    global_path: Option<PathBuf>,
    user_path: Option<PathBuf>,
}

impl Config {
    /// Start declaring a configuration schema
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn app(&self) -> &AppInfo {
        &self.app
    }

    pub fn root(&self) -> &Section {
        &self.root
    }

    /// Layers that supplied values, lowest precedence first
    #[must_use]
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// Location of the global file, whether or not it exists
    #[must_use]
    pub fn global_path(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Location of the user file, whether or not it exists
    #[must_use]
    pub fn user_path(&self) -> Option<&Path> {
        self.user_path.as_deref()
    }

    /// Whole tree as an ordered mapping
    #[must_use]
    pub fn value(&self) -> Value {
        self.root.value()
    }

    /// Value at a dotted path such as `general.name`
    ///
    /// Sections yield their mapping; elements yield `None` when unset.
    pub fn get(&self, path: &str) -> Result<Option<Value>> {
        find(&self.root, path)
            .map(Node::value)
            .ok_or_else(|| ConfigError::UnknownKey(path.to_string()))
    }

    /// Validate and store a value at a dotted path
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.element_mut(path)?.set_value(value)
    }

    pub fn element(&self, path: &str) -> Result<&ConfigElement> {
        find(&self.root, path)
            .and_then(Node::as_element)
            .ok_or_else(|| ConfigError::UnknownKey(path.to_string()))
    }

    /// Mutable element access, e.g. for list mutators
    pub fn element_mut(&mut self, path: &str) -> Result<&mut ConfigElement> {
        match find_mut(&mut self.root, path) {
            Some(Node::Element(element)) => Ok(element),
            _ => Err(ConfigError::UnknownKey(path.to_string())),
        }
    }

    /// Section at a dotted path; the empty path is the root
    pub fn section(&self, path: &str) -> Result<&Section> {
        if path.is_empty() {
            return Ok(&self.root);
        }
        find(&self.root, path)
            .and_then(Node::as_section)
            .ok_or_else(|| ConfigError::UnknownKey(path.to_string()))
    }

    pub fn get_str(&self, path: &str) -> Result<Option<&str>> {
        self.typed(path, "string", Value::as_str)
    }

    pub fn get_integer(&self, path: &str) -> Result<Option<i64>> {
        self.typed(path, "integer", Value::as_integer)
    }

    pub fn get_float(&self, path: &str) -> Result<Option<f64>> {
        self.typed(path, "float", Value::as_float)
    }

    pub fn get_bool(&self, path: &str) -> Result<Option<bool>> {
        self.typed(path, "boolean", Value::as_bool)
    }

    pub fn get_list(&self, path: &str) -> Result<Option<&[Value]>> {
        self.typed(path, "list", Value::as_list)
    }

    /// Resolved tree as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.value())
    }

    fn typed<'a, T>(
        &'a self,
        path: &str,
        expected: &str,
        convert: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        let Some(value) = self.element(path)?.value() else {
            return Ok(None);
        };
        convert(value).map(Some).ok_or_else(|| {
            ConfigError::invalid(path, format!("expected {expected}, found {}", value.kind()))
        })
    }
}

fn find<'a>(section: &'a Section, path: &str) -> Option<&'a Node> {
    match path.split_once('.') {
        None => section.get(path),
        Some((head, rest)) => section.section(head).and_then(|nested| find(nested, rest)),
    }
}

fn find_mut<'a>(section: &'a mut Section, path: &str) -> Option<&'a mut Node> {
    match path.split_once('.') {
        None => section.get_mut(path),
        Some((head, rest)) => section
            .section_mut(head)
            .and_then(|nested| find_mut(nested, rest)),
    }
}
