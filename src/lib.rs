//! Typed, layered application configuration
//!
//! Declare a schema of [`Section`]s and [`ConfigElement`]s once, then resolve
//! it from defaults, a global file, a user file and the command line.

pub mod backend;
pub mod config;
pub mod element;
pub mod error;
mod list;
pub mod paths;
pub mod section;
pub mod template;
pub mod value;

pub use backend::{Backend, BackendRegistry, IniBackend, TomlBackend};
pub use config::{Config, ConfigBuilder, ConfigSchema, ConfigSource, Layer, LoadOutcome};
pub use element::{ConfigElement, ElementBuilder};
pub use error::{ConfigError, Result, SchemaError};
pub use paths::{AppInfo, FixedPaths, PathResolver, SystemPaths};
pub use section::{Node, Section, SectionBuilder};
pub use value::{Value, ValueMap, ValueType};
