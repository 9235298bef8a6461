use super::{Config, ConfigSource, Layer};
use crate::backend::{Backend, BackendRegistry};
use crate::element::ConfigElement;
use crate::error::{ConfigError, Result, SchemaError};
use crate::paths::{AppInfo, PathResolver, SystemPaths};
use crate::section::{Section, SectionBuilder};
use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

const GENERATE_CONFIG: &str = "generate-config";
const RESERVED_LONG: [&str; 2] = ["help", GENERATE_CONFIG];
const RESERVED_SHORT: [char; 1] = ['h'];

/// Builder for [`ConfigSchema`]
pub struct ConfigBuilder {
    application: Option<String>,
    author: Option<String>,
    version: Option<String>,
    doc: Option<String>,
    file_type: String,
    file_name: String,
    registry: BackendRegistry,
    paths: Arc<dyn PathResolver>,
    cli: bool,
    root: SectionBuilder,
}

/// A validated schema bound to an application identity and a backend
///
/// The schema is reusable: every load starts again from the declared
/// defaults.
#[derive(Clone)]
pub struct ConfigSchema {
    app: AppInfo,
    doc: Option<String>,
    file_name: String,
    backend: Arc<dyn Backend>,
    paths: Arc<dyn PathResolver>,
    cli: bool,
    root: Section,
}

/// Result of running the resolution pipeline
#[derive(Debug)]
pub enum LoadOutcome {
    /// All layers applied and the tree is complete
    Loaded(Config),
    /// `--generate-config` was passed; the rendered template
    Template(String),
}

impl ConfigBuilder {
    pub(super) fn new() -> Self {
        Self {
            application: None,
            author: None,
            version: None,
            doc: None,
            file_type: "ini".to_string(),
            file_name: "config".to_string(),
            registry: BackendRegistry::builtin(),
            paths: Arc::new(SystemPaths),
            cli: true,
            root: Section::builder(),
        }
    }

    pub fn application(mut self, name: impl Into<String>) -> Self {
        self.application = Some(name.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Description used for the template header and `--help`
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Backend name looked up in the registry (default `ini`)
    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    /// File name without extension (default `config`)
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn paths(mut self, paths: impl PathResolver + 'static) -> Self {
        self.paths = Arc::new(paths);
        self
    }

    /// Enable or disable the command-line layer (enabled by default)
    pub fn cli(mut self, enabled: bool) -> Self {
        self.cli = enabled;
        self
    }

    pub fn section(mut self, name: impl Into<String>, section: Section) -> Self {
        self.root = self.root.section(name, section);
        self
    }

    /// Attach a root-level element; not every backend accepts these
    pub fn element(mut self, name: impl Into<String>, element: ConfigElement) -> Self {
        self.root = self.root.element(name, element);
        self
    }

    /// Check the declaration and bind the backend
    pub fn build(self) -> Result<ConfigSchema> {
        let name = self
            .application
            .filter(|name| !name.is_empty())
            .ok_or(SchemaError::MissingApplication)?;
        let author = self
            .author
            .filter(|author| !author.is_empty())
            .ok_or(SchemaError::MissingAuthor)?;

        let root = self.root.build()?;
        if self.cli {
            check_flags(&root)?;
        }
        let backend = self.registry.get(&self.file_type)?;

        Ok(ConfigSchema {
            app: AppInfo {
                name,
                author,
                version: self.version,
            },
            doc: self.doc,
            file_name: self.file_name,
            backend,
            paths: self.paths,
            cli: self.cli,
            root,
        })
    }
}

/// Reject reserved and clashing command-line flags
fn check_flags(root: &Section) -> std::result::Result<(), SchemaError> {
    let mut longs: HashMap<String, String> = HashMap::new();
    let mut shorts: HashMap<char, String> = HashMap::new();
    let mut result = Ok(());

    root.walk_elements("", &mut |path, element| {
        if result.is_err() {
            return;
        }
        result = check_element_flags(&mut longs, &mut shorts, path, element);
    });

    result
}

fn check_element_flags(
    longs: &mut HashMap<String, String>,
    shorts: &mut HashMap<char, String>,
    path: String,
    element: &ConfigElement,
) -> std::result::Result<(), SchemaError> {
    let long = element.flag_name();
    if RESERVED_LONG.contains(&long.as_str()) {
        return Err(SchemaError::ReservedFlag(format!("--{long}")));
    }
    if let Some(first) = longs.get(&long) {
        return Err(SchemaError::DuplicateFlag {
            flag: format!("--{long}"),
            first: first.clone(),
            second: path,
        });
    }

    if let Some(short) = element.short_flag() {
        if RESERVED_SHORT.contains(&short) {
            return Err(SchemaError::ReservedFlag(format!("-{short}")));
        }
        if let Some(first) = shorts.get(&short) {
            return Err(SchemaError::DuplicateFlag {
                flag: format!("-{short}"),
                first: first.clone(),
                second: path,
            });
        }
        shorts.insert(short, path.clone());
    }

    longs.insert(long, path);
    Ok(())
}

impl ConfigSchema {
    pub fn app(&self) -> &AppInfo {
        &self.app
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Declared tree, with no layer applied
    pub fn root(&self) -> &Section {
        &self.root
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// `<global dir>/<file_name>.<extension>`
    #[must_use]
    pub fn global_path(&self) -> Option<PathBuf> {
        self.paths
            .global_dir(&self.app)
            .map(|dir| dir.join(self.file_with_extension()))
    }

    /// `<user dir>/<file_name>.<extension>`
    #[must_use]
    pub fn user_path(&self) -> Option<PathBuf> {
        self.paths
            .user_dir(&self.app)
            .map(|dir| dir.join(self.file_with_extension()))
    }

    fn file_with_extension(&self) -> String {
        format!("{}.{}", self.file_name, self.backend.extension())
    }

    /// Command-line surface: one flag per element plus `--generate-config`
    #[must_use]
    pub fn command(&self) -> Command {
        let doc = self.doc.clone().unwrap_or_default();
        let long_about = format!(
            "{doc}\n\nCommand line arguments overwrite configuration found in:\n{}\n{}",
            display_path(self.user_path()),
            display_path(self.global_path()),
        );

        let command = Command::new(self.app.name.clone())
            .about(doc)
            .long_about(long_about)
            .arg(
                Arg::new(GENERATE_CONFIG)
                    .long(GENERATE_CONFIG)
                    .action(ArgAction::SetTrue)
                    .help("Print a documented configuration template and exit"),
            );

        self.root.register_cli(command)
    }

    /// Run the resolution pipeline against `args` (program name first)
    ///
    /// Layers are applied in order: defaults, global file, user file,
    /// command line. Nothing is returned unless every layer succeeded and the
    /// tree is complete, except for `--generate-config`, which skips the
    /// completeness check and returns the template instead.
    pub fn load_from<I, T>(&self, args: I) -> Result<LoadOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.backend.validate(&self.root)?;

        let mut root = self.root.clone();
        root.reset_to_defaults();
        let mut sources = vec![ConfigSource {
            layer: Layer::Defaults,
            path: None,
        }];

        let global_path = self.global_path();
        let user_path = self.user_path();
        for (layer, path) in [(Layer::Global, &global_path), (Layer::User, &user_path)] {
            let Some(path) = path else {
                tracing::debug!("No {} configuration directory", layer);
                continue;
            };
            if !path.is_file() {
                tracing::debug!("No {} configuration at {}", layer, path.display());
                continue;
            }

            tracing::info!("Reading {} configuration from {}", layer, path.display());
            self.backend.read(path, &mut root)?;
            sources.push(ConfigSource {
                layer,
                path: Some(path.clone()),
            });
        }

        let mut generate = false;
        if self.cli {
            let matches = self.command().try_get_matches_from(args)?;
            root.extract_from_cli(&matches)?;
            generate = matches.get_flag(GENERATE_CONFIG);

            if supplied_any_element(&matches) {
                sources.push(ConfigSource {
                    layer: Layer::CommandLine,
                    path: None,
                });
            }
        }

        if generate {
            tracing::info!("Generating {} configuration template", self.backend.name());
            return Ok(LoadOutcome::Template(
                self.backend.write(&root, self.doc.as_deref()),
            ));
        }

        root.validate_completeness()?;
        for (name, section) in root.sections() {
            if section.incomplete_count() > 0 {
                tracing::info!(
                    "Optional section '{}' is incomplete ({} missing)",
                    name,
                    section.incomplete_count()
                );
            }
        }

        Ok(LoadOutcome::Loaded(Config {
            app: self.app.clone(),
            root,
            sources,
            global_path,
            user_path,
        }))
    }

    /// Load using the process arguments
    ///
    /// `--help` prints usage and `--generate-config` prints the template;
    /// both exit the process successfully.
    pub fn load(&self) -> Result<Config> {
        match self.load_from(std::env::args_os()) {
            Ok(LoadOutcome::Loaded(config)) => Ok(config),
            Ok(LoadOutcome::Template(template)) => {
                print!("{template}");
                std::process::exit(0);
            }
            Err(ConfigError::Cli(err))
                if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
            {
                err.exit()
            }
            Err(err) => Err(err),
        }
    }
}

impl fmt::Debug for ConfigSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSchema")
            .field("app", &self.app)
            .field("file_name", &self.file_name)
            .field("backend", &self.backend.name())
            .field("paths", &self.paths)
            .field("cli", &self.cli)
            .field("root", &self.root)
            .finish()
    }
}

fn supplied_any_element(matches: &ArgMatches) -> bool {
    matches.ids().any(|id| {
        id.as_str() != GENERATE_CONFIG
            && matches.value_source(id.as_str()) == Some(ValueSource::CommandLine)
    })
}

fn display_path(path: Option<PathBuf>) -> String {
    path.map_or_else(|| "<none>".to_string(), |path| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::FixedPaths;

    fn builder() -> ConfigBuilder {
        Config::builder()
            .application("demo")
            .author("acme")
            .paths(FixedPaths::default())
    }

    fn general(element: ConfigElement) -> Section {
        Section::builder().element("name", element).build().unwrap()
    }

    #[test]
    fn test_identity_is_required() {
        let err = Config::builder().author("acme").build().unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::MissingApplication)));

        let err = Config::builder().application("demo").build().unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::MissingAuthor)));

        let err = Config::builder().application("").author("acme").build().unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::MissingApplication)));
    }

    #[test]
    fn test_unknown_file_type() {
        let err = builder().file_type("tmol").build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Schema(SchemaError::UnknownBackend { ref suggestion, .. })
                if suggestion.as_deref() == Some("toml")
        ));
    }

    #[test]
    fn test_reserved_flags() {
        let err = builder()
            .section("s", general(ConfigElement::string().long("help").build().unwrap()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::ReservedFlag(ref f)) if f == "--help"));

        let err = builder()
            .section("s", general(ConfigElement::string().short("h").build().unwrap()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::ReservedFlag(ref f)) if f == "-h"));
    }

    #[test]
    fn test_duplicate_flags_across_sections() {
        let err = builder()
            .section("a", general(ConfigElement::string().build().unwrap()))
            .section("b", general(ConfigElement::string().build().unwrap()))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema error: flag '--name' is used by both 'a.name' and 'b.name'"
        );

        builder()
            .section("a", general(ConfigElement::string().build().unwrap()))
            .section("b", general(ConfigElement::string().long("b-name").build().unwrap()))
            .build()
            .unwrap();

        // without a command line there is nothing to clash
        builder()
            .cli(false)
            .section("a", general(ConfigElement::string().build().unwrap()))
            .section("b", general(ConfigElement::string().build().unwrap()))
            .build()
            .unwrap();
    }

    #[test]
    fn test_paths_use_backend_extension() {
        let schema = builder()
            .paths(FixedPaths::new("/etc/demo", "/home/me/.config/demo"))
            .build()
            .unwrap();
        assert_eq!(schema.global_path(), Some(PathBuf::from("/etc/demo/config.cfg")));
        assert_eq!(
            schema.user_path(),
            Some(PathBuf::from("/home/me/.config/demo/config.cfg"))
        );

        let schema = builder()
            .file_type("toml")
            .file_name("settings")
            .paths(FixedPaths::new("/g", "/u"))
            .build()
            .unwrap();
        assert_eq!(schema.user_path(), Some(PathBuf::from("/u/settings.toml")));
        assert_eq!(schema.backend_name(), "toml");
    }

    #[test]
    fn test_help_lists_file_locations() {
        let schema = builder()
            .doc("Demo application")
            .paths(FixedPaths::new("/g", "/u"))
            .section(
                "general",
                general(ConfigElement::string().doc("Your name").build().unwrap()),
            )
            .build()
            .unwrap();
        let mut command = schema.command();
        let help = command.render_long_help().to_string();
        assert!(help.contains("Demo application"));
        assert!(help.contains("Command line arguments overwrite configuration found in:"));
        assert!(help.contains("/u/config.cfg"));
        assert!(help.contains("/g/config.cfg"));
        assert!(help.contains("--name"));
        assert!(help.contains("Your name"));
        assert!(help.contains("--generate-config"));
    }

    #[test]
    fn test_help_is_reported_as_cli_error() {
        let schema = builder().build().unwrap();
        let err = schema.load_from(["demo", "--help"]).unwrap_err();
        assert!(matches!(err, ConfigError::Cli(ref e) if e.kind() == ErrorKind::DisplayHelp));
    }

    #[test]
    fn test_unknown_argument() {
        let schema = builder().build().unwrap();
        let err = schema.load_from(["demo", "--bogus", "1"]).unwrap_err();
        assert!(matches!(err, ConfigError::Cli(ref e) if e.kind() == ErrorKind::UnknownArgument));
    }
}
