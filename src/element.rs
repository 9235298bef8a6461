//! Leaf configuration elements
//!
//! A [`ConfigElement`] is declared through an [`ElementBuilder`] and receives its
//! name when it is attached to a [`Section`](crate::Section). Every value that
//! reaches an element, whatever layer it comes from, passes through
//! [`ConfigElement::validate`].

use crate::error::{ConfigError, Result, SchemaError};
use crate::value::{Value, ValueType};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fmt;
use std::sync::Arc;

/// Custom validation callback; the error string becomes the `InvalidData` reason
pub type Validator = Arc<dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync>;

/// A named, typed configuration leaf
#[derive(Clone)]
pub struct ConfigElement {
    pub(crate) name: Option<String>,
    doc: Option<String>,
    value_type: ValueType,
    default: Option<Value>,
    required: bool,
    short_name: Option<String>,
    long_name: Option<String>,
    validator: Option<Validator>,
    additive: bool,
    pub(crate) value: Option<Value>,
}

/// Builder for [`ConfigElement`]
pub struct ElementBuilder {
    value_type: ValueType,
    doc: Option<String>,
    default: Option<Value>,
    required: bool,
    short_name: Option<String>,
    long_name: Option<String>,
    validator: Option<Validator>,
    additive: bool,
}

impl ConfigElement {
    /// Start declaring an element of the given type
    pub fn builder(value_type: ValueType) -> ElementBuilder {
        ElementBuilder {
            value_type,
            doc: None,
            default: None,
            required: true,
            short_name: None,
            long_name: None,
            validator: None,
            additive: false,
        }
    }

    pub fn string() -> ElementBuilder {
        Self::builder(ValueType::String)
    }

    pub fn integer() -> ElementBuilder {
        Self::builder(ValueType::Integer)
    }

    pub fn float() -> ElementBuilder {
        Self::builder(ValueType::Float)
    }

    pub fn boolean() -> ElementBuilder {
        Self::builder(ValueType::Boolean)
    }

    /// Start declaring a list option holding items of `item` type
    pub fn list(item: ValueType) -> ElementBuilder {
        Self::builder(ValueType::list(item))
    }

    /// Name assigned when the element was attached to a section
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    #[must_use]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether list values from successive layers are unioned instead of replaced
    pub fn is_additive(&self) -> bool {
        self.additive
    }

    /// Normalized short alias, e.g. `-f`
    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    /// Normalized long alias, e.g. `--force`
    pub fn long_name(&self) -> Option<&str> {
        self.long_name.as_deref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Current value, absent until a layer supplies one
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Validate and store a value
    ///
    /// For additive lists with an existing value the incoming items are
    /// appended when not already present. On error the stored value is kept.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.validate(Some(&value))?;

        let value = match (&self.value, value) {
            (Some(Value::List(current)), Value::List(incoming)) if self.additive => {
                let merged = Value::List(union(current, incoming));
                self.validate(Some(&merged))?;
                merged
            }
            (_, value) => value,
        };

        self.value = Some(value);
        Ok(())
    }

    /// Type-check `value` and run the custom validator
    ///
    /// An absent value always passes: absence is a completeness concern.
    pub fn validate(&self, value: Option<&Value>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };

        if !self.value_type.matches(value) {
            return Err(ConfigError::invalid(
                self.label(),
                format!("expected {}, got {} `{value}`", self.value_type, value.kind()),
            ));
        }

        if let Some(validator) = &self.validator {
            validator(value).map_err(|reason| ConfigError::invalid(self.label(), reason))?;
        }

        Ok(())
    }

    /// Check that a required element has a value, and that any value is valid
    pub fn validate_completeness(&self) -> Result<()> {
        match &self.value {
            None if self.required => Err(ConfigError::MissingData {
                element: self.label(),
            }),
            None => Ok(()),
            Some(value) => self.validate(Some(value)),
        }
    }

    /// Whether an empty raw value read from a file leaves this element untouched
    ///
    /// Applies to scalars that are optional or have no default. A required
    /// scalar with a default treats the empty string as a real value.
    pub fn ignores_empty_input(&self) -> bool {
        self.value_type.is_scalar() && (!self.required || self.default.is_none())
    }

    /// Command-line flag name, without leading dashes
    #[must_use]
    pub fn flag_name(&self) -> String {
        self.long_name
            .as_deref()
            .map(|long| long.trim_start_matches('-'))
            .or(self.name.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    pub fn short_flag(&self) -> Option<char> {
        self.short_name
            .as_deref()
            .and_then(|short| short.trim_start_matches('-').chars().next())
    }

    /// Add this element's flag to `command`
    ///
    /// The flag carries no default value, so an unsupplied flag is reported
    /// as not present rather than as the element's default.
    pub fn register_cli(&self, command: Command) -> Command {
        let flag = self.flag_name();
        let mut arg = Arg::new(flag.clone())
            .long(flag.clone())
            .value_name(flag.to_uppercase())
            .required(false)
            .action(if self.value_type.is_scalar() {
                ArgAction::Set
            } else {
                ArgAction::Append
            });

        if let Some(short) = self.short_flag() {
            arg = arg.short(short);
        }
        let scalar = self.value_type.item_type().unwrap_or(&self.value_type);
        if matches!(scalar, ValueType::Integer | ValueType::Float) {
            arg = arg.allow_negative_numbers(true);
        }
        if let Some(doc) = &self.doc {
            arg = arg.help(doc.clone());
        }

        command.arg(arg)
    }

    /// Overlay the value supplied on the command line, if any
    pub fn extract_from_cli(&mut self, matches: &ArgMatches) -> Result<()> {
        let flag = self.flag_name();
        let value_type = self.value_type.clone();

        let value = match value_type.item_type() {
            Some(item) => {
                let Some(raw) = matches.get_many::<String>(&flag) else {
                    return Ok(());
                };
                let items = raw
                    .map(|raw| item.parse_scalar(raw))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|reason| ConfigError::invalid(self.label(), reason))?;
                Value::List(items)
            }
            None => {
                let Some(raw) = matches.get_one::<String>(&flag) else {
                    return Ok(());
                };
                value_type
                    .parse_scalar(raw)
                    .map_err(|reason| ConfigError::invalid(self.label(), reason))?
            }
        };

        tracing::debug!("--{} supplied on the command line: {}", flag, value);
        self.set_value(value)
    }

    pub(crate) fn reset_to_default(&mut self) {
        self.value = self.default.clone();
    }

    pub(crate) fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.long_name.clone())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

impl fmt::Debug for ConfigElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigElement")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("additive", &self.additive)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl ElementBuilder {
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Short alias; `f` and `-f` are equivalent
    pub fn short(mut self, name: impl Into<String>) -> Self {
        self.short_name = Some(name.into());
        self
    }

    /// Long alias; `force` and `--force` are equivalent
    pub fn long(mut self, name: impl Into<String>) -> Self {
        self.long_name = Some(name.into());
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Union list values across layers instead of replacing them. No effect on scalars.
    pub fn additive(mut self, additive: bool) -> Self {
        self.additive = additive;
        self
    }

    /// Finish the declaration
    ///
    /// Fails with `InvalidData` when the default does not pass validation, and
    /// with a schema error when an alias is malformed.
    pub fn build(self) -> Result<ConfigElement> {
        let short_name = self.short_name.map(normalize_short).transpose()?;
        let long_name = self.long_name.map(normalize_long).transpose()?;

        let element = ConfigElement {
            name: None,
            doc: self.doc,
            value_type: self.value_type,
            default: self.default,
            required: self.required,
            short_name,
            long_name,
            validator: self.validator,
            additive: self.additive,
            value: None,
        };

        element.validate(element.default.as_ref())?;
        Ok(element)
    }
}

fn normalize_short(name: String) -> std::result::Result<String, SchemaError> {
    let bare = name.strip_prefix('-').unwrap_or(&name);
    let mut chars = bare.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Ok(format!("-{c}")),
        _ => Err(SchemaError::InvalidShortFlag(name)),
    }
}

fn normalize_long(name: String) -> std::result::Result<String, SchemaError> {
    let bare = name.strip_prefix("--").unwrap_or(&name);
    if crate::section::is_valid_name(bare) {
        Ok(format!("--{bare}"))
    } else {
        Err(SchemaError::InvalidName(name))
    }
}

/// Stable union: `current` followed by the items of `incoming` not seen yet
fn union(current: &[Value], incoming: Vec<Value>) -> Vec<Value> {
    let mut merged = current.to_vec();
    for item in incoming {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}
