//! TOML backend (`.toml` files)
//!
//! Root-level elements become top-level keys and sections become tables, to
//! any depth. Values keep their TOML types; an integer is accepted where a
//! float is declared.

use super::Backend;
use crate::element::ConfigElement;
use crate::error::{ConfigError, Result};
use crate::section::{Node, Section};
use crate::template::{self, TemplateStyle};
use crate::value::{Value, ValueType};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// TOML file backend
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlBackend;

impl Backend for TomlBackend {
    fn name(&self) -> &str {
        "toml"
    }

    fn extension(&self) -> &str {
        "toml"
    }

    /// Every tree shape is representable in TOML
    fn validate(&self, _tree: &Section) -> Result<()> {
        Ok(())
    }

    fn read(&self, path: &Path, tree: &mut Section) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let table = text.parse::<toml::Table>().map_err(|err| ConfigError::Parse {
            path: PathBuf::from(path),
            line: err
                .span()
                .map_or(0, |span| text[..span.start].matches('\n').count() + 1),
            message: err.message().to_string(),
        })?;

        overlay(&table, tree, "")
    }

    fn write(&self, tree: &Section, doc: Option<&str>) -> String {
        template::render(tree, doc, &TomlStyle)
    }
}

/// Apply the entries of `table` to the matching children of `section`
fn overlay(table: &toml::Table, section: &mut Section, prefix: &str) -> Result<()> {
    for (name, node) in section.children_mut() {
        let Some(raw) = table.get(name) else {
            continue;
        };
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        match node {
            Node::Element(element) => read_value(element, raw)?,
            Node::Section(nested) => {
                let toml::Value::Table(nested_table) = raw else {
                    return Err(ConfigError::invalid(
                        path,
                        format!("expected a table, got {}", raw.type_str()),
                    ));
                };
                overlay(nested_table, nested, &path)?;
            }
        }
    }
    Ok(())
}

fn read_value(element: &mut ConfigElement, raw: &toml::Value) -> Result<()> {
    if let toml::Value::String(s) = raw {
        if s.is_empty() && element.ignores_empty_input() {
            return Ok(());
        }
    }

    let value = convert(raw, element.value_type())
        .map_err(|reason| ConfigError::invalid(element.label(), reason))?;
    element.set_value(value)
}

fn convert(raw: &toml::Value, value_type: &ValueType) -> std::result::Result<Value, String> {
    match (value_type, raw) {
        (ValueType::String, toml::Value::String(s)) => Ok(Value::String(s.clone())),
        (ValueType::Integer, toml::Value::Integer(i)) => Ok(Value::Integer(*i)),
        (ValueType::Float, toml::Value::Float(f)) => Ok(Value::Float(*f)),
        #[allow(clippy::cast_precision_loss)]
        (ValueType::Float, toml::Value::Integer(i)) => Ok(Value::Float(*i as f64)),
        (ValueType::Boolean, toml::Value::Boolean(b)) => Ok(Value::Boolean(*b)),
        (ValueType::List(item), toml::Value::Array(items)) => items
            .iter()
            .map(|raw| convert(raw, item))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::List),
        (expected, raw) => Err(format!("expected {expected}, got {} `{raw}`", raw.type_str())),
    }
}

struct TomlStyle;

impl TemplateStyle for TomlStyle {
    fn value_lines(&self, value: &Value) -> Vec<String> {
        vec![literal(value)]
    }

    fn placeholder(&self) -> &'static str {
        "\"\""
    }
}

/// Single-line TOML literal for `value`
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) if f.is_nan() => "nan".to_string(),
        Value::Float(f) if f.is_infinite() => {
            (if f.is_sign_negative() { "-inf" } else { "inf" }).to_string()
        }
        Value::Float(f) => format!("{f:?}"),
        Value::Boolean(b) => b.to_string(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(map) => {
            let entries: Vec<String> = map
                .iter()
                .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key} = {}", literal(v))))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
    }
}

/// TOML basic string with escapes
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
