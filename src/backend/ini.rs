//! INI-style backend (`.cfg` files)
//!
//! ```text
//! [general]
//! ## Display name
//! name = Ada
//! tags = - one
//!     - two
//! ```
//!
//! Only one level of sections is supported and every root child must be a
//! section. Keys are matched case-insensitively.

use super::Backend;
use crate::element::ConfigElement;
use crate::error::{ConfigError, Result};
use crate::section::{Node, Section};
use crate::template::{self, TemplateStyle};
use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Line-oriented INI backend
#[derive(Debug, Clone, Copy, Default)]
pub struct IniBackend;

impl Backend for IniBackend {
    fn name(&self) -> &str {
        "ini"
    }

    fn extension(&self) -> &str {
        "cfg"
    }

    fn validate(&self, tree: &Section) -> Result<()> {
        for (name, node) in tree.children() {
            let section = match node {
                Node::Section(section) => section,
                Node::Element(_) => {
                    return Err(invalid_tree(format!(
                        "root element '{name}' must be a section for ini files"
                    )))
                }
            };

            if let Some((nested, _)) = section.sections().next() {
                return Err(invalid_tree(format!(
                    "nested section '{name}.{nested}' is not supported for ini files"
                )));
            }

            for (key, element) in section.elements() {
                if !is_supported(element.value_type()) {
                    return Err(invalid_tree(format!(
                        "unsupported data type {} for '{name}.{key}'",
                        element.value_type()
                    )));
                }
            }
        }
        Ok(())
    }

    fn read(&self, path: &Path, tree: &mut Section) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let document = IniDocument::parse(path, &text)?;

        for (section_name, section) in tree.sections_mut() {
            let Some(entries) = document.section(section_name) else {
                tracing::debug!("[{}] not present in {}", section_name, path.display());
                continue;
            };

            for (key, element) in section.elements_mut() {
                if let Some(raw) = entries.get(&key.to_lowercase()) {
                    read_value(element, raw)?;
                }
            }
        }

        Ok(())
    }

    fn write(&self, tree: &Section, doc: Option<&str>) -> String {
        template::render(tree, doc, &IniStyle)
    }
}

fn invalid_tree(reason: String) -> ConfigError {
    ConfigError::InvalidConfigTree {
        backend: "ini".to_string(),
        reason,
    }
}

fn is_supported(value_type: &ValueType) -> bool {
    value_type.item_type().map_or(true, ValueType::is_scalar)
}

/// Convert one raw entry and hand it to the element
fn read_value(element: &mut ConfigElement, raw: &str) -> Result<()> {
    let value = match element.value_type() {
        ValueType::List(item) => {
            let items = parse_list(raw)
                .and_then(|items| {
                    items
                        .into_iter()
                        .map(|entry| item.parse_scalar(&entry))
                        .collect::<std::result::Result<Vec<_>, _>>()
                })
                .map_err(|reason| ConfigError::invalid(element.label(), reason))?;
            Value::List(items)
        }
        _ if raw.is_empty() && element.ignores_empty_input() => return Ok(()),
        scalar => scalar
            .parse_scalar(raw)
            .map_err(|reason| ConfigError::invalid(element.label(), reason))?,
    };

    element.set_value(value)
}

/// Split a raw list value into its `- item` entries
///
/// The first entry may share the `key =` line; an empty value is an empty list.
/// Lines without the `- ` marker continue the previous item.
fn parse_list(raw: &str) -> std::result::Result<Vec<String>, String> {
    let mut items: Vec<String> = Vec::new();
    if raw.is_empty() {
        return Ok(items);
    }

    for line in raw.split('\n') {
        let line = line.trim_start();
        match line.strip_prefix("- ").or_else(|| (line == "-").then_some("")) {
            Some(item) => items.push(item.to_string()),
            None => {
                let last = items.last_mut().ok_or_else(|| {
                    format!("{raw:?} is not a valid ini list: items must start with '- '")
                })?;
                last.push('\n');
                last.push_str(line);
            }
        }
    }

    Ok(items)
}

struct IniStyle;

impl TemplateStyle for IniStyle {
    fn value_lines(&self, value: &Value) -> Vec<String> {
        match value {
            Value::List(items) => items
                .iter()
                .flat_map(|item| {
                    let text = item.to_string();
                    let mut lines = text.split('\n').map(str::to_string).collect::<Vec<_>>();
                    if let Some(first) = lines.first_mut() {
                        *first = format!("- {first}");
                    }
                    lines
                })
                .collect(),
            other => other.to_string().split('\n').map(str::to_string).collect(),
        }
    }
}

/// Parsed INI file: section → lowercased key → raw value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl IniDocument {
    /// Parse INI text; `path` is only used for error messages
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut document = Self::default();
        let mut current_section: Option<String> = None;
        let mut current_key: Option<String> = None;
        // Blank lines seen since the last line of the open value
        let mut blank_lines = 0;

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let error = |message: String| parse_error(path, line_number, message);
            let trimmed = line.trim();

            if trimmed.is_empty() {
                if current_key.is_some() {
                    blank_lines += 1;
                }
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indented = line.starts_with(|c: char| c.is_whitespace());
            if indented {
                if let (Some(section), Some(key)) = (&current_section, &current_key) {
                    if let Some(value) = document
                        .sections
                        .get_mut(section)
                        .and_then(|entries| entries.get_mut(key))
                    {
                        if !value.is_empty() {
                            value.push_str(&"\n".repeat(blank_lines + 1));
                        }
                        value.push_str(trimmed);
                    }
                    blank_lines = 0;
                    continue;
                }
            }
            blank_lines = 0;

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| error(format!("malformed section header {trimmed:?}")))?;
                if document.sections.contains_key(name) {
                    return Err(error(format!("duplicate section [{name}]")));
                }
                document.sections.insert(name.to_string(), IndexMap::new());
                current_section = Some(name.to_string());
                current_key = None;
                continue;
            }

            let delimiter = trimmed
                .find(['=', ':'])
                .ok_or_else(|| error(format!("expected 'key = value', got {trimmed:?}")))?;
            let key = trimmed[..delimiter].trim().to_lowercase();
            let value = trimmed[delimiter + 1..].trim().to_string();
            if key.is_empty() {
                return Err(error("missing key before delimiter".to_string()));
            }

            let Some(section) = &current_section else {
                return Err(error(format!("key '{key}' appears before any section header")));
            };
            let entries = document.sections.entry(section.clone()).or_default();
            if entries.contains_key(&key) {
                return Err(error(format!("duplicate key '{key}' in [{section}]")));
            }
            entries.insert(key.clone(), value);
            current_key = Some(key);
        }

        Ok(document)
    }

    /// Entries of `name`, if the section is present
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&IndexMap<String, String>> {
        self.sections.get(name)
    }

    /// Raw value of `key` in `section`; keys are case-insensitive
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)
            .and_then(|entries| entries.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    /// Section names in file order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

fn parse_error(path: &Path, line: usize, message: String) -> ConfigError {
    ConfigError::Parse {
        path: PathBuf::from(path),
        line,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<IniDocument> {
        IniDocument::parse(Path::new("test.cfg"), text)
    }

    #[test]
    fn test_parse_sections_and_delimiters() {
        let document = parse("[one]\nA = 1\nb: two\n; comment\n# another\n\n[two]\nc=\n").unwrap();
        assert_eq!(document.section_names().collect::<Vec<_>>(), vec!["one", "two"]);
        assert_eq!(document.get("one", "a"), Some("1"));
        assert_eq!(document.get("one", "A"), Some("1"));
        assert_eq!(document.get("one", "b"), Some("two"));
        assert_eq!(document.get("two", "c"), Some(""));
        assert_eq!(document.get("two", "missing"), None);
        assert_eq!(document.get("three", "a"), None);
    }

    #[test]
    fn test_parse_continuations() {
        let document = parse("[s]\ntext = some\n    lines of\n  text\nnext = 1\n").unwrap();
        assert_eq!(document.get("s", "text"), Some("some\nlines of\ntext"));
        assert_eq!(document.get("s", "next"), Some("1"));

        let document = parse("[s]\nlist =\n    - a\n    - b\n").unwrap();
        assert_eq!(document.get("s", "list"), Some("- a\n- b"));
    }

    #[test]
    fn test_blank_lines_inside_values() {
        let document = parse("[s]\nkey = a\n\n    \n    b\n\n\nnext = 1\n").unwrap();
        assert_eq!(document.get("s", "key"), Some("a\n\n\nb"));
        assert_eq!(document.get("s", "next"), Some("1"));

        // trailing blank lines are not part of the value
        let document = parse("[s]\nkey = a\n    \n\n[t]\n").unwrap();
        assert_eq!(document.get("s", "key"), Some("a"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse("key = 1\n").unwrap_err(),
            ConfigError::Parse { line: 1, .. }
        ));
        assert!(matches!(
            parse("[s]\nkey = 1\nKEY = 2\n").unwrap_err(),
            ConfigError::Parse { line: 3, .. }
        ));
        assert!(matches!(
            parse("[s]\n[s]\n").unwrap_err(),
            ConfigError::Parse { line: 2, .. }
        ));
        assert!(matches!(
            parse("[s\n").unwrap_err(),
            ConfigError::Parse { line: 1, .. }
        ));
        assert!(matches!(
            parse("[s]\nno delimiter\n").unwrap_err(),
            ConfigError::Parse { line: 2, .. }
        ));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("").unwrap(), Vec::<String>::new());
        assert_eq!(parse_list("- a\n- b c").unwrap(), vec!["a", "b c"]);
        assert_eq!(parse_list("-\n- x").unwrap(), vec!["", "x"]);
        assert_eq!(parse_list("- a\nb\n- c").unwrap(), vec!["a\nb", "c"]);
        assert!(parse_list("a\n- b").is_err());
    }

    #[test]
    fn test_validate_accepts_flat_sections() {
        let tree = Section::builder()
            .section("section_a", Section::builder().build().unwrap())
            .section(
                "section_b",
                Section::builder()
                    .element("element_b", ConfigElement::integer().build().unwrap())
                    .element("element_c", ConfigElement::boolean().build().unwrap())
                    .element("element_d", ConfigElement::float().build().unwrap())
                    .element("element_e", ConfigElement::list(ValueType::String).build().unwrap())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        IniBackend.validate(&tree).unwrap();
        IniBackend.validate(&Section::builder().build().unwrap()).unwrap();
    }

    #[test]
    fn test_validate_rejects_unsupported_trees() {
        let bare_leaf = Section::builder()
            .element("not_a_section", ConfigElement::string().build().unwrap())
            .build()
            .unwrap();
        assert!(matches!(
            IniBackend.validate(&bare_leaf),
            Err(ConfigError::InvalidConfigTree { .. })
        ));

        let nested = Section::builder()
            .section(
                "nested_section",
                Section::builder()
                    .section("another_section", Section::builder().build().unwrap())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        assert!(matches!(
            IniBackend.validate(&nested),
            Err(ConfigError::InvalidConfigTree { .. })
        ));

        let list_of_lists = Section::builder()
            .section(
                "section",
                Section::builder()
                    .element(
                        "matrix",
                        ConfigElement::list(ValueType::list(ValueType::Integer))
                            .build()
                            .unwrap(),
                    )
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let err = IniBackend.validate(&list_of_lists).unwrap_err();
        assert!(err.to_string().contains("list of list of integer"));
    }

    #[test]
    fn test_read_value_tolerances() {
        let mut optional = ConfigElement::integer().optional().build().unwrap();
        read_value(&mut optional, "").unwrap();
        assert_eq!(optional.value(), None);

        let mut with_default = ConfigElement::string().default("x").build().unwrap();
        read_value(&mut with_default, "").unwrap();
        assert_eq!(with_default.value(), Some(&Value::from("")));

        let mut int_with_default = ConfigElement::integer().default(3).build().unwrap();
        assert!(matches!(
            read_value(&mut int_with_default, ""),
            Err(ConfigError::InvalidData { .. })
        ));

        let mut list = ConfigElement::list(ValueType::Integer).build().unwrap();
        read_value(&mut list, "").unwrap();
        assert_eq!(list.value(), Some(&Value::List(Vec::new())));
        read_value(&mut list, "- 1\n- 2").unwrap();
        assert_eq!(list.value(), Some(&Value::from(vec![1, 2])));
        assert!(read_value(&mut list, "- 1\n- two").is_err());
        assert_eq!(list.value(), Some(&Value::from(vec![1, 2])));
    }

    #[test]
    fn test_write_data_types() {
        let mut section = Section::builder()
            .element("integer", ConfigElement::integer().default(7).optional().build().unwrap())
            .element("float", ConfigElement::float().default(2.0).optional().build().unwrap())
            .element("boolean", ConfigElement::boolean().default(true).optional().build().unwrap())
            .element(
                "list",
                ConfigElement::list(ValueType::String)
                    .default(vec!["a", "b"])
                    .optional()
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        section.reset_to_defaults();
        section.element_mut("integer").unwrap().set_value(8).unwrap();
        section.element_mut("float").unwrap().set_value(3.5).unwrap();
        section.element_mut("boolean").unwrap().set_value(false).unwrap();
        section.element_mut("list").unwrap().set_value(vec!["c"]).unwrap();

        let tree = Section::builder().section("section", section).build().unwrap();
        assert_eq!(
            IniBackend.write(&tree, None),
            [
                "[section]",
                "# integer = 7",
                "integer = 8",
                "",
                "# float = 2.0",
                "float = 3.5",
                "",
                "# boolean = true",
                "boolean = false",
                "",
                "# list = - a",
                "#     - b",
                "list = - c",
                "",
                "",
                "",
            ]
            .join("\n")
        );
    }
}
