//! Ordered composites of configuration elements
//!
//! A [`Section`] keeps its children in declaration order. Optional sections
//! absorb missing required children into [`Section::incomplete_count`] instead of
//! failing the whole configuration.

use crate::element::ConfigElement;
use crate::error::{ConfigError, Result, SchemaError};
use crate::value::{Value, ValueMap};
use clap::{ArgMatches, Command};

/// A child of a section
#[derive(Debug, Clone)]
pub enum Node {
    Element(ConfigElement),
    Section(Section),
}

/// An ordered, named group of elements and nested sections
#[derive(Debug, Clone)]
pub struct Section {
    doc: Option<String>,
    required: bool,
    children: Vec<(String, Node)>,
    incomplete_count: usize,
}

/// Builder for [`Section`]
#[derive(Debug)]
pub struct SectionBuilder {
    doc: Option<String>,
    required: bool,
    children: Vec<(String, Node)>,
    error: Option<SchemaError>,
}

/// Names usable for elements, sections and long flags
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl Node {
    /// Resolved value of this child
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        match self {
            Self::Element(element) => element.value().cloned(),
            Self::Section(section) => Some(section.value()),
        }
    }

    pub fn as_element(&self) -> Option<&ConfigElement> {
        match self {
            Self::Element(element) => Some(element),
            Self::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Self::Section(section) => Some(section),
            Self::Element(_) => None,
        }
    }

    fn register_cli(&self, command: Command) -> Command {
        match self {
            Self::Element(element) => element.register_cli(command),
            Self::Section(section) => section.register_cli(command),
        }
    }

    fn extract_from_cli(&mut self, matches: &ArgMatches) -> Result<()> {
        match self {
            Self::Element(element) => element.extract_from_cli(matches),
            Self::Section(section) => section.extract_from_cli(matches),
        }
    }

    fn validate_completeness(&mut self) -> Result<()> {
        match self {
            Self::Element(element) => element.validate_completeness(),
            Self::Section(section) => section.validate_completeness(),
        }
    }
}

impl Section {
    pub fn builder() -> SectionBuilder {
        SectionBuilder {
            doc: None,
            required: true,
            children: Vec::new(),
            error: None,
        }
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of missing required children found by the last completeness check
    #[must_use]
    pub fn incomplete_count(&self) -> usize {
        self.incomplete_count
    }

    /// Children in declaration order
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Leaf children in declaration order
    pub fn elements(&self) -> impl Iterator<Item = (&str, &ConfigElement)> {
        self.children()
            .filter_map(|(name, node)| node.as_element().map(|element| (name, element)))
    }

    /// Nested sections in declaration order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.children()
            .filter_map(|(name, node)| node.as_section().map(|section| (name, section)))
    }

    pub(crate) fn children_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.children.iter_mut().map(|(name, node)| (name.as_str(), node))
    }

    pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = (&str, &mut ConfigElement)> {
        self.children.iter_mut().filter_map(|(name, node)| match node {
            Node::Element(element) => Some((name.as_str(), element)),
            Node::Section(_) => None,
        })
    }

    pub(crate) fn sections_mut(&mut self) -> impl Iterator<Item = (&str, &mut Section)> {
        self.children.iter_mut().filter_map(|(name, node)| match node {
            Node::Section(section) => Some((name.as_str(), section)),
            Node::Element(_) => None,
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|(child, _)| child == name)
            .map(|(_, node)| node)
    }

    pub fn element(&self, name: &str) -> Option<&ConfigElement> {
        self.get(name).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, name: &str) -> Option<&mut ConfigElement> {
        match self.get_mut(name) {
            Some(Node::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn section(&self, name: &str) -> Option<&Self> {
        self.get(name).and_then(Node::as_section)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Self> {
        match self.get_mut(name) {
            Some(Node::Section(section)) => Some(section),
            _ => None,
        }
    }

    /// Ordered mapping of child names to their resolved values
    #[must_use]
    pub fn value(&self) -> Value {
        let map: ValueMap = self
            .children
            .iter()
            .map(|(name, node)| (name.clone(), node.value()))
            .collect();
        Value::Map(map)
    }

    /// Add every descendant element's flag to `command`
    pub fn register_cli(&self, command: Command) -> Command {
        self.children
            .iter()
            .fold(command, |command, (_, node)| node.register_cli(command))
    }

    /// Overlay command-line values onto every descendant element
    pub fn extract_from_cli(&mut self, matches: &ArgMatches) -> Result<()> {
        for (_, node) in &mut self.children {
            node.extract_from_cli(matches)?;
        }
        Ok(())
    }

    /// Check every child for missing or invalid values
    ///
    /// A required section propagates the first `MissingData`. An optional
    /// section counts it in `incomplete_count` and carries on. Invalid data
    /// always propagates.
    pub fn validate_completeness(&mut self) -> Result<()> {
        self.incomplete_count = 0;
        for (name, node) in &mut self.children {
            match node.validate_completeness() {
                Ok(()) => {}
                Err(ConfigError::MissingData { element }) => {
                    let element = match node {
                        Node::Section(_) => qualify(name, &element),
                        Node::Element(_) => element,
                    };
                    if self.required {
                        return Err(ConfigError::MissingData { element });
                    }
                    tracing::debug!("optional section missing '{}'", element);
                    self.incomplete_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Set every descendant element back to its default (or absent)
    pub(crate) fn reset_to_defaults(&mut self) {
        for (_, node) in &mut self.children {
            match node {
                Node::Element(element) => element.reset_to_default(),
                Node::Section(section) => section.reset_to_defaults(),
            }
        }
    }

    /// Visit every element with its dotted path
    pub(crate) fn walk_elements<'a>(&'a self, prefix: &str, visit: &mut dyn FnMut(String, &'a ConfigElement)) {
        for (name, node) in &self.children {
            let path = qualify(prefix, name);
            match node {
                Node::Element(element) => visit(path, element),
                Node::Section(section) => section.walk_elements(&path, visit),
            }
        }
    }
}

/// Join a parent name and a child path with a dot
fn qualify(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

impl SectionBuilder {
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Attach a leaf element under `name`
    pub fn element(self, name: impl Into<String>, mut element: ConfigElement) -> Self {
        let name = name.into();
        element.name = Some(name.clone());
        self.attach(name, Node::Element(element))
    }

    /// Attach a nested section under `name`
    pub fn section(self, name: impl Into<String>, section: Section) -> Self {
        self.attach(name.into(), Node::Section(section))
    }

    /// Finish the declaration, reporting the first naming problem
    pub fn build(self) -> Result<Section> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        Ok(Section {
            doc: self.doc,
            required: self.required,
            children: self.children,
            incomplete_count: 0,
        })
    }

    fn attach(mut self, name: String, node: Node) -> Self {
        if self.error.is_some() {
            return self;
        }
        if !is_valid_name(&name) {
            self.error = Some(SchemaError::InvalidName(name));
        } else if self.children.iter().any(|(existing, _)| *existing == name) {
            self.error = Some(SchemaError::DuplicateName(name));
        } else {
            self.children.push((name, node));
        }
        self
    }
}
