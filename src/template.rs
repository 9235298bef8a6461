//! Annotated configuration templates
//!
//! Renders the schema and current values as a documented file: docs as `##`
//! lines, defaults as commented `# key = value` lines, and active
//! `key = value` lines only where the value differs from the default.
//! Backends supply a [`TemplateStyle`] for their value literals.

use crate::element::ConfigElement;
use crate::section::Section;
use crate::value::Value;

/// Format-specific pieces of a template
pub trait TemplateStyle {
    /// Header line for the section at dotted `path`
    fn section_header(&self, path: &str) -> String {
        format!("[{path}]")
    }

    /// Lines of a value; extra lines are written as continuations
    fn value_lines(&self, value: &Value) -> Vec<String>;

    /// Right-hand side of the active line for a required element without a value
    fn placeholder(&self) -> &'static str {
        ""
    }
}

/// Render `root` as an annotated template
///
/// Root-level elements come first, then every section in declaration order.
/// Within a section, elements precede nested sections.
#[must_use]
pub fn render(root: &Section, doc: Option<&str>, style: &dyn TemplateStyle) -> String {
    let mut out = String::new();

    if let Some(doc) = doc {
        push_doc(&mut out, doc);
        out.push('\n');
    }

    for (name, element) in root.elements() {
        push_element(&mut out, name, element, style);
    }
    for (name, section) in root.sections() {
        push_section(&mut out, name, section, style);
    }

    out
}

fn push_section(out: &mut String, path: &str, section: &Section, style: &dyn TemplateStyle) {
    out.push_str(&style.section_header(path));
    out.push('\n');

    if let Some(doc) = section.doc() {
        push_doc(out, doc);
    }
    if !section.is_required() {
        out.push_str("## OPTIONAL_SECTION\n");
    }
    if section.doc().is_some() || !section.is_required() {
        out.push('\n');
    }

    for (name, element) in section.elements() {
        push_element(out, name, element, style);
    }
    out.push('\n');

    for (name, nested) in section.sections() {
        push_section(out, &format!("{path}.{name}"), nested, style);
    }
}

fn push_element(out: &mut String, key: &str, element: &ConfigElement, style: &dyn TemplateStyle) {
    if let Some(doc) = element.doc() {
        push_doc(out, doc);
    }

    match element.default_value() {
        Some(default) => push_lines(out, "# ", "#     ", key, &style.value_lines(default)),
        None => {
            if element.is_required() {
                out.push_str("## REQUIRED\n");
            }
            out.push_str(&format!("# {key} = \n"));
        }
    }

    match element.value() {
        None if element.is_required() => {
            out.push_str(&format!("{key} = {}\n", style.placeholder()));
        }
        Some(value) if element.default_value() != Some(value) => {
            push_lines(out, "", "    ", key, &style.value_lines(value));
        }
        _ => {}
    }

    out.push('\n');
}

fn push_doc(out: &mut String, doc: &str) {
    for line in doc.split('\n') {
        out.push_str(&format!("## {line}\n"));
    }
}

fn push_lines(out: &mut String, marker: &str, continuation: &str, key: &str, lines: &[String]) {
    let first = lines.first().map_or("", String::as_str);
    out.push_str(&format!("{marker}{key} = {first}\n"));
    for line in lines.iter().skip(1) {
        out.push_str(&format!("{continuation}{line}\n"));
    }
}
