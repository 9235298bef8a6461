//! Item-level mutators for list options
//!
//! Each mutator builds the resulting list first and validates it as a whole;
//! the stored sequence only changes when validation passes.

use crate::element::ConfigElement;
use crate::error::{ConfigError, Result};
use crate::value::Value;
use std::ops::Range;

impl ConfigElement {
    /// Append one item
    pub fn append(&mut self, item: impl Into<Value>) -> Result<()> {
        let item = item.into();
        self.mutate_list(|items| {
            items.push(item);
            Ok(())
        })
    }

    /// Insert one item at `index`; indices past the end append
    pub fn insert(&mut self, index: usize, item: impl Into<Value>) -> Result<()> {
        let item = item.into();
        self.mutate_list(|items| {
            let index = index.min(items.len());
            items.insert(index, item);
            Ok(())
        })
    }

    /// Append several items
    pub fn extend<I, T>(&mut self, new_items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let new_items: Vec<Value> = new_items.into_iter().map(Into::into).collect();
        self.mutate_list(|items| {
            items.extend(new_items);
            Ok(())
        })
    }

    /// Remove the first occurrence of `item`; returns whether anything was removed
    pub fn remove(&mut self, item: &Value) -> Result<bool> {
        let mut removed = false;
        self.mutate_list(|items| {
            if let Some(position) = items.iter().position(|existing| existing == item) {
                items.remove(position);
                removed = true;
            }
            Ok(())
        })?;
        Ok(removed)
    }

    /// Remove and return the item at `index`, or the last item when `index` is `None`
    pub fn pop(&mut self, index: Option<usize>) -> Result<Option<Value>> {
        let mut popped = None;
        self.mutate_list(|items| {
            popped = match index {
                None => items.pop(),
                Some(index) if index < items.len() => Some(items.remove(index)),
                Some(index) => return Err(format!("index {index} out of range")),
            };
            Ok(())
        })?;
        Ok(popped)
    }

    /// Sort the items in place
    pub fn sort(&mut self) -> Result<()> {
        self.mutate_list(|items| {
            items.sort_by(Value::sort_cmp);
            Ok(())
        })
    }

    /// Replace the items in `range` with `replacement`
    pub fn splice<I, T>(&mut self, range: Range<usize>, replacement: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let replacement: Vec<Value> = replacement.into_iter().map(Into::into).collect();
        self.mutate_list(|items| {
            if range.start > range.end || range.end > items.len() {
                return Err(format!(
                    "range {}..{} out of bounds for {} items",
                    range.start,
                    range.end,
                    items.len()
                ));
            }
            items.splice(range.clone(), replacement);
            Ok(())
        })
    }

    fn mutate_list<F>(&mut self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Value>) -> std::result::Result<(), String>,
    {
        if self.value_type().is_scalar() {
            return Err(ConfigError::invalid(
                self.label(),
                format!("{} option is not a list", self.value_type()),
            ));
        }

        let mut items = match &self.value {
            Some(Value::List(items)) => items.clone(),
            Some(other) => {
                return Err(ConfigError::invalid(
                    self.label(),
                    format!("stored value `{other}` is not a list"),
                ))
            }
            None => Vec::new(),
        };

        mutate(&mut items).map_err(|reason| ConfigError::invalid(self.label(), reason))?;

        let candidate = Value::List(items);
        self.validate(Some(&candidate))?;
        self.value = Some(candidate);
        Ok(())
    }
}
