use std::collections::{BTreeMap, HashMap};

use super::value::{OptionType, Value, ValueKind};
use crate::error::{OptionsError, Result};

/// Where a present value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ValueOrigin {
    CommandLine,
    ConfigFile,
    Default,
}

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    value: Value,
    origin: ValueOrigin,
}

/// Immutable result of parsing one argument vector.
///
/// Knows the declared kind of every registered option, so that asking for
/// the wrong type fails even when the option was not supplied.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedOptions {
    declared: HashMap<String, ValueKind>,
    entries: BTreeMap<String, Entry>,
}

impl ParsedOptions {
    pub(crate) fn new(declared: HashMap<String, ValueKind>) -> Self {
        Self {
            declared,
            entries: BTreeMap::new(),
        }
    }

    /// Set a value unless one from a higher-precedence source is already there
    pub(crate) fn fill(&mut self, name: &str, value: Value, origin: ValueOrigin) {
        self.entries
            .entry(name.to_string())
            .or_insert(Entry { value, origin });
    }

    /// Typed lookup.
    ///
    /// Returns `None` only when the option was neither supplied nor
    /// defaulted.
    ///
    /// # Panics
    ///
    /// If `name` was never registered, or was registered with a kind other
    /// than `T`'s. Both are bugs in the caller.
    pub fn get_option<T: OptionType>(&self, name: &str) -> Option<T> {
        self.try_get_option(name).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Typed lookup that reports caller errors instead of panicking
    pub fn try_get_option<T: OptionType>(&self, name: &str) -> Result<Option<T>> {
        let declared = *self
            .declared
            .get(name)
            .ok_or_else(|| OptionsError::NotDefined(name.to_string()))?;

        if declared != T::KIND {
            return Err(OptionsError::TypeMismatch {
                option: name.to_string(),
                declared,
                requested: T::KIND,
            });
        }

        match self.entries.get(name) {
            None => Ok(None),
            Some(entry) => T::from_value(&entry.value)
                .map(Some)
                .ok_or_else(|| OptionsError::TypeMismatch {
                    option: name.to_string(),
                    declared,
                    requested: entry.value.kind(),
                }),
        }
    }

    /// Untyped lookup
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|e| &e.value)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn origin(&self, name: &str) -> Option<ValueOrigin> {
        self.entries.get(name).map(|e| e.origin)
    }

    /// Present values ordered by option name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value, ValueOrigin)> {
        self.entries
            .iter()
            .map(|(name, e)| (name.as_str(), &e.value, e.origin))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
